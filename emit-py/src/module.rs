use crate::err::LowerError;
use crate::err::LowerResult;
use crate::err::Span;
use crate::operator::py_identifier;
use crate::scope::LowerCtx;
use itertools::Itertools;
use parse_js::ast::ExportNames;
use parse_js::ast::Node;

/// Script extensions dropped from the last path segment.
const DROPPED_EXTENSIONS: &[&str] = &[".js", ".mjs", ".cjs", ".jsx"];

fn sanitize_segment(segment: &str) -> String {
  let mut out: String = segment
    .chars()
    .map(|c| if c == '_' || c.is_ascii_alphanumeric() { c } else { '_' })
    .collect();
  if out.starts_with(|c: char| c.is_ascii_digit()) {
    out.insert(0, '_');
  };
  out
}

/// Dotted Python module path for an import specifier. Relative specifiers become relative
/// imports: `./` adds one leading dot and each `../` one more. Scoped package names lose their `@`.
pub(crate) fn resolve_module_path(specifier: &str) -> String {
  let mut rest = specifier.strip_prefix('@').unwrap_or(specifier);
  let mut dots = 0;
  if let Some(stripped) = rest.strip_prefix("./") {
    dots = 1;
    rest = stripped;
  };
  while let Some(stripped) = rest.strip_prefix("../") {
    dots = if dots == 0 { 2 } else { dots + 1 };
    rest = stripped;
  }
  let rest = DROPPED_EXTENSIONS
    .iter()
    .find_map(|ext| rest.strip_suffix(ext))
    .unwrap_or(rest);
  let path = rest
    .split('/')
    .filter(|s| !s.is_empty())
    .map(sanitize_segment)
    .join(".");
  format!("{}{path}", ".".repeat(dots))
}

fn import_line(path: &str, target: &str, alias: &str) -> String {
  let target = py_identifier(target);
  if target == alias {
    format!("from {path} import {target}")
  } else {
    format!("from {path} import {target} as {alias}")
  }
}

/// An import kept only for its side effects. Relative modules must be named from their parent
/// package.
fn side_effect_import(path: &str) -> LowerResult<String> {
  let name = path.trim_start_matches('.');
  let dots = &path[..path.len() - name.len()];
  if name.is_empty() {
    return Err(LowerError::unsupported("import of a package directory"));
  };
  Ok(match (dots.is_empty(), name.rsplit_once('.')) {
    (true, _) => format!("import {path}"),
    (false, Some((parent, last))) => format!("from {dots}{parent} import {last}"),
    (false, None) => format!("from {dots} import {name}"),
  })
}

/// Span of an import or export-list statement from its keyword at `start`, which is all the
/// parser records for them. Ends after the first `;` outside a string, or at a line break that
/// follows the closing module string or brace.
pub(crate) fn module_stmt_span(source: &str, start: usize) -> Span {
  let mut quote: Option<char> = None;
  let mut escaped = false;
  let mut depth = 0usize;
  let mut can_end = false;
  for (i, c) in source.get(start..).unwrap_or_default().char_indices() {
    if let Some(q) = quote {
      if escaped {
        escaped = false;
      } else if c == '\\' {
        escaped = true;
      } else if c == q {
        quote = None;
        can_end = depth == 0;
      };
      continue;
    };
    match c {
      '\'' | '"' => quote = Some(c),
      '{' => depth += 1,
      '}' => {
        depth = depth.saturating_sub(1);
        can_end = depth == 0;
      }
      ';' => {
        return Span {
          start,
          end: start + i + 1,
        }
      }
      '\n' if can_end => {
        return Span {
          start,
          end: start + i,
        }
      }
      _ => {}
    };
  }
  Span {
    start,
    end: source.len(),
  }
}

impl LowerCtx<'_> {
  pub(crate) fn lower_import(
    &mut self,
    default: Option<&Node>,
    names: Option<&ExportNames>,
    module: &str,
  ) -> LowerResult<String> {
    let path = resolve_module_path(module);
    let mut lines = Vec::new();
    if let Some(default) = default {
      let local = self.lower_expr(default)?;
      lines.push(self.line(format!("from {path} import default as {local}")));
    };
    match names {
      None => {}
      Some(ExportNames::All(_)) => return Err(LowerError::unsupported("namespace import")),
      Some(ExportNames::Specific(names)) => {
        for name in names.iter() {
          let alias = self.lower_expr(&name.alias)?;
          lines.push(self.line(import_line(&path, name.target.as_str(), &alias)));
        }
      }
    };
    if lines.is_empty() {
      lines.push(self.line(side_effect_import(&path)?));
    };
    Ok(lines.join("\n"))
  }

  pub(crate) fn lower_export_list(
    &mut self,
    names: &ExportNames,
    from: Option<&str>,
  ) -> LowerResult<String> {
    let names = match (names, from) {
      (ExportNames::All(None), Some(module)) => {
        return Ok(self.line(format!("from {} import *", resolve_module_path(module))));
      }
      (ExportNames::All(_), _) => return Err(LowerError::unsupported("namespace re-export")),
      (ExportNames::Specific(names), _) => names,
    };
    let path = from.map(resolve_module_path);
    let mut lines = Vec::new();
    for name in names.iter() {
      let alias = self.lower_expr(&name.alias)?;
      let target = name.target.as_str();
      match &path {
        Some(path) => lines.push(self.line(import_line(path, target, &alias))),
        // Top-level names are already visible to importers under their own name.
        None if py_identifier(target) == alias => {}
        None => lines.push(self.line(format!("{alias} = {}", py_identifier(target)))),
      };
    }
    Ok(lines.join("\n"))
  }

  pub(crate) fn lower_export_default(&mut self, expression: &Node) -> LowerResult<String> {
    let value = self.lower_expr(expression)?;
    Ok(self.line(format!("default = {value}")))
  }
}

#[cfg(test)]
mod tests {
  use super::module_stmt_span;
  use super::resolve_module_path;
  use super::side_effect_import;
  use crate::err::Span;

  #[test]
  fn resolves_bare_specifiers() {
    assert_eq!(resolve_module_path("react"), "react");
    assert_eq!(resolve_module_path("lodash/fp"), "lodash.fp");
    assert_eq!(resolve_module_path("left-pad"), "left_pad");
    assert_eq!(resolve_module_path("@scope/pkg"), "scope.pkg");
  }

  #[test]
  fn resolves_relative_specifiers() {
    assert_eq!(resolve_module_path("./util.js"), ".util");
    assert_eq!(resolve_module_path("./lib/util.mjs"), ".lib.util");
    assert_eq!(resolve_module_path("../a"), "..a");
    assert_eq!(resolve_module_path("../../a/b.cjs"), "...a.b");
    assert_eq!(resolve_module_path("./styles/main.css"), ".styles.main_css");
    assert_eq!(resolve_module_path("./2d"), "._2d");
  }

  #[test]
  fn side_effect_imports_name_the_parent() {
    assert_eq!(side_effect_import("polyfill").unwrap(), "import polyfill");
    assert_eq!(side_effect_import("core.shim").unwrap(), "import core.shim");
    assert_eq!(side_effect_import(".setup").unwrap(), "from . import setup");
    assert_eq!(side_effect_import("..a.b").unwrap(), "from ..a import b");
    assert!(side_effect_import("..").is_err());
  }

  fn spanned<'s>(source: &'s str, start: usize) -> &'s str {
    let Span { start, end } = module_stmt_span(source, start);
    &source[start..end]
  }

  #[test]
  fn module_statements_span_to_their_end() {
    let src = "ok();\nimport * as ns from 'a;b';\nrun(ns);";
    assert_eq!(spanned(src, 6), "import * as ns from 'a;b';");
    let src = "export {\n  a,\n  b\n}\nfoo();";
    assert_eq!(spanned(src, 0), "export {\n  a,\n  b\n}");
    assert_eq!(spanned("export * as m from \"x\"", 0), "export * as m from \"x\"");
    assert_eq!(spanned("import {a} from 'it\\'s';", 0), "import {a} from 'it\\'s';");
  }
}
