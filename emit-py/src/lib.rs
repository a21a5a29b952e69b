use err::line_and_column;
use preamble::PREAMBLE;
use rayon::prelude::*;
use scope::LowerCtx;
use std::fmt;
use std::fmt::Display;
use std::fmt::Formatter;

pub use err::TranslateError;

mod decl;
mod err;
mod escape;
mod expr;
mod module;
mod operator;
mod preamble;
mod scope;
mod stmt;
#[cfg(test)]
mod tests;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TranslateOptions {
  /// Whether the rendered output starts with the runtime imports.
  pub preamble: bool,
}

impl TranslateOptions {
  pub fn new() -> Self {
    Self { preamble: true }
  }

  pub fn with_preamble(mut self, preamble: bool) -> Self {
    self.preamble = preamble;
    self
  }
}

impl Default for TranslateOptions {
  fn default() -> Self {
    Self::new()
  }
}

/// A statement that could not be lowered and was replaced by a `pass` line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Placeholder {
  pub construct: &'static str,
  /// 1-based.
  pub line: usize,
  /// 1-based, in characters.
  pub column: usize,
  /// Source text of the offending construct, collapsed onto one line.
  pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Translation {
  preamble: Option<&'static str>,
  statements: Vec<String>,
  placeholders: Vec<Placeholder>,
}

impl Translation {
  pub fn preamble(&self) -> Option<&str> {
    self.preamble
  }

  /// Top-level fragments in output order. A fragment can span several lines; hoisted
  /// definitions are followed by an empty fragment.
  pub fn statements(&self) -> &[String] {
    &self.statements
  }

  pub fn placeholders(&self) -> &[Placeholder] {
    &self.placeholders
  }

  /// The full program text, ending with a newline unless it is empty.
  pub fn render(&self) -> String {
    let body = self.statements.join("\n");
    match (self.preamble, body.is_empty()) {
      (Some(preamble), true) => format!("{preamble}\n"),
      (Some(preamble), false) => format!("{preamble}\n\n{body}\n"),
      (None, true) => String::new(),
      (None, false) => format!("{body}\n"),
    }
  }
}

impl Display for Translation {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    f.write_str(&self.render())
  }
}

/// Translates JavaScript into Python source for the js2py runtime.
///
/// Constructs without a lowering do not fail the translation: each statement containing one is
/// replaced by a `pass  # FIXME unsupported ...` line and reported in
/// [`Translation::placeholders`].
///
/// # Arguments
///
/// * `source` - The JavaScript source code.
/// * `options` - What to include in the output.
///
/// # Examples
///
/// ```
/// use emit_py::{translate, TranslateOptions};
///
/// let options = TranslateOptions::default().with_preamble(false);
/// let translation = translate("let total = price * 2;", options).unwrap();
/// assert_eq!(translation.render(), "total = price * 2\n");
/// ```
pub fn translate(source: &str, options: TranslateOptions) -> Result<Translation, TranslateError> {
  let span = tracing::debug_span!("translate", bytes = source.len());
  let _entered = span.enter();

  let top_level =
    parse_js::parse(source.as_bytes()).map_err(|err| TranslateError::from_syntax(source, &err))?;
  let mut cx = LowerCtx::new(source);
  let statements = cx
    .lower_top_level(&top_level)
    .map_err(|err| TranslateError::from_lower(source, &err))?;
  let placeholders: Vec<Placeholder> = cx
    .take_placeholders()
    .into_iter()
    .map(|p| {
      let (line, column) = p
        .span
        .map_or((1, 1), |span| line_and_column(source, span.start));
      Placeholder {
        construct: p.construct,
        line,
        column,
        text: p.snippet,
      }
    })
    .collect();
  tracing::debug!(
    statements = statements.len(),
    placeholders = placeholders.len(),
    "translated"
  );
  Ok(Translation {
    preamble: options.preamble.then_some(PREAMBLE),
    statements,
    placeholders,
  })
}

/// Translates independent sources in parallel. Results are in input order.
///
/// # Examples
///
/// ```
/// use emit_py::{translate_all, TranslateOptions};
///
/// let options = TranslateOptions::default().with_preamble(false);
/// let results = translate_all(&["a = 1", "b = 2"], options);
/// assert_eq!(results[1].as_ref().unwrap().render(), "b = 2\n");
/// ```
pub fn translate_all(
  sources: &[&str],
  options: TranslateOptions,
) -> Vec<Result<Translation, TranslateError>> {
  sources
    .par_iter()
    .map(|source| translate(source, options))
    .collect()
}
