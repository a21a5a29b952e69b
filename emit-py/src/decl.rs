use crate::err::with_node_context;
use crate::err::LowerError;
use crate::err::LowerResult;
use crate::escape::py_string_literal;
use crate::operator::py_identifier;
use crate::operator::py_member_name;
use crate::scope::Hoisted;
use crate::scope::LowerCtx;
use crate::scope::ThisMode;
use parse_js::ast::ClassOrObjectMemberKey;
use parse_js::ast::ClassOrObjectMemberValue;
use parse_js::ast::Node;
use parse_js::ast::Syntax;
use parse_js::ast::VariableDeclarator;
use parse_js::parse::literal::normalise_literal_string;

const FUNCTION_PARAMS: &[&str] = &["this", "arguments"];
const METHOD_PARAMS: &[&str] = &["self"];

struct Param<'n> {
  pattern: &'n Node,
  default_value: Option<&'n Node>,
  rest: bool,
}

enum FunctionBody<'n> {
  Block(&'n Node),
  Expression(&'n Node),
}

/// Everything needed to print one Python `def`.
pub(crate) struct FunctionShape<'n> {
  pub name: String,
  decorators: Vec<String>,
  implicit_params: &'static [&'static str],
  params: Vec<Param<'n>>,
  body: FunctionBody<'n>,
  is_async: bool,
  this_mode: ThisMode,
}

/// Parameters, body and `async` flag of a `Syntax::Function` node.
fn function_parts(function: &Node) -> LowerResult<(Vec<Param<'_>>, FunctionBody<'_>, bool)> {
  let Syntax::Function {
    async_,
    parameters,
    body,
    ..
  } = function.stx.as_ref()
  else {
    return Err(LowerError::malformed("function"));
  };
  let params = parameters
    .iter()
    .map(|param| match param.stx.as_ref() {
      Syntax::ParamDecl {
        rest,
        pattern,
        default_value,
      } => Ok(Param {
        pattern,
        default_value: default_value.as_ref(),
        rest: *rest,
      }),
      _ => Err(LowerError::malformed("function parameter")),
    })
    .collect::<LowerResult<Vec<_>>>()?;
  let body = match body.stx.as_ref() {
    Syntax::FunctionBody { .. } => FunctionBody::Block(body),
    _ => FunctionBody::Expression(body),
  };
  Ok((params, body, *async_))
}

impl<'n> FunctionShape<'n> {
  /// A `function` declaration, expression or object method.
  pub fn function(name: String, function: &'n Node) -> LowerResult<Self> {
    let (params, body, is_async) = function_parts(function)?;
    Ok(Self {
      name,
      decorators: vec!["@Js".to_string()],
      implicit_params: FUNCTION_PARAMS,
      params,
      body,
      is_async,
      this_mode: ThisMode::Own,
    })
  }

  pub fn arrow(name: String, function: &'n Node) -> LowerResult<Self> {
    let (params, body, is_async) = function_parts(function)?;
    Ok(Self {
      name,
      decorators: vec!["@Js".to_string()],
      implicit_params: FUNCTION_PARAMS,
      params,
      body,
      is_async,
      this_mode: ThisMode::Inherit,
    })
  }

  pub fn method(name: String, function: &'n Node, statik: bool) -> LowerResult<Self> {
    let (params, body, is_async) = function_parts(function)?;
    let mut decorators = Vec::new();
    if statik {
      decorators.push("@staticmethod".to_string());
    };
    decorators.push("@Js".to_string());
    Ok(Self {
      name,
      decorators,
      implicit_params: METHOD_PARAMS,
      params,
      body,
      is_async,
      this_mode: ThisMode::Instance,
    })
  }

  /// A property getter, or a setter when `setter` is set.
  fn accessor(name: String, function: &'n Node, setter: bool) -> LowerResult<Self> {
    let (params, body, _) = function_parts(function)?;
    let decorator = if setter {
      format!("@{name}.setter")
    } else {
      "@property".to_string()
    };
    Ok(Self {
      name,
      decorators: vec![decorator, "@Js".to_string()],
      implicit_params: METHOD_PARAMS,
      params,
      body,
      is_async: false,
      this_mode: ThisMode::Instance,
    })
  }
}

fn declared_name(name: &Node) -> LowerResult<String> {
  match name.stx.as_ref() {
    Syntax::ClassOrFunctionName { name } => Ok(py_identifier(name).to_string()),
    _ => Err(LowerError::malformed("declaration name")),
  }
}

fn is_attribute_name(name: &str) -> bool {
  name.starts_with(|c: char| c == '_' || c.is_ascii_alphabetic())
    && name.chars().all(|c| c == '_' || c.is_ascii_alphanumeric())
}

/// The property name a non-computed member key spells, with quotes and escapes removed.
fn direct_key_name(raw: &str) -> LowerResult<String> {
  if raw.starts_with(['"', '\'']) {
    normalise_literal_string(raw).ok_or_else(|| LowerError::malformed("string member key"))
  } else {
    Ok(raw.to_string())
  }
}

fn class_member_name(key: &ClassOrObjectMemberKey) -> LowerResult<String> {
  match key {
    ClassOrObjectMemberKey::Direct(raw) => {
      let name = py_member_name(&direct_key_name(raw)?);
      if !is_attribute_name(&name) {
        return Err(LowerError::unsupported("class member with a non-identifier name"));
      };
      Ok(name)
    }
    ClassOrObjectMemberKey::Computed(_) => Err(LowerError::unsupported("computed class member")),
  }
}

impl LowerCtx<'_> {
  /// Prints a full definition at the current depth, decorators included.
  pub(crate) fn lower_function(&mut self, shape: FunctionShape) -> LowerResult<String> {
    let mut formals: Vec<String> = shape
      .implicit_params
      .iter()
      .map(|p| p.to_string())
      .collect();
    let mut destructured = Vec::new();
    // Python rejects a parameter without a default after one with a default.
    let mut seen_default = false;
    for param in &shape.params {
      let name = match param.pattern.stx.as_ref() {
        Syntax::IdentifierPattern { name } => py_identifier(name).to_string(),
        Syntax::ArrayPattern { .. } | Syntax::ObjectPattern { .. } => {
          let temp = self.temp_name();
          destructured.push((temp.clone(), param.pattern));
          temp
        }
        _ => return Err(LowerError::malformed("parameter pattern")),
      };
      formals.push(match param.default_value {
        _ if param.rest => format!("*{name}"),
        Some(default) => {
          seen_default = true;
          let default = self.lower_expr(default)?;
          format!("{name}={default}")
        }
        None if seen_default => format!("{name}=None"),
        None => name,
      });
    }

    let header = format!(
      "{}def {}({}):",
      if shape.is_async { "async " } else { "" },
      shape.name,
      formals.join(", ")
    );
    let this_mode = shape.this_mode;
    let body = shape.body;
    let body = self.indented(|cx| {
      cx.with_hoist_scope(|cx| {
        cx.with_fresh_jump_targets(|cx| {
          cx.with_this_mode(this_mode, |cx| -> LowerResult<String> {
            let mut fragments = Vec::new();
            for (temp, pattern) in destructured {
              fragments.extend(cx.unpack_bound_temp(pattern, &temp)?);
            }
            match body {
              FunctionBody::Block(block) => fragments.extend(cx.lower_block_fragments(block)?),
              FunctionBody::Expression(expr) => fragments
                .extend(cx.splice_hoisted(|cx| cx.lower_completion("return", Some(expr)))?),
            };
            Ok(cx.join_or_pass(fragments))
          })
        })
      })
    })?;

    let mut lines: Vec<String> = shape.decorators.iter().map(|d| self.line(d)).collect();
    lines.push(self.line(header));
    lines.push(body);
    Ok(lines.join("\n"))
  }

  pub(crate) fn hoist_function(&mut self, shape: FunctionShape) -> LowerResult<()> {
    let text = self.lower_function(shape)?;
    self.hoist(Hoisted::Definition(text));
    Ok(())
  }

  /// Hoists a function or arrow literal and returns the name it was defined under. Without an
  /// explicit `name`, named function expressions keep their own name.
  pub(crate) fn hoist_function_expr(
    &mut self,
    expr: &Node,
    name: Option<String>,
  ) -> LowerResult<String> {
    let shape = match expr.stx.as_ref() {
      Syntax::FunctionExpr {
        name: own_name,
        function,
        ..
      } => {
        let name = match (name, own_name) {
          (Some(name), _) => name,
          (None, Some(own_name)) => declared_name(own_name)?,
          (None, None) => self.anonymous_function_name(None),
        };
        FunctionShape::function(name, function)?
      }
      Syntax::ArrowFunctionExpr { function, .. } => {
        let name = name.unwrap_or_else(|| self.anonymous_function_name(None));
        FunctionShape::arrow(name, function)?
      }
      _ => return Err(LowerError::malformed("function literal")),
    };
    let name = shape.name.clone();
    self.hoist_function(shape)?;
    Ok(name)
  }

  pub(crate) fn hoist_class_expr(
    &mut self,
    expr: &Node,
    name: Option<String>,
  ) -> LowerResult<String> {
    let Syntax::ClassExpr {
      name: own_name,
      extends,
      members,
      ..
    } = expr.stx.as_ref()
    else {
      return Err(LowerError::malformed("class expression"));
    };
    let name = match (name, own_name) {
      (Some(name), _) => name,
      (None, Some(own_name)) => declared_name(own_name)?,
      (None, None) => format!("_anonymous_class_{}", self.next_anon_id()),
    };
    let text = self.lower_class(&name, extends.as_ref(), members)?;
    self.hoist(Hoisted::Definition(text));
    Ok(name)
  }

  pub(crate) fn lower_function_decl(&mut self, decl: &Node) -> LowerResult<String> {
    let Syntax::FunctionDecl {
      export_default,
      name,
      function,
      ..
    } = decl.stx.as_ref()
    else {
      return Err(LowerError::malformed("function declaration"));
    };
    let def_name = match name {
      Some(name) => declared_name(name)?,
      None if *export_default => "default".to_string(),
      None => return Err(LowerError::malformed("function declaration without a name")),
    };
    let text = self.lower_function(FunctionShape::function(def_name.clone(), function)?)?;
    Ok(self.with_default_export(text, &def_name, *export_default))
  }

  pub(crate) fn lower_class_decl(&mut self, decl: &Node) -> LowerResult<String> {
    let Syntax::ClassDecl {
      export_default,
      name,
      extends,
      members,
      ..
    } = decl.stx.as_ref()
    else {
      return Err(LowerError::malformed("class declaration"));
    };
    let class_name = match name {
      Some(name) => declared_name(name)?,
      None if *export_default => "default".to_string(),
      None => return Err(LowerError::malformed("class declaration without a name")),
    };
    let text = self.lower_class(&class_name, extends.as_ref(), members)?;
    Ok(self.with_default_export(text, &class_name, *export_default))
  }

  /// Named declarations exported as the default also bind `default`.
  fn with_default_export(&self, text: String, name: &str, export_default: bool) -> String {
    if export_default && name != "default" {
      format!("{text}\n{}", self.line(format!("default = {name}")))
    } else {
      text
    }
  }

  fn lower_class(
    &mut self,
    name: &str,
    extends: Option<&Node>,
    members: &[Node],
  ) -> LowerResult<String> {
    let base = match extends {
      Some(base) => self.lower_expr(base)?,
      None => "object".to_string(),
    };
    let header = self.line(format!("class {name}({base}):"));
    let body = self.indented(|cx| {
      cx.with_hoist_scope(|cx| {
        cx.with_this_mode(ThisMode::Instance, |cx| -> LowerResult<String> {
          let mut fragments = Vec::new();
          for member in members {
            fragments.extend(cx.splice_hoisted(|cx| cx.lower_class_member(member))?);
          }
          Ok(cx.join_or_pass(fragments))
        })
      })
    })?;
    Ok(format!("{header}\n{body}"))
  }

  fn lower_class_member(&mut self, member: &Node) -> LowerResult<String> {
    let Syntax::ClassMember {
      key,
      static_,
      value,
    } = member.stx.as_ref()
    else {
      return Err(LowerError::malformed("class member"));
    };
    with_node_context(member, || {
      let name = class_member_name(key)?;
      match value {
        ClassOrObjectMemberValue::Method { function } => {
          let name = if name == "constructor" && !static_ {
            "__init__".to_string()
          } else {
            name
          };
          self.lower_function(FunctionShape::method(name, function, *static_)?)
        }
        ClassOrObjectMemberValue::Getter { .. } | ClassOrObjectMemberValue::Setter { .. }
          if *static_ =>
        {
          Err(LowerError::unsupported("static accessor"))
        }
        ClassOrObjectMemberValue::Getter { function } => {
          self.lower_function(FunctionShape::accessor(name, function, false)?)
        }
        ClassOrObjectMemberValue::Setter { function } => {
          self.lower_function(FunctionShape::accessor(name, function, true)?)
        }
        ClassOrObjectMemberValue::Property { initializer } => {
          let value = match initializer {
            Some(init) => self.lower_named_value(init, &name)?,
            None => "None".to_string(),
          };
          Ok(self.line(format!("{name} = {value}")))
        }
      }
    })
  }

  /// Lowers the value bound to `name`, defining function and class literals under that name.
  fn lower_named_value(&mut self, value: &Node, name: &str) -> LowerResult<String> {
    with_node_context(value, || match value.stx.as_ref() {
      Syntax::FunctionExpr { .. } | Syntax::ArrowFunctionExpr { .. } => {
        self.hoist_function_expr(value, Some(name.to_string()))
      }
      Syntax::ClassExpr { .. } => self.hoist_class_expr(value, Some(name.to_string())),
      _ => self.lower_expr(value),
    })
  }

  pub(crate) fn lower_var_decl(&mut self, decl: &Node) -> LowerResult<String> {
    let Syntax::VarDecl { declarators, .. } = decl.stx.as_ref() else {
      return Err(LowerError::malformed("variable declaration"));
    };
    let mut lines = Vec::new();
    for declarator in declarators.iter() {
      lines.extend(self.splice_hoisted(|cx| cx.lower_declarator(declarator))?);
    }
    Ok(lines.join("\n"))
  }

  fn lower_declarator(&mut self, declarator: &VariableDeclarator) -> LowerResult<String> {
    let pattern = &declarator.pattern;
    match pattern.stx.as_ref() {
      Syntax::IdentifierPattern { name } => {
        let name = py_identifier(name).to_string();
        let value = match &declarator.initializer {
          Some(init) => self.lower_named_value(init, &name)?,
          None => "None".to_string(),
        };
        Ok(self.line(format!("{name} = {value}")))
      }
      Syntax::ArrayPattern { .. } | Syntax::ObjectPattern { .. } => {
        let value = match &declarator.initializer {
          Some(init) => self.lower_expr(init)?,
          None => "None".to_string(),
        };
        self.lower_destructuring(pattern, value)
      }
      _ => Err(LowerError::malformed("declarator pattern")),
    }
  }

  /// Binds `value` to a temporary, hoists one copy per pattern property, and returns the line
  /// that releases the temporary.
  pub(crate) fn lower_destructuring(&mut self, pattern: &Node, value: String) -> LowerResult<String> {
    let temp = self.temp_name();
    let binding = self.line(format!("{temp} = {value}"));
    let copies = self.destructure(pattern, &temp)?;
    self.hoist(Hoisted::Binding(binding));
    for copy in copies {
      self.hoist(Hoisted::Binding(copy));
    }
    Ok(self.line(format!("del {temp}")))
  }

  /// Copies out of `temp`, which is already bound, and then releases it. Definitions hoisted by
  /// pattern defaults come first.
  fn unpack_bound_temp(&mut self, pattern: &Node, temp: &str) -> LowerResult<Vec<String>> {
    let mark = self.hoist_mark();
    let copies = self.destructure(pattern, temp)?;
    let mut lines = self.take_hoisted_since(mark);
    lines.extend(copies);
    lines.push(self.line(format!("del {temp}")));
    Ok(lines)
  }

  /// Lines copying each property of `pattern` out of the value named `source`.
  pub(crate) fn destructure(&mut self, pattern: &Node, source: &str) -> LowerResult<Vec<String>> {
    let mut lines = Vec::new();
    match pattern.stx.as_ref() {
      Syntax::ObjectPattern { properties, rest } => {
        let mut named_keys = Vec::new();
        for property in properties.iter() {
          let Syntax::ObjectPatternProperty {
            key,
            target,
            default_value,
            ..
          } = property.stx.as_ref()
          else {
            return Err(LowerError::malformed("object pattern property"));
          };
          let access = match key {
            ClassOrObjectMemberKey::Direct(raw) => {
              let name = direct_key_name(raw)?;
              named_keys.push(py_string_literal(&name));
              if is_attribute_name(&name) {
                format!("{source}.{name}")
              } else {
                format!("{source}[{}]", py_string_literal(&name))
              }
            }
            ClassOrObjectMemberKey::Computed(expr) => {
              let expr = self.lower_expr(expr)?;
              let access = format!("{source}[{expr}]");
              named_keys.push(expr);
              access
            }
          };
          let value = self.with_default(access, default_value.as_ref())?;
          lines.extend(self.bind_pattern(target, value)?);
        }
        if let Some(rest) = rest {
          let rest = self.lower_expr(rest)?;
          lines.push(self.line(format!(
            "{rest} = {{k: v for k, v in {source}.items() if k not in [{}]}}",
            named_keys.join(", ")
          )));
        };
      }
      Syntax::ArrayPattern { elements, rest } => {
        for (i, element) in elements.iter().enumerate() {
          let Some(element) = element else {
            continue;
          };
          let value =
            self.with_default(format!("{source}[{i}]"), element.default_value.as_ref())?;
          lines.extend(self.bind_pattern(&element.target, value)?);
        }
        if let Some(rest) = rest {
          lines.extend(self.bind_pattern(rest, format!("{source}[{}:]", elements.len()))?);
        };
      }
      _ => return Err(LowerError::malformed("destructuring pattern")),
    };
    Ok(lines)
  }

  fn with_default(&mut self, access: String, default: Option<&Node>) -> LowerResult<String> {
    Ok(match default {
      Some(default) => {
        let default = self.lower_expr(default)?;
        format!("{access} if {access} is not None else {default}")
      }
      None => access,
    })
  }

  /// Assigns `value` to a single pattern target, recursing through a temporary for nested
  /// patterns.
  fn bind_pattern(&mut self, target: &Node, value: String) -> LowerResult<Vec<String>> {
    match target.stx.as_ref() {
      Syntax::IdentifierPattern { name } => {
        Ok(vec![self.line(format!("{} = {value}", py_identifier(name)))])
      }
      Syntax::ArrayPattern { .. } | Syntax::ObjectPattern { .. } => {
        let temp = self.temp_name();
        let mut lines = vec![self.line(format!("{temp} = {value}"))];
        lines.extend(self.destructure(target, &temp)?);
        lines.push(self.line(format!("del {temp}")));
        Ok(lines)
      }
      _ => Err(LowerError::malformed("pattern target")),
    }
  }

  /// The name a loop or `catch` clause binds, plus any destructuring that must run first in its
  /// body.
  pub(crate) fn bind_clause_target(&mut self, target: &Node) -> LowerResult<(String, Vec<String>)> {
    match target.stx.as_ref() {
      Syntax::IdentifierPattern { name } => Ok((py_identifier(name).to_string(), Vec::new())),
      Syntax::ArrayPattern { .. } | Syntax::ObjectPattern { .. } => {
        let temp = self.temp_name();
        let prelude = self.unpack_bound_temp(target, &temp)?;
        Ok((temp, prelude))
      }
      _ => Err(LowerError::malformed("binding target")),
    }
  }
}
