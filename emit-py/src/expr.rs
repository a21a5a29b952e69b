use crate::decl::FunctionShape;
use crate::err::with_node_context;
use crate::err::LowerError;
use crate::err::LowerResult;
use crate::escape::py_fstring_segment;
use crate::escape::py_number;
use crate::escape::py_string_literal;
use crate::operator::py_identifier;
use crate::operator::py_member_name;
use crate::operator::BINARY_OPERATOR_SYNTAX;
use crate::scope::LowerCtx;
use parse_js::ast::ArrayElement;
use parse_js::ast::ClassOrObjectMemberKey;
use parse_js::ast::ClassOrObjectMemberValue;
use parse_js::ast::LiteralTemplatePart;
use parse_js::ast::Node;
use parse_js::ast::ObjectMemberType;
use parse_js::ast::Syntax;
use parse_js::operator::OperatorName;
use parse_js::parse::literal::normalise_literal_string;

/// Whether the source wrapped `expr` in parentheses that should survive lowering. Forms that
/// lower to statements or to a hoisted name drop them.
fn keeps_parentheses(expr: &Node) -> bool {
  match expr.stx.as_ref() {
    Syntax::BinaryExpr {
      parenthesised,
      operator,
      ..
    } => *parenthesised && *operator != OperatorName::Comma && !operator.is_assignment(),
    Syntax::UnaryExpr {
      parenthesised,
      operator,
      ..
    } => {
      *parenthesised
        && !matches!(
          operator,
          OperatorName::PrefixIncrement | OperatorName::PrefixDecrement | OperatorName::Delete
        )
    }
    Syntax::CallExpr { parenthesised, .. }
    | Syntax::ConditionalExpr { parenthesised, .. }
    | Syntax::MemberExpr { parenthesised, .. } => *parenthesised,
    _ => false,
  }
}

/// Flattens a left-nested comma chain into its operands, in source order.
pub(crate) fn flatten_sequence<'n>(expr: &'n Node, out: &mut Vec<&'n Node>) {
  match expr.stx.as_ref() {
    Syntax::BinaryExpr {
      operator: OperatorName::Comma,
      left,
      right,
      ..
    } => {
      flatten_sequence(left, out);
      flatten_sequence(right, out);
    }
    _ => out.push(expr),
  }
}

pub(crate) fn is_function_literal(expr: &Node) -> bool {
  matches!(
    *expr.stx,
    Syntax::FunctionExpr { .. } | Syntax::ArrowFunctionExpr { .. }
  )
}

fn is_plain_name(name: &str) -> bool {
  !name.is_empty() && name.chars().all(|c| c == '_' || c.is_ascii_alphanumeric())
}

/// `/pattern/flags` to a runtime RegExp construction.
fn lower_regex(raw: &str) -> LowerResult<String> {
  let body = raw
    .strip_prefix('/')
    .ok_or_else(|| LowerError::malformed("regex literal"))?;
  let end = body
    .rfind('/')
    .ok_or_else(|| LowerError::malformed("regex literal"))?;
  Ok(format!(
    "RegExp({}, {})",
    py_string_literal(&body[..end]),
    py_string_literal(&body[end + 1..])
  ))
}

impl LowerCtx<'_> {
  pub(crate) fn lower_expr(&mut self, expr: &Node) -> LowerResult<String> {
    with_node_context(expr, || {
      let text = self.lower_expr_unwrapped(expr)?;
      Ok(if keeps_parentheses(expr) {
        format!("({text})")
      } else {
        text
      })
    })
  }

  fn lower_expr_unwrapped(&mut self, expr: &Node) -> LowerResult<String> {
    match expr.stx.as_ref() {
      Syntax::IdentifierExpr { name } | Syntax::IdentifierPattern { name } => {
        Ok(py_identifier(name).to_string())
      }
      Syntax::ThisExpr {} => Ok(if self.in_class_body() { "self" } else { "this" }.to_string()),
      Syntax::SuperExpr {} => Ok("super()".to_string()),
      Syntax::LiteralBooleanExpr { value } => Ok(if *value { "True" } else { "False" }.to_string()),
      Syntax::LiteralNull {} => Ok("None".to_string()),
      Syntax::LiteralNumberExpr { value } => Ok(py_number(value.0)),
      Syntax::LiteralBigIntExpr { value } => Ok(value.trim_end_matches('n').to_string()),
      Syntax::LiteralStringExpr { value } => Ok(py_string_literal(value)),
      Syntax::LiteralRegexExpr { value } => lower_regex(value),
      Syntax::LiteralTemplateExpr { parts } => {
        let mut out = String::from("f\"\"\"");
        for part in parts.iter() {
          match part {
            LiteralTemplatePart::String(text) => out.push_str(&py_fstring_segment(text)),
            LiteralTemplatePart::Substitution(sub) => {
              let sub = self.lower_expr(sub)?;
              out.push('{');
              out.push_str(&sub);
              out.push('}');
            }
          };
        }
        out.push_str("\"\"\"");
        Ok(out)
      }
      Syntax::LiteralArrayExpr { elements } => {
        let mut lowered = Vec::with_capacity(elements.len());
        for element in elements.iter() {
          lowered.push(match element {
            ArrayElement::Single(value) => self.lower_expr(value)?,
            ArrayElement::Rest(value) => format!("*{}", self.lower_expr(value)?),
            ArrayElement::Empty => String::new(),
          });
        }
        Ok(format!("Js([{}])", lowered.join(", ")))
      }
      Syntax::LiteralObjectExpr { members } => self.lower_object(members),
      Syntax::BinaryExpr {
        operator: OperatorName::Comma,
        ..
      } => {
        let mut operands = Vec::new();
        flatten_sequence(expr, &mut operands);
        let lowered = operands
          .into_iter()
          .map(|operand| self.lower_expr(operand))
          .collect::<LowerResult<Vec<_>>>()?;
        Ok(lowered.join("; "))
      }
      Syntax::BinaryExpr {
        operator,
        left,
        right,
        ..
      } => {
        if matches!(
          *left.stx,
          Syntax::ArrayPattern { .. } | Syntax::ObjectPattern { .. }
        ) {
          return Err(LowerError::unsupported(
            "destructuring assignment inside an expression",
          ));
        };
        let op = BINARY_OPERATOR_SYNTAX
          .get(operator)
          .ok_or_else(|| LowerError::malformed("binary operator"))?;
        let left = self.lower_expr(left)?;
        let right = self.lower_expr(right)?;
        Ok(format!("{left} {op} {right}"))
      }
      Syntax::ConditionalExpr {
        test,
        consequent,
        alternate,
        ..
      } => {
        let test = self.lower_expr(test)?;
        let consequent = self.lower_expr(consequent)?;
        let alternate = self.lower_expr(alternate)?;
        Ok(format!("{consequent} if {test} else {alternate}"))
      }
      Syntax::UnaryExpr {
        operator, argument, ..
      } => self.lower_unary(*operator, argument),
      Syntax::UnaryPostfixExpr {
        operator, argument, ..
      } => self.lower_unary(*operator, argument),
      Syntax::MemberExpr { left, right, .. } => {
        let left = self.lower_expr(left)?;
        Ok(format!("{left}.{}", py_member_name(right)))
      }
      Syntax::ComputedMemberExpr { object, member, .. } => {
        let object = self.lower_expr(object)?;
        let member = self.lower_expr(member)?;
        Ok(format!("{object}[{member}]"))
      }
      Syntax::CallExpr {
        callee, arguments, ..
      } => self.lower_call(callee, arguments),
      Syntax::FunctionExpr { .. } | Syntax::ArrowFunctionExpr { .. } => {
        self.hoist_function_expr(expr, None)
      }
      Syntax::ClassExpr { .. } => self.hoist_class_expr(expr, None),
      Syntax::ArrayPattern { .. } | Syntax::ObjectPattern { .. } => Err(LowerError::unsupported(
        "destructuring assignment inside an expression",
      )),
      Syntax::TaggedTemplateExpr { .. } => Err(LowerError::unsupported("tagged template")),
      Syntax::ImportExpr { .. } => Err(LowerError::unsupported("dynamic import")),
      Syntax::ImportMeta {} => Err(LowerError::unsupported("import.meta")),
      Syntax::JsxAttribute { .. }
      | Syntax::JsxElement { .. }
      | Syntax::JsxExpressionContainer { .. }
      | Syntax::JsxMemberExpression { .. }
      | Syntax::JsxName { .. }
      | Syntax::JsxSpreadAttribute { .. }
      | Syntax::JsxText { .. } => Err(LowerError::unsupported("JSX")),
      _ => Err(LowerError::malformed("expected an expression")),
    }
  }

  fn lower_unary(&mut self, operator: OperatorName, argument: &Node) -> LowerResult<String> {
    if operator == OperatorName::New {
      return match argument.stx.as_ref() {
        Syntax::CallExpr {
          callee, arguments, ..
        } => self.lower_call(callee, arguments),
        _ => Ok(format!("{}()", self.lower_expr(argument)?)),
      };
    };
    let arg = self.lower_expr(argument)?;
    Ok(match operator {
      OperatorName::LogicalNot => format!("not {arg}"),
      OperatorName::Delete => format!("del {arg}"),
      OperatorName::Void => format!("({arg}, None)[1]"),
      OperatorName::Typeof => format!("type(globals().get({}))", py_string_literal(&arg)),
      // Prefix and postfix forms both yield the updated value.
      OperatorName::PrefixIncrement | OperatorName::PostfixIncrement => format!("{arg} += 1"),
      OperatorName::PrefixDecrement | OperatorName::PostfixDecrement => format!("{arg} -= 1"),
      OperatorName::Await => format!("await {arg}"),
      OperatorName::Yield => format!("yield {arg}"),
      OperatorName::YieldDelegated => format!("yield from {arg}"),
      OperatorName::UnaryNegation => format!("-{arg}"),
      OperatorName::UnaryPlus => format!("+{arg}"),
      OperatorName::BitwiseNot => format!("~{arg}"),
      _ => return Err(LowerError::malformed("unary operator")),
    })
  }

  /// Function literals in callee or argument position are always hoisted under a fresh name.
  fn lower_call_operand(&mut self, operand: &Node) -> LowerResult<String> {
    if is_function_literal(operand) {
      let name = self.anonymous_function_name(None);
      return self.hoist_function_expr(operand, Some(name));
    };
    self.lower_expr(operand)
  }

  pub(crate) fn lower_call(&mut self, callee: &Node, arguments: &[Node]) -> LowerResult<String> {
    let callee = match callee.stx.as_ref() {
      Syntax::SuperExpr {} => "super().__init__".to_string(),
      _ => self.lower_call_operand(callee)?,
    };
    let mut args = Vec::with_capacity(arguments.len());
    for arg in arguments {
      let Syntax::CallArg { spread, value } = arg.stx.as_ref() else {
        return Err(LowerError::malformed("call argument"));
      };
      let value = self.lower_call_operand(value)?;
      args.push(if *spread { format!("*{value}") } else { value });
    }
    Ok(format!("{callee}({})", args.join(", ")))
  }

  /// `_anonymous_func_{n}`, or `_anonymous_func_{key}{n}` for values of an object member named `key`.
  pub(crate) fn anonymous_function_name(&mut self, key: Option<&str>) -> String {
    let id = self.next_anon_id();
    match key {
      Some(key) if is_plain_name(key) => format!("_anonymous_func_{key}{id}"),
      _ => format!("_anonymous_func_{id}"),
    }
  }

  /// Key text for a mapping literal, plus the plain name to derive hoisted function names from.
  fn lower_object_key(
    &mut self,
    key: &ClassOrObjectMemberKey,
  ) -> LowerResult<(String, Option<String>)> {
    Ok(match key {
      ClassOrObjectMemberKey::Direct(raw) => {
        if raw.starts_with(['"', '\'']) {
          let cooked = normalise_literal_string(raw)
            .ok_or_else(|| LowerError::malformed("string member key"))?;
          (py_string_literal(&cooked), Some(cooked))
        } else if raw.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
          (raw.to_string(), None)
        } else {
          (py_string_literal(raw), Some(raw.clone()))
        }
      }
      ClassOrObjectMemberKey::Computed(expr) => (self.lower_expr(expr)?, None),
    })
  }

  fn lower_object(&mut self, members: &[Node]) -> LowerResult<String> {
    let mut entries = Vec::with_capacity(members.len());
    for member in members {
      let Syntax::ObjectMember { typ } = member.stx.as_ref() else {
        return Err(LowerError::malformed("object member"));
      };
      entries.push(match typ {
        ObjectMemberType::Valued { key, value } => {
          let (key, hint) = self.lower_object_key(key)?;
          let value = match value {
            ClassOrObjectMemberValue::Property {
              initializer: Some(init),
            } => {
              if is_function_literal(init) {
                let name = self.anonymous_function_name(hint.as_deref());
                self.hoist_function_expr(init, Some(name))?
              } else {
                self.lower_expr(init)?
              }
            }
            ClassOrObjectMemberValue::Property { initializer: None } => {
              return Err(LowerError::malformed("object property without a value"));
            }
            ClassOrObjectMemberValue::Method { function } => {
              let name = self.anonymous_function_name(hint.as_deref());
              self.hoist_function(FunctionShape::function(name.clone(), function)?)?;
              name
            }
            ClassOrObjectMemberValue::Getter { .. } | ClassOrObjectMemberValue::Setter { .. } => {
              return Err(LowerError::unsupported("object accessor"));
            }
          };
          format!("{key}: {value}")
        }
        ObjectMemberType::Shorthand { identifier } => {
          let Syntax::IdentifierExpr { name } = identifier.stx.as_ref() else {
            return Err(LowerError::malformed("shorthand property"));
          };
          format!("{}: {}", py_string_literal(name), py_identifier(name))
        }
        ObjectMemberType::Rest { value } => format!("**{}", self.lower_expr(value)?),
      });
    }
    Ok(format!("{{{}}}", entries.join(", ")))
  }
}
