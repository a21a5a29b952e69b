use crate::err::snippet;
use crate::err::LowerError;
use crate::err::LowerResult;
use crate::err::Span;
use crate::expr::flatten_sequence;
use crate::module::module_stmt_span;
use crate::scope::JumpTarget;
use crate::scope::LowerCtx;
use parse_js::ast::ForInit;
use parse_js::ast::Node;
use parse_js::ast::Syntax;
use parse_js::operator::OperatorName;

/// Statements with no output at all.
fn is_skipped(stmt: &Node) -> bool {
  match stmt.stx.as_ref() {
    Syntax::EmptyStmt {} => true,
    Syntax::ExpressionStmt { expression } => matches!(
      expression.stx.as_ref(),
      Syntax::LiteralStringExpr { value } if value == "use strict"
    ),
    _ => false,
  }
}

/// A `break` that ends a case body only separates it from the next case.
fn without_trailing_break(body: &[Node]) -> &[Node] {
  match body.split_last() {
    Some((last, rest)) if matches!(*last.stx, Syntax::BreakStmt { label: None }) => rest,
    _ => body,
  }
}

/// Case tests that are valid literal or value patterns as written.
fn is_match_pattern(test: &Node) -> bool {
  match test.stx.as_ref() {
    Syntax::LiteralStringExpr { .. }
    | Syntax::LiteralNumberExpr { .. }
    | Syntax::LiteralBooleanExpr { .. }
    | Syntax::LiteralNull {} => true,
    Syntax::UnaryExpr {
      operator: OperatorName::UnaryNegation,
      argument,
      ..
    } => matches!(*argument.stx, Syntax::LiteralNumberExpr { .. }),
    // Only dotted names; a bare name would be a capture pattern.
    Syntax::MemberExpr {
      left,
      optional_chaining: false,
      ..
    } => matches!(*left.stx, Syntax::IdentifierExpr { .. }) || is_match_pattern(left),
    _ => false,
  }
}

impl LowerCtx<'_> {
  pub(crate) fn lower_top_level(&mut self, top_level: &Node) -> LowerResult<Vec<String>> {
    let Syntax::TopLevel { body } = top_level.stx.as_ref() else {
      return Err(LowerError::malformed("top level"));
    };
    self.lower_stmt_seq(body)
  }

  /// Lowers each statement and splices the definitions it hoisted in front of it. Unsupported
  /// statements degrade to a placeholder line; anything else that fails aborts the sequence.
  pub(crate) fn lower_stmt_seq<'n>(
    &mut self,
    stmts: impl IntoIterator<Item = &'n Node>,
  ) -> LowerResult<Vec<String>> {
    let mut fragments = Vec::new();
    for stmt in stmts {
      if is_skipped(stmt) {
        continue;
      };
      let mark = self.hoist_mark();
      match self.lower_stmt(stmt) {
        Ok(text) => {
          fragments.extend(self.take_hoisted_since(mark));
          if !text.is_empty() {
            fragments.push(text);
          };
        }
        Err(err) if err.is_unsupported() => {
          self.discard_hoisted_since(mark);
          fragments.push(self.placeholder(&err));
        }
        Err(err) => return Err(err),
      };
    }
    Ok(fragments)
  }

  fn placeholder(&mut self, err: &LowerError) -> String {
    let snippet = err
      .span
      .map(|span| snippet(self.source(), span))
      .unwrap_or_default();
    tracing::warn!(
      construct = err.construct(),
      snippet,
      "emitting placeholder for unsupported construct"
    );
    self.record_placeholder(err);
    self.line(format!(
      "pass  # FIXME unsupported {}: {snippet}",
      err.construct()
    ))
  }

  pub(crate) fn join_or_pass(&self, fragments: Vec<String>) -> String {
    if fragments.iter().all(|f| f.is_empty()) {
      self.line("pass")
    } else {
      fragments.join("\n")
    }
  }

  /// Statements of a braced body, or of a single unbraced statement, at the current depth.
  pub(crate) fn lower_block_fragments(&mut self, body: &Node) -> LowerResult<Vec<String>> {
    match body.stx.as_ref() {
      Syntax::BlockStmt { body } | Syntax::ForBody { body } | Syntax::FunctionBody { body } => {
        self.lower_stmt_seq(body)
      }
      _ => self.lower_stmt_seq([body]),
    }
  }

  /// A nested suite: one level deeper, with its own hoist buffer.
  fn lower_suite(&mut self, body: &Node) -> LowerResult<String> {
    self.indented(|cx| {
      cx.with_hoist_scope(|cx| {
        let fragments = cx.lower_block_fragments(body)?;
        Ok(cx.join_or_pass(fragments))
      })
    })
  }

  fn lower_stmt(&mut self, stmt: &Node) -> LowerResult<String> {
    // Import and export-list nodes only cover their keyword.
    let span = match stmt.stx.as_ref() {
      Syntax::ImportStmt { .. } | Syntax::ExportListStmt { .. } => {
        module_stmt_span(self.source(), stmt.loc.0)
      }
      _ => Span::from(stmt.loc),
    };
    self
      .lower_stmt_unspanned(stmt)
      .map_err(|err| err.with_span(span))
  }

  fn lower_stmt_unspanned(&mut self, stmt: &Node) -> LowerResult<String> {
    match stmt.stx.as_ref() {
      Syntax::BlockStmt { .. } => {
        let fragments = self.lower_block_fragments(stmt)?;
        Ok(fragments.join("\n"))
      }
      Syntax::BreakStmt { label } => self.lower_jump("break", label.as_deref()),
      Syntax::ClassDecl { .. } => self.lower_class_decl(stmt),
      Syntax::ContinueStmt { label } => self.lower_jump("continue", label.as_deref()),
      Syntax::DebuggerStmt {} => Ok(self.line("pass")),
      Syntax::DoWhileStmt { condition, body } | Syntax::WhileStmt { condition, body } => {
        self.lower_while(condition, body, None)
      }
      Syntax::EmptyStmt {} => Ok(String::new()),
      Syntax::ExportDefaultExprStmt { expression } => self.lower_export_default(expression),
      Syntax::ExportListStmt { names, from } => self.lower_export_list(names, from.as_deref()),
      Syntax::ExpressionStmt { expression } => self.lower_expr_stmt(expression),
      Syntax::ForStmt {
        init,
        condition,
        post,
        body,
      } => self.lower_for(init, condition.as_ref(), post.as_ref(), body, None),
      Syntax::ForInStmt { pat, rhs, body, .. } => self.lower_for_in_of(pat, rhs, body, false, None),
      Syntax::ForOfStmt {
        await_,
        pat,
        rhs,
        body,
        ..
      } => self.lower_for_in_of(pat, rhs, body, *await_, None),
      Syntax::FunctionDecl { .. } => self.lower_function_decl(stmt),
      Syntax::IfStmt {
        test,
        consequent,
        alternate,
      } => self.lower_if(test, consequent, alternate.as_ref()),
      Syntax::ImportStmt {
        default,
        names,
        module,
      } => self.lower_import(default.as_ref(), names.as_ref(), module),
      Syntax::LabelStmt { name, statement } => self.lower_label(name, statement),
      Syntax::ReturnStmt { value } => self.lower_completion("return", value.as_ref()),
      Syntax::SwitchStmt { test, branches } => self.lower_switch(test, branches),
      Syntax::ThrowStmt { value } => self.lower_completion("raise", Some(value)),
      Syntax::TryStmt {
        wrapped,
        catch,
        finally,
      } => self.lower_try(wrapped, catch.as_ref(), finally.as_ref()),
      Syntax::VarDecl { .. } => self.lower_var_decl(stmt),
      _ => Err(LowerError::malformed("expected a statement")),
    }
  }

  pub(crate) fn lower_expr_stmt(&mut self, expr: &Node) -> LowerResult<String> {
    match expr.stx.as_ref() {
      Syntax::BinaryExpr {
        operator: OperatorName::Assignment,
        left,
        right,
        ..
      } if matches!(
        *left.stx,
        Syntax::ArrayPattern { .. } | Syntax::ObjectPattern { .. }
      ) =>
      {
        let value = self.lower_expr(right)?;
        self.lower_destructuring(left, value)
      }
      _ => {
        let text = self.lower_expr(expr)?;
        Ok(self.line(text))
      }
    }
  }

  /// `return`/`raise` of `value`. Values that only make sense as statements are executed first and
  /// their target is completed instead.
  pub(crate) fn lower_completion(
    &mut self,
    keyword: &str,
    value: Option<&Node>,
  ) -> LowerResult<String> {
    let Some(value) = value else {
      return Ok(self.line(keyword));
    };
    match value.stx.as_ref() {
      Syntax::BinaryExpr {
        operator: OperatorName::Comma,
        ..
      } => {
        let mut operands = Vec::new();
        flatten_sequence(value, &mut operands);
        let Some((last, leading)) = operands.split_last() else {
          return Err(LowerError::malformed("sequence expression"));
        };
        let mut lines = Vec::with_capacity(operands.len());
        for operand in leading {
          lines.push(self.lower_expr_stmt(operand)?);
        }
        lines.push(self.lower_completion(keyword, Some(*last))?);
        Ok(lines.join("\n"))
      }
      Syntax::BinaryExpr { operator, left, .. } if operator.is_assignment() => {
        let effect = self.lower_expr_stmt(value)?;
        let target = self.lower_expr(left)?;
        Ok(format!("{effect}\n{}", self.line(format!("{keyword} {target}"))))
      }
      Syntax::UnaryExpr {
        operator: OperatorName::PrefixIncrement | OperatorName::PrefixDecrement,
        argument,
        ..
      }
      | Syntax::UnaryPostfixExpr { argument, .. } => {
        let effect = self.lower_expr_stmt(value)?;
        let target = self.lower_expr(argument)?;
        Ok(format!("{effect}\n{}", self.line(format!("{keyword} {target}"))))
      }
      _ => {
        let value = self.lower_expr(value)?;
        Ok(self.line(format!("{keyword} {value}")))
      }
    }
  }

  fn lower_jump(&mut self, keyword: &str, label: Option<&str>) -> LowerResult<String> {
    match label {
      None => {
        if keyword == "break" && self.innermost_jump_target() == Some(&JumpTarget::Switch) {
          return Err(LowerError::unsupported("break out of a switch case"));
        };
        Ok(self.line(keyword))
      }
      Some(label) => match self.innermost_loop() {
        Some((Some(loop_label), crosses_switch))
          if loop_label == label && !(keyword == "break" && crosses_switch) =>
        {
          Ok(self.line(keyword))
        }
        _ => Err(LowerError::unsupported("labelled jump")),
      },
    }
  }

  fn lower_label(&mut self, label: &str, statement: &Node) -> LowerResult<String> {
    let label = Some(label);
    match statement.stx.as_ref() {
      Syntax::DoWhileStmt { condition, body } | Syntax::WhileStmt { condition, body } => {
        self.lower_while(condition, body, label)
      }
      Syntax::ForStmt {
        init,
        condition,
        post,
        body,
      } => self.lower_for(init, condition.as_ref(), post.as_ref(), body, label),
      Syntax::ForInStmt { pat, rhs, body, .. } => {
        self.lower_for_in_of(pat, rhs, body, false, label)
      }
      Syntax::ForOfStmt {
        await_,
        pat,
        rhs,
        body,
        ..
      } => self.lower_for_in_of(pat, rhs, body, *await_, label),
      _ => self.lower_stmt(statement),
    }
  }

  /// `while` and `do`-`while` lower identically.
  fn lower_while(
    &mut self,
    condition: &Node,
    body: &Node,
    label: Option<&str>,
  ) -> LowerResult<String> {
    let test = self.lower_expr(condition)?;
    let header = self.line(format!("while {test}:"));
    let target = JumpTarget::Loop {
      label: label.map(str::to_string),
    };
    let body = self.with_jump_target(target, |cx| cx.lower_suite(body))?;
    Ok(format!("{header}\n{body}"))
  }

  /// The initializer, then a `while` whose body ends with the update.
  fn lower_for(
    &mut self,
    init: &ForInit,
    condition: Option<&Node>,
    post: Option<&Node>,
    body: &Node,
    label: Option<&str>,
  ) -> LowerResult<String> {
    let target = JumpTarget::Loop {
      label: label.map(str::to_string),
    };
    let mut lines = Vec::new();
    match init {
      ForInit::None => {}
      ForInit::Expression(expr) => lines.push(self.lower_expr_stmt(expr)?),
      ForInit::Declaration(decl) => lines.push(self.lower_var_decl(decl)?),
    };
    let test = match condition {
      Some(condition) => self.lower_expr(condition)?,
      None => "True".to_string(),
    };
    lines.push(self.line(format!("while {test}:")));
    let body = self.with_jump_target(target, |cx| {
      cx.indented(|cx| {
        cx.with_hoist_scope(|cx| {
          let mut fragments = cx.lower_block_fragments(body)?;
          if let Some(post) = post {
            fragments.extend(cx.splice_hoisted(|cx| cx.lower_expr_stmt(post))?);
          };
          Ok(cx.join_or_pass(fragments))
        })
      })
    })?;
    lines.push(body);
    Ok(lines.join("\n"))
  }

  /// `for`-`in` and `for`-`of` both iterate the lowered right-hand side.
  fn lower_for_in_of(
    &mut self,
    pat: &Node,
    rhs: &Node,
    body: &Node,
    is_async: bool,
    label: Option<&str>,
  ) -> LowerResult<String> {
    let target = JumpTarget::Loop {
      label: label.map(str::to_string),
    };
    let iterable = self.lower_expr(rhs)?;
    let (binding, body) = self.with_jump_target(target, |cx| {
      cx.indented(|cx| {
        cx.with_hoist_scope(|cx| {
          let (binding, mut fragments) = cx.bind_clause_target(pat)?;
          fragments.extend(cx.lower_block_fragments(body)?);
          Ok((binding, cx.join_or_pass(fragments)))
        })
      })
    })?;
    let header = self.line(format!(
      "{}for {binding} in {iterable}:",
      if is_async { "async " } else { "" }
    ));
    Ok(format!("{header}\n{body}"))
  }

  fn lower_if(
    &mut self,
    test: &Node,
    consequent: &Node,
    alternate: Option<&Node>,
  ) -> LowerResult<String> {
    let test = self.lower_expr(test)?;
    let mut lines = vec![self.line(format!("if {test}:"))];
    lines.push(self.lower_suite(consequent)?);
    let mut alternate = alternate;
    while let Some(alt) = alternate {
      match alt.stx.as_ref() {
        Syntax::IfStmt {
          test,
          consequent,
          alternate: next,
        } => {
          let test = self.lower_expr(test)?;
          lines.push(self.line(format!("elif {test}:")));
          lines.push(self.lower_suite(consequent)?);
          alternate = next.as_ref();
        }
        _ => {
          lines.push(self.line("else:"));
          lines.push(self.lower_suite(alt)?);
          alternate = None;
        }
      };
    }
    Ok(lines.join("\n"))
  }

  /// Tests that are not valid patterns become guards. Guards compare against a plain name, so a
  /// discriminant with side effects is bound to a temporary first. The `default` arm goes last.
  fn lower_switch(&mut self, test: &Node, branches: &[Node]) -> LowerResult<String> {
    let subject = self.lower_expr(test)?;
    let needs_guard = branches.iter().any(|branch| {
      matches!(
        branch.stx.as_ref(),
        Syntax::SwitchBranch { case: Some(case), .. } if !is_match_pattern(case)
      )
    });
    let mut lines = Vec::new();
    let mut temp = None;
    let subject = match test.stx.as_ref() {
      Syntax::IdentifierExpr { .. } => subject,
      _ if needs_guard => {
        let name = self.temp_name();
        lines.push(self.line(format!("{name} = {subject}")));
        temp = Some(name.clone());
        name
      }
      _ => subject,
    };

    let mut arms = Vec::with_capacity(branches.len());
    let mut default_arm = None;
    for branch in branches {
      let Syntax::SwitchBranch { case, body } = branch.stx.as_ref() else {
        return Err(LowerError::malformed("switch branch"));
      };
      let body = without_trailing_break(body);
      match case {
        None => default_arm = Some(("_".to_string(), body)),
        Some(case) if is_match_pattern(case) => arms.push((self.lower_expr(case)?, body)),
        Some(case) => {
          let case = self.lower_expr(case)?;
          arms.push((format!("_ if {subject} == {case}"), body));
        }
      };
    }
    arms.extend(default_arm);

    lines.push(self.line(format!("match {subject}:")));
    lines.push(self.with_jump_target(JumpTarget::Switch, |cx| {
      cx.indented(|cx| -> LowerResult<String> {
        let mut lines = Vec::with_capacity(arms.len() * 2);
        for (pattern, body) in arms {
          lines.push(cx.line(format!("case {pattern}:")));
          lines.push(cx.indented(|cx| {
            cx.with_hoist_scope(|cx| {
              let fragments = cx.lower_stmt_seq(body)?;
              Ok(cx.join_or_pass(fragments))
            })
          })?);
        }
        Ok(lines.join("\n"))
      })
    })?);
    if let Some(temp) = temp {
      lines.push(self.line(format!("del {temp}")));
    };
    Ok(lines.join("\n"))
  }

  fn lower_try(
    &mut self,
    wrapped: &Node,
    catch: Option<&Node>,
    finally: Option<&Node>,
  ) -> LowerResult<String> {
    let mut lines = vec![self.line("try:")];
    lines.push(self.lower_suite(wrapped)?);
    if let Some(catch) = catch {
      let Syntax::CatchBlock { parameter, body } = catch.stx.as_ref() else {
        return Err(LowerError::malformed("catch clause"));
      };
      let (clause, body) = self.indented(|cx| {
        cx.with_hoist_scope(|cx| {
          let (clause, mut fragments) = match parameter {
            Some(parameter) => {
              let (binding, prelude) = cx.bind_clause_target(parameter)?;
              (format!("except Exception as {binding}:"), prelude)
            }
            None => ("except Exception:".to_string(), Vec::new()),
          };
          fragments.extend(cx.lower_stmt_seq(body)?);
          Ok((clause, cx.join_or_pass(fragments)))
        })
      })?;
      lines.push(self.line(clause));
      lines.push(body);
    };
    if let Some(finally) = finally {
      lines.push(self.line("finally:"));
      lines.push(self.lower_suite(finally)?);
    };
    Ok(lines.join("\n"))
  }
}
