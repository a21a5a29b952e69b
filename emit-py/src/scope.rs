use crate::err::snippet;
use crate::err::LowerError;
use crate::err::LowerResult;
use crate::err::Span;
use std::mem;

pub(crate) const INDENT_UNIT: &str = "    ";

/// A statement surfaced ahead of the statement currently being lowered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Hoisted {
  /// A full function or class definition; followed by a blank separator line when spliced.
  Definition(String),
  /// A single binding statement, such as a destructuring temporary.
  Binding(String),
}

/// What a `break` or `continue` would jump out of.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum JumpTarget {
  Loop { label: Option<String> },
  Switch,
}

/// How `this` lowers inside a function body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ThisMode {
  /// Arrow functions see the enclosing binding.
  Inherit,
  /// Ordinary functions receive `this` as an explicit parameter.
  Own,
  /// Class members refer to the instance parameter.
  Instance,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Placeholder {
  pub construct: &'static str,
  pub span: Option<Span>,
  pub snippet: String,
}

/// Mutable state threaded through one translation run.
#[derive(Debug, Default)]
pub struct LowerCtx<'s> {
  source: &'s str,
  indent_level: usize,
  hoisted: Vec<Hoisted>,
  saved_hoisted: Vec<Vec<Hoisted>>,
  anon_counter: usize,
  in_class_body: bool,
  jump_targets: Vec<JumpTarget>,
  placeholders: Vec<Placeholder>,
}

impl<'s> LowerCtx<'s> {
  pub fn new(source: &'s str) -> Self {
    Self {
      source,
      ..Self::default()
    }
  }

  pub(crate) fn source(&self) -> &'s str {
    self.source
  }

  pub(crate) fn indent(&mut self) {
    self.indent_level += 1;
  }

  pub(crate) fn dedent(&mut self) {
    self.indent_level = self.indent_level.saturating_sub(1);
  }

  #[cfg(test)]
  pub(crate) fn indent_level(&self) -> usize {
    self.indent_level
  }

  pub(crate) fn current_indent(&self) -> String {
    INDENT_UNIT.repeat(self.indent_level)
  }

  /// One physical line at the current depth.
  pub(crate) fn line(&self, text: impl AsRef<str>) -> String {
    format!("{}{}", self.current_indent(), text.as_ref())
  }

  /// Runs `f` one level deeper. The level is restored on every path, including errors.
  pub(crate) fn indented<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
    self.indent();
    let res = f(self);
    self.dedent();
    res
  }

  pub(crate) fn push_hoist_scope(&mut self) {
    let outer = mem::take(&mut self.hoisted);
    self.saved_hoisted.push(outer);
  }

  pub(crate) fn pop_hoist_scope(&mut self) -> Vec<Hoisted> {
    let outer = self.saved_hoisted.pop().unwrap_or_default();
    mem::replace(&mut self.hoisted, outer)
  }

  /// Runs `f` with a private hoist buffer. Anything `f` leaves behind in it is dropped, as every
  /// statement list drains its own hoists.
  pub(crate) fn with_hoist_scope<T>(
    &mut self,
    f: impl FnOnce(&mut Self) -> LowerResult<T>,
  ) -> LowerResult<T> {
    self.push_hoist_scope();
    let res = f(self);
    let leftover = self.pop_hoist_scope();
    debug_assert!(
      res.is_err() || leftover.is_empty(),
      "hoisted statements were never spliced"
    );
    res
  }

  pub(crate) fn hoist(&mut self, hoisted: Hoisted) {
    if let Hoisted::Definition(text) = &hoisted {
      tracing::trace!(
        header = text.lines().find(|l| !l.trim_start().starts_with('@')),
        "hoisted definition"
      );
    };
    self.hoisted.push(hoisted);
  }

  pub(crate) fn hoist_mark(&self) -> usize {
    self.hoisted.len()
  }

  /// Removes everything hoisted since `mark`, rendered as spliceable lines.
  pub(crate) fn take_hoisted_since(&mut self, mark: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for hoisted in self.hoisted.drain(mark..) {
      match hoisted {
        Hoisted::Definition(text) => {
          lines.push(text);
          lines.push(String::new());
        }
        Hoisted::Binding(text) => lines.push(text),
      };
    }
    lines
  }

  pub(crate) fn discard_hoisted_since(&mut self, mark: usize) {
    self.hoisted.truncate(mark);
  }

  /// Runs `f` and returns its fragment preceded by everything it hoisted.
  pub(crate) fn splice_hoisted(
    &mut self,
    f: impl FnOnce(&mut Self) -> LowerResult<String>,
  ) -> LowerResult<Vec<String>> {
    let mark = self.hoist_mark();
    let fragment = f(self)?;
    let mut lines = self.take_hoisted_since(mark);
    if !fragment.is_empty() {
      lines.push(fragment);
    };
    Ok(lines)
  }

  /// Next value of the run-wide counter. Never repeats within a run.
  pub(crate) fn next_anon_id(&mut self) -> usize {
    let id = self.anon_counter;
    self.anon_counter += 1;
    id
  }

  pub(crate) fn temp_name(&mut self) -> String {
    format!("_temp_{}", self.next_anon_id())
  }

  pub(crate) fn in_class_body(&self) -> bool {
    self.in_class_body
  }

  pub(crate) fn with_this_mode<T>(&mut self, mode: ThisMode, f: impl FnOnce(&mut Self) -> T) -> T {
    let outer = self.in_class_body;
    match mode {
      ThisMode::Inherit => {}
      ThisMode::Own => self.in_class_body = false,
      ThisMode::Instance => self.in_class_body = true,
    };
    let res = f(self);
    self.in_class_body = outer;
    res
  }

  /// Function bodies start with no enclosing loop or switch.
  pub(crate) fn with_fresh_jump_targets<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
    let outer = mem::take(&mut self.jump_targets);
    let res = f(self);
    self.jump_targets = outer;
    res
  }

  pub(crate) fn with_jump_target<T>(
    &mut self,
    target: JumpTarget,
    f: impl FnOnce(&mut Self) -> T,
  ) -> T {
    self.jump_targets.push(target);
    let res = f(self);
    self.jump_targets.pop();
    res
  }

  pub(crate) fn innermost_jump_target(&self) -> Option<&JumpTarget> {
    self.jump_targets.last()
  }

  /// The innermost loop, and whether a switch sits between it and the current statement.
  pub(crate) fn innermost_loop(&self) -> Option<(&Option<String>, bool)> {
    let mut crosses_switch = false;
    for target in self.jump_targets.iter().rev() {
      match target {
        JumpTarget::Loop { label } => return Some((label, crosses_switch)),
        JumpTarget::Switch => crosses_switch = true,
      };
    }
    None
  }

  pub(crate) fn record_placeholder(&mut self, err: &LowerError) {
    self.placeholders.push(Placeholder {
      construct: err.construct(),
      span: err.span,
      snippet: err
        .span
        .map(|span| snippet(self.source, span))
        .unwrap_or_default(),
    });
  }

  pub(crate) fn take_placeholders(&mut self) -> Vec<Placeholder> {
    mem::take(&mut self.placeholders)
  }
}
