use itertools::Itertools;
use parse_js::ast::Node;
use parse_js::error::SyntaxError;
use parse_js::loc::Loc;
use std::error::Error;
use std::fmt;
use std::fmt::Display;
use std::fmt::Formatter;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LowerErrorKind {
  /// A recognised node shape with no lowering yet. Degrades to a placeholder statement.
  Unsupported(&'static str),
  /// The tree does not have the shape the lowering relies on. Aborts the pass.
  Malformed(&'static str),
}

/// Byte offsets into the translated source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span {
  pub start: usize,
  pub end: usize,
}

impl From<Loc> for Span {
  fn from(loc: Loc) -> Self {
    Span {
      start: loc.0,
      end: loc.1,
    }
  }
}

#[derive(Clone, Debug)]
pub struct LowerError {
  pub kind: LowerErrorKind,
  pub span: Option<Span>,
}

impl LowerError {
  pub(crate) fn unsupported(construct: &'static str) -> Self {
    Self {
      kind: LowerErrorKind::Unsupported(construct),
      span: None,
    }
  }

  pub(crate) fn malformed(construct: &'static str) -> Self {
    Self {
      kind: LowerErrorKind::Malformed(construct),
      span: None,
    }
  }

  /// Attaches the position of `node`, unless a more deeply nested node already did.
  pub(crate) fn with_node(self, node: &Node) -> Self {
    self.with_span(node.loc.into())
  }

  pub(crate) fn with_span(mut self, span: Span) -> Self {
    if self.span.is_none() {
      self.span = Some(span);
    }
    self
  }

  pub(crate) fn is_unsupported(&self) -> bool {
    matches!(self.kind, LowerErrorKind::Unsupported(_))
  }

  pub fn construct(&self) -> &'static str {
    match self.kind {
      LowerErrorKind::Unsupported(c) | LowerErrorKind::Malformed(c) => c,
    }
  }
}

impl Display for LowerError {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    match self.kind {
      LowerErrorKind::Unsupported(c) => write!(f, "unsupported {c}"),
      LowerErrorKind::Malformed(c) => write!(f, "malformed syntax tree: {c}"),
    }
  }
}

impl Error for LowerError {}

pub type LowerResult<T> = Result<T, LowerError>;

pub(crate) fn with_node_context<T>(
  node: &Node,
  f: impl FnOnce() -> LowerResult<T>,
) -> LowerResult<T> {
  f().map_err(|err| err.with_node(node))
}

/// Collapses all whitespace runs so source text can sit inside a one-line comment.
pub(crate) fn single_line(text: &str) -> String {
  text.split_whitespace().join(" ")
}

/// Source text under `span`, collapsed onto one line. Empty if the span does not fall on
/// character boundaries of `source`.
pub(crate) fn snippet(source: &str, span: Span) -> String {
  source
    .get(span.start..span.end)
    .map(single_line)
    .unwrap_or_default()
}

/// 1-based line and column of a byte offset.
pub(crate) fn line_and_column(source: &str, offset: usize) -> (usize, usize) {
  let offset = offset.min(source.len());
  let before = &source.as_bytes()[..offset];
  let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
  let line_start = before
    .iter()
    .rposition(|&b| b == b'\n')
    .map_or(0, |i| i + 1);
  let column = String::from_utf8_lossy(&before[line_start..]).chars().count() + 1;
  (line, column)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TranslateError {
  /// The source could not be parsed.
  Syntax {
    message: String,
    line: usize,
    column: usize,
  },
  /// The parsed tree broke a structural assumption of the lowering.
  Malformed {
    construct: &'static str,
    line: usize,
    column: usize,
  },
}

impl TranslateError {
  pub(crate) fn from_syntax(source: &str, err: &SyntaxError) -> Self {
    let (line, column) = line_and_column(source, err.loc.0);
    TranslateError::Syntax {
      message: err.to_string(),
      line,
      column,
    }
  }

  pub(crate) fn from_lower(source: &str, err: &LowerError) -> Self {
    let (line, column) = err
      .span
      .map_or((1, 1), |span| line_and_column(source, span.start));
    TranslateError::Malformed {
      construct: err.construct(),
      line,
      column,
    }
  }
}

impl Display for TranslateError {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    match self {
      TranslateError::Syntax {
        message,
        line,
        column,
      } => write!(f, "syntax error at {line}:{column}: {message}"),
      TranslateError::Malformed {
        construct,
        line,
        column,
      } => write!(
        f,
        "cannot lower {construct} at {line}:{column}: unexpected syntax tree shape"
      ),
    }
  }
}

impl Error for TranslateError {}
