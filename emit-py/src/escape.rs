fn push_escaped_char(out: &mut String, ch: char) {
  match ch {
    '\\' => out.push_str("\\\\"),
    '\n' => out.push_str("\\n"),
    '\r' => out.push_str("\\r"),
    '\t' => out.push_str("\\t"),
    ch if ch < '\u{20}' || ch == '\u{7f}' => {
      out.push_str(&format!("\\x{:02x}", ch as u32));
    }
    '\u{2028}' => out.push_str("\\u2028"),
    '\u{2029}' => out.push_str("\\u2029"),
    ch => out.push(ch),
  };
}

/// A single-quoted Python string literal holding `value`.
pub fn py_string_literal(value: &str) -> String {
  let mut out = String::with_capacity(value.len() + 2);
  out.push('\'');
  for ch in value.chars() {
    match ch {
      '\'' => out.push_str("\\'"),
      ch => push_escaped_char(&mut out, ch),
    };
  }
  out.push('\'');
  out
}

/// Literal text inside a triple-double-quoted f-string. Braces are doubled so they are not read
/// as replacement fields.
pub fn py_fstring_segment(value: &str) -> String {
  let mut out = String::with_capacity(value.len());
  for ch in value.chars() {
    match ch {
      '{' => out.push_str("{{"),
      '}' => out.push_str("}}"),
      '"' => out.push_str("\\\""),
      ch => push_escaped_char(&mut out, ch),
    };
  }
  out
}

/// Python spelling of a JavaScript number value.
pub fn py_number(value: f64) -> String {
  if value.is_nan() {
    "float('nan')".to_string()
  } else if value.is_infinite() {
    if value > 0.0 {
      "float('inf')".to_string()
    } else {
      "float('-inf')".to_string()
    }
  } else if value.fract() == 0.0 && value.abs() < 1e21 {
    format!("{value:.0}")
  } else {
    format!("{value}")
  }
}
