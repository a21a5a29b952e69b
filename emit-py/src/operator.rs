use ahash::AHashMap;
use once_cell::sync::Lazy;
use parse_js::operator::OperatorName;

pub static BINARY_OPERATOR_SYNTAX: Lazy<AHashMap<OperatorName, &'static str>> = Lazy::new(|| {
  let mut map = AHashMap::<OperatorName, &'static str>::new();
  // Excluded: Comma, which lowers to separate statements.
  map.insert(OperatorName::Addition, "+");
  map.insert(OperatorName::Assignment, "=");
  map.insert(OperatorName::AssignmentAddition, "+=");
  map.insert(OperatorName::AssignmentBitwiseAnd, "&=");
  map.insert(OperatorName::AssignmentBitwiseLeftShift, "<<=");
  map.insert(OperatorName::AssignmentBitwiseOr, "|=");
  map.insert(OperatorName::AssignmentBitwiseRightShift, ">>=");
  map.insert(OperatorName::AssignmentBitwiseUnsignedRightShift, ">>>=");
  map.insert(OperatorName::AssignmentBitwiseXor, "^=");
  map.insert(OperatorName::AssignmentDivision, "/=");
  map.insert(OperatorName::AssignmentExponentiation, "**=");
  map.insert(OperatorName::AssignmentLogicalAnd, "&&=");
  map.insert(OperatorName::AssignmentLogicalOr, "||=");
  map.insert(OperatorName::AssignmentMultiplication, "*=");
  map.insert(OperatorName::AssignmentNullishCoalescing, "??=");
  map.insert(OperatorName::AssignmentRemainder, "%=");
  map.insert(OperatorName::AssignmentSubtraction, "-=");
  map.insert(OperatorName::BitwiseAnd, "&");
  map.insert(OperatorName::BitwiseLeftShift, "<<");
  map.insert(OperatorName::BitwiseOr, "|");
  map.insert(OperatorName::BitwiseRightShift, ">>");
  map.insert(OperatorName::BitwiseUnsignedRightShift, ">>>");
  map.insert(OperatorName::BitwiseXor, "^");
  map.insert(OperatorName::Division, "/");
  map.insert(OperatorName::Equality, "==");
  map.insert(OperatorName::Exponentiation, "**");
  map.insert(OperatorName::GreaterThan, ">");
  map.insert(OperatorName::GreaterThanOrEqual, ">=");
  map.insert(OperatorName::In, "in");
  map.insert(OperatorName::Inequality, "!=");
  map.insert(OperatorName::Instanceof, "instanceof");
  map.insert(OperatorName::LessThan, "<");
  map.insert(OperatorName::LessThanOrEqual, "<=");
  map.insert(OperatorName::LogicalAnd, "and");
  map.insert(OperatorName::LogicalOr, "or");
  map.insert(OperatorName::Multiplication, "*");
  map.insert(OperatorName::NullishCoalescing, "??");
  map.insert(OperatorName::Remainder, "%");
  map.insert(OperatorName::StrictEquality, "==");
  map.insert(OperatorName::StrictInequality, "!=");
  map.insert(OperatorName::Subtraction, "-");
  map
});

static RESERVED_RENAMES: Lazy<AHashMap<&'static str, &'static str>> = Lazy::new(|| {
  let mut map = AHashMap::<&'static str, &'static str>::new();
  // Would shadow the module namespace lookup the runtime relies on.
  map.insert("global", "globals");
  map.insert("Error", "Exception");
  map
});

/// Name an identifier takes in the output.
pub fn py_identifier(name: &str) -> &str {
  RESERVED_RENAMES.get(name).copied().unwrap_or(name)
}

/// Name a property or class member takes in the output. Private `#name` members use the
/// name-mangled `__name` form.
pub fn py_member_name(name: &str) -> String {
  match name.strip_prefix('#') {
    Some(private) => format!("__{private}"),
    None => name.to_string(),
  }
}
