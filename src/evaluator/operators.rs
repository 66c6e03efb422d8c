use serde_json::Value;

/// Coerce a value to f64 for numeric comparison. Numbers and numeric
/// strings coerce; everything else is non-numeric.
pub fn to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse::<f64>().ok(),
        _ => None,
    }
}

/// Coerce a value to a string for substring matching.
pub fn to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Loose equality: exact JSON equality, or numeric equality after coercion
/// so that `"42"` and `42` compare equal.
pub fn loose_eq(value: &Value, target: &Value) -> bool {
    if value == target {
        return true;
    }
    match (to_number(value), to_number(target)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Numeric comparison. Either operand failing to coerce yields `false`.
pub fn compare_numeric<F>(value: &Value, target: &Value, compare: F) -> bool
where
    F: Fn(f64, f64) -> bool,
{
    match (to_number(value), to_number(target)) {
        (Some(a), Some(b)) => compare(a, b),
        _ => false,
    }
}

/// Substring / membership containment. A string value contains the
/// stringified target; an array value contains the target element.
pub fn contains(value: &Value, target: &Value) -> bool {
    match value {
        Value::String(s) => s.contains(&to_text(target)),
        Value::Array(items) => items.iter().any(|item| loose_eq(item, target)),
        _ => false,
    }
}

/// Membership of `value` in the target sequence. A non-sequence target is
/// `false`, never an error.
pub fn in_sequence(value: &Value, target: &Value) -> bool {
    match target {
        Value::Array(items) => items.iter().any(|item| loose_eq(value, item)),
        _ => false,
    }
}
