// compare.rs — The two atomic comparison rules.
//
// list_satisfies: every required item must appear in the actual list.
//   Order is ignored and extra actual items are fine. Absent/null on either
//   side normalizes to an empty list, so an empty requirement always holds.
// scalar_satisfies: exact JSON equality. "enforced" != "Enforced" and
//   "1" != 1; absent compares as null.
//
// Both rules compare through values_equal: numbers compare by value, so a
// YAML `4.0` equals a JSON `4`. Values of different types are never equal.

use serde_json::{Number, Value};

use crate::document::normalize;

/// True iff every element of `required` appears in `actual`.
pub fn list_satisfies(actual: Option<&Value>, required: Option<&Value>) -> bool {
    let actual = normalize(actual);
    normalize(required)
        .into_iter()
        .all(|item| actual.iter().any(|candidate| values_equal(candidate, item)))
}

/// True iff `actual` equals `required` exactly.
pub fn scalar_satisfies(actual: Option<&Value>, required: &Value) -> bool {
    values_equal(actual.unwrap_or(&Value::Null), required)
}

/// Structural equality, with numbers compared by value.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => numbers_equal(x, y),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(key, x)| ys.get(key).is_some_and(|y| values_equal(x, y)))
        }
        _ => a == b,
    }
}

fn numbers_equal(x: &Number, y: &Number) -> bool {
    if let (Some(a), Some(b)) = (x.as_i64(), y.as_i64()) {
        return a == b;
    }
    if let (Some(a), Some(b)) = (x.as_u64(), y.as_u64()) {
        return a == b;
    }
    match (x.as_f64(), y.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}
