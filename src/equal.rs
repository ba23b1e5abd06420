use serde_json::Value;

/// Deep equality over JSON values, as used by `const`, `enum` and
/// `uniqueItems`.
///
/// Objects compare by key set and per-key value; member order never matters.
/// Numbers compare by their 64-bit float value, so `1` and `1.0` are the same
/// number here even though they deserialize to different representations.
pub(crate) fn deep_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Value::String(a), Value::String(b)) => a == b,

        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(a, b)| deep_equal(a, b))
        }

        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter().all(|(key, value)| match b.get(key) {
                    Some(other) => deep_equal(value, other),
                    None => false,
                })
        }

        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalars() {
        assert!(deep_equal(&json!(null), &json!(null)));
        assert!(deep_equal(&json!(true), &json!(true)));
        assert!(deep_equal(&json!("a"), &json!("a")));
        assert!(!deep_equal(&json!("a"), &json!("b")));
        assert!(!deep_equal(&json!(0), &json!(null)));
        assert!(!deep_equal(&json!(0), &json!(false)));
        assert!(!deep_equal(&json!(1), &json!(true)));
    }

    #[test]
    fn numbers_compare_by_value() {
        assert!(deep_equal(&json!(1), &json!(1.0)));
        assert!(deep_equal(&json!(-2.0), &json!(-2)));
        assert!(!deep_equal(&json!(1), &json!(1.5)));
    }

    #[test]
    fn arrays() {
        assert!(deep_equal(&json!([1, 2, 3]), &json!([1, 2, 3])));
        assert!(!deep_equal(&json!([1, 2, 3]), &json!([1, 2])));
        assert!(!deep_equal(&json!([1, 2, 3]), &json!([1, 2, 4])));
        assert!(!deep_equal(&json!([]), &json!({})));
    }

    #[test]
    fn objects_ignore_member_order() {
        assert!(deep_equal(
            &json!({"a": 1, "b": [true, {"c": "d"}]}),
            &json!({"b": [true, {"c": "d"}], "a": 1})
        ));
        assert!(!deep_equal(&json!({"a": 1}), &json!({"a": 1, "b": 2})));
        assert!(!deep_equal(&json!({"a": 1}), &json!({"b": 1})));
    }
}
