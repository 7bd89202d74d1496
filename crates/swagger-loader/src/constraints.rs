//! Primitive type constraints: the JSON-Schema validation keywords a
//! parameter, item or schema attaches to its values.

use regex::Regex;
use serde_json::Value;
use swagger_model::{Constraints, DataType};

/// Whether a JSON value conforms to a declared simple type.
///
/// `file` has no JSON representation, so nothing conforms to it.
pub fn conforms_to(value: &Value, type_: DataType) -> bool {
    match type_ {
        DataType::String => value.is_string(),
        DataType::Number => value.is_number(),
        DataType::Integer => value.is_i64() || value.is_u64(),
        DataType::Boolean => value.is_boolean(),
        DataType::Array => value.is_array(),
        DataType::File => false,
    }
}

/// Checks a decoded value against a constraint set.
///
/// Pure function; returns every violation rather than stopping at the
/// first one.
pub fn check(value: &Value, constraints: &Constraints) -> Vec<String> {
    let mut violations = Vec::new();

    if let Some(n) = value.as_f64() {
        if let Some(maximum) = constraints.maximum {
            if constraints.exclusive_maximum.unwrap_or(false) {
                if n >= maximum {
                    violations.push(format!("{} is not below exclusive maximum {}", n, maximum));
                }
            } else if n > maximum {
                violations.push(format!("{} exceeds maximum {}", n, maximum));
            }
        }
        if let Some(minimum) = constraints.minimum {
            if constraints.exclusive_minimum.unwrap_or(false) {
                if n <= minimum {
                    violations.push(format!("{} is not above exclusive minimum {}", n, minimum));
                }
            } else if n < minimum {
                violations.push(format!("{} is below minimum {}", n, minimum));
            }
        }
        if let Some(multiple_of) = constraints.multiple_of {
            if !is_multiple_of(value, multiple_of) {
                violations.push(format!("{} is not a multiple of {}", n, multiple_of));
            }
        }
    }

    if let Some(s) = value.as_str() {
        let length = s.chars().count() as u64;
        if let Some(max_length) = constraints.max_length {
            if length > max_length {
                violations.push(format!(
                    "string of length {} exceeds maxLength {}",
                    length, max_length
                ));
            }
        }
        if let Some(min_length) = constraints.min_length {
            if length < min_length {
                violations.push(format!(
                    "string of length {} is below minLength {}",
                    length, min_length
                ));
            }
        }
        if let Some(pattern) = &constraints.pattern {
            match Regex::new(pattern) {
                Ok(re) => {
                    if !re.is_match(s) {
                        violations.push(format!("string does not match pattern `{}`", pattern));
                    }
                }
                Err(_) => violations.push(format!("pattern `{}` is not a valid regex", pattern)),
            }
        }
    }

    if let Some(items) = value.as_array() {
        let count = items.len() as u64;
        if let Some(max_items) = constraints.max_items {
            if count > max_items {
                violations.push(format!("{} item(s) exceed maxItems {}", count, max_items));
            }
        }
        if let Some(min_items) = constraints.min_items {
            if count < min_items {
                violations.push(format!("{} item(s) are below minItems {}", count, min_items));
            }
        }
        if constraints.unique_items.unwrap_or(false) {
            for (i, left) in items.iter().enumerate() {
                if let Some(j) = items[..i].iter().position(|right| right == left) {
                    violations.push(format!("items {} and {} are equal", j, i));
                }
            }
        }
    }

    if !constraints.enum_values.is_empty() && !constraints.enum_values.contains(value) {
        violations.push(format!("{} is not one of the enumerated values", value));
    }

    violations
}

/// `multipleOf` with exact arithmetic for integer operands.
fn is_multiple_of(value: &Value, multiple_of: f64) -> bool {
    if multiple_of == 0.0 {
        return false;
    }

    let integral = if let Some(v) = value.as_i64() {
        Some(v as i128)
    } else {
        value.as_u64().map(|v| v as i128)
    };

    if let (Some(v), true) = (integral, multiple_of.fract() == 0.0) {
        return v % (multiple_of as i128) == 0;
    }

    match value.as_f64() {
        Some(v) => {
            let quotient = v / multiple_of;
            (quotient - quotient.round()).abs() <= f64::EPSILON * quotient.abs().max(1.0)
        }
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn constraints(yaml: &str) -> Constraints {
        let raw: serde_json::Value = serde_yaml::from_str(yaml).unwrap();
        let mut c = Constraints::default();
        let obj = raw.as_object().unwrap();
        c.maximum = obj.get("maximum").and_then(Value::as_f64);
        c.exclusive_maximum = obj.get("exclusiveMaximum").and_then(Value::as_bool);
        c.minimum = obj.get("minimum").and_then(Value::as_f64);
        c.exclusive_minimum = obj.get("exclusiveMinimum").and_then(Value::as_bool);
        c.max_length = obj.get("maxLength").and_then(Value::as_u64);
        c.min_length = obj.get("minLength").and_then(Value::as_u64);
        c.pattern = obj
            .get("pattern")
            .and_then(Value::as_str)
            .map(str::to_string);
        c.max_items = obj.get("maxItems").and_then(Value::as_u64);
        c.min_items = obj.get("minItems").and_then(Value::as_u64);
        c.unique_items = obj.get("uniqueItems").and_then(Value::as_bool);
        c.multiple_of = obj.get("multipleOf").and_then(Value::as_f64);
        c.enum_values = obj
            .get("enum")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        c
    }

    #[test]
    fn test_inclusive_and_exclusive_bounds() {
        let inclusive = constraints("{ maximum: 10, minimum: 1 }");
        assert!(check(&json!(10), &inclusive).is_empty());
        assert!(check(&json!(1), &inclusive).is_empty());
        assert_eq!(check(&json!(11), &inclusive).len(), 1);

        let exclusive =
            constraints("{ maximum: 10, exclusiveMaximum: true, minimum: 1, exclusiveMinimum: true }");
        assert_eq!(check(&json!(10), &exclusive).len(), 1);
        assert_eq!(check(&json!(1), &exclusive).len(), 1);
        assert!(check(&json!(9.5), &exclusive).is_empty());
    }

    #[test]
    fn test_multiple_of_is_exact_for_integers() {
        let by_three = constraints("{ multipleOf: 3 }");
        assert!(check(&json!(9_000_000_000_000_000_003_u64), &by_three).is_empty());
        assert_eq!(check(&json!(9_000_000_000_000_000_002_u64), &by_three).len(), 1);

        let fractional = constraints("{ multipleOf: 0.5 }");
        assert!(check(&json!(2.5), &fractional).is_empty());
        assert_eq!(check(&json!(2.3), &fractional).len(), 1);
    }

    #[test]
    fn test_string_length_and_pattern() {
        let c = constraints("{ minLength: 2, maxLength: 4, pattern: 'a+' }");
        assert!(check(&json!("aaa"), &c).is_empty());
        assert_eq!(check(&json!("a"), &c).len(), 1);
        assert_eq!(check(&json!("bbbbb"), &c).len(), 2);

        // Unanchored match: a substring hit is enough.
        assert!(check(&json!("xax"), &c).is_empty());
    }

    #[test]
    fn test_invalid_pattern_is_a_violation() {
        let c = constraints("{ pattern: '(' }");
        assert_eq!(check(&json!("anything"), &c).len(), 1);
    }

    #[test]
    fn test_array_items() {
        let c = constraints("{ minItems: 1, maxItems: 3, uniqueItems: true }");
        assert!(check(&json!([1, 2]), &c).is_empty());
        assert_eq!(check(&json!([]), &c).len(), 1);
        assert_eq!(check(&json!([1, 2, 1]), &c).len(), 1);
        assert_eq!(check(&json!([1, 2, 3, 4]), &c).len(), 1);
    }

    #[test]
    fn test_enum_membership_is_exact() {
        let c = constraints("{ enum: [available, pending] }");
        assert!(check(&json!("available"), &c).is_empty());
        assert_eq!(check(&json!("sold"), &c).len(), 1);
        assert_eq!(check(&json!(1), &c).len(), 1);
    }

    #[test]
    fn test_conforms_to() {
        assert!(conforms_to(&json!("a"), DataType::String));
        assert!(conforms_to(&json!(1), DataType::Integer));
        assert!(conforms_to(&json!(1.5), DataType::Number));
        assert!(!conforms_to(&json!(1.5), DataType::Integer));
        assert!(conforms_to(&json!([1]), DataType::Array));
        assert!(!conforms_to(&json!("x"), DataType::File));
    }
}
