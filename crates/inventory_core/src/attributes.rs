use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// Provider-neutral view of one stored attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoredAttribute {
    S(String),
    N(String),
    Other,
}

pub type StoredItem = BTreeMap<String, StoredAttribute>;

impl StoredAttribute {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::S(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_number_text(&self) -> Option<&str> {
        match self {
            Self::N(value) => Some(value),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::S(value) => Value::String(value.clone()),
            Self::N(value) => normalize_number(value),
            Self::Other => Value::Null,
        }
    }
}

/// Renders a stored decimal as a JSON integer when it has no fractional part,
/// otherwise as a float. Unparseable input is kept as a string.
pub fn normalize_number(raw: &str) -> Value {
    let trimmed = raw.trim();
    if let Ok(integer) = trimmed.parse::<i64>() {
        return Value::Number(Number::from(integer));
    }

    match trimmed.parse::<f64>() {
        Ok(float) if float.is_finite() => {
            if float.fract() == 0.0 && float.abs() < i64::MAX as f64 {
                Value::Number(Number::from(float as i64))
            } else {
                Number::from_f64(float)
                    .map(Value::Number)
                    .unwrap_or_else(|| Value::String(raw.to_string()))
            }
        }
        _ => Value::String(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn integral_decimals_become_integers() {
        assert_eq!(normalize_number("5"), json!(5));
        assert_eq!(normalize_number("5.0"), json!(5));
        assert_eq!(normalize_number("-3"), json!(-3));
    }

    #[test]
    fn fractional_decimals_become_floats() {
        assert_eq!(normalize_number("2.5"), json!(2.5));
    }

    #[test]
    fn unparseable_numbers_are_kept_verbatim() {
        assert_eq!(normalize_number("abc"), json!("abc"));
    }

    #[test]
    fn non_scalar_attributes_render_as_null() {
        assert_eq!(StoredAttribute::Other.to_json(), Value::Null);
        assert_eq!(StoredAttribute::S("Berlin".to_string()).to_json(), json!("Berlin"));
    }
}
