//! Value types shared by credential attributes, data-type properties, and
//! vocabulary properties.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The type of a single attribute or property value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValueType {
    /// Free text.
    #[default]
    String,
    /// Any number.
    Number,
    /// Whole number.
    Integer,
    /// true / false.
    Boolean,
    /// Calendar date.
    Date,
    /// Date and time.
    DateTime,
    /// Image reference or data URI.
    Image,
    /// Nested object.
    Object,
    /// List of values.
    Array,
}

impl ValueType {
    /// Whether a value of type `self` can fill a slot of type `target`.
    ///
    /// ```
    /// use cornerstone_core::model::ValueType;
    ///
    /// assert!(ValueType::Integer.is_compatible_with(ValueType::Number));
    /// assert!(!ValueType::Number.is_compatible_with(ValueType::Integer));
    /// assert!(ValueType::Boolean.is_compatible_with(ValueType::String));
    /// ```
    pub fn is_compatible_with(self, target: ValueType) -> bool {
        use ValueType::*;
        self == target
            || matches!(
            (self, target),
            (Integer, Number) | (Date, DateTime) | (DateTime, Date) | (_, String)
        )
    }

    /// Infer a value type from a JSON Schema property definition.
    pub fn from_json_schema(schema: &Value) -> Self {
        let format = schema.get("format").and_then(Value::as_str);
        match schema.get("type").and_then(Value::as_str) {
            Some("integer") => ValueType::Integer,
            Some("number") => ValueType::Number,
            Some("boolean") => ValueType::Boolean,
            Some("object") => ValueType::Object,
            Some("array") => ValueType::Array,
            Some("string") => match format {
                Some("date") => ValueType::Date,
                Some("date-time") => ValueType::DateTime,
                Some("uri") if schema.get("contentMediaType").is_some() => ValueType::Image,
                _ => ValueType::String,
            },
            _ => ValueType::String,
        }
    }

    /// Kebab-case name as used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Number => "number",
            ValueType::Integer => "integer",
            ValueType::Boolean => "boolean",
            ValueType::Date => "date",
            ValueType::DateTime => "date-time",
            ValueType::Image => "image",
            ValueType::Object => "object",
            ValueType::Array => "array",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_compatibility_rules() {
        use ValueType::*;
        assert!(String.is_compatible_with(String));
        assert!(Integer.is_compatible_with(Number));
        assert!(Date.is_compatible_with(DateTime));
        assert!(DateTime.is_compatible_with(Date));
        assert!(Image.is_compatible_with(String));
        assert!(!String.is_compatible_with(Number));
        assert!(!Object.is_compatible_with(Array));
        assert!(!Number.is_compatible_with(Integer));
    }

    #[test]
    fn test_from_json_schema() {
        assert_eq!(
            ValueType::from_json_schema(&json!({"type": "integer"})),
            ValueType::Integer
        );
        assert_eq!(
            ValueType::from_json_schema(&json!({"type": "string", "format": "date"})),
            ValueType::Date
        );
        assert_eq!(
            ValueType::from_json_schema(&json!({"type": "string", "format": "date-time"})),
            ValueType::DateTime
        );
        assert_eq!(
            ValueType::from_json_schema(&json!({
                "type": "string", "format": "uri", "contentMediaType": "image/png"
            })),
            ValueType::Image
        );
        assert_eq!(ValueType::from_json_schema(&json!({})), ValueType::String);
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(
            serde_json::to_string(&ValueType::DateTime).unwrap(),
            "\"date-time\""
        );
        let t: ValueType = serde_json::from_str("\"boolean\"").unwrap();
        assert_eq!(t, ValueType::Boolean);
        assert_eq!(ValueType::DateTime.to_string(), "date-time");
    }
}
