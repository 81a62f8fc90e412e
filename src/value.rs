//! Raw cell values at the ingestion boundary.
//!
//! Upstream collaborators hand over label columns that are not always clean
//! strings: missing values, numeric class ids, or the odd structured blob.
//! `LabelCell` captures what arrived so normalization can coerce it to a
//! label string or reject it with a precise error.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::source::LabelSource;

/// A single, not yet normalized label cell.
///
/// Deserializes untagged from JSON: `null`, strings, integers, floats and
/// booleans map to their variants; arrays and objects land in `Structured`.
/// Integers above `i64::MAX` are kept exactly in `UInt` and never widened
/// to a float.
///
/// # Examples
///
/// ```
/// use kyrolabel::{LabelCell, LabelSource};
///
/// let cell = LabelCell::from(7_i64);
/// assert_eq!(cell.coerce(LabelSource::Camera, 0).unwrap(), Some("7".to_string()));
///
/// let missing = LabelCell::Null;
/// assert_eq!(missing.coerce(LabelSource::Manual, 0).unwrap(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LabelCell {
    #[default]
    Null,
    Text(String),
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
    Structured(serde_json::Value),
}

impl LabelCell {
    /// Returns true if the cell carries no value.
    ///
    /// A float `NaN` counts as missing, matching how dataframe tooling
    /// encodes absent cells.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Float(v) => v.is_nan(),
            Self::Structured(v) => v.is_null(),
            _ => false,
        }
    }

    /// Short name of the cell's type, used in error messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Text(_) => "text",
            Self::Int(_) | Self::UInt(_) => "integer",
            Self::Float(_) => "float",
            Self::Bool(_) => "boolean",
            Self::Structured(v) => json_kind(v),
        }
    }

    /// Coerce the cell to a label string.
    ///
    /// Returns `Ok(None)` for missing cells. Integers, finite floats and
    /// booleans are cast to their display form. Arrays, objects and infinite
    /// floats cannot be cast and fail with `TypeMismatch`.
    pub fn coerce(&self, source: LabelSource, row: usize) -> Result<Option<String>, ValidationError> {
        let mismatch = |found: &str| ValidationError::TypeMismatch {
            field: source.column_name().to_string(),
            row,
            found: found.to_string(),
        };

        match self {
            Self::Null => Ok(None),
            Self::Text(s) => Ok(Some(s.clone())),
            Self::Int(v) => Ok(Some(v.to_string())),
            Self::UInt(v) => Ok(Some(v.to_string())),
            Self::Float(v) if v.is_nan() => Ok(None),
            Self::Float(v) if v.is_finite() => Ok(Some(v.to_string())),
            Self::Float(_) => Err(mismatch("non-finite float")),
            Self::Bool(v) => Ok(Some(v.to_string())),
            Self::Structured(v) => match v {
                serde_json::Value::Null => Ok(None),
                serde_json::Value::String(s) => Ok(Some(s.clone())),
                serde_json::Value::Number(n) => Ok(Some(n.to_string())),
                serde_json::Value::Bool(b) => Ok(Some(b.to_string())),
                serde_json::Value::Array(_) | serde_json::Value::Object(_) => Err(mismatch(json_kind(v))),
            },
        }
    }
}

const fn json_kind(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "text",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

impl From<&str> for LabelCell {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for LabelCell {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for LabelCell {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u64> for LabelCell {
    fn from(value: u64) -> Self {
        Self::UInt(value)
    }
}

impl From<f64> for LabelCell {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for LabelCell {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl<T: Into<LabelCell>> From<Option<T>> for LabelCell {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_untagged() {
        let cells: Vec<LabelCell> = serde_json::from_str(r#"[null, "dog", 3, 2.5, true, [1], {"a": 1}]"#).unwrap();
        assert_eq!(cells[0], LabelCell::Null);
        assert_eq!(cells[1], LabelCell::Text("dog".to_string()));
        assert_eq!(cells[2], LabelCell::Int(3));
        assert_eq!(cells[3], LabelCell::Float(2.5));
        assert_eq!(cells[4], LabelCell::Bool(true));
        assert_eq!(cells[5].type_name(), "array");
        assert_eq!(cells[6].type_name(), "object");
    }

    #[test]
    fn test_large_unsigned_ids_stay_exact() {
        let cells: Vec<LabelCell> =
            serde_json::from_str("[18446744073709551615, 18446744073709551614, 9223372036854775807]").unwrap();
        assert_eq!(cells[0], LabelCell::UInt(u64::MAX));
        assert_eq!(cells[1], LabelCell::UInt(u64::MAX - 1));
        assert_eq!(cells[2], LabelCell::Int(i64::MAX));

        let src = LabelSource::Sensor;
        assert_eq!(cells[0].coerce(src, 0).unwrap(), Some("18446744073709551615".to_string()));
        assert_eq!(cells[1].coerce(src, 0).unwrap(), Some("18446744073709551614".to_string()));
        assert_eq!(cells[0].type_name(), "integer");
    }

    #[test]
    fn test_missing_values() {
        assert!(LabelCell::Null.is_missing());
        assert!(LabelCell::Float(f64::NAN).is_missing());
        assert!(!LabelCell::Text(String::new()).is_missing());
        assert!(!LabelCell::Int(0).is_missing());
    }

    #[test]
    fn test_coerce_scalars() {
        let src = LabelSource::Camera;
        assert_eq!(LabelCell::from("cat").coerce(src, 0).unwrap(), Some("cat".to_string()));
        assert_eq!(LabelCell::from(12_i64).coerce(src, 0).unwrap(), Some("12".to_string()));
        assert_eq!(LabelCell::from(1.5).coerce(src, 0).unwrap(), Some("1.5".to_string()));
        assert_eq!(LabelCell::from(false).coerce(src, 0).unwrap(), Some("false".to_string()));
        assert_eq!(LabelCell::Float(f64::NAN).coerce(src, 0).unwrap(), None);
        assert_eq!(LabelCell::Null.coerce(src, 0).unwrap(), None);
    }

    #[test]
    fn test_coerce_structured_rejected() {
        let cell = LabelCell::Structured(serde_json::json!(["dog", "cat"]));
        let err = cell.coerce(LabelSource::Manual, 4).unwrap_err();
        match err {
            ValidationError::TypeMismatch { field, row, found } => {
                assert_eq!(field, "manualLabel");
                assert_eq!(row, 4);
                assert_eq!(found, "array");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_coerce_infinite_rejected() {
        let err = LabelCell::Float(f64::INFINITY).coerce(LabelSource::Sensor, 1).unwrap_err();
        assert!(matches!(err, ValidationError::TypeMismatch { .. }));
    }

    #[test]
    fn test_from_option() {
        assert_eq!(LabelCell::from(None::<String>), LabelCell::Null);
        assert_eq!(LabelCell::from(Some("dog")), LabelCell::Text("dog".to_string()));
    }
}
