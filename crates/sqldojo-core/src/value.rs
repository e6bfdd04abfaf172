use rusqlite::types::ValueRef;
use serde::{Deserialize, Serialize};

/// A dynamically typed cell value, as produced by the engine.
///
/// `Bool` and `Timestamp` are refinements derived from the declared column
/// type; SQLite itself only distinguishes null/integer/real/text/blob.
/// Blobs are hex-encoded into `Text` so every value has a printable form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", tag = "type", content = "value")]
pub enum SqlValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Timestamp(String),
}

/// Integral floats up to this magnitude are exactly representable, so they
/// collapse into integer canonical form.
const EXACT_INT_BOUND: f64 = 9_007_199_254_740_992.0; // 2^53

impl SqlValue {
    pub fn from_sqlite(v: ValueRef<'_>, decl_type: Option<&str>) -> SqlValue {
        let decl = decl_type.map(|d| d.to_ascii_lowercase());
        let decl = decl.as_deref().unwrap_or("");
        match v {
            ValueRef::Null => SqlValue::Null,
            ValueRef::Integer(i) => {
                if decl.contains("bool") {
                    SqlValue::Bool(i != 0)
                } else {
                    SqlValue::Integer(i)
                }
            }
            ValueRef::Real(f) => SqlValue::Float(f),
            ValueRef::Text(t) => {
                let s = String::from_utf8_lossy(t).into_owned();
                if decl.contains("date") || decl.contains("time") {
                    SqlValue::Timestamp(s)
                } else {
                    SqlValue::Text(s)
                }
            }
            ValueRef::Blob(b) => SqlValue::Text(hex::encode(b)),
        }
    }

    /// Canonical serialization shared by the verifier and any logging path.
    ///
    /// Logical equality, not representation equality: booleans collapse to
    /// 0/1, integral floats to integer digits (so `1.50` and `1.5` and `1`
    /// agree when they denote the same number), timestamps compare as their
    /// text. A null equals only null.
    pub fn canonical(&self) -> String {
        match self {
            SqlValue::Null => "n:".to_string(),
            SqlValue::Bool(b) => format!("i:{}", *b as i64),
            SqlValue::Integer(i) => format!("i:{}", i),
            SqlValue::Float(f) => {
                if f.is_finite() && f.fract() == 0.0 && f.abs() < EXACT_INT_BOUND {
                    format!("i:{}", *f as i64)
                } else {
                    format!("f:{}", f)
                }
            }
            SqlValue::Text(s) => format!("t:{}", s),
            SqlValue::Timestamp(s) => format!("t:{}", s),
        }
    }
}

impl std::fmt::Display for SqlValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SqlValue::Null => write!(f, "NULL"),
            SqlValue::Bool(b) => write!(f, "{}", b),
            SqlValue::Integer(i) => write!(f, "{}", i),
            SqlValue::Float(x) => write!(f, "{}", x),
            SqlValue::Text(s) => write!(f, "{}", s),
            SqlValue::Timestamp(s) => write!(f, "{}", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_formatting_is_canonicalized() {
        assert_eq!(SqlValue::Float(1.50).canonical(), SqlValue::Float(1.5).canonical());
        assert_eq!(SqlValue::Float(2.0).canonical(), SqlValue::Integer(2).canonical());
        assert_ne!(SqlValue::Float(2.5).canonical(), SqlValue::Integer(2).canonical());
    }

    #[test]
    fn booleans_collapse_to_integers() {
        assert_eq!(SqlValue::Bool(true).canonical(), SqlValue::Integer(1).canonical());
        assert_eq!(SqlValue::Bool(false).canonical(), SqlValue::Integer(0).canonical());
    }

    #[test]
    fn null_equals_only_null() {
        assert_eq!(SqlValue::Null.canonical(), SqlValue::Null.canonical());
        assert_ne!(SqlValue::Null.canonical(), SqlValue::Integer(0).canonical());
        assert_ne!(SqlValue::Null.canonical(), SqlValue::Text(String::new()).canonical());
    }

    #[test]
    fn text_never_collides_with_numbers() {
        assert_ne!(
            SqlValue::Text("42".into()).canonical(),
            SqlValue::Integer(42).canonical()
        );
    }

    #[test]
    fn decl_type_refinement() {
        let v = SqlValue::from_sqlite(ValueRef::Integer(1), Some("BOOLEAN"));
        assert_eq!(v, SqlValue::Bool(true));
        let v = SqlValue::from_sqlite(ValueRef::Text(b"2024-01-01"), Some("DATE"));
        assert_eq!(v, SqlValue::Timestamp("2024-01-01".into()));
        let v = SqlValue::from_sqlite(ValueRef::Integer(7), Some("INTEGER"));
        assert_eq!(v, SqlValue::Integer(7));
    }
}
