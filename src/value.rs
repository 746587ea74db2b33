//! Coercion of raw string values into typed comparison values.

use std::cmp::Ordering;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::NodeFailure;
use crate::schema::FieldKind;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M:%S";
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A value ready to be compared against a field
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Bool(bool),
    Int(i64),
    Double(f64),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    /// Textual representation of an enum member
    Enum(&'static str),
    String(String),
    Null,
}

impl TypedValue {
    pub fn is_null(&self) -> bool {
        matches!(self, TypedValue::Null)
    }

    /// Orders two values of compatible kinds. Mixed numbers compare as `f64`,
    /// enums compare with strings by their text. Anything involving `Null` or
    /// incompatible kinds is unordered.
    pub fn compare(&self, other: &TypedValue) -> Option<Ordering> {
        use TypedValue::*;
        match (self, other) {
            (Bool(a), Bool(b)) => Some(a.cmp(b)),
            (Int(a), Int(b)) => Some(a.cmp(b)),
            (Double(a), Double(b)) => a.partial_cmp(b),
            (Int(a), Double(b)) => (*a as f64).partial_cmp(b),
            (Double(a), Int(b)) => a.partial_cmp(&(*b as f64)),
            (Date(a), Date(b)) => Some(a.cmp(b)),
            (Time(a), Time(b)) => Some(a.cmp(b)),
            (DateTime(a), DateTime(b)) => Some(a.cmp(b)),
            (Enum(a), Enum(b)) => Some(a.cmp(b)),
            (String(a), String(b)) => Some(a.cmp(b)),
            (Enum(a), String(b)) => Some((*a).cmp(b.as_str())),
            (String(a), Enum(b)) => Some(a.as_str().cmp(*b)),
            _ => None,
        }
    }

    /// Text form used for substring matching, `None` for `Null`
    pub fn as_text(&self) -> Option<String> {
        (!self.is_null()).then(|| self.to_string())
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedValue::Bool(b) => write!(f, "{b}"),
            TypedValue::Int(i) => write!(f, "{i}"),
            TypedValue::Double(d) => write!(f, "{d}"),
            TypedValue::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            TypedValue::Time(t) => write!(f, "{}", t.format(TIME_FORMAT)),
            TypedValue::DateTime(dt) => write!(f, "{}", dt.format(DATETIME_FORMAT)),
            TypedValue::Enum(name) => f.write_str(name),
            TypedValue::String(s) => f.write_str(s),
            TypedValue::Null => f.write_str(""),
        }
    }
}

impl From<&TypedValue> for sea_query::Value {
    fn from(value: &TypedValue) -> Self {
        match value {
            TypedValue::Bool(b) => (*b).into(),
            TypedValue::Int(i) => (*i).into(),
            TypedValue::Double(d) => (*d).into(),
            TypedValue::Date(d) => (*d).into(),
            TypedValue::Time(t) => (*t).into(),
            TypedValue::DateTime(dt) => (*dt).into(),
            TypedValue::Enum(name) => (*name).into(),
            TypedValue::String(s) => s.as_str().into(),
            TypedValue::Null => sea_query::Value::String(None),
        }
    }
}

fn bad_value(kind: FieldKind, e: impl fmt::Display) -> NodeFailure {
    NodeFailure::BadValue {
        kind: kind.name(),
        message: e.to_string(),
    }
}

/// Converts `raw` to the value type of a field of the given kind.
pub fn coerce(raw: &str, kind: FieldKind) -> Result<TypedValue, NodeFailure> {
    match kind {
        FieldKind::Bool => {
            if raw.eq_ignore_ascii_case("true") {
                Ok(TypedValue::Bool(true))
            } else if raw.eq_ignore_ascii_case("false") {
                Ok(TypedValue::Bool(false))
            } else {
                Err(bad_value(kind, format!("'{raw}' is neither true nor false")))
            }
        }
        FieldKind::Int => raw
            .parse::<i64>()
            .map(TypedValue::Int)
            .map_err(|e| bad_value(kind, e)),
        FieldKind::Double => raw
            .parse::<f64>()
            .map(TypedValue::Double)
            .map_err(|e| bad_value(kind, e)),
        FieldKind::Date => NaiveDate::parse_from_str(raw, DATE_FORMAT)
            .map(TypedValue::Date)
            .map_err(|e| bad_value(kind, e)),
        FieldKind::Time => NaiveTime::parse_from_str(raw, TIME_FORMAT)
            .map(TypedValue::Time)
            .map_err(|e| bad_value(kind, e)),
        FieldKind::DateTime => NaiveDateTime::parse_from_str(raw, DATETIME_FORMAT)
            .map(TypedValue::DateTime)
            .map_err(|e| bad_value(kind, e)),
        FieldKind::Enum(variants) => variants
            .iter()
            .copied()
            .find(|variant| *variant == raw)
            .map(TypedValue::Enum)
            .ok_or_else(|| NodeFailure::NoEnumConstant {
                variants: variants.to_vec(),
            }),
        FieldKind::String | FieldKind::Other => Ok(TypedValue::String(raw.to_string())),
    }
}

/// Coercion for ordering operators: temporal kinds and doubles keep their type,
/// every other kind is compared as an integer.
pub fn coerce_ordered(raw: &str, kind: FieldKind) -> Result<TypedValue, NodeFailure> {
    match kind {
        FieldKind::Date | FieldKind::Time | FieldKind::DateTime | FieldKind::Double => {
            coerce(raw, kind)
        }
        _ => coerce(raw, FieldKind::Int),
    }
}
