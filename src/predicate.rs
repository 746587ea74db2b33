//! Backend-neutral predicate tree produced by the compiler.
//!
//! Both renderers (`sql_compiler` and `text_query`) and the in-memory store
//! consume this tree; none of them look at the raw filter document.

use std::cmp::Ordering;

use regex::Regex;

use crate::schema::{FieldKind, Record};
use crate::value::TypedValue;

/// A resolved field, either on the root entity or on a join
#[derive(Debug, Clone, PartialEq)]
pub struct FieldPath {
    /// Join alias, `None` for the root entity
    pub join: Option<String>,
    pub field: &'static str,
    pub kind: FieldKind,
}

impl FieldPath {
    pub fn root(field: &'static str, kind: FieldKind) -> Self {
        Self {
            join: None,
            field,
            kind,
        }
    }

    pub fn joined(alias: impl Into<String>, field: &'static str, kind: FieldKind) -> Self {
        Self {
            join: Some(alias.into()),
            field,
            kind,
        }
    }

    /// Alias the field is qualified with in rendered queries
    pub fn qualifier<'a>(&'a self, root_alias: &'a str) -> &'a str {
        self.join.as_deref().unwrap_or(root_alias)
    }

    /// Reads the field from a record. A missing join reads as `Null`, like a LEFT JOIN.
    pub fn read(&self, record: &dyn Record) -> TypedValue {
        match &self.join {
            None => record.field_value(self.field),
            Some(alias) => record
                .joined(alias)
                .map_or(TypedValue::Null, |joined| joined.field_value(self.field)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Lt,
    Gte,
    Lte,
}

impl CompareOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Gt => ">",
            CompareOp::Lt => "<",
            CompareOp::Gte => ">=",
            CompareOp::Lte => "<=",
        }
    }

    fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Ne => ordering != Ordering::Equal,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Gte => ordering != Ordering::Less,
            CompareOp::Lte => ordering != Ordering::Greater,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare {
        path: FieldPath,
        op: CompareOp,
        value: TypedValue,
    },
    /// Case-insensitive LIKE, `pattern` is already lower-cased
    Like { path: FieldPath, pattern: String },
    IsNull(FieldPath),
    IsNotNull(FieldPath),
    InList {
        path: FieldPath,
        values: Vec<TypedValue>,
        negated: bool,
    },
    /// Empty list is vacuously true
    And(Vec<Predicate>),
    /// Empty list is vacuously true
    Or(Vec<Predicate>),
}

impl Predicate {
    /// AND of the present parts, `None` when there are none
    pub fn conjunction(parts: impl IntoIterator<Item = Option<Predicate>>) -> Option<Predicate> {
        let mut parts: Vec<_> = parts.into_iter().flatten().collect();
        match parts.len() {
            0 => None,
            1 => parts.pop(),
            _ => Some(Predicate::And(parts)),
        }
    }

    /// Evaluates the predicate against a record with SQL null semantics:
    /// any comparison involving a null is false.
    pub fn matches(&self, record: &dyn Record) -> bool {
        match self {
            Predicate::Compare { path, op, value } => path
                .read(record)
                .compare(value)
                .is_some_and(|ordering| op.accepts(ordering)),
            Predicate::Like { path, pattern } => path
                .read(record)
                .as_text()
                .is_some_and(|text| like_matches(&text.to_lowercase(), pattern)),
            Predicate::IsNull(path) => path.read(record).is_null(),
            Predicate::IsNotNull(path) => !path.read(record).is_null(),
            Predicate::InList {
                path,
                values,
                negated,
            } => {
                let actual = path.read(record);
                if actual.is_null() {
                    return false;
                }
                let found = values
                    .iter()
                    .any(|value| actual.compare(value) == Some(Ordering::Equal));
                found != *negated
            }
            Predicate::And(parts) => parts.iter().all(|part| part.matches(record)),
            Predicate::Or(parts) => parts.is_empty() || parts.iter().any(|part| part.matches(record)),
        }
    }
}

/// SQL LIKE: `%` matches any run of characters, `_` exactly one.
pub fn like_matches(text: &str, pattern: &str) -> bool {
    let mut expr = String::with_capacity(pattern.len() + 8);
    expr.push_str("(?s)^");
    let mut literal = [0u8; 4];
    for c in pattern.chars() {
        match c {
            '%' => expr.push_str(".*"),
            '_' => expr.push('.'),
            _ => expr.push_str(&regex::escape(c.encode_utf8(&mut literal))),
        }
    }
    expr.push('$');
    // escaped input always forms a valid expression
    Regex::new(&expr).is_ok_and(|re| re.is_match(text))
}
