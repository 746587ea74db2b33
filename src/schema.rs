//! Static field tables describing queryable entities.
//!
//! Each entity declares its fields once, in declaration order, as a `static`
//! [`EntityDef`]. Resolution walks exactly one level of inheritance: the
//! entity's own fields plus its direct parent's, parent first.

use crate::value::TypedValue;

/// Semantic scalar category of a field, drives value coercion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Bool,
    Int,
    Double,
    Date,
    Time,
    DateTime,
    /// Textual representations of the enum members, in declaration order
    Enum(&'static [&'static str]),
    String,
    Other,
}

impl FieldKind {
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Bool => "bool",
            FieldKind::Int => "int",
            FieldKind::Double => "double",
            FieldKind::Date => "date",
            FieldKind::Time => "time",
            FieldKind::DateTime => "datetime",
            FieldKind::Enum(_) => "enum",
            FieldKind::String => "string",
            FieldKind::Other => "other",
        }
    }
}

/// Markers that take a field out of filtering, search and projection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldTag {
    Ignored,
    Transient,
    OneToMany,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    pub kind: FieldKind,
    pub tags: &'static [FieldTag],
}

impl FieldDef {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            tags: &[],
        }
    }

    pub const fn tagged(self, tags: &'static [FieldTag]) -> Self {
        Self { tags, ..self }
    }

    pub fn is_queryable(&self) -> bool {
        self.tags.is_empty()
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct EntityDef {
    pub name: &'static str,
    pub parent: Option<&'static EntityDef>,
    pub fields: &'static [FieldDef],
}

impl EntityDef {
    /// Alias used for the entity in rendered queries
    pub fn alias(&self) -> String {
        self.name.to_lowercase()
    }
}

/// A comparable field as seen by the compiler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub kind: FieldKind,
}

/// Own fields plus the direct parent's fields, minus the non-queryable ones.
pub fn resolve_fields(entity: &EntityDef) -> Vec<FieldDescriptor> {
    entity
        .parent
        .into_iter()
        .flat_map(|parent| parent.fields.iter())
        .chain(entity.fields.iter())
        .filter(|field| field.is_queryable())
        .map(|field| FieldDescriptor {
            name: field.name,
            kind: field.kind,
        })
        .collect()
}

pub fn find_field(fields: &[FieldDescriptor], name: &str) -> Option<FieldDescriptor> {
    fields.iter().find(|field| field.name == name).copied()
}

/// A related entity reachable from the root under `alias`.
///
/// `from` and `to` are only needed when the join has to be spelled out in
/// query text: `LEFT JOIN <entity> <alias> ON <alias>.<from> = <root>.<to>`.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinDeclaration {
    pub alias: String,
    pub entity: &'static EntityDef,
    pub from: Option<String>,
    pub to: Option<String>,
}

impl JoinDeclaration {
    pub fn new(alias: impl Into<String>, entity: &'static EntityDef) -> Self {
        Self {
            alias: alias.into(),
            entity,
            from: None,
            to: None,
        }
    }

    pub fn on(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self.to = Some(to.into());
        self
    }

    pub fn keys(&self) -> Option<(&str, &str)> {
        Some((self.from.as_deref()?, self.to.as_deref()?))
    }
}

/// Accessor table of a record type, used instead of reflection.
pub trait Record {
    fn entity() -> &'static EntityDef
    where
        Self: Sized;

    /// Value of one of the entity's fields, [`TypedValue::Null`] when absent
    fn field_value(&self, field: &str) -> TypedValue;

    /// The related record joined under `alias`, if any
    fn joined(&self, _alias: &str) -> Option<&dyn Record> {
        None
    }
}
