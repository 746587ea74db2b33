//! Error types shared by the compiler, the renderers and the executors.

use thiserror::Error;

use crate::ast::Criteria;

/// Why a single leaf node could not be compiled
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NodeFailure {
    #[error("field does not resolve against the entity or its joins")]
    UnknownField,

    #[error("no enum constant matches, expected one of {variants:?}")]
    NoEnumConstant { variants: Vec<&'static str> },

    #[error("value is not a valid {kind}: {message}")]
    BadValue { kind: &'static str, message: String },
}

/// Errors raised while turning a filter tree or a request into a query.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("failed build predicate for {field} {criteria:?} '{value}': {reason}")]
    InvalidNode {
        field: String,
        criteria: Criteria,
        value: String,
        reason: NodeFailure,
    },

    #[error("join '{alias}' needs from/to keys to be rendered as a query")]
    MissingJoinKeys { alias: String },

    #[error("select name '{name}' does not resolve against the entity or its joins")]
    UnknownSelect { name: String },

    #[error("sort field '{field}' does not resolve against the entity or its joins")]
    UnknownSort { field: String },
}

/// Errors surfaced by a persistence collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("backend error: {0}")]
    Backend(String),

    #[error("operation not supported by this store: {0}")]
    Unsupported(&'static str),
}

/// Anything that can go wrong while assembling and executing a query.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file does not exist: {path}")]
    Missing { path: String },

    #[error("cannot read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
