//! Compiles nested JSON filter documents into queries over declared entities.
//!
//! A [`FilterData`] tree is compiled against an [`EntityDef`] and its joins
//! into a backend-neutral [`Predicate`], which is then rendered either as a
//! sea-query statement ([`SqlCompiler`]), as object-query text
//! ([`TextQuery`]) or evaluated directly by a [`MemoryStore`].
//! [`FindData`] wires filter, search, sort and paging together for one call.

pub mod ast;
pub mod compiler;
pub mod config;
pub mod error;
pub mod find;
pub mod page;
pub mod predicate;
pub mod projection;
pub mod schema;
pub mod search;
pub mod sql_compiler;
pub mod store;
pub mod text_query;
pub mod value;

#[cfg(test)]
mod testing;

pub use ast::{Criteria, FilterData};
pub use compiler::{CompileOptions, CompilePolicy, FilterCompiler, InListSource};
pub use config::CompilerConfig;
pub use error::{CompileError, ConfigError, NodeFailure, QueryError, StoreError};
pub use find::{FindData, QueryRequest};
pub use page::{Direction, Page, PageRequest, Sort};
pub use predicate::{FieldPath, Predicate};
pub use projection::Row;
pub use schema::{EntityDef, FieldDef, FieldKind, FieldTag, JoinDeclaration, Record};
pub use sql_compiler::SqlCompiler;
pub use store::{MemoryStore, Specification, SpecificationExecutor, TextQueryExecutor};
pub use text_query::TextQuery;
pub use value::TypedValue;
