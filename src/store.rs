//! Persistence collaborators and the in-memory store.
//!
//! Query execution lives outside this crate. The compiler hands a structured
//! backend a [`Specification`] and a textual backend a [`TextQuery`]; both
//! traits below are what such backends implement.

use std::cmp::Ordering;

use crate::error::StoreError;
use crate::page::{Direction, Page, PageRequest};
use crate::predicate::{FieldPath, Predicate};
use crate::schema::{EntityDef, JoinDeclaration, Record};
use crate::text_query::TextQuery;
use crate::value::TypedValue;

/// A compiled structured query: what to read, which rows and in which order
#[derive(Debug, Clone, PartialEq)]
pub struct Specification<'a> {
    pub entity: &'static EntityDef,
    pub joins: &'a [JoinDeclaration],
    pub predicate: Option<Predicate>,
    pub sort: Option<(FieldPath, Direction)>,
}

impl Specification<'_> {
    pub fn matches(&self, record: &dyn Record) -> bool {
        self.predicate
            .as_ref()
            .map_or(true, |predicate| predicate.matches(record))
    }
}

/// Backend running structured queries
pub trait SpecificationExecutor<T> {
    /// Matching rows for the requested page plus the total number of matching rows
    fn find_all(&self, spec: &Specification<'_>, page: PageRequest) -> Result<Page<T>, StoreError>;

    /// One value per requested column for every matching row
    fn find_columns(
        &self,
        spec: &Specification<'_>,
        columns: &[FieldPath],
    ) -> Result<Vec<Vec<TypedValue>>, StoreError>;
}

/// Backend running textual queries with positional parameters
pub trait TextQueryExecutor<T> {
    /// Runs [`TextQuery::count`]
    fn count(&self, query: &TextQuery) -> Result<u64, StoreError>;

    /// Runs [`TextQuery::select`] limited to the requested page
    fn fetch(&self, query: &TextQuery, page: PageRequest) -> Result<Vec<T>, StoreError>;
}

/// Sort order with nulls last, as a database orders ascending columns
fn sort_order(a: &TypedValue, b: &TypedValue) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.compare(b).unwrap_or(Ordering::Equal),
    }
}

/// Rows held in memory, evaluated directly against the predicate tree
#[derive(Debug, Clone, Default)]
pub struct MemoryStore<T> {
    rows: Vec<T>,
}

impl<T: Record> MemoryStore<T> {
    pub fn new(rows: Vec<T>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    fn matching<'s>(&'s self, spec: &Specification<'_>) -> Vec<&'s T> {
        let mut hits: Vec<&T> = self.rows.iter().filter(|row| spec.matches(*row)).collect();
        if let Some((path, direction)) = &spec.sort {
            hits.sort_by(|a, b| {
                let ordering = sort_order(&path.read(*a), &path.read(*b));
                match direction {
                    Direction::Asc => ordering,
                    Direction::Desc => ordering.reverse(),
                }
            });
        }
        hits
    }
}

impl<T: Record + Clone> SpecificationExecutor<T> for MemoryStore<T> {
    fn find_all(&self, spec: &Specification<'_>, page: PageRequest) -> Result<Page<T>, StoreError> {
        let hits = self.matching(spec);
        let total = hits.len() as u64;
        let content = page.slice(hits.into_iter().cloned());
        Ok(Page::new(content, page, total))
    }

    fn find_columns(
        &self,
        spec: &Specification<'_>,
        columns: &[FieldPath],
    ) -> Result<Vec<Vec<TypedValue>>, StoreError> {
        Ok(self
            .matching(spec)
            .into_iter()
            .map(|row| columns.iter().map(|column| column.read(row)).collect())
            .collect())
    }
}
