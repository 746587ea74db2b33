//! Query assembly: a builder that gathers filter, joins, search, sort and paging
//! for one call, compiles them and runs the result against a store.

use tracing::warn;

use crate::ast::FilterData;
use crate::compiler::{CompileOptions, CompilePolicy, FilterCompiler};
use crate::config::CompilerConfig;
use crate::error::{CompileError, QueryError};
use crate::page::{Direction, Page, PageRequest, Sort, COUNT_FALLBACK};
use crate::predicate::{FieldPath, Predicate};
use crate::projection::{Projection, Row};
use crate::schema::{EntityDef, JoinDeclaration};
use crate::search::compile_search;
use crate::store::{Specification, SpecificationExecutor, TextQueryExecutor};
use crate::text_query::TextQuery;

/// Everything one query call is made of
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub entity: &'static EntityDef,
    pub filter: Option<FilterData>,
    pub joins: Vec<JoinDeclaration>,
    pub search: Option<String>,
    /// Empty means every root and joined column
    pub search_columns: Vec<String>,
    pub sort: Option<Sort>,
    pub page: PageRequest,
}

impl QueryRequest {
    pub fn new(entity: &'static EntityDef) -> Self {
        Self {
            entity,
            filter: None,
            joins: Vec::new(),
            search: None,
            search_columns: Vec::new(),
            sort: None,
            page: PageRequest::unpaged(),
        }
    }
}

/// Builder over a [`QueryRequest`].
///
/// ```ignore
/// let page = FindData::new(&PERSON)
///     .filter_json(r#"{"field":"age","criteria":"GTE","value":"18"}"#)
///     .join(JoinDeclaration::new("dept", &DEPARTMENT))
///     .sort(Sort::desc("age"))
///     .page(0, 20)
///     .to_page(&store)?;
/// ```
#[derive(Debug, Clone)]
pub struct FindData {
    request: QueryRequest,
    options: CompileOptions,
}

impl FindData {
    pub fn new(entity: &'static EntityDef) -> Self {
        Self {
            request: QueryRequest::new(entity),
            options: CompileOptions::default(),
        }
    }

    /// Takes compile options and, unless a size is already set, the default page size
    pub fn with_config(mut self, config: &CompilerConfig) -> Self {
        self.options = config.options;
        if self.request.page.size.is_none() {
            self.request.page.size = config.default_page_size;
        }
        self
    }

    pub fn options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    pub fn filter(mut self, filter: FilterData) -> Self {
        self.request.filter = Some(filter);
        self
    }

    /// A malformed document is logged and the query runs unfiltered
    pub fn filter_json(mut self, json: &str) -> Self {
        self.request.filter = FilterData::from_json(json);
        self
    }

    pub fn join(mut self, join: JoinDeclaration) -> Self {
        self.request.joins.push(join);
        self
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.request.search = Some(term.into());
        self
    }

    pub fn search_columns<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.request.search_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn sort(mut self, sort: Sort) -> Self {
        self.request.sort = Some(sort);
        self
    }

    pub fn page(mut self, page: u64, size: u64) -> Self {
        self.request.page = PageRequest::of(page, size);
        self
    }

    pub fn unpaged(mut self) -> Self {
        self.request.page = PageRequest::unpaged();
        self
    }

    pub fn request(&self) -> &QueryRequest {
        &self.request
    }

    fn compiler(&self) -> FilterCompiler<'_> {
        FilterCompiler::new(self.request.entity, &self.request.joins, self.options)
    }

    fn filter_predicate(
        &self,
        compiler: &FilterCompiler<'_>,
    ) -> Result<Option<Predicate>, CompileError> {
        match &self.request.filter {
            Some(filter) => compiler.compile(filter),
            None => Ok(None),
        }
    }

    /// AND of the compiled filter and the search predicate
    pub fn where_predicate(&self) -> Result<Option<Predicate>, CompileError> {
        let compiler = self.compiler();
        let filter = self.filter_predicate(&compiler)?;
        let search = self
            .request
            .search
            .as_deref()
            .filter(|term| !term.is_empty())
            .and_then(|term| {
                compile_search(
                    &compiler,
                    &self.request.entity.alias(),
                    term,
                    &self.request.search_columns,
                )
            });
        Ok(Predicate::conjunction([filter, search]))
    }

    fn resolve_sort(
        &self,
        compiler: &FilterCompiler<'_>,
    ) -> Result<Option<(FieldPath, Direction)>, CompileError> {
        let Some(sort) = &self.request.sort else {
            return Ok(None);
        };
        let root_prefix = format!("{}.", self.request.entity.alias());
        let field = sort.field.strip_prefix(&root_prefix).unwrap_or(&sort.field);
        match compiler.resolve_path(field) {
            Some(path) => Ok(Some((path, sort.direction))),
            None => match self.options.policy {
                CompilePolicy::Strict => Err(CompileError::UnknownSort {
                    field: sort.field.clone(),
                }),
                CompilePolicy::Lenient => {
                    warn!(field = %sort.field, "sort field does not resolve, leaving rows unsorted");
                    Ok(None)
                }
            },
        }
    }

    /// Structured query for the current request
    pub fn specification(&self) -> Result<Specification<'_>, CompileError> {
        let compiler = self.compiler();
        Ok(Specification {
            entity: self.request.entity,
            joins: &self.request.joins,
            predicate: self.where_predicate()?,
            sort: self.resolve_sort(&compiler)?,
        })
    }

    /// One page of matching records with the filtered total
    pub fn to_page<T>(&self, store: &impl SpecificationExecutor<T>) -> Result<Page<T>, QueryError> {
        let spec = self.specification()?;
        Ok(store.find_all(&spec, self.request.page)?)
    }

    /// Every matching record, ignoring the page parameters
    pub fn to_list<T>(&self, store: &impl SpecificationExecutor<T>) -> Result<Vec<T>, QueryError> {
        let spec = self.specification()?;
        Ok(store.find_all(&spec, PageRequest::unpaged())?.content)
    }

    /// Selected columns of every row matching the filter. Search does not apply here.
    pub fn pickup<T, S: AsRef<str>>(
        &self,
        store: &impl SpecificationExecutor<T>,
        names: &[S],
    ) -> Result<Vec<Row>, QueryError> {
        let compiler = self.compiler();
        let names: Vec<String> = names.iter().map(|name| name.as_ref().to_string()).collect();
        let projection = Projection::resolve(&compiler, &names)?;
        let spec = Specification {
            entity: self.request.entity,
            joins: &self.request.joins,
            predicate: self.filter_predicate(&compiler)?,
            sort: self.resolve_sort(&compiler)?,
        };
        let rows = store.find_columns(&spec, &projection.paths())?;
        Ok(rows.into_iter().map(|row| projection.zip(row)).collect())
    }

    /// Textual data and count queries for the current request
    pub fn to_text_query(&self) -> Result<TextQuery, CompileError> {
        let predicate = self.where_predicate()?;
        TextQuery::render(
            self.request.entity,
            &self.request.joins,
            predicate.as_ref(),
            self.request.sort.as_ref(),
        )
    }

    /// Runs the count query, then the data query for the requested page.
    ///
    /// A failed count does not fail the page: the total becomes
    /// [`COUNT_FALLBACK`] and `total_exact` is cleared. A failed data query
    /// is returned as an error.
    pub fn to_text_page<T>(&self, executor: &impl TextQueryExecutor<T>) -> Result<Page<T>, QueryError> {
        let query = self.to_text_query()?;
        let page = self.request.page;
        let (total, exact) = match executor.count(&query) {
            Ok(total) => (total, true),
            Err(error) => {
                warn!(%error, query = %query.count, total = COUNT_FALLBACK, "count query failed");
                (COUNT_FALLBACK, false)
            }
        };
        let content = executor.fetch(&query, page)?;
        Ok(Page {
            total_exact: exact,
            ..Page::new(content, page, total)
        })
    }

    /// Every matching record through the textual backend
    pub fn to_text_list<T>(&self, executor: &impl TextQueryExecutor<T>) -> Result<Vec<T>, QueryError> {
        let query = self.to_text_query()?;
        Ok(executor.fetch(&query, PageRequest::unpaged())?)
    }
}
