//! SQL compiler that renders a [`Specification`] as sea-query statements.
//!
//! Values are carried as sea-query [`Value`]s, so `build(PostgresQueryBuilder)`
//! yields placeholder SQL plus bound parameters.

use std::collections::HashMap;

use sea_query::{
    Alias, Asterisk, Expr, Func, Iden, JoinType, Order, SelectStatement, SimpleExpr, Value,
};

use crate::config::CompilerConfig;
use crate::error::CompileError;
use crate::page::{Direction, PageRequest};
use crate::predicate::{CompareOp, FieldPath, Predicate};
use crate::schema::FieldKind;
use crate::store::Specification;

/// Table or alias identifier for sea-query
#[derive(Debug, Clone)]
pub struct TableName(pub String);

impl Iden for TableName {
    fn unquoted(&self, s: &mut dyn std::fmt::Write) {
        write!(s, "{}", self.0).unwrap();
    }
}

/// Column identifier wrapper
#[derive(Debug, Clone)]
pub struct ColumnName(pub String);

impl Iden for ColumnName {
    fn unquoted(&self, s: &mut dyn std::fmt::Write) {
        write!(s, "{}", self.0).unwrap();
    }
}

/// Renders specifications into SQL statements
#[derive(Debug, Clone, Default)]
pub struct SqlCompiler {
    /// Maps entity names to table names for schema resolution
    table_mapping: HashMap<String, String>,
}

impl SqlCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &CompilerConfig) -> Self {
        Self {
            table_mapping: config.table_mapping.clone(),
        }
    }

    /// Set table mapping for entity names
    pub fn set_table_mapping(&mut self, mapping: HashMap<String, String>) {
        self.table_mapping = mapping;
    }

    /// Get the actual table name for an entity
    pub fn get_table_name(&self, entity: &str) -> String {
        self.table_mapping
            .get(entity)
            .cloned()
            .unwrap_or_else(|| entity.to_lowercase())
    }

    /// `SELECT <root>.* ...` for one page, ordered by the specification's sort
    pub fn compile_select(
        &self,
        spec: &Specification<'_>,
        page: PageRequest,
    ) -> Result<SelectStatement, CompileError> {
        let root_alias = spec.entity.alias();
        let mut select = self.base_select(spec)?;
        select.column((TableName(root_alias.clone()), Asterisk));

        if let Some((path, direction)) = &spec.sort {
            let order = match direction {
                Direction::Asc => Order::Asc,
                Direction::Desc => Order::Desc,
            };
            select.order_by(column_ref(&root_alias, path), order);
        }
        if let Some(size) = page.size {
            select.limit(size).offset(page.offset());
        }
        Ok(select)
    }

    /// `SELECT COUNT(*) ...` over the same joins and predicate
    pub fn compile_count(&self, spec: &Specification<'_>) -> Result<SelectStatement, CompileError> {
        let mut select = self.base_select(spec)?;
        select.expr(Func::count(Expr::col(Asterisk)));
        Ok(select)
    }

    /// Selects exactly `columns`, in order
    pub fn compile_projection(
        &self,
        spec: &Specification<'_>,
        columns: &[FieldPath],
    ) -> Result<SelectStatement, CompileError> {
        let root_alias = spec.entity.alias();
        let mut select = self.base_select(spec)?;
        for path in columns {
            select.column(column_ref(&root_alias, path));
        }
        Ok(select)
    }

    fn base_select(&self, spec: &Specification<'_>) -> Result<SelectStatement, CompileError> {
        let root_alias = spec.entity.alias();
        let mut select = SelectStatement::new();
        select.from_as(
            TableName(self.get_table_name(spec.entity.name)),
            TableName(root_alias.clone()),
        );

        for join in spec.joins {
            let (from, to) = join.keys().ok_or_else(|| CompileError::MissingJoinKeys {
                alias: join.alias.clone(),
            })?;
            select.join_as(
                JoinType::LeftJoin,
                TableName(self.get_table_name(join.entity.name)),
                TableName(join.alias.clone()),
                Expr::col((TableName(join.alias.clone()), ColumnName(from.to_string())))
                    .equals((TableName(root_alias.clone()), ColumnName(to.to_string()))),
            );
        }

        if let Some(predicate) = &spec.predicate {
            select.and_where(self.compile_predicate(&root_alias, predicate));
        }
        Ok(select)
    }

    /// Compile a predicate tree into a sea-query expression
    pub fn compile_predicate(&self, root_alias: &str, predicate: &Predicate) -> SimpleExpr {
        match predicate {
            Predicate::Compare { path, op, value } => {
                let col = Expr::col(column_ref(root_alias, path));
                let val = Value::from(value);
                match op {
                    CompareOp::Eq => col.eq(val),
                    CompareOp::Ne => col.ne(val),
                    CompareOp::Gt => col.gt(val),
                    CompareOp::Lt => col.lt(val),
                    CompareOp::Gte => col.gte(val),
                    CompareOp::Lte => col.lte(val),
                }
            }
            Predicate::Like { path, pattern } => {
                let col = Expr::col(column_ref(root_alias, path));
                let text: SimpleExpr = match path.kind {
                    FieldKind::String => col.into(),
                    _ => Func::cast_as(col, Alias::new("text")).into(),
                };
                Expr::expr(Func::lower(text)).like(pattern.as_str())
            }
            Predicate::IsNull(path) => Expr::col(column_ref(root_alias, path)).is_null(),
            Predicate::IsNotNull(path) => Expr::col(column_ref(root_alias, path)).is_not_null(),
            Predicate::InList {
                path,
                values,
                negated,
            } => {
                let col = Expr::col(column_ref(root_alias, path));
                let values = values.iter().map(Value::from);
                if *negated {
                    col.is_not_in(values)
                } else {
                    col.is_in(values)
                }
            }
            Predicate::And(parts) => self.combine(root_alias, parts, SimpleExpr::and),
            Predicate::Or(parts) => self.combine(root_alias, parts, SimpleExpr::or),
        }
    }

    /// Folds the parts with `op`; no parts is vacuously true
    fn combine(
        &self,
        root_alias: &str,
        parts: &[Predicate],
        op: fn(SimpleExpr, SimpleExpr) -> SimpleExpr,
    ) -> SimpleExpr {
        parts
            .iter()
            .map(|part| self.compile_predicate(root_alias, part))
            .reduce(op)
            .unwrap_or_else(|| Expr::val(true).into())
    }
}

fn column_ref(root_alias: &str, path: &FieldPath) -> (TableName, ColumnName) {
    (
        TableName(path.qualifier(root_alias).to_string()),
        ColumnName(path.field.to_string()),
    )
}
