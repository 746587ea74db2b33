//! Textual renderer: a predicate tree becomes an object-query string with
//! positional `?n` parameters.
//!
//! ```text
//! SELECT person FROM Person person
//!   LEFT JOIN Department dept ON dept.id = person.dept_id
//!   WHERE (person.age >= ?1 AND LOWER(dept.name) LIKE ?2)
//!   ORDER BY person.age DESC
//! ```
//!
//! Values never appear in the text itself.

use std::fmt::Write;

use tracing::debug;

use crate::error::CompileError;
use crate::page::Sort;
use crate::predicate::{FieldPath, Predicate};
use crate::schema::{EntityDef, FieldKind, JoinDeclaration};
use crate::value::TypedValue;

/// Data and count queries sharing one `FROM`/`JOIN`/`WHERE` body and one parameter list
#[derive(Debug, Clone, PartialEq)]
pub struct TextQuery {
    /// `SELECT <alias> ... [ORDER BY ...]`
    pub select: String,
    /// `SELECT COUNT(<alias>) ...`
    pub count: String,
    /// Bound in order, `params[0]` is `?1`
    pub params: Vec<TypedValue>,
}

impl TextQuery {
    /// Renders the query pair. Every join must carry `from`/`to` keys.
    pub fn render(
        entity: &EntityDef,
        joins: &[JoinDeclaration],
        predicate: Option<&Predicate>,
        sort: Option<&Sort>,
    ) -> Result<Self, CompileError> {
        let alias = entity.alias();
        let mut body = format!("FROM {} {}", entity.name, alias);

        for join in joins {
            let (from, to) = join.keys().ok_or_else(|| CompileError::MissingJoinKeys {
                alias: join.alias.clone(),
            })?;
            let _ = write!(
                body,
                " LEFT JOIN {} {} ON {}.{} = {}.{}",
                join.entity.name, join.alias, join.alias, from, alias, to
            );
        }

        let mut writer = ClauseWriter::new(&alias);
        if let Some(predicate) = predicate {
            body.push_str(" WHERE ");
            writer.write(predicate, &mut body);
        }

        let mut select = format!("SELECT {} {}", alias, body);
        if let Some(sort) = sort {
            let field = if sort.field.contains('.') {
                sort.field.clone()
            } else {
                format!("{}.{}", alias, sort.field)
            };
            let _ = write!(select, " ORDER BY {} {}", field, sort.direction.keyword());
        }
        let count = format!("SELECT COUNT({}) {}", alias, body);

        debug!(%select, params = writer.params.len(), "rendered text query");
        Ok(Self {
            select,
            count,
            params: writer.params,
        })
    }
}

struct ClauseWriter<'a> {
    root_alias: &'a str,
    params: Vec<TypedValue>,
}

impl<'a> ClauseWriter<'a> {
    fn new(root_alias: &'a str) -> Self {
        Self {
            root_alias,
            params: Vec::new(),
        }
    }

    fn bind(&mut self, value: TypedValue) -> String {
        self.params.push(value);
        format!("?{}", self.params.len())
    }

    fn column(&self, path: &FieldPath) -> String {
        format!("{}.{}", path.qualifier(self.root_alias), path.field)
    }

    fn write(&mut self, predicate: &Predicate, out: &mut String) {
        match predicate {
            Predicate::Compare { path, op, value } => {
                let column = self.column(path);
                let param = self.bind(value.clone());
                let _ = write!(out, "{} {} {}", column, op.symbol(), param);
            }
            Predicate::Like { path, pattern } => {
                let column = match path.kind {
                    FieldKind::String => self.column(path),
                    _ => format!("CAST({} AS string)", self.column(path)),
                };
                let param = self.bind(TypedValue::String(pattern.clone()));
                let _ = write!(out, "LOWER({}) LIKE {}", column, param);
            }
            Predicate::IsNull(path) => {
                let _ = write!(out, "{} IS NULL", self.column(path));
            }
            Predicate::IsNotNull(path) => {
                let _ = write!(out, "{} IS NOT NULL", self.column(path));
            }
            Predicate::InList {
                path,
                values,
                negated,
            } => {
                if values.is_empty() {
                    // IN () matches nothing, NOT IN () matches everything
                    out.push_str(if *negated { "1 = 1" } else { "1 = 0" });
                    return;
                }
                let column = self.column(path);
                let params: Vec<_> = values.iter().map(|v| self.bind(v.clone())).collect();
                let keyword = if *negated { "NOT IN" } else { "IN" };
                let _ = write!(out, "{} {} ({})", column, keyword, params.join(", "));
            }
            Predicate::And(parts) => self.write_group(parts, " AND ", out),
            Predicate::Or(parts) => self.write_group(parts, " OR ", out),
        }
    }

    fn write_group(&mut self, parts: &[Predicate], separator: &str, out: &mut String) {
        if parts.is_empty() {
            out.push_str("1 = 1");
            return;
        }
        out.push('(');
        for (i, part) in parts.iter().enumerate() {
            if i > 0 {
                out.push_str(separator);
            }
            self.write(part, out);
        }
        out.push(')');
    }
}
