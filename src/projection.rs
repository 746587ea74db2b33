//! Column projection ("pickup"): a named subset of root and joined columns,
//! returned as name to value rows.

use std::collections::BTreeMap;

use tracing::warn;

use crate::compiler::{CompilePolicy, FilterCompiler};
use crate::error::CompileError;
use crate::predicate::FieldPath;
use crate::value::TypedValue;

pub type Row = BTreeMap<String, TypedValue>;

/// Requested names paired with the paths they resolved to
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    names: Vec<String>,
    columns: Vec<Option<FieldPath>>,
}

impl Projection {
    /// Resolves each name as `field` or `alias.field`. In lenient mode a name
    /// that does not resolve is kept and reads as an empty string.
    pub fn resolve(compiler: &FilterCompiler<'_>, names: &[String]) -> Result<Self, CompileError> {
        let mut columns = Vec::with_capacity(names.len());
        for name in names {
            let path = compiler.resolve_path(name);
            if path.is_none() {
                match compiler.options().policy {
                    CompilePolicy::Strict => {
                        return Err(CompileError::UnknownSelect { name: name.clone() })
                    }
                    CompilePolicy::Lenient => warn!(name = %name, "select name does not resolve"),
                }
            }
            columns.push(path);
        }
        Ok(Self {
            names: names.to_vec(),
            columns,
        })
    }

    /// Paths to select, in order, skipping unresolved names
    pub fn paths(&self) -> Vec<FieldPath> {
        self.columns.iter().flatten().cloned().collect()
    }

    /// Zips one result row against the requested names. Positions the row
    /// does not fill read as an empty string.
    pub fn zip(&self, values: Vec<TypedValue>) -> Row {
        let mut values = values.into_iter();
        self.names
            .iter()
            .zip(&self.columns)
            .map(|(name, column)| {
                let value = column
                    .as_ref()
                    .and_then(|_| values.next())
                    .unwrap_or_else(|| TypedValue::String(String::new()));
                (name.clone(), value)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::CompileOptions;
    use crate::schema::{FieldKind, JoinDeclaration};
    use crate::testing::{DEPARTMENT, PERSON};

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn resolve(selected: &[&str], policy: CompilePolicy) -> Result<Projection, CompileError> {
        let joins = vec![JoinDeclaration::new("dept", &DEPARTMENT)];
        let options = CompileOptions {
            policy,
            ..Default::default()
        };
        let compiler = FilterCompiler::new(&PERSON, &joins, options);
        Projection::resolve(&compiler, &names(selected))
    }

    #[test]
    fn test_resolves_root_and_joined_names() {
        let projection = resolve(&["name", "dept.name"], CompilePolicy::Strict).unwrap();
        assert_eq!(
            projection.paths(),
            vec![
                FieldPath::root("name", FieldKind::String),
                FieldPath::joined("dept", "name", FieldKind::String),
            ]
        );
    }

    #[test]
    fn test_unknown_name() {
        assert_eq!(
            resolve(&["name", "nickname"], CompilePolicy::Strict),
            Err(CompileError::UnknownSelect {
                name: "nickname".to_string()
            })
        );

        let projection = resolve(&["nickname", "age"], CompilePolicy::Lenient).unwrap();
        assert_eq!(projection.paths().len(), 1);
        let row = projection.zip(vec![TypedValue::Int(30)]);
        assert_eq!(row["nickname"], TypedValue::String(String::new()));
        assert_eq!(row["age"], TypedValue::Int(30));
    }

    #[test]
    fn test_short_rows_default_to_empty_string() {
        let projection = resolve(&["name", "age"], CompilePolicy::Strict).unwrap();
        let row = projection.zip(vec![TypedValue::String("Ann".to_string())]);
        assert_eq!(row["name"], TypedValue::String("Ann".to_string()));
        assert_eq!(row["age"], TypedValue::String(String::new()));
    }
}
