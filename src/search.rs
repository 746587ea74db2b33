//! Free-text search across the columns of the root entity and its joins.

use crate::compiler::FilterCompiler;
use crate::predicate::{FieldPath, Predicate};
use crate::schema::FieldDescriptor;

/// Builds an OR of case-insensitive `%term%` matches over every eligible column.
///
/// With an empty `allowed` list every resolved field is eligible. Otherwise a
/// root column is eligible when listed as `field` or `<root_alias>.field`, a
/// joined column when listed as `<join_alias>.field`. Returns `None` when no
/// column is eligible.
pub fn compile_search(
    compiler: &FilterCompiler<'_>,
    root_alias: &str,
    term: &str,
    allowed: &[String],
) -> Option<Predicate> {
    let pattern = format!("%{}%", term.to_lowercase());
    let is_allowed = |qualifier: &str, field: &FieldDescriptor, bare_ok: bool| {
        allowed.is_empty()
            || allowed.iter().any(|column| {
                (bare_ok && column == field.name)
                    || column
                        .split_once('.')
                        .is_some_and(|(prefix, name)| prefix == qualifier && name == field.name)
            })
    };

    let root = compiler
        .root_fields()
        .iter()
        .filter(|field| is_allowed(root_alias, field, true))
        .map(|field| FieldPath::root(field.name, field.kind));

    let joined = compiler.join_fields().flat_map(|(join, fields)| {
        fields
            .iter()
            .filter(|field| is_allowed(&join.alias, field, false))
            .map(|field| FieldPath::joined(join.alias.as_str(), field.name, field.kind))
            .collect::<Vec<_>>()
    });

    let matches: Vec<_> = root
        .chain(joined)
        .map(|path| Predicate::Like {
            path,
            pattern: pattern.clone(),
        })
        .collect();

    (!matches.is_empty()).then_some(Predicate::Or(matches))
}
