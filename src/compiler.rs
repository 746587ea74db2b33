//! Compiles a [`FilterData`] tree into a [`Predicate`].
//!
//! Leaf fields resolve against the root entity or, for `alias.field` paths,
//! against the entity of the matching join. A dotted path whose prefix is not a
//! declared join is looked up verbatim on the root entity.

use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::ast::{Criteria, FilterData, NodeShape};
use crate::error::{CompileError, NodeFailure};
use crate::predicate::{CompareOp, FieldPath, Predicate};
use crate::schema::{find_field, resolve_fields, EntityDef, FieldDescriptor, JoinDeclaration};
use crate::value::{coerce, coerce_ordered, TypedValue};

/// What to do with a leaf that fails to compile
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompilePolicy {
    /// Fail the whole compile with the offending node
    #[default]
    Strict,
    /// Log the failure and drop the node
    Lenient,
}

/// Which string `IN`/`NOTIN` split on `;`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InListSource {
    /// Members come from the value and are coerced to the field kind
    #[default]
    Value,
    /// Legacy behaviour: members come from the field name, uncoerced
    FieldName,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileOptions {
    #[serde(default)]
    pub policy: CompilePolicy,
    #[serde(default)]
    pub in_list_source: InListSource,
}

pub struct FilterCompiler<'a> {
    root_fields: Vec<FieldDescriptor>,
    joins: Vec<(&'a JoinDeclaration, Vec<FieldDescriptor>)>,
    options: CompileOptions,
}

impl<'a> FilterCompiler<'a> {
    pub fn new(root: &EntityDef, joins: &'a [JoinDeclaration], options: CompileOptions) -> Self {
        Self {
            root_fields: resolve_fields(root),
            joins: joins
                .iter()
                .map(|join| (join, resolve_fields(join.entity)))
                .collect(),
            options,
        }
    }

    pub fn options(&self) -> CompileOptions {
        self.options
    }

    pub fn root_fields(&self) -> &[FieldDescriptor] {
        &self.root_fields
    }

    /// Declared joins with their resolved fields, in declaration order
    pub fn join_fields(&self) -> impl Iterator<Item = (&'a JoinDeclaration, &[FieldDescriptor])> {
        self.joins.iter().map(|(join, fields)| (*join, fields.as_slice()))
    }

    /// Resolves `field` or `alias.field` to a typed path.
    pub fn resolve_path(&self, field: &str) -> Option<FieldPath> {
        if let Some((prefix, rest)) = field.split_once('.') {
            if let Some((join, fields)) = self.joins.iter().find(|(join, _)| join.alias == prefix) {
                return find_field(fields, rest)
                    .map(|f| FieldPath::joined(join.alias.as_str(), f.name, f.kind));
            }
        }
        find_field(&self.root_fields, field).map(|f| FieldPath::root(f.name, f.kind))
    }

    /// Compiles a filter tree. `Ok(None)` means the tree contributes no predicate.
    pub fn compile(&self, node: &FilterData) -> Result<Option<Predicate>, CompileError> {
        match node.shape() {
            NodeShape::Leaf {
                field,
                criteria,
                value,
            } => match self.compile_leaf(field, criteria, value) {
                Ok(predicate) => Ok(Some(predicate)),
                Err(reason) => {
                    let error = CompileError::InvalidNode {
                        field: field.to_string(),
                        criteria,
                        value: value.to_string(),
                        reason,
                    };
                    match self.options.policy {
                        CompilePolicy::Strict => Err(error),
                        CompilePolicy::Lenient => {
                            error!(field, ?criteria, value, %error, "failed build predicate filter");
                            Ok(None)
                        }
                    }
                }
            },
            NodeShape::And(nodes) => Ok(Some(Predicate::And(self.compile_all(nodes)?))),
            NodeShape::Or(nodes) => Ok(Some(Predicate::Or(self.compile_all(nodes)?))),
            NodeShape::Malformed => {
                warn!(?node, "filter node is neither a complete leaf nor a composite");
                Ok(None)
            }
        }
    }

    fn compile_all(&self, nodes: &[FilterData]) -> Result<Vec<Predicate>, CompileError> {
        let mut predicates = Vec::with_capacity(nodes.len());
        for node in nodes {
            if let Some(predicate) = self.compile(node)? {
                predicates.push(predicate);
            }
        }
        Ok(predicates)
    }

    fn compile_leaf(
        &self,
        field: &str,
        criteria: Criteria,
        value: &str,
    ) -> Result<Predicate, NodeFailure> {
        let path = self.resolve_path(field).ok_or(NodeFailure::UnknownField)?;
        let kind = path.kind;

        let predicate = match criteria {
            Criteria::Eq | Criteria::Neq => Predicate::Compare {
                op: if criteria == Criteria::Eq {
                    CompareOp::Eq
                } else {
                    CompareOp::Ne
                },
                value: coerce(value, kind)?,
                path,
            },
            Criteria::Gt | Criteria::Lt | Criteria::Gte | Criteria::Lte => Predicate::Compare {
                op: match criteria {
                    Criteria::Gt => CompareOp::Gt,
                    Criteria::Lt => CompareOp::Lt,
                    Criteria::Gte => CompareOp::Gte,
                    _ => CompareOp::Lte,
                },
                value: coerce_ordered(value, kind)?,
                path,
            },
            Criteria::Like => Predicate::Like {
                path,
                pattern: value.to_lowercase(),
            },
            Criteria::IsNull => Predicate::IsNull(path),
            Criteria::IsNotNull => Predicate::IsNotNull(path),
            Criteria::In | Criteria::NotIn => {
                let values = match self.options.in_list_source {
                    InListSource::Value => value
                        .split(';')
                        .map(|member| coerce(member, kind))
                        .collect::<Result<Vec<_>, _>>()?,
                    InListSource::FieldName => field
                        .split(';')
                        .map(|member| TypedValue::String(member.to_string()))
                        .collect(),
                };
                Predicate::InList {
                    path,
                    values,
                    negated: criteria == Criteria::NotIn,
                }
            }
        };
        Ok(predicate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldKind;
    use crate::testing::{ann_and_bob, department, person, Person, DEPARTMENT, PERSON};

    fn joins() -> Vec<JoinDeclaration> {
        vec![JoinDeclaration::new("dept", &DEPARTMENT)]
    }

    fn compile_with(filter: &FilterData, options: CompileOptions) -> Result<Option<Predicate>, CompileError> {
        let joins = joins();
        FilterCompiler::new(&PERSON, &joins, options).compile(filter)
    }

    fn compile(filter: &FilterData) -> Predicate {
        compile_with(filter, CompileOptions::default()).unwrap().unwrap()
    }

    fn lenient() -> CompileOptions {
        CompileOptions {
            policy: CompilePolicy::Lenient,
            ..Default::default()
        }
    }

    fn names(people: &[Person], predicate: &Predicate) -> Vec<String> {
        people
            .iter()
            .filter(|p| predicate.matches(*p))
            .filter_map(|p| p.name.clone())
            .collect()
    }

    #[test]
    fn test_resolve_paths() {
        let joins = joins();
        let compiler = FilterCompiler::new(&PERSON, &joins, CompileOptions::default());
        assert_eq!(
            compiler.resolve_path("age"),
            Some(FieldPath::root("age", FieldKind::Int))
        );
        assert_eq!(
            compiler.resolve_path("dept.name"),
            Some(FieldPath::joined("dept", "name", FieldKind::String))
        );
        // known join, unknown field on it
        assert_eq!(compiler.resolve_path("dept.age"), None);
        // undeclared prefix falls back to a literal lookup on the root
        assert_eq!(compiler.resolve_path("team.name"), None);
        // deeper paths are not supported
        assert_eq!(compiler.resolve_path("dept.name.first"), None);
    }

    #[test]
    fn test_eq_and_neq_for_every_kind() {
        let mut ann = person(1, "Ann", 30);
        ann.dept = Some(department(3, "Eng"));
        let cases = [
            ("active", "true"),
            ("age", "30"),
            ("score", "3"),
            ("birth_date", "1994-06-15"),
            ("shift_start", "08:00:00"),
            ("created_at", "2024-01-01 09:00:00"),
            ("status", "ACTIVE"),
            ("name", "Ann"),
            ("dept.name", "Eng"),
        ];
        for (field, value) in cases {
            let eq = compile(&FilterData::leaf(field, Criteria::Eq, value));
            let neq = compile(&FilterData::leaf(field, Criteria::Neq, value));
            assert!(eq.matches(&ann), "{field} EQ {value}");
            assert!(!neq.matches(&ann), "{field} NEQ {value}");
        }
    }

    #[test]
    fn test_ordering_operators() {
        let people = ann_and_bob();
        let gte = compile(&FilterData::leaf("age", Criteria::Gte, "18"));
        assert_eq!(names(&people, &gte), vec!["Ann"]);

        let before = compile(&FilterData::leaf("birth_date", Criteria::Lt, "2000-01-01"));
        assert_eq!(names(&people, &before), vec!["Ann"]);

        let score = compile(&FilterData::leaf("score", Criteria::Gt, "2.5"));
        assert_eq!(names(&people, &score), vec!["Ann"]);
    }

    #[test]
    fn test_ordering_on_text_uses_integer_fallback() {
        let err = compile_with(&FilterData::leaf("name", Criteria::Gt, "Ann"), CompileOptions::default())
            .unwrap_err();
        assert!(matches!(
            err,
            CompileError::InvalidNode {
                reason: NodeFailure::BadValue { kind: "int", .. },
                ..
            }
        ));
    }

    #[test]
    fn test_like_is_case_insensitive() {
        let people = ann_and_bob();
        let like = compile(&FilterData::leaf("name", Criteria::Like, "%AN%"));
        assert_eq!(like, Predicate::Like {
            path: FieldPath::root("name", FieldKind::String),
            pattern: "%an%".to_string(),
        });
        assert_eq!(names(&people, &like), vec!["Ann"]);
    }

    #[test]
    fn test_null_checks_partition() {
        let mut people = ann_and_bob();
        people.push(Person {
            name: None,
            ..person(3, "", 40)
        });
        let is_null = compile(&FilterData::leaf("name", Criteria::IsNull, ""));
        let not_null = compile(&FilterData::leaf("name", Criteria::IsNotNull, ""));
        for p in &people {
            assert_ne!(is_null.matches(p), not_null.matches(p));
        }
        assert_eq!(people.iter().filter(|p| is_null.matches(*p)).count(), 1);
    }

    #[test]
    fn test_in_splits_value() {
        let people = ann_and_bob();
        let in_list = compile(&FilterData::leaf("age", Criteria::In, "17;18;19"));
        assert_eq!(names(&people, &in_list), vec!["Bob"]);
        let not_in = compile(&FilterData::leaf("name", Criteria::NotIn, "Bob;Cid"));
        assert_eq!(names(&people, &not_in), vec!["Ann"]);
    }

    #[test]
    fn test_in_legacy_splits_field_name() {
        let options = CompileOptions {
            in_list_source: InListSource::FieldName,
            ..Default::default()
        };
        let predicate = compile_with(&FilterData::leaf("name", Criteria::In, "Ann;Bob"), options)
            .unwrap()
            .unwrap();
        assert_eq!(
            predicate,
            Predicate::InList {
                path: FieldPath::root("name", FieldKind::String),
                values: vec![TypedValue::String("name".to_string())],
                negated: false,
            }
        );
        assert!(names(&ann_and_bob(), &predicate).is_empty());
    }

    #[test]
    fn test_composites() {
        let people = ann_and_bob();
        let either = compile(&FilterData::any([
            FilterData::leaf("name", Criteria::Eq, "Ann"),
            FilterData::leaf("age", Criteria::Lt, "18"),
        ]));
        assert_eq!(names(&people, &either), vec!["Ann", "Bob"]);

        let both = compile(&FilterData::all([
            FilterData::leaf("name", Criteria::Eq, "Ann"),
            FilterData::leaf("age", Criteria::Lt, "18"),
        ]));
        assert!(names(&people, &both).is_empty());

        let nothing = compile(&FilterData::all([]));
        assert_eq!(names(&people, &nothing).len(), 2);
    }

    #[test]
    fn test_strict_reports_offending_node() {
        let filter = FilterData::all([
            FilterData::leaf("age", Criteria::Gte, "18"),
            FilterData::leaf("status", Criteria::Eq, "RETIRED"),
        ]);
        let err = compile_with(&filter, CompileOptions::default()).unwrap_err();
        assert_eq!(
            err,
            CompileError::InvalidNode {
                field: "status".to_string(),
                criteria: Criteria::Eq,
                value: "RETIRED".to_string(),
                reason: NodeFailure::NoEnumConstant {
                    variants: vec!["ACTIVE", "SUSPENDED"],
                },
            }
        );
        let unknown = compile_with(&FilterData::leaf("team.name", Criteria::Eq, "x"), CompileOptions::default());
        assert!(matches!(
            unknown,
            Err(CompileError::InvalidNode { reason: NodeFailure::UnknownField, .. })
        ));
    }

    #[test]
    fn test_lenient_drops_failed_nodes() {
        let people = ann_and_bob();
        let bad = FilterData::leaf("birth_date", Criteria::Eq, "15/06/1994");

        // a dropped AND branch broadens the result
        let and = compile_with(
            &FilterData::all([FilterData::leaf("age", Criteria::Gte, "18"), bad.clone()]),
            lenient(),
        )
        .unwrap()
        .unwrap();
        assert_eq!(names(&people, &and), vec!["Ann"]);

        // a dropped OR branch narrows it
        let or = compile_with(
            &FilterData::any([FilterData::leaf("age", Criteria::Lt, "18"), bad.clone()]),
            lenient(),
        )
        .unwrap()
        .unwrap();
        assert_eq!(names(&people, &or), vec!["Bob"]);

        assert_eq!(compile_with(&bad, lenient()), Ok(None));
    }

    #[test]
    fn test_malformed_node_contributes_nothing() {
        let partial = FilterData {
            field: Some("age".to_string()),
            value: Some("3".to_string()),
            ..Default::default()
        };
        assert_eq!(compile_with(&partial, CompileOptions::default()), Ok(None));
        let wrapped = compile(&FilterData::all([partial]));
        assert_eq!(wrapped, Predicate::And(vec![]));
    }

    #[test]
    fn test_joined_filter() {
        let mut people = ann_and_bob();
        people[0].dept = Some(department(1, "Eng"));
        people[1].dept = Some(department(2, "Ops"));
        let predicate = compile(&FilterData::leaf("dept.name", Criteria::Eq, "Eng"));
        assert_eq!(names(&people, &predicate), vec!["Ann"]);
    }
}
