//! The filter tree and its compact JSON wire format.
//!
//! ```text
//! {"field": "age", "criteria": "GT", "value": "18"}
//! {"and": [ ... ]}
//! {"or": [ ... ]}
//! ```

use serde::{Deserialize, Serialize};
use tracing::error;

/// Comparison operator of a leaf node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Criteria {
    Eq,        // =
    Neq,       // !=
    Like,      // LIKE
    Gt,        // >
    Lt,        // <
    Gte,       // >=
    Lte,       // <=
    IsNull,    // IS NULL
    IsNotNull, // IS NOT NULL
    In,        // value1;value2
    NotIn,     // NOT (value1;value2)
}

/// A node of the filter tree.
///
/// Exactly one of the leaf triple (`field`, `criteria`, `value`), `and` or `or`
/// is expected to be populated. The shape is not enforced so that any document
/// the wire format allows can be decoded; [`FilterData::shape`] classifies it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criteria: Option<Criteria>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub and: Option<Vec<FilterData>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub or: Option<Vec<FilterData>>,
}

/// Borrowed view of what a [`FilterData`] node actually is
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeShape<'a> {
    Leaf {
        field: &'a str,
        criteria: Criteria,
        value: &'a str,
    },
    And(&'a [FilterData]),
    Or(&'a [FilterData]),
    /// Leaf triple partially set, or nothing set at all
    Malformed,
}

impl FilterData {
    /// Leaf comparison `field <criteria> value`
    pub fn leaf(field: impl Into<String>, criteria: Criteria, value: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            criteria: Some(criteria),
            value: Some(value.into()),
            ..Default::default()
        }
    }

    /// Conjunction of the given nodes
    pub fn all(nodes: impl IntoIterator<Item = FilterData>) -> Self {
        Self {
            and: Some(nodes.into_iter().collect()),
            ..Default::default()
        }
    }

    /// Disjunction of the given nodes
    pub fn any(nodes: impl IntoIterator<Item = FilterData>) -> Self {
        Self {
            or: Some(nodes.into_iter().collect()),
            ..Default::default()
        }
    }

    /// Classifies the node. A complete leaf triple wins over `and`, which wins over `or`.
    pub fn shape(&self) -> NodeShape<'_> {
        match (&self.field, self.criteria, &self.value) {
            (Some(field), Some(criteria), Some(value)) => NodeShape::Leaf {
                field,
                criteria,
                value,
            },
            _ => match (&self.and, &self.or) {
                (Some(nodes), _) => NodeShape::And(nodes),
                (None, Some(nodes)) => NodeShape::Or(nodes),
                (None, None) => NodeShape::Malformed,
            },
        }
    }

    /// Decodes a filter document. A malformed document is logged and yields `None`.
    pub fn from_json(json: &str) -> Option<Self> {
        match serde_json::from_str(json) {
            Ok(filter) => Some(filter),
            Err(e) => {
                error!(error = %e, "failed convert filter from json");
                None
            }
        }
    }

    pub fn to_json(&self) -> Option<String> {
        match serde_json::to_string(self) {
            Ok(json) => Some(json),
            Err(e) => {
                error!(error = %e, "failed convert filter to json");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_leaf_wire_format() {
        let filter = FilterData::leaf("age", Criteria::Gt, "18");
        let json = filter.to_json().unwrap();
        assert_eq!(json, r#"{"field":"age","criteria":"GT","value":"18"}"#);
    }

    #[test]
    fn test_decode_nested_document() {
        let json = r#"{"or":[{"field":"name","criteria":"EQ","value":"Ann"},
                       {"and":[{"field":"age","criteria":"ISNOTNULL","value":""},
                               {"field":"status","criteria":"NOTIN","value":"A;B"}]}]}"#;
        let filter = FilterData::from_json(json).unwrap();
        let expected = FilterData::any([
            FilterData::leaf("name", Criteria::Eq, "Ann"),
            FilterData::all([
                FilterData::leaf("age", Criteria::IsNotNull, ""),
                FilterData::leaf("status", Criteria::NotIn, "A;B"),
            ]),
        ]);
        assert_eq!(filter, expected);
    }

    #[test]
    fn test_malformed_document_is_no_filter() {
        assert_eq!(FilterData::from_json("{not valid json"), None);
        assert_eq!(
            FilterData::from_json(r#"{"field":"age","criteria":"BETWEEN","value":"1"}"#),
            None
        );
    }

    #[test]
    fn test_shape_classification() {
        let partial = FilterData {
            field: Some("age".to_string()),
            criteria: Some(Criteria::Eq),
            ..Default::default()
        };
        assert_eq!(partial.shape(), NodeShape::Malformed);
        assert_eq!(FilterData::default().shape(), NodeShape::Malformed);
        assert!(matches!(FilterData::all([]).shape(), NodeShape::And(nodes) if nodes.is_empty()));

        // a complete triple takes precedence over composite members
        let mixed = FilterData {
            and: Some(vec![]),
            ..FilterData::leaf("age", Criteria::Lt, "3")
        };
        assert!(matches!(mixed.shape(), NodeShape::Leaf { field: "age", .. }));
    }

    fn criteria_strategy() -> impl Strategy<Value = Criteria> {
        prop_oneof![
            Just(Criteria::Eq),
            Just(Criteria::Neq),
            Just(Criteria::Like),
            Just(Criteria::Gt),
            Just(Criteria::Lt),
            Just(Criteria::Gte),
            Just(Criteria::Lte),
            Just(Criteria::IsNull),
            Just(Criteria::IsNotNull),
            Just(Criteria::In),
            Just(Criteria::NotIn),
        ]
    }

    fn filter_strategy() -> impl Strategy<Value = FilterData> {
        let leaf = ("[a-z]{1,8}(\\.[a-z]{1,8})?", criteria_strategy(), "[ -~]{0,12}")
            .prop_map(|(field, criteria, value)| FilterData::leaf(field, criteria, value));
        leaf.prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(FilterData::all),
                prop::collection::vec(inner, 0..4).prop_map(FilterData::any),
            ]
        })
    }

    proptest! {
        #[test]
        fn test_json_round_trip(filter in filter_strategy()) {
            let json = filter.to_json().unwrap();
            prop_assert_eq!(FilterData::from_json(&json), Some(filter));
        }
    }
}
