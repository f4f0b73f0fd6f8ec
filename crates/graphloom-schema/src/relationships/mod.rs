//! Resolved relationship edges.
//!
//! The Relationship Resolver turns every relationship field of the entity
//! graph into a [`RelationshipEdge`]: a directed, typed edge with a single
//! [`PropertiesBinding`] that the augmenter and the authorization compiler
//! consume without looking at directives again.

pub mod resolver;

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::Serialize;

use crate::model::{Cardinality, Direction, Entity, EntityGraph, NestedOperations};

pub use resolver::{RelationshipResolver, resolve};

/// Index of an edge in [`ResolvedGraph::edges`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct EdgeId(pub usize);

/// What kind of type sits at the far end of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Node,
    Interface,
    Union,
}

/// How a relationship's properties are typed across implementations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "types", rename_all = "camelCase")]
pub enum PropertiesBinding {
    None,
    /// Every implementation that carries properties uses this type.
    Shared(String),
    /// Implementer name to its properties type; at least two distinct types.
    PerImplementation(IndexMap<String, String>),
}

impl PropertiesBinding {
    /// Builds the binding from per-implementer properties, collapsing to
    /// `None` or `Shared` unless at least two distinct types are used.
    #[must_use]
    pub fn unify<'a>(per_implementer: impl IntoIterator<Item = (&'a str, Option<&'a str>)>) -> Self {
        let used: IndexMap<String, String> = per_implementer
            .into_iter()
            .filter_map(|(implementer, props)| props.map(|p| (implementer.to_string(), p.to_string())))
            .collect();

        let mut distinct: Vec<&String> = Vec::new();
        for props in used.values() {
            if !distinct.contains(&props) {
                distinct.push(props);
            }
        }

        match distinct.as_slice() {
            [] => Self::None,
            [single] => Self::Shared((*single).clone()),
            _ => Self::PerImplementation(used),
        }
    }

    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Distinct properties types in order of first use.
    #[must_use]
    pub fn distinct_types(&self) -> Vec<&str> {
        match self {
            Self::None => Vec::new(),
            Self::Shared(name) => vec![name.as_str()],
            Self::PerImplementation(map) => {
                let mut distinct: Vec<&str> = Vec::new();
                for props in map.values() {
                    if !distinct.contains(&props.as_str()) {
                        distinct.push(props);
                    }
                }
                distinct
            }
        }
    }

    /// Implementers using `properties_type`, for per-implementation bindings.
    #[must_use]
    pub fn implementers_using(&self, properties_type: &str) -> Vec<&str> {
        match self {
            Self::PerImplementation(map) => map
                .iter()
                .filter(|(_, props)| *props == properties_type)
                .map(|(implementer, _)| implementer.as_str())
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Whether query-side derivation for an edge is generated natively or left
/// to the external execution layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuerySupport {
    Native,
    Delegated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipEdge {
    pub id: EdgeId,
    pub source: String,
    pub field: String,
    pub target: String,
    pub target_kind: TargetKind,
    pub native_type: String,
    pub direction: Direction,
    pub cardinality: Cardinality,
    /// The relationship field itself is non-null.
    pub required: bool,
    pub properties: PropertiesBinding,
    #[serde(skip)]
    pub nested_operations: NestedOperations,
    pub source_is_interface: bool,
    /// Outermost interface declaring this field, when the source implements one.
    pub declared_by: Option<String>,
    /// Concrete implementers, for interface sources.
    pub implementers: Vec<String>,
    pub query_support: QuerySupport,
}

impl RelationshipEdge {
    /// Type that owns the connection types for this field.
    #[must_use]
    pub fn connection_owner(&self) -> &str {
        self.declared_by.as_deref().unwrap_or(&self.source)
    }

    #[must_use]
    pub fn is_many(&self) -> bool {
        self.cardinality == Cardinality::Many
    }
}

/// The entity graph together with its resolved edges.
#[derive(Debug, Clone, Default)]
pub struct ResolvedGraph {
    pub graph: EntityGraph,
    pub edges: Vec<RelationshipEdge>,
    by_field: HashMap<(String, String), EdgeId>,
}

impl ResolvedGraph {
    #[must_use]
    pub fn new(graph: EntityGraph, edges: Vec<RelationshipEdge>) -> Self {
        let by_field = edges
            .iter()
            .map(|e| ((e.source.clone(), e.field.clone()), e.id))
            .collect();
        Self {
            graph,
            edges,
            by_field,
        }
    }

    #[must_use]
    pub fn edge(&self, id: EdgeId) -> &RelationshipEdge {
        &self.edges[id.0]
    }

    /// Edge for `entity.field`, if that field resolved.
    #[must_use]
    pub fn edge_for(&self, entity: &str, field: &str) -> Option<&RelationshipEdge> {
        self.by_field
            .get(&(entity.to_string(), field.to_string()))
            .map(|id| self.edge(*id))
    }

    /// Resolved edges of `entity` in field declaration order.
    #[must_use]
    pub fn edges_from(&self, entity: &Entity) -> Vec<&RelationshipEdge> {
        entity
            .relationship_fields()
            .filter_map(|f| self.edge_for(&entity.name, &f.name))
            .collect()
    }

    /// Edges pointing at `target`, which reference rather than own it.
    pub fn edges_into<'a>(&'a self, target: &'a str) -> impl Iterator<Item = &'a RelationshipEdge> {
        self.edges.iter().filter(move |e| e.target == target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unify_none() {
        let binding = PropertiesBinding::unify([("Movie", None), ("Series", None)]);
        assert_eq!(binding, PropertiesBinding::None);
    }

    #[test]
    fn test_unify_collapses_single_type() {
        let binding =
            PropertiesBinding::unify([("Movie", Some("ActedIn")), ("Series", Some("ActedIn"))]);
        assert_eq!(binding, PropertiesBinding::Shared("ActedIn".into()));

        let partial = PropertiesBinding::unify([("Movie", Some("ActedIn")), ("Series", None)]);
        assert_eq!(partial, PropertiesBinding::Shared("ActedIn".into()));
    }

    #[test]
    fn test_unify_per_implementation() {
        let binding = PropertiesBinding::unify([
            ("Movie", Some("ActedIn")),
            ("Series", Some("StarredIn")),
            ("Short", Some("ActedIn")),
        ]);
        assert_eq!(binding.distinct_types(), vec!["ActedIn", "StarredIn"]);
        assert_eq!(binding.implementers_using("ActedIn"), vec!["Movie", "Short"]);
    }
}
