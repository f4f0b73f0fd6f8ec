//! Relationship Resolver.
//!
//! Concrete relationship fields resolve directly from their `@relationship`
//! binding. Interface fields declared with `@declareRelationship` are
//! resolved from the concrete fields of every transitive implementer, which
//! must agree on relationship type, direction, cardinality and target.

use std::collections::HashSet;

use tracing::{debug, trace};

use super::{
    EdgeId, PropertiesBinding, QuerySupport, RelationshipEdge, ResolvedGraph, TargetKind,
};
use crate::config::BuildOptions;
use crate::error::{
    RelationshipResolutionError, SchemaValidationError, ValidationIssue,
};
use crate::model::{Entity, EntityGraph, Field, RelationshipBinding};

/// Resolves every relationship field of `graph`.
///
/// # Errors
///
/// Returns every resolution problem found.
pub fn resolve(
    graph: EntityGraph,
    options: &BuildOptions,
) -> Result<ResolvedGraph, SchemaValidationError> {
    let (resolved, issues) = RelationshipResolver::new(options).resolve(graph);
    SchemaValidationError::check(issues)?;
    Ok(resolved)
}

/// A concrete binding observed on one implementer.
struct ImplementerBinding<'g> {
    implementer: &'g str,
    field: &'g Field,
    target: &'g str,
    native_type: &'g str,
    direction: crate::model::Direction,
    properties: Option<&'g str>,
}

pub struct RelationshipResolver<'a> {
    options: &'a BuildOptions,
}

impl<'a> RelationshipResolver<'a> {
    #[must_use]
    pub fn new(options: &'a BuildOptions) -> Self {
        Self { options }
    }

    /// Resolves edges, returning the annotated graph and every issue found.
    /// Fields that fail to resolve have no edge.
    #[must_use]
    pub fn resolve(&self, graph: EntityGraph) -> (ResolvedGraph, Vec<ValidationIssue>) {
        let mut edges = Vec::new();
        let mut issues = Vec::new();

        for entity in graph.entities.values() {
            for field in entity.relationship_fields() {
                let edge = if entity.is_interface() {
                    self.resolve_declared(&graph, entity, field, edges.len(), &mut issues)
                } else {
                    resolve_concrete(&graph, entity, field, edges.len(), &mut issues)
                };
                if let Some(edge) = edge {
                    trace!(
                        source = %edge.source,
                        field = %edge.field,
                        target = %edge.target,
                        properties = ?edge.properties,
                        "Resolved relationship"
                    );
                    edges.push(edge);
                }
            }
        }

        debug!(
            edges = edges.len(),
            issues = issues.len(),
            "Relationships resolved"
        );

        (ResolvedGraph::new(graph, edges), issues)
    }

    fn resolve_declared(
        &self,
        graph: &EntityGraph,
        interface: &Entity,
        field: &Field,
        index: usize,
        issues: &mut Vec<ValidationIssue>,
    ) -> Option<RelationshipEdge> {
        let declaration = field.relationship()?;
        let interface_name = interface.name.as_str();
        let field_name = field.name.as_str();
        let issues_before = issues.len();

        let declared_by = declaring_root(graph, interface, field_name, issues)?;

        if graph.unions.contains_key(&declaration.target) {
            issues.push(ValidationIssue::InvalidField {
                owner: interface_name.to_string(),
                field: field_name.to_string(),
                message: "relationships declared on interfaces cannot target unions".into(),
                location: field.location,
            });
            return None;
        }

        let implementers = graph.implementers_of(interface_name);
        if implementers.is_empty() {
            issues.push(
                RelationshipResolutionError::NoImplementations {
                    interface: interface_name.to_string(),
                    field: field_name.to_string(),
                }
                .into(),
            );
            return None;
        }

        let mut bindings = Vec::new();
        for implementer in &implementers {
            let concrete = implementer.field(field_name).and_then(|f| {
                let decl = f.relationship()?;
                match &decl.binding {
                    RelationshipBinding::Concrete {
                        native_type,
                        direction,
                        properties,
                    } => Some(ImplementerBinding {
                        implementer: implementer.name.as_str(),
                        field: f,
                        target: decl.target.as_str(),
                        native_type: native_type.as_str(),
                        direction: *direction,
                        properties: properties.as_deref(),
                    }),
                    RelationshipBinding::DeclaredOnly => None,
                }
            });
            match concrete {
                Some(binding) => bindings.push(binding),
                None => issues.push(
                    RelationshipResolutionError::MissingImplementation {
                        interface: interface_name.to_string(),
                        field: field_name.to_string(),
                        implementer: implementer.name.clone(),
                    }
                    .into(),
                ),
            }
        }

        for binding in &bindings {
            if !target_compatible(graph, &declaration.target, binding.target) {
                issues.push(
                    RelationshipResolutionError::IncompatibleTarget {
                        interface: interface_name.to_string(),
                        field: field_name.to_string(),
                        implementer: binding.implementer.to_string(),
                        expected: declaration.target.clone(),
                        found: binding.target.to_string(),
                    }
                    .into(),
                );
            }
            if binding.field.cardinality() != field.cardinality() {
                issues.push(
                    RelationshipResolutionError::CardinalityMismatch {
                        interface: interface_name.to_string(),
                        field: field_name.to_string(),
                        implementer: binding.implementer.to_string(),
                        expected: field.cardinality().to_string(),
                        found: binding.field.cardinality().to_string(),
                    }
                    .into(),
                );
            }
        }

        check_agreement(
            interface_name,
            field_name,
            &bindings,
            "relationship types",
            |b| b.native_type.to_string(),
            issues,
        );
        check_agreement(
            interface_name,
            field_name,
            &bindings,
            "directions",
            |b| b.direction.to_string(),
            issues,
        );

        if issues.len() > issues_before {
            return None;
        }
        let first = bindings.first()?;

        let properties =
            PropertiesBinding::unify(bindings.iter().map(|b| (b.implementer, b.properties)));
        let target_kind = target_kind(graph, &declaration.target);
        let query_support = if target_kind == TargetKind::Interface
            && interface_nesting(graph, &declaration.target, &mut HashSet::new()) + 1
                > self.options.max_interface_nesting
        {
            QuerySupport::Delegated
        } else {
            QuerySupport::Native
        };

        Some(RelationshipEdge {
            id: EdgeId(index),
            source: interface_name.to_string(),
            field: field_name.to_string(),
            target: declaration.target.clone(),
            target_kind,
            native_type: first.native_type.to_string(),
            direction: first.direction,
            cardinality: field.cardinality(),
            required: field.ty.required,
            properties,
            nested_operations: declaration.nested_operations,
            source_is_interface: true,
            declared_by,
            implementers: implementers.iter().map(|e| e.name.clone()).collect(),
            query_support,
        })
    }
}

fn resolve_concrete(
    graph: &EntityGraph,
    entity: &Entity,
    field: &Field,
    index: usize,
    issues: &mut Vec<ValidationIssue>,
) -> Option<RelationshipEdge> {
    let declaration = field.relationship()?;
    let RelationshipBinding::Concrete {
        native_type,
        direction,
        properties,
    } = &declaration.binding
    else {
        return None;
    };

    let declared_by = declaring_root(graph, entity, &field.name, issues)?;

    Some(RelationshipEdge {
        id: EdgeId(index),
        source: entity.name.clone(),
        field: field.name.clone(),
        target: declaration.target.clone(),
        target_kind: target_kind(graph, &declaration.target),
        native_type: native_type.clone(),
        direction: *direction,
        cardinality: field.cardinality(),
        required: field.ty.required,
        properties: properties
            .clone()
            .map_or(PropertiesBinding::None, PropertiesBinding::Shared),
        nested_operations: declaration.nested_operations,
        source_is_interface: false,
        declared_by,
        implementers: Vec::new(),
        query_support: QuerySupport::Native,
    })
}

/// Finds the outermost interface declaring `field` for `entity`.
///
/// Returns `Some(None)` when no interface declares it, `Some(Some(root))`
/// for a single root, and `None` after reporting unrelated roots.
#[allow(clippy::option_option)]
fn declaring_root(
    graph: &EntityGraph,
    entity: &Entity,
    field: &str,
    issues: &mut Vec<ValidationIssue>,
) -> Option<Option<String>> {
    let declares = |name: &str| {
        graph
            .entity(name)
            .and_then(|e| e.field(field))
            .is_some_and(Field::is_relationship)
    };

    let mut candidates: Vec<&str> = graph
        .ancestors_of(&entity.name)
        .into_iter()
        .filter(|a| declares(a))
        .collect();
    if entity.is_interface() {
        candidates.insert(0, entity.name.as_str());
    }

    let roots: Vec<&str> = candidates
        .iter()
        .copied()
        .filter(|c| !graph.ancestors_of(c).into_iter().any(|a| declares(a)))
        .collect();

    match roots.as_slice() {
        [] => Some(None),
        [root] => Some(Some((*root).to_string())),
        _ => {
            issues.push(
                RelationshipResolutionError::AmbiguousDeclaration {
                    type_name: entity.name.clone(),
                    field: field.to_string(),
                    interfaces: roots.iter().map(|r| (*r).to_string()).collect(),
                }
                .into(),
            );
            None
        }
    }
}

fn target_kind(graph: &EntityGraph, target: &str) -> TargetKind {
    if graph.unions.contains_key(target) {
        TargetKind::Union
    } else if graph.is_interface(target) {
        TargetKind::Interface
    } else {
        TargetKind::Node
    }
}

/// An implementer may narrow the declared target to a subtype or member.
fn target_compatible(graph: &EntityGraph, declared: &str, found: &str) -> bool {
    if declared == found || graph.is_subtype_of(found, declared) {
        return true;
    }
    graph
        .unions
        .get(declared)
        .is_some_and(|u| u.members.iter().any(|m| m == found))
}

/// Length of the longest chain of interface-to-interface declared
/// relationships starting at `interface`.
fn interface_nesting(graph: &EntityGraph, interface: &str, visiting: &mut HashSet<String>) -> usize {
    if !visiting.insert(interface.to_string()) {
        return 0;
    }
    let depth = graph
        .entity(interface)
        .map(|entity| {
            entity
                .relationship_fields()
                .filter_map(Field::relationship)
                .filter(|decl| graph.is_interface(&decl.target))
                .map(|decl| 1 + interface_nesting(graph, &decl.target, visiting))
                .max()
                .unwrap_or(0)
        })
        .unwrap_or(0);
    visiting.remove(interface);
    depth
}

fn check_agreement(
    interface: &str,
    field: &str,
    bindings: &[ImplementerBinding<'_>],
    what: &str,
    key: impl Fn(&ImplementerBinding<'_>) -> String,
    issues: &mut Vec<ValidationIssue>,
) {
    let mut distinct: Vec<String> = Vec::new();
    for binding in bindings {
        let value = key(binding);
        if !distinct.contains(&value) {
            distinct.push(value);
        }
    }
    if distinct.len() > 1 {
        issues.push(
            RelationshipResolutionError::ConflictingImplementations {
                interface: interface.to_string(),
                field: field.to_string(),
                detail: format!("{what} {}", distinct.join(", ")),
                implementers: bindings.iter().map(|b| b.implementer.to_string()).collect(),
            }
            .into(),
        );
    }
}
