//! Schema Augmenter.
//!
//! Turns a [`ResolvedGraph`] into the complete derived type system: entity
//! object types, filter/sort/aggregate/update inputs, relationship field
//! inputs, connections, and the root `Query`, `Mutation` and (optionally)
//! `Subscription` types.
//!
//! Generation is a pure function of the resolved graph. Entities, fields and
//! edges are visited in declaration order; sorting happens only when the SDL
//! is printed.

pub mod naming;
pub mod scalars;
pub mod types;

mod entity;
mod relationship;
mod subscriptions;

use std::collections::BTreeSet;

use tracing::debug;

use crate::config::BuildOptions;
use crate::model::{
    CallbackOperation, Entity, EntityGraph, Field, NestedOperations, PropertiesType, ScalarKind,
};
use crate::relationships::{PropertiesBinding, RelationshipEdge, ResolvedGraph, TargetKind};

pub use naming::{EdgeNames, RootNames};
pub use types::{
    DerivedSchema, DerivedType, DerivedTypeKind, EnumValue, InputValue, OutputField,
    TypeDefinition, TypeRef, TypeRegistry, non_null,
};

/// Root operation type names.
pub const QUERY: &str = "Query";
pub const MUTATION: &str = "Mutation";
pub const SUBSCRIPTION: &str = "Subscription";

/// Suffixes of to-many relationship filters, e.g. `actors_SOME`.
pub const RELATIONSHIP_QUANTIFIERS: &[&str] = &["ALL", "NONE", "SINGLE", "SOME"];

/// Derives the full type system for `resolved`.
#[must_use]
pub fn augment(resolved: &ResolvedGraph, options: &BuildOptions) -> DerivedSchema {
    SchemaAugmenter::new(resolved, options).augment()
}

/// Nested write inputs that exist only when some relationship enables them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NestedInput {
    Connect,
    Delete,
    Disconnect,
}

impl NestedInput {
    fn suffix(self) -> &'static str {
        match self {
            Self::Connect => "ConnectInput",
            Self::Delete => "DeleteInput",
            Self::Disconnect => "DisconnectInput",
        }
    }

    fn enabled(self, ops: &NestedOperations) -> bool {
        match self {
            Self::Connect => ops.connect,
            Self::Delete => ops.delete,
            Self::Disconnect => ops.disconnect,
        }
    }

    fn field_input(self, names: &EdgeNames) -> String {
        match self {
            Self::Connect => names.connect_field_input(),
            Self::Delete => names.delete_field_input(),
            Self::Disconnect => names.disconnect_field_input(),
        }
    }

    fn kind(self) -> DerivedTypeKind {
        match self {
            Self::Connect => DerivedTypeKind::ConnectInput,
            Self::Delete => DerivedTypeKind::DeleteInput,
            Self::Disconnect => DerivedTypeKind::DisconnectInput,
        }
    }

    fn union_kind(self) -> DerivedTypeKind {
        match self {
            Self::Connect => DerivedTypeKind::UnionConnectInput,
            Self::Delete => DerivedTypeKind::UnionDeleteInput,
            Self::Disconnect => DerivedTypeKind::UnionDisconnectInput,
        }
    }
}

/// Inputs derived from a relationship properties type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PropertiesInput {
    Create,
    Update,
    Where,
    Sort,
    Aggregation,
}

impl PropertiesInput {
    fn type_name(self, properties: &str) -> String {
        let suffix = match self {
            Self::Create => "CreateInput",
            Self::Update => "UpdateInput",
            Self::Where => "Where",
            Self::Sort => "Sort",
            Self::Aggregation => "AggregationWhereInput",
        };
        format!("{properties}{suffix}")
    }

    fn wrapper_name(self, names: &EdgeNames) -> String {
        match self {
            Self::Create => names.edge_create_input(),
            Self::Update => names.edge_update_input(),
            Self::Where => names.edge_where(),
            Self::Sort => names.edge_sort(),
            Self::Aggregation => names.edge_aggregation_where(),
        }
    }

    fn wrapper_kind(self) -> DerivedTypeKind {
        match self {
            Self::Create => DerivedTypeKind::EdgeCreateInput,
            Self::Update => DerivedTypeKind::EdgeUpdateInput,
            Self::Where => DerivedTypeKind::EdgeWhere,
            Self::Sort => DerivedTypeKind::EdgeSort,
            Self::Aggregation => DerivedTypeKind::EdgeAggregationWhereInput,
        }
    }
}

/// `[T!]` for to-many edges, `T` for to-one.
pub(crate) fn by_cardinality(edge: &RelationshipEdge, name: impl Into<String>) -> TypeRef {
    if edge.is_many() {
        TypeRef::named_nn_list(name)
    } else {
        TypeRef::named(name)
    }
}

/// Falls back to the `_emptyInput` placeholder for inputs without fields.
pub(crate) fn non_empty(mut fields: Vec<InputValue>) -> Vec<InputValue> {
    if fields.is_empty() {
        fields.push(scalars::empty_input_field());
    }
    fields
}

pub struct SchemaAugmenter<'a> {
    resolved: &'a ResolvedGraph,
    options: &'a BuildOptions,
    registry: TypeRegistry,
    query: Vec<OutputField>,
    mutation: Vec<OutputField>,
    subscription: Vec<OutputField>,
}

impl<'a> SchemaAugmenter<'a> {
    #[must_use]
    pub fn new(resolved: &'a ResolvedGraph, options: &'a BuildOptions) -> Self {
        Self {
            resolved,
            options,
            registry: TypeRegistry::new(),
            query: Vec::new(),
            mutation: Vec::new(),
            subscription: Vec::new(),
        }
    }

    /// Generates every derived type.
    #[must_use]
    pub fn augment(mut self) -> DerivedSchema {
        let resolved = self.resolved;
        let graph = self.graph();

        for ty in scalars::common_types() {
            self.registry.register(ty);
        }
        self.register_leaf_types();

        for properties in graph.properties.values() {
            self.generate_properties(properties);
        }
        for union in graph.unions.values() {
            self.generate_union(union);
        }
        for entity in graph.entities.values() {
            if entity.is_interface() {
                self.generate_interface(entity);
            } else {
                self.generate_node(entity);
            }
        }
        for edge in &resolved.edges {
            self.generate_edge(edge);
        }
        if self.options.subscriptions {
            for entity in graph.nodes() {
                self.generate_subscriptions(entity);
            }
        }

        self.register_roots();

        let schema = self.registry.into_schema();
        debug!(
            types = schema.len(),
            entities = graph.entities.len(),
            edges = resolved.edges.len(),
            subscriptions = self.options.subscriptions,
            "Schema augmented"
        );
        schema
    }

    fn graph(&self) -> &'a EntityGraph {
        &self.resolved.graph
    }

    /// Enum and scalar declarations, plus aggregate selections for every kind
    /// that is aggregated somewhere.
    fn register_leaf_types(&mut self) {
        let graph = self.graph();

        for enum_type in graph.enums.values() {
            self.registry.register(
                DerivedType::enumeration(
                    enum_type.name.clone(),
                    DerivedTypeKind::Enum,
                    enum_type.values.iter().map(EnumValue::new),
                )
                .with_description(enum_type.description.clone()),
            );
        }

        let all_fields = || {
            graph
                .entities
                .values()
                .flat_map(|e| e.fields.iter())
                .chain(graph.properties.values().flat_map(|p| p.fields.iter()))
        };

        let used: BTreeSet<&str> = all_fields()
            .filter_map(|f| f.scalar.as_ref())
            .filter(|k| !matches!(k, ScalarKind::Enum(_)))
            .map(ScalarKind::type_name)
            .filter(|name| !scalars::GRAPHQL_BUILTIN_SCALARS.contains(name))
            .chain(graph.scalars.iter().map(String::as_str))
            .collect();
        for name in used {
            self.registry.register(DerivedType::scalar(name));
        }

        for field in all_fields().filter(|f| scalars::is_aggregatable(f)) {
            if let Some(ty) = field.scalar.as_ref().and_then(scalars::aggregate_selection_type) {
                self.registry.register(ty);
            }
        }

        if !graph.unions.is_empty() {
            self.registry.register(scalars::query_options_type());
        }
    }

    fn register_roots(&mut self) {
        let roots = [
            (QUERY, std::mem::take(&mut self.query)),
            (MUTATION, std::mem::take(&mut self.mutation)),
            (SUBSCRIPTION, std::mem::take(&mut self.subscription)),
        ];
        for (name, fields) in roots {
            if !fields.is_empty() {
                self.registry
                    .register(DerivedType::object(name, DerivedTypeKind::Root, fields));
            }
        }
    }

    // ------------------------------------------------------------------------
    // Shared lookups
    // ------------------------------------------------------------------------

    pub(crate) fn edge_names(&self, edge: &RelationshipEdge) -> EdgeNames {
        EdgeNames::new(&edge.source, &edge.field, &edge.target, edge.connection_owner())
    }

    /// The edge that owns the connection types for `edge`'s field.
    pub(crate) fn owner_edge(&self, edge: &'a RelationshipEdge) -> &'a RelationshipEdge {
        self.resolved
            .edge_for(edge.connection_owner(), &edge.field)
            .unwrap_or(edge)
    }

    pub(crate) fn edge_of(&self, entity: &Entity, field: &Field) -> Option<&'a RelationshipEdge> {
        self.resolved.edge_for(&entity.name, &field.name)
    }

    /// Union members, or the target itself.
    pub(crate) fn target_members(&self, edge: &RelationshipEdge) -> Vec<String> {
        match edge.target_kind {
            TargetKind::Union => self
                .graph()
                .unions
                .get(&edge.target)
                .map(|u| u.members.clone())
                .unwrap_or_default(),
            TargetKind::Node | TargetKind::Interface => vec![edge.target.clone()],
        }
    }

    /// Pagination options type for arguments on a field targeting `edge.target`.
    pub(crate) fn options_type(edge: &RelationshipEdge) -> String {
        match edge.target_kind {
            TargetKind::Union => scalars::QUERY_OPTIONS.to_string(),
            TargetKind::Node | TargetKind::Interface => format!("{}Options", edge.target),
        }
    }

    /// True if the entity named `name` gets a `Sort` input.
    pub(crate) fn has_sort(&self, name: &str) -> bool {
        self.graph()
            .entity(name)
            .is_some_and(|e| e.scalar_fields().any(|f| scalars::sort_field(f).is_some()))
    }

    pub(crate) fn properties(&self, name: &str) -> Option<&'a PropertiesType> {
        self.graph().properties.get(name)
    }

    fn properties_has(&self, properties: &str, input: PropertiesInput) -> bool {
        let Some(props) = self.properties(properties) else {
            return false;
        };
        match input {
            PropertiesInput::Create | PropertiesInput::Update | PropertiesInput::Where => true,
            PropertiesInput::Sort => props.fields.iter().any(|f| scalars::sort_field(f).is_some()),
            PropertiesInput::Aggregation => props.fields.iter().any(scalars::is_aggregatable),
        }
    }

    /// Properties create inputs with a required field must be supplied.
    fn properties_required_on_create(&self, properties: &str) -> bool {
        self.properties(properties).is_some_and(|props| {
            props.fields.iter().any(|f| {
                f.ty.required
                    && f.default_value.is_none()
                    && !f.is_populated_on(CallbackOperation::Create)
            })
        })
    }

    /// Type of the `edge` member of a relationship input.
    ///
    /// Shared bindings use the properties input directly; per-implementation
    /// bindings register an implementer-keyed wrapper.
    pub(crate) fn edge_properties_input(
        &mut self,
        names: &EdgeNames,
        binding: &PropertiesBinding,
        input: PropertiesInput,
    ) -> Option<TypeRef> {
        match binding {
            PropertiesBinding::None => None,
            PropertiesBinding::Shared(properties) => {
                if !self.properties_has(properties, input) {
                    return None;
                }
                let ty = TypeRef::named(input.type_name(properties));
                Some(
                    if input == PropertiesInput::Create
                        && self.properties_required_on_create(properties)
                    {
                        non_null(ty)
                    } else {
                        ty
                    },
                )
            }
            PropertiesBinding::PerImplementation(per_implementer) => {
                let fields: Vec<InputValue> = per_implementer
                    .iter()
                    .filter(|(_, properties)| self.properties_has(properties, input))
                    .map(|(implementer, properties)| {
                        let ty = TypeRef::named(input.type_name(properties));
                        let ty = if input == PropertiesInput::Create
                            && self.properties_required_on_create(properties)
                        {
                            non_null(ty)
                        } else {
                            ty
                        };
                        InputValue::new(implementer.clone(), ty)
                    })
                    .collect();
                if fields.is_empty() {
                    return None;
                }
                let required = fields.iter().any(|f| matches!(f.ty, TypeRef::NonNull(_)));
                let name = input.wrapper_name(names);
                self.registry
                    .register(DerivedType::input(name.clone(), input.wrapper_kind(), fields));
                let ty = TypeRef::named(name);
                Some(if required { non_null(ty) } else { ty })
            }
        }
    }

    /// Members of `<entity><Connect|Delete|Disconnect>Input`.
    ///
    /// Interfaces key the input by implementer.
    pub(crate) fn nested_input_fields(&self, entity: &Entity, input: NestedInput) -> Vec<InputValue> {
        let graph = self.graph();
        if entity.is_interface() {
            return graph
                .implementers_of(&entity.name)
                .into_iter()
                .filter(|implementer| !self.nested_input_fields(implementer, input).is_empty())
                .map(|implementer| {
                    InputValue::new(
                        implementer.name.clone(),
                        TypeRef::named(format!("{}{}", implementer.name, input.suffix())),
                    )
                })
                .collect();
        }

        self.resolved
            .edges_from(entity)
            .into_iter()
            .filter(|edge| input.enabled(&edge.nested_operations))
            .map(|edge| {
                let names = self.edge_names(edge);
                let ty = match edge.target_kind {
                    TargetKind::Union => TypeRef::named(names.keyed(input.suffix())),
                    TargetKind::Node | TargetKind::Interface => {
                        by_cardinality(edge, input.field_input(&names))
                    }
                };
                InputValue::new(edge.field.clone(), ty)
            })
            .collect()
    }

    /// True if `<name><Connect|Delete|Disconnect>Input` is generated.
    pub(crate) fn has_nested_input(&self, name: &str, input: NestedInput) -> bool {
        self.graph()
            .entity(name)
            .is_some_and(|e| !self.nested_input_fields(e, input).is_empty())
    }
}
