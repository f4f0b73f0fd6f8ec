//! Per-relationship-edge generation.

use tracing::trace;

use super::naming::EdgeNames;
use super::scalars;
use super::types::{DerivedType, DerivedTypeKind, InputValue, OutputField, TypeRef};
use super::{NestedInput, PropertiesInput, SchemaAugmenter, by_cardinality};
use crate::relationships::{PropertiesBinding, QuerySupport, RelationshipEdge, TargetKind};

const OVERWRITE_DESCRIPTION: &str =
    "Whether or not to overwrite any matching relationship with the new properties.";

impl<'a> SchemaAugmenter<'a> {
    pub(super) fn generate_edge(&mut self, edge: &'a RelationshipEdge) {
        let names = self.edge_names(edge);
        trace!(
            source = %edge.source,
            field = %edge.field,
            target = %edge.target,
            owner = %edge.connection_owner(),
            "Generating relationship types"
        );

        if edge.connection_owner() == edge.source {
            self.register_connection_types(edge, &names);
        }
        if edge.source_is_interface {
            // Implementers write through their own edges; the interface keeps
            // the generic implementer-keyed property inputs.
            self.edge_properties_input(&names, &edge.properties, PropertiesInput::Create);
            self.edge_properties_input(&names, &edge.properties, PropertiesInput::Update);
        }

        match edge.target_kind {
            TargetKind::Union => {
                if !edge.source_is_interface {
                    self.register_union_inputs(edge, &names);
                }
            }
            TargetKind::Node | TargetKind::Interface => {
                if !edge.source_is_interface {
                    self.register_write_inputs(edge, &names, &edge.target);
                }
                if edge.query_support == QuerySupport::Native {
                    self.register_aggregate_input(edge, &names);
                    if !edge.source_is_interface {
                        self.register_aggregation_selection(edge, &names);
                    }
                }
            }
        }
    }

    /// True if any properties type of `binding` has the given input.
    fn binding_has(&self, binding: &PropertiesBinding, input: PropertiesInput) -> bool {
        binding
            .distinct_types()
            .into_iter()
            .any(|properties| self.properties_has(properties, input))
    }

    /// True if `<Owner><Field>ConnectionSort` is generated for `owner`.
    pub(super) fn has_connection_sort(&self, owner: &RelationshipEdge) -> bool {
        (owner.target_kind != TargetKind::Union && self.has_sort(&owner.target))
            || self.binding_has(&owner.properties, PropertiesInput::Sort)
    }

    // ------------------------------------------------------------------------
    // Connection owner types
    // ------------------------------------------------------------------------

    /// Relationship, Connection, ConnectionWhere and ConnectionSort, emitted
    /// once per field by the type that owns the connection.
    fn register_connection_types(&mut self, edge: &RelationshipEdge, names: &EdgeNames) {
        let properties = match &edge.properties {
            PropertiesBinding::None => None,
            PropertiesBinding::Shared(properties) => Some(TypeRef::named_nn(properties.clone())),
            PropertiesBinding::PerImplementation(_) => {
                let union_name = names.properties_union();
                let members: Vec<String> = edge
                    .properties
                    .distinct_types()
                    .into_iter()
                    .map(str::to_string)
                    .collect();
                let description = members
                    .iter()
                    .map(|m| {
                        format!(
                            "{m}: {}",
                            edge.properties.implementers_using(m).join(", ")
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("; ");
                self.registry.register(
                    DerivedType::union(
                        union_name.clone(),
                        DerivedTypeKind::RelationshipProperties,
                        members,
                    )
                    .with_description(Some(description)),
                );
                Some(TypeRef::named_nn(union_name))
            }
        };

        let mut relationship = vec![
            OutputField::new("cursor", TypeRef::named_nn("String")),
            OutputField::new("node", TypeRef::named_nn(edge.target.clone())),
        ];
        if let Some(ty) = properties {
            relationship.push(OutputField::new("properties", ty));
        }
        let relationship_name = names.relationship();
        self.registry.register(DerivedType::object(
            relationship_name.clone(),
            DerivedTypeKind::Relationship,
            relationship,
        ));

        self.registry.register(DerivedType::object(
            names.connection(),
            DerivedTypeKind::RelationshipConnection,
            vec![
                OutputField::new("edges", TypeRef::named_nn_list_nn(relationship_name)),
                OutputField::new("pageInfo", TypeRef::named_nn(scalars::PAGE_INFO)),
                OutputField::new("totalCount", TypeRef::named_nn("Int")),
            ],
        ));

        let edge_where = self.edge_properties_input(names, &edge.properties, PropertiesInput::Where);
        match edge.target_kind {
            TargetKind::Union => {
                let mut keyed = Vec::new();
                for member in self.target_members(edge) {
                    let member_names = names.member(&member);
                    let fields = connection_where_fields(
                        &member_names.connection_where(),
                        &member,
                        edge_where.clone(),
                    );
                    self.registry.register(DerivedType::input(
                        member_names.connection_where(),
                        DerivedTypeKind::ConnectionWhere,
                        fields,
                    ));
                    keyed.push(InputValue::new(
                        member,
                        TypeRef::named(member_names.connection_where()),
                    ));
                }
                self.registry.register(DerivedType::input(
                    names.connection_where(),
                    DerivedTypeKind::UnionConnectionWhere,
                    keyed,
                ));
            }
            TargetKind::Node | TargetKind::Interface => {
                let fields =
                    connection_where_fields(&names.connection_where(), &edge.target, edge_where);
                self.registry.register(DerivedType::input(
                    names.connection_where(),
                    DerivedTypeKind::ConnectionWhere,
                    fields,
                ));
            }
        }

        let mut sort = Vec::new();
        if edge.target_kind != TargetKind::Union && self.has_sort(&edge.target) {
            sort.push(InputValue::new(
                "node",
                TypeRef::named(format!("{}Sort", edge.target)),
            ));
        }
        if let Some(ty) = self.edge_properties_input(names, &edge.properties, PropertiesInput::Sort)
        {
            sort.push(InputValue::new("edge", ty));
        }
        if !sort.is_empty() {
            self.registry.register(DerivedType::input(
                names.connection_sort(),
                DerivedTypeKind::ConnectionSort,
                sort,
            ));
        }
    }

    // ------------------------------------------------------------------------
    // Nested write inputs
    // ------------------------------------------------------------------------

    /// Field inputs for writing through `edge` to `target`, pruned by the
    /// edge's nested operations.
    fn register_write_inputs(&mut self, edge: &RelationshipEdge, names: &EdgeNames, target: &str) {
        let ops = edge.nested_operations;
        let edge_create = self.edge_properties_input(names, &edge.properties, PropertiesInput::Create);
        let edge_update = self.edge_properties_input(names, &edge.properties, PropertiesInput::Update);

        if ops.connect {
            let mut fields = vec![InputValue::new(
                "where",
                TypeRef::named(format!("{target}ConnectWhere")),
            )];
            if self.has_nested_input(target, NestedInput::Connect) {
                fields.push(InputValue::new(
                    "connect",
                    TypeRef::named_nn_list(format!("{target}ConnectInput")),
                ));
            }
            if let Some(ty) = &edge_create {
                fields.push(InputValue::new("edge", ty.clone()));
            }
            fields.push(
                InputValue::new("overwrite", TypeRef::named_nn("Boolean"))
                    .default_value(true)
                    .description(Some(OVERWRITE_DESCRIPTION.to_string())),
            );
            self.registry.register(DerivedType::input(
                names.connect_field_input(),
                DerivedTypeKind::ConnectFieldInput,
                fields,
            ));
        }

        if ops.create {
            let mut fields = vec![InputValue::new(
                "node",
                TypeRef::named_nn(format!("{target}CreateInput")),
            )];
            if let Some(ty) = &edge_create {
                fields.push(InputValue::new("edge", ty.clone()));
            }
            self.registry.register(DerivedType::input(
                names.create_field_input(),
                DerivedTypeKind::CreateFieldInput,
                fields,
            ));
        }

        if ops.create || ops.connect {
            let mut fields = Vec::new();
            if ops.connect {
                fields.push(InputValue::new(
                    "connect",
                    by_cardinality(edge, names.connect_field_input()),
                ));
            }
            if ops.create {
                fields.push(InputValue::new(
                    "create",
                    by_cardinality(edge, names.create_field_input()),
                ));
            }
            self.registry.register(DerivedType::input(
                names.field_input(),
                DerivedTypeKind::FieldInput,
                fields,
            ));
        }

        let connection_where = TypeRef::named(names.connection_where());

        if ops.update {
            let mut fields = vec![InputValue::new(
                "node",
                TypeRef::named(format!("{target}UpdateInput")),
            )];
            if let Some(ty) = edge_update {
                fields.push(InputValue::new("edge", ty));
            }
            self.registry.register(DerivedType::input(
                names.update_connection_input(),
                DerivedTypeKind::UpdateConnectionInput,
                fields,
            ));
        }

        if ops.delete {
            let mut fields = vec![InputValue::new("where", connection_where.clone())];
            if self.has_nested_input(target, NestedInput::Delete) {
                fields.push(InputValue::new(
                    "delete",
                    TypeRef::named(format!("{target}DeleteInput")),
                ));
            }
            self.registry.register(DerivedType::input(
                names.delete_field_input(),
                DerivedTypeKind::DeleteFieldInput,
                fields,
            ));
        }

        if ops.disconnect {
            let mut fields = vec![InputValue::new("where", connection_where.clone())];
            if self.has_nested_input(target, NestedInput::Disconnect) {
                fields.push(InputValue::new(
                    "disconnect",
                    TypeRef::named(format!("{target}DisconnectInput")),
                ));
            }
            self.registry.register(DerivedType::input(
                names.disconnect_field_input(),
                DerivedTypeKind::DisconnectFieldInput,
                fields,
            ));
        }

        if !ops.is_empty() {
            let mut fields = vec![InputValue::new("where", connection_where)];
            if ops.update {
                fields.push(InputValue::new(
                    "update",
                    TypeRef::named(names.update_connection_input()),
                ));
            }
            for (member, enabled, input) in [
                ("connect", ops.connect, names.connect_field_input()),
                ("disconnect", ops.disconnect, names.disconnect_field_input()),
                ("create", ops.create, names.create_field_input()),
                ("delete", ops.delete, names.delete_field_input()),
            ] {
                if enabled {
                    fields.push(InputValue::new(member, by_cardinality(edge, input)));
                }
            }
            self.registry.register(DerivedType::input(
                names.update_field_input(),
                DerivedTypeKind::UpdateFieldInput,
                fields,
            ));
        }
    }

    /// Per-member write inputs plus the member-keyed wrappers for a
    /// union-typed relationship.
    fn register_union_inputs(&mut self, edge: &RelationshipEdge, names: &EdgeNames) {
        let ops = edge.nested_operations;
        let members = self.target_members(edge);
        for member in &members {
            self.register_write_inputs(edge, &names.member(member), member);
        }

        let keyed = |input: &dyn Fn(&EdgeNames) -> TypeRef| -> Vec<InputValue> {
            members
                .iter()
                .map(|m| InputValue::new(m.clone(), input(&names.member(m))))
                .collect()
        };

        if ops.create || ops.connect {
            let fields = keyed(&|n| TypeRef::named(n.field_input()));
            self.registry.register(DerivedType::input(
                names.keyed("CreateInput"),
                DerivedTypeKind::UnionCreateInput,
                fields,
            ));
        }
        if !ops.is_empty() {
            let fields = keyed(&|n| by_cardinality(edge, n.update_field_input()));
            self.registry.register(DerivedType::input(
                names.keyed("UpdateInput"),
                DerivedTypeKind::UnionUpdateInput,
                fields,
            ));
        }
        for input in [NestedInput::Connect, NestedInput::Delete, NestedInput::Disconnect] {
            if input.enabled(&ops) {
                let fields = keyed(&|n| by_cardinality(edge, input.field_input(n)));
                self.registry.register(DerivedType::input(
                    names.keyed(input.suffix()),
                    input.union_kind(),
                    fields,
                ));
            }
        }
    }

    // ------------------------------------------------------------------------
    // Aggregation
    // ------------------------------------------------------------------------

    fn register_aggregate_input(&mut self, edge: &RelationshipEdge, names: &EdgeNames) {
        let input_name = names.aggregate_input();
        let mut fields = scalars::count_filter_fields();
        fields.extend(scalars::logical_fields(&input_name));

        let node_fields: Vec<InputValue> = self
            .graph()
            .entity(&edge.target)
            .map(|target| {
                target
                    .scalar_fields()
                    .flat_map(scalars::aggregation_where_fields)
                    .collect()
            })
            .unwrap_or_default();
        if !node_fields.is_empty() {
            let node_name = names.node_aggregation_where();
            let mut node_fields = node_fields;
            node_fields.extend(scalars::logical_fields(&node_name));
            self.registry.register(DerivedType::input(
                node_name.clone(),
                DerivedTypeKind::NodeAggregationWhereInput,
                node_fields,
            ));
            fields.push(InputValue::new("node", TypeRef::named(node_name)));
        }

        if let Some(ty) =
            self.edge_properties_input(names, &edge.properties, PropertiesInput::Aggregation)
        {
            fields.push(InputValue::new("edge", ty));
        }

        self.registry.register(DerivedType::input(
            input_name,
            DerivedTypeKind::AggregateInput,
            fields,
        ));
    }

    fn register_aggregation_selection(&mut self, edge: &RelationshipEdge, names: &EdgeNames) {
        let mut fields = vec![OutputField::new("count", TypeRef::named_nn("Int"))];

        let node_fields: Vec<OutputField> = self
            .graph()
            .entity(&edge.target)
            .map(|target| {
                target
                    .scalar_fields()
                    .filter_map(scalars::aggregate_selection_field)
                    .collect()
            })
            .unwrap_or_default();
        if !node_fields.is_empty() {
            let node_name = names.node_aggregate_selection();
            self.registry.register(DerivedType::object(
                node_name.clone(),
                DerivedTypeKind::NodeAggregateSelection,
                node_fields,
            ));
            fields.push(OutputField::new("node", TypeRef::named(node_name)));
        }

        if let PropertiesBinding::Shared(properties) = &edge.properties {
            let edge_fields: Vec<OutputField> = self
                .properties(properties)
                .map(|props| {
                    props
                        .fields
                        .iter()
                        .filter_map(scalars::aggregate_selection_field)
                        .collect()
                })
                .unwrap_or_default();
            if !edge_fields.is_empty() {
                let edge_name = names.edge_aggregate_selection();
                self.registry.register(DerivedType::object(
                    edge_name.clone(),
                    DerivedTypeKind::EdgeAggregateSelection,
                    edge_fields,
                ));
                fields.push(OutputField::new("edge", TypeRef::named(edge_name)));
            }
        }

        self.registry.register(DerivedType::object(
            names.aggregation_selection(),
            DerivedTypeKind::AggregationSelection,
            fields,
        ));
    }
}

fn connection_where_fields(
    where_name: &str,
    target: &str,
    edge_where: Option<TypeRef>,
) -> Vec<InputValue> {
    let mut fields = vec![InputValue::new("node", TypeRef::named(format!("{target}Where")))];
    if let Some(ty) = edge_where {
        fields.push(InputValue::new("edge", ty));
    }
    fields.extend(scalars::logical_fields(where_name));
    fields
}
