//! Per-entity, per-union and per-properties-type generation.

use tracing::trace;

use super::naming::{RootNames, lower_first, pluralize};
use super::scalars::{self, CREATE_INFO, DELETE_INFO, PAGE_INFO, QUERY_OPTIONS, UPDATE_INFO};
use super::types::{
    DerivedType, DerivedTypeKind, EnumValue, InputValue, OutputField, TypeRef, field_type_ref,
};
use super::{NestedInput, RELATIONSHIP_QUANTIFIERS, SchemaAugmenter, by_cardinality, non_empty};
use crate::model::{CallbackOperation, Entity, Field, PropertiesType, UnionType};
use crate::relationships::{QuerySupport, RelationshipEdge, TargetKind};

/// Create-input member for a scalar field, unless a callback or id
/// generation owns its value on create.
pub(super) fn create_field(field: &Field) -> Option<InputValue> {
    if field.is_relationship() || field.is_populated_on(CallbackOperation::Create) {
        return None;
    }
    let value = InputValue::new(field.name.clone(), field_type_ref(&field.ty))
        .description(field.description.clone());
    Some(match &field.default_value {
        Some(default) => value.default_value(default.clone()),
        None => value,
    })
}

/// Update-input members for a scalar field.
pub(super) fn update_field(field: &Field) -> Vec<InputValue> {
    if field.is_relationship() || field.is_populated_on(CallbackOperation::Update) {
        return Vec::new();
    }
    scalars::update_fields(field)
}

fn scalar_output(field: &Field) -> OutputField {
    OutputField::new(field.name.clone(), field_type_ref(&field.ty))
        .description(field.description.clone())
}

fn where_arg(type_name: &str) -> InputValue {
    InputValue::new("where", TypeRef::named(format!("{type_name}Where")))
}

fn pagination_args() -> [InputValue; 2] {
    [
        InputValue::new("after", TypeRef::named("String")),
        InputValue::new("first", TypeRef::named("Int")),
    ]
}

impl<'a> SchemaAugmenter<'a> {
    pub(super) fn generate_node(&mut self, entity: &'a Entity) {
        let name = entity.name.as_str();
        let roots = RootNames::new(&entity.plural_name());
        trace!(entity = %name, plural = %roots.list, "Generating node types");

        let object = DerivedType::object(name, DerivedTypeKind::Entity, self.object_fields(entity))
            .with_implements(self.ancestors(name))
            .with_description(entity.description.clone());
        self.registry.register(object);

        let has_sort = self.register_read_types(entity, &roots);
        self.register_write_types(entity);

        self.registry.register(DerivedType::object(
            roots.create_response.clone(),
            DerivedTypeKind::MutationResponse,
            vec![
                OutputField::new("info", TypeRef::named_nn(CREATE_INFO)),
                OutputField::new(roots.list.clone(), TypeRef::named_nn_list_nn(name)),
            ],
        ));
        self.registry.register(DerivedType::object(
            roots.update_response.clone(),
            DerivedTypeKind::MutationResponse,
            vec![
                OutputField::new("info", TypeRef::named_nn(UPDATE_INFO)),
                OutputField::new(roots.list.clone(), TypeRef::named_nn_list_nn(name)),
            ],
        ));

        self.push_query_fields(name, &roots, has_sort);

        self.mutation.push(
            OutputField::new(roots.create.clone(), TypeRef::named_nn(roots.create_response.clone()))
                .argument(InputValue::new(
                    "input",
                    TypeRef::named_nn_list_nn(format!("{name}CreateInput")),
                )),
        );

        let mut update = OutputField::new(
            roots.update.clone(),
            TypeRef::named_nn(roots.update_response.clone()),
        )
        .argument(where_arg(name))
        .argument(InputValue::new("update", TypeRef::named(format!("{name}UpdateInput"))));
        for (argument, input) in [
            ("connect", NestedInput::Connect),
            ("disconnect", NestedInput::Disconnect),
            ("delete", NestedInput::Delete),
        ] {
            if self.has_nested_input(name, input) {
                update = update.argument(InputValue::new(
                    argument,
                    TypeRef::named(format!("{name}{}", input.suffix())),
                ));
            }
        }
        self.mutation.push(update);

        let mut delete = OutputField::new(roots.delete.clone(), TypeRef::named_nn(DELETE_INFO))
            .argument(where_arg(name));
        if self.has_nested_input(name, NestedInput::Delete) {
            delete = delete.argument(InputValue::new(
                "delete",
                TypeRef::named(format!("{name}DeleteInput")),
            ));
        }
        self.mutation.push(delete);
    }

    pub(super) fn generate_interface(&mut self, entity: &'a Entity) {
        let name = entity.name.as_str();
        let roots = RootNames::new(&entity.plural_name());
        let implementers: Vec<String> = self
            .graph()
            .implementers_of(name)
            .into_iter()
            .map(|e| e.name.clone())
            .collect();
        trace!(
            interface = %name,
            implementers = implementers.len(),
            "Generating interface types"
        );

        let interface = DerivedType::interface(name, self.object_fields(entity))
            .with_implements(self.ancestors(name))
            .with_description(entity.description.clone());
        self.registry.register(interface);

        if !implementers.is_empty() {
            self.registry.register(DerivedType::enumeration(
                format!("{name}Implementation"),
                DerivedTypeKind::ImplementationEnum,
                implementers.iter().map(EnumValue::new),
            ));
        }

        let has_sort = self.register_read_types(entity, &roots);
        self.register_write_types(entity);
        self.push_query_fields(name, &roots, has_sort);
    }

    pub(super) fn generate_union(&mut self, union: &UnionType) {
        let name = union.name.as_str();
        self.registry.register(
            DerivedType::union(name, DerivedTypeKind::Union, union.members.clone())
                .with_description(union.description.clone()),
        );

        let members = union
            .members
            .iter()
            .map(|m| InputValue::new(m.clone(), TypeRef::named(format!("{m}Where"))))
            .collect();
        self.registry.register(DerivedType::input(
            format!("{name}Where"),
            DerivedTypeKind::UnionWhere,
            members,
        ));

        self.query.push(
            OutputField::new(
                lower_first(&pluralize(name)),
                TypeRef::named_nn_list_nn(name),
            )
            .argument(InputValue::new("options", TypeRef::named(QUERY_OPTIONS)))
            .argument(where_arg(name)),
        );
    }

    pub(super) fn generate_properties(&mut self, properties: &PropertiesType) {
        let name = properties.name.as_str();
        let fields = &properties.fields;
        trace!(properties = %name, "Generating relationship properties types");

        self.registry.register(
            DerivedType::object(
                name,
                DerivedTypeKind::Properties,
                fields.iter().map(scalar_output).collect(),
            )
            .with_description(properties.description.clone()),
        );

        self.registry.register(DerivedType::input(
            format!("{name}CreateInput"),
            DerivedTypeKind::PropertiesCreateInput,
            non_empty(fields.iter().filter_map(create_field).collect()),
        ));
        self.registry.register(DerivedType::input(
            format!("{name}UpdateInput"),
            DerivedTypeKind::PropertiesUpdateInput,
            non_empty(fields.iter().flat_map(update_field).collect()),
        ));

        let where_name = format!("{name}Where");
        let mut where_fields: Vec<InputValue> =
            fields.iter().flat_map(scalars::where_fields).collect();
        where_fields.extend(scalars::logical_fields(&where_name));
        self.registry.register(DerivedType::input(
            where_name,
            DerivedTypeKind::PropertiesWhere,
            where_fields,
        ));

        let sort: Vec<InputValue> = fields.iter().filter_map(scalars::sort_field).collect();
        if !sort.is_empty() {
            self.registry.register(DerivedType::input(
                format!("{name}Sort"),
                DerivedTypeKind::PropertiesSort,
                sort,
            ));
        }

        let aggregation: Vec<InputValue> =
            fields.iter().flat_map(scalars::aggregation_where_fields).collect();
        if !aggregation.is_empty() {
            let aggregation_name = format!("{name}AggregationWhereInput");
            let mut aggregation = aggregation;
            aggregation.extend(scalars::logical_fields(&aggregation_name));
            self.registry.register(DerivedType::input(
                aggregation_name,
                DerivedTypeKind::PropertiesAggregationWhereInput,
                aggregation,
            ));
        }
    }

    // ------------------------------------------------------------------------
    // Shared by nodes and interfaces
    // ------------------------------------------------------------------------

    fn ancestors(&self, name: &str) -> Vec<String> {
        self.graph()
            .ancestors_of(name)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    fn object_fields(&self, entity: &Entity) -> Vec<OutputField> {
        let mut fields = Vec::new();
        for field in &entity.fields {
            match self.edge_of(entity, field) {
                Some(edge) => fields.extend(self.relationship_output_fields(entity, field, edge)),
                None if !field.is_relationship() => fields.push(scalar_output(field)),
                None => {}
            }
        }
        fields
    }

    /// The relationship field, its `Aggregate` field and its `Connection`
    /// field. Arguments come from the connection owner so implementations
    /// match the interface signature.
    fn relationship_output_fields(
        &self,
        entity: &Entity,
        field: &Field,
        edge: &'a RelationshipEdge,
    ) -> Vec<OutputField> {
        let owner = self.owner_edge(edge);
        let names = self.edge_names(edge);

        let mut traversal = OutputField::new(field.name.clone(), field_type_ref(&field.ty))
            .description(field.description.clone());
        if owner.is_many() {
            traversal = traversal
                .argument(InputValue::new("options", TypeRef::named(Self::options_type(owner))));
        }
        let mut fields = vec![traversal.argument(where_arg(&owner.target))];

        if !entity.is_interface()
            && edge.target_kind != TargetKind::Union
            && edge.query_support == QuerySupport::Native
        {
            fields.push(
                OutputField::new(
                    format!("{}Aggregate", field.name),
                    TypeRef::named(names.aggregation_selection()),
                )
                .argument(where_arg(&edge.target)),
            );
        }

        let mut connection = OutputField::new(
            format!("{}Connection", field.name),
            TypeRef::named_nn(names.connection()),
        );
        for argument in pagination_args() {
            connection = connection.argument(argument);
        }
        if self.has_connection_sort(owner) {
            connection = connection.argument(InputValue::new(
                "sort",
                TypeRef::named_nn_list(names.connection_sort()),
            ));
        }
        fields.push(connection.argument(InputValue::new(
            "where",
            TypeRef::named(names.connection_where()),
        )));
        fields
    }

    /// Where, Sort, Options, AggregateSelection, Edge, Connection and
    /// ConnectWhere. Returns whether a Sort input exists.
    fn register_read_types(&mut self, entity: &Entity, roots: &RootNames) -> bool {
        let name = entity.name.as_str();
        let where_name = format!("{name}Where");

        let where_fields = self.where_fields(entity, &where_name);
        self.registry
            .register(DerivedType::input(where_name.clone(), DerivedTypeKind::Where, where_fields));

        let sort: Vec<InputValue> = entity.scalar_fields().filter_map(scalars::sort_field).collect();
        let has_sort = !sort.is_empty();
        if has_sort {
            self.registry
                .register(DerivedType::input(format!("{name}Sort"), DerivedTypeKind::Sort, sort));
        }

        let mut options = vec![
            InputValue::new("limit", TypeRef::named("Int")),
            InputValue::new("offset", TypeRef::named("Int")),
        ];
        if has_sort {
            options.push(
                InputValue::new("sort", TypeRef::named_nn_list(format!("{name}Sort"))).description(
                    Some(format!(
                        "Specify one or more {name}Sort objects to sort {} by. The sorts will be applied in the order in which they are arranged in the array.",
                        roots.list
                    )),
                ),
            );
        }
        self.registry.register(DerivedType::input(
            format!("{name}Options"),
            DerivedTypeKind::Options,
            options,
        ));

        let mut aggregate = vec![OutputField::new("count", TypeRef::named_nn("Int"))];
        aggregate.extend(entity.scalar_fields().filter_map(scalars::aggregate_selection_field));
        self.registry.register(DerivedType::object(
            format!("{name}AggregateSelection"),
            DerivedTypeKind::AggregateSelection,
            aggregate,
        ));

        let edge_name = format!("{name}Edge");
        self.registry.register(DerivedType::object(
            edge_name.clone(),
            DerivedTypeKind::Edge,
            vec![
                OutputField::new("cursor", TypeRef::named_nn("String")),
                OutputField::new("node", TypeRef::named_nn(name)),
            ],
        ));
        self.registry.register(DerivedType::object(
            roots.connection_type.clone(),
            DerivedTypeKind::Connection,
            vec![
                OutputField::new("edges", TypeRef::named_nn_list_nn(edge_name)),
                OutputField::new("pageInfo", TypeRef::named_nn(PAGE_INFO)),
                OutputField::new("totalCount", TypeRef::named_nn("Int")),
            ],
        ));

        self.registry.register(DerivedType::input(
            format!("{name}ConnectWhere"),
            DerivedTypeKind::ConnectWhere,
            vec![InputValue::new("node", TypeRef::named_nn(where_name))],
        ));

        has_sort
    }

    fn where_fields(&self, entity: &Entity, where_name: &str) -> Vec<InputValue> {
        let mut fields: Vec<InputValue> =
            entity.scalar_fields().flat_map(scalars::where_fields).collect();
        fields.extend(scalars::logical_fields(where_name));

        if entity.is_interface() && !self.graph().implementers_of(&entity.name).is_empty() {
            fields.push(InputValue::new(
                "typename_IN",
                TypeRef::named_nn_list(format!("{}Implementation", entity.name)),
            ));
        }

        for edge in self.resolved.edges_from(entity) {
            if edge.query_support == QuerySupport::Delegated {
                trace!(
                    source = %edge.source,
                    field = %edge.field,
                    "Skipping traversal filters for delegated relationship"
                );
                continue;
            }
            fields.extend(self.relationship_where_fields(edge));
        }
        fields
    }

    fn relationship_where_fields(&self, edge: &RelationshipEdge) -> Vec<InputValue> {
        let names = self.edge_names(edge);
        let target_where = TypeRef::named(format!("{}Where", edge.target));
        let connection_where = TypeRef::named(names.connection_where());

        let mut fields = Vec::new();
        if edge.is_many() {
            for quantifier in RELATIONSHIP_QUANTIFIERS {
                fields.push(InputValue::new(
                    format!("{}_{quantifier}", edge.field),
                    target_where.clone(),
                ));
            }
            for quantifier in RELATIONSHIP_QUANTIFIERS {
                fields.push(InputValue::new(
                    format!("{}Connection_{quantifier}", edge.field),
                    connection_where.clone(),
                ));
            }
        } else {
            fields.push(InputValue::new(edge.field.clone(), target_where));
            fields.push(InputValue::new(
                format!("{}Connection", edge.field),
                connection_where,
            ));
        }
        if edge.target_kind != TargetKind::Union {
            fields.push(InputValue::new(
                format!("{}Aggregate", edge.field),
                TypeRef::named(names.aggregate_input()),
            ));
        }
        fields
    }

    /// CreateInput, UpdateInput and the nested Connect/Delete/Disconnect inputs.
    fn register_write_types(&mut self, entity: &Entity) {
        let name = entity.name.as_str();
        let graph = self.graph();

        let (create, update) = if entity.is_interface() {
            let implementers = graph.implementers_of(name);
            let keyed = |suffix: &str| -> Vec<InputValue> {
                implementers
                    .iter()
                    .map(|i| {
                        InputValue::new(i.name.clone(), TypeRef::named(format!("{}{suffix}", i.name)))
                    })
                    .collect()
            };
            (keyed("CreateInput"), keyed("UpdateInput"))
        } else {
            (self.node_create_fields(entity), self.node_update_fields(entity))
        };

        self.registry.register(DerivedType::input(
            format!("{name}CreateInput"),
            DerivedTypeKind::CreateInput,
            non_empty(create),
        ));
        self.registry.register(DerivedType::input(
            format!("{name}UpdateInput"),
            DerivedTypeKind::UpdateInput,
            non_empty(update),
        ));

        for input in [NestedInput::Connect, NestedInput::Delete, NestedInput::Disconnect] {
            let fields = self.nested_input_fields(entity, input);
            if !fields.is_empty() {
                self.registry.register(DerivedType::input(
                    format!("{name}{}", input.suffix()),
                    input.kind(),
                    fields,
                ));
            }
        }
    }

    fn node_create_fields(&self, entity: &Entity) -> Vec<InputValue> {
        let mut fields = Vec::new();
        for field in &entity.fields {
            let Some(edge) = self.edge_of(entity, field) else {
                fields.extend(create_field(field));
                continue;
            };
            let ops = edge.nested_operations;
            if !(ops.create || ops.connect) {
                continue;
            }
            let names = self.edge_names(edge);
            let ty = match edge.target_kind {
                TargetKind::Union => names.keyed("CreateInput"),
                TargetKind::Node | TargetKind::Interface => names.field_input(),
            };
            fields.push(InputValue::new(field.name.clone(), TypeRef::named(ty)));
        }
        fields
    }

    fn node_update_fields(&self, entity: &Entity) -> Vec<InputValue> {
        let mut fields = Vec::new();
        for field in &entity.fields {
            let Some(edge) = self.edge_of(entity, field) else {
                fields.extend(update_field(field));
                continue;
            };
            if edge.nested_operations.is_empty() {
                continue;
            }
            let names = self.edge_names(edge);
            let ty = match edge.target_kind {
                TargetKind::Union => TypeRef::named(names.keyed("UpdateInput")),
                TargetKind::Node | TargetKind::Interface => {
                    by_cardinality(edge, names.update_field_input())
                }
            };
            fields.push(InputValue::new(field.name.clone(), ty));
        }
        fields
    }

    fn push_query_fields(&mut self, name: &str, roots: &RootNames, has_sort: bool) {
        self.query.push(
            OutputField::new(roots.list.clone(), TypeRef::named_nn_list_nn(name))
                .argument(InputValue::new("options", TypeRef::named(format!("{name}Options"))))
                .argument(where_arg(name)),
        );
        self.query.push(
            OutputField::new(
                roots.aggregate.clone(),
                TypeRef::named_nn(format!("{name}AggregateSelection")),
            )
            .argument(where_arg(name)),
        );

        let mut connection = OutputField::new(
            roots.connection.clone(),
            TypeRef::named_nn(roots.connection_type.clone()),
        );
        for argument in pagination_args() {
            connection = connection.argument(argument);
        }
        if has_sort {
            connection = connection.argument(InputValue::new(
                "sort",
                TypeRef::named_nn_list(format!("{name}Sort")),
            ));
        }
        self.query.push(connection.argument(where_arg(name)));
    }
}

#[cfg(test)]
mod tests {
    use crate::augment::{DerivedSchema, augment};
    use crate::config::BuildOptions;
    use crate::model::build_entity_graph;
    use crate::relationships::resolve;

    fn augment_sdl(sdl: &str) -> DerivedSchema {
        let options = BuildOptions::default();
        let graph = build_entity_graph(sdl, &options).unwrap();
        augment(&resolve(graph, &options).unwrap(), &options)
    }

    const MOVIES: &str = r#"
        type Movie {
            id: ID! @id
            title: String!
            released: Int @default(value: 2000)
            slug: String @populatedBy(callback: "slug", operations: [CREATE])
            actors: [Actor!]! @relationship(type: "ACTED_IN", direction: IN)
        }

        type Actor {
            name: String!
            movies: [Movie!]! @relationship(type: "ACTED_IN", direction: OUT)
        }
    "#;

    #[test]
    fn test_node_object_fields() {
        let schema = augment_sdl(MOVIES);
        let movie = schema.get("Movie").unwrap();
        assert_eq!(
            movie.member_names(),
            vec![
                "id",
                "title",
                "released",
                "slug",
                "actors",
                "actorsAggregate",
                "actorsConnection"
            ]
        );
        let actors = movie.output_field("actors").unwrap();
        let args: Vec<_> = actors.arguments.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(args, vec!["options", "where"]);
        assert_eq!(actors.arguments[0].ty.to_string(), "ActorOptions");
        assert_eq!(
            movie.field_type("actorsAggregate").unwrap(),
            "MovieActorActorsAggregationSelection"
        );
        assert_eq!(movie.field_type("actorsConnection").unwrap(), "MovieActorsConnection!");
    }

    #[test]
    fn test_create_input_excludes_generated_fields() {
        let schema = augment_sdl(MOVIES);
        let create = schema.get("MovieCreateInput").unwrap();
        assert_eq!(create.member_names(), vec!["title", "released", "actors"]);
        assert_eq!(create.field_type("actors").unwrap(), "MovieActorsFieldInput");
        assert_eq!(
            create.input_field("released").unwrap().default_value.as_ref().map(ToString::to_string).as_deref(),
            Some("2000")
        );
    }

    #[test]
    fn test_update_input_keeps_create_only_callbacks() {
        let schema = augment_sdl(MOVIES);
        let update = schema.get("MovieUpdateInput").unwrap();
        let names = update.member_names();
        assert!(!names.contains(&"id"));
        assert!(names.contains(&"slug_SET"));
        assert!(names.contains(&"released_INCREMENT"));
        assert_eq!(update.field_type("actors").unwrap(), "[MovieActorsUpdateFieldInput!]");
    }

    #[test]
    fn test_where_relationship_filters() {
        let schema = augment_sdl(MOVIES);
        let movie_where = schema.get("MovieWhere").unwrap();
        for name in [
            "actors_ALL",
            "actors_NONE",
            "actors_SINGLE",
            "actors_SOME",
            "actorsConnection_SOME",
            "actorsAggregate",
            "AND",
            "OR",
            "NOT",
        ] {
            assert!(movie_where.input_field(name).is_some(), "missing {name}");
        }
        assert_eq!(
            movie_where.field_type("actorsConnection_ALL").unwrap(),
            "MovieActorsConnectionWhere"
        );
    }

    #[test]
    fn test_root_fields() {
        let schema = augment_sdl(MOVIES);
        let query = schema.get("Query").unwrap();
        assert_eq!(
            query.member_names(),
            vec![
                "movies",
                "moviesAggregate",
                "moviesConnection",
                "actors",
                "actorsAggregate",
                "actorsConnection"
            ]
        );
        let mutation = schema.get("Mutation").unwrap();
        assert_eq!(mutation.field_type("createMovies").unwrap(), "CreateMoviesMutationResponse!");
        assert_eq!(mutation.field_type("deleteMovies").unwrap(), "DeleteInfo!");
        let update = mutation.output_field("updateMovies").unwrap();
        let args: Vec<_> = update.arguments.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(args, vec!["where", "update", "connect", "disconnect", "delete"]);
    }

    #[test]
    fn test_connection_shape() {
        let schema = augment_sdl(MOVIES);
        let connection = schema.get("MoviesConnection").unwrap();
        assert_eq!(connection.field_type("edges").unwrap(), "[MovieEdge!]!");
        assert_eq!(connection.field_type("pageInfo").unwrap(), "PageInfo!");
        assert_eq!(connection.field_type("totalCount").unwrap(), "Int!");
        let response = schema.get("CreateMoviesMutationResponse").unwrap();
        assert_eq!(response.field_type("movies").unwrap(), "[Movie!]!");
        assert_eq!(response.field_type("info").unwrap(), "CreateInfo!");
    }

    #[test]
    fn test_interface_types() {
        let schema = augment_sdl(
            r#"
            interface Production { title: String! }
            type Movie implements Production { title: String!, runtime: Int }
            type Series implements Production { title: String!, episodes: Int }
            "#,
        );
        assert_eq!(
            schema.get("ProductionImplementation").unwrap().member_names(),
            vec!["Movie", "Series"]
        );
        assert_eq!(
            schema.get("ProductionWhere").unwrap().field_type("typename_IN").unwrap(),
            "[ProductionImplementation!]"
        );
        assert_eq!(
            schema.get("ProductionCreateInput").unwrap().field_type("Movie").unwrap(),
            "MovieCreateInput"
        );
        assert!(schema.contains("ProductionsConnection"));
        let mutation = schema.get("Mutation").unwrap();
        assert!(mutation.output_field("createProductions").is_none());
        let query = schema.get("Query").unwrap();
        assert!(query.output_field("productions").is_some());
    }

    #[test]
    fn test_union_types() {
        let schema = augment_sdl(
            r#"
            union Search = Movie | Genre
            type Movie { title: String }
            type Genre { name: String }
            "#,
        );
        assert_eq!(schema.get("Search").unwrap().member_names(), vec!["Movie", "Genre"]);
        assert_eq!(
            schema.get("SearchWhere").unwrap().field_type("Genre").unwrap(),
            "GenreWhere"
        );
        let searches = schema.get("Query").unwrap().output_field("searches").unwrap();
        assert_eq!(searches.ty.to_string(), "[Search!]!");
        assert!(schema.contains("QueryOptions"));
    }

    #[test]
    fn test_empty_inputs_get_placeholder() {
        let schema = augment_sdl("type Token { id: ID! @id }");
        assert_eq!(
            schema.get("TokenCreateInput").unwrap().member_names(),
            vec!["_emptyInput"]
        );
    }

    #[test]
    fn test_boolean_only_entity_has_no_sort() {
        let schema = augment_sdl("type Flag { enabled: [Boolean!] }");
        assert!(!schema.contains("FlagSort"));
        let options = schema.get("FlagOptions").unwrap();
        assert_eq!(options.member_names(), vec!["limit", "offset"]);
    }
}
