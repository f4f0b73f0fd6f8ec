//! Relationship edges, interface declarations and relationship properties
//! as they surface in the compiled schema.

use graphloom_schema::augment::{DerivedSchema, TypeDefinition};
use graphloom_schema::{BuildOptions, PropertiesBinding, compile};
use pretty_assertions::assert_eq;

fn compile_schema(sdl: &str) -> graphloom_schema::CompiledSchema {
    compile(sdl, &BuildOptions::default()).unwrap_or_else(|e| panic!("{e}"))
}

fn field_type(schema: &DerivedSchema, type_name: &str, field: &str) -> String {
    schema
        .get(type_name)
        .unwrap_or_else(|| panic!("missing type {type_name}"))
        .field_type(field)
        .unwrap_or_else(|| panic!("missing field {type_name}.{field}"))
}

const PER_IMPLEMENTATION: &str = r#"
    interface Production {
        title: String!
        actors: [Actor!]! @declareRelationship
    }
    type Movie implements Production {
        title: String!
        runtime: Int
        actors: [Actor!]! @relationship(type: "ACTED_IN", direction: IN, properties: "ActedIn")
    }
    type Series implements Production {
        title: String!
        episodes: Int
        actors: [Actor!]! @relationship(type: "ACTED_IN", direction: IN, properties: "StarredIn")
    }
    type Actor {
        name: String!
        actedIn: [Production!]! @relationship(type: "ACTED_IN", direction: OUT)
    }
    type ActedIn @relationshipProperties {
        screenTime: Int!
    }
    type StarredIn @relationshipProperties {
        episodeNr: Int!
    }
"#;

#[test]
fn test_per_implementation_properties_union() {
    let compiled = compile_schema(PER_IMPLEMENTATION);
    let schema = &compiled.schema;

    assert!(
        compiled
            .sdl
            .contains("union ProductionActorsRelationshipProperties = ActedIn | StarredIn\n")
    );
    assert_eq!(
        field_type(schema, "ProductionActorsRelationship", "properties"),
        "ProductionActorsRelationshipProperties!"
    );

    let create = schema.get("ProductionActorsEdgeCreateInput").unwrap();
    assert_eq!(create.member_names(), vec!["Movie", "Series"]);
    assert_eq!(create.field_type("Movie").unwrap(), "ActedInCreateInput!");
    assert_eq!(create.field_type("Series").unwrap(), "StarredInCreateInput!");
    assert_eq!(
        field_type(schema, "ProductionActorsEdgeUpdateInput", "Series"),
        "StarredInUpdateInput"
    );
    assert_eq!(
        field_type(schema, "ProductionActorsConnectionWhere", "edge"),
        "ProductionActorsEdgeWhere"
    );
}

#[test]
fn test_implementations_share_interface_connection() {
    let compiled = compile_schema(PER_IMPLEMENTATION);
    let schema = &compiled.schema;

    for owner in ["Production", "Movie", "Series"] {
        assert_eq!(
            field_type(schema, owner, "actorsConnection"),
            "ProductionActorsConnection!"
        );
    }
    assert!(!schema.contains("MovieActorsConnection"));
    assert!(!schema.contains("MovieActorsRelationship"));

    // Writes stay concrete: each implementation uses its own properties type.
    assert_eq!(
        field_type(schema, "MovieActorsCreateFieldInput", "edge"),
        "ActedInCreateInput!"
    );
    assert_eq!(
        field_type(schema, "SeriesActorsCreateFieldInput", "edge"),
        "StarredInCreateInput!"
    );
    assert!(!schema.contains("ProductionActorsFieldInput"));

    let production = schema.get("Production").unwrap();
    assert!(production.output_field("actorsAggregate").is_none());
    assert_eq!(
        field_type(schema, "Movie", "actorsAggregate"),
        "MovieActorActorsAggregationSelection"
    );
}

#[test]
fn test_shared_properties_have_no_union() {
    let compiled = compile_schema(
        r#"
        interface Production {
            title: String!
            actors: [Actor!]! @declareRelationship
        }
        type Movie implements Production {
            title: String!
            actors: [Actor!]! @relationship(type: "ACTED_IN", direction: IN, properties: "ActedIn")
        }
        type Series implements Production {
            title: String!
            actors: [Actor!]! @relationship(type: "ACTED_IN", direction: IN, properties: "ActedIn")
        }
        type Actor { name: String! }
        type ActedIn @relationshipProperties { screenTime: Int! }
        "#,
    );
    let schema = &compiled.schema;

    assert_eq!(
        compiled.graph.edge_for("Production", "actors").unwrap().properties,
        PropertiesBinding::Shared("ActedIn".into())
    );
    assert_eq!(
        field_type(schema, "ProductionActorsRelationship", "properties"),
        "ActedIn!"
    );
    assert!(!schema.contains("ProductionActorsRelationshipProperties"));
    assert!(!schema.contains("ProductionActorsEdgeCreateInput"));
    assert!(!schema.contains("ProductionActorsEdgeWhere"));
    assert_eq!(
        field_type(schema, "ProductionActorsConnectionWhere", "edge"),
        "ActedInWhere"
    );
}

#[test]
fn test_grandparent_declaration_reaches_every_level() {
    let compiled = compile_schema(
        r#"
        interface Production {
            title: String
            actors: [Actor!]! @declareRelationship
        }
        interface Show implements Production {
            title: String
            seasons: Int
        }
        type Drama implements Show & Production {
            title: String
            seasons: Int
            actors: [Actor!]! @relationship(type: "ACTED_IN", direction: IN)
        }
        type Actor { name: String! }
        "#,
    );
    let schema = &compiled.schema;

    let show = schema.get("Show").unwrap();
    assert!(show.output_field("actors").is_some());
    for owner in ["Production", "Show", "Drama"] {
        assert_eq!(
            field_type(schema, owner, "actorsConnection"),
            "ProductionActorsConnection!"
        );
        assert_eq!(field_type(schema, owner, "actors"), "[Actor!]!");
    }
    assert!(matches!(
        &show.definition,
        TypeDefinition::Interface { implements, .. } if implements == &["Production".to_string()]
    ));
    assert!(compiled.sdl.contains("interface Show {"));
    assert!(compiled.sdl.contains("type Drama implements Production & Show {"));
    assert_eq!(
        field_type(schema, "ShowWhere", "actors_SOME"),
        "ActorWhere"
    );
}

#[test]
fn test_to_one_relationship_filters() {
    let compiled = compile_schema(
        r#"
        type Movie {
            title: String
            director: Person @relationship(type: "DIRECTED", direction: IN)
        }
        type Person { name: String }
        "#,
    );
    let schema = &compiled.schema;
    let where_input = schema.get("MovieWhere").unwrap();

    assert_eq!(where_input.field_type("director").unwrap(), "PersonWhere");
    assert_eq!(
        where_input.field_type("directorConnection").unwrap(),
        "MovieDirectorConnectionWhere"
    );
    assert!(where_input.input_field("director_SOME").is_none());

    let movie = schema.get("Movie").unwrap();
    let director = movie.output_field("director").unwrap();
    let arguments: Vec<&str> = director.arguments.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(arguments, vec!["where"]);
    assert_eq!(director.ty.to_string(), "Person");
}
