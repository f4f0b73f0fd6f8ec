//! End-to-end augmentation tests: SDL in, derived schema and SDL out.

use async_graphql_parser::parse_schema;
use graphloom_schema::augment::{DerivedSchema, DerivedTypeKind};
use graphloom_schema::{BuildOptions, CompiledSchema, compile, sdl};
use pretty_assertions::assert_eq;

fn compile_default(sdl: &str) -> CompiledSchema {
    compile(sdl, &BuildOptions::default()).expect("schema should compile")
}

fn field_types(schema: &DerivedSchema, type_name: &str) -> Vec<(String, String)> {
    let ty = schema
        .get(type_name)
        .unwrap_or_else(|| panic!("missing type {type_name}"));
    ty.member_names()
        .into_iter()
        .map(|name| (name.to_string(), ty.field_type(name).unwrap_or_default()))
        .collect()
}

fn pairs(expected: &[(&str, &str)]) -> Vec<(String, String)> {
    expected
        .iter()
        .map(|(n, t)| (n.to_string(), t.to_string()))
        .collect()
}

const BOOKS: &str = r#"
    type Book {
        id: ID
        isbn: String!
        title: String
        imdbRating: Float
        someInt: Int
    }
"#;

#[test]
fn test_aggregate_selection_per_scalar_field() {
    let compiled = compile_default(BOOKS);
    assert_eq!(
        field_types(&compiled.schema, "BookAggregateSelection"),
        pairs(&[
            ("count", "Int!"),
            ("id", "IDAggregateSelection!"),
            ("isbn", "StringAggregateSelection!"),
            ("title", "StringAggregateSelection!"),
            ("imdbRating", "FloatAggregateSelection!"),
            ("someInt", "IntAggregateSelection!"),
        ])
    );
    assert_eq!(
        field_types(&compiled.schema, "FloatAggregateSelection"),
        pairs(&[
            ("average", "Float"),
            ("max", "Float"),
            ("min", "Float"),
            ("sum", "Float"),
        ])
    );
    assert_eq!(
        field_types(&compiled.schema, "IntAggregateSelection"),
        pairs(&[
            ("average", "Float"),
            ("max", "Int"),
            ("min", "Int"),
            ("sum", "Int"),
        ])
    );
    assert!(compiled.sdl.contains(
        "  id: IDAggregateSelection! @deprecated(reason: \"Aggregation of ID fields is deprecated\")"
    ));
}

#[test]
fn test_scalar_kind_completeness() {
    let compiled = compile_default(
        r#"
        type Sample {
            id: ID
            name: String
            count: Int
            ratio: Float
            big: BigInt
            at: DateTime
            flag: Boolean
            tags: [String!]
        }
        "#,
    );
    let schema = &compiled.schema;
    let where_fields = schema.get("SampleWhere").unwrap().member_names();
    let update_fields = schema.get("SampleUpdateInput").unwrap().member_names();

    for name in ["name_CONTAINS", "name_STARTS_WITH", "id_ENDS_WITH", "count_LT", "at_GTE"] {
        assert!(where_fields.contains(&name), "missing {name}");
    }
    for name in ["flag_LT", "flag_IN", "at_CONTAINS", "count_CONTAINS", "tags_IN"] {
        assert!(!where_fields.contains(&name), "unexpected {name}");
    }
    assert!(where_fields.contains(&"tags_INCLUDES"));

    for name in [
        "count_INCREMENT",
        "big_DECREMENT",
        "ratio_MULTIPLY",
        "tags_PUSH",
        "tags_POP",
    ] {
        assert!(update_fields.contains(&name), "missing {name}");
    }
    for name in ["ratio_INCREMENT", "count_ADD", "name_INCREMENT", "flag_ADD"] {
        assert!(!update_fields.contains(&name), "unexpected {name}");
    }

    assert_eq!(
        field_types(schema, "BigIntAggregateSelection"),
        pairs(&[
            ("average", "BigInt"),
            ("max", "BigInt"),
            ("min", "BigInt"),
            ("sum", "BigInt"),
        ])
    );
    assert_eq!(
        field_types(schema, "DateTimeAggregateSelection"),
        pairs(&[("max", "DateTime"), ("min", "DateTime")])
    );
    let aggregate = schema.get("SampleAggregateSelection").unwrap().member_names();
    assert!(!aggregate.contains(&"flag"));
    assert!(!aggregate.contains(&"tags"));

    let sort = schema.get("SampleSort").unwrap().member_names();
    assert!(sort.contains(&"flag"));
    assert!(!sort.contains(&"tags"));
}

#[test]
fn test_deprecated_aliases_in_sdl() {
    let compiled = compile_default(BOOKS);
    assert!(compiled.sdl.contains(
        "  title: String @deprecated(reason: \"Please use the explicit _EQ version\")\n  title_CONTAINS: String"
    ));
    assert!(
        compiled
            .sdl
            .contains("  title: String @deprecated(reason: \"Please use the explicit _SET field\")")
    );
    assert!(compiled.sdl.contains("  title_SET: String\n"));
}

#[test]
fn test_build_is_deterministic() {
    let sdl = r#"
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
            actors: [Actor!]! @relationship(type: "ACTED_IN", direction: IN, properties: "StarredIn")
        }
        type Actor {
            name: String!
            productions: [Production!]! @relationship(type: "ACTED_IN", direction: OUT)
        }
        type ActedIn @relationshipProperties { role: String! }
        type StarredIn @relationshipProperties { episodes: Int! }
    "#;
    let first = compile_default(sdl);
    let second = compile_default(sdl);
    assert_eq!(first.sdl, second.sdl);
    assert_eq!(first.schema, second.schema);

    // Generation order differs from print order, but sorting is canonical.
    let unsorted = compile(sdl, &BuildOptions::default().with_sort_sdl(false)).unwrap();
    assert_eq!(unsorted.schema, first.schema);
    assert_ne!(unsorted.sdl, first.sdl);
}

#[test]
fn test_generated_sdl_parses() {
    let compiled = compile(
        r#"
        scalar Point
        enum Genre { ACTION, DRAMA }
        union Search = Movie | Person

        interface Production {
            title: String!
            actors: [Person!]! @declareRelationship
        }
        type Movie implements Production {
            id: ID! @id
            title: String!
            genre: Genre
            location: Point
            released: DateTime
            actors: [Person!]! @relationship(type: "ACTED_IN", direction: IN, properties: "ActedIn")
        }
        type Person {
            name: String!
            favourite: Search @relationship(type: "LIKES", direction: OUT)
        }
        type ActedIn @relationshipProperties { roles: [String!] }
        "#,
        &BuildOptions::default().with_subscriptions(true),
    )
    .unwrap();

    let document = parse_schema(&compiled.sdl);
    assert!(document.is_ok(), "{:?}\n{}", document.err(), compiled.sdl);
    assert!(compiled.sdl.ends_with("}\n"));
    assert!(compiled.sdl.contains("scalar DateTime\n"));
    assert!(compiled.sdl.contains("union Search = Movie | Person\n"));
    assert!(compiled.sdl.contains("type Movie implements Production {"));
}

#[test]
fn test_full_schema_passes_type_system_checks() {
    let compiled = compile(
        r#"
        interface Production {
            title: String!
            actors: [Actor!]! @declareRelationship
        }
        type Movie implements Production {
            title: String!
            runtime: Int
            actors: [Actor!]! @relationship(type: "ACTED_IN", direction: IN, properties: "ActedIn")
            director: Director @relationship(type: "DIRECTED", direction: IN)
        }
        type Series implements Production {
            title: String!
            actors: [Actor!]! @relationship(type: "ACTED_IN", direction: IN, properties: "StarredIn")
        }
        type Actor {
            name: String!
            productions: [Production!]! @relationship(type: "ACTED_IN", direction: OUT)
        }
        type Director {
            name: String!
            movies: [Movie!]! @relationship(type: "DIRECTED", direction: OUT, nestedOperations: [CONNECT])
        }
        type ActedIn @relationshipProperties { role: String!, screenTime: Int }
        type StarredIn @relationshipProperties { episodes: Int! }
        "#,
        &BuildOptions::default().with_subscriptions(true),
    )
    .unwrap();

    let schema = &compiled.schema;
    assert!(sdl::build_schema(schema, false).is_ok());
    assert!(compiled.sdl.contains("  mutation: Mutation\n  subscription: Subscription\n"));
    assert_eq!(schema.of_kind(DerivedTypeKind::Root).count(), 3);
}
