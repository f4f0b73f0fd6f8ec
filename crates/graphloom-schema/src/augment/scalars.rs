//! Per-scalar-kind derivation tables.
//!
//! Every filter, update, sort and aggregate field derived from a scalar
//! field comes from the operator tables in this module. Deprecated bare
//! aliases are listed once in [`DEPRECATED_ALIASES`] and applied uniformly.

use crate::model::{Field, ScalarCategory, ScalarKind};

use super::types::{
    DerivedType, DerivedTypeKind, EnumValue, InputValue, OutputField, TypeRef, field_type_ref,
    nullable,
};

// ============================================================================
// Deprecated aliases
// ============================================================================

/// What a legacy/canonical field pair means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AliasSemantics {
    Filter(FilterSemantics),
    Update(UpdateSemantics),
    CountEquals,
}

/// A deprecated legacy field and the explicit field replacing it.
///
/// Names are suffixes appended to the owning field name; an empty legacy
/// suffix means the bare field name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DualField {
    pub legacy: &'static str,
    pub canonical: &'static str,
    pub semantics: AliasSemantics,
    pub reason: &'static str,
}

impl DualField {
    /// Emits the deprecated legacy field and its canonical replacement.
    #[must_use]
    pub fn emit(&self, base: &str, ty: &TypeRef) -> [InputValue; 2] {
        [
            InputValue::new(format!("{base}{}", self.legacy), ty.clone()).deprecated(self.reason),
            InputValue::new(format!("{base}{}", self.canonical), ty.clone()),
        ]
    }
}

pub const WHERE_EQUALS: DualField = DualField {
    legacy: "",
    canonical: "_EQ",
    semantics: AliasSemantics::Filter(FilterSemantics::Equals),
    reason: "Please use the explicit _EQ version",
};

pub const UPDATE_SET: DualField = DualField {
    legacy: "",
    canonical: "_SET",
    semantics: AliasSemantics::Update(UpdateSemantics::Set),
    reason: "Please use the explicit _SET field",
};

pub const COUNT_EQUALS: DualField = DualField {
    legacy: "",
    canonical: "_EQ",
    semantics: AliasSemantics::CountEquals,
    reason: "Please use the explicit _EQ version",
};

pub const DEPRECATED_ALIASES: &[DualField] = &[WHERE_EQUALS, UPDATE_SET, COUNT_EQUALS];

// ============================================================================
// Filters
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FilterSemantics {
    Equals,
    In,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Contains,
    StartsWith,
    EndsWith,
    Includes,
}

impl FilterSemantics {
    /// Whether a field of `category` (list or not) gets this operator.
    #[must_use]
    pub fn applies_to(self, category: ScalarCategory, list: bool) -> bool {
        match self {
            Self::Equals => true,
            Self::In => !list && category != ScalarCategory::Boolean,
            Self::LessThan | Self::LessThanOrEqual | Self::GreaterThan | Self::GreaterThanOrEqual => {
                !list && category.is_ordered()
            }
            Self::Contains | Self::StartsWith | Self::EndsWith => !list && category.is_textual(),
            Self::Includes => list,
        }
    }
}

/// Explicit filter suffixes. The bare field is the deprecated `_EQ` alias.
pub const FILTER_OPERATORS: &[(&str, FilterSemantics)] = &[
    ("_EQ", FilterSemantics::Equals),
    ("_IN", FilterSemantics::In),
    ("_LT", FilterSemantics::LessThan),
    ("_LTE", FilterSemantics::LessThanOrEqual),
    ("_GT", FilterSemantics::GreaterThan),
    ("_GTE", FilterSemantics::GreaterThanOrEqual),
    ("_CONTAINS", FilterSemantics::Contains),
    ("_STARTS_WITH", FilterSemantics::StartsWith),
    ("_ENDS_WITH", FilterSemantics::EndsWith),
    ("_INCLUDES", FilterSemantics::Includes),
];

/// Splits a filter key such as `title_STARTS_WITH` into the field name and
/// its operator. A key without a known suffix is an equality filter.
#[must_use]
pub fn parse_filter_key(key: &str) -> (&str, FilterSemantics) {
    FILTER_OPERATORS
        .iter()
        .filter_map(|(suffix, semantics)| {
            key.strip_suffix(suffix)
                .filter(|field| !field.is_empty())
                .map(|field| (field, *semantics))
        })
        .min_by_key(|(field, _)| field.len())
        .unwrap_or((key, FilterSemantics::Equals))
}

/// `Where` contributions for a scalar field.
#[must_use]
pub fn where_fields(field: &Field) -> Vec<InputValue> {
    let Some(kind) = &field.scalar else {
        return Vec::new();
    };
    let category = kind.category();
    let list = field.ty.list;
    let value_ty = if list {
        TypeRef::named_nn_list(kind.type_name())
    } else {
        TypeRef::named(kind.type_name())
    };

    let mut fields: Vec<InputValue> = WHERE_EQUALS.emit(&field.name, &value_ty).into();
    for (suffix, semantics) in FILTER_OPERATORS {
        if *semantics == FilterSemantics::Equals || !semantics.applies_to(category, list) {
            continue;
        }
        let ty = match semantics {
            FilterSemantics::In => TypeRef::named_nn_list(kind.type_name()),
            _ => TypeRef::named(kind.type_name()),
        };
        fields.push(InputValue::new(format!("{}{suffix}", field.name), ty));
    }
    fields
}

/// `AND`/`OR`/`NOT` combinators for a where-like input.
#[must_use]
pub fn logical_fields(type_name: &str) -> Vec<InputValue> {
    vec![
        InputValue::new("AND", TypeRef::named_nn_list(type_name)),
        InputValue::new("NOT", TypeRef::named(type_name)),
        InputValue::new("OR", TypeRef::named_nn_list(type_name)),
    ]
}

// ============================================================================
// Updates
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateSemantics {
    Set,
    Increment,
    Decrement,
    Add,
    Subtract,
    Multiply,
    Divide,
    Push,
    Pop,
}

impl UpdateSemantics {
    #[must_use]
    pub fn applies_to(self, category: ScalarCategory, list: bool) -> bool {
        match self {
            Self::Set => true,
            Self::Increment | Self::Decrement => {
                !list && matches!(category, ScalarCategory::Integer | ScalarCategory::BigInteger)
            }
            Self::Add | Self::Subtract | Self::Multiply | Self::Divide => {
                !list && category == ScalarCategory::Float
            }
            Self::Push | Self::Pop => list,
        }
    }
}

pub const UPDATE_OPERATORS: &[(&str, UpdateSemantics)] = &[
    ("_SET", UpdateSemantics::Set),
    ("_INCREMENT", UpdateSemantics::Increment),
    ("_DECREMENT", UpdateSemantics::Decrement),
    ("_ADD", UpdateSemantics::Add),
    ("_SUBTRACT", UpdateSemantics::Subtract),
    ("_MULTIPLY", UpdateSemantics::Multiply),
    ("_DIVIDE", UpdateSemantics::Divide),
    ("_PUSH", UpdateSemantics::Push),
    ("_POP", UpdateSemantics::Pop),
];

/// `UpdateInput` contributions for a scalar field.
#[must_use]
pub fn update_fields(field: &Field) -> Vec<InputValue> {
    let Some(kind) = &field.scalar else {
        return Vec::new();
    };
    let category = kind.category();
    let list = field.ty.list;
    let value_ty = nullable(field_type_ref(&field.ty));

    let mut fields: Vec<InputValue> = UPDATE_SET.emit(&field.name, &value_ty).into();
    for (suffix, semantics) in UPDATE_OPERATORS {
        if *semantics == UpdateSemantics::Set || !semantics.applies_to(category, list) {
            continue;
        }
        let ty = match semantics {
            UpdateSemantics::Push => TypeRef::named_nn_list(kind.type_name()),
            UpdateSemantics::Pop => TypeRef::named("Int"),
            _ => TypeRef::named(kind.type_name()),
        };
        fields.push(InputValue::new(format!("{}{suffix}", field.name), ty));
    }
    fields
}

// ============================================================================
// Sorting
// ============================================================================

/// Non-list scalar fields sort; lists do not.
#[must_use]
pub fn sort_field(field: &Field) -> Option<InputValue> {
    if field.scalar.is_none() || field.ty.list {
        return None;
    }
    Some(InputValue::new(field.name.clone(), TypeRef::named(SORT_DIRECTION)))
}

// ============================================================================
// Aggregation
// ============================================================================

/// Result type of an aggregate: the field's own type or a fixed one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AggregateType {
    Same,
    Float,
    Int,
}

impl AggregateType {
    fn resolve(self, kind: &ScalarKind) -> TypeRef {
        match self {
            Self::Same => TypeRef::named(kind.type_name()),
            Self::Float => TypeRef::named("Float"),
            Self::Int => TypeRef::named("Int"),
        }
    }
}

struct AggregateShape {
    selection: &'static [(&'static str, AggregateType)],
    comparators: &'static [(&'static str, AggregateType)],
    deprecated: bool,
}

const TEXT_SELECTION: &[(&str, AggregateType)] = &[
    ("longest", AggregateType::Same),
    ("shortest", AggregateType::Same),
];
const TEXT_COMPARATORS: &[(&str, AggregateType)] = &[
    ("AVERAGE_LENGTH", AggregateType::Float),
    ("LONGEST_LENGTH", AggregateType::Int),
    ("SHORTEST_LENGTH", AggregateType::Int),
];

/// `_EQUAL`/`_GT`/... appended to each aggregation comparator.
pub const AGGREGATION_COMPARISONS: &[&str] = &["EQUAL", "GT", "GTE", "LT", "LTE"];

/// Suffixes of relationship count filters after the deprecated bare `count`.
pub const COUNT_COMPARISONS: &[&str] = &["_GT", "_GTE", "_LT", "_LTE"];

pub const ID_AGGREGATION_DEPRECATION: &str = "Aggregation of ID fields is deprecated";

fn aggregate_shape(category: ScalarCategory) -> Option<AggregateShape> {
    let shape = match category {
        ScalarCategory::Identifier => AggregateShape {
            selection: TEXT_SELECTION,
            comparators: TEXT_COMPARATORS,
            deprecated: true,
        },
        ScalarCategory::StringLike => AggregateShape {
            selection: TEXT_SELECTION,
            comparators: TEXT_COMPARATORS,
            deprecated: false,
        },
        ScalarCategory::Integer => AggregateShape {
            selection: &[
                ("average", AggregateType::Float),
                ("max", AggregateType::Same),
                ("min", AggregateType::Same),
                ("sum", AggregateType::Same),
            ],
            comparators: &[
                ("AVERAGE", AggregateType::Float),
                ("MAX", AggregateType::Same),
                ("MIN", AggregateType::Same),
                ("SUM", AggregateType::Same),
            ],
            deprecated: false,
        },
        ScalarCategory::Float => AggregateShape {
            selection: &[
                ("average", AggregateType::Float),
                ("max", AggregateType::Float),
                ("min", AggregateType::Float),
                ("sum", AggregateType::Float),
            ],
            comparators: &[
                ("AVERAGE", AggregateType::Float),
                ("MAX", AggregateType::Float),
                ("MIN", AggregateType::Float),
                ("SUM", AggregateType::Float),
            ],
            deprecated: false,
        },
        ScalarCategory::BigInteger => AggregateShape {
            selection: &[
                ("average", AggregateType::Same),
                ("max", AggregateType::Same),
                ("min", AggregateType::Same),
                ("sum", AggregateType::Same),
            ],
            comparators: &[
                ("AVERAGE", AggregateType::Same),
                ("MAX", AggregateType::Same),
                ("MIN", AggregateType::Same),
                ("SUM", AggregateType::Same),
            ],
            deprecated: false,
        },
        ScalarCategory::Temporal => AggregateShape {
            selection: &[("max", AggregateType::Same), ("min", AggregateType::Same)],
            comparators: &[("MAX", AggregateType::Same), ("MIN", AggregateType::Same)],
            deprecated: false,
        },
        ScalarCategory::Boolean | ScalarCategory::Enum | ScalarCategory::Custom => return None,
    };
    Some(shape)
}

/// True if `field` contributes to aggregate selections.
#[must_use]
pub fn is_aggregatable(field: &Field) -> bool {
    !field.ty.list
        && field
            .category()
            .is_some_and(|c| aggregate_shape(c).is_some())
}

/// Name of the shared aggregate selection type for a kind, e.g.
/// `StringAggregateSelection`.
#[must_use]
pub fn aggregate_selection_name(kind: &ScalarKind) -> String {
    format!("{}AggregateSelection", kind.type_name())
}

/// The shared `<Kind>AggregateSelection` object type.
#[must_use]
pub fn aggregate_selection_type(kind: &ScalarKind) -> Option<DerivedType> {
    let shape = aggregate_shape(kind.category())?;
    let fields = shape
        .selection
        .iter()
        .map(|(name, ty)| OutputField::new(*name, ty.resolve(kind)))
        .collect();
    Some(DerivedType::object(
        aggregate_selection_name(kind),
        DerivedTypeKind::ScalarAggregateSelection,
        fields,
    ))
}

/// The field an entity's aggregate selection exposes for `field`.
#[must_use]
pub fn aggregate_selection_field(field: &Field) -> Option<OutputField> {
    if !is_aggregatable(field) {
        return None;
    }
    let kind = field.scalar.as_ref()?;
    let shape = aggregate_shape(kind.category())?;
    let out = OutputField::new(
        field.name.clone(),
        TypeRef::named_nn(aggregate_selection_name(kind)),
    );
    Some(if shape.deprecated {
        out.deprecated(ID_AGGREGATION_DEPRECATION)
    } else {
        out
    })
}

/// Aggregation filter comparators for `field`, e.g. `title_AVERAGE_LENGTH_GT`.
#[must_use]
pub fn aggregation_where_fields(field: &Field) -> Vec<InputValue> {
    if !is_aggregatable(field) {
        return Vec::new();
    }
    let Some(kind) = field.scalar.as_ref() else {
        return Vec::new();
    };
    let Some(shape) = aggregate_shape(kind.category()) else {
        return Vec::new();
    };

    let mut fields = Vec::new();
    for (aggregate, ty) in shape.comparators {
        for comparison in AGGREGATION_COMPARISONS {
            let value = InputValue::new(
                format!("{}_{aggregate}_{comparison}", field.name),
                ty.resolve(kind),
            );
            fields.push(if shape.deprecated {
                value.deprecated(ID_AGGREGATION_DEPRECATION)
            } else {
                value
            });
        }
    }
    fields
}

/// Relationship count filters: deprecated `count`, `count_EQ` and
/// ordering comparisons.
#[must_use]
pub fn count_filter_fields() -> Vec<InputValue> {
    let int = TypeRef::named("Int");
    let mut fields: Vec<InputValue> = COUNT_EQUALS.emit("count", &int).into();
    for suffix in COUNT_COMPARISONS {
        fields.push(InputValue::new(format!("count{suffix}"), int.clone()));
    }
    fields
}

// ============================================================================
// Common types
// ============================================================================

pub const SORT_DIRECTION: &str = "SortDirection";
pub const PAGE_INFO: &str = "PageInfo";
pub const CREATE_INFO: &str = "CreateInfo";
pub const UPDATE_INFO: &str = "UpdateInfo";
pub const DELETE_INFO: &str = "DeleteInfo";
pub const QUERY_OPTIONS: &str = "QueryOptions";

/// Scalars every GraphQL server provides without a declaration.
pub const GRAPHQL_BUILTIN_SCALARS: &[&str] = &["ID", "String", "Int", "Float", "Boolean"];

/// Types shared by every generated schema.
#[must_use]
pub fn common_types() -> Vec<DerivedType> {
    let int_nn = || TypeRef::named_nn("Int");
    vec![
        DerivedType::enumeration(
            SORT_DIRECTION,
            DerivedTypeKind::Common,
            [EnumValue::new("ASC"), EnumValue::new("DESC")],
        ),
        DerivedType::object(
            PAGE_INFO,
            DerivedTypeKind::Common,
            vec![
                OutputField::new("endCursor", TypeRef::named("String")),
                OutputField::new("hasNextPage", TypeRef::named_nn("Boolean")),
                OutputField::new("hasPreviousPage", TypeRef::named_nn("Boolean")),
                OutputField::new("startCursor", TypeRef::named("String")),
            ],
        ),
        DerivedType::object(
            CREATE_INFO,
            DerivedTypeKind::Common,
            vec![
                OutputField::new("nodesCreated", int_nn()),
                OutputField::new("relationshipsCreated", int_nn()),
            ],
        ),
        DerivedType::object(
            UPDATE_INFO,
            DerivedTypeKind::Common,
            vec![
                OutputField::new("nodesCreated", int_nn()),
                OutputField::new("nodesDeleted", int_nn()),
                OutputField::new("relationshipsCreated", int_nn()),
                OutputField::new("relationshipsDeleted", int_nn()),
            ],
        ),
        DerivedType::object(
            DELETE_INFO,
            DerivedTypeKind::Common,
            vec![
                OutputField::new("nodesDeleted", int_nn()),
                OutputField::new("relationshipsDeleted", int_nn()),
            ],
        ),
    ]
}

/// Pagination options for union-typed relationship fields.
#[must_use]
pub fn query_options_type() -> DerivedType {
    DerivedType::input(
        QUERY_OPTIONS,
        DerivedTypeKind::Common,
        vec![
            InputValue::new("limit", TypeRef::named("Int")),
            InputValue::new("offset", TypeRef::named("Int")),
        ],
    )
}

/// Placeholder field for inputs that would otherwise have no fields.
#[must_use]
pub fn empty_input_field() -> InputValue {
    InputValue::new("_emptyInput", TypeRef::named("Boolean"))
        .description(Some("Appears because this input type would be empty otherwise because this type is composed of just generated and/or relationship properties.".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Location;
    use crate::model::{FieldRole, FieldType};

    fn field(name: &str, type_name: &str, list: bool) -> Field {
        let ty = if list {
            FieldType::list_of(type_name, false, true)
        } else {
            FieldType::named(type_name, false)
        };
        Field {
            name: name.into(),
            scalar: ScalarKind::builtin(type_name),
            ty,
            role: FieldRole::Scalar,
            default_value: None,
            description: None,
            location: Location::default(),
        }
    }

    fn names(values: &[InputValue]) -> Vec<&str> {
        values.iter().map(|v| v.name.as_str()).collect()
    }

    #[test]
    fn test_string_where_fields() {
        let fields = where_fields(&field("title", "String", false));
        assert_eq!(
            names(&fields),
            vec![
                "title",
                "title_EQ",
                "title_IN",
                "title_LT",
                "title_LTE",
                "title_GT",
                "title_GTE",
                "title_CONTAINS",
                "title_STARTS_WITH",
                "title_ENDS_WITH",
            ]
        );
        assert_eq!(
            fields[0].deprecation.as_deref(),
            Some("Please use the explicit _EQ version")
        );
        assert_eq!(fields[2].ty.to_string(), "[String!]");
    }

    #[test]
    fn test_boolean_where_fields() {
        let fields = where_fields(&field("active", "Boolean", false));
        assert_eq!(names(&fields), vec!["active", "active_EQ"]);
    }

    #[test]
    fn test_list_where_fields() {
        let fields = where_fields(&field("tags", "String", true));
        assert_eq!(names(&fields), vec!["tags", "tags_EQ", "tags_INCLUDES"]);
        assert_eq!(fields[1].ty.to_string(), "[String!]");
        assert_eq!(fields[2].ty.to_string(), "String");
    }

    #[test]
    fn test_update_fields_by_kind() {
        assert_eq!(
            names(&update_fields(&field("count", "Int", false))),
            vec!["count", "count_SET", "count_INCREMENT", "count_DECREMENT"]
        );
        assert_eq!(
            names(&update_fields(&field("rating", "Float", false))),
            vec![
                "rating",
                "rating_SET",
                "rating_ADD",
                "rating_SUBTRACT",
                "rating_MULTIPLY",
                "rating_DIVIDE"
            ]
        );
        let tags = update_fields(&field("tags", "String", true));
        assert_eq!(names(&tags), vec!["tags", "tags_SET", "tags_PUSH", "tags_POP"]);
        assert_eq!(tags[3].ty.to_string(), "Int");
        assert_eq!(
            tags[0].deprecation.as_deref(),
            Some("Please use the explicit _SET field")
        );
    }

    #[test]
    fn test_aggregate_selection_types() {
        let int = aggregate_selection_type(&ScalarKind::Int).unwrap();
        assert_eq!(int.name, "IntAggregateSelection");
        assert_eq!(int.field_type("average").unwrap(), "Float");
        assert_eq!(int.field_type("sum").unwrap(), "Int");

        let date = aggregate_selection_type(&ScalarKind::DateTime).unwrap();
        assert_eq!(date.member_names(), vec!["max", "min"]);

        assert!(aggregate_selection_type(&ScalarKind::Boolean).is_none());
    }

    #[test]
    fn test_id_aggregation_is_deprecated() {
        let out = aggregate_selection_field(&field("id", "ID", false)).unwrap();
        assert_eq!(out.ty.to_string(), "IDAggregateSelection!");
        assert!(out.deprecation.is_some());
        assert!(aggregate_selection_field(&field("tags", "String", true)).is_none());
    }

    #[test]
    fn test_aggregation_where_fields() {
        let fields = aggregation_where_fields(&field("title", "String", false));
        assert_eq!(fields.len(), 15);
        assert_eq!(fields[0].name, "title_AVERAGE_LENGTH_EQUAL");
        assert_eq!(fields[0].ty.to_string(), "Float");
        assert_eq!(fields[5].name, "title_LONGEST_LENGTH_EQUAL");
        assert_eq!(fields[5].ty.to_string(), "Int");
    }

    #[test]
    fn test_count_filters() {
        assert_eq!(
            names(&count_filter_fields()),
            vec!["count", "count_EQ", "count_GT", "count_GTE", "count_LT", "count_LTE"]
        );
    }

    #[test]
    fn test_parse_filter_key() {
        assert_eq!(parse_filter_key("title"), ("title", FilterSemantics::Equals));
        assert_eq!(parse_filter_key("title_EQ"), ("title", FilterSemantics::Equals));
        assert_eq!(parse_filter_key("age_LTE"), ("age", FilterSemantics::LessThanOrEqual));
        assert_eq!(parse_filter_key("age_LT"), ("age", FilterSemantics::LessThan));
        assert_eq!(
            parse_filter_key("name_STARTS_WITH"),
            ("name", FilterSemantics::StartsWith)
        );
        assert_eq!(parse_filter_key("_IN"), ("_IN", FilterSemantics::Equals));
    }

    #[test]
    fn test_alias_table_is_uniform() {
        for alias in DEPRECATED_ALIASES {
            let [legacy, canonical] = alias.emit("f", &TypeRef::named("Int"));
            assert!(legacy.deprecation.is_some());
            assert!(canonical.deprecation.is_none());
            assert_eq!(canonical.name, format!("f{}", alias.canonical));
        }
    }
}
