//! Directive extraction.
//!
//! Reads the recognised directives off type and field declarations into
//! typed structs. Argument errors are collected as `(directive, message)`
//! pairs so the builder can attach the owner and location.

use async_graphql_parser::Positioned;
use async_graphql_parser::types::ConstDirective;
use async_graphql_value::ConstValue;

use super::{CallbackOperation, Direction, NestedOperations};

/// Directive name constants.
pub mod names {
    pub const NODE: &str = "node";
    pub const RELATIONSHIP: &str = "relationship";
    pub const RELATIONSHIP_PROPERTIES: &str = "relationshipProperties";
    pub const DECLARE_RELATIONSHIP: &str = "declareRelationship";
    pub const UNIQUE: &str = "unique";
    pub const ID: &str = "id";
    pub const POPULATED_BY: &str = "populatedBy";
    pub const DEFAULT: &str = "default";
    pub const PLURAL: &str = "plural";
    pub const JWT: &str = "jwt";
    pub const JWT_CLAIM: &str = "jwtClaim";
    pub const AUTHORIZATION: &str = "authorization";
}

/// A directive argument problem: `(directive name, message)`.
pub type DirectiveProblem = (&'static str, String);

/// Arguments of `@relationship`. Missing or invalid parts are `None` and
/// reported as problems.
#[derive(Debug, Clone, Default)]
pub struct RelationshipArgs {
    pub native_type: Option<String>,
    pub direction: Option<Direction>,
    pub properties: Option<String>,
    pub nested_operations: NestedOperations,
}

#[derive(Debug, Clone)]
pub struct PopulatedByArgs {
    pub callback: String,
    pub operations: Vec<CallbackOperation>,
}

/// Directives found on a field declaration.
#[derive(Debug, Clone, Default)]
pub struct FieldDirectives {
    pub relationship: Option<RelationshipArgs>,
    pub declare_relationship: Option<NestedOperations>,
    /// `Some(constraint name)` when `@unique` is present.
    pub unique: Option<Option<String>>,
    pub id: bool,
    pub populated_by: Option<PopulatedByArgs>,
    pub default: Option<ConstValue>,
    pub jwt_claim: Option<String>,
}

/// Directives found on a type declaration.
#[derive(Debug, Clone, Default)]
pub struct TypeDirectives {
    /// `Some(labels)` when `@node` is present; labels may be empty.
    pub node: Option<Vec<String>>,
    pub relationship_properties: bool,
    pub jwt: bool,
    pub plural: Option<String>,
    pub authorization: Option<AuthorizationArgs>,
}

#[derive(Debug, Clone, Default)]
pub struct AuthorizationArgs {
    pub validate: Option<serde_json::Value>,
    pub filter: Option<serde_json::Value>,
}

/// Extracts field-level directives.
pub fn extract_field_directives(
    directives: &[Positioned<ConstDirective>],
    problems: &mut Vec<DirectiveProblem>,
) -> FieldDirectives {
    let mut result = FieldDirectives::default();

    for directive in directives {
        let directive = &directive.node;
        match directive.name.node.as_str() {
            names::RELATIONSHIP => {
                result.relationship = Some(relationship_args(directive, problems));
            }
            names::DECLARE_RELATIONSHIP => {
                let ops = nested_operations(directive, names::DECLARE_RELATIONSHIP, problems);
                result.declare_relationship = Some(ops);
            }
            names::UNIQUE => {
                let name = string_arg(directive, "constraintName")
                    .unwrap_or_else(|e| {
                        problems.push((names::UNIQUE, e));
                        None
                    });
                result.unique = Some(name);
            }
            names::ID => result.id = true,
            names::POPULATED_BY => {
                if let Some(args) = populated_by_args(directive, problems) {
                    result.populated_by = Some(args);
                }
            }
            names::DEFAULT => match directive.get_argument("value") {
                Some(value) => result.default = Some(value.node.clone()),
                None => problems.push((names::DEFAULT, "missing required argument `value`".into())),
            },
            names::JWT_CLAIM => match string_arg(directive, "path") {
                Ok(Some(path)) => result.jwt_claim = Some(path),
                Ok(None) => problems.push((names::JWT_CLAIM, "missing required argument `path`".into())),
                Err(e) => problems.push((names::JWT_CLAIM, e)),
            },
            _ => {}
        }
    }

    result
}

/// Extracts type-level directives.
pub fn extract_type_directives(
    directives: &[Positioned<ConstDirective>],
    problems: &mut Vec<DirectiveProblem>,
) -> TypeDirectives {
    let mut result = TypeDirectives::default();

    for directive in directives {
        let directive = &directive.node;
        match directive.name.node.as_str() {
            names::NODE => {
                let labels = string_list_arg(directive, "labels").unwrap_or_else(|e| {
                    problems.push((names::NODE, e));
                    None
                });
                result.node = Some(labels.unwrap_or_default());
            }
            names::RELATIONSHIP_PROPERTIES => result.relationship_properties = true,
            names::JWT => result.jwt = true,
            names::PLURAL => match string_arg(directive, "value") {
                Ok(Some(value)) if !value.is_empty() => result.plural = Some(value),
                Ok(_) => problems.push((names::PLURAL, "`value` must be a non-empty string".into())),
                Err(e) => problems.push((names::PLURAL, e)),
            },
            names::AUTHORIZATION => {
                let mut args = AuthorizationArgs::default();
                for key in ["validate", "filter"] {
                    let Some(value) = directive.get_argument(key) else {
                        continue;
                    };
                    match value.node.clone().into_json() {
                        Ok(json) if key == "validate" => args.validate = Some(json),
                        Ok(json) => args.filter = Some(json),
                        Err(e) => problems.push((names::AUTHORIZATION, format!("`{key}`: {e}"))),
                    }
                }
                result.authorization = Some(args);
            }
            _ => {}
        }
    }

    result
}

fn relationship_args(
    directive: &ConstDirective,
    problems: &mut Vec<DirectiveProblem>,
) -> RelationshipArgs {
    let mut args = RelationshipArgs {
        nested_operations: nested_operations(directive, names::RELATIONSHIP, problems),
        ..RelationshipArgs::default()
    };

    match string_arg(directive, "type") {
        Ok(Some(value)) => args.native_type = Some(value),
        Ok(None) => problems.push((names::RELATIONSHIP, "missing required argument `type`".into())),
        Err(e) => problems.push((names::RELATIONSHIP, e)),
    }

    match enum_arg(directive, "direction") {
        Ok(Some(value)) => match Direction::parse(&value) {
            Some(direction) => args.direction = Some(direction),
            None => problems.push((
                names::RELATIONSHIP,
                format!("unknown direction `{value}`, expected IN, OUT or UNDIRECTED"),
            )),
        },
        Ok(None) => problems.push((
            names::RELATIONSHIP,
            "missing required argument `direction`".into(),
        )),
        Err(e) => problems.push((names::RELATIONSHIP, e)),
    }

    match string_arg(directive, "properties") {
        Ok(value) => args.properties = value,
        Err(e) => problems.push((names::RELATIONSHIP, e)),
    }

    args
}

fn nested_operations(
    directive: &ConstDirective,
    name: &'static str,
    problems: &mut Vec<DirectiveProblem>,
) -> NestedOperations {
    let values = match enum_list_arg(directive, "nestedOperations") {
        Ok(Some(values)) => values,
        Ok(None) => return NestedOperations::all(),
        Err(e) => {
            problems.push((name, e));
            return NestedOperations::all();
        }
    };

    let mut ops = NestedOperations::none();
    for value in values {
        if !ops.enable(&value) {
            problems.push((name, format!("unknown nested operation `{value}`")));
        }
    }
    ops
}

fn populated_by_args(
    directive: &ConstDirective,
    problems: &mut Vec<DirectiveProblem>,
) -> Option<PopulatedByArgs> {
    let callback = match string_arg(directive, "callback") {
        Ok(Some(callback)) => callback,
        Ok(None) => {
            problems.push((names::POPULATED_BY, "missing required argument `callback`".into()));
            return None;
        }
        Err(e) => {
            problems.push((names::POPULATED_BY, e));
            return None;
        }
    };

    let operations = match enum_list_arg(directive, "operations") {
        Ok(None) => vec![CallbackOperation::Create, CallbackOperation::Update],
        Ok(Some(values)) => {
            let mut operations = Vec::new();
            for value in values {
                let op = match value.as_str() {
                    "CREATE" => CallbackOperation::Create,
                    "UPDATE" => CallbackOperation::Update,
                    other => {
                        problems.push((names::POPULATED_BY, format!("unknown operation `{other}`")));
                        continue;
                    }
                };
                if !operations.contains(&op) {
                    operations.push(op);
                }
            }
            operations
        }
        Err(e) => {
            problems.push((names::POPULATED_BY, e));
            return None;
        }
    };

    Some(PopulatedByArgs {
        callback,
        operations,
    })
}

// ============================================================================
// Argument helpers
// ============================================================================

fn string_arg(directive: &ConstDirective, name: &str) -> Result<Option<String>, String> {
    match directive.get_argument(name).map(|v| &v.node) {
        None | Some(ConstValue::Null) => Ok(None),
        Some(ConstValue::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(format!("`{name}` must be a string, found {other}")),
    }
}

/// Accepts both enum literals and strings.
fn enum_arg(directive: &ConstDirective, name: &str) -> Result<Option<String>, String> {
    match directive.get_argument(name).map(|v| &v.node) {
        None | Some(ConstValue::Null) => Ok(None),
        Some(ConstValue::Enum(value)) => Ok(Some(value.to_string())),
        Some(ConstValue::String(value)) => Ok(Some(value.clone())),
        Some(other) => Err(format!("`{name}` must be an enum value, found {other}")),
    }
}

fn enum_list_arg(directive: &ConstDirective, name: &str) -> Result<Option<Vec<String>>, String> {
    let Some(value) = directive.get_argument(name).map(|v| &v.node) else {
        return Ok(None);
    };
    let items = match value {
        ConstValue::Null => return Ok(None),
        ConstValue::List(items) => items.as_slice(),
        single => std::slice::from_ref(single),
    };
    items
        .iter()
        .map(|item| match item {
            ConstValue::Enum(value) => Ok(value.to_string()),
            ConstValue::String(value) => Ok(value.clone()),
            other => Err(format!("`{name}` must list enum values, found {other}")),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

fn string_list_arg(directive: &ConstDirective, name: &str) -> Result<Option<Vec<String>>, String> {
    let Some(value) = directive.get_argument(name).map(|v| &v.node) else {
        return Ok(None);
    };
    match value {
        ConstValue::Null => Ok(None),
        ConstValue::List(items) => items
            .iter()
            .map(|item| match item {
                ConstValue::String(value) => Ok(value.clone()),
                other => Err(format!("`{name}` must list strings, found {other}")),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        ConstValue::String(value) => Ok(Some(vec![value.clone()])),
        other => Err(format!("`{name}` must be a list of strings, found {other}")),
    }
}
