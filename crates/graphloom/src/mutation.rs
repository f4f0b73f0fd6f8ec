//! Authorization of nested create mutations.
//!
//! A create input follows the derived `<E>CreateInput` shape: scalar fields
//! plus, per relationship field, a field input with `create`/`connect`
//! members. Interface targets key each nested node by implementer, union
//! targets key each field input by member. [`plan_create`] flattens such an
//! input into the nodes it would create; [`SchemaSnapshot::authorize_create`]
//! runs the `CREATE` rules before and the `READ` rules after creation for
//! each of them, since the mutation response returns every created node.

use async_graphql::{Pos, Response, ServerError};
use graphloom_auth::{AuthorizationOperation, Claims, RequestError, ValidateWhen};
use graphloom_schema::augment::RootNames;
use graphloom_schema::relationships::TargetKind;
use graphloom_schema::{RelationshipEdge, ResolvedGraph};
use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::{debug, trace};

use crate::snapshot::SchemaSnapshot;

/// A node a create mutation would write.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedNode {
    pub entity: String,
    /// Input path, e.g. `input[0].posts.create[1].node`.
    pub path: String,
    /// Scalar fields of the node as given in the input.
    pub properties: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlan {
    /// Parents precede the nodes created beneath them.
    pub nodes: Vec<PlannedNode>,
    pub relationships_created: usize,
}

/// Flattens the create `inputs` for `entity` into planned nodes.
///
/// # Errors
///
/// Returns [`RequestError::InvalidInput`] when the input does not match the
/// derived input types.
pub fn plan_create(
    graph: &ResolvedGraph,
    entity: &str,
    inputs: &[Value],
) -> Result<CreatePlan, RequestError> {
    let mut planner = Planner {
        graph,
        plan: CreatePlan::default(),
    };
    for (i, input) in inputs.iter().enumerate() {
        planner.node(entity, input, format!("input[{i}]"))?;
    }
    Ok(planner.plan)
}

struct Planner<'g> {
    graph: &'g ResolvedGraph,
    plan: CreatePlan,
}

impl Planner<'_> {
    fn node(&mut self, entity_name: &str, input: &Value, path: String) -> Result<(), RequestError> {
        let Some(entity) = self.graph.graph.entity(entity_name) else {
            return Err(invalid(&path, format!("unknown type `{entity_name}`")));
        };
        let Some(fields) = input.as_object() else {
            return Err(invalid(&path, "expected an object"));
        };

        if entity.is_interface() {
            let mut entries = fields.iter();
            let (Some((implementer, node)), None) = (entries.next(), entries.next()) else {
                return Err(invalid(
                    &path,
                    format!("expected exactly one implementation of `{entity_name}`"),
                ));
            };
            let implements = self
                .graph
                .graph
                .implementers_of(entity_name)
                .iter()
                .any(|e| &e.name == implementer);
            if !implements {
                return Err(invalid(
                    &path,
                    format!("`{implementer}` does not implement `{entity_name}`"),
                ));
            }
            return self.node(implementer, node, format!("{path}.{implementer}"));
        }

        let mut properties = Map::new();
        let mut nested = Vec::new();
        for (key, value) in fields {
            if let Some(edge) = self.graph.edge_for(entity_name, key) {
                nested.push((edge, value));
            } else if entity.field(key).is_some_and(|f| !f.is_relationship()) {
                properties.insert(key.clone(), value.clone());
            } else {
                return Err(invalid(&path, format!("unknown field `{key}` on `{entity_name}`")));
            }
        }

        trace!(entity = %entity_name, path = %path, "Planned node");
        self.plan.nodes.push(PlannedNode {
            entity: entity_name.to_string(),
            path: path.clone(),
            properties,
        });

        for (edge, value) in nested {
            let field_path = format!("{path}.{}", edge.field);
            match edge.target_kind {
                TargetKind::Union => {
                    let Some(members) = value.as_object() else {
                        return Err(invalid(&field_path, "expected an object keyed by union member"));
                    };
                    for (member, field_input) in members {
                        let is_member = self
                            .graph
                            .graph
                            .unions
                            .get(&edge.target)
                            .is_some_and(|u| u.members.contains(member));
                        if !is_member {
                            return Err(invalid(
                                &field_path,
                                format!("`{member}` is not a member of `{}`", edge.target),
                            ));
                        }
                        self.field_input(edge, member, field_input, format!("{field_path}.{member}"))?;
                    }
                }
                TargetKind::Node | TargetKind::Interface => {
                    self.field_input(edge, &edge.target, value, field_path)?;
                }
            }
        }
        Ok(())
    }

    fn field_input(
        &mut self,
        edge: &RelationshipEdge,
        target: &str,
        input: &Value,
        path: String,
    ) -> Result<(), RequestError> {
        let Some(members) = input.as_object() else {
            return Err(invalid(&path, "expected an object"));
        };
        for (key, value) in members {
            match key.as_str() {
                "create" if edge.nested_operations.create => {
                    let items = match value {
                        Value::Array(items) => items.as_slice(),
                        Value::Object(_) => std::slice::from_ref(value),
                        _ => {
                            return Err(invalid(
                                &format!("{path}.create"),
                                "expected a list or object",
                            ));
                        }
                    };
                    for (i, item) in items.iter().enumerate() {
                        let item_path = format!("{path}.create[{i}]");
                        let Some(node) = item.get("node") else {
                            return Err(invalid(&item_path, "missing `node`"));
                        };
                        self.node(target, node, format!("{item_path}.node"))?;
                        self.plan.relationships_created += 1;
                    }
                }
                "connect" if edge.nested_operations.connect => {}
                other => {
                    return Err(invalid(
                        &path,
                        format!("`{other}` is not a nested operation of `{}.{}`", edge.source, edge.field),
                    ));
                }
            }
        }
        Ok(())
    }
}

fn invalid(path: &str, message: impl Into<String>) -> RequestError {
    RequestError::InvalidInput {
        path: path.to_string(),
        message: message.into(),
    }
}

impl SchemaSnapshot {
    /// Authorizes a create mutation for `entity`, nested creations included.
    ///
    /// # Errors
    ///
    /// Returns the first input or authorization error.
    pub fn authorize_create(
        &self,
        entity: &str,
        inputs: &[Value],
        claims: &Claims,
    ) -> Result<CreatePlan, RequestError> {
        let plan = plan_create(&self.graph, entity, inputs)?;
        for (when, operation) in [
            (ValidateWhen::Before, AuthorizationOperation::Create),
            (ValidateWhen::After, AuthorizationOperation::Create),
            (ValidateWhen::After, AuthorizationOperation::Read),
        ] {
            for node in &plan.nodes {
                let value = Value::Object(node.properties.clone());
                self.authorize(&node.entity, operation, when, claims, &value)?;
            }
        }
        debug!(
            entity = %entity,
            nodes = plan.nodes.len(),
            relationships = plan.relationships_created,
            "Create authorized"
        );
        Ok(plan)
    }

    /// GraphQL response for `create<Plural>(input: inputs)`: the mutation's
    /// `info` on success, otherwise the request error in `errors`.
    #[must_use]
    pub fn create_response(&self, entity: &str, inputs: &[Value], claims: &Claims) -> Response {
        let Some(target) = self.graph.graph.entity(entity).filter(|e| !e.is_interface()) else {
            let err = invalid("input", format!("`{entity}` has no create mutation"));
            return Response::from_errors(vec![err.to_server_error(Pos::default())]);
        };
        let mutation = RootNames::new(&target.plural_name()).create;

        match self.authorize_create(entity, inputs, claims) {
            Ok(plan) => {
                let data = json!({
                    mutation: {
                        "info": {
                            "nodesCreated": plan.nodes.len(),
                            "relationshipsCreated": plan.relationships_created,
                        }
                    }
                });
                match async_graphql::Value::from_json(data) {
                    Ok(data) => Response::new(data),
                    Err(e) => Response::from_errors(vec![ServerError::new(e.to_string(), None)]),
                }
            }
            Err(err) => {
                let mut error = err.to_server_error(Pos::default());
                error.path = vec![async_graphql::PathSegment::Field(mutation)];
                Response::from_errors(vec![error])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::config::AppConfig;

    const BLOG: &str = r#"
        type User {
            id: ID!
            posts: [Post!]! @relationship(type: "WROTE", direction: OUT)
        }

        type Post {
            title: String
            author: User! @relationship(type: "WROTE", direction: IN)
            tags: [Tag!]! @relationship(type: "TAGGED", direction: OUT, nestedOperations: [CONNECT])
        }

        type Tag { name: String }
    "#;

    fn snapshot() -> SchemaSnapshot {
        crate::build(BLOG, &AppConfig::default()).unwrap()
    }

    #[test]
    fn test_plan_nested_create() {
        let snapshot = snapshot();
        let plan = plan_create(
            &snapshot.graph,
            "User",
            &[json!({
                "id": "u1",
                "posts": { "create": [
                    { "node": { "title": "a" } },
                    { "node": { "title": "b", "tags": { "connect": [{ "where": {} }] } } }
                ] }
            })],
        )
        .unwrap();

        let paths: Vec<&str> = plan.nodes.iter().map(|n| n.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "input[0]",
                "input[0].posts.create[0].node",
                "input[0].posts.create[1].node"
            ]
        );
        assert_eq!(plan.nodes[1].entity, "Post");
        assert_eq!(plan.nodes[0].properties.get("id"), Some(&json!("u1")));
        assert_eq!(plan.relationships_created, 2);
    }

    #[test]
    fn test_pruned_operation_is_invalid() {
        let snapshot = snapshot();
        let err = plan_create(
            &snapshot.graph,
            "Post",
            &[json!({ "tags": { "create": [{ "node": { "name": "x" } }] } })],
        )
        .unwrap_err();
        assert_eq!(err.error_code(), "BAD_USER_INPUT");
        assert!(err.to_string().contains("`create` is not a nested operation of `Post.tags`"));
    }

    #[test]
    fn test_to_one_create_accepts_object() {
        let snapshot = snapshot();
        let plan = plan_create(
            &snapshot.graph,
            "Post",
            &[json!({ "author": { "create": { "node": { "id": "u9" } } } })],
        )
        .unwrap();
        assert_eq!(plan.nodes[1].path, "input[0].author.create[0].node");
    }

    #[test]
    fn test_scalar_create_is_invalid() {
        let snapshot = snapshot();
        let err = plan_create(
            &snapshot.graph,
            "Post",
            &[json!({ "author": { "create": "u9" } })],
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid input at `input[0].author.create`: expected a list or object"
        );
    }

    #[test]
    fn test_create_response_info() {
        let snapshot = snapshot();
        let response = snapshot.create_response(
            "User",
            &[json!({ "id": "u1" })],
            &snapshot.claims(None),
        );
        assert!(response.errors.is_empty());
        let data = response.data.into_json().unwrap();
        assert_eq!(data["createUsers"]["info"]["nodesCreated"], json!(1));
    }
}
