//! Authorization Rule Compiler.
//!
//! Turns the raw `@authorization` arguments captured by the type model into
//! typed [`AuthorizationRule`]s. Every problem found across all entities is
//! reported as a [`ValidationIssue`] so it joins the schema build's
//! aggregated error.

use graphloom_schema::augment::RELATIONSHIP_QUANTIFIERS;
use graphloom_schema::augment::scalars::{FILTER_OPERATORS, FilterSemantics, parse_filter_key};
use graphloom_schema::{Entity, EntityGraph, Field, ValidationIssue};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::operation::{AuthorizationOperation, RuleKind, ValidateWhen};
use crate::predicate::{Operand, PredicateExpr, Quantifier};
use crate::rules::{AuthorizationRule, RuleSet};

const JWT_PREFIX: &str = "$jwt.";
const CONTEXT_PREFIX: &str = "$context.";

/// Compiles the rules of every entity in a graph.
pub struct RuleCompiler<'g> {
    graph: &'g EntityGraph,
}

impl<'g> RuleCompiler<'g> {
    #[must_use]
    pub fn new(graph: &'g EntityGraph) -> Self {
        Self { graph }
    }

    /// Compiles declared rules and expands them into effective per-entity
    /// rule lists.
    #[must_use]
    pub fn compile(&self) -> (RuleSet, Vec<ValidationIssue>) {
        let mut issues = Vec::new();
        let mut declared: IndexMap<&str, Vec<AuthorizationRule>> = IndexMap::new();

        for entity in self.graph.entities.values() {
            let Some(annotation) = &entity.authorization else {
                continue;
            };
            let mut problems = Vec::new();
            let mut rules = Vec::new();
            for (kind, value) in [
                (RuleKind::Validate, &annotation.validate),
                (RuleKind::Filter, &annotation.filter),
            ] {
                if let Some(value) = value {
                    rules.extend(self.compile_rules(entity, kind, value, &mut problems));
                }
            }
            trace!(entity = %entity.name, rules = rules.len(), "Compiled declared rules");

            issues.extend(problems.into_iter().map(|message| ValidationIssue::Authorization {
                type_name: entity.name.clone(),
                message,
                location: annotation.location,
            }));
            declared.insert(entity.name.as_str(), rules);
        }

        let mut effective = IndexMap::new();
        for entity in self.graph.entities.values() {
            let mut rules: Vec<AuthorizationRule> =
                declared.get(entity.name.as_str()).cloned().unwrap_or_default();
            for ancestor in self.graph.ancestors_of(&entity.name) {
                if let Some(inherited) = declared.get(ancestor) {
                    rules.extend(inherited.iter().cloned());
                }
            }
            if !rules.is_empty() {
                effective.insert(entity.name.clone(), rules);
            }
        }

        debug!(
            entities = effective.len(),
            issues = issues.len(),
            "Authorization rules compiled"
        );
        (RuleSet::new(effective), issues)
    }

    /// A `validate`/`filter` argument: a list of rules, or a single rule
    /// under GraphQL list coercion.
    fn compile_rules(
        &self,
        entity: &Entity,
        kind: RuleKind,
        value: &Value,
        problems: &mut Vec<String>,
    ) -> Vec<AuthorizationRule> {
        let items = match value {
            Value::Array(items) => items.as_slice(),
            single => std::slice::from_ref(single),
        };
        items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| self.compile_rule(entity, kind, index, item, problems))
            .collect()
    }

    fn compile_rule(
        &self,
        entity: &Entity,
        kind: RuleKind,
        index: usize,
        item: &Value,
        problems: &mut Vec<String>,
    ) -> Option<AuthorizationRule> {
        let label = format!("{}[{index}]", kind.as_str());
        let Some(object) = item.as_object() else {
            problems.push(format!("{label}: expected an object"));
            return None;
        };

        let mut rule = AuthorizationRule {
            kind,
            index,
            declared_on: entity.name.clone(),
            operations: kind.default_operations(),
            when: match kind {
                RuleKind::Validate => vec![ValidateWhen::Before, ValidateWhen::After],
                RuleKind::Filter => Vec::new(),
            },
            require_authentication: true,
            predicate: None,
        };

        for (key, value) in object {
            let path = format!("{label}.{key}");
            match key.as_str() {
                "where" => rule.predicate = self.compile_where(entity, value, &path, problems),
                "operations" => {
                    rule.operations = parse_list(value, &path, problems, |name| {
                        AuthorizationOperation::parse(name)
                            .ok_or_else(|| format!("unknown operation `{name}`"))
                    });
                }
                "when" if kind == RuleKind::Validate => {
                    rule.when = parse_list(value, &path, problems, |name| {
                        ValidateWhen::parse(name).ok_or_else(|| format!("unknown timing `{name}`"))
                    });
                }
                "requireAuthentication" => match value.as_bool() {
                    Some(required) => rule.require_authentication = required,
                    None => problems.push(format!("{path}: expected a boolean")),
                },
                other => problems.push(format!("{label}: unknown argument `{other}`")),
            }
        }
        Some(rule)
    }

    /// Top-level `where`: `node`, `jwt` and the logical combinators.
    fn compile_where(
        &self,
        entity: &Entity,
        value: &Value,
        path: &str,
        problems: &mut Vec<String>,
    ) -> Option<PredicateExpr> {
        let object = expect_object(value, path, problems)?;
        let mut parts = Vec::new();
        for (key, value) in object {
            let path = format!("{path}.{key}");
            let part = match key.as_str() {
                "node" => self.compile_node_where(entity, value, &path, problems),
                "jwt" => self.compile_jwt_where(value, &path, problems),
                "AND" | "OR" | "NOT" => logical(key, value, &path, problems, |v, p, problems| {
                    self.compile_where(entity, v, p, problems)
                }),
                other => {
                    problems.push(format!(
                        "{path}: unknown key `{other}`, expected `node`, `jwt`, `AND`, `OR` or `NOT`"
                    ));
                    None
                }
            };
            parts.extend(part);
        }
        Some(PredicateExpr::all(parts))
    }

    /// Node `where` over `entity`'s fields and relationships.
    fn compile_node_where(
        &self,
        entity: &Entity,
        value: &Value,
        path: &str,
        problems: &mut Vec<String>,
    ) -> Option<PredicateExpr> {
        let object = expect_object(value, path, problems)?;
        let mut parts = Vec::new();
        for (key, value) in object {
            let path = format!("{path}.{key}");
            let part = match key.as_str() {
                "AND" | "OR" | "NOT" => logical(key, value, &path, problems, |v, p, problems| {
                    self.compile_node_where(entity, v, p, problems)
                }),
                _ => self.compile_node_key(entity, key, value, &path, problems),
            };
            parts.extend(part);
        }
        Some(PredicateExpr::all(parts))
    }

    fn compile_node_key(
        &self,
        entity: &Entity,
        key: &str,
        value: &Value,
        path: &str,
        problems: &mut Vec<String>,
    ) -> Option<PredicateExpr> {
        for quantifier in RELATIONSHIP_QUANTIFIERS {
            let Some(field) = key
                .strip_suffix(quantifier)
                .and_then(|stem| stem.strip_suffix('_'))
                .and_then(|stem| entity.field(stem))
                .filter(|f| f.is_relationship())
            else {
                continue;
            };
            if !field.ty.list {
                problems.push(format!(
                    "{path}: `{}` is a to-one relationship, use `{}` without a quantifier",
                    field.name, field.name
                ));
                return None;
            }
            let quantifier = Quantifier::parse(quantifier)?;
            return self.compile_traversal(field, quantifier, value, path, problems);
        }

        if let Some(field) = entity.field(key).filter(|f| f.is_relationship()) {
            if field.ty.list {
                problems.push(format!(
                    "{path}: `{key}` is a to-many relationship, use `{key}_SOME`, `{key}_ALL`, `{key}_NONE` or `{key}_SINGLE`"
                ));
                return None;
            }
            return self.compile_traversal(field, Quantifier::One, value, path, problems);
        }

        let (name, operator) = parse_filter_key(key);
        let Some(field) = entity.field(name) else {
            problems.push(format!("{path}: unknown field `{name}` on `{}`", entity.name));
            return None;
        };
        if field.is_relationship() {
            problems.push(format!(
                "{path}: relationship `{name}` cannot be compared with `{}`",
                operator_name(operator)
            ));
            return None;
        }
        let Some(category) = field.category() else {
            problems.push(format!("{path}: field `{name}` cannot be filtered"));
            return None;
        };
        if !operator.applies_to(category, field.ty.list) {
            problems.push(format!(
                "{path}: operator `{}` is not valid for field `{name}` of type `{}`",
                operator_name(operator),
                field.ty
            ));
            return None;
        }

        let value = self.compile_operand(value, operator, path, problems)?;
        Some(PredicateExpr::Field {
            field: field.name.clone(),
            operator,
            value,
        })
    }

    fn compile_traversal(
        &self,
        field: &Field,
        quantifier: Quantifier,
        value: &Value,
        path: &str,
        problems: &mut Vec<String>,
    ) -> Option<PredicateExpr> {
        let target = &field.relationship()?.target;
        if self.graph.unions.contains_key(target) {
            problems.push(format!(
                "{path}: cannot traverse `{}`, which targets union `{target}`",
                field.name
            ));
            return None;
        }
        let Some(target_entity) = self.graph.entity(target) else {
            problems.push(format!("{path}: unknown relationship target `{target}`"));
            return None;
        };
        let predicate = self.compile_node_where(target_entity, value, path, problems)?;
        Some(PredicateExpr::Relationship {
            field: field.name.clone(),
            quantifier,
            predicate: Box::new(predicate),
        })
    }

    /// `jwt` where over the claims. With a declared `@jwt` type, keys must
    /// name its fields and map through their claim paths.
    fn compile_jwt_where(
        &self,
        value: &Value,
        path: &str,
        problems: &mut Vec<String>,
    ) -> Option<PredicateExpr> {
        let object = expect_object(value, path, problems)?;
        let mut parts = Vec::new();
        for (key, value) in object {
            let path = format!("{path}.{key}");
            if matches!(key.as_str(), "AND" | "OR" | "NOT") {
                parts.extend(logical(key, value, &path, problems, |v, p, problems| {
                    self.compile_jwt_where(v, p, problems)
                }));
                continue;
            }

            let (name, operator) = parse_filter_key(key);
            let claim_path = match &self.graph.claims {
                Some(shape) => {
                    let Some(claim) = shape.field(name) else {
                        problems.push(format!(
                            "{path}: unknown claim field `{name}` on `{}`",
                            shape.type_name
                        ));
                        continue;
                    };
                    if !operator.applies_to(claim.kind.category(), claim.list) {
                        problems.push(format!(
                            "{path}: operator `{}` is not valid for claim `{name}`",
                            operator_name(operator)
                        ));
                        continue;
                    }
                    claim.path.clone()
                }
                None => name.to_string(),
            };
            if let Some(value) = self.compile_operand(value, operator, &path, problems) {
                parts.push(PredicateExpr::Claim {
                    path: claim_path,
                    operator,
                    value,
                });
            }
        }
        Some(PredicateExpr::all(parts))
    }

    /// A literal, `$jwt.<path>` or `$context.<path>` value.
    fn compile_operand(
        &self,
        value: &Value,
        operator: FilterSemantics,
        path: &str,
        problems: &mut Vec<String>,
    ) -> Option<Operand> {
        if let Some(reference) = value.as_str() {
            if let Some(claim) = reference.strip_prefix(JWT_PREFIX) {
                return self.resolve_claim_reference(claim, path, problems).map(Operand::Claim);
            }
            if let Some(context) = reference.strip_prefix(CONTEXT_PREFIX) {
                return Some(Operand::Context(context.to_string()));
            }
        }
        if operator == FilterSemantics::In && !value.is_array() {
            problems.push(format!("{path}: `_IN` expects a list"));
            return None;
        }
        Some(Operand::Literal(value.clone()))
    }

    /// Maps `$jwt.<field>[.rest]` through the declared claims shape.
    fn resolve_claim_reference(
        &self,
        reference: &str,
        path: &str,
        problems: &mut Vec<String>,
    ) -> Option<String> {
        let Some(shape) = &self.graph.claims else {
            return Some(reference.to_string());
        };
        let (head, rest) = match reference.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (reference, None),
        };
        let Some(claim) = shape.field(head) else {
            problems.push(format!(
                "{path}: unknown claim field `{head}` on `{}`",
                shape.type_name
            ));
            return None;
        };
        Some(match rest {
            Some(rest) => format!("{}.{rest}", claim.path),
            None => claim.path.clone(),
        })
    }
}

/// Compiles `AND`/`OR` lists and `NOT` objects with `compile`.
fn logical(
    key: &str,
    value: &Value,
    path: &str,
    problems: &mut Vec<String>,
    compile: impl Fn(&Value, &str, &mut Vec<String>) -> Option<PredicateExpr>,
) -> Option<PredicateExpr> {
    if key == "NOT" {
        let expr = compile(value, path, problems)?;
        return Some(PredicateExpr::Not {
            expr: Box::new(expr),
        });
    }
    let Some(items) = value.as_array() else {
        problems.push(format!("{path}: expected a list"));
        return None;
    };
    let parts: Vec<PredicateExpr> = items
        .iter()
        .enumerate()
        .filter_map(|(i, item)| compile(item, &format!("{path}[{i}]"), problems))
        .collect();
    Some(if key == "AND" {
        PredicateExpr::And { all: parts }
    } else {
        PredicateExpr::Or { any: parts }
    })
}

fn expect_object<'v>(
    value: &'v Value,
    path: &str,
    problems: &mut Vec<String>,
) -> Option<&'v Map<String, Value>> {
    let object = value.as_object();
    if object.is_none() {
        problems.push(format!("{path}: expected an object"));
    }
    object
}

/// Enum list argument; a single value is accepted as a one-item list.
fn parse_list<T>(
    value: &Value,
    path: &str,
    problems: &mut Vec<String>,
    parse: impl Fn(&str) -> Result<T, String>,
) -> Vec<T> {
    let items = match value {
        Value::Array(items) => items.as_slice(),
        single => std::slice::from_ref(single),
    };
    let mut parsed = Vec::new();
    for item in items {
        match item.as_str().map(&parse) {
            Some(Ok(value)) => parsed.push(value),
            Some(Err(message)) => problems.push(format!("{path}: {message}")),
            None => problems.push(format!("{path}: expected enum values")),
        }
    }
    parsed
}

fn operator_name(operator: FilterSemantics) -> &'static str {
    FILTER_OPERATORS
        .iter()
        .find(|(_, semantics)| *semantics == operator)
        .map_or("_EQ", |(suffix, _)| *suffix)
}

#[cfg(test)]
mod tests {
    use graphloom_schema::BuildOptions;
    use graphloom_schema::model::build_entity_graph;
    use serde_json::json;

    use super::*;
    use crate::claims::Claims;

    const BLOG: &str = r#"
        type JWT @jwt {
            sub: String
            roles: [String!] @jwtClaim(path: "app.roles")
        }

        interface Content @authorization(filter: [{ where: { node: { published: true } } }]) {
            published: Boolean
        }

        type User {
            id: ID!
            name: String
            posts: [Post!]! @relationship(type: "WROTE", direction: OUT)
        }

        type Post implements Content @authorization(
            validate: [
                { operations: [UPDATE, DELETE], where: { node: { author: { id: "$jwt.sub" } } } }
                { operations: [CREATE], when: [AFTER], where: { jwt: { roles_INCLUDES: "editor" } } }
            ]
        ) {
            title: String
            published: Boolean
            author: User! @relationship(type: "WROTE", direction: IN)
        }
    "#;

    fn compile_sdl(sdl: &str) -> (RuleSet, Vec<ValidationIssue>) {
        let graph = build_entity_graph(sdl, &BuildOptions::default()).unwrap();
        RuleCompiler::new(&graph).compile()
    }

    #[test]
    fn test_compiles_declared_and_inherited_rules() {
        let (rules, issues) = compile_sdl(BLOG);
        assert!(issues.is_empty(), "{issues:#?}");

        let post = rules.rules_for("Post");
        assert_eq!(post.len(), 3);
        assert_eq!(post[0].label(), "validate[0]");
        assert_eq!(
            post[0].operations,
            vec![AuthorizationOperation::Update, AuthorizationOperation::Delete]
        );
        assert_eq!(post[1].when, vec![ValidateWhen::After]);
        assert_eq!(post[2].declared_on, "Content");
        assert_eq!(post[2].kind, RuleKind::Filter);
        assert!(rules.rules_for("User").is_empty());
    }

    #[test]
    fn test_relationship_and_claim_paths() {
        let (rules, _) = compile_sdl(BLOG);
        let post = rules.rules_for("Post");

        assert_eq!(
            post[0].predicate,
            Some(PredicateExpr::Relationship {
                field: "author".into(),
                quantifier: Quantifier::One,
                predicate: Box::new(PredicateExpr::Field {
                    field: "id".into(),
                    operator: FilterSemantics::Equals,
                    value: Operand::Claim("sub".into()),
                }),
            })
        );
        assert_eq!(
            post[1].predicate,
            Some(PredicateExpr::Claim {
                path: "app.roles".into(),
                operator: FilterSemantics::Includes,
                value: Operand::Literal(json!("editor")),
            })
        );

        let editor = Claims::new(json!({"sub": "u1", "app": {"roles": ["editor"]}}));
        assert!(crate::rules::evaluate(&post[1], &editor, &json!({})));
        assert!(crate::rules::evaluate(
            &post[0],
            &editor,
            &json!({"author": {"id": "u1"}})
        ));
    }

    #[test]
    fn test_reports_every_problem() {
        let (_, issues) = compile_sdl(
            r#"
            type JWT @jwt { sub: String }
            union Tagged = Tag
            type Tag { name: String }
            type Post @authorization(
                validate: [{
                    operations: [READ, PUBLISH],
                    where: {
                        node: {
                            missing: 1,
                            title_GT: 5,
                            tags_SOME: { name: "x" },
                            tagged_SOME: { name: "x" },
                            views_CONTAINS: "1"
                        },
                        jwt: { roles_INCLUDES: "admin" },
                        user: {}
                    }
                }]
            ) {
                title: Boolean
                views: Int
                tags: [Tag!]! @relationship(type: "TAGGED", direction: OUT)
                tagged: [Tagged!]! @relationship(type: "TAGGED", direction: OUT)
            }
            "#,
        );
        let messages: Vec<String> = issues.iter().map(ToString::to_string).collect();
        let expected = [
            "unknown operation `PUBLISH`",
            "unknown field `missing`",
            "operator `_GT` is not valid for field `title`",
            "cannot traverse `tagged`, which targets union `Tagged`",
            "operator `_CONTAINS` is not valid for field `views`",
            "unknown claim field `roles`",
            "unknown key `user`",
        ];
        for fragment in expected {
            assert!(
                messages.iter().any(|m| m.contains(fragment)),
                "missing `{fragment}` in {messages:#?}"
            );
        }
        assert_eq!(issues.len(), expected.len(), "{messages:#?}");
        assert!(messages[0].contains("@authorization on `Post`"));
    }

    #[test]
    fn test_quantifier_cardinality() {
        let (_, issues) = compile_sdl(
            r#"
            type User { id: ID! }
            type Post @authorization(validate: [{ where: { node: {
                author_SOME: { id: "1" },
                readers: { id: "1" }
            } } }]) {
                author: User @relationship(type: "WROTE", direction: IN)
                readers: [User!]! @relationship(type: "READ", direction: IN)
            }
            "#,
        );
        assert_eq!(issues.len(), 2, "{issues:#?}");
        assert!(issues[0].to_string().contains("to-one relationship"));
        assert!(issues[1].to_string().contains("`readers_SOME`"));
    }

    #[test]
    fn test_context_reference_and_no_claims_shape() {
        let (rules, issues) = compile_sdl(
            r#"
            type Doc @authorization(filter: [{
                requireAuthentication: false,
                where: { node: { tenant: "$context.tenant" }, jwt: { org: "acme" } }
            }]) {
                tenant: String
            }
            "#,
        );
        assert!(issues.is_empty(), "{issues:#?}");
        let rule = &rules.rules_for("Doc")[0];
        assert!(!rule.require_authentication);

        let claims = Claims::new(json!({"org": "acme"})).with_context(json!({"tenant": "t1"}));
        assert!(rules.is_visible("Doc", AuthorizationOperation::Read, &claims, &json!({"tenant": "t1"})));
        assert!(!rules.is_visible("Doc", AuthorizationOperation::Read, &claims, &json!({"tenant": "t2"})));
    }
}
