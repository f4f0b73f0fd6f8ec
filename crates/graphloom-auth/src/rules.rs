//! Compiled rules and the request-time checks over them.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use tracing::{trace, warn};

use crate::claims::Claims;
use crate::error::{AuthorizationDenied, RequestError};
use crate::operation::{AuthorizationOperation, RuleKind, ValidateWhen};
use crate::predicate::PredicateExpr;

/// One compiled `validate` or `filter` rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationRule {
    pub kind: RuleKind,
    /// Position in the declaring directive's `validate`/`filter` list.
    pub index: usize,
    /// Entity or interface carrying the `@authorization` directive.
    pub declared_on: String,
    pub operations: Vec<AuthorizationOperation>,
    /// Timing hints for `validate` rules; empty for `filter` rules.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub when: Vec<ValidateWhen>,
    pub require_authentication: bool,
    /// `None` when the rule has no `where` clause.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicate: Option<PredicateExpr>,
}

impl AuthorizationRule {
    #[must_use]
    pub fn applies_to(&self, operation: AuthorizationOperation) -> bool {
        self.operations.contains(&operation)
    }

    /// Label used in denial messages, e.g. `validate[0]`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}[{}]", self.kind.as_str(), self.index)
    }
}

/// Evaluates one rule for a candidate node.
///
/// Anonymous requests fail rules that require authentication; a rule
/// without a `where` clause otherwise holds.
#[must_use]
pub fn evaluate(rule: &AuthorizationRule, claims: &Claims, node: &Value) -> bool {
    if rule.require_authentication && !claims.is_authenticated() {
        return false;
    }
    rule.predicate
        .as_ref()
        .is_none_or(|predicate| predicate.evaluate(claims, node))
}

/// Effective rules per entity.
///
/// A concrete entity's rules include those inherited from every interface
/// it implements. All applicable rules must hold.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RuleSet {
    entities: IndexMap<String, Vec<AuthorizationRule>>,
}

impl RuleSet {
    #[must_use]
    pub fn new(entities: IndexMap<String, Vec<AuthorizationRule>>) -> Self {
        Self { entities }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Number of entities with at least one effective rule.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn entities(&self) -> impl Iterator<Item = (&str, &[AuthorizationRule])> {
        self.entities
            .iter()
            .map(|(name, rules)| (name.as_str(), rules.as_slice()))
    }

    #[must_use]
    pub fn rules_for(&self, entity: &str) -> &[AuthorizationRule] {
        self.entities.get(entity).map(Vec::as_slice).unwrap_or_default()
    }

    /// Rules of `kind` on `entity` covering `operation`.
    pub fn applicable(
        &self,
        entity: &str,
        kind: RuleKind,
        operation: AuthorizationOperation,
    ) -> impl Iterator<Item = &AuthorizationRule> {
        self.rules_for(entity)
            .iter()
            .filter(move |r| r.kind == kind && r.applies_to(operation))
    }

    /// Checks every `validate` rule for `operation` at timing `when`.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::Unauthenticated`] when an anonymous request
    /// meets a rule requiring authentication, and [`RequestError::Denied`]
    /// when any rule's predicate fails.
    pub fn authorize(
        &self,
        entity: &str,
        operation: AuthorizationOperation,
        when: ValidateWhen,
        claims: &Claims,
        node: &Value,
    ) -> Result<(), RequestError> {
        for rule in self.applicable(entity, RuleKind::Validate, operation) {
            if !rule.when.contains(&when) {
                continue;
            }
            if rule.require_authentication && !claims.is_authenticated() {
                warn!(
                    entity = %entity,
                    operation = %operation,
                    rule = %rule.label(),
                    "Anonymous request rejected"
                );
                return Err(RequestError::Unauthenticated {
                    entity: entity.to_string(),
                    operation,
                });
            }
            if !evaluate(rule, claims, node) {
                warn!(
                    entity = %entity,
                    operation = %operation,
                    rule = %rule.label(),
                    declared_on = %rule.declared_on,
                    "Authorization denied"
                );
                return Err(AuthorizationDenied {
                    entity: entity.to_string(),
                    operation,
                    rule: rule.label(),
                    declared_on: rule.declared_on.clone(),
                }
                .into());
            }
        }
        trace!(entity = %entity, operation = %operation, "Authorized");
        Ok(())
    }

    /// True if every `filter` rule for `operation` lets `node` through.
    #[must_use]
    pub fn is_visible(
        &self,
        entity: &str,
        operation: AuthorizationOperation,
        claims: &Claims,
        node: &Value,
    ) -> bool {
        self.applicable(entity, RuleKind::Filter, operation)
            .all(|rule| evaluate(rule, claims, node))
    }

    /// Keeps the nodes visible under the `filter` rules for `operation`.
    #[must_use]
    pub fn filter_nodes<'n>(
        &self,
        entity: &str,
        operation: AuthorizationOperation,
        claims: &Claims,
        nodes: &'n [Value],
    ) -> Vec<&'n Value> {
        let visible: Vec<&Value> = nodes
            .iter()
            .filter(|node| self.is_visible(entity, operation, claims, node))
            .collect();
        trace!(
            entity = %entity,
            operation = %operation,
            total = nodes.len(),
            visible = visible.len(),
            "Filtered nodes"
        );
        visible
    }
}

#[cfg(test)]
mod tests {
    use graphloom_schema::augment::scalars::FilterSemantics;
    use serde_json::json;

    use super::*;
    use crate::predicate::Operand;

    fn owner_rule(kind: RuleKind, declared_on: &str) -> AuthorizationRule {
        AuthorizationRule {
            kind,
            index: 0,
            declared_on: declared_on.into(),
            operations: kind.default_operations(),
            when: match kind {
                RuleKind::Validate => vec![ValidateWhen::Before, ValidateWhen::After],
                RuleKind::Filter => Vec::new(),
            },
            require_authentication: true,
            predicate: Some(PredicateExpr::Field {
                field: "ownerId".into(),
                operator: FilterSemantics::Equals,
                value: Operand::Claim("sub".into()),
            }),
        }
    }

    fn rule_set(rules: Vec<AuthorizationRule>) -> RuleSet {
        let mut entities = IndexMap::new();
        entities.insert("Post".to_string(), rules);
        RuleSet::new(entities)
    }

    #[test]
    fn test_authorize_owner() {
        let rules = rule_set(vec![owner_rule(RuleKind::Validate, "Post")]);
        let claims = Claims::new(json!({"sub": "u1"}));

        assert!(
            rules
                .authorize(
                    "Post",
                    AuthorizationOperation::Update,
                    ValidateWhen::Before,
                    &claims,
                    &json!({"ownerId": "u1"})
                )
                .is_ok()
        );
        let err = rules
            .authorize(
                "Post",
                AuthorizationOperation::Update,
                ValidateWhen::Before,
                &claims,
                &json!({"ownerId": "u2"}),
            )
            .unwrap_err();
        assert!(err.to_string().starts_with("Forbidden"));
        assert!(
            rules
                .authorize(
                    "Post",
                    AuthorizationOperation::Subscribe,
                    ValidateWhen::Before,
                    &claims,
                    &json!({"ownerId": "u2"})
                )
                .is_ok()
        );
    }

    #[test]
    fn test_anonymous_request() {
        let rules = rule_set(vec![owner_rule(RuleKind::Validate, "Post")]);
        let err = rules
            .authorize(
                "Post",
                AuthorizationOperation::Read,
                ValidateWhen::After,
                &Claims::anonymous(),
                &json!({"ownerId": "u1"}),
            )
            .unwrap_err();
        assert!(matches!(err, RequestError::Unauthenticated { .. }));
    }

    #[test]
    fn test_rules_are_conjunctive() {
        let mut published = owner_rule(RuleKind::Validate, "Content");
        published.index = 1;
        published.predicate = Some(PredicateExpr::Field {
            field: "published".into(),
            operator: FilterSemantics::Equals,
            value: Operand::Literal(json!(true)),
        });
        let rules = rule_set(vec![owner_rule(RuleKind::Validate, "Post"), published]);
        let claims = Claims::new(json!({"sub": "u1"}));

        let err = rules
            .authorize(
                "Post",
                AuthorizationOperation::Read,
                ValidateWhen::Before,
                &claims,
                &json!({"ownerId": "u1", "published": false}),
            )
            .unwrap_err();
        match err {
            RequestError::Denied(denied) => {
                assert_eq!(denied.rule, "validate[1]");
                assert_eq!(denied.declared_on, "Content");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_filter_nodes() {
        let rules = rule_set(vec![owner_rule(RuleKind::Filter, "Post")]);
        let nodes = vec![json!({"ownerId": "u1"}), json!({"ownerId": "u2"})];

        let visible = rules.filter_nodes(
            "Post",
            AuthorizationOperation::Read,
            &Claims::new(json!({"sub": "u2"})),
            &nodes,
        );
        assert_eq!(visible, vec![&nodes[1]]);
        assert!(
            rules
                .filter_nodes("Post", AuthorizationOperation::Read, &Claims::anonymous(), &nodes)
                .is_empty()
        );
        assert_eq!(
            rules
                .filter_nodes("Post", AuthorizationOperation::Create, &Claims::anonymous(), &nodes)
                .len(),
            2
        );
    }

    #[test]
    fn test_rule_without_predicate() {
        let mut rule = owner_rule(RuleKind::Validate, "Post");
        rule.predicate = None;
        assert!(evaluate(&rule, &Claims::new(json!({})), &json!({})));
        assert!(!evaluate(&rule, &Claims::anonymous(), &json!({})));
        rule.require_authentication = false;
        assert!(evaluate(&rule, &Claims::anonymous(), &json!({})));
    }
}
