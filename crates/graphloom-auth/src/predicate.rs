//! Compiled `where` predicates and their evaluation.
//!
//! A [`PredicateExpr`] is a boolean tree over node field comparisons,
//! relationship traversals and claim comparisons. Evaluation is a pure
//! function of the expression, the request [`Claims`] and the candidate
//! node, so one compiled rule set can serve any number of concurrent
//! requests.

use std::cmp::Ordering;

use graphloom_schema::augment::scalars::FilterSemantics;
use serde::Serialize;
use serde_json::{Number, Value};

use crate::claims::Claims;

/// How a relationship traversal matches the related nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Quantifier {
    /// To-one relationship: the related node exists and matches.
    One,
    All,
    None,
    Single,
    Some,
}

impl Quantifier {
    /// Parses a to-many quantifier suffix (`ALL`, `NONE`, `SINGLE`, `SOME`).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ALL" => Some(Self::All),
            "NONE" => Some(Self::None),
            "SINGLE" => Some(Self::Single),
            "SOME" => Some(Self::Some),
            _ => None,
        }
    }
}

/// Right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source", content = "value", rename_all = "camelCase")]
pub enum Operand {
    Literal(Value),
    /// `$jwt.<path>`, already mapped through `@jwtClaim`.
    Claim(String),
    /// `$context.<path>`.
    Context(String),
}

impl Operand {
    /// Resolves the operand for a request. Unresolvable references yield
    /// `None`; a literal `null` resolves to `Value::Null`.
    #[must_use]
    pub fn resolve<'a>(&'a self, claims: &'a Claims) -> Option<&'a Value> {
        match self {
            Self::Literal(value) => Some(value),
            Self::Claim(path) => claims.get(path),
            Self::Context(path) => claims.context(path),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PredicateExpr {
    And {
        all: Vec<PredicateExpr>,
    },
    Or {
        any: Vec<PredicateExpr>,
    },
    Not {
        expr: Box<PredicateExpr>,
    },
    /// Compares a field of the candidate node.
    Field {
        field: String,
        operator: FilterSemantics,
        value: Operand,
    },
    /// Matches related nodes embedded in the candidate under `field`.
    Relationship {
        field: String,
        quantifier: Quantifier,
        predicate: Box<PredicateExpr>,
    },
    /// Compares a claim of the request.
    Claim {
        path: String,
        operator: FilterSemantics,
        value: Operand,
    },
}

impl PredicateExpr {
    /// Folds `parts` into one expression; an empty list is an empty `And`,
    /// which always holds.
    #[must_use]
    pub fn all(mut parts: Vec<PredicateExpr>) -> Self {
        if parts.len() == 1 {
            parts.remove(0)
        } else {
            Self::And { all: parts }
        }
    }

    /// Evaluates the predicate for `node` under `claims`.
    ///
    /// Related nodes are read from the candidate itself: a to-one
    /// relationship is an object (or null) under the field name, a to-many
    /// relationship an array.
    #[must_use]
    pub fn evaluate(&self, claims: &Claims, node: &Value) -> bool {
        match self {
            Self::And { all } => all.iter().all(|e| e.evaluate(claims, node)),
            Self::Or { any } => any.iter().any(|e| e.evaluate(claims, node)),
            Self::Not { expr } => !expr.evaluate(claims, node),
            Self::Field {
                field,
                operator,
                value,
            } => {
                let Some(expected) = value.resolve(claims) else {
                    return false;
                };
                let actual = node.get(field).unwrap_or(&Value::Null);
                compare(actual, *operator, expected)
            }
            Self::Relationship {
                field,
                quantifier,
                predicate,
            } => {
                let related = node.get(field).unwrap_or(&Value::Null);
                let items = related.as_array().map(Vec::as_slice).unwrap_or_default();
                let matching = || items.iter().filter(|n| predicate.evaluate(claims, n)).count();
                match quantifier {
                    Quantifier::One => !related.is_null() && predicate.evaluate(claims, related),
                    Quantifier::All => matching() == items.len(),
                    Quantifier::None => matching() == 0,
                    Quantifier::Single => matching() == 1,
                    Quantifier::Some => items.iter().any(|n| predicate.evaluate(claims, n)),
                }
            }
            Self::Claim {
                path,
                operator,
                value,
            } => {
                let (Some(actual), Some(expected)) = (claims.get(path), value.resolve(claims))
                else {
                    return false;
                };
                compare(actual, *operator, expected)
            }
        }
    }
}

/// Applies a filter operator to two JSON values.
#[must_use]
pub fn compare(actual: &Value, operator: FilterSemantics, expected: &Value) -> bool {
    match operator {
        FilterSemantics::Equals => values_equal(actual, expected),
        FilterSemantics::In => expected
            .as_array()
            .is_some_and(|candidates| candidates.iter().any(|c| values_equal(actual, c))),
        FilterSemantics::LessThan => ordering(actual, expected) == Some(Ordering::Less),
        FilterSemantics::LessThanOrEqual => {
            matches!(ordering(actual, expected), Some(Ordering::Less | Ordering::Equal))
        }
        FilterSemantics::GreaterThan => ordering(actual, expected) == Some(Ordering::Greater),
        FilterSemantics::GreaterThanOrEqual => {
            matches!(ordering(actual, expected), Some(Ordering::Greater | Ordering::Equal))
        }
        FilterSemantics::Contains => strings(actual, expected).is_some_and(|(a, e)| a.contains(e)),
        FilterSemantics::StartsWith => {
            strings(actual, expected).is_some_and(|(a, e)| a.starts_with(e))
        }
        FilterSemantics::EndsWith => strings(actual, expected).is_some_and(|(a, e)| a.ends_with(e)),
        FilterSemantics::Includes => actual
            .as_array()
            .is_some_and(|items| items.iter().any(|item| values_equal(item, expected))),
    }
}

/// Equality with numbers compared by value (`1` equals `1.0`).
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => number_ordering(x, y) == Some(Ordering::Equal),
        _ => a == b,
    }
}

fn ordering(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => number_ordering(x, y),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Integers compare exactly; floats only when either side is one.
fn number_ordering(x: &Number, y: &Number) -> Option<Ordering> {
    fn integer(n: &Number) -> Option<i128> {
        n.as_i64()
            .map(i128::from)
            .or_else(|| n.as_u64().map(i128::from))
    }

    match (integer(x), integer(y)) {
        (Some(a), Some(b)) => Some(a.cmp(&b)),
        _ => x.as_f64()?.partial_cmp(&y.as_f64()?),
    }
}

fn strings<'v>(a: &'v Value, b: &'v Value) -> Option<(&'v str, &'v str)> {
    Some((a.as_str()?, b.as_str()?))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn field(name: &str, operator: FilterSemantics, value: Operand) -> PredicateExpr {
        PredicateExpr::Field {
            field: name.into(),
            operator,
            value,
        }
    }

    #[test]
    fn test_compare_operators() {
        assert!(compare(&json!(3), FilterSemantics::Equals, &json!(3.0)));
        assert!(compare(&json!("b"), FilterSemantics::In, &json!(["a", "b"])));
        assert!(compare(&json!(2), FilterSemantics::LessThan, &json!(3)));
        assert!(compare(&json!(3), FilterSemantics::GreaterThanOrEqual, &json!(3)));
        assert!(compare(&json!("2024-01-02"), FilterSemantics::GreaterThan, &json!("2024-01-01")));
        assert!(compare(&json!("graphloom"), FilterSemantics::StartsWith, &json!("graph")));
        assert!(compare(&json!(["admin", "dev"]), FilterSemantics::Includes, &json!("dev")));
        assert!(!compare(&json!("3"), FilterSemantics::LessThan, &json!(4)));
        assert!(!compare(&json!(null), FilterSemantics::Contains, &json!("x")));
    }

    #[test]
    fn test_large_integers_compare_exactly() {
        let owner = field("ownerId", FilterSemantics::Equals, Operand::Claim("sub".into()));
        let claims = Claims::new(json!({"sub": 9_007_199_254_740_993_u64}));
        assert!(!owner.evaluate(&claims, &json!({"ownerId": 9_007_199_254_740_992_u64})));
        assert!(owner.evaluate(&claims, &json!({"ownerId": 9_007_199_254_740_993_u64})));

        assert!(compare(
            &json!(9_007_199_254_740_992_u64),
            FilterSemantics::LessThan,
            &json!(9_007_199_254_740_993_u64)
        ));
        assert!(compare(&json!(-1), FilterSemantics::LessThan, &json!(u64::MAX)));
        assert!(!compare(
            &json!(u64::MAX),
            FilterSemantics::In,
            &json!([u64::MAX - 1])
        ));
    }

    #[test]
    fn test_claim_operand() {
        let expr = field("userId", FilterSemantics::Equals, Operand::Claim("sub".into()));
        let claims = Claims::new(json!({"sub": "u1"}));
        assert!(expr.evaluate(&claims, &json!({"userId": "u1"})));
        assert!(!expr.evaluate(&claims, &json!({"userId": "u2"})));
    }

    #[test]
    fn test_missing_claim_is_false() {
        let expr = field("userId", FilterSemantics::Equals, Operand::Claim("sub".into()));
        assert!(!expr.evaluate(&Claims::new(json!({})), &json!({"userId": null})));
        assert!(!expr.evaluate(&Claims::anonymous(), &json!({})));

        let literal_null = field("deletedAt", FilterSemantics::Equals, Operand::Literal(json!(null)));
        assert!(literal_null.evaluate(&Claims::anonymous(), &json!({})));
    }

    #[test]
    fn test_quantifiers() {
        let is_admin = Box::new(field(
            "role",
            FilterSemantics::Equals,
            Operand::Literal(json!("admin")),
        ));
        let node = json!({
            "members": [{"role": "admin"}, {"role": "user"}],
            "owner": {"role": "admin"}
        });
        let claims = Claims::anonymous();
        let traverse = |field: &str, quantifier| PredicateExpr::Relationship {
            field: field.into(),
            quantifier,
            predicate: is_admin.clone(),
        };

        assert!(traverse("members", Quantifier::Some).evaluate(&claims, &node));
        assert!(traverse("members", Quantifier::Single).evaluate(&claims, &node));
        assert!(!traverse("members", Quantifier::All).evaluate(&claims, &node));
        assert!(!traverse("members", Quantifier::None).evaluate(&claims, &node));
        assert!(traverse("owner", Quantifier::One).evaluate(&claims, &node));
        assert!(!traverse("missing", Quantifier::One).evaluate(&claims, &node));
        assert!(traverse("missing", Quantifier::All).evaluate(&claims, &node));
    }

    #[test]
    fn test_multi_hop_traversal() {
        // post -> author -> organisation -> admins
        let expr = PredicateExpr::Relationship {
            field: "author".into(),
            quantifier: Quantifier::One,
            predicate: Box::new(PredicateExpr::Relationship {
                field: "organisation".into(),
                quantifier: Quantifier::One,
                predicate: Box::new(PredicateExpr::Relationship {
                    field: "admins".into(),
                    quantifier: Quantifier::Some,
                    predicate: Box::new(field(
                        "id",
                        FilterSemantics::Equals,
                        Operand::Claim("sub".into()),
                    )),
                }),
            }),
        };
        let post = json!({
            "author": {"organisation": {"admins": [{"id": "a1"}, {"id": "a2"}]}}
        });
        assert!(expr.evaluate(&Claims::new(json!({"sub": "a2"})), &post));
        assert!(!expr.evaluate(&Claims::new(json!({"sub": "a3"})), &post));
    }

    #[test]
    fn test_logical_combinators() {
        let claims = Claims::new(json!({"roles": ["admin"]}));
        let is_admin = PredicateExpr::Claim {
            path: "roles".into(),
            operator: FilterSemantics::Includes,
            value: Operand::Literal(json!("admin")),
        };
        let published = field("published", FilterSemantics::Equals, Operand::Literal(json!(true)));
        let expr = PredicateExpr::Or {
            any: vec![
                is_admin,
                PredicateExpr::Not {
                    expr: Box::new(published),
                },
            ],
        };
        assert!(expr.evaluate(&claims, &json!({"published": true})));
        assert!(expr.evaluate(&Claims::new(json!({})), &json!({"published": false})));
        assert!(PredicateExpr::all(Vec::new()).evaluate(&claims, &json!({})));
    }
}
