//! Graphloom authorization.
//!
//! Compiles the `@authorization` directives captured in an
//! [`EntityGraph`](graphloom_schema::EntityGraph) into a [`RuleSet`] and
//! evaluates it per request:
//!
//! - `validate` rules gate an operation and fail it with a `Forbidden`
//!   [`RequestError`] when any applicable rule does not hold.
//! - `filter` rules silently drop nodes the caller may not see.
//!
//! Rules declared on an interface also apply to every implementer; all
//! applicable rules must hold.
//!
//! # Example
//!
//! ```ignore
//! let (rules, issues) = graphloom_auth::compile_rules(&graph);
//! let claims = Claims::new(serde_json::json!({ "sub": "u1" }));
//! rules.authorize("User", AuthorizationOperation::Read, ValidateWhen::After, &claims, &node)?;
//! ```

pub mod claims;
pub mod compiler;
pub mod error;
pub mod operation;
pub mod predicate;
pub mod rules;

pub use claims::Claims;
pub use compiler::RuleCompiler;
pub use error::{AuthorizationDenied, CallbackInvocationError, RequestError};
pub use operation::{AuthorizationOperation, RuleKind, ValidateWhen};
pub use predicate::{Operand, PredicateExpr, Quantifier};
pub use rules::{AuthorizationRule, RuleSet, evaluate};

use graphloom_schema::{EntityGraph, ValidationIssue};

/// Compiles every `@authorization` directive in `graph`.
///
/// Problems are returned as validation issues rather than failing, so the
/// caller can report them together with the rest of the schema build.
#[must_use]
pub fn compile_rules(graph: &EntityGraph) -> (RuleSet, Vec<ValidationIssue>) {
    RuleCompiler::new(graph).compile()
}
