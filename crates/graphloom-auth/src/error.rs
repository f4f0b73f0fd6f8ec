//! Request-time errors.
//!
//! Denials never escape the request as a process fault: every variant
//! extends into an [`async_graphql::Error`] with a `code` extension so the
//! execution layer can place it in the response `errors` array.

use async_graphql::{ErrorExtensions, Pos, ServerError};

use crate::operation::AuthorizationOperation;

/// An operation rejected by an authorization rule.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Forbidden: {operation} on `{entity}` rejected by {rule} declared on `{declared_on}`")]
pub struct AuthorizationDenied {
    pub entity: String,
    pub operation: AuthorizationOperation,
    /// Rule label such as `validate[0]`.
    pub rule: String,
    pub declared_on: String,
}

/// A `@populatedBy` callback failed in the execution layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Callback `{callback}` failed: {message}")]
pub struct CallbackInvocationError {
    pub callback: String,
    pub message: String,
}

/// Errors surfaced to a single request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error(transparent)]
    Denied(#[from] AuthorizationDenied),

    #[error("Unauthenticated: {operation} on `{entity}` requires an authenticated request")]
    Unauthenticated {
        entity: String,
        operation: AuthorizationOperation,
    },

    #[error(transparent)]
    Callback(#[from] CallbackInvocationError),

    /// Mutation input that does not match the derived input types.
    #[error("Invalid input at `{path}`: {message}")]
    InvalidInput { path: String, message: String },
}

impl RequestError {
    /// Returns the error code for GraphQL error extensions.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Denied(_) => "FORBIDDEN",
            Self::Unauthenticated { .. } => "UNAUTHENTICATED",
            Self::Callback(_) => "CALLBACK_FAILED",
            Self::InvalidInput { .. } => "BAD_USER_INPUT",
        }
    }

    #[must_use]
    pub fn is_denied(&self) -> bool {
        matches!(self, Self::Denied(_))
    }

    /// Error entry for the response `errors` array at `pos`.
    #[must_use]
    pub fn to_server_error(&self, pos: Pos) -> ServerError {
        self.extend().into_server_error(pos)
    }
}

impl ErrorExtensions for RequestError {
    fn extend(&self) -> async_graphql::Error {
        let code = self.error_code();
        let entity = match self {
            Self::Denied(denied) => Some(denied.entity.clone()),
            Self::Unauthenticated { entity, .. } => Some(entity.clone()),
            Self::Callback(_) | Self::InvalidInput { .. } => None,
        };
        async_graphql::Error::new(self.to_string()).extend_with(|_, e| {
            e.set("code", code.to_string());
            if let Some(entity) = &entity {
                e.set("entity", entity.clone());
            }
        })
    }
}
