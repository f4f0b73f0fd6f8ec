//! Error types for schema builds.
//!
//! Build-time errors are never reported one at a time. Every stage collects
//! the [`ValidationIssue`]s it finds across the whole type model and the build
//! fails once with a single [`SchemaValidationError`] listing all of them.

use std::fmt;

use async_graphql_parser::Pos;

/// Source position of a declaration in the type definitions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Location {
    /// 1-based line.
    pub line: usize,
    /// 1-based column.
    pub column: usize,
}

impl From<Pos> for Location {
    fn from(pos: Pos) -> Self {
        Self {
            line: pos.line,
            column: pos.column,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Errors returned by a schema build.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// The type definitions are not syntactically valid SDL.
    #[error("Failed to parse type definitions: {0}")]
    Parse(String),

    /// The type definitions parsed but violate one or more rules.
    #[error(transparent)]
    Validation(#[from] SchemaValidationError),

    #[error("Invalid build options: {0}")]
    Options(String),

    /// The derived types do not form a valid GraphQL type system.
    #[error("Derived schema is invalid: {0}")]
    Derived(#[from] async_graphql::dynamic::SchemaError),
}

impl SchemaError {
    /// Returns the aggregated validation issues, if this is a validation error.
    #[must_use]
    pub fn issues(&self) -> &[ValidationIssue] {
        match self {
            Self::Parse(_) | Self::Options(_) | Self::Derived(_) => &[],
            Self::Validation(err) => &err.issues,
        }
    }
}

/// All violations found in one build, in discovery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl SchemaValidationError {
    #[must_use]
    pub fn new(issues: Vec<ValidationIssue>) -> Self {
        Self { issues }
    }

    /// Converts a list of issues into a result: `Ok(())` when empty.
    ///
    /// # Errors
    ///
    /// Returns the aggregated error when `issues` is non-empty.
    pub fn check(issues: Vec<ValidationIssue>) -> Result<(), Self> {
        if issues.is_empty() {
            Ok(())
        } else {
            Err(Self::new(issues))
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }
}

impl fmt::Display for SchemaValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Schema validation failed with {} issue(s):",
            self.issues.len()
        )?;
        for issue in &self.issues {
            write!(f, "\n  - {issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for SchemaValidationError {}

/// A single build-time violation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationIssue {
    #[error("{location}: type `{type_name}` is declared more than once")]
    DuplicateType {
        type_name: String,
        location: Location,
    },

    #[error("{location}: `{type_name}` is a reserved type name")]
    ReservedTypeName {
        type_name: String,
        location: Location,
    },

    #[error("type definitions must declare at least one entity type")]
    NoEntities,

    #[error("{location}: type `{type_name}`: {message}")]
    InvalidType {
        type_name: String,
        message: String,
        location: Location,
    },

    #[error("{location}: field `{owner}.{field}` has unknown type `{type_name}`")]
    UnknownFieldType {
        owner: String,
        field: String,
        type_name: String,
        location: Location,
    },

    #[error("{location}: field `{owner}.{field}`: {message}")]
    InvalidField {
        owner: String,
        field: String,
        message: String,
        location: Location,
    },

    #[error("{location}: @{directive} on `{owner}.{field}`: {message}")]
    InvalidDirective {
        directive: String,
        owner: String,
        field: String,
        message: String,
        location: Location,
    },

    #[error(transparent)]
    Relationship(#[from] RelationshipResolutionError),

    #[error("{location}: @authorization on `{type_name}`: {message}")]
    Authorization {
        type_name: String,
        message: String,
        location: Location,
    },
}

/// Violations found while resolving relationship fields into edges.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelationshipResolutionError {
    #[error(
        "relationship `{interface}.{field}` is declared but `{implementer}` does not provide a concrete @relationship field `{field}`"
    )]
    MissingImplementation {
        interface: String,
        field: String,
        implementer: String,
    },

    #[error(
        "relationship `{interface}.{field}` is implemented inconsistently ({detail}) by: {}",
        .implementers.join(", ")
    )]
    ConflictingImplementations {
        interface: String,
        field: String,
        detail: String,
        implementers: Vec<String>,
    },

    #[error(
        "relationship `{interface}.{field}` targets `{expected}` but `{implementer}.{field}` targets incompatible type `{found}`"
    )]
    IncompatibleTarget {
        interface: String,
        field: String,
        implementer: String,
        expected: String,
        found: String,
    },

    #[error(
        "relationship `{interface}.{field}` is {expected} but `{implementer}.{field}` is {found}"
    )]
    CardinalityMismatch {
        interface: String,
        field: String,
        implementer: String,
        expected: String,
        found: String,
    },

    #[error("relationship `{interface}.{field}` is declared but `{interface}` has no implementations")]
    NoImplementations { interface: String, field: String },

    #[error(
        "field `{type_name}.{field}` is declared as a relationship by unrelated interfaces: {}",
        .interfaces.join(", ")
    )]
    AmbiguousDeclaration {
        type_name: String,
        field: String,
        interfaces: Vec<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(field: &str) -> ValidationIssue {
        ValidationIssue::InvalidField {
            owner: "Movie".into(),
            field: field.into(),
            message: "is broken".into(),
            location: Location { line: 3, column: 5 },
        }
    }

    #[test]
    fn test_display_lists_every_issue() {
        let err = SchemaValidationError::new(vec![issue("a"), issue("b")]);
        let text = err.to_string();

        assert!(text.contains("2 issue(s)"));
        assert!(text.contains("`Movie.a`"));
        assert!(text.contains("`Movie.b`"));
        assert!(text.contains("3:5"));
    }

    #[test]
    fn test_check_empty_is_ok() {
        assert!(SchemaValidationError::check(Vec::new()).is_ok());
        assert_eq!(
            SchemaValidationError::check(vec![issue("a")]).unwrap_err().len(),
            1
        );
    }

    #[test]
    fn test_relationship_error_is_validation_issue() {
        let issue: ValidationIssue = RelationshipResolutionError::ConflictingImplementations {
            interface: "Production".into(),
            field: "actors".into(),
            detail: "relationship types ACTED_IN, STARRED_IN".into(),
            implementers: vec!["Movie".into(), "Series".into()],
        }
        .into();

        let text = issue.to_string();
        assert!(text.contains("Production.actors"));
        assert!(text.contains("Movie, Series"));
    }

    #[test]
    fn test_schema_error_issues() {
        let err = SchemaError::from(SchemaValidationError::new(vec![issue("a")]));
        assert_eq!(err.issues().len(), 1);
        assert!(SchemaError::Parse("bad".into()).issues().is_empty());
    }
}
