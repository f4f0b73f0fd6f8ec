//! Operations, rule kinds and validation timing.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An operation an authorization rule can gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthorizationOperation {
    Read,
    Aggregate,
    Create,
    Update,
    Delete,
    /// Connecting an existing node, including nested connects during a create.
    CreateRelationship,
    /// Disconnecting a node, including nested disconnects during an update.
    DeleteRelationship,
    Subscribe,
}

impl AuthorizationOperation {
    pub const ALL: [Self; 8] = [
        Self::Read,
        Self::Aggregate,
        Self::Create,
        Self::Update,
        Self::Delete,
        Self::CreateRelationship,
        Self::DeleteRelationship,
        Self::Subscribe,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Read => "READ",
            Self::Aggregate => "AGGREGATE",
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::CreateRelationship => "CREATE_RELATIONSHIP",
            Self::DeleteRelationship => "DELETE_RELATIONSHIP",
            Self::Subscribe => "SUBSCRIBE",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == value)
    }
}

impl fmt::Display for AuthorizationOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AuthorizationOperation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(&s.to_ascii_uppercase()).ok_or_else(|| format!("unknown operation `{s}`"))
    }
}

/// `validate` rules reject an operation; `filter` rules hide nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    Validate,
    Filter,
}

impl RuleKind {
    /// Operations a rule of this kind covers when `operations` is omitted.
    #[must_use]
    pub fn default_operations(self) -> Vec<AuthorizationOperation> {
        use AuthorizationOperation as Op;
        match self {
            Self::Validate => vec![
                Op::Read,
                Op::Aggregate,
                Op::Create,
                Op::Update,
                Op::Delete,
                Op::CreateRelationship,
                Op::DeleteRelationship,
            ],
            Self::Filter => vec![
                Op::Read,
                Op::Aggregate,
                Op::Update,
                Op::Delete,
                Op::CreateRelationship,
                Op::DeleteRelationship,
                Op::Subscribe,
            ],
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validate => "validate",
            Self::Filter => "filter",
        }
    }
}

/// When a `validate` rule is checked relative to the operation.
///
/// The compiler only records the hint; the execution layer decides how to
/// apply it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidateWhen {
    /// Against the stored node before the operation runs.
    Before,
    /// Against the resulting node, before the transaction commits.
    After,
}

impl ValidateWhen {
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "BEFORE" => Some(Self::Before),
            "AFTER" => Some(Self::After),
            _ => None,
        }
    }
}
