//! Internal entity graph.
//!
//! The Type Model Builder turns type definitions into an [`EntityGraph`]:
//! entities, their classified fields, relationship declarations, property
//! bags, unions, enums and the optional claims shape. The graph is immutable
//! once built; later stages only read it.

pub mod builder;
pub mod directives;

use std::collections::HashSet;
use std::fmt;

use async_graphql_value::ConstValue;
use indexmap::IndexMap;
use serde::Serialize;

use crate::augment::naming;
use crate::error::Location;

pub use builder::{TypeModelBuilder, build_entity_graph, parse_type_defs};

/// Built-in scalar type names understood without a `scalar` declaration.
pub const BUILTIN_SCALARS: &[&str] = &[
    "ID",
    "String",
    "Int",
    "Float",
    "BigInt",
    "Boolean",
    "DateTime",
    "Date",
    "Time",
    "LocalTime",
    "LocalDateTime",
    "Duration",
];

// ============================================================================
// Scalars
// ============================================================================

/// Declared kind of a scalar-valued field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Id,
    String,
    Int,
    Float,
    BigInt,
    Boolean,
    DateTime,
    Date,
    Time,
    LocalTime,
    LocalDateTime,
    Duration,
    /// A declared `enum` type.
    Enum(String),
    /// A declared custom `scalar` type.
    Custom(String),
}

impl ScalarKind {
    /// Resolves a built-in scalar type name.
    #[must_use]
    pub fn builtin(name: &str) -> Option<Self> {
        let kind = match name {
            "ID" => Self::Id,
            "String" => Self::String,
            "Int" => Self::Int,
            "Float" => Self::Float,
            "BigInt" => Self::BigInt,
            "Boolean" => Self::Boolean,
            "DateTime" => Self::DateTime,
            "Date" => Self::Date,
            "Time" => Self::Time,
            "LocalTime" => Self::LocalTime,
            "LocalDateTime" => Self::LocalDateTime,
            "Duration" => Self::Duration,
            _ => return None,
        };
        Some(kind)
    }

    /// The GraphQL type name of this kind.
    #[must_use]
    pub fn type_name(&self) -> &str {
        match self {
            Self::Id => "ID",
            Self::String => "String",
            Self::Int => "Int",
            Self::Float => "Float",
            Self::BigInt => "BigInt",
            Self::Boolean => "Boolean",
            Self::DateTime => "DateTime",
            Self::Date => "Date",
            Self::Time => "Time",
            Self::LocalTime => "LocalTime",
            Self::LocalDateTime => "LocalDateTime",
            Self::Duration => "Duration",
            Self::Enum(name) | Self::Custom(name) => name,
        }
    }

    #[must_use]
    pub fn category(&self) -> ScalarCategory {
        match self {
            Self::Id => ScalarCategory::Identifier,
            Self::String => ScalarCategory::StringLike,
            Self::Int => ScalarCategory::Integer,
            Self::Float => ScalarCategory::Float,
            Self::BigInt => ScalarCategory::BigInteger,
            Self::Boolean => ScalarCategory::Boolean,
            Self::DateTime
            | Self::Date
            | Self::Time
            | Self::LocalTime
            | Self::LocalDateTime
            | Self::Duration => ScalarCategory::Temporal,
            Self::Enum(_) => ScalarCategory::Enum,
            Self::Custom(_) => ScalarCategory::Custom,
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Classification that drives every filter, sort, update and aggregate
/// derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarCategory {
    Identifier,
    StringLike,
    Integer,
    Float,
    BigInteger,
    Temporal,
    Boolean,
    Enum,
    Custom,
}

impl ScalarCategory {
    #[must_use]
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Float | Self::BigInteger)
    }

    /// Supports `_LT`/`_LTE`/`_GT`/`_GTE`.
    #[must_use]
    pub fn is_ordered(self) -> bool {
        matches!(
            self,
            Self::Identifier
                | Self::StringLike
                | Self::Integer
                | Self::Float
                | Self::BigInteger
                | Self::Temporal
        )
    }

    /// Supports `_CONTAINS`/`_STARTS_WITH`/`_ENDS_WITH`.
    #[must_use]
    pub fn is_textual(self) -> bool {
        matches!(self, Self::Identifier | Self::StringLike)
    }

    /// Participates in aggregate selections.
    #[must_use]
    pub fn is_aggregatable(self) -> bool {
        self.is_ordered()
    }
}

// ============================================================================
// Fields
// ============================================================================

/// Declared shape of a field type. Nested lists are rejected by the builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldType {
    /// Innermost named type.
    pub name: String,
    pub list: bool,
    /// Outer non-null marker.
    pub required: bool,
    /// Non-null marker on list items. Always false for non-list types.
    pub item_required: bool,
}

impl FieldType {
    #[must_use]
    pub fn named(name: impl Into<String>, required: bool) -> Self {
        Self {
            name: name.into(),
            list: false,
            required,
            item_required: false,
        }
    }

    #[must_use]
    pub fn list_of(name: impl Into<String>, required: bool, item_required: bool) -> Self {
        Self {
            name: name.into(),
            list: true,
            required,
            item_required,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.list {
            write!(f, "[{}", self.name)?;
            if self.item_required {
                f.write_str("!")?;
            }
            f.write_str("]")?;
        } else {
            f.write_str(&self.name)?;
        }
        if self.required {
            f.write_str("!")?;
        }
        Ok(())
    }
}

/// Relationship direction relative to the declaring entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Out,
    In,
    Undirected,
}

impl Direction {
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "OUT" => Some(Self::Out),
            "IN" => Some(Self::In),
            "UNDIRECTED" => Some(Self::Undirected),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Out => "OUT",
            Self::In => "IN",
            Self::Undirected => "UNDIRECTED",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    One,
    Many,
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::One => "to-one",
            Self::Many => "to-many",
        })
    }
}

/// Nested write operations enabled on a relationship field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NestedOperations {
    pub create: bool,
    pub connect: bool,
    pub update: bool,
    pub delete: bool,
    pub disconnect: bool,
}

impl NestedOperations {
    #[must_use]
    pub fn all() -> Self {
        Self {
            create: true,
            connect: true,
            update: true,
            delete: true,
            disconnect: true,
        }
    }

    #[must_use]
    pub fn none() -> Self {
        Self {
            create: false,
            connect: false,
            update: false,
            delete: false,
            disconnect: false,
        }
    }

    /// Enables the operation named `name`. Returns false for unknown names.
    pub fn enable(&mut self, name: &str) -> bool {
        match name {
            "CREATE" => self.create = true,
            "CONNECT" => self.connect = true,
            "UPDATE" => self.update = true,
            "DELETE" => self.delete = true,
            "DISCONNECT" => self.disconnect = true,
            _ => return false,
        }
        true
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        !(self.create || self.connect || self.update || self.delete || self.disconnect)
    }
}

impl Default for NestedOperations {
    fn default() -> Self {
        Self::all()
    }
}

/// How a relationship field is bound to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationshipBinding {
    /// `@relationship` on an object field.
    Concrete {
        native_type: String,
        direction: Direction,
        properties: Option<String>,
    },
    /// `@declareRelationship` on an interface field; implementers bind it.
    DeclaredOnly,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipDeclaration {
    /// Entity, interface or union on the far side.
    pub target: String,
    pub binding: RelationshipBinding,
    pub nested_operations: NestedOperations,
}

impl RelationshipDeclaration {
    #[must_use]
    pub fn is_declared_only(&self) -> bool {
        matches!(self.binding, RelationshipBinding::DeclaredOnly)
    }

    #[must_use]
    pub fn properties(&self) -> Option<&str> {
        match &self.binding {
            RelationshipBinding::Concrete { properties, .. } => properties.as_deref(),
            RelationshipBinding::DeclaredOnly => None,
        }
    }
}

/// Operations that trigger a `@populatedBy` callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CallbackOperation {
    Create,
    Update,
}

/// The single role a field plays, resolved once from its directives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRole {
    Scalar,
    RelationshipRef(RelationshipDeclaration),
    ComputedByCallback {
        callback: String,
        operations: Vec<CallbackOperation>,
    },
    GeneratedId,
    UniqueConstraint {
        constraint_name: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: FieldType,
    /// Cached classification. `None` for relationship fields.
    pub scalar: Option<ScalarKind>,
    pub role: FieldRole,
    pub default_value: Option<ConstValue>,
    pub description: Option<String>,
    pub location: Location,
}

impl Field {
    #[must_use]
    pub fn relationship(&self) -> Option<&RelationshipDeclaration> {
        match &self.role {
            FieldRole::RelationshipRef(decl) => Some(decl),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_relationship(&self) -> bool {
        self.relationship().is_some()
    }

    #[must_use]
    pub fn category(&self) -> Option<ScalarCategory> {
        self.scalar.as_ref().map(ScalarKind::category)
    }

    #[must_use]
    pub fn cardinality(&self) -> Cardinality {
        if self.ty.list {
            Cardinality::Many
        } else {
            Cardinality::One
        }
    }

    #[must_use]
    pub fn is_generated(&self) -> bool {
        matches!(self.role, FieldRole::GeneratedId)
    }

    /// True when the callback (or id generation) owns the value for `operation`.
    #[must_use]
    pub fn is_populated_on(&self, operation: CallbackOperation) -> bool {
        match &self.role {
            FieldRole::GeneratedId => true,
            FieldRole::ComputedByCallback { operations, .. } => operations.contains(&operation),
            _ => false,
        }
    }
}

// ============================================================================
// Entities
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Node,
    Interface,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueConstraint {
    pub field: String,
    pub name: String,
}

/// Raw `@authorization` arguments, compiled by the authorization crate.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorizationAnnotation {
    pub validate: Option<serde_json::Value>,
    pub filter: Option<serde_json::Value>,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub name: String,
    pub kind: EntityKind,
    pub fields: Vec<Field>,
    /// Directly implemented interfaces, in declaration order.
    pub implements: Vec<String>,
    pub labels: Vec<String>,
    pub plural: Option<String>,
    pub unique_constraints: Vec<UniqueConstraint>,
    pub union_memberships: Vec<String>,
    pub authorization: Option<AuthorizationAnnotation>,
    pub description: Option<String>,
    pub location: Location,
}

impl Entity {
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.kind == EntityKind::Interface
    }

    #[must_use]
    pub fn is_union_member(&self) -> bool {
        !self.union_memberships.is_empty()
    }

    pub fn scalar_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| !f.is_relationship())
    }

    pub fn relationship_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.is_relationship())
    }

    /// Plural stem used for root fields: `@plural` or the pluralised name.
    #[must_use]
    pub fn plural_name(&self) -> String {
        match &self.plural {
            Some(plural) => naming::upper_first(plural),
            None => naming::pluralize(&self.name),
        }
    }
}

/// A `@relationshipProperties` type.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertiesType {
    pub name: String,
    pub fields: Vec<Field>,
    pub description: Option<String>,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnionType {
    pub name: String,
    pub members: Vec<String>,
    pub description: Option<String>,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    pub name: String,
    pub values: Vec<String>,
    pub description: Option<String>,
}

/// One field of the `@jwt` type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimField {
    pub name: String,
    /// Dotted path into the raw claims; the field name unless `@jwtClaim` is set.
    pub path: String,
    pub kind: ScalarKind,
    pub list: bool,
}

/// Declared shape of the request claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimsShape {
    pub type_name: String,
    pub fields: Vec<ClaimField>,
}

impl ClaimsShape {
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&ClaimField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

// ============================================================================
// Graph
// ============================================================================

/// The entity graph produced by the Type Model Builder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityGraph {
    /// Nodes and interfaces, in declaration order.
    pub entities: IndexMap<String, Entity>,
    pub properties: IndexMap<String, PropertiesType>,
    pub unions: IndexMap<String, UnionType>,
    pub enums: IndexMap<String, EnumType>,
    /// Declared custom scalars.
    pub scalars: Vec<String>,
    pub claims: Option<ClaimsShape>,
}

impl EntityGraph {
    #[must_use]
    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.get(name)
    }

    /// Concrete entities in declaration order.
    pub fn nodes(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values().filter(|e| !e.is_interface())
    }

    pub fn interfaces(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values().filter(|e| e.is_interface())
    }

    #[must_use]
    pub fn is_node(&self, name: &str) -> bool {
        self.entity(name).is_some_and(|e| !e.is_interface())
    }

    #[must_use]
    pub fn is_interface(&self, name: &str) -> bool {
        self.entity(name).is_some_and(Entity::is_interface)
    }

    /// All interfaces `name` implements, transitively, nearest first.
    #[must_use]
    pub fn ancestors_of(&self, name: &str) -> Vec<&str> {
        let mut result: Vec<&str> = Vec::new();
        let mut seen = HashSet::new();
        seen.insert(name);
        let mut frontier: Vec<&str> = vec![name];

        while !frontier.is_empty() {
            let mut next = Vec::new();
            for current in frontier {
                let Some(entity) = self.entity(current) else {
                    continue;
                };
                for parent in &entity.implements {
                    if seen.insert(parent.as_str()) && self.is_interface(parent) {
                        result.push(parent.as_str());
                        next.push(parent.as_str());
                    }
                }
            }
            frontier = next;
        }
        result
    }

    /// True if `name` is `interface` or implements it transitively.
    #[must_use]
    pub fn is_subtype_of(&self, name: &str, interface: &str) -> bool {
        name == interface || self.ancestors_of(name).contains(&interface)
    }

    /// Concrete entities implementing `interface` transitively, in
    /// declaration order.
    #[must_use]
    pub fn implementers_of(&self, interface: &str) -> Vec<&Entity> {
        self.nodes()
            .filter(|e| self.ancestors_of(&e.name).contains(&interface))
            .collect()
    }

    /// Entities (nodes or interfaces) that list `interface` directly.
    #[must_use]
    pub fn direct_implementers_of(&self, interface: &str) -> Vec<&Entity> {
        self.entities
            .values()
            .filter(|e| e.implements.iter().any(|i| i == interface))
            .collect()
    }

    /// Kind of a scalar-valued type name, if it is one.
    #[must_use]
    pub fn scalar_kind(&self, type_name: &str) -> Option<ScalarKind> {
        if let Some(kind) = ScalarKind::builtin(type_name) {
            return Some(kind);
        }
        if self.enums.contains_key(type_name) {
            return Some(ScalarKind::Enum(type_name.to_string()));
        }
        if self.scalars.iter().any(|s| s == type_name) {
            return Some(ScalarKind::Custom(type_name.to_string()));
        }
        None
    }
}
