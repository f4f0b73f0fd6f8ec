//! Derived type definitions.
//!
//! Descriptors for every generated type. They stay inspectable after
//! generation; [`crate::sdl`] registers them into an
//! `async_graphql::dynamic` schema, which checks and prints them.

pub use async_graphql::dynamic::TypeRef;
use async_graphql_value::ConstValue;
use indexmap::IndexMap;
use tracing::trace;

use crate::model::FieldType;

/// Same shape as a declared field type.
#[must_use]
pub fn field_type_ref(ty: &FieldType) -> TypeRef {
    shaped(ty, &ty.name)
}

/// Shape of `ty` around a different named type.
#[must_use]
pub fn shaped(ty: &FieldType, name: &str) -> TypeRef {
    let base = match (ty.list, ty.item_required) {
        (true, true) => TypeRef::named_nn_list(name),
        (true, false) => TypeRef::named_list(name),
        (false, _) => TypeRef::named(name),
    };
    if ty.required { non_null(base) } else { base }
}

#[must_use]
pub fn non_null(ty: TypeRef) -> TypeRef {
    match ty {
        TypeRef::NonNull(_) => ty,
        other => TypeRef::NonNull(Box::new(other)),
    }
}

/// Strips an outer non-null wrapper.
#[must_use]
pub fn nullable(ty: TypeRef) -> TypeRef {
    match ty {
        TypeRef::NonNull(inner) => *inner,
        other => other,
    }
}

/// An argument or input object field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputValue {
    pub name: String,
    pub ty: TypeRef,
    pub description: Option<String>,
    pub default_value: Option<ConstValue>,
    pub deprecation: Option<String>,
}

impl InputValue {
    #[must_use]
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            description: None,
            default_value: None,
            deprecation: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    #[must_use]
    pub fn default_value(mut self, value: impl Into<ConstValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    #[must_use]
    pub fn deprecated(mut self, reason: impl Into<String>) -> Self {
        self.deprecation = Some(reason.into());
        self
    }
}

/// A field of an object or interface type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputField {
    pub name: String,
    pub ty: TypeRef,
    pub arguments: Vec<InputValue>,
    pub description: Option<String>,
    pub deprecation: Option<String>,
}

impl OutputField {
    #[must_use]
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            arguments: Vec::new(),
            description: None,
            deprecation: None,
        }
    }

    #[must_use]
    pub fn argument(mut self, argument: InputValue) -> Self {
        self.arguments.push(argument);
        self
    }

    #[must_use]
    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    #[must_use]
    pub fn deprecated(mut self, reason: impl Into<String>) -> Self {
        self.deprecation = Some(reason.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    pub name: String,
    pub description: Option<String>,
    pub deprecation: Option<String>,
}

impl EnumValue {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            deprecation: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDefinition {
    Object {
        implements: Vec<String>,
        fields: Vec<OutputField>,
    },
    Interface {
        implements: Vec<String>,
        fields: Vec<OutputField>,
    },
    InputObject {
        fields: Vec<InputValue>,
    },
    Enum {
        values: Vec<EnumValue>,
    },
    Union {
        members: Vec<String>,
    },
    Scalar,
}

/// Tag naming what a derived type is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DerivedTypeKind {
    // Shared
    Root,
    Common,
    Scalar,
    Enum,
    ScalarAggregateSelection,
    // Per entity
    Entity,
    Interface,
    Union,
    ImplementationEnum,
    Where,
    Sort,
    Options,
    CreateInput,
    UpdateInput,
    ConnectWhere,
    ConnectInput,
    DeleteInput,
    DisconnectInput,
    AggregateSelection,
    Edge,
    Connection,
    MutationResponse,
    // Per relationship properties type
    Properties,
    PropertiesCreateInput,
    PropertiesUpdateInput,
    PropertiesWhere,
    PropertiesSort,
    PropertiesAggregationWhereInput,
    // Per edge
    FieldInput,
    CreateFieldInput,
    ConnectFieldInput,
    UpdateFieldInput,
    UpdateConnectionInput,
    DeleteFieldInput,
    DisconnectFieldInput,
    Relationship,
    RelationshipConnection,
    ConnectionWhere,
    ConnectionSort,
    AggregateInput,
    NodeAggregationWhereInput,
    EdgeAggregationWhereInput,
    EdgeCreateInput,
    EdgeUpdateInput,
    EdgeWhere,
    EdgeSort,
    RelationshipProperties,
    AggregationSelection,
    NodeAggregateSelection,
    EdgeAggregateSelection,
    // Union-target member-keyed inputs
    UnionWhere,
    UnionCreateInput,
    UnionUpdateInput,
    UnionConnectInput,
    UnionDeleteInput,
    UnionDisconnectInput,
    UnionConnectionWhere,
    // Subscriptions
    EventType,
    EventPayload,
    SubscriptionWhere,
    Event,
}

/// One generated type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedType {
    pub name: String,
    pub kind: DerivedTypeKind,
    pub description: Option<String>,
    pub definition: TypeDefinition,
}

impl DerivedType {
    #[must_use]
    pub fn object(name: impl Into<String>, kind: DerivedTypeKind, fields: Vec<OutputField>) -> Self {
        Self::new(
            name,
            kind,
            TypeDefinition::Object {
                implements: Vec::new(),
                fields,
            },
        )
    }

    #[must_use]
    pub fn interface(name: impl Into<String>, fields: Vec<OutputField>) -> Self {
        Self::new(
            name,
            DerivedTypeKind::Interface,
            TypeDefinition::Interface {
                implements: Vec::new(),
                fields,
            },
        )
    }

    #[must_use]
    pub fn input(name: impl Into<String>, kind: DerivedTypeKind, fields: Vec<InputValue>) -> Self {
        Self::new(name, kind, TypeDefinition::InputObject { fields })
    }

    #[must_use]
    pub fn enumeration(
        name: impl Into<String>,
        kind: DerivedTypeKind,
        values: impl IntoIterator<Item = EnumValue>,
    ) -> Self {
        Self::new(
            name,
            kind,
            TypeDefinition::Enum {
                values: values.into_iter().collect(),
            },
        )
    }

    #[must_use]
    pub fn union(name: impl Into<String>, kind: DerivedTypeKind, members: Vec<String>) -> Self {
        Self::new(name, kind, TypeDefinition::Union { members })
    }

    #[must_use]
    pub fn scalar(name: impl Into<String>) -> Self {
        Self::new(name, DerivedTypeKind::Scalar, TypeDefinition::Scalar)
    }

    fn new(name: impl Into<String>, kind: DerivedTypeKind, definition: TypeDefinition) -> Self {
        Self {
            name: name.into(),
            kind,
            description: None,
            definition,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    #[must_use]
    pub fn with_implements(mut self, interfaces: Vec<String>) -> Self {
        match &mut self.definition {
            TypeDefinition::Object { implements, .. }
            | TypeDefinition::Interface { implements, .. } => *implements = interfaces,
            _ => {}
        }
        self
    }

    /// Names of fields, input fields, enum values or union members.
    #[must_use]
    pub fn member_names(&self) -> Vec<&str> {
        match &self.definition {
            TypeDefinition::Object { fields, .. } | TypeDefinition::Interface { fields, .. } => {
                fields.iter().map(|f| f.name.as_str()).collect()
            }
            TypeDefinition::InputObject { fields } => fields.iter().map(|f| f.name.as_str()).collect(),
            TypeDefinition::Enum { values } => values.iter().map(|v| v.name.as_str()).collect(),
            TypeDefinition::Union { members } => members.iter().map(String::as_str).collect(),
            TypeDefinition::Scalar => Vec::new(),
        }
    }

    #[must_use]
    pub fn output_field(&self, name: &str) -> Option<&OutputField> {
        match &self.definition {
            TypeDefinition::Object { fields, .. } | TypeDefinition::Interface { fields, .. } => {
                fields.iter().find(|f| f.name == name)
            }
            _ => None,
        }
    }

    #[must_use]
    pub fn input_field(&self, name: &str) -> Option<&InputValue> {
        match &self.definition {
            TypeDefinition::InputObject { fields } => fields.iter().find(|f| f.name == name),
            _ => None,
        }
    }

    /// Rendered type of a field or input field.
    #[must_use]
    pub fn field_type(&self, name: &str) -> Option<String> {
        self.output_field(name)
            .map(|f| f.ty.to_string())
            .or_else(|| self.input_field(name).map(|f| f.ty.to_string()))
    }
}

/// Registry of generated types, keyed by name.
///
/// Registration is idempotent: shared types such as `PageInfo` or
/// `StringAggregateSelection` are requested by many owners but kept once.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: IndexMap<String, DerivedType>,
}

impl TypeRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_known(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Registers a type unless one with the same name already exists.
    /// Returns true if the type was added.
    pub fn register(&mut self, ty: DerivedType) -> bool {
        if self.types.contains_key(&ty.name) {
            trace!(type_name = %ty.name, "Type already registered");
            return false;
        }
        trace!(type_name = %ty.name, kind = ?ty.kind, "Registered derived type");
        self.types.insert(ty.name.clone(), ty);
        true
    }

    #[must_use]
    pub fn generated_count(&self) -> usize {
        self.types.len()
    }

    #[must_use]
    pub fn into_schema(self) -> DerivedSchema {
        DerivedSchema { types: self.types }
    }
}

/// The complete derived type system, in generation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DerivedSchema {
    pub types: IndexMap<String, DerivedType>,
}

impl DerivedSchema {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&DerivedType> {
        self.types.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn of_kind(&self, kind: DerivedTypeKind) -> impl Iterator<Item = &DerivedType> {
        self.types.values().filter(move |t| t.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shaped_from_field_type() {
        let ty = FieldType::list_of("Actor", true, true);
        assert_eq!(field_type_ref(&ty).to_string(), "[Actor!]!");
        assert_eq!(shaped(&ty, "Person").type_name(), "Person");
        assert_eq!(nullable(field_type_ref(&ty)).to_string(), "[Actor!]");
        assert_eq!(non_null(TypeRef::named_nn("Int")).to_string(), "Int!");
    }

    #[test]
    fn test_registry_is_idempotent() {
        let mut registry = TypeRegistry::new();
        let page_info = DerivedType::object(
            "PageInfo",
            DerivedTypeKind::Common,
            vec![OutputField::new("hasNextPage", TypeRef::named_nn("Boolean"))],
        );
        assert!(registry.register(page_info.clone()));
        assert!(!registry.register(page_info));
        assert_eq!(registry.generated_count(), 1);
        assert!(registry.is_known("PageInfo"));
    }
}
