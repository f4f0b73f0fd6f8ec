//! Type Model Builder.
//!
//! Turns parsed type definitions into an [`EntityGraph`]. Every problem is
//! recorded as a [`ValidationIssue`] and the offending declaration is dropped,
//! so one pass reports everything that is wrong with the input.

use std::collections::HashSet;

use async_graphql_parser::types::{
    BaseType, ConstDirective, FieldDefinition, ServiceDocument, Type, TypeKind,
    TypeSystemDefinition,
};
use async_graphql_parser::{Positioned, parse_schema};
use async_graphql_value::ConstValue;
use indexmap::IndexMap;
use tracing::{debug, trace};

use super::directives::{
    DirectiveProblem, FieldDirectives, extract_field_directives, extract_type_directives, names,
};
use super::{
    AuthorizationAnnotation, ClaimField, ClaimsShape, Entity, EntityGraph,
    EntityKind, EnumType, Field, FieldRole, FieldType, PropertiesType, RelationshipBinding,
    RelationshipDeclaration, ScalarCategory, ScalarKind, UnionType, UniqueConstraint,
};
use crate::config::BuildOptions;
use crate::error::{Location, SchemaError, SchemaValidationError, ValidationIssue};

/// Root operation type names users may not declare.
pub const RESERVED_TYPE_NAMES: &[&str] = &["Query", "Mutation", "Subscription"];

/// Parses SDL type definitions.
///
/// # Errors
///
/// Returns [`SchemaError::Parse`] if the input is not valid SDL.
pub fn parse_type_defs(type_defs: &str) -> Result<ServiceDocument, SchemaError> {
    parse_schema(type_defs).map_err(|e| SchemaError::Parse(e.to_string()))
}

/// Parses and builds the entity graph in one step.
///
/// # Errors
///
/// Returns a parse error, or a validation error listing every issue found.
pub fn build_entity_graph(
    type_defs: &str,
    options: &BuildOptions,
) -> Result<EntityGraph, SchemaError> {
    let document = parse_type_defs(type_defs)?;
    let (graph, issues) = TypeModelBuilder::new(options).build(&document);
    SchemaValidationError::check(issues)?;
    Ok(graph)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeclKind {
    Object,
    Interface,
    Union,
    Enum,
    Scalar,
    Input,
}

impl DeclKind {
    fn of(kind: &TypeKind) -> Self {
        match kind {
            TypeKind::Scalar => Self::Scalar,
            TypeKind::Object(_) => Self::Object,
            TypeKind::Interface(_) => Self::Interface,
            TypeKind::Union(_) => Self::Union,
            TypeKind::Enum(_) => Self::Enum,
            TypeKind::InputObject(_) => Self::Input,
        }
    }
}

/// A type declaration with all its `extend` blocks merged in.
#[derive(Debug, Clone)]
struct Declaration {
    name: String,
    kind: DeclKind,
    description: Option<String>,
    directives: Vec<Positioned<ConstDirective>>,
    fields: Vec<Positioned<FieldDefinition>>,
    implements: Vec<String>,
    members: Vec<(String, Location)>,
    values: Vec<String>,
    location: Location,
}

impl Declaration {
    fn merge(&mut self, kind: &TypeKind, directives: &[Positioned<ConstDirective>]) {
        self.directives.extend(directives.iter().cloned());
        match kind {
            TypeKind::Object(object) => {
                self.fields.extend(object.fields.iter().cloned());
                self.add_implements(object.implements.iter().map(|n| n.node.to_string()));
            }
            TypeKind::Interface(interface) => {
                self.fields.extend(interface.fields.iter().cloned());
                self.add_implements(interface.implements.iter().map(|n| n.node.to_string()));
            }
            TypeKind::Union(union) => {
                self.members.extend(
                    union
                        .members
                        .iter()
                        .map(|m| (m.node.to_string(), Location::from(m.pos))),
                );
            }
            TypeKind::Enum(enum_type) => {
                self.values
                    .extend(enum_type.values.iter().map(|v| v.node.value.node.to_string()));
            }
            TypeKind::Scalar | TypeKind::InputObject(_) => {}
        }
    }

    fn add_implements(&mut self, names: impl Iterator<Item = String>) {
        for name in names {
            if !self.implements.contains(&name) {
                self.implements.push(name);
            }
        }
    }
}

/// Where a field is declared; decides which directives are legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Owner {
    Node,
    Interface,
    Properties,
    Claims,
}

/// Builds an [`EntityGraph`] from a parsed document.
pub struct TypeModelBuilder<'a> {
    options: &'a BuildOptions,
    graph: EntityGraph,
    issues: Vec<ValidationIssue>,
}

impl<'a> TypeModelBuilder<'a> {
    #[must_use]
    pub fn new(options: &'a BuildOptions) -> Self {
        Self {
            options,
            graph: EntityGraph::default(),
            issues: Vec::new(),
        }
    }

    /// Builds the graph, returning it together with every issue found.
    ///
    /// The graph only contains declarations that passed validation, so it
    /// can still be inspected by later stages to surface their own issues.
    #[must_use]
    pub fn build(mut self, document: &ServiceDocument) -> (EntityGraph, Vec<ValidationIssue>) {
        debug!(
            definitions = document.definitions.len(),
            "Building entity graph"
        );

        let declarations = self.collect_declarations(document);
        self.register_leaf_types(&declarations);
        let claims_type = self.register_composite_types(&declarations);
        self.register_unions(&declarations);

        for decl in declarations.values() {
            match decl.kind {
                DeclKind::Object | DeclKind::Interface => self.populate_entity(decl),
                _ => {}
            }
        }
        for decl in declarations.values() {
            if self.graph.properties.contains_key(&decl.name) {
                self.populate_properties(decl);
            }
        }
        if let Some(name) = claims_type
            && let Some(decl) = declarations.get(&name)
        {
            self.populate_claims(decl);
        }

        self.check_implements();
        self.inherit_interface_fields();
        self.check_inherited_scalars();

        if self.graph.nodes().next().is_none() {
            self.issues.push(ValidationIssue::NoEntities);
        }

        debug!(
            entities = self.graph.entities.len(),
            properties = self.graph.properties.len(),
            unions = self.graph.unions.len(),
            issues = self.issues.len(),
            "Entity graph built"
        );

        (self.graph, self.issues)
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    fn collect_declarations(&mut self, document: &ServiceDocument) -> IndexMap<String, Declaration> {
        let mut declarations: IndexMap<String, Declaration> = IndexMap::new();
        let mut extensions = Vec::new();

        for definition in &document.definitions {
            let TypeSystemDefinition::Type(def) = definition else {
                trace!("Skipping non-type definition");
                continue;
            };
            let name = def.node.name.node.to_string();
            let location = Location::from(def.pos);

            if RESERVED_TYPE_NAMES.contains(&name.as_str()) {
                self.issues.push(ValidationIssue::ReservedTypeName {
                    type_name: name,
                    location,
                });
                continue;
            }
            if def.node.extend {
                extensions.push(def);
                continue;
            }
            if declarations.contains_key(&name) {
                self.issues.push(ValidationIssue::DuplicateType {
                    type_name: name,
                    location,
                });
                continue;
            }

            let mut decl = Declaration {
                name: name.clone(),
                kind: DeclKind::of(&def.node.kind),
                description: def.node.description.as_ref().map(|d| d.node.clone()),
                directives: Vec::new(),
                fields: Vec::new(),
                implements: Vec::new(),
                members: Vec::new(),
                values: Vec::new(),
                location,
            };
            decl.merge(&def.node.kind, &def.node.directives);
            declarations.insert(name, decl);
        }

        for def in extensions {
            let name = def.node.name.node.as_str();
            let location = Location::from(def.pos);
            match declarations.get_mut(name) {
                Some(decl) if decl.kind == DeclKind::of(&def.node.kind) => {
                    trace!(type_name = %name, "Merging type extension");
                    decl.merge(&def.node.kind, &def.node.directives);
                }
                Some(_) => self.issues.push(ValidationIssue::InvalidType {
                    type_name: name.to_string(),
                    message: "extension kind does not match the declared type".into(),
                    location,
                }),
                None => self.issues.push(ValidationIssue::InvalidType {
                    type_name: name.to_string(),
                    message: "extends a type that is not declared".into(),
                    location,
                }),
            }
        }

        declarations
    }

    fn register_leaf_types(&mut self, declarations: &IndexMap<String, Declaration>) {
        for decl in declarations.values() {
            match decl.kind {
                DeclKind::Enum => {
                    self.graph.enums.insert(
                        decl.name.clone(),
                        EnumType {
                            name: decl.name.clone(),
                            values: decl.values.clone(),
                            description: decl.description.clone(),
                        },
                    );
                }
                DeclKind::Scalar => {
                    if ScalarKind::builtin(&decl.name).is_none() {
                        self.graph.scalars.push(decl.name.clone());
                    }
                }
                DeclKind::Input => self.issues.push(ValidationIssue::InvalidType {
                    type_name: decl.name.clone(),
                    message: "input types are generated and cannot be declared".into(),
                    location: decl.location,
                }),
                _ => {}
            }
        }
    }

    /// Registers entity, properties and claims type names so field types can
    /// be resolved against them. Returns the claims type name, if any.
    fn register_composite_types(
        &mut self,
        declarations: &IndexMap<String, Declaration>,
    ) -> Option<String> {
        let mut claims_type: Option<String> = None;

        for decl in declarations.values() {
            if !matches!(decl.kind, DeclKind::Object | DeclKind::Interface) {
                continue;
            }

            let mut problems = Vec::new();
            let directives = extract_type_directives(&decl.directives, &mut problems);
            for (directive, message) in problems {
                self.type_issue(decl, format!("@{directive}: {message}"));
            }

            let is_interface = decl.kind == DeclKind::Interface;
            let markers = [
                (directives.node.is_some(), names::NODE),
                (directives.relationship_properties, names::RELATIONSHIP_PROPERTIES),
                (directives.jwt, names::JWT),
            ];
            let present: Vec<&str> = markers.iter().filter(|m| m.0).map(|m| m.1).collect();

            if is_interface && !present.is_empty() {
                self.type_issue(
                    decl,
                    format!("@{} cannot be used on an interface", present.join(", @")),
                );
                continue;
            }
            if present.len() > 1 {
                self.type_issue(
                    decl,
                    format!("@{} cannot be combined", present.join(" and @")),
                );
                continue;
            }

            if directives.relationship_properties || directives.jwt {
                if directives.authorization.is_some() || directives.plural.is_some() {
                    self.type_issue(
                        decl,
                        "@authorization and @plural can only be used on entities".into(),
                    );
                }
                if !decl.implements.is_empty() {
                    self.type_issue(decl, "only entities can implement interfaces".into());
                }
            }

            if directives.relationship_properties {
                self.graph.properties.insert(
                    decl.name.clone(),
                    PropertiesType {
                        name: decl.name.clone(),
                        fields: Vec::new(),
                        description: decl.description.clone(),
                        location: decl.location,
                    },
                );
                continue;
            }

            if directives.jwt {
                if let Some(existing) = &claims_type {
                    self.type_issue(
                        decl,
                        format!("@jwt is already declared on `{existing}`"),
                    );
                } else {
                    claims_type = Some(decl.name.clone());
                }
                continue;
            }

            let labels = match directives.node {
                Some(labels) if !labels.is_empty() => labels,
                _ => vec![decl.name.clone()],
            };
            let authorization = directives.authorization.map(|args| AuthorizationAnnotation {
                validate: args.validate,
                filter: args.filter,
                location: decl.location,
            });

            self.graph.entities.insert(
                decl.name.clone(),
                Entity {
                    name: decl.name.clone(),
                    kind: if is_interface {
                        EntityKind::Interface
                    } else {
                        EntityKind::Node
                    },
                    fields: Vec::new(),
                    implements: decl.implements.clone(),
                    labels,
                    plural: directives.plural,
                    unique_constraints: Vec::new(),
                    union_memberships: Vec::new(),
                    authorization,
                    description: decl.description.clone(),
                    location: decl.location,
                },
            );
        }

        claims_type
    }

    fn register_unions(&mut self, declarations: &IndexMap<String, Declaration>) {
        for decl in declarations.values() {
            if decl.kind != DeclKind::Union {
                continue;
            }

            let mut members = Vec::new();
            for (member, location) in &decl.members {
                if members.contains(member) {
                    continue;
                }
                if self.graph.is_node(member) {
                    members.push(member.clone());
                } else {
                    self.issues.push(ValidationIssue::InvalidType {
                        type_name: decl.name.clone(),
                        message: format!("union member `{member}` is not an entity type"),
                        location: *location,
                    });
                }
            }

            if members.is_empty() {
                continue;
            }
            for member in &members {
                if let Some(entity) = self.graph.entities.get_mut(member) {
                    entity.union_memberships.push(decl.name.clone());
                }
            }
            self.graph.unions.insert(
                decl.name.clone(),
                UnionType {
                    name: decl.name.clone(),
                    members,
                    description: decl.description.clone(),
                    location: decl.location,
                },
            );
        }
    }

    // ========================================================================
    // Fields
    // ========================================================================

    fn populate_entity(&mut self, decl: &Declaration) {
        if !self.graph.entities.contains_key(&decl.name) {
            return;
        }
        let owner = if decl.kind == DeclKind::Interface {
            Owner::Interface
        } else {
            Owner::Node
        };

        let mut fields = Vec::new();
        let mut constraints = Vec::new();
        let mut seen = HashSet::new();

        for def in &decl.fields {
            if !self.check_unique_field_name(decl, def, &mut seen) {
                continue;
            }
            if let Some(field) = self.build_field(decl, owner, def, &mut constraints) {
                trace!(entity = %decl.name, field = %field.name, role = ?field.role, "Classified field");
                fields.push(field);
            }
        }

        if let Some(entity) = self.graph.entities.get_mut(&decl.name) {
            entity.fields = fields;
            entity.unique_constraints = constraints;
        }
    }

    fn populate_properties(&mut self, decl: &Declaration) {
        let mut fields = Vec::new();
        let mut seen = HashSet::new();
        let mut constraints = Vec::new();

        for def in &decl.fields {
            if !self.check_unique_field_name(decl, def, &mut seen) {
                continue;
            }
            if let Some(field) = self.build_field(decl, Owner::Properties, def, &mut constraints) {
                fields.push(field);
            }
        }

        if let Some(properties) = self.graph.properties.get_mut(&decl.name) {
            properties.fields = fields;
        }
    }

    fn populate_claims(&mut self, decl: &Declaration) {
        let mut fields = Vec::new();
        let mut seen = HashSet::new();
        let mut constraints = Vec::new();

        for def in &decl.fields {
            if !self.check_unique_field_name(decl, def, &mut seen) {
                continue;
            }
            let mut problems = Vec::new();
            let directives = extract_field_directives(&def.node.directives, &mut problems);
            let path = directives.jwt_claim.clone();
            let Some(field) = self.build_field(decl, Owner::Claims, def, &mut constraints) else {
                continue;
            };
            let Some(kind) = field.scalar else {
                continue;
            };
            fields.push(ClaimField {
                path: path.unwrap_or_else(|| field.name.clone()),
                name: field.name,
                kind,
                list: field.ty.list,
            });
        }

        self.graph.claims = Some(ClaimsShape {
            type_name: decl.name.clone(),
            fields,
        });
    }

    fn check_unique_field_name(
        &mut self,
        decl: &Declaration,
        def: &Positioned<FieldDefinition>,
        seen: &mut HashSet<String>,
    ) -> bool {
        let name = def.node.name.node.to_string();
        if seen.insert(name.clone()) {
            return true;
        }
        self.issues.push(ValidationIssue::InvalidField {
            owner: decl.name.clone(),
            field: name,
            message: "is declared more than once".into(),
            location: def.pos.into(),
        });
        false
    }

    fn build_field(
        &mut self,
        decl: &Declaration,
        owner: Owner,
        def: &Positioned<FieldDefinition>,
        constraints: &mut Vec<UniqueConstraint>,
    ) -> Option<Field> {
        let name = def.node.name.node.to_string();
        let location = Location::from(def.pos);
        let issues_before = self.issues.len();

        let Some(ty) = field_type(&def.node.ty.node) else {
            self.field_issue(decl, &name, location, "nested lists are not supported".into());
            return None;
        };

        let mut problems: Vec<DirectiveProblem> = Vec::new();
        let directives = extract_field_directives(&def.node.directives, &mut problems);
        for (directive, message) in problems {
            self.directive_issue(decl, &name, location, directive, message);
        }

        let description = def.node.description.as_ref().map(|d| d.node.clone());
        let role = if let Some(kind) = self.graph.scalar_kind(&ty.name) {
            let role =
                self.scalar_role(decl, owner, &name, location, &ty, &kind, &directives, constraints);
            let default_value = directives.default.clone();
            if self.issues.len() > issues_before {
                return None;
            }
            return Some(Field {
                name,
                ty,
                scalar: Some(kind),
                role,
                default_value,
                description,
                location,
            });
        } else if self.graph.entities.contains_key(&ty.name)
            || self.graph.unions.contains_key(&ty.name)
        {
            self.relationship_role(decl, owner, &name, location, &ty, &directives)
        } else if self.graph.properties.contains_key(&ty.name)
            || self.graph.claims.as_ref().is_some_and(|c| c.type_name == ty.name)
        {
            self.field_issue(
                decl,
                &name,
                location,
                format!("cannot reference `{}`, which is not an entity type", ty.name),
            );
            None
        } else {
            self.issues.push(ValidationIssue::UnknownFieldType {
                owner: decl.name.clone(),
                field: name.clone(),
                type_name: ty.name.clone(),
                location,
            });
            None
        };

        let role = role?;
        if self.issues.len() > issues_before {
            return None;
        }
        Some(Field {
            name,
            ty,
            scalar: None,
            role,
            default_value: None,
            description,
            location,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn scalar_role(
        &mut self,
        decl: &Declaration,
        owner: Owner,
        name: &str,
        location: Location,
        ty: &FieldType,
        kind: &ScalarKind,
        directives: &FieldDirectives,
        constraints: &mut Vec<UniqueConstraint>,
    ) -> FieldRole {
        if directives.relationship.is_some() {
            self.directive_issue(
                decl,
                name,
                location,
                names::RELATIONSHIP,
                format!("cannot be used on a field of scalar type `{}`", ty.name),
            );
        }
        if directives.declare_relationship.is_some() {
            self.directive_issue(
                decl,
                name,
                location,
                names::DECLARE_RELATIONSHIP,
                format!("cannot be used on a field of scalar type `{}`", ty.name),
            );
        }
        if owner == Owner::Claims {
            return FieldRole::Scalar;
        }
        if directives.jwt_claim.is_some() {
            self.directive_issue(
                decl,
                name,
                location,
                names::JWT_CLAIM,
                "can only be used on fields of the @jwt type".into(),
            );
        }

        let mut unique = None;
        if let Some(constraint_name) = &directives.unique {
            let problem = if ty.list {
                Some("cannot be used on list fields")
            } else {
                match owner {
                    Owner::Interface => Some("cannot be used on interface fields"),
                    Owner::Properties => Some("cannot be used on relationship properties"),
                    _ => None,
                }
            };
            match problem {
                Some(message) => {
                    self.directive_issue(decl, name, location, names::UNIQUE, message.into());
                }
                None => {
                    let constraint_name = constraint_name
                        .clone()
                        .unwrap_or_else(|| format!("{}_{}", decl.name, name));
                    constraints.push(UniqueConstraint {
                        field: name.to_string(),
                        name: constraint_name.clone(),
                    });
                    unique = Some(constraint_name);
                }
            }
        }

        if directives.id && (*kind != ScalarKind::Id || ty.list) {
            self.directive_issue(
                decl,
                name,
                location,
                names::ID,
                "can only be used on non-list ID fields".into(),
            );
        }

        if let Some(populated) = &directives.populated_by {
            if directives.id {
                self.directive_issue(
                    decl,
                    name,
                    location,
                    names::POPULATED_BY,
                    "cannot be combined with @id".into(),
                );
            }
            if !self.options.is_callback_registered(&populated.callback) {
                self.directive_issue(
                    decl,
                    name,
                    location,
                    names::POPULATED_BY,
                    format!("callback `{}` is not registered", populated.callback),
                );
            }
        }

        if let Some(value) = &directives.default
            && !self.default_matches(kind, ty.list, value)
        {
            self.directive_issue(
                decl,
                name,
                location,
                names::DEFAULT,
                format!("value {value} does not match type `{ty}`"),
            );
        }

        if directives.id {
            FieldRole::GeneratedId
        } else if let Some(populated) = &directives.populated_by {
            FieldRole::ComputedByCallback {
                callback: populated.callback.clone(),
                operations: populated.operations.clone(),
            }
        } else if let Some(constraint_name) = unique {
            FieldRole::UniqueConstraint { constraint_name }
        } else {
            FieldRole::Scalar
        }
    }

    fn relationship_role(
        &mut self,
        decl: &Declaration,
        owner: Owner,
        name: &str,
        location: Location,
        ty: &FieldType,
        directives: &FieldDirectives,
    ) -> Option<FieldRole> {
        match owner {
            Owner::Properties => {
                self.field_issue(
                    decl,
                    name,
                    location,
                    "relationship properties cannot contain relationship fields".into(),
                );
                return None;
            }
            Owner::Claims => {
                self.field_issue(decl, name, location, "claim fields must be scalars".into());
                return None;
            }
            Owner::Node | Owner::Interface => {}
        }

        for (present, directive) in [
            (directives.unique.is_some(), names::UNIQUE),
            (directives.id, names::ID),
            (directives.populated_by.is_some(), names::POPULATED_BY),
            (directives.default.is_some(), names::DEFAULT),
        ] {
            if present {
                self.directive_issue(
                    decl,
                    name,
                    location,
                    directive,
                    "cannot be used on relationship fields".into(),
                );
            }
        }

        if ty.list && !ty.item_required {
            self.field_issue(
                decl,
                name,
                location,
                format!("relationship lists must have non-null items, e.g. `[{}!]!`", ty.name),
            );
        }

        if owner == Owner::Interface {
            if directives.relationship.is_some() {
                self.directive_issue(
                    decl,
                    name,
                    location,
                    names::RELATIONSHIP,
                    "cannot be used on interface fields, use @declareRelationship".into(),
                );
                return None;
            }
            let Some(nested_operations) = directives.declare_relationship else {
                self.field_issue(
                    decl,
                    name,
                    location,
                    format!("references `{}` but has no @declareRelationship directive", ty.name),
                );
                return None;
            };
            return Some(FieldRole::RelationshipRef(RelationshipDeclaration {
                target: ty.name.clone(),
                binding: RelationshipBinding::DeclaredOnly,
                nested_operations,
            }));
        }

        if directives.declare_relationship.is_some() {
            self.directive_issue(
                decl,
                name,
                location,
                names::DECLARE_RELATIONSHIP,
                "can only be used on interface fields".into(),
            );
        }
        let Some(args) = &directives.relationship else {
            self.field_issue(
                decl,
                name,
                location,
                format!("references `{}` but has no @relationship directive", ty.name),
            );
            return None;
        };

        if let Some(properties) = &args.properties
            && !self.graph.properties.contains_key(properties)
        {
            self.directive_issue(
                decl,
                name,
                location,
                names::RELATIONSHIP,
                format!("`properties` type `{properties}` is not declared with @relationshipProperties"),
            );
        }

        let (Some(native_type), Some(direction)) = (&args.native_type, args.direction) else {
            return None;
        };
        Some(FieldRole::RelationshipRef(RelationshipDeclaration {
            target: ty.name.clone(),
            binding: RelationshipBinding::Concrete {
                native_type: native_type.clone(),
                direction,
                properties: args.properties.clone(),
            },
            nested_operations: args.nested_operations,
        }))
    }

    fn default_matches(&self, kind: &ScalarKind, list: bool, value: &ConstValue) -> bool {
        match value {
            ConstValue::Null => true,
            ConstValue::List(items) if list => {
                items.iter().all(|item| self.default_matches(kind, false, item))
            }
            ConstValue::List(_) => false,
            single => self.scalar_literal_matches(kind, single),
        }
    }

    fn scalar_literal_matches(&self, kind: &ScalarKind, value: &ConstValue) -> bool {
        match (kind.category(), value) {
            (
                ScalarCategory::Identifier | ScalarCategory::StringLike | ScalarCategory::Temporal,
                ConstValue::String(_),
            ) => true,
            (ScalarCategory::Identifier, ConstValue::Number(n)) => n.is_i64(),
            (ScalarCategory::Integer, ConstValue::Number(n)) => {
                n.as_i64().is_some_and(|v| i32::try_from(v).is_ok())
            }
            (ScalarCategory::BigInteger, ConstValue::Number(n)) => n.is_i64() || n.is_u64(),
            (ScalarCategory::BigInteger, ConstValue::String(s)) => s.parse::<i128>().is_ok(),
            (ScalarCategory::Float, ConstValue::Number(_))
            | (ScalarCategory::Boolean, ConstValue::Boolean(_))
            | (ScalarCategory::Custom, _) => true,
            (ScalarCategory::Enum, ConstValue::Enum(v)) => self.enum_has_value(kind, v.as_str()),
            (ScalarCategory::Enum, ConstValue::String(v)) => self.enum_has_value(kind, v),
            _ => false,
        }
    }

    fn enum_has_value(&self, kind: &ScalarKind, value: &str) -> bool {
        self.graph
            .enums
            .get(kind.type_name())
            .is_some_and(|e| e.values.iter().any(|v| v == value))
    }

    // ========================================================================
    // Hierarchy
    // ========================================================================

    fn check_implements(&mut self) {
        let mut issues = Vec::new();
        let mut invalid: Vec<(String, String)> = Vec::new();

        for entity in self.graph.entities.values() {
            for parent in &entity.implements {
                if !self.graph.is_interface(parent) {
                    issues.push(ValidationIssue::InvalidType {
                        type_name: entity.name.clone(),
                        message: format!("implements `{parent}`, which is not a declared interface"),
                        location: entity.location,
                    });
                    invalid.push((entity.name.clone(), parent.clone()));
                } else if self.graph.is_subtype_of(parent, &entity.name) {
                    issues.push(ValidationIssue::InvalidType {
                        type_name: entity.name.clone(),
                        message: format!("interface hierarchy through `{parent}` is cyclic"),
                        location: entity.location,
                    });
                    invalid.push((entity.name.clone(), parent.clone()));
                }
            }
        }

        for (entity, parent) in invalid {
            if let Some(entity) = self.graph.entities.get_mut(&entity) {
                entity.implements.retain(|p| *p != parent);
            }
        }
        self.issues.extend(issues);
    }

    /// Copies fields declared on ancestor interfaces into descendant
    /// interfaces that do not redeclare them.
    fn inherit_interface_fields(&mut self) {
        let declared: IndexMap<String, Vec<Field>> = self
            .graph
            .interfaces()
            .map(|i| (i.name.clone(), i.fields.clone()))
            .collect();

        let interfaces: Vec<String> = declared.keys().cloned().collect();
        for name in interfaces {
            let ancestors: Vec<String> = self
                .graph
                .ancestors_of(&name)
                .into_iter()
                .map(str::to_string)
                .collect();
            let Some(entity) = self.graph.entities.get_mut(&name) else {
                continue;
            };
            for ancestor in &ancestors {
                let Some(fields) = declared.get(ancestor) else {
                    continue;
                };
                for field in fields {
                    if entity.field(&field.name).is_none() {
                        trace!(interface = %name, ancestor = %ancestor, field = %field.name, "Inheriting field");
                        entity.fields.push(field.clone());
                    }
                }
            }
        }
    }

    /// Concrete entities must provide every scalar field of their interfaces.
    /// Missing relationship fields are reported by the relationship resolver.
    fn check_inherited_scalars(&mut self) {
        let mut issues = Vec::new();

        for entity in self.graph.nodes() {
            for ancestor in self.graph.ancestors_of(&entity.name) {
                let Some(interface) = self.graph.entity(ancestor) else {
                    continue;
                };
                for field in interface.scalar_fields() {
                    match entity.field(&field.name) {
                        None => issues.push(ValidationIssue::InvalidField {
                            owner: entity.name.clone(),
                            field: field.name.clone(),
                            message: format!("is required by interface `{ancestor}` but missing"),
                            location: entity.location,
                        }),
                        Some(own) if own.ty != field.ty => {
                            issues.push(ValidationIssue::InvalidField {
                                owner: entity.name.clone(),
                                field: field.name.clone(),
                                message: format!(
                                    "has type `{}` but interface `{ancestor}` declares `{}`",
                                    own.ty, field.ty
                                ),
                                location: own.location,
                            });
                        }
                        Some(_) => {}
                    }
                }
            }
        }

        self.issues.extend(issues);
    }

    // ========================================================================
    // Issue helpers
    // ========================================================================

    fn type_issue(&mut self, decl: &Declaration, message: String) {
        self.issues.push(ValidationIssue::InvalidType {
            type_name: decl.name.clone(),
            message,
            location: decl.location,
        });
    }

    fn field_issue(&mut self, decl: &Declaration, field: &str, location: Location, message: String) {
        self.issues.push(ValidationIssue::InvalidField {
            owner: decl.name.clone(),
            field: field.to_string(),
            message,
            location,
        });
    }

    fn directive_issue(
        &mut self,
        decl: &Declaration,
        field: &str,
        location: Location,
        directive: &str,
        message: String,
    ) {
        self.issues.push(ValidationIssue::InvalidDirective {
            directive: directive.to_string(),
            owner: decl.name.clone(),
            field: field.to_string(),
            message,
            location,
        });
    }
}

/// Converts a parsed type into a [`FieldType`]. Nested lists yield `None`.
fn field_type(ty: &Type) -> Option<FieldType> {
    match &ty.base {
        BaseType::Named(name) => Some(FieldType::named(name.as_str(), !ty.nullable)),
        BaseType::List(inner) => match &inner.base {
            BaseType::Named(name) => Some(FieldType::list_of(
                name.as_str(),
                !ty.nullable,
                !inner.nullable,
            )),
            BaseType::List(_) => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Direction;

    fn build(sdl: &str) -> (EntityGraph, Vec<ValidationIssue>) {
        build_with(sdl, &BuildOptions::default())
    }

    fn build_with(sdl: &str, options: &BuildOptions) -> (EntityGraph, Vec<ValidationIssue>) {
        let document = parse_type_defs(sdl).unwrap();
        TypeModelBuilder::new(options).build(&document)
    }

    #[test]
    fn test_classifies_fields() {
        let (graph, issues) = build(
            r#"
            type Movie {
                id: ID! @id
                title: String @unique
                slug: String @populatedBy(callback: "slug", operations: [CREATE])
                released: DateTime
                actors: [Actor!]! @relationship(type: "ACTED_IN", direction: IN)
            }
            type Actor { name: String! }
            "#,
        );
        assert!(issues.is_empty(), "{issues:?}");

        let movie = graph.entity("Movie").unwrap();
        assert_eq!(movie.field("id").unwrap().role, FieldRole::GeneratedId);
        assert_eq!(
            movie.field("title").unwrap().role,
            FieldRole::UniqueConstraint {
                constraint_name: "Movie_title".into()
            }
        );
        assert!(matches!(
            movie.field("slug").unwrap().role,
            FieldRole::ComputedByCallback { .. }
        ));
        assert_eq!(
            movie.field("released").unwrap().category(),
            Some(ScalarCategory::Temporal)
        );

        let actors = movie.field("actors").unwrap().relationship().unwrap();
        assert_eq!(actors.target, "Actor");
        assert!(matches!(
            actors.binding,
            RelationshipBinding::Concrete {
                direction: Direction::In,
                ..
            }
        ));
        assert_eq!(movie.unique_constraints.len(), 1);
        assert_eq!(movie.labels, vec!["Movie".to_string()]);
    }

    #[test]
    fn test_collects_all_issues() {
        let (_, issues) = build(
            r#"
            type Movie {
                actors: [Actor!]! @relationship(type: "ACTED_IN")
                tags: [String!] @unique
                code: String @id
                genre: Genre
            }
            type Actor { name: String! }
            "#,
        );

        assert_eq!(issues.len(), 4, "{issues:?}");
        assert!(issues.iter().any(|i| i.to_string().contains("direction")));
        assert!(issues.iter().any(|i| i.to_string().contains("list fields")));
        assert!(issues.iter().any(|i| i.to_string().contains("non-list ID")));
        assert!(issues.iter().any(|i| matches!(
            i,
            ValidationIssue::UnknownFieldType { type_name, .. } if type_name == "Genre"
        )));
    }

    #[test]
    fn test_extension_merges_fields() {
        let (graph, issues) = build(
            r#"
            type Movie { title: String }
            extend type Movie @plural(value: "films") { year: Int }
            "#,
        );
        assert!(issues.is_empty());
        let movie = graph.entity("Movie").unwrap();
        assert_eq!(movie.fields.len(), 2);
        assert_eq!(movie.plural_name(), "Films");
    }

    #[test]
    fn test_reserved_and_duplicate_types() {
        let (_, issues) = build(
            r#"
            type Query { movies: [Movie!]! }
            type Movie { title: String }
            type Movie { title: String }
            "#,
        );
        assert!(matches!(issues[0], ValidationIssue::ReservedTypeName { .. }));
        assert!(matches!(issues[1], ValidationIssue::DuplicateType { .. }));
    }

    #[test]
    fn test_interface_rules() {
        let (_, issues) = build(
            r#"
            interface Production {
                title: String!
                actors: [Actor!]! @relationship(type: "ACTED_IN", direction: IN)
            }
            type Movie implements Production {
                actors: [Actor!]! @declareRelationship
            }
            type Actor { name: String! }
            "#,
        );
        let text: Vec<String> = issues.iter().map(ToString::to_string).collect();
        assert!(text.iter().any(|t| t.contains("use @declareRelationship")), "{text:?}");
        assert!(text.iter().any(|t| t.contains("only be used on interface fields")));
        assert!(text.iter().any(|t| t.contains("required by interface `Production`")));
    }

    #[test]
    fn test_implementer_must_match_interface_nullability() {
        let (_, issues) = build(
            r#"
            interface Production { title: String }
            type Movie implements Production { title: String! }
            "#,
        );
        let text: Vec<String> = issues.iter().map(ToString::to_string).collect();
        assert!(
            text.iter()
                .any(|t| t.contains("has type `String!` but interface `Production` declares `String`")),
            "{text:?}"
        );
    }

    #[test]
    fn test_intermediate_interface_inherits_fields() {
        let (graph, issues) = build(
            r#"
            interface Production { title: String! actors: [Actor!]! @declareRelationship }
            interface Show implements Production { runtime: Int }
            type Movie implements Show & Production {
                title: String!
                runtime: Int
                actors: [Actor!]! @relationship(type: "ACTED_IN", direction: IN)
            }
            type Actor { name: String! }
            "#,
        );
        assert!(issues.is_empty(), "{issues:?}");
        let show = graph.entity("Show").unwrap();
        assert!(show.field("title").is_some());
        assert!(show.field("actors").unwrap().relationship().unwrap().is_declared_only());
    }

    #[test]
    fn test_properties_type_rules() {
        let (graph, issues) = build(
            r#"
            type Movie {
                actors: [Actor!]! @relationship(type: "ACTED_IN", direction: IN, properties: "ActedIn")
                directors: [Actor!]! @relationship(type: "DIRECTED", direction: IN, properties: "Actor")
            }
            type Actor { name: String! }
            type ActedIn @relationshipProperties { roles: [String!] movie: Movie }
            "#,
        );
        assert_eq!(issues.len(), 2, "{issues:?}");
        assert!(issues[0].to_string().contains("not declared with @relationshipProperties"));
        assert!(issues[1].to_string().contains("cannot contain relationship fields"));
        assert_eq!(graph.properties["ActedIn"].fields.len(), 1);
    }

    #[test]
    fn test_unregistered_callback() {
        let options = BuildOptions::default().with_callbacks(["slug"]);
        let (_, issues) = build_with(
            r#"type Movie { slug: String @populatedBy(callback: "other") }"#,
            &options,
        );
        assert_eq!(issues.len(), 1);
        assert!(issues[0].to_string().contains("`other` is not registered"));
    }

    #[test]
    fn test_default_value_checked_against_kind() {
        let (graph, issues) = build(
            r#"
            enum Genre { ACTION DRAMA }
            type Movie {
                genre: Genre @default(value: ACTION)
                rating: Float @default(value: 1.5)
                year: Int @default(value: "1999")
            }
            "#,
        );
        assert_eq!(issues.len(), 1, "{issues:?}");
        assert!(issues[0].to_string().contains("`Movie.year`"));
        let movie = graph.entity("Movie").unwrap();
        assert!(movie.field("genre").unwrap().default_value.is_some());
    }

    #[test]
    fn test_claims_shape() {
        let (graph, issues) = build(
            r#"
            type JWT @jwt {
                roles: [String!]
                orgId: String @jwtClaim(path: "org.id")
            }
            type User { userId: String! }
            "#,
        );
        assert!(issues.is_empty(), "{issues:?}");
        let claims = graph.claims.as_ref().unwrap();
        assert_eq!(claims.type_name, "JWT");
        assert_eq!(claims.field("orgId").unwrap().path, "org.id");
        assert!(claims.field("roles").unwrap().list);
        assert!(graph.entity("JWT").is_none());
    }

    #[test]
    fn test_union_members_must_be_entities() {
        let (graph, issues) = build(
            r#"
            type Movie { title: String }
            type Series { title: String }
            type Props @relationshipProperties { since: Int }
            union Media = Movie | Series | Props
            "#,
        );
        assert_eq!(issues.len(), 1);
        assert_eq!(graph.unions["Media"].members, vec!["Movie", "Series"]);
        assert_eq!(
            graph.entity("Movie").unwrap().union_memberships,
            vec!["Media".to_string()]
        );
    }

    #[test]
    fn test_no_entities() {
        let (_, issues) = build("enum Genre { ACTION }");
        assert_eq!(issues, vec![ValidationIssue::NoEntities]);
    }

    #[test]
    fn test_parse_error() {
        let err = build_entity_graph("type {", &BuildOptions::default()).unwrap_err();
        assert!(matches!(err, SchemaError::Parse(_)));
    }
}
