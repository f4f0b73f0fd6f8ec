//! Registers the derived types into an `async_graphql::dynamic` schema and
//! prints it.
//!
//! `SchemaBuilder::finish` checks the type system (every referenced type
//! exists, implementations match their interfaces, union members are
//! objects). With sorting enabled fields, arguments, enum values, union
//! members and implemented interfaces are ordered lexicographically. Type
//! blocks are always printed in name order, and interfaces print without
//! their own `implements` clause.
//!
//! The dynamic schema only accepts an implementer field whose named type is
//! identical to the interface's. A relationship field that narrows its
//! target to an implementer is therefore registered with the interface's
//! declared type; the derived metadata keeps the narrowed one.

use async_graphql::dynamic::{
    Enum, EnumItem, Field, FieldFuture, InputObject, Interface, InterfaceField, Object, Scalar,
    Schema, SchemaBuilder, SchemaError, Subscription, SubscriptionField, SubscriptionFieldFuture,
    TypeRef, Union,
};
use async_graphql::{SDLExportOptions, Value};
use tracing::debug;

use crate::augment::{
    DerivedSchema, DerivedType, EnumValue, InputValue, MUTATION, OutputField, QUERY, SUBSCRIPTION,
    TypeDefinition,
};

/// Builds the executable dynamic schema for `schema`.
///
/// Fields resolve by name from their parent value; subscription fields
/// yield no events.
///
/// # Errors
///
/// Returns the first type-system violation found by the dynamic schema.
pub fn build_schema(schema: &DerivedSchema, sorted: bool) -> Result<Schema, SchemaError> {
    let roots = Roots::of(schema);
    let mut builder = Schema::build(QUERY, roots.mutation, roots.subscription);

    let mut types: Vec<&DerivedType> = schema.types.values().collect();
    if sorted {
        types.sort_by(|a, b| a.name.cmp(&b.name));
    }
    for ty in types {
        builder = register(builder, schema, ty, sorted, &roots);
    }
    builder.finish()
}

/// Prints `schema` as SDL.
///
/// # Errors
///
/// Returns the type-system violation that prevented the schema from
/// being built.
pub fn print_schema(schema: &DerivedSchema, sorted: bool) -> Result<String, SchemaError> {
    let built = build_schema(schema, sorted)?;
    let mut options = SDLExportOptions::new().use_space_ident();
    if sorted {
        options = options
            .sorted_fields()
            .sorted_arguments()
            .sorted_enum_items();
    }
    let sdl = built.sdl_with_options(options);
    debug!(types = schema.len(), bytes = sdl.len(), "Printed derived schema");
    Ok(sdl)
}

struct Roots {
    mutation: Option<&'static str>,
    subscription: Option<&'static str>,
}

impl Roots {
    fn of(schema: &DerivedSchema) -> Self {
        Self {
            mutation: schema.contains(MUTATION).then_some(MUTATION),
            subscription: schema.contains(SUBSCRIPTION).then_some(SUBSCRIPTION),
        }
    }
}

fn ordered<'t, T>(items: &'t [T], sorted: bool, key: impl Fn(&T) -> &str) -> Vec<&'t T> {
    let mut items: Vec<&T> = items.iter().collect();
    if sorted {
        items.sort_by(|a, b| key(*a).cmp(key(*b)));
    }
    items
}

/// Type `field` is registered with on a type implementing `implements`.
fn declared_type(
    schema: &DerivedSchema,
    implements: &[String],
    field: &str,
    ty: &TypeRef,
) -> TypeRef {
    for parent in implements {
        let Some(interface) = schema.get(parent) else {
            continue;
        };
        let TypeDefinition::Interface { implements, .. } = &interface.definition else {
            continue;
        };
        if let Some(declared) = interface.output_field(field)
            && same_shape(&declared.ty, ty)
        {
            return declared_type(schema, implements, field, &declared.ty);
        }
    }
    ty.clone()
}

fn same_shape(a: &TypeRef, b: &TypeRef) -> bool {
    match (a, b) {
        (TypeRef::NonNull(a), TypeRef::NonNull(b)) | (TypeRef::List(a), TypeRef::List(b)) => {
            same_shape(a, b)
        }
        (TypeRef::Named(_), TypeRef::Named(_)) => true,
        _ => false,
    }
}

fn register(
    builder: SchemaBuilder,
    schema: &DerivedSchema,
    ty: &DerivedType,
    sorted: bool,
    roots: &Roots,
) -> SchemaBuilder {
    let name = ty.name.as_str();
    match &ty.definition {
        TypeDefinition::Scalar => {
            let mut scalar = Scalar::new(name);
            if let Some(description) = &ty.description {
                scalar = scalar.description(description);
            }
            builder.register(scalar)
        }
        TypeDefinition::Enum { values } => {
            let mut enumeration = Enum::new(name);
            if let Some(description) = &ty.description {
                enumeration = enumeration.description(description);
            }
            for value in ordered(values, sorted, |v| v.name.as_str()) {
                enumeration = enumeration.item(enum_item(value));
            }
            builder.register(enumeration)
        }
        TypeDefinition::Union { members } => {
            let mut union = Union::new(name);
            if let Some(description) = &ty.description {
                union = union.description(description);
            }
            for member in ordered(members, sorted, String::as_str) {
                union = union.possible_type(member);
            }
            builder.register(union)
        }
        TypeDefinition::InputObject { fields } => {
            let mut input = InputObject::new(name);
            if let Some(description) = &ty.description {
                input = input.description(description);
            }
            for field in ordered(fields, sorted, |f| f.name.as_str()) {
                input = input.field(input_value(field));
            }
            builder.register(input)
        }
        TypeDefinition::Interface { implements, fields } => {
            let mut interface = Interface::new(name);
            if let Some(description) = &ty.description {
                interface = interface.description(description);
            }
            for parent in ordered(implements, sorted, String::as_str) {
                interface = interface.implement(parent);
            }
            for field in ordered(fields, sorted, |f| f.name.as_str()) {
                let declared = declared_type(schema, implements, &field.name, &field.ty);
                interface = interface.field(interface_field(field, declared, sorted));
            }
            builder.register(interface)
        }
        TypeDefinition::Object { fields, .. } if Some(name) == roots.subscription => {
            let mut subscription = Subscription::new(name);
            if let Some(description) = &ty.description {
                subscription = subscription.description(description);
            }
            for field in ordered(fields, sorted, |f| f.name.as_str()) {
                subscription = subscription.field(subscription_field(field, sorted));
            }
            builder.register(subscription)
        }
        TypeDefinition::Object { implements, fields } => {
            let mut object = Object::new(name);
            if let Some(description) = &ty.description {
                object = object.description(description);
            }
            for parent in ordered(implements, sorted, String::as_str) {
                object = object.implement(parent);
            }
            for field in ordered(fields, sorted, |f| f.name.as_str()) {
                let declared = declared_type(schema, implements, &field.name, &field.ty);
                object = object.field(object_field(field, declared, sorted));
            }
            builder.register(object)
        }
    }
}

fn enum_item(value: &EnumValue) -> EnumItem {
    let mut item = EnumItem::new(value.name.as_str());
    if let Some(description) = &value.description {
        item = item.description(description);
    }
    if let Some(reason) = &value.deprecation {
        item = item.deprecation(Some(reason.as_str()));
    }
    item
}

fn input_value(value: &InputValue) -> async_graphql::dynamic::InputValue {
    let mut input = async_graphql::dynamic::InputValue::new(value.name.as_str(), value.ty.clone());
    if let Some(description) = &value.description {
        input = input.description(description);
    }
    if let Some(default) = &value.default_value {
        input = input.default_value(default.clone());
    }
    if let Some(reason) = &value.deprecation {
        input = input.deprecation(Some(reason.as_str()));
    }
    input
}

fn object_field(field: &OutputField, ty: TypeRef, sorted: bool) -> Field {
    let member = field.name.clone();
    let mut out = Field::new(field.name.as_str(), ty, move |ctx| {
        let member = member.clone();
        FieldFuture::new(async move {
            Ok(match ctx.parent_value.as_value() {
                Some(Value::Object(parent)) => parent.get(member.as_str()).cloned(),
                _ => None,
            })
        })
    });
    if let Some(description) = &field.description {
        out = out.description(description);
    }
    if let Some(reason) = &field.deprecation {
        out = out.deprecation(Some(reason.as_str()));
    }
    for argument in ordered(&field.arguments, sorted, |a| a.name.as_str()) {
        out = out.argument(input_value(argument));
    }
    out
}

fn interface_field(field: &OutputField, ty: TypeRef, sorted: bool) -> InterfaceField {
    let mut out = InterfaceField::new(field.name.as_str(), ty);
    if let Some(description) = &field.description {
        out = out.description(description);
    }
    if let Some(reason) = &field.deprecation {
        out = out.deprecation(Some(reason.as_str()));
    }
    for argument in ordered(&field.arguments, sorted, |a| a.name.as_str()) {
        out = out.argument(input_value(argument));
    }
    out
}

fn subscription_field(field: &OutputField, sorted: bool) -> SubscriptionField {
    let mut out = SubscriptionField::new(field.name.as_str(), field.ty.clone(), |_| {
        SubscriptionFieldFuture::new(async {
            Ok(futures_util::stream::empty::<async_graphql::Result<Value>>())
        })
    });
    if let Some(description) = &field.description {
        out = out.description(description);
    }
    if let Some(reason) = &field.deprecation {
        out = out.deprecation(Some(reason.as_str()));
    }
    for argument in ordered(&field.arguments, sorted, |a| a.name.as_str()) {
        out = out.argument(input_value(argument));
    }
    out
}
