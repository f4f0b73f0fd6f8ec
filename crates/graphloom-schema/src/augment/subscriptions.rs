//! Event subscription surface, generated only when enabled in
//! [`BuildOptions`](crate::config::BuildOptions).

use tracing::trace;

use super::naming::lower_first;
use super::scalars;
use super::types::{
    DerivedType, DerivedTypeKind, EnumValue, InputValue, OutputField, TypeRef, field_type_ref,
};
use super::SchemaAugmenter;
use crate::model::Entity;

pub const EVENT_TYPE: &str = "EventType";

/// `(root field suffix, event type suffix, payload field prefix)`
const EVENTS: &[(&str, &str, &str)] = &[
    ("Created", "CreatedEvent", "created"),
    ("Updated", "UpdatedEvent", "updated"),
    ("Deleted", "DeletedEvent", "deleted"),
];

impl SchemaAugmenter<'_> {
    /// Event types and `Subscription` fields for one node. Nodes without
    /// scalar fields have nothing to put in a payload and are skipped.
    pub(super) fn generate_subscriptions(&mut self, entity: &Entity) {
        let name = entity.name.as_str();
        let payload: Vec<OutputField> = entity
            .scalar_fields()
            .map(|f| OutputField::new(f.name.clone(), field_type_ref(&f.ty)))
            .collect();
        if payload.is_empty() {
            trace!(entity = %name, "No scalar fields, skipping subscriptions");
            return;
        }

        self.registry.register(DerivedType::enumeration(
            EVENT_TYPE,
            DerivedTypeKind::EventType,
            ["CREATE", "UPDATE", "DELETE"].map(EnumValue::new),
        ));

        let payload_name = format!("{name}EventPayload");
        self.registry.register(DerivedType::object(
            payload_name.clone(),
            DerivedTypeKind::EventPayload,
            payload,
        ));

        let where_name = format!("{name}SubscriptionWhere");
        let mut where_fields: Vec<InputValue> =
            entity.scalar_fields().flat_map(scalars::where_fields).collect();
        where_fields.extend(scalars::logical_fields(&where_name));
        self.registry.register(DerivedType::input(
            where_name.clone(),
            DerivedTypeKind::SubscriptionWhere,
            where_fields,
        ));

        for (root_suffix, event_suffix, payload_prefix) in EVENTS {
            let event_name = format!("{name}{event_suffix}");
            let mut fields = vec![
                OutputField::new("event", TypeRef::named_nn(EVENT_TYPE)),
                OutputField::new("timestamp", TypeRef::named_nn("Float")),
            ];
            if *root_suffix == "Updated" {
                fields.push(OutputField::new(
                    "previousState",
                    TypeRef::named_nn(payload_name.clone()),
                ));
            }
            fields.push(OutputField::new(
                format!("{payload_prefix}{name}"),
                TypeRef::named_nn(payload_name.clone()),
            ));
            self.registry.register(DerivedType::object(
                event_name.clone(),
                DerivedTypeKind::Event,
                fields,
            ));

            self.subscription.push(
                OutputField::new(
                    format!("{}{root_suffix}", lower_first(name)),
                    TypeRef::named_nn(event_name),
                )
                .argument(InputValue::new("where", TypeRef::named(where_name.clone()))),
            );
        }
    }
}
