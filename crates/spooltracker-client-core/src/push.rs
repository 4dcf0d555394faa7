use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::model::SpoolPatch;
use crate::store::{SpoolField, StateStore, UpdateSource};

#[derive(Debug, Clone, PartialEq)]
pub enum PushOutcome {
    /// Addressed to another plugin; nothing happened.
    Ignored,
    /// `rejected` lists keys whose values had the wrong type; the other keys
    /// were still applied.
    Applied {
        fields: Vec<SpoolField>,
        rejected: Vec<&'static str>,
    },
    Malformed { reason: String },
}

/// Routes live push messages for one plugin namespace into the store.
#[derive(Debug, Clone)]
pub struct PushReconciler {
    namespace: String,
}

impl PushReconciler {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// No buffering and no dedup: the body is applied the moment it arrives.
    pub fn handle_message(
        &self,
        store: &mut StateStore,
        plugin: &str,
        body: &Value,
    ) -> PushOutcome {
        if plugin != self.namespace {
            return PushOutcome::Ignored;
        }

        let (patch, rejected) = match decode_patch(body) {
            Ok(decoded) => decoded,
            Err(reason) => {
                tracing::warn!(plugin, %reason, "dropping malformed push message");
                return PushOutcome::Malformed { reason };
            }
        };

        let outcome = store.apply_patch(&patch, UpdateSource::Push);
        if !rejected.is_empty() {
            tracing::warn!(plugin, ?rejected, "push message carried mistyped fields");
        }
        tracing::debug!(plugin, fields = ?outcome.applied, "push message applied");
        PushOutcome::Applied {
            fields: outcome.applied,
            rejected,
        }
    }
}

/// Each key decodes on its own, so one bad value does not cost the others.
fn decode_patch(body: &Value) -> Result<(SpoolPatch, Vec<&'static str>), String> {
    let Value::Object(fields) = body else {
        return Err(format!("expected a JSON object, got {}", json_kind(body)));
    };
    let mut rejected = Vec::new();
    let patch = SpoolPatch {
        remaining_weight_g: decode_field(fields, "remaining_g", &mut rejected),
        capacity_weight_g: decode_field(fields, "spool_capacity_g", &mut rejected),
        filament_type: decode_field(fields, "filament_type", &mut rejected),
        color_hex: decode_field(fields, "color", &mut rejected),
        manufacturer: decode_field(fields, "manufacturer", &mut rejected),
    };
    Ok((patch, rejected))
}

/// Absent and `null` both mean "leave alone".
fn decode_field<T: DeserializeOwned>(
    fields: &Map<String, Value>,
    key: &'static str,
    rejected: &mut Vec<&'static str>,
) -> Option<T> {
    let value = fields.get(key).filter(|value| !value.is_null())?;
    match T::deserialize(value) {
        Ok(decoded) => Some(decoded),
        Err(error) => {
            tracing::debug!(key, %error, "skipping mistyped push field");
            rejected.push(key);
            None
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
