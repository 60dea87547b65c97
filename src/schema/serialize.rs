//! Context-aware serialization of resource instances.
//!
//! Output starts with `schemas`, followed by base attributes in
//! schema-declared order and then one object per active extension, keyed by
//! its URN. Values are validated only when they are emitted; unknown keys
//! and missing required values fail regardless of visibility.

use super::registry::SchemaRegistry;
use super::types::{AttributeDefinition, AttributeType, Mutability, Schema};
use super::validation::{lookup, qualify};
use super::visibility::is_visible;
use crate::error::{ScimResult, ValidationError, ValidationResult};
use crate::resource::{AttributeRef, AttributeSelection, Context, ResolvedSelection, ResourceInstance};

use serde_json::{Map, Value};

impl SchemaRegistry {
    /// Serialize `instance` to JSON bytes for `context`.
    ///
    /// Output is deterministic: the same instance, context and selection
    /// always produce identical bytes.
    pub fn serialize(
        &self,
        instance: &ResourceInstance,
        context: Context,
        selection: &AttributeSelection,
    ) -> ScimResult<Vec<u8>> {
        let value = self.to_json(instance, context, selection)?;
        Ok(serde_json::to_vec(&value)?)
    }

    /// Serialize `instance` to a JSON value for `context`.
    pub fn to_json(
        &self,
        instance: &ResourceInstance,
        context: Context,
        selection: &AttributeSelection,
    ) -> ScimResult<Value> {
        log::debug!(
            "Serializing {} resource with {} extensions in {} context",
            instance.schema(),
            instance.extensions().len(),
            context
        );

        let base = self.resolve(instance.schema().as_str())?;
        let extension_uris: Vec<&str> = instance
            .extensions()
            .iter()
            .map(|ext| ext.schema().as_str())
            .collect();
        self.check_extensions(base, &extension_uris, context)?;
        let selection = selection.resolve(self, instance.schema())?;

        let mut schemas = vec![Value::String(base.id.clone())];
        let mut extension_objects = Vec::new();
        for extension in instance.extensions() {
            if !extension.extensions().is_empty() {
                return Err(ValidationError::malformed(format!(
                    "extension '{}' cannot carry nested extensions",
                    extension.schema()
                ))
                .into());
            }
            let schema = self.resolve(extension.schema().as_str())?;
            schemas.push(Value::String(schema.id.clone()));
            let object = self.emit_schema_attributes(schema, extension, true, context, &selection)?;
            if !object.is_empty() {
                extension_objects.push((schema.id.clone(), object));
            }
        }

        let mut output = Map::new();
        output.insert("schemas".to_string(), Value::Array(schemas));
        output.extend(self.emit_schema_attributes(base, instance, false, context, &selection)?);
        for (urn, object) in extension_objects {
            output.insert(urn, Value::Object(object));
        }
        Ok(Value::Object(output))
    }

    /// Emit the visible attributes of one schema in declaration order.
    fn emit_schema_attributes(
        &self,
        schema: &Schema,
        instance: &ResourceInstance,
        is_extension: bool,
        context: Context,
        selection: &ResolvedSelection,
    ) -> ValidationResult<Map<String, Value>> {
        let prefix = is_extension.then_some(schema.id.as_str());

        for (key, value) in instance.values() {
            if !value.is_null() && schema.attribute(key).is_none() {
                return Err(ValidationError::unknown_attribute(qualify(prefix, key), &schema.id));
            }
        }

        let mut output = Map::new();
        for attr_def in &schema.attributes {
            let path = qualify(prefix, &attr_def.name);
            let Some(value) = instance.get(&attr_def.name) else {
                if context.enforces_required() && is_enforced(attr_def) {
                    return Err(ValidationError::missing_required(path));
                }
                continue;
            };

            let at = AttributeRef::top(instance.schema(), &attr_def.name);
            if !is_visible(attr_def, at, context, selection) {
                continue;
            }
            if let Some(emitted) = self.emit_value(attr_def, value, &path, at, context, selection)? {
                output.insert(attr_def.name.clone(), emitted);
            }
        }
        Ok(output)
    }

    /// Validate and filter one top-level value. `None` when nothing is left.
    fn emit_value(
        &self,
        attr_def: &AttributeDefinition,
        value: &Value,
        path: &str,
        at: AttributeRef<'_>,
        context: Context,
        selection: &ResolvedSelection,
    ) -> ValidationResult<Option<Value>> {
        self.validate_attribute_value(attr_def, value, path)?;
        if attr_def.data_type != AttributeType::Complex {
            return Ok(Some(value.clone()));
        }

        match value {
            Value::Array(items) => {
                let mut emitted = Vec::with_capacity(items.len());
                for item in items {
                    let item = match item {
                        Value::Null => continue,
                        Value::Object(item) => item,
                        other => return Err(complex_type_error(path, other)),
                    };
                    let object = self.emit_complex(attr_def, item, path, at, context, selection)?;
                    if !object.is_empty() {
                        emitted.push(Value::Object(object));
                    }
                }
                Ok((!emitted.is_empty()).then_some(Value::Array(emitted)))
            }
            Value::Object(object) => {
                let object = self.emit_complex(attr_def, object, path, at, context, selection)?;
                Ok((!object.is_empty()).then_some(Value::Object(object)))
            }
            other => Err(complex_type_error(path, other)),
        }
    }

    /// Emit the visible sub-attributes of one complex value.
    fn emit_complex(
        &self,
        attr_def: &AttributeDefinition,
        object: &Map<String, Value>,
        path: &str,
        at: AttributeRef<'_>,
        context: Context,
        selection: &ResolvedSelection,
    ) -> ValidationResult<Map<String, Value>> {
        for (key, value) in object {
            if !value.is_null() && attr_def.sub_attribute(key).is_none() {
                return Err(ValidationError::unknown_attribute(
                    format!("{path}.{key}"),
                    at.schema.as_str(),
                ));
            }
        }

        let mut output = Map::new();
        for sub_def in &attr_def.sub_attributes {
            let sub_path = format!("{path}.{}", sub_def.name);
            let Some((_, value)) = lookup(object, &sub_def.name).filter(|(_, v)| !v.is_null()) else {
                if context.enforces_required() && is_enforced(sub_def) {
                    return Err(ValidationError::missing_required(sub_path));
                }
                continue;
            };

            if !is_visible(sub_def, at.sub(&sub_def.name), context, selection) {
                continue;
            }
            self.validate_attribute_value(sub_def, value, &sub_path)?;
            output.insert(sub_def.name.clone(), value.clone());
        }
        Ok(output)
    }
}

/// `required` binds clients only for values they are allowed to send.
fn complex_type_error(path: &str, value: &Value) -> ValidationError {
    ValidationError::invalid_type(path, AttributeType::Complex.as_str(), SchemaRegistry::get_value_type(value))
}

fn is_enforced(attr_def: &AttributeDefinition) -> bool {
    attr_def.required && attr_def.mutability != Mutability::ReadOnly
}
