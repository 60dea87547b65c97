//! Context-aware parsing of SCIM payloads into resource instances.
//!
//! The `schemas` array decides the base schema and the active extensions.
//! Every other key must name a declared attribute; the unknown-key policy
//! from [`DeserializeOptions`] applies at every level, including inside
//! complex values and extension objects. Mutability is checked against the
//! context, and immutable values against the original state when one is
//! supplied.

use super::registry::SchemaRegistry;
use super::types::{AttributeDefinition, AttributeType, Mutability, Returned, Schema};
use super::validation::{lookup, qualify};
use crate::config::{DeserializeOptions, Strictness};
use crate::error::{ScimResult, ValidationError, ValidationResult};
use crate::resource::{Context, ResourceInstance, SchemaUri};

use serde_json::{Map, Value};

impl SchemaRegistry {
    /// Parse JSON bytes received in `context`.
    pub fn deserialize(
        &self,
        bytes: &[u8],
        context: Context,
        strictness: Strictness,
    ) -> ScimResult<ResourceInstance> {
        self.deserialize_with(bytes, context, &DeserializeOptions::from(strictness))
    }

    /// Parse JSON bytes received in `context` with full options.
    pub fn deserialize_with(
        &self,
        bytes: &[u8],
        context: Context,
        options: &DeserializeOptions<'_>,
    ) -> ScimResult<ResourceInstance> {
        let value: Value = serde_json::from_slice(bytes)?;
        self.from_json(&value, context, options)
    }

    /// Parse an already decoded JSON value received in `context`.
    pub fn from_json(
        &self,
        value: &Value,
        context: Context,
        options: &DeserializeOptions<'_>,
    ) -> ScimResult<ResourceInstance> {
        let object = value
            .as_object()
            .ok_or_else(|| ValidationError::malformed("resource must be a JSON object"))?;

        let listed = self.listed_schemas(object)?;
        let is_key = |schema: &Schema| {
            object
                .keys()
                .any(|key| key.eq_ignore_ascii_case(&schema.id))
        };
        let base = listed
            .iter()
            .copied()
            .filter(|&schema| !is_key(schema))
            .find(|&schema| self.resource_type_for_schema(&schema.id).is_some())
            .or_else(|| listed.iter().copied().find(|&schema| !is_key(schema)))
            .ok_or_else(|| ValidationError::malformed("'schemas' names no base schema"))?;
        let mut extensions: Vec<&Schema> = listed
            .iter()
            .copied()
            .filter(|schema| schema.id != base.id)
            .collect();
        for (key, value) in object {
            let Some(schema) = self.get_schema(key).filter(|_| !value.is_null()) else {
                continue;
            };
            if !extensions.iter().any(|active| active.id == schema.id) {
                log::debug!("Activating extension {} found only as a payload key", schema.id);
                extensions.push(schema);
            }
        }

        log::debug!(
            "Deserializing {} resource with {} extensions in {} context",
            base.id,
            extensions.len(),
            context
        );

        let extension_ids: Vec<&str> = extensions.iter().map(|schema| schema.id.as_str()).collect();
        self.check_extensions(base, &extension_ids, context)?;

        let mut base_values = Map::new();
        let mut extension_values: Vec<Option<&Map<String, Value>>> = vec![None; extensions.len()];
        for (key, value) in object {
            if key.eq_ignore_ascii_case("schemas") {
                continue;
            }
            if let Some(position) = extensions
                .iter()
                .position(|schema| schema.id.eq_ignore_ascii_case(key))
            {
                match value {
                    Value::Object(nested) => extension_values[position] = Some(nested),
                    Value::Null => {}
                    _ => {
                        return Err(ValidationError::malformed(format!(
                            "extension '{key}' must be a JSON object"
                        ))
                        .into());
                    }
                }
                continue;
            }
            base_values.insert(key.clone(), value.clone());
        }

        let original = options.original;
        let mut instance = self.read_schema_attributes(
            base,
            &base_values,
            None,
            context,
            options.strictness,
            original.map(ResourceInstance::values),
        )?;

        for (schema, nested) in extensions.iter().zip(extension_values) {
            let empty = Map::new();
            let original_values = original
                .and_then(|original| original.extension(&schema.id))
                .map(ResourceInstance::values);
            let extension = self.read_schema_attributes(
                schema,
                nested.unwrap_or(&empty),
                Some(schema.id.as_str()),
                context,
                options.strictness,
                original_values,
            )?;
            instance.set_extension(extension);
        }

        Ok(instance)
    }

    /// The registered schemas named by the `schemas` array, in order.
    fn listed_schemas(&self, object: &Map<String, Value>) -> ScimResult<Vec<&Schema>> {
        let schemas = match lookup(object, "schemas") {
            None | Some((_, Value::Null)) => return Err(ValidationError::MissingSchemas.into()),
            Some((_, Value::Array(schemas))) => schemas,
            Some(_) => {
                return Err(ValidationError::malformed("'schemas' must be an array of URNs").into());
            }
        };
        if schemas.is_empty() {
            return Err(ValidationError::EmptySchemas.into());
        }

        let mut listed: Vec<&Schema> = Vec::with_capacity(schemas.len());
        for entry in schemas {
            let urn = entry
                .as_str()
                .ok_or_else(|| ValidationError::malformed("'schemas' must be an array of URNs"))?;
            let uri = SchemaUri::new(urn)?;
            let schema = self.resolve(uri.as_str())?;
            if !listed.iter().any(|seen| seen.id == schema.id) {
                listed.push(schema);
            }
        }
        Ok(listed)
    }

    /// Read one schema's attributes from `object` into a fresh instance.
    fn read_schema_attributes(
        &self,
        schema: &Schema,
        object: &Map<String, Value>,
        prefix: Option<&str>,
        context: Context,
        strictness: Strictness,
        original: Option<&Map<String, Value>>,
    ) -> ValidationResult<ResourceInstance> {
        let mut instance = ResourceInstance::new(SchemaUri::new(schema.id.as_str())?);

        for (key, value) in object {
            let path = qualify(prefix, key);
            let Some(attr_def) = schema.attribute(key) else {
                unknown_key(strictness, &path, &schema.id)?;
                continue;
            };
            if value.is_null() {
                continue;
            }

            let path = qualify(prefix, &attr_def.name);
            check_mutability(attr_def, &path, context)?;
            check_never_returned(attr_def, &path, context)?;
            let value = self.read_value(attr_def, value, &path, &schema.id, context, strictness)?;

            if context == Context::RequestReplace {
                if let Some(previous) = original.and_then(|o| lookup(o, &attr_def.name)) {
                    check_immutable(attr_def, &value, previous.1, &path)?;
                }
            }
            instance.set(attr_def.name.clone(), value);
        }

        if let (Context::RequestReplace, Some(original)) = (context, original) {
            for attr_def in &schema.attributes {
                if instance.contains(&attr_def.name) {
                    continue;
                }
                if let Some((_, previous)) = lookup(original, &attr_def.name) {
                    check_immutable(attr_def, &Value::Null, previous, &qualify(prefix, &attr_def.name))?;
                }
            }
        }

        if let Some(missing) = missing_always(&schema.attributes, context, |name| instance.contains(name)) {
            return Err(returned_violation(&qualify(prefix, &missing.name), "always", context));
        }

        if context.enforces_required() {
            if let Some(missing) = schema
                .attributes
                .iter()
                .find(|attr| is_enforced(attr) && !instance.contains(&attr.name))
            {
                return Err(ValidationError::missing_required(qualify(prefix, &missing.name)));
            }
        }

        Ok(instance)
    }

    /// Validate one top-level value and normalize complex values.
    fn read_value(
        &self,
        attr_def: &AttributeDefinition,
        value: &Value,
        path: &str,
        schema_id: &str,
        context: Context,
        strictness: Strictness,
    ) -> ValidationResult<Value> {
        self.validate_attribute_value(attr_def, value, path)?;
        if attr_def.data_type != AttributeType::Complex {
            return Ok(value.clone());
        }

        let read = |object: &Map<String, Value>| {
            self.read_complex(attr_def, object, path, schema_id, context, strictness)
                .map(Value::Object)
        };
        match value {
            Value::Array(items) => items
                .iter()
                .filter(|item| !item.is_null())
                .map(|item| match item {
                    Value::Object(object) => read(object),
                    _ => Ok(item.clone()),
                })
                .collect::<ValidationResult<Vec<_>>>()
                .map(Value::Array),
            Value::Object(object) => read(object),
            _ => Ok(value.clone()),
        }
    }

    /// Check and canonicalize the sub-attributes of one complex value.
    fn read_complex(
        &self,
        attr_def: &AttributeDefinition,
        object: &Map<String, Value>,
        path: &str,
        schema_id: &str,
        context: Context,
        strictness: Strictness,
    ) -> ValidationResult<Map<String, Value>> {
        let mut output = Map::new();
        for (key, value) in object {
            let Some(sub_def) = attr_def.sub_attribute(key) else {
                unknown_key(strictness, &format!("{path}.{key}"), schema_id)?;
                continue;
            };
            if value.is_null() {
                continue;
            }
            let sub_path = format!("{path}.{}", sub_def.name);
            check_mutability(sub_def, &sub_path, context)?;
            check_never_returned(sub_def, &sub_path, context)?;
            self.validate_attribute_value(sub_def, value, &sub_path)?;
            output.insert(sub_def.name.clone(), value.clone());
        }

        if let Some(missing) = missing_always(&attr_def.sub_attributes, context, |name| output.contains_key(name)) {
            return Err(returned_violation(&format!("{path}.{}", missing.name), "always", context));
        }

        if context.enforces_required() {
            if let Some(missing) = attr_def
                .sub_attributes
                .iter()
                .find(|sub| is_enforced(sub) && !output.contains_key(&sub.name))
            {
                return Err(ValidationError::missing_required(format!(
                    "{path}.{}",
                    missing.name
                )));
            }
        }

        Ok(output)
    }
}

fn unknown_key(strictness: Strictness, path: &str, schema_id: &str) -> ValidationResult<()> {
    match strictness {
        Strictness::Strict => Err(ValidationError::unknown_attribute(path, schema_id)),
        Strictness::Lenient => {
            log::warn!("Dropping unknown attribute '{path}' of schema {schema_id}");
            Ok(())
        }
    }
}

/// Clients never send server-assigned values, and never send write-only
/// values where they could only be read back.
fn check_mutability(attr_def: &AttributeDefinition, path: &str, context: Context) -> ValidationResult<()> {
    match attr_def.mutability {
        Mutability::ReadOnly if context.is_request() => Err(ValidationError::ReadOnlyViolation {
            attribute: path.to_string(),
            context: context.to_string(),
        }),
        Mutability::WriteOnly if context.is_read_request() => Err(ValidationError::WriteOnlyViolation {
            attribute: path.to_string(),
            context: context.to_string(),
        }),
        _ => Ok(()),
    }
}

/// A response never carries a `never` value.
fn check_never_returned(attr_def: &AttributeDefinition, path: &str, context: Context) -> ValidationResult<()> {
    if context.is_response() && attr_def.returned == Returned::Never {
        return Err(returned_violation(path, "never", context));
    }
    Ok(())
}

/// The first `always` attribute a response payload left out.
fn missing_always<'a>(
    attributes: &'a [AttributeDefinition],
    context: Context,
    present: impl Fn(&str) -> bool,
) -> Option<&'a AttributeDefinition> {
    if !context.is_response() {
        return None;
    }
    attributes
        .iter()
        .find(|attr| attr.returned == Returned::Always && !present(&attr.name))
}

fn returned_violation(path: &str, returned: &str, context: Context) -> ValidationError {
    ValidationError::ReturnedViolation {
        attribute: path.to_string(),
        returned: returned.to_string(),
        context: context.to_string(),
    }
}

/// Compare a replacement value with the known one. `Null` stands for a
/// value the replacement left out.
///
/// Recurses into single-valued complex values so an immutable sub-attribute
/// is protected even when its parent is read-write or dropped entirely.
fn check_immutable(
    attr_def: &AttributeDefinition,
    value: &Value,
    previous: &Value,
    path: &str,
) -> ValidationResult<()> {
    if previous.is_null() {
        return Ok(());
    }
    if attr_def.mutability == Mutability::Immutable && !same_value(attr_def, value, previous) {
        return Err(ValidationError::ImmutableViolation {
            attribute: path.to_string(),
        });
    }
    if attr_def.data_type == AttributeType::Complex && !attr_def.multi_valued {
        if let Value::Object(old) = previous {
            let new = value.as_object();
            for sub_def in &attr_def.sub_attributes {
                let Some((_, old_sub)) = lookup(old, &sub_def.name) else {
                    continue;
                };
                let new_sub = new
                    .and_then(|new| lookup(new, &sub_def.name))
                    .map_or(&Value::Null, |(_, v)| v);
                check_immutable(sub_def, new_sub, old_sub, &format!("{path}.{}", sub_def.name))?;
            }
        }
    }
    Ok(())
}

/// Strings compare per `caseExact`; everything else structurally.
fn same_value(attr_def: &AttributeDefinition, a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::String(a), Value::String(b)) if !attr_def.case_exact => a.eq_ignore_ascii_case(b),
        _ => a == b,
    }
}

fn is_enforced(attr_def: &AttributeDefinition) -> bool {
    attr_def.required && attr_def.mutability != Mutability::ReadOnly
}
