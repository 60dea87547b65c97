//! SCIM PATCH requests (RFC 7644 §3.5.2).
//!
//! A [`PatchOp`] is validated against the schemas of the resource it targets
//! before anything is applied: paths must resolve, `readOnly` attributes
//! cannot be written, `immutable` ones cannot be replaced and `required`
//! ones cannot be removed. Application is all-or-nothing; the instance is
//! only updated when every operation succeeds.
//!
//! Supported operations:
//! - `add` with a path sets a value, appends to a multi-valued attribute
//!   (skipping values already present) or merges into a complex one
//! - `add`/`replace` without a path merge an object whose keys are attribute
//!   names or extension URNs
//! - `replace` overwrites the value at the path
//! - `remove` deletes an attribute, a sub-attribute or, for multi-valued
//!   attributes given a `value`, the matching values
//!
//! Value filters in paths (`emails[type eq "work"]`) are not supported.

use super::{PATCH_OP_URN, require_message_schema};
use crate::error::{ScimResult, ValidationError, ValidationResult};
use crate::resource::{AttributePath, Context, ResourceInstance, SchemaUri};
use crate::schema::{AttributeDefinition, AttributeType, Mutability, Schema, SchemaRegistry};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// The `op` of a PATCH operation. Parsed without regard to case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOpKind {
    Add,
    Remove,
    Replace,
}

impl PatchOpKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Replace => "replace",
        }
    }
}

impl fmt::Display for PatchOpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PatchOpKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "add" => Ok(Self::Add),
            "remove" => Ok(Self::Remove),
            "replace" => Ok(Self::Replace),
            _ => Err(ValidationError::invalid_patch(format!(
                "unsupported operation '{s}'"
            ))),
        }
    }
}

impl Serialize for PatchOpKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PatchOpKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}

/// One entry of `Operations`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchOperation {
    pub op: PatchOpKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl PatchOperation {
    pub fn add(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            op: PatchOpKind::Add,
            path: Some(path.into()),
            value: Some(value.into()),
        }
    }

    pub fn replace(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            op: PatchOpKind::Replace,
            path: Some(path.into()),
            value: Some(value.into()),
        }
    }

    pub fn remove(path: impl Into<String>) -> Self {
        Self {
            op: PatchOpKind::Remove,
            path: Some(path.into()),
            value: None,
        }
    }

    /// Path-less operation whose value maps attribute names to values.
    pub fn without_path(op: PatchOpKind, value: impl Into<Value>) -> Self {
        Self {
            op,
            path: None,
            value: Some(value.into()),
        }
    }

    /// Limit a `remove` on a multi-valued attribute to matching values.
    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    fn value(&self) -> Option<&Value> {
        self.value.as_ref().filter(|value| !value.is_null())
    }

    fn describe(&self) -> String {
        match &self.path {
            Some(path) => format!("{} '{path}'", self.op),
            None => format!("{} without path", self.op),
        }
    }
}

/// A PATCH request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchOp {
    #[serde(default)]
    pub schemas: Vec<String>,
    #[serde(rename = "Operations", alias = "operations")]
    pub operations: Vec<PatchOperation>,
}

/// What a path addresses once resolved.
enum Target<'r> {
    /// No path: the whole resource
    Resource,
    /// A whole extension schema
    Extension(&'r Schema),
    Attribute {
        schema: &'r Schema,
        is_extension: bool,
        attribute: &'r AttributeDefinition,
        sub_attribute: Option<&'r AttributeDefinition>,
    },
}

impl PatchOp {
    pub fn new(operations: Vec<PatchOperation>) -> Self {
        Self {
            schemas: vec![PATCH_OP_URN.to_string()],
            operations,
        }
    }

    pub fn from_json(value: &Value) -> ScimResult<Self> {
        let patch: Self = serde_json::from_value(value.clone())?;
        require_message_schema(&patch.schemas, PATCH_OP_URN)?;
        Ok(patch)
    }

    pub fn to_json(&self) -> ScimResult<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Check every operation against the schemas reachable from `base`.
    pub fn validate(&self, registry: &SchemaRegistry, base: &SchemaUri) -> ScimResult<()> {
        if self.operations.is_empty() {
            return Err(ValidationError::invalid_patch("at least one operation is required").into());
        }
        let base_schema = registry.resolve(base.as_str())?;
        for operation in &self.operations {
            validate_operation(registry, base_schema, operation)?;
        }
        Ok(())
    }

    /// Apply all operations to `instance`, reporting whether it changed.
    ///
    /// On error the instance is left untouched.
    pub fn apply(&self, registry: &SchemaRegistry, instance: &mut ResourceInstance) -> ScimResult<bool> {
        self.validate(registry, instance.schema())?;
        let base_schema = registry.resolve(instance.schema().as_str())?;

        let mut working = instance.clone();
        let mut changed = false;
        for operation in &self.operations {
            changed |= apply_operation(registry, base_schema, operation, &mut working)?;
        }

        log::debug!(
            "Applied {} PATCH operations to {} resource (changed: {changed})",
            self.operations.len(),
            instance.schema()
        );
        if changed {
            *instance = working;
        }
        Ok(changed)
    }
}

fn resolve_target<'r>(
    registry: &'r SchemaRegistry,
    base: &'r Schema,
    path: Option<&str>,
) -> ScimResult<Target<'r>> {
    let Some(raw) = path else {
        return Ok(Target::Resource);
    };
    let base_uri = SchemaUri::new(base.id.as_str())?;
    let resolved = AttributePath::parse(raw)?.resolve(registry, &base_uri)?;
    let schema = registry.resolve(resolved.schema.as_str())?;
    let is_extension = !schema.id.eq_ignore_ascii_case(&base.id);
    if is_extension {
        registry.check_extensions(base, &[schema.id.as_str()], Context::RequestPatch)?;
    }

    let Some(name) = &resolved.attribute else {
        if !is_extension {
            return Err(ValidationError::invalid_path(raw, "path names the base schema itself").into());
        }
        return Ok(Target::Extension(schema));
    };
    let attribute = schema
        .attribute(name)
        .ok_or_else(|| ValidationError::invalid_path(raw, "attribute is not declared"))?;
    let sub_attribute = match &resolved.sub_attribute {
        Some(sub) => Some(
            attribute
                .sub_attribute(sub)
                .ok_or_else(|| ValidationError::invalid_path(raw, "sub-attribute is not declared"))?,
        ),
        None => None,
    };
    Ok(Target::Attribute {
        schema,
        is_extension,
        attribute,
        sub_attribute,
    })
}

fn validate_operation(
    registry: &SchemaRegistry,
    base: &Schema,
    operation: &PatchOperation,
) -> ScimResult<()> {
    let target = resolve_target(registry, base, operation.path.as_deref())?;
    let path = operation.path.as_deref().unwrap_or_default();

    if operation.op == PatchOpKind::Remove {
        return match target {
            Target::Resource => Err(ValidationError::invalid_patch("remove requires a path").into()),
            Target::Extension(schema) => {
                let required = registry
                    .resource_type_for_schema(&base.id)
                    .and_then(|rt| rt.extension(&schema.id))
                    .is_some_and(|ext| ext.required);
                if required {
                    return Err(ValidationError::MissingRequiredExtension {
                        extension: schema.id.clone(),
                    }
                    .into());
                }
                Ok(())
            }
            Target::Attribute {
                attribute,
                sub_attribute,
                ..
            } => {
                check_writable(attribute, sub_attribute, path, operation.op)?;
                // only some values of a multi-valued attribute can go
                let partial = sub_attribute.is_none() && attribute.multi_valued && operation.value().is_some();
                if sub_attribute.unwrap_or(attribute).required && !partial {
                    return Err(ValidationError::missing_required(path).into());
                }
                Ok(())
            }
        };
    }

    let value = operation
        .value()
        .ok_or_else(|| ValidationError::invalid_patch(format!("{} requires a value", operation.describe())))?;

    match target {
        Target::Resource => {
            let members = value.as_object().ok_or_else(|| {
                ValidationError::invalid_patch(format!("{} requires an object value", operation.describe()))
            })?;
            for (key, member) in members {
                match registry.get_schema(key) {
                    Some(extension) if !extension.id.eq_ignore_ascii_case(&base.id) => {
                        registry.check_extensions(base, &[extension.id.as_str()], Context::RequestPatch)?;
                        validate_members(registry, extension, Some(&extension.id), member, operation)?;
                    }
                    _ => {
                        let attribute = base
                            .attribute(key)
                            .ok_or_else(|| ValidationError::unknown_attribute(key, &base.id))?;
                        check_writable(attribute, None, key, operation.op)?;
                        validate_patch_value(registry, attribute, member, key)?;
                    }
                }
            }
            Ok(())
        }
        Target::Extension(schema) => validate_members(registry, schema, Some(&schema.id), value, operation),
        Target::Attribute {
            attribute,
            sub_attribute,
            ..
        } => {
            check_writable(attribute, sub_attribute, path, operation.op)?;
            validate_patch_value(registry, sub_attribute.unwrap_or(attribute), value, path)?;
            Ok(())
        }
    }
}

/// Validate an object of attribute values for one schema.
fn validate_members(
    registry: &SchemaRegistry,
    schema: &Schema,
    prefix: Option<&str>,
    value: &Value,
    operation: &PatchOperation,
) -> ScimResult<()> {
    let members = value.as_object().ok_or_else(|| {
        ValidationError::invalid_patch(format!(
            "{} requires an object of '{}' attributes",
            operation.describe(),
            schema.id
        ))
    })?;
    for (key, member) in members {
        let path = match prefix {
            Some(urn) => format!("{urn}:{key}"),
            None => key.clone(),
        };
        let attribute = schema
            .attribute(key)
            .ok_or_else(|| ValidationError::unknown_attribute(&path, &schema.id))?;
        check_writable(attribute, None, &path, operation.op)?;
        validate_patch_value(registry, attribute, member, &path)?;
    }
    Ok(())
}

fn check_writable(
    attribute: &AttributeDefinition,
    sub_attribute: Option<&AttributeDefinition>,
    path: &str,
    op: PatchOpKind,
) -> ValidationResult<()> {
    let read_only = attribute.mutability == Mutability::ReadOnly
        || sub_attribute.is_some_and(|sub| sub.mutability == Mutability::ReadOnly);
    if read_only {
        return Err(ValidationError::ReadOnlyViolation {
            attribute: path.to_string(),
            context: Context::RequestPatch.to_string(),
        });
    }
    let target = sub_attribute.unwrap_or(attribute);
    if op == PatchOpKind::Replace && target.mutability == Mutability::Immutable {
        return Err(ValidationError::ImmutableViolation {
            attribute: path.to_string(),
        });
    }
    Ok(())
}

/// A single value is accepted for a multi-valued attribute and treated as
/// a one-element array. Complex values may only use declared sub-attributes.
fn validate_patch_value(
    registry: &SchemaRegistry,
    attribute: &AttributeDefinition,
    value: &Value,
    path: &str,
) -> ValidationResult<()> {
    let value = as_attribute_value(attribute, value);
    registry.validate_attribute_value(attribute, &value, path)?;

    if attribute.data_type == AttributeType::Complex {
        let objects: Vec<&Map<String, Value>> = match &value {
            Value::Array(items) => items.iter().filter_map(Value::as_object).collect(),
            Value::Object(object) => vec![object],
            _ => Vec::new(),
        };
        for object in objects {
            for (key, sub_value) in object {
                let sub_path = format!("{path}.{key}");
                let sub = attribute
                    .sub_attribute(key)
                    .ok_or_else(|| ValidationError::unknown_attribute(&sub_path, &attribute.name))?;
                if sub.mutability == Mutability::ReadOnly {
                    return Err(ValidationError::ReadOnlyViolation {
                        attribute: sub_path,
                        context: Context::RequestPatch.to_string(),
                    });
                }
                if !sub_value.is_null() {
                    registry.validate_attribute_value(sub, sub_value, &sub_path)?;
                }
            }
        }
    }
    Ok(())
}

fn as_attribute_value(attribute: &AttributeDefinition, value: &Value) -> Value {
    if attribute.multi_valued && !value.is_array() {
        Value::Array(vec![value.clone()])
    } else {
        value.clone()
    }
}

fn apply_operation(
    registry: &SchemaRegistry,
    base: &Schema,
    operation: &PatchOperation,
    instance: &mut ResourceInstance,
) -> ScimResult<bool> {
    let path = operation.path.as_deref().unwrap_or_default();
    let target = resolve_target(registry, base, operation.path.as_deref())?;

    match (operation.op, target) {
        (PatchOpKind::Remove, Target::Extension(schema)) => {
            Ok(instance.remove_extension(&schema.id).is_some())
        }
        (
            PatchOpKind::Remove,
            Target::Attribute {
                schema,
                is_extension,
                attribute,
                sub_attribute,
            },
        ) => {
            let holder = if is_extension {
                match instance.extension_mut(&schema.id) {
                    Some(extension) => extension,
                    None => return Ok(false),
                }
            } else {
                instance
            };
            let changed = match sub_attribute {
                Some(sub) => remove_sub_attribute(holder, attribute, sub),
                None => remove_attribute(holder, attribute, operation.value()),
            };
            if changed && attribute.required && !holder.contains(&attribute.name) {
                let name = if is_extension {
                    format!("{}:{}", schema.id, attribute.name)
                } else {
                    attribute.name.clone()
                };
                return Err(ValidationError::missing_required(name).into());
            }
            Ok(changed)
        }
        (PatchOpKind::Remove, Target::Resource) => {
            Err(ValidationError::invalid_patch("remove requires a path").into())
        }
        (op, target) => {
            let value = operation
                .value()
                .ok_or_else(|| ValidationError::invalid_patch(format!("{} requires a value", operation.describe())))?;
            match target {
                Target::Resource => {
                    let mut changed = false;
                    for (key, member) in value.as_object().into_iter().flatten() {
                        changed |= match registry.get_schema(key) {
                            Some(extension) if !extension.id.eq_ignore_ascii_case(&base.id) => {
                                write_extension(instance, extension, member, op)?
                            }
                            _ => match base.attribute(key) {
                                Some(attribute) => write_attribute(instance, attribute, member, op, key)?,
                                None => return Err(ValidationError::unknown_attribute(key, &base.id).into()),
                            },
                        };
                    }
                    Ok(changed)
                }
                Target::Extension(schema) => write_extension(instance, schema, value, op),
                Target::Attribute {
                    schema,
                    is_extension,
                    attribute,
                    sub_attribute,
                } => {
                    let holder = if is_extension {
                        instance.extension_or_insert(SchemaUri::new(schema.id.as_str())?)
                    } else {
                        instance
                    };
                    match sub_attribute {
                        Some(sub) => Ok(write_sub_attribute(holder, attribute, sub, value, path)?),
                        None => Ok(write_attribute(holder, attribute, value, op, path)?),
                    }
                }
            }
        }
    }
}

/// `add` or `replace` a whole extension. Replace discards attributes not given.
fn write_extension(
    instance: &mut ResourceInstance,
    schema: &Schema,
    value: &Value,
    op: PatchOpKind,
) -> ScimResult<bool> {
    let uri = SchemaUri::new(schema.id.as_str())?;
    if op == PatchOpKind::Replace {
        let mut replacement = ResourceInstance::new(uri);
        for (key, member) in value.as_object().into_iter().flatten() {
            if let Some(attribute) = schema.attribute(key) {
                replacement.set(attribute.name.clone(), as_attribute_value(attribute, member));
            }
        }
        let changed = instance.extension(&schema.id) != Some(&replacement);
        instance.set_extension(replacement);
        return Ok(changed);
    }

    let extension = instance.extension_or_insert(uri);
    let mut changed = false;
    for (key, member) in value.as_object().into_iter().flatten() {
        if let Some(attribute) = schema.attribute(key) {
            let path = format!("{}:{}", schema.id, attribute.name);
            changed |= write_attribute(extension, attribute, member, op, &path)?;
        }
    }
    Ok(changed)
}

fn write_attribute(
    instance: &mut ResourceInstance,
    attribute: &AttributeDefinition,
    value: &Value,
    op: PatchOpKind,
    path: &str,
) -> ValidationResult<bool> {
    let existing = instance.get(&attribute.name).cloned();
    let updated = match (op, &existing) {
        (PatchOpKind::Add, Some(Value::Array(items))) if attribute.multi_valued => {
            let mut items = items.clone();
            for item in as_attribute_value(attribute, value).as_array().into_iter().flatten() {
                if !item.is_null() && !items.contains(item) {
                    items.push(item.clone());
                }
            }
            Value::Array(items)
        }
        (PatchOpKind::Add, Some(Value::Object(current)))
            if attribute.data_type == AttributeType::Complex && !attribute.multi_valued =>
        {
            let mut merged = current.clone();
            for (key, sub_value) in value.as_object().into_iter().flatten() {
                let name = attribute
                    .sub_attribute(key)
                    .map_or(key.as_str(), |sub| sub.name.as_str());
                set_ignore_case(&mut merged, name, sub_value.clone());
            }
            Value::Object(merged)
        }
        _ => as_attribute_value(attribute, value),
    };

    if existing.as_ref() == Some(&updated) {
        return Ok(false);
    }
    if attribute.mutability == Mutability::Immutable && existing.is_some() {
        return Err(ValidationError::ImmutableViolation {
            attribute: path.to_string(),
        });
    }
    instance.set(attribute.name.clone(), updated);
    Ok(true)
}

/// Set `parent.sub`. On a multi-valued parent every existing value is updated.
fn write_sub_attribute(
    instance: &mut ResourceInstance,
    attribute: &AttributeDefinition,
    sub: &AttributeDefinition,
    value: &Value,
    path: &str,
) -> ValidationResult<bool> {
    let set_in = |object: &mut Map<String, Value>| -> ValidationResult<bool> {
        let existing = object
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(&sub.name))
            .map(|(_, v)| v.clone())
            .filter(|v| !v.is_null());
        if existing.as_ref() == Some(value) {
            return Ok(false);
        }
        if sub.mutability == Mutability::Immutable && existing.is_some() {
            return Err(ValidationError::ImmutableViolation {
                attribute: path.to_string(),
            });
        }
        set_ignore_case(object, &sub.name, value.clone());
        Ok(true)
    };

    let updated = match instance.get(&attribute.name).cloned() {
        None if !attribute.multi_valued => {
            let mut object = Map::new();
            set_in(&mut object)?;
            Value::Object(object)
        }
        Some(Value::Object(mut object)) => {
            if !set_in(&mut object)? {
                return Ok(false);
            }
            Value::Object(object)
        }
        Some(Value::Array(mut items)) if !items.is_empty() => {
            let mut changed = false;
            for item in items.iter_mut() {
                if let Value::Object(object) = item {
                    changed |= set_in(object)?;
                }
            }
            if !changed {
                return Ok(false);
            }
            Value::Array(items)
        }
        _ => {
            return Err(ValidationError::invalid_patch(format!(
                "'{path}' has no value to modify"
            )));
        }
    };
    instance.set(attribute.name.clone(), updated);
    Ok(true)
}

fn remove_attribute(
    instance: &mut ResourceInstance,
    attribute: &AttributeDefinition,
    value: Option<&Value>,
) -> bool {
    match (value, instance.get(&attribute.name).cloned()) {
        (Some(value), Some(Value::Array(mut items))) if attribute.multi_valued => {
            let doomed = as_attribute_value(attribute, value);
            let doomed = doomed.as_array().map(Vec::as_slice).unwrap_or_default();
            let before = items.len();
            items.retain(|item| !doomed.contains(item));
            if items.len() == before {
                return false;
            }
            if items.is_empty() {
                instance.remove(&attribute.name);
            } else {
                instance.set(attribute.name.clone(), Value::Array(items));
            }
            true
        }
        _ => instance.remove(&attribute.name).is_some(),
    }
}

fn remove_sub_attribute(
    instance: &mut ResourceInstance,
    attribute: &AttributeDefinition,
    sub: &AttributeDefinition,
) -> bool {
    let remove_from = |object: &mut Map<String, Value>| -> bool {
        let key = object
            .keys()
            .find(|key| key.eq_ignore_ascii_case(&sub.name))
            .cloned();
        key.and_then(|key| object.remove(&key)).is_some()
    };

    let (changed, updated) = match instance.get(&attribute.name).cloned() {
        Some(Value::Object(mut object)) => {
            let changed = remove_from(&mut object);
            (changed, (!object.is_empty()).then_some(Value::Object(object)))
        }
        Some(Value::Array(items)) => {
            let mut changed = false;
            let mut kept = Vec::with_capacity(items.len());
            for mut item in items {
                if let Value::Object(object) = &mut item {
                    changed |= remove_from(object);
                    if object.is_empty() {
                        continue;
                    }
                }
                kept.push(item);
            }
            (changed, (!kept.is_empty()).then_some(Value::Array(kept)))
        }
        _ => return false,
    };

    if changed {
        match updated {
            Some(value) => instance.set(attribute.name.clone(), value),
            None => {
                instance.remove(&attribute.name);
            }
        }
    }
    changed
}

/// Insert under `name`, replacing a differently-cased key.
fn set_ignore_case(object: &mut Map<String, Value>, name: &str, value: Value) {
    if let Some(existing) = object
        .keys()
        .find(|key| key.eq_ignore_ascii_case(name))
        .cloned()
    {
        object.remove(&existing);
    }
    if !value.is_null() {
        object.insert(name.to_string(), value);
    }
}
