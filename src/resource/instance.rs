//! In-memory SCIM resource data.
//!
//! A [`ResourceInstance`] holds attribute values for one base schema plus one
//! nested instance per active extension. It carries no validation state; the
//! schema registry checks it against the usage context when it is serialized
//! or parsed.

use crate::resource::schema_uri::SchemaUri;
use serde_json::{Map, Value};

/// Attribute values of a single resource, keyed by attribute name.
///
/// Names are looked up without regard to ASCII case. Setting a value to
/// `null` is the same as removing it. Extensions are kept in activation
/// order, each as an instance whose schema is the extension URN.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceInstance {
    schema: SchemaUri,
    values: Map<String, Value>,
    extensions: Vec<ResourceInstance>,
}

impl ResourceInstance {
    /// Create an empty instance of the given base schema.
    pub fn new(schema: SchemaUri) -> Self {
        Self {
            schema,
            values: Map::new(),
            extensions: Vec::new(),
        }
    }

    /// Builder form of [`set`](Self::set).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Builder form of [`set_extension`](Self::set_extension).
    pub fn with_extension(mut self, extension: ResourceInstance) -> Self {
        self.set_extension(extension);
        self
    }

    pub fn schema(&self) -> &SchemaUri {
        &self.schema
    }

    /// Raw values in insertion order.
    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Active extensions in activation order.
    pub fn extensions(&self) -> &[ResourceInstance] {
        &self.extensions
    }

    /// URNs of the base schema followed by every active extension.
    pub fn schema_uris(&self) -> Vec<&SchemaUri> {
        std::iter::once(&self.schema)
            .chain(self.extensions.iter().map(|ext| &ext.schema))
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.key_of(name)
            .and_then(|key| self.values.get(key))
            .filter(|value| !value.is_null())
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        let key = self.key_of(name)?.to_string();
        self.values.get_mut(&key)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Set a value, replacing any value stored under a differently-cased key.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        if let Some(existing) = self.key_of(&name).map(str::to_string) {
            self.values.remove(&existing);
        }
        if !value.is_null() {
            self.values.insert(name, value);
        }
    }

    /// Remove a value, returning it if it was present.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let key = self.key_of(name)?.to_string();
        self.values.remove(&key).filter(|value| !value.is_null())
    }

    pub fn is_empty(&self) -> bool {
        self.values.values().all(Value::is_null)
            && self.extensions.iter().all(ResourceInstance::is_empty)
    }

    pub fn extension(&self, uri: &str) -> Option<&ResourceInstance> {
        self.extensions.iter().find(|ext| ext.schema.matches(uri))
    }

    pub fn extension_mut(&mut self, uri: &str) -> Option<&mut ResourceInstance> {
        self.extensions.iter_mut().find(|ext| ext.schema.matches(uri))
    }

    /// Activate an extension, replacing an existing one with the same URN in place.
    pub fn set_extension(&mut self, extension: ResourceInstance) {
        match self
            .extensions
            .iter_mut()
            .find(|ext| ext.schema == extension.schema)
        {
            Some(slot) => *slot = extension,
            None => self.extensions.push(extension),
        }
    }

    /// The extension for `uri`, activating an empty one if needed.
    pub fn extension_or_insert(&mut self, uri: SchemaUri) -> &mut ResourceInstance {
        let index = match self.extensions.iter().position(|ext| ext.schema == uri) {
            Some(index) => index,
            None => {
                self.extensions.push(ResourceInstance::new(uri));
                self.extensions.len() - 1
            }
        };
        &mut self.extensions[index]
    }

    pub fn remove_extension(&mut self, uri: &str) -> Option<ResourceInstance> {
        let index = self.extensions.iter().position(|ext| ext.schema.matches(uri))?;
        Some(self.extensions.remove(index))
    }

    fn key_of(&self, name: &str) -> Option<&str> {
        if self.values.contains_key(name) {
            return self.values.get_key_value(name).map(|(k, _)| k.as_str());
        }
        self.values
            .keys()
            .find(|key| key.eq_ignore_ascii_case(name))
            .map(String::as_str)
    }
}
