//! Resource type definitions (RFC 7643 §6).
//!
//! A resource type binds a base schema to the extensions it may carry and
//! says which of them are mandatory.

use serde::{Deserialize, Serialize};

/// A SCIM resource type such as `User` or `Group`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceType {
    pub id: String,
    pub name: String,
    pub endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// URN of the base schema
    pub schema: String,
    #[serde(default)]
    pub schema_extensions: Vec<SchemaExtension>,
}

/// An extension declared by a resource type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaExtension {
    pub schema: String,
    #[serde(default)]
    pub required: bool,
}

impl ResourceType {
    /// Resource type named after its endpoint, with no extensions.
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>, schema: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: name.clone(),
            name,
            endpoint: endpoint.into(),
            description: None,
            schema: schema.into(),
            schema_extensions: Vec::new(),
        }
    }

    pub fn with_extension(mut self, schema: impl Into<String>, required: bool) -> Self {
        self.schema_extensions.push(SchemaExtension {
            schema: schema.into(),
            required,
        });
        self
    }

    /// The declared extension for `urn`, compared without regard to case.
    pub fn extension(&self, urn: &str) -> Option<&SchemaExtension> {
        self.schema_extensions
            .iter()
            .find(|ext| ext.schema.eq_ignore_ascii_case(urn))
    }

    pub fn required_extensions(&self) -> impl Iterator<Item = &str> {
        self.schema_extensions
            .iter()
            .filter(|ext| ext.required)
            .map(|ext| ext.schema.as_str())
    }
}
