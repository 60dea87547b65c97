//! Schema registry for loading, managing, and accessing SCIM schemas.
//!
//! The registry maps schema URNs to [`Schema`] definitions and base schemas
//! to their [`ResourceType`]. It is populated at startup through `&mut self`
//! methods and shared read-only afterwards; the context-aware engine is
//! implemented as `impl SchemaRegistry` blocks in sibling modules.

use super::embedded;
use super::resource_type::ResourceType;
use super::types::{AttributeDefinition, AttributeType, Schema};
use crate::error::{ScimError, ScimResult, ValidationError};
use crate::resource::{Context, SchemaUri};

use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Registry of schemas and resource types.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: Vec<Schema>,
    /// Lower-cased URN to position in `schemas`
    index: HashMap<String, usize>,
    resource_types: Vec<ResourceType>,
}

impl SchemaRegistry {
    /// Create a registry with the embedded RFC 7643 schemas and resource types.
    ///
    /// Registers User, Group, EnterpriseUser and ServiceProviderConfig, then
    /// the User and Group resource types (User declares EnterpriseUser as an
    /// optional extension).
    pub fn new() -> ScimResult<Self> {
        let mut registry = Self::empty();
        for content in [
            embedded::core_user_schema(),
            embedded::core_group_schema(),
            embedded::enterprise_user_schema(),
            embedded::service_provider_config_schema(),
        ] {
            registry.register(Self::load_schema_from_str(content)?)?;
        }

        let resource_types: Vec<ResourceType> =
            serde_json::from_str(embedded::core_resource_types())?;
        for resource_type in resource_types {
            registry.register_resource_type(resource_type)?;
        }

        Ok(registry)
    }

    /// Create a registry with nothing registered.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a registry from every `*.json` schema file in a directory.
    ///
    /// Files are registered in file-name order so duplicate detection is
    /// deterministic.
    pub fn from_schema_dir<P: AsRef<Path>>(schema_dir: P) -> ScimResult<Self> {
        let dir = schema_dir.as_ref();
        let entries = fs::read_dir(dir).map_err(|e| load_error(dir, e))?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| load_error(dir, e))?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut registry = Self::empty();
        for path in paths {
            registry.register(Self::load_schema_from_file(&path)?)?;
        }
        Ok(registry)
    }

    /// Load a schema from a JSON file.
    pub fn load_schema_from_file<P: AsRef<Path>>(path: P) -> ScimResult<Schema> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| load_error(path, e))?;
        Self::load_schema_from_str(&content).map_err(|e| match e {
            ScimError::Json(e) => load_error(path, e),
            other => other,
        })
    }

    /// Load a schema from a JSON string in RFC 7643 §7 form.
    pub fn load_schema_from_str(content: &str) -> ScimResult<Schema> {
        Ok(serde_json::from_str(content)?)
    }

    /// Register a schema under its `id`.
    ///
    /// Fails with [`ScimError::DuplicateSchema`] if the URN (compared without
    /// regard to case) is already present, or with
    /// [`ScimError::InvalidSchemaDefinition`] if the definition is unusable.
    pub fn register(&mut self, schema: Schema) -> ScimResult<()> {
        Self::check_definition(&schema)?;

        let key = schema.id.to_ascii_lowercase();
        if self.index.contains_key(&key) {
            return Err(ScimError::duplicate_schema(&schema.id));
        }

        log::info!(
            "Registered schema {} ({} attributes)",
            schema.id,
            schema.attributes.len()
        );
        self.index.insert(key, self.schemas.len());
        self.schemas.push(schema);
        Ok(())
    }

    /// Register a resource type binding a base schema to its extensions.
    ///
    /// The base schema and every declared extension must already be
    /// registered. At most one resource type may exist per base schema.
    pub fn register_resource_type(&mut self, resource_type: ResourceType) -> ScimResult<()> {
        self.resolve(&resource_type.schema)?;
        for extension in &resource_type.schema_extensions {
            self.resolve(&extension.schema)?;
        }
        if self.resource_type_for_schema(&resource_type.schema).is_some() {
            return Err(ScimError::invalid_definition(
                &resource_type.schema,
                format!(
                    "a resource type is already registered for this schema; cannot add '{}'",
                    resource_type.name
                ),
            ));
        }

        log::info!(
            "Registered resource type {} at {} ({} extensions)",
            resource_type.name,
            resource_type.endpoint,
            resource_type.schema_extensions.len()
        );
        self.resource_types.push(resource_type);
        Ok(())
    }

    /// Look up a schema, failing with [`ScimError::UnknownSchema`] if absent.
    pub fn resolve(&self, urn: &str) -> ScimResult<&Schema> {
        self.get_schema(urn)
            .ok_or_else(|| ScimError::unknown_schema(urn))
    }

    /// Get a specific schema by URN, ignoring ASCII case.
    pub fn get_schema(&self, urn: &str) -> Option<&Schema> {
        self.index
            .get(&urn.to_ascii_lowercase())
            .map(|&position| &self.schemas[position])
    }

    /// Get all schemas in registration order.
    pub fn get_schemas(&self) -> Vec<&Schema> {
        self.schemas.iter().collect()
    }

    pub fn contains(&self, urn: &str) -> bool {
        self.get_schema(urn).is_some()
    }

    pub fn resource_types(&self) -> &[ResourceType] {
        &self.resource_types
    }

    /// The resource type whose base schema is `urn`, if one is registered.
    pub fn resource_type_for_schema(&self, urn: &str) -> Option<&ResourceType> {
        self.resource_types
            .iter()
            .find(|rt| rt.schema.eq_ignore_ascii_case(urn))
    }

    /// Check the active extensions of a resource against its resource type.
    ///
    /// Every extension must be registered. When the base schema has a
    /// resource type, only its declared extensions may be active and, in
    /// contexts that enforce `required`, its required ones must be.
    pub(crate) fn check_extensions(
        &self,
        base: &Schema,
        extensions: &[&str],
        context: Context,
    ) -> ScimResult<()> {
        for urn in extensions {
            let extension = self.resolve(urn)?;
            if extension.id.eq_ignore_ascii_case(&base.id) {
                return Err(ValidationError::malformed(format!(
                    "schema '{}' cannot extend itself",
                    base.id
                ))
                .into());
            }
        }

        let Some(resource_type) = self.resource_type_for_schema(&base.id) else {
            return Ok(());
        };
        if let Some(unsupported) = extensions
            .iter()
            .find(|urn| resource_type.extension(urn).is_none())
        {
            return Err(ValidationError::UnsupportedExtension {
                extension: unsupported.to_string(),
                schema_id: base.id.clone(),
            }
            .into());
        }
        if context.enforces_required() {
            if let Some(missing) = resource_type
                .required_extensions()
                .find(|required| !extensions.iter().any(|urn| urn.eq_ignore_ascii_case(required)))
            {
                return Err(ValidationError::MissingRequiredExtension {
                    extension: missing.to_string(),
                }
                .into());
            }
        }
        Ok(())
    }

    fn check_definition(schema: &Schema) -> ScimResult<()> {
        if !SchemaUri::is_valid(&schema.id) {
            return Err(ScimError::invalid_definition(
                &schema.id,
                "schema id is not a valid URN",
            ));
        }
        Self::check_attributes(&schema.id, &schema.attributes, None)
    }

    /// Names unique per level, complex attributes one level deep with
    /// sub-attributes, canonical values only on strings.
    fn check_attributes(
        schema_id: &str,
        attributes: &[AttributeDefinition],
        parent: Option<&str>,
    ) -> ScimResult<()> {
        for (position, attr) in attributes.iter().enumerate() {
            let qualified = match parent {
                Some(parent) => format!("{parent}.{}", attr.name),
                None => attr.name.clone(),
            };
            let invalid = |message: String| ScimError::invalid_definition(schema_id, message);

            if attr.name.is_empty() {
                return Err(invalid("attribute with empty name".to_string()));
            }
            if attributes[..position]
                .iter()
                .any(|earlier| earlier.name.eq_ignore_ascii_case(&attr.name))
            {
                return Err(invalid(format!("attribute '{qualified}' is declared twice")));
            }
            if !attr.canonical_values.is_empty() && attr.data_type != AttributeType::String {
                return Err(invalid(format!(
                    "attribute '{qualified}' declares canonical values but has type {}",
                    attr.data_type.as_str()
                )));
            }

            match (attr.data_type, parent) {
                (AttributeType::Complex, Some(_)) => {
                    return Err(invalid(format!(
                        "complex sub-attribute '{qualified}' is not allowed"
                    )));
                }
                (AttributeType::Complex, None) => {
                    if attr.sub_attributes.is_empty() {
                        return Err(invalid(format!(
                            "complex attribute '{qualified}' declares no sub-attributes"
                        )));
                    }
                    Self::check_attributes(schema_id, &attr.sub_attributes, Some(&attr.name))?;
                }
                _ if !attr.sub_attributes.is_empty() => {
                    return Err(invalid(format!(
                        "attribute '{qualified}' of type {} cannot declare sub-attributes",
                        attr.data_type.as_str()
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

fn load_error(path: &Path, error: impl std::fmt::Display) -> ScimError {
    ScimError::SchemaLoad {
        path: path.display().to_string(),
        message: error.to_string(),
    }
}
