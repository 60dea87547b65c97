//! Schema definitions and the context-aware engine for SCIM resources.
//!
//! This module provides the schema registry and the validation/serialization
//! engine implementing RFC 7643 core schemas. The engine is a set of
//! `impl SchemaRegistry` blocks: the registry owns every schema definition,
//! and each serialize or deserialize call is a pure function of the
//! registry, one resource instance, one [`Context`](crate::resource::Context)
//! and the caller's options.
//!
//! # Key Types
//!
//! - [`Schema`] - SCIM schema definition with attributes and metadata
//! - [`SchemaRegistry`] - Registry for managing schemas, and the engine entry points
//! - [`AttributeDefinition`] - Individual attribute specifications and constraints
//! - [`ResourceType`] - Binding of a base schema to its extensions
//!
//! # Examples
//!
//! ```rust
//! use scim_models::resource::{AttributeSelection, Context, ResourceInstance, SchemaUri};
//! use scim_models::schema::SchemaRegistry;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = SchemaRegistry::new()?;
//! let user = ResourceInstance::new(SchemaUri::new("urn:ietf:params:scim:schemas:core:2.0:User")?)
//!     .with("userName", "bjensen")
//!     .with("password", "t1meMa$heen");
//!
//! let json = registry.to_json(&user, Context::Response, &AttributeSelection::none())?;
//! assert_eq!(json["userName"], "bjensen");
//! assert!(json.get("password").is_none());
//! # Ok(())
//! # }
//! ```

mod deserialize;
pub mod embedded;
pub mod registry;
pub mod resource_type;
mod serialize;
pub mod types;
mod validation;
pub mod visibility;


// Re-export the main types for convenience
pub use registry::SchemaRegistry;
pub use resource_type::{ResourceType, SchemaExtension};
pub use types::{
    AttributeDefinition, AttributeKind, AttributeType, Mutability, Returned, Schema, Uniqueness,
};
pub use visibility::is_visible;
