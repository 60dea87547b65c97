//! Context-aware SCIM 2.0 resource models for Rust.
//!
//! Validates and serializes SCIM resources (RFC 7643) and protocol messages
//! (RFC 7644) according to the attribute characteristics declared by their
//! schemas. The same resource is emitted differently depending on the
//! [`Context`] it travels in: server-assigned attributes are rejected in
//! requests, `writeOnly` ones never leave a response, and the `returned`
//! policy combines with client attribute selection to decide what appears.
//!
//! # Core Components
//!
//! - [`SchemaRegistry`] - Registered schemas and resource types, plus the
//!   serialize/deserialize engine
//! - [`ResourceInstance`] - Attribute values of one resource and its extensions
//! - [`Context`] - Request or response mode of a payload
//! - [`AttributeSelection`] - The `attributes`/`excludedAttributes` parameters
//! - [`messages`] - ListResponse, PatchOp, SearchRequest, Bulk and Error envelopes
//!
//! # Quick Start
//!
//! ```rust
//! use scim_models::{AttributeSelection, Context, SchemaRegistry, Strictness};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = SchemaRegistry::new()?;
//! let body = br#"{
//!     "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
//!     "userName": "bjensen",
//!     "password": "t1meMa$heen"
//! }"#;
//!
//! let user = registry.deserialize(body, Context::RequestCreate, Strictness::Strict)?;
//! let json = registry.to_json(&user, Context::ResponseCreate, &AttributeSelection::none())?;
//! assert_eq!(json["userName"], "bjensen");
//! assert!(json.get("password").is_none());
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod config;
pub mod error;
pub mod messages;
pub mod resource;
pub mod schema;

// Re-export commonly used types for convenience
pub use config::{DeserializeOptions, Strictness};
pub use error::{ConstraintViolation, ScimError, ScimResult, ValidationError, ValidationResult};
pub use messages::{
    BulkMethod, BulkOperation, BulkRequest, BulkResponse, ErrorResponse, ListResponse, PatchOp, PatchOpKind,
    PatchOperation, SearchRequest,
};
pub use resource::{AttributePath, AttributeSelection, Context, ResourceInstance, SchemaUri};
pub use schema::{AttributeDefinition, ResourceType, Schema, SchemaRegistry};
