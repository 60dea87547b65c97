//! SCIM resource model: instances, contexts and attribute addressing.
//!
//! This module holds the data side of the engine. Schemas and the rules
//! that act on this data live in [`crate::schema`].
//!
//! # Key Components
//!
//! * [`ResourceInstance`] - Attribute values of one resource plus its active extensions
//! * [`Context`] - The request or response mode a payload belongs to
//! * [`SchemaUri`] - Validated, case-insensitive schema URN
//! * [`AttributePath`] - Parsed `attr`, `attr.sub` or URN-qualified path
//! * [`AttributeSelection`] - `attributes` / `excludedAttributes` parameters

pub mod context;
pub mod instance;
pub mod path;
pub mod schema_uri;
pub mod selection;

pub use context::Context;
pub use instance::ResourceInstance;
pub use path::{AttributePath, ResolvedPath};
pub use schema_uri::SchemaUri;
pub use selection::{AttributeRef, AttributeSelection, ResolvedSelection};
