//! Error types for SCIM model validation and serialization.
//!
//! Every serialize/deserialize call either produces a fully valid result or
//! one of these errors. Errors name the offending attribute path and the rule
//! that was violated; none of them are retryable.

/// Main error type for SCIM model operations.
#[derive(Debug, thiserror::Error)]
pub enum ScimError {
    /// Resource data doesn't conform to the schema contract for the context
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A schema was registered twice under the same URN
    #[error("Schema already registered: {uri}")]
    DuplicateSchema { uri: String },

    /// A schema URN was looked up but never registered
    #[error("Unknown schema: {uri}")]
    UnknownSchema { uri: String },

    /// A schema definition is structurally unusable
    #[error("Invalid schema definition '{schema_id}': {message}")]
    InvalidSchemaDefinition { schema_id: String, message: String },

    /// A schema file could not be read
    #[error("Failed to load schema from '{path}': {message}")]
    SchemaLoad { path: String, message: String },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The specific rule a value broke.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConstraintViolation {
    /// Value has the wrong JSON type for the declared attribute type
    #[error("expected {expected}, got {actual}")]
    InvalidType { expected: String, actual: String },

    /// Multi-valued attribute given a single value
    #[error("expected a multi-valued array")]
    ExpectedMultiValue,

    /// Single-valued attribute given an array
    #[error("expected a single value, got an array")]
    ExpectedSingleValue,

    /// Value is not a member of the declared canonical set
    #[error("value '{value}' is not one of {allowed:?}")]
    CanonicalValue { value: String, allowed: Vec<String> },

    /// String content doesn't match the declared format
    #[error("invalid {format}: '{value}'")]
    InvalidFormat { format: String, value: String },

    /// More than one value of a multi-valued attribute is marked primary
    #[error("at most one value may have primary set to true")]
    MultiplePrimary,
}

/// Validation errors raised by the context-aware engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// Attribute is not declared by any schema reachable from the resource
    #[error("Unknown attribute '{attribute}' in schema '{schema_id}'")]
    UnknownAttribute {
        attribute: String,
        schema_id: String,
    },

    /// Attribute path is malformed or names an undeclared attribute
    #[error("Invalid attribute path '{path}': {reason}")]
    InvalidFilterPath { path: String, reason: String },

    /// Value violates a type, multiplicity, canonical or format constraint
    #[error("Attribute '{attribute}' violates constraint: {constraint}")]
    ValueConstraint {
        attribute: String,
        constraint: ConstraintViolation,
    },

    /// Required attribute is missing
    #[error("Required attribute '{attribute}' is missing")]
    MissingRequiredAttribute { attribute: String },

    /// Client submitted a server-assigned attribute
    #[error("Attribute '{attribute}' is read-only and cannot be submitted in a {context} payload")]
    ReadOnlyViolation { attribute: String, context: String },

    /// Replacement changed an immutable attribute
    #[error("Attribute '{attribute}' is immutable and differs from the original value")]
    ImmutableViolation { attribute: String },

    /// Write-only attribute used where it can never be read
    #[error("Attribute '{attribute}' is write-only and cannot be used in a {context} payload")]
    WriteOnlyViolation { attribute: String, context: String },

    /// Response carries a `never` value or lacks an `always` one
    #[error("Attribute '{attribute}' breaks returned={returned} in a {context} payload")]
    ReturnedViolation {
        attribute: String,
        returned: String,
        context: String,
    },

    /// Both `attributes` and `excludedAttributes` were given
    #[error("'attributes' and 'excludedAttributes' are mutually exclusive")]
    ConflictingAttributeSelection,

    /// Missing schemas attribute
    #[error("Missing required 'schemas' attribute")]
    MissingSchemas,

    /// Empty schemas array
    #[error("'schemas' array cannot be empty")]
    EmptySchemas,

    /// Extension not declared by the resource type of the base schema
    #[error("Extension '{extension}' is not supported by schema '{schema_id}'")]
    UnsupportedExtension {
        extension: String,
        schema_id: String,
    },

    /// Required extension absent from a create/replace payload
    #[error("Missing required extension '{extension}'")]
    MissingRequiredExtension { extension: String },

    /// Payload does not have the shape of a SCIM resource
    #[error("Malformed resource: {details}")]
    MalformedResource { details: String },

    /// PATCH operation is structurally invalid
    #[error("Invalid PATCH operation: {details}")]
    InvalidPatchOperation { details: String },

    /// List response counters and resources disagree
    #[error("Invalid list response: {details}")]
    InvalidListResponse { details: String },
}

// Convenience methods for creating common errors
impl ScimError {
    /// Create an unknown schema error
    pub fn unknown_schema(uri: impl Into<String>) -> Self {
        Self::UnknownSchema { uri: uri.into() }
    }

    /// Create a duplicate schema error
    pub fn duplicate_schema(uri: impl Into<String>) -> Self {
        Self::DuplicateSchema { uri: uri.into() }
    }

    /// Create an invalid schema definition error
    pub fn invalid_definition(schema_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSchemaDefinition {
            schema_id: schema_id.into(),
            message: message.into(),
        }
    }

    /// The validation error wrapped by this error, if any.
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(e) => Some(e),
            _ => None,
        }
    }
}

impl ValidationError {
    /// Create a missing required attribute error
    pub fn missing_required(attribute: impl Into<String>) -> Self {
        Self::MissingRequiredAttribute {
            attribute: attribute.into(),
        }
    }

    /// Create a value constraint error
    pub fn constraint(attribute: impl Into<String>, constraint: ConstraintViolation) -> Self {
        Self::ValueConstraint {
            attribute: attribute.into(),
            constraint,
        }
    }

    /// Create an invalid type error
    pub fn invalid_type(
        attribute: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::constraint(
            attribute,
            ConstraintViolation::InvalidType {
                expected: expected.into(),
                actual: actual.into(),
            },
        )
    }

    /// Create an unknown attribute error
    pub fn unknown_attribute(attribute: impl Into<String>, schema_id: impl Into<String>) -> Self {
        Self::UnknownAttribute {
            attribute: attribute.into(),
            schema_id: schema_id.into(),
        }
    }

    /// Create an invalid path error
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidFilterPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a malformed resource error
    pub fn malformed(details: impl Into<String>) -> Self {
        Self::MalformedResource {
            details: details.into(),
        }
    }

    /// Create an invalid PATCH operation error
    pub fn invalid_patch(details: impl Into<String>) -> Self {
        Self::InvalidPatchOperation {
            details: details.into(),
        }
    }

    /// The attribute path this error is about, when it names one.
    pub fn attribute(&self) -> Option<&str> {
        match self {
            Self::UnknownAttribute { attribute, .. }
            | Self::ValueConstraint { attribute, .. }
            | Self::MissingRequiredAttribute { attribute }
            | Self::ReadOnlyViolation { attribute, .. }
            | Self::ImmutableViolation { attribute }
            | Self::WriteOnlyViolation { attribute, .. }
            | Self::ReturnedViolation { attribute, .. } => Some(attribute),
            Self::InvalidFilterPath { path, .. } => Some(path),
            _ => None,
        }
    }
}

// Result type aliases for convenience
pub type ScimResult<T> = Result<T, ScimError>;
pub type ValidationResult<T> = Result<T, ValidationError>;
