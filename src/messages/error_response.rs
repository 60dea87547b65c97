//! Error responses (RFC 7644 §3.12).

use super::{ERROR_URN, require_message_schema};
use crate::error::{ScimError, ScimResult, ValidationError, ValidationResult};

use serde_json::{Map, Value};

/// The body of a SCIM error response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    /// HTTP status code, emitted as a JSON string
    pub status: u16,
    /// RFC 7644 `scimType` keyword
    pub scim_type: Option<String>,
    pub detail: Option<String>,
}

impl ErrorResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            scim_type: None,
            detail: None,
        }
    }

    pub fn with_scim_type(mut self, scim_type: impl Into<String>) -> Self {
        self.scim_type = Some(scim_type.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// 400 `invalidFilter`, for callers evaluating `filter` themselves.
    pub fn invalid_filter(detail: impl Into<String>) -> Self {
        Self::new(400).with_scim_type("invalidFilter").with_detail(detail)
    }

    pub fn to_json(&self) -> Value {
        let mut output = Map::new();
        output.insert("schemas".to_string(), Value::from(vec![ERROR_URN]));
        output.insert("status".to_string(), Value::String(self.status.to_string()));
        if let Some(scim_type) = &self.scim_type {
            output.insert("scimType".to_string(), Value::String(scim_type.clone()));
        }
        if let Some(detail) = &self.detail {
            output.insert("detail".to_string(), Value::String(detail.clone()));
        }
        Value::Object(output)
    }

    /// Parse an error body. `status` may be a string or a number.
    pub fn from_json(value: &Value) -> ScimResult<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| ValidationError::malformed("error response must be a JSON object"))?;

        let schemas: Vec<String> = match object.get("schemas") {
            None | Some(Value::Null) => return Err(ValidationError::MissingSchemas.into()),
            Some(schemas) => serde_json::from_value(schemas.clone())?,
        };
        require_message_schema(&schemas, ERROR_URN)?;

        let status = parse_status(object.get("status"))?;

        let text = |key: &str| object.get(key).and_then(Value::as_str).map(str::to_string);
        Ok(Self {
            status,
            scim_type: text("scimType"),
            detail: text("detail"),
        })
    }
}

impl From<&ScimError> for ErrorResponse {
    fn from(error: &ScimError) -> Self {
        let response = match error {
            ScimError::Validation(validation) => {
                Self::new(400).with_scim_type(scim_type(validation))
            }
            ScimError::UnknownSchema { .. } => Self::new(400).with_scim_type("invalidValue"),
            ScimError::Json(_) => Self::new(400).with_scim_type("invalidSyntax"),
            ScimError::DuplicateSchema { .. }
            | ScimError::InvalidSchemaDefinition { .. }
            | ScimError::SchemaLoad { .. } => Self::new(500),
        };
        response.with_detail(error.to_string())
    }
}

impl From<ScimError> for ErrorResponse {
    fn from(error: ScimError) -> Self {
        Self::from(&error)
    }
}

/// An HTTP status code given as a JSON string or number.
pub(crate) fn parse_status(value: Option<&Value>) -> ValidationResult<u16> {
    match value {
        Some(Value::String(status)) => status.trim().parse().ok(),
        Some(Value::Number(status)) => status.as_u64().and_then(|s| u16::try_from(s).ok()),
        _ => None,
    }
    .ok_or_else(|| ValidationError::malformed("'status' must be an HTTP status code"))
}

fn scim_type(error: &ValidationError) -> &'static str {
    match error {
        ValidationError::ReadOnlyViolation { .. }
        | ValidationError::ImmutableViolation { .. }
        | ValidationError::WriteOnlyViolation { .. } => "mutability",
        ValidationError::InvalidFilterPath { .. } => "invalidPath",
        ValidationError::ValueConstraint { .. }
        | ValidationError::MissingRequiredAttribute { .. }
        | ValidationError::UnsupportedExtension { .. }
        | ValidationError::MissingRequiredExtension { .. }
        | ValidationError::InvalidListResponse { .. }
        | ValidationError::ReturnedViolation { .. }
        | ValidationError::ConflictingAttributeSelection => "invalidValue",
        ValidationError::UnknownAttribute { .. }
        | ValidationError::MissingSchemas
        | ValidationError::EmptySchemas
        | ValidationError::MalformedResource { .. }
        | ValidationError::InvalidPatchOperation { .. } => "invalidSyntax",
    }
}
