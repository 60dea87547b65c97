//! Bulk requests and responses (RFC 7644 §3.7).
//!
//! The `data` of each operation goes through the engine in the context its
//! method implies: `POST` data is read as a creation request, `PUT` data as
//! a replacement request and `PATCH` data as a [`PatchOp`]. `DELETE`
//! operations carry no data. When the operation path starts with the
//! endpoint of a registered resource type, the data must belong to that
//! resource type's schema.

use super::error_response::parse_status;
use super::{BULK_REQUEST_URN, BULK_RESPONSE_URN, ErrorResponse, PatchOp, require_message_schema};
use crate::config::{DeserializeOptions, Strictness};
use crate::error::{ScimError, ScimResult, ValidationError, ValidationResult};
use crate::resource::{AttributeSelection, Context, ResourceInstance, SchemaUri};
use crate::schema::SchemaRegistry;

use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// HTTP method of a bulk operation. Parsed without regard to case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkMethod {
    Post,
    Put,
    Patch,
    Delete,
}

impl BulkMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    /// The request context operation data travels in, if any.
    pub fn context(self) -> Option<Context> {
        match self {
            Self::Post => Some(Context::RequestCreate),
            Self::Put => Some(Context::RequestReplace),
            Self::Patch => Some(Context::RequestPatch),
            Self::Delete => None,
        }
    }
}

impl fmt::Display for BulkMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BulkMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            _ => Err(ValidationError::malformed(format!(
                "unsupported bulk method '{s}'"
            ))),
        }
    }
}

/// Payload of one bulk operation.
#[derive(Debug, Clone, PartialEq)]
pub enum BulkData {
    Resource(ResourceInstance),
    Patch(PatchOp),
}

/// One entry of a bulk request's `Operations`.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkOperation {
    pub method: BulkMethod,
    /// Client-assigned identifier, required for `POST`
    pub bulk_id: Option<String>,
    pub version: Option<String>,
    /// Path relative to the service root, such as `/Users/2819c223`
    pub path: String,
    pub data: Option<BulkData>,
}

impl BulkOperation {
    pub fn post(path: impl Into<String>, bulk_id: impl Into<String>, resource: ResourceInstance) -> Self {
        Self {
            method: BulkMethod::Post,
            bulk_id: Some(bulk_id.into()),
            version: None,
            path: path.into(),
            data: Some(BulkData::Resource(resource)),
        }
    }

    pub fn put(path: impl Into<String>, resource: ResourceInstance) -> Self {
        Self {
            method: BulkMethod::Put,
            bulk_id: None,
            version: None,
            path: path.into(),
            data: Some(BulkData::Resource(resource)),
        }
    }

    pub fn patch(path: impl Into<String>, patch: PatchOp) -> Self {
        Self {
            method: BulkMethod::Patch,
            bulk_id: None,
            version: None,
            path: path.into(),
            data: Some(BulkData::Patch(patch)),
        }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            method: BulkMethod::Delete,
            bulk_id: None,
            version: None,
            path: path.into(),
            data: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Method, path, `bulkId` and data must agree with each other.
    fn check(&self, registry: &SchemaRegistry) -> ScimResult<()> {
        if !self.path.starts_with('/') {
            return Err(ValidationError::malformed(format!(
                "bulk operation path '{}' must start with '/'",
                self.path
            ))
            .into());
        }
        if self.method == BulkMethod::Post && self.bulk_id.is_none() {
            return Err(ValidationError::malformed("POST bulk operations require a 'bulkId'").into());
        }

        let endpoint_schema = endpoint_schema(registry, &self.path);
        match (self.method, &self.data) {
            (BulkMethod::Post | BulkMethod::Put, Some(BulkData::Resource(resource))) => {
                if let Some(schema) = endpoint_schema.filter(|schema| !resource.schema().matches(schema)) {
                    return Err(ValidationError::malformed(format!(
                        "bulk operation at '{}' expects a {schema} resource, got {}",
                        self.path,
                        resource.schema()
                    ))
                    .into());
                }
                Ok(())
            }
            (BulkMethod::Patch, Some(BulkData::Patch(patch))) => match endpoint_schema {
                Some(schema) => patch.validate(registry, &SchemaUri::new(schema)?),
                None => Ok(()),
            },
            (BulkMethod::Delete, None) => Ok(()),
            (BulkMethod::Delete, Some(_)) => {
                Err(ValidationError::malformed("DELETE bulk operations carry no 'data'").into())
            }
            (method, _) => Err(ValidationError::malformed(format!(
                "{method} bulk operations require matching 'data'"
            ))
            .into()),
        }
    }

    fn to_json(&self, registry: &SchemaRegistry) -> ScimResult<Value> {
        self.check(registry)?;

        let mut output = Map::new();
        output.insert("method".to_string(), Value::from(self.method.as_str()));
        insert_text(&mut output, "bulkId", self.bulk_id.as_deref());
        insert_text(&mut output, "version", self.version.as_deref());
        output.insert("path".to_string(), Value::from(self.path.as_str()));
        let data = match (&self.data, self.method.context()) {
            (Some(BulkData::Resource(resource)), Some(context)) => {
                Some(registry.to_json(resource, context, &AttributeSelection::none())?)
            }
            (Some(BulkData::Patch(patch)), _) => Some(patch.to_json()?),
            _ => None,
        };
        if let Some(data) = data {
            output.insert("data".to_string(), data);
        }
        Ok(Value::Object(output))
    }

    fn from_json(registry: &SchemaRegistry, value: &Value, strictness: Strictness) -> ScimResult<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| ValidationError::malformed("bulk operation must be a JSON object"))?;

        let (mut method, mut bulk_id, mut version, mut path, mut data) = (None, None, None, None, None);
        for (key, value) in object {
            match key.to_ascii_lowercase().as_str() {
                "method" => method = text(key, value)?,
                "bulkid" => bulk_id = text(key, value)?,
                "version" => version = text(key, value)?,
                "path" => path = text(key, value)?,
                "data" => data = Some(value).filter(|data| !data.is_null()),
                _ => unknown_member(strictness, key, BULK_REQUEST_URN)?,
            }
        }

        let method: BulkMethod = method
            .ok_or_else(|| ValidationError::malformed("bulk operation requires a 'method'"))?
            .parse()?;
        let path = path.ok_or_else(|| ValidationError::malformed("bulk operation requires a 'path'"))?;
        let data = match (data, method.context()) {
            (None, _) => None,
            (Some(data), Some(Context::RequestPatch)) => Some(BulkData::Patch(PatchOp::from_json(data)?)),
            (Some(data), Some(context)) => Some(BulkData::Resource(registry.from_json(
                data,
                context,
                &DeserializeOptions::from(strictness),
            )?)),
            (Some(_), None) => {
                return Err(ValidationError::malformed("DELETE bulk operations carry no 'data'").into());
            }
        };

        let operation = Self {
            method,
            bulk_id,
            version,
            path,
            data,
        };
        operation.check(registry)?;
        Ok(operation)
    }
}

/// A bulk request body.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BulkRequest {
    /// Errors tolerated before the service provider stops processing
    pub fail_on_errors: Option<u64>,
    pub operations: Vec<BulkOperation>,
}

impl BulkRequest {
    pub fn new(operations: Vec<BulkOperation>) -> Self {
        Self {
            fail_on_errors: None,
            operations,
        }
    }

    pub fn with_fail_on_errors(mut self, fail_on_errors: u64) -> Self {
        self.fail_on_errors = Some(fail_on_errors);
        self
    }

    /// Fail when the request holds more operations than `max_operations`,
    /// as advertised in `bulk.maxOperations` of the service provider config.
    pub fn check_max_operations(&self, max_operations: u64) -> ValidationResult<()> {
        let count = self.operations.len() as u64;
        if count > max_operations {
            return Err(ValidationError::malformed(format!(
                "bulk request has {count} operations, the maximum is {max_operations}"
            )));
        }
        Ok(())
    }

    pub fn to_json(&self, registry: &SchemaRegistry) -> ScimResult<Value> {
        let mut output = Map::new();
        output.insert("schemas".to_string(), Value::from(vec![BULK_REQUEST_URN]));
        if let Some(fail_on_errors) = self.fail_on_errors {
            output.insert("failOnErrors".to_string(), Value::from(fail_on_errors));
        }
        let operations = self
            .operations
            .iter()
            .map(|operation| operation.to_json(registry))
            .collect::<ScimResult<Vec<_>>>()?;
        output.insert("Operations".to_string(), Value::Array(operations));
        Ok(Value::Object(output))
    }

    pub fn serialize(&self, registry: &SchemaRegistry) -> ScimResult<Vec<u8>> {
        Ok(serde_json::to_vec(&self.to_json(registry)?)?)
    }

    pub fn deserialize(registry: &SchemaRegistry, bytes: &[u8], strictness: Strictness) -> ScimResult<Self> {
        let value: Value = serde_json::from_slice(bytes)?;
        Self::from_json(registry, &value, strictness)
    }

    /// Parse a bulk request, reading each operation's data through the engine.
    ///
    /// Operations are checked in order and the first failure is returned.
    pub fn from_json(registry: &SchemaRegistry, value: &Value, strictness: Strictness) -> ScimResult<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| ValidationError::malformed("bulk request must be a JSON object"))?;

        let mut request = Self::default();
        let mut schemas = None;
        let mut operations = None;
        for (key, value) in object {
            match key.to_ascii_lowercase().as_str() {
                "schemas" => schemas = Some(value),
                "failonerrors" => {
                    request.fail_on_errors = match value {
                        Value::Null => None,
                        _ => Some(value.as_u64().ok_or_else(|| {
                            ValidationError::malformed("'failOnErrors' must be a non-negative integer")
                        })?),
                    }
                }
                "operations" => operations = Some(value),
                _ => unknown_member(strictness, key, BULK_REQUEST_URN)?,
            }
        }

        require_schemas(schemas, BULK_REQUEST_URN)?;
        for item in operation_items(operations)? {
            request
                .operations
                .push(BulkOperation::from_json(registry, item, strictness)?);
        }

        log::debug!("Parsed bulk request with {} operations", request.operations.len());
        Ok(request)
    }
}

/// Outcome of one bulk operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkResponseOperation {
    pub method: BulkMethod,
    pub bulk_id: Option<String>,
    pub version: Option<String>,
    /// Required unless a `POST` failed
    pub location: Option<String>,
    /// HTTP status code, emitted as a JSON string
    pub status: u16,
    /// Error body of a failed operation
    pub response: Option<ErrorResponse>,
}

impl BulkResponseOperation {
    pub fn new(method: BulkMethod, status: u16) -> Self {
        Self {
            method,
            bulk_id: None,
            version: None,
            location: None,
            status,
            response: None,
        }
    }

    /// A failed operation reporting `error`.
    pub fn failed(method: BulkMethod, error: &ScimError) -> Self {
        let response = ErrorResponse::from(error);
        Self {
            status: response.status,
            response: Some(response),
            ..Self::new(method, 400)
        }
    }

    pub fn with_bulk_id(mut self, bulk_id: impl Into<String>) -> Self {
        self.bulk_id = Some(bulk_id.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.status < 400
    }

    fn check(&self) -> ValidationResult<()> {
        if self.location.is_none() && (self.is_success() || self.method != BulkMethod::Post) {
            return Err(ValidationError::malformed(format!(
                "{} bulk operation with status {} requires a 'location'",
                self.method, self.status
            )));
        }
        Ok(())
    }

    fn to_json(&self) -> ValidationResult<Value> {
        self.check()?;

        let mut output = Map::new();
        output.insert("method".to_string(), Value::from(self.method.as_str()));
        insert_text(&mut output, "bulkId", self.bulk_id.as_deref());
        insert_text(&mut output, "version", self.version.as_deref());
        insert_text(&mut output, "location", self.location.as_deref());
        if let Some(response) = &self.response {
            output.insert("response".to_string(), response.to_json());
        }
        output.insert("status".to_string(), Value::String(self.status.to_string()));
        Ok(Value::Object(output))
    }

    fn from_json(value: &Value, strictness: Strictness) -> ScimResult<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| ValidationError::malformed("bulk operation must be a JSON object"))?;

        let mut method = None;
        let mut operation = Self::new(BulkMethod::Post, 0);
        let mut status = None;
        for (key, value) in object {
            match key.to_ascii_lowercase().as_str() {
                "method" => method = text(key, value)?,
                "bulkid" => operation.bulk_id = text(key, value)?,
                "version" => operation.version = text(key, value)?,
                "location" => operation.location = text(key, value)?,
                "status" => status = Some(value),
                "response" if !value.is_null() => operation.response = Some(ErrorResponse::from_json(value)?),
                "response" => {}
                _ => unknown_member(strictness, key, BULK_RESPONSE_URN)?,
            }
        }

        operation.method = method
            .ok_or_else(|| ValidationError::malformed("bulk operation requires a 'method'"))?
            .parse()?;
        operation.status = parse_status(status)?;
        operation.check()?;
        Ok(operation)
    }
}

/// A bulk response body.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BulkResponse {
    pub operations: Vec<BulkResponseOperation>,
}

impl BulkResponse {
    pub fn new(operations: Vec<BulkResponseOperation>) -> Self {
        Self { operations }
    }

    /// Number of operations that failed.
    pub fn error_count(&self) -> usize {
        self.operations.iter().filter(|operation| !operation.is_success()).count()
    }

    pub fn to_json(&self) -> ScimResult<Value> {
        let operations = self
            .operations
            .iter()
            .map(BulkResponseOperation::to_json)
            .collect::<ValidationResult<Vec<_>>>()?;

        let mut output = Map::new();
        output.insert("schemas".to_string(), Value::from(vec![BULK_RESPONSE_URN]));
        output.insert("Operations".to_string(), Value::Array(operations));
        Ok(Value::Object(output))
    }

    pub fn from_json(value: &Value, strictness: Strictness) -> ScimResult<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| ValidationError::malformed("bulk response must be a JSON object"))?;

        let mut schemas = None;
        let mut operations = None;
        for (key, value) in object {
            match key.to_ascii_lowercase().as_str() {
                "schemas" => schemas = Some(value),
                "operations" => operations = Some(value),
                _ => unknown_member(strictness, key, BULK_RESPONSE_URN)?,
            }
        }

        require_schemas(schemas, BULK_RESPONSE_URN)?;
        let operations = operation_items(operations)?
            .iter()
            .map(|item| BulkResponseOperation::from_json(item, strictness))
            .collect::<ScimResult<Vec<_>>>()?;
        Ok(Self { operations })
    }
}

/// Schema of the resource type whose endpoint starts `path`.
fn endpoint_schema<'r>(registry: &'r SchemaRegistry, path: &str) -> Option<&'r str> {
    let endpoint = path.split('/').find(|segment| !segment.is_empty())?;
    registry
        .resource_types()
        .iter()
        .find(|resource_type| {
            resource_type
                .endpoint
                .trim_start_matches('/')
                .eq_ignore_ascii_case(endpoint)
        })
        .map(|resource_type| resource_type.schema.as_str())
}

fn require_schemas(schemas: Option<&Value>, urn: &str) -> ValidationResult<()> {
    let schemas: Vec<String> = match schemas {
        None | Some(Value::Null) => return Err(ValidationError::MissingSchemas),
        Some(value) => serde_json::from_value(value.clone())
            .map_err(|_| ValidationError::malformed("'schemas' must be an array of URNs"))?,
    };
    require_message_schema(&schemas, urn)
}

fn operation_items(operations: Option<&Value>) -> ValidationResult<&[Value]> {
    match operations {
        Some(Value::Array(items)) => Ok(items),
        None | Some(Value::Null) => Err(ValidationError::malformed("'Operations' is required")),
        Some(_) => Err(ValidationError::malformed("'Operations' must be an array")),
    }
}

fn text(key: &str, value: &Value) -> ValidationResult<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::String(text) => Ok(Some(text.clone())),
        _ => Err(ValidationError::malformed(format!("'{key}' must be a string"))),
    }
}

fn insert_text(output: &mut Map<String, Value>, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        output.insert(key.to_string(), Value::from(value));
    }
}

fn unknown_member(strictness: Strictness, key: &str, urn: &str) -> ValidationResult<()> {
    match strictness {
        Strictness::Strict => Err(ValidationError::unknown_attribute(key, urn)),
        Strictness::Lenient => {
            log::warn!("Dropping unknown bulk message attribute '{key}'");
            Ok(())
        }
    }
}
