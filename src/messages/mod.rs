//! RFC 7644 message envelopes.
//!
//! Messages wrap resources (list responses, bulk requests), describe
//! modifications (PATCH) or carry query parameters, bulk outcomes and errors. Envelopes that contain resources
//! run every element through the same [`SchemaRegistry`](crate::schema::SchemaRegistry)
//! engine as a standalone resource.

pub mod bulk;
pub mod error_response;
pub mod list_response;
pub mod patch;
pub mod search_request;

pub use bulk::{BulkData, BulkMethod, BulkOperation, BulkRequest, BulkResponse, BulkResponseOperation};
pub use error_response::ErrorResponse;
pub use list_response::ListResponse;
pub use patch::{PatchOp, PatchOpKind, PatchOperation};
pub use search_request::{SearchRequest, SortOrder};

/// Schema URN of list responses.
pub const LIST_RESPONSE_URN: &str = "urn:ietf:params:scim:api:messages:2.0:ListResponse";
/// Schema URN of PATCH requests.
pub const PATCH_OP_URN: &str = "urn:ietf:params:scim:api:messages:2.0:PatchOp";
/// Schema URN of `.search` requests.
pub const SEARCH_REQUEST_URN: &str = "urn:ietf:params:scim:api:messages:2.0:SearchRequest";
/// Schema URN of bulk requests.
pub const BULK_REQUEST_URN: &str = "urn:ietf:params:scim:api:messages:2.0:BulkRequest";
/// Schema URN of bulk responses.
pub const BULK_RESPONSE_URN: &str = "urn:ietf:params:scim:api:messages:2.0:BulkResponse";
/// Schema URN of error responses.
pub const ERROR_URN: &str = "urn:ietf:params:scim:api:messages:2.0:Error";

/// Fail unless `schemas` lists `urn`, ignoring case.
pub(crate) fn require_message_schema(
    schemas: &[String],
    urn: &str,
) -> crate::error::ValidationResult<()> {
    if schemas.is_empty() {
        return Err(crate::error::ValidationError::EmptySchemas);
    }
    if schemas.iter().any(|schema| schema.eq_ignore_ascii_case(urn)) {
        Ok(())
    } else {
        Err(crate::error::ValidationError::malformed(format!(
            "message 'schemas' must contain '{urn}'"
        )))
    }
}
