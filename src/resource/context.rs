//! Usage contexts for SCIM payloads.
//!
//! The same resource has a different wire contract depending on whether it is
//! being sent as a creation request, returned in a query response, and so on
//! (RFC 7644 §3). Exactly one [`Context`] governs each serialize or
//! deserialize call.

use std::fmt;

/// The HTTP exchange a payload belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Context {
    /// No SCIM-specific rules beyond returned-policy filtering.
    #[default]
    Default,
    /// Body of a POST creating a resource.
    RequestCreate,
    /// Body of a GET query (rarely used).
    RequestQuery,
    /// Body of a PUT replacing a resource.
    RequestReplace,
    /// Body of a POST `.search` request.
    RequestSearch,
    /// Body of a PATCH request.
    RequestPatch,
    /// Generic server response.
    Response,
    /// Response to a creation request.
    ResponseCreate,
    /// Response to a query.
    ResponseQuery,
    /// Response to a replacement request.
    ResponseReplace,
    /// Response to a search request.
    ResponseSearch,
    /// Response to a PATCH request.
    ResponsePatch,
}

impl Context {
    /// All contexts, requests first.
    pub const ALL: [Context; 12] = [
        Context::Default,
        Context::RequestCreate,
        Context::RequestQuery,
        Context::RequestReplace,
        Context::RequestSearch,
        Context::RequestPatch,
        Context::Response,
        Context::ResponseCreate,
        Context::ResponseQuery,
        Context::ResponseReplace,
        Context::ResponseSearch,
        Context::ResponsePatch,
    ];

    pub fn is_request(self) -> bool {
        matches!(
            self,
            Self::RequestCreate
                | Self::RequestQuery
                | Self::RequestReplace
                | Self::RequestSearch
                | Self::RequestPatch
        )
    }

    pub fn is_response(self) -> bool {
        matches!(
            self,
            Self::Response
                | Self::ResponseCreate
                | Self::ResponseQuery
                | Self::ResponseReplace
                | Self::ResponseSearch
                | Self::ResponsePatch
        )
    }

    /// Only creation and replacement payloads must carry required attributes.
    pub fn enforces_required(self) -> bool {
        matches!(self, Self::RequestCreate | Self::RequestReplace)
    }

    /// Contexts in which a client sends resource state it may not assign.
    pub(crate) fn is_write_request(self) -> bool {
        matches!(
            self,
            Self::RequestCreate | Self::RequestReplace | Self::RequestPatch
        )
    }

    /// Contexts in which write-only values can never be used.
    pub(crate) fn is_read_request(self) -> bool {
        matches!(self, Self::RequestQuery | Self::RequestSearch)
    }

    /// Human-readable name used in error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::RequestCreate => "creation request",
            Self::RequestQuery => "query request",
            Self::RequestReplace => "replacement request",
            Self::RequestSearch => "search request",
            Self::RequestPatch => "patch request",
            Self::Response => "response",
            Self::ResponseCreate => "creation response",
            Self::ResponseQuery => "query response",
            Self::ResponseReplace => "replacement response",
            Self::ResponseSearch => "search response",
            Self::ResponsePatch => "patch response",
        }
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
