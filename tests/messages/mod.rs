//! RFC 7644 message envelopes driven through the public API.

pub mod patch;
pub mod search_request;
