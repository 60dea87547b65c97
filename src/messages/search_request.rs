//! `.search` request bodies (RFC 7644 §3.4.3).

use super::{SEARCH_REQUEST_URN, require_message_schema};
use crate::error::{ScimResult, ValidationResult};
use crate::resource::AttributeSelection;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Query parameters sent with `POST /.search`.
///
/// `filter` and `sort_by` are carried verbatim; evaluating them is left to
/// the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(default)]
    pub schemas: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excluded_attributes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
    /// 1-based
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_index: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            schemas: vec![SEARCH_REQUEST_URN.to_string()],
            attributes: None,
            excluded_attributes: None,
            filter: None,
            sort_by: None,
            sort_order: None,
            start_index: None,
            count: None,
        }
    }
}

impl SearchRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes = Some(attributes.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_excluded_attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_attributes = Some(attributes.into_iter().map(Into::into).collect());
        self
    }

    /// Set the page; values below the RFC minimums are raised to them.
    pub fn with_page(mut self, start_index: i64, count: i64) -> Self {
        self.start_index = Some(start_index.max(1));
        self.count = Some(count.max(0));
        self
    }

    /// Parse a request body.
    ///
    /// `startIndex` below 1 is read as 1 and a negative `count` as 0.
    pub fn from_json(value: &Value) -> ScimResult<Self> {
        let mut request: Self = serde_json::from_value(value.clone())?;
        require_message_schema(&request.schemas, SEARCH_REQUEST_URN)?;
        request.start_index = request.start_index.map(|index| index.max(1));
        request.count = request.count.map(|count| count.max(0));
        request.selection()?;
        Ok(request)
    }

    pub fn to_json(&self) -> ScimResult<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// The attribute selection these parameters describe.
    pub fn selection(&self) -> ValidationResult<AttributeSelection> {
        AttributeSelection::new(self.attributes.clone(), self.excluded_attributes.clone())
    }

    /// 0-based index of the first requested result.
    pub fn start_index_0(&self) -> Option<i64> {
        self.start_index.map(|index| index - 1)
    }

    /// 0-based index one past the last requested result.
    pub fn stop_index_0(&self) -> Option<i64> {
        Some(self.start_index_0()? + self.count?)
    }
}
