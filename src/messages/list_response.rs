//! List responses (RFC 7644 §3.4.2).

use super::{LIST_RESPONSE_URN, require_message_schema};
use crate::config::{DeserializeOptions, Strictness};
use crate::error::{ScimResult, ValidationError, ValidationResult};
use crate::resource::{AttributeSelection, Context, ResourceInstance};
use crate::schema::SchemaRegistry;

use serde_json::{Map, Value};

/// A page of query or search results.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListResponse {
    pub total_results: Option<u64>,
    /// 1-based index of the first result
    pub start_index: Option<u64>,
    pub items_per_page: Option<u64>,
    pub resources: Vec<ResourceInstance>,
}

impl ListResponse {
    /// A complete, single-page result set.
    pub fn new(resources: Vec<ResourceInstance>) -> Self {
        let count = resources.len() as u64;
        Self {
            total_results: Some(count),
            start_index: Some(1),
            items_per_page: Some(count),
            resources,
        }
    }

    pub fn with_total_results(mut self, total_results: u64) -> Self {
        self.total_results = Some(total_results);
        self
    }

    pub fn with_start_index(mut self, start_index: u64) -> Self {
        self.start_index = Some(start_index);
        self
    }

    /// Serialize with every resource going through the engine in `context`.
    pub fn to_json(
        &self,
        registry: &SchemaRegistry,
        context: Context,
        selection: &AttributeSelection,
    ) -> ScimResult<Value> {
        self.check_counts(context)?;

        let mut output = Map::new();
        output.insert("schemas".to_string(), Value::from(vec![LIST_RESPONSE_URN]));
        for (key, count) in [
            ("totalResults", self.total_results),
            ("startIndex", self.start_index),
            ("itemsPerPage", self.items_per_page),
        ] {
            if let Some(count) = count {
                output.insert(key.to_string(), Value::from(count));
            }
        }
        if !self.resources.is_empty() {
            let resources = self
                .resources
                .iter()
                .map(|resource| registry.to_json(resource, context, selection))
                .collect::<ScimResult<Vec<_>>>()?;
            output.insert("Resources".to_string(), Value::Array(resources));
        }
        Ok(Value::Object(output))
    }

    pub fn serialize(
        &self,
        registry: &SchemaRegistry,
        context: Context,
        selection: &AttributeSelection,
    ) -> ScimResult<Vec<u8>> {
        Ok(serde_json::to_vec(&self.to_json(registry, context, selection)?)?)
    }

    pub fn deserialize(
        registry: &SchemaRegistry,
        bytes: &[u8],
        context: Context,
        options: &DeserializeOptions<'_>,
    ) -> ScimResult<Self> {
        let value: Value = serde_json::from_slice(bytes)?;
        Self::from_json(registry, &value, context, options)
    }

    /// Parse a list response, parsing every resource in `context`.
    ///
    /// `options.original` is not applied to the individual resources.
    pub fn from_json(
        registry: &SchemaRegistry,
        value: &Value,
        context: Context,
        options: &DeserializeOptions<'_>,
    ) -> ScimResult<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| ValidationError::malformed("list response must be a JSON object"))?;
        let resource_options = DeserializeOptions::from(options.strictness);

        let mut response = Self::default();
        let mut schemas = None;
        for (key, value) in object {
            match key.to_ascii_lowercase().as_str() {
                "schemas" => schemas = Some(value),
                "totalresults" => response.total_results = counter(key, value)?,
                "startindex" => response.start_index = counter(key, value)?,
                "itemsperpage" => response.items_per_page = counter(key, value)?,
                "resources" => {
                    let items = match value {
                        Value::Null => continue,
                        Value::Array(items) => items,
                        _ => return Err(ValidationError::malformed("'Resources' must be an array").into()),
                    };
                    for item in items {
                        response
                            .resources
                            .push(registry.from_json(item, context, &resource_options)?);
                    }
                }
                _ => match options.strictness {
                    Strictness::Strict => {
                        return Err(ValidationError::unknown_attribute(key, LIST_RESPONSE_URN).into());
                    }
                    Strictness::Lenient => {
                        log::warn!("Dropping unknown list response attribute '{key}'");
                    }
                },
            }
        }

        let schemas: Vec<String> = match schemas {
            None | Some(Value::Null) => return Err(ValidationError::MissingSchemas.into()),
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|_| ValidationError::malformed("'schemas' must be an array of URNs"))?,
        };
        require_message_schema(&schemas, LIST_RESPONSE_URN)?;
        response.check_counts(context)?;
        Ok(response)
    }

    /// Responses must carry `totalResults`, and `Resources` when it is non-zero.
    fn check_counts(&self, context: Context) -> ValidationResult<()> {
        if !context.is_response() {
            return Ok(());
        }
        match self.total_results {
            None => Err(ValidationError::InvalidListResponse {
                details: "'totalResults' is required in responses".to_string(),
            }),
            Some(total) if total > 0 && self.resources.is_empty() => {
                Err(ValidationError::InvalidListResponse {
                    details: format!("'totalResults' is {total} but 'Resources' is empty"),
                })
            }
            _ => Ok(()),
        }
    }
}

fn counter(key: &str, value: &Value) -> ValidationResult<Option<u64>> {
    match value {
        Value::Null => Ok(None),
        _ => value
            .as_u64()
            .map(Some)
            .ok_or_else(|| ValidationError::malformed(format!("'{key}' must be a non-negative integer"))),
    }
}
