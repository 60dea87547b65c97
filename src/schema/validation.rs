//! Value validation against attribute definitions.
//!
//! These checks are shared by serialization and deserialization: JSON type
//! per declared data type, single versus multi-valued shape, canonical value
//! membership and the string formats of `dateTime`, `binary` and
//! `reference`. Sub-attributes of complex values are walked by the callers,
//! which also apply the context rules.

use super::registry::SchemaRegistry;
use super::types::{AttributeDefinition, AttributeType};
use crate::error::{ConstraintViolation, ValidationError, ValidationResult};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, FixedOffset};
use serde_json::{Map, Value};

impl SchemaRegistry {
    /// Validate a present, non-null value against its definition.
    ///
    /// `path` names the attribute in errors. Complex values are only checked
    /// to be objects (and for a single primary value when multi-valued).
    pub(crate) fn validate_attribute_value(
        &self,
        attr_def: &AttributeDefinition,
        value: &Value,
        path: &str,
    ) -> ValidationResult<()> {
        if attr_def.multi_valued {
            let Some(items) = value.as_array() else {
                return Err(ValidationError::constraint(
                    path,
                    ConstraintViolation::ExpectedMultiValue,
                ));
            };
            for item in items.iter().filter(|item| !item.is_null()) {
                self.validate_single_value(attr_def, item, path)?;
            }
            if attr_def.data_type == AttributeType::Complex {
                Self::validate_single_primary(items, path)?;
            }
            Ok(())
        } else {
            if value.is_array() {
                return Err(ValidationError::constraint(
                    path,
                    ConstraintViolation::ExpectedSingleValue,
                ));
            }
            self.validate_single_value(attr_def, value, path)
        }
    }

    /// Validate one value (or one element of a multi-valued attribute).
    fn validate_single_value(
        &self,
        attr_def: &AttributeDefinition,
        value: &Value,
        path: &str,
    ) -> ValidationResult<()> {
        let type_error = || {
            ValidationError::invalid_type(path, attr_def.data_type.as_str(), Self::get_value_type(value))
        };
        let format_error = |text: &str| {
            ValidationError::constraint(
                path,
                ConstraintViolation::InvalidFormat {
                    format: attr_def.data_type.as_str().to_string(),
                    value: text.to_string(),
                },
            )
        };

        match attr_def.data_type {
            AttributeType::String => {
                let text = value.as_str().ok_or_else(type_error)?;
                Self::validate_canonical_value(attr_def, text, path)?;
            }
            AttributeType::Boolean => {
                if !value.is_boolean() {
                    return Err(type_error());
                }
            }
            AttributeType::Integer => {
                if !value.is_number() {
                    return Err(type_error());
                }
                if !value.is_i64() {
                    return Err(format_error(&value.to_string()));
                }
            }
            AttributeType::Decimal => {
                if !value.is_number() {
                    return Err(type_error());
                }
            }
            AttributeType::DateTime => {
                let text = value.as_str().ok_or_else(type_error)?;
                if !Self::is_valid_datetime_format(text) {
                    return Err(format_error(text));
                }
            }
            AttributeType::Binary => {
                let text = value.as_str().ok_or_else(type_error)?;
                if !Self::is_valid_base64(text) {
                    return Err(format_error(text));
                }
            }
            AttributeType::Reference => {
                let text = value.as_str().ok_or_else(type_error)?;
                if !Self::is_valid_uri_format(text) {
                    return Err(format_error(text));
                }
            }
            AttributeType::Complex => {
                if !value.is_object() {
                    return Err(type_error());
                }
            }
        }

        Ok(())
    }

    /// Canonical values compare exactly when `caseExact`, otherwise ignoring ASCII case.
    fn validate_canonical_value(
        attr_def: &AttributeDefinition,
        value: &str,
        path: &str,
    ) -> ValidationResult<()> {
        if attr_def.canonical_values.is_empty() {
            return Ok(());
        }
        let allowed = attr_def.canonical_values.iter().any(|canonical| {
            if attr_def.case_exact {
                canonical == value
            } else {
                canonical.eq_ignore_ascii_case(value)
            }
        });
        if allowed {
            Ok(())
        } else {
            Err(ValidationError::constraint(
                path,
                ConstraintViolation::CanonicalValue {
                    value: value.to_string(),
                    allowed: attr_def.canonical_values.clone(),
                },
            ))
        }
    }

    fn validate_single_primary(items: &[Value], path: &str) -> ValidationResult<()> {
        let primaries = items
            .iter()
            .filter_map(Value::as_object)
            .filter(|item| {
                item.iter()
                    .any(|(key, value)| key.eq_ignore_ascii_case("primary") && value == &Value::Bool(true))
            })
            .count();
        if primaries > 1 {
            return Err(ValidationError::constraint(
                path,
                ConstraintViolation::MultiplePrimary,
            ));
        }
        Ok(())
    }

    /// RFC 3339 timestamps, delegated to chrono.
    pub(crate) fn is_valid_datetime_format(value: &str) -> bool {
        !value.is_empty() && DateTime::<FixedOffset>::parse_from_rfc3339(value).is_ok()
    }

    /// Standard base64 with padding.
    pub(crate) fn is_valid_base64(value: &str) -> bool {
        STANDARD.decode(value).is_ok()
    }

    /// Absolute URIs, URNs, server-relative and dot-relative paths.
    pub(crate) fn is_valid_uri_format(value: &str) -> bool {
        if value.is_empty() || value.chars().any(char::is_whitespace) {
            return false;
        }
        value.contains("://")
            || value
                .get(..4)
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case("urn:"))
            || value.starts_with('/')
            || value.starts_with("./")
            || value.starts_with("../")
    }

    /// Get the type name of a JSON value for error messages.
    pub(crate) fn get_value_type(value: &Value) -> &'static str {
        match value {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(n) if n.is_i64() => "integer",
            Value::Number(_) => "decimal",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }
}

/// Entry of `map` whose key equals `name` ignoring ASCII case.
pub(crate) fn lookup<'a>(map: &'a Map<String, Value>, name: &str) -> Option<(&'a String, &'a Value)> {
    map.get_key_value(name)
        .or_else(|| map.iter().find(|(key, _)| key.eq_ignore_ascii_case(name)))
}

/// Error path of an attribute: bare for the base schema, URN-qualified for extensions.
pub(crate) fn qualify(schema_prefix: Option<&str>, name: &str) -> String {
    match schema_prefix {
        Some(urn) => format!("{urn}:{name}"),
        None => name.to_string(),
    }
}
