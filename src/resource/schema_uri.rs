//! SchemaUri value object for SCIM schema identifiers.
//!
//! Schema URNs identify base and extension schemas. They are compared
//! without regard to ASCII case, so `urn:ietf:...:User` and
//! `URN:IETF:...:USER` name the same schema.

use crate::error::{ValidationError, ValidationResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A validated SCIM schema URN.
///
/// ## Validation Rules
///
/// - Must not be empty
/// - Must start with the "urn:" prefix (any case)
/// - Must have at least four `:`-separated segments
/// - Must not contain whitespace
///
/// ## Examples
///
/// ```rust
/// use scim_models::resource::SchemaUri;
///
/// let uri = SchemaUri::new("urn:ietf:params:scim:schemas:core:2.0:User").unwrap();
/// assert_eq!(uri, SchemaUri::new("URN:IETF:PARAMS:SCIM:SCHEMAS:CORE:2.0:USER").unwrap());
/// assert!(SchemaUri::new("http://example.com").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct SchemaUri(String);

impl SchemaUri {
    /// Create a new SchemaUri with validation.
    pub fn new(value: impl Into<String>) -> ValidationResult<Self> {
        let value = value.into();
        Self::validate_format(&value)?;
        Ok(Self(value))
    }

    /// Get the string representation of the SchemaUri.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the owned string value of the SchemaUri.
    pub fn into_string(self) -> String {
        self.0
    }

    /// Compare against a raw string, ignoring ASCII case.
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }

    /// Whether `value` has URN syntax this crate accepts.
    pub fn is_valid(value: &str) -> bool {
        Self::validate_format(value).is_ok()
    }

    fn validate_format(value: &str) -> ValidationResult<()> {
        let invalid = || ValidationError::malformed(format!("invalid schema URN '{value}'"));

        if value.is_empty() || value.chars().any(char::is_whitespace) {
            return Err(invalid());
        }
        if !value
            .get(..4)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("urn:"))
        {
            return Err(invalid());
        }
        let segments: Vec<&str> = value.split(':').collect();
        if segments.len() < 4 || segments.iter().any(|s| s.is_empty()) {
            return Err(invalid());
        }

        Ok(())
    }
}

impl PartialEq for SchemaUri {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for SchemaUri {}

impl Hash for SchemaUri {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for byte in self.0.bytes() {
            state.write_u8(byte.to_ascii_lowercase());
        }
    }
}

impl fmt::Display for SchemaUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for SchemaUri {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for SchemaUri {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl Serialize for SchemaUri {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SchemaUri {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::new(value).map_err(serde::de::Error::custom)
    }
}
