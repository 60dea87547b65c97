//! Attribute path parsing and resolution.
//!
//! Paths name attributes in `attributes`/`excludedAttributes` parameters and
//! PATCH operations (RFC 7644 §3.10):
//!
//! - `userName`
//! - `name.givenName`
//! - `urn:ietf:params:scim:schemas:extension:enterprise:2.0:User:employeeNumber`
//! - `urn:ietf:params:scim:schemas:extension:enterprise:2.0:User` (whole extension)
//!
//! Parsing only checks syntax. Resolution checks the path against the
//! schemas reachable from a base schema and canonicalizes attribute names.

use crate::error::{ValidationError, ValidationResult};
use crate::resource::schema_uri::SchemaUri;
use crate::schema::{AttributeType, SchemaRegistry};
use std::fmt;

/// A syntactically valid, not yet resolved attribute path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributePath {
    raw: String,
    schema: Option<String>,
    /// `None` when the whole path is a schema URN.
    attribute: Option<String>,
    sub_attribute: Option<String>,
}

impl AttributePath {
    /// Parse a path string.
    ///
    /// Fails with [`ValidationError::InvalidFilterPath`] on malformed syntax,
    /// including value-selection filters such as `emails[type eq "work"]`.
    pub fn parse(path: &str) -> ValidationResult<Self> {
        let invalid = |reason: &str| ValidationError::invalid_path(path, reason);

        if path.trim().is_empty() {
            return Err(invalid("path is empty"));
        }
        if path.chars().any(char::is_whitespace) {
            return Err(invalid("path contains whitespace"));
        }
        if path.contains('[') || path.contains(']') {
            return Err(invalid("value filters are not supported in attribute paths"));
        }

        let is_urn = path
            .get(..4)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("urn:"));

        let (schema, attribute_part) = if is_urn {
            let qualified = path
                .rsplit_once(':')
                .filter(|(schema, part)| SchemaUri::is_valid(schema) && split_attribute(part).is_ok());
            match qualified {
                Some((schema, part)) => (Some(schema.to_string()), part),
                // a URN whose last segment is no attribute name, like `...:Device:1.0`
                None if SchemaUri::is_valid(path) => {
                    return Ok(Self {
                        raw: path.to_string(),
                        schema: Some(path.to_string()),
                        attribute: None,
                        sub_attribute: None,
                    });
                }
                None => return Err(invalid("malformed schema URN")),
            }
        } else if path.contains(':') {
            return Err(invalid("qualified paths must start with 'urn:'"));
        } else {
            (None, path)
        };

        let (attribute, sub_attribute) = split_attribute(attribute_part).map_err(invalid)?;
        Ok(Self {
            raw: path.to_string(),
            schema,
            attribute: Some(attribute.to_string()),
            sub_attribute: sub_attribute.map(str::to_string),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    pub fn attribute(&self) -> Option<&str> {
        self.attribute.as_deref()
    }

    pub fn sub_attribute(&self) -> Option<&str> {
        self.sub_attribute.as_deref()
    }

    /// Resolve against `base` and the registered schemas.
    ///
    /// Unqualified paths address the base schema. A path equal to a
    /// registered schema URN addresses that whole schema.
    pub fn resolve(
        &self,
        registry: &SchemaRegistry,
        base: &SchemaUri,
    ) -> ValidationResult<ResolvedPath> {
        let invalid = |reason: String| ValidationError::invalid_path(&self.raw, reason);

        if self.schema.is_some() {
            if let Some(whole) = registry.get_schema(&self.raw) {
                return Ok(ResolvedPath {
                    schema: SchemaUri::new(whole.id.as_str())?,
                    attribute: None,
                    sub_attribute: None,
                });
            }
        }

        let Some(attribute_name) = &self.attribute else {
            return Err(invalid(format!("schema '{}' is not registered", self.raw)));
        };
        let schema_id = self.schema.as_deref().unwrap_or(base.as_str());
        let schema = registry
            .get_schema(schema_id)
            .ok_or_else(|| invalid(format!("schema '{schema_id}' is not registered")))?;

        let attribute = schema.attribute(attribute_name).ok_or_else(|| {
            invalid(format!(
                "schema '{}' has no attribute '{attribute_name}'",
                schema.id
            ))
        })?;

        let sub_attribute = match &self.sub_attribute {
            None => None,
            Some(sub) => {
                if attribute.data_type != AttributeType::Complex {
                    return Err(invalid(format!(
                        "attribute '{}' is not complex and has no sub-attribute '{sub}'",
                        attribute.name
                    )));
                }
                let sub_def = attribute.sub_attribute(sub).ok_or_else(|| {
                    invalid(format!(
                        "attribute '{}' has no sub-attribute '{sub}'",
                        attribute.name
                    ))
                })?;
                Some(sub_def.name.clone())
            }
        };

        Ok(ResolvedPath {
            schema: SchemaUri::new(schema.id.as_str())?,
            attribute: Some(attribute.name.clone()),
            sub_attribute,
        })
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// A path checked against the registry, with canonical names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedPath {
    pub schema: SchemaUri,
    /// `None` when the path names a whole schema.
    pub attribute: Option<String>,
    pub sub_attribute: Option<String>,
}

impl ResolvedPath {
    pub fn is_whole_schema(&self) -> bool {
        self.attribute.is_none()
    }
}

impl fmt::Display for ResolvedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.schema)?;
        if let Some(attribute) = &self.attribute {
            write!(f, ":{attribute}")?;
        }
        if let Some(sub) = &self.sub_attribute {
            write!(f, ".{sub}")?;
        }
        Ok(())
    }
}

/// Split `attr` or `attr.sub`, naming the broken rule on failure.
fn split_attribute(part: &str) -> Result<(&str, Option<&str>), &'static str> {
    let mut segments = part.split('.');
    let attribute = segments.next().unwrap_or_default();
    let sub_attribute = segments.next();
    if segments.next().is_some() {
        return Err("only one level of sub-attribute is allowed");
    }
    if !is_attribute_name(attribute) {
        return Err("malformed attribute name");
    }
    if sub_attribute.is_some_and(|sub| !is_attribute_name(sub)) {
        return Err("malformed sub-attribute name");
    }
    Ok((attribute, sub_attribute))
}

/// ATTRNAME per RFC 7644 §3.10, plus the `$ref` sub-attribute.
fn is_attribute_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
