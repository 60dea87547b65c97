//! Attribute selection from `attributes` / `excludedAttributes` parameters.
//!
//! An [`AttributeSelection`] holds the raw path strings a client asked for.
//! It is resolved once per serialize call into a [`ResolvedSelection`], which
//! the engine queries attribute by attribute.

use crate::error::{ValidationError, ValidationResult};
use crate::resource::path::{AttributePath, ResolvedPath};
use crate::resource::schema_uri::SchemaUri;
use crate::schema::SchemaRegistry;

/// Client-requested attribute inclusion or exclusion.
///
/// `included` and `excluded` are mutually exclusive (RFC 7644 §3.4.2.5).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeSelection {
    included: Vec<String>,
    excluded: Vec<String>,
}

impl AttributeSelection {
    /// No selection: every `Default` attribute is returned.
    pub fn none() -> Self {
        Self::default()
    }

    /// Allow-list of attribute paths.
    pub fn include<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            included: paths.into_iter().map(Into::into).collect(),
            excluded: Vec::new(),
        }
    }

    /// Deny-list of attribute paths.
    pub fn exclude<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            included: Vec::new(),
            excluded: paths.into_iter().map(Into::into).collect(),
        }
    }

    /// Build from optional parameter lists, rejecting both being non-empty.
    pub fn new(included: Option<Vec<String>>, excluded: Option<Vec<String>>) -> ValidationResult<Self> {
        let included = included.unwrap_or_default();
        let excluded = excluded.unwrap_or_default();
        if !included.is_empty() && !excluded.is_empty() {
            return Err(ValidationError::ConflictingAttributeSelection);
        }
        Ok(Self { included, excluded })
    }

    pub fn included(&self) -> &[String] {
        &self.included
    }

    pub fn excluded(&self) -> &[String] {
        &self.excluded
    }

    pub fn is_empty(&self) -> bool {
        self.included.is_empty() && self.excluded.is_empty()
    }

    /// Parse and resolve every path against `base` and the registry.
    pub fn resolve(
        &self,
        registry: &SchemaRegistry,
        base: &SchemaUri,
    ) -> ValidationResult<ResolvedSelection> {
        if !self.included.is_empty() && !self.excluded.is_empty() {
            return Err(ValidationError::ConflictingAttributeSelection);
        }
        let resolve_all = |paths: &[String]| -> ValidationResult<Vec<ResolvedPath>> {
            paths
                .iter()
                .map(|raw| AttributePath::parse(raw)?.resolve(registry, base))
                .collect()
        };
        Ok(ResolvedSelection {
            included: resolve_all(&self.included)?,
            excluded: resolve_all(&self.excluded)?,
        })
    }
}

/// Position of an attribute or sub-attribute inside a resource.
#[derive(Debug, Clone, Copy)]
pub struct AttributeRef<'a> {
    pub schema: &'a SchemaUri,
    pub attribute: &'a str,
    pub sub_attribute: Option<&'a str>,
}

impl<'a> AttributeRef<'a> {
    pub fn top(schema: &'a SchemaUri, attribute: &'a str) -> Self {
        Self {
            schema,
            attribute,
            sub_attribute: None,
        }
    }

    pub fn sub(self, sub_attribute: &'a str) -> Self {
        Self {
            sub_attribute: Some(sub_attribute),
            ..self
        }
    }
}

/// A selection whose paths are known to exist.
#[derive(Debug, Clone, Default)]
pub struct ResolvedSelection {
    included: Vec<ResolvedPath>,
    excluded: Vec<ResolvedPath>,
}

impl ResolvedSelection {
    pub fn has_included(&self) -> bool {
        !self.included.is_empty()
    }

    /// Whether an `attributes` entry selects this position.
    ///
    /// Naming a parent selects all of its sub-attributes; naming a
    /// sub-attribute selects its parent; naming a schema selects all of it.
    pub fn includes(&self, at: AttributeRef<'_>) -> bool {
        self.included.iter().any(|path| {
            path.schema == *at.schema
                && match (&path.attribute, &path.sub_attribute, at.sub_attribute) {
                    (None, _, _) => true,
                    (Some(attr), _, None) => attr.eq_ignore_ascii_case(at.attribute),
                    (Some(attr), None, Some(_)) => attr.eq_ignore_ascii_case(at.attribute),
                    (Some(attr), Some(sub), Some(at_sub)) => {
                        attr.eq_ignore_ascii_case(at.attribute) && sub.eq_ignore_ascii_case(at_sub)
                    }
                }
        })
    }

    /// Whether an `excludedAttributes` entry removes this position.
    ///
    /// Excluding `parent.sub` removes only that sub-attribute.
    pub fn excludes(&self, at: AttributeRef<'_>) -> bool {
        self.excluded.iter().any(|path| {
            path.schema == *at.schema
                && match (&path.attribute, &path.sub_attribute, at.sub_attribute) {
                    (None, _, _) => true,
                    (Some(attr), None, _) => attr.eq_ignore_ascii_case(at.attribute),
                    (Some(_), Some(_), None) => false,
                    (Some(attr), Some(sub), Some(at_sub)) => {
                        attr.eq_ignore_ascii_case(at.attribute) && sub.eq_ignore_ascii_case(at_sub)
                    }
                }
        })
    }
}
