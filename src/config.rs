//! Options for parsing SCIM payloads.
//!
//! The unknown-key policy is an explicit option of every deserialize call
//! and is never derived from the [`Context`](crate::resource::Context).

use crate::resource::ResourceInstance;

/// What to do with payload keys that match no declared attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strictness {
    /// Fail with `UnknownAttribute`.
    #[default]
    Strict,
    /// Drop the key, log a warning and continue.
    Lenient,
}

impl Strictness {
    pub fn is_lenient(self) -> bool {
        self == Self::Lenient
    }
}

/// Per-call deserialization options.
///
/// ```rust
/// use scim_models::config::{DeserializeOptions, Strictness};
///
/// let options = DeserializeOptions::lenient();
/// assert_eq!(options.strictness, Strictness::Lenient);
/// assert!(options.original.is_none());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DeserializeOptions<'a> {
    pub strictness: Strictness,
    /// Previously known state, compared against for `immutable` attributes
    /// in replacement requests.
    pub original: Option<&'a ResourceInstance>,
}

impl<'a> DeserializeOptions<'a> {
    pub fn strict() -> Self {
        Self::default()
    }

    pub fn lenient() -> Self {
        Self {
            strictness: Strictness::Lenient,
            original: None,
        }
    }

    pub fn with_strictness(mut self, strictness: Strictness) -> Self {
        self.strictness = strictness;
        self
    }

    pub fn with_original(mut self, original: &'a ResourceInstance) -> Self {
        self.original = Some(original);
        self
    }
}

impl From<Strictness> for DeserializeOptions<'_> {
    fn from(strictness: Strictness) -> Self {
        Self {
            strictness,
            original: None,
        }
    }
}
