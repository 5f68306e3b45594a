//! Typed reference handles
//!
//! A [`Reference`] is an opaque string handle whose prefix encodes the payload
//! category. The prefix is fixed at creation and never changes for an issued
//! handle.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Payload category of a reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceKind {
    /// List of object identifiers
    IdList,
    /// Base64-encoded image payload
    Image,
    /// Markdown table text
    Table,
    /// Serialized heat-map values
    HeatMap,
    /// Incrementally produced report (mutable after creation)
    Overview,
}

impl ReferenceKind {
    /// Handle prefix for this category
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::IdList => "id-list-",
            Self::Image => "image-",
            Self::Table => "embedded-table-",
            Self::HeatMap => "heat-map-",
            Self::Overview => "overview-",
        }
    }

    /// All categories, used for prefix matching
    const ALL: [Self; 5] = [
        Self::IdList,
        Self::Image,
        Self::Table,
        Self::HeatMap,
        Self::Overview,
    ];
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::IdList => "id-list",
            Self::Image => "image",
            Self::Table => "table",
            Self::HeatMap => "heat-map",
            Self::Overview => "overview",
        };
        f.write_str(name)
    }
}

/// Errors when interpreting handle text
#[derive(Debug, thiserror::Error)]
pub enum ReferenceError {
    /// Text does not start with a known category prefix
    #[error("unknown reference category: {0}")]
    UnknownCategory(String),

    /// Prefix with no identifier after it
    #[error("empty reference identifier: {0}")]
    EmptyIdentifier(String),
}

/// Opaque, category-prefixed reference handle
///
/// Handles are globally unique per store instance and are generated at write
/// time ([`crate::ReferenceStore`] issues them). Parsing via [`FromStr`] only
/// validates the shape; whether a handle resolves is up to the store.
/// Deserialization goes through the same validation, so a constructed
/// `Reference` always carries a known prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Reference(String);

impl Reference {
    /// Issue a fresh handle for a category
    #[must_use]
    pub(crate) fn generate(kind: ReferenceKind) -> Self {
        Self(format!("{}{}", kind.prefix(), Uuid::new_v4()))
    }

    /// Category encoded in this handle
    ///
    /// # Panics
    /// Never panics: a constructed `Reference` always carries a known prefix.
    #[must_use]
    pub fn kind(&self) -> ReferenceKind {
        ReferenceKind::ALL
            .into_iter()
            .find(|k| self.0.starts_with(k.prefix()))
            .unwrap_or_else(|| unreachable!("reference constructed without known prefix"))
    }

    /// Handle text
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Reference {
    type Error = ReferenceError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Reference> for String {
    fn from(reference: Reference) -> Self {
        reference.0
    }
}

impl FromStr for Reference {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let kind = ReferenceKind::ALL
            .into_iter()
            .find(|k| s.starts_with(k.prefix()))
            .ok_or_else(|| ReferenceError::UnknownCategory(s.to_string()))?;

        if s.len() == kind.prefix().len() {
            return Err(ReferenceError::EmptyIdentifier(s.to_string()));
        }

        Ok(Self(s.to_string()))
    }
}
