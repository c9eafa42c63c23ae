//! Representation kinds an artifact can take.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of forms an artifact may take while flowing through a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepresentationKind {
    /// A location on the filesystem.
    Path,
    /// An open, readable byte stream.
    Stream,
    /// An in-memory byte buffer.
    Bytes,
    /// Decoded UTF-8 text.
    String,
    /// A directory on the filesystem.
    Directory,
    /// No artifact at all.
    Untyped,
}

impl RepresentationKind {
    /// All kinds, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Path,
        Self::Stream,
        Self::Bytes,
        Self::String,
        Self::Directory,
        Self::Untyped,
    ];

    /// Returns true for every kind except [`RepresentationKind::Untyped`].
    #[must_use]
    pub fn is_concrete(&self) -> bool {
        !matches!(self, Self::Untyped)
    }
}

impl Default for RepresentationKind {
    fn default() -> Self {
        Self::Untyped
    }
}

impl fmt::Display for RepresentationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path => write!(f, "path"),
            Self::Stream => write!(f, "stream"),
            Self::Bytes => write!(f, "bytes"),
            Self::String => write!(f, "string"),
            Self::Directory => write!(f, "directory"),
            Self::Untyped => write!(f, "untyped"),
        }
    }
}
