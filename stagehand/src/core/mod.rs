//! Core domain model types for stagehand.
//!
//! This module contains the artifact value that flows through a pipeline:
//! - Representation kinds
//! - The artifact sum type and its payloads
//! - The fixed conversion graph between kinds
//! - Scoped directory payloads

mod artifact;
mod conversion;
mod directory;
mod kind;

pub use artifact::{Artifact, ArtifactPath, ByteStream};
pub use conversion::{ConversionEdge, ConversionGraph};
pub use directory::Directory;
pub use kind::RepresentationKind;
