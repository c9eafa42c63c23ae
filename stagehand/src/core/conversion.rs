//! The fixed conversion graph between representation kinds.
//!
//! The graph has seven edges and never changes at runtime. Routes between
//! every pair of kinds are computed once, breadth-first over the edges in
//! declaration order, and cached in a table keyed by `(source, target)`.
//! The same pair therefore always uses the same chain of edges.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::OnceLock;

use super::artifact::{
    bytes_to_stream, bytes_to_string, path_to_directory, path_to_stream, stream_to_bytes,
    stream_to_path, string_to_bytes,
};
use super::{Artifact, RepresentationKind};
use crate::errors::{Result, StagehandError};

/// A single conversion between two adjacent representation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConversionEdge {
    /// Path → Directory; fails if the path is not a directory.
    PathToDirectory,
    /// Path → Stream; opens the file for reading.
    PathToStream,
    /// Stream → Path; drains the stream into a temporary file.
    StreamToPath,
    /// Stream → Bytes; reads the stream to the end.
    StreamToBytes,
    /// Bytes → Stream; wraps the buffer in a cursor.
    BytesToStream,
    /// Bytes → String; decodes UTF-8.
    BytesToString,
    /// String → Bytes; encodes UTF-8.
    StringToBytes,
}

impl ConversionEdge {
    /// Every edge, in the order routing explores them.
    pub const ALL: [Self; 7] = [
        Self::PathToDirectory,
        Self::PathToStream,
        Self::StreamToPath,
        Self::StreamToBytes,
        Self::BytesToStream,
        Self::BytesToString,
        Self::StringToBytes,
    ];

    /// The kind this edge consumes.
    #[must_use]
    pub fn source(&self) -> RepresentationKind {
        match self {
            Self::PathToDirectory | Self::PathToStream => RepresentationKind::Path,
            Self::StreamToPath | Self::StreamToBytes => RepresentationKind::Stream,
            Self::BytesToStream | Self::BytesToString => RepresentationKind::Bytes,
            Self::StringToBytes => RepresentationKind::String,
        }
    }

    /// The kind this edge produces.
    #[must_use]
    pub fn target(&self) -> RepresentationKind {
        match self {
            Self::PathToDirectory => RepresentationKind::Directory,
            Self::PathToStream | Self::BytesToStream => RepresentationKind::Stream,
            Self::StreamToPath => RepresentationKind::Path,
            Self::StreamToBytes | Self::StringToBytes => RepresentationKind::Bytes,
            Self::BytesToString => RepresentationKind::String,
        }
    }

    /// Applies the edge to `value`.
    ///
    /// # Errors
    ///
    /// Fails with [`StagehandError::NoConversionPath`] if `value` is not of
    /// the edge's source kind, or with the edge's own failure.
    pub fn apply(self, value: Artifact) -> Result<Artifact> {
        match (self, value) {
            (Self::PathToDirectory, Artifact::Path(path)) => path_to_directory(path),
            (Self::PathToStream, Artifact::Path(path)) => path_to_stream(path),
            (Self::StreamToPath, Artifact::Stream(stream)) => stream_to_path(stream),
            (Self::StreamToBytes, Artifact::Stream(stream)) => stream_to_bytes(stream),
            (Self::BytesToStream, Artifact::Bytes(bytes)) => Ok(bytes_to_stream(bytes)),
            (Self::BytesToString, Artifact::Bytes(bytes)) => bytes_to_string(bytes),
            (Self::StringToBytes, Artifact::String(text)) => Ok(string_to_bytes(text)),
            (edge, other) => Err(StagehandError::NoConversionPath {
                from: other.kind(),
                to: edge.target(),
            }),
        }
    }
}

impl fmt::Display for ConversionEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source(), self.target())
    }
}

/// Precomputed routes between every reachable pair of kinds.
#[derive(Debug, Clone)]
pub struct ConversionGraph {
    routes: HashMap<(RepresentationKind, RepresentationKind), Vec<ConversionEdge>>,
}

impl ConversionGraph {
    /// Builds the route table from [`ConversionEdge::ALL`].
    #[must_use]
    pub fn new() -> Self {
        let mut routes = HashMap::new();
        for source in RepresentationKind::ALL {
            for (target, chain) in shortest_chains(source) {
                routes.insert((source, target), chain);
            }
        }
        Self { routes }
    }

    /// Returns the process-wide graph, built on first use.
    pub fn global() -> &'static Self {
        static GRAPH: OnceLock<ConversionGraph> = OnceLock::new();
        GRAPH.get_or_init(Self::new)
    }

    /// Returns the chain of edges leading from `from` to `to`.
    ///
    /// The chain is empty when both kinds are equal.
    ///
    /// # Errors
    ///
    /// Returns [`StagehandError::NoConversionPath`] if no chain exists.
    pub fn route(
        &self,
        from: RepresentationKind,
        to: RepresentationKind,
    ) -> Result<&[ConversionEdge]> {
        if from == to {
            return Ok(&[]);
        }
        self.routes
            .get(&(from, to))
            .map(Vec::as_slice)
            .ok_or(StagehandError::NoConversionPath { from, to })
    }

    /// Returns true if `to` can be reached from `from`.
    #[must_use]
    pub fn is_reachable(&self, from: RepresentationKind, to: RepresentationKind) -> bool {
        self.route(from, to).is_ok()
    }
}

impl Default for ConversionGraph {
    fn default() -> Self {
        Self::new()
    }
}

fn shortest_chains(
    source: RepresentationKind,
) -> Vec<(RepresentationKind, Vec<ConversionEdge>)> {
    let mut found: HashMap<RepresentationKind, Vec<ConversionEdge>> = HashMap::new();
    let mut order = Vec::new();
    let mut queue = VecDeque::from([(source, Vec::new())]);

    while let Some((kind, chain)) = queue.pop_front() {
        for edge in ConversionEdge::ALL.iter().filter(|e| e.source() == kind) {
            let next = edge.target();
            if next == source || found.contains_key(&next) {
                continue;
            }
            let mut extended: Vec<ConversionEdge> = chain.clone();
            extended.push(*edge);
            found.insert(next, extended.clone());
            order.push(next);
            queue.push_back((next, extended));
        }
    }

    order
        .into_iter()
        .filter_map(|kind| found.remove(&kind).map(|chain| (kind, chain)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use crate::core::RepresentationKind::{Bytes, Directory, Path, Stream, String as Text, Untyped};

    #[test]
    fn test_edges_are_adjacent() {
        for edge in ConversionEdge::ALL {
            assert_ne!(edge.source(), edge.target());
            assert!(edge.source().is_concrete());
        }
    }

    #[test]
    fn test_known_routes() {
        let graph = ConversionGraph::new();
        assert_eq!(
            graph.route(Path, Text).unwrap(),
            &[
                ConversionEdge::PathToStream,
                ConversionEdge::StreamToBytes,
                ConversionEdge::BytesToString,
            ]
        );
        assert_eq!(
            graph.route(Text, Stream).unwrap(),
            &[ConversionEdge::StringToBytes, ConversionEdge::BytesToStream]
        );
        assert_eq!(
            graph.route(Stream, Directory).unwrap(),
            &[ConversionEdge::StreamToPath, ConversionEdge::PathToDirectory]
        );
        assert!(graph.route(Bytes, Bytes).unwrap().is_empty());
    }

    #[test]
    fn test_directory_and_untyped_have_no_outgoing_routes() {
        let graph = ConversionGraph::new();
        for target in RepresentationKind::ALL {
            if target != Directory {
                assert!(!graph.is_reachable(Directory, target));
            }
            if target != Untyped {
                assert!(!graph.is_reachable(Untyped, target));
                assert!(!graph.is_reachable(target, Untyped));
            }
        }
    }

    #[test]
    fn test_data_kinds_are_mutually_reachable() {
        let graph = ConversionGraph::new();
        for from in [Path, Stream, Bytes, Text] {
            for to in [Path, Stream, Bytes, Text, Directory] {
                assert!(graph.is_reachable(from, to), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn test_routes_are_deterministic() {
        let first = ConversionGraph::new();
        let second = ConversionGraph::new();
        for from in RepresentationKind::ALL {
            for to in RepresentationKind::ALL {
                assert_eq!(
                    first.route(from, to).ok().map(<[_]>::to_vec),
                    second.route(from, to).ok().map(<[_]>::to_vec)
                );
            }
        }
    }

    #[test]
    fn test_routes_chain_correctly() {
        let graph = ConversionGraph::global();
        for from in RepresentationKind::ALL {
            for to in RepresentationKind::ALL {
                if let Ok(chain) = graph.route(from, to) {
                    let mut current = from;
                    for edge in chain {
                        assert_eq!(edge.source(), current);
                        current = edge.target();
                    }
                    assert_eq!(current, to);
                }
            }
        }
    }

    #[test]
    fn test_apply_rejects_wrong_source_kind() {
        let err = ConversionEdge::BytesToString
            .apply(Artifact::from("text"))
            .unwrap_err();
        assert!(matches!(
            err,
            StagehandError::NoConversionPath { from: Text, to: Text }
        ));
    }
}
