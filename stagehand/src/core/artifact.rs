//! The artifact value that flows between stages.

use std::fmt;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use tempfile::TempPath;

use super::{ConversionGraph, Directory, RepresentationKind};
use crate::errors::{Result, StagehandError};

/// A filesystem path payload.
///
/// When the file was created by stagehand (for example by draining a stream)
/// the path owns it and the file is deleted when the payload is dropped.
#[derive(Debug)]
pub struct ArtifactPath {
    path: PathBuf,
    temp: Option<TempPath>,
}

impl ArtifactPath {
    /// Wraps a path stagehand does not own.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            temp: None,
        }
    }

    /// Wraps a temporary file that is deleted with this payload.
    #[must_use]
    pub fn temporary(temp: TempPath) -> Self {
        Self {
            path: temp.to_path_buf(),
            temp: Some(temp),
        }
    }

    /// Returns the location.
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.path
    }

    /// Returns true if the file is deleted when this payload is dropped.
    #[must_use]
    pub fn is_temporary(&self) -> bool {
        self.temp.is_some()
    }

    fn into_parts(self) -> (PathBuf, Option<TempPath>) {
        (self.path, self.temp)
    }
}

/// A readable byte stream payload.
pub struct ByteStream {
    reader: Box<dyn Read + Send>,
    // Keeps a temporary backing file alive for as long as the stream is.
    _backing: Option<TempPath>,
}

impl ByteStream {
    /// Wraps any reader.
    pub fn new(reader: impl Read + Send + 'static) -> Self {
        Self {
            reader: Box::new(reader),
            _backing: None,
        }
    }

    fn with_backing(reader: impl Read + Send + 'static, backing: Option<TempPath>) -> Self {
        Self {
            reader: Box::new(reader),
            _backing: backing,
        }
    }
}

impl Read for ByteStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.reader.read(buf)
    }
}

impl fmt::Debug for ByteStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteStream").finish_non_exhaustive()
    }
}

/// The single evolving piece of data passed from stage to stage.
///
/// Each variant carries the payload for its [`RepresentationKind`]. Values
/// are moved, never shared: a stage consumes its input and returns a new
/// artifact.
#[derive(Debug)]
pub enum Artifact {
    /// A filesystem path.
    Path(ArtifactPath),
    /// An open byte stream.
    Stream(ByteStream),
    /// An in-memory buffer.
    Bytes(Vec<u8>),
    /// Decoded text.
    String(String),
    /// A directory.
    Directory(Directory),
    /// No artifact.
    Untyped,
}

impl Artifact {
    /// Creates a path artifact for a file stagehand does not own.
    #[must_use]
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(ArtifactPath::new(path))
    }

    /// Creates a stream artifact from any reader.
    pub fn stream(reader: impl Read + Send + 'static) -> Self {
        Self::Stream(ByteStream::new(reader))
    }

    /// Returns the representation kind of this value.
    #[must_use]
    pub fn kind(&self) -> RepresentationKind {
        match self {
            Self::Path(_) => RepresentationKind::Path,
            Self::Stream(_) => RepresentationKind::Stream,
            Self::Bytes(_) => RepresentationKind::Bytes,
            Self::String(_) => RepresentationKind::String,
            Self::Directory(_) => RepresentationKind::Directory,
            Self::Untyped => RepresentationKind::Untyped,
        }
    }

    /// Returns true if there is no artifact at all.
    #[must_use]
    pub fn is_untyped(&self) -> bool {
        matches!(self, Self::Untyped)
    }

    /// Returns the filesystem location for path and directory artifacts.
    #[must_use]
    pub fn location(&self) -> Option<&Path> {
        match self {
            Self::Path(path) => Some(path.as_path()),
            Self::Directory(dir) => Some(dir.path()),
            _ => None,
        }
    }

    /// Converts this value into the `target` representation.
    ///
    /// Converting to the current kind returns the value untouched. Otherwise
    /// the edges of the route chosen by [`ConversionGraph`] are applied in
    /// order.
    pub fn convert_to(self, target: RepresentationKind) -> Result<Self> {
        let source = self.kind();
        if source == target {
            return Ok(self);
        }

        let route = ConversionGraph::global().route(source, target)?;
        tracing::debug!(%source, %target, hops = route.len(), "Converting artifact");
        route.iter().try_fold(self, |value, edge| edge.apply(value))
    }

    /// Converts to bytes and returns the buffer.
    pub fn into_bytes(self) -> Result<Vec<u8>> {
        match self.convert_to(RepresentationKind::Bytes)? {
            Self::Bytes(bytes) => Ok(bytes),
            other => Err(mismatch(other.kind(), RepresentationKind::Bytes)),
        }
    }

    /// Converts to text and returns it.
    pub fn into_string(self) -> Result<String> {
        match self.convert_to(RepresentationKind::String)? {
            Self::String(text) => Ok(text),
            other => Err(mismatch(other.kind(), RepresentationKind::String)),
        }
    }

    /// Converts to a path payload and returns it.
    pub fn into_path(self) -> Result<ArtifactPath> {
        match self.convert_to(RepresentationKind::Path)? {
            Self::Path(path) => Ok(path),
            other => Err(mismatch(other.kind(), RepresentationKind::Path)),
        }
    }

    /// Converts to a stream payload and returns it.
    pub fn into_stream(self) -> Result<ByteStream> {
        match self.convert_to(RepresentationKind::Stream)? {
            Self::Stream(stream) => Ok(stream),
            other => Err(mismatch(other.kind(), RepresentationKind::Stream)),
        }
    }

    /// Converts to a directory payload and returns it.
    pub fn into_directory(self) -> Result<Directory> {
        match self.convert_to(RepresentationKind::Directory)? {
            Self::Directory(dir) => Ok(dir),
            other => Err(mismatch(other.kind(), RepresentationKind::Directory)),
        }
    }
}

impl From<String> for Artifact {
    fn from(text: String) -> Self {
        Self::String(text)
    }
}

impl From<&str> for Artifact {
    fn from(text: &str) -> Self {
        Self::String(text.to_string())
    }
}

impl From<Vec<u8>> for Artifact {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<Directory> for Artifact {
    fn from(dir: Directory) -> Self {
        Self::Directory(dir)
    }
}

impl From<File> for Artifact {
    fn from(file: File) -> Self {
        Self::stream(file)
    }
}

fn mismatch(from: RepresentationKind, to: RepresentationKind) -> StagehandError {
    StagehandError::NoConversionPath { from, to }
}

pub(super) fn path_to_directory(path: ArtifactPath) -> Result<Artifact> {
    if !path.as_path().is_dir() {
        return Err(StagehandError::NotADirectory(path.as_path().to_path_buf()));
    }
    Ok(Artifact::Directory(Directory::borrowed(path.as_path())))
}

pub(super) fn path_to_stream(path: ArtifactPath) -> Result<Artifact> {
    let (path, temp) = path.into_parts();
    let file = File::open(&path)?;
    Ok(Artifact::Stream(ByteStream::with_backing(file, temp)))
}

pub(super) fn stream_to_path(mut stream: ByteStream) -> Result<Artifact> {
    let mut file = tempfile::Builder::new().prefix("stagehand-").tempfile()?;
    std::io::copy(&mut stream, file.as_file_mut())?;
    Ok(Artifact::Path(ArtifactPath::temporary(file.into_temp_path())))
}

pub(super) fn stream_to_bytes(mut stream: ByteStream) -> Result<Artifact> {
    let mut buffer = Vec::new();
    stream.read_to_end(&mut buffer)?;
    Ok(Artifact::Bytes(buffer))
}

pub(super) fn bytes_to_stream(bytes: Vec<u8>) -> Artifact {
    Artifact::stream(Cursor::new(bytes))
}

pub(super) fn bytes_to_string(bytes: Vec<u8>) -> Result<Artifact> {
    Ok(Artifact::String(String::from_utf8(bytes)?))
}

pub(super) fn string_to_bytes(text: String) -> Artifact {
    Artifact::Bytes(text.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    #[test]
    fn test_identity_conversion_keeps_payload() {
        let value = Artifact::from("module main;").convert_to(RepresentationKind::String).unwrap();
        match value {
            Artifact::String(text) => assert_eq!(text, "module main;"),
            other => panic!("unexpected kind {}", other.kind()),
        }
    }

    #[test]
    fn test_identity_conversion_keeps_stream_position() {
        let mut cursor = Cursor::new(b"abcdef".to_vec());
        let mut skipped = [0u8; 2];
        cursor.read_exact(&mut skipped).unwrap();

        let value = Artifact::stream(cursor).convert_to(RepresentationKind::Stream).unwrap();
        assert_eq!(value.into_bytes().unwrap(), b"cdef".to_vec());
    }

    #[test]
    fn test_path_to_string_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("in.txt");
        fs::write(&file, "hello").unwrap();

        let text = Artifact::path(&file).into_string().unwrap();
        assert_eq!(text, "hello");
    }

    #[test]
    fn test_stream_to_path_drains_into_temporary_file() {
        let value = Artifact::stream(Cursor::new(b"drained".to_vec()));
        let path = value.into_path().unwrap();

        assert!(path.is_temporary());
        assert_eq!(fs::read_to_string(path.as_path()).unwrap(), "drained");

        let location = path.as_path().to_path_buf();
        drop(path);
        assert!(!location.exists());
    }

    #[test]
    fn test_temporary_path_survives_until_stream_is_read() {
        let path = Artifact::from("kept").convert_to(RepresentationKind::Path).unwrap();
        let location = path.location().unwrap().to_path_buf();

        let stream = path.convert_to(RepresentationKind::Stream).unwrap();
        assert_eq!(stream.into_string().unwrap(), "kept");
        assert!(!location.exists());
    }

    #[test]
    fn test_path_to_directory_rejects_files() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("in.txt");
        fs::write(&file, "x").unwrap();

        let err = Artifact::path(&file).into_directory().unwrap_err();
        assert!(matches!(err, StagehandError::NotADirectory(p) if p == file));
    }

    #[test]
    fn test_path_to_directory_borrows_existing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let value = Artifact::path(dir.path()).into_directory().unwrap();

        assert_eq!(value.path(), dir.path());
        assert!(!value.is_owned());
    }

    #[test]
    fn test_bytes_to_string_rejects_invalid_utf8() {
        let err = Artifact::from(vec![0xff, 0xfe]).into_string().unwrap_err();
        assert!(matches!(err, StagehandError::InvalidUtf8(_)));
    }

    #[test]
    fn test_utf8_round_trip() {
        let original = "añ → ü\n".as_bytes().to_vec();
        let text = Artifact::from(original.clone()).into_string().unwrap();
        let back = Artifact::from(text).into_bytes().unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn test_untyped_cannot_convert() {
        let err = Artifact::Untyped.into_string().unwrap_err();
        assert!(matches!(
            err,
            StagehandError::NoConversionPath {
                from: RepresentationKind::Untyped,
                to: RepresentationKind::String,
            }
        ));
    }

    #[test]
    fn test_directory_is_a_sink() {
        let dir = tempfile::tempdir().unwrap();
        let value = Artifact::from(Directory::borrowed(dir.path()));
        assert!(value.into_bytes().is_err());
    }
}
