//! # File Items
//!
//! A file-like record, the usual unit flowing through object pipelines. Its
//! contents are either absent, fully materialized in memory, or a live stream
//! that has not been read yet.

use crate::item::ContentStream;
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Contents carried by a [`File`]
#[derive(Default)]
pub enum Contents {
    /// No contents (directories, or files read with contents disabled)
    #[default]
    Null,
    /// Contents held in memory
    Buffer(Vec<u8>),
    /// Live contents that have not been read yet
    Stream(Box<dyn AsyncRead + Send + Unpin>),
}

impl Contents {
    /// Wrap any async reader as stream contents
    pub fn stream(reader: impl AsyncRead + Send + Unpin + 'static) -> Self {
        Self::Stream(Box::new(reader))
    }

    /// Materialize the contents into bytes, draining a stream if needed
    pub async fn read_to_end(self) -> std::io::Result<Vec<u8>> {
        match self {
            Self::Null => Ok(Vec::new()),
            Self::Buffer(bytes) => Ok(bytes),
            Self::Stream(mut reader) => {
                let mut bytes = Vec::new();
                reader.read_to_end(&mut bytes).await?;
                Ok(bytes)
            }
        }
    }
}

impl fmt::Debug for Contents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "Null"),
            Self::Buffer(bytes) => write!(f, "Buffer({} bytes)", bytes.len()),
            Self::Stream(_) => write!(f, "Stream(..)"),
        }
    }
}

/// A file-like pipeline item
#[derive(Debug)]
pub struct File {
    pub path: PathBuf,
    pub base: Option<PathBuf>,
    pub contents: Contents,
}

impl File {
    /// Create a file with no contents
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            base: None,
            contents: Contents::Null,
        }
    }

    /// Create a file backed by an in-memory buffer
    pub fn buffered(path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(path).with_contents(Contents::Buffer(bytes.into()))
    }

    /// Create a file backed by a live content stream
    pub fn streamed(
        path: impl Into<PathBuf>,
        reader: impl AsyncRead + Send + Unpin + 'static,
    ) -> Self {
        Self::new(path).with_contents(Contents::stream(reader))
    }

    pub fn with_base(mut self, base: impl Into<PathBuf>) -> Self {
        self.base = Some(base.into());
        self
    }

    pub fn with_contents(mut self, contents: Contents) -> Self {
        self.contents = contents;
        self
    }

    pub fn is_null(&self) -> bool {
        matches!(self.contents, Contents::Null)
    }

    pub fn is_buffer(&self) -> bool {
        matches!(self.contents, Contents::Buffer(_))
    }

    /// Path relative to `base`, or the full path when there is no usable base
    pub fn relative(&self) -> &Path {
        self.base
            .as_deref()
            .and_then(|base| self.path.strip_prefix(base).ok())
            .unwrap_or(&self.path)
    }

    /// Final path component as a string, if it is valid UTF-8
    pub fn basename(&self) -> Option<&str> {
        self.path.file_name().and_then(|name| name.to_str())
    }
}

impl ContentStream for File {
    fn is_stream(&self) -> bool {
        matches!(self.contents, Contents::Stream(_))
    }
}
