//! File-backed streams.

use crate::error::{Result, StreamError};
use crate::handle::FileHandle;
use crate::stream::{ResourceStream, SizePolicy};
use crate::types::{OpenMode, StreamKind};
use std::io;
use std::path::{Path, PathBuf};

/// Builder for opening a file stream.
///
/// Both `readable` and `writable` default to `true`, which opens the file
/// read-write and creates or truncates it.
#[derive(Clone, Debug)]
#[must_use = "builders do nothing unless you call .open()"]
pub struct FileOptions {
    path: PathBuf,
    readable: bool,
    writable: bool,
}

impl FileOptions {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            readable: true,
            writable: true,
        }
    }

    /// Whether the stream may be read from.
    pub fn readable(mut self, readable: bool) -> Self {
        self.readable = readable;
        self
    }

    /// Whether the stream may be written to.
    ///
    /// A writable file is created if missing and truncated otherwise.
    pub fn writable(mut self, writable: bool) -> Self {
        self.writable = writable;
        self
    }

    /// Mode the file will be opened with, `None` if neither flag is set.
    pub fn mode(&self) -> Option<OpenMode> {
        OpenMode::from_flags(self.readable, self.writable)
    }

    /// Open the file.
    ///
    /// Fails with [`StreamError::OpenFailed`] when neither flag is set or the
    /// file cannot be opened, e.g. a missing file opened read-only.
    pub fn open(self) -> Result<ResourceStream> {
        let resource = self.path.display().to_string();
        let opened = self
            .mode()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty open mode"))
            .and_then(|mode| FileHandle::open(&self.path, mode));

        match opened {
            Ok(handle) => Ok(ResourceStream::from_handle(
                StreamKind::File,
                handle,
                SizePolicy::Handle,
            )),
            Err(e) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(path = %resource, error = %e, "file stream open failed");

                Err(StreamError::open_failed(resource, e))
            }
        }
    }
}

impl ResourceStream {
    /// Open a file stream with explicit readable/writable flags.
    pub fn file(path: impl AsRef<Path>, readable: bool, writable: bool) -> Result<Self> {
        FileOptions::new(path)
            .readable(readable)
            .writable(writable)
            .open()
    }

    /// Start configuring a file stream.
    pub fn file_options(path: impl AsRef<Path>) -> FileOptions {
        FileOptions::new(path)
    }
}
