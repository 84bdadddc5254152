//! Handles: the descriptors a stream owns.
//!
//! A [`Handle`] is the narrow contract a [`ResourceStream`](crate::ResourceStream)
//! needs from an open byte resource. Positional reads and writes, seeking,
//! length and a few descriptive attributes. The crate ships handles for files,
//! memory buffers and one-directional process channels.

use crate::types::OpenMode;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// An open byte resource.
///
/// After [`close`](Handle::close) the handle is no longer live: every data
/// call fails and [`len`](Handle::len) reports `None`.
pub trait Handle: fmt::Debug + Send {
    /// Mode the resource was opened with.
    fn mode(&self) -> OpenMode;

    /// Whether the position may be changed explicitly.
    fn is_seekable(&self) -> bool;

    /// Whether the handle still refers to an open resource.
    fn is_live(&self) -> bool;

    /// Implementation family, e.g. `"plainfile"`.
    fn wrapper_type(&self) -> &'static str;

    /// Kind of underlying resource, e.g. `"STDIO"`.
    fn stream_type(&self) -> &'static str;

    /// Name the resource was opened by.
    fn uri(&self) -> &str;

    /// Whether the last read hit the end of the resource.
    fn reached_eof(&self) -> bool;

    /// Byte length of the resource, if it can be determined.
    fn len(&self) -> Option<u64>;

    /// Whether the resource is known to hold no bytes.
    fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }

    /// Current offset.
    fn position(&mut self) -> io::Result<u64>;

    /// Read into `buf` at the current offset.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write `data` at the current offset.
    fn write(&mut self, data: &[u8]) -> io::Result<usize>;

    /// Move the current offset.
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64>;

    /// Push written data down to the resource.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Release the resource. Closing twice is a no-op.
    fn close(&mut self) -> io::Result<()>;
}

fn closed() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "handle is closed")
}

fn not_seekable() -> io::Error {
    io::Error::new(io::ErrorKind::Unsupported, "handle is not seekable")
}

fn not_readable() -> io::Error {
    io::Error::new(io::ErrorKind::PermissionDenied, "handle not opened for reading")
}

fn not_writable() -> io::Error {
    io::Error::new(io::ErrorKind::PermissionDenied, "handle not opened for writing")
}

/// Check that a process channel still has an open descriptor.
#[cfg(unix)]
pub(crate) fn probe_channel(channel: &impl std::os::fd::AsFd) -> io::Result<()> {
    channel.as_fd().try_clone_to_owned().map(drop)
}

#[cfg(not(unix))]
pub(crate) fn probe_channel<T>(_channel: &T) -> io::Result<()> {
    Ok(())
}

/// A named file on disk.
#[derive(Debug)]
pub struct FileHandle {
    file: Option<File>,
    path: PathBuf,
    uri: String,
    mode: OpenMode,
    eof: bool,
}

impl FileHandle {
    /// Open `path` with `mode`.
    ///
    /// `Write` and `ReadWriteTruncate` create the file or truncate it;
    /// `Read` requires it to exist.
    pub fn open(path: impl AsRef<Path>, mode: OpenMode) -> io::Result<Self> {
        let path = path.as_ref();
        let mut options = OpenOptions::new();
        match mode {
            OpenMode::Read => options.read(true),
            OpenMode::Write => options.write(true).create(true).truncate(true),
            OpenMode::ReadWriteTruncate => options.read(true).write(true).create(true).truncate(true),
            OpenMode::ReadWrite => options.read(true).write(true).create(true),
        };
        let file = options.open(path)?;

        Ok(Self {
            file: Some(file),
            path: path.to_path_buf(),
            uri: path.display().to_string(),
            mode,
            eof: false,
        })
    }

    /// Path the file was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn file(&mut self) -> io::Result<&mut File> {
        self.file.as_mut().ok_or_else(closed)
    }
}

impl Handle for FileHandle {
    fn mode(&self) -> OpenMode {
        self.mode
    }

    fn is_seekable(&self) -> bool {
        self.file.is_some()
    }

    fn is_live(&self) -> bool {
        self.file.is_some()
    }

    fn wrapper_type(&self) -> &'static str {
        "plainfile"
    }

    fn stream_type(&self) -> &'static str {
        "STDIO"
    }

    fn uri(&self) -> &str {
        &self.uri
    }

    fn reached_eof(&self) -> bool {
        self.eof
    }

    fn len(&self) -> Option<u64> {
        let file = self.file.as_ref()?;
        file.metadata().ok().map(|meta| meta.len())
    }

    fn position(&mut self) -> io::Result<u64> {
        self.file()?.stream_position()
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.mode.is_readable() {
            return Err(not_readable());
        }
        let n = self.file()?.read(buf)?;
        self.eof = n == 0 && !buf.is_empty();
        Ok(n)
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if !self.mode.is_writable() {
            return Err(not_writable());
        }
        self.file()?.write(data)
    }

    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let offset = self.file()?.seek(pos)?;
        self.eof = false;
        Ok(offset)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file()?.flush()
    }

    fn close(&mut self) -> io::Result<()> {
        match self.file.take() {
            Some(mut file) => file.flush(),
            None => Ok(()),
        }
    }
}

/// An anonymous in-memory buffer.
#[derive(Debug)]
pub struct MemoryHandle {
    buf: Option<Cursor<Vec<u8>>>,
    mode: OpenMode,
    eof: bool,
}

impl MemoryHandle {
    /// An empty read-write buffer.
    pub fn new() -> Self {
        Self {
            buf: Some(Cursor::new(Vec::new())),
            mode: OpenMode::ReadWrite,
            eof: false,
        }
    }

    /// A read-only buffer over existing bytes, positioned at the start.
    pub fn read_only(data: impl Into<Vec<u8>>) -> Self {
        Self {
            buf: Some(Cursor::new(data.into())),
            mode: OpenMode::Read,
            eof: false,
        }
    }

    fn buf(&mut self) -> io::Result<&mut Cursor<Vec<u8>>> {
        self.buf.as_mut().ok_or_else(closed)
    }
}

impl Default for MemoryHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl Handle for MemoryHandle {
    fn mode(&self) -> OpenMode {
        self.mode
    }

    fn is_seekable(&self) -> bool {
        self.buf.is_some()
    }

    fn is_live(&self) -> bool {
        self.buf.is_some()
    }

    fn wrapper_type(&self) -> &'static str {
        "memory"
    }

    fn stream_type(&self) -> &'static str {
        "MEMORY"
    }

    fn uri(&self) -> &str {
        "memory"
    }

    fn reached_eof(&self) -> bool {
        self.eof
    }

    fn len(&self) -> Option<u64> {
        self.buf.as_ref().map(|buf| buf.get_ref().len() as u64)
    }

    fn position(&mut self) -> io::Result<u64> {
        Ok(self.buf()?.position())
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.mode.is_readable() {
            return Err(not_readable());
        }
        let n = self.buf()?.read(buf)?;
        self.eof = n == 0 && !buf.is_empty();
        Ok(n)
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if !self.mode.is_writable() {
            return Err(not_writable());
        }
        self.buf()?.write(data)
    }

    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let offset = self.buf()?.seek(pos)?;
        self.eof = false;
        Ok(offset)
    }

    fn close(&mut self) -> io::Result<()> {
        self.buf = None;
        Ok(())
    }
}

/// A read-only, forward-only channel such as process input.
pub struct ReaderHandle {
    reader: Option<Box<dyn Read + Send>>,
    uri: String,
    consumed: u64,
    eof: bool,
}

impl ReaderHandle {
    pub fn new(reader: impl Read + Send + 'static, uri: impl Into<String>) -> Self {
        Self {
            reader: Some(Box::new(reader)),
            uri: uri.into(),
            consumed: 0,
            eof: false,
        }
    }
}

impl fmt::Debug for ReaderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReaderHandle")
            .field("uri", &self.uri)
            .field("consumed", &self.consumed)
            .field("open", &self.reader.is_some())
            .finish()
    }
}

impl Handle for ReaderHandle {
    fn mode(&self) -> OpenMode {
        OpenMode::Read
    }

    fn is_seekable(&self) -> bool {
        false
    }

    fn is_live(&self) -> bool {
        self.reader.is_some()
    }

    fn wrapper_type(&self) -> &'static str {
        "process"
    }

    fn stream_type(&self) -> &'static str {
        "Input"
    }

    fn uri(&self) -> &str {
        &self.uri
    }

    fn reached_eof(&self) -> bool {
        self.eof
    }

    fn len(&self) -> Option<u64> {
        None
    }

    fn position(&mut self) -> io::Result<u64> {
        self.reader.as_ref().ok_or_else(closed)?;
        Ok(self.consumed)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.reader.as_mut().ok_or_else(closed)?.read(buf)?;
        self.consumed += n as u64;
        self.eof = n == 0 && !buf.is_empty();
        Ok(n)
    }

    fn write(&mut self, _data: &[u8]) -> io::Result<usize> {
        self.reader.as_ref().ok_or_else(closed)?;
        Err(not_writable())
    }

    fn seek(&mut self, _pos: SeekFrom) -> io::Result<u64> {
        Err(not_seekable())
    }

    fn close(&mut self) -> io::Result<()> {
        self.reader = None;
        Ok(())
    }
}

/// A write-only, forward-only channel such as process output.
pub struct WriterHandle {
    writer: Option<Box<dyn Write + Send>>,
    uri: String,
    written: u64,
}

impl WriterHandle {
    pub fn new(writer: impl Write + Send + 'static, uri: impl Into<String>) -> Self {
        Self {
            writer: Some(Box::new(writer)),
            uri: uri.into(),
            written: 0,
        }
    }
}

impl fmt::Debug for WriterHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriterHandle")
            .field("uri", &self.uri)
            .field("written", &self.written)
            .field("open", &self.writer.is_some())
            .finish()
    }
}

impl Handle for WriterHandle {
    fn mode(&self) -> OpenMode {
        OpenMode::Write
    }

    fn is_seekable(&self) -> bool {
        false
    }

    fn is_live(&self) -> bool {
        self.writer.is_some()
    }

    fn wrapper_type(&self) -> &'static str {
        "process"
    }

    fn stream_type(&self) -> &'static str {
        "Output"
    }

    fn uri(&self) -> &str {
        &self.uri
    }

    fn reached_eof(&self) -> bool {
        false
    }

    fn len(&self) -> Option<u64> {
        None
    }

    fn position(&mut self) -> io::Result<u64> {
        self.writer.as_ref().ok_or_else(closed)?;
        Ok(self.written)
    }

    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        self.writer.as_ref().ok_or_else(closed)?;
        Err(not_readable())
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let n = self.writer.as_mut().ok_or_else(closed)?.write(data)?;
        self.written += n as u64;
        Ok(n)
    }

    fn seek(&mut self, _pos: SeekFrom) -> io::Result<u64> {
        Err(not_seekable())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.as_mut().ok_or_else(closed)?.flush()
    }

    fn close(&mut self) -> io::Result<()> {
        match self.writer.take() {
            Some(mut writer) => writer.flush(),
            None => Ok(()),
        }
    }
}
