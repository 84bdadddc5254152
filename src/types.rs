//! Core types shared by handles and streams.

use std::fmt;
use std::io::SeekFrom;

/// Origin for a seek operation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Whence {
    /// Offset is absolute.
    #[default]
    Start,
    /// Offset is relative to the current position.
    Current,
    /// Offset is relative to the end of the resource.
    End,
}

impl Whence {
    /// Split a std seek target into an offset and its origin.
    ///
    /// Absolute offsets beyond `i64::MAX` saturate.
    pub fn split(pos: SeekFrom) -> (i64, Whence) {
        match pos {
            SeekFrom::Start(n) => (i64::try_from(n).unwrap_or(i64::MAX), Whence::Start),
            SeekFrom::Current(n) => (n, Whence::Current),
            SeekFrom::End(n) => (n, Whence::End),
        }
    }
}

/// Access mode a handle was opened with.
///
/// The mode policy, as reported by [`OpenMode::is_readable`] and
/// [`OpenMode::is_writable`]:
///
/// | Mode | Mode string | Readable | Writable |
/// |------|-------------|----------|----------|
/// | `Read` | `r` | yes | no |
/// | `Write` | `w` | no | yes |
/// | `ReadWriteTruncate` | `w+` | yes | yes |
/// | `ReadWrite` | `rw` | yes | yes |
///
/// Readability holds for any mode string containing `r`, and additionally
/// for the truncating `w+` mode even though it carries no `r`.
/// Writability holds for any mode string containing `w`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpenMode {
    /// Read an existing resource.
    Read,
    /// Write, creating or truncating the resource.
    Write,
    /// Read and write, creating or truncating the resource.
    ReadWriteTruncate,
    /// Read and write without truncation (memory buffers).
    ReadWrite,
}

impl OpenMode {
    /// Derive a file mode from readable/writable flags.
    ///
    /// Neither flag set yields `None`: there is no mode to open with.
    pub fn from_flags(readable: bool, writable: bool) -> Option<Self> {
        match (readable, writable) {
            (true, true) => Some(OpenMode::ReadWriteTruncate),
            (false, true) => Some(OpenMode::Write),
            (true, false) => Some(OpenMode::Read),
            (false, false) => None,
        }
    }

    /// The conventional mode string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OpenMode::Read => "r",
            OpenMode::Write => "w",
            OpenMode::ReadWriteTruncate => "w+",
            OpenMode::ReadWrite => "rw",
        }
    }

    /// Whether data may be read under this mode.
    pub fn is_readable(&self) -> bool {
        let mode = self.as_str();
        mode.contains("w+") || mode.contains('r')
    }

    /// Whether data may be written under this mode.
    pub fn is_writable(&self) -> bool {
        self.as_str().contains('w')
    }
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which constructor policy produced a stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StreamKind {
    File,
    Memory,
    Input,
    Output,
}

impl StreamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamKind::File => "file",
            StreamKind::Memory => "memory",
            StreamKind::Input => "input",
            StreamKind::Output => "output",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
