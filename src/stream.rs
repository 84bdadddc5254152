//! The stream engine shared by every variant.

use crate::error::{Result, StreamError};
use crate::handle::Handle;
use crate::length::DeclaredLength;
use crate::metadata::{Metadata, MetadataValue};
use crate::types::{StreamKind, Whence};
use bytes::{Bytes, BytesMut};
use std::fmt;
use std::io::{self, SeekFrom};
use std::mem;

/// Largest single read issued to a handle.
const READ_CHUNK: usize = 8 * 1024;

/// Message of the error returned by an output stream's `size()`.
pub const WRITE_ONLY_SIZE_MESSAGE: &str = "cannot determine size of a write-only sink";

/// Ownership state of a stream's handle.
pub(crate) enum HandleSlot {
    Owned(Box<dyn Handle>),
    Closed,
}

impl HandleSlot {
    /// The handle, if owned and still live.
    fn get(&self) -> Option<&dyn Handle> {
        match self {
            HandleSlot::Owned(handle) if handle.is_live() => Some(&**handle),
            _ => None,
        }
    }

    /// The handle for a data operation, or `InvalidHandle`.
    fn live(&mut self, operation: &'static str) -> Result<&mut dyn Handle> {
        match self {
            HandleSlot::Owned(handle) if handle.is_live() => Ok(&mut **handle),
            _ => Err(StreamError::no_handle(operation)),
        }
    }

    fn take(&mut self) -> Option<Box<dyn Handle>> {
        match mem::replace(self, HandleSlot::Closed) {
            HandleSlot::Owned(handle) => Some(handle),
            HandleSlot::Closed => None,
        }
    }
}

/// How a stream answers `size()`.
#[derive(Clone, Debug)]
pub(crate) enum SizePolicy {
    /// Ask the handle.
    Handle,
    /// Use an externally declared length.
    Declared(DeclaredLength),
    /// Always fail.
    Unsupported,
}

/// A positional byte stream over one owned [`Handle`].
///
/// Every variant (file, memory, input, output) is a `ResourceStream`; they
/// differ only in how the handle is opened and how `size()` is answered.
///
/// Once closed or detached the stream stays usable as a value but every
/// positional or data operation fails with
/// [`StreamError::InvalidHandle`], capability queries return `false` and
/// `size()` reports unknown.
pub struct ResourceStream {
    slot: HandleSlot,
    size_policy: SizePolicy,
    kind: StreamKind,
}

impl fmt::Debug for ResourceStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let handle = match &self.slot {
            HandleSlot::Owned(handle) => Some(handle),
            HandleSlot::Closed => None,
        };
        f.debug_struct("ResourceStream")
            .field("kind", &self.kind)
            .field("handle", &handle)
            .field("size_policy", &self.size_policy)
            .finish()
    }
}

impl ResourceStream {
    pub(crate) fn from_handle(
        kind: StreamKind,
        handle: impl Handle + 'static,
        size_policy: SizePolicy,
    ) -> Self {
        #[cfg(feature = "tracing")]
        tracing::debug!(kind = %kind, uri = handle.uri(), mode = %handle.mode(), "stream opened");

        Self {
            slot: HandleSlot::Owned(Box::new(handle)),
            size_policy,
            kind,
        }
    }

    /// Which constructor produced this stream.
    pub fn kind(&self) -> StreamKind {
        self.kind
    }

    /// Whether a live handle is owned.
    pub fn is_open(&self) -> bool {
        self.slot.get().is_some()
    }

    /// Size of the resource in bytes, `None` if unknown.
    ///
    /// A closed stream reports `None`. Output streams always fail with
    /// [`StreamError::Unsupported`].
    pub fn size(&self) -> Result<Option<u64>> {
        match &self.size_policy {
            SizePolicy::Handle => Ok(self.slot.get().and_then(|handle| handle.len())),
            SizePolicy::Declared(length) => Ok(length.get()),
            SizePolicy::Unsupported => Err(StreamError::Unsupported {
                operation: "size",
                reason: WRITE_ONLY_SIZE_MESSAGE,
            }),
        }
    }

    /// Current offset of the read/write pointer.
    pub fn position(&mut self) -> Result<u64> {
        self.slot
            .live("tell")?
            .position()
            .map_err(|e| StreamError::handle_io("tell", e))
    }

    /// Whether the position equals the size.
    ///
    /// An unknown size never compares equal.
    pub fn at_end(&mut self) -> Result<bool> {
        let position = self.position()?;
        Ok(self.size()? == Some(position))
    }

    pub fn is_seekable(&self) -> bool {
        self.slot.get().is_some_and(|handle| handle.is_seekable())
    }

    /// Move the position and return the new absolute offset.
    ///
    /// The target must fall within `[0, size]`.
    pub fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64> {
        self.seek_to(offset, whence, "seek")
    }

    /// Seek back to the start.
    pub fn rewind(&mut self) -> Result<()> {
        self.seek_to(0, Whence::Start, "rewind").map(|_| ())
    }

    pub fn is_writable(&self) -> bool {
        self.slot.get().is_some_and(|handle| handle.mode().is_writable())
    }

    /// Write `data` at the current position.
    ///
    /// Returns the number of bytes written, which is less than `data.len()`
    /// when the handle stops accepting bytes. Interrupted calls are retried.
    ///
    /// Writing to a handle not opened for writing fails with
    /// [`StreamError::InvalidHandle`] whose cause has kind
    /// [`io::ErrorKind::PermissionDenied`]; it does not return `Ok(0)`.
    pub fn write(&mut self, data: impl AsRef<[u8]>) -> Result<usize> {
        self.write_from(data.as_ref())
    }

    pub fn is_readable(&self) -> bool {
        self.slot.get().is_some_and(|handle| handle.mode().is_readable())
    }

    /// Read up to `length` bytes from the current position.
    ///
    /// Fewer bytes are returned when the resource ends first; an exhausted
    /// resource yields an empty buffer. `length` must be positive.
    /// Interrupted calls are retried.
    ///
    /// Reading from a handle not opened for reading fails with
    /// [`StreamError::InvalidHandle`] whose cause has kind
    /// [`io::ErrorKind::PermissionDenied`]; it does not return empty bytes.
    pub fn read(&mut self, length: usize) -> Result<Bytes> {
        if length == 0 {
            return Err(StreamError::InvalidArgument(
                "length must be positive".to_string(),
            ));
        }
        self.read_up_to(length)
    }

    /// The bytes between the current position and the end.
    ///
    /// Fails with [`StreamError::SizeUnknown`] when the size cannot be
    /// determined.
    pub fn contents(&mut self) -> Result<Bytes> {
        let size = self.size()?.ok_or(StreamError::SizeUnknown)?;
        let position = self.position()?;
        match size.saturating_sub(position) {
            0 => Ok(Bytes::new()),
            remaining => self.read(usize::try_from(remaining).unwrap_or(usize::MAX)),
        }
    }

    /// The whole content, from the start when seekable.
    ///
    /// Never fails: a closed stream, an empty resource or any error along
    /// the way yields an empty buffer.
    pub fn to_bytes(&mut self) -> Bytes {
        if !self.is_open() {
            return Bytes::new();
        }
        match self.size() {
            Ok(Some(0)) | Err(_) => return Bytes::new(),
            Ok(_) => {}
        }
        if self.is_seekable() && self.rewind().is_err() {
            return Bytes::new();
        }
        self.contents().unwrap_or_default()
    }

    /// [`to_bytes`](Self::to_bytes) decoded as lossy UTF-8.
    pub fn to_text(&mut self) -> String {
        String::from_utf8_lossy(&self.to_bytes()).into_owned()
    }

    /// All metadata of the handle, `None` once closed.
    pub fn metadata(&self) -> Option<Metadata> {
        self.slot.get().map(Metadata::of)
    }

    /// One metadata value, `None` once closed or for an unknown key.
    pub fn metadata_value(&self, key: &str) -> Option<MetadataValue> {
        self.metadata()?.get(key)
    }

    /// Release the handle. Closing a closed stream is a no-op.
    pub fn close(&mut self) -> Result<()> {
        match self.slot.take() {
            Some(mut handle) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(kind = %self.kind, uri = handle.uri(), "stream closed");

                handle
                    .close()
                    .map_err(|e| StreamError::handle_io("close", e))
            }
            None => Ok(()),
        }
    }

    /// Close the handle and hand it back.
    ///
    /// The returned handle is no longer live. The stream behaves as if
    /// [`close`](Self::close) had been called.
    pub fn detach(&mut self) -> Result<Option<Box<dyn Handle>>> {
        let Some(mut handle) = self.slot.take() else {
            return Ok(None);
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(kind = %self.kind, uri = handle.uri(), "stream detached");

        handle
            .close()
            .map_err(|e| StreamError::handle_io("detach", e))?;
        Ok(Some(handle))
    }

    fn seek_to(&mut self, offset: i64, whence: Whence, operation: &'static str) -> Result<u64> {
        let handle = self.slot.live(operation)?;
        if !handle.is_seekable() {
            return Err(StreamError::Unsupported {
                operation,
                reason: "handle is not seekable",
            });
        }

        let len = handle.len();
        let base = match whence {
            Whence::Start => 0,
            Whence::Current => handle
                .position()
                .map_err(|e| StreamError::handle_io(operation, e))?,
            Whence::End => len.ok_or(StreamError::SizeUnknown)?,
        };
        let target = i64::try_from(base)
            .ok()
            .and_then(|base| base.checked_add(offset))
            .and_then(|target| u64::try_from(target).ok())
            .filter(|target| len.map_or(true, |len| *target <= len))
            .ok_or_else(|| {
                StreamError::InvalidArgument(format!(
                    "seek target {:?}{:+} outside stream bounds",
                    whence, offset
                ))
            })?;

        handle
            .seek(SeekFrom::Start(target))
            .map_err(|e| StreamError::handle_io(operation, e))
    }

    fn write_from(&mut self, data: &[u8]) -> Result<usize> {
        let handle = self.slot.live("write")?;
        let mut written = 0;
        while written < data.len() {
            match handle.write(&data[written..]) {
                Ok(0) => break,
                Ok(n) => written += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(StreamError::handle_io("write", e)),
            }
        }
        Ok(written)
    }

    fn read_up_to(&mut self, length: usize) -> Result<Bytes> {
        let handle = self.slot.live("read")?;
        let mut out = BytesMut::with_capacity(length.min(READ_CHUNK));
        let mut chunk = [0u8; READ_CHUNK];
        while out.len() < length {
            let want = (length - out.len()).min(READ_CHUNK);
            let n = match handle.read(&mut chunk[..want]) {
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(StreamError::handle_io("read", e)),
            };
            if n == 0 {
                break;
            }
            out.extend_from_slice(&chunk[..n]);
        }
        Ok(out.freeze())
    }
}

impl Drop for ResourceStream {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

impl io::Read for ResourceStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let handle = self.slot.live("read")?;
        handle.read(buf)
    }
}

impl io::Write for ResourceStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(self.write_from(buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.slot.live("flush")?.flush()
    }
}

impl io::Seek for ResourceStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let (offset, whence) = Whence::split(pos);
        Ok(self.seek_to(offset, whence, "seek")?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use quickcheck_macros::quickcheck;
    use std::error::Error as _;
    use std::io::{Cursor, Read, Seek, Write};

    fn hello_world() -> ResourceStream {
        let mut stream = ResourceStream::memory();
        stream.write("Hello World").unwrap();
        stream
    }

    #[test]
    fn test_new_stream_is_empty() {
        let mut stream = ResourceStream::memory();
        assert_eq!(stream.size().unwrap(), Some(0));
        assert_eq!(stream.to_text(), "");
    }

    #[test]
    fn test_to_text_rewinds() {
        let mut stream = hello_world();
        assert_eq!(stream.to_text(), "Hello World");
        // twice: to_text leaves the position at the end
        assert_eq!(stream.to_text(), "Hello World");
    }

    #[test]
    fn test_tell_and_seek() {
        let mut stream = hello_world();
        assert_eq!(stream.position().unwrap(), 11);
        assert_eq!(stream.seek(0, Whence::Start).unwrap(), 0);
        assert_eq!(stream.position().unwrap(), 0);
        assert_eq!(&stream.read(5).unwrap()[..], b"Hello");
        stream.seek(6, Whence::Start).unwrap();
        assert_eq!(&stream.read(5).unwrap()[..], b"World");
    }

    #[test]
    fn test_seek_relative_origins() {
        let mut stream = hello_world();
        assert_eq!(stream.seek(-5, Whence::End).unwrap(), 6);
        assert_eq!(stream.seek(-1, Whence::Current).unwrap(), 5);
        assert_eq!(stream.seek(1, Whence::Current).unwrap(), 6);
    }

    #[test]
    fn test_seek_out_of_bounds() {
        let mut stream = hello_world();
        let err = stream.seek(12, Whence::Start).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        let err = stream.seek(-12, Whence::End).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        // position untouched
        assert_eq!(stream.position().unwrap(), 11);
        // the end itself is in bounds
        assert_eq!(stream.seek(0, Whence::End).unwrap(), 11);
    }

    #[test]
    fn test_at_end() {
        let mut stream = hello_world();
        assert!(stream.at_end().unwrap());
        stream.seek(0, Whence::Start).unwrap();
        assert!(!stream.at_end().unwrap());
    }

    #[test]
    fn test_rewind() {
        let mut stream = hello_world();
        stream.rewind().unwrap();
        assert_eq!(stream.position().unwrap(), 0);
    }

    #[test]
    fn test_read_whole_and_partial() {
        let mut stream = hello_world();
        stream.rewind().unwrap();
        assert_eq!(&stream.read(11).unwrap()[..], b"Hello World");

        stream.seek(6, Whence::Start).unwrap();
        // more than remains: only the remainder, no error
        assert_eq!(&stream.read(100).unwrap()[..], b"World");
        assert!(stream.read(1).unwrap().is_empty());
    }

    #[test]
    fn test_read_rejects_zero_length() {
        let mut stream = hello_world();
        let err = stream.read(0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        // checked before the handle
        stream.close().unwrap();
        let err = stream.read(0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_read_larger_than_chunk() {
        let payload = vec![7u8; READ_CHUNK * 3 + 5];
        let mut stream = ResourceStream::memory();
        stream.write(&payload).unwrap();
        stream.rewind().unwrap();
        let data = stream.read(payload.len()).unwrap();
        assert_eq!(data.len(), payload.len());
    }

    #[test]
    fn test_contents_from_position() {
        let mut stream = hello_world();
        stream.seek(6, Whence::Start).unwrap();
        assert_eq!(&stream.contents().unwrap()[..], b"World");
        // nothing left
        assert!(stream.contents().unwrap().is_empty());
    }

    #[test]
    fn test_write_overwrites_at_position() {
        let mut stream = hello_world();
        stream.seek(6, Whence::Start).unwrap();
        assert_eq!(stream.write("Rust!").unwrap(), 5);
        assert_eq!(stream.to_text(), "Hello Rust!");
    }

    #[test]
    fn test_binary_roundtrip() {
        let payload: Vec<u8> = (0..=255u8).chain((0..=255u8).rev()).collect();
        let mut stream = ResourceStream::memory();
        stream.write(&payload).unwrap();
        stream.rewind().unwrap();
        assert_eq!(&stream.contents().unwrap()[..], &payload[..]);
    }

    #[test]
    fn test_close() {
        let mut stream = hello_world();
        assert_eq!(stream.size().unwrap(), Some(11));
        stream.close().unwrap();

        assert!(!stream.is_open());
        assert!(!stream.is_seekable());
        assert!(!stream.is_readable());
        assert!(!stream.is_writable());
        assert_eq!(stream.size().unwrap(), None);

        assert!(stream.position().unwrap_err().is_invalid_handle());
        assert!(stream.seek(0, Whence::Start).unwrap_err().is_invalid_handle());
        assert!(stream.rewind().unwrap_err().is_invalid_handle());
        assert!(stream.read(10).unwrap_err().is_invalid_handle());
        assert!(stream.write("Hello World").unwrap_err().is_invalid_handle());
        assert_eq!(stream.to_text(), "");

        // idempotent
        stream.close().unwrap();
    }

    #[test]
    fn test_detach() {
        let mut stream = hello_world();
        stream.seek(0, Whence::Start).unwrap();

        let handle = stream.detach().unwrap().unwrap();
        assert!(!handle.is_live());

        assert!(stream.seek(0, Whence::Start).unwrap_err().is_invalid_handle());
        assert!(!stream.is_readable());
        assert_eq!(stream.size().unwrap(), None);
        assert!(stream.detach().unwrap().is_none());
    }

    #[test]
    fn test_metadata() {
        let mut stream = ResourceStream::memory();
        assert_eq!(
            stream.metadata_value("seekable"),
            Some(MetadataValue::Bool(true))
        );
        assert_eq!(stream.metadata_value("non-existent-key"), None);
        assert_eq!(stream.metadata().unwrap().stream_type, "MEMORY");

        stream.close().unwrap();
        assert_eq!(stream.metadata_value("size"), None);
        assert_eq!(stream.metadata_value("mode"), None);
        assert!(stream.metadata().is_none());
    }

    #[test]
    fn test_metadata_eof_flag() {
        let mut stream = hello_world();
        stream.rewind().unwrap();
        stream.read(100).unwrap();
        assert_eq!(stream.metadata_value("eof"), Some(MetadataValue::Bool(true)));
        stream.rewind().unwrap();
        assert_eq!(stream.metadata_value("eof"), Some(MetadataValue::Bool(false)));
    }

    #[test]
    fn test_std_io_traits() {
        let mut stream = ResourceStream::memory();
        stream.write_all(b"std io").unwrap();
        stream.flush().unwrap();
        Seek::rewind(&mut stream).unwrap();

        let mut text = String::new();
        stream.read_to_string(&mut text).unwrap();
        assert_eq!(text, "std io");

        stream.close().unwrap();
        let err = stream.write_all(b"x").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotConnected);
    }

    /// Fails its first call with `Interrupted`, then delegates.
    struct InterruptOnce<T> {
        inner: T,
        interrupted: bool,
    }

    impl<T> InterruptOnce<T> {
        fn new(inner: T) -> Self {
            Self {
                inner,
                interrupted: false,
            }
        }

        fn interrupt(&mut self) -> io::Result<()> {
            if self.interrupted {
                return Ok(());
            }
            self.interrupted = true;
            Err(io::Error::new(io::ErrorKind::Interrupted, "signal"))
        }
    }

    impl<T: Read> Read for InterruptOnce<T> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.interrupt()?;
            self.inner.read(buf)
        }
    }

    impl<T: Write> Write for InterruptOnce<T> {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.interrupt()?;
            self.inner.write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            self.inner.flush()
        }
    }

    #[test]
    fn test_read_retries_interrupted() {
        let reader = InterruptOnce::new(Cursor::new(b"hi".to_vec()));
        let mut stream = ResourceStream::input_from_reader(reader, DeclaredLength::none());
        assert_eq!(&stream.read(2).unwrap()[..], b"hi");
    }

    #[test]
    fn test_write_retries_interrupted() {
        let mut stream = ResourceStream::output_to_writer(InterruptOnce::new(Vec::new()));
        assert_eq!(stream.write("hi").unwrap(), 2);
        assert_eq!(stream.position().unwrap(), 2);
    }

    #[test]
    fn test_wrong_direction_is_permission_denied() {
        let mut input = ResourceStream::input_from_bytes("abc", DeclaredLength::none());
        let err = input.write("x").unwrap_err();
        assert!(err.is_invalid_handle());
        let cause = err.source().unwrap().downcast_ref::<io::Error>().unwrap();
        assert_eq!(cause.kind(), io::ErrorKind::PermissionDenied);

        let mut output = ResourceStream::output_to_writer(Vec::new());
        let err = output.read(1).unwrap_err();
        assert!(err.is_invalid_handle());
        let cause = err.source().unwrap().downcast_ref::<io::Error>().unwrap();
        assert_eq!(cause.kind(), io::ErrorKind::PermissionDenied);
    }

    #[quickcheck]
    fn prop_memory_roundtrip(payload: Vec<u8>) -> bool {
        let mut stream = ResourceStream::memory();
        stream.write(&payload).unwrap();
        stream.rewind().unwrap();
        stream.contents().unwrap() == payload
    }

    #[quickcheck]
    fn prop_read_returns_at_most_remaining(payload: Vec<u8>, offset: usize, length: usize) -> bool {
        let offset = offset % (payload.len() + 1);
        let length = length % 64 + 1;

        let mut stream = ResourceStream::memory_with(&payload).unwrap();
        stream.seek(offset as i64, Whence::Start).unwrap();

        let expected = &payload[offset..offset + length.min(payload.len() - offset)];
        stream.read(length).unwrap() == expected
    }
}
