//! Memory-backed streams.

use crate::error::{Result, StreamError};
use crate::handle::MemoryHandle;
use crate::stream::{ResourceStream, SizePolicy};
use crate::types::StreamKind;
use std::io;

impl ResourceStream {
    /// An empty read-write stream over an anonymous buffer.
    pub fn memory() -> Self {
        ResourceStream::from_handle(StreamKind::Memory, MemoryHandle::new(), SizePolicy::Handle)
    }

    /// A memory stream holding `data`.
    ///
    /// The position is left at the end of `data`, as after any write.
    /// Empty `data` writes nothing.
    pub fn memory_with(data: impl AsRef<[u8]>) -> Result<Self> {
        let data = data.as_ref();
        let mut stream = Self::memory();
        if data.is_empty() {
            return Ok(stream);
        }

        let failure = match stream.write(data) {
            Ok(n) if n == data.len() => return Ok(stream),
            Ok(_) => io::Error::new(io::ErrorKind::WriteZero, "initial payload truncated"),
            Err(e) => io::Error::from(e),
        };
        // release the buffer before reporting
        let _ = stream.close();
        Err(StreamError::open_failed("memory", failure))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construct_with_payload() {
        let mut stream = ResourceStream::memory_with("test").unwrap();
        assert_eq!(stream.kind(), StreamKind::Memory);
        assert_eq!(stream.size().unwrap(), Some(4));
        assert_eq!(stream.position().unwrap(), 4);
        assert!(stream.at_end().unwrap());

        stream.rewind().unwrap();
        assert_eq!(stream.to_text(), "test");
    }

    #[test]
    fn test_empty_payload() {
        let mut stream = ResourceStream::memory_with("").unwrap();
        assert_eq!(stream.size().unwrap(), Some(0));
        assert_eq!(stream.position().unwrap(), 0);
    }

    #[test]
    fn test_memory_is_read_write() {
        let stream = ResourceStream::memory();
        assert!(stream.is_readable());
        assert!(stream.is_writable());
        assert!(stream.is_seekable());
        assert_eq!(stream.metadata_value("mode").unwrap().as_str(), Some("rw"));
    }

    #[test]
    fn test_append_after_payload() {
        let mut stream = ResourceStream::memory_with(b"abc".to_vec()).unwrap();
        stream.write("def").unwrap();
        assert_eq!(stream.to_text(), "abcdef");
    }
}
