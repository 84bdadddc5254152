//! The stream capability contract.

use crate::error::Result;
use crate::handle::Handle;
use crate::metadata::{Metadata, MetadataValue};
use crate::stream::ResourceStream;
use crate::types::Whence;
use bytes::Bytes;

/// What a consumer (an HTTP message body, for instance) may do with a stream.
///
/// Object safe, so consumers can hold a `Box<dyn Stream>` without knowing
/// which variant backs it.
pub trait Stream {
    /// Size in bytes, `None` if unknown.
    fn size(&self) -> Result<Option<u64>>;

    /// Current offset.
    fn tell(&mut self) -> Result<u64>;

    fn eof(&mut self) -> Result<bool>;

    fn is_seekable(&self) -> bool;

    fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64>;

    fn rewind(&mut self) -> Result<()>;

    fn is_writable(&self) -> bool;

    fn write(&mut self, data: &[u8]) -> Result<usize>;

    fn is_readable(&self) -> bool;

    fn read(&mut self, length: usize) -> Result<Bytes>;

    /// Remaining bytes from the current position.
    fn contents(&mut self) -> Result<Bytes>;

    /// Whole content as text; never fails.
    fn to_text(&mut self) -> String;

    fn metadata(&self) -> Option<Metadata>;

    fn metadata_value(&self, key: &str) -> Option<MetadataValue>;

    fn close(&mut self) -> Result<()>;

    fn detach(&mut self) -> Result<Option<Box<dyn Handle>>>;
}

impl Stream for ResourceStream {
    fn size(&self) -> Result<Option<u64>> {
        ResourceStream::size(self)
    }

    fn tell(&mut self) -> Result<u64> {
        self.position()
    }

    fn eof(&mut self) -> Result<bool> {
        self.at_end()
    }

    fn is_seekable(&self) -> bool {
        ResourceStream::is_seekable(self)
    }

    fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64> {
        ResourceStream::seek(self, offset, whence)
    }

    fn rewind(&mut self) -> Result<()> {
        ResourceStream::rewind(self)
    }

    fn is_writable(&self) -> bool {
        ResourceStream::is_writable(self)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        ResourceStream::write(self, data)
    }

    fn is_readable(&self) -> bool {
        ResourceStream::is_readable(self)
    }

    fn read(&mut self, length: usize) -> Result<Bytes> {
        ResourceStream::read(self, length)
    }

    fn contents(&mut self) -> Result<Bytes> {
        ResourceStream::contents(self)
    }

    fn to_text(&mut self) -> String {
        ResourceStream::to_text(self)
    }

    fn metadata(&self) -> Option<Metadata> {
        ResourceStream::metadata(self)
    }

    fn metadata_value(&self, key: &str) -> Option<MetadataValue> {
        ResourceStream::metadata_value(self, key)
    }

    fn close(&mut self) -> Result<()> {
        ResourceStream::close(self)
    }

    fn detach(&mut self) -> Result<Option<Box<dyn Handle>>> {
        ResourceStream::detach(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::length::DeclaredLength;
    use std::io::Cursor;

    fn roundtrip(stream: &mut dyn Stream, payload: &[u8]) -> Bytes {
        stream.write(payload).unwrap();
        stream.rewind().unwrap();
        stream.contents().unwrap()
    }

    #[test]
    fn test_variants_behind_one_contract() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut streams: Vec<Box<dyn Stream>> = vec![
            Box::new(ResourceStream::memory()),
            Box::new(ResourceStream::file(dir.path().join("contract"), true, true).unwrap()),
        ];

        for stream in streams.iter_mut() {
            assert_eq!(&roundtrip(stream.as_mut(), b"Hello World")[..], b"Hello World");
            assert!(stream.eof().unwrap());
            assert_eq!(stream.tell().unwrap(), 11);
        }
    }

    #[test]
    fn test_closed_contract() {
        let mut stream: Box<dyn Stream> = Box::new(ResourceStream::input_from_reader(
            Cursor::new(b"abc".to_vec()),
            DeclaredLength::none(),
        ));
        stream.close().unwrap();
        assert!(stream.tell().unwrap_err().is_invalid_handle());
        assert!(!stream.is_readable());
        assert_eq!(stream.to_text(), "");
        assert!(stream.metadata().is_none());
    }
}
