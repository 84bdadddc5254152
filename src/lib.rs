//! Resource Streams
//!
//! Positional byte streams over files, memory buffers and the process's
//! input and output channels, all behind one [`ResourceStream`] type.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use resource_streams::{ResourceStream, Whence};
//!
//! fn main() -> Result<(), resource_streams::StreamError> {
//!     let mut stream = ResourceStream::memory();
//!     stream.write("Hello World")?;
//!
//!     stream.seek(6, Whence::Start)?;
//!     assert_eq!(&stream.read(5)?[..], b"World");
//!
//!     // the whole content, never fails
//!     assert_eq!(stream.to_text(), "Hello World");
//!
//!     let mut file = ResourceStream::file_options("/tmp/out.txt")
//!         .readable(false)
//!         .open()?;
//!     file.write(stream.to_bytes())?;
//!     file.close()?;
//!
//!     Ok(())
//! }
//! ```

mod contract;
mod error;
mod file;
mod handle;
mod input;
mod length;
mod memory;
mod metadata;
mod output;
mod stream;
mod types;

pub use contract::Stream;
pub use error::{ErrorKind, Result, StreamError};
pub use file::FileOptions;
pub use handle::{FileHandle, Handle, MemoryHandle, ReaderHandle, WriterHandle};
pub use length::{DeclaredLength, CONTENT_LENGTH_VAR};
pub use metadata::{Metadata, MetadataValue, METADATA_KEYS};
pub use stream::{ResourceStream, WRITE_ONLY_SIZE_MESSAGE};
pub use types::{OpenMode, StreamKind, Whence};
