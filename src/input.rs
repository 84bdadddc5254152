//! Process input streams.

use crate::error::{Result, StreamError};
use crate::handle::{probe_channel, MemoryHandle, ReaderHandle};
use crate::length::{DeclaredLength, CONTENT_LENGTH_VAR};
use crate::stream::{ResourceStream, SizePolicy};
use crate::types::StreamKind;
use bytes::Bytes;
use std::io::{self, Read};

impl ResourceStream {
    /// A read-only stream over the process's standard input.
    ///
    /// Its size is the `CONTENT_LENGTH` environment variable, read on every
    /// `size()` call, or unknown when unset or not a non-negative integer.
    pub fn input() -> Result<Self> {
        let stdin = io::stdin();
        probe_channel(&stdin).map_err(|e| {
            #[cfg(feature = "tracing")]
            tracing::debug!(error = %e, "process input unavailable");

            StreamError::open_failed("stdin", e)
        })?;

        Ok(Self::input_from_reader(
            stdin,
            DeclaredLength::env(CONTENT_LENGTH_VAR),
        ))
    }

    /// A read-only, non-seekable input stream over `reader`.
    pub fn input_from_reader(reader: impl Read + Send + 'static, length: DeclaredLength) -> Self {
        ResourceStream::from_handle(
            StreamKind::Input,
            ReaderHandle::new(reader, "stdin"),
            SizePolicy::Declared(length),
        )
    }

    /// A read-only input stream over an already received body.
    ///
    /// Unlike a live channel, a buffered body is seekable.
    pub fn input_from_bytes(body: impl Into<Bytes>, length: DeclaredLength) -> Self {
        let body: Bytes = body.into();
        ResourceStream::from_handle(
            StreamKind::Input,
            MemoryHandle::read_only(body.to_vec()),
            SizePolicy::Declared(length),
        )
    }
}
