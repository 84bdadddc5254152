//! Process output streams.

use crate::error::{Result, StreamError};
use crate::handle::{probe_channel, WriterHandle};
use crate::stream::{ResourceStream, SizePolicy};
use crate::types::StreamKind;
use std::io::{self, Write};

impl ResourceStream {
    /// A write-only stream over the process's standard output.
    ///
    /// Output streams are neither readable nor seekable, and `size()` always
    /// fails.
    pub fn output() -> Result<Self> {
        let stdout = io::stdout();
        probe_channel(&stdout).map_err(|e| {
            #[cfg(feature = "tracing")]
            tracing::debug!(error = %e, "process output unavailable");

            StreamError::open_failed("stdout", e)
        })?;

        Ok(Self::output_to_writer(stdout))
    }

    /// A write-only output stream over `writer`.
    pub fn output_to_writer(writer: impl Write + Send + 'static) -> Self {
        ResourceStream::from_handle(
            StreamKind::Output,
            WriterHandle::new(writer, "stdout"),
            SizePolicy::Unsupported,
        )
    }
}
