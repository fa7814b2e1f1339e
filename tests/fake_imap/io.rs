//! Shared I/O helper for the fake IMAP server.
//!
//! A thin wrapper around `AsyncWriteExt` that flushes after every
//! write. Real servers batch writes; flushing eagerly keeps the test
//! server deterministic.

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

/// Write a string to the stream and flush.
pub async fn write_line<S: AsyncRead + AsyncWrite + Unpin>(
    stream: &mut BufReader<S>,
    line: &str,
) -> std::io::Result<()> {
    stream.get_mut().write_all(line.as_bytes()).await?;
    stream.get_mut().flush().await
}
