//! Bounded reader for the raw HTTP head.

use std::time::Duration;

use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt},
    time::timeout,
};

use super::RequestError;

/// Read the request head up to and including the terminating blank line.
///
/// At most `limit` bytes are consumed and the whole read must finish within
/// `wait`. Bytes after the blank line are left in `reader`.
///
/// # Errors
/// Returns [`RequestError::Timeout`] if the deadline passes,
/// [`RequestError::HeadTooLarge`] if no blank line appears within `limit`
/// bytes and [`RequestError::Closed`] on premature EOF. Bytes that are not
/// valid UTF-8 are replaced with U+FFFD rather than rejected.
pub async fn read_head<R>(reader: &mut R, limit: usize, wait: Duration) -> Result<String, RequestError>
where
    R: AsyncBufRead + Unpin,
{
    timeout(wait, read_until_blank_line(reader, limit))
        .await
        .map_err(|_| RequestError::Timeout)?
}

async fn read_until_blank_line<R>(reader: &mut R, limit: usize) -> Result<String, RequestError>
where
    R: AsyncBufRead + Unpin,
{
    let budget = u64::try_from(limit).unwrap_or(u64::MAX).saturating_add(1);
    let mut limited = reader.take(budget);
    let mut head = Vec::new();
    loop {
        let line_start = head.len();
        let read = limited.read_until(b'\n', &mut head).await?;
        if head.len() > limit {
            return Err(RequestError::HeadTooLarge(limit));
        }
        if read == 0 {
            return Err(RequestError::Closed);
        }
        let line = head.get(line_start..).unwrap_or_default();
        if line == b"\r\n" || line == b"\n" {
            break;
        }
    }
    Ok(String::from_utf8_lossy(&head).into_owned())
}
