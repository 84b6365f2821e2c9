// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Length-prefixed JSON framing: a 4-byte big-endian length prefix followed
//! by a JSON payload. No compression, no checksum — messages are small and
//! the transport is a trusted local socket.

use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;

use crate::{Request, Response};

/// Messages larger than this are rejected without allocating, so a
/// corrupted length prefix can't trigger an unbounded allocation.
const MAX_MESSAGE_BYTES: u32 = 16 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("connection closed")]
    ConnectionClosed,

    #[error("timed out waiting for message")]
    Timeout,

    #[error("message of {0} bytes exceeds the {MAX_MESSAGE_BYTES} byte limit")]
    TooLarge(u32),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Serialize `value` to JSON. Does not add the length prefix — pair with
/// [`write_message`] to put it on the wire.
pub fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, ProtocolError> {
    Ok(serde_json::to_vec(value)?)
}

/// Deserialize JSON bytes (without a length prefix) into `T`.
pub fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T, ProtocolError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Write `payload` as one framed message: a 4-byte big-endian length prefix
/// followed by the bytes.
pub async fn write_message<W: AsyncWrite + Unpin>(
    writer: &mut W,
    payload: &[u8],
) -> Result<(), ProtocolError> {
    let len = u32::try_from(payload.len()).map_err(|_| ProtocolError::TooLarge(u32::MAX))?;
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one framed message: a 4-byte big-endian length prefix followed by
/// that many bytes. Returns [`ProtocolError::ConnectionClosed`] if the peer
/// hangs up before (or while) sending the prefix.
pub async fn read_message<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>, ProtocolError> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(ProtocolError::ConnectionClosed)
        }
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_be_bytes(len_buf);
    if len > MAX_MESSAGE_BYTES {
        return Err(ProtocolError::TooLarge(len));
    }

    let mut payload = vec![0u8; len as usize];
    reader.read_exact(&mut payload).await?;
    Ok(payload)
}

/// Read and decode a [`Request`], bounding the wait with `ipc_timeout`.
pub async fn read_request<R: AsyncRead + Unpin>(
    reader: &mut R,
    ipc_timeout: Duration,
) -> Result<Request, ProtocolError> {
    let payload = timeout(ipc_timeout, read_message(reader))
        .await
        .map_err(|_| ProtocolError::Timeout)??;
    decode(&payload)
}

/// Encode and write a [`Response`], bounding the wait with `ipc_timeout`.
pub async fn write_response<W: AsyncWrite + Unpin>(
    writer: &mut W,
    response: &Response,
    ipc_timeout: Duration,
) -> Result<(), ProtocolError> {
    let payload = encode(response)?;
    timeout(ipc_timeout, write_message(writer, &payload))
        .await
        .map_err(|_| ProtocolError::Timeout)?
}

#[cfg(test)]
#[path = "wire_tests.rs"]
mod tests;
