//! Length-prefixed framing: a big-endian `u32` byte count followed by the payload.

use crate::{TransportError, TransportResult};
use std::io::ErrorKind;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// 16 MiB
pub const DEFAULT_MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

pub async fn write_frame<W>(writer: &mut W, payload: &[u8], max_len: usize) -> TransportResult<()>
where
    W: AsyncWrite + Unpin,
{
    if payload.len() > max_len {
        return Err(TransportError::FrameTooLarge {
            len: payload.len(),
            max: max_len,
        });
    }
    let len = u32::try_from(payload.len()).map_err(|_| TransportError::FrameTooLarge {
        len: payload.len(),
        max: max_len,
    })?;

    writer.write_u32(len).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

pub async fn read_frame<R>(reader: &mut R, max_len: usize) -> TransportResult<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let len = match reader.read_u32().await {
        Ok(len) => len as usize,
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
            return Err(TransportError::ConnectionClosed);
        }
        Err(e) => return Err(e.into()),
    };

    if len > max_len {
        return Err(TransportError::FrameTooLarge { len, max: max_len });
    }

    let mut payload = vec![0u8; len];
    match reader.read_exact(&mut payload).await {
        Ok(_) => Ok(payload),
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => Err(TransportError::ConnectionClosed),
        Err(e) => Err(e.into()),
    }
}
