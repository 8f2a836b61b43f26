//! Local socket transport layer
//!
//! Connects to the daemon's Unix domain socket through the interprocess
//! crate and moves newline-terminated frames over it.

use std::io;
use std::path::Path;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use interprocess::local_socket::tokio::{prelude::*, Stream};
use interprocess::local_socket::GenericFilePath;

use crate::common::{Error, Result};

use super::protocol::FRAME_TERMINATOR;

/// Maximum response size (10 MB)
pub const MAX_MESSAGE_SIZE: usize = 10 * 1024 * 1024;

/// Size of each read from the socket
const READ_CHUNK: usize = 4096;

/// Connect to a daemon socket
pub async fn connect(path: &Path) -> io::Result<Stream> {
    let name = path.to_fs_name::<GenericFilePath>()?;
    Stream::connect(name).await
}

/// Send one frame, which must already carry its terminator
pub async fn send_frame<W: AsyncWrite + Unpin>(writer: &mut W, frame: &[u8]) -> io::Result<()> {
    writer.write_all(frame).await?;
    writer.flush().await?;
    Ok(())
}

/// Receive one newline-terminated frame
///
/// Reads until the terminator shows up. Anything the peer sends after it is
/// discarded. The returned bytes exclude the terminator.
pub async fn recv_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(READ_CHUNK);
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        let n = reader
            .read(&mut chunk)
            .await
            .map_err(Error::DaemonCommunication)?;
        if n == 0 {
            return Err(Error::Framing {
                received: buf.len(),
            });
        }

        if let Some(pos) = chunk[..n].iter().position(|&b| b == FRAME_TERMINATOR) {
            buf.extend_from_slice(&chunk[..pos]);
            if buf.len() > MAX_MESSAGE_SIZE {
                return Err(Error::FrameTooLarge {
                    limit: MAX_MESSAGE_SIZE,
                });
            }
            return Ok(buf);
        }

        buf.extend_from_slice(&chunk[..n]);
        if buf.len() > MAX_MESSAGE_SIZE {
            return Err(Error::FrameTooLarge {
                limit: MAX_MESSAGE_SIZE,
            });
        }
    }
}
