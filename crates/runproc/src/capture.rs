// SPDX-License-Identifier: MIT OR Apache-2.0
//! Stdin feeding and stdout/stderr draining for a running child.

use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

/// Output collected from a child that ran to termination.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Captured {
    /// Bytes read from the child's standard output.
    pub stdout: Vec<u8>,
    /// Bytes read from the child's standard error.
    pub stderr: Vec<u8>,
}

/// Write `input` to the child's stdin, then close it.
///
/// A broken pipe means the child stopped reading; the rest of the input is
/// discarded and no error is reported.
pub async fn feed<W>(stdin: Option<W>, input: Option<&[u8]>) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let (Some(mut stdin), Some(input)) = (stdin, input) else {
        return Ok(());
    };

    let written = match stdin.write_all(input).await {
        Ok(()) => stdin.flush().await,
        Err(err) => Err(err),
    };
    drop(stdin);

    match written {
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => {
            debug!(target: "runproc.capture", len = input.len(), "child closed stdin early");
            Ok(())
        }
        other => other,
    }
}

/// Read a stream to its end. A missing stream yields an empty buffer.
pub async fn drain<R>(reader: Option<R>) -> io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    if let Some(mut reader) = reader {
        reader.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}

/// Combine the three stream results; the first error wins.
pub fn settle(
    fed: io::Result<()>,
    stdout: io::Result<Vec<u8>>,
    stderr: io::Result<Vec<u8>>,
) -> io::Result<Captured> {
    fed?;
    Ok(Captured {
        stdout: stdout?,
        stderr: stderr?,
    })
}
