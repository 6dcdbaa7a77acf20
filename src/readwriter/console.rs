use std::{
    io::Result,
    pin::Pin,
    task::{Context, Poll},
};

use pin_project::pin_project;
use tokio::io::{stdin, stdout, AsyncRead, AsyncWrite, ReadBuf, Stdin, Stdout};

/// An interactive console: user input on one side, user-facing output on the other.
#[pin_project]
pub struct Console<R, W> {
    #[pin]
    reader: R,
    #[pin]
    writer: W,
}

impl<R, W> Console<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    pub fn into_inner(self) -> (R, W) {
        (self.reader, self.writer)
    }
}

/// The process console on standard I/O.
///
/// # Example
/// ```no_run
/// use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
///
/// use fib_channel::readwriter::console;
///
/// #[tokio::main]
/// async fn main() -> std::io::Result<()> {
///     let mut console = BufReader::new(console::stdio());
///     let mut line = String::new();
///     console.read_line(&mut line).await?;
///     console.write_all(line.as_bytes()).await?;
///     console.flush().await
/// }
/// ```
pub fn stdio() -> Console<Stdin, Stdout> {
    Console {
        reader: stdin(),
        writer: stdout(),
    }
}

impl<R, W> AsyncRead for Console<R, W>
where
    R: AsyncRead,
{
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<Result<()>> {
        self.project().reader.poll_read(cx, buf)
    }
}

impl<R, W> AsyncWrite for Console<R, W>
where
    W: AsyncWrite,
{
    fn poll_write(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<Result<usize>> {
        self.project().writer.poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.project().writer.poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.project().writer.poll_shutdown(cx)
    }
}
