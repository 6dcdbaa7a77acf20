use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::Framed;

pub mod console;
pub mod tcp;

impl<T: ?Sized> ReadWriter for T where T: AsyncRead + AsyncWrite {}

pub trait ReadWriter: AsyncRead + AsyncWrite {}

impl<T: ?Sized> ReadWriterExt for T where T: ReadWriter {}

pub trait ReadWriterExt: ReadWriter {
    /// Wraps the byte stream with `codec`, yielding a frame transport.
    fn framed<Codec>(self, codec: Codec) -> Framed<Self, Codec>
    where
        Self: Sized,
    {
        Framed::new(self, codec)
    }
}
