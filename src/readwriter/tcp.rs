use std::{io, net::SocketAddr};

use tokio::net::TcpStream;
use tokio_util::codec::Framed;

use super::ReadWriterExt;
use crate::codec::{ClientCodec, ServerCodec};

/// Connects to `addr` and frames the stream for the client side.
pub async fn connect(addr: SocketAddr) -> io::Result<Framed<TcpStream, ClientCodec>> {
    let stream = TcpStream::connect(addr).await?;
    stream.set_nodelay(true)?;
    Ok(stream.framed(ClientCodec))
}

/// Frames an accepted stream for the server side.
pub fn accepted(stream: TcpStream) -> io::Result<Framed<TcpStream, ServerCodec>> {
    stream.set_nodelay(true)?;
    Ok(stream.framed(ServerCodec))
}
