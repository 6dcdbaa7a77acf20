use std::{io, net::SocketAddr};

#[derive(thiserror::Error, Debug)]
pub enum ConnectionError {
    /// The peer closed the stream in the middle of a frame.
    #[error("connection ended after {received} of {expected} frame bytes")]
    Truncated { received: usize, expected: usize },
    /// Could not read from or write to the stream.
    #[error("i/o fault on connection")]
    Io(#[from] io::Error),
}

impl ConnectionError {
    /// Whether the error means the peer went away rather than a real fault.
    pub fn is_ended(&self) -> bool {
        match self {
            ConnectionError::Truncated { .. } => true,
            ConnectionError::Io(err) => matches!(
                err.kind(),
                io::ErrorKind::UnexpectedEof
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
            ),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ServerError {
    /// Could not bind the listening socket.
    #[error("could not bind to {addr}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    /// The accept loop failed.
    #[error("could not accept connections")]
    Accept(#[source] io::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum RpcError<E> {
    /// The server closed the connection before answering.
    #[error("the server closed the connection")]
    Disconnected,

    /// The transport failed while sending or receiving.
    #[error("the transport failed")]
    Transport(#[source] E),
}

#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    /// Could not read from or write to the console.
    #[error("console i/o failed")]
    Console(#[from] io::Error),
    /// The request could not be completed.
    #[error("request failed")]
    Rpc(#[from] RpcError<ConnectionError>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_ended() {
        assert!(ConnectionError::Truncated {
            received: 2,
            expected: 4
        }
        .is_ended());
        assert!(ConnectionError::from(io::Error::from(io::ErrorKind::ConnectionReset)).is_ended());
        assert!(ConnectionError::from(io::Error::from(io::ErrorKind::BrokenPipe)).is_ended());
        assert!(!ConnectionError::from(io::Error::from(io::ErrorKind::PermissionDenied)).is_ended());
    }
}
