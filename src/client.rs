use std::{io, net::SocketAddr};

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;

use crate::{
    codec::ClientCodec, error::RpcError, readwriter::tcp, Request, Response, Transport,
};

/// One connection to the server, used for strictly alternating calls.
pub struct Client<TP> {
    transport: TP,
}

impl Client<Framed<TcpStream, ClientCodec>> {
    pub async fn connect(addr: SocketAddr) -> io::Result<Self> {
        Ok(Self::new(tcp::connect(addr).await?))
    }
}

impl<TP> Client<TP>
where
    TP: Transport<Request, Response> + Unpin,
{
    pub fn new(transport: TP) -> Self {
        Self { transport }
    }

    /// Sends `index` and waits for its answer.
    pub async fn call(&mut self, index: i32) -> Result<i64, RpcError<TP::TransportError>> {
        self.transport
            .send(Request::new(index))
            .await
            .map_err(RpcError::Transport)?;

        match self.transport.next().await {
            Some(resp) => Ok(resp.map_err(RpcError::Transport)?.value),
            None => Err(RpcError::Disconnected),
        }
    }

    /// Closes the connection.
    pub async fn close(mut self) -> Result<(), RpcError<TP::TransportError>> {
        self.transport.close().await.map_err(RpcError::Transport)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        pin::Pin,
        task::{Context, Poll},
    };

    use futures::{ready, Sink, Stream};
    use pin_project::pin_project;
    use pretty_assertions::assert_eq;
    use tokio::sync::mpsc;

    use super::*;

    #[tokio::test]
    async fn test_client_call() {
        let tp = ChannelTransport::unbounded(|req: Request| Response::new(i64::from(req.index) * 2));
        let mut client = Client::new(tp);

        assert_eq!(client.call(21).await.unwrap(), 42);
        assert_eq!(client.call(-3).await.unwrap(), -6);
    }

    #[tokio::test]
    async fn test_client_call_disconnected() {
        let (send_request, _recv_request) = mpsc::unbounded_channel();
        let (send_response, recv_response) = mpsc::unbounded_channel::<Response>();
        drop(send_response);
        let mut client = Client::new(ChannelTransport {
            send_request,
            recv_response,
        });

        assert!(matches!(client.call(1).await, Err(RpcError::Disconnected)));
    }

    #[pin_project]
    struct ChannelTransport<Req, Resp> {
        send_request: mpsc::UnboundedSender<Req>,
        #[pin]
        recv_response: mpsc::UnboundedReceiver<Resp>,
    }

    impl<Req, Resp> ChannelTransport<Req, Resp>
    where
        Req: Send + 'static,
        Resp: Send + 'static,
    {
        fn unbounded(handler: impl Fn(Req) -> Resp + Send + Clone + 'static) -> Self {
            let (send_request, mut recv_request) = mpsc::unbounded_channel();
            let (send_response, recv_response) = mpsc::unbounded_channel();

            tokio::spawn(async move {
                while let Some(req) = recv_request.recv().await {
                    let _ = send_response.send(handler(req));
                }
            });

            Self {
                send_request,
                recv_response,
            }
        }
    }

    impl<Req, Resp> Sink<Req> for ChannelTransport<Req, Resp> {
        type Error = ();

        fn poll_ready(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
        ) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn start_send(self: Pin<&mut Self>, req: Req) -> Result<(), Self::Error> {
            self.send_request.send(req).map_err(|_| ())
        }

        fn poll_flush(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
        ) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn poll_close(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
        ) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }
    }

    impl<Req, Resp> Stream for ChannelTransport<Req, Resp> {
        type Item = Result<Resp, ()>;

        fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
            Poll::Ready(ready!(self.project().recv_response.poll_recv(cx)).map(Ok))
        }
    }
}
