use std::{
    future::{self, Future},
    io,
    net::SocketAddr,
    time::Duration,
};

use futures::{future::BoxFuture, stream, SinkExt, Stream, StreamExt};
use tokio::{
    net::{TcpListener, TcpStream},
    task::{self, JoinSet},
    time,
};
use tracing::{error, info, info_span, warn, Instrument};

use crate::{
    codec::INVALID_INDEX,
    error::{ConnectionError, ServerError},
    fib::fibonacci,
    readwriter::tcp,
    Request, Response, Transport,
};

/// Indices above this are computed on the blocking pool.
const INLINE_INDEX_LIMIT: i32 = 1 << 16;

/// Pause before accepting again once the process is out of file descriptors.
const EXHAUSTED_BACKOFF: Duration = Duration::from_millis(100);

pub trait Handler {
    type Fut<'a>: Future<Output = Response> + Send + 'a
    where
        Self: 'a;

    fn serve(&self, req: Request) -> Self::Fut<'_>;
}

/// Answers every request with `fib(index)`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Fib;

impl Handler for Fib {
    type Fut<'a> = BoxFuture<'a, Response>;

    fn serve(&self, req: Request) -> Self::Fut<'_> {
        if req.index <= INLINE_INDEX_LIMIT {
            return Box::pin(future::ready(Response::new(fibonacci(req.index))));
        }
        Box::pin(async move {
            match task::spawn_blocking(move || fibonacci(req.index)).await {
                Ok(value) => Response::new(value),
                Err(err) => {
                    error!(index = req.index, cause = %err, "fibonacci task failed");
                    Response::new(INVALID_INDEX)
                }
            }
        })
    }
}

/// Runs the request/response loop on one connection until the peer goes away.
///
/// Each request is answered before the next one is read. The transport is
/// dropped, and with it the connection closed, on every return path.
pub async fn serve_connection<TP, H>(mut transport: TP, handler: &H) -> Result<(), ConnectionError>
where
    TP: Transport<Response, Request, TransportError = ConnectionError> + Unpin,
    H: Handler,
{
    while let Some(req) = transport.next().await {
        let resp = handler.serve(req?).await;
        transport.send(resp).await?;
    }
    Ok(())
}

async fn handle_connection<H>(stream: TcpStream, handler: H)
where
    H: Handler,
{
    let transport = match tcp::accepted(stream) {
        Ok(transport) => transport,
        Err(err) => {
            warn!(cause = %err, "could not set up connection");
            return;
        }
    };
    match serve_connection(transport, &handler).await {
        Ok(()) => info!("worker ended, peer closed the connection"),
        Err(err) if err.is_ended() => info!(cause = %err, "worker ended, peer went away"),
        Err(err) => warn!(cause = ?err, "worker ended on i/o fault"),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AcceptFailure {
    /// Only the connection being accepted is lost.
    Connection,
    /// Out of file descriptors, worth retrying after a pause.
    Exhausted,
    /// The listener itself is broken.
    Fatal,
}

fn classify_accept_error(err: &io::Error) -> AcceptFailure {
    if matches!(err.raw_os_error(), Some(libc::EMFILE | libc::ENFILE)) {
        return AcceptFailure::Exhausted;
    }
    match err.kind() {
        io::ErrorKind::ConnectionAborted
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::Interrupted
        | io::ErrorKind::TimedOut => AcceptFailure::Connection,
        _ => AcceptFailure::Fatal,
    }
}

/// Spawns a worker per incoming connection until `shutdown` resolves, the
/// incoming stream ends, or it yields a fatal error. The workers are aborted
/// on the way out.
async fn serve_incoming<S, H, F>(mut incoming: S, handler: H, shutdown: F) -> Result<(), ServerError>
where
    S: Stream<Item = io::Result<(TcpStream, SocketAddr)>> + Unpin,
    H: Handler + Clone + Send + Sync + 'static,
    F: Future<Output = ()>,
{
    let mut workers = JoinSet::new();
    tokio::pin!(shutdown);

    let result = loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("shutting down");
                break Ok(());
            }
            accepted = incoming.next() => match accepted {
                Some(Ok((stream, peer))) => {
                    info!(%peer, "new connection");
                    let span = info_span!("connection", %peer);
                    workers.spawn(handle_connection(stream, handler.clone()).instrument(span));
                }
                Some(Err(err)) => match classify_accept_error(&err) {
                    AcceptFailure::Connection => warn!(cause = %err, "could not accept connection"),
                    AcceptFailure::Exhausted => {
                        warn!(cause = %err, "out of file descriptors, pausing accept");
                        time::sleep(EXHAUSTED_BACKOFF).await;
                    }
                    AcceptFailure::Fatal => break Err(ServerError::Accept(err)),
                },
                None => {
                    info!("listener closed");
                    break Ok(());
                }
            },
            Some(joined) = workers.join_next(), if !workers.is_empty() => {
                if let Err(err) = joined {
                    warn!(cause = %err, "worker did not finish cleanly");
                }
            }
        }
    };

    drop(incoming);
    if !workers.is_empty() {
        info!(workers = workers.len(), "stopping workers");
    }
    workers.shutdown().await;
    result
}

/// Accepts connections and serves each one on its own task.
///
/// The number of concurrent connections is not bounded, and a silent peer
/// holds its task open for as long as it keeps the connection.
pub struct Server<H> {
    listener: TcpListener,
    handler: H,
}

impl Server<Fib> {
    pub async fn bind(addr: SocketAddr) -> Result<Self, ServerError> {
        Self::with_handler(addr, Fib).await
    }
}

impl<H> Server<H>
where
    H: Handler + Clone + Send + Sync + 'static,
{
    pub async fn with_handler(addr: SocketAddr, handler: H) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        Ok(Self { listener, handler })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections until the accept loop fails.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_until(future::pending()).await
    }

    /// Accepts connections until `shutdown` resolves or the accept loop fails.
    ///
    /// Either way the listener is closed and every running worker is aborted,
    /// which closes its connection. Accept errors that only cost one
    /// connection are logged and skipped.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()>,
    {
        let Server { listener, handler } = self;
        info!(addr = ?listener.local_addr().ok(), "accepting inbound connections");

        let incoming = stream::unfold(listener, |listener| async move {
            let accepted = listener.accept().await;
            Some((accepted, listener))
        });
        serve_incoming(Box::pin(incoming), handler, shutdown).await
    }
}
