use futures::{Sink, Stream};

pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod fib;
pub mod readwriter;
pub mod server;
pub mod session;

pub trait Transport<SinkItem, Item>:
    Sink<SinkItem, Error = <Self as Transport<SinkItem, Item>>::TransportError>
    + Stream<Item = Result<Item, <Self as Transport<SinkItem, Item>>::TransportError>>
{
    type TransportError: Send + Sync + 'static;
}

impl<T, SinkItem, Item, E> Transport<SinkItem, Item> for T
where
    T: ?Sized,
    T: Sink<SinkItem, Error = E>,
    T: Stream<Item = Result<Item, E>>,
    E: Send + Sync + 'static,
{
    type TransportError = E;
}

/// Request carries the fibonacci index asked for by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Request {
    /// the requested index, negative values are answered with the sentinel
    pub index: i32,
}

/// Response carries `fib(index)`, or [`codec::INVALID_INDEX`] for a negative index.
///
/// Values past `fib(92)` wrap around the 64-bit range, so a wrapped result may
/// coincide with the sentinel on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Response {
    pub value: i64,
}

impl Request {
    pub fn new(index: i32) -> Self {
        Self { index }
    }
}

impl Response {
    pub fn new(value: i64) -> Self {
        Self { value }
    }
}
