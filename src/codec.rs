//! Fixed-width big-endian framing.
//!
//! A request frame is exactly [`REQUEST_FRAME_LEN`] bytes holding an `i32`, a
//! response frame is exactly [`RESPONSE_FRAME_LEN`] bytes holding an `i64`.
//! There are no headers or length prefixes.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::{error::ConnectionError, Request, Response};

pub const REQUEST_FRAME_LEN: usize = 4;
pub const RESPONSE_FRAME_LEN: usize = 8;

/// Response value for a negative index.
pub const INVALID_INDEX: i64 = -1;

/// Server side: reads requests, writes responses.
#[derive(Clone, Copy, Debug, Default)]
pub struct ServerCodec;

/// Client side: writes requests, reads responses.
#[derive(Clone, Copy, Debug, Default)]
pub struct ClientCodec;

fn has_frame(src: &mut BytesMut, frame_len: usize) -> bool {
    if src.len() < frame_len {
        src.reserve(frame_len - src.len());
        return false;
    }
    true
}

fn truncated(src: &BytesMut, frame_len: usize) -> Result<(), ConnectionError> {
    if src.is_empty() {
        Ok(())
    } else {
        Err(ConnectionError::Truncated {
            received: src.len(),
            expected: frame_len,
        })
    }
}

impl Decoder for ServerCodec {
    type Item = Request;
    type Error = ConnectionError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Request>, Self::Error> {
        if !has_frame(src, REQUEST_FRAME_LEN) {
            return Ok(None);
        }
        Ok(Some(Request::new(src.get_i32())))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Request>, Self::Error> {
        match self.decode(src)? {
            Some(req) => Ok(Some(req)),
            None => truncated(src, REQUEST_FRAME_LEN).map(|_| None),
        }
    }
}

impl Encoder<Response> for ServerCodec {
    type Error = ConnectionError;

    fn encode(&mut self, resp: Response, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(RESPONSE_FRAME_LEN);
        dst.put_i64(resp.value);
        Ok(())
    }
}

impl Decoder for ClientCodec {
    type Item = Response;
    type Error = ConnectionError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Response>, Self::Error> {
        if !has_frame(src, RESPONSE_FRAME_LEN) {
            return Ok(None);
        }
        Ok(Some(Response::new(src.get_i64())))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Response>, Self::Error> {
        match self.decode(src)? {
            Some(resp) => Ok(Some(resp)),
            None => truncated(src, RESPONSE_FRAME_LEN).map(|_| None),
        }
    }
}

impl Encoder<Request> for ClientCodec {
    type Error = ConnectionError;

    fn encode(&mut self, req: Request, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(REQUEST_FRAME_LEN);
        dst.put_i32(req.index);
        Ok(())
    }
}
