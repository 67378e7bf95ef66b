//! Incremental reading of one message from a byte stream.
//!
//! Messages carry no mandatory length prefix, so the end of a message is
//! found from whichever of these comes first:
//!
//! - a `Content-Length` header, once that many body bytes have arrived
//! - the peer closing its write half
//! - the peer going quiet for the idle grace period after a complete header
//!   block that declared no length
//!
//! Every read is bounded by a timeout, and the accumulated buffer by a
//! maximum size.

use std::time::Duration;

use bytes::{Bytes, BytesMut};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::timeout;

use crate::http::message::Message;
use crate::http::parser::{content_length, find_headers_end, parse_message, parse_response};

/// Bytes requested from the stream per read call.
pub const CHUNK_SIZE: usize = 1024;

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("connection closed before any data arrived")]
    ConnectionClosed,

    #[error("no data received for {0:?}")]
    Timeout(Duration),

    #[error("message exceeds the {limit} byte limit")]
    TooLarge { limit: usize },

    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Bounds applied while reading a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadLimits {
    /// How long a single read may wait while the message is still incomplete
    pub read_timeout: Duration,
    /// Quiet period that ends a message with headers but no declared length
    pub idle_grace: Duration,
    /// Largest message accepted, in bytes
    pub max_message_size: usize,
}

impl Default for ReadLimits {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_secs(10),
            idle_grace: Duration::from_millis(200),
            max_message_size: 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    /// Header block still incomplete, or declared body still arriving
    Partial,
    /// Header block complete without a declared length
    Open,
    /// The first `n` bytes form a whole message
    Complete(usize),
    /// The declared length can never fit within the size limit
    Oversized,
}

/// Reads chunks from a stream until one message is complete.
pub struct MessageReader {
    buffer: BytesMut,
    limits: ReadLimits,
}

impl MessageReader {
    pub fn new(limits: ReadLimits) -> Self {
        Self {
            buffer: BytesMut::with_capacity(CHUNK_SIZE),
            limits,
        }
    }

    /// Reads one message and parses it as a request.
    pub async fn read_request<R>(&mut self, stream: &mut R) -> Result<Message, ReadError>
    where
        R: AsyncRead + Unpin,
    {
        let raw = self.read_raw(stream).await?;
        Ok(parse_message(&raw))
    }

    /// Reads one message and parses it as a response.
    pub async fn read_response<R>(&mut self, stream: &mut R) -> Result<Message, ReadError>
    where
        R: AsyncRead + Unpin,
    {
        let raw = self.read_raw(stream).await?;
        Ok(parse_response(&raw))
    }

    /// Reads the raw bytes of one message.
    ///
    /// Bytes that arrive after a length-delimited message are discarded.
    pub async fn read_raw<R>(&mut self, stream: &mut R) -> Result<Bytes, ReadError>
    where
        R: AsyncRead + Unpin,
    {
        self.buffer.clear();

        loop {
            let frame = self.frame();
            let wait = match frame {
                Frame::Complete(len) => {
                    let message = self.buffer.split_to(len).freeze();
                    self.buffer.clear();
                    return Ok(message);
                }
                Frame::Oversized => {
                    return Err(ReadError::TooLarge {
                        limit: self.limits.max_message_size,
                    });
                }
                Frame::Open => self.limits.idle_grace,
                Frame::Partial => self.limits.read_timeout,
            };

            let mut chunk = [0u8; CHUNK_SIZE];
            let n = match timeout(wait, stream.read(&mut chunk)).await {
                Ok(res) => res?,
                Err(_) if frame == Frame::Open => {
                    tracing::trace!(bytes = self.buffer.len(), "peer idle, treating message as complete");
                    return Ok(self.buffer.split().freeze());
                }
                Err(_) => return Err(ReadError::Timeout(wait)),
            };

            if n == 0 {
                if self.buffer.is_empty() {
                    return Err(ReadError::ConnectionClosed);
                }
                return Ok(self.buffer.split().freeze());
            }

            if self.buffer.len() + n > self.limits.max_message_size {
                return Err(ReadError::TooLarge {
                    limit: self.limits.max_message_size,
                });
            }

            self.buffer.extend_from_slice(&chunk[..n]);
        }
    }

    fn frame(&self) -> Frame {
        let Some(headers_end) = find_headers_end(&self.buffer) else {
            return Frame::Partial;
        };

        match content_length(&self.buffer[..headers_end]) {
            Some(len) => match headers_end.checked_add(4).and_then(|n| n.checked_add(len)) {
                Some(total) if total > self.limits.max_message_size => Frame::Oversized,
                Some(total) if self.buffer.len() >= total => Frame::Complete(total),
                Some(_) => Frame::Partial,
                None => Frame::Oversized,
            },
            None => Frame::Open,
        }
    }
}
