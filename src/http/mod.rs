//! HTTP/1.1 message framing.
//!
//! This module turns bytes on a socket into [`message::Message`] values and
//! back. It deliberately covers a small part of HTTP/1.1: one message per
//! connection, no chunked encoding, no keep-alive.
//!
//! # Architecture
//!
//! - **`method`** / **`status`**: method tokens and reason phrases
//! - **`message`**: the request-or-response value type
//! - **`parser`**: lenient parsing of raw buffers into messages
//! - **`writer`**: wire serialization and full-buffer writes
//! - **`reader`**: chunked reads until a message is complete
//! - **`connection`**: one socket, one request, one reply
//! - **`client`**: dial, send a request, read the reply
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Wait for a complete request
//!        └──────┬──────┘
//!               │ Request received
//!               ▼
//!        ┌──────────────────┐
//!        │   Processing     │ ← Ask the handler for a reply
//!        └──────┬───────────┘
//!               │ Reply ready
//!               ▼
//!        ┌──────────────────┐
//!        │    Writing       │ ← Send the reply
//!        └──────┬───────────┘
//!               │ Reply sent
//!               ▼
//!        ┌──────────────────┐
//!        │     Closed       │
//!        └──────────────────┘
//! ```

pub mod client;
pub mod connection;
pub mod message;
pub mod method;
pub mod parser;
pub mod reader;
pub mod status;
pub mod writer;
