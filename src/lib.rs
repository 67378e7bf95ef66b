//! Wicket - minimal HTTP/1.1 framing over raw sockets
//!
//! Core library for message parsing, connection handling and the
//! two-listener server with its admin shutdown channel.

pub mod config;
pub mod http;
pub mod reply;
pub mod server;
