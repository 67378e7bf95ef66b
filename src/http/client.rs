use anyhow::Context;
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::http::connection::Connection;
use crate::http::message::Message;
use crate::http::reader::ReadLimits;

/// Sends `request` to `addr` and waits for the reply.
///
/// The write half is closed after the request so the server sees where the
/// message ends without a `Content-Length` header.
pub async fn send_request(
    addr: &str,
    request: &Message,
    limits: ReadLimits,
) -> anyhow::Result<Message> {
    let stream = timeout(limits.read_timeout, TcpStream::connect(addr))
        .await
        .context("Connection timeout")?
        .with_context(|| format!("Failed to connect to {addr}"))?;
    let peer = stream.peer_addr()?;

    tracing::trace!(%peer, "Connected");

    let mut conn = Connection::new(stream, peer, limits);
    conn.send_request(request).await?;
    conn.finish_writes().await?;

    let reply = conn.receive_response().await?;
    conn.close().await;

    Ok(reply)
}
