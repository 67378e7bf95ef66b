use std::net::SocketAddr;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use crate::http::message::Message;
use crate::http::reader::{MessageReader, ReadError, ReadLimits};
use crate::http::writer::{Form, MessageWriter};

/// One accepted (or dialed) socket.
pub struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
    reader: MessageReader,
    state: ConnectionState,
}

pub enum ConnectionState {
    Reading,
    Processing(Message),
    Writing(MessageWriter),
    Closed,
}

/// A request and the reply that was sent for it.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub peer: SocketAddr,
    pub request: Message,
    pub reply: Message,
}

impl Exchange {
    /// Human-readable transcript: the request, a divider, then the reply.
    pub fn render(&self) -> String {
        const DIVIDER: &str = "-------------------------";
        format!(
            "{DIVIDER}\n{}\n{DIVIDER}\n{}",
            String::from_utf8_lossy(&self.request.to_request_bytes()),
            String::from_utf8_lossy(&self.reply.to_response_bytes()),
        )
    }
}

impl Connection {
    pub fn new(stream: TcpStream, peer: SocketAddr, limits: ReadLimits) -> Self {
        Self {
            stream,
            peer,
            reader: MessageReader::new(limits),
            state: ConnectionState::Reading,
        }
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    pub fn is_open(&self) -> bool {
        !matches!(self.state, ConnectionState::Closed)
    }

    /// Serves exactly one request: read it, ask `handler` for a reply, send
    /// the reply and close the socket.
    pub async fn exchange<F>(&mut self, mut handler: F) -> anyhow::Result<Exchange>
    where
        F: FnMut(&Message) -> Message,
    {
        let mut exchange = None;

        loop {
            match &mut self.state {
                ConnectionState::Reading => {
                    let request = self.receive().await?;
                    tracing::debug!(
                        peer = %self.peer,
                        method = %request.method(),
                        target = request.target(),
                        "Request received"
                    );
                    self.state = ConnectionState::Processing(request);
                }

                ConnectionState::Processing(request) => {
                    let reply = handler(&*request);
                    let writer = MessageWriter::new(&reply, Form::Response);
                    exchange = Some(Exchange {
                        peer: self.peer,
                        request: request.clone(),
                        reply,
                    });
                    self.state = ConnectionState::Writing(writer);
                }

                ConnectionState::Writing(writer) => {
                    writer.write_to_stream(&mut self.stream).await?;
                    self.close().await;
                }

                ConnectionState::Closed => {
                    return exchange.ok_or_else(|| anyhow::anyhow!("connection already closed"));
                }
            }
        }
    }

    /// Blocks until one full request has been read.
    pub async fn receive(&mut self) -> Result<Message, ReadError> {
        if !self.is_open() {
            return Err(ReadError::ConnectionClosed);
        }
        self.reader.read_request(&mut self.stream).await
    }

    /// Blocks until one full response has been read.
    pub async fn receive_response(&mut self) -> Result<Message, ReadError> {
        if !self.is_open() {
            return Err(ReadError::ConnectionClosed);
        }
        self.reader.read_response(&mut self.stream).await
    }

    /// Writes `msg` in response form.
    pub async fn send(&mut self, msg: &Message) -> anyhow::Result<()> {
        self.write(msg, Form::Response).await
    }

    /// Writes `msg` in request form.
    pub async fn send_request(&mut self, msg: &Message) -> anyhow::Result<()> {
        self.write(msg, Form::Request).await
    }

    /// Closes the write half so the peer sees the end of the message.
    pub async fn finish_writes(&mut self) -> anyhow::Result<()> {
        if !self.is_open() {
            anyhow::bail!("connection already closed");
        }
        self.stream.shutdown().await?;
        Ok(())
    }

    /// Shuts the socket down. Closing twice is a no-op.
    pub async fn close(&mut self) {
        if !self.is_open() {
            return;
        }
        self.state = ConnectionState::Closed;

        if let Err(e) = self.stream.shutdown().await {
            tracing::trace!(peer = %self.peer, error = %e, "Shutdown after close");
        }
    }

    async fn write(&mut self, msg: &Message, form: Form) -> anyhow::Result<()> {
        if !self.is_open() {
            anyhow::bail!("connection already closed");
        }
        MessageWriter::new(msg, form)
            .write_to_stream(&mut self.stream)
            .await
    }
}
