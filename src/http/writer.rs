use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::message::Message;

const HTTP_VERSION: &str = "HTTP/1.1";

/// Renders a message as a status line, header lines, blank line and body.
pub fn serialize_response(msg: &Message) -> Vec<u8> {
    let status_line = format!(
        "{} {} {}\r\n",
        HTTP_VERSION,
        msg.status_code(),
        msg.status_reason()
    );
    serialize(status_line, msg)
}

/// Renders a message as a request line, header lines, blank line and body.
pub fn serialize_request(msg: &Message) -> Vec<u8> {
    let request_line = format!("{} {} {}\r\n", msg.method_name(), msg.target(), HTTP_VERSION);
    serialize(request_line, msg)
}

fn serialize(start_line: String, msg: &Message) -> Vec<u8> {
    let mut buf = start_line.into_bytes();

    // Headers
    for (k, v) in msg.headers() {
        buf.extend_from_slice(k.as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(v.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }

    // Header/body separator
    buf.extend_from_slice(b"\r\n");

    buf.extend_from_slice(msg.body());

    buf
}

/// Which start line to render a message with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Form {
    Request,
    Response,
}

/// Pushes a serialized message onto a stream, tracking partial writes.
pub struct MessageWriter {
    buffer: Vec<u8>,
    written: usize,
}

impl MessageWriter {
    pub fn new(msg: &Message, form: Form) -> Self {
        let buffer = match form {
            Form::Request => serialize_request(msg),
            Form::Response => serialize_response(msg),
        };
        Self { buffer, written: 0 }
    }

    pub async fn write_to_stream<W>(&mut self, stream: &mut W) -> anyhow::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        while self.written < self.buffer.len() {
            let n = stream.write(&self.buffer[self.written..]).await?;

            if n == 0 {
                return Err(anyhow::anyhow!("connection closed while writing"));
            }

            self.written += n;
        }

        stream.flush().await?;
        Ok(())
    }
}
