//! The admin listener that shuts the service down.
//!
//! It lives on its own, non-public port. Every message it receives is
//! compared, field for field, against the kill message. A match closes the
//! primary listener; anything else gets a "not recognized" reply.

use tracing::{info, warn};

use crate::config::AdminConfig;
use crate::http::message::Message;
use crate::http::method::Method;
use crate::reply::json_message;
use crate::server::listener::{AcceptError, CloseHandle, Listener};

pub const KILL_TARGET: &str = "/non_public_uri";

/// The exact message that stops the service.
pub fn kill_message(admin: &AdminConfig) -> Message {
    Message::request(Method::DELETE, KILL_TARGET)
        .with_header("host", admin.host.as_str())
        .with_header("operation", "kill")
        .with_body(admin.passphrase.as_bytes())
}

pub fn kill_acknowledgement() -> Message {
    json_message(200, "Shutting down")
}

pub fn not_recognized() -> Message {
    json_message(400, "Message not recognized")
}

/// Accepts admin connections until the kill message arrives or the admin
/// listener itself is closed.
pub async fn watch_for_kill(
    mut admin: Listener,
    primary: CloseHandle,
    kill: Message,
) -> anyhow::Result<()> {
    loop {
        let mut conn = match admin.accept().await {
            Ok(conn) => conn,
            Err(AcceptError::Closed) => {
                info!("Admin listener closed");
                return Ok(());
            }
            Err(AcceptError::Io(e)) => {
                warn!(error = %e, "Admin accept failed");
                continue;
            }
        };
        let peer = conn.peer_addr();

        let msg = match conn.receive().await {
            Ok(msg) => msg,
            Err(e) => {
                warn!(%peer, error = %e, "Failed to read admin message");
                conn.close().await;
                continue;
            }
        };

        if msg == kill {
            info!(%peer, "Kill message received, shutting down");
            if let Err(e) = conn.send(&kill_acknowledgement()).await {
                warn!(%peer, error = %e, "Failed to acknowledge kill message");
            }
            conn.close().await;

            primary.close();
            admin.close();
            return Ok(());
        }

        warn!(
            %peer,
            method = %msg.method(),
            target = msg.target(),
            "Unrecognized admin message"
        );
        if let Err(e) = conn.send(&not_recognized()).await {
            warn!(%peer, error = %e, "Failed to reply to admin message");
        }
        conn.close().await;
    }
}
