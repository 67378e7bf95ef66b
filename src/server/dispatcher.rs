use std::sync::Arc;

use anyhow::Context;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{error, info, warn};

use crate::http::connection::Connection;
use crate::http::message::Message;
use crate::server::listener::{AcceptError, Listener};
use crate::server::transcript::TranscriptSink;

/// Computes the reply for one request.
pub type Handler = Arc<dyn Fn(&Message) -> Message + Send + Sync>;

/// Accepts connections until `listener` is closed.
///
/// Every connection runs on its own task; at most `max_connections` run at
/// once. After the listener closes, in-flight connections are drained before
/// this returns.
pub async fn serve(
    mut listener: Listener,
    handler: Handler,
    max_connections: usize,
    transcripts: TranscriptSink,
) -> anyhow::Result<()> {
    let permits = Arc::new(Semaphore::new(max_connections));
    let mut tasks = JoinSet::new();

    while listener.is_open() {
        let accepted = tokio::select! {
            res = listener.accept() => res,

            // Reap finished connection tasks so the JoinSet does not grow
            // without bound.
            Some(res) = tasks.join_next(), if !tasks.is_empty() => {
                reap(res);
                continue;
            }
        };

        let conn = match accepted {
            Ok(conn) => conn,
            Err(AcceptError::Closed) => {
                info!(in_flight = tasks.len(), "Listener closed, draining connections");
                break;
            }
            Err(AcceptError::Io(e)) => {
                warn!(error = %e, "Accept failed");
                continue;
            }
        };

        let permit = Arc::clone(&permits)
            .acquire_owned()
            .await
            .context("Connection limiter closed")?;
        let handler = Arc::clone(&handler);
        let transcripts = transcripts.clone();

        tasks.spawn(async move {
            handle_connection(conn, handler, transcripts).await;
            drop(permit);
        });
    }

    while let Some(res) = tasks.join_next().await {
        reap(res);
    }

    info!("Server loop stopped");
    Ok(())
}

async fn handle_connection(mut conn: Connection, handler: Handler, transcripts: TranscriptSink) {
    let peer = conn.peer_addr();

    match conn.exchange(|request| handler(request)).await {
        Ok(exchange) => transcripts.record(exchange).await,
        Err(e) => warn!(%peer, error = %format!("{e:#}"), "Connection failed"),
    }

    conn.close().await;
}

fn reap(res: Result<(), JoinError>) {
    if let Err(e) = res {
        error!(error = %e, "Connection task panicked");
    }
}
