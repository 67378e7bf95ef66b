use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::http::connection::Exchange;

/// Sending side of the transcript log.
///
/// Connection tasks hand finished exchanges to a single consumer task, so
/// transcripts from concurrent connections are written one at a time.
#[derive(Clone)]
pub struct TranscriptSink {
    tx: mpsc::Sender<Exchange>,
}

impl TranscriptSink {
    pub async fn record(&self, exchange: Exchange) {
        if self.tx.send(exchange).await.is_err() {
            tracing::warn!("Transcript writer is gone, dropping transcript");
        }
    }
}

/// Starts the consumer task. It ends once every sink has been dropped.
pub fn spawn(capacity: usize) -> (TranscriptSink, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<Exchange>(capacity);

    let task = tokio::spawn(async move {
        while let Some(exchange) = rx.recv().await {
            tracing::info!(peer = %exchange.peer, "\n{}", exchange.render());
        }
    });

    (TranscriptSink { tx }, task)
}
