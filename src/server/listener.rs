use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use thiserror::Error;
use tokio::net::{TcpListener, TcpSocket};
use tokio::sync::watch;
use tracing::info;

use crate::http::connection::Connection;
use crate::http::reader::ReadLimits;

#[derive(Debug, Error)]
pub enum AcceptError {
    /// The listener was closed, possibly while the accept was pending.
    #[error("listener closed")]
    Closed,

    #[error("accept failed: {0}")]
    Io(#[from] std::io::Error),
}

enum ListenerState {
    Unbound,
    Listening(TcpListener),
    Closed,
}

/// A listening socket that hands out one [`Connection`] per accept.
///
/// `Unbound → Listening → Closed`. Closing through a [`CloseHandle`] from
/// another task wakes a pending [`Listener::accept`], which then returns
/// [`AcceptError::Closed`].
pub struct Listener {
    addr: String,
    backlog: u32,
    limits: ReadLimits,
    state: ListenerState,
    closed: Arc<watch::Sender<bool>>,
}

/// Closes a [`Listener`] from anywhere. Cheap to clone.
#[derive(Clone)]
pub struct CloseHandle {
    closed: Arc<watch::Sender<bool>>,
}

impl CloseHandle {
    pub fn close(&self) {
        self.closed.send_replace(true);
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }
}

impl Listener {
    pub fn new(addr: impl Into<String>) -> Self {
        let (closed, _) = watch::channel(false);
        Self {
            addr: addr.into(),
            backlog: 128,
            limits: ReadLimits::default(),
            state: ListenerState::Unbound,
            closed: Arc::new(closed),
        }
    }

    pub fn with_backlog(mut self, backlog: u32) -> Self {
        self.backlog = backlog;
        self
    }

    /// Limits handed to every accepted connection.
    pub fn with_limits(mut self, limits: ReadLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Binds the address with `SO_REUSEADDR` and starts listening.
    ///
    /// Returns the bound address, which differs from the configured one when
    /// port 0 was requested.
    pub async fn listen(&mut self) -> anyhow::Result<SocketAddr> {
        if !matches!(self.state, ListenerState::Unbound) {
            anyhow::bail!("listener for {} already used", self.addr);
        }

        let addr = tokio::net::lookup_host(&self.addr)
            .await
            .with_context(|| format!("Invalid listen address {}", self.addr))?
            .next()
            .with_context(|| format!("No address found for {}", self.addr))?;

        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()?
        } else {
            TcpSocket::new_v6()?
        };
        socket.set_reuseaddr(true)?;
        socket
            .bind(addr)
            .with_context(|| format!("Failed to bind {addr}"))?;

        let listener = socket.listen(self.backlog)?;
        let local = listener.local_addr()?;
        info!("Listening on {}", local);

        self.state = ListenerState::Listening(listener);
        Ok(local)
    }

    /// Waits for the next peer.
    pub async fn accept(&mut self) -> Result<Connection, AcceptError> {
        let result = {
            let ListenerState::Listening(listener) = &self.state else {
                return Err(AcceptError::Closed);
            };
            let mut closed = self.closed.subscribe();

            tokio::select! {
                biased;

                _ = closed.wait_for(|closed| *closed) => Err(AcceptError::Closed),

                res = listener.accept() => {
                    let (stream, peer) = res?;
                    info!("Accepted connection from {}", peer);
                    Ok(Connection::new(stream, peer, self.limits))
                }
            }
        };

        if matches!(result, Err(AcceptError::Closed)) {
            self.close();
        }
        result
    }

    /// Stops listening. Connections already accepted are not affected.
    pub fn close(&mut self) {
        self.closed.send_replace(true);
        if let ListenerState::Listening(_) = self.state {
            info!("Closed listener on {}", self.addr);
        }
        self.state = ListenerState::Closed;
    }

    pub fn close_handle(&self) -> CloseHandle {
        CloseHandle {
            closed: Arc::clone(&self.closed),
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, ListenerState::Listening(_)) && !*self.closed.borrow()
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        match &self.state {
            ListenerState::Listening(listener) => listener.local_addr().ok(),
            _ => None,
        }
    }
}
