//! Accept loops.
//!
//! A [`Server`] owns two listeners. The service listener hands every
//! connection to the caller's [`Handler`]; the admin listener waits for the
//! kill message and closes the service listener when it arrives.
//!
//! ```text
//!  service port ──▶ dispatcher::serve ──▶ task per connection ──▶ transcript
//!                         ▲
//!                         │ CloseHandle::close
//!  admin port ────▶ shutdown::watch_for_kill
//! ```

pub mod dispatcher;
pub mod listener;
pub mod shutdown;
pub mod transcript;

use std::net::SocketAddr;

use anyhow::Context;

use crate::config::Config;
use crate::http::message::Message;
pub use dispatcher::Handler;
use listener::{CloseHandle, Listener};

const TRANSCRIPT_BACKLOG: usize = 64;

/// Both listeners, bound and ready to run.
pub struct Server {
    primary: Listener,
    admin: Listener,
    local_addr: SocketAddr,
    admin_addr: SocketAddr,
    handler: Handler,
    kill: Message,
    max_connections: usize,
}

/// Closes both listeners, for shutdown triggers other than the kill message.
#[derive(Clone)]
pub struct ShutdownHandle {
    primary: CloseHandle,
    admin: CloseHandle,
}

impl ShutdownHandle {
    pub fn trigger(&self) {
        self.primary.close();
        self.admin.close();
    }
}

impl Server {
    /// Binds the service and admin listeners. Fails if either cannot bind.
    pub async fn bind(cfg: &Config, handler: Handler) -> anyhow::Result<Self> {
        let limits = cfg.server.read_limits();

        let mut primary = Listener::new(&cfg.server.listen_addr)
            .with_backlog(cfg.server.backlog)
            .with_limits(limits);
        let local_addr = primary
            .listen()
            .await
            .context("Failed to start service listener")?;

        let mut admin = Listener::new(&cfg.admin.listen_addr).with_limits(limits);
        let admin_addr = admin
            .listen()
            .await
            .context("Failed to start admin listener")?;

        Ok(Self {
            primary,
            admin,
            local_addr,
            admin_addr,
            handler,
            kill: shutdown::kill_message(&cfg.admin),
            max_connections: cfg.server.max_connections,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn admin_addr(&self) -> SocketAddr {
        self.admin_addr
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            primary: self.primary.close_handle(),
            admin: self.admin.close_handle(),
        }
    }

    /// Runs until the kill message arrives (or a [`ShutdownHandle`] fires),
    /// then waits for in-flight connections to finish.
    pub async fn run(self) -> anyhow::Result<()> {
        let (transcripts, transcript_task) = transcript::spawn(TRANSCRIPT_BACKLOG);
        let primary_close = self.primary.close_handle();

        let main_loop = tokio::spawn(dispatcher::serve(
            self.primary,
            self.handler,
            self.max_connections,
            transcripts,
        ));
        let shutdown_loop = tokio::spawn(shutdown::watch_for_kill(
            self.admin,
            primary_close,
            self.kill,
        ));

        shutdown_loop.await.context("Shutdown task panicked")??;
        main_loop.await.context("Server task panicked")??;
        transcript_task.await.context("Transcript task panicked")?;

        tracing::info!("Shutdown complete");
        Ok(())
    }
}
