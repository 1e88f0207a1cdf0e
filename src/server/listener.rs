//! Tokio TCP listener driving one [`Connection`] per accepted socket.
//!
//! The listener owns the raw socket I/O: it reads the upgrade request head,
//! hands it to [`Connection::accept`], and afterwards drains inbound bytes
//! until the client disconnects or shutdown is requested. Inbound frames are
//! not decoded.

use std::{io, net::SocketAddr, sync::Arc};

use anyhow::{Context, Result};
use tokio::{
    io::{AsyncRead, AsyncReadExt, BufReader},
    net::{TcpListener, TcpStream},
    sync::watch,
    task::JoinSet,
};
use tracing::{debug, error, info, warn};

use super::cli::AppConfig;
use crate::{
    auth::{AnonymousAuthenticator, Authenticator},
    connection::{Connection, ConnectionConfig, PeerInfo, ResourceIdAllocator},
    protocol::MAX_HEAD_LEN,
    request::read_head,
    session::{FileSessionStore, SessionResolver, SessionStore},
};

/// Shared server resources passed to connection handlers.
#[derive(Clone)]
pub struct ServerResources {
    /// Per-connection settings.
    pub config: Arc<ConnectionConfig>,
    /// Session store and authenticator.
    pub resolver: SessionResolver,
    /// Source of resource ids.
    pub ids: Arc<ResourceIdAllocator>,
    /// Message sent once a connection is established.
    pub greeting: Option<Arc<str>>,
}

impl ServerResources {
    /// Assemble resources from configuration and injected capabilities.
    #[must_use]
    pub fn new(
        cfg: &AppConfig,
        store: Arc<dyn SessionStore>,
        authenticator: Arc<dyn Authenticator>,
    ) -> Self {
        Self {
            config: Arc::new(cfg.connection_config()),
            resolver: SessionResolver::new(store, authenticator),
            ids: Arc::new(ResourceIdAllocator::new()),
            greeting: cfg.greeting.as_deref().map(Arc::from),
        }
    }
}

/// Run the server with the file session store and anonymous authentication.
///
/// # Errors
///
/// Returns any failure reported while binding the socket.
pub async fn run_daemon(cfg: AppConfig) -> Result<()> {
    let resources = ServerResources::new(
        &cfg,
        Arc::new(FileSessionStore::new()),
        Arc::new(AnonymousAuthenticator),
    );
    let listener = TcpListener::bind(&cfg.bind)
        .await
        .with_context(|| format!("failed to bind {}", cfg.bind))?;
    info!(bind = %cfg.bind, "picows listening");
    accept_connections(listener, resources, shutdown_signal()).await
}

/// Accept sockets until `shutdown` resolves, then wait for handlers to finish.
///
/// # Errors
///
/// Currently infallible; accept errors are logged and skipped.
pub async fn accept_connections<F>(
    listener: TcpListener,
    resources: ServerResources,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()>,
{
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut join_set = JoinSet::new();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            () = &mut shutdown => {
                info!("shutdown signal received");
                break;
            }
            res = listener.accept() => {
                handle_accept_result(res, &resources, &shutdown_rx, &mut join_set);
            }
        }
    }

    // notify all tasks to shut down
    if shutdown_tx.send(true).is_err() {
        debug!("no connection handlers to notify");
    }
    await_spawned_tasks(&mut join_set).await;
    Ok(())
}

/// Spawn a client handler task for the accepted connection.
fn handle_accept_result(
    res: io::Result<(TcpStream, SocketAddr)>,
    resources: &ServerResources,
    shutdown_rx: &watch::Receiver<bool>,
    join_set: &mut JoinSet<()>,
) {
    match res {
        Ok((socket, peer)) => {
            let resources = resources.clone();
            let mut shutdown_rx = shutdown_rx.clone();
            join_set.spawn(async move {
                if let Err(e) = handle_client(socket, peer, resources, &mut shutdown_rx).await {
                    warn!(%peer, error = %format!("{e:#}"), "connection error");
                }
            });
        }
        Err(e) => error!(error = %e, "accept error"),
    }
}

async fn await_spawned_tasks(join_set: &mut JoinSet<()>) {
    while let Some(res) = join_set.join_next().await {
        if let Err(e) = res {
            error!(error = %e, "task error");
        }
    }
}

/// Handles a single client from upgrade request to close.
async fn handle_client(
    socket: TcpStream,
    peer: SocketAddr,
    resources: ServerResources,
    shutdown: &mut watch::Receiver<bool>,
) -> Result<()> {
    let (read_half, write_half) = socket.into_split();
    let mut reader = BufReader::new(read_half);
    let head = read_head(&mut reader, MAX_HEAD_LEN, resources.config.handshake.timeout)
        .await
        .context("failed to read upgrade request")?;

    let peer_info = PeerInfo::new(resources.ids.allocate(), Some(peer));
    let conn = Connection::accept(
        peer_info,
        write_half,
        &head,
        &resources.config,
        resources.resolver.clone(),
    )
    .await
    .context("connection setup failed")?;

    if let Some(greeting) = &resources.greeting {
        if let Err(e) = conn.send(greeting).await {
            warn!(resource_id = %conn.resource_id(), error = %e, "failed to send greeting");
        }
    }

    drain_inbound(&mut reader, shutdown).await;
    conn.close().await.context("failed to close connection")?;
    Ok(())
}

/// Discard inbound bytes until EOF, a read error or shutdown.
async fn drain_inbound<R>(reader: &mut R, shutdown: &mut watch::Receiver<bool>)
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; 4096];
    loop {
        tokio::select! {
            res = reader.read(&mut buf) => match res {
                Ok(0) => break,
                Ok(n) => debug!(bytes = n, "inbound bytes ignored"),
                Err(e) => {
                    debug!(error = %e, "read error, closing");
                    break;
                }
            },
            _ = shutdown.changed() => break,
        }
    }
}

/// Waits for a shutdown signal, completing when termination is requested.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    res = tokio::signal::ctrl_c() => {
                        if let Err(err) = res {
                            error!(error = %err, "failed to listen for Ctrl-C");
                        }
                    },
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                error!(error = %err, "failed to install SIGTERM handler");
                wait_for_ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        wait_for_ctrl_c().await;
    }
}

async fn wait_for_ctrl_c() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for Ctrl-C");
    }
}
