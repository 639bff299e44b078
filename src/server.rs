//! Outstation server: connection manager, redundancy groups, enqueue API.
//!
//! The server owns the set of active connections and the message
//! queue(s). Transport streams reach it either through [`Outstation::serve`]
//! (a thin TCP accept loop) or directly through [`Outstation::attach`],
//! which takes any already-authenticated duplex byte stream; a
//! TLS-wrapped stream is attached the same way, the engine never looks
//! below the byte-stream boundary.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::connection::{Connection, ConnectionConfig};
use crate::error::{Iec104Error, Result};
use crate::handler::OutstationHandler;
use crate::queue::{OverflowPolicy, SharedQueue};
use crate::types::{Asdu, AsduParameters};

/// Default IEC 104 port.
pub const DEFAULT_PORT: u16 = 2404;

/// Default message queue capacity in ASDUs.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// How connections share the outstation's event data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServerMode {
    /// One shared queue feeds whichever connections are started; an ASDU
    /// is delivered to exactly one of them and entries survive connection
    /// loss (default)
    #[default]
    SingleRedundancyGroup,
    /// Each connection owns a private queue, addressed explicitly; a
    /// private queue dies with its connection
    ConnectionIsRedundancyGroup,
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// ASDU field widths, identical for every connection
    pub parameters: AsduParameters,
    /// Per-connection protocol parameters (timers, window sizes)
    pub connection: ConnectionConfig,
    /// Redundancy group mode
    pub mode: ServerMode,
    /// Message queue capacity in ASDUs
    pub queue_capacity: usize,
    /// Behavior when enqueueing into a full queue
    pub overflow_policy: OverflowPolicy,
    /// Maximum concurrent connections; None for no restriction
    pub max_connections: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerConfig {
    /// Create a configuration with the CS104 defaults.
    pub fn new() -> Self {
        Self {
            parameters: AsduParameters::default(),
            connection: ConnectionConfig::default(),
            mode: ServerMode::default(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            overflow_policy: OverflowPolicy::default(),
            max_connections: None,
        }
    }

    /// Set the redundancy group mode.
    pub fn mode(mut self, mode: ServerMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the message queue capacity.
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Set the overflow policy.
    pub fn overflow_policy(mut self, policy: OverflowPolicy) -> Self {
        self.overflow_policy = policy;
        self
    }

    /// Limit the number of concurrent connections.
    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = Some(max);
        self
    }

    /// Set the per-connection protocol parameters.
    pub fn connection(mut self, config: ConnectionConfig) -> Self {
        self.connection = config;
        self
    }
}

/// Identifier of one attached connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

struct ConnectionEntry {
    queue: Arc<SharedQueue>,
    cancel: CancellationToken,
}

struct Inner<H> {
    config: ServerConfig,
    handler: Arc<H>,
    shared_queue: Arc<SharedQueue>,
    connections: Mutex<HashMap<ConnectionId, ConnectionEntry>>,
    next_id: AtomicU64,
    shutdown: CancellationToken,
}

impl<H> Inner<H> {
    fn connections(&self) -> MutexGuard<'_, HashMap<ConnectionId, ConnectionEntry>> {
        self.connections.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// IEC 60870-5-104 outstation server.
///
/// Cheap to clone; all clones share the same connection registry and
/// queues, so the application can keep one handle for enqueueing while
/// another drives the accept loop.
pub struct Outstation<H> {
    inner: Arc<Inner<H>>,
}

impl<H> Clone for Outstation<H> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<H: OutstationHandler> Outstation<H> {
    /// Create a new outstation with the given configuration and
    /// application handler.
    pub fn new(config: ServerConfig, handler: H) -> Self {
        let shared_queue = Arc::new(SharedQueue::new(
            config.queue_capacity.max(1),
            config.overflow_policy,
        ));
        Self {
            inner: Arc::new(Inner {
                config,
                handler: Arc::new(handler),
                shared_queue,
                connections: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(0),
                shutdown: CancellationToken::new(),
            }),
        }
    }

    /// Attach an already-authenticated duplex stream as a new connection.
    ///
    /// The connection limit and the handler's `connection_request`
    /// decision are applied before any protocol bytes are exchanged; a
    /// rejected stream is simply dropped by the caller.
    pub fn attach<S>(&self, stream: S, peer: SocketAddr) -> Result<ConnectionId>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let inner = &self.inner;
        inner.config.parameters.validate()?;

        if !inner.handler.connection_request(peer) {
            info!(%peer, "connection denied by handler");
            return Err(Iec104Error::protocol_static("connection denied by handler"));
        }

        let queue = match inner.config.mode {
            ServerMode::SingleRedundancyGroup => Arc::clone(&inner.shared_queue),
            ServerMode::ConnectionIsRedundancyGroup => Arc::new(SharedQueue::new(
                inner.config.queue_capacity.max(1),
                inner.config.overflow_policy,
            )),
        };
        let cancel = inner.shutdown.child_token();
        let id = ConnectionId(inner.next_id.fetch_add(1, Ordering::Relaxed));

        {
            let mut connections = inner.connections();
            if let Some(max) = inner.config.max_connections {
                if connections.len() >= max {
                    warn!(%peer, max, "connection limit reached");
                    return Err(Iec104Error::ConnectionLimitExceeded(max));
                }
            }
            connections.insert(
                id,
                ConnectionEntry {
                    queue: Arc::clone(&queue),
                    cancel: cancel.clone(),
                },
            );
        }

        let connection = Connection::new(
            stream,
            peer,
            inner.config.parameters,
            inner.config.connection.clone(),
            Arc::clone(&inner.handler),
            queue,
            inner.config.mode == ServerMode::SingleRedundancyGroup,
            cancel,
        );

        let inner = Arc::clone(inner);
        tokio::spawn(async move {
            let _ = connection.run().await;
            inner.connections().remove(&id);
            debug!(id = id.0, "connection removed");
        });

        info!(%peer, id = id.0, "connection attached");
        Ok(id)
    }

    /// Accept TCP connections until the outstation is shut down.
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        info!(addr = ?listener.local_addr().ok(), "outstation listening");
        loop {
            tokio::select! {
                _ = self.inner.shutdown.cancelled() => {
                    info!("outstation shutting down");
                    return Ok(());
                }
                accepted = listener.accept() => {
                    let (stream, peer) = accepted?;
                    stream.set_nodelay(true).ok();
                    if let Err(e) = self.attach(stream, peer) {
                        warn!(%peer, error = %e, "rejected connection");
                    }
                }
            }
        }
    }

    /// Submit an ASDU for transmission.
    ///
    /// Non-blocking. In single-redundancy-group mode the ASDU enters the
    /// shared queue (accumulating while no connection is started); in
    /// per-connection mode it is broadcast to every private queue.
    pub fn enqueue(&self, asdu: Asdu) -> Result<()> {
        match self.inner.config.mode {
            ServerMode::SingleRedundancyGroup => self.inner.shared_queue.enqueue(asdu),
            ServerMode::ConnectionIsRedundancyGroup => {
                let connections = self.inner.connections();
                for entry in connections.values() {
                    entry.queue.enqueue(asdu.clone())?;
                }
                Ok(())
            }
        }
    }

    /// Submit an ASDU for transmission on one specific connection.
    ///
    /// Fails with [`Iec104Error::NoTargetConnection`] when the target is
    /// gone; a caller naming a connection must learn that it vanished.
    pub fn enqueue_to(&self, id: ConnectionId, asdu: Asdu) -> Result<()> {
        let connections = self.inner.connections();
        let entry = connections
            .get(&id)
            .ok_or(Iec104Error::NoTargetConnection)?;
        entry.queue.enqueue(asdu)
    }

    /// Close one connection.
    pub fn close(&self, id: ConnectionId) -> Result<()> {
        let connections = self.inner.connections();
        let entry = connections
            .get(&id)
            .ok_or(Iec104Error::NoTargetConnection)?;
        entry.cancel.cancel();
        Ok(())
    }

    /// Number of currently attached connections.
    pub fn connection_count(&self) -> usize {
        self.inner.connections().len()
    }

    /// Cancel every connection task and stop the accept loop.
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
    }
}
