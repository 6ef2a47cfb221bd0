//! Connection registry and fan-out.
//!
//! A single [`Hub`] task owns every connection's [`Outbox`]. Everything else
//! talks to it through a cloneable [`HubHandle`], so registration, removal,
//! and broadcast are serialized without a lock.

use std::collections::HashMap;
use std::sync::Arc;

use duelcast_core::{ConnectionId, Repository, StorageError};
use tokio::sync::{mpsc, oneshot};
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::blocking::run_blocking;

/// Sending half of a connection's outbound queue.
///
/// Closing is idempotent. Once closed, the connection's outbound pump sees
/// the queue end and shuts the transport down.
#[derive(Debug)]
pub struct Outbox {
    tx: Option<mpsc::Sender<Arc<str>>>,
}

/// Result of offering a message to an [`Outbox`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delivery {
    /// Queued.
    Queued,
    /// Queue at capacity.
    Full,
    /// Queue closed on either end.
    Closed,
}

impl Outbox {
    /// Wrap the sending half of an outbound queue.
    pub fn new(tx: mpsc::Sender<Arc<str>>) -> Self {
        Self { tx: Some(tx) }
    }

    /// Offer `message` without waiting.
    pub fn offer(&self, message: &Arc<str>) -> Delivery {
        let Some(tx) = &self.tx else {
            return Delivery::Closed;
        };
        match tx.try_send(Arc::clone(message)) {
            Ok(()) => Delivery::Queued,
            Err(TrySendError::Full(_)) => Delivery::Full,
            Err(TrySendError::Closed(_)) => Delivery::Closed,
        }
    }

    /// Close the queue. Returns `true` only on the first call.
    pub fn close(&mut self) -> bool {
        self.tx.take().is_some()
    }

    /// Whether the queue is still open on this end.
    pub fn is_open(&self) -> bool {
        self.tx.is_some()
    }
}

/// Create an outbound queue of `capacity` messages.
pub fn outbound_queue(capacity: usize) -> (Outbox, mpsc::Receiver<Arc<str>>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (Outbox::new(tx), rx)
}

/// A connection asking to join the registry.
#[derive(Debug)]
pub struct Admission {
    /// Connection being admitted.
    pub id: ConnectionId,
    /// Identity claimed by the peer (empty when absent).
    pub identity: String,
    /// Outbound queue for the connection.
    pub outbox: Outbox,
}

/// Outcome of the participant check made at admission.
#[derive(Debug, PartialEq, Eq)]
pub enum Verdict {
    /// Identity is seated in some round.
    Admitted,
    /// Identity is not a participant.
    Denied,
    /// The check itself failed; treated as a denial.
    Failed(StorageError),
}

impl Verdict {
    /// Ask `repo` whether `identity` may join, off the async workers.
    pub async fn check(repo: Arc<dyn Repository>, identity: String) -> Self {
        match run_blocking(move || repo.is_participant(&identity)).await {
            Ok(true) => Self::Admitted,
            Ok(false) => Self::Denied,
            Err(error) => Self::Failed(error),
        }
    }
}

/// Commands processed by the hub task, one at a time.
#[derive(Debug)]
pub enum HubCommand {
    /// Check participation, register on success, and report the verdict.
    Admit(Admission, oneshot::Sender<bool>),
    /// Remove a connection and close its queue.
    Unregister(ConnectionId),
    /// Offer a message to every registered connection.
    Broadcast(Arc<str>),
    /// Report the number of registered connections.
    ConnectionCount(oneshot::Sender<usize>),
}

/// Cloneable handle to a running [`Hub`].
#[derive(Clone, Debug)]
pub struct HubHandle {
    tx: mpsc::Sender<HubCommand>,
}

impl HubHandle {
    /// Submit a connection for admission and wait for the verdict.
    ///
    /// Returns `true` only once the connection is registered. A denied
    /// peer, a failed check, or a stopped hub all yield `false`.
    pub async fn admit(&self, admission: Admission) -> bool {
        let (tx, rx) = oneshot::channel();
        if self.tx.send(HubCommand::Admit(admission, tx)).await.is_err() {
            return false;
        }
        rx.await.unwrap_or(false)
    }

    /// Remove a connection. Unknown IDs are ignored.
    pub async fn unregister(&self, id: ConnectionId) {
        let _ = self.tx.send(HubCommand::Unregister(id)).await;
    }

    /// Queue `message` for every registered connection.
    pub async fn broadcast(&self, message: impl Into<Arc<str>>) {
        let _ = self.tx.send(HubCommand::Broadcast(message.into())).await;
    }

    /// Registered connections, or `0` if the hub is gone.
    pub async fn connection_count(&self) -> usize {
        let (tx, rx) = oneshot::channel();
        if self.tx.send(HubCommand::ConnectionCount(tx)).await.is_err() {
            return 0;
        }
        rx.await.unwrap_or(0)
    }
}

/// The registry task.
pub struct Hub {
    rx: mpsc::Receiver<HubCommand>,
    registry: HashMap<ConnectionId, Outbox>,
    repo: Arc<dyn Repository>,
}

impl Hub {
    /// Create a hub and its handle. Nothing runs until [`Hub::run`].
    pub fn new(repo: Arc<dyn Repository>, capacity: usize) -> (Self, HubHandle) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let hub = Self {
            rx,
            registry: HashMap::new(),
            repo,
        };
        (hub, HubHandle { tx })
    }

    /// Process commands until every handle is dropped or `shutdown` fires.
    ///
    /// On exit every registered queue is closed.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!("hub started");
        loop {
            let command = tokio::select! {
                () = shutdown.cancelled() => break,
                command = self.rx.recv() => command,
            };
            let Some(command) = command else { break };
            match command {
                HubCommand::Admit(admission, reply) => {
                    let admitted = self.admit(admission).await;
                    let _ = reply.send(admitted);
                }
                HubCommand::Unregister(id) => {
                    let _ = self.unregister(&id);
                }
                HubCommand::Broadcast(message) => {
                    let _ = self.broadcast(&message);
                }
                HubCommand::ConnectionCount(reply) => {
                    let _ = reply.send(self.registry.len());
                }
            }
        }
        let remaining = self.registry.len();
        for outbox in self.registry.values_mut() {
            let _ = outbox.close();
        }
        self.registry.clear();
        info!(remaining, "hub stopped");
    }

    async fn admit(&mut self, admission: Admission) -> bool {
        let Admission {
            id,
            identity,
            mut outbox,
        } = admission;

        match Verdict::check(Arc::clone(&self.repo), identity.clone()).await {
            Verdict::Admitted => {
                debug!(conn_id = %id, identity = %identity, "connection admitted");
                if let Some(mut previous) = self.registry.insert(id, outbox) {
                    let _ = previous.close();
                }
                true
            }
            Verdict::Denied => {
                info!(conn_id = %id, identity = %identity, "connection denied: not a participant");
                let _ = outbox.close();
                false
            }
            Verdict::Failed(error) => {
                warn!(conn_id = %id, identity = %identity, %error, "participant check failed");
                let _ = outbox.close();
                false
            }
        }
    }

    fn unregister(&mut self, id: &ConnectionId) -> bool {
        match self.registry.remove(id) {
            Some(mut outbox) => {
                let _ = outbox.close();
                debug!(conn_id = %id, "connection unregistered");
                true
            }
            None => false,
        }
    }

    /// Offer `message` to everyone; evict any full or closed queue.
    fn broadcast(&mut self, message: &Arc<str>) -> usize {
        let mut evicted = Vec::new();
        for (id, outbox) in &self.registry {
            match outbox.offer(message) {
                Delivery::Queued => {}
                Delivery::Full => {
                    warn!(conn_id = %id, "outbound queue full, evicting");
                    evicted.push(id.clone());
                }
                Delivery::Closed => evicted.push(id.clone()),
            }
        }
        for id in &evicted {
            let _ = self.unregister(id);
        }
        debug!(
            recipients = self.registry.len(),
            evicted = evicted.len(),
            "broadcast"
        );
        evicted.len()
    }
}

/// Start `hub` on the runtime, returning its task handle.
pub fn spawn(hub: Hub, shutdown: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(hub.run(shutdown))
}
