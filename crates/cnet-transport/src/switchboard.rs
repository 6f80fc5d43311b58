//! Switchboard routing and per-address mailboxes.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::debug;

use crate::envelope::{Address, Envelope};
use crate::error::TransportError;

/// Default per-mailbox buffer: enough for a full provider pool to respond
/// concurrently without blocking senders.
pub const DEFAULT_MAILBOX_CAPACITY: usize = 64;

/// Configuration for a switchboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchboardConfig {
    /// Buffered capacity of each attached mailbox.
    pub mailbox_capacity: usize,
}

impl SwitchboardConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
        }
    }

    /// Set the mailbox capacity.
    #[must_use]
    pub const fn with_mailbox_capacity(mut self, capacity: usize) -> Self {
        self.mailbox_capacity = capacity;
        self
    }
}

impl Default for SwitchboardConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Routes envelopes between attached mailboxes.
///
/// Cheap to clone; clones share the same route table.
#[derive(Debug, Clone)]
pub struct Switchboard {
    routes: Arc<RwLock<HashMap<Address, mpsc::Sender<Envelope>>>>,
    config: SwitchboardConfig,
}

impl Switchboard {
    /// Create a new switchboard with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(SwitchboardConfig::new())
    }

    /// Create a new switchboard with the given configuration.
    #[must_use]
    pub fn with_config(config: SwitchboardConfig) -> Self {
        Self {
            routes: Arc::new(RwLock::new(HashMap::new())),
            config,
        }
    }

    /// Attach a mailbox for an address, replacing any previous registration.
    #[must_use]
    pub fn attach(&self, address: Address) -> Mailbox {
        let (tx, rx) = mpsc::channel(self.config.mailbox_capacity);
        self.routes.write().insert(address.clone(), tx);
        debug!(address = %address, "mailbox attached");
        Mailbox { address, rx }
    }

    /// Remove the route for an address. Subsequent sends fail with
    /// [`TransportError::UnknownAddress`].
    pub fn detach(&self, address: &Address) {
        self.routes.write().remove(address);
        debug!(address = %address, "mailbox detached");
    }

    /// Deliver an envelope to its destination mailbox.
    ///
    /// # Errors
    ///
    /// Returns an error if no mailbox is attached for the destination or
    /// the destination mailbox has been dropped.
    pub async fn send(&self, envelope: Envelope) -> Result<(), TransportError> {
        let tx = self
            .routes
            .read()
            .get(&envelope.to)
            .cloned()
            .ok_or_else(|| TransportError::UnknownAddress(envelope.to.clone()))?;

        let to = envelope.to.clone();
        tx.send(envelope)
            .await
            .map_err(|_| TransportError::Closed(to))
    }
}

impl Default for Switchboard {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving end for one address.
#[derive(Debug)]
pub struct Mailbox {
    address: Address,
    rx: mpsc::Receiver<Envelope>,
}

impl Mailbox {
    /// The address this mailbox receives for.
    #[must_use]
    pub const fn address(&self) -> &Address {
        &self.address
    }

    /// Receive the next envelope, or `None` once all senders are gone.
    pub async fn recv(&mut self) -> Option<Envelope> {
        self.rx.recv().await
    }

    /// Receive the next envelope before a deadline.
    ///
    /// Returns `Ok(None)` when the channel is closed.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Timeout`] when the deadline elapses first.
    pub async fn recv_deadline(
        &mut self,
        deadline: Instant,
    ) -> Result<Option<Envelope>, TransportError> {
        tokio::time::timeout_at(deadline, self.rx.recv())
            .await
            .map_err(|_| TransportError::Timeout)
    }

    /// Receive the next envelope within a timeout.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Timeout`] when the timeout elapses first.
    pub async fn recv_timeout(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<Envelope>, TransportError> {
        self.recv_deadline(Instant::now() + timeout).await
    }
}
