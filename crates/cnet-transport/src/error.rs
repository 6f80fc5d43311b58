//! Error types for the cnet-transport crate.

use thiserror::Error;

use crate::envelope::Address;

/// Errors that can occur during transport operations.
///
/// Send failures are transient from the protocol's point of view: callers
/// log them and treat the peer as a non-responder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// No mailbox is attached for the destination address.
    #[error("unknown address: {0}")]
    UnknownAddress(Address),

    /// The destination mailbox has been dropped.
    #[error("mailbox closed: {0}")]
    Closed(Address),

    /// No message arrived before the deadline.
    #[error("receive timed out")]
    Timeout,
}
