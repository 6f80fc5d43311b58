//! # cnet-transport
//!
//! In-process message delivery for Contract Net agents.
//!
//! A [`Switchboard`] routes addressed [`Envelope`]s to per-address
//! [`Mailbox`]es. Payloads are opaque text; the transport never interprets
//! them. Receiving supports a deadline, which is the only suspension point
//! negotiation loops block on.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod envelope;
pub mod error;
pub mod switchboard;

pub use envelope::{Address, Envelope};
pub use error::TransportError;
pub use switchboard::{Mailbox, Switchboard, SwitchboardConfig};
