//! Addressed message envelopes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A transport address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Create an address from a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An addressed message.
///
/// The payload is the JSON text of a protocol message; decoding happens at
/// the receiving agent, never in the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Sender address.
    pub from: Address,
    /// Destination address.
    pub to: Address,
    /// Opaque message payload.
    pub payload: String,
}

impl Envelope {
    /// Create a new envelope.
    #[must_use]
    pub fn new(from: Address, to: Address, payload: impl Into<String>) -> Self {
        Self {
            from,
            to,
            payload: payload.into(),
        }
    }
}
