//! Protocol message definitions.
//!
//! Both directions of the Contract Net exchange are tagged JSON enums.
//! Decoding is strict: any payload that does not match one of the expected
//! shapes is a [`ProtoError::Decoding`], never evaluated some other way.

use serde::{Deserialize, Serialize};

use crate::error::ProtoError;
use crate::types::{DeclineReason, Point, ProviderId, RoundId};

/// Messages sent from coordinator to provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CoordinatorMessage {
    /// Call-for-proposals: announce a task for the given round.
    Cfp {
        /// Round ID.
        round_id: RoundId,
        /// Delivery destination.
        destination: Point,
    },
    /// Award the round to the receiving provider.
    Accept {
        /// Round ID.
        round_id: RoundId,
    },
    /// Inform the receiving provider its bid lost.
    Reject {
        /// Round ID.
        round_id: RoundId,
    },
}

impl CoordinatorMessage {
    /// Create a call-for-proposals message.
    #[must_use]
    pub const fn cfp(round_id: RoundId, destination: Point) -> Self {
        Self::Cfp {
            round_id,
            destination,
        }
    }

    /// Create an accept message.
    #[must_use]
    pub const fn accept(round_id: RoundId) -> Self {
        Self::Accept { round_id }
    }

    /// Create a reject message.
    #[must_use]
    pub const fn reject(round_id: RoundId) -> Self {
        Self::Reject { round_id }
    }

    /// The round this message belongs to.
    #[must_use]
    pub const fn round_id(&self) -> RoundId {
        match self {
            Self::Cfp { round_id, .. } | Self::Accept { round_id } | Self::Reject { round_id } => {
                *round_id
            }
        }
    }

    /// Serialize to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, ProtoError> {
        serde_json::to_string(self).map_err(|e| ProtoError::Encoding(e.to_string()))
    }

    /// Deserialize from JSON, failing closed on any unexpected shape.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn from_json(json: &str) -> Result<Self, ProtoError> {
        serde_json::from_str(json).map_err(|e| ProtoError::Decoding(e.to_string()))
    }
}

/// Messages sent from provider to coordinator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderMessage {
    /// A costed offer to perform the round's task.
    Bid {
        /// Round ID.
        round_id: RoundId,
        /// Bidding provider.
        provider_id: ProviderId,
        /// Offered cost. Must be finite and non-negative.
        cost: f64,
    },
    /// Explicit non-participation for the round.
    Decline {
        /// Round ID.
        round_id: RoundId,
        /// Declining provider.
        provider_id: ProviderId,
        /// Why the provider declined.
        reason: DeclineReason,
    },
    /// Confirmation that an award was applied.
    AwardAck {
        /// Round ID.
        round_id: RoundId,
        /// Acknowledging provider.
        provider_id: ProviderId,
    },
}

impl ProviderMessage {
    /// Create a bid message.
    #[must_use]
    pub const fn bid(round_id: RoundId, provider_id: ProviderId, cost: f64) -> Self {
        Self::Bid {
            round_id,
            provider_id,
            cost,
        }
    }

    /// Create a decline message.
    #[must_use]
    pub const fn decline(
        round_id: RoundId,
        provider_id: ProviderId,
        reason: DeclineReason,
    ) -> Self {
        Self::Decline {
            round_id,
            provider_id,
            reason,
        }
    }

    /// Create an award acknowledgment.
    #[must_use]
    pub const fn award_ack(round_id: RoundId, provider_id: ProviderId) -> Self {
        Self::AwardAck {
            round_id,
            provider_id,
        }
    }

    /// The round this message belongs to.
    #[must_use]
    pub const fn round_id(&self) -> RoundId {
        match self {
            Self::Bid { round_id, .. }
            | Self::Decline { round_id, .. }
            | Self::AwardAck { round_id, .. } => *round_id,
        }
    }

    /// The provider that sent this message.
    #[must_use]
    pub const fn provider_id(&self) -> &ProviderId {
        match self {
            Self::Bid { provider_id, .. }
            | Self::Decline { provider_id, .. }
            | Self::AwardAck { provider_id, .. } => provider_id,
        }
    }

    /// Validate semantic constraints that the serde shape cannot express.
    ///
    /// # Errors
    ///
    /// Returns an error if a bid cost is non-finite or negative.
    pub fn validate(&self) -> Result<(), ProtoError> {
        if let Self::Bid { cost, .. } = self {
            if !cost.is_finite() {
                return Err(ProtoError::Validation(format!(
                    "bid cost must be finite, got {cost}"
                )));
            }
            if *cost < 0.0 {
                return Err(ProtoError::Validation(format!(
                    "bid cost must be non-negative, got {cost}"
                )));
            }
        }
        Ok(())
    }

    /// Serialize to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, ProtoError> {
        serde_json::to_string(self).map_err(|e| ProtoError::Encoding(e.to_string()))
    }

    /// Deserialize from JSON, failing closed on any unexpected shape.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn from_json(json: &str) -> Result<Self, ProtoError> {
        serde_json::from_str(json).map_err(|e| ProtoError::Decoding(e.to_string()))
    }

    /// Deserialize and validate in one step. This is the entry point the
    /// coordinator uses for anything arriving off the wire.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload does not decode or does not validate.
    pub fn decode(json: &str) -> Result<Self, ProtoError> {
        let msg = Self::from_json(json)?;
        msg.validate()?;
        Ok(msg)
    }
}
