//! Error types for cnet-coordinator.

use thiserror::Error;

use cnet_proto::ProviderId;

use crate::round::RoundPhase;

/// Errors from the round state machine.
///
/// These are programming-contract violations: a correctly driven round
/// never produces them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoundError {
    /// A transition was attempted from a phase that does not allow it.
    #[error("invalid round transition from {from}")]
    InvalidTransition {
        /// Phase the round was in when the transition was attempted.
        from: RoundPhase,
    },

    /// A response was recorded outside the collecting phase.
    #[error("round is not collecting responses (phase: {phase})")]
    NotCollecting {
        /// Phase the round was in.
        phase: RoundPhase,
    },

    /// A response arrived from a provider that was never invited.
    #[error("provider not on the roster: {0}")]
    UnknownProvider(ProviderId),
}

/// Errors from driving a negotiation round over the transport.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// The round state machine was misused.
    #[error("round error: {0}")]
    Round(#[from] RoundError),

    /// A protocol message failed to encode.
    #[error("protocol error: {0}")]
    Protocol(#[from] cnet_proto::ProtoError),
}
