//! Error types for cnet-provider.

use thiserror::Error;

/// Errors that can occur in provider operations.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Transport failure while sending a reply.
    #[error("transport error: {0}")]
    Transport(#[from] cnet_transport::TransportError),

    /// Protocol encode/decode failure.
    #[error("protocol error: {0}")]
    Protocol(#[from] cnet_proto::ProtoError),
}
