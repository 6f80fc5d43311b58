//! # cnet-proto
//!
//! Protocol definitions for Contract Net coordinator-provider communication.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod events;
pub mod messages;
pub mod types;

pub use error::ProtoError;
pub use events::{RoundEvent, RoundEventKind};
pub use messages::{CoordinatorMessage, ProviderMessage};
pub use types::{DeclineReason, Point, ProviderId, RoundId, Task};
