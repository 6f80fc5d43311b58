//! # cnet-provider
//!
//! Provider-side logic for Contract Net negotiation.
//!
//! This crate provides:
//!
//! - **Cost model** — [`ProviderProfile`] with unit rate and position
//! - **Availability state** — [`ProviderState`] for evaluating tasks and
//!   reacting to award/rejection notices
//! - **Agent loop** — [`ProviderAgent`] answering coordinator messages over
//!   a transport mailbox
//!
//! ## Example
//!
//! ```rust
//! use cnet_proto::{Point, ProviderId, ProviderMessage, RoundId, Task};
//! use cnet_provider::{ProviderProfile, ProviderState};
//!
//! let profile = ProviderProfile::new(ProviderId::new("courier-b"), 1.5, Point::new(5, 5));
//! let state = ProviderState::new(profile);
//!
//! let task = Task::new(RoundId::new(), Point::new(3, 4));
//! match state.evaluate(&task) {
//!     ProviderMessage::Bid { cost, .. } => assert!((cost - 4.5).abs() < f64::EPSILON),
//!     _ => unreachable!("available providers bid"),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod agent;
pub mod error;
pub mod state;

pub use agent::ProviderAgent;
pub use error::ProviderError;
pub use state::{ProviderProfile, ProviderState};
