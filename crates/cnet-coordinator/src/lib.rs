//! # cnet-coordinator
//!
//! Coordinator-side logic for Contract Net negotiation.
//!
//! This crate provides:
//!
//! - **Round state machine** — [`NegotiationRound`] walking
//!   `Init → Broadcasting → Collecting → Selecting → Awarded | Failed`
//! - **Winner selection** — [`select_winner`] for minimum-cost selection with
//!   deterministic lexicographic tie-breaking
//! - **Async coordinator** — [`Coordinator`] driving CFP broadcast, bid
//!   collection under a deadline, and accept/reject dispatch over a transport
//!
//! ## Example
//!
//! ```rust
//! use cnet_coordinator::{NegotiationRound, Response, RoundOutcome};
//! use cnet_proto::{Point, ProviderId, RoundId, Task};
//!
//! let task = Task::new(RoundId::new(), Point::new(3, 4));
//! let roster = [ProviderId::new("courier-a"), ProviderId::new("courier-b")];
//! let mut round = NegotiationRound::new(task, &roster);
//!
//! round.begin_broadcast().unwrap();
//! round.finish_broadcast().unwrap();
//! round.record_response(ProviderId::new("courier-a"), Response::Bid { cost: 14.0 }).unwrap();
//! round.record_response(ProviderId::new("courier-b"), Response::Bid { cost: 4.5 }).unwrap();
//! round.begin_selection().unwrap();
//!
//! match round.select().unwrap() {
//!     RoundOutcome::Awarded { winner, cost } => {
//!         assert_eq!(winner, ProviderId::new("courier-b"));
//!         assert!((cost - 4.5).abs() < f64::EPSILON);
//!     }
//!     RoundOutcome::Failed { .. } => unreachable!("bids were recorded"),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod coordinator;
pub mod error;
pub mod round;

pub use coordinator::{Coordinator, CoordinatorConfig, RoundReport};
pub use error::{CoordinatorError, RoundError};
pub use round::{select_winner, NegotiationRound, Response, RoundOutcome, RoundPhase};
