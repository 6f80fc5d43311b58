//! Negotiation round state machine.
//!
//! A [`NegotiationRound`] is single-use: it walks
//! `Init → Broadcasting → Collecting → Selecting → Awarded | Failed` and
//! cannot be restarted or re-entered after reaching a terminal phase. The
//! outcome only moves forward, and at most one award is produced per round.

use std::collections::{HashMap, HashSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cnet_proto::{DeclineReason, ProviderId, RoundEvent, RoundEventKind, RoundId, Task};

use crate::error::RoundError;

/// Phase of a negotiation round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhase {
    /// Round constructed; no messages sent yet.
    Init,
    /// CFPs are being sent to the roster.
    Broadcasting,
    /// Waiting for bids and declines under the deadline.
    Collecting,
    /// Choosing a winner from the accumulated bids.
    Selecting,
    /// Terminal: a winner was selected and notified.
    Awarded,
    /// Terminal: no bids were received.
    Failed,
}

impl RoundPhase {
    /// Whether this phase is terminal.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Awarded | Self::Failed)
    }
}

impl fmt::Display for RoundPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Init => "init",
            Self::Broadcasting => "broadcasting",
            Self::Collecting => "collecting",
            Self::Selecting => "selecting",
            Self::Awarded => "awarded",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// A provider's recorded answer to a CFP.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Response {
    /// A costed offer.
    Bid {
        /// Offered cost.
        cost: f64,
    },
    /// Explicit non-participation. Recorded for observability, excluded
    /// from selection.
    Declined {
        /// Why the provider declined.
        reason: DeclineReason,
    },
}

impl Response {
    /// Whether this response is a bid.
    #[must_use]
    pub const fn is_bid(&self) -> bool {
        matches!(self, Self::Bid { .. })
    }
}

/// Final outcome of a round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum RoundOutcome {
    /// The task was awarded.
    Awarded {
        /// Winning provider.
        winner: ProviderId,
        /// Winning cost.
        cost: f64,
    },
    /// No bids were received; nothing was awarded.
    Failed {
        /// How many declines were recorded.
        declines: usize,
    },
}

impl RoundOutcome {
    /// Whether the round produced an award.
    #[must_use]
    pub const fn is_awarded(&self) -> bool {
        matches!(self, Self::Awarded { .. })
    }
}

/// Select the minimum-cost bid.
///
/// Ties are broken by the lowest provider id in lexicographic order, so the
/// result is independent of response arrival order.
#[must_use]
pub fn select_winner(bids: &[(ProviderId, f64)]) -> Option<(ProviderId, f64)> {
    bids.iter()
        .min_by(|(a_id, a_cost), (b_id, b_cost)| {
            a_cost.total_cmp(b_cost).then_with(|| a_id.cmp(b_id))
        })
        .cloned()
}

/// Mutable aggregate for one negotiation round, owned by the coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegotiationRound {
    id: RoundId,
    task: Task,
    roster: Vec<ProviderId>,
    responses: HashMap<ProviderId, Response>,
    phase: RoundPhase,
    outcome: Option<RoundOutcome>,
    events: Vec<RoundEvent>,
    ignored: usize,
    started_at: DateTime<Utc>,
}

impl NegotiationRound {
    /// Create a new round for a task and an invited roster.
    ///
    /// Duplicate roster entries are collapsed; each provider is invited once.
    #[must_use]
    pub fn new(task: Task, roster: &[ProviderId]) -> Self {
        let mut seen = HashSet::new();
        let roster = roster
            .iter()
            .filter(|p| seen.insert((*p).clone()))
            .cloned()
            .collect();
        Self {
            id: task.round_id,
            task,
            roster,
            responses: HashMap::new(),
            phase: RoundPhase::Init,
            outcome: None,
            events: Vec::new(),
            ignored: 0,
            started_at: Utc::now(),
        }
    }

    /// Round identifier.
    #[must_use]
    pub const fn id(&self) -> RoundId {
        self.id
    }

    /// The task under negotiation.
    #[must_use]
    pub const fn task(&self) -> &Task {
        &self.task
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> RoundPhase {
        self.phase
    }

    /// Invited providers.
    #[must_use]
    pub fn roster(&self) -> &[ProviderId] {
        &self.roster
    }

    /// Final outcome, once a terminal phase is reached.
    #[must_use]
    pub const fn outcome(&self) -> Option<&RoundOutcome> {
        self.outcome.as_ref()
    }

    /// Structured event log for this round.
    #[must_use]
    pub fn events(&self) -> &[RoundEvent] {
        &self.events
    }

    /// When the round was created.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Number of recorded bids.
    #[must_use]
    pub fn bid_count(&self) -> usize {
        self.responses.values().filter(|r| r.is_bid()).count()
    }

    /// Number of recorded declines.
    #[must_use]
    pub fn decline_count(&self) -> usize {
        self.responses.values().filter(|r| !r.is_bid()).count()
    }

    /// Number of dropped messages (malformed, stale, or uninvited).
    #[must_use]
    pub const fn ignored_count(&self) -> usize {
        self.ignored
    }

    /// The recorded bids as (provider, cost) pairs.
    #[must_use]
    pub fn bids(&self) -> Vec<(ProviderId, f64)> {
        self.responses
            .iter()
            .filter_map(|(id, r)| match r {
                Response::Bid { cost } => Some((id.clone(), *cost)),
                Response::Declined { .. } => None,
            })
            .collect()
    }

    /// Whether every invited provider has a recorded response.
    #[must_use]
    pub fn all_responded(&self) -> bool {
        self.roster.iter().all(|p| self.responses.contains_key(p))
    }

    /// Record that a CFP was sent to a provider.
    pub fn note_cfp_sent(&mut self, provider: ProviderId) {
        self.record_event(RoundEventKind::CfpSent, Some(provider));
    }

    /// Record a failed CFP send; the provider counts as a non-responder.
    pub fn note_cfp_failed(&mut self, provider: ProviderId) {
        self.record_event(RoundEventKind::CfpSendFailed, Some(provider));
    }

    /// Record a dropped message.
    pub fn note_ignored(&mut self, provider: Option<ProviderId>) {
        self.ignored += 1;
        self.record_event(RoundEventKind::ResponseIgnored, provider);
    }

    /// Record a notification outcome event (accept/reject sent or failed).
    pub fn note_notify(&mut self, kind: RoundEventKind, provider: ProviderId) {
        self.record_event(kind, Some(provider));
    }

    /// `Init → Broadcasting`.
    ///
    /// # Errors
    ///
    /// Returns an error unless the round is in `Init`.
    pub fn begin_broadcast(&mut self) -> Result<(), RoundError> {
        self.transition(RoundPhase::Init, RoundPhase::Broadcasting)
    }

    /// `Broadcasting → Collecting`, unconditional once all sends are issued.
    ///
    /// # Errors
    ///
    /// Returns an error unless the round is in `Broadcasting`.
    pub fn finish_broadcast(&mut self) -> Result<(), RoundError> {
        self.transition(RoundPhase::Broadcasting, RoundPhase::Collecting)
    }

    /// Record a response from an invited provider.
    ///
    /// Upsert semantics: a later response from the same provider overwrites
    /// the earlier one — duplicates indicate retransmission, not a second
    /// offer.
    ///
    /// # Errors
    ///
    /// Returns an error if the round is not collecting or the provider is
    /// not on the roster.
    pub fn record_response(
        &mut self,
        provider: ProviderId,
        response: Response,
    ) -> Result<(), RoundError> {
        if self.phase != RoundPhase::Collecting {
            return Err(RoundError::NotCollecting { phase: self.phase });
        }
        if !self.roster.contains(&provider) {
            return Err(RoundError::UnknownProvider(provider));
        }

        let kind = if response.is_bid() {
            RoundEventKind::BidReceived
        } else {
            RoundEventKind::DeclineReceived
        };
        self.responses.insert(provider.clone(), response);
        self.record_event(kind, Some(provider));
        Ok(())
    }

    /// `Collecting → Selecting`. Partial response sets are valid input.
    ///
    /// # Errors
    ///
    /// Returns an error unless the round is in `Collecting`.
    pub fn begin_selection(&mut self) -> Result<(), RoundError> {
        self.transition(RoundPhase::Collecting, RoundPhase::Selecting)?;
        self.record_event(RoundEventKind::CollectionClosed, None);
        Ok(())
    }

    /// Select the winner and move to a terminal phase.
    ///
    /// An empty bid set (everyone declined or timed out) fails the round;
    /// otherwise the minimum-cost bid wins, ties broken by lowest provider
    /// id.
    ///
    /// # Errors
    ///
    /// Returns an error unless the round is in `Selecting`.
    pub fn select(&mut self) -> Result<RoundOutcome, RoundError> {
        if self.phase != RoundPhase::Selecting {
            return Err(RoundError::InvalidTransition { from: self.phase });
        }

        let outcome = match select_winner(&self.bids()) {
            Some((winner, cost)) => {
                self.phase = RoundPhase::Awarded;
                RoundOutcome::Awarded { winner, cost }
            }
            None => {
                self.phase = RoundPhase::Failed;
                RoundOutcome::Failed {
                    declines: self.decline_count(),
                }
            }
        };
        self.outcome = Some(outcome.clone());
        Ok(outcome)
    }

    fn transition(&mut self, from: RoundPhase, to: RoundPhase) -> Result<(), RoundError> {
        if self.phase != from {
            return Err(RoundError::InvalidTransition { from: self.phase });
        }
        self.phase = to;
        Ok(())
    }

    fn record_event(&mut self, kind: RoundEventKind, provider: Option<ProviderId>) {
        let mut event = RoundEvent::new(self.id, kind);
        if let Some(provider) = provider {
            event = event.with_provider(provider);
        }
        self.events.push(event);
    }
}
