//! Provider state — cost model, availability, award handling.

use cnet_proto::{DeclineReason, Point, ProviderId, ProviderMessage, RoundId, Task};
use tracing::{debug, info};

/// Cost-model parameters for a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderProfile {
    /// Provider identity.
    pub id: ProviderId,
    /// Price per unit of Manhattan distance.
    pub unit_rate: f64,
    /// Current position on the grid.
    pub position: Point,
}

impl ProviderProfile {
    /// Create a new profile.
    #[must_use]
    pub const fn new(id: ProviderId, unit_rate: f64, position: Point) -> Self {
        Self {
            id,
            unit_rate,
            position,
        }
    }
}

/// Per-provider mutable record: profile plus availability.
///
/// Owned exclusively by its provider; the coordinator only ever reaches it
/// through messages.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderState {
    profile: ProviderProfile,
    available: bool,
}

impl ProviderState {
    /// Create a new, available provider.
    #[must_use]
    pub const fn new(profile: ProviderProfile) -> Self {
        Self {
            profile,
            available: true,
        }
    }

    /// Create a provider with explicit initial availability.
    #[must_use]
    pub const fn with_availability(profile: ProviderProfile, available: bool) -> Self {
        Self { profile, available }
    }

    /// Provider identity.
    #[must_use]
    pub const fn id(&self) -> &ProviderId {
        &self.profile.id
    }

    /// Current availability.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.available
    }

    /// Cost to perform a task from the current position:
    /// Manhattan distance times the unit rate.
    #[must_use]
    pub fn cost_for(&self, destination: &Point) -> f64 {
        self.profile.position.manhattan_distance(destination) as f64 * self.profile.unit_rate
    }

    /// Evaluate a task: a bid when available, a decline otherwise.
    ///
    /// Evaluation has no side effect — bidding reserves nothing.
    #[must_use]
    pub fn evaluate(&self, task: &Task) -> ProviderMessage {
        if !self.available {
            debug!(provider = %self.profile.id, round = %task.round_id, "declining, unavailable");
            return ProviderMessage::decline(
                task.round_id,
                self.profile.id.clone(),
                DeclineReason::Unavailable,
            );
        }

        let cost = self.cost_for(&task.destination);
        debug!(provider = %self.profile.id, round = %task.round_id, cost, "bidding");
        ProviderMessage::bid(task.round_id, self.profile.id.clone(), cost)
    }

    /// Apply an award: the provider becomes unavailable and acknowledges.
    ///
    /// Idempotent — an already-unavailable provider stays unavailable and
    /// still acknowledges. This is the only operation that mutates
    /// availability.
    pub fn on_award(&mut self, round_id: RoundId) -> ProviderMessage {
        if self.available {
            info!(provider = %self.profile.id, round = %round_id, "award accepted, now unavailable");
            self.available = false;
        } else {
            debug!(provider = %self.profile.id, round = %round_id, "award repeated, already unavailable");
        }
        ProviderMessage::award_ack(round_id, self.profile.id.clone())
    }

    /// Note a rejection. Purely informational; no state change.
    pub fn on_rejection(&self, round_id: RoundId) {
        debug!(provider = %self.profile.id, round = %round_id, "bid rejected");
    }

    /// External reset back to available, once an awarded task is done.
    pub fn reset_availability(&mut self) {
        self.available = true;
    }
}
