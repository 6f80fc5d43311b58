//! Async coordinator driving one negotiation round at a time.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use cnet_proto::{
    CoordinatorMessage, Point, ProviderId, ProviderMessage, RoundEvent, RoundEventKind, RoundId,
};
use cnet_transport::{Address, Envelope, Mailbox, Switchboard};

use crate::error::CoordinatorError;
use crate::round::{NegotiationRound, Response, RoundOutcome};

/// Default collection window.
pub const DEFAULT_COLLECT_WINDOW: Duration = Duration::from_secs(3);

/// Default wait for the winner's award acknowledgment.
pub const DEFAULT_ACK_WINDOW: Duration = Duration::from_millis(500);

/// Configuration for a coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// How long to collect responses after broadcasting.
    pub collect_window: Duration,
    /// Optional pause between broadcast and collection, absorbing immediate
    /// declines. Zero by default.
    pub settle_delay: Duration,
    /// Close collection early once every invited provider has responded.
    pub close_on_full_response: bool,
    /// How long to wait for the winner's award acknowledgment. The ack is
    /// optional; silence is not an error.
    pub ack_window: Duration,
}

impl CoordinatorConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            collect_window: DEFAULT_COLLECT_WINDOW,
            settle_delay: Duration::ZERO,
            close_on_full_response: true,
            ack_window: DEFAULT_ACK_WINDOW,
        }
    }

    /// Set the collection window.
    #[must_use]
    pub const fn with_collect_window(mut self, window: Duration) -> Self {
        self.collect_window = window;
        self
    }

    /// Set the settle delay.
    #[must_use]
    pub const fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Enable or disable early close on full response.
    #[must_use]
    pub const fn with_close_on_full_response(mut self, close: bool) -> Self {
        self.close_on_full_response = close;
        self
    }

    /// Set the award acknowledgment window.
    #[must_use]
    pub const fn with_ack_window(mut self, window: Duration) -> Self {
        self.ack_window = window;
        self
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Structured result of one negotiation round, for external observers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundReport {
    /// The round.
    pub round_id: RoundId,
    /// Final outcome. A failed round reports zero awards.
    pub outcome: RoundOutcome,
    /// Bids received (after duplicate collapsing).
    pub bids: usize,
    /// Declines received.
    pub declines: usize,
    /// Messages dropped (malformed, stale round, or uninvited sender).
    pub ignored: usize,
    /// Event log for the round.
    pub events: Vec<RoundEvent>,
    /// When the round reached its terminal phase.
    pub closed_at: DateTime<Utc>,
}

/// Drives Contract Net rounds over a switchboard, one at a time.
#[derive(Debug)]
pub struct Coordinator {
    address: Address,
    mailbox: Mailbox,
    switchboard: Switchboard,
    config: CoordinatorConfig,
}

impl Coordinator {
    /// Attach a coordinator to a switchboard under the given address.
    #[must_use]
    pub fn attach(
        address: Address,
        switchboard: &Switchboard,
        config: CoordinatorConfig,
    ) -> Self {
        let mailbox = switchboard.attach(address.clone());
        Self {
            address,
            mailbox,
            switchboard: switchboard.clone(),
            config,
        }
    }

    /// The coordinator's transport address.
    #[must_use]
    pub const fn address(&self) -> &Address {
        &self.address
    }

    /// Run one complete negotiation round: broadcast the task, collect
    /// responses until the deadline, select a winner, and notify bidders.
    ///
    /// Transport failures never abort the round — an unreachable provider is
    /// a non-responder. Award and reject dispatch happens only after
    /// collection has closed.
    ///
    /// # Errors
    ///
    /// Returns an error on state machine misuse or message encoding failure;
    /// neither occurs in normal operation.
    pub async fn run_round(
        &mut self,
        destination: Point,
        roster: &[ProviderId],
    ) -> Result<RoundReport, CoordinatorError> {
        let round_id = RoundId::new();
        let task = cnet_proto::Task::new(round_id, destination);
        let mut round = NegotiationRound::new(task, roster);

        info!(round = %round_id, destination = %destination, invited = round.roster().len(),
              "starting negotiation round");

        self.broadcast(&mut round).await?;

        if !self.config.settle_delay.is_zero() {
            tokio::time::sleep(self.config.settle_delay).await;
        }

        self.collect(&mut round).await;

        round.begin_selection()?;
        let outcome = round.select()?;

        match &outcome {
            RoundOutcome::Awarded { winner, cost } => {
                info!(round = %round_id, winner = %winner, cost, "task awarded");
                let winner = winner.clone();
                self.notify_bidders(&mut round, &winner).await?;
                self.await_award_ack(&mut round, &winner).await;
            }
            RoundOutcome::Failed { declines } => {
                info!(round = %round_id, declines, "round failed, no bids received");
            }
        }

        Ok(RoundReport {
            round_id,
            outcome,
            bids: round.bid_count(),
            declines: round.decline_count(),
            ignored: round.ignored_count(),
            events: round.events().to_vec(),
            closed_at: Utc::now(),
        })
    }

    /// Send one CFP per invited provider. Send failures are logged and the
    /// provider becomes an implicit non-responder.
    async fn broadcast(&self, round: &mut NegotiationRound) -> Result<(), CoordinatorError> {
        round.begin_broadcast()?;

        let cfp = CoordinatorMessage::cfp(round.id(), round.task().destination);
        let payload = cfp.to_json()?;

        for provider in round.roster().to_vec() {
            let envelope = Envelope::new(
                self.address.clone(),
                Address::new(provider.as_str()),
                payload.clone(),
            );
            match self.switchboard.send(envelope).await {
                Ok(()) => {
                    debug!(round = %round.id(), provider = %provider, "cfp sent");
                    round.note_cfp_sent(provider);
                }
                Err(e) => {
                    warn!(round = %round.id(), provider = %provider, error = %e,
                          "cfp send failed, treating provider as non-responder");
                    round.note_cfp_failed(provider);
                }
            }
        }

        round.finish_broadcast()?;
        Ok(())
    }

    /// Accumulate responses until the deadline, or until every invited
    /// provider has answered when early close is enabled.
    async fn collect(&mut self, round: &mut NegotiationRound) {
        let deadline = Instant::now() + self.config.collect_window;

        loop {
            if self.config.close_on_full_response && round.all_responded() {
                debug!(round = %round.id(), "all providers responded, closing collection early");
                break;
            }

            match self.mailbox.recv_deadline(deadline).await {
                Ok(Some(envelope)) => self.accumulate(round, &envelope),
                Ok(None) => {
                    warn!(round = %round.id(), "transport closed during collection");
                    break;
                }
                Err(_) => {
                    debug!(round = %round.id(), "collection deadline elapsed");
                    break;
                }
            }
        }
    }

    /// Record one received envelope into the round, dropping anything
    /// malformed, stale, or uninvited.
    fn accumulate(&self, round: &mut NegotiationRound, envelope: &Envelope) {
        let msg = match ProviderMessage::decode(&envelope.payload) {
            Ok(msg) => msg,
            Err(e) => {
                warn!(round = %round.id(), from = %envelope.from, error = %e,
                      "ignoring undecodable response");
                round.note_ignored(None);
                return;
            }
        };

        let provider = msg.provider_id().clone();

        // Round isolation: responses tagged with a stale or foreign round id
        // never enter the active round's accumulation.
        if msg.round_id() != round.id() {
            debug!(round = %round.id(), stale = %msg.round_id(), provider = %provider,
                   "ignoring response for another round");
            round.note_ignored(Some(provider));
            return;
        }

        let response = match msg {
            ProviderMessage::Bid { cost, .. } => Response::Bid { cost },
            ProviderMessage::Decline { reason, .. } => Response::Declined { reason },
            ProviderMessage::AwardAck { .. } => {
                debug!(round = %round.id(), provider = %provider,
                       "ignoring award ack during collection");
                round.note_ignored(Some(provider));
                return;
            }
        };

        if let Err(e) = round.record_response(provider.clone(), response) {
            warn!(round = %round.id(), provider = %provider, error = %e,
                  "ignoring unrecordable response");
            round.note_ignored(Some(provider));
        }
    }

    /// Send `Accept` to the winner and `Reject` to every other bidder.
    /// Providers who declined receive nothing further.
    async fn notify_bidders(
        &self,
        round: &mut NegotiationRound,
        winner: &ProviderId,
    ) -> Result<(), CoordinatorError> {
        let accept = CoordinatorMessage::accept(round.id()).to_json()?;
        self.notify(round, winner.clone(), accept, RoundEventKind::AcceptSent)
            .await;

        let reject = CoordinatorMessage::reject(round.id()).to_json()?;
        let mut losers: Vec<ProviderId> = round
            .bids()
            .into_iter()
            .map(|(id, _)| id)
            .filter(|id| id != winner)
            .collect();
        losers.sort();

        for loser in losers {
            self.notify(round, loser, reject.clone(), RoundEventKind::RejectSent)
                .await;
        }
        Ok(())
    }

    async fn notify(
        &self,
        round: &mut NegotiationRound,
        provider: ProviderId,
        payload: String,
        sent_kind: RoundEventKind,
    ) {
        let envelope = Envelope::new(
            self.address.clone(),
            Address::new(provider.as_str()),
            payload,
        );
        match self.switchboard.send(envelope).await {
            Ok(()) => round.note_notify(sent_kind, provider),
            Err(e) => {
                warn!(round = %round.id(), provider = %provider, error = %e,
                      "notification send failed, outcome stands");
                round.note_notify(RoundEventKind::NotifyFailed, provider);
            }
        }
    }

    /// Wait briefly for the winner's acknowledgment. Absence is not an
    /// error; anything else arriving in the window is dropped as stale.
    async fn await_award_ack(&mut self, round: &mut NegotiationRound, winner: &ProviderId) {
        let deadline = Instant::now() + self.config.ack_window;

        loop {
            match self.mailbox.recv_deadline(deadline).await {
                Ok(Some(envelope)) => {
                    if let Ok(ProviderMessage::AwardAck {
                        round_id,
                        provider_id,
                    }) = ProviderMessage::decode(&envelope.payload)
                    {
                        if round_id == round.id() && provider_id == *winner {
                            debug!(round = %round.id(), winner = %winner, "award confirmed");
                            round.note_notify(RoundEventKind::AwardConfirmed, provider_id);
                            return;
                        }
                    }
                    round.note_ignored(None);
                }
                Ok(None) | Err(_) => return,
            }
        }
    }
}
