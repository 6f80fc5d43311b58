//! Round lifecycle events.
//!
//! The coordinator records one event per observable protocol step. The
//! resulting log is the structured replacement for console output: an
//! external observer consumes it from the round report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ProviderId, RoundId};

/// Event types for the negotiation round lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundEventKind {
    /// A call-for-proposals was sent to a provider.
    CfpSent,
    /// A call-for-proposals send failed; the provider counts as a
    /// non-responder.
    CfpSendFailed,
    /// A bid was received and recorded.
    BidReceived,
    /// A decline was received and recorded.
    DeclineReceived,
    /// A message was dropped: malformed, invalid, stale round, or sender
    /// not on the roster.
    ResponseIgnored,
    /// Collection closed (deadline elapsed or all providers responded).
    CollectionClosed,
    /// The award was sent to the winning provider.
    AcceptSent,
    /// A rejection was sent to a losing bidder.
    RejectSent,
    /// An accept/reject send failed; the outcome stands.
    NotifyFailed,
    /// The winner confirmed the award.
    AwardConfirmed,
}

impl std::fmt::Display for RoundEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::CfpSent => "cfp_sent",
            Self::CfpSendFailed => "cfp_send_failed",
            Self::BidReceived => "bid_received",
            Self::DeclineReceived => "decline_received",
            Self::ResponseIgnored => "response_ignored",
            Self::CollectionClosed => "collection_closed",
            Self::AcceptSent => "accept_sent",
            Self::RejectSent => "reject_sent",
            Self::NotifyFailed => "notify_failed",
            Self::AwardConfirmed => "award_confirmed",
        };
        write!(f, "{s}")
    }
}

/// A single negotiation round event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoundEvent {
    /// The round this event belongs to.
    pub round_id: RoundId,
    /// The kind of event.
    pub kind: RoundEventKind,
    /// The provider involved, when the event concerns one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderId>,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
}

impl RoundEvent {
    /// Create a new event stamped with the current time.
    #[must_use]
    pub fn new(round_id: RoundId, kind: RoundEventKind) -> Self {
        Self {
            round_id,
            kind,
            provider: None,
            timestamp: Utc::now(),
        }
    }

    /// Attach the provider this event concerns.
    #[must_use]
    pub fn with_provider(mut self, provider: ProviderId) -> Self {
        self.provider = Some(provider);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_with_provider() {
        let round = RoundId::new();
        let event = RoundEvent::new(round, RoundEventKind::BidReceived)
            .with_provider(ProviderId::new("courier-a"));
        assert_eq!(event.round_id, round);
        assert_eq!(event.kind, RoundEventKind::BidReceived);
        assert_eq!(event.provider, Some(ProviderId::new("courier-a")));
    }

    #[test]
    fn event_serialization_roundtrip() {
        let event = RoundEvent::new(RoundId::new(), RoundEventKind::AcceptSent)
            .with_provider(ProviderId::new("courier-b"));
        let json = serde_json::to_string(&event).unwrap();
        let parsed: RoundEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, parsed);
    }

    #[test]
    fn event_kind_display() {
        assert_eq!(RoundEventKind::CfpSent.to_string(), "cfp_sent");
        assert_eq!(RoundEventKind::ResponseIgnored.to_string(), "response_ignored");
    }
}
