//! Integration tests for the full negotiation flow.
//!
//! Each test wires real provider agents and a coordinator onto the
//! in-memory switchboard and runs complete rounds:
//! 1. CFP broadcast to the invited roster
//! 2. Concurrent bid/decline collection under the deadline
//! 3. Winner selection and accept/reject dispatch
//! 4. Award acknowledgment and availability bookkeeping

use std::time::Duration;

use cnet_coordinator::{Coordinator, CoordinatorConfig, RoundOutcome};
use cnet_proto::{Point, ProviderId, RoundEventKind};
use cnet_provider::{ProviderAgent, ProviderProfile, ProviderState};
use cnet_transport::{Address, Switchboard};
use tokio::task::JoinHandle;

// ============================================================================
// Helper Functions
// ============================================================================

const COLLECT_WINDOW: Duration = Duration::from_secs(3);

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn spawn_provider(
    board: &Switchboard,
    id: &str,
    rate: f64,
    position: Point,
    available: bool,
) -> JoinHandle<ProviderState> {
    let profile = ProviderProfile::new(ProviderId::new(id), rate, position);
    let state = ProviderState::with_availability(profile, available);
    ProviderAgent::attach(state, board).spawn()
}

fn coordinator_on(board: &Switchboard) -> Coordinator {
    Coordinator::attach(
        Address::new("coordinator"),
        board,
        CoordinatorConfig::new().with_collect_window(COLLECT_WINDOW),
    )
}

async fn shutdown(
    board: &Switchboard,
    handles: Vec<(&str, JoinHandle<ProviderState>)>,
) -> Vec<(String, ProviderState)> {
    let mut states = Vec::new();
    for (id, handle) in handles {
        board.detach(&Address::new(id));
        states.push((id.to_string(), handle.await.unwrap()));
    }
    states
}

fn event_count(report: &cnet_coordinator::RoundReport, kind: RoundEventKind) -> usize {
    report.events.iter().filter(|e| e.kind == kind).count()
}

fn event_providers(
    report: &cnet_coordinator::RoundReport,
    kind: RoundEventKind,
) -> Vec<ProviderId> {
    report
        .events
        .iter()
        .filter(|e| e.kind == kind)
        .filter_map(|e| e.provider.clone())
        .collect()
}

// ============================================================================
// Delivery scenario: mixed pool, lowest bid wins
// ============================================================================

#[tokio::test(start_paused = true)]
async fn lowest_bidder_wins_mixed_pool() {
    init_tracing();
    let board = Switchboard::new();

    // courier-a: rate 2.0 from (0,0) -> cost 14.0 to (3,4)
    // courier-b: rate 1.5 from (5,5) -> cost 4.5 to (3,4)
    // courier-c: rate 1.0 from (10,0), unavailable -> declines
    let a = spawn_provider(&board, "courier-a", 2.0, Point::new(0, 0), true);
    let b = spawn_provider(&board, "courier-b", 1.5, Point::new(5, 5), true);
    let c = spawn_provider(&board, "courier-c", 1.0, Point::new(10, 0), false);

    let mut coordinator = coordinator_on(&board);
    let roster = [
        ProviderId::new("courier-a"),
        ProviderId::new("courier-b"),
        ProviderId::new("courier-c"),
    ];

    let report = coordinator
        .run_round(Point::new(3, 4), &roster)
        .await
        .unwrap();

    assert_eq!(
        report.outcome,
        RoundOutcome::Awarded {
            winner: ProviderId::new("courier-b"),
            cost: 4.5
        }
    );
    assert_eq!(report.bids, 2);
    assert_eq!(report.declines, 1);

    // Exactly one accept, one reject to the losing bidder, and nothing
    // further to the decliner.
    assert_eq!(
        event_providers(&report, RoundEventKind::AcceptSent),
        vec![ProviderId::new("courier-b")]
    );
    assert_eq!(
        event_providers(&report, RoundEventKind::RejectSent),
        vec![ProviderId::new("courier-a")]
    );
    let c_id = ProviderId::new("courier-c");
    assert!(report
        .events
        .iter()
        .all(|e| e.provider != Some(c_id.clone())
            || matches!(
                e.kind,
                RoundEventKind::CfpSent | RoundEventKind::DeclineReceived
            )));

    // The winner confirmed the award.
    assert_eq!(event_count(&report, RoundEventKind::AwardConfirmed), 1);

    // Availability: the winner is now booked, the loser is not, the
    // decliner never changed.
    let states = shutdown(&board, vec![("courier-a", a), ("courier-b", b), ("courier-c", c)])
        .await;
    for (id, state) in &states {
        match id.as_str() {
            "courier-a" => assert!(state.is_available()),
            "courier-b" => assert!(!state.is_available()),
            "courier-c" => assert!(!state.is_available()),
            other => panic!("unexpected provider {other}"),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn winner_cost_is_minimal_across_bidders() {
    init_tracing();
    let board = Switchboard::new();

    let handles = vec![
        ("p-north", spawn_provider(&board, "p-north", 1.0, Point::new(0, 9), true)),
        ("p-east", spawn_provider(&board, "p-east", 2.0, Point::new(6, 0), true)),
        ("p-west", spawn_provider(&board, "p-west", 0.5, Point::new(-4, 0), true)),
    ];

    let mut coordinator = coordinator_on(&board);
    let roster = [
        ProviderId::new("p-north"),
        ProviderId::new("p-east"),
        ProviderId::new("p-west"),
    ];

    let report = coordinator
        .run_round(Point::new(0, 0), &roster)
        .await
        .unwrap();

    // p-north: 9.0, p-east: 12.0, p-west: 2.0
    assert_eq!(
        report.outcome,
        RoundOutcome::Awarded {
            winner: ProviderId::new("p-west"),
            cost: 2.0
        }
    );
    assert_eq!(event_count(&report, RoundEventKind::AcceptSent), 1);
    assert_eq!(event_count(&report, RoundEventKind::RejectSent), 2);

    let _ = shutdown(&board, handles).await;
}

#[tokio::test(start_paused = true)]
async fn equal_costs_award_lowest_provider_id() {
    init_tracing();
    let board = Switchboard::new();

    // Same rate, mirrored positions: both cost 10.0 to the destination.
    let handles = vec![
        ("courier-b", spawn_provider(&board, "courier-b", 1.0, Point::new(10, 0), true)),
        ("courier-a", spawn_provider(&board, "courier-a", 1.0, Point::new(0, 10), true)),
    ];

    let mut coordinator = coordinator_on(&board);
    let roster = [ProviderId::new("courier-b"), ProviderId::new("courier-a")];

    let report = coordinator
        .run_round(Point::new(0, 0), &roster)
        .await
        .unwrap();

    assert_eq!(
        report.outcome,
        RoundOutcome::Awarded {
            winner: ProviderId::new("courier-a"),
            cost: 10.0
        }
    );

    let _ = shutdown(&board, handles).await;
}

// ============================================================================
// Failed rounds
// ============================================================================

#[tokio::test(start_paused = true)]
async fn all_unavailable_pool_fails_round() {
    init_tracing();
    let board = Switchboard::new();

    let handles = vec![
        ("courier-a", spawn_provider(&board, "courier-a", 2.0, Point::new(0, 0), false)),
        ("courier-b", spawn_provider(&board, "courier-b", 1.5, Point::new(5, 5), false)),
        ("courier-c", spawn_provider(&board, "courier-c", 1.0, Point::new(10, 0), false)),
    ];

    let mut coordinator = coordinator_on(&board);
    let roster = [
        ProviderId::new("courier-a"),
        ProviderId::new("courier-b"),
        ProviderId::new("courier-c"),
    ];

    let report = coordinator
        .run_round(Point::new(3, 4), &roster)
        .await
        .unwrap();

    assert_eq!(report.outcome, RoundOutcome::Failed { declines: 3 });
    assert!(!report.outcome.is_awarded());
    assert_eq!(report.bids, 0);

    // Zero accepts or rejects were dispatched.
    assert_eq!(event_count(&report, RoundEventKind::AcceptSent), 0);
    assert_eq!(event_count(&report, RoundEventKind::RejectSent), 0);

    // No provider was left booked without an award.
    let states = shutdown(&board, handles).await;
    for (_, state) in &states {
        assert!(!state.is_available(), "pool started unavailable");
    }
}

#[tokio::test(start_paused = true)]
async fn silent_pool_fails_round_at_deadline() {
    init_tracing();
    let board = Switchboard::new();

    // Nobody is attached: every CFP send fails and nobody ever answers.
    let mut coordinator = coordinator_on(&board);
    let roster = [ProviderId::new("courier-a"), ProviderId::new("courier-b")];

    let report = coordinator
        .run_round(Point::new(3, 4), &roster)
        .await
        .unwrap();

    assert_eq!(report.outcome, RoundOutcome::Failed { declines: 0 });
    assert_eq!(event_count(&report, RoundEventKind::CfpSendFailed), 2);
    assert_eq!(event_count(&report, RoundEventKind::AcceptSent), 0);
}

// ============================================================================
// Successive rounds on one coordinator
// ============================================================================

#[tokio::test(start_paused = true)]
async fn winner_of_first_round_declines_second() {
    init_tracing();
    let board = Switchboard::new();

    let handles = vec![
        ("courier-a", spawn_provider(&board, "courier-a", 2.0, Point::new(0, 0), true)),
        ("courier-b", spawn_provider(&board, "courier-b", 1.5, Point::new(5, 5), true)),
    ];

    let mut coordinator = coordinator_on(&board);
    let roster = [ProviderId::new("courier-a"), ProviderId::new("courier-b")];

    let first = coordinator
        .run_round(Point::new(3, 4), &roster)
        .await
        .unwrap();
    assert_eq!(
        first.outcome,
        RoundOutcome::Awarded {
            winner: ProviderId::new("courier-b"),
            cost: 4.5
        }
    );

    // The booked winner declines the next round, so the other provider
    // wins it.
    let second = coordinator
        .run_round(Point::new(3, 4), &roster)
        .await
        .unwrap();
    assert_eq!(
        second.outcome,
        RoundOutcome::Awarded {
            winner: ProviderId::new("courier-a"),
            cost: 14.0
        }
    );
    assert_eq!(second.declines, 1);

    let _ = shutdown(&board, handles).await;
}
