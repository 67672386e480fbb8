use std::time::Duration;

use crate::testing::{make_test_matchmaker, test_endpoint};
use crate::{CacheEntry, MatchmakeStatus, UserAssignment};

#[tokio::test]
async fn packer_forms_a_match_from_the_queue_head() {
    let (server, allocator) = make_test_matchmaker();
    for user in ["5", "1", "2"] {
        server.matchmake(user);
    }

    server.pack_lobby().await;
    assert_eq!(allocator.calls(), 1);
    assert_eq!(server.queue_snapshot(), vec!["2"]);

    // The first two players share one match record.
    let Some(CacheEntry::Assignment(UserAssignment::Match(match_key))) =
        server.cache().get("user|5")
    else {
        panic!("user 5 has no match assignment");
    };
    assert_eq!(
        server.cache().get("user|1"),
        Some(CacheEntry::Assignment(UserAssignment::Match(
            match_key.clone()
        )))
    );
    let Some(CacheEntry::Match(data)) = server.cache().get(&match_key) else {
        panic!("match record missing");
    };
    assert_eq!(data.ip, test_endpoint().ip);
    assert_eq!(data.port, test_endpoint().port);
    assert_eq!(
        data.players
            .iter()
            .map(|player| player.user_id.as_str())
            .collect::<Vec<_>>(),
        vec!["5", "1"]
    );

    // First ready poll hands the endpoint over and forgets the user.
    let status = server.check_status("5");
    assert_eq!(
        status,
        MatchmakeStatus {
            ready: true,
            ip: Some(test_endpoint().ip),
            port: Some(test_endpoint().port),
            not_matchmaked: false,
            failed: false,
        }
    );
    assert!(!server.is_waiting("5"));
    assert_eq!(
        server.check_status("5"),
        MatchmakeStatus {
            not_matchmaked: true,
            ..MatchmakeStatus::default()
        }
    );

    // The lobby partner polls independently.
    assert!(server.check_status("1").ready);
    // The leftover player is still pending.
    assert_eq!(server.check_status("2"), MatchmakeStatus::default());
}

#[tokio::test]
async fn packer_waits_for_a_full_lobby() {
    let (server, allocator) = make_test_matchmaker();
    server.matchmake("5");
    server.pack_lobby().await;
    assert_eq!(allocator.calls(), 0);
    assert_eq!(server.queue_snapshot(), vec!["5"]);
}

#[tokio::test]
async fn allocator_failure_leaves_a_failure_marker() {
    let (server, allocator) = make_test_matchmaker();
    allocator.push_failure();
    for user in ["5", "1", "2"] {
        server.matchmake(user);
    }

    server.pack_lobby().await;
    // The lobby is still consumed; its members learn about the failure.
    assert_eq!(server.queue_snapshot(), vec!["2"]);
    assert_eq!(
        server.cache().get("user|5"),
        Some(CacheEntry::Assignment(UserAssignment::NoMatchHappened))
    );
    let status = server.check_status("5");
    assert_eq!(
        status,
        MatchmakeStatus {
            failed: true,
            ..MatchmakeStatus::default()
        }
    );
    // A failed user is not forgotten until the record expires.
    assert!(server.is_waiting("5"));
}

#[tokio::test(start_paused = true)]
async fn match_records_expire() {
    let (server, _allocator) = make_test_matchmaker();
    server.matchmake("5");
    server.matchmake("1");
    server.pack_lobby().await;

    // Ten minutes of nobody polling: the records evaporate and the poll
    // falls back to pending.
    tokio::time::advance(Duration::from_secs(601)).await;
    assert_eq!(server.check_status("5"), MatchmakeStatus::default());
}

#[tokio::test(start_paused = true)]
async fn periodic_packer_runs_on_its_interval() {
    let (server, allocator) = make_test_matchmaker();
    server.matchmake("5");
    server.matchmake("1");

    let guard = server.spawn_packer();
    tokio::time::advance(Duration::from_secs(3)).await;
    tokio::task::yield_now().await;
    assert!(allocator.calls() >= 1);
    assert!(server.check_status("5").ready);

    drop(guard);
    tokio::task::yield_now().await;
    let calls = allocator.calls();
    tokio::time::advance(Duration::from_secs(10)).await;
    tokio::task::yield_now().await;
    assert_eq!(allocator.calls(), calls);
}
