//! Integration tests for the server facade: the full match flow driven by
//! `tick_once`, ended-world policies, temporary worlds, and commands.

use std::time::Duration;

use sortie::{
    Command, CommandError, EndedWorldPolicy, ExtractionServer, Feedback, MatchConfig, MatchError,
    MatchState, MemoryHost, Notice, PlayerId, ProvisionError, ServerConfig, SortieError, WorldHost,
    WorldKey,
};

// =========================================================================
// Helpers
// =========================================================================

/// 1 second warmup, 10 second match, 2 second extraction at 20 TPS.
fn short_config(ended_worlds: EndedWorldPolicy) -> ServerConfig {
    ServerConfig {
        matches: MatchConfig {
            warmup_ticks: 20,
            match_duration_ticks: 200,
            extraction_ticks: 40,
            ..MatchConfig::default()
        },
        ended_worlds,
        ..ServerConfig::default()
    }
}

fn host_with(players: &[u64]) -> MemoryHost {
    let host = MemoryHost::new();
    for &id in players {
        host.connect(PlayerId(id));
    }
    host
}

fn run_ticks(server: &ExtractionServer<MemoryHost>, n: u64) {
    for _ in 0..n {
        server.tick_once();
    }
}

async fn started_match(server: &ExtractionServer<MemoryHost>) -> WorldKey {
    match server.handle().execute(Command::StartMatch).await.unwrap() {
        Feedback::MatchStarting { world, .. } => world,
        other => panic!("unexpected feedback: {other:?}"),
    }
}

// =========================================================================
// Full match flow
// =========================================================================

#[tokio::test]
async fn test_full_match_with_one_extraction() {
    let server = ExtractionServer::new(short_config(EndedWorldPolicy::Keep), host_with(&[1, 2]));
    let handle = server.handle();
    let host = handle.host();

    let world = started_match(&server).await;
    assert_eq!(
        host.take_inbox(PlayerId(1)),
        vec![Notice::MatchFound { seconds: 1 }]
    );

    // Warmup.
    run_ticks(&server, 20);
    assert_eq!(handle.current_tick(), 20);
    let (w, _) = host.location(PlayerId(1)).unwrap();
    assert_eq!(w, world);
    assert!(
        host.take_inbox(PlayerId(1))
            .contains(&Notice::MatchStarted { minutes: 1 })
    );

    // Player 1 extracts.
    assert!(handle.request_extraction(PlayerId(1), &world));
    run_ticks(&server, 40);
    let (w, _) = host.location(PlayerId(1)).unwrap();
    assert_eq!(w.as_str(), "minecraft:overworld");
    assert!(
        host.take_inbox(PlayerId(1))
            .contains(&Notice::ExtractionSucceeded)
    );

    // Player 2 runs out of time.
    run_ticks(&server, 160);
    assert_eq!(handle.current_tick(), 220);
    assert!(!handle.matches().contains(&world));
    assert!(host.take_inbox(PlayerId(2)).contains(&Notice::MatchEnded));
    assert_eq!(host.player(PlayerId(2)).unwrap().removals, 1);
    assert_eq!(host.player(PlayerId(1)).unwrap().removals, 0);
}

#[tokio::test]
async fn test_match_state_visible_through_handle() {
    let server = ExtractionServer::new(short_config(EndedWorldPolicy::Keep), host_with(&[1]));
    let handle = server.handle();
    let world = started_match(&server).await;

    assert_eq!(
        handle.matches().summary(&world).unwrap().state,
        MatchState::Warmup
    );
    run_ticks(&server, 20);
    let summary = handle.matches().summary(&world).unwrap();
    assert_eq!(summary.state, MatchState::Playing);
    assert_eq!(summary.started_at, Some(20));
}

#[tokio::test]
async fn test_player_left_is_not_removed_at_end() {
    let server = ExtractionServer::new(short_config(EndedWorldPolicy::Keep), host_with(&[1, 2]));
    let handle = server.handle();
    let world = started_match(&server).await;
    run_ticks(&server, 20);

    assert!(handle.player_left(PlayerId(2), &world));
    assert!(!handle.request_extraction(PlayerId(2), &world));
    run_ticks(&server, 200);

    assert_eq!(handle.host().player(PlayerId(2)).unwrap().removals, 0);
}

#[tokio::test]
async fn test_void_world_spawns_above_sea_level() {
    let host = host_with(&[1]).with_void_terrain();
    let server = ExtractionServer::new(short_config(EndedWorldPolicy::Keep), host);
    started_match(&server).await;
    run_ticks(&server, 20);

    let (_, pos) = server.handle().host().location(PlayerId(1)).unwrap();
    assert_eq!(pos.y, 64);
}

// =========================================================================
// Ended-world policies
// =========================================================================

#[tokio::test]
async fn test_keep_policy_leaves_world_loaded() {
    let server = ExtractionServer::new(short_config(EndedWorldPolicy::Keep), host_with(&[1]));
    let world = started_match(&server).await;

    run_ticks(&server, 500);

    assert!(server.handle().host().world_exists(&world));
}

#[tokio::test]
async fn test_destroy_policy_tears_down_on_end() {
    let server = ExtractionServer::new(short_config(EndedWorldPolicy::Destroy), host_with(&[1]));
    let world = started_match(&server).await;

    run_ticks(&server, 219);
    assert!(server.handle().host().world_exists(&world));
    run_ticks(&server, 1);
    assert!(!server.handle().host().world_exists(&world));
}

#[tokio::test]
async fn test_lease_policy_tears_down_after_grace_period() {
    let server = ExtractionServer::new(
        short_config(EndedWorldPolicy::Lease { ticks: 10 }),
        host_with(&[1]),
    );
    let handle = server.handle();
    let world = started_match(&server).await;

    run_ticks(&server, 220);
    assert_eq!(handle.leases().remaining(&world), Some(10));

    run_ticks(&server, 9);
    assert!(handle.host().world_exists(&world));
    run_ticks(&server, 1);
    assert!(!handle.host().world_exists(&world));
    assert!(handle.leases().is_empty());
}

// =========================================================================
// Temporary worlds
// =========================================================================

#[tokio::test]
async fn test_temporary_world_expires_after_lifetime() {
    let server = ExtractionServer::new(ServerConfig::default(), MemoryHost::new());
    let handle = server.handle();

    let world = handle.create_temporary_world(Some(5)).await.unwrap();
    assert_eq!(world.namespace(), Some("sortie"));
    assert!(world.path().starts_with("temp_"));

    run_ticks(&server, 4);
    assert!(handle.host().world_exists(&world));
    run_ticks(&server, 1);
    assert!(!handle.host().world_exists(&world));
}

#[tokio::test]
async fn test_temporary_world_uses_configured_default_lifetime() {
    let config = ServerConfig {
        temporary_world_lifetime_ticks: 30,
        ..ServerConfig::default()
    };
    let server = ExtractionServer::new(config, MemoryHost::new());
    let handle = server.handle();

    let feedback = handle
        .execute("temp_dimension create_dimension".parse().unwrap())
        .await
        .unwrap();

    match feedback {
        Feedback::TemporaryWorldCreated {
            world,
            lifetime_ticks,
        } => {
            assert_eq!(lifetime_ticks, 30);
            assert_eq!(handle.leases().remaining(&world), Some(30));
        }
        other => panic!("unexpected feedback: {other:?}"),
    }
}

#[tokio::test]
async fn test_zero_lifetime_temporary_world_is_rejected() {
    let server = ExtractionServer::new(ServerConfig::default(), MemoryHost::new());
    let handle = server.handle();

    let result = handle.create_temporary_world(Some(0)).await;

    assert!(matches!(result, Err(SortieError::Lease(_))));
    assert_eq!(handle.host().world_count(), 0);
}

#[tokio::test]
async fn test_remove_temporary_world_cancels_lease() {
    let server = ExtractionServer::new(ServerConfig::default(), MemoryHost::new());
    let handle = server.handle();
    let world = handle.create_temporary_world(Some(100)).await.unwrap();

    let feedback = handle
        .execute(Command::RemoveTemporaryWorld { key: world.clone() })
        .await
        .unwrap();

    assert_eq!(feedback, Feedback::TemporaryWorldRemoved { world: world.clone() });
    assert!(!handle.host().world_exists(&world));
    assert_eq!(handle.leases().remaining(&world), None);
}

#[tokio::test]
async fn test_remove_unknown_world_fails() {
    let server = ExtractionServer::new(ServerConfig::default(), MemoryHost::new());
    let handle = server.handle();

    let result = handle
        .execute(Command::RemoveTemporaryWorld {
            key: WorldKey::new("sortie:nope"),
        })
        .await;

    match result {
        Err(CommandError::Failed(error)) => {
            assert!(matches!(*error, SortieError::Destroy(_)));
        }
        other => panic!("expected destroy failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_storage_directory_removed_with_world() {
    let root = tempfile::tempdir().unwrap();
    let host = MemoryHost::new().with_storage_root(root.path());
    let server = ExtractionServer::new(ServerConfig::default(), host);
    let handle = server.handle();

    let world = handle.create_temporary_world(Some(3)).await.unwrap();
    let dir = handle.host().storage_path(&world).unwrap();
    assert!(dir.is_dir());
    assert!(dir.starts_with(root.path().join("dimensions").join("sortie")));

    run_ticks(&server, 3);

    // The tick pass only unloads; the directory goes on a background task.
    assert!(!handle.host().world_exists(&world));
    assert!(dir.is_dir());

    handle.host().flush_teardown().await;
    assert!(!dir.exists());
}

// =========================================================================
// Commands
// =========================================================================

#[tokio::test]
async fn test_start_command_without_players() {
    let server = ExtractionServer::new(ServerConfig::default(), MemoryHost::new());

    let result = server.handle().execute(Command::StartMatch).await;

    let err = result.unwrap_err();
    assert!(matches!(err, CommandError::NoParticipants));
    assert_eq!(err.to_string(), "No players online to start match.");
    assert!(server.handle().matches().is_empty());
}

#[tokio::test]
async fn test_start_command_ignores_offline_players() {
    let host = host_with(&[1, 2, 3]);
    host.disconnect(PlayerId(3));
    let server = ExtractionServer::new(ServerConfig::default(), host);

    let feedback = server
        .handle()
        .execute("extraction start".parse().unwrap())
        .await
        .unwrap();

    assert_eq!(feedback.to_string(), "Starting match with 2 players...");
}

#[tokio::test]
async fn test_start_command_reports_provision_failure() {
    let host = host_with(&[1]);
    host.fail_next_provision();
    let server = ExtractionServer::new(ServerConfig::default(), host);

    let result = server.handle().execute(Command::StartMatch).await;

    match result {
        Err(CommandError::Failed(error)) => assert!(matches!(
            *error,
            SortieError::Match(MatchError::Provision(ProvisionError::Failed { .. }))
        )),
        other => panic!("expected provision failure, got {other:?}"),
    }
    assert!(server.handle().matches().is_empty());
}

// =========================================================================
// Tick loop
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_run_ticks_until_shutdown() {
    let server = ExtractionServer::new(ServerConfig::default(), host_with(&[1]));
    let handle = server.handle();
    let task = tokio::spawn(server.run());

    tokio::time::sleep(Duration::from_millis(1_025)).await;
    handle.shutdown();
    task.await.unwrap();

    // 20 TPS for just over a second.
    assert_eq!(handle.current_tick(), 20);
}

#[tokio::test(start_paused = true)]
async fn test_run_returns_immediately_if_already_shut_down() {
    let server = ExtractionServer::new(ServerConfig::default(), MemoryHost::new());
    let handle = server.handle();
    handle.shutdown();

    server.run().await;

    assert_eq!(handle.current_tick(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_run_drives_a_match_to_completion() {
    let server = ExtractionServer::new(short_config(EndedWorldPolicy::Destroy), host_with(&[1]));
    let handle = server.handle();
    let world = started_match(&server).await;
    let task = tokio::spawn(server.run());

    // 220 ticks at 50 ms.
    tokio::time::sleep(Duration::from_millis(11_025)).await;
    handle.shutdown();
    task.await.unwrap();

    assert!(!handle.matches().contains(&world));
    assert!(!handle.host().world_exists(&world));
    assert!(handle.host().lookup_world(&world).is_none());
}
