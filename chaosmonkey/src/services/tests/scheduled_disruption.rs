//! Tests for the per-service scheduled disruption tick

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use super::common::{into_refs, liveness_script, mock_process, with_timeout};
use crate::core::{DisruptionProbabilities, ServiceDisruptionConfig};
use crate::error::{ChaosError, TransportErrorKind};
use crate::services::scheduled_disruption::{ProcessOutcome, ScheduledDisruption};
use shared::Action;

/// Min is clamped to the host count, so every host is affected each tick
fn config(stop: f64, kill: f64, restart: f64) -> ServiceDisruptionConfig {
    ServiceDisruptionConfig::new(
        "zookeeper",
        DisruptionProbabilities::new(stop, kill, restart),
        Duration::from_secs(60),
    )
    .unwrap()
    .with_node_bounds(usize::MAX, None)
    .unwrap()
}

#[tokio::test]
async fn test_stop_applied_to_running_processes() {
    let processes = (1..=3)
        .map(|i| {
            let mut p = mock_process("zookeeper", &format!("10.0.0.{i}"));
            p.expect_is_running().times(2).returning(liveness_script(vec![true, false]));
            p.expect_stop().times(1).returning(|| Ok(()));
            p
        })
        .collect();
    let mut scheduled = ScheduledDisruption::new(config(1.0, 0.0, 0.0), into_refs(processes));

    let report = scheduled.run_one_iteration(&mut StdRng::seed_from_u64(1)).await;

    assert_eq!(report.action, Some(Action::Stop));
    assert_eq!(report.affected.len(), 3);
    assert_eq!(report.count(&ProcessOutcome::Disrupted), 3);
}

#[tokio::test]
async fn test_stop_skips_processes_already_down() {
    let mut p = mock_process("zookeeper", "10.0.0.1");
    p.expect_is_running().times(1).returning(|| Ok(false));
    p.expect_stop().never();
    let mut scheduled = ScheduledDisruption::new(config(1.0, 0.0, 0.0), into_refs(vec![p]));

    let report = scheduled.run_one_iteration(&mut StdRng::seed_from_u64(2)).await;

    assert_eq!(report.count(&ProcessOutcome::Skipped), 1);
}

#[tokio::test]
async fn test_kill_that_leaves_process_running_is_an_anomaly() {
    let mut p = mock_process("zookeeper", "10.0.0.1");
    p.expect_is_running().times(2).returning(|| Ok(true));
    p.expect_kill().times(1).returning(|| Ok(()));
    let mut scheduled = ScheduledDisruption::new(config(0.0, 1.0, 0.0), into_refs(vec![p]));

    let report = scheduled.run_one_iteration(&mut StdRng::seed_from_u64(3)).await;

    assert_eq!(report.action, Some(Action::Kill));
    assert_eq!(report.count(&ProcessOutcome::Anomaly), 1);
}

#[tokio::test]
async fn test_restart_only_applies_to_stopped_processes() {
    let mut down = mock_process("zookeeper", "10.0.0.1");
    down.expect_is_running().times(2).returning(liveness_script(vec![false, true]));
    down.expect_restart().times(1).returning(|| Ok(()));

    let mut up = mock_process("zookeeper", "10.0.0.2");
    up.expect_is_running().times(1).returning(|| Ok(true));
    up.expect_restart().never();

    let mut scheduled = ScheduledDisruption::new(config(0.0, 0.0, 1.0), into_refs(vec![down, up]));
    let report = scheduled.run_one_iteration(&mut StdRng::seed_from_u64(4)).await;

    assert_eq!(report.action, Some(Action::Restart));
    assert_eq!(report.count(&ProcessOutcome::Disrupted), 1);
    assert_eq!(report.count(&ProcessOutcome::Skipped), 1);
}

#[tokio::test]
async fn test_failure_on_one_process_does_not_abort_the_tick() {
    let mut broken = mock_process("zookeeper", "10.0.0.1");
    broken
        .expect_is_running()
        .returning(|| Err(ChaosError::transport("10.0.0.1", TransportErrorKind::Connection, "No route to host")));

    let mut healthy = mock_process("zookeeper", "10.0.0.2");
    healthy.expect_is_running().times(2).returning(liveness_script(vec![true, false]));
    healthy.expect_stop().times(1).returning(|| Ok(()));

    let mut scheduled = ScheduledDisruption::new(config(1.0, 0.0, 0.0), into_refs(vec![broken, healthy]));
    let report = scheduled.run_one_iteration(&mut StdRng::seed_from_u64(5)).await;

    assert_eq!(report.processes.len(), 2);
    assert_eq!(report.count(&ProcessOutcome::Disrupted), 1);
    let failed = report.processes.iter().find(|r| r.address == "10.0.0.1").unwrap();
    assert!(matches!(failed.outcome, ProcessOutcome::Failed(ref msg) if msg.contains("No route to host")));
}

#[tokio::test]
async fn test_authentication_failure_is_recorded_and_tick_continues() {
    let mut rejected = mock_process("zookeeper", "10.0.0.1");
    rejected.expect_is_running().times(1).returning(|| {
        Err(ChaosError::transport(
            "10.0.0.1",
            TransportErrorKind::Authentication,
            "Host key verification failed.",
        ))
    });

    let mut healthy = mock_process("zookeeper", "10.0.0.2");
    healthy.expect_is_running().times(2).returning(liveness_script(vec![true, false]));
    healthy.expect_stop().times(1).returning(|| Ok(()));

    let mut scheduled = ScheduledDisruption::new(config(1.0, 0.0, 0.0), into_refs(vec![rejected, healthy]));
    let report = scheduled.run_one_iteration(&mut StdRng::seed_from_u64(6)).await;

    assert_eq!(report.processes.len(), 2);
    assert_eq!(report.failures(), 1);
    assert_eq!(report.count(&ProcessOutcome::Disrupted), 1);
    let failed = report.processes.iter().find(|r| r.address == "10.0.0.1").unwrap();
    assert!(matches!(failed.outcome, ProcessOutcome::Failed(ref msg) if msg.contains("Host key verification failed")));
}

#[tokio::test]
async fn test_draw_above_total_is_a_no_op() {
    // Liveness is never queried on a no-op tick
    let processes = vec![mock_process("zookeeper", "10.0.0.1"), mock_process("zookeeper", "10.0.0.2")];
    let mut scheduled = ScheduledDisruption::new(config(1e-12, 0.0, 0.0), into_refs(processes));

    let report = scheduled.run_one_iteration(&mut StdRng::seed_from_u64(7)).await;

    assert_eq!(report.action, None);
    assert!(report.processes.is_empty());
}

#[tokio::test]
async fn test_affected_set_respects_bounds() {
    let processes = (1..=6)
        .map(|i| {
            let mut p = mock_process("zookeeper", &format!("10.0.0.{i}"));
            p.expect_is_running().returning(|| Ok(false));
            p
        })
        .collect();
    let config = config(1.0, 0.0, 0.0).with_node_bounds(2, Some(4)).unwrap();
    let mut scheduled = ScheduledDisruption::new(config, into_refs(processes));
    let mut rng = StdRng::seed_from_u64(8);

    let mut seen_sizes = HashSet::new();
    let mut seen_members = HashSet::new();
    for _ in 0..200 {
        let report = scheduled.run_one_iteration(&mut rng).await;
        let unique: HashSet<_> = report.affected.iter().cloned().collect();
        assert!((2..=4).contains(&report.affected.len()));
        assert_eq!(unique.len(), report.affected.len());
        seen_sizes.insert(report.affected.len());
        seen_members.extend(unique);
    }

    assert_eq!(seen_sizes.len(), 3);
    assert_eq!(seen_members.len(), 6);
}

#[tokio::test]
async fn test_bounds_are_clamped_to_host_count() {
    let processes = vec![mock_process("zookeeper", "10.0.0.1")];
    let config = config(1.0, 0.0, 0.0).with_node_bounds(3, Some(5)).unwrap();
    let scheduled = ScheduledDisruption::new(config, into_refs(processes));

    assert_eq!(scheduled.bounds().min, 1);
    assert_eq!(scheduled.bounds().max, 1);
}

#[tokio::test]
async fn test_spawned_loop_stops_on_shutdown() {
    let mut p = mock_process("zookeeper", "10.0.0.1");
    p.expect_is_running().returning(|| Ok(false));
    let scheduled = ScheduledDisruption::new(config(1.0, 0.0, 0.0), into_refs(vec![p]));
    let (tx, rx) = watch::channel(false);

    let handle = scheduled.spawn(rx);
    tokio::time::sleep(Duration::from_millis(20)).await;
    tx.send(true).unwrap();

    with_timeout(handle).await.expect("scheduler should stop").unwrap();
}

#[tokio::test]
async fn test_spawned_loop_keeps_ticking_through_authentication_failures() {
    let checks = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&checks);

    let mut p = mock_process("zookeeper", "10.0.0.1");
    p.expect_is_running().returning(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Err(ChaosError::transport("10.0.0.1", TransportErrorKind::Authentication, "Permission denied"))
    });
    let config = ServiceDisruptionConfig::new(
        "zookeeper",
        DisruptionProbabilities::new(1.0, 0.0, 0.0),
        Duration::from_millis(10),
    )
    .unwrap()
    .with_node_bounds(1, None)
    .unwrap();
    let scheduled = ScheduledDisruption::new(config, into_refs(vec![p]));
    let (tx, rx) = watch::channel(false);

    let handle = scheduled.spawn(rx);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!handle.is_finished());
    tx.send(true).unwrap();

    with_timeout(handle).await.expect("scheduler should stop").unwrap();
    assert!(checks.load(Ordering::SeqCst) >= 3);
}
