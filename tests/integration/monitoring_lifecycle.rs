//! Lifecycle tests: start/stop transitions, the tick loop and cross-domain
//! parallelism.

use std::time::{Duration, Instant};

use vigil::events::EVENT_MONITORING_IP;

use crate::helpers::*;

#[tokio::test]
async fn full_start_stop_restart_cycle() {
    let (monitor, _bus, _store) = spawn_monitor(
        healthy_resolver(&["a.example"]),
        vec![domain_config("a.example", "1.2.3.4")],
    );

    let started = monitor.start_monitoring(30).await.unwrap();
    assert!(started.running);
    assert_eq!(started.active_checkers, 1);

    let stopped = monitor.stop_monitoring().await.unwrap();
    assert!(!stopped.running);
    assert_eq!(stopped.active_checkers, 0);

    // A fresh start spawns a fresh set of checkers.
    let restarted = monitor.start_monitoring(45).await.unwrap();
    assert!(restarted.running);
    assert_eq!(restarted.interval_secs, 45);
    assert_eq!(restarted.active_checkers, 1);

    monitor.shutdown().await;
}

#[tokio::test]
async fn tick_loop_drives_periodic_checks() {
    let (monitor, bus, _store) = spawn_monitor(
        healthy_resolver(&["a.example"]),
        vec![domain_config("a.example", "1.2.3.4")],
    );
    let mut sub = bus.subscribe();

    monitor.start_monitoring(1).await.unwrap();

    // The first tick fires one interval after start.
    let deadline = Instant::now() + Duration::from_secs(3);
    let mut seen_check = false;
    while Instant::now() < deadline {
        match tokio::time::timeout(Duration::from_millis(500), sub.recv()).await {
            Ok(Some(event)) if event.kind == EVENT_MONITORING_IP => {
                seen_check = true;
                break;
            }
            Ok(Some(_)) => continue,
            _ => continue,
        }
    }
    assert!(seen_check, "expected a check event from the tick loop");

    monitor.shutdown().await;
}

#[tokio::test]
async fn stop_cancels_the_tick_loop() {
    let (monitor, bus, _store) = spawn_monitor(
        healthy_resolver(&["a.example"]),
        vec![domain_config("a.example", "1.2.3.4")],
    );

    monitor.start_monitoring(1).await.unwrap();
    monitor.stop_monitoring().await.unwrap();

    // Subscribing after the stop: no further check events may arrive.
    let mut sub = bus.subscribe();
    tokio::time::sleep(Duration::from_millis(1600)).await;

    let mut late_checks = 0;
    while let Some(event) = sub.try_recv() {
        if event.kind == EVENT_MONITORING_IP {
            late_checks += 1;
        }
    }
    assert_eq!(late_checks, 0, "tick loop kept running after stop");

    monitor.shutdown().await;
}

#[tokio::test]
async fn checks_across_domains_run_in_parallel() {
    let domains = ["a.example", "b.example", "c.example", "d.example", "e.example"];
    let per_check_delay = Duration::from_millis(300);

    let mut resolver = healthy_resolver(&domains);
    for domain in &domains {
        resolver = resolver.with_delay(domain, per_check_delay);
    }

    let configs = domains
        .iter()
        .map(|domain| domain_config(domain, "1.2.3.4"))
        .collect();
    let (monitor, bus, _store) = spawn_monitor(resolver, configs);
    let mut sub = bus.subscribe();

    // A long interval keeps the tick loop quiet; the burst below is ours.
    monitor.start_monitoring(3600).await.unwrap();

    let started = Instant::now();
    monitor.check_all().await.unwrap();

    let mut completed = 0;
    while completed < domains.len() {
        let event = tokio::time::timeout(Duration::from_secs(2), sub.recv())
            .await
            .expect("timed out waiting for check events")
            .expect("bus closed");
        if event.kind == EVENT_MONITORING_IP {
            completed += 1;
        }
    }

    let elapsed = started.elapsed();
    // Serialized execution would need at least 5 * 300ms.
    assert!(
        elapsed < per_check_delay * 3,
        "checks took {elapsed:?}, expected parallel execution"
    );

    monitor.shutdown().await;
}
