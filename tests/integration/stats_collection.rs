//! Scatter-gather stats collection tests: bounded time, partial results,
//! history-backed snapshots.

use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;

use crate::helpers::*;

#[tokio::test]
async fn collection_is_bounded_with_an_unresponsive_checker() {
    // c.example hangs far beyond every timeout involved.
    let resolver = healthy_resolver(&["a.example", "b.example", "c.example"])
        .with_delay("c.example", Duration::from_secs(10));

    let configs = vec![
        domain_config("a.example", "1.2.3.4"),
        domain_config("b.example", "1.2.3.4"),
        domain_config("c.example", "1.2.3.4"),
    ];
    let (monitor, _bus, _store) = spawn_monitor(resolver, configs);

    monitor.start_monitoring(3600).await.unwrap();
    monitor.check_all().await.unwrap();

    // Let the fast checkers finish while c.example stays busy resolving.
    tokio::time::sleep(Duration::from_millis(300)).await;

    let started = Instant::now();
    let stats = monitor.all_cached_stats().await.unwrap();
    let elapsed = started.elapsed();

    assert!(
        elapsed < Duration::from_millis(2600),
        "collection took {elapsed:?}, must stay within the global timeout"
    );

    let mut domains: Vec<&str> = stats.iter().map(|s| s.domain.as_str()).collect();
    domains.sort_unstable();
    assert_eq!(domains, vec!["a.example", "b.example"]);

    monitor.shutdown().await;
}

#[tokio::test]
async fn snapshots_cover_persisted_history_before_the_first_check() {
    let store_checks = vec![
        valid_check("a.example", 10.0, 0),
        valid_check("a.example", 20.0, 1),
        valid_check("a.example", 30.0, 2),
    ];

    let (monitor, _bus, store) = spawn_monitor(
        healthy_resolver(&["a.example"]),
        vec![domain_config("a.example", "1.2.3.4")],
    );
    store.seed_checks(store_checks).await;

    monitor.start_monitoring(3600).await.unwrap();

    let stats = monitor.all_cached_stats().await.unwrap();
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].domain, "a.example");
    assert_eq!(stats[0].total_checks, 3);
    assert_eq!(stats[0].success_rate, 100.0);
    assert_eq!(stats[0].avg_response_time, 20.0);

    monitor.shutdown().await;
}

#[tokio::test]
async fn checkers_without_history_are_skipped_not_fatal() {
    // b.example has no history and never gets checked (long interval, no
    // manual trigger): its snapshot is "not found" and simply omitted.
    let store_checks = vec![valid_check("a.example", 10.0, 0)];

    let (monitor, _bus, store) = spawn_monitor(
        healthy_resolver(&["a.example", "b.example"]),
        vec![
            domain_config("a.example", "1.2.3.4"),
            domain_config("b.example", "1.2.3.4"),
        ],
    );
    store.seed_checks(store_checks).await;

    monitor.start_monitoring(3600).await.unwrap();

    let stats = monitor.all_cached_stats().await.unwrap();
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].domain, "a.example");

    monitor.shutdown().await;
}

#[tokio::test]
async fn stats_grow_as_checks_complete() {
    let (monitor, _bus, _store) = spawn_monitor(
        healthy_resolver(&["a.example"]),
        vec![domain_config("a.example", "1.2.3.4")],
    );

    monitor.start_monitoring(3600).await.unwrap();

    monitor.check_all().await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    let first = monitor.all_cached_stats().await.unwrap();
    assert_eq!(first[0].total_checks, 1);

    monitor.check_all().await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    let second = monitor.all_cached_stats().await.unwrap();
    assert_eq!(second[0].total_checks, 2);
    assert_eq!(second[0].success_rate, 100.0);

    monitor.shutdown().await;
}
