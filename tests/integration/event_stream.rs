//! Event bus behavior under real monitoring traffic.

use std::time::{Duration, Instant};

use vigil::events::{EVENT_DOMAIN_STATS, EVENT_MONITORING_IP};

use crate::helpers::*;

#[tokio::test]
async fn completed_checks_and_stats_reach_subscribers() {
    let (monitor, bus, _store) = spawn_monitor(
        healthy_resolver(&["a.example"]),
        vec![domain_config("a.example", "1.2.3.4")],
    );
    let mut sub = bus.subscribe();

    monitor.start_monitoring(3600).await.unwrap();
    monitor.check_all().await.unwrap();

    let mut seen_check = false;
    let mut seen_stats = false;
    let deadline = Instant::now() + Duration::from_secs(2);

    while (!seen_check || !seen_stats) && Instant::now() < deadline {
        if let Ok(Some(event)) =
            tokio::time::timeout(Duration::from_millis(500), sub.recv()).await
        {
            match event.kind.as_str() {
                EVENT_MONITORING_IP => {
                    seen_check = true;
                    assert_eq!(event.data["check"]["domain"], "a.example");
                }
                EVENT_DOMAIN_STATS => {
                    seen_stats = true;
                    assert_eq!(event.data["stats"]["domain"], "a.example");
                }
                _ => {}
            }
        }
    }

    assert!(seen_check, "no check event received");
    assert!(seen_stats, "no stats event received");

    monitor.shutdown().await;
}

#[tokio::test]
async fn a_stalled_subscriber_does_not_starve_the_others() {
    let (monitor, bus, _store) = spawn_monitor(
        healthy_resolver(&["a.example"]),
        vec![domain_config("a.example", "1.2.3.4")],
    );

    // This subscription is never drained; its channel fills up and stays full.
    let _stalled = bus.subscribe();
    let mut active = bus.subscribe();

    monitor.start_monitoring(3600).await.unwrap();

    // Generate well over one channel's worth of events.
    for _ in 0..15 {
        monitor.check_all().await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        // Keep the active subscription drained.
        while active.try_recv().is_some() {}
    }

    // The active subscriber still gets fresh events.
    monitor.check_all().await.unwrap();
    let event = tokio::time::timeout(Duration::from_secs(2), active.recv())
        .await
        .expect("timed out waiting for an event")
        .expect("bus closed");
    assert!(!event.kind.is_empty());

    monitor.shutdown().await;
}

#[tokio::test]
async fn unsubscribed_clients_stop_receiving() {
    let (monitor, bus, _store) = spawn_monitor(
        healthy_resolver(&["a.example"]),
        vec![domain_config("a.example", "1.2.3.4")],
    );

    {
        let _sub = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);
    }
    assert_eq!(bus.subscriber_count(), 0);

    // Broadcasting with no subscribers must be a no-op, not an error.
    monitor.start_monitoring(3600).await.unwrap();
    monitor.check_all().await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    monitor.shutdown().await;
}
