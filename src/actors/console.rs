//! Console sink - prints bus traffic for operators watching the terminal.

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::DomainCheck;
use crate::events::{EVENT_DOMAIN_STATS, EVENT_MONITORING_IP, EventBus};

/// Subscribe to the bus and log every completed check until the bus closes
/// the channel or the process exits.
pub fn spawn_console_sink(bus: EventBus) -> JoinHandle<()> {
    let mut subscription = bus.subscribe();

    tokio::spawn(async move {
        debug!("console sink started");

        while let Some(event) = subscription.recv().await {
            match event.kind.as_str() {
                EVENT_MONITORING_IP => {
                    match serde_json::from_value::<DomainCheck>(event.data["check"].clone()) {
                        Ok(check) => {
                            let status = if check.valid { "VALID" } else { "INVALID" };
                            if let Some(error) = &check.error {
                                warn!(
                                    domain = %check.domain,
                                    status,
                                    expected = %check.expected_ip,
                                    error = %error,
                                    "domain check"
                                );
                            } else {
                                info!(
                                    domain = %check.domain,
                                    status,
                                    expected = %check.expected_ip,
                                    actual = ?check.resolved_ips,
                                    "domain check"
                                );
                            }
                        }
                        Err(err) => debug!("unreadable check event: {err}"),
                    }
                }

                EVENT_DOMAIN_STATS => {
                    debug!(stats = %event.data["stats"]["domain"], "stats refreshed");
                }

                _ => {}
            }
        }

        debug!("console sink stopped");
    })
}
