//! HTML bodies for notification mails.

use crate::MonitoringStatus;

/// Render the monitoring start/stop notification body.
pub fn monitoring_notification(status: &MonitoringStatus) -> String {
    let (badge, color) = if status.running {
        ("ACTIVE", "#2e7d32")
    } else {
        ("STOPPED", "#c62828")
    };

    let started_row = status
        .started_at
        .map(|started_at| {
            format!(
                r#"<tr><td style="padding:4px 12px;color:#555;">Started at</td><td style="padding:4px 12px;">{}</td></tr>"#,
                started_at.to_rfc3339()
            )
        })
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html>
  <body style="font-family:Arial,Helvetica,sans-serif;color:#222;">
    <h2 style="margin-bottom:4px;">Domain monitoring</h2>
    <p style="margin-top:0;">
      <span style="background:{color};color:#fff;padding:2px 10px;border-radius:4px;">{badge}</span>
    </p>
    <table style="border-collapse:collapse;">
      <tr><td style="padding:4px 12px;color:#555;">Interval</td><td style="padding:4px 12px;">{interval}s</td></tr>
      <tr><td style="padding:4px 12px;color:#555;">Active checkers</td><td style="padding:4px 12px;">{checkers}</td></tr>
      {started_row}
    </table>
    <p style="color:#555;">{message}</p>
  </body>
</html>"#,
        color = color,
        badge = badge,
        interval = status.interval_secs,
        checkers = status.active_checkers,
        started_row = started_row,
        message = status.message,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn running_status_renders_active_badge_and_details() {
        let status = MonitoringStatus {
            running: true,
            interval_secs: 30,
            started_at: Some(Utc::now()),
            active_checkers: 3,
            message: "Monitoring started".to_string(),
        };

        let html = monitoring_notification(&status);
        assert!(html.contains("ACTIVE"));
        assert!(html.contains("30s"));
        assert!(html.contains("Started at"));
        assert!(html.contains("Monitoring started"));
    }

    #[test]
    fn stopped_status_omits_start_time() {
        let status = MonitoringStatus {
            running: false,
            interval_secs: 0,
            started_at: None,
            active_checkers: 0,
            message: "Monitoring stopped".to_string(),
        };

        let html = monitoring_notification(&status);
        assert!(html.contains("STOPPED"));
        assert!(!html.contains("Started at"));
    }
}
