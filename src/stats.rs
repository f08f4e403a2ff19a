//! Summary statistics over a domain's check history.
//!
//! Pure computation: callers supply the history in chronological order
//! (last element = most recent) and receive a [`DomainStats`] snapshot.

use crate::{DomainCheck, DomainStats};

/// Compute the statistics snapshot for one domain's check history.
///
/// Returns `None` when the history is empty. Timing metrics only consider
/// successful checks with a positive duration; when no such checks exist,
/// every timing metric is zero.
pub fn compute_domain_stats(domain: &str, checks: &[DomainCheck]) -> Option<DomainStats> {
    let last = checks.last()?;

    let mut success_count = 0;
    let mut timings = Vec::new();

    for check in checks {
        if check.succeeded() {
            success_count += 1;
            if check.duration_ms > 0.0 {
                timings.push(check.duration_ms);
            }
        }
    }

    let total_checks = checks.len();
    let success_rate = success_count as f64 / total_checks as f64 * 100.0;

    let (avg, min, max, p95) = if timings.is_empty() {
        (0.0, 0.0, 0.0, 0.0)
    } else {
        let sum: f64 = timings.iter().sum();
        let avg = sum / timings.len() as f64;
        let min = timings.iter().copied().fold(f64::INFINITY, f64::min);
        let max = timings.iter().copied().fold(0.0, f64::max);
        let p95 = percentile(&timings, 95.0);
        (avg, min, max, p95)
    };

    Some(DomainStats {
        domain: domain.to_string(),
        total_checks,
        success_count,
        failure_count: total_checks - success_count,
        success_rate: round2(success_rate),
        average_uptime: round2(success_rate),
        last_check: last.timestamp,
        avg_response_time: round2(avg),
        min_response_time: round2(min),
        max_response_time: round2(max),
        p95_response_time: round2(p95),
        checks_with_timing: timings.len(),
    })
}

/// Linear-interpolated percentile over an unsorted sample list.
pub fn percentile(samples: &[f64], pct: f64) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let index = pct / 100.0 * (sorted.len() - 1) as f64;
    let lower = index.floor() as usize;
    let upper = index.ceil() as usize;

    if lower == upper {
        return sorted[lower];
    }

    let weight = index - index.floor();
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
