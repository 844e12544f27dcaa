//! Sequential request/response scheduler for REST-style connectors.
//!
//! One cycle walks the item list in order, issuing one fetch per item and
//! waiting `per_item_delay` after each, whatever the outcome. After the last
//! item the loop sleeps `cycle_interval` and starts over. Fetches are never
//! issued in parallel.

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::shutdown::ShutdownSignal;
use crate::sink::QuoteSender;
use crate::types::Quote;

/// Timing contract for one polled exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    pub per_item_delay: Duration,
    pub cycle_interval: Duration,
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self {
            per_item_delay: Duration::from_millis(200),
            cycle_interval: Duration::from_millis(8000),
        }
    }
}

/// Per-cycle counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub forwarded: usize,
    pub rejected: usize,
    pub failed: usize,
}

/// Run the polling loop until `shutdown` fires.
///
/// `fetch` returns `Ok(Some(quote))` for an accepted quote, `Ok(None)` when the
/// payload was not a usable quote, and `Err` for transport or decode failures.
/// Accepted quotes go to `sink` immediately.
pub async fn run_poll_loop<T, F, Fut>(
    label: &str,
    items: &[T],
    schedule: PollSchedule,
    fetch: F,
    sink: &QuoteSender,
    mut shutdown: ShutdownSignal,
) where
    T: Clone,
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<Option<Quote>>>,
{
    info!(
        "[{label}] polling {} items (delay {:?}, cycle {:?})",
        items.len(),
        schedule.per_item_delay,
        schedule.cycle_interval
    );

    let mut cycle: u64 = 0;
    while !shutdown.is_triggered() {
        cycle += 1;
        let mut report = CycleReport::default();

        for item in items {
            if shutdown.is_triggered() {
                break;
            }
            match fetch(item.clone()).await {
                Ok(Some(quote)) => {
                    report.forwarded += 1;
                    sink.send(quote);
                }
                Ok(None) => report.rejected += 1,
                Err(e) => {
                    report.failed += 1;
                    warn!("[{label}] fetch failed: {e:#}");
                }
            }
            if !pause(schedule.per_item_delay, &mut shutdown).await {
                break;
            }
        }

        debug!(
            "[{label}] cycle {cycle}: forwarded={} rejected={} failed={}",
            report.forwarded, report.rejected, report.failed
        );

        if !pause(schedule.cycle_interval, &mut shutdown).await {
            break;
        }
    }

    info!("[{label}] polling stopped");
}

/// Sleep for `d`; `false` if shutdown fired first.
async fn pause(d: Duration, shutdown: &mut ShutdownSignal) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(d) => true,
        _ = shutdown.wait() => false,
    }
}
