// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Dead log stream detection.
//!
//! A stream is suspicious when its most recent intervals had no log lines at
//! all. Whether that silence is an anomaly depends on how the stream behaved
//! before it: the question asked is how many standard deviations separate the
//! usual count from zero. That distance is compared against a threshold that
//! shrinks as the silence gets longer, so a noisy stream needs a long silence
//! before it is declared dead while a steady one needs only a short one.

use crate::constants::{ALERT_QUEUE_CAPACITY, DEAD_STREAM_FUDGE_FACTOR, HISTORY_CAPACITY};
use crate::history::{History, HistoryTracker};
use crate::metric::Key;
use serde::Serialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Raised when a collector's log stream looks dead.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AlertEvent {
    pub collector_id: String,
    /// Length of the silence that triggered the alert.
    pub silence_duration: Duration,
}

pub type AlertSender = mpsc::Sender<AlertEvent>;
pub type AlertReceiver = mpsc::Receiver<AlertEvent>;

#[must_use]
pub fn alert_channel() -> (AlertSender, AlertReceiver) {
    mpsc::channel(ALERT_QUEUE_CAPACITY)
}

/// Outcome of examining one stream's history.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Verdict {
    /// Fewer intervals than required have been observed.
    InsufficientHistory,
    /// The newest interval had log lines.
    Alive,
    /// Every remembered interval is zero, there is nothing to compare against.
    NoBaseline,
    /// Silent, but within what the baseline's variance explains.
    Quiet { silent_intervals: usize, distance: f64, threshold: f64 },
    Dead { silent_intervals: usize },
}

/// Arithmetic mean and population standard deviation.
fn mean_and_std_dev(counts: &[u64]) -> (f64, f64) {
    let n = counts.len() as f64;
    let mean = counts.iter().map(|c| *c as f64).sum::<f64>() / n;
    let sum_of_squares: f64 = counts
        .iter()
        .map(|c| {
            let deviation = *c as f64 - mean;
            deviation * deviation
        })
        .sum();
    (mean, (sum_of_squares / n).sqrt())
}

#[derive(Clone, Debug)]
pub struct DeadStreamDetector {
    flush_interval: Duration,
    min_history: usize,
    fudge_factor: f64,
}

impl DeadStreamDetector {
    #[must_use]
    pub fn new(flush_interval: Duration) -> Self {
        DeadStreamDetector {
            flush_interval,
            min_history: HISTORY_CAPACITY,
            fudge_factor: DEAD_STREAM_FUDGE_FACTOR,
        }
    }

    #[must_use]
    pub fn evaluate(&self, history: &History) -> Verdict {
        if history.len() < self.min_history {
            return Verdict::InsufficientHistory;
        }

        let silent_intervals = history.iter().take_while(|count| *count == 0).count();
        if silent_intervals == 0 {
            return Verdict::Alive;
        }

        let baseline: Vec<u64> = history.iter().skip(silent_intervals).collect();
        if baseline.is_empty() {
            return Verdict::NoBaseline;
        }

        let (mean, std_dev) = mean_and_std_dev(&baseline);
        if std_dev == 0.0 {
            // A perfectly steady baseline: any silence after a nonzero one is
            // anomalous, a baseline of zeros is not a stream to lose.
            return if mean > 0.0 {
                Verdict::Dead { silent_intervals }
            } else {
                Verdict::NoBaseline
            };
        }

        let distance = mean / std_dev;
        let threshold = self.fudge_factor / silent_intervals as f64;
        if distance > threshold {
            Verdict::Dead { silent_intervals }
        } else {
            Verdict::Quiet {
                silent_intervals,
                distance,
                threshold,
            }
        }
    }

    /// Checks one stream and builds the alert for it when it is dead.
    #[must_use]
    pub fn check(&self, key: &Key, history: &History) -> Option<AlertEvent> {
        match self.evaluate(history) {
            Verdict::Dead { silent_intervals } => Some(AlertEvent {
                collector_id: key.collector_id.to_string(),
                silence_duration: u32::try_from(silent_intervals)
                    .ok()
                    .and_then(|z| self.flush_interval.checked_mul(z))
                    .unwrap_or(Duration::MAX),
            }),
            Verdict::Quiet {
                silent_intervals,
                distance,
                threshold,
            } => {
                debug!(
                    "METRICS | {key} silent for {silent_intervals} intervals, distance {distance:.2} <= threshold {threshold:.2}"
                );
                None
            }
            _ => None,
        }
    }

    /// Checks every tracked stream and queues an alert for each dead one.
    /// Alerts that do not fit in the queue are dropped. Returns the number of
    /// alerts queued.
    pub fn scan(&self, histories: &HistoryTracker, alerts: &AlertSender) -> usize {
        let mut queued = 0;
        for (key, history) in histories.iter() {
            let Some(alert) = self.check(key, history) else {
                continue;
            };
            debug!(
                "METRICS | Dead log stream {key}, silent for {:?}",
                alert.silence_duration
            );
            match alerts.try_send(alert) {
                Ok(()) => queued += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {}
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    warn!("METRICS | Dead log stream alert receiver dropped");
                    break;
                }
            }
        }
        queued
    }
}
