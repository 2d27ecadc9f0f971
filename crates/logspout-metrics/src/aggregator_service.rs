// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::aggregator::Aggregator;
use crate::config::Config;
use crate::constants::{DRAIN_INTERVAL, INGEST_QUEUE_CAPACITY};
use crate::detector::{alert_channel, AlertReceiver, AlertSender, DeadStreamDetector};
use crate::errors::{ConfigError, RecordError};
use crate::flusher::{Flusher, FlusherConfig};
use crate::history::HistoryTracker;
use crate::line_protocol::{encode, MetricPoint};
use crate::metric::Sample;
use std::time::{Duration, UNIX_EPOCH};
use tokio::sync::mpsc;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Producer side of the ingest queue. Cheap to clone, one per log pump.
#[derive(Clone, Debug)]
pub struct MetricsHandle {
    tx: mpsc::Sender<Sample>,
}

impl MetricsHandle {
    /// Counts one log line. Waits while the ingest queue is full.
    pub async fn record(
        &self,
        collector_id: &str,
        container_name: &str,
    ) -> Result<(), RecordError> {
        self.tx
            .send(Sample::new(collector_id, container_name))
            .await
            .map_err(|_| RecordError)
    }

    /// Same as [`MetricsHandle::record`] for producers running outside the
    /// async runtime. Blocks the thread while the ingest queue is full and
    /// must not be called from async code.
    pub fn blocking_record(
        &self,
        collector_id: &str,
        container_name: &str,
    ) -> Result<(), RecordError> {
        self.tx
            .blocking_send(Sample::new(collector_id, container_name))
            .map_err(|_| RecordError)
    }
}

/// State owned by the aggregator service task and by nothing else.
#[derive(Debug)]
pub struct AggregationContext {
    pub aggregator: Aggregator,
    pub history: HistoryTracker,
    pub last_published: Instant,
}

impl AggregationContext {
    fn new(now: Instant) -> Self {
        AggregationContext {
            aggregator: Aggregator::new(),
            history: HistoryTracker::default(),
            last_published: now,
        }
    }
}

/// Drains the ingest queue every tick and publishes once per flush interval.
pub struct AggregatorService {
    rx: mpsc::Receiver<Sample>,
    context: AggregationContext,
    detector: DeadStreamDetector,
    flusher: Flusher,
    alerts: AlertSender,
    metric_name: String,
    log_metrics: bool,
    flush_interval: Duration,
    cancel_token: CancellationToken,
}

impl AggregatorService {
    /// Builds the service, the producer handle and the dead stream alert
    /// receiver. Fails on a configuration the flusher cannot work with.
    pub fn new(
        config: &Config,
        cancel_token: CancellationToken,
    ) -> Result<(Self, MetricsHandle, AlertReceiver), ConfigError> {
        let flusher = Flusher::new(FlusherConfig::from(config))?;
        let (tx, rx) = mpsc::channel(INGEST_QUEUE_CAPACITY);
        let (alerts, alert_rx) = alert_channel();

        let service = Self {
            rx,
            context: AggregationContext::new(Instant::now()),
            detector: DeadStreamDetector::new(config.flush_interval),
            flusher,
            alerts,
            metric_name: config.metric_name.clone(),
            log_metrics: config.log_metrics,
            flush_interval: config.flush_interval,
            cancel_token,
        };

        Ok((service, MetricsHandle { tx }, alert_rx))
    }

    /// Runs until the cancel token fires. Every iteration sleeps one drain
    /// interval after the previous one finished, so the flush period stretches
    /// when a publish is slow.
    pub async fn run(mut self) {
        debug!("METRICS | Aggregator service started");

        loop {
            tokio::select! {
                _ = self.cancel_token.cancelled() => break,
                _ = sleep(DRAIN_INTERVAL) => {}
            }
            self.tick(Instant::now());
        }

        debug!("METRICS | Aggregator service stopped");
    }

    /// Drains the queue, then publishes when the flush interval has elapsed.
    /// Returns the published payload, if any.
    pub fn tick(&mut self, now: Instant) -> Option<String> {
        self.drain();
        if now.saturating_duration_since(self.context.last_published) > self.flush_interval {
            Some(self.publish(now))
        } else {
            None
        }
    }

    /// Moves every queued sample into the current interval without waiting.
    pub fn drain(&mut self) -> usize {
        let mut drained = 0;
        while let Ok(sample) = self.rx.try_recv() {
            self.context.aggregator.insert(sample);
            drained += 1;
        }
        drained
    }

    /// Closes the current interval: updates histories, encodes and ships the
    /// counts, and raises alerts for dead streams.
    pub fn publish(&mut self, now: Instant) -> String {
        let snapshot = self.context.aggregator.consume();
        self.context.history.record_interval(&snapshot);

        let points = MetricPoint::from_snapshot(&self.metric_name, &snapshot, unix_nanos());
        let payload = encode(&points);

        let alerts = self.detector.scan(&self.context.history, &self.alerts);
        if alerts > 0 {
            debug!("METRICS | Queued {alerts} dead log stream alerts");
        }

        if self.log_metrics {
            info!("{payload}");
        }

        debug!("METRICS | Shipping {} points", points.len());
        // fire and forget, quiet intervals included
        let _ = self.flusher.dispatch(payload.clone());

        self.context.last_published = now;
        payload
    }

    #[must_use]
    pub fn context(&self) -> &AggregationContext {
        &self.context
    }
}

fn unix_nanos() -> i64 {
    UNIX_EPOCH
        .elapsed()
        .map(|elapsed| i64::try_from(elapsed.as_nanos()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}
