// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

/// Capacity of the queue between log producers and the aggregator service.
pub const INGEST_QUEUE_CAPACITY: usize = 10_000;

/// Capacity of the dead log stream alert queue. Alerts beyond it are dropped.
pub const ALERT_QUEUE_CAPACITY: usize = 100;

/// How often the aggregator service drains the ingest queue.
pub const DRAIN_INTERVAL: Duration = Duration::from_millis(100);

/// Number of past intervals remembered per log stream.
pub const HISTORY_CAPACITY: usize = 20;

/// Scales the dead log stream threshold. The threshold is divided by the
/// length of the current silence, so longer silences need less evidence.
pub const DEAD_STREAM_FUDGE_FACTOR: f64 = 6.0;

/// Upper bound on payloads being shipped at the same time.
pub const MAX_IN_FLIGHT_DISPATCHES: usize = 16;

/// Initial capacity of the encoded payload buffer.
pub const PAYLOAD_BUFFER_CAPACITY: usize = 4096;

pub const HTTP_TIMEOUT: Duration = Duration::from_secs(5);

pub const DEFAULT_PROTOCOL: &str = "udp";
/// Docker bridge address (the host, seen from a container) and the default
/// telegraf UDP listener port.
pub const DEFAULT_HOST_PORT: &str = "172.17.0.1:8092";
pub const DEFAULT_DATABASE_NAME: &str = "aws";
pub const DEFAULT_METRIC_NAME: &str = "logspout_log_count_by_container";
pub const DEFAULT_FLUSH_INTERVAL: &str = "10s";

pub const COLLECTOR_ID_TAG: &str = "PumpId";
pub const CONTAINER_NAME_TAG: &str = "ContainerName";
pub const COUNT_FIELD: &str = "Count";
