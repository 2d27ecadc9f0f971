// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use reqwest::StatusCode;

/// Configuration problems. All of them are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Unsupported METRICS_PROTOCOL: {0}. Supported protocols: http, https, udp")]
    UnsupportedProtocol(String),

    #[error("Invalid duration for {name}: {value:?}: {source}")]
    InvalidDuration {
        name: &'static str,
        value: String,
        #[source]
        source: humantime::DurationError,
    },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Failure to ship one payload. Logged by the flusher and otherwise ignored.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("could not resolve {0}")]
    Resolve(String),

    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),

    #[error("short write: sent {sent} of {len} bytes")]
    ShortWrite { sent: usize, len: usize },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },
}

/// Returned to producers once the aggregator service has stopped.
#[derive(Debug, thiserror::Error)]
#[error("metrics aggregator service is not running")]
pub struct RecordError;
