// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Helpers for reading configuration values.

use crate::errors::ConfigError;
use std::time::Duration;

/// Parses a duration setting such as `10s`, `250ms` or `1m30s`.
///
/// Whitespace around the value is trimmed. The setting name is only used to
/// build the error.
///
/// # Examples
///
/// ```
/// use logspout_metrics::util::parse_duration;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration("METRICS_FLUSH_INTERVAL", "10s").unwrap(), Duration::from_secs(10));
/// assert_eq!(parse_duration("METRICS_FLUSH_INTERVAL", "100ms").unwrap(), Duration::from_millis(100));
/// assert!(parse_duration("METRICS_FLUSH_INTERVAL", "soon").is_err());
/// ```
pub fn parse_duration(name: &'static str, value: &str) -> Result<Duration, ConfigError> {
    humantime::parse_duration(value.trim()).map_err(|source| ConfigError::InvalidDuration {
        name,
        value: value.to_string(),
        source,
    })
}

/// Only the exact value `1` turns a flag on.
pub fn parse_flag(value: &str) -> bool {
    value.trim() == "1"
}
