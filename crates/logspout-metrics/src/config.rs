// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Environment driven configuration.
//!
//! | Variable                 | Default                           |
//! |--------------------------|-----------------------------------|
//! | `METRICS_PROTOCOL`       | `udp` (`udp`, `http` or `https`)  |
//! | `METRICS_HOST_PORT`      | `172.17.0.1:8092`                 |
//! | `METRICS_DATABASE_NAME`  | `aws`                             |
//! | `METRIC_NAME`            | `logspout_log_count_by_container` |
//! | `LOG_METRICS`            | `0`                               |
//! | `METRICS_FLUSH_INTERVAL` | `10s`                             |

use crate::constants::{
    DEFAULT_DATABASE_NAME, DEFAULT_FLUSH_INTERVAL, DEFAULT_HOST_PORT, DEFAULT_METRIC_NAME,
    DEFAULT_PROTOCOL,
};
use crate::errors::ConfigError;
use crate::util::{parse_duration, parse_flag};
use derive_more::Display;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Wire transport towards the metrics collector.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum Protocol {
    #[display("udp")]
    Udp,
    #[display("http")]
    Http,
    #[display("https")]
    Https,
}

impl FromStr for Protocol {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "udp" => Ok(Protocol::Udp),
            "http" => Ok(Protocol::Http),
            "https" => Ok(Protocol::Https),
            other => Err(ConfigError::UnsupportedProtocol(other.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub protocol: Protocol,
    /// `host:port` of the collector.
    pub host_port: String,
    /// Target database, only used by the HTTP transports.
    pub database_name: String,
    /// Measurement name written on every point.
    pub metric_name: String,
    /// Echo every encoded payload to the log.
    pub log_metrics: bool,
    pub flush_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            protocol: Protocol::Udp,
            host_port: DEFAULT_HOST_PORT.to_string(),
            database_name: DEFAULT_DATABASE_NAME.to_string(),
            metric_name: DEFAULT_METRIC_NAME.to_string(),
            log_metrics: false,
            flush_interval: Duration::from_secs(10),
        }
    }
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Config, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, which returns `None` for unset
    /// variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let protocol = get("METRICS_PROTOCOL", DEFAULT_PROTOCOL).parse::<Protocol>()?;
        let flush_interval = parse_duration(
            "METRICS_FLUSH_INTERVAL",
            &get("METRICS_FLUSH_INTERVAL", DEFAULT_FLUSH_INTERVAL),
        )?;

        Ok(Config {
            protocol,
            host_port: get("METRICS_HOST_PORT", DEFAULT_HOST_PORT),
            database_name: get("METRICS_DATABASE_NAME", DEFAULT_DATABASE_NAME),
            metric_name: get("METRIC_NAME", DEFAULT_METRIC_NAME),
            log_metrics: parse_flag(&get("LOG_METRICS", "0")),
            flush_interval,
        })
    }
}
