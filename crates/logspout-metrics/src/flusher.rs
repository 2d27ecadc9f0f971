// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Ships encoded payloads to the metrics collector.
//!
//! Shipping is best effort: a payload is sent once, failures are logged and the
//! payload is dropped. Every payload is shipped from its own task so a slow
//! collector never holds up the aggregator service.

use crate::config::{Config, Protocol};
use crate::constants::{HTTP_TIMEOUT, MAX_IN_FLIGHT_DISPATCHES};
use crate::errors::{ConfigError, DispatchError};
use reqwest::header::CONTENT_TYPE;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

#[derive(Clone, Debug)]
enum Transport {
    Udp { host_port: String },
    Http { client: reqwest::Client, url: String },
}

pub struct FlusherConfig {
    pub protocol: Protocol,
    pub host_port: String,
    pub database_name: String,
    pub timeout: Duration,
    pub max_in_flight: usize,
}

impl From<&Config> for FlusherConfig {
    fn from(config: &Config) -> Self {
        FlusherConfig {
            protocol: config.protocol,
            host_port: config.host_port.clone(),
            database_name: config.database_name.clone(),
            timeout: HTTP_TIMEOUT,
            max_in_flight: MAX_IN_FLIGHT_DISPATCHES,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Flusher {
    transport: Transport,
    in_flight: Arc<Semaphore>,
}

impl Flusher {
    pub fn new(config: FlusherConfig) -> Result<Self, ConfigError> {
        let transport = match config.protocol {
            Protocol::Udp => Transport::Udp {
                host_port: config.host_port,
            },
            Protocol::Http | Protocol::Https => {
                let client = reqwest::Client::builder()
                    .timeout(config.timeout)
                    .build()
                    .map_err(ConfigError::HttpClient)?;
                Transport::Http {
                    client,
                    url: format!(
                        "{}://{}/write?db={}",
                        config.protocol, config.host_port, config.database_name
                    ),
                }
            }
        };

        Ok(Flusher {
            transport,
            in_flight: Arc::new(Semaphore::new(config.max_in_flight)),
        })
    }

    /// Ships `payload` from a background task and returns immediately.
    ///
    /// When too many payloads are still in flight the payload is dropped and
    /// `None` is returned. The returned handle only exists for callers that
    /// want to wait; the aggregator service never does.
    pub fn dispatch(&self, payload: String) -> Option<JoinHandle<()>> {
        let permit = match Arc::clone(&self.in_flight).try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                warn!(
                    "METRICS | Too many payloads in flight, dropping {} bytes",
                    payload.len()
                );
                return None;
            }
        };

        let flusher = self.clone();
        Some(tokio::spawn(async move {
            if let Err(e) = flusher.send(&payload).await {
                error!("METRICS | Error attempting to report metrics: {e}");
            }
            drop(permit);
        }))
    }

    /// Ships `payload` once and waits for the outcome.
    pub async fn send(&self, payload: &str) -> Result<(), DispatchError> {
        match &self.transport {
            Transport::Udp { host_port } => send_udp(host_port, payload).await,
            Transport::Http { client, url } => send_http(client, url, payload).await,
        }
    }
}

async fn send_udp(host_port: &str, payload: &str) -> Result<(), DispatchError> {
    let addr: SocketAddr = tokio::net::lookup_host(host_port)
        .await?
        .next()
        .ok_or_else(|| DispatchError::Resolve(host_port.to_string()))?;
    let local: SocketAddr = if addr.is_ipv4() {
        ([0, 0, 0, 0], 0).into()
    } else {
        ([0u16; 8], 0).into()
    };

    // the socket is closed when it goes out of scope
    let socket = UdpSocket::bind(local).await?;
    socket.connect(addr).await?;
    let sent = socket.send(payload.as_bytes()).await?;
    if sent < payload.len() {
        return Err(DispatchError::ShortWrite {
            sent,
            len: payload.len(),
        });
    }
    debug!("METRICS | Sent {sent} bytes to udp://{addr}");
    Ok(())
}

async fn send_http(
    client: &reqwest::Client,
    url: &str,
    payload: &str,
) -> Result<(), DispatchError> {
    let response = client
        .post(url)
        .header(CONTENT_TYPE, "text/plain")
        .body(payload.to_string())
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(DispatchError::Status { status, body });
    }
    debug!("METRICS | {status} from {url}");
    Ok(())
}
