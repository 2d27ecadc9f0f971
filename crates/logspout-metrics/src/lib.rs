// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Log throughput telemetry for a log-routing daemon.
//!
//! Producers report every observed log line through a [`aggregator_service::MetricsHandle`].
//! A single [`aggregator_service::AggregatorService`] task drains those samples every tick,
//! counts them per `(collector, container)` pair and, once per flush interval, publishes the
//! counts in line protocol over UDP or HTTP(S). The same task keeps a short history of
//! per-interval counts and raises an [`detector::AlertEvent`] when a stream that used to be
//! busy goes quiet for longer than its own variance can explain.

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod aggregator;
pub mod aggregator_service;
pub mod config;
pub mod constants;
pub mod detector;
pub mod errors;
pub mod flusher;
pub mod history;
pub mod line_protocol;
pub mod metric;
pub mod util;
