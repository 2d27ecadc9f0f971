// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use logspout_metrics::{
    aggregator_service::{AggregatorService, MetricsHandle},
    config::{Config, Protocol},
    constants::INGEST_QUEUE_CAPACITY,
    detector::AlertReceiver,
};
use mockito::{Matcher, Server};
use std::collections::HashMap;
use tokio::{
    net::UdpSocket,
    time::{sleep, timeout, Duration},
};
use tokio_util::sync::CancellationToken;

fn start_service(config: Config) -> (MetricsHandle, AlertReceiver, CancellationToken) {
    let cancel_token = CancellationToken::new();
    let (service, handle, alerts) = AggregatorService::new(&config, cancel_token.clone())
        .expect("failed to create aggregator service");
    tokio::spawn(service.run());
    (handle, alerts, cancel_token)
}

fn parse_datagram(datagram: &str, totals: &mut HashMap<String, u64>) {
    for line in datagram.lines() {
        let mut parts = line.split(' ');
        let series = parts.next().expect("missing series");
        let count: u64 = parts
            .next()
            .and_then(|fields| fields.strip_prefix("Count="))
            .expect("missing Count field")
            .parse()
            .expect("Count is not an integer");
        let timestamp: i64 = parts
            .next()
            .expect("missing timestamp")
            .parse()
            .expect("timestamp is not an integer");
        assert!(timestamp > 0);

        let container = series
            .split(',')
            .find_map(|tag| tag.strip_prefix("ContainerName="))
            .expect("missing ContainerName tag");
        *totals.entry(container.to_string()).or_default() += count;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn udp_collector_receives_every_log_line() {
    let collector = UdpSocket::bind("127.0.0.1:0")
        .await
        .expect("unable to bind UDP socket");
    let (handle, _alerts, cancel_token) = start_service(Config {
        protocol: Protocol::Udp,
        host_port: collector.local_addr().expect("no local address").to_string(),
        flush_interval: Duration::from_millis(200),
        ..Config::default()
    });

    // more lines than the ingest queue holds, producers have to wait for drains
    let per_producer = INGEST_QUEUE_CAPACITY / 2;
    let producers: Vec<_> = ["web", "worker", "cron"]
        .into_iter()
        .map(|container| {
            let handle = handle.clone();
            tokio::spawn(async move {
                for _ in 0..per_producer {
                    handle
                        .record("pump-1", container)
                        .await
                        .expect("failed to record");
                }
            })
        })
        .collect();

    let expected = per_producer as u64;
    let mut totals: HashMap<String, u64> = HashMap::new();
    let receive = async {
        let mut buf = vec![0u8; 65_536];
        while ["web", "worker", "cron"]
            .iter()
            .any(|c| totals.get(*c).copied().unwrap_or(0) < expected)
        {
            let n = collector.recv(&mut buf).await.expect("recv failed");
            let datagram = std::str::from_utf8(&buf[..n]).expect("payload is not UTF-8");
            if datagram.is_empty() {
                // an interval that saw no lines
                continue;
            }
            assert!(datagram.starts_with("logspout_log_count_by_container,"));
            assert!(!datagram.ends_with('\n'));
            parse_datagram(datagram, &mut totals);
        }
    };

    if timeout(Duration::from_secs(10), receive).await.is_err() {
        panic!("timed out waiting for metrics, got {totals:?}");
    }
    for producer in producers {
        producer.await.expect("producer failed");
    }

    assert_eq!(totals.len(), 3);
    assert!(totals.values().all(|total| *total == expected));

    cancel_token.cancel();
}

#[tokio::test]
async fn http_collector_failure_does_not_stop_later_cycles() {
    let mut server = Server::new_async().await;
    let failing = server
        .mock("POST", "/write?db=logs")
        .match_header("content-type", "text/plain")
        .match_body(Matcher::Regex("Count=1".to_string()))
        .with_status(500)
        .with_body("Internal Server Error")
        .expect(1)
        .create_async()
        .await;
    let succeeding = server
        .mock("POST", "/write?db=logs")
        .match_header("content-type", "text/plain")
        .match_body(Matcher::Regex("Count=1".to_string()))
        .with_status(204)
        .expect(1)
        .create_async()
        .await;

    let (handle, _alerts, cancel_token) = start_service(Config {
        protocol: Protocol::Http,
        host_port: server.url().trim_start_matches("http://").to_string(),
        database_name: "logs".to_string(),
        flush_interval: Duration::from_millis(200),
        ..Config::default()
    });

    let cycles = async {
        handle.record("pump-1", "web").await.expect("failed to record");
        while !failing.matched_async().await {
            sleep(Duration::from_millis(50)).await;
        }

        handle.record("pump-1", "web").await.expect("failed to record");
        while !succeeding.matched_async().await {
            sleep(Duration::from_millis(50)).await;
        }
    };

    if timeout(Duration::from_secs(5), cycles).await.is_err() {
        panic!("timed out before the collector saw both cycles");
    }
    failing.assert_async().await;
    succeeding.assert_async().await;

    cancel_token.cancel();
}

#[test]
fn unsupported_protocol_fails_fast() {
    let result = Config::from_lookup(|name| match name {
        "METRICS_PROTOCOL" => Some("tcp".to_string()),
        _ => None,
    });
    assert!(result.is_err());
}
