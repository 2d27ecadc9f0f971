// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Line protocol encoding: `measurement[,tag=value...] field=value[,field=value...] timestamp`.
//!
//! Tag and field values are written verbatim. Spaces, commas and equal signs
//! are not escaped, so callers must not put them in names or values.

use crate::aggregator::Snapshot;
use crate::constants::{
    COLLECTOR_ID_TAG, CONTAINER_NAME_TAG, COUNT_FIELD, PAYLOAD_BUFFER_CAPACITY,
};
use std::collections::BTreeMap;

/// One point of a payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetricPoint {
    pub measurement: String,
    /// Written in ascending byte order of the tag key.
    pub tags: BTreeMap<String, String>,
    /// Written in the order given.
    pub fields: Vec<(String, String)>,
    /// Nanoseconds since the Unix epoch.
    pub timestamp: i64,
}

impl MetricPoint {
    /// Points of one published interval, all stamped with the same instant.
    pub fn from_snapshot(measurement: &str, snapshot: &Snapshot, timestamp: i64) -> Vec<Self> {
        snapshot
            .iter()
            .map(|(key, count)| MetricPoint {
                measurement: measurement.to_string(),
                tags: BTreeMap::from([
                    (CONTAINER_NAME_TAG.to_string(), key.container_name.to_string()),
                    (COLLECTOR_ID_TAG.to_string(), key.collector_id.to_string()),
                ]),
                fields: vec![(COUNT_FIELD.to_string(), count.to_string())],
                timestamp,
            })
            .collect()
    }
}

/// Appends one point to `buf`, followed by a newline when `has_more` is set.
pub fn write_point(buf: &mut String, point: &MetricPoint, has_more: bool) {
    buf.push_str(&point.measurement);
    for (key, value) in &point.tags {
        buf.push(',');
        buf.push_str(key);
        buf.push('=');
        buf.push_str(value);
    }

    buf.push(' ');
    for (i, (key, value)) in point.fields.iter().enumerate() {
        if i > 0 {
            buf.push(',');
        }
        buf.push_str(key);
        buf.push('=');
        buf.push_str(value);
    }

    buf.push(' ');
    buf.push_str(&point.timestamp.to_string());
    if has_more {
        buf.push('\n');
    }
}

/// Encodes `points` into one payload. Points are separated by newlines, the
/// last one is not followed by one.
#[must_use]
pub fn encode(points: &[MetricPoint]) -> String {
    let mut buf = String::with_capacity(PAYLOAD_BUFFER_CAPACITY);
    for (i, point) in points.iter().enumerate() {
        write_point(&mut buf, point, i + 1 < points.len());
    }
    buf
}
