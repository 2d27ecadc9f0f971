// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use derive_more::Display;
use ustr::Ustr;

/// Identity of one log stream: the collector that saw the line and the
/// container that emitted it.
///
/// Both parts are interned, so keys are `Copy` and hash cheaply. The display
/// form `collector,container` is the canonical rendering.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[display("{collector_id},{container_name}")]
pub struct Key {
    pub collector_id: Ustr,
    pub container_name: Ustr,
}

impl Key {
    pub fn new(collector_id: &str, container_name: &str) -> Self {
        Key {
            collector_id: Ustr::from(collector_id),
            container_name: Ustr::from(container_name),
        }
    }
}

/// One observed log line. Every sample counts as exactly one line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sample {
    pub key: Key,
}

impl Sample {
    pub fn new(collector_id: &str, container_name: &str) -> Self {
        Sample {
            key: Key::new(collector_id, container_name),
        }
    }
}
