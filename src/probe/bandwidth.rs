use std::time::{SystemTime, UNIX_EPOCH};

use color_eyre::Result;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::{Map, Value, json};
use sysinfo::Networks;

use super::{Probe, is_loopback};
use crate::command;
use crate::config::Config;
use crate::system::platform::{self, BandwidthSource};

pub struct BandwidthProbe;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Counters {
    #[serde(rename = "in")]
    pub bytes_in: u64,
    #[serde(rename = "out")]
    pub bytes_out: u64,
}

pub type InterfaceCounters = Vec<(String, Counters)>;

fn push_unique(out: &mut InterfaceCounters, name: &str, counters: Counters) {
    if is_loopback(name) || out.iter().any(|(existing, _)| existing == name) {
        return;
    }
    out.push((name.to_string(), counters));
}

/// Parse `netstat -inb`.
///
/// The table repeats an interface once per configured address; the first
/// row with readable byte columns wins.
pub fn parse_netstat<S: AsRef<str>>(lines: &[S]) -> InterfaceCounters {
    let mut out = Vec::new();
    for line in lines.iter().skip(1) {
        let parts: Vec<&str> = line.as_ref().split_whitespace().collect();
        // Rows without a link-layer address are one column short.
        let (ibytes, obytes) = match parts.len() {
            n if n >= 11 => (6, 9),
            10 => (5, 8),
            _ => continue,
        };
        let (Ok(bytes_in), Ok(bytes_out)) = (
            parts[ibytes].parse::<u64>(),
            parts[obytes].parse::<u64>(),
        ) else {
            continue;
        };
        push_unique(&mut out, parts[0], Counters { bytes_in, bytes_out });
    }
    out
}

/// Parse `/proc/net/dev`.
pub fn parse_proc_net_dev(contents: &str) -> InterfaceCounters {
    let mut out = Vec::new();
    for line in contents.lines() {
        let Some((name, rest)) = line.split_once(':') else {
            continue;
        };
        let fields: Vec<&str> = rest.split_whitespace().collect();
        let (Some(Ok(bytes_in)), Some(Ok(bytes_out))) = (
            fields.first().map(|f| f.parse::<u64>()),
            fields.get(8).map(|f| f.parse::<u64>()),
        ) else {
            continue;
        };
        push_unique(&mut out, name.trim(), Counters { bytes_in, bytes_out });
    }
    out
}

fn from_sysinfo() -> InterfaceCounters {
    let networks = Networks::new_with_refreshed_list();
    let mut out = Vec::new();
    for (name, data) in &networks {
        push_unique(
            &mut out,
            name,
            Counters {
                bytes_in: data.total_received(),
                bytes_out: data.total_transmitted(),
            },
        );
    }
    out.sort_by(|a, b| a.0.cmp(&b.0));
    out
}

pub fn bandwidth_value(timestamp_ms: u64, counters: InterfaceCounters) -> Value {
    let interfaces: Map<String, Value> = counters
        .into_iter()
        .map(|(name, c)| (name, json!({"in": c.bytes_in, "out": c.bytes_out})))
        .collect();
    json!({ "timestamp": timestamp_ms, "interfaces": interfaces })
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

impl Probe for BandwidthProbe {
    fn name(&self) -> &'static str {
        "bandwidth"
    }

    fn collect<'a>(&'a self, _config: &'a Config) -> BoxFuture<'a, Result<Value>> {
        async {
            let timestamp = now_ms();
            let counters = match platform::bandwidth_source() {
                BandwidthSource::ProcNetDev(path) => {
                    parse_proc_net_dev(&tokio::fs::read_to_string(path).await?)
                }
                BandwidthSource::Netstat(spec) => parse_netstat(&command::run(&spec).await?.lines()),
                BandwidthSource::Sysinfo => from_sysinfo(),
            };
            Ok(bandwidth_value(timestamp, counters))
        }
        .boxed()
    }
}
