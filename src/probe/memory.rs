use std::collections::HashMap;

use color_eyre::Result;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::{Map, Value};
use sysinfo::System;
use tracing::debug;

use super::Probe;
use crate::command;
use crate::config::Config;
use crate::format::humanize;
use crate::system::platform::{self, MemorySource};

pub struct MemoryProbe;

/// Kernel memory categories, in bytes. Fields a platform does not expose
/// stay `None`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemoryBreakdown {
    pub free: Option<u64>,
    pub wired: Option<u64>,
    pub active: Option<u64>,
    pub inactive: Option<u64>,
}

/// `/proc/meminfo`: `Key:   value kB` lines.
pub fn parse_meminfo(contents: &str) -> MemoryBreakdown {
    let mut fields = HashMap::new();
    for line in contents.lines() {
        let Some((key, rest)) = line.split_once(':') else {
            continue;
        };
        let mut parts = rest.split_whitespace();
        let Some(Ok(value)) = parts.next().map(str::parse::<u64>) else {
            continue;
        };
        let bytes = match parts.next() {
            Some("kB") => value.saturating_mul(1024),
            _ => value,
        };
        fields.insert(key.trim(), bytes);
    }
    MemoryBreakdown {
        free: fields.get("MemFree").copied(),
        wired: fields.get("Unevictable").copied(),
        active: fields.get("Active").copied(),
        inactive: fields.get("Inactive").copied(),
    }
}

/// `vm_stat`: a page-size header followed by `Pages <kind>:   <count>.` lines.
pub fn parse_vm_stat<S: AsRef<str>>(lines: &[S]) -> MemoryBreakdown {
    let mut page_size = 4096;
    let mut pages = HashMap::new();
    for line in lines {
        let line = line.as_ref();
        if let Some(rest) = line.split("page size of ").nth(1) {
            if let Some(Ok(size)) = rest.split_whitespace().next().map(str::parse::<u64>) {
                page_size = size;
            }
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        if let Ok(count) = value.trim().trim_end_matches('.').parse::<u64>() {
            pages.insert(key.trim().to_string(), count);
        }
    }
    let bytes = |key: &str| pages.get(key).map(|p| p.saturating_mul(page_size));
    MemoryBreakdown {
        free: bytes("Pages free"),
        wired: bytes("Pages wired down"),
        active: bytes("Pages active"),
        inactive: bytes("Pages inactive"),
    }
}

async fn breakdown(source: MemorySource) -> Option<MemoryBreakdown> {
    match source {
        MemorySource::Meminfo(path) => match tokio::fs::read_to_string(path).await {
            Ok(contents) => Some(parse_meminfo(&contents)),
            Err(err) => {
                debug!(path, error = %err, "memory breakdown unavailable");
                None
            }
        },
        MemorySource::VmStat(spec) => match command::run(&spec).await {
            Ok(output) => Some(parse_vm_stat(&output.lines())),
            Err(err) => {
                debug!(error = %err, "memory breakdown unavailable");
                None
            }
        },
        MemorySource::Unavailable => None,
    }
}

/// Humanized report. `free` falls back to the sysinfo figure.
pub fn memory_report(
    breakdown: MemoryBreakdown,
    total: u64,
    used: u64,
    available: u64,
    free_fallback: u64,
) -> Value {
    let mut out = Map::new();
    let mut put = |key: &str, bytes: Option<u64>| {
        if let Some(bytes) = bytes {
            out.insert(key.to_string(), Value::String(humanize(bytes as f64)));
        }
    };
    put("free", breakdown.free.or(Some(free_fallback)));
    put("wired", breakdown.wired);
    put("active", breakdown.active);
    put("inactive", breakdown.inactive);
    put("total", Some(total));
    put("used", Some(used));
    put("available", Some(available));
    Value::Object(out)
}

impl Probe for MemoryProbe {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn collect<'a>(&'a self, _config: &'a Config) -> BoxFuture<'a, Result<Value>> {
        async {
            let mut sys = System::new();
            sys.refresh_memory();
            let detail = breakdown(platform::memory_source()).await.unwrap_or_default();
            Ok(memory_report(
                detail,
                sys.total_memory(),
                sys.used_memory(),
                sys.available_memory(),
                sys.free_memory(),
            ))
        }
        .boxed()
    }
}
