use color_eyre::Result;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::{Map, Value};

use super::{Probe, is_loopback};
use crate::command;
use crate::config::Config;
use crate::system::platform;

pub struct InterfacesProbe;

/// Interface name followed by its addresses, in the order the tool lists them.
pub type InterfaceAddrs = Vec<(String, Vec<String>)>;

/// Parse `ifconfig -a` or `ip addr show` output.
///
/// Unindented lines open a new interface; indented `inet`/`inet6` lines
/// belong to the most recent one. Link-local addresses, loopback
/// interfaces and interfaces without addresses are dropped.
pub fn parse_interfaces<S: AsRef<str>>(lines: &[S]) -> InterfaceAddrs {
    let mut out: InterfaceAddrs = Vec::new();
    let mut current: Option<usize> = None;

    for line in lines {
        let line = line.as_ref();
        if line.trim().is_empty() {
            continue;
        }
        if !line.starts_with(char::is_whitespace) {
            current = interface_name(line).map(|name| {
                out.iter()
                    .position(|(existing, _)| *existing == name)
                    .unwrap_or_else(|| {
                        out.push((name, Vec::new()));
                        out.len() - 1
                    })
            });
            continue;
        }
        let (Some(idx), Some(addr)) = (current, inet_address(line)) else {
            continue;
        };
        if !is_link_local(&addr) {
            out[idx].1.push(addr);
        }
    }

    out.retain(|(name, addrs)| !is_loopback(name) && !addrs.is_empty());
    out
}

fn interface_name(line: &str) -> Option<String> {
    let mut tokens = line.split_whitespace();
    let mut first = tokens.next()?;
    // `ip addr` prefixes an index: "2: eth0: <BROADCAST,...>"
    if let Some(index) = first.strip_suffix(':')
        && !index.is_empty()
        && index.chars().all(|c| c.is_ascii_digit())
    {
        first = tokens.next()?;
    }
    // Older net-tools ifconfig: "eth0      Link encap:Ethernet"
    let name = first.strip_suffix(':').unwrap_or(first);
    let name = name.split('@').next().unwrap_or(name);
    (!name.is_empty()).then(|| name.to_string())
}

fn inet_address(line: &str) -> Option<String> {
    let mut tokens = line.split_whitespace();
    match tokens.next()? {
        "inet" | "inet6" => {}
        _ => return None,
    }
    let raw = tokens.next()?;
    let raw = raw.strip_prefix("addr:").unwrap_or(raw);
    let addr = raw.split(['/', '%']).next().unwrap_or(raw);
    (!addr.is_empty()).then(|| addr.to_string())
}

fn is_link_local(addr: &str) -> bool {
    let lower = addr.to_ascii_lowercase();
    lower.starts_with("fe80") || lower.starts_with("fd00")
}

pub fn interfaces_value(parsed: InterfaceAddrs) -> Value {
    let map: Map<String, Value> = parsed
        .into_iter()
        .map(|(name, addrs)| {
            (
                name,
                Value::Array(addrs.into_iter().map(Value::String).collect()),
            )
        })
        .collect();
    Value::Object(map)
}

impl Probe for InterfacesProbe {
    fn name(&self) -> &'static str {
        "ip"
    }

    fn collect<'a>(&'a self, _config: &'a Config) -> BoxFuture<'a, Result<Value>> {
        async {
            let Some(spec) = platform::interfaces_command() else {
                return Ok(Value::Object(Map::new()));
            };
            let output = command::run(&spec).await?;
            Ok(interfaces_value(parse_interfaces(&output.lines())))
        }
        .boxed()
    }
}
