use std::collections::HashMap;
use std::net::Ipv4Addr;

use color_eyre::Result;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::{Map, Value, json};
use tracing::debug;

use super::Probe;
use crate::command::{self, CommandOutput};
use crate::config::{Config, DEFAULT_ROUTE_HOST, PingConfig};
use crate::system::platform;

pub struct PingProbe;

/// Find the IPv4 default gateway in routing-table output.
///
/// Understands `default <gw> ...` and `default via <gw> ...` rows as well as
/// `0.0.0.0 ... <gw>` rows.
pub fn parse_default_route<S: AsRef<str>>(lines: &[S]) -> Option<Ipv4Addr> {
    lines.iter().find_map(|line| {
        let mut tokens = line.as_ref().split_whitespace();
        match tokens.next()? {
            "default" => tokens.find_map(|t| t.parse::<Ipv4Addr>().ok()),
            "0.0.0.0" => tokens
                .filter_map(|t| t.parse::<Ipv4Addr>().ok())
                .find(|ip| !ip.is_unspecified()),
            _ => None,
        }
    })
}

/// Hosts to ping, in order, with `default_route` resolved.
///
/// The placeholder is dropped when no gateway is known. When the gateway is
/// the configured home router the extra home hosts are appended.
pub fn ping_targets(config: &PingConfig, gateway: Option<&str>) -> Vec<String> {
    let mut hosts: Vec<&str> = Vec::new();
    for host in &config.hosts {
        if host == DEFAULT_ROUTE_HOST {
            if let Some(gw) = gateway {
                hosts.push(gw);
            }
        } else {
            hosts.push(host);
        }
    }
    if gateway == Some(config.home_router.as_str()) {
        hosts.extend(config.additional_home_hosts.iter().map(String::as_str));
    }

    let mut targets: Vec<String> = Vec::with_capacity(hosts.len());
    for host in hosts {
        if !targets.iter().any(|t| t == host) {
            targets.push(host.to_string());
        }
    }
    targets
}

/// Round-trip time of a single-packet ping run, e.g. `"12.3ms"`.
///
/// With one packet min, avg and max coincide, so the first figure is used.
pub fn parse_rtt<S: AsRef<str>>(lines: &[S]) -> Option<String> {
    lines.iter().find_map(|line| {
        let line = line.as_ref().trim();
        if line.starts_with("round-trip ") || line.starts_with("rtt ") {
            let (_, stats) = line.split_once(" = ")?;
            let avg = stats.split('/').next()?.trim();
            return (!avg.is_empty()).then(|| format!("{avg}ms"));
        }
        // Windows: "Minimum = 1ms, Maximum = 2ms, Average = 1ms"
        let (_, avg) = line.split_once("Average = ")?;
        let avg = avg.trim().trim_end_matches("ms");
        (!avg.is_empty()).then(|| format!("{avg}ms"))
    })
}

pub fn ping_result(output: Option<&CommandOutput>) -> Value {
    match output.and_then(|out| parse_rtt(&out.lines())) {
        Some(rtt) => json!({ "rtt": rtt }),
        None => json!({ "timeout": true }),
    }
}

pub fn ping_report(targets: &[String], outputs: &HashMap<String, CommandOutput>) -> Value {
    let map: Map<String, Value> = targets
        .iter()
        .map(|host| (host.clone(), ping_result(outputs.get(host))))
        .collect();
    Value::Object(map)
}

async fn default_gateway() -> Option<Ipv4Addr> {
    let spec = platform::route_command()?;
    match command::run(&spec).await {
        Ok(output) => parse_default_route(&output.lines()),
        Err(err) => {
            debug!(error = %err, "could not read routing table");
            None
        }
    }
}

impl Probe for PingProbe {
    fn name(&self) -> &'static str {
        "ping"
    }

    fn collect<'a>(&'a self, config: &'a Config) -> BoxFuture<'a, Result<Value>> {
        async move {
            let gateway = default_gateway().await.map(|ip| ip.to_string());
            let targets = ping_targets(&config.ping, gateway.as_deref());

            let outputs = command::run_parallel(targets.iter().map(|host| {
                (
                    host.clone(),
                    platform::ping_command(host, config.ping.timeout_secs),
                )
            }))
            .await;

            Ok(ping_report(&targets, &outputs))
        }
        .boxed()
    }
}
