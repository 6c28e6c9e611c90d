use std::io::ErrorKind;

use color_eyre::Result;
use color_eyre::eyre::WrapErr;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Value;
use tracing::debug;

use super::Probe;
use crate::config::Config;
use crate::system::platform;

pub struct NameserversProbe;

/// `nameserver <addr>` entries, in file order.
pub fn parse_resolv_conf(contents: &str) -> Vec<String> {
    contents
        .lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            match (parts.next(), parts.next()) {
                (Some("nameserver"), Some(addr)) => Some(addr.to_string()),
                _ => None,
            }
        })
        .collect()
}

/// Nameservers from the resolver config at `path`. A missing file means none.
pub async fn read_nameservers(path: &str) -> Result<Vec<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => Ok(parse_resolv_conf(&contents)),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!(path, "no resolver config");
            Ok(Vec::new())
        }
        Err(err) => Err(err).wrap_err_with(|| format!("reading {path}")),
    }
}

impl Probe for NameserversProbe {
    fn name(&self) -> &'static str {
        "nameservers"
    }

    fn collect<'a>(&'a self, _config: &'a Config) -> BoxFuture<'a, Result<Value>> {
        async {
            let Some(path) = platform::resolver_config_path() else {
                return Ok(Value::Array(Vec::new()));
            };
            Ok(serde_json::to_value(read_nameservers(path).await?)?)
        }
        .boxed()
    }
}
