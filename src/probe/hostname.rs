use color_eyre::Result;
use color_eyre::eyre::eyre;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Value;
use sysinfo::System;

use super::Probe;
use crate::config::Config;

pub struct HostnameProbe;

impl Probe for HostnameProbe {
    fn name(&self) -> &'static str {
        "hostname"
    }

    fn collect<'a>(&'a self, _config: &'a Config) -> BoxFuture<'a, Result<Value>> {
        async {
            System::host_name()
                .map(Value::String)
                .ok_or_else(|| eyre!("hostname is not available"))
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reports_a_non_empty_string() {
        let value = HostnameProbe.collect(&Config::default()).await.unwrap();
        let name = value.as_str().expect("hostname is a string");
        assert!(!name.is_empty());
    }
}
