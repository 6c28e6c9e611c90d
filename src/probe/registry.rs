use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::Probe;
use super::{bandwidth, cpu, disk, hostname, interfaces, memory, nameservers, ping, vms, wifi};
use crate::config::Config;

/// Key under which a failed probe's message is reported.
pub const ERROR_KEY: &str = "error";

/// The aggregated report: one entry per registered probe.
///
/// Entries serialize in registration order; equality ignores order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Report {
    entries: Map<String, Value>,
}

impl Report {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `name` carries an error marker instead of data.
    pub fn is_error(&self, name: &str) -> bool {
        self.entries
            .get(name)
            .and_then(|v| v.as_object())
            .is_some_and(|obj| obj.len() == 1 && obj.contains_key(ERROR_KEY))
    }

    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.entries)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.entries)
    }

    fn insert(&mut self, name: &str, value: Value) {
        self.entries.insert(name.to_string(), value);
    }
}

/// The compiled-in, ordered list of probes.
#[derive(Clone, Default)]
pub struct Registry {
    probes: Vec<Arc<dyn Probe>>,
}

impl Registry {
    pub fn new() -> Self {
        Registry { probes: Vec::new() }
    }

    /// Every probe this build knows about, in report order.
    pub fn builtin() -> Self {
        let mut registry = Registry::new();
        registry.register(hostname::HostnameProbe);
        registry.register(cpu::CpuProbe);
        registry.register(memory::MemoryProbe);
        registry.register(disk::DiskProbe);
        registry.register(interfaces::InterfacesProbe);
        registry.register(wifi::WifiProbe);
        registry.register(nameservers::NameserversProbe);
        registry.register(bandwidth::BandwidthProbe);
        registry.register(ping::PingProbe);
        registry.register(vms::VmsProbe);
        registry
    }

    /// Append a probe. A second probe with an existing name is ignored.
    pub fn register<P: Probe + 'static>(&mut self, probe: P) -> bool {
        if self.contains(probe.name()) {
            warn!(probe = probe.name(), "duplicate probe name, ignoring");
            return false;
        }
        self.probes.push(Arc::new(probe));
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.probes.iter().any(|p| p.name() == name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.probes.iter().map(|p| p.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }

    /// Keep only the named probes.
    pub fn retain<S: AsRef<str>>(&mut self, names: &[S]) {
        self.probes
            .retain(|p| names.iter().any(|n| n.as_ref() == p.name()));
    }

    /// Drop the named probes.
    pub fn without<S: AsRef<str>>(&mut self, names: &[S]) {
        self.probes
            .retain(|p| !names.iter().any(|n| n.as_ref() == p.name()));
    }

    /// Run every probe and gather the results.
    ///
    /// Each probe runs as its own task, so a slow probe only costs wall
    /// time and a failing or panicking one only affects its own entry.
    pub async fn collect(&self, config: Arc<Config>) -> Report {
        let handles: Vec<_> = self
            .probes
            .iter()
            .map(|probe| {
                let probe = Arc::clone(probe);
                let config = Arc::clone(&config);
                tokio::spawn(async move { probe.collect(&config).await })
            })
            .collect();

        let results = join_all(handles).await;

        let mut report = Report::default();
        for (probe, joined) in self.probes.iter().zip(results) {
            let name = probe.name();
            let value = match joined {
                Ok(Ok(value)) => {
                    debug!(probe = name, "collected");
                    value
                }
                Ok(Err(err)) => {
                    warn!(probe = name, error = %err, "probe failed");
                    error_marker(format!("{err:#}"))
                }
                Err(join_err) => {
                    warn!(probe = name, error = %join_err, "probe aborted");
                    error_marker(panic_message(join_err))
                }
            };
            report.insert(name, value);
        }
        report
    }
}

fn error_marker(message: String) -> Value {
    let mut marker = Map::new();
    marker.insert(ERROR_KEY.to_string(), Value::String(message));
    Value::Object(marker)
}

fn panic_message(err: tokio::task::JoinError) -> String {
    if !err.is_panic() {
        return err.to_string();
    }
    let payload = err.into_panic();
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("probe panicked: {msg}")
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("probe panicked: {msg}")
    } else {
        "probe panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use color_eyre::eyre::eyre;
    use serde_json::json;
    use futures::FutureExt;
    use futures::future::BoxFuture;

    struct Fixed(&'static str, Value);

    impl Probe for Fixed {
        fn name(&self) -> &'static str {
            self.0
        }

        fn collect<'a>(&'a self, _config: &'a Config) -> BoxFuture<'a, color_eyre::Result<Value>> {
            async move { Ok(self.1.clone()) }.boxed()
        }
    }

    struct Failing;

    impl Probe for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn collect<'a>(&'a self, _config: &'a Config) -> BoxFuture<'a, color_eyre::Result<Value>> {
            async { Err(eyre!("device unplugged")) }.boxed()
        }
    }

    struct Panicking;

    impl Probe for Panicking {
        fn name(&self) -> &'static str {
            "panicking"
        }

        fn collect<'a>(&'a self, _config: &'a Config) -> BoxFuture<'a, color_eyre::Result<Value>> {
            async {
                let rows: Vec<u64> = Vec::new();
                Ok(json!(rows[3]))
            }
            .boxed()
        }
    }

    fn config() -> Arc<Config> {
        Arc::new(Config::default())
    }

    #[tokio::test]
    async fn every_probe_gets_one_entry() {
        let mut registry = Registry::new();
        registry.register(Fixed("a", json!(1)));
        registry.register(Failing);
        registry.register(Panicking);
        registry.register(Fixed("b", json!({"k": "v"})));

        let report = registry.collect(config()).await;

        assert_eq!(report.len(), 4);
        assert_eq!(report.get("a"), Some(&json!(1)));
        assert_eq!(report.get("b"), Some(&json!({"k": "v"})));
        assert!(report.is_error("failing"));
        assert!(report.is_error("panicking"));
        assert!(!report.is_error("b"));
        assert_eq!(
            report.get("failing").and_then(|v| v[ERROR_KEY].as_str()),
            Some("device unplugged")
        );
    }

    #[tokio::test]
    async fn report_order_follows_registration() {
        let mut registry = Registry::new();
        registry.register(Fixed("z", json!(null)));
        registry.register(Fixed("a", json!(null)));
        registry.register(Fixed("m", json!(null)));

        let report = registry.collect(config()).await;
        assert_eq!(report.names().collect::<Vec<_>>(), vec!["z", "a", "m"]);
    }

    #[tokio::test]
    async fn removing_a_probe_leaves_others_untouched() {
        let mut full = Registry::new();
        full.register(Fixed("a", json!([1, 2])));
        full.register(Failing);
        full.register(Fixed("b", json!("x")));

        let mut reduced = full.clone();
        reduced.without(&["failing"]);

        let full_report = full.collect(config()).await;
        let reduced_report = reduced.collect(config()).await;

        assert_eq!(reduced_report.len(), 2);
        assert!(reduced_report.get("failing").is_none());
        assert_eq!(reduced_report.get("a"), full_report.get("a"));
        assert_eq!(reduced_report.get("b"), full_report.get("b"));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut registry = Registry::new();
        assert!(registry.register(Fixed("a", json!(1))));
        assert!(!registry.register(Fixed("a", json!(2))));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn builtin_list_is_fixed() {
        let registry = Registry::builtin();
        assert_eq!(
            registry.names(),
            vec![
                "hostname",
                "cpu",
                "memory",
                "disk",
                "ip",
                "wifi",
                "nameservers",
                "bandwidth",
                "ping",
                "vms"
            ]
        );
    }

    #[test]
    fn retain_keeps_only_named() {
        let mut registry = Registry::builtin();
        registry.retain(&["disk", "ping", "unknown"]);
        assert_eq!(registry.names(), vec!["disk", "ping"]);
    }

    #[test]
    fn pretty_json_uses_two_space_indent() {
        let mut report = Report::default();
        report.insert("hostname", json!("box"));
        report.insert("nameservers", json!(["1.1.1.1"]));
        assert_eq!(
            report.to_pretty_json().unwrap(),
            "{\n  \"hostname\": \"box\",\n  \"nameservers\": [\n    \"1.1.1.1\"\n  ]\n}"
        );
    }

    #[test]
    fn report_equality_ignores_order() {
        let mut a = Report::default();
        a.insert("x", json!(1));
        a.insert("y", json!(2));
        let mut b = Report::default();
        b.insert("y", json!(2));
        b.insert("x", json!(1));
        assert_eq!(a, b);
    }
}
