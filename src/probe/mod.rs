//! Probes: independent units that each produce one named fragment of the
//! report.
//!
//! Every probe splits into an I/O half (read a file, run a command, ask
//! sysinfo) and a pure parsing half. The parsers are public so they can be
//! exercised with canned tool output.

pub mod bandwidth;
pub mod cpu;
pub mod disk;
pub mod hostname;
pub mod interfaces;
pub mod memory;
pub mod nameservers;
pub mod ping;
pub mod registry;
pub mod vms;
pub mod wifi;

pub use registry::{Registry, Report};

use color_eyre::Result;
use futures::future::BoxFuture;
use serde_json::Value;

use crate::config::Config;

/// A named source of one report entry.
///
/// Probes hold no state between runs and must not depend on each other's
/// results; the registry may run them in any order or all at once.
pub trait Probe: Send + Sync {
    fn name(&self) -> &'static str;

    fn collect<'a>(&'a self, config: &'a Config) -> BoxFuture<'a, Result<Value>>;
}

pub(crate) fn is_loopback(iface: &str) -> bool {
    iface == "lo" || iface == "lo0" || iface.starts_with("Loopback")
}
