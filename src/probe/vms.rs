use color_eyre::Result;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Value;
use tracing::debug;

use super::Probe;
use crate::command::{self, CommandSpec};
use crate::config::Config;

pub struct VmsProbe;

const PLATFORM_TAG: &str = "vbox";

/// `<name>_<user>_<digits and underscores>` becomes `<name> (<user>)`.
///
/// The name part is the shortest prefix that still leaves a valid user and
/// numeric tail, so names may themselves contain underscores.
pub fn prettify_vm_name(raw: &str) -> String {
    for (idx, _) in raw.match_indices('_') {
        let name = &raw[..idx];
        let rest = &raw[idx + 1..];
        if name.is_empty() {
            continue;
        }
        let Some((user, tail)) = rest.split_once('_') else {
            break;
        };
        if !user.is_empty()
            && !tail.is_empty()
            && tail.chars().all(|c| c.is_ascii_digit() || c == '_')
        {
            return format!("{name} ({user})");
        }
    }
    raw.to_string()
}

/// `"name" {uuid}` rows from `VBoxManage list runningvms`.
pub fn parse_running_vms<S: AsRef<str>>(lines: &[S]) -> Vec<String> {
    lines
        .iter()
        .filter_map(|line| {
            let line = line.as_ref();
            let start = line.find('"')? + 1;
            let len = line[start..].find('"')?;
            let name = &line[start..start + len];
            (!name.is_empty()).then(|| format!("{PLATFORM_TAG} - {}", prettify_vm_name(name)))
        })
        .collect()
}

impl Probe for VmsProbe {
    fn name(&self) -> &'static str {
        "vms"
    }

    fn collect<'a>(&'a self, config: &'a Config) -> BoxFuture<'a, Result<Value>> {
        async move {
            let spec = CommandSpec::new(config.paths.hypervisor.as_str(), ["list", "runningvms"]);
            let output = match command::run(&spec).await {
                Ok(output) => output,
                Err(err) if err.is_not_found() => {
                    debug!(path = %config.paths.hypervisor, "hypervisor CLI not installed");
                    return Ok(Value::Array(Vec::new()));
                }
                Err(err) => return Err(err.into()),
            };
            Ok(serde_json::to_value(parse_running_vms(&output.lines()))?)
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vagrant_names_are_prettified() {
        assert_eq!(prettify_vm_name("vagrant_myuser_1234567890_1"), "vagrant (myuser)");
        assert_eq!(prettify_vm_name("web_app_alice_1600000000_42"), "web_app (alice)");
        assert_eq!(prettify_vm_name("box_bob_12_3_4"), "box (bob)");
    }

    #[test]
    fn other_names_are_untouched() {
        assert_eq!(prettify_vm_name("Windows 11"), "Windows 11");
        assert_eq!(prettify_vm_name("build_server"), "build_server");
        assert_eq!(prettify_vm_name("dev_alice_v2"), "dev_alice_v2");
        assert_eq!(prettify_vm_name("_alice_123"), "_alice_123");
    }

    #[test]
    fn running_vm_rows() {
        let lines = [
            "\"vagrant_myuser_1234567890_1\" {0b7f1c3e-0000-4000-8000-000000000001}",
            "\"Ubuntu Desktop\" {0b7f1c3e-0000-4000-8000-000000000002}",
            "VBoxManage: error: Failed to create the VirtualBox object!",
            "\"\" {0b7f1c3e-0000-4000-8000-000000000003}",
        ];
        assert_eq!(
            parse_running_vms(&lines),
            vec!["vbox - vagrant (myuser)", "vbox - Ubuntu Desktop"]
        );
    }
}
