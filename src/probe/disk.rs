use std::path::Path;

use color_eyre::Result;
use color_eyre::eyre::eyre;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::Value;
use sysinfo::Disks;
use tracing::debug;

use super::Probe;
use crate::config::Config;
use crate::format::{format_bytes, humanize};
use crate::system::platform;

pub struct DiskProbe;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DiskBytes {
    pub free: u64,
    pub total: u64,
    pub used: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DiskHuman {
    pub free: String,
    pub total: String,
    pub used: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DiskUsage {
    pub bytes: DiskBytes,
    pub human: DiskHuman,
    pub percent: u64,
}

/// Build the usage record from user-available and total bytes.
pub fn disk_usage(free: u64, total: u64) -> DiskUsage {
    let used = total.saturating_sub(free);
    let percent = if total == 0 {
        0
    } else {
        (u128::from(used) * 100 / u128::from(total)) as u64
    };
    DiskUsage {
        bytes: DiskBytes { free, total, used },
        human: DiskHuman {
            free: humanize(free as f64),
            total: humanize(total as f64),
            used: humanize(used as f64),
        },
        percent,
    }
}

/// Index of the mount holding `root`: the longest mount point it lies under.
pub fn root_mount_index<P: AsRef<Path>>(mounts: &[P], root: &Path) -> Option<usize> {
    mounts
        .iter()
        .enumerate()
        .filter(|(_, mount)| root.starts_with(mount.as_ref()))
        .max_by_key(|(_, mount)| mount.as_ref().as_os_str().len())
        .map(|(idx, _)| idx)
}

impl Probe for DiskProbe {
    fn name(&self) -> &'static str {
        "disk"
    }

    fn collect<'a>(&'a self, _config: &'a Config) -> BoxFuture<'a, Result<Value>> {
        async {
            let disks = Disks::new_with_refreshed_list();
            let root_path = Path::new(platform::root_path());
            let mounts: Vec<&Path> = disks.list().iter().map(|d| d.mount_point()).collect();
            let root = root_mount_index(&mounts, root_path)
                .and_then(|idx| disks.list().get(idx))
                .ok_or_else(|| eyre!("no filesystem mounted at {}", root_path.display()))?;

            debug!(
                mount = %root.mount_point().display(),
                available = %format_bytes(root.available_space()),
                total = %format_bytes(root.total_space()),
                "root filesystem"
            );
            let usage = disk_usage(root.available_space(), root.total_space());
            Ok(serde_json::to_value(usage)?)
        }
        .boxed()
    }
}
