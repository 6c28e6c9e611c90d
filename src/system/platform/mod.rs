//! Per-OS knowledge: which commands to run and where the kernel exposes
//! counters. This is the only place that branches on the target OS.

use crate::command::CommandSpec;

/// Cumulative CPU time counters, in whatever tick unit the platform uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CpuTimes {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
}

impl CpuTimes {
    pub fn total(&self) -> u64 {
        self.user
            .saturating_add(self.nice)
            .saturating_add(self.system)
            .saturating_add(self.idle)
            .saturating_add(self.iowait)
            .saturating_add(self.irq)
            .saturating_add(self.softirq)
            .saturating_add(self.steal)
    }
}

/// Where cumulative CPU counters come from.
#[derive(Clone, Copy, Debug)]
pub enum CpuTimesSource {
    /// `/proc/stat`-style aggregate `cpu` line.
    ProcStat(&'static str),
    /// Ask the kernel directly through [`kernel_cpu_times`].
    Kernel,
    Unavailable,
}

/// Where the memory breakdown comes from.
#[derive(Clone, Debug)]
pub enum MemorySource {
    /// `/proc/meminfo`-style `Key: value kB` file.
    Meminfo(&'static str),
    /// `vm_stat`-style page counts.
    VmStat(CommandSpec),
    Unavailable,
}

/// Where per-interface byte counters come from.
#[derive(Clone, Debug)]
pub enum BandwidthSource {
    /// `/proc/net/dev`-style table.
    ProcNetDev(&'static str),
    /// `netstat -inb`-style table.
    Netstat(CommandSpec),
    /// Ask sysinfo.
    Sysinfo,
}

pub trait PlatformExtensions {
    fn cpu_times_source() -> CpuTimesSource;
    fn kernel_cpu_times() -> Option<CpuTimes>;
    fn memory_source() -> MemorySource;
    fn bandwidth_source() -> BandwidthSource;
    fn interfaces_command() -> Option<CommandSpec>;
    fn route_command() -> Option<CommandSpec>;
    fn ping_command(host: &str, timeout_secs: u32) -> CommandSpec;
    fn wireless_command(path: &str) -> CommandSpec;
    fn default_wireless_path() -> Option<String>;
    fn default_hypervisor_path() -> String;
    fn resolver_config_path() -> Option<&'static str>;
    fn root_path() -> &'static str;
}

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "macos")]
mod macos;
#[cfg(target_os = "windows")]
mod windows;

#[cfg(target_os = "linux")]
use linux as platform_impl;
#[cfg(target_os = "macos")]
use macos as platform_impl;
#[cfg(target_os = "windows")]
use windows as platform_impl;

pub fn cpu_times_source() -> CpuTimesSource {
    platform_impl::Platform::cpu_times_source()
}

pub fn kernel_cpu_times() -> Option<CpuTimes> {
    platform_impl::Platform::kernel_cpu_times()
}

pub fn memory_source() -> MemorySource {
    platform_impl::Platform::memory_source()
}

pub fn bandwidth_source() -> BandwidthSource {
    platform_impl::Platform::bandwidth_source()
}

pub fn interfaces_command() -> Option<CommandSpec> {
    platform_impl::Platform::interfaces_command()
}

pub fn route_command() -> Option<CommandSpec> {
    platform_impl::Platform::route_command()
}

pub fn ping_command(host: &str, timeout_secs: u32) -> CommandSpec {
    platform_impl::Platform::ping_command(host, timeout_secs)
}

pub fn wireless_command(path: &str) -> CommandSpec {
    platform_impl::Platform::wireless_command(path)
}

pub fn default_wireless_path() -> Option<String> {
    platform_impl::Platform::default_wireless_path()
}

pub fn default_hypervisor_path() -> String {
    platform_impl::Platform::default_hypervisor_path()
}

pub fn resolver_config_path() -> Option<&'static str> {
    platform_impl::Platform::resolver_config_path()
}

/// Filesystem root whose disk usage is reported.
pub fn root_path() -> &'static str {
    platform_impl::Platform::root_path()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_is_single_packet_with_timeout() {
        let spec = ping_command("192.0.2.1", 1);
        assert_eq!(spec.program, "ping");
        assert_eq!(spec.args.last().map(String::as_str), Some("192.0.2.1"));
        assert!(spec.args.iter().any(|a| a == "1"));
        assert!(!spec.check);
    }

    #[test]
    fn hypervisor_path_is_not_empty() {
        assert!(!default_hypervisor_path().is_empty());
    }

    #[test]
    fn cpu_counters_have_a_source() {
        match cpu_times_source() {
            CpuTimesSource::ProcStat(path) => assert!(!path.is_empty()),
            CpuTimesSource::Kernel => {
                let times = kernel_cpu_times().expect("kernel counters");
                assert!(times.total() > 0);
                assert!(times.user + times.system > 0);
            }
            CpuTimesSource::Unavailable => panic!("no cpu counters on a supported platform"),
        }
    }

    #[test]
    fn sources_do_not_panic() {
        let _ = cpu_times_source();
        let _ = memory_source();
        let _ = bandwidth_source();
        let _ = interfaces_command();
        let _ = route_command();
        let _ = default_wireless_path();
        let _ = resolver_config_path();
    }
}
