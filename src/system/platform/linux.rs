use super::{BandwidthSource, CpuTimes, CpuTimesSource, MemorySource, PlatformExtensions};
use crate::command::CommandSpec;

pub struct Platform;

impl PlatformExtensions for Platform {
    fn cpu_times_source() -> CpuTimesSource {
        CpuTimesSource::ProcStat("/proc/stat")
    }

    fn kernel_cpu_times() -> Option<CpuTimes> {
        None
    }

    fn memory_source() -> MemorySource {
        MemorySource::Meminfo("/proc/meminfo")
    }

    fn bandwidth_source() -> BandwidthSource {
        BandwidthSource::ProcNetDev("/proc/net/dev")
    }

    fn interfaces_command() -> Option<CommandSpec> {
        // iproute2 ships everywhere; net-tools ifconfig often doesn't.
        Some(CommandSpec::new("ip", ["addr", "show"]))
    }

    fn route_command() -> Option<CommandSpec> {
        Some(CommandSpec::new("ip", ["-4", "route", "show", "default"]))
    }

    fn ping_command(host: &str, timeout_secs: u32) -> CommandSpec {
        // -W is in seconds on Linux iputils.
        CommandSpec::new(
            "ping",
            [
                "-n".to_string(),
                "-c".to_string(),
                "1".to_string(),
                "-W".to_string(),
                timeout_secs.to_string(),
                host.to_string(),
            ],
        )
    }

    fn wireless_command(path: &str) -> CommandSpec {
        CommandSpec::new(path, Vec::<String>::new())
    }

    fn default_wireless_path() -> Option<String> {
        None
    }

    fn default_hypervisor_path() -> String {
        "VBoxManage".to_string()
    }

    fn resolver_config_path() -> Option<&'static str> {
        Some("/etc/resolv.conf")
    }

    fn root_path() -> &'static str {
        "/"
    }
}
