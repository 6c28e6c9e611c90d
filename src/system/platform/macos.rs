use super::{BandwidthSource, CpuTimes, CpuTimesSource, MemorySource, PlatformExtensions};
use crate::command::CommandSpec;

const AIRPORT: &str =
    "/System/Library/PrivateFrameworks/Apple80211.framework/Versions/Current/Resources/airport";

pub struct Platform;

impl PlatformExtensions for Platform {
    fn cpu_times_source() -> CpuTimesSource {
        CpuTimesSource::Kernel
    }

    #[allow(deprecated)]
    fn kernel_cpu_times() -> Option<CpuTimes> {
        let mut info = unsafe { std::mem::zeroed::<libc::host_cpu_load_info>() };
        let mut count = libc::HOST_CPU_LOAD_INFO_COUNT;
        let ret = unsafe {
            libc::host_statistics(
                libc::mach_host_self(),
                libc::HOST_CPU_LOAD_INFO,
                &mut info as *mut libc::host_cpu_load_info as libc::host_info_t,
                &mut count,
            )
        };
        if ret != libc::KERN_SUCCESS {
            return None;
        }
        let ticks = |state: libc::c_int| u64::from(info.cpu_ticks[state as usize]);
        Some(CpuTimes {
            user: ticks(libc::CPU_STATE_USER),
            nice: ticks(libc::CPU_STATE_NICE),
            system: ticks(libc::CPU_STATE_SYSTEM),
            idle: ticks(libc::CPU_STATE_IDLE),
            ..CpuTimes::default()
        })
    }

    fn memory_source() -> MemorySource {
        MemorySource::VmStat(CommandSpec::new("vm_stat", Vec::<String>::new()))
    }

    fn bandwidth_source() -> BandwidthSource {
        BandwidthSource::Netstat(CommandSpec::new("netstat", ["-inb"]))
    }

    fn interfaces_command() -> Option<CommandSpec> {
        Some(CommandSpec::new("ifconfig", ["-a"]))
    }

    fn route_command() -> Option<CommandSpec> {
        Some(CommandSpec::new("netstat", ["-nr"]))
    }

    fn ping_command(host: &str, timeout_secs: u32) -> CommandSpec {
        // BSD ping takes -W in milliseconds.
        CommandSpec::new(
            "ping",
            [
                "-n".to_string(),
                "-c".to_string(),
                "1".to_string(),
                "-W".to_string(),
                (timeout_secs * 1000).to_string(),
                host.to_string(),
            ],
        )
    }

    fn wireless_command(path: &str) -> CommandSpec {
        CommandSpec::new(path, ["-I"])
    }

    fn default_wireless_path() -> Option<String> {
        Some(AIRPORT.to_string())
    }

    fn default_hypervisor_path() -> String {
        "/usr/local/bin/VBoxManage".to_string()
    }

    fn resolver_config_path() -> Option<&'static str> {
        Some("/etc/resolv.conf")
    }

    fn root_path() -> &'static str {
        "/"
    }
}
