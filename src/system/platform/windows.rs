use windows_sys::Win32::Foundation::FILETIME;
use windows_sys::Win32::System::Threading::GetSystemTimes;

use super::{BandwidthSource, CpuTimes, CpuTimesSource, MemorySource, PlatformExtensions};
use crate::command::CommandSpec;

fn filetime_ticks(ft: &FILETIME) -> u64 {
    (u64::from(ft.dwHighDateTime) << 32) | u64::from(ft.dwLowDateTime)
}

pub struct Platform;

impl PlatformExtensions for Platform {
    fn cpu_times_source() -> CpuTimesSource {
        CpuTimesSource::Kernel
    }

    fn kernel_cpu_times() -> Option<CpuTimes> {
        let mut idle = FILETIME {
            dwLowDateTime: 0,
            dwHighDateTime: 0,
        };
        let mut kernel = idle;
        let mut user = idle;
        let ok = unsafe { GetSystemTimes(&mut idle, &mut kernel, &mut user) };
        if ok == 0 {
            return None;
        }
        let idle = filetime_ticks(&idle);
        // Kernel time includes idle time.
        Some(CpuTimes {
            user: filetime_ticks(&user),
            system: filetime_ticks(&kernel).saturating_sub(idle),
            idle,
            ..CpuTimes::default()
        })
    }

    fn memory_source() -> MemorySource {
        MemorySource::Unavailable
    }

    fn bandwidth_source() -> BandwidthSource {
        BandwidthSource::Sysinfo
    }

    fn interfaces_command() -> Option<CommandSpec> {
        // ipconfig output has no indented `inet` lines to track.
        None
    }

    fn route_command() -> Option<CommandSpec> {
        Some(CommandSpec::new("route", ["print", "0.0.0.0"]))
    }

    fn ping_command(host: &str, timeout_secs: u32) -> CommandSpec {
        // Windows ping: -n count, -w timeout in milliseconds.
        CommandSpec::new(
            "ping",
            [
                "-n".to_string(),
                "1".to_string(),
                "-w".to_string(),
                (timeout_secs * 1000).to_string(),
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
        r"C:\Program Files\Oracle\VirtualBox\VBoxManage.exe".to_string()
    }

    fn resolver_config_path() -> Option<&'static str> {
        None
    }

    fn root_path() -> &'static str {
        "C:\\"
    }
}
