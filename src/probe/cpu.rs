use std::time::Duration;

use color_eyre::Result;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::Value;
use sysinfo::{MINIMUM_CPU_UPDATE_INTERVAL, ProcessRefreshKind, ProcessesToUpdate, System};
use tracing::debug;

use super::Probe;
use crate::config::Config;
use crate::system::platform::{self, CpuTimesSource};

pub use crate::system::platform::CpuTimes;

pub struct CpuProbe;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TopProcess {
    pub pid: u32,
    pub cpu: f64,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CpuReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<f64>,
    pub usage: f64,
    pub top: Vec<TopProcess>,
}

/// Parse the aggregate `cpu` line of `/proc/stat`.
pub fn parse_proc_stat(contents: &str) -> Option<CpuTimes> {
    let line = contents.lines().find(|l| l.starts_with("cpu "))?;
    let fields: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .map(|f| f.parse().ok())
        .collect::<Option<_>>()?;
    // Older kernels stop before steal.
    let field = |i: usize| fields.get(i).copied().unwrap_or(0);
    if fields.len() < 4 {
        return None;
    }
    Some(CpuTimes {
        user: field(0),
        nice: field(1),
        system: field(2),
        idle: field(3),
        iowait: field(4),
        irq: field(5),
        softirq: field(6),
        steal: field(7),
    })
}

/// User and system percentages for the interval between two samples.
pub fn user_system_percent(before: &CpuTimes, after: &CpuTimes) -> Option<(f64, f64)> {
    let elapsed = after.total().checked_sub(before.total())?;
    if elapsed == 0 {
        return None;
    }
    let share = |a: u64, b: u64| round1(a.saturating_sub(b) as f64 * 100.0 / elapsed as f64);
    Some((
        share(after.user, before.user),
        share(after.system, before.system),
    ))
}

/// The `count` busiest processes, highest CPU share first.
pub fn top_processes(mut procs: Vec<TopProcess>, count: usize) -> Vec<TopProcess> {
    procs.sort_by(|a, b| b.cpu.total_cmp(&a.cpu).then(a.pid.cmp(&b.pid)));
    procs.truncate(count);
    procs
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// One sample of the cumulative counters, or `None` where the platform has none.
pub async fn read_cpu_times(source: CpuTimesSource) -> Option<CpuTimes> {
    match source {
        CpuTimesSource::ProcStat(path) => match tokio::fs::read_to_string(path).await {
            Ok(contents) => parse_proc_stat(&contents),
            Err(err) => {
                debug!(path, error = %err, "cpu counters unavailable");
                None
            }
        },
        CpuTimesSource::Kernel => platform::kernel_cpu_times(),
        CpuTimesSource::Unavailable => None,
    }
}

fn refresh(sys: &mut System) {
    sys.refresh_cpu_usage();
    sys.refresh_processes_specifics(
        ProcessesToUpdate::All,
        true,
        ProcessRefreshKind::nothing().with_cpu(),
    );
}

impl Probe for CpuProbe {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn collect<'a>(&'a self, config: &'a Config) -> BoxFuture<'a, Result<Value>> {
        async move {
            let source = platform::cpu_times_source();
            let interval =
                Duration::from_millis(config.general.cpu_sample_ms).max(MINIMUM_CPU_UPDATE_INTERVAL);

            // The first sample only primes the counters.
            let mut sys = System::new();
            refresh(&mut sys);
            let before = read_cpu_times(source).await;

            tokio::time::sleep(interval).await;

            refresh(&mut sys);
            let after = read_cpu_times(source).await;

            let split = before
                .zip(after)
                .and_then(|(b, a)| user_system_percent(&b, &a));

            let procs = sys
                .processes()
                .iter()
                .map(|(pid, process)| TopProcess {
                    pid: pid.as_u32(),
                    cpu: round1(process.cpu_usage() as f64),
                    name: process.name().to_string_lossy().to_string(),
                })
                .collect();

            let report = CpuReport {
                user: split.map(|(user, _)| user),
                system: split.map(|(_, system)| system),
                usage: round1(sys.global_cpu_usage() as f64),
                top: top_processes(procs, config.general.top_processes),
            };
            Ok(serde_json::to_value(report)?)
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STAT: &str = "\
cpu  4705 356 584 3699 23 0 12 0 0 0
cpu0 1393 280 320 1000 10 0 5 0 0 0
intr 114930548 113199788 3 0 5 263 0 4 [... lots more numbers ...]
";

    #[test]
    fn parses_aggregate_line() {
        let times = parse_proc_stat(STAT).unwrap();
        assert_eq!(times.user, 4705);
        assert_eq!(times.system, 584);
        assert_eq!(times.idle, 3699);
        assert_eq!(times.total(), 4705 + 356 + 584 + 3699 + 23 + 12);
    }

    #[test]
    fn short_or_garbled_line_is_rejected() {
        assert_eq!(parse_proc_stat("cpu  1 2\n"), None);
        assert_eq!(parse_proc_stat("cpu  a b c d\n"), None);
        assert_eq!(parse_proc_stat("intr 1 2 3\n"), None);
    }

    #[test]
    fn percentages_from_two_samples() {
        let before = CpuTimes {
            user: 100,
            system: 50,
            idle: 850,
            ..CpuTimes::default()
        };
        let after = CpuTimes {
            user: 125,
            system: 60,
            idle: 1015,
            ..CpuTimes::default()
        };
        assert_eq!(user_system_percent(&before, &after), Some((12.5, 5.0)));
    }

    #[test]
    fn identical_samples_have_no_split() {
        let t = CpuTimes {
            user: 1,
            idle: 1,
            ..CpuTimes::default()
        };
        assert_eq!(user_system_percent(&t, &t), None);
    }

    #[test]
    fn top_processes_sorted_and_truncated() {
        let procs = vec![
            TopProcess { pid: 1, cpu: 0.5, name: "init".into() },
            TopProcess { pid: 7, cpu: 42.0, name: "cc1".into() },
            TopProcess { pid: 3, cpu: 9.1, name: "sshd".into() },
            TopProcess { pid: 2, cpu: 9.1, name: "kthreadd".into() },
        ];
        let top = top_processes(procs, 3);
        let pids: Vec<u32> = top.iter().map(|p| p.pid).collect();
        assert_eq!(pids, vec![7, 2, 3]);
    }

    #[test]
    fn omits_split_when_unavailable() {
        let report = CpuReport {
            user: None,
            system: None,
            usage: 3.2,
            top: Vec::new(),
        };
        let value = serde_json::to_value(report).unwrap();
        assert!(value.get("user").is_none());
        assert_eq!(value["usage"], 3.2);
    }

    #[tokio::test]
    async fn counters_are_readable_and_monotonic() {
        let source = platform::cpu_times_source();
        let before = read_cpu_times(source).await.expect("first sample");
        tokio::time::sleep(Duration::from_millis(50)).await;
        let after = read_cpu_times(source).await.expect("second sample");
        assert!(before.total() > 0);
        assert!(after.total() >= before.total());
    }
}
