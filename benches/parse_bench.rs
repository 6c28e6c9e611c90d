use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use sysprobe::format::humanize;
use sysprobe::probe::bandwidth::parse_proc_net_dev;
use sysprobe::probe::cpu::{TopProcess, top_processes};
use sysprobe::probe::interfaces::parse_interfaces;

fn make_ip_addr(n: usize) -> Vec<String> {
    let mut lines = Vec::with_capacity(n * 4);
    for i in 0..n {
        lines.push(format!(
            "{}: veth{i}@if{}: <BROADCAST,MULTICAST,UP,LOWER_UP> mtu 1500 qdisc noqueue state UP",
            i + 2,
            i + 100
        ));
        lines.push(format!(
            "    link/ether 02:42:ac:11:{:02x}:{:02x} brd ff:ff:ff:ff:ff:ff",
            (i >> 8) & 0xff,
            i & 0xff
        ));
        lines.push(format!(
            "    inet 10.{}.{}.1/24 brd 10.{}.{}.255 scope global veth{i}",
            (i >> 8) & 0xff,
            i & 0xff,
            (i >> 8) & 0xff,
            i & 0xff
        ));
        lines.push(format!("    inet6 fe80::{i:x}/64 scope link"));
    }
    lines
}

fn make_proc_net_dev(n: usize) -> String {
    let mut text = String::from(
        "Inter-|   Receive                                                |  Transmit\n \
         face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed\n",
    );
    for i in 0..n {
        text.push_str(&format!(
            "veth{i}: {} {} 0 0 0 0 0 0 {} {} 0 0 0 0 0 0\n",
            i * 1500,
            i,
            i * 900,
            i
        ));
    }
    text
}

fn make_processes(n: usize) -> Vec<TopProcess> {
    (0..n)
        .map(|i| TopProcess {
            pid: i as u32 + 1,
            cpu: ((i * 37) % 1000) as f64 / 10.0,
            name: format!("proc_{i}"),
        })
        .collect()
}

fn bench_humanize(c: &mut Criterion) {
    let values: Vec<f64> = (0..1000u32)
        .map(|i| f64::from(i).powi(4) * 1.37)
        .collect();
    c.bench_function("humanize_1000_values", |b| {
        b.iter(|| {
            for v in &values {
                black_box(humanize(black_box(*v)));
            }
        })
    });
}

fn bench_parse_interfaces(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_interfaces_16_128_1024");
    for size in [16usize, 128, 1024] {
        let lines = make_ip_addr(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &lines, |b, lines| {
            b.iter(|| black_box(parse_interfaces(black_box(lines.as_slice()))))
        });
    }
    group.finish();
}

fn bench_parse_proc_net_dev(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_proc_net_dev_16_128_1024");
    for size in [16usize, 128, 1024] {
        let text = make_proc_net_dev(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &text, |b, text| {
            b.iter(|| black_box(parse_proc_net_dev(black_box(text))))
        });
    }
    group.finish();
}

fn bench_top_processes(c: &mut Criterion) {
    let mut group = c.benchmark_group("top_processes_500_1000_2000");
    for size in [500usize, 1000, 2000] {
        let processes = make_processes(size);
        group.bench_with_input(
            BenchmarkId::from_parameter(size),
            &processes,
            |b, processes| {
                b.iter(|| black_box(top_processes(black_box(processes.clone()), 5)))
            },
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_humanize,
    bench_parse_interfaces,
    bench_parse_proc_net_dev,
    bench_top_processes
);
criterion_main!(benches);
