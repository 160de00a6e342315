//! Performance benchmarks for the grouping transform, chart layout and
//! report statistics

use clap::Parser;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use devbench::{
    cli::Cli,
    config::validate_config,
    grouping::{group_levels, layout_coordinates},
    models::{samples, Config, MessageRow, ResultTree, ThroughputRow},
    stats::{message_step_stats, summarize_throughput},
};

/// Throughput-shaped tree: receiver -> sender -> statistic
fn create_tree(devices: usize, stats: &[&str]) -> ResultTree {
    let mut tree = ResultTree::new();
    for receiver in 0..devices {
        for sender in (0..devices).filter(|s| *s != receiver) {
            for (i, stat) in stats.iter().enumerate() {
                let path = [format!("dev{}", receiver), format!("dev{}", sender), stat.to_string()];
                tree.insert_path(&path, (receiver * 100 + sender * 10 + i) as f64)
                    .expect("uniform tree");
            }
        }
    }
    tree
}

fn create_throughput_rows(count: usize) -> Vec<ThroughputRow> {
    (0..count)
        .map(|i| ThroughputRow {
            bytes: 1000.0 + (i % 97) as f64,
            nanotime: 1_000_000_000.0 + (i % 13) as f64 * 1e6,
        })
        .collect()
}

fn create_throughput_csv(count: usize) -> String {
    let mut csv = String::from("from,to,bytes,nanotime\n");
    for row in create_throughput_rows(count) {
        csv.push_str(&format!("a,b,{},{}\n", row.bytes, row.nanotime));
    }
    csv
}

fn create_message_rows(count: usize) -> Vec<MessageRow> {
    (0..count)
        .map(|i| {
            let started = i as i64 * 10;
            MessageRow {
                from: "master".to_string(),
                to: format!("t{}", i % 4),
                message_size: Some(20),
                started,
                received: started + 3,
                finished: started + 7,
            }
        })
        .collect()
}

fn benchmark_grouping(c: &mut Criterion) {
    let mut group = c.benchmark_group("grouping");

    for devices in [4usize, 8, 16].iter() {
        let tree = create_tree(*devices, &["mean", "min", "max"]);
        group.bench_with_input(BenchmarkId::new("group_levels", devices), &tree, |b, tree| {
            b.iter(|| group_levels(black_box(tree)))
        });

        let grouped = group_levels(&tree).expect("uniform tree");
        group.bench_with_input(BenchmarkId::new("layout_coordinates", devices), &grouped, |b, grouped| {
            b.iter(|| layout_coordinates(black_box(grouped)))
        });
    }

    let tree = create_tree(8, &["mean"]);
    let json = tree.to_json_string().expect("serializable tree");
    group.bench_function("parse_result_json", |b| b.iter(|| ResultTree::from_json_str(black_box(&json))));

    group.finish();
}

fn benchmark_statistics(c: &mut Criterion) {
    let mut group = c.benchmark_group("statistics");

    for size in [10usize, 100, 1000].iter() {
        let rows = create_throughput_rows(*size);
        group.bench_with_input(BenchmarkId::new("summarize_throughput", size), &rows, |b, rows| {
            b.iter(|| summarize_throughput(black_box(rows)))
        });

        let csv = create_throughput_csv(*size);
        group.bench_with_input(BenchmarkId::new("parse_throughput", size), &csv, |b, csv| {
            b.iter(|| samples::parse_throughput(black_box(csv.as_bytes())))
        });

        let messages = create_message_rows(*size);
        group.bench_with_input(BenchmarkId::new("message_step_stats", size), &messages, |b, rows| {
            b.iter(|| message_step_stats(black_box(rows), 40, 4))
        });
    }

    group.finish();
}

fn benchmark_config_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("config_parsing");

    group.bench_function("parse_cli_args", |b| {
        b.iter(|| {
            Cli::parse_from(black_box([
                "devbench",
                "--kind",
                "throughput",
                "--stats",
                "mean,min,max",
                "-n",
                "192.168.1.",
                "100",
                "107",
                "112",
            ]))
        })
    });

    let config = Config {
        devices: vec!["100".to_string(), "107".to_string(), "112".to_string()],
        ..Config::default()
    };
    group.bench_function("validate_config", |b| b.iter(|| validate_config(black_box(&config))));

    group.finish();
}

criterion_group!(benches, benchmark_grouping, benchmark_statistics, benchmark_config_parsing);
criterion_main!(benches);
