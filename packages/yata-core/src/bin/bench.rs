use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use yata_core::{Doc, Event, Replayer};

const CI_CONFIG: &[(u64, u64)] = &[(100, 5), (1_000, 1), (10_000, 1)];

const LOCAL_CONFIG: &[(u64, u64)] = &[(10, 1), (100, 1), (1_000, 1), (10_000, 1)];

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct Output {
    implementation: &'static str,
    storage: &'static str,
    workload: String,
    timestamp: String,
    name: String,
    total_ops: u64,
    duration_ms: f64,
    ops_per_sec: f64,
    extra: Extra,
    source_file: Option<String>,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct Extra {
    count: u64,
    mode: &'static str,
    final_len: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    iterations: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    avg_duration_ms: Option<f64>,
}

fn is_ci() -> bool {
    env::var("CI").map(|v| v == "true").unwrap_or(false)
}

/// Two writers interleave single-char inserts, exchange events in reverse
/// order, then a reader replays the merged log.
fn run_benchmark(count: u64) -> (f64, usize) {
    let mut a = Doc::new(1);
    let mut b = Doc::new(2);

    let start = Instant::now();
    let mut log: Vec<Event> = Vec::with_capacity(count as usize * 2);
    for i in 0..count {
        let ch = char::from(b'a' + (i % 26) as u8);
        log.push(a.insert_text(a.len(), &ch.to_string()).unwrap());
        log.push(b.insert_text(0, &ch.to_string()).unwrap());
    }
    for event in log.iter().rev() {
        a.apply(event).unwrap();
        b.apply(event).unwrap();
    }
    assert_eq!(a.content(), b.content());

    let last = Replayer::new(&log).last().unwrap().unwrap();
    let duration = start.elapsed().as_secs_f64() * 1000.0;
    (duration, last.visible_len())
}

fn main() {
    let config: &[(u64, u64)] = if is_ci() { CI_CONFIG } else { LOCAL_CONFIG };

    let mut out_dir: Option<PathBuf> = None;
    let mut custom_config: Option<Vec<(u64, u64)>> = None;
    for arg in env::args().skip(1) {
        if let Some(val) = arg.strip_prefix("--count=") {
            let count = val.parse().unwrap_or(500);
            custom_config = Some(vec![(count, 1)]);
        } else if let Some(val) = arg.strip_prefix("--counts=") {
            let parsed: Vec<(u64, u64)> = val
                .split(',')
                .filter_map(|s| s.trim().parse::<u64>().ok())
                .map(|c| (c, 1))
                .collect();
            if !parsed.is_empty() {
                custom_config = Some(parsed);
            }
        } else if let Some(val) = arg.strip_prefix("--out-dir=") {
            out_dir = Some(PathBuf::from(val));
        }
    }

    let config = custom_config.as_deref().unwrap_or(config);
    let out_dir = out_dir.unwrap_or_else(|| PathBuf::from("benchmarks/core"));
    fs::create_dir_all(&out_dir).expect("mkdirs");

    for &(count, iterations) in config {
        let (duration_ms, final_len, iterations_opt, avg_duration_ms) = if iterations > 1 {
            let mut durations = Vec::new();
            let mut final_len = 0;
            for _ in 0..iterations {
                let (duration, len) = run_benchmark(count);
                durations.push(duration);
                final_len = len;
            }
            let avg = durations.iter().sum::<f64>() / durations.len() as f64;
            (avg, final_len, Some(iterations), Some(avg))
        } else {
            let (duration, len) = run_benchmark(count);
            (duration, len, None, None)
        };

        let workload_name = format!("interleave-sync-replay-{}", count);
        let out_path = out_dir.join(format!("memory-{}.json", workload_name));
        let total_ops = count * 2;

        let output = Output {
            implementation: "yata-core",
            storage: "memory",
            workload: workload_name.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            name: workload_name,
            total_ops,
            duration_ms,
            ops_per_sec: if duration_ms > 0.0 {
                total_ops as f64 / duration_ms * 1000.0
            } else {
                f64::INFINITY
            },
            extra: Extra {
                count,
                mode: "two-writers",
                final_len,
                iterations: iterations_opt,
                avg_duration_ms,
            },
            source_file: Some(out_path.display().to_string()),
        };

        let json = serde_json::to_string_pretty(&output).expect("serialize");
        fs::write(&out_path, &json).expect("write output");
        println!("{}", json);
    }
}
