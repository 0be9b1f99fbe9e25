// Copyright (c) 2026 - present allanpk716
// SPDX-License-Identifier: MIT

use criterion::{Criterion, criterion_group, criterion_main};

use gotest_log::{parse_console_text, parse_event_stream};

fn synthetic_event_stream(tests: usize) -> String {
    let mut log = String::new();
    for i in 0..tests {
        log.push_str(&format!(
            "{{\"Action\":\"run\",\"Package\":\"example.com/p\",\"Test\":\"Test{i}\"}}\n"
        ));
        log.push_str(&format!(
            "{{\"Action\":\"output\",\"Package\":\"example.com/p\",\"Test\":\"Test{i}\",\"Output\":\"    log line for Test{i}\\n\"}}\n"
        ));
        log.push_str(&format!(
            "{{\"Action\":\"pass\",\"Package\":\"example.com/p\",\"Test\":\"Test{i}\",\"Elapsed\":0.01}}\n"
        ));
    }
    log
}

fn synthetic_console_log(tests: usize) -> String {
    let mut log = String::new();
    for i in 0..tests {
        log.push_str(&format!("=== RUN   Test{i}\n"));
        log.push_str(&format!("    log line for Test{i}\n"));
        log.push_str(&format!("--- PASS: Test{i} (0.01s)\n"));
    }
    log.push_str("PASS\nok  \texample.com/p\t1.2s\n");
    log
}

fn event_stream_benchmark(c: &mut Criterion) {
    let log = synthetic_event_stream(500);
    c.bench_function("parse_event_stream_500", |b| {
        b.iter(|| parse_event_stream(std::hint::black_box(log.as_bytes())).expect("parse"))
    });
}

fn console_text_benchmark(c: &mut Criterion) {
    let log = synthetic_console_log(500);
    c.bench_function("parse_console_text_500", |b| {
        b.iter(|| parse_console_text(std::hint::black_box(log.as_bytes())).expect("parse"))
    });
}

criterion_group!(benches, event_stream_benchmark, console_text_benchmark);
criterion_main!(benches);
