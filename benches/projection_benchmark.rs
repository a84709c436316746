//! Projection benchmark: Measure filter/highlight cost over a full buffer.
//!
//! Target: < 5ms to project 50k lines, so a repaint after every append
//! stays interactive for human-rate logs.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use riveflow::log::{find_ignore_case, ViewCache};
use riveflow::process::LineFramer;
use riveflow::render::{Frame, Painter, StatusLine};
use riveflow::{project, LogBuffer, Mode, Source};
use std::time::{Duration, Instant};

fn filled_buffer(lines: usize) -> LogBuffer {
    let mut buffer = LogBuffer::new();
    for i in 0..lines {
        let source = if i % 7 == 0 { Source::Stderr } else { Source::Stdout };
        let level = match i % 5 {
            0 => "ERROR",
            1 => "WARN",
            _ => "INFO",
        };
        buffer.append(
            source,
            &format!("2024-01-01T12:00:{:02} {level} worker-{} handled request #{i}", i % 60, i % 8),
        );
    }
    buffer
}

fn projection_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("project");
    for lines in [1_000, 10_000, 50_000] {
        let buffer = filled_buffer(lines);
        group.bench_with_input(BenchmarkId::new("identity", lines), &buffer, |b, buffer| {
            b.iter(|| project(black_box(buffer.snapshot()), "", ""));
        });
        group.bench_with_input(BenchmarkId::new("filter_and_search", lines), &buffer, |b, buffer| {
            b.iter(|| project(black_box(buffer.snapshot()), "error", "worker-3"));
        });
    }
    group.finish();
}

fn view_cache_hit(c: &mut Criterion) {
    let buffer = filled_buffer(50_000);
    let mut cache = ViewCache::new();
    cache.view(&buffer, "warn", "request");

    c.bench_function("view_cache_hit_50k", |b| {
        b.iter(|| cache.view(black_box(&buffer), "warn", "request").len());
    });
}

fn highlight_line(c: &mut Criterion) {
    let line = "Error: error while handling ERROR in straße handler (error code 42)";
    c.bench_function("find_ignore_case_line", |b| {
        b.iter(|| find_ignore_case(black_box(line), black_box("error")));
    });
}

fn frame_line_splitting(c: &mut Criterion) {
    let chunk: Vec<u8> = (0..64)
        .flat_map(|i| format!("line {i} of a chunked burst of output\n").into_bytes())
        .collect();

    c.bench_function("framer_push_64_lines", |b| {
        let mut framer = LineFramer::new(16 * 1024);
        let now = Instant::now();
        b.iter(|| framer.push(black_box(&chunk), now));
    });
}

fn paint_full_screen(c: &mut Criterion) {
    let buffer = filled_buffer(200);
    let rows = project(buffer.snapshot(), "", "worker");
    let frame = Frame {
        width: 160,
        height: 50,
        rows: rows[rows.len() - 49..].to_vec(),
        status: StatusLine {
            mode: Mode::Normal,
            command: "cargo run --release".into(),
            running: true,
            total_lines: rows.len(),
            shown_lines: rows.len(),
            auto_scroll: true,
            search: "worker".into(),
            filter: String::new(),
        },
        field: None,
    };

    c.bench_function("paint_160x50", |b| {
        let mut painter = Painter::new();
        b.iter(|| painter.paint(black_box(&frame)).map(<[u8]>::len));
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default().measurement_time(Duration::from_secs(3));
    targets = projection_scaling, view_cache_hit, highlight_line, frame_line_splitting, paint_full_screen
}
criterion_main!(benches);
