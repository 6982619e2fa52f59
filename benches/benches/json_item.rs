// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for `understory_json_item` + `overstory_calendar`.

use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use std::sync::Once;

use chrono::{TimeZone, Utc, Weekday};
use overstory_calendar::entry::{EDITABLE, TITLE};
use overstory_calendar::{Command, Entry, InMemoryEntryProvider, style};
use serde_json::json;
use understory_json_item::{ItemType, ItemTypeExt, JsonItem, Value};

fn sample_entry(id: usize) -> Entry {
    let mut entry = Entry::with_id(format!("e{id}"));
    entry.set_title("Quarterly planning");
    entry.set_start(Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap());
    entry.set_end(Utc.with_ymd_and_hms(2025, 6, 2, 10, 30, 0).unwrap());
    entry.set_days_of_week([Weekday::Mon, Weekday::Wed, Weekday::Fri]);
    entry.add_class_names(["team", "recurring"]);
    entry.set_custom_property("room", "B12");
    entry.set(&style::COLOR, "teal");
    entry
}

fn bench_json_item(c: &mut Criterion) {
    static PRINT_SIZES: Once = Once::new();
    PRINT_SIZES.call_once(|| {
        eprintln!(
            "sizes: JsonItem={} Entry={} Value={}",
            size_of::<JsonItem>(),
            size_of::<Entry>(),
            size_of::<Value>(),
        );
    });

    let mut group = c.benchmark_group("json_item/access");

    let known = {
        let mut entry = sample_entry(0);
        entry.set_known_to_peer(true);
        entry
    };

    group.bench_function("get/present", |b| {
        b.iter(|| black_box(known.get(&TITLE)));
    });

    group.bench_function("get/default", |b| {
        b.iter(|| black_box(known.get(&EDITABLE)));
    });

    group.bench_function("set/unchanged", |b| {
        let mut entry = known.clone();
        b.iter(|| black_box(entry.set(&TITLE, "Quarterly planning")));
    });

    group.bench_function("set/changed", |b| {
        b.iter_batched(
            || known.clone(),
            |mut entry| {
                entry.set(&TITLE, "Moved");
                black_box(entry);
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();

    let mut group = c.benchmark_group("json_item/project");

    group.bench_function("on_create", |b| {
        b.iter(|| black_box(known.to_json_on_create()));
    });

    group.bench_function("on_update/one_dirty", |b| {
        let mut entry = known.clone();
        entry.set(&TITLE, "Moved");
        b.iter(|| black_box(entry.to_json_on_update()));
    });

    group.bench_function("apply_from", |b| {
        let snapshot = known.to_json(false);
        b.iter_batched(
            || Entry::with_id("e0"),
            |mut entry| {
                entry.apply_from(&snapshot, false).unwrap();
                black_box(entry);
            },
            BatchSize::SmallInput,
        );
    });

    group.bench_function("copy", |b| {
        b.iter(|| black_box(known.copy_item(true)));
    });

    group.finish();

    let mut group = c.benchmark_group("json_item/flush");

    for count in [16_usize, 256] {
        group.bench_function(BenchmarkId::new("create", count), |b| {
            b.iter_batched(
                || {
                    let mut provider = InMemoryEntryProvider::new();
                    provider.add_entries((0..count).map(sample_entry));
                    provider
                },
                |mut provider| {
                    let mut sent: Vec<Command> = Vec::new();
                    provider.flush(&mut sent);
                    black_box(sent);
                },
                BatchSize::SmallInput,
            );
        });

        group.bench_function(BenchmarkId::new("client_update", count), |b| {
            let mut provider = InMemoryEntryProvider::new();
            provider.add_entries((0..count).map(sample_entry));
            provider.flush(&mut Vec::<Command>::new());
            let update = json!({"id": "e0", "start": "2025-06-02T11:00:00Z"});
            b.iter(|| {
                provider.apply_client_update(&update).unwrap();
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_json_item);
criterion_main!(benches);
