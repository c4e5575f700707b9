use std::hint::black_box;

use chrono::{Duration, NaiveDate};
use criterion::{Criterion, criterion_group, criterion_main};
use serde_json::json;
use strava_activity_client::RawActivity;
use strava_activity_tools::domains::{
    NormalizedActivity, SummaryOptions, Window, normalize_all, summarize,
};

/// Two years of daily activities.
fn fixture() -> Vec<NormalizedActivity> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).expect("date");
    let raw = (0..730).map(|i| {
        let day = start + Duration::days(i);
        let kind = if i % 3 == 0 { "Ride" } else { "Run" };
        RawActivity::try_from(json!({
            "id": i,
            "type": kind,
            "distance": 5000.0 + i as f64,
            "moving_time": 1800,
            "elapsed_time": 2000,
            "start_date_local": format!("{day}T07:30:00Z"),
            "map": {"summary_polyline": "abcdef"}
        }))
        .expect("object")
    });
    normalize_all(raw)
}

fn bench_summarize(c: &mut Criterion) {
    let activities = fixture();

    c.bench_function("summarize_weekly", |b| {
        let options = SummaryOptions::default();
        b.iter(|| summarize(black_box(&activities), &options).expect("summary"))
    });

    c.bench_function("summarize_window_12_weeks", |b| {
        let options = SummaryOptions {
            window: Some(Window::data_relative(12)),
            ..SummaryOptions::default()
        };
        b.iter(|| summarize(black_box(&activities), &options).expect("summary"))
    });
}

criterion_group!(benches, bench_summarize);
criterion_main!(benches);
