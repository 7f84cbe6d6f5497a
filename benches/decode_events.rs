/// Benchmarks for the hot paths of a dashboard refresh: decoding server pushes,
/// dispatching them, and decoding the match list a reload fetches.
use apibet_client::api::types::response::Match;
use apibet_client::realtime::{View, dispatch, parse_events};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use serde_json::json;

fn bench_parse_events(c: &mut Criterion) {
    let mut group = c.benchmark_group("realtime/parse_events");

    let frames = [
        ("connected", r#"{"type":"connected","message":"welcome"}"#),
        ("new_matches", r#"{"type":"new_matches","count":12}"#),
        ("results_updated", r#"{"type":"results_updated","count":4}"#),
        (
            "result_updated",
            r#"{"type":"result_updated","match":"Lions x Tigers","score":"2-1"}"#,
        ),
        ("pong", r#"{"type":"pong"}"#),
        ("unknown", r#"{"type":"maintenance","eta":30,"reason":"deploy"}"#),
        (
            "batch",
            r#"[{"type":"new_matches","count":2},{"type":"results_updated","count":1}]"#,
        ),
    ];

    for (name, frame) in frames {
        group.throughput(Throughput::Bytes(frame.len() as u64));
        group.bench_with_input(BenchmarkId::new("parse_events", name), frame, |b, frame| {
            b.iter(|| {
                parse_events(std::hint::black_box(frame.as_bytes()))
                    .expect("Frame should decode")
            });
        });
    }

    group.finish();
}

fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("realtime/dispatch");

    let events = parse_events(
        br#"[
            {"type":"new_matches","count":3},
            {"type":"results_updated","count":1},
            {"type":"result_updated","match":"Lions x Tigers","score":"2-1"},
            {"type":"heartbeat"}
        ]"#,
    )
    .expect("Frame should decode");
    let view = View::new(true);

    group.throughput(Throughput::Elements(events.len() as u64));
    group.bench_function("mixed", |b| {
        b.iter(|| {
            for event in &events {
                std::hint::black_box(dispatch(std::hint::black_box(event), view));
            }
        });
    });

    group.finish();
}

fn match_list(len: usize) -> String {
    let matches: Vec<_> = (0..len)
        .map(|id| {
            json!({
                "id": id,
                "external_id": format!("ext-{id}"),
                "league": if id % 2 == 0 { "euro" } else { "copa" },
                "team_home": "Lions",
                "team_away": "Tigers",
                "hour": format!("{:02}", id % 24),
                "minute": id % 60,
                "scheduled_time": "2026-10-19 21:05:00",
                "odd_home": 1.85,
                "odd_draw": 3.4,
                "odd_away": 4.2,
                "odd_over_25": 1.95,
                "odd_under_25": 1.8,
                "status": if id % 3 == 0 { "finished" } else { "scheduled" },
                "goals_home": 1,
                "goals_away": 0,
                "total_goals": 1,
                "result": "home",
                "scraped_at": "2026-10-19 20:50:12"
            })
        })
        .collect();
    serde_json::to_string(&matches).expect("Match list should serialize")
}

fn bench_match_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("api/match_list");

    for len in [50, 500] {
        let json = match_list(len);
        group.throughput(Throughput::Bytes(json.len() as u64));
        group.bench_with_input(BenchmarkId::new("Vec<Match>", len), &json, |b, json| {
            b.iter(|| {
                let _: Vec<Match> = serde_json::from_str(std::hint::black_box(json))
                    .expect("Deserialization should succeed");
            });
        });
    }

    group.finish();
}

criterion_group!(
    decode_benches,
    bench_parse_events,
    bench_dispatch,
    bench_match_list
);
criterion_main!(decode_benches);
