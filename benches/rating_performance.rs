//! Performance benchmarks for rating calculations

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::Arc;
use team_elo::rating::{expected_score, MatchOutcome, RatingCalculator, TeamEloCalculator};
use team_elo::storage::{InMemoryRatingStore, RatingStore};
use team_elo::types::{MatchSubmission, Player};
use team_elo::{FixedClock, MatchRecorder};

fn create_bench_players(ratings: &[i64], first_id: i64) -> Vec<Player> {
    ratings
        .iter()
        .enumerate()
        .map(|(i, rating)| Player {
            id: first_id + i as i64,
            name: format!("player{}", first_id + i as i64),
            rating: *rating,
            matches: 0,
            wins: 0,
            losses: 0,
            draws: 0,
        })
        .collect()
}

fn bench_expected_score(c: &mut Criterion) {
    c.bench_function("expected_score", |b| {
        b.iter(|| black_box(expected_score(black_box(1237.5), black_box(1312.0))))
    });
}

fn bench_rating_plan(c: &mut Criterion) {
    let calculator = TeamEloCalculator::new();
    let team1 = create_bench_players(&[1180, 1225, 1310, 1198, 1260], 1);
    let team2 = create_bench_players(&[1205, 1240, 1172, 1290, 1233], 6);

    c.bench_function("rating_plan_5v5", |b| {
        b.iter(|| black_box(calculator.plan(&team1, &team2, MatchOutcome::Team2Win)))
    });
}

fn bench_match_submission(c: &mut Criterion) {
    let store = Arc::new(InMemoryRatingStore::new());
    let ids: Vec<i64> = (0..10)
        .map(|i| {
            store
                .create_player(&format!("player{}", i), 1200)
                .unwrap()
                .id
        })
        .collect();
    let recorder = MatchRecorder::new(store, Arc::new(FixedClock(chrono::Utc::now())));

    let submission = MatchSubmission {
        team1_players: ids[..5].to_vec(),
        team2_players: ids[5..].to_vec(),
        team1_score: 3,
        team2_score: 2,
        name: Some("Bench match".to_string()),
    };

    c.bench_function("submit_match_in_memory_5v5", |b| {
        b.iter(|| black_box(recorder.submit_match(&submission)))
    });
}

criterion_group!(
    benches,
    bench_expected_score,
    bench_rating_plan,
    bench_match_submission
);
criterion_main!(benches);
