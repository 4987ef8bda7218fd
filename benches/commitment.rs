//! Commitment Benchmarks
//!
//! Full `compute_root` against incremental `StateCommitment` updates over a
//! league with a long match log.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use bracket_ledger::config::LeagueRules;
use bracket_ledger::league::{apply, Action, GenesisBuilder, LeagueState};
use bracket_ledger::proof::{compute_root, StateCommitment};

/// League with round one started and `goals` goals logged in match 1.
fn busy_league(teams: u64, goals: u64) -> LeagueState {
    let rules = LeagueRules::default();
    let mut state = GenesisBuilder::numbered(teams, 5).build().unwrap();
    apply(&mut state, &Action::StartTournament, 1, &rules).unwrap();
    apply(&mut state, &Action::start_match(1), 2, &rules).unwrap();
    for i in 0..goals {
        let scorer = 1 + (i % 10);
        apply(&mut state, &Action::goal(1, scorer), 3 + i, &rules).unwrap();
    }
    state
}

fn bench_commitment(c: &mut Criterion) {
    let rules = LeagueRules::default();
    let mut group = c.benchmark_group("commitment");

    for goals in [100u64, 1_000, 10_000] {
        let state = busy_league(32, goals);

        group.bench_with_input(BenchmarkId::new("full", goals), &state, |b, state| {
            b.iter(|| compute_root(black_box(state)))
        });

        group.bench_with_input(BenchmarkId::new("incremental", goals), &state, |b, state| {
            let base = StateCommitment::new(state);
            b.iter_batched(
                || (state.clone(), base.clone()),
                |(mut state, mut commitment)| {
                    let result = apply(&mut state, &Action::goal(1, 1), u64::MAX, &rules).unwrap();
                    commitment.update(&state, &result.events);
                    commitment.root()
                },
                criterion::BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

criterion_group!(benches, bench_commitment);
criterion_main!(benches);
