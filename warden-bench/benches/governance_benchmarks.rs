//! Governance benchmarks.
//!
//! Benchmarks:
//! - Sortition draw over growing active sets
//! - Opening a round (seed derivation + draw)
//! - Voting a full round to completion
//! - Signed vote verification

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use warden_bench::Fleet;
use warden_consensus::{sortition, GovernanceConfig, SignedVote};
use warden_core::{hash, NodeDirectory, NodeId};

fn bench_sortition(c: &mut Criterion) {
    let mut group = c.benchmark_group("sortition/draw");
    let seed = hash(b"bench-seed");

    for size in [16usize, 128, 1024] {
        let active: Vec<NodeId> = (0..size)
            .map(|i| NodeId::from(hash(&(i as u64).to_le_bytes())))
            .collect();
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("committee_5", size), &active, |b, active| {
            b.iter(|| sortition::draw(black_box(active), &seed, 5, None))
        });
        group.bench_with_input(BenchmarkId::new("subjects_8", size), &active, |b, active| {
            b.iter(|| sortition::draw(black_box(active), &seed, 5, Some(8)))
        });
    }

    group.finish();
}

fn bench_open_round(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine/open_round");

    for size in [16usize, 128] {
        let fleet = Fleet::new(size);
        let config = GovernanceConfig::default();
        group.bench_function(BenchmarkId::from_parameter(size), |b| {
            b.iter_batched(
                || fleet.engine(config.clone()),
                |engine| engine.map(|mut e| e.start_new_round()),
                criterion::BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_full_round(c: &mut Criterion) {
    let fleet = Fleet::new(32);
    let config = GovernanceConfig::default();

    c.bench_function("engine/vote_full_round_32", |b| {
        b.iter_batched(
            || {
                let mut engine = fleet.engine(config.clone())?;
                let round = engine.start_new_round().ok()?;
                Some((engine, round))
            },
            |setup| {
                let (mut engine, round) = setup?;
                for subject in engine.round_subjects(round).ok()?.to_vec() {
                    for voter in engine.committee(round, &subject).ok()?.to_vec() {
                        if engine.vote(voter, round, subject, true).ok()?.completed_now {
                            break;
                        }
                    }
                }
                Some(engine.vote_log_root())
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

fn bench_signed_vote(c: &mut Criterion) {
    let fleet = Fleet::new(2);
    let vote = SignedVote::new(1, fleet.id(1), true, &fleet.keys[0]);
    let key = fleet.directory.public_key_of(&fleet.id(0));

    c.bench_function("vote/verify_signature", |b| {
        b.iter(|| key.as_ref().map(|k| black_box(&vote).verify(k)))
    });
}

criterion_group!(
    benches,
    bench_sortition,
    bench_open_round,
    bench_full_round,
    bench_signed_vote,
);
criterion_main!(benches);
