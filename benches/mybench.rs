use criterion::{Criterion, criterion_group, criterion_main};
use rand::SeedableRng;
use scuttlebutt::AesRng;

use bloodtype_mpc::{
    circuit::AND_GATE_COUNT,
    oracle::{BloodType, INPUT_BITS, compatibility_bit},
    prep::{BeaverDealer, TableDealer},
    simulate_circuit, simulate_circuit_lockstep, simulate_table, simulate_table_lockstep,
};

fn dealers(c: &mut Criterion) {
    let mut rng = AesRng::seed_from_u64(0);
    c.bench_function("beaver dealer", |b| {
        b.iter(|| BeaverDealer::new(&mut rng, AND_GATE_COUNT))
    });
    c.bench_function("table dealer", |b| {
        b.iter(|| TableDealer::new(&mut rng, INPUT_BITS, compatibility_bit).unwrap())
    });
}

fn protocols(c: &mut Criterion) {
    let recipient = BloodType::new(5).unwrap();
    let donor = BloodType::new(1).unwrap();
    let mut rng = AesRng::seed_from_u64(1);

    c.bench_function("circuit lockstep", |b| {
        b.iter(|| simulate_circuit_lockstep(&mut rng, recipient, donor, |_| {}).unwrap())
    });
    c.bench_function("table lockstep", |b| {
        b.iter(|| simulate_table_lockstep(&mut rng, recipient, donor, |_| {}).unwrap())
    });

    // includes thread spawning and OS seeding
    c.bench_function("circuit threaded", |b| {
        b.iter(|| simulate_circuit(recipient, donor).unwrap())
    });
    c.bench_function("table threaded", |b| {
        b.iter(|| simulate_table(recipient, donor).unwrap())
    });
}

criterion_group!(benches, dealers, protocols);
criterion_main!(benches);
