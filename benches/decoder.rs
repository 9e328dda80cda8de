// benches/decoder.rs

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use qec_memory_sim::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn noisy_history(layout: &CodeLayout, rounds: usize, p: f64, seed: u64) -> Vec<Syndrome> {
    let noise = NoiseConfig::depolarizing(p).with_measurement_flip(p);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut tableau = StabilizerTableau::new(layout.num_qubits());
    let mut extractor = SyndromeExtractor::new(layout, &mut tableau, &mut rng).unwrap();
    let mut history = Vec::with_capacity(rounds);
    for _ in 0..rounds {
        let events: Vec<NoiseEvent> =
            sample_errors(layout.num_qubits(), &noise, &mut rng).collect();
        for event in &events {
            tableau.apply_pauli(event.qubit, event.pauli).unwrap();
        }
        let syndrome = extractor
            .extract_round(&mut tableau, noise.p_meas, &mut rng)
            .unwrap();
        history.push(syndrome);
    }
    history
}

fn benchmark_decoder(c: &mut Criterion) {
    let layout = CodeLayout::new(CodeFamily::RotatedSurface, 7).unwrap();
    let history = noisy_history(&layout, 7, 0.02, 99);
    let config = DecoderConfig::default();
    let noise = NoiseConfig::depolarizing(0.02).with_measurement_flip(0.02);

    c.bench_function("syndrome_round_d7", |b| {
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        let mut tableau = StabilizerTableau::new(layout.num_qubits());
        let mut extractor = SyndromeExtractor::new(&layout, &mut tableau, &mut rng).unwrap();
        b.iter(|| {
            let syndrome = extractor
                .extract_round(&mut tableau, 0.0, &mut rng)
                .unwrap();
            black_box(syndrome);
        });
    });

    c.bench_function("graph_build_d7", |b| {
        b.iter(|| {
            for kind in [StabKind::X, StabKind::Z] {
                let graph =
                    DecodingGraph::build(black_box(&history), kind, &layout, &config, &noise)
                        .unwrap();
                black_box(graph.num_nodes());
            }
        });
    });

    c.bench_function("blossom_decode_d7", |b| {
        let graphs: Vec<DecodingGraph> = [StabKind::X, StabKind::Z]
            .into_iter()
            .map(|kind| DecodingGraph::build(&history, kind, &layout, &config, &noise).unwrap())
            .collect();
        b.iter(|| {
            for graph in &graphs {
                black_box(decode(black_box(graph)).unwrap());
            }
        });
    });

    c.bench_function("memory_trial_d5", |b| {
        let layout = CodeLayout::new(CodeFamily::RotatedSurface, 5).unwrap();
        let trial = ExperimentConfig::new(
            5,
            NoiseConfig::depolarizing(0.01).with_measurement_flip(0.01),
            DecoderConfig::default(),
        );
        let mut seed = 0u64;
        b.iter(|| {
            seed = seed.wrapping_add(1);
            black_box(run_trial(&layout, &trial, seed).unwrap());
        });
    });
}

criterion_group!(benches, benchmark_decoder);
criterion_main!(benches);
