//! Threshold scan: where does the surface code start winning?
//!
//! Sweeps physical error rate against code distance. Below the threshold
//! the curves for larger d sit lower (protection), above it they sit
//! higher (more qubits, more targets). The crossing point estimates p_c,
//! around 1% for the rotated surface code under circuit-flavored noise
//! and near 3% in the phenomenological picture used here.

use qec_memory_sim::prelude::*;

fn main() {
    println!("╔══════════════════════════════════════════════════════════╗");
    println!("║     Surface Code Threshold Scan                         ║");
    println!("║     Logical vs Physical Error Rate                      ║");
    println!("╚══════════════════════════════════════════════════════════╝");
    println!();

    // ═══ 1. Sweep distance against physical error rate ═══
    println!("═══ 1. Distance vs Error Rate Grid ═══");
    println!();

    let distances = [3, 5, 7];
    let rates: Vec<f64> = (1..=8).map(|i| i as f64 * 0.004).collect();
    let rounds = 4;
    let trials = 1000;

    println!("  {} trials per cell, {} rounds each, seeded per cell.", trials, rounds);
    println!();

    let points = threshold_scan(
        CodeFamily::RotatedSurface,
        &distances,
        &rates,
        rounds,
        trials,
        11,
    )
    .unwrap();

    print!("  p      ");
    for &d in &distances {
        print!("   d={:<2}   ", d);
    }
    println!();
    print!("  ─────  ");
    for _ in &distances {
        print!(" ──────── ");
    }
    println!();

    for (pi, &p) in rates.iter().enumerate() {
        print!("  {:.3}  ", p);
        for di in 0..distances.len() {
            let point = &points[di * rates.len() + pi];
            print!("  {:.4}  ", point.result.logical_error_rate());
        }
        println!();
    }
    println!();

    // Crude crossing estimate: the first rate where the largest distance
    // stops beating the smallest.
    let mut crossing = None;
    for (pi, &p) in rates.iter().enumerate() {
        let small = points[pi].result.logical_error_rate();
        let large = points[(distances.len() - 1) * rates.len() + pi].result.logical_error_rate();
        if large >= small && small > 0.0 {
            crossing = Some(p);
            break;
        }
    }
    match crossing {
        Some(p) => println!("  Curves cross near p ≈ {:.3}: protection ends there.", p),
        None => println!("  No crossing in this window: every rate is below threshold."),
    }
    println!();

    // ═══ 2. Uniform vs log-likelihood edge weights ═══
    println!("═══ 2. Decoder Weighting Under Biased Noise ═══");
    println!();
    println!("Uniform weights charge every defect-graph edge the same.");
    println!("Log-likelihood weights charge -ln((1-p)/p) per mechanism, so");
    println!("space and time edges are priced by their actual error rates.");
    println!();

    let layout = CodeLayout::new(CodeFamily::RotatedSurface, 5).unwrap();
    let noise = NoiseConfig::independent(0.012, 0.0005, 0.0005).with_measurement_flip(0.003);
    for weighting in [Weighting::Uniform, Weighting::LogLikelihood] {
        let config = ExperimentConfig::new(
            5,
            noise,
            DecoderConfig {
                weighting,
                window: None,
            },
        );
        let result = run_experiment(&layout, &config, 2000, 99).unwrap();
        println!(
            "  {:?} weights: logical error rate {:.4} ({} failures / {} trials)",
            weighting,
            result.logical_error_rate(),
            result.failures,
            result.trials
        );
    }
    println!();

    println!("═══ Summary ═══");
    println!();
    println!("1. BELOW p_c, raising d suppresses the logical rate; the scan");
    println!("   table shows the curves fanning out at low p.");
    println!("2. THE CROSSING of the d-curves locates the threshold for this");
    println!("   noise model and decoder.");
    println!("3. WEIGHTING matters once noise is biased: pricing edges by");
    println!("   log-likelihood feeds the decoder what the noise model knows.");
    println!();
}
