//! Memory experiments: hold a logical qubit under noise and check whether
//! it survives.
//!
//! A trial prepares the all-zeros state of the code, runs one clean
//! reference round to fix the stabilizer frame, and records the sign of
//! every logical Z observable. It then alternates noise injection with
//! syndrome extraction for the configured number of rounds, appends one
//! noiseless closing round so the defect history ends on solid ground, and
//! decodes the history in windows. Each window is decoded once per
//! stabilizer type, the matched corrections are applied to the state, and
//! the recorded outcomes are adjusted so later rounds do not re-report the
//! same defects. The trial succeeds when every logical Z observable reads
//! back with its reference sign.
//!
//! On a periodic code a window is only decodable when it holds an even
//! number of defects of each type, so window boundaries slide forward until
//! the running defect parity closes. The noiseless final round always
//! balances the books, which is why it exists.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::error::{QecError, QecResult};
use crate::graph::{Correction, DecoderConfig, DecodingGraph};
use crate::layout::{BoundaryCondition, CodeFamily, CodeLayout, StabKind};
use crate::matching::decode;
use crate::noise::{sample_errors, NoiseConfig, NoiseEvent};
use crate::syndrome::{Syndrome, SyndromeExtractor};
use crate::tableau::StabilizerTableau;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Everything a trial needs beyond the layout: how long to hold the state,
/// under which noise, and how the decoder prices its edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExperimentConfig {
    /// Noisy syndrome-extraction rounds per trial. A noiseless closing
    /// round is appended on top of these.
    pub rounds: usize,
    pub noise: NoiseConfig,
    pub decoder: DecoderConfig,
}

impl ExperimentConfig {
    pub fn new(rounds: usize, noise: NoiseConfig, decoder: DecoderConfig) -> Self {
        ExperimentConfig {
            rounds,
            noise,
            decoder,
        }
    }

    pub fn validate(&self) -> QecResult<()> {
        if self.rounds == 0 {
            return Err(QecError::configuration(
                "a memory experiment needs at least one round",
            ));
        }
        self.noise.validate()?;
        self.decoder.validate()
    }
}

/// Outcome of a single memory trial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialResult {
    /// True when every logical Z observable kept its reference sign.
    pub success: bool,
    /// One syndrome per round, the noiseless closing round included.
    pub syndrome_history: Vec<Syndrome>,
    /// Net correction the decoder applied over the whole trial.
    pub correction: Correction,
    /// Total defects across the history.
    pub defect_count: usize,
}

/// Aggregate counts over many trials of the same configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExperimentResult {
    pub trials: usize,
    pub failures: usize,
}

impl ExperimentResult {
    /// Fraction of trials that ended in logical failure.
    pub fn logical_error_rate(&self) -> f64 {
        if self.trials == 0 {
            0.0
        } else {
            self.failures as f64 / self.trials as f64
        }
    }
}

/// One cell of a threshold scan.
#[derive(Debug, Clone)]
pub struct ScanPoint {
    pub distance: usize,
    pub p: f64,
    pub result: ExperimentResult,
}

/// Run one seeded memory trial.
///
/// The per-trial random stream is owned by this call and fully determined
/// by `seed`, so two calls with equal arguments produce identical results
/// bit for bit.
pub fn run_trial(
    layout: &CodeLayout,
    config: &ExperimentConfig,
    seed: u64,
) -> QecResult<TrialResult> {
    config.validate()?;
    let num_qubits = layout.num_qubits();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut tableau = StabilizerTableau::new(num_qubits);
    let mut extractor = SyndromeExtractor::new(layout, &mut tableau, &mut rng)?;

    // Reference signs for the logical Z observables. Logicals commute with
    // the whole stabilizer group, so after the reference round these reads
    // are deterministic and leave the state alone.
    let mut references = Vec::with_capacity(layout.num_logicals());
    for k in 0..layout.num_logicals() {
        let outcome = tableau.measure_pauli(layout.logical_z_string(k), &mut rng)?;
        debug_assert!(!outcome.random);
        references.push(outcome.value);
    }

    let window = config.decoder.window.unwrap_or(config.rounds + 1);
    let periodic = layout.boundary() == BoundaryCondition::Periodic;

    let mut history: Vec<Syndrome> = Vec::with_capacity(config.rounds + 1);
    let mut correction = Correction::identity(num_qubits);
    let mut defect_count = 0usize;
    // Start of the window still waiting for a decode, and the defect parity
    // per stabilizer type accumulated since then.
    let mut window_start = 0usize;
    let mut odd = [false; 2];

    for round in 1..=config.rounds + 1 {
        let closing = round == config.rounds + 1;
        if !closing {
            let events: Vec<NoiseEvent> =
                sample_errors(num_qubits, &config.noise, &mut rng).collect();
            for event in &events {
                tableau.apply_pauli(event.qubit, event.pauli)?;
            }
        }
        let p_meas = if closing { 0.0 } else { config.noise.p_meas };
        let syndrome = extractor.extract_round(&mut tableau, p_meas, &mut rng)?;
        defect_count += syndrome.defect_count();
        for gen in syndrome.defects() {
            match layout.generators()[gen].kind {
                StabKind::X => odd[0] = !odd[0],
                StabKind::Z => odd[1] = !odd[1],
            }
        }
        history.push(syndrome);

        // Open layouts can cut anywhere thanks to the virtual twins. A
        // periodic layout must wait for the parity of both types to close,
        // which the final noiseless round guarantees.
        let pending = history.len() - window_start;
        let balanced = !periodic || (!odd[0] && !odd[1]);
        if closing || (pending >= window && balanced) {
            let partial = decode_window(
                &history[window_start..],
                layout,
                &config.decoder,
                &config.noise,
            )?;
            if !partial.is_identity() {
                partial.apply(&mut tableau)?;
                extractor.note_correction(partial.as_string());
                correction.merge(&partial);
            }
            window_start = history.len();
            odd = [false; 2];
        }
    }

    let mut success = true;
    for (k, reference) in references.iter().enumerate() {
        let outcome = tableau.measure_pauli(layout.logical_z_string(k), &mut rng)?;
        debug_assert!(!outcome.random);
        if outcome.value != *reference {
            success = false;
        }
    }
    debug_assert!(tableau.invariants_hold());
    debug!(
        seed,
        success,
        defects = defect_count,
        weight = correction.weight(),
        "trial finished"
    );
    Ok(TrialResult {
        success,
        syndrome_history: history,
        correction,
        defect_count,
    })
}

/// Decode one window of syndromes and fold both stabilizer types into a
/// single correction.
fn decode_window(
    window: &[Syndrome],
    layout: &CodeLayout,
    decoder: &DecoderConfig,
    noise: &NoiseConfig,
) -> QecResult<Correction> {
    let mut merged = Correction::identity(layout.num_qubits());
    for kind in [StabKind::X, StabKind::Z] {
        let graph = DecodingGraph::build(window, kind, layout, decoder, noise)?;
        let matching = decode(&graph)?;
        let partial = graph.correction(&matching, layout)?;
        merged.merge(&partial);
    }
    Ok(merged)
}

/// Run `num_trials` independent trials and count logical failures.
///
/// Trial `i` is seeded with `seed_base + i`, so a scan over seeds can be
/// resumed or sharded without replaying earlier trials. Any trial error
/// aborts the experiment; a failed invariant must not be averaged away.
pub fn run_experiment(
    layout: &CodeLayout,
    config: &ExperimentConfig,
    num_trials: usize,
    seed_base: u64,
) -> QecResult<ExperimentResult> {
    config.validate()?;
    if num_trials == 0 {
        return Err(QecError::configuration(
            "an experiment needs at least one trial",
        ));
    }
    info!(
        code = layout.name(),
        trials = num_trials,
        rounds = config.rounds,
        "running memory experiment"
    );
    let outcomes = trial_outcomes(layout, config, num_trials, seed_base)?;
    let failures = outcomes.iter().filter(|ok| !**ok).count();
    let result = ExperimentResult {
        trials: num_trials,
        failures,
    };
    info!(
        failures,
        rate = result.logical_error_rate(),
        "experiment finished"
    );
    Ok(result)
}

#[cfg(feature = "parallel")]
fn trial_outcomes(
    layout: &CodeLayout,
    config: &ExperimentConfig,
    num_trials: usize,
    seed_base: u64,
) -> QecResult<Vec<bool>> {
    (0..num_trials)
        .into_par_iter()
        .map(|i| run_trial(layout, config, seed_base.wrapping_add(i as u64)).map(|t| t.success))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn trial_outcomes(
    layout: &CodeLayout,
    config: &ExperimentConfig,
    num_trials: usize,
    seed_base: u64,
) -> QecResult<Vec<bool>> {
    (0..num_trials)
        .map(|i| run_trial(layout, config, seed_base.wrapping_add(i as u64)).map(|t| t.success))
        .collect()
}

/// Sweep a code family over distances and physical error rates.
///
/// Each grid cell gets its own block of seeds so the cells stay
/// independent. Points come back in scan order, distances outer, rates
/// inner.
pub fn threshold_scan(
    family: CodeFamily,
    distances: &[usize],
    error_rates: &[f64],
    rounds: usize,
    trials_per_point: usize,
    seed_base: u64,
) -> QecResult<Vec<ScanPoint>> {
    let mut points = Vec::with_capacity(distances.len() * error_rates.len());
    for (di, &distance) in distances.iter().enumerate() {
        let layout = CodeLayout::new(family, distance)?;
        for (pi, &p) in error_rates.iter().enumerate() {
            let config = ExperimentConfig::new(
                rounds,
                NoiseConfig::depolarizing(p),
                DecoderConfig::default(),
            );
            let cell = di * error_rates.len() + pi;
            let seed = seed_base.wrapping_add((cell * trials_per_point) as u64);
            let result = run_experiment(&layout, &config, trials_per_point, seed)?;
            points.push(ScanPoint {
                distance,
                p,
                result,
            });
        }
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pauli::{Pauli, PauliOp};

    fn rotated_d3() -> CodeLayout {
        CodeLayout::new(CodeFamily::RotatedSurface, 3).unwrap()
    }

    fn quiet_config(rounds: usize) -> ExperimentConfig {
        ExperimentConfig::new(rounds, NoiseConfig::quiet(), DecoderConfig::default())
    }

    #[test]
    fn test_quiet_trial_closes_clean() {
        let layout = rotated_d3();
        let result = run_trial(&layout, &quiet_config(4), 11).unwrap();
        assert!(result.success);
        assert_eq!(result.defect_count, 0);
        assert_eq!(result.syndrome_history.len(), 5);
        assert!(result.syndrome_history.iter().all(Syndrome::is_clear));
        assert!(result.correction.is_identity());
    }

    #[test]
    fn test_quiet_trials_succeed_on_every_family() {
        for family in [
            CodeFamily::RotatedSurface,
            CodeFamily::UnrotatedSurface,
            CodeFamily::Toric,
            CodeFamily::Repetition,
        ] {
            let layout = CodeLayout::new(family, 3).unwrap();
            for seed in 0..4 {
                let result = run_trial(&layout, &quiet_config(2), seed).unwrap();
                assert!(result.success, "{} seed {}", layout.name(), seed);
                assert_eq!(result.defect_count, 0);
            }
        }
    }

    // The distance-3 walkthrough: a single X error on the center qubit
    // lights the two Z generators beside it, the matcher pairs them, and
    // the correction undoes the error exactly.
    #[test]
    fn test_single_center_error_round_trips() {
        let layout = rotated_d3();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut tableau = StabilizerTableau::new(layout.num_qubits());
        let mut extractor = SyndromeExtractor::new(&layout, &mut tableau, &mut rng).unwrap();
        let reference = tableau
            .measure_pauli(layout.logical_z_string(0), &mut rng)
            .unwrap();

        tableau.apply_pauli(4, Pauli::X).unwrap();
        let syndrome = extractor.extract_round(&mut tableau, 0.0, &mut rng).unwrap();
        assert_eq!(syndrome.defect_count(), 2);

        let window = [syndrome];
        let correction = decode_window(
            &window,
            &layout,
            &DecoderConfig::default(),
            &NoiseConfig::quiet(),
        )
        .unwrap();
        assert_eq!(correction.terms(), vec![(4, Pauli::X)]);

        correction.apply(&mut tableau).unwrap();
        extractor.note_correction(correction.as_string());
        let after = extractor.extract_round(&mut tableau, 0.0, &mut rng).unwrap();
        assert!(after.is_clear());

        let readback = tableau
            .measure_pauli(layout.logical_z_string(0), &mut rng)
            .unwrap();
        assert_eq!(readback.value, reference.value);
    }

    // Distance 3 must correct every single-qubit error. The leftover of
    // error times correction has to commute with every stabilizer and
    // every logical, which pins it inside the stabilizer group.
    #[test]
    fn test_every_single_error_is_corrected() {
        let layout = rotated_d3();
        for qubit in 0..layout.num_qubits() {
            for pauli in [Pauli::X, Pauli::Y, Pauli::Z] {
                let mut rng = ChaCha8Rng::seed_from_u64(5);
                let mut tableau = StabilizerTableau::new(layout.num_qubits());
                let mut extractor =
                    SyndromeExtractor::new(&layout, &mut tableau, &mut rng).unwrap();

                tableau.apply_pauli(qubit, pauli).unwrap();
                let syndrome = extractor.extract_round(&mut tableau, 0.0, &mut rng).unwrap();
                let window = [syndrome];
                let correction = decode_window(
                    &window,
                    &layout,
                    &DecoderConfig::default(),
                    &NoiseConfig::quiet(),
                )
                .unwrap();

                let mut residual = correction.as_string().clone();
                let error = PauliOp::single(qubit, pauli).to_dense(layout.num_qubits());
                residual.mul_assign_unsigned(&error);

                for i in 0..layout.num_stabilizers() {
                    assert!(
                        !residual.anticommutes_with(layout.generator_string(i)),
                        "{:?} on {} leaves a defect at generator {}",
                        pauli,
                        qubit,
                        i
                    );
                }
                for k in 0..layout.num_logicals() {
                    assert!(
                        !residual.anticommutes_with(layout.logical_z_string(k)),
                        "{:?} on {} flips logical Z {}",
                        pauli,
                        qubit,
                        k
                    );
                    assert!(
                        !residual.anticommutes_with(layout.logical_x_string(k)),
                        "{:?} on {} flips logical X {}",
                        pauli,
                        qubit,
                        k
                    );
                }
            }
        }
    }

    #[test]
    fn test_trials_with_equal_seeds_agree() {
        let layout = rotated_d3();
        let config = ExperimentConfig::new(
            5,
            NoiseConfig::depolarizing(0.04).with_measurement_flip(0.02),
            DecoderConfig::default(),
        );
        let a = run_trial(&layout, &config, 404).unwrap();
        let b = run_trial(&layout, &config, 404).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.syndrome_history.len(), 6);
    }

    #[test]
    fn test_windowed_trial_decodes_in_chunks() {
        let layout = rotated_d3();
        let mut config = ExperimentConfig::new(
            6,
            NoiseConfig::depolarizing(0.03),
            DecoderConfig::default(),
        );
        config.decoder.window = Some(2);
        let a = run_trial(&layout, &config, 90).unwrap();
        let b = run_trial(&layout, &config, 90).unwrap();
        assert_eq!(a.syndrome_history.len(), 7);
        assert_eq!(a, b);
    }

    // A window of one round puts maximal pressure on the parity rule: the
    // toric code cannot decode an odd window, so cuts must slide.
    #[test]
    fn test_toric_trial_chunks_on_even_parity() {
        let layout = CodeLayout::new(CodeFamily::Toric, 3).unwrap();
        let mut config = ExperimentConfig::new(
            5,
            NoiseConfig::depolarizing(0.03).with_measurement_flip(0.03),
            DecoderConfig::default(),
        );
        config.decoder.window = Some(1);
        for seed in 0..8 {
            let result = run_trial(&layout, &config, seed).unwrap();
            assert_eq!(result.syndrome_history.len(), 6);
        }
        let a = run_trial(&layout, &config, 3).unwrap();
        let b = run_trial(&layout, &config, 3).unwrap();
        assert_eq!(a, b);
    }

    // Readout flips at one in four flood the defect stream. Open windows
    // absorb any count through the boundary twins and periodic cuts keep
    // sliding until parity balances, so every trial must still decode,
    // and bit for bit the same way on a replay.
    #[test]
    fn test_heavy_readout_noise_always_decodes() {
        let noise = NoiseConfig::quiet().with_measurement_flip(0.25);
        for family in [CodeFamily::RotatedSurface, CodeFamily::Toric] {
            let layout = CodeLayout::new(family, 3).unwrap();
            let mut config = ExperimentConfig::new(4, noise, DecoderConfig::default());
            config.decoder.window = Some(1);
            for seed in 0..40 {
                let a = run_trial(&layout, &config, seed).unwrap();
                let b = run_trial(&layout, &config, seed).unwrap();
                assert_eq!(a, b, "{} seed {}", layout.name(), seed);
            }
        }

        let layout = rotated_d3();
        let mut config = ExperimentConfig::new(
            4,
            NoiseConfig::quiet().with_measurement_flip(0.03),
            DecoderConfig::default(),
        );
        config.decoder.window = Some(1);
        let result = run_experiment(&layout, &config, 40, 505).unwrap();
        assert!(result.failures * 3 < result.trials);
    }

    #[test]
    fn test_repetition_memory_improves_with_distance() {
        let config = ExperimentConfig::new(
            3,
            NoiseConfig::independent(0.07, 0.0, 0.0),
            DecoderConfig::default(),
        );
        let small = CodeLayout::new(CodeFamily::Repetition, 3).unwrap();
        let large = CodeLayout::new(CodeFamily::Repetition, 7).unwrap();
        let near = run_experiment(&small, &config, 400, 2024).unwrap();
        let far = run_experiment(&large, &config, 400, 2024).unwrap();
        assert!(near.failures > 0);
        assert!(far.failures < near.failures);
        assert!(far.logical_error_rate() < near.logical_error_rate());
    }

    #[test]
    fn test_heavy_noise_fails_some_trials() {
        let layout = rotated_d3();
        let config = ExperimentConfig::new(
            2,
            NoiseConfig::depolarizing(0.3),
            DecoderConfig::default(),
        );
        let result = run_experiment(&layout, &config, 30, 77).unwrap();
        assert!(result.failures > 0);
        assert!(result.failures <= result.trials);
        let rate = result.logical_error_rate();
        assert!(rate > 0.0 && rate <= 1.0);
    }

    #[test]
    fn test_rejects_bad_configs() {
        let layout = rotated_d3();
        let zero_rounds = quiet_config(0);
        assert!(matches!(
            run_trial(&layout, &zero_rounds, 0),
            Err(QecError::Configuration { .. })
        ));

        let hot = ExperimentConfig::new(
            1,
            NoiseConfig::independent(1.5, 0.0, 0.0),
            DecoderConfig::default(),
        );
        assert!(matches!(
            run_trial(&layout, &hot, 0),
            Err(QecError::Configuration { .. })
        ));

        let mut empty_window = quiet_config(1);
        empty_window.decoder.window = Some(0);
        assert!(matches!(
            run_trial(&layout, &empty_window, 0),
            Err(QecError::Configuration { .. })
        ));

        assert!(matches!(
            run_experiment(&layout, &quiet_config(1), 0, 0),
            Err(QecError::Configuration { .. })
        ));
    }

    #[test]
    fn test_logical_error_rate_arithmetic() {
        let result = ExperimentResult {
            trials: 8,
            failures: 2,
        };
        assert_eq!(result.logical_error_rate(), 0.25);
        let empty = ExperimentResult {
            trials: 0,
            failures: 0,
        };
        assert_eq!(empty.logical_error_rate(), 0.0);
    }

    #[test]
    fn test_threshold_scan_covers_grid() {
        let points = threshold_scan(
            CodeFamily::Repetition,
            &[3, 5],
            &[0.02, 0.08],
            2,
            40,
            1,
        )
        .unwrap();
        assert_eq!(points.len(), 4);
        let cells: Vec<(usize, f64)> = points.iter().map(|pt| (pt.distance, pt.p)).collect();
        assert_eq!(cells, vec![(3, 0.02), (3, 0.08), (5, 0.02), (5, 0.08)]);
        assert!(points.iter().all(|pt| pt.result.trials == 40));
    }
}
