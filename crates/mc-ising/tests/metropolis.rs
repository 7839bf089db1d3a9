use mc_core::{Engine, ThermoConditions};
use mc_ising::{InitialSpins, IsingConfig, IsingEngine, IsingState};
use proptest::prelude::*;

fn engine(size: usize, temperature: f64, field: f64) -> IsingEngine {
    let config = IsingConfig {
        size,
        initial: InitialSpins::Random,
        ..IsingConfig::default()
    };
    IsingEngine::new(config, ThermoConditions::new(temperature, field)).unwrap()
}

fn step(engine: &mut IsingEngine) {
    let event = engine.propose();
    if engine.check(&event) {
        engine.accept(&event);
    } else {
        engine.reject(&event);
    }
}

#[test]
fn incremental_energy_matches_recomputation() {
    let mut engine = engine(6, 2.5, 0.3);
    for _ in 0..5_000 {
        step(&mut engine);
    }
    let tracked_energy = engine.energy();
    let tracked_magnetization = engine.magnetization();

    let state = engine.configuration_state().clone();
    engine.reset(state).unwrap();
    assert!((engine.energy() - tracked_energy).abs() < 1e-9);
    assert_eq!(engine.magnetization(), tracked_magnetization);
}

#[test]
fn cold_ferromagnet_stays_ordered() {
    let config = IsingConfig {
        size: 8,
        initial: InitialSpins::Up,
        ..IsingConfig::default()
    };
    let mut engine = IsingEngine::new(config, ThermoConditions::new(0.5, 0.0)).unwrap();
    for _ in 0..20 * engine.steps_per_pass() {
        step(&mut engine);
    }
    assert!(engine.magnetization() as f64 / 64.0 > 0.9);
    assert!((engine.energy() / 64.0 + 2.0).abs() < 0.2);
}

#[test]
fn same_seed_and_conditions_reproduce_trajectory() {
    let mut a = engine(5, 2.0, 0.0);
    let mut b = engine(5, 2.0, 0.0);
    for _ in 0..2_000 {
        step(&mut a);
        step(&mut b);
    }
    assert_eq!(a.configuration_state(), b.configuration_state());
}

#[test]
fn reset_rejects_mismatched_lattice() {
    let mut engine = engine(4, 1.0, 0.0);
    let err = engine
        .reset(IsingState {
            size: 3,
            spins: vec![1; 9],
        })
        .unwrap_err();
    assert_eq!(err.code(), "state-size");

    let err = engine
        .reset(IsingState {
            size: 4,
            spins: vec![0; 16],
        })
        .unwrap_err();
    assert_eq!(err.code(), "state-spin");
}

#[test]
fn convergence_follows_precision_and_check_period() {
    let config = IsingConfig {
        size: 4,
        precision: Some(1.0),
        check_period: 3,
        ..IsingConfig::default()
    };
    let mut engine = IsingEngine::new(config, ThermoConditions::new(1.0, 0.0)).unwrap();
    assert!(engine.must_converge());
    assert!(!engine.check_convergence_time());

    for pass in 1..=3 {
        for _ in 0..engine.steps_per_pass() {
            step(&mut engine);
        }
        engine.sample_data(pass, 0);
    }
    assert!(engine.check_convergence_time());
    assert!(engine.is_converged());
    assert!(!engine.check_convergence_time());
}

#[test]
fn results_report_conditions_and_sample_count() {
    let mut engine = engine(4, 1.5, -0.25);
    engine.sample_data(1, 0);
    engine.sample_data(2, 0);
    let record = engine.results();
    assert_eq!(record.get("T"), Some(&serde_json::json!(1.5)));
    assert_eq!(record.get("h"), Some(&serde_json::json!(-0.25)));
    assert_eq!(record.get("N_samples"), Some(&serde_json::json!(2)));
    assert_eq!(record.names().next(), Some("T"));
}

#[test]
fn set_conditions_clears_samples() {
    let mut engine = engine(4, 1.5, 0.0);
    engine.sample_data(1, 0);
    engine
        .set_conditions(&ThermoConditions::new(2.0, 0.0))
        .unwrap();
    assert_eq!(engine.samples(), 0);
    assert_eq!(engine.conditions().temperature, 2.0);
}

proptest! {
    #[test]
    fn proposal_delta_matches_energy_change(seed in any::<u64>(), field in -1.0f64..1.0) {
        let config = IsingConfig {
            size: 4,
            seed,
            initial: InitialSpins::Random,
            ..IsingConfig::default()
        };
        let mut engine = IsingEngine::new(config, ThermoConditions::new(1.0, field)).unwrap();
        let before = engine.energy();
        let event = engine.propose();
        engine.accept(&event);
        let state = engine.configuration_state().clone();
        engine.reset(state).unwrap();
        prop_assert!((engine.energy() - before - event.delta_energy).abs() < 1e-9);
    }
}
