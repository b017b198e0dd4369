//! Engine-level properties of the Gray-Scott simulation
//!
//! These tests drive the public engine surface the way a UI layer would: initialize,
//! inject between ticks, change parameters, step, and read the B snapshot.

use gray_scott_core::{
    EngineError, EngineState, ReactionParams, SimulationConfig, SimulationEngine, TickOutcome,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

fn running_engine(config: SimulationConfig) -> SimulationEngine {
    let mut engine = SimulationEngine::new(config).expect("valid configuration");
    engine.initialize();
    engine
}

fn assert_bounded(engine: &SimulationEngine, tick: u64) {
    let field = engine.field();
    for (idx, (&a, &b)) in field
        .snapshot_a()
        .iter()
        .zip(field.snapshot_b())
        .enumerate()
    {
        assert!(
            (0.0..=1.0).contains(&a) && (0.0..=1.0).contains(&b),
            "cell {idx} out of range after tick {tick}: a={a}, b={b}"
        );
    }
}

fn border_cells(engine: &SimulationEngine) -> Vec<(f64, f64)> {
    let field = engine.field();
    let (width, height) = (field.width(), field.height());
    let mut cells = Vec::new();
    for y in 0..height {
        for x in 0..width {
            if x == 0 || y == 0 || x == width - 1 || y == height - 1 {
                cells.push(field.get(x, y).unwrap());
            }
        }
    }
    cells
}

#[test]
fn test_values_stay_bounded_every_tick() {
    let mut engine = running_engine(SimulationConfig {
        seed_size: 12,
        ..SimulationConfig::with_dimensions(64, 48, 4)
    });
    engine.set_parameters(0.03, 0.055).unwrap();

    for tick in 1..=150 {
        if tick % 25 == 0 {
            engine.inject_at((tick % 60) as i64, 20);
        }
        engine.step().unwrap();
        assert_bounded(&engine, tick);
    }
}

#[test]
fn test_worker_count_does_not_change_results() {
    let run = |workers: usize| {
        let mut engine = running_engine(SimulationConfig {
            seed_size: 10,
            ..SimulationConfig::with_dimensions(61, 47, workers)
        });
        engine.set_parameters(0.037, 0.06).unwrap();
        for tick in 0..120 {
            match tick {
                15 => engine.inject_at(12, 9),
                40 => engine.inject_square(50, 35, 6),
                70 => engine.set_parameters(0.055, 0.062).unwrap(),
                _ => {}
            }
            engine.step().unwrap();
        }
        (
            engine.field().snapshot_a().to_vec(),
            engine.field().snapshot_b().to_vec(),
        )
    };

    let (single_a, single_b) = run(1);
    let (many_a, many_b) = run(8);
    assert_eq!(single_a, many_a, "A differs between 1 and 8 workers");
    assert_eq!(single_b, many_b, "B differs between 1 and 8 workers");

    let (odd_a, odd_b) = run(5);
    assert_eq!(single_a, odd_a);
    assert_eq!(single_b, odd_b);
}

#[test]
fn test_out_of_bounds_injection_is_a_noop() {
    let (width, height) = (40, 30);
    let mut engine = running_engine(SimulationConfig::with_dimensions(width, height, 2));
    let before_a = engine.field().snapshot_a().to_vec();
    let before_b = engine.snapshot_b().to_vec();

    engine.inject_at(-1000, -1000);
    engine.inject_at(width as i64 + 1000, height as i64 + 1000);
    engine.inject_square(-1000, 15, 20);
    engine.inject_square(20, height as i64 + 1000, 20);

    assert_eq!(engine.field().snapshot_a(), before_a.as_slice());
    assert_eq!(engine.snapshot_b(), before_b.as_slice());
}

#[test]
fn test_border_stays_frozen() {
    let mut engine = running_engine(SimulationConfig {
        seed_size: 20,
        ..SimulationConfig::with_dimensions(48, 40, 3)
    });
    let initial_border = border_cells(&engine);
    assert!(initial_border.iter().all(|&cell| cell == (1.0, 0.0)));

    for _ in 0..150 {
        engine.step().unwrap();
    }
    assert_eq!(border_cells(&engine), initial_border);
}

#[test]
fn test_injected_border_cells_keep_their_value() {
    let mut engine = running_engine(SimulationConfig {
        seed_size: 0,
        ..SimulationConfig::with_dimensions(30, 30, 2)
    });
    engine.inject_square(0, 15, 4);

    for _ in 0..25 {
        engine.step().unwrap();
        for y in 13..=17 {
            assert_eq!(engine.field().get(0, y), Some((0.0, 1.0)), "row {y}");
        }
    }
    // The frozen B source keeps feeding its interior neighbours
    assert!(engine.field().get(1, 15).unwrap().1 > 0.0);
}

#[test]
fn test_no_b_means_no_b_ever() {
    let mut engine = running_engine(SimulationConfig {
        seed_size: 0,
        ..SimulationConfig::with_dimensions(50, 50, 4)
    });

    for (tick, (feed, kill)) in [(0.09, 0.01), (0.01, 0.1), (0.0, 0.0), (0.5, 2.0)]
        .into_iter()
        .cycle()
        .take(60)
        .enumerate()
    {
        engine.set_parameters(feed, kill).unwrap();
        engine.step().unwrap();
        assert!(
            engine.snapshot_b().iter().all(|&b| b == 0.0),
            "B appeared at tick {}",
            tick + 1
        );
    }
}

#[test]
fn test_coral_scenario_persists_and_reproduces() {
    let run = || {
        let mut engine = running_engine(SimulationConfig {
            seed_size: 10,
            ..SimulationConfig::with_dimensions(50, 50, 4)
        });
        engine.set_parameters(0.055, 0.062).unwrap();
        for tick in 1..=200 {
            let report = engine.step().unwrap();
            assert_eq!(report.tick, tick);
            assert_eq!(report.outcome, TickOutcome::Complete);
        }
        assert_bounded(&engine, 200);
        (engine.field().total_b(), engine.snapshot_b().to_vec())
    };

    let (mass, first) = run();
    assert!(mass > 0.0, "pattern died out (B mass {mass})");

    let (_, second) = run();
    assert_eq!(first, second, "identical runs diverged");
}

#[test]
fn test_parameter_pairs_never_tear() {
    let mut engine = running_engine(SimulationConfig::with_dimensions(32, 32, 2));
    let handle = engine.parameter_handle();
    let pair_one = ReactionParams::new(0.09, 0.01).unwrap();
    let pair_two = ReactionParams::new(0.02, 0.08).unwrap();
    handle.set(pair_one.feed, pair_one.kill).unwrap();

    let stop = Arc::new(AtomicBool::new(false));
    let writer = {
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            let mut flip = false;
            while !stop.load(Ordering::Relaxed) {
                let pair = if flip { pair_one } else { pair_two };
                handle.set(pair.feed, pair.kill).unwrap();
                flip = !flip;
            }
        })
    };

    for _ in 0..300 {
        let report = engine.step().unwrap();
        assert!(
            report.params == pair_one || report.params == pair_two,
            "tick observed a torn pair: {:?}",
            report.params
        );
    }

    stop.store(true, Ordering::Relaxed);
    writer.join().unwrap();
}

#[test]
fn test_resolution_skip_is_bounded_and_deterministic() {
    let run = |workers: usize| {
        let mut engine = running_engine(SimulationConfig {
            seed_size: 12,
            resolution_skip: 2,
            ..SimulationConfig::with_dimensions(41, 37, workers)
        });
        let border = border_cells(&engine);
        for tick in 1..=80 {
            engine.step().unwrap();
            assert_bounded(&engine, tick);
        }
        assert_eq!(border_cells(&engine), border, "border moved with skip 2");
        engine.snapshot_b().to_vec()
    };

    let single = run(1);
    assert_eq!(single, run(6));
    assert!(single.iter().any(|&b| b > 0.0));
}

#[test]
fn test_lifecycle() {
    let mut engine =
        SimulationEngine::new(SimulationConfig::with_dimensions(20, 20, 2)).unwrap();
    assert_eq!(engine.state(), EngineState::Idle);
    assert!(matches!(engine.step(), Err(EngineError::NotInitialized)));

    engine.initialize();
    for _ in 0..5 {
        engine.step().unwrap();
    }
    let after_five = engine.snapshot_b().to_vec();

    engine.initialize();
    for _ in 0..5 {
        engine.step().unwrap();
    }
    assert_eq!(engine.snapshot_b(), after_five.as_slice());
    assert_eq!(engine.tick_count(), 5);
}
