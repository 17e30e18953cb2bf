//! Property tests for the linkage solver, the oscillator and the loop

use std::f64::consts::PI;

use fourbar_sim::Settings;
use fourbar_sim::sim::{
    Assembly, FourBarLinkage, KinematicSolver, OscillatorParams, OscillatorState, SimError,
    SimPhase, Simulation, step,
};
use proptest::prelude::*;

const DT: f64 = 1.0 / 60.0;

fn crank_rocker_settings() -> Settings {
    let mut settings = Settings::default();
    settings.linkage.ground = 5.0;
    settings.linkage.input = 1.0;
    settings.linkage.coupler = 4.0;
    settings.linkage.output = 3.0;
    settings
}

proptest! {
    #[test]
    fn solved_loop_closes(
        ground in 0.5f64..5.0,
        input in 0.5f64..5.0,
        coupler in 0.5f64..5.0,
        output in 0.5f64..5.0,
        angle in -PI..PI,
        crossed in any::<bool>(),
    ) {
        let mut linkage = FourBarLinkage::new(ground, input, coupler, output).unwrap();
        if crossed {
            linkage.assembly = Assembly::Crossed;
        }
        let solver = KinematicSolver::default();
        match solver.solve(&linkage, angle) {
            Ok(solution) => {
                linkage.apply(&solution);
                prop_assert!(linkage.loop_closure_residual() < 1e-6 * linkage.length_scale());
                prop_assert_eq!(linkage.input_angle(), angle);
            }
            Err(e) => prop_assert!(e.is_kinematic(), "unexpected error: {e}"),
        }
    }

    #[test]
    fn solve_is_deterministic(angle in -PI..PI) {
        let linkage = FourBarLinkage::new(5.0, 1.0, 4.0, 3.0).unwrap();
        let solver = KinematicSolver::default();
        prop_assert_eq!(solver.solve(&linkage, angle).unwrap(), solver.solve(&linkage, angle).unwrap());
    }

    #[test]
    fn crank_stays_on_its_branch(
        start in -PI..PI,
        steps in prop::collection::vec(-0.05f64..0.05, 1..200),
    ) {
        let mut linkage = FourBarLinkage::new(5.0, 1.0, 4.0, 3.0).unwrap();
        let solver = KinematicSolver::default();
        let mut angle = start;
        linkage.apply(&solver.solve(&linkage, angle).unwrap());
        for delta in steps {
            angle += delta;
            let solution = solver.solve(&linkage, angle).unwrap();
            linkage.apply(&solution);
            prop_assert_eq!(linkage.current_assembly(), Some(Assembly::Open));
            prop_assert!(linkage.loop_closure_residual() < 1e-6);
        }
    }

    #[test]
    fn overdamped_speed_decays_after_peak(
        spring in 10.0f64..100.0,
        zeta in 1.2f64..3.0,
        start in 0.2f64..1.5,
    ) {
        let damping = 2.0 * zeta * spring.sqrt();
        let params = OscillatorParams::new(1.0, spring, damping).unwrap();
        let mut state = OscillatorState::new(params, start).unwrap();

        let mut speeds = Vec::new();
        for _ in 0..300 {
            state = step(&state, DT).unwrap();
            speeds.push(state.angular_velocity.abs());
            // No overshoot past equilibrium
            prop_assert!(state.angle > -1e-9);
        }
        let peak = speeds
            .iter()
            .enumerate()
            .fold((0, 0.0), |best, (i, &s)| if s > best.1 { (i, s) } else { best })
            .0;
        prop_assert!(speeds[peak..].windows(2).all(|w| w[1] <= w[0] + 1e-12));
    }

    #[test]
    fn underdamped_decays_geometrically(
        spring in 20.0f64..150.0,
        zeta in 0.05f64..0.4,
        start in 0.2f64..1.5,
    ) {
        let damping = 2.0 * zeta * spring.sqrt();
        let params = OscillatorParams::new(1.0, spring, damping).unwrap();
        let damped = (1.0 - zeta * zeta).sqrt();
        let period = 2.0 * PI / (params.natural_frequency() * damped);
        let dt = 1e-3;
        let steps = (3.2 * period / dt).ceil() as usize;

        // Signed extremum at each velocity reversal; released at rest, so
        // the start is one too
        let mut state = OscillatorState::new(params, start).unwrap();
        let mut peaks = vec![start];
        for _ in 0..steps {
            let next = step(&state, dt).unwrap();
            if next.angular_velocity * state.angular_velocity < 0.0 {
                let peak = if next.angle.abs() > state.angle.abs() { next.angle } else { state.angle };
                peaks.push(peak);
            }
            state = next;
        }
        prop_assert!(peaks.len() >= 5, "only {} swings", peaks.len());
        prop_assert!(peaks.windows(2).all(|w| w[1].abs() < w[0].abs()));

        // Same-sign swings shrink by a constant factor each period
        let expected = (-2.0 * PI * zeta / damped).exp();
        for w in peaks.windows(3) {
            let ratio = w[2] / w[0];
            prop_assert!(
                (ratio / expected - 1.0).abs() < 1e-3,
                "ratio {ratio} vs {expected}"
            );
        }
    }

    #[test]
    fn simulation_replays_identically(
        start_deg in 10.0f64..170.0,
        spring in 10.0f64..200.0,
        damping in 0.5f64..40.0,
    ) {
        let settings = crank_rocker_settings();
        let mut a = Simulation::new(&settings).unwrap();
        let mut b = Simulation::new(&settings).unwrap();
        a.start(start_deg.to_radians(), 1.0, spring, damping).unwrap();
        b.start(start_deg.to_radians(), 1.0, spring, damping).unwrap();
        for _ in 0..120 {
            prop_assert_eq!(a.tick().unwrap(), b.tick().unwrap());
        }
        prop_assert_eq!(a.snapshot(), b.snapshot());
    }
}

#[test]
fn oracle_configuration() {
    let linkage = FourBarLinkage::new(4.0, 2.0, 3.0, 3.0).unwrap();
    let solution = KinematicSolver::default().solve(&linkage, PI / 2.0).unwrap();
    assert!((solution.coupler_angle - 0.2660800472261602).abs() < 1e-9);
    assert!((solution.output_angle - 1.9482173883620209).abs() < 1e-9);
}

#[test]
fn infeasible_lengths_never_start() {
    let mut settings = Settings::default();
    settings.linkage.ground = 2.0;
    settings.linkage.input = 10.0;
    settings.linkage.coupler = 2.0;
    settings.linkage.output = 1.0;
    assert!(matches!(
        Simulation::new(&settings),
        Err(SimError::LinkageUnreachable { .. })
    ));
}

#[test]
fn reset_keeps_running() {
    let mut sim = Simulation::new(&crank_rocker_settings()).unwrap();
    sim.start(1.0, 1.0, 100.0, 5.0).unwrap();
    for _ in 0..30 {
        sim.tick().unwrap();
    }
    let before = sim.snapshot();

    sim.reset_tracers();
    assert!(sim.tracer().is_empty());
    assert_eq!(sim.phase(), SimPhase::Running);
    assert_eq!(sim.clock().ticks, before.ticks);

    let report = sim.tick().unwrap().unwrap();
    assert_eq!(report.tick, before.ticks + 1);
    assert_eq!(sim.tracer_path(), vec![sim.linkage().output_joint()]);
}

#[test]
fn restart_clears_history() {
    let mut sim = Simulation::new(&crank_rocker_settings()).unwrap();
    sim.start(1.0, 1.0, 100.0, 5.0).unwrap();
    for _ in 0..30 {
        sim.tick().unwrap();
    }
    sim.stop();
    assert_eq!(sim.phase(), SimPhase::Stopped);
    assert!(sim.oscillator().is_none());

    sim.start(0.5, 1.0, 50.0, 20.0).unwrap();
    assert_eq!(sim.clock().ticks, 0);
    assert_eq!(sim.tracer().len(), 1);
    assert!((sim.linkage().input_angle() - 0.5).abs() < 1e-12);
}
