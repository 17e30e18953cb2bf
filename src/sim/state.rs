//! Simulation state and lifecycle
//!
//! `Simulation` is the single owner of all mutable model state. Setters
//! validate immediately and queue a command; queued commands are applied at
//! the next tick boundary while running, right away otherwise.

use std::collections::VecDeque;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::link::{LinkName, LinkState};
use super::linkage::FourBarLinkage;
use super::oscillator::{OscillatorParams, OscillatorState};
use super::solver::{KinematicSolver, LinkageSolution};
use super::tracer::TracerHistory;
use crate::cartesian_to_polar;
use crate::error::{Result, SimError};
use crate::settings::Settings;

/// Lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimPhase {
    /// No oscillator; geometry can still be edited and dragged
    Stopped,
    /// Ticks integrate and solve
    Running,
    /// Ticks are ignored; everything is retained
    Paused,
}

/// Why the loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    Requested,
    SolverFailure,
}

/// Fixed-step clock owned by the loop
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationClock {
    /// Fixed Δt (seconds)
    pub time_step: f64,
    /// Simulated seconds since start
    pub elapsed: f64,
    /// Ticks since start
    pub ticks: u64,
    running: bool,
}

impl SimulationClock {
    pub fn new(time_step: f64) -> Self {
        Self {
            time_step,
            elapsed: 0.0,
            ticks: 0,
            running: false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn reset(&mut self) {
        self.elapsed = 0.0;
        self.ticks = 0;
    }

    pub(crate) fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    /// Count one tick. Elapsed time is derived from the tick count so it
    /// does not drift.
    pub(crate) fn advance(&mut self) {
        self.ticks += 1;
        self.elapsed = self.ticks as f64 * self.time_step;
    }
}

/// Notifications for the host, drained with [`Simulation::drain_events`]
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    Started { zeta: f64 },
    /// Damping ratio below the warning threshold
    UnderdampedWarning { zeta: f64 },
    /// Input hit a limit and bounced
    LimitStop { angle: f64 },
    Paused,
    Resumed,
    Stopped { reason: StopReason },
    SolverFailure { error: SimError },
    /// A queued parameter change could not be applied
    ParameterRejected { error: SimError },
    DragRejected { error: SimError },
    TracersReset,
}

/// Deferred mutations, applied at tick boundaries
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Command {
    SetLength(LinkName, f64),
    SetLimits(f64, f64),
    SetOscillator(OscillatorParams),
    Drag(DVec2),
    Release,
}

/// Read-only view handed to renderers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub phase: SimPhase,
    pub elapsed: f64,
    pub ticks: u64,
    pub ground: LinkState,
    pub input: LinkState,
    pub coupler: LinkState,
    pub output: LinkState,
    /// Unwrapped input angle (radians)
    pub input_angle: f64,
    pub angular_velocity: Option<f64>,
    pub tracer: Vec<DVec2>,
    pub dragging: bool,
}

/// The simulation core
#[derive(Debug, Clone)]
pub struct Simulation {
    pub(crate) solver: KinematicSolver,
    pub(crate) linkage: FourBarLinkage,
    pub(crate) oscillator: Option<OscillatorState>,
    /// Latest accepted oscillator parameters
    pub(crate) params: OscillatorParams,
    pub(crate) tracer: TracerHistory,
    pub(crate) clock: SimulationClock,
    pub(crate) phase: SimPhase,
    pub(crate) drag: Option<DVec2>,
    pub(crate) underdamped_threshold: f64,
    /// Wall-clock time not yet consumed by fixed steps
    pub(crate) accumulator: f64,
    commands: VecDeque<Command>,
    events: Vec<SimEvent>,
}

impl Simulation {
    /// Build a stopped simulation and assemble the linkage at the configured
    /// starting angle.
    pub fn new(settings: &Settings) -> Result<Self> {
        settings.validate()?;
        let solver = settings.build_solver();
        let mut linkage = settings.build_linkage()?;
        let (angle, _) = linkage.clamp_input(settings.linkage.input_angle_deg.to_radians());
        let solution = solver.solve(&linkage, angle)?;
        linkage.apply(&solution);

        log::info!(
            "Linkage assembled: lengths {:?}, input {:.2}°",
            linkage.lengths(),
            angle.to_degrees()
        );

        Ok(Self {
            solver,
            linkage,
            oscillator: None,
            params: settings.oscillator,
            tracer: TracerHistory::new(settings.tracer_capacity),
            clock: SimulationClock::new(settings.time_step()),
            phase: SimPhase::Stopped,
            drag: None,
            underdamped_threshold: settings.underdamped_threshold,
            accumulator: 0.0,
            commands: VecDeque::new(),
            events: Vec::new(),
        })
    }

    // === Queries ===

    pub fn phase(&self) -> SimPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == SimPhase::Running
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    pub fn linkage(&self) -> &FourBarLinkage {
        &self.linkage
    }

    pub fn oscillator(&self) -> Option<&OscillatorState> {
        self.oscillator.as_ref()
    }

    pub fn oscillator_params(&self) -> &OscillatorParams {
        &self.params
    }

    pub fn solver(&self) -> &KinematicSolver {
        &self.solver
    }

    pub fn tracer(&self) -> &TracerHistory {
        &self.tracer
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Damping ratio of the current parameters
    pub fn damping_ratio(&self) -> Result<f64> {
        self.params.damping_ratio()
    }

    /// Origin, end point and angle of one link
    pub fn link_state(&self, name: LinkName) -> LinkState {
        self.linkage.link_state(name)
    }

    /// Traced output joint positions, oldest first
    pub fn tracer_path(&self) -> Vec<DVec2> {
        self.tracer.path()
    }

    pub fn snapshot(&self) -> FrameSnapshot {
        FrameSnapshot {
            phase: self.phase,
            elapsed: self.clock.elapsed,
            ticks: self.clock.ticks,
            ground: self.link_state(LinkName::Ground),
            input: self.link_state(LinkName::Input),
            coupler: self.link_state(LinkName::Coupler),
            output: self.link_state(LinkName::Output),
            input_angle: self.linkage.input_angle(),
            angular_velocity: self.oscillator.map(|o| o.angular_velocity),
            tracer: self.tracer.path(),
            dragging: self.drag.is_some(),
        }
    }

    /// Take all pending events
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    // === Setters ===

    /// Change a link length. The new geometry must assemble at the current
    /// input angle.
    pub fn set_link_length(&mut self, name: LinkName, length: f64) -> Result<()> {
        let mut trial = self.linkage.clone();
        trial.set_length(name, length)?;
        self.solver.solve(&trial, trial.input_angle())?;
        self.submit(Command::SetLength(name, length));
        Ok(())
    }

    /// Input angle limits (radians); reversed bounds are swapped. If the
    /// current angle falls outside, the linkage must assemble at the bound.
    pub fn set_angle_limits(&mut self, min: f64, max: f64) -> Result<()> {
        let mut trial = self.linkage.clone();
        trial.set_angle_limits(min, max)?;
        let (angle, clamped) = trial.clamp_input(trial.input_angle());
        if clamped {
            self.solver.solve(&trial, angle)?;
        }
        self.submit(Command::SetLimits(min, max));
        Ok(())
    }

    /// Mass, spring and damping; the equilibrium is kept
    pub fn set_oscillator_params(&mut self, mass: f64, spring: f64, damping: f64) -> Result<()> {
        let params = OscillatorParams::new(mass, spring, damping)?
            .with_equilibrium(self.params.equilibrium);
        self.submit(Command::SetOscillator(params));
        Ok(())
    }

    /// Angle the spring pulls toward (radians)
    pub fn set_equilibrium(&mut self, equilibrium: f64) -> Result<()> {
        let params = self.params.with_equilibrium(equilibrium);
        params.validate()?;
        self.submit(Command::SetOscillator(params));
        Ok(())
    }

    /// Drag the output joint toward `target`
    pub fn drag_to(&mut self, target: DVec2) -> Result<()> {
        if !target.is_finite() {
            return Err(SimError::InvalidParameter {
                name: "drag target",
                value: if target.x.is_finite() { target.y } else { target.x },
                reason: "must be a finite point",
            });
        }
        self.submit(Command::Drag(target));
        Ok(())
    }

    /// Release the drag; the oscillator restarts at rest from the dragged
    /// angle, starting the simulation if it was not running
    pub fn end_drag(&mut self) {
        self.submit(Command::Release);
    }

    // === Lifecycle ===

    /// Start (or restart) from `initial_angle` with the given constants.
    /// On failure the simulation stays as it was.
    pub fn start(&mut self, initial_angle: f64, mass: f64, spring: f64, damping: f64) -> Result<()> {
        let params = OscillatorParams::new(mass, spring, damping)?
            .with_equilibrium(self.params.equilibrium);
        self.start_with(initial_angle, params)
    }

    /// Start from the current input angle with the current parameters
    pub fn restart(&mut self) -> Result<()> {
        self.apply_commands();
        self.start_with(self.linkage.input_angle(), self.params)
    }

    fn start_with(&mut self, initial_angle: f64, params: OscillatorParams) -> Result<()> {
        let zeta = params.damping_ratio()?;
        if !initial_angle.is_finite() {
            return Err(SimError::InvalidParameter {
                name: "initial angle",
                value: initial_angle,
                reason: "must be finite",
            });
        }
        self.apply_commands();

        let (angle, _) = self.linkage.clamp_input(initial_angle);
        let solution = self.solver.solve(&self.linkage, angle)?;
        let oscillator = OscillatorState::new(params, angle)?;

        self.linkage.apply(&solution);
        self.oscillator = Some(oscillator);
        self.params = params;
        self.drag = None;
        self.accumulator = 0.0;
        self.tracer.clear();
        self.clock.reset();
        self.tracer.record(self.clock.elapsed, self.linkage.output_joint());
        self.phase = SimPhase::Running;
        self.clock.set_running(true);

        log::info!(
            "Simulation started at {:.2}° (m={}, k={}, c={}, ζ={:.3}, ω_n={:.2} rad/s)",
            angle.to_degrees(),
            params.mass,
            params.spring_constant,
            params.damping_coefficient,
            zeta,
            params.natural_frequency()
        );
        self.events.push(SimEvent::Started { zeta });
        if zeta < self.underdamped_threshold {
            log::warn!(
                "Damping ratio {:.2} is low, the linkage may oscillate excessively",
                zeta
            );
            self.events.push(SimEvent::UnderdampedWarning { zeta });
        }
        Ok(())
    }

    /// Running → Paused. Returns whether the phase changed.
    pub fn pause(&mut self) -> bool {
        if self.phase != SimPhase::Running {
            return false;
        }
        self.phase = SimPhase::Paused;
        self.clock.set_running(false);
        self.events.push(SimEvent::Paused);
        log::info!("Simulation paused at t={:.3}s", self.clock.elapsed);
        true
    }

    /// Paused → Running. Returns whether the phase changed.
    pub fn resume(&mut self) -> bool {
        if self.phase != SimPhase::Paused {
            return false;
        }
        self.phase = SimPhase::Running;
        self.clock.set_running(true);
        self.accumulator = 0.0;
        self.events.push(SimEvent::Resumed);
        log::info!("Simulation resumed");
        true
    }

    /// Pause if running, resume if paused. Returns whether it is now running.
    pub fn toggle_pause(&mut self) -> bool {
        match self.phase {
            SimPhase::Running => {
                self.pause();
            }
            SimPhase::Paused => {
                self.resume();
            }
            SimPhase::Stopped => {}
        }
        self.is_running()
    }

    /// Stop and drop the oscillator. Geometry and tracers are kept.
    pub fn stop(&mut self) {
        if self.phase == SimPhase::Stopped {
            return;
        }
        self.halt(StopReason::Requested);
        // Leftover commands would otherwise wait for a tick that never comes.
        self.apply_commands();
    }

    /// Clear the tracer path without touching the phase
    pub fn reset_tracers(&mut self) {
        self.tracer.clear();
        self.events.push(SimEvent::TracersReset);
        log::info!("Tracers reset");
    }

    // === Internals shared with the tick ===

    pub(crate) fn halt(&mut self, reason: StopReason) {
        self.phase = SimPhase::Stopped;
        self.clock.set_running(false);
        self.oscillator = None;
        self.drag = None;
        self.accumulator = 0.0;
        self.events.push(SimEvent::Stopped { reason });
        match reason {
            StopReason::Requested => log::info!("Simulation stopped"),
            StopReason::SolverFailure => log::error!(
                "Simulation stopped at input {:.2}°: linkage could not be solved",
                self.linkage.input_angle().to_degrees()
            ),
        }
    }

    pub(crate) fn push_event(&mut self, event: SimEvent) {
        self.events.push(event);
    }

    fn submit(&mut self, command: Command) {
        self.commands.push_back(command);
        if self.phase != SimPhase::Running {
            self.apply_commands();
        }
    }

    /// Apply queued commands in order. A command that no longer applies is
    /// dropped with an event; the rest still run.
    pub(crate) fn apply_commands(&mut self) {
        while let Some(command) = self.commands.pop_front() {
            let result = match command {
                Command::SetLength(name, length) => self.apply_length(name, length),
                Command::SetLimits(min, max) => self.apply_limits(min, max),
                Command::SetOscillator(params) => self.apply_params(params),
                Command::Drag(target) => {
                    self.drag = Some(target);
                    if self.phase == SimPhase::Running {
                        // The tick itself performs the drag solve.
                        Ok(())
                    } else {
                        self.drag_step(target).map(|_| ())
                    }
                }
                Command::Release => self.release_drag(),
            };

            if let Err(error) = result {
                match command {
                    Command::Drag(_) => {
                        log::warn!("Drag target rejected: {error}");
                        self.events.push(SimEvent::DragRejected { error });
                    }
                    _ => {
                        log::warn!("Parameter change rejected: {error}");
                        self.events.push(SimEvent::ParameterRejected { error });
                    }
                }
            }
        }
    }

    fn apply_length(&mut self, name: LinkName, length: f64) -> Result<()> {
        let mut trial = self.linkage.clone();
        trial.set_length(name, length)?;
        let solution = self.solver.solve(&trial, trial.input_angle())?;
        trial.apply(&solution);
        self.linkage = trial;
        log::info!("{} length set to {}", name.as_str(), length);
        Ok(())
    }

    fn apply_limits(&mut self, min: f64, max: f64) -> Result<()> {
        let mut trial = self.linkage.clone();
        trial.set_angle_limits(min, max)?;
        let (angle, clamped) = trial.clamp_input(trial.input_angle());
        if clamped {
            let solution = self.solver.solve(&trial, angle)?;
            trial.apply(&solution);
            if let Some(osc) = self.oscillator.as_mut() {
                osc.bounce_at(angle);
            }
        }
        self.linkage = trial;
        log::info!(
            "Angle limits set to {:.1}°..{:.1}°",
            self.linkage.min_angle.to_degrees(),
            self.linkage.max_angle.to_degrees()
        );
        Ok(())
    }

    fn apply_params(&mut self, params: OscillatorParams) -> Result<()> {
        let zeta = params.damping_ratio()?;
        if let Some(osc) = self.oscillator.as_mut() {
            osc.set_params(params)?;
        }
        self.params = params;
        if zeta < self.underdamped_threshold {
            log::warn!("Damping ratio {:.2} may oscillate excessively", zeta);
            self.events.push(SimEvent::UnderdampedWarning { zeta });
        }
        Ok(())
    }

    /// Inverse-solve toward a drag target and commit the result
    pub(crate) fn drag_step(&mut self, target: DVec2) -> Result<LinkageSolution> {
        let (distance, output_angle) = cartesian_to_polar(target - self.linkage.output_pivot());
        if distance < f64::EPSILON {
            return Err(SimError::InvalidParameter {
                name: "drag target",
                value: distance,
                reason: "must not coincide with the output pivot",
            });
        }
        let mut solution = self.solver.solve_for_output(&self.linkage, output_angle)?;

        let (angle, clamped) = self.linkage.clamp_input(solution.input_angle);
        if clamped {
            solution = self.solver.solve(&self.linkage, angle)?;
        }
        self.linkage.apply(&solution);
        if let Some(osc) = self.oscillator.as_mut() {
            osc.hold_at(solution.input_angle);
        }
        Ok(solution)
    }

    /// Running: the oscillator continues from the dragged angle at rest and
    /// the tracer is kept. Otherwise the release starts a fresh run there.
    fn release_drag(&mut self) -> Result<()> {
        if self.drag.take().is_none() {
            return Ok(());
        }
        let angle = self.linkage.input_angle();
        log::info!("Drag released at {:.2}°", angle.to_degrees());
        if self.phase == SimPhase::Running {
            if let Some(osc) = self.oscillator.as_mut() {
                osc.hold_at(angle);
                return Ok(());
            }
        }
        self.start_with(angle, self.params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn sim() -> Simulation {
        Simulation::new(&Settings::default()).unwrap()
    }

    #[test]
    fn test_new_is_assembled_and_stopped() {
        let sim = sim();
        assert_eq!(sim.phase(), SimPhase::Stopped);
        assert!(sim.linkage().is_solved());
        assert!(sim.linkage().loop_closure_residual() < 1e-6);
        assert!((sim.linkage().input_angle() - FRAC_PI_2).abs() < 1e-12);
        assert!(sim.tracer_path().is_empty());
    }

    #[test]
    fn test_lifecycle() {
        let mut sim = sim();
        assert!(!sim.pause());
        sim.start(1.0, 1.0, 100.0, 50.0).unwrap();
        assert_eq!(sim.phase(), SimPhase::Running);
        assert!(sim.clock().is_running());
        assert_eq!(sim.tracer_path().len(), 1);

        assert!(sim.pause());
        assert_eq!(sim.phase(), SimPhase::Paused);
        assert!(!sim.clock().is_running());
        assert!(!sim.pause());

        assert!(sim.toggle_pause());
        assert_eq!(sim.phase(), SimPhase::Running);

        sim.stop();
        assert_eq!(sim.phase(), SimPhase::Stopped);
        assert!(sim.oscillator().is_none());
        assert!(!sim.resume());
    }

    #[test]
    fn test_start_rejects_bad_params() {
        let mut sim = sim();
        assert!(matches!(
            sim.start(1.0, 0.0, 100.0, 50.0),
            Err(SimError::InvalidParameter { .. })
        ));
        assert!(matches!(
            sim.start(1.0, 1.0, 0.0, 50.0),
            Err(SimError::InvalidOscillatorParameters { .. })
        ));
        assert_eq!(sim.phase(), SimPhase::Stopped);
    }

    #[test]
    fn test_start_clamps_initial_angle() {
        let mut sim = sim();
        sim.start(-1.0, 1.0, 100.0, 50.0).unwrap();
        assert_eq!(sim.linkage().input_angle(), 0.0);
        assert_eq!(sim.oscillator().map(|o| o.angle), Some(0.0));
    }

    #[test]
    fn test_underdamped_start_warns() {
        let mut sim = sim();
        sim.start(1.0, 1.0, 100.0, 2.0).unwrap();
        let events = sim.drain_events();
        assert!(events.iter().any(|e| matches!(e, SimEvent::UnderdampedWarning { .. })));
        assert!(sim.drain_events().is_empty());
    }

    #[test]
    fn test_setters_apply_immediately_when_stopped() {
        let mut sim = sim();
        sim.set_link_length(LinkName::Input, 1.5).unwrap();
        assert_eq!(sim.link_state(LinkName::Input).length, 1.5);
        assert!(sim.linkage().loop_closure_residual() < 1e-6);

        sim.set_angle_limits(2.0, 0.5).unwrap();
        assert_eq!(sim.linkage().min_angle, 0.5);
        assert_eq!(sim.linkage().max_angle, 2.0);

        sim.set_oscillator_params(2.0, 50.0, 5.0).unwrap();
        assert_eq!(sim.oscillator_params().mass, 2.0);
    }

    #[test]
    fn test_setters_reject_invalid() {
        let mut sim = sim();
        let before = sim.linkage().clone();
        assert!(sim.set_link_length(LinkName::Coupler, -1.0).is_err());
        assert!(matches!(
            sim.set_link_length(LinkName::Input, 20.0),
            Err(SimError::LinkageUnreachable { .. })
        ));
        assert_eq!(sim.linkage(), &before);

        assert!(sim.set_oscillator_params(-1.0, 1.0, 1.0).is_err());
        assert!(sim.set_oscillator_params(1.0, -1.0, 1.0).is_err());
        assert!(sim.set_oscillator_params(1.0, 1.0, -1.0).is_err());
        assert!(matches!(
            sim.set_oscillator_params(1.0, 0.0, 1.0),
            Err(SimError::InvalidOscillatorParameters { .. })
        ));
        assert_eq!(sim.oscillator_params(), &OscillatorParams::default());
        assert!(sim.set_angle_limits(f64::NAN, 1.0).is_err());
    }

    #[test]
    fn test_limits_clamp_current_angle() {
        let mut sim = sim();
        sim.set_angle_limits(0.0, 1.0).unwrap();
        assert_eq!(sim.linkage().input_angle(), 1.0);
        assert!(sim.linkage().loop_closure_residual() < 1e-6);
    }

    #[test]
    fn test_drag_when_stopped() {
        let mut sim = sim();
        let start = sim.linkage().input_angle();
        // Pull the output joint around its pivot toward the ground line
        let pivot = sim.linkage().output_pivot();
        let joint = sim.linkage().output_joint();
        let angle = (joint - pivot).y.atan2((joint - pivot).x) + 0.1;
        let target = pivot + DVec2::new(angle.cos(), angle.sin()) * 10.0;

        sim.drag_to(target).unwrap();
        assert!(sim.is_dragging());
        assert!(sim.linkage().input_angle() > start);
        assert!(sim.linkage().loop_closure_residual() < 1e-6);

        let dragged = sim.linkage().input_angle();
        sim.end_drag();
        assert!(!sim.is_dragging());
        // Releasing starts a run from the dragged angle at rest
        assert_eq!(sim.phase(), SimPhase::Running);
        let osc = sim.oscillator().unwrap();
        assert_eq!(osc.angle, dragged);
        assert_eq!(osc.angular_velocity, 0.0);
        assert_eq!(sim.tracer_path(), vec![sim.linkage().output_joint()]);
        assert!(sim.drag_to(DVec2::new(f64::NAN, 0.0)).is_err());
    }

    #[test]
    fn test_release_while_paused_restarts() {
        let mut sim = sim();
        sim.start(1.0, 1.0, 100.0, 50.0).unwrap();
        sim.pause();
        let pivot = sim.linkage().output_pivot();
        let joint = sim.linkage().output_joint();
        sim.drag_to(pivot + (joint - pivot) * 2.0).unwrap();
        sim.end_drag();
        assert_eq!(sim.phase(), SimPhase::Running);
        assert_eq!(sim.clock().ticks, 0);
        assert_eq!(sim.oscillator().map(|o| o.angular_velocity), Some(0.0));
    }

    #[test]
    fn test_limits_rejected_when_bound_cannot_assemble() {
        // Triple-rocker: binds well before the input reaches 180°
        let mut settings = Settings::default();
        settings.linkage.ground = 4.0;
        settings.linkage.input = 3.0;
        settings.linkage.coupler = 2.0;
        settings.linkage.output = 2.5;
        settings.linkage.input_angle_deg = 20.0;
        let mut sim = Simulation::new(&settings).unwrap();
        let before = sim.linkage().clone();

        assert!(matches!(
            sim.set_angle_limits(std::f64::consts::PI - 0.1, std::f64::consts::PI),
            Err(SimError::LinkageUnreachable { .. })
        ));
        assert_eq!(sim.linkage(), &before);
        assert_eq!(sim.linkage().min_angle, 0.0);
        assert!(sim.drain_events().is_empty());

        // Still accepted when the current angle stays inside
        sim.set_angle_limits(0.1, 1.0).unwrap();
        assert_eq!(sim.linkage().min_angle, 0.1);
    }

    #[test]
    fn test_reset_tracers_keeps_phase() {
        let mut sim = sim();
        sim.start(1.0, 1.0, 100.0, 50.0).unwrap();
        sim.reset_tracers();
        assert!(sim.tracer_path().is_empty());
        assert_eq!(sim.phase(), SimPhase::Running);
    }

    #[test]
    fn test_snapshot() {
        let sim = sim();
        let snap = sim.snapshot();
        assert_eq!(snap.phase, SimPhase::Stopped);
        assert_eq!(snap.input, sim.link_state(LinkName::Input));
        assert!((snap.coupler.end_point - snap.output.end_point).length() < 1e-6);
        assert!(snap.angular_velocity.is_none());
    }
}
