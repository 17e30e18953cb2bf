//! Fixed timestep simulation tick
//!
//! One tick: apply queued commands, advance the oscillator (or follow the
//! drag target), bounce off the angle limits, solve the loop, then commit and
//! record. Nothing is committed unless the solve succeeds.

use serde::{Deserialize, Serialize};

use super::oscillator;
use super::state::{SimEvent, SimPhase, Simulation, StopReason};
use crate::consts::MAX_SUBSTEPS;
use crate::error::{Result, SimError};

/// Outcome of one committed tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    pub tick: u64,
    pub time: f64,
    /// Unwrapped input angle (radians)
    pub input_angle: f64,
    pub coupler_angle: f64,
    pub output_angle: f64,
    pub angular_velocity: f64,
    /// The input hit a limit this tick
    pub limit_stop: bool,
    /// The tick followed a drag target instead of integrating
    pub dragging: bool,
    /// Newton iterations used by the solve
    pub iterations: usize,
}

/// Steps run for one host frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameAdvance {
    /// Committed ticks, in order
    pub reports: Vec<TickReport>,
    /// Failure that stopped the simulation mid-frame
    pub error: Option<SimError>,
}

impl FrameAdvance {
    /// The reports, or the failure if one occurred
    pub fn into_result(self) -> Result<Vec<TickReport>> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.reports),
        }
    }
}

impl Simulation {
    /// Advance one fixed step. Returns `Ok(None)` when nothing was committed:
    /// not running, or the drag target could not be reached (time still
    /// passes in that case).
    ///
    /// A kinematic failure stops the simulation and is returned; the last
    /// valid frame and the tracer are left untouched.
    pub fn tick(&mut self) -> Result<Option<TickReport>> {
        if self.phase != SimPhase::Running {
            return Ok(None);
        }
        self.apply_commands();

        let Some(current) = self.oscillator else {
            // Running without an oscillator cannot be reached through the API.
            self.halt(StopReason::Requested);
            return Ok(None);
        };

        let dt = self.clock.time_step;
        let mut limit_stop = false;
        let dragging = self.drag.is_some();

        let (solution, next) = if let Some(target) = self.drag {
            match self.drag_step(target) {
                Ok(solution) => {
                    let mut held = current;
                    held.hold_at(solution.input_angle);
                    (solution, held)
                }
                Err(error) => {
                    log::warn!("Drag target rejected: {error}");
                    self.push_event(SimEvent::DragRejected { error });
                    self.clock.advance();
                    return Ok(None);
                }
            }
        } else {
            let mut next = match oscillator::step(&current, dt) {
                Ok(next) => next,
                Err(error) => return Err(self.fail(error)),
            };

            let (angle, clamped) = self.linkage.clamp_input(next.angle);
            if clamped {
                next.bounce_at(angle);
                limit_stop = true;
                log::debug!("Limit stop at {:.2}°", angle.to_degrees());
                self.push_event(SimEvent::LimitStop { angle });
            }

            match self.solver.solve(&self.linkage, angle) {
                Ok(solution) => (solution, next),
                Err(error) => return Err(self.fail(error)),
            }
        };

        self.linkage.apply(&solution);
        self.oscillator = Some(next);
        self.clock.advance();
        self.tracer.record(self.clock.elapsed, self.linkage.output_joint());

        Ok(Some(TickReport {
            tick: self.clock.ticks,
            time: self.clock.elapsed,
            input_angle: solution.input_angle,
            coupler_angle: solution.coupler_angle,
            output_angle: solution.output_angle,
            angular_velocity: next.angular_velocity,
            limit_stop,
            dragging,
            iterations: solution.iterations,
        }))
    }

    /// Feed wall-clock time and run as many fixed steps as fit, at most
    /// `MAX_SUBSTEPS`. A failing step ends the frame; the steps committed
    /// before it are still reported.
    pub fn advance(&mut self, frame_dt: f64) -> FrameAdvance {
        let mut frame = FrameAdvance::default();
        if self.phase != SimPhase::Running || !frame_dt.is_finite() || frame_dt <= 0.0 {
            return frame;
        }
        let dt = self.clock.time_step;
        self.accumulator += frame_dt.min(dt * MAX_SUBSTEPS as f64);

        let mut substeps = 0;
        while self.accumulator >= dt && substeps < MAX_SUBSTEPS {
            self.accumulator -= dt;
            substeps += 1;
            match self.tick() {
                Ok(Some(report)) => frame.reports.push(report),
                Ok(None) => {}
                Err(error) => {
                    frame.error = Some(error);
                    break;
                }
            }
            if self.phase != SimPhase::Running {
                break;
            }
        }
        frame
    }

    fn fail(&mut self, error: SimError) -> SimError {
        log::error!("Tick failed: {error}");
        self.push_event(SimEvent::SolverFailure {
            error: error.clone(),
        });
        self.halt(StopReason::SolverFailure);
        error
    }
}
