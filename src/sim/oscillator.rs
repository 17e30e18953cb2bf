//! Damped mass-spring-damper driving the input angle
//!
//! `m·θ'' + c·θ' + k·(θ − θ_eq) = 0`, integrated with classic RK4.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

/// How the oscillator returns to equilibrium
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DampingRegime {
    /// ζ < 1: decaying oscillation
    Underdamped,
    /// ζ = 1: fastest return without overshoot
    CriticallyDamped,
    /// ζ > 1: slow creep back
    Overdamped,
}

impl DampingRegime {
    pub fn from_zeta(zeta: f64) -> Self {
        const BAND: f64 = 1e-9;
        if (zeta - 1.0).abs() <= BAND {
            DampingRegime::CriticallyDamped
        } else if zeta < 1.0 {
            DampingRegime::Underdamped
        } else {
            DampingRegime::Overdamped
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DampingRegime::Underdamped => "underdamped",
            DampingRegime::CriticallyDamped => "critically damped",
            DampingRegime::Overdamped => "overdamped",
        }
    }
}

/// Mass, spring and damper constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OscillatorParams {
    pub mass: f64,
    pub spring_constant: f64,
    pub damping_coefficient: f64,
    /// Angle the spring pulls toward (radians)
    #[serde(default)]
    pub equilibrium: f64,
}

impl Default for OscillatorParams {
    fn default() -> Self {
        Self {
            mass: 1.0,
            spring_constant: 100.0,
            damping_coefficient: 50.0,
            equilibrium: 0.0,
        }
    }
}

impl OscillatorParams {
    /// Validated constructor (equilibrium at zero)
    pub fn new(mass: f64, spring_constant: f64, damping_coefficient: f64) -> Result<Self> {
        let params = Self {
            mass,
            spring_constant,
            damping_coefficient,
            equilibrium: 0.0,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn with_equilibrium(mut self, equilibrium: f64) -> Self {
        self.equilibrium = equilibrium;
        self
    }

    /// Reject values that make the equation of motion meaningless
    pub fn validate(&self) -> Result<()> {
        if !self.mass.is_finite() || self.mass <= 0.0 {
            return Err(SimError::InvalidParameter {
                name: "mass",
                value: self.mass,
                reason: "must be > 0",
            });
        }
        if !self.spring_constant.is_finite() || self.spring_constant < 0.0 {
            return Err(SimError::InvalidParameter {
                name: "spring constant",
                value: self.spring_constant,
                reason: "must be >= 0",
            });
        }
        if !self.damping_coefficient.is_finite() || self.damping_coefficient < 0.0 {
            return Err(SimError::InvalidParameter {
                name: "damping coefficient",
                value: self.damping_coefficient,
                reason: "must be >= 0",
            });
        }
        if !self.equilibrium.is_finite() {
            return Err(SimError::InvalidParameter {
                name: "equilibrium",
                value: self.equilibrium,
                reason: "must be finite",
            });
        }
        if self.spring_constant * self.mass == 0.0 {
            return Err(SimError::InvalidOscillatorParameters {
                mass: self.mass,
                spring: self.spring_constant,
            });
        }
        Ok(())
    }

    /// ζ = c / (2·sqrt(k·m))
    pub fn damping_ratio(&self) -> Result<f64> {
        self.validate()?;
        Ok(self.damping_coefficient / (2.0 * (self.spring_constant * self.mass).sqrt()))
    }

    /// Undamped natural frequency ω_n = sqrt(k/m) (rad/s)
    pub fn natural_frequency(&self) -> f64 {
        (self.spring_constant / self.mass).sqrt()
    }

    pub fn regime(&self) -> Result<DampingRegime> {
        Ok(DampingRegime::from_zeta(self.damping_ratio()?))
    }

    /// θ'' for a given state
    #[inline]
    fn acceleration(&self, angle: f64, angular_velocity: f64) -> f64 {
        -(self.damping_coefficient * angular_velocity
            + self.spring_constant * (angle - self.equilibrium))
            / self.mass
    }
}

/// Generalized coordinate of the oscillator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OscillatorState {
    pub params: OscillatorParams,
    /// Angle (radians, unwrapped)
    pub angle: f64,
    /// Angular velocity (rad/s)
    pub angular_velocity: f64,
}

impl OscillatorState {
    /// Start at rest at `angle`
    pub fn new(params: OscillatorParams, angle: f64) -> Result<Self> {
        params.validate()?;
        if !angle.is_finite() {
            return Err(SimError::InvalidParameter {
                name: "initial angle",
                value: angle,
                reason: "must be finite",
            });
        }
        Ok(Self {
            params,
            angle,
            angular_velocity: 0.0,
        })
    }

    /// Angular acceleration implied by the current state (rad/s²)
    pub fn angular_acceleration(&self) -> f64 {
        self.params.acceleration(self.angle, self.angular_velocity)
    }

    /// Kinetic plus spring energy about the equilibrium
    pub fn energy(&self) -> f64 {
        let p = &self.params;
        let x = self.angle - p.equilibrium;
        0.5 * p.mass * self.angular_velocity * self.angular_velocity
            + 0.5 * p.spring_constant * x * x
    }

    /// Swap parameters, keeping angle and velocity
    pub fn set_params(&mut self, params: OscillatorParams) -> Result<()> {
        params.validate()?;
        self.params = params;
        Ok(())
    }

    /// Elastic stop: pin the angle and send the velocity back
    pub fn bounce_at(&mut self, angle: f64) {
        self.angle = angle;
        self.angular_velocity = -self.angular_velocity;
    }

    /// Hold still at `angle` (used while dragging)
    pub fn hold_at(&mut self, angle: f64) {
        self.angle = angle;
        self.angular_velocity = 0.0;
    }
}

/// Advance the oscillator by `dt` with classic RK4.
///
/// Pure and deterministic: identical `(state, dt)` gives identical output.
pub fn step(state: &OscillatorState, dt: f64) -> Result<OscillatorState> {
    if !dt.is_finite() || dt <= 0.0 {
        return Err(SimError::InvalidParameter {
            name: "time step",
            value: dt,
            reason: "must be a finite duration > 0",
        });
    }
    let p = &state.params;
    p.validate()?;

    let (x0, v0) = (state.angle, state.angular_velocity);
    let f = |x: f64, v: f64| (v, p.acceleration(x, v));

    let (k1x, k1v) = f(x0, v0);
    let (k2x, k2v) = f(x0 + 0.5 * dt * k1x, v0 + 0.5 * dt * k1v);
    let (k3x, k3v) = f(x0 + 0.5 * dt * k2x, v0 + 0.5 * dt * k2v);
    let (k4x, k4v) = f(x0 + dt * k3x, v0 + dt * k3v);

    Ok(OscillatorState {
        params: *p,
        angle: x0 + dt / 6.0 * (k1x + 2.0 * k2x + 2.0 * k3x + k4x),
        angular_velocity: v0 + dt / 6.0 * (k1v + 2.0 * k2v + 2.0 * k3v + k4v),
    })
}
