//! Four-bar linkage simulator
//!
//! Core modules:
//! - `sim`: Deterministic simulation (kinematics, oscillator, loop, tracer)
//! - `render`: Triangle-list vertex generation for the host renderer
//! - `platform`: Browser host bindings
//! - `settings`: Serializable defaults and tuning

pub mod error;
pub mod platform;
pub mod render;
pub mod settings;
pub mod sim;

pub use error::{Result, SimError};
pub use settings::Settings;

use glam::DVec2;

/// Simulation configuration constants
pub mod consts {
    /// Default tick rate (matches a 60 Hz display)
    pub const DEFAULT_TICK_RATE_HZ: f64 = 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Newton iteration cap for the loop-closure solve
    pub const SOLVER_MAX_ITERATIONS: usize = 50;
    /// Convergence tolerance, relative to the linkage length scale
    pub const SOLVER_TOLERANCE: f64 = 1e-9;

    /// Damping ratio below which a start is flagged as oscillating excessively
    pub const UNDERDAMPED_WARNING_ZETA: f64 = 0.5;

    /// Default number of tracer points kept
    pub const TRACER_CAPACITY: usize = 4096;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f64) -> f64 {
    use std::f64::consts::{PI, TAU};
    if !angle.is_finite() {
        return angle;
    }
    angle = angle.rem_euclid(TAU);
    if angle >= PI {
        angle -= TAU;
    }
    angle
}

/// Signed shortest difference `a - b`, wrapped to [-π, π)
#[inline]
pub fn angle_delta(a: f64, b: f64) -> f64 {
    normalize_angle(a - b)
}

/// Unit vector at `theta`
#[inline]
pub fn unit(theta: f64) -> DVec2 {
    DVec2::new(theta.cos(), theta.sin())
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f64, theta: f64) -> DVec2 {
    r * unit(theta)
}

/// Convert cartesian (x, y) to polar (r, theta)
#[inline]
pub fn cartesian_to_polar(pos: DVec2) -> (f64, f64) {
    (pos.length(), pos.y.atan2(pos.x))
}
