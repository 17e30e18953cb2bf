//! Simulation settings and defaults
//!
//! Read by hosts from JSON; the core never touches the filesystem.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{Result, SimError};
use crate::sim::{Assembly, FourBarLinkage, KinematicSolver, OscillatorParams};

/// Newton solver tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    /// Residual tolerance relative to the longest link
    pub tolerance: f64,
    /// Iteration cap per seed
    pub max_iterations: usize,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            tolerance: SOLVER_TOLERANCE,
            max_iterations: SOLVER_MAX_ITERATIONS,
        }
    }
}

/// Initial linkage geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkageSettings {
    pub ground: f64,
    pub input: f64,
    pub coupler: f64,
    pub output: f64,
    /// Input pivot position
    pub pivot: DVec2,
    /// Ground link direction (degrees)
    pub ground_angle_deg: f64,
    /// Input angle limits (degrees)
    pub min_angle_deg: f64,
    pub max_angle_deg: f64,
    /// Starting input angle (degrees)
    pub input_angle_deg: f64,
    pub assembly: Assembly,
}

impl Default for LinkageSettings {
    fn default() -> Self {
        Self {
            ground: 4.0,
            input: 2.0,
            coupler: 3.0,
            output: 3.0,
            pivot: DVec2::ZERO,
            ground_angle_deg: 0.0,
            min_angle_deg: 0.0,
            max_angle_deg: 180.0,
            input_angle_deg: 90.0,
            assembly: Assembly::Open,
        }
    }
}

/// Simulation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Host tick rate (Hz); the fixed step is its reciprocal
    pub tick_rate_hz: f64,
    /// Tracer samples kept before the oldest is dropped
    pub tracer_capacity: usize,
    /// Damping ratio below which a start is flagged
    pub underdamped_threshold: f64,
    pub solver: SolverSettings,
    pub linkage: LinkageSettings,
    pub oscillator: OscillatorParams,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tick_rate_hz: DEFAULT_TICK_RATE_HZ,
            tracer_capacity: TRACER_CAPACITY,
            underdamped_threshold: UNDERDAMPED_WARNING_ZETA,
            solver: SolverSettings::default(),
            linkage: LinkageSettings::default(),
            oscillator: OscillatorParams::default(),
        }
    }
}

impl Settings {
    /// Parse settings; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Fixed simulation step (seconds)
    pub fn time_step(&self) -> f64 {
        1.0 / self.tick_rate_hz
    }

    pub fn validate(&self) -> Result<()> {
        if !self.tick_rate_hz.is_finite() || self.tick_rate_hz <= 0.0 {
            return Err(SimError::InvalidParameter {
                name: "tick rate",
                value: self.tick_rate_hz,
                reason: "must be > 0 Hz",
            });
        }
        if !self.underdamped_threshold.is_finite() || self.underdamped_threshold < 0.0 {
            return Err(SimError::InvalidParameter {
                name: "underdamped threshold",
                value: self.underdamped_threshold,
                reason: "must be a finite damping ratio >= 0",
            });
        }
        if !self.solver.tolerance.is_finite() || self.solver.tolerance <= 0.0 {
            return Err(SimError::InvalidParameter {
                name: "solver tolerance",
                value: self.solver.tolerance,
                reason: "must be > 0",
            });
        }
        self.oscillator.validate()?;
        self.build_linkage()?;
        Ok(())
    }

    pub fn build_solver(&self) -> KinematicSolver {
        KinematicSolver::new()
            .with_tolerance(self.solver.tolerance)
            .with_max_iterations(self.solver.max_iterations)
    }

    /// Unsolved linkage from the configured geometry
    pub fn build_linkage(&self) -> Result<FourBarLinkage> {
        let l = &self.linkage;
        let mut linkage = FourBarLinkage::with_ground(
            l.ground,
            l.input,
            l.coupler,
            l.output,
            l.pivot,
            l.ground_angle_deg.to_radians(),
        )?;
        linkage.set_angle_limits(l.min_angle_deg.to_radians(), l.max_angle_deg.to_radians())?;
        linkage.assembly = l.assembly;
        Ok(linkage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert!((settings.time_step() - 1.0 / 60.0).abs() < 1e-15);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings = Settings::from_json(r#"{ "tick_rate_hz": 120.0, "linkage": { "input": 1.5 } }"#)
            .unwrap();
        assert_eq!(settings.tick_rate_hz, 120.0);
        assert_eq!(settings.linkage.input, 1.5);
        assert_eq!(settings.linkage.coupler, 3.0);
        assert_eq!(settings.oscillator.mass, 1.0);
    }

    #[test]
    fn test_json_roundtrip() {
        let settings = Settings::default();
        let json = settings.to_json().unwrap();
        assert_eq!(Settings::from_json(&json).unwrap(), settings);
    }

    #[test]
    fn test_rejects_bad_settings() {
        assert!(matches!(
            Settings::from_json("{ not json"),
            Err(SimError::Settings(_))
        ));
        assert!(Settings::from_json(r#"{ "tick_rate_hz": 0.0 }"#).is_err());
        assert!(matches!(
            Settings::from_json(r#"{ "underdamped_threshold": -0.5 }"#),
            Err(SimError::InvalidParameter { name: "underdamped threshold", .. })
        ));
        let mut settings = Settings::default();
        settings.underdamped_threshold = f64::NAN;
        assert!(settings.validate().is_err());
        assert!(matches!(
            Settings::from_json(r#"{ "oscillator": { "mass": 1.0, "spring_constant": 0.0, "damping_coefficient": 1.0 } }"#),
            Err(SimError::InvalidOscillatorParameters { .. })
        ));
    }

    #[test]
    fn test_build_linkage_limits() {
        let linkage = Settings::default().build_linkage().unwrap();
        assert_eq!(linkage.min_angle, 0.0);
        assert!((linkage.max_angle - std::f64::consts::PI).abs() < 1e-12);
    }
}
