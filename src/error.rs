//! Error types for the linkage simulation.

use thiserror::Error;

/// Errors reported by the solver, integrator and simulation loop.
///
/// None of these are fatal: every operation that returns one leaves the
/// model in its last valid state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// Rejected user input (setter boundary).
    #[error("Invalid {name}: {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Offending value.
        value: f64,
        /// What the value must satisfy.
        reason: &'static str,
    },

    /// The linkage cannot assemble for the requested configuration.
    #[error("Linkage cannot assemble at input angle {input_angle:.4} rad: {reason}")]
    LinkageUnreachable {
        /// Input angle that was requested (radians).
        input_angle: f64,
        /// Geometric reason.
        reason: &'static str,
    },

    /// Newton iteration did not reach the tolerance.
    #[error("Loop-closure solve did not converge after {iterations} iterations (residual {residual:e})")]
    SolverDidNotConverge {
        /// Iterations spent.
        iterations: usize,
        /// Residual norm at the last iterate.
        residual: f64,
    },

    /// Damping ratio is undefined because `k·m = 0`.
    #[error("Oscillator parameters give an undefined damping ratio (mass {mass}, spring {spring})")]
    InvalidOscillatorParameters {
        /// Mass.
        mass: f64,
        /// Spring constant.
        spring: f64,
    },

    /// Malformed settings document.
    #[error("Invalid settings: {0}")]
    Settings(String),
}

impl SimError {
    /// True for errors raised by the kinematic solver.
    pub fn is_kinematic(&self) -> bool {
        matches!(
            self,
            SimError::LinkageUnreachable { .. } | SimError::SolverDidNotConverge { .. }
        )
    }
}

impl From<serde_json::Error> for SimError {
    fn from(err: serde_json::Error) -> Self {
        SimError::Settings(err.to_string())
    }
}

/// Result type for simulation operations.
pub type Result<T> = std::result::Result<T, SimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SimError::InvalidParameter {
            name: "mass",
            value: -1.0,
            reason: "must be > 0",
        };
        assert_eq!(format!("{err}"), "Invalid mass: -1 (must be > 0)");

        let err = SimError::SolverDidNotConverge {
            iterations: 50,
            residual: 0.5,
        };
        assert!(format!("{err}").contains("50 iterations"));
    }

    #[test]
    fn test_is_kinematic() {
        let err = SimError::LinkageUnreachable {
            input_angle: 0.0,
            reason: "too long",
        };
        assert!(err.is_kinematic());
        assert!(!SimError::InvalidOscillatorParameters { mass: 1.0, spring: 0.0 }.is_kinematic());
    }
}
