//! Deterministic simulation module
//!
//! Everything that moves lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - No I/O, no wall-clock reads
//! - All mutation goes through `Simulation`
//! - No rendering or platform dependencies

pub mod link;
pub mod linkage;
pub mod oscillator;
pub mod solver;
pub mod state;
pub mod tick;
pub mod tracer;

pub use crate::error::{Result, SimError};
pub use link::{Link, LinkName, LinkState};
pub use linkage::{Assembly, FourBarLinkage};
pub use oscillator::{DampingRegime, OscillatorParams, OscillatorState, step};
pub use solver::{KinematicSolver, LinkageSolution, circle_intersections};
pub use state::{FrameSnapshot, SimEvent, SimPhase, Simulation, SimulationClock, StopReason};
pub use tick::{FrameAdvance, TickReport};
pub use tracer::{TracerHistory, TracerPoint};
