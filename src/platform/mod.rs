//! Platform abstraction layer
//!
//! Hosts that drive the simulation from a browser. Native hosts use the
//! `Simulation` API directly (see `main.rs`).

#[cfg(target_arch = "wasm32")]
pub mod web;

#[cfg(target_arch = "wasm32")]
pub use web::WebSimulation;
