//! Browser bindings
//!
//! Thin wasm-bindgen wrapper: JavaScript owns the timer and the canvas,
//! this side owns the model.

use glam::DVec2;
use wasm_bindgen::prelude::*;

use crate::render::{LinkageStyle, frame_vertices};
use crate::settings::Settings;
use crate::sim::{LinkName, SimEvent, Simulation};

fn js_err(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn link_name(name: &str) -> Result<LinkName, JsValue> {
    LinkName::from_str(name).ok_or_else(|| js_err(format!("Unknown link: {name}")))
}

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    // A second init (hot reload) is harmless
    let _ = console_log::init_with_level(log::Level::Info);
    log::info!("Four-bar simulator loaded");
}

/// Simulation handle exposed to JavaScript
#[wasm_bindgen]
pub struct WebSimulation {
    sim: Simulation,
    style: LinkageStyle,
}

#[wasm_bindgen]
impl WebSimulation {
    /// Build from a settings JSON string; empty means defaults
    #[wasm_bindgen(constructor)]
    pub fn new(settings_json: &str) -> Result<WebSimulation, JsValue> {
        let settings = if settings_json.trim().is_empty() {
            Settings::default()
        } else {
            Settings::from_json(settings_json).map_err(js_err)?
        };
        Ok(Self {
            sim: Simulation::new(&settings).map_err(js_err)?,
            style: LinkageStyle::default(),
        })
    }

    /// Feed elapsed wall-clock seconds; returns the number of fixed steps
    /// committed. A failure rejects with its message; the steps committed
    /// before it are already visible in the next snapshot.
    pub fn advance(&mut self, frame_dt: f64) -> Result<u32, JsValue> {
        let reports = self.sim.advance(frame_dt).into_result().map_err(js_err)?;
        Ok(reports.len() as u32)
    }

    /// Angles in degrees, as the control panel shows them
    pub fn start(&mut self, initial_deg: f64, mass: f64, spring: f64, damping: f64) -> Result<(), JsValue> {
        self.sim
            .start(initial_deg.to_radians(), mass, spring, damping)
            .map_err(js_err)
    }

    #[wasm_bindgen(js_name = togglePause)]
    pub fn toggle_pause(&mut self) -> bool {
        self.sim.toggle_pause()
    }

    pub fn stop(&mut self) {
        self.sim.stop();
    }

    #[wasm_bindgen(js_name = resetTracers)]
    pub fn reset_tracers(&mut self) {
        self.sim.reset_tracers();
    }

    #[wasm_bindgen(js_name = setLinkLength)]
    pub fn set_link_length(&mut self, name: &str, length: f64) -> Result<(), JsValue> {
        self.sim
            .set_link_length(link_name(name)?, length)
            .map_err(js_err)
    }

    #[wasm_bindgen(js_name = setAngleLimits)]
    pub fn set_angle_limits(&mut self, min_deg: f64, max_deg: f64) -> Result<(), JsValue> {
        self.sim
            .set_angle_limits(min_deg.to_radians(), max_deg.to_radians())
            .map_err(js_err)
    }

    #[wasm_bindgen(js_name = setOscillatorParams)]
    pub fn set_oscillator_params(&mut self, mass: f64, spring: f64, damping: f64) -> Result<(), JsValue> {
        self.sim
            .set_oscillator_params(mass, spring, damping)
            .map_err(js_err)
    }

    #[wasm_bindgen(js_name = dragTo)]
    pub fn drag_to(&mut self, x: f64, y: f64) -> Result<(), JsValue> {
        self.sim.drag_to(DVec2::new(x, y)).map_err(js_err)
    }

    #[wasm_bindgen(js_name = endDrag)]
    pub fn end_drag(&mut self) {
        self.sim.end_drag();
    }

    #[wasm_bindgen(js_name = outputAngleDeg)]
    pub fn output_angle_deg(&self) -> f64 {
        self.sim.link_state(LinkName::Output).angle.to_degrees()
    }

    /// Frame snapshot as JSON
    pub fn snapshot(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.sim.snapshot()).map_err(js_err)
    }

    /// Interleaved `[x, y, r, g, b, a]` triangle list for the current frame
    pub fn vertices(&self) -> js_sys::Float32Array {
        let verts = frame_vertices(&self.sim.snapshot(), &self.style);
        let floats: &[f32] = bytemuck::cast_slice(&verts);
        js_sys::Float32Array::from(floats)
    }

    /// Pending warnings and failures, one message each
    #[wasm_bindgen(js_name = drainMessages)]
    pub fn drain_messages(&mut self) -> Vec<String> {
        self.sim
            .drain_events()
            .into_iter()
            .filter_map(|event| match event {
                SimEvent::UnderdampedWarning { zeta } => Some(format!(
                    "The system may oscillate excessively (damping ratio = {zeta:.2}). \
                     Try increasing damping or decreasing spring constant."
                )),
                SimEvent::SolverFailure { error }
                | SimEvent::ParameterRejected { error }
                | SimEvent::DragRejected { error } => Some(error.to_string()),
                _ => None,
            })
            .collect()
    }
}
