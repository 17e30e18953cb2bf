//! Four-bar simulator entry point
//!
//! Native builds run headless: load settings, start the oscillator and
//! print one JSON line per tick. The browser build is driven from
//! JavaScript through `platform::web`.

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::process::ExitCode;

    use fourbar_sim::Settings;
    use fourbar_sim::sim::{SimEvent, Simulation};

    const DEFAULT_DURATION_SECS: f64 = 5.0;

    fn load_settings(path: Option<&str>) -> Result<Settings, String> {
        let Some(path) = path else {
            return Ok(Settings::default());
        };
        let json = std::fs::read_to_string(path).map_err(|e| format!("Failed to read {path}: {e}"))?;
        Settings::from_json(&json).map_err(|e| format!("Invalid settings in {path}: {e}"))
    }

    fn log_events(sim: &mut Simulation) {
        for event in sim.drain_events() {
            match event {
                SimEvent::UnderdampedWarning { .. }
                | SimEvent::ParameterRejected { .. }
                | SimEvent::DragRejected { .. } => log::warn!("{event:?}"),
                _ => log::debug!("{event:?}"),
            }
        }
    }

    pub fn run() -> ExitCode {
        env_logger::init();

        let args: Vec<String> = std::env::args().skip(1).collect();
        let settings = match load_settings(args.first().map(String::as_str)) {
            Ok(settings) => settings,
            Err(e) => {
                log::error!("{e}");
                return ExitCode::FAILURE;
            }
        };
        let duration = match args.get(1).map(|s| s.parse::<f64>()) {
            None => DEFAULT_DURATION_SECS,
            Some(Ok(secs)) if secs.is_finite() && secs >= 0.0 => secs,
            Some(_) => {
                log::error!("Duration must be a non-negative number of seconds");
                return ExitCode::FAILURE;
            }
        };

        let mut sim = match Simulation::new(&settings) {
            Ok(sim) => sim,
            Err(e) => {
                log::error!("Failed to build simulation: {e}");
                return ExitCode::FAILURE;
            }
        };
        if let Err(e) = sim.restart() {
            log::error!("Failed to start: {e}");
            return ExitCode::FAILURE;
        }
        log::info!(
            "Running {duration:.2}s at {} Hz ({} ticks)",
            settings.tick_rate_hz,
            (duration * settings.tick_rate_hz).round()
        );

        let ticks = (duration * settings.tick_rate_hz).round() as u64;
        for _ in 0..ticks {
            let result = sim.tick();
            log_events(&mut sim);
            match result {
                Ok(Some(report)) => match serde_json::to_string(&report) {
                    Ok(line) => println!("{line}"),
                    Err(e) => {
                        log::error!("Failed to encode tick: {e}");
                        return ExitCode::FAILURE;
                    }
                },
                Ok(None) => {}
                Err(e) => {
                    log::error!("Simulation stopped: {e}");
                    return ExitCode::FAILURE;
                }
            }
        }

        log::info!(
            "Finished at t={:.3}s, {} tracer samples",
            sim.clock().elapsed,
            sim.tracer().len()
        );
        if let Some(last) = sim.tracer().latest() {
            log::info!("Output joint ends at ({:.4}, {:.4})", last.pos.x, last.pos.y);
        }
        ExitCode::SUCCESS
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    native::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Browser entry is `platform::web::init`
}
