//! Motes Runtime
//!
//! Headless driver: loads a preset (or the built-in default), runs it for the
//! configured number of ticks and logs statistics along the way.
//!
//! Usage: `motes [preset.json]`. Log verbosity follows `RUST_LOG`.

use anyhow::{Context, Result};
use motes_core::Simulation;
use motes_metrics::{Counter, TickTimer};
use motes_services::preset::{self, Preset};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;

/// Ticks between progress reports.
const REPORT_INTERVAL: u64 = 120;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!("Motes v{}", motes_core::VERSION);

    let preset = match std::env::args().nth(1) {
        Some(path) => preset::load_preset(&path)
            .with_context(|| format!("failed to load preset from {path}"))?,
        None => {
            tracing::info!("No preset given, using the built-in default");
            Preset::default()
        }
    };
    preset
        .validate()
        .with_context(|| format!("preset '{}' is invalid", preset.name))?;

    let mut rng = StdRng::seed_from_u64(preset.seed);
    let mut sim = Simulation::new(preset.config.clone(), &mut rng)
        .with_context(|| format!("preset '{}' has an invalid configuration", preset.name))?;

    tracing::info!(
        preset = %preset.name,
        particles = sim.particles().len(),
        ticks = preset.ticks,
        timestep = preset.timestep,
        "Starting run"
    );

    let mut timer = TickTimer::new(REPORT_INTERVAL as usize);
    let mut counters = Counter::new();

    for _ in 0..preset.ticks {
        timer.begin();
        sim.advance(preset.timestep);
        timer.end();

        let stats = sim.stats();
        counters.increment("contacts", stats.contacts);
        counters.increment("residual_contacts", stats.residual_contacts);
        counters.increment("dropped_from_grid", stats.dropped_from_grid);

        if stats.tick % REPORT_INTERVAL == 0 {
            report(&sim, &timer);
        }
    }

    let stats = sim.stats();
    tracing::info!(
        ticks = sim.tick_count(),
        simulated_seconds = sim.elapsed(),
        kinetic_energy = stats.kinetic_energy,
        total_contacts = counters.get("contacts"),
        total_residual = counters.get("residual_contacts"),
        total_dropped = counters.get("dropped_from_grid"),
        "Run finished"
    );

    Ok(())
}

fn report(sim: &Simulation, timer: &TickTimer) {
    let stats = sim.stats();
    let (min_ms, max_ms) = timer.tick_time_range_ms();
    tracing::info!(
        tick = stats.tick,
        contacts = stats.contacts,
        residual = stats.residual_contacts,
        kinetic_energy = stats.kinetic_energy,
        max_speed = stats.max_speed,
        tick_ms = timer.tick_time_ms(),
        min_ms,
        max_ms,
        tps = timer.ticks_per_second(),
        "Progress"
    );

    let profiler = sim.profiler();
    for stage in ["grid", "forces", "integrate", "collide"] {
        tracing::debug!(
            stage,
            last_ms = profiler.last(stage).as_secs_f64() * 1000.0,
            total_ms = profiler.total(stage).as_secs_f64() * 1000.0,
            "Stage timing"
        );
    }
}
