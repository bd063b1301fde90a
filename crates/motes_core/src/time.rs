//! Simulation clock
//!
//! Ticks are driven by the host with a caller-chosen time step; the clock
//! only counts them.

/// Time step used by the headless runtime when a preset does not set one (60 Hz).
pub const DEFAULT_TIMESTEP: f32 = 1.0 / 60.0;

/// Tick counter and accumulated simulated time.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SimulationTime {
    tick_count: u64,
    elapsed: f64,
}

impl SimulationTime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Simulated seconds, summed in f64 so long runs do not drift.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn advance_tick(&mut self, dt: f32) {
        self.tick_count += 1;
        self.elapsed += f64::from(dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_counts_ticks_and_time() {
        let mut time = SimulationTime::new();
        time.advance_tick(0.5);
        time.advance_tick(0.25);
        assert_eq!(time.tick_count(), 2);
        assert!((time.elapsed() - 0.75).abs() < 1.0e-12);
    }
}
