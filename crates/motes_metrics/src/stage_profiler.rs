//! Per-stage wall-clock timing for the tick pipeline

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

#[derive(Debug, Default, Clone, Copy)]
struct StageTiming {
    last: Duration,
    total: Duration,
}

/// Records how long each named stage took on the latest tick and in total.
#[derive(Debug, Default, Clone)]
pub struct StageProfiler {
    stages: BTreeMap<&'static str, StageTiming>,
}

impl StageProfiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget last-tick timings; totals are kept.
    pub fn begin_tick(&mut self) {
        for timing in self.stages.values_mut() {
            timing.last = Duration::ZERO;
        }
    }

    pub fn time_stage<F, R>(&mut self, name: &'static str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();

        let timing = self.stages.entry(name).or_default();
        timing.last += elapsed;
        timing.total += elapsed;
        result
    }

    pub fn last(&self, name: &str) -> Duration {
        self.stages.get(name).map(|t| t.last).unwrap_or(Duration::ZERO)
    }

    pub fn total(&self, name: &str) -> Duration {
        self.stages.get(name).map(|t| t.total).unwrap_or(Duration::ZERO)
    }

    pub fn reset(&mut self) {
        self.stages.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, Duration, Duration)> + '_ {
        self.stages
            .iter()
            .map(|(name, timing)| (*name, timing.last, timing.total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_tick_clears_last_but_keeps_total() {
        let mut profiler = StageProfiler::new();
        profiler.time_stage("forces", || std::thread::sleep(Duration::from_millis(2)));
        let first_total = profiler.total("forces");
        assert!(profiler.last("forces") >= Duration::from_millis(2));

        profiler.begin_tick();
        assert_eq!(profiler.last("forces"), Duration::ZERO);
        assert_eq!(profiler.total("forces"), first_total);
        assert_eq!(profiler.last("unknown"), Duration::ZERO);
    }
}
