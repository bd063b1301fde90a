//! Fixed-capacity sample window for rolling statistics

use std::collections::VecDeque;
use std::time::Duration;

/// Keeps the newest `capacity` samples; older ones fall off the front.
pub struct RingBuffer<T> {
    window: VecDeque<T>,
    capacity: usize,
}

impl<T> RingBuffer<T> {
    /// A zero capacity is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, sample: T) {
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(sample);
    }

    pub fn latest(&self) -> Option<&T> {
        self.window.back()
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.window.iter()
    }
}

impl RingBuffer<Duration> {
    pub fn average(&self) -> Duration {
        match self.window.len() {
            0 => Duration::ZERO,
            n => self.window.iter().sum::<Duration>() / n as u32,
        }
    }

    /// `(fastest, slowest)`, or zeros when empty.
    pub fn min_max(&self) -> (Duration, Duration) {
        self.window
            .iter()
            .fold(None, |range: Option<(Duration, Duration)>, &d| match range {
                None => Some((d, d)),
                Some((lo, hi)) => Some((lo.min(d), hi.max(d))),
            })
            .unwrap_or((Duration::ZERO, Duration::ZERO))
    }
}

impl RingBuffer<f64> {
    pub fn average(&self) -> f64 {
        match self.window.len() {
            0 => 0.0,
            n => self.window.iter().sum::<f64>() / n as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_wraps_and_averages() {
        let mut buffer = RingBuffer::new(3);

        buffer.push(Duration::from_millis(10));
        assert_eq!(buffer.average(), Duration::from_millis(10));

        buffer.push(Duration::from_millis(20));
        buffer.push(Duration::from_millis(30));
        assert_eq!(buffer.average(), Duration::from_millis(20));

        buffer.push(Duration::from_millis(40));
        assert_eq!(buffer.average(), Duration::from_millis(30)); // (20 + 30 + 40) / 3
        assert_eq!(buffer.latest(), Some(&Duration::from_millis(40)));
        assert_eq!(
            buffer.min_max(),
            (Duration::from_millis(20), Duration::from_millis(40))
        );
    }

    #[test]
    fn test_zero_capacity_is_usable() {
        let mut buffer = RingBuffer::new(0);
        buffer.push(1.5f64);
        buffer.push(2.5f64);
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.average(), 2.5);
    }
}
