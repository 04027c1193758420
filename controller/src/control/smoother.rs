//! Moving-average smoothing of motor channels.

use std::collections::VecDeque;

use super::mapper::MotorPair;

/// Default number of samples averaged per channel.
pub const DEFAULT_WINDOW: usize = 3;

/// Bounded FIFO of recent raw values with a mean output.
#[derive(Debug, Clone)]
pub struct ChannelSmoother {
    /// Most recent samples, oldest first.
    pub history: VecDeque<i32>,
    window: usize,
}

impl ChannelSmoother {
    /// `window` is clamped to at least one sample.
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            history: VecDeque::with_capacity(window),
            window,
        }
    }

    /// Start from a known history (oldest first).  Only the last
    /// `window` values are kept.
    pub fn with_history(window: usize, values: &[i32]) -> Self {
        let mut s = Self::new(window);
        for &v in values {
            s.push(v);
        }
        s
    }

    pub fn window(&self) -> usize {
        self.window
    }

    fn push(&mut self, value: i32) {
        if self.history.len() == self.window {
            self.history.pop_front();
        }
        self.history.push_back(value);
    }

    /// Record `raw` and return the mean of the buffered samples.
    pub fn smooth(&mut self, raw: i32) -> f64 {
        self.push(raw);
        let sum: i64 = self.history.iter().map(|&v| v as i64).sum();
        sum as f64 / self.history.len() as f64
    }
}

/// Smoothing for both motors of a differential command.
#[derive(Debug, Clone)]
pub struct MotorSmoother {
    pub a: ChannelSmoother,
    pub b: ChannelSmoother,
}

impl MotorSmoother {
    pub fn new(window: usize) -> Self {
        Self {
            a: ChannelSmoother::new(window),
            b: ChannelSmoother::new(window),
        }
    }

    /// Smooth both channels; means are truncated toward zero.
    pub fn smooth(&mut self, raw: MotorPair) -> MotorPair {
        MotorPair {
            a: self.a.smooth(raw.a) as i32,
            b: self.b.smooth(raw.b) as i32,
        }
    }
}

impl Default for MotorSmoother {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}
