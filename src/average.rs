// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

use std::{collections::VecDeque, fmt};

/// Number of values the average spans
pub const ROLLING_WINDOW: usize = 100;

/// Sliding average over the last [`ROLLING_WINDOW`] values.
///
/// The average stays at 0 until the window has overflowed once, i.e. until
/// the 101st value has been added. From then on every `add` drops the
/// oldest value and recomputes the average over the newest 100.
#[derive(Debug, Clone)]
pub struct RollingAverage {
    name: String,
    entries: VecDeque<f64>,
    sum: f64,
    average: f64,
}

impl RollingAverage {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: VecDeque::with_capacity(ROLLING_WINDOW + 1),
            sum: 0.0,
            average: 0.0,
        }
    }

    pub fn add(&mut self, value: f64) {
        self.entries.push_back(value);
        self.sum += value;

        if self.entries.len() > ROLLING_WINDOW {
            if let Some(first) = self.entries.pop_front() {
                self.sum -= first;
            }
            self.average = self.sum / ROLLING_WINDOW as f64;
        }
    }

    pub fn average(&self) -> f64 {
        self.average
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for RollingAverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:.6}", self.name, self.average)
    }
}
