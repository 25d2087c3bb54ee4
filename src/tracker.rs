// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

//! Stateful driving-event detectors.
//!
//! Each tracker watches one condition on the camera-frame acceleration. A
//! run of consecutive samples meeting the condition is "held"; the event is
//! only reported when the run ends, and only if it lasted longer than the
//! configured window. Stops additionally report the start of a run.

use crate::{
    axis::CameraFrame,
    config::Config,
    events::{speed_kmh, Averages, Direction, Event},
    sample::ground_magnitude,
};
use std::time::{Duration, Instant};

/// One sample as seen by the trackers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub at: Instant,
    /// Time since the previous sample, zero for the first one
    pub since_last: Duration,
    pub camera: CameraFrame,
}

pub trait Tracker {
    /// Feed one sample. Returns the event the sample completes, if any.
    fn track(&mut self, reading: &Reading, averages: &Averages) -> Option<Event>;
}

/// Continuous-count bookkeeping shared by all trackers
#[derive(Debug, Default, Clone, Copy)]
struct Hold {
    count: u32,
    start: Option<Instant>,
}

impl Hold {
    /// Count one more sample meeting the condition. True on the first one.
    fn hold(&mut self, at: Instant) -> bool {
        self.count += 1;
        if self.count == 1 {
            self.start = Some(at);
            return true;
        }
        false
    }

    /// End the run. Returns its length if it exceeded `window` samples.
    fn release(&mut self, at: Instant, window: u32) -> Option<Duration> {
        let elapsed = match self.start {
            Some(start) if self.count > window => Some(at.saturating_duration_since(start)),
            _ => None,
        };
        self.count = 0;
        elapsed
    }
}

#[derive(Debug, Clone)]
pub struct TurnTracker {
    direction: Direction,
    config: Config,
    hold: Hold,
}

impl TurnTracker {
    pub fn new(direction: Direction, config: Config) -> Self {
        Self {
            direction,
            config,
            hold: Hold::default(),
        }
    }

    fn turning(&self, camera: &CameraFrame) -> bool {
        if ground_magnitude(camera.x, camera.y) <= self.config.minimum_magnitude_threshold {
            return false;
        }
        match self.direction {
            Direction::Left => camera.y > self.config.left_turn_threshold,
            Direction::Right => camera.y < self.config.right_turn_threshold,
        }
    }
}

impl Tracker for TurnTracker {
    fn track(&mut self, reading: &Reading, _averages: &Averages) -> Option<Event> {
        if self.turning(&reading.camera) {
            self.hold.hold(reading.at);
            return None;
        }
        self.hold
            .release(reading.at, self.config.continuous_count_window)
            .map(|duration| Event::Turn {
                direction: self.direction,
                duration,
            })
    }
}

/// Whether a [`SpeedTracker`] looks for forward or backward g-force
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedChange {
    Acceleration,
    Deceleration,
}

/// Tracks sustained forward (or backward) acceleration and integrates the
/// speed gained over the run
#[derive(Debug, Clone)]
pub struct SpeedTracker {
    change: SpeedChange,
    config: Config,
    hold: Hold,
    /// km/h
    speed: f64,
}

impl SpeedTracker {
    pub fn new(change: SpeedChange, config: Config) -> Self {
        Self {
            change,
            config,
            hold: Hold::default(),
            speed: 0.0,
        }
    }

    fn active(&self, camera: &CameraFrame) -> bool {
        match self.change {
            SpeedChange::Acceleration => camera.x > self.config.g_force_accelerator_threshold,
            SpeedChange::Deceleration => camera.x < self.config.g_force_decelerator_threshold,
        }
    }
}

impl Tracker for SpeedTracker {
    fn track(&mut self, reading: &Reading, _averages: &Averages) -> Option<Event> {
        let camera = &reading.camera;
        if self.active(camera) {
            self.hold.hold(reading.at);
            self.speed += speed_kmh(reading.since_last.as_secs_f64(), camera.x);
            return None;
        }

        let speed = std::mem::take(&mut self.speed);
        let duration = self
            .hold
            .release(reading.at, self.config.continuous_count_window)?;
        Some(match self.change {
            SpeedChange::Acceleration => Event::Acceleration { speed, duration },
            SpeedChange::Deceleration => Event::Deceleration { speed, duration },
        })
    }
}

/// Detects the vehicle standing still: camera X and Y read exactly zero and
/// camera Z reads exactly 1 g
#[derive(Debug, Clone)]
pub struct StopTracker {
    config: Config,
    /// Raw count for 1 g at the current sensitivity
    one_g: i32,
    hold: Hold,
}

impl StopTracker {
    pub fn new(config: Config, one_g: i32) -> Self {
        Self {
            config,
            one_g,
            hold: Hold::default(),
        }
    }
}

impl Tracker for StopTracker {
    fn track(&mut self, reading: &Reading, _averages: &Averages) -> Option<Event> {
        if reading.camera.raw == [0, 0, self.one_g] {
            return self.hold.hold(reading.at).then_some(Event::StopDetect);
        }
        self.hold
            .release(reading.at, self.config.continuous_count_window)
            .map(|duration| Event::StopEnd { duration })
    }
}
