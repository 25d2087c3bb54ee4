// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

//! Driving events and the emitter that produces them.
//!
//! The [`EventEmitter`] consumes acceleration samples, keeps rolling
//! averages of the camera-frame ground components, and runs every tracker
//! on each sample. Every sample is republished as [`Event::ImuReading`],
//! followed by whatever discrete events the trackers report.

use crate::{
    average::RollingAverage,
    axis::AxisMap,
    config::Config,
    sample::{ground_magnitude, Acceleration, AccelerationSensitivity},
    tracker::{Reading, SpeedChange, SpeedTracker, StopTracker, Tracker, TurnTracker},
};
use log::{debug, trace};
use std::{
    fmt,
    time::{Duration, Instant},
};

/// Standard gravity used for speed integration, m/s²
const GRAVITY: f64 = 9.8;
/// m/s to km/h
const MS_TO_KMH: f64 = 3.6;

/// Speed change in km/h from holding `g` for `seconds`
#[inline]
pub fn speed_kmh(seconds: f64, g: f64) -> f64 {
    g * GRAVITY * seconds * MS_TO_KMH
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Left => f.write_str("left"),
            Direction::Right => f.write_str("right"),
        }
    }
}

/// Current values of the emitter's rolling averages
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Averages {
    /// Camera X, g
    pub x: f64,
    /// Camera Y, g
    pub y: f64,
    /// Ground plane magnitude, g
    pub magnitude: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Emitted for every sample
    ImuReading {
        acceleration: Acceleration,
        averages: Averages,
    },
    Turn {
        direction: Direction,
        duration: Duration,
    },
    Acceleration {
        /// km/h gained
        speed: f64,
        duration: Duration,
    },
    Deceleration {
        /// km/h gained, negative
        speed: f64,
        duration: Duration,
    },
    StopDetect,
    StopEnd {
        duration: Duration,
    },
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::ImuReading {
                acceleration,
                averages,
            } => write!(
                f,
                "{} xAvg:{:.5} yAvg:{:.5} magnAvg:{:.5}",
                acceleration, averages.x, averages.y, averages.magnitude
            ),
            Event::Turn {
                direction,
                duration,
            } => write!(f, "{} turn for {:?}", direction, duration),
            Event::Acceleration { speed, duration } => {
                write!(f, "acceleration {:+.2} km/h over {:?}", speed, duration)
            }
            Event::Deceleration { speed, duration } => {
                write!(f, "deceleration {:+.2} km/h over {:?}", speed, duration)
            }
            Event::StopDetect => f.write_str("stop detected"),
            Event::StopEnd { duration } => write!(f, "stop ended after {:?}", duration),
        }
    }
}

/// Turns acceleration samples into [`Event`]s for a handler.
///
/// The trackers run in a fixed order for every sample: left turn, right
/// turn, acceleration, deceleration, stop.
pub struct EventEmitter<H> {
    axis_map: AxisMap,
    x_average: RollingAverage,
    y_average: RollingAverage,
    magnitude_average: RollingAverage,
    trackers: Vec<Box<dyn Tracker + Send>>,
    last_sample: Option<Instant>,
    handler: H,
}

impl<H> EventEmitter<H>
where
    H: FnMut(Event),
{
    pub fn new(
        config: Config,
        axis_map: AxisMap,
        sensitivity: AccelerationSensitivity,
        handler: H,
    ) -> Self {
        debug!("event emitter config: {}", config);
        debug!("event emitter axes: {}", axis_map);
        let trackers: Vec<Box<dyn Tracker + Send>> = vec![
            Box::new(TurnTracker::new(Direction::Left, config)),
            Box::new(TurnTracker::new(Direction::Right, config)),
            Box::new(SpeedTracker::new(SpeedChange::Acceleration, config)),
            Box::new(SpeedTracker::new(SpeedChange::Deceleration, config)),
            Box::new(StopTracker::new(config, sensitivity.one_g_counts())),
        ];

        Self {
            axis_map,
            x_average: RollingAverage::new("X average"),
            y_average: RollingAverage::new("Y average"),
            magnitude_average: RollingAverage::new("Total magnitude average"),
            trackers,
            last_sample: None,
            handler,
        }
    }

    pub fn averages(&self) -> Averages {
        Averages {
            x: self.x_average.average(),
            y: self.y_average.average(),
            magnitude: self.magnitude_average.average(),
        }
    }

    /// Process one sample taken at `at`
    pub fn process(&mut self, at: Instant, acceleration: Acceleration) {
        let since_last = self
            .last_sample
            .map(|last| at.saturating_duration_since(last))
            .unwrap_or_default();
        self.last_sample = Some(at);

        let camera = self.axis_map.camera(&acceleration);
        self.x_average.add(camera.x);
        self.y_average.add(camera.y);
        self.magnitude_average
            .add(ground_magnitude(camera.x, camera.y));

        let averages = self.averages();
        (self.handler)(Event::ImuReading {
            acceleration,
            averages,
        });

        let reading = Reading {
            at,
            since_last,
            camera,
        };
        for tracker in self.trackers.iter_mut() {
            if let Some(event) = tracker.track(&reading, &averages) {
                trace!("{}", event);
                (self.handler)(event);
            }
        }
    }

    /// Process samples as they arrive, timestamping each on receipt.
    /// Returns when the source is exhausted.
    pub fn run<I>(&mut self, samples: I)
    where
        I: IntoIterator<Item = Acceleration>,
    {
        for acceleration in samples {
            self.process(Instant::now(), acceleration);
        }
        debug!("event emitter source closed");
    }
}
