// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

//! Sensor samples converted to physical units.
//!
//! Raw register values are signed 16-bit counts. Multiplying by the
//! sensitivity of the configured full scale gives g for the accelerometer
//! and deg/s for the gyroscope.

use crate::constants::SHORT_MAX;
use std::fmt;

/// g per LSB for each accelerometer full scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccelerationSensitivity(f64);

impl AccelerationSensitivity {
    pub const G16: Self = Self(16.0 / SHORT_MAX);
    pub const G8: Self = Self(8.0 / SHORT_MAX);
    pub const G4: Self = Self(4.0 / SHORT_MAX);
    pub const G2: Self = Self(2.0 / SHORT_MAX);

    /// g per LSB
    pub fn value(self) -> f64 {
        self.0
    }

    /// Raw count closest to 1 g
    pub fn one_g_counts(self) -> i32 {
        (1.0 / self.0).round() as i32
    }
}

/// deg/s per LSB for each gyroscope full scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GyroScale(f64);

impl GyroScale {
    pub const DPS2000: Self = Self(2000.0 / SHORT_MAX);
    pub const DPS1000: Self = Self(1000.0 / SHORT_MAX);
    pub const DPS500: Self = Self(500.0 / SHORT_MAX);
    pub const DPS250: Self = Self(250.0 / SHORT_MAX);
    pub const DPS125: Self = Self(125.0 / SHORT_MAX);
    pub const DPS62_5: Self = Self(62.5 / SHORT_MAX);
    pub const DPS31_25: Self = Self(31.25 / SHORT_MAX);
    pub const DPS15_625: Self = Self(15.625 / SHORT_MAX);

    /// deg/s per LSB
    pub fn value(self) -> f64 {
        self.0
    }
}

/// Physical sensor axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub(crate) fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// Euclidean norm of a three axis reading
#[inline]
fn magnitude(x: f64, y: f64, z: f64) -> f64 {
    (x * x + y * y + z * z).sqrt()
}

/// One accelerometer reading, in sensor axes. Immutable once read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Acceleration {
    raw: [i16; 3],
    /// g
    g: [f64; 3],
    total_magnitude: f64,
}

impl Acceleration {
    pub fn new(x: i16, y: i16, z: i16, sensitivity: AccelerationSensitivity) -> Self {
        let s = sensitivity.value();
        let g = [x as f64 * s, y as f64 * s, z as f64 * s];
        Self {
            raw: [x, y, z],
            g,
            total_magnitude: magnitude(g[0], g[1], g[2]),
        }
    }

    /// Raw counts as read from the data registers
    pub fn raw(&self) -> [i16; 3] {
        self.raw
    }

    pub fn x(&self) -> f64 {
        self.g[0]
    }

    pub fn y(&self) -> f64 {
        self.g[1]
    }

    pub fn z(&self) -> f64 {
        self.g[2]
    }

    pub fn total_magnitude(&self) -> f64 {
        self.total_magnitude
    }

    /// Value on one physical axis, in g
    pub fn axis(&self, axis: Axis) -> f64 {
        self.g[axis.index()]
    }

    /// Raw count on one physical axis
    pub fn raw_axis(&self, axis: Axis) -> i16 {
        self.raw[axis.index()]
    }
}

impl fmt::Display for Acceleration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Acceleration{{x:{:.5}, y:{:.5}, z:{:.5}, totalMagn:{:.5}}}",
            self.g[0], self.g[1], self.g[2], self.total_magnitude
        )
    }
}

/// One gyroscope reading, in sensor axes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngularRate {
    raw: [i16; 3],
    /// deg/s
    dps: [f64; 3],
    total_magnitude: f64,
}

impl AngularRate {
    pub fn new(x: i16, y: i16, z: i16, scale: GyroScale) -> Self {
        let s = scale.value();
        let dps = [x as f64 * s, y as f64 * s, z as f64 * s];
        Self {
            raw: [x, y, z],
            dps,
            total_magnitude: magnitude(dps[0], dps[1], dps[2]),
        }
    }

    /// Raw counts as read from the data registers
    pub fn raw(&self) -> [i16; 3] {
        self.raw
    }

    pub fn x(&self) -> f64 {
        self.dps[0]
    }

    pub fn y(&self) -> f64 {
        self.dps[1]
    }

    pub fn z(&self) -> f64 {
        self.dps[2]
    }

    /// deg/s
    pub fn total_magnitude(&self) -> f64 {
        self.total_magnitude
    }
}

impl fmt::Display for AngularRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AngularRate{{x:{:.5}, y:{:.5}, z:{:.5}, totalMagn:{:.5}}}",
            self.dps[0], self.dps[1], self.dps[2], self.total_magnitude
        )
    }
}

/// Magnitude in the ground plane, used by the turn trackers
#[inline]
pub fn ground_magnitude(x: f64, y: f64) -> f64 {
    (x * x + y * y).sqrt()
}

/// TEMP_DATA counts to degrees Celsius
#[inline]
pub fn temperature_celsius(raw: i16) -> f64 {
    raw as f64 / 132.48 + 25.0
}
