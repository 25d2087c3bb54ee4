// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

//! Mapping from the sensor's physical axes to the camera frame.
//!
//! The camera frame is what the event trackers reason about: X points
//! forward along the vehicle, Y is lateral and Z is up. How the sensor is
//! mounted decides which physical axis feeds each of those, and whether it
//! has to be negated.

use crate::sample::{Acceleration, Axis};
use std::{fmt, str::FromStr};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AxisError {
    /// Axis name other than X, Y or Z
    #[error("invalid axis {0:?}, expected one of X, Y, Z")]
    InvalidAxis(String),
}

impl FromStr for Axis {
    type Err = AxisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "X" | "x" => Ok(Axis::X),
            "Y" | "y" => Ok(Axis::Y),
            "Z" | "z" => Ok(Axis::Z),
            other => Err(AxisError::InvalidAxis(other.to_string())),
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
        };
        f.write_str(name)
    }
}

/// Camera-frame view of one sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraFrame {
    /// g
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Raw counts, widened so that negating -32768 cannot overflow
    pub raw: [i32; 3],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisMap {
    pub cam_x: Axis,
    pub cam_y: Axis,
    pub cam_z: Axis,
    pub inv_x: bool,
    pub inv_y: bool,
    pub inv_z: bool,
}

impl Default for AxisMap {
    /// Sensor mounted with Z pointing forward and X to the left
    fn default() -> Self {
        Self::from_axes(Axis::Z, Axis::X, Axis::Y)
    }
}

impl AxisMap {
    /// Parse the physical axis names for camera X, Y and Z.
    pub fn new(x: &str, y: &str, z: &str) -> Result<Self, AxisError> {
        Ok(Self::from_axes(x.parse()?, y.parse()?, z.parse()?))
    }

    pub fn from_axes(cam_x: Axis, cam_y: Axis, cam_z: Axis) -> Self {
        Self {
            cam_x,
            cam_y,
            cam_z,
            inv_x: false,
            inv_y: false,
            inv_z: false,
        }
    }

    pub fn with_inverted_axes(mut self, inv_x: bool, inv_y: bool, inv_z: bool) -> Self {
        self.inv_x = inv_x;
        self.inv_y = inv_y;
        self.inv_z = inv_z;
        self
    }

    /// Camera X in g
    pub fn x(&self, acceleration: &Acceleration) -> f64 {
        signed(acceleration.axis(self.cam_x), self.inv_x)
    }

    /// Camera Y in g
    pub fn y(&self, acceleration: &Acceleration) -> f64 {
        signed(acceleration.axis(self.cam_y), self.inv_y)
    }

    /// Camera Z in g
    pub fn z(&self, acceleration: &Acceleration) -> f64 {
        signed(acceleration.axis(self.cam_z), self.inv_z)
    }

    /// Camera-frame raw counts
    pub fn raw(&self, acceleration: &Acceleration) -> [i32; 3] {
        let raw = |axis: Axis, inverted: bool| {
            let value = acceleration.raw_axis(axis) as i32;
            if inverted {
                -value
            } else {
                value
            }
        };
        [
            raw(self.cam_x, self.inv_x),
            raw(self.cam_y, self.inv_y),
            raw(self.cam_z, self.inv_z),
        ]
    }

    /// Route one value per camera axis to the physical axis feeding it
    pub fn to_physical(&self, camera: [f64; 3]) -> [f64; 3] {
        let mut physical = [0.0; 3];
        for (axis, value) in [self.cam_x, self.cam_y, self.cam_z].into_iter().zip(camera) {
            physical[axis.index()] = value;
        }
        physical
    }

    pub fn camera(&self, acceleration: &Acceleration) -> CameraFrame {
        CameraFrame {
            x: self.x(acceleration),
            y: self.y(acceleration),
            z: self.z(acceleration),
            raw: self.raw(acceleration),
        }
    }
}

impl fmt::Display for AxisMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = |inverted: bool| if inverted { "-" } else { "" };
        write!(
            f,
            "camX={}{} camY={}{} camZ={}{}",
            sign(self.inv_x),
            self.cam_x,
            sign(self.inv_y),
            self.cam_y,
            sign(self.inv_z),
            self.cam_z
        )
    }
}

#[inline]
fn signed(value: f64, inverted: bool) -> f64 {
    if inverted {
        -value
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::AccelerationSensitivity;

    const AXES: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Sample with distinct values on each physical axis
    fn sample() -> Acceleration {
        Acceleration::new(1000, -2000, 3000, AccelerationSensitivity::G16)
    }

    #[test]
    fn test_parse_axes() {
        let map = AxisMap::new("Z", "x", " Y ").unwrap();
        assert_eq!(Axis::Z, map.cam_x);
        assert_eq!(Axis::X, map.cam_y);
        assert_eq!(Axis::Y, map.cam_z);
        assert!(!map.inv_x && !map.inv_y && !map.inv_z);
    }

    #[test]
    fn test_invalid_axis_fails_at_construction() {
        assert_eq!(
            Err(AxisError::InvalidAxis("W".to_string())),
            AxisMap::new("X", "W", "Z")
        );
        assert!(AxisMap::new("", "Y", "Z").is_err());
        assert!(AxisMap::new("X", "Y", "XY").is_err());
    }

    #[test]
    fn test_fixture_table() {
        struct Case {
            name: &'static str,
            map: AxisMap,
            /// sensor X, Y, Z counts
            accel: [i16; 3],
            /// camera X, Y, Z counts
            expected: [i16; 3],
        }
        let cases = [
            Case {
                name: "not inverted and cam x = x axis mapping",
                map: AxisMap::from_axes(Axis::X, Axis::Y, Axis::Z),
                accel: [205, 0, 0],
                expected: [205, 0, 0],
            },
            Case {
                name: "inverted x and cam x = x axis mapping",
                map: AxisMap::from_axes(Axis::X, Axis::Y, Axis::Z)
                    .with_inverted_axes(true, false, false),
                accel: [205, 0, 0],
                expected: [-205, 0, 0],
            },
            Case {
                name: "inverted x and cam x <> x axis mapping",
                map: AxisMap::from_axes(Axis::Y, Axis::Z, Axis::X)
                    .with_inverted_axes(true, false, false),
                accel: [0, 205, 0],
                expected: [-205, 0, 0],
            },
            Case {
                name: "inverted y and cam y <> y axis mapping",
                map: AxisMap::from_axes(Axis::Y, Axis::Z, Axis::X)
                    .with_inverted_axes(false, true, false),
                accel: [0, 0, 410],
                expected: [0, -410, 0],
            },
            Case {
                name: "inverted z and cam z <> z axis mapping",
                map: AxisMap::from_axes(Axis::Z, Axis::X, Axis::Y)
                    .with_inverted_axes(false, false, true),
                accel: [0, 614, 0],
                expected: [0, 0, -614],
            },
        ];

        let sensitivity = AccelerationSensitivity::G16;
        for case in cases {
            let [x, y, z] = case.accel;
            let accel = Acceleration::new(x, y, z, sensitivity);
            let g = case.expected.map(|v| v as f64 * sensitivity.value());
            assert_eq!(g[0], case.map.x(&accel), "{}", case.name);
            assert_eq!(g[1], case.map.y(&accel), "{}", case.name);
            assert_eq!(g[2], case.map.z(&accel), "{}", case.name);
            assert_eq!(case.expected.map(i32::from), case.map.raw(&accel), "{}", case.name);
        }
    }

    #[test]
    fn test_every_assignment_and_inversion() {
        let accel = sample();
        for &x in &AXES {
            for &y in &AXES {
                for &z in &AXES {
                    for inverted in [false, true] {
                        let map =
                            AxisMap::from_axes(x, y, z).with_inverted_axes(inverted, inverted, inverted);
                        let sign = if inverted { -1.0 } else { 1.0 };
                        assert_eq!(sign * accel.axis(x), map.x(&accel), "{}", map);
                        assert_eq!(sign * accel.axis(y), map.y(&accel), "{}", map);
                        assert_eq!(sign * accel.axis(z), map.z(&accel), "{}", map);

                        let raw = map.raw(&accel);
                        let sign = if inverted { -1 } else { 1 };
                        assert_eq!(sign * accel.raw_axis(x) as i32, raw[0], "{}", map);
                        assert_eq!(sign * accel.raw_axis(y) as i32, raw[1], "{}", map);
                        assert_eq!(sign * accel.raw_axis(z) as i32, raw[2], "{}", map);
                    }
                }
            }
        }
    }

    #[test]
    fn test_default_camera_frame() {
        let accel = sample();
        let frame = AxisMap::default().camera(&accel);
        assert_eq!(accel.z(), frame.x);
        assert_eq!(accel.x(), frame.y);
        assert_eq!(accel.y(), frame.z);
        assert_eq!([3000, 1000, -2000], frame.raw);
    }

    #[test]
    fn test_to_physical() {
        let map = AxisMap::default();
        assert_eq!([0.15, 0.25, 0.15], map.to_physical([0.15, 0.15, 0.25]));

        let map = AxisMap::from_axes(Axis::X, Axis::Y, Axis::Z);
        assert_eq!([1.0, 2.0, 3.0], map.to_physical([1.0, 2.0, 3.0]));
    }

    #[test]
    fn test_raw_inversion_of_min_value() {
        let accel = Acceleration::new(i16::MIN, 0, 0, AccelerationSensitivity::G16);
        let map = AxisMap::from_axes(Axis::X, Axis::Y, Axis::Z).with_inverted_axes(true, false, false);
        assert_eq!(32768, map.raw(&accel)[0]);
    }
}
