// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

//! Linux SPI driver for the TDK InvenSense IIM-42652 6-axis IMU, and a
//! streaming classifier that turns its acceleration into driving events.
//!
//! ```no_run
//! use iim42652::{AccelerationSensitivity, GyroScale, Iim42652};
//!
//! let mut imu = Iim42652::new_spi(
//!     "/dev/spidev0.0",
//!     AccelerationSensitivity::G16,
//!     GyroScale::DPS2000,
//! )?;
//! imu.init()?;
//! println!("{}", imu.acceleration()?);
//! # Ok::<(), iim42652::DriverError<std::io::Error>>(())
//! ```

pub mod average;
pub mod axis;
pub mod calibration;
pub mod config;
pub mod constants;
pub mod driver;
pub mod events;
pub mod interface;
pub mod pipeline;
pub mod sample;
pub mod tracker;

pub use axis::{AxisError, AxisMap, CameraFrame};
pub use calibration::{verify, SensorKind};
pub use config::Config;
pub use driver::{DriverError, DriverState, Iim42652};
pub use events::{Direction, Event, EventEmitter};
pub use pipeline::{AccelerationPipeline, AccelerationSource, Subscription};
pub use sample::{AccelerationSensitivity, Acceleration, AngularRate, Axis, GyroScale};
