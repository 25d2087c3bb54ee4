// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

//! Event tracker tuning, loaded from JSON.
//!
//! ```json
//! {
//!     "continuous_count_window": 10,
//!     "minimum_magnitude_threshold": 0.2,
//!     "left_turn_threshold": 0.15,
//!     "right_turn_threshold": -0.15,
//!     "g_force_accelerator_threshold": 0.25,
//!     "g_force_decelerator_threshold": -0.25
//! }
//! ```
//!
//! Fields left out of the file keep their default.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::{fmt, fs, io, path::Path};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config: {0}")]
    Io(#[from] io::Error),
    #[error("parsing config: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Consecutive samples a condition must hold before its event can fire
    pub continuous_count_window: u32,
    /// Ground plane magnitude, in g, below which no turn is considered
    pub minimum_magnitude_threshold: f64,
    /// Camera Y above which the vehicle is turning left
    pub left_turn_threshold: f64,
    /// Camera Y below which the vehicle is turning right
    pub right_turn_threshold: f64,
    /// Camera X above which the vehicle is accelerating
    pub g_force_accelerator_threshold: f64,
    /// Camera X below which the vehicle is braking
    pub g_force_decelerator_threshold: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            continuous_count_window: 10,
            minimum_magnitude_threshold: 0.2,
            left_turn_threshold: 0.15,
            right_turn_threshold: -0.15,
            g_force_accelerator_threshold: 0.25,
            g_force_decelerator_threshold: -0.25,
        }
    }
}

impl Config {
    /// Parse a config file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Parse a config file, falling back to the defaults if it is missing or
    /// malformed
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::from_file(path) {
            Ok(config) => {
                debug!("loaded {}", path.display());
                config
            }
            Err(e) => {
                warn!("{}: {}, using default config", path.display(), e);
                Self::default()
            }
        }
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "\tContinuousCountWindow: {}", self.continuous_count_window)?;
        writeln!(
            f,
            "\tMinimumMagnitudeThreshold: {:.2}",
            self.minimum_magnitude_threshold
        )?;
        writeln!(f, "\tLeftTurnThreshold: {:.2}", self.left_turn_threshold)?;
        writeln!(f, "\tRightTurnThreshold: {:.2}", self.right_turn_threshold)?;
        writeln!(
            f,
            "\tGForceAcceleratorThreshold: {:.2}",
            self.g_force_accelerator_threshold
        )?;
        writeln!(
            f,
            "\tGForceDeceleratorThreshold: {:.2}",
            self.g_force_decelerator_threshold
        )
    }
}
