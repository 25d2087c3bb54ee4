// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

//! IIM-42652 IMU driver implementation.
//!
//! This module contains the main driver for the IIM-42652 6-axis IMU. It
//! powers the sensor up, programs the gyro bias during initialization and
//! reads acceleration, angular rate and temperature samples.
//!
//! All register traffic goes through a single mutex, so a driver wrapped in
//! an [`std::sync::Arc`] can be sampled from one thread while another thread
//! reads the temperature or the motion status.

use crate::{
    constants::{
        be_i16, wom_threshold, Register, ACCEL_LP_CLK_SEL, ACCEL_MODE_LOW_NOISE,
        ACCEL_MODE_LOW_POWER, ACCEL_ODR, ACCEL_ODR_50HZ, GYRO_CALIBRATION_MAX_SAMPLES,
        GYRO_MODE_LOW_NOISE, GYRO_ODR, POWER_SETTLE_MS, REG_ACCEL_CONFIG0, REG_ACCEL_DATA_X1,
        REG_ACCEL_WOM_X_THR, REG_ACCEL_WOM_Y_THR, REG_ACCEL_WOM_Z_THR, REG_DEVICE_CONFIG,
        REG_DRIVE_CONFIG, REG_GYRO_CONFIG0, REG_GYRO_DATA_X1, REG_INTF_CONFIG1, REG_INT_SOURCE1,
        REG_INT_STATUS2, REG_PWR_MGMT0, REG_SIGNAL_PATH_RESET, REG_SMD_CONFIG, REG_TEMP_DATA1,
        RESET_SETTLE_MS, SIGNAL_PATH_RESET_ALL, SMD_CONFIG_ENABLE, SMD_ENABLE_SETTLE_MS, SMD_INT,
        SMD_INT1_EN, SPI_MODE_0,
    },
    interface::{
        delay::{DelayMs, TimerMs},
        spidev::SpiDevice,
        RegisterInterface, SpiInterface,
    },
    sample::{temperature_celsius, AccelerationSensitivity, Acceleration, AngularRate, GyroScale},
};
use log::{debug, info, trace};

use std::{
    fmt::Debug,
    io,
    path::Path,
    sync::{Mutex, MutexGuard, PoisonError},
};
use thiserror::Error;

/// Driver-level errors
#[derive(Debug, Error)]
pub enum DriverError<E> {
    /// Communications error
    #[error("communication error: {0:?}")]
    Comm(E),
    /// PWR_MGMT0 did not read back the mode that was written
    #[error("power mode mismatch: wrote {expected:#04x}, read back {actual:#04x}")]
    PowerModeMismatch { expected: u8, actual: u8 },
    /// Every sample of an averaging run was saturated
    #[error("no valid samples out of {0}")]
    NoValidSamples(u32),
    /// Full scale other than ±16 g / ±2000 dps requested
    #[error("unsupported full scale, only ±16 g and ±2000 dps are supported")]
    UnsupportedScale,
}

/// Where the driver is in its bring-up sequence
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DriverState {
    #[default]
    Uninitialized,
    BusOpened,
    PowerConfigured,
    Calibrated,
    Streaming,
}

/// IIM-42652 IMU driver
pub struct Iim42652<SI, D = TimerMs> {
    bus: Mutex<SI>,
    pub(crate) delay: D,
    sensitivity: AccelerationSensitivity,
    gyro_scale: GyroScale,
    skip_power_management: bool,
    state: DriverState,
}

impl<SI, D> Iim42652<SI, D> {
    /// Create a driver on an already opened register interface.
    ///
    /// The sensor is never switched to another full scale, so only
    /// [`AccelerationSensitivity::G16`] and [`GyroScale::DPS2000`] describe
    /// the data it produces.
    pub fn new_with_interface(
        sensor_interface: SI,
        delay: D,
        sensitivity: AccelerationSensitivity,
        gyro_scale: GyroScale,
    ) -> Result<Self, DriverError<SI::SensorError>>
    where
        SI: RegisterInterface,
    {
        if sensitivity != AccelerationSensitivity::G16 || gyro_scale != GyroScale::DPS2000 {
            return Err(DriverError::UnsupportedScale);
        }

        let mut driver = Self {
            bus: Mutex::new(sensor_interface),
            delay,
            sensitivity,
            gyro_scale,
            skip_power_management: false,
            state: DriverState::Uninitialized,
        };
        driver.advance(DriverState::BusOpened);
        Ok(driver)
    }

    /// Leave PWR_MGMT0 untouched during [`Iim42652::init`]
    pub fn skip_power_management(mut self, skip: bool) -> Self {
        self.skip_power_management = skip;
        self
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn sensitivity(&self) -> AccelerationSensitivity {
        self.sensitivity
    }

    pub fn gyro_scale(&self) -> GyroScale {
        self.gyro_scale
    }

    /// Returns previously consumed sensor interface instance.
    pub fn free(self) -> SI {
        self.bus.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn advance(&mut self, next: DriverState) {
        trace!("state {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Exclusive access to the bus. Lock poisoning is ignored.
    pub(crate) fn bus(&self) -> MutexGuard<'_, SI> {
        self.bus.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Iim42652<SpiInterface<SpiDevice, TimerMs>, TimerMs> {
    /// Create a new driver on a Linux spidev device
    ///
    /// # Arguments
    /// * `spidevice` - Path to the SPI device (e.g., "/dev/spidev0.0")
    /// * `sensitivity` - Accelerometer sensitivity, must be ±16 g
    /// * `gyro_scale` - Gyroscope scale, must be ±2000 dps
    pub fn new_spi<P: AsRef<Path>>(
        spidevice: P,
        sensitivity: AccelerationSensitivity,
        gyro_scale: GyroScale,
    ) -> Result<Self, DriverError<io::Error>> {
        let spidev = SpiDevice::new(spidevice).map_err(DriverError::Comm)?;
        let spi_int = SpiInterface::new(spidev, TimerMs);
        Self::new_with_interface(spi_int, TimerMs, sensitivity, gyro_scale)
    }
}

impl<SI, SE, D> Iim42652<SI, D>
where
    SI: RegisterInterface<SensorError = SE>,
    SE: Debug,
    D: DelayMs,
{
    /// Bring the sensor up: power, SPI mode, signal path reset, gyro bias
    /// and output data rates, in that order.
    pub fn init(&mut self) -> Result<(), DriverError<SE>> {
        trace!("driver init");

        if !self.skip_power_management {
            self.setup_power(GYRO_MODE_LOW_NOISE | ACCEL_MODE_LOW_NOISE)?;
        }
        self.advance(DriverState::PowerConfigured);

        self.write_register(REG_DEVICE_CONFIG, SPI_MODE_0)?;
        self.delay.delay_ms(RESET_SETTLE_MS);
        let device_config = self.read_register(REG_DEVICE_CONFIG)?;
        let drive_config = self.read_register(REG_DRIVE_CONFIG)?;
        debug!(
            "device config {:02x}, drive config {:02x}",
            device_config, drive_config
        );

        self.reset_signal_path()?;

        let bias = self.calibrate_gyro(GYRO_CALIBRATION_MAX_SAMPLES)?;
        debug!("gyro bias {:?}", bias);
        self.advance(DriverState::Calibrated);

        self.write_if_differs(REG_GYRO_CONFIG0, GYRO_ODR)?;
        self.write_if_differs(REG_ACCEL_CONFIG0, ACCEL_ODR)?;
        debug!(
            "gyro config0 {:02x}, accel config0 {:02x}",
            self.read_register(REG_GYRO_CONFIG0)?,
            self.read_register(REG_ACCEL_CONFIG0)?
        );
        self.advance(DriverState::Streaming);

        Ok(())
    }

    /// Write PWR_MGMT0 and check that the sensor accepted the mode
    pub fn setup_power(&self, mode: u8) -> Result<(), DriverError<SE>> {
        self.write_register(REG_PWR_MGMT0, mode)?;
        self.delay.delay_ms(POWER_SETTLE_MS);

        let actual = self.read_register(REG_PWR_MGMT0)?;
        if actual != mode {
            return Err(DriverError::PowerModeMismatch {
                expected: mode,
                actual,
            });
        }
        info!("gyro and accelerometer powered on ({:02x})", actual);
        Ok(())
    }

    pub fn reset_signal_path(&self) -> Result<(), DriverError<SE>> {
        self.write_register(REG_SIGNAL_PATH_RESET, SIGNAL_PATH_RESET_ALL)?;
        self.delay.delay_ms(RESET_SETTLE_MS);
        Ok(())
    }

    fn write_if_differs(&self, reg: Register, value: u8) -> Result<(), DriverError<SE>> {
        let current = self.read_register(reg)?;
        if current != value {
            debug!("{} was {:02x}, setting {:02x}", reg, current, value);
            self.write_register(reg, value)?;
        }
        Ok(())
    }

    pub fn read_register(&self, reg: Register) -> Result<u8, DriverError<SE>> {
        self.bus().read_register(reg).map_err(DriverError::Comm)
    }

    pub fn write_register(&self, reg: Register, value: u8) -> Result<(), DriverError<SE>> {
        self.bus()
            .write_register(reg, value)
            .map_err(DriverError::Comm)
    }

    /// Read-modify-write of one register, atomic with respect to other
    /// users of this driver. Returns the value written.
    pub fn update_register<F>(&self, reg: Register, update: F) -> Result<u8, DriverError<SE>>
    where
        F: FnOnce(u8) -> u8,
    {
        self.bus()
            .update_register(reg, update)
            .map_err(DriverError::Comm)
    }

    pub fn read_int16(&self, high: Register, low: Register) -> Result<i16, DriverError<SE>> {
        self.bus().read_int16(high, low).map_err(DriverError::Comm)
    }

    fn read_triplet(&self, reg: Register) -> Result<[i16; 3], DriverError<SE>> {
        let mut buf = [0u8; 6];
        self.bus()
            .read_burst(reg, &mut buf)
            .map_err(DriverError::Comm)?;
        Ok([
            be_i16(buf[0], buf[1]),
            be_i16(buf[2], buf[3]),
            be_i16(buf[4], buf[5]),
        ])
    }

    /// Read the current accelerometer sample
    pub fn acceleration(&self) -> Result<Acceleration, DriverError<SE>> {
        let [x, y, z] = self.read_triplet(REG_ACCEL_DATA_X1)?;
        Ok(Acceleration::new(x, y, z, self.sensitivity))
    }

    /// Read the current gyroscope sample
    pub fn angular_rate(&self) -> Result<AngularRate, DriverError<SE>> {
        let [x, y, z] = self.read_triplet(REG_GYRO_DATA_X1)?;
        Ok(AngularRate::new(x, y, z, self.gyro_scale))
    }

    /// Die temperature in degrees Celsius
    pub fn temperature(&self) -> Result<f64, DriverError<SE>> {
        let mut buf = [0u8; 2];
        self.bus()
            .read_burst(REG_TEMP_DATA1, &mut buf)
            .map_err(DriverError::Comm)?;
        Ok(temperature_celsius(be_i16(buf[0], buf[1])))
    }

    /// Configure wake-on-motion thresholds and turn on significant motion
    /// detection, routed to INT1.
    ///
    /// `thresholds_g` is indexed by physical sensor axis. The accelerometer
    /// is switched to low power at 50 Hz, which is what the APEX motion
    /// features run on.
    pub fn setup_significant_motion_detection(
        &self,
        thresholds_g: [f64; 3],
    ) -> Result<(), DriverError<SE>> {
        self.write_register(REG_ACCEL_CONFIG0, ACCEL_ODR_50HZ)?;
        self.update_register(REG_PWR_MGMT0, |v| v | ACCEL_MODE_LOW_POWER)?;
        self.update_register(REG_INTF_CONFIG1, |v| v & !ACCEL_LP_CLK_SEL)?;
        self.delay.delay_ms(POWER_SETTLE_MS);

        let registers = [REG_ACCEL_WOM_X_THR, REG_ACCEL_WOM_Y_THR, REG_ACCEL_WOM_Z_THR];
        for (reg, g) in registers.into_iter().zip(thresholds_g) {
            self.write_register(reg, wom_threshold(g))?;
        }
        self.delay.delay_ms(POWER_SETTLE_MS);

        self.update_register(REG_INT_SOURCE1, |v| v | SMD_INT1_EN)?;
        self.delay.delay_ms(SMD_ENABLE_SETTLE_MS);
        self.write_register(REG_SMD_CONFIG, SMD_CONFIG_ENABLE)?;
        debug!("significant motion detection enabled, thresholds {:?} g", thresholds_g);
        Ok(())
    }

    /// Whether INT_STATUS2 reports significant motion. Reading clears it.
    pub fn significant_motion_detected(&self) -> Result<bool, DriverError<SE>> {
        Ok(self.read_register(REG_INT_STATUS2)? & SMD_INT != 0)
    }
}
