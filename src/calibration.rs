// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

//! Bias calibration through the user offset registers.
//!
//! The gyro and the accelerometer each own three 12-bit offsets, packed
//! into five consecutive bank 4 registers:
//!
//! ```text
//!            7      4 3      0
//! USER0      gyro X [7:0]
//! USER1      gyro Y [11:8] | gyro X [11:8]
//! USER2      gyro Y [7:0]
//! USER3      gyro Z [7:0]
//! USER4      accel X [11:8] | gyro Z [11:8]
//! USER5      accel X [7:0]
//! USER6      accel Y [7:0]
//! USER7      accel Z [11:8] | accel Y [11:8]
//! USER8      accel Z [7:0]
//! ```
//!
//! USER4 is shared, so every bias write first reads it back and keeps the
//! nibble that belongs to the other sensor.

use crate::{
    constants::{
        Register, ACCEL_VERIFICATION_CUTOFF, CALIBRATION_SAMPLE_INTERVAL_MS,
        GYRO_ACCEL_CONFIG0_GYRO_FILT_MASK, GYRO_CALIBRATION_SETTLE_MS,
        GYRO_CONFIG0_FS_SEL_MASK, GYRO_CONFIG0_ODR_MASK, GYRO_CONFIG1_UI_FILT_ORD_MASK,
        GYRO_FS_SEL_2000DPS, GYRO_ODR_1KHZ, GYRO_OFFUSER_CONFIGURED_DPS, GYRO_OFFUSER_MAX_DPS,
        GYRO_UI_FILT_3RD_ORDER, GYRO_UI_FILT_BANDWIDTH, GYRO_VERIFICATION_CUTOFF,
        OFFSET_USER_MAX, OFFSET_USER_MIN, REG_GYRO_ACCEL_CONFIG0, REG_GYRO_CONFIG0,
        REG_GYRO_CONFIG1, REG_OFFSET_USER0, REG_OFFSET_USER4, SATURATED_RAW,
    },
    driver::{DriverError, Iim42652},
    interface::{delay::DelayMs, RegisterInterface},
};
use log::{debug, info, warn};
use std::{fmt, fmt::Debug, str::FromStr};
use thiserror::Error;

/// Number of registers in one bias span
pub const BIAS_SPAN_LEN: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    Gyro,
    Accelerometer,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown sensor {0:?}, expected gyro or accelerometer")]
pub struct UnknownSensor(pub String);

impl SensorKind {
    /// Largest absolute average, in raw counts, that still passes
    /// verification
    pub fn verification_cutoff(self) -> i32 {
        match self {
            SensorKind::Gyro => GYRO_VERIFICATION_CUTOFF,
            SensorKind::Accelerometer => ACCEL_VERIFICATION_CUTOFF,
        }
    }

    pub fn layout(self) -> &'static BiasLayout {
        match self {
            SensorKind::Gyro => &GYRO_BIAS_LAYOUT,
            SensorKind::Accelerometer => &ACCEL_BIAS_LAYOUT,
        }
    }

    /// Convert a measured bias into the value the offset register expects
    pub fn to_register(self, bias: i32) -> i16 {
        match self {
            SensorKind::Gyro => gyro_bias_to_register(bias),
            SensorKind::Accelerometer => accel_bias_to_register(bias),
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorKind::Gyro => f.write_str("gyro"),
            SensorKind::Accelerometer => f.write_str("accelerometer"),
        }
    }
}

impl FromStr for SensorKind {
    type Err = UnknownSensor;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gyro" => Ok(SensorKind::Gyro),
            "accelerometer" => Ok(SensorKind::Accelerometer),
            other => Err(UnknownSensor(other.to_string())),
        }
    }
}

/// Where the bits of one axis live within a span
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisSlot {
    /// Byte holding bits [7:0]
    pub low: usize,
    /// Byte holding bits [11:8]
    pub high: usize,
    /// Nibble position of bits [11:8] in `high`
    pub high_shift: u8,
}

/// Packing of three 12-bit offsets into a five register span
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BiasLayout {
    /// First register of the span
    pub start: Register,
    /// X, Y, Z
    pub axes: [AxisSlot; 3],
    /// Index of the register shared with the other sensor
    pub shared: usize,
    /// Bits of the shared register owned by the other sensor
    pub foreign_mask: u8,
}

pub const GYRO_BIAS_LAYOUT: BiasLayout = BiasLayout {
    start: REG_OFFSET_USER0,
    axes: [
        AxisSlot { low: 0, high: 1, high_shift: 0 },
        AxisSlot { low: 2, high: 1, high_shift: 4 },
        AxisSlot { low: 3, high: 4, high_shift: 0 },
    ],
    shared: 4,
    foreign_mask: 0xF0,
};

pub const ACCEL_BIAS_LAYOUT: BiasLayout = BiasLayout {
    start: REG_OFFSET_USER4,
    axes: [
        AxisSlot { low: 1, high: 0, high_shift: 4 },
        AxisSlot { low: 2, high: 3, high_shift: 0 },
        AxisSlot { low: 4, high: 3, high_shift: 4 },
    ],
    shared: 0,
    foreign_mask: 0x0F,
};

impl BiasLayout {
    /// The register shared with the other sensor's span
    pub fn shared_register(&self) -> Register {
        self.start.offset(self.shared as u8)
    }

    /// Pack three offsets. Only the low 12 bits of each are kept. `resident`
    /// is the current content of the shared register, whose foreign bits are
    /// carried over unchanged.
    pub fn encode(&self, offsets: [i16; 3], resident: u8) -> [u8; BIAS_SPAN_LEN] {
        let mut data = [0u8; BIAS_SPAN_LEN];
        data[self.shared] = resident & self.foreign_mask;

        for (slot, value) in self.axes.iter().zip(offsets) {
            data[slot.low] |= (value & 0x00FF) as u8;
            data[slot.high] |= (((value & 0x0F00) >> 8) as u8) << slot.high_shift;
        }
        data
    }

    /// Unpack the three sign-extended 12-bit offsets
    pub fn decode(&self, data: &[u8; BIAS_SPAN_LEN]) -> [i16; 3] {
        self.axes.map(|slot| {
            let high = (data[slot.high] >> slot.high_shift) & 0x0F;
            let raw = ((high as u16) << 8) | data[slot.low] as u16;
            ((raw << 4) as i16) >> 4
        })
    }
}

/// Clamp an offset to the 12-bit register field. Values past either end
/// would otherwise wrap to the opposite sign.
fn saturate_offset(offset: i32) -> i16 {
    let clamped = offset.clamp(OFFSET_USER_MIN, OFFSET_USER_MAX);
    if clamped != offset {
        warn!("offset {} out of register range, clamped to {}", offset, clamped);
    }
    clamped as i16
}

/// Negate the bias and scale it from the 2000 dps reading to the offset
/// register's 1/32 dps resolution, saturating at the register's range
#[inline]
pub fn gyro_bias_to_register(bias: i32) -> i16 {
    saturate_offset((-(bias * GYRO_OFFUSER_CONFIGURED_DPS / GYRO_OFFUSER_MAX_DPS)) >> 4)
}

/// Negate the bias, saturating at the register's range. Raw counts at
/// ±16 g match the 0.5 mg register step.
#[inline]
pub fn accel_bias_to_register(bias: i32) -> i16 {
    saturate_offset(-bias)
}

/// Every axis of `average` is strictly below `cutoff` in magnitude
pub fn verify(average: [i32; 3], cutoff: i32) -> bool {
    average.iter().all(|v| v.abs() < cutoff)
}

impl<SI, SE, D> Iim42652<SI, D>
where
    SI: RegisterInterface<SensorError = SE>,
    SE: Debug,
    D: DelayMs,
{
    fn raw_sample(&self, sensor: SensorKind) -> Result<[i16; 3], DriverError<SE>> {
        Ok(match sensor {
            SensorKind::Gyro => self.angular_rate()?.raw(),
            SensorKind::Accelerometer => self.acceleration()?.raw(),
        })
    }

    /// Average `max_samples` raw readings, about 1 ms apart.
    ///
    /// Readings with any axis at -32768 are discarded: they still count
    /// toward `max_samples` but not toward the divisor.
    pub fn average_raw_output(
        &self,
        sensor: SensorKind,
        max_samples: u32,
    ) -> Result<[i32; 3], DriverError<SE>> {
        let mut sum = [0i64; 3];
        let mut discarded = 0;

        for _ in 0..max_samples {
            let raw = self.raw_sample(sensor)?;
            if raw.contains(&SATURATED_RAW) {
                discarded += 1;
            } else {
                for (acc, value) in sum.iter_mut().zip(raw) {
                    *acc += value as i64;
                }
            }
            self.delay.delay_ms(CALIBRATION_SAMPLE_INTERVAL_MS);
        }

        let valid = max_samples - discarded;
        if valid == 0 {
            return Err(DriverError::NoValidSamples(max_samples));
        }
        if discarded > 0 {
            debug!("{} of {} {} samples discarded", discarded, max_samples, sensor);
        }
        Ok(sum.map(|s| (s / valid as i64) as i32))
    }

    fn prepare_gyro_for_calibration(&self) -> Result<(), DriverError<SE>> {
        self.update_register(REG_GYRO_CONFIG0, |v| {
            (v & !(GYRO_CONFIG0_FS_SEL_MASK | GYRO_CONFIG0_ODR_MASK))
                | GYRO_FS_SEL_2000DPS
                | GYRO_ODR_1KHZ
        })?;
        self.update_register(REG_GYRO_CONFIG1, |v| {
            (v & !GYRO_CONFIG1_UI_FILT_ORD_MASK) | GYRO_UI_FILT_3RD_ORDER
        })?;
        self.update_register(REG_GYRO_ACCEL_CONFIG0, |v| {
            (v & !GYRO_ACCEL_CONFIG0_GYRO_FILT_MASK) | GYRO_UI_FILT_BANDWIDTH
        })?;
        self.delay.delay_ms(GYRO_CALIBRATION_SETTLE_MS);
        Ok(())
    }

    /// Measure the gyro at rest and program the negated bias.
    ///
    /// Returns the measured bias in raw counts.
    pub fn calibrate_gyro(&self, max_samples: u32) -> Result<[i32; 3], DriverError<SE>> {
        self.prepare_gyro_for_calibration()?;
        self.delay.delay_ms(GYRO_CALIBRATION_SETTLE_MS);

        let bias = self.average_raw_output(SensorKind::Gyro, max_samples)?;
        self.write_bias(SensorKind::Gyro, bias)?;
        info!("gyro calibrated, bias {:?}", bias);
        Ok(bias)
    }

    /// Measure the accelerometer at rest and program the negated bias.
    ///
    /// Returns the measured bias in raw counts.
    pub fn calibrate_accelerometer(&self, max_samples: u32) -> Result<[i32; 3], DriverError<SE>> {
        let bias = self.average_raw_output(SensorKind::Accelerometer, max_samples)?;
        self.write_bias(SensorKind::Accelerometer, bias)?;
        info!("accelerometer calibrated, bias {:?}", bias);
        Ok(bias)
    }

    /// Zero the offsets of one sensor, leaving the other untouched
    pub fn clear_bias(&self, sensor: SensorKind) -> Result<(), DriverError<SE>> {
        self.write_bias(sensor, [0; 3])?;
        info!("{} bias cleared", sensor);
        Ok(())
    }

    /// Average and check against the sensor's cutoff
    pub fn verify_calibration(
        &self,
        sensor: SensorKind,
        max_samples: u32,
    ) -> Result<bool, DriverError<SE>> {
        let average = self.average_raw_output(sensor, max_samples)?;
        let ok = verify(average, sensor.verification_cutoff());
        if ok {
            info!("{} calibration verified, average {:?}", sensor, average);
        } else {
            warn!(
                "{} calibration out of range, average {:?} (cutoff {})",
                sensor,
                average,
                sensor.verification_cutoff()
            );
        }
        Ok(ok)
    }

    /// Offsets currently programmed for `sensor`, as the register holds them
    pub fn read_bias(&self, sensor: SensorKind) -> Result<[i16; 3], DriverError<SE>> {
        let layout = sensor.layout();
        let mut data = [0u8; BIAS_SPAN_LEN];
        let mut bus = self.bus();
        for (i, byte) in data.iter_mut().enumerate() {
            *byte = bus
                .read_register(layout.start.offset(i as u8))
                .map_err(DriverError::Comm)?;
        }
        Ok(layout.decode(&data))
    }

    fn write_bias(&self, sensor: SensorKind, bias: [i32; 3]) -> Result<(), DriverError<SE>> {
        let layout = sensor.layout();
        let offsets = bias.map(|b| sensor.to_register(b));

        let mut bus = self.bus();
        let resident = bus
            .read_register(layout.shared_register())
            .map_err(DriverError::Comm)?;
        let data = layout.encode(offsets, resident);
        debug!("{} offsets {:?} -> {:02x?}", sensor, offsets, data);

        for (i, byte) in data.iter().enumerate() {
            bus.write_register(layout.start.offset(i as u8), *byte)
                .map_err(DriverError::Comm)?;
        }
        Ok(())
    }
}
