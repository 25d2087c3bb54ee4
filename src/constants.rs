// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

//! Register map and protocol constants for the IIM-42652.
//!
//! The register space is split into banks. Every [`Register`] carries the
//! bank it lives in, and the transport selects that bank before touching
//! the address (see [`crate::interface::spi::SpiInterface`]).

use std::fmt;

// =============================================================================
// Addressing
// =============================================================================

/// A register bank. The sensor only exposes banks 0 to 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Bank {
    Bank0 = 0x00,
    Bank1 = 0x01,
    Bank2 = 0x02,
    Bank3 = 0x03,
    Bank4 = 0x04,
}

impl Bank {
    /// Value written to `BANK_SEL` to activate this bank
    pub const fn value(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Bank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}", self.value())
    }
}

/// A single byte register: the bank it lives in and its address there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Register {
    pub bank: Bank,
    pub address: u8,
}

impl Register {
    pub const fn new(bank: Bank, address: u8) -> Self {
        Self { bank, address }
    }

    /// The register `n` addresses further in the same bank
    pub const fn offset(self, n: u8) -> Self {
        Self {
            bank: self.bank,
            address: self.address + n,
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bank {} addr:{:02x}", self.bank, self.address)
    }
}

/// High bit of the first SPI byte marks a read
pub const READ_MASK: u8 = 0x80;

/// Full scale of a signed 16-bit sample
pub const SHORT_MAX: f64 = 32767.0;

/// Raw value reported on a corrupted or saturated read
pub const SATURATED_RAW: i16 = i16::MIN;

// =============================================================================
// Bank 0 Registers
// =============================================================================

/// Bank select, reachable from every bank
pub const REG_BANK_SEL: Register = Register::new(Bank::Bank0, 0x76);
/// SPI mode and soft reset
pub const REG_DEVICE_CONFIG: Register = Register::new(Bank::Bank0, 0x11);
/// Interface slew rates
pub const REG_DRIVE_CONFIG: Register = Register::new(Bank::Bank0, 0x13);
/// Temperature, upper byte (lower byte follows)
pub const REG_TEMP_DATA1: Register = Register::new(Bank::Bank0, 0x1D);
/// Accelerometer X upper byte; X0, Y1, Y0, Z1, Z0 follow
pub const REG_ACCEL_DATA_X1: Register = Register::new(Bank::Bank0, 0x1F);
/// Gyroscope X upper byte; X0, Y1, Y0, Z1, Z0 follow
pub const REG_GYRO_DATA_X1: Register = Register::new(Bank::Bank0, 0x25);
/// Wake-on-motion and significant motion status
pub const REG_INT_STATUS2: Register = Register::new(Bank::Bank0, 0x37);
/// Signal path reset
pub const REG_SIGNAL_PATH_RESET: Register = Register::new(Bank::Bank0, 0x4B);
/// Interface config, holds the accel low power clock select
pub const REG_INTF_CONFIG1: Register = Register::new(Bank::Bank0, 0x4D);
/// Power management for gyro, accel and temperature
pub const REG_PWR_MGMT0: Register = Register::new(Bank::Bank0, 0x4E);
/// Gyro full scale and ODR
pub const REG_GYRO_CONFIG0: Register = Register::new(Bank::Bank0, 0x4F);
/// Accel full scale and ODR
pub const REG_ACCEL_CONFIG0: Register = Register::new(Bank::Bank0, 0x50);
/// Gyro UI filter order
pub const REG_GYRO_CONFIG1: Register = Register::new(Bank::Bank0, 0x51);
/// Gyro and accel UI filter bandwidth
pub const REG_GYRO_ACCEL_CONFIG0: Register = Register::new(Bank::Bank0, 0x52);
/// Wake-on-motion and significant motion mode
pub const REG_SMD_CONFIG: Register = Register::new(Bank::Bank0, 0x57);
/// INT1 interrupt sources
pub const REG_INT_SOURCE1: Register = Register::new(Bank::Bank0, 0x66);

// =============================================================================
// Bank 4 Registers
// =============================================================================

/// Wake-on-motion threshold, physical X axis
pub const REG_ACCEL_WOM_X_THR: Register = Register::new(Bank::Bank4, 0x4A);
/// Wake-on-motion threshold, physical Y axis
pub const REG_ACCEL_WOM_Y_THR: Register = Register::new(Bank::Bank4, 0x4B);
/// Wake-on-motion threshold, physical Z axis
pub const REG_ACCEL_WOM_Z_THR: Register = Register::new(Bank::Bank4, 0x4C);
/// First user offset register. OFFSET_USER0..OFFSET_USER8 are contiguous.
pub const REG_OFFSET_USER0: Register = Register::new(Bank::Bank4, 0x77);
/// Offset register shared between gyro Z and accel X
pub const REG_OFFSET_USER4: Register = REG_OFFSET_USER0.offset(4);

// =============================================================================
// Register Values
// =============================================================================

/// Keep the default SPI mode 0/3 setting
pub const SPI_MODE_0: u8 = 0x00;

/// PWR_MGMT0: gyro in low noise mode
pub const GYRO_MODE_LOW_NOISE: u8 = 0x0C;
/// PWR_MGMT0: accel in low power mode
pub const ACCEL_MODE_LOW_POWER: u8 = 0x02;
/// PWR_MGMT0: accel in low noise mode
pub const ACCEL_MODE_LOW_NOISE: u8 = 0x03;

/// SIGNAL_PATH_RESET value written during init
pub const SIGNAL_PATH_RESET_ALL: u8 = 0xFF;

/// GYRO_CONFIG0 target: ±2000 dps (full scale field left at 0), 1 kHz
pub const GYRO_ODR: u8 = 0x06;
/// ACCEL_CONFIG0 target: ±16 g (full scale field left at 0), 1 kHz
pub const ACCEL_ODR: u8 = 0x06;
/// ACCEL_CONFIG0 value for 50 Hz, used by significant motion detection
pub const ACCEL_ODR_50HZ: u8 = 0x09;

/// INTF_CONFIG1: ACCEL_LP_CLK_SEL
pub const ACCEL_LP_CLK_SEL: u8 = 0x04;
/// INT_SOURCE1: route SMD to INT1
pub const SMD_INT1_EN: u8 = 0x08;
/// SMD_CONFIG: WOM_INT_MODE = 0, WOM_MODE = 1, SMD_MODE = 3
pub const SMD_CONFIG_ENABLE: u8 = 0x07;
/// INT_STATUS2: significant motion detected
pub const SMD_INT: u8 = 0x08;
/// Wake-on-motion threshold resolution, g per LSB (1 g / 256)
pub const WOM_G_PER_LSB: f64 = 0.0039;

// =============================================================================
// Gyro Calibration Configuration
// =============================================================================

pub const GYRO_FS_SEL_POS: u8 = 5;
pub const GYRO_CONFIG0_FS_SEL_MASK: u8 = 0x07 << GYRO_FS_SEL_POS;
pub const GYRO_FS_SEL_2000DPS: u8 = 0x00 << GYRO_FS_SEL_POS;

pub const GYRO_CONFIG0_ODR_MASK: u8 = 0x0F;
pub const GYRO_ODR_1KHZ: u8 = 0x06;

pub const GYRO_UI_FILT_ORD_POS: u8 = 2;
pub const GYRO_CONFIG1_UI_FILT_ORD_MASK: u8 = 0x03 << GYRO_UI_FILT_ORD_POS;
/// 3rd order UI filter
pub const GYRO_UI_FILT_3RD_ORDER: u8 = 0x02 << GYRO_UI_FILT_ORD_POS;

pub const GYRO_ACCEL_CONFIG0_GYRO_FILT_MASK: u8 = 0x0F;
/// UI filter bandwidth BW_10
pub const GYRO_UI_FILT_BANDWIDTH: u8 = 0x04;

// =============================================================================
// Bias Conversion
// =============================================================================

/// Range the 12-bit gyro offset field spans, in dps
pub const GYRO_OFFUSER_MAX_DPS: i32 = 64;
/// Full scale the gyro is running at while calibrating, in dps
pub const GYRO_OFFUSER_CONFIGURED_DPS: i32 = 2000;

/// Signed 12-bit range of one OFFSET_USER field
pub const OFFSET_USER_MIN: i32 = -2048;
pub const OFFSET_USER_MAX: i32 = 2047;

/// Found by experimenting, raw counts
pub const ACCEL_VERIFICATION_CUTOFF: i32 = 15;
/// Found by experimenting, raw counts
pub const GYRO_VERIFICATION_CUTOFF: i32 = 7;

/// Samples averaged by the gyro calibration run during init
pub const GYRO_CALIBRATION_MAX_SAMPLES: u32 = 200;

// =============================================================================
// Timing (milliseconds)
// =============================================================================

/// Settle time after a bank switch
pub const BANK_SWITCH_SETTLE_MS: u32 = 1;
/// Settle time after changing PWR_MGMT0
pub const POWER_SETTLE_MS: u32 = 1;
/// Settle time after DEVICE_CONFIG and SIGNAL_PATH_RESET writes
pub const RESET_SETTLE_MS: u32 = 1000;
/// Gyro filter settle time before calibration sampling
pub const GYRO_CALIBRATION_SETTLE_MS: u32 = 60;
/// Pause between calibration samples
pub const CALIBRATION_SAMPLE_INTERVAL_MS: u32 = 1;
/// Pause before enabling SMD after routing its interrupt
pub const SMD_ENABLE_SETTLE_MS: u32 = 50;

// =============================================================================
// Helper Functions
// =============================================================================

/// Combine an upper and a lower register byte into a signed sample
#[inline]
pub fn be_i16(high: u8, low: u8) -> i16 {
    i16::from_be_bytes([high, low])
}

/// Convert a g threshold into the wake-on-motion register value
#[inline]
pub fn wom_threshold(g: f64) -> u8 {
    (g / WOM_G_PER_LSB).clamp(0.0, u8::MAX as f64) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_be_i16() {
        assert_eq!(0x0102, be_i16(0x01, 0x02));
        assert_eq!(-1, be_i16(0xFF, 0xFF));
        assert_eq!(i16::MIN, be_i16(0x80, 0x00));
        assert_eq!(2048, be_i16(0x08, 0x00));
    }

    #[test]
    fn test_register_offset() {
        let reg = REG_OFFSET_USER0.offset(8);
        assert_eq!(Bank::Bank4, reg.bank);
        assert_eq!(0x7F, reg.address);
        assert_eq!(0x7B, REG_OFFSET_USER4.address);
    }

    #[test]
    fn test_register_display() {
        assert_eq!("bank 04 addr:77", REG_OFFSET_USER0.to_string());
        assert_eq!("bank 00 addr:4e", REG_PWR_MGMT0.to_string());
    }

    #[test]
    fn test_wom_threshold() {
        // 0.15 g / 3.9 mg = 38.46
        assert_eq!(38, wom_threshold(0.15));
        assert_eq!(64, wom_threshold(0.25));
        assert_eq!(0, wom_threshold(-1.0));
        assert_eq!(255, wom_threshold(10.0));
    }

    #[test]
    fn test_odr_targets_keep_default_full_scale() {
        // Full scale is never programmed, so the ODR writes must leave the
        // FS field at its power-on value of 0 (±2000 dps / ±16 g).
        assert_eq!(0, GYRO_ODR & GYRO_CONFIG0_FS_SEL_MASK);
        assert_eq!(0, ACCEL_ODR & GYRO_CONFIG0_FS_SEL_MASK);
    }

    #[test]
    fn test_bank4_registers() {
        let regs = [
            REG_ACCEL_WOM_X_THR,
            REG_ACCEL_WOM_Y_THR,
            REG_ACCEL_WOM_Z_THR,
            REG_OFFSET_USER0,
            REG_OFFSET_USER4,
        ];
        for reg in regs {
            assert_eq!(Bank::Bank4, reg.bank, "{} should be in bank 4", reg);
        }
    }
}
