// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

//! Bus access for the IIM-42652.
//!
//! [`RegisterInterface`] is the seam between the driver and the wire. The
//! only production implementation is [`SpiInterface`] over a Linux
//! [`spidev::SpiDevice`].

use crate::constants::Register;

pub mod delay;
#[cfg(test)]
pub(crate) mod mock;
pub mod spi;
pub mod spidev;

pub use spi::SpiInterface;

/// Single-register and burst access to a bank-segmented register space.
///
/// Implementations are responsible for selecting the register's bank
/// before addressing it.
pub trait RegisterInterface {
    type SensorError;

    /// Read one register
    fn read_register(&mut self, reg: Register) -> Result<u8, Self::SensorError>;

    /// Write one register
    fn write_register(&mut self, reg: Register, value: u8) -> Result<(), Self::SensorError>;

    /// Read `buf.len()` consecutive registers starting at `reg`
    fn read_burst(&mut self, reg: Register, buf: &mut [u8]) -> Result<(), Self::SensorError>;

    /// Read-modify-write of one register
    fn update_register<F>(&mut self, reg: Register, update: F) -> Result<u8, Self::SensorError>
    where
        F: FnOnce(u8) -> u8,
    {
        let current = self.read_register(reg)?;
        let value = update(current);
        self.write_register(reg, value)?;
        Ok(value)
    }

    /// Read a signed 16-bit value split over two registers
    fn read_int16(&mut self, high: Register, low: Register) -> Result<i16, Self::SensorError> {
        let h = self.read_register(high)?;
        let l = self.read_register(low)?;
        Ok(crate::constants::be_i16(h, l))
    }
}
