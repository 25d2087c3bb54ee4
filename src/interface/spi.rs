// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

use super::RegisterInterface;
use crate::constants::{Bank, Register, BANK_SWITCH_SETTLE_MS, READ_MASK, REG_BANK_SEL};
use crate::interface::delay::DelayMs;
use crate::interface::spidev::{Transfer, Write};

use log::trace;

/// Register access over SPI.
///
/// Every frame starts with the register address, with [`READ_MASK`] set for
/// reads. The first byte clocked back is an echo and is discarded.
///
/// The interface remembers which bank is active and only issues a
/// `BANK_SEL` write when a register in another bank is addressed. The
/// cache starts empty, so the first transaction always selects its bank.
pub struct SpiInterface<SPI, D> {
    spi: SPI,
    delay: D,
    current_bank: Option<Bank>,
}

impl<SPI, D, CommE> SpiInterface<SPI, D>
where
    SPI: Write<Error = CommE> + Transfer<Error = CommE>,
    D: DelayMs,
{
    pub fn new(spi: SPI, delay: D) -> Self {
        Self {
            spi,
            delay,
            current_bank: None,
        }
    }

    /// Bank the interface believes is active
    pub fn current_bank(&self) -> Option<Bank> {
        self.current_bank
    }

    /// Returns the consumed SPI device
    pub fn free(self) -> SPI {
        self.spi
    }

    fn select_bank(&mut self, bank: Bank) -> Result<(), CommE> {
        if self.current_bank == Some(bank) {
            return Ok(());
        }

        trace!("bank select {}", bank);
        self.spi.write(&[REG_BANK_SEL.address, bank.value()])?;
        self.current_bank = Some(bank);
        self.delay.delay_ms(BANK_SWITCH_SETTLE_MS);
        Ok(())
    }
}

impl<SPI, D, CommE> RegisterInterface for SpiInterface<SPI, D>
where
    SPI: Write<Error = CommE> + Transfer<Error = CommE>,
    D: DelayMs,
{
    type SensorError = CommE;

    fn read_register(&mut self, reg: Register) -> Result<u8, Self::SensorError> {
        self.select_bank(reg.bank)?;

        let mut frame = [READ_MASK | reg.address, 0];
        let rx = self.spi.transfer(&mut frame)?;
        Ok(rx[1])
    }

    fn write_register(&mut self, reg: Register, value: u8) -> Result<(), Self::SensorError> {
        self.select_bank(reg.bank)?;

        trace!("write {} = {:02x}", reg, value);
        self.spi.write(&[reg.address, value])
    }

    fn read_burst(&mut self, reg: Register, buf: &mut [u8]) -> Result<(), Self::SensorError> {
        self.select_bank(reg.bank)?;

        let mut frame = vec![0u8; buf.len() + 1];
        frame[0] = READ_MASK | reg.address;
        let rx = self.spi.transfer(&mut frame)?;
        buf.copy_from_slice(&rx[1..]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{
        REG_ACCEL_CONFIG0, REG_ACCEL_DATA_X1, REG_OFFSET_USER0, REG_PWR_MGMT0,
    };
    use crate::interface::delay::NoDelay;
    use crate::interface::mock::MockSpi;

    fn interface() -> (SpiInterface<MockSpi, NoDelay>, MockSpi) {
        let mock = MockSpi::new();
        (SpiInterface::new(mock.clone(), NoDelay), mock)
    }

    #[test]
    fn test_same_bank_selects_once() {
        let (mut si, mock) = interface();

        si.write_register(REG_PWR_MGMT0, 0x0F).unwrap();
        si.read_register(REG_ACCEL_CONFIG0).unwrap();

        assert_eq!(1, mock.bank_selects());
        assert_eq!(Some(Bank::Bank0), si.current_bank());
    }

    #[test]
    fn test_bank_change_selects_again() {
        let (mut si, mock) = interface();

        si.read_register(REG_PWR_MGMT0).unwrap();
        si.read_register(REG_OFFSET_USER0).unwrap();
        si.read_register(REG_OFFSET_USER0.offset(1)).unwrap();
        si.read_register(REG_PWR_MGMT0).unwrap();

        assert_eq!(3, mock.bank_selects());
        assert_eq!(Some(Bank::Bank0), si.current_bank());
    }

    #[test]
    fn test_read_frame_sets_read_bit() {
        let (mut si, mock) = interface();
        mock.set_register(REG_PWR_MGMT0, 0x0F);

        assert_eq!(0x0F, si.read_register(REG_PWR_MGMT0).unwrap());

        let frames = mock.frames();
        assert_eq!(vec![REG_BANK_SEL.address, 0x00], frames[0]);
        assert_eq!(vec![READ_MASK | REG_PWR_MGMT0.address, 0x00], frames[1]);
    }

    #[test]
    fn test_write_frame() {
        let (mut si, mock) = interface();

        si.write_register(REG_OFFSET_USER0, 0xAB).unwrap();

        let frames = mock.frames();
        assert_eq!(vec![REG_BANK_SEL.address, 0x04], frames[0]);
        assert_eq!(vec![REG_OFFSET_USER0.address, 0xAB], frames[1]);
        assert_eq!(0xAB, mock.register(REG_OFFSET_USER0));
    }

    #[test]
    fn test_update_register() {
        let (mut si, mock) = interface();
        mock.set_register(REG_PWR_MGMT0, 0x20);

        let value = si.update_register(REG_PWR_MGMT0, |v| v | 0x0F).unwrap();

        assert_eq!(0x2F, value);
        assert_eq!(0x2F, mock.register(REG_PWR_MGMT0));
    }

    #[test]
    fn test_read_int16_and_burst() {
        let (mut si, mock) = interface();
        mock.set_accel(-2, 2048, i16::MIN);

        let x = si
            .read_int16(REG_ACCEL_DATA_X1, REG_ACCEL_DATA_X1.offset(1))
            .unwrap();
        assert_eq!(-2, x);

        let mut buf = [0u8; 6];
        si.read_burst(REG_ACCEL_DATA_X1, &mut buf).unwrap();
        assert_eq!([0xFF, 0xFE, 0x08, 0x00, 0x80, 0x00], buf);
    }

    #[test]
    fn test_bus_error_propagates() {
        let (mut si, mock) = interface();
        mock.fail_next();

        assert!(si.read_register(REG_PWR_MGMT0).is_err());
        // the bank select failed, so nothing is cached
        assert_eq!(None, si.current_bank());
    }
}
