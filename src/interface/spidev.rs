// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

//! Linux `spidev` backed SPI device.

use log::trace;
use spidev::{SpiModeFlags, Spidev, SpidevOptions, SpidevTransfer};
use std::io;
use std::path::Path;

/// IIM-42652 supports up to 24 MHz SPI clock
const SPI_MAX_SPEED_HZ: u32 = 24_000_000;

/// Blocking full-duplex transfer
pub trait Transfer {
    /// Error type
    type Error;

    /// Sends `words` to the slave. Returns the `words` received from the slave
    fn transfer<'a>(&'a mut self, words: &'a mut [u8]) -> Result<&'a [u8], Self::Error>;
}

/// Blocking write
pub trait Write {
    /// Error type
    type Error;

    /// Sends `words` to the slave, ignoring all the incoming words
    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error>;
}

pub struct SpiDevice {
    spi: Spidev,
}

impl SpiDevice {
    /// Open and configure the device: mode 0, 8 bit words, MSB first.
    pub fn new<P: AsRef<Path>>(path: P) -> io::Result<SpiDevice> {
        let mut spi = Spidev::open(path.as_ref())?;
        let options = SpidevOptions::new()
            .bits_per_word(8)
            .max_speed_hz(SPI_MAX_SPEED_HZ)
            .mode(SpiModeFlags::SPI_MODE_0)
            .lsb_first(false)
            .build();
        spi.configure(&options)?;
        trace!("spidev {} configured", path.as_ref().display());

        Ok(SpiDevice { spi })
    }
}

impl Transfer for SpiDevice {
    type Error = io::Error;

    fn transfer<'a>(&'a mut self, words: &'a mut [u8]) -> Result<&'a [u8], Self::Error> {
        let mut rx_buf = vec![0_u8; words.len()];
        {
            let mut transfer = SpidevTransfer::read_write(words, &mut rx_buf);
            self.spi.transfer(&mut transfer)?;
        }
        words.copy_from_slice(&rx_buf);
        Ok(words)
    }
}

impl Write for SpiDevice {
    type Error = io::Error;

    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        let mut rx_buf = vec![0_u8; words.len()];
        let mut transfer = SpidevTransfer::read_write(words, &mut rx_buf);
        self.spi.transfer(&mut transfer)?;
        Ok(())
    }
}
