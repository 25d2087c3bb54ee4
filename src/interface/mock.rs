// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

//! Scripted SPI device for host tests.
//!
//! Models the IIM-42652 register file closely enough to exercise the
//! driver: bank selection, single and burst reads, writes, and queued
//! sensor samples that are latched into the data registers when the host
//! reads them.

use super::spidev::{Transfer, Write};
use crate::constants::{Register, READ_MASK, REG_ACCEL_DATA_X1, REG_BANK_SEL, REG_GYRO_DATA_X1};

use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
struct State {
    bank: u8,
    registers: HashMap<(u8, u8), u8>,
    pinned: HashMap<(u8, u8), u8>,
    frames: Vec<Vec<u8>>,
    bank_selects: usize,
    accel: VecDeque<[i16; 3]>,
    gyro: VecDeque<[i16; 3]>,
    fail_next: bool,
}

impl State {
    fn get(&self, bank: u8, address: u8) -> u8 {
        let key = (bank, address);
        self.pinned
            .get(&key)
            .or_else(|| self.registers.get(&key))
            .copied()
            .unwrap_or(0)
    }

    fn latch(&mut self, reg: Register, sample: [i16; 3]) {
        for (i, value) in sample.iter().enumerate() {
            let [h, l] = value.to_be_bytes();
            let address = reg.address + 2 * i as u8;
            self.registers.insert((reg.bank.value(), address), h);
            self.registers.insert((reg.bank.value(), address + 1), l);
        }
    }

    fn exchange(&mut self, words: &mut [u8]) -> io::Result<()> {
        if std::mem::take(&mut self.fail_next) {
            return Err(io::Error::other("spi transfer failed"));
        }
        self.frames.push(words.to_vec());

        if words[0] & READ_MASK != 0 {
            let address = words[0] & !READ_MASK;
            if self.bank == REG_ACCEL_DATA_X1.bank.value() {
                if address == REG_ACCEL_DATA_X1.address {
                    if let Some(sample) = self.accel.pop_front() {
                        self.latch(REG_ACCEL_DATA_X1, sample);
                    }
                } else if address == REG_GYRO_DATA_X1.address {
                    if let Some(sample) = self.gyro.pop_front() {
                        self.latch(REG_GYRO_DATA_X1, sample);
                    }
                }
            }
            words[0] = 0;
            for i in 1..words.len() {
                words[i] = self.get(self.bank, address + (i as u8 - 1));
            }
        } else if words[0] == REG_BANK_SEL.address {
            self.bank = words[1];
            self.bank_selects += 1;
        } else {
            self.registers.insert((self.bank, words[0]), words[1]);
        }
        Ok(())
    }
}

/// Cloning shares the underlying device, so a test can keep a handle
/// after moving one into the driver.
#[derive(Clone, Default)]
pub struct MockSpi {
    state: Arc<Mutex<State>>,
}

impl MockSpi {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn set_register(&self, reg: Register, value: u8) {
        self.state()
            .registers
            .insert((reg.bank.value(), reg.address), value);
    }

    /// Make reads of `reg` return `value` no matter what is written
    pub fn pin_register(&self, reg: Register, value: u8) {
        self.state()
            .pinned
            .insert((reg.bank.value(), reg.address), value);
    }

    pub fn register(&self, reg: Register) -> u8 {
        self.state().get(reg.bank.value(), reg.address)
    }

    /// Current contents of `len` consecutive registers
    pub fn registers(&self, reg: Register, len: u8) -> Vec<u8> {
        (0..len).map(|i| self.register(reg.offset(i))).collect()
    }

    pub fn set_accel(&self, x: i16, y: i16, z: i16) {
        self.state().latch(REG_ACCEL_DATA_X1, [x, y, z]);
    }

    /// Queue a sample to appear on the next accel data read
    pub fn push_accel(&self, x: i16, y: i16, z: i16) {
        self.state().accel.push_back([x, y, z]);
    }

    pub fn set_gyro(&self, x: i16, y: i16, z: i16) {
        self.state().latch(REG_GYRO_DATA_X1, [x, y, z]);
    }

    /// Queue a sample to appear on the next gyro data read
    pub fn push_gyro(&self, x: i16, y: i16, z: i16) {
        self.state().gyro.push_back([x, y, z]);
    }

    pub fn fail_next(&self) {
        self.state().fail_next = true;
    }

    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.state().frames.clone()
    }

    pub fn bank_selects(&self) -> usize {
        self.state().bank_selects
    }

    /// Addresses written, in order, excluding bank selects
    pub fn writes(&self) -> Vec<(u8, u8)> {
        self.frames()
            .into_iter()
            .filter(|f| f[0] & READ_MASK == 0 && f[0] != REG_BANK_SEL.address)
            .map(|f| (f[0], f[1]))
            .collect()
    }
}

impl Transfer for MockSpi {
    type Error = io::Error;

    fn transfer<'a>(&'a mut self, words: &'a mut [u8]) -> Result<&'a [u8], Self::Error> {
        self.state().exchange(words)?;
        Ok(words)
    }
}

impl Write for MockSpi {
    type Error = io::Error;

    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        let mut frame = words.to_vec();
        self.state().exchange(&mut frame)
    }
}
