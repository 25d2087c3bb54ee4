//! Delays
//!
//! These traits only provide *blocking* functionality. Register settle times
//! and calibration sample pacing go through [`DelayMs`] so that host tests
//! can swap in [`NoDelay`] instead of sleeping.

use std::{thread, time::Duration};

/// Millisecond delay
pub trait DelayMs {
    /// Pauses execution for `ms` milliseconds
    fn delay_ms(&self, ms: u32);
}

/// Sleeps the calling thread
#[derive(Debug, Default, Clone, Copy)]
pub struct TimerMs;

impl DelayMs for TimerMs {
    fn delay_ms(&self, ms: u32) {
        delay_ms(ms);
    }
}

/// Returns immediately
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDelay;

impl DelayMs for NoDelay {
    fn delay_ms(&self, _ms: u32) {}
}

/// Sleep the current thread for `ms` milliseconds
pub fn delay_ms(ms: u32) {
    thread::sleep(Duration::from_millis(ms.into()));
}
