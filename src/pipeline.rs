// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

//! Acceleration sampling loop with fan-out to named subscribers.
//!
//! Each subscription is a rendezvous channel: delivering a sample blocks
//! until that subscriber takes it, and subscribers are served one after
//! another in name order. A slow subscriber therefore paces the whole
//! loop.

use crate::{
    driver::{DriverError, Iim42652},
    interface::{delay::DelayMs, RegisterInterface},
    sample::Acceleration,
};
use log::{debug, warn};
use std::{
    collections::BTreeMap,
    fmt::Debug,
    sync::{
        mpsc::{self, Receiver, SyncSender},
        Arc, Mutex, PoisonError,
    },
    thread,
    time::Duration,
};

/// Default pause between samples
pub const SAMPLE_INTERVAL: Duration = Duration::from_millis(10);

/// Anything that can be asked for the current acceleration
pub trait AccelerationSource {
    type Error;

    fn acceleration(&self) -> Result<Acceleration, Self::Error>;
}

impl<SI, SE, D> AccelerationSource for Iim42652<SI, D>
where
    SI: RegisterInterface<SensorError = SE>,
    SE: Debug,
    D: DelayMs,
{
    type Error = DriverError<SE>;

    fn acceleration(&self) -> Result<Acceleration, Self::Error> {
        Iim42652::acceleration(self)
    }
}

impl<T: AccelerationSource + ?Sized> AccelerationSource for Arc<T> {
    type Error = T::Error;

    fn acceleration(&self) -> Result<Acceleration, Self::Error> {
        (**self).acceleration()
    }
}

/// Receiving end of one named subscription
pub struct Subscription {
    name: String,
    receiver: Receiver<Acceleration>,
}

impl Subscription {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Block for the next sample. `None` once the pipeline is gone or the
    /// name has been taken over by a newer subscription.
    pub fn recv(&self) -> Option<Acceleration> {
        self.receiver.recv().ok()
    }

    pub fn iter(&self) -> mpsc::Iter<'_, Acceleration> {
        self.receiver.iter()
    }
}

impl IntoIterator for Subscription {
    type Item = Acceleration;
    type IntoIter = mpsc::IntoIter<Acceleration>;

    fn into_iter(self) -> Self::IntoIter {
        self.receiver.into_iter()
    }
}

impl<'a> IntoIterator for &'a Subscription {
    type Item = Acceleration;
    type IntoIter = mpsc::Iter<'a, Acceleration>;

    fn into_iter(self) -> Self::IntoIter {
        self.receiver.iter()
    }
}

pub struct AccelerationPipeline<S> {
    source: S,
    interval: Duration,
    subscriptions: Mutex<BTreeMap<String, SyncSender<Acceleration>>>,
}

impl<S> AccelerationPipeline<S>
where
    S: AccelerationSource,
{
    pub fn new(source: S) -> Self {
        Self {
            source,
            interval: SAMPLE_INTERVAL,
            subscriptions: Mutex::new(BTreeMap::new()),
        }
    }

    /// Pause between samples in [`AccelerationPipeline::run`]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Register a subscriber under `name`. A subscriber already registered
    /// under the same name is replaced and its channel closed.
    pub fn subscribe(&self, name: impl Into<String>) -> Subscription {
        let name = name.into();
        let (sender, receiver) = mpsc::sync_channel(0);
        let replaced = self
            .subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.clone(), sender);
        if replaced.is_some() {
            warn!("subscription {:?} replaced", name);
        } else {
            debug!("subscription {:?} added", name);
        }
        Subscription { name, receiver }
    }

    /// Names currently subscribed, in delivery order
    pub fn subscribers(&self) -> Vec<String> {
        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    /// Take one sample and hand it to every subscriber in turn
    pub fn run_once(&self) -> Result<Acceleration, S::Error> {
        let acceleration = self.source.acceleration()?;

        // Deliver outside the lock so subscribing never waits on a
        // blocked receiver.
        let senders: Vec<(String, SyncSender<Acceleration>)> = self
            .subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(name, sender)| (name.clone(), sender.clone()))
            .collect();

        for (name, sender) in senders {
            if sender.send(acceleration).is_err() {
                warn!("subscriber {:?} is gone, skipping", name);
            }
        }
        Ok(acceleration)
    }

    /// Sample forever. Only returns on a sampling error.
    pub fn run(&self) -> Result<(), S::Error> {
        loop {
            self.run_once()?;
            thread::sleep(self.interval);
        }
    }
}
