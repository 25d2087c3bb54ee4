// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

//! End-to-end pipeline tests with a scripted acceleration source.
//!
//! The sampler and the event emitter run on their own threads the same way
//! imu-logger wires them up, so these tests also cover shutdown: once the
//! source runs dry the pipeline is dropped and the emitter finishes.

use iim42652::{
    AccelerationPipeline, AccelerationSensitivity, AccelerationSource, Acceleration, Axis,
    AxisMap, Config, Direction, Event, EventEmitter,
};
use std::{
    collections::VecDeque,
    sync::{mpsc, Mutex},
    thread,
    time::Duration,
};

#[derive(Debug, PartialEq)]
struct SourceDrained;

struct Scripted(Mutex<VecDeque<[i16; 3]>>);

impl Scripted {
    fn new(samples: impl IntoIterator<Item = [i16; 3]>) -> Self {
        Self(Mutex::new(samples.into_iter().collect()))
    }
}

impl AccelerationSource for Scripted {
    type Error = SourceDrained;

    fn acceleration(&self) -> Result<Acceleration, SourceDrained> {
        let [x, y, z] = self
            .0
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(SourceDrained)?;
        Ok(Acceleration::new(x, y, z, AccelerationSensitivity::G16))
    }
}

/// Run the samples through a pipeline and an emitter, returning every
/// event produced and the sampler's result
fn run_pipeline(
    samples: Vec<[i16; 3]>,
    axis_map: AxisMap,
) -> (Vec<Event>, Result<(), SourceDrained>) {
    let pipeline = AccelerationPipeline::new(Scripted::new(samples)).with_interval(Duration::ZERO);
    let subscription = pipeline.subscribe("event-emitter");

    let (tx, rx) = mpsc::channel();
    let emitter = thread::spawn(move || {
        let mut emitter = EventEmitter::new(
            Config::default(),
            axis_map,
            AccelerationSensitivity::G16,
            move |event| tx.send(event).unwrap(),
        );
        emitter.run(subscription);
    });
    let sampler = thread::spawn(move || pipeline.run());

    let events: Vec<Event> = rx.iter().collect();
    let result = sampler.join().unwrap();
    emitter.join().unwrap();
    (events, result)
}

fn discrete(events: &[Event]) -> Vec<&Event> {
    events
        .iter()
        .filter(|e| !matches!(e, Event::ImuReading { .. }))
        .collect()
}

#[test]
fn test_left_turn_reaches_handler() {
    // 0.3 g towards camera Y for 12 samples, then driving straight
    let mut samples = vec![[0, 615, 2000]; 12];
    samples.push([0, 0, 2000]);

    let (events, result) = run_pipeline(samples, AxisMap::from_axes(Axis::X, Axis::Y, Axis::Z));

    assert_eq!(Err(SourceDrained), result);
    let readings = events
        .iter()
        .filter(|e| matches!(e, Event::ImuReading { .. }))
        .count();
    assert_eq!(13, readings);

    let turns = discrete(&events);
    assert_eq!(1, turns.len(), "{:?}", turns);
    assert!(matches!(
        turns[0],
        Event::Turn {
            direction: Direction::Left,
            ..
        }
    ));
}

#[test]
fn test_axis_map_applies_before_tracking() {
    // The same physical push along sensor Z is a right turn when sensor Z
    // faces camera Y inverted
    let mut samples = vec![[2000, 0, 615]; 12];
    samples.push([2000, 0, 0]);
    let map = AxisMap::from_axes(Axis::Y, Axis::Z, Axis::X).with_inverted_axes(false, true, false);

    let (events, _) = run_pipeline(samples, map);

    let turns = discrete(&events);
    assert_eq!(1, turns.len(), "{:?}", turns);
    assert!(matches!(
        turns[0],
        Event::Turn {
            direction: Direction::Right,
            ..
        }
    ));
}

#[test]
fn test_stop_is_detected_and_ended() {
    let mut samples = vec![[0, 0, 2048]; 15];
    samples.push([0, 0, 2040]);

    let (events, _) = run_pipeline(samples, AxisMap::from_axes(Axis::X, Axis::Y, Axis::Z));

    let stops = discrete(&events);
    assert_eq!(2, stops.len(), "{:?}", stops);
    assert_eq!(&Event::StopDetect, stops[0]);
    assert!(matches!(stops[1], Event::StopEnd { .. }));
}

#[test]
fn test_short_manoeuvre_is_ignored() {
    // Ten samples do not exceed the default window
    let mut samples = vec![[1024, 0, 2000]; 10];
    samples.push([0, 0, 2000]);

    let (events, _) = run_pipeline(samples, AxisMap::from_axes(Axis::X, Axis::Y, Axis::Z));

    assert!(discrete(&events).is_empty());
    assert_eq!(11, events.len());
}
