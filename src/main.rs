// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

//! imu-logger: samples the IMU and logs driving events.

use clap::Parser;
use env_logger::Env;
use iim42652::{
    AccelerationPipeline, AccelerationSensitivity, Axis, AxisMap, Config, Event, EventEmitter,
    GyroScale, Iim42652,
};
use log::{debug, error, info};
use std::{error::Error, path::PathBuf, sync::mpsc, thread, time::Duration};

/// Wake-on-motion thresholds in g, per camera axis
const SMD_CAMERA_THRESHOLDS: [f64; 3] = [0.15, 0.15, 0.25];

#[derive(Parser)]
#[command(name = "imu-logger", about = "Log driving events from an IIM-42652")]
struct Args {
    #[arg(long, default_value = "/dev/spidev0.0", help = "SPI device")]
    dev_path: PathBuf,
    #[arg(long, default_value = "imu-logger.json", help = "Tracker config file")]
    config: PathBuf,
    #[arg(long, help = "Leave PWR_MGMT0 as it is")]
    skip_power_management: bool,
    #[arg(long, default_value = "Z", help = "Physical axis facing forward (camera X)")]
    axis_x: Axis,
    #[arg(long, default_value = "X", help = "Physical axis facing left (camera Y)")]
    axis_y: Axis,
    #[arg(long, default_value = "Y", help = "Physical axis facing up (camera Z)")]
    axis_z: Axis,
    #[arg(long)]
    invert_x: bool,
    #[arg(long)]
    invert_y: bool,
    #[arg(long)]
    invert_z: bool,
    #[arg(long, default_value_t = 10, help = "Milliseconds between samples")]
    interval_ms: u64,
    #[arg(long, help = "Enable significant motion detection")]
    significant_motion: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    let env = Env::default().filter_or("LOG_LEVEL", "info");
    env_logger::init_from_env(env);

    let args = Args::parse();
    let config = Config::load(&args.config);
    let axis_map = AxisMap::from_axes(args.axis_x, args.axis_y, args.axis_z).with_inverted_axes(
        args.invert_x,
        args.invert_y,
        args.invert_z,
    );
    info!("{}: axes {}", args.dev_path.display(), axis_map);

    let mut imu = Iim42652::new_spi(
        &args.dev_path,
        AccelerationSensitivity::G16,
        GyroScale::DPS2000,
    )?
    .skip_power_management(args.skip_power_management);
    imu.init()?;

    if args.significant_motion {
        imu.setup_significant_motion_detection(axis_map.to_physical(SMD_CAMERA_THRESHOLDS))?;
    }
    let sensitivity = imu.sensitivity();

    let pipeline =
        AccelerationPipeline::new(imu).with_interval(Duration::from_millis(args.interval_ms));
    let subscription = pipeline.subscribe("event-emitter");

    let (events_tx, events_rx) = mpsc::channel();
    let emitter = thread::spawn(move || {
        let mut emitter = EventEmitter::new(config, axis_map, sensitivity, move |event| {
            let _ = events_tx.send(event);
        });
        emitter.run(subscription);
    });

    // Dropping the pipeline when sampling fails closes the subscription,
    // which in turn ends the emitter and the event loop below.
    let sampler = thread::spawn(move || pipeline.run());

    for event in events_rx {
        match event {
            Event::ImuReading { .. } => debug!("{}", event),
            _ => info!("{}", event),
        }
    }

    let result = sampler.join().map_err(|_| "sampler thread panicked")?;
    if emitter.join().is_err() {
        error!("event emitter thread panicked");
    }
    result?;
    Ok(())
}
