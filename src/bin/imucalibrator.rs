// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

//! imucalibrator: measures a sensor at rest and programs its bias into the
//! IIM-42652 user offset registers.
//!
//! Exits with status 1 when verification fails or the arguments are
//! invalid.

use clap::Parser;
use env_logger::Env;
use iim42652::{AccelerationSensitivity, GyroScale, Iim42652, SensorKind};
use log::{error, info, warn};
use std::{error::Error, path::PathBuf, process::ExitCode, thread, time::Duration};

/// Pause between programming the bias and measuring it again
const VERIFY_SETTLE: Duration = Duration::from_millis(60);

#[derive(Parser)]
#[command(name = "imucalibrator", about = "Calibrate the IIM-42652 gyro or accelerometer")]
struct Args {
    #[arg(long, help = "Sensor to calibrate or clear: gyro or accelerometer")]
    sensor: SensorKind,
    #[arg(long, default_value = "/dev/spidev0.0", help = "SPI device")]
    dev_path: PathBuf,
    #[arg(
        long,
        default_value_t = 200,
        value_parser = clap::value_parser!(u32).range(1..),
        help = "Number of samples to average"
    )]
    max_samples: u32,
    #[arg(long, conflicts_with = "verify_calibration", help = "Clear the sensor's bias")]
    clear_calibration: bool,
    #[arg(long, help = "Only check that the sensor reads close to zero")]
    verify_calibration: bool,
}

fn run(args: &Args) -> Result<bool, Box<dyn Error>> {
    let mut imu = Iim42652::new_spi(
        &args.dev_path,
        AccelerationSensitivity::G16,
        GyroScale::DPS2000,
    )?;
    imu.init()?;

    let sensor = args.sensor;
    if args.clear_calibration {
        imu.clear_bias(sensor)?;
        info!("{} cleared", sensor);
        return Ok(true);
    }
    if args.verify_calibration {
        return Ok(imu.verify_calibration(sensor, args.max_samples)?);
    }

    let bias = match sensor {
        SensorKind::Gyro => imu.calibrate_gyro(args.max_samples)?,
        SensorKind::Accelerometer => imu.calibrate_accelerometer(args.max_samples)?,
    };
    info!("{} calibration values: {:?}", sensor, bias);

    thread::sleep(VERIFY_SETTLE);
    if !imu.verify_calibration(sensor, args.max_samples)? {
        warn!(
            "{} values were not in expected range, consider clearing and recalibrating",
            sensor
        );
    }
    Ok(true)
}

fn main() -> ExitCode {
    let env = Env::default().filter_or("LOG_LEVEL", "info");
    env_logger::init_from_env(env);

    // clap exits with status 2 on bad arguments
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => {
            error!("{} verification failed", args.sensor);
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
