// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

//! imutester: prints acceleration, angular rate and temperature every 10 ms.

use clap::Parser;
use env_logger::Env;
use iim42652::{AccelerationSensitivity, GyroScale, Iim42652};
use log::info;
use std::{error::Error, path::PathBuf, thread, time::Duration};

const PRINT_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Parser)]
#[command(name = "imutester", about = "Print raw IIM-42652 readings")]
struct Args {
    #[arg(default_value = "/dev/spidev0.0", help = "SPI device")]
    dev_path: PathBuf,
    #[arg(long, help = "Leave PWR_MGMT0 as it is")]
    skip_power_management: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    let env = Env::default().filter_or("LOG_LEVEL", "info");
    env_logger::init_from_env(env);

    let args = Args::parse();
    let mut imu = Iim42652::new_spi(
        &args.dev_path,
        AccelerationSensitivity::G16,
        GyroScale::DPS2000,
    )?
    .skip_power_management(args.skip_power_management);
    imu.init()?;
    info!("{} ready", args.dev_path.display());

    loop {
        let acceleration = imu.acceleration()?;
        let rate = imu.angular_rate()?;
        let temperature = imu.temperature()?;
        println!("{} {} temp:{:.2}C", acceleration, rate, temperature);
        thread::sleep(PRINT_INTERVAL);
    }
}
