/*
 *  main.rs
 *
 *  OctoMon - printer status at a glance
 *	(c) 2020-26 Stuart Hunter
 *
 *	This program is free software: you can redistribute it and/or modify
 *	it under the terms of the GNU General Public License as published by
 *	the Free Software Foundation, either version 3 of the License, or
 *	(at your option) any later version.
 *
 *	This program is distributed in the hope that it will be useful,
 *	but WITHOUT ANY WARRANTY; without even the implied warranty of
 *	MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *	GNU General Public License for more details.
 *
 *	See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *	Public License.
 *
 */

use env_logger::Env;
use log::{error, info, warn};
use std::time::Duration;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;

use octomon::{BUILD_DATE, BUILD_PROFILE};
use octomon::commands::{ActionSender, spawn_dispatcher};
use octomon::config::{self, Config};
use octomon::display::drivers::LinuxFbDriver;
use octomon::display::layout::SHOWN_INTERFACES;
use octomon::display::{
    Calibration, DisplayDriver, DisplayManager, DrawableDisplay, EvdevTouch, NoTouch, TouchInput,
};
use octomon::octoclient::OctoClient;
use octomon::octoinfo::{StatusFeed, StatusPoller};
use octomon::system::{Backlight, PowerControl};

/// Asynchronously waits for a SIGINT, SIGTERM, or SIGHUP signal.
async fn signal_handler() -> std::io::Result<()> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sighup = signal(SignalKind::hangup())?;

    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT received. Initiating graceful shutdown.");
        }
        _ = sigterm.recv() => {
            info!("SIGTERM received. Initiating graceful shutdown.");
        }
        _ = sighup.recv() => {
            info!("SIGHUP received. Initiating graceful shutdown.");
        }
    }
    Ok(())
}

/// Runs the frame loop until a signal or quit, then blanks the panel.
async fn drive<D: DrawableDisplay>(mut manager: DisplayManager<D>) {
    tokio::select! {
        r = signal_handler() => {
            if let Err(e) = r {
                error!("Signal handlers unavailable: {}", e);
            }
        }
        _ = manager.run() => {}
    }
    if let Err(e) = manager.blank() {
        warn!("Failed to clear display on exit: {}", e);
    }
}

fn open_touch(config: &Config, width: u32, height: u32) -> Box<dyn TouchInput> {
    let calib = Calibration::new(&config.touch, width, height);
    match EvdevTouch::open(&config.touch.device, calib) {
        Ok(touch) => Box::new(touch),
        Err(e) => {
            warn!("No touch input on {}: {}, display only", config.touch.device.display(), e);
            Box::new(NoTouch)
        }
    }
}

async fn run_framebuffer(config: &Config, feed: StatusFeed, actions: ActionSender) -> Result<(), Box<dyn std::error::Error>> {
    let driver = LinuxFbDriver::new(&config.display)?;
    let (width, height) = driver.dimensions();
    let touch = open_touch(config, width, height);
    let manager = DisplayManager::new(driver, touch, feed, actions, config)?;
    drive(manager).await;
    Ok(())
}

#[cfg(feature = "emulator")]
fn run_emulated(config: &Config, feed: StatusFeed, actions: ActionSender) -> Result<(), Box<dyn std::error::Error>> {
    use octomon::display::ChannelTouch;
    use octomon::display::drivers::emulator::EmulatorDriver;
    use octomon::display::emulator_window::{EmulatorWindow, EmulatorWindowConfig};

    info!("Emulation mode enabled - mouse clicks stand in for touches");
    let driver = EmulatorDriver::new(&config.display)?;
    let state = driver.state();
    let (touch_tx, touch) = ChannelTouch::new();
    let manager = DisplayManager::new(driver, Box::new(touch), feed, actions, config)?;
    tokio::spawn(drive(manager));

    // the window owns the main thread from here on
    let window_config = EmulatorWindowConfig { scale: config.display.scale.max(1), ..Default::default() };
    EmulatorWindow::new(state, window_config, touch_tx).run()
}

#[cfg(not(feature = "emulator"))]
fn run_emulated(_config: &Config, _feed: StatusFeed, _actions: ActionSender) -> Result<(), Box<dyn std::error::Error>> {
    Err("emulation requested but octomon was built without the 'emulator' feature".into())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (config, cli) = config::load()?;

    // Initialize the logger with the appropriate level based on debug flag
    let level = config
        .log_level
        .clone()
        .unwrap_or_else(|| if cli.debug { "debug" } else { "info" }.to_string());
    env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();

    info!("This is {}, printer status at a glance", env!("CARGO_PKG_NAME"));
    info!("v.{} built {} ({})", env!("CARGO_PKG_VERSION"), BUILD_DATE, BUILD_PROFILE);
    info!("OctoPrint at {}", config.octoprint.base_url);
    if config.network.interfaces.len() > SHOWN_INTERFACES {
        warn!(
            "{} interfaces configured, the dashboard shows the first {}",
            config.network.interfaces.len(),
            SHOWN_INTERFACES
        );
    }

    let client = OctoClient::new(&config.octoprint)?;
    let poller = StatusPoller::start(
        client.clone(),
        config.network.interfaces.clone(),
        Duration::from_millis(config.octoprint.poll_interval_ms),
    );

    let (action_tx, action_rx) = mpsc::unbounded_channel();
    let backlight = config.display.backlight.clone().map(Backlight::new);
    let power = PowerControl::new(backlight, config.display.brightness);
    let dispatcher = spawn_dispatcher(client, power, action_rx);

    let result = if config.display.emulated {
        run_emulated(&config, poller.feed(), action_tx)
    } else {
        run_framebuffer(&config, poller.feed(), action_tx).await
    };

    dispatcher.abort();
    poller.shutdown().await;

    if let Err(e) = &result {
        error!("{}", e);
    }
    info!("Exiting.");
    result
}
