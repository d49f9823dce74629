/*
 *  system.rs
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
use log::{info, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// sysfs backlight control, e.g. /sys/class/backlight/soc:backlight/brightness
#[derive(Debug, Clone)]
pub struct Backlight {
    path: PathBuf,
}

impl Backlight {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn set(&self, level: u8) -> io::Result<()> {
        fs::write(&self.path, level.to_string())
    }

    /// Failure is logged and otherwise ignored, the display keeps running.
    pub fn set_or_warn(&self, level: u8) {
        if let Err(e) = self.set(level) {
            warn!("backlight {} not written: {}", self.path.display(), e);
        }
    }
}

/// OS-level power actions behind the Reboot and Power Off buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerAction {
    Reboot,
    PowerOff,
}

impl PowerAction {
    pub fn program(&self) -> &'static str {
        match self {
            PowerAction::Reboot => "/sbin/reboot",
            PowerAction::PowerOff => "/sbin/poweroff",
        }
    }
}

/// Runs power actions with the panel dark, lights it again if the action fails.
#[derive(Debug, Clone)]
pub struct PowerControl {
    backlight: Option<Backlight>,
    restore_level: u8,
    reboot: PathBuf,
    poweroff: PathBuf,
}

impl PowerControl {
    pub fn new(backlight: Option<Backlight>, restore_level: u8) -> Self {
        Self {
            backlight,
            restore_level,
            reboot: PathBuf::from(PowerAction::Reboot.program()),
            poweroff: PathBuf::from(PowerAction::PowerOff.program()),
        }
    }

    pub fn with_programs(mut self, reboot: impl Into<PathBuf>, poweroff: impl Into<PathBuf>) -> Self {
        self.reboot = reboot.into();
        self.poweroff = poweroff.into();
        self
    }

    pub fn program(&self, action: PowerAction) -> &Path {
        match action {
            PowerAction::Reboot => &self.reboot,
            PowerAction::PowerOff => &self.poweroff,
        }
    }

    /// Backlight off, then the command. A command that can't start or exits
    /// non-zero restores the backlight and is returned as an error.
    pub async fn execute(&self, action: PowerAction) -> io::Result<()> {
        let program = self.program(action);
        if let Some(bl) = &self.backlight {
            bl.set_or_warn(0);
        }
        info!("executing {}", program.display());
        let result = match tokio::process::Command::new(program).status().await {
            Ok(status) if status.success() => Ok(()),
            Ok(status) => Err(io::Error::other(format!("{} exited with {}", program.display(), status))),
            Err(e) => Err(e),
        };
        if result.is_err() {
            if let Some(bl) = &self.backlight {
                warn!("{:?} failed, backlight back to {}", action, self.restore_level);
                bl.set_or_warn(self.restore_level);
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backlight_writes_level() {
        let path = std::env::temp_dir().join(format!("octomon-bl-{}", std::process::id()));
        let bl = Backlight::new(&path);
        bl.set(0).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "0");
        bl.set(1).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "1");
        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_backlight_failure_is_not_fatal() {
        let bl = Backlight::new("/nonexistent/dir/brightness");
        assert!(bl.set(1).is_err());
        bl.set_or_warn(1);
    }

    #[test]
    fn test_power_programs() {
        let power = PowerControl::new(None, 1);
        assert_eq!(power.program(PowerAction::Reboot), Path::new("/sbin/reboot"));
        assert_eq!(power.program(PowerAction::PowerOff), Path::new("/sbin/poweroff"));
    }

    #[tokio::test]
    async fn test_failed_power_action_restores_backlight() {
        let path = std::env::temp_dir().join(format!("octomon-bl-power-{}", std::process::id()));
        fs::write(&path, "1").unwrap();
        let power = PowerControl::new(Some(Backlight::new(&path)), 1)
            .with_programs("/nonexistent/sbin/reboot", "false");

        // missing binary
        assert!(power.execute(PowerAction::Reboot).await.is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "1");

        // runs but exits non-zero
        assert!(power.execute(PowerAction::PowerOff).await.is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "1");
        fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn test_successful_power_action_leaves_panel_dark() {
        let path = std::env::temp_dir().join(format!("octomon-bl-power-ok-{}", std::process::id()));
        fs::write(&path, "1").unwrap();
        let power = PowerControl::new(Some(Backlight::new(&path)), 1).with_programs("true", "true");
        power.execute(PowerAction::Reboot).await.unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "0");
        fs::remove_file(&path).ok();
    }
}
