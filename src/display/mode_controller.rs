/*
 *  display/mode_controller.rs
 *
 *  OctoMon - printer status at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Idle timer driving the dashboard / screensaver switch
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use super::ScreenMode;

/// What a touch release meant to the idle controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchOutcome {
    /// Dashboard was showing, the touch goes on to the buttons
    Forward,
    /// The touch woke the display and is used up
    Woke,
}

/// Tick counter deciding which screen is showing
pub struct IdleController {
    timeout_ticks: u32,
    idle_ticks: u32,
    current_mode: ScreenMode,
}

impl IdleController {
    pub fn new(timeout_ticks: u32) -> Self {
        Self {
            timeout_ticks: timeout_ticks.max(1),
            idle_ticks: 0,
            current_mode: ScreenMode::Dashboard,
        }
    }

    pub fn current_mode(&self) -> ScreenMode {
        self.current_mode
    }

    pub fn idle_ticks(&self) -> u32 {
        self.idle_ticks
    }

    pub fn timeout_ticks(&self) -> u32 {
        self.timeout_ticks
    }

    /// One dashboard frame went by without input.
    /// Returns true if mode changed
    pub fn tick(&mut self) -> bool {
        if self.current_mode != ScreenMode::Dashboard {
            return false;
        }
        self.idle_ticks = self.idle_ticks.saturating_add(1);
        if self.idle_ticks >= self.timeout_ticks {
            self.idle_ticks = 0;
            self.set_mode(ScreenMode::Screensaver);
            true
        } else {
            false
        }
    }

    /// A touch release arrived, in either mode the idle count restarts
    pub fn touch(&mut self) -> TouchOutcome {
        self.idle_ticks = 0;
        match self.current_mode {
            ScreenMode::Dashboard => TouchOutcome::Forward,
            ScreenMode::Screensaver => {
                self.set_mode(ScreenMode::Dashboard);
                TouchOutcome::Woke
            }
        }
    }

    fn set_mode(&mut self, new_mode: ScreenMode) {
        log::info!("Display mode changed: {:?} -> {:?}", self.current_mode, new_mode);
        self.current_mode = new_mode;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_times_out_after_n_ticks() {
        let mut idle = IdleController::new(5);
        for _ in 0..4 {
            assert!(!idle.tick());
            assert_eq!(idle.current_mode(), ScreenMode::Dashboard);
        }
        assert!(idle.tick());
        assert_eq!(idle.current_mode(), ScreenMode::Screensaver);
        assert_eq!(idle.idle_ticks(), 0);
    }

    #[test]
    fn test_touch_mid_count_delays_timeout() {
        let mut idle = IdleController::new(5);
        for _ in 0..4 {
            idle.tick();
        }
        assert_eq!(idle.touch(), TouchOutcome::Forward);
        assert_eq!(idle.idle_ticks(), 0);
        for _ in 0..4 {
            assert!(!idle.tick());
        }
        assert_eq!(idle.current_mode(), ScreenMode::Dashboard);
        assert!(idle.tick());
    }

    #[test]
    fn test_waking_touch_is_consumed() {
        let mut idle = IdleController::new(1);
        assert!(idle.tick());
        // ticks do not count while the screensaver runs
        assert!(!idle.tick());
        assert_eq!(idle.idle_ticks(), 0);
        assert_eq!(idle.touch(), TouchOutcome::Woke);
        assert_eq!(idle.current_mode(), ScreenMode::Dashboard);
        assert_eq!(idle.touch(), TouchOutcome::Forward);
    }

    #[test]
    fn test_zero_timeout_clamped() {
        let idle = IdleController::new(0);
        assert_eq!(idle.timeout_ticks(), 1);
    }
}
