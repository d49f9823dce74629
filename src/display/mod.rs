/*
 *  display/mod.rs
 *
 *  OctoMon - printer status at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Display subsystem - drivers, touch input, layout and the frame loop
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

// Core trait definitions
pub mod traits;
pub mod error;
pub mod color;

// Display drivers
pub mod drivers;

// Touch input
pub mod input;

// Layout for portrait and landscape panels
pub mod layout;

// Display manager
pub mod manager;

// UI components
pub mod components;

// Idle timer
pub mod mode_controller;

// Emulator window (only with emulator feature)
#[cfg(feature = "emulator")]
pub mod emulator_window;

// Re-exports for convenience
pub use traits::{DisplayDriver, DrawableDisplay, DisplayCapabilities, ColorDepth};
pub use error::DisplayError;
pub use layout::{DashboardLayout, LayoutCategory, DashButton, HitTarget};
pub use manager::DisplayManager;
pub use input::{TouchEvent, TouchInput, ChannelTouch, EvdevTouch, NoTouch, Calibration};
pub use mode_controller::{IdleController, TouchOutcome};

/// What the panel is showing
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ScreenMode {
    Dashboard,   // live printer status and buttons
    Screensaver, // falling glyph streams
}
