/*
 *  display/drivers/mod.rs
 *
 *  OctoMon - printer status at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Display driver implementations
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

// Linux framebuffer, the real panel
pub mod linuxfb;

// Mock driver for testing, integration tests drive the manager with it
pub mod mock;

// Emulator driver for desktop testing
#[cfg(feature = "emulator")]
pub mod emulator;

pub use linuxfb::LinuxFbDriver;
pub use mock::MockDriver;
