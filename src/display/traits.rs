/*
 *  display/traits.rs
 *
 *  OctoMon - printer status at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Core trait definitions for display driver abstraction
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

use core::convert::Infallible;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use crate::display::error::DisplayError;

/// Native pixel formats of the panels we drive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorDepth {
    /// 16 bpp, PiTFT and most SPI TFT framebuffers
    Rgb565,

    /// 32 bpp XRGB, HDMI framebuffers and the desktop emulator
    Xrgb8888,
}

impl ColorDepth {
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            ColorDepth::Rgb565 => 2,
            ColorDepth::Xrgb8888 => 4,
        }
    }
}

/// Display capabilities and metadata
#[derive(Debug, Clone)]
pub struct DisplayCapabilities {
    /// Display width in pixels
    pub width: u32,

    /// Display height in pixels
    pub height: u32,

    /// Pixel format of the device memory
    pub color_depth: ColorDepth,

    /// Maximum recommended frame rate
    pub max_fps: u32,

    /// Whether the display supports brightness control
    pub supports_brightness: bool,
}

/// Minimal hardware abstraction - all display drivers must implement this trait
///
/// Drawing happens in an RGB565 shadow buffer; `flush` and `flush_area`
/// push that buffer (or a part of it) to the device.
pub trait DisplayDriver: Send {
    /// Returns the capabilities of this display
    fn capabilities(&self) -> &DisplayCapabilities;

    /// Returns the display dimensions as (width, height)
    fn dimensions(&self) -> (u32, u32) {
        let caps = self.capabilities();
        (caps.width, caps.height)
    }

    /// Open and prepare the device
    fn init(&mut self) -> Result<(), DisplayError>;

    /// Set backlight level, meaning of the value is device specific
    ///
    /// Returns an error if the display doesn't support brightness control.
    fn set_brightness(&mut self, value: u8) -> Result<(), DisplayError>;

    /// Flush the whole shadow buffer to the display
    fn flush(&mut self) -> Result<(), DisplayError>;

    /// Flush only `area`. Drivers without partial updates flush everything.
    fn flush_area(&mut self, area: &Rectangle) -> Result<(), DisplayError> {
        let _ = area;
        self.flush()
    }

    /// Clear the display to black
    fn clear(&mut self) -> Result<(), DisplayError>;
}

/// A driver the renderers can draw on directly
pub trait DrawableDisplay:
    DisplayDriver + DrawTarget<Color = Rgb565, Error = Infallible> + OriginDimensions
{
}

impl<T> DrawableDisplay for T where
    T: DisplayDriver + DrawTarget<Color = Rgb565, Error = Infallible> + OriginDimensions
{
}
