/*
 *  display/drivers/emulator.rs
 *
 *  OctoMon - printer status at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Display emulator driver for desktop testing
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

use embedded_graphics::geometry::Size;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use crate::config::DisplayConfig;
use crate::display::color::BACKGROUND;
use crate::display::error::DisplayError;
use crate::display::traits::{ColorDepth, DisplayCapabilities, DisplayDriver};
use crate::vframebuf::VarFrameBuf;

use std::sync::{Arc, Mutex, MutexGuard};

/// Shared emulator state (for window access)
#[derive(Debug)]
pub struct EmulatorState {
    /// Pixels as last flushed
    pub buffer: Vec<Rgb565>,
    pub width: u32,
    pub height: u32,
    /// Backlight level, 0 is dark
    pub brightness: u8,
    pub frame_count: u64,
    pub title: String,
}

/// Renders into a desktop window instead of a framebuffer device
pub struct EmulatorDriver {
    framebuffer: VarFrameBuf<Rgb565>,
    capabilities: DisplayCapabilities,
    state: Arc<Mutex<EmulatorState>>,
}

impl EmulatorDriver {
    pub fn new(config: &DisplayConfig) -> Result<Self, DisplayError> {
        let (width, height) = (config.width, config.height);
        if width == 0 || height == 0 {
            return Err(DisplayError::InvalidConfiguration(format!("{}x{} display", width, height)));
        }
        let capabilities = DisplayCapabilities {
            width,
            height,
            color_depth: ColorDepth::Rgb565,
            max_fps: 60,
            supports_brightness: true,
        };

        let state = Arc::new(Mutex::new(EmulatorState {
            buffer: vec![BACKGROUND; (width * height) as usize],
            width,
            height,
            brightness: config.brightness,
            frame_count: 0,
            title: format!("OctoMon Emulator ({}x{})", width, height),
        }));

        Ok(Self {
            framebuffer: VarFrameBuf::new(width, height, BACKGROUND),
            capabilities,
            state,
        })
    }

    /// Get shared state for window rendering
    pub fn state(&self) -> Arc<Mutex<EmulatorState>> {
        Arc::clone(&self.state)
    }

    fn lock(&self) -> MutexGuard<'_, EmulatorState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Copy `area` of the framebuffer into the shared state
    fn sync_area(&self, area: &Rectangle) {
        let mut state = self.lock();
        let w = state.width as usize;
        for (y, x0, row) in self.framebuffer.rows(area) {
            let start = y * w + x0;
            state.buffer[start..start + row.len()].copy_from_slice(row);
        }
        state.frame_count += 1;
    }
}

impl DisplayDriver for EmulatorDriver {
    fn capabilities(&self) -> &DisplayCapabilities {
        &self.capabilities
    }

    fn init(&mut self) -> Result<(), DisplayError> {
        Ok(())
    }

    fn set_brightness(&mut self, value: u8) -> Result<(), DisplayError> {
        self.lock().brightness = value;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), DisplayError> {
        let full = Rectangle::new(Point::zero(), self.size());
        self.sync_area(&full);
        Ok(())
    }

    fn flush_area(&mut self, area: &Rectangle) -> Result<(), DisplayError> {
        self.sync_area(area);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        self.framebuffer.clear_color(BACKGROUND);
        self.flush()
    }
}

impl DrawTarget for EmulatorDriver {
    type Color = Rgb565;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        self.framebuffer.draw_iter(pixels)
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.framebuffer.clear(color)
    }

    fn fill_contiguous<I>(&mut self, area: &Rectangle, colors: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Self::Color>,
    {
        self.framebuffer.fill_contiguous(area, colors)
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        self.framebuffer.fill_solid(area, color)
    }
}

impl OriginDimensions for EmulatorDriver {
    fn size(&self) -> Size {
        Size::new(self.capabilities.width, self.capabilities.height)
    }
}
