/*
 *  display/drivers/mock.rs
 *
 *  OctoMon - printer status at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Mock display driver for testing without hardware
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

/// Mock display driver for testing
///
/// Records every operation in a shared [`MockDriverState`] and keeps the
/// drawn pixels so tests can look at what a frame produced.
#[derive(Debug, Clone)]
pub struct MockDriver {
    framebuffer: VarFrameBuf<Rgb565>,
    capabilities: DisplayCapabilities,
    state: Arc<Mutex<MockDriverState>>,
}

/// Internal state for the mock driver (shared for inspection in tests)
#[derive(Debug, Default)]
pub struct MockDriverState {
    pub init_count: usize,
    /// full flushes
    pub flush_count: usize,
    /// partial flushes and the areas they covered
    pub flush_area_count: usize,
    pub flushed_areas: Vec<Rectangle>,
    pub clear_count: usize,
    pub last_brightness: Option<u8>,
    pub is_initialized: bool,

    /// Simulate failures (for error testing)
    pub simulate_flush_failure: bool,
    pub simulate_init_failure: bool,
}

impl MockDriver {
    pub fn new(config: &DisplayConfig) -> Result<Self, DisplayError> {
        if config.width == 0 || config.height == 0 {
            return Err(DisplayError::InvalidConfiguration(format!(
                "{}x{} display", config.width, config.height
            )));
        }
        let capabilities = DisplayCapabilities {
            width: config.width,
            height: config.height,
            color_depth: ColorDepth::Rgb565,
            max_fps: 60,
            supports_brightness: true,
        };

        Ok(Self {
            framebuffer: VarFrameBuf::new(config.width, config.height, BACKGROUND),
            capabilities,
            state: Arc::new(Mutex::new(MockDriverState::default())),
        })
    }

    /// Create a mock driver with specific dimensions
    pub fn new_with_size(width: u32, height: u32) -> Result<Self, DisplayError> {
        let config = DisplayConfig {
            width,
            height,
            ..Default::default()
        };
        Self::new(&config)
    }

    fn lock(&self) -> MutexGuard<'_, MockDriverState> {
        // a poisoned mock only happens after a failed test assertion elsewhere
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Get pixel at position for testing
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<Rgb565> {
        self.framebuffer.pixel(x, y)
    }

    /// Get reference to state for inspection in tests
    pub fn state(&self) -> Arc<Mutex<MockDriverState>> {
        Arc::clone(&self.state)
    }

    /// Pixels that are not background
    pub fn count_lit_pixels(&self) -> usize {
        self.framebuffer.as_slice().iter().filter(|&&p| p != BACKGROUND).count()
    }

    /// Lit pixels inside `area`
    pub fn count_lit_in(&self, area: &Rectangle) -> usize {
        self.framebuffer
            .rows(area)
            .map(|(_, _, row)| row.iter().filter(|&&p| p != BACKGROUND).count())
            .sum()
    }

    pub fn count_color(&self, color: Rgb565) -> usize {
        self.framebuffer.as_slice().iter().filter(|&&p| p == color).count()
    }
}

impl DisplayDriver for MockDriver {
    fn capabilities(&self) -> &DisplayCapabilities {
        &self.capabilities
    }

    fn init(&mut self) -> Result<(), DisplayError> {
        let mut state = self.lock();
        if state.simulate_init_failure {
            return Err(DisplayError::Other("Simulated init failure".to_string()));
        }
        state.init_count += 1;
        state.is_initialized = true;
        Ok(())
    }

    fn set_brightness(&mut self, value: u8) -> Result<(), DisplayError> {
        self.lock().last_brightness = Some(value);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), DisplayError> {
        let mut state = self.lock();
        if state.simulate_flush_failure {
            return Err(DisplayError::Other("Simulated flush failure".to_string()));
        }
        state.flush_count += 1;
        Ok(())
    }

    fn flush_area(&mut self, area: &Rectangle) -> Result<(), DisplayError> {
        let mut state = self.lock();
        if state.simulate_flush_failure {
            return Err(DisplayError::Other("Simulated flush failure".to_string()));
        }
        state.flush_area_count += 1;
        state.flushed_areas.push(*area);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        self.lock().clear_count += 1;
        self.framebuffer.clear_color(BACKGROUND);
        self.flush()
    }
}

impl DrawTarget for MockDriver {
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

impl OriginDimensions for MockDriver {
    fn size(&self) -> Size {
        Size::new(self.capabilities.width, self.capabilities.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::primitives::{Line, PrimitiveStyle};

    #[test]
    fn test_mock_driver_creation() {
        let driver = MockDriver::new_with_size(320, 480).unwrap();
        assert_eq!(driver.capabilities().width, 320);
        assert_eq!(driver.capabilities().height, 480);
        assert_eq!(driver.count_lit_pixels(), 0);
        assert!(MockDriver::new_with_size(0, 480).is_err());
    }

    #[test]
    fn test_mock_driver_init() {
        let mut driver = MockDriver::new_with_size(320, 480).unwrap();
        let state = driver.state();
        assert!(!state.lock().unwrap().is_initialized);
        driver.init().unwrap();
        assert_eq!(state.lock().unwrap().init_count, 1);
        assert!(state.lock().unwrap().is_initialized);
    }

    #[test]
    fn test_mock_driver_drawing_and_clear() {
        let mut driver = MockDriver::new_with_size(320, 480).unwrap();
        Line::new(Point::new(0, 0), Point::new(10, 10))
            .into_styled(PrimitiveStyle::with_stroke(Rgb565::WHITE, 1))
            .draw(&mut driver)
            .unwrap();
        assert_eq!(driver.get_pixel(0, 0), Some(Rgb565::WHITE));
        assert_eq!(driver.count_color(Rgb565::WHITE), 11);
        assert_eq!(driver.count_lit_in(&Rectangle::new(Point::new(5, 5), Size::new(2, 2))), 2);

        DisplayDriver::clear(&mut driver).unwrap();
        assert_eq!(driver.count_lit_pixels(), 0);
        let state = driver.state();
        let state = state.lock().unwrap();
        assert_eq!(state.clear_count, 1);
        assert_eq!(state.flush_count, 1);
    }

    #[test]
    fn test_mock_driver_flush_area_recorded() {
        let mut driver = MockDriver::new_with_size(320, 480).unwrap();
        let r = Rectangle::new(Point::new(13, 18), Size::new(13, 18));
        driver.flush_area(&r).unwrap();
        let state = driver.state();
        assert_eq!(state.lock().unwrap().flush_area_count, 1);
        assert_eq!(state.lock().unwrap().flushed_areas, vec![r]);
    }

    #[test]
    fn test_mock_driver_simulated_failure() {
        let mut driver = MockDriver::new_with_size(320, 480).unwrap();
        driver.state().lock().unwrap().simulate_flush_failure = true;
        assert!(driver.flush().is_err());
        assert!(driver.flush_area(&Rectangle::zero()).is_err());
        driver.state().lock().unwrap().simulate_flush_failure = false;
        assert!(driver.flush().is_ok());
    }
}
