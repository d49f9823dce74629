/*
 *  vframebuf.rs
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

use core::convert::Infallible;
use embedded_graphics::geometry::{OriginDimensions, Size};
use embedded_graphics::pixelcolor::PixelColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

/// A runtime-sized framebuffer for embedded-graphics.
#[derive(Debug, Clone)]
pub struct VarFrameBuf<C: PixelColor> {
    buf: Vec<C>,
    w: usize,
    h: usize,
}

impl<C: PixelColor + Clone> VarFrameBuf<C> {
    pub fn new(width: u32, height: u32, fill: C) -> Self {
        let (w, h) = (width as usize, height as usize);
        Self { buf: vec![fill; w * h], w, h }
    }

    pub fn width(&self) -> usize { self.w }
    pub fn height(&self) -> usize { self.h }

    /// Immutable raw access (row-major, `width` pixels per row)
    pub fn as_slice(&self) -> &[C] { &self.buf }

    /// Clear to a color
    pub fn clear_color(&mut self, color: C) {
        self.buf.fill(color);
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<C> {
        self.idx(Point::new(x as i32, y as i32)).map(|i| self.buf[i])
    }

    /// Clips `area` to the buffer, None when nothing is left.
    pub fn clip(&self, area: &Rectangle) -> Option<Rectangle> {
        let clipped = area.intersection(&self.bounding_box());
        if clipped.size.width == 0 || clipped.size.height == 0 {
            None
        } else {
            Some(clipped)
        }
    }

    /// Fill one rectangle, used to wipe dirty regions between frames
    pub fn clear_area(&mut self, area: &Rectangle, color: C) {
        if let Some(a) = self.clip(area) {
            let (x0, y0) = (a.top_left.x as usize, a.top_left.y as usize);
            let (w, h) = (a.size.width as usize, a.size.height as usize);
            for y in y0..y0 + h {
                let base = y * self.w + x0;
                self.buf[base..base + w].fill(color);
            }
        }
    }

    /// Row slices covering `area`, yielded as (y, x0, pixels)
    pub fn rows(&self, area: &Rectangle) -> impl Iterator<Item = (usize, usize, &[C])> + '_ {
        let clipped = self.clip(area);
        let (x0, y0, w, h) = match clipped {
            Some(a) => (
                a.top_left.x as usize,
                a.top_left.y as usize,
                a.size.width as usize,
                a.size.height as usize,
            ),
            None => (0, 0, 0, 0),
        };
        (y0..y0 + h).map(move |y| {
            let base = y * self.w + x0;
            (y, x0, &self.buf[base..base + w])
        })
    }

    /// Map (x,y) to linear index; returns None if out of bounds
    #[inline]
    fn idx(&self, p: Point) -> Option<usize> {
        if p.x >= 0 && p.y >= 0 {
            let (x, y) = (p.x as usize, p.y as usize);
            if x < self.w && y < self.h {
                return Some(y * self.w + x);
            }
        }
        None
    }
}

impl<C: PixelColor> OriginDimensions for VarFrameBuf<C> {
    fn size(&self) -> Size {
        Size::new(self.w as u32, self.h as u32)
    }
}

impl<C: PixelColor + Clone> DrawTarget for VarFrameBuf<C> {
    type Color = C;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(p, c) in pixels {
            if let Some(i) = self.idx(p) {
                self.buf[i] = c;
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.clear_color(color);
        Ok(())
    }

    fn fill_contiguous<I>(&mut self, area: &Rectangle, colors: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Self::Color>,
    {
        // text glyphs straddle the edges, so go per pixel with clipping
        let Size { width, height } = area.size;
        if width == 0 || height == 0 { return Ok(()); }
        let mut it = colors.into_iter();
        for dy in 0..height as i32 {
            for dx in 0..width as i32 {
                let Some(c) = it.next() else { return Ok(()) };
                if let Some(i) = self.idx(area.top_left + Point::new(dx, dy)) {
                    self.buf[i] = c;
                }
            }
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        self.clear_area(area, color);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::pixelcolor::Rgb565;

    #[test]
    fn test_clear_area_is_clipped() {
        let mut fb = VarFrameBuf::new(10, 10, Rgb565::BLACK);
        fb.clear_area(&Rectangle::new(Point::new(8, 8), Size::new(5, 5)), Rgb565::WHITE);
        assert_eq!(fb.pixel(9, 9), Some(Rgb565::WHITE));
        assert_eq!(fb.pixel(7, 7), Some(Rgb565::BLACK));
        assert_eq!(fb.as_slice().iter().filter(|c| **c == Rgb565::WHITE).count(), 4);
    }

    #[test]
    fn test_fill_contiguous_off_edge() {
        let mut fb = VarFrameBuf::new(4, 4, Rgb565::BLACK);
        let area = Rectangle::new(Point::new(-1, -1), Size::new(3, 3));
        fb.fill_contiguous(&area, core::iter::repeat(Rgb565::RED)).unwrap();
        assert_eq!(fb.pixel(0, 0), Some(Rgb565::RED));
        assert_eq!(fb.pixel(1, 1), Some(Rgb565::RED));
        assert_eq!(fb.pixel(2, 2), Some(Rgb565::BLACK));
        assert_eq!(fb.pixel(3, 0), Some(Rgb565::BLACK));
    }

    #[test]
    fn test_rows_cover_region() {
        let fb = VarFrameBuf::new(6, 6, Rgb565::BLACK);
        let rows: Vec<_> = fb.rows(&Rectangle::new(Point::new(2, 1), Size::new(3, 2))).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].0, 1);
        assert_eq!(rows[0].1, 2);
        assert_eq!(rows[0].2.len(), 3);
        assert_eq!(fb.rows(&Rectangle::new(Point::new(10, 10), Size::new(3, 3))).count(), 0);
    }
}
