/*
 *  display/color.rs
 *
 *  OctoMon - printer status at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Palette and pixel format conversion
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

use embedded_graphics::pixelcolor::raw::{RawData, RawU16};
use embedded_graphics::pixelcolor::{Rgb565, Rgb888};
use embedded_graphics::prelude::*;

use super::traits::ColorDepth;

pub const BACKGROUND: Rgb565 = Rgb565::BLACK;
pub const FOREGROUND: Rgb565 = Rgb565::WHITE;

/// Screensaver glyph at full life, pure blue
pub const FRESH: Rgb565 = Rgb565::new(0, 0, 31);

/// Screensaver glyph about to die, violet (100, 0, 255)
pub const FADED: Rgb565 = Rgb565::new(12, 0, 31);

/// Linear blend, `t` = 0 gives `from`, `t` = 1 gives `to` exactly.
pub fn lerp(from: Rgb565, to: Rgb565, t: f32) -> Rgb565 {
    let t = t.clamp(0.0, 1.0);
    let mix = |a: u8, b: u8| -> u8 {
        (a as f32 + (b as f32 - a as f32) * t).round() as u8
    };
    Rgb565::new(mix(from.r(), to.r()), mix(from.g(), to.g()), mix(from.b(), to.b()))
}

#[inline]
pub fn to_raw(c: Rgb565) -> u16 {
    RawU16::from(c).into_inner()
}

/// Packs a pixel the way the device memory expects it
#[inline]
pub fn write_pixel(depth: ColorDepth, c: Rgb565, out: &mut [u8]) {
    match depth {
        ColorDepth::Rgb565 => out[..2].copy_from_slice(&to_raw(c).to_le_bytes()),
        ColorDepth::Xrgb8888 => {
            let c = Rgb888::from(c);
            out[..4].copy_from_slice(&[c.b(), c.g(), c.r(), 0xFF]);
        }
    }
}

/// RGBA bytes for the emulator's pixel surface
#[inline]
pub fn to_rgba(c: Rgb565) -> [u8; 4] {
    let c = Rgb888::from(c);
    [c.r(), c.g(), c.b(), 0xFF]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lerp_endpoints() {
        assert_eq!(lerp(FADED, FRESH, 0.0), FADED);
        assert_eq!(lerp(FADED, FRESH, 1.0), FRESH);
        assert_eq!(lerp(FADED, FRESH, 2.0), FRESH);
        assert_eq!(lerp(FADED, FRESH, 0.5), Rgb565::new(6, 0, 31));
    }

    #[test]
    fn test_pixel_packing() {
        let mut b = [0u8; 4];
        write_pixel(ColorDepth::Rgb565, Rgb565::RED, &mut b);
        assert_eq!(&b[..2], &[0x00, 0xF8]);
        write_pixel(ColorDepth::Xrgb8888, Rgb565::WHITE, &mut b);
        assert_eq!(b, [0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(to_rgba(Rgb565::BLACK), [0, 0, 0, 0xFF]);
    }
}
