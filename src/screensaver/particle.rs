/*
 *  screensaver/particle.rs
 *
 *  OctoMon - printer status at a glance
 *	(c) 2020-26 Stuart Hunter
 *
 *	One falling glyph with a fade-out
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

use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};
use rand::Rng;
use std::sync::Arc;

use crate::display::color::{FADED, FRESH, lerp};

pub const MAX_LIFE: u32 = 30;
pub const FADE_TIME: u32 = 5;

#[derive(Debug, Clone)]
pub struct Particle {
    pos: Point,
    frame: f32,
    life: u32,
    max_life: u32,
    fade_time: u32,
    code: Arc<[char]>,
    dead: bool,
}

impl Particle {
    pub fn new(pos: Point, frame: usize, code: Arc<[char]>) -> Self {
        Self {
            pos,
            frame: frame as f32,
            life: MAX_LIFE,
            max_life: MAX_LIFE,
            fade_time: FADE_TIME,
            code,
            dead: false,
        }
    }

    pub fn position(&self) -> Point {
        self.pos
    }

    pub fn life(&self) -> u32 {
        self.life
    }

    pub fn max_life(&self) -> u32 {
        self.max_life
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    /// Glyph at the current frame, blank for an empty sequence
    pub fn glyph(&self) -> char {
        self.code.get(self.frame as usize).copied().unwrap_or(' ')
    }

    /// Steps the glyph by 0.1..=0.3 of a frame and burns one unit of life.
    pub fn advance<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.frame += rng.random_range(1..=3) as f32 / 10.0;
        if self.frame >= self.code.len() as f32 {
            self.frame = 0.0;
        }

        self.life = self.life.saturating_sub(1);
        if self.life == 0 {
            self.dead = true;
        }
    }

    /// FRESH until the fade threshold, then a straight blend down to FADED at zero.
    pub fn color(&self) -> Rgb565 {
        if self.life >= self.fade_time {
            FRESH
        } else {
            lerp(FADED, FRESH, self.life as f32 / self.fade_time as f32)
        }
    }

    /// Draws the glyph centred on the particle, returns the area it covered.
    pub fn render<D>(&self, target: &mut D, font: &MonoFont<'_>) -> Result<Rectangle, D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let mut buf = [0u8; 4];
        let glyph = self.glyph().encode_utf8(&mut buf);
        let style = MonoTextStyle::new(font, self.color());
        let placement = TextStyleBuilder::new()
            .alignment(Alignment::Center)
            .baseline(Baseline::Middle)
            .build();
        let text = Text::with_text_style(glyph, self.pos, style, placement);
        text.draw(target)?;
        Ok(text.bounding_box())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vframebuf::VarFrameBuf;
    use embedded_graphics::mono_font::iso_8859_1::FONT_9X15;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn code() -> Arc<[char]> {
        "12:00:00 +00:00OctoPrint".chars().collect()
    }

    #[test]
    fn test_life_drops_by_one_until_dead() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut p = Particle::new(Point::new(20, 20), 0, code());
        for expected in (0..MAX_LIFE).rev() {
            assert!(!p.is_dead());
            p.advance(&mut rng);
            assert_eq!(p.life(), expected);
            assert_eq!(p.is_dead(), expected == 0);
        }
        p.advance(&mut rng);
        assert_eq!(p.life(), 0);
        assert!(p.is_dead());
    }

    #[test]
    fn test_color_boundaries() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut p = Particle::new(Point::zero(), 0, code());
        assert_eq!(p.life(), p.max_life());
        assert_eq!(p.color(), FRESH);
        let mut last_blue_red = p.color().r();
        while !p.is_dead() {
            p.advance(&mut rng);
            // red channel only ever climbs towards FADED
            assert!(p.color().r() >= last_blue_red);
            last_blue_red = p.color().r();
        }
        assert_eq!(p.color(), FADED);
    }

    #[test]
    fn test_color_continuous_at_fade() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut p = Particle::new(Point::zero(), 0, code());
        while p.life() > FADE_TIME {
            p.advance(&mut rng);
        }
        assert_eq!(p.color(), FRESH);
        p.advance(&mut rng);
        assert_ne!(p.color(), FRESH);
        assert_ne!(p.color(), FADED);
    }

    #[test]
    fn test_frame_wraps() {
        let short: Arc<[char]> = vec!['a', 'b'].into();
        let mut rng = StdRng::seed_from_u64(11);
        let mut p = Particle::new(Point::zero(), 1, short);
        for _ in 0..20 {
            p.advance(&mut rng);
            assert!(p.glyph() == 'a' || p.glyph() == 'b');
        }
        let empty: Arc<[char]> = Vec::new().into();
        let mut p = Particle::new(Point::zero(), 0, empty);
        p.advance(&mut rng);
        assert_eq!(p.glyph(), ' ');
    }

    #[test]
    fn test_render_stays_in_rect() {
        let mut fb = VarFrameBuf::new(40, 40, Rgb565::BLACK);
        let p = Particle::new(Point::new(20, 20), 0, code());
        let rect = p.render(&mut fb, &FONT_9X15).unwrap();
        assert!(rect.contains(Point::new(20, 20)));
        let mut lit = 0;
        for y in 0..40 {
            for x in 0..40 {
                if fb.pixel(x, y) != Some(Rgb565::BLACK) {
                    lit += 1;
                    assert!(rect.contains(Point::new(x as i32, y as i32)));
                }
            }
        }
        assert!(lit > 0);
    }
}
