/*
 *  screensaver/animator.rs
 *
 *  OctoMon - printer status at a glance
 *	(c) 2020-26 Stuart Hunter
 *
 *	Falling code screensaver with dirty-rectangle redraw
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

use embedded_graphics::mono_font::MonoFont;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use log::debug;
use rand::Rng;
use rand::seq::SliceRandom;
use std::sync::Arc;

use super::particle::Particle;
use super::stream::{Stream, stream_code};
use crate::config::ScreensaverConfig;
use crate::display::color::BACKGROUND;
use crate::display::layout::DashboardLayout;

/// Anything the animator moves each frame
#[derive(Debug, Clone)]
pub enum Sprite {
    Stream(Stream),
    Single(Particle),
}

impl Sprite {
    fn is_dead(&self) -> bool {
        match self {
            Sprite::Stream(s) => s.is_dead(),
            Sprite::Single(p) => p.is_dead(),
        }
    }
}

pub struct Animator {
    sprites: Vec<Sprite>,
    /// frames left until the next stream
    add_line: u32,
    spawn_every: u32,
    label: String,
    printer_name: Vec<char>,
    width: u32,
    height: u32,
    cell: Size,
    font: &'static MonoFont<'static>,
    /// areas drawn last frame, wiped at the start of the next
    dirty: Vec<Rectangle>,
}

impl Animator {
    pub fn new(config: &ScreensaverConfig, layout: &DashboardLayout) -> Self {
        Self {
            sprites: Vec::new(),
            add_line: 1,
            spawn_every: config.spawn_every.max(1),
            label: config.label.clone(),
            printer_name: config.printer_name.chars().collect(),
            width: layout.width,
            height: layout.height,
            cell: layout.glyph_cell,
            font: layout.glyph_font,
            dirty: Vec::new(),
        }
    }

    pub fn sprites(&self) -> &[Sprite] {
        &self.sprites
    }

    pub fn stream_count(&self) -> usize {
        self.sprites.iter().filter(|s| matches!(s, Sprite::Stream(_))).count()
    }

    pub fn dirty(&self) -> &[Rectangle] {
        &self.dirty
    }

    /// Drops everything, used when the screensaver is left
    pub fn reset(&mut self) {
        debug!("screensaver torn down with {} sprites", self.sprites.len());
        self.sprites.clear();
        self.dirty.clear();
        self.add_line = 1;
    }

    fn columns(&self) -> i32 {
        (self.width / self.cell.width).max(1) as i32
    }

    /// Centre x of column `col`, 1-based
    fn column_x(&self, col: i32) -> i32 {
        let w = self.cell.width as i32;
        col * w - w / 2
    }

    /// Spawns, advances and retires. No drawing.
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.add_line = self.add_line.saturating_sub(1);
        if self.add_line == 0 {
            self.add_line = self.spawn_every;
            // one in 21 streams is the slow kind
            let speed = if rng.random_range(0..=20) == 0 { 3 } else { rng.random_range(1..=2) };
            let x = self.column_x(rng.random_range(1..=self.columns()));
            let code = stream_code(&self.label, rng);
            self.sprites.push(Sprite::Stream(Stream::new(x, -(self.cell.height as i32), speed, code)));
        }

        if rng.random_range(0..=50) == 50 && !self.printer_name.is_empty() {
            let mut code = self.printer_name.clone();
            code.shuffle(rng);
            let rows = (self.height / self.cell.height).max(1) as i32;
            let pos = Point::new(
                self.column_x(rng.random_range(1..=self.columns() + 1)),
                rng.random_range(1..=rows + 1) * self.cell.height as i32,
            );
            let frame = rng.random_range(0..code.len());
            self.sprites.push(Sprite::Single(Particle::new(pos, frame, Arc::from(code))));
        }

        let (height, cell_h) = (self.height, self.cell.height);
        for sprite in self.sprites.iter_mut() {
            match sprite {
                Sprite::Stream(s) => s.advance(rng, height, cell_h),
                Sprite::Single(p) => p.advance(rng),
            }
        }
        self.sprites.retain(|s| !s.is_dead());
    }

    /// Draws every live glyph and remembers where, returns those areas.
    pub fn render<D>(&mut self, target: &mut D) -> Result<&[Rectangle], D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        self.dirty.clear();
        for sprite in &self.sprites {
            match sprite {
                Sprite::Stream(s) => s.render(target, self.font, &mut self.dirty)?,
                Sprite::Single(p) => self.dirty.push(p.render(target, self.font)?),
            }
        }
        Ok(&self.dirty)
    }

    /// Blanks what the last render drew, returns the blanked areas.
    pub fn clear_dirty<D>(&mut self, target: &mut D) -> Result<Vec<Rectangle>, D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let cleared = std::mem::take(&mut self.dirty);
        for r in &cleared {
            target.fill_solid(r, BACKGROUND)?;
        }
        Ok(cleared)
    }

    /// One screensaver frame: wipe last frame's glyphs, move, draw.
    /// Returns every area that changed and needs flushing.
    pub fn frame<D, R>(&mut self, target: &mut D, rng: &mut R) -> Result<Vec<Rectangle>, D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
        R: Rng + ?Sized,
    {
        let mut changed = self.clear_dirty(target)?;
        self.step(rng);
        changed.extend_from_slice(self.render(target)?);
        Ok(changed)
    }
}
