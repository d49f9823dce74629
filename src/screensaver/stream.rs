/*
 *  screensaver/stream.rs
 *
 *  OctoMon - printer status at a glance
 *	(c) 2020-26 Stuart Hunter
 *
 *	A column of particles dropping one glyph row at a time
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

use chrono::Local;
use embedded_graphics::mono_font::MonoFont;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use rand::Rng;
use rand::seq::SliceRandom;
use std::sync::Arc;

use super::particle::Particle;

/// Glyph source for a new stream: local time and zone, then the label, shuffled.
pub fn stream_code<R: Rng + ?Sized>(label: &str, rng: &mut R) -> Arc<[char]> {
    let mut chars: Vec<char> = Local::now()
        .format("%X %Z %z")
        .to_string()
        .chars()
        .chain(label.chars())
        .collect();
    chars.shuffle(rng);
    chars.into()
}

/// Most particles a stream can hold: every on-screen row plus the one it starts above the top.
pub fn max_particles(viewport_height: u32, cell_height: u32) -> usize {
    viewport_height.div_ceil(cell_height.max(1)) as usize + 1
}

#[derive(Debug, Clone)]
pub struct Stream {
    x: i32,
    spawn_y: i32,
    /// ticks between spawns
    speed: u32,
    update: u32,
    frame: usize,
    code: Arc<[char]>,
    particles: Vec<Particle>,
    exhausted: bool,
    spawned: usize,
    dead: bool,
}

impl Stream {
    /// Starts with one particle at `top` (normally one row above the screen).
    pub fn new(x: i32, top: i32, speed: u32, code: Arc<[char]>) -> Self {
        let first = Particle::new(Point::new(x, top), 0, Arc::clone(&code));
        Self {
            x,
            spawn_y: top,
            speed: speed.max(1),
            update: 0,
            frame: 0,
            code,
            particles: vec![first],
            exhausted: false,
            spawned: 1,
            dead: false,
        }
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn speed(&self) -> u32 {
        self.speed
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Total particles ever added, the initial one included
    pub fn spawned(&self) -> usize {
        self.spawned
    }

    /// No further spawns, the next slot is off the bottom
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    pub fn advance<R: Rng + ?Sized>(&mut self, rng: &mut R, viewport_height: u32, cell_height: u32) {
        self.update += 1;
        if self.update >= self.speed {
            self.update = 0;
            // the next slot must still start on screen, nothing spawns below the edge
            let next = self.spawn_y + cell_height as i32;
            if !self.exhausted && next < viewport_height as i32 {
                self.spawn_y = next;
                self.particles.push(Particle::new(
                    Point::new(self.x, self.spawn_y),
                    self.frame,
                    Arc::clone(&self.code),
                ));
                self.spawned += 1;
            } else {
                self.exhausted = true;
            }
        }

        for p in self.particles.iter_mut() {
            p.advance(rng);
        }
        self.particles.retain(|p| !p.is_dead());

        self.frame += 1;
        if self.frame >= self.code.len() {
            self.frame = 0;
        }

        self.dead = self.exhausted && self.particles.is_empty();
    }

    pub fn render<D>(&self, target: &mut D, font: &MonoFont<'_>, dirty: &mut Vec<Rectangle>) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        for p in &self.particles {
            dirty.push(p.render(target, font)?);
        }
        Ok(())
    }
}
