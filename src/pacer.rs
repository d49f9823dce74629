/*
 *  pacer.rs
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
use std::time::Duration;
use tokio::time::Instant;

/// Frame-rate cap for the display loop. One tick = one frame.
pub struct Pacer {
    next_deadline: Instant,
    frame: Duration,
}

// the PiTFT SPI panel tops out well above 15fps,
// the screensaver timings assume 15
impl Pacer {
    pub fn new(target_fps: u32) -> Self {
        let frame = Duration::from_micros((1_000_000u32 / target_fps.max(1)) as u64);
        Self { next_deadline: Instant::now(), frame }
    }

    #[inline]
    pub fn frame(&self) -> Duration {
        self.frame
    }

    /// Sleeps until the frame is due. A late frame is not made up for.
    pub async fn tick(&mut self) {
        tokio::time::sleep_until(self.next_deadline).await;
        let now = Instant::now();
        self.next_deadline = (self.next_deadline + self.frame).max(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_length() {
        assert_eq!(Pacer::new(15).frame(), Duration::from_micros(66_666));
        assert_eq!(Pacer::new(0).frame(), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_paces() {
        let mut p = Pacer::new(10);
        let start = Instant::now();
        p.tick().await;
        p.tick().await;
        p.tick().await;
        assert!(Instant::now() - start >= Duration::from_millis(200));
    }
}
