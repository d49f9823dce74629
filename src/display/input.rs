/*
 *  display/input.rs
 *
 *  OctoMon - printer status at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Touch input: evdev touchscreen reader, channel-fed input, debounce
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

use embedded_graphics::prelude::Point;
use log::{debug, info};
use std::fs::{File, OpenOptions};
use std::io::{self, Read};
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use crate::config::TouchConfig;
use crate::display::error::DisplayError;

// linux/input-event-codes.h
const EV_SYN: u16 = 0x00;
const EV_KEY: u16 = 0x01;
const EV_ABS: u16 = 0x03;
const SYN_REPORT: u16 = 0x00;
const BTN_TOUCH: u16 = 0x14a;
const ABS_X: u16 = 0x00;
const ABS_Y: u16 = 0x01;
const ABS_MT_POSITION_X: u16 = 0x35;
const ABS_MT_POSITION_Y: u16 = 0x36;

/// Touch activity in screen coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchEvent {
    Press(Point),
    Release(Point),
    /// Window closed or quit key, emulator only
    Quit,
}

/// Source of touch events, drained once per frame without blocking
pub trait TouchInput: Send {
    fn poll_events(&mut self) -> Result<Vec<TouchEvent>, DisplayError>;
}

/// Raw panel axes to screen pixels
#[derive(Debug, Clone)]
pub struct Calibration {
    min_x: i32,
    max_x: i32,
    min_y: i32,
    max_y: i32,
    swap_xy: bool,
    invert_x: bool,
    invert_y: bool,
    width: u32,
    height: u32,
}

impl Calibration {
    pub fn new(cfg: &TouchConfig, width: u32, height: u32) -> Self {
        Self {
            min_x: cfg.min_x,
            max_x: cfg.max_x,
            min_y: cfg.min_y,
            max_y: cfg.max_y,
            swap_xy: cfg.swap_xy,
            invert_x: cfg.invert_x,
            invert_y: cfg.invert_y,
            width,
            height,
        }
    }

    fn scale(raw: i32, min: i32, max: i32, span: u32, invert: bool) -> i32 {
        let range = (max - min).max(1) as i64;
        let off = (raw.clamp(min, max) - min) as i64;
        let mut v = (off * (span.max(1) as i64 - 1) / range) as i32;
        if invert {
            v = span as i32 - 1 - v;
        }
        v
    }

    pub fn map(&self, raw_x: i32, raw_y: i32) -> Point {
        let (rx, ry) = if self.swap_xy { (raw_y, raw_x) } else { (raw_x, raw_y) };
        Point::new(
            Self::scale(rx, self.min_x, self.max_x, self.width, self.invert_x),
            Self::scale(ry, self.min_y, self.max_y, self.height, self.invert_y),
        )
    }
}

/// Folds raw evdev records into press/release events at SYN_REPORT.
#[derive(Debug, Default)]
pub struct EvdevDecoder {
    raw_x: i32,
    raw_y: i32,
    touching: bool,
    pending: Option<bool>,
}

impl EvdevDecoder {
    pub fn feed(&mut self, ev_type: u16, code: u16, value: i32, calib: &Calibration) -> Option<TouchEvent> {
        match (ev_type, code) {
            (EV_ABS, ABS_X) | (EV_ABS, ABS_MT_POSITION_X) => self.raw_x = value,
            (EV_ABS, ABS_Y) | (EV_ABS, ABS_MT_POSITION_Y) => self.raw_y = value,
            (EV_KEY, BTN_TOUCH) => self.pending = Some(value != 0),
            (EV_SYN, SYN_REPORT) => {
                let down = self.pending.take()?;
                if down == self.touching {
                    return None;
                }
                self.touching = down;
                let p = calib.map(self.raw_x, self.raw_y);
                return Some(if down { TouchEvent::Press(p) } else { TouchEvent::Release(p) });
            }
            _ => {}
        }
        None
    }
}

/// Resistive/capacitive touchscreen through /dev/input/eventN
pub struct EvdevTouch {
    file: File,
    calib: Calibration,
    decoder: EvdevDecoder,
    buf: Vec<u8>,
}

impl EvdevTouch {
    pub fn open(path: &Path, calib: Calibration) -> Result<Self, DisplayError> {
        let file = OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(path)?;
        info!("Touch input opened: {}", path.display());
        Ok(Self {
            file,
            calib,
            decoder: EvdevDecoder::default(),
            buf: vec![0u8; std::mem::size_of::<libc::input_event>() * 64],
        })
    }
}

impl TouchInput for EvdevTouch {
    fn poll_events(&mut self) -> Result<Vec<TouchEvent>, DisplayError> {
        let rec = std::mem::size_of::<libc::input_event>();
        let mut events = Vec::new();
        loop {
            let n = match self.file.read(&mut self.buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            for chunk in self.buf[..n].chunks_exact(rec) {
                // SAFETY: chunk is exactly one input_event, read_unaligned copes with alignment
                let ev: libc::input_event =
                    unsafe { std::ptr::read_unaligned(chunk.as_ptr() as *const libc::input_event) };
                if let Some(t) = self.decoder.feed(ev.type_, ev.code, ev.value, &self.calib) {
                    debug!("touch {:?}", t);
                    events.push(t);
                }
            }
            if n < self.buf.len() {
                break;
            }
        }
        Ok(events)
    }
}

/// Touch events pushed from elsewhere, the emulator window or a test
pub struct ChannelTouch {
    rx: mpsc::UnboundedReceiver<TouchEvent>,
}

impl ChannelTouch {
    pub fn new() -> (mpsc::UnboundedSender<TouchEvent>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self { rx })
    }
}

impl TouchInput for ChannelTouch {
    fn poll_events(&mut self) -> Result<Vec<TouchEvent>, DisplayError> {
        let mut events = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(e) => events.push(e),
                Err(mpsc::error::TryRecvError::Empty) => break,
                // sender gone means the window went away
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    events.push(TouchEvent::Quit);
                    break;
                }
            }
        }
        Ok(events)
    }
}

/// No touchscreen, the dashboard is display-only
pub struct NoTouch;

impl TouchInput for NoTouch {
    fn poll_events(&mut self) -> Result<Vec<TouchEvent>, DisplayError> {
        Ok(Vec::new())
    }
}

/// Drops a release that follows the last accepted one too closely
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    last: Option<Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self { window, last: None }
    }

    pub fn accept(&mut self, now: Instant) -> bool {
        match self.last {
            Some(t) if now.saturating_duration_since(t) < self.window => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}
