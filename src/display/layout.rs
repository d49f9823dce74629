/*
 *  display/layout.rs
 *
 *  OctoMon - printer status at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Adaptive layout for dashboard, confirmation and screensaver
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

use embedded_graphics::mono_font::MonoFont;
use embedded_graphics::mono_font::iso_8859_1::{FONT_8X13, FONT_9X15};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use crate::display::traits::DisplayCapabilities;

/// Text rows above the progress bar: status, name, size, ETA
pub const UPPER_ROWS: i32 = 4;
/// Interfaces with room on the dashboard, any further ones are not shown
pub const SHOWN_INTERFACES: usize = 2;
/// Text rows below it: two temperature rows, two per shown interface, version
pub const LOWER_ROWS: i32 = 3 + 2 * SHOWN_INTERFACES as i32;
/// Progress bar segments, one per threshold
pub const PROGRESS_SEGMENTS: usize = 13;
/// Horizontal pitch of screensaver columns
pub const GLYPH_CELL_WIDTH: u32 = 13;

/// Layout category based on display orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutCategory {
    /// Taller than wide, buttons in a 2x2 grid
    Portrait,

    /// Wider than tall, buttons in a single row
    Landscape,
}

/// The four dashboard buttons, in drawing order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashButton {
    PauseResume,
    Cancel,
    Reboot,
    PowerOff,
}

impl DashButton {
    pub const ALL: [DashButton; 4] = [
        DashButton::PauseResume,
        DashButton::Cancel,
        DashButton::Reboot,
        DashButton::PowerOff,
    ];
}

/// What a dashboard touch landed on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    Button(DashButton),
    StatusLine,
}

#[derive(Debug, Clone)]
pub struct ProgressLayout {
    /// Outline
    pub frame: Rectangle,

    /// Filled squares, left to right
    pub segments: [Rectangle; PROGRESS_SEGMENTS],
}

#[derive(Debug, Clone)]
pub struct ConfirmLayout {
    /// Where the question is wrapped
    pub message: Rectangle,
    pub yes: Rectangle,
    pub no: Rectangle,
}

/// Layout configuration for different display resolutions
#[derive(Debug, Clone)]
pub struct DashboardLayout {
    /// Display width in pixels
    pub width: u32,

    /// Display height in pixels
    pub height: u32,

    pub category: LayoutCategory,

    /// Dashboard text font
    pub font: &'static MonoFont<'static>,

    /// Distance between text baselines... well, tops
    pub line_height: i32,

    pub margin: i32,

    /// Top of the first text row
    pub upper_top: i32,

    pub progress: ProgressLayout,

    /// Top of the first row under the bar
    pub lower_top: i32,

    /// Tap target for connect/disconnect
    pub status_line: Rectangle,

    /// Same order as `DashButton::ALL`
    pub buttons: [Rectangle; 4],

    /// Top of the date/time row
    pub footer_top: i32,

    pub confirm: ConfirmLayout,

    /// Screensaver glyph font and cell
    pub glyph_font: &'static MonoFont<'static>,
    pub glyph_cell: Size,
}

impl DashboardLayout {
    /// Create layout configuration based on display capabilities
    pub fn for_display(capabilities: &DisplayCapabilities) -> Self {
        Self::for_size(capabilities.width, capabilities.height)
    }

    pub fn for_size(width: u32, height: u32) -> Self {
        let category = if width > height { LayoutCategory::Landscape } else { LayoutCategory::Portrait };
        let font: &'static MonoFont<'static> = if width >= 480 { &FONT_9X15 } else { &FONT_8X13 };
        let char_h = font.character_size.height as i32;
        let line_height = char_h + 5;
        let margin = 5;
        let (w, h) = (width as i32, height as i32);

        let upper_top = margin;
        let bar_top = upper_top + UPPER_ROWS * line_height;
        let bar_h = 30;
        let progress = Self::progress_layout(Rectangle::new(
            Point::new(margin, bar_top),
            Size::new((w - 2 * margin).max(0) as u32, bar_h as u32),
        ));
        let lower_top = bar_top + bar_h + 6;

        let footer_top = h - margin - char_h;
        let buttons_top = lower_top + LOWER_ROWS * line_height + 4;
        let buttons_bottom = (footer_top - margin).max(buttons_top + 30);
        let buttons = Self::button_grid(category, margin, w, buttons_top, buttons_bottom);

        let status_line = Rectangle::new(
            Point::new(0, 0),
            Size::new(width, (upper_top + line_height) as u32),
        );

        Self {
            width,
            height,
            category,
            font,
            line_height,
            margin,
            upper_top,
            progress,
            lower_top,
            status_line,
            buttons,
            footer_top,
            confirm: Self::confirm_layout(w, h, margin),
            glyph_font: &FONT_9X15,
            glyph_cell: Size::new(GLYPH_CELL_WIDTH, FONT_9X15.character_size.height + 3),
        }
    }

    fn progress_layout(frame: Rectangle) -> ProgressLayout {
        let pad = 5;
        let gap = 5;
        let n = PROGRESS_SEGMENTS as i32;
        let inner_w = frame.size.width as i32 - 2 * pad;
        let seg_w = ((inner_w - (n - 1) * gap) / n).max(1);
        let seg_h = (frame.size.height as i32 - 2 * pad).max(1);
        // spread the rounding slack evenly over both ends
        let slack = (inner_w - (n * seg_w + (n - 1) * gap)).max(0) / 2;
        let x0 = frame.top_left.x + pad + slack;
        let y0 = frame.top_left.y + pad;
        let segments = core::array::from_fn(|i| {
            Rectangle::new(
                Point::new(x0 + i as i32 * (seg_w + gap), y0),
                Size::new(seg_w as u32, seg_h as u32),
            )
        });
        ProgressLayout { frame, segments }
    }

    fn button_grid(category: LayoutCategory, margin: i32, w: i32, top: i32, bottom: i32) -> [Rectangle; 4] {
        let gap = 10;
        let (cols, rows) = match category {
            LayoutCategory::Portrait => (2, 2),
            LayoutCategory::Landscape => (4, 1),
        };
        let bw = ((w - 2 * margin - (cols - 1) * gap) / cols).max(1);
        let bh = ((bottom - top - (rows - 1) * gap) / rows).max(1);
        core::array::from_fn(|i| {
            let (c, r) = (i as i32 % cols, i as i32 / cols);
            Rectangle::new(
                Point::new(margin + c * (bw + gap), top + r * (bh + gap)),
                Size::new(bw as u32, bh as u32),
            )
        })
    }

    fn confirm_layout(w: i32, h: i32, margin: i32) -> ConfirmLayout {
        let gap = 10;
        let bw = ((w - 2 * margin - gap) / 2).min(150);
        let bh = 75.min(h / 4);
        let x0 = (w - (2 * bw + gap)) / 2;
        let y = h / 2;
        ConfirmLayout {
            message: Rectangle::new(
                Point::new(margin, margin),
                Size::new((w - 2 * margin) as u32, (y - 2 * margin).max(1) as u32),
            ),
            yes: Rectangle::new(Point::new(x0, y), Size::new(bw as u32, bh as u32)),
            no: Rectangle::new(Point::new(x0 + bw + gap, y), Size::new(bw as u32, bh as u32)),
        }
    }

    /// Top-left of an upper text row (0 = status)
    pub fn upper_row(&self, row: i32) -> Point {
        Point::new(self.margin, self.upper_top + row * self.line_height)
    }

    /// Top-left of a row under the progress bar
    pub fn lower_row(&self, row: i32) -> Point {
        Point::new(self.margin, self.lower_top + row * self.line_height)
    }

    pub fn button_rect(&self, button: DashButton) -> Rectangle {
        let idx = DashButton::ALL.iter().position(|b| *b == button).unwrap_or(0);
        self.buttons[idx]
    }

    /// Which dashboard element, if any, is under `p`
    pub fn hit(&self, p: Point) -> Option<HitTarget> {
        DashButton::ALL
            .iter()
            .zip(self.buttons.iter())
            .find(|(_, r)| r.contains(p))
            .map(|(b, _)| HitTarget::Button(*b))
            .or_else(|| self.status_line.contains(p).then_some(HitTarget::StatusLine))
    }

    /// Some(true) for Yes, Some(false) for No, None for a miss
    pub fn confirm_hit(&self, p: Point) -> Option<bool> {
        if self.confirm.yes.contains(p) {
            Some(true)
        } else if self.confirm.no.contains(p) {
            Some(false)
        } else {
            None
        }
    }

    /// Screensaver columns across the width
    pub fn glyph_columns(&self) -> u32 {
        (self.width / self.glyph_cell.width).max(1)
    }

    /// Screensaver rows down the height
    pub fn glyph_rows(&self) -> u32 {
        (self.height / self.glyph_cell.height).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inside(outer: &Rectangle, inner: &Rectangle) -> bool {
        outer.contains(inner.top_left) && outer.contains(inner.bottom_right().unwrap_or(inner.top_left))
    }

    #[test]
    fn test_portrait_layout() {
        let l = DashboardLayout::for_size(320, 480);
        assert_eq!(l.category, LayoutCategory::Portrait);
        assert_eq!(l.font.character_size.width, 8);
        let screen = Rectangle::new(Point::zero(), Size::new(320, 480));
        for b in &l.buttons {
            assert!(inside(&screen, b), "{:?}", b);
        }
        // 2x2 grid
        assert_eq!(l.buttons[0].top_left.y, l.buttons[1].top_left.y);
        assert!(l.buttons[2].top_left.y > l.buttons[0].top_left.y);
        assert!(l.buttons[3].top_left.y + l.buttons[3].size.height as i32 <= l.footer_top);
    }

    #[test]
    fn test_landscape_layout() {
        let l = DashboardLayout::for_size(480, 320);
        assert_eq!(l.category, LayoutCategory::Landscape);
        assert!(l.buttons.iter().all(|b| b.top_left.y == l.buttons[0].top_left.y));
    }

    #[test]
    fn test_progress_segments_inside_frame() {
        for (w, h) in [(320, 480), (480, 320)] {
            let l = DashboardLayout::for_size(w, h);
            let segs = &l.progress.segments;
            for s in segs {
                assert!(inside(&l.progress.frame, s));
            }
            for pair in segs.windows(2) {
                assert!(pair[1].top_left.x > pair[0].top_left.x + pair[0].size.width as i32);
            }
        }
    }

    #[test]
    fn test_hit_testing() {
        let l = DashboardLayout::for_size(320, 480);
        let centre = l.button_rect(DashButton::Reboot).center();
        assert_eq!(l.hit(centre), Some(HitTarget::Button(DashButton::Reboot)));
        assert_eq!(l.hit(Point::new(10, 5)), Some(HitTarget::StatusLine));
        assert_eq!(l.hit(l.lower_row(2)), None);
        assert_eq!(l.confirm_hit(l.confirm.yes.center()), Some(true));
        assert_eq!(l.confirm_hit(l.confirm.no.center()), Some(false));
        assert_eq!(l.confirm_hit(Point::new(1, 1)), None);
    }

    #[test]
    fn test_glyph_grid() {
        let l = DashboardLayout::for_size(320, 480);
        assert_eq!(l.glyph_columns(), 24);
        assert_eq!(l.glyph_rows(), 480 / 18);
    }
}
