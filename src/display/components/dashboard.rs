/*
 *  display/components/dashboard.rs
 *
 *  OctoMon - printer status at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Dashboard component - job, temperatures, network, buttons
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

use arrayvec::ArrayString;
use chrono::{DateTime, Local};
use core::fmt::Write;
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};

use crate::deutils::{c_to_f, format_eta, pretty_file_name, thousands};
use crate::display::color::{BACKGROUND, FOREGROUND};
use crate::display::layout::{DashButton, DashboardLayout, PROGRESS_SEGMENTS, SHOWN_INTERFACES};
use crate::octoinfo::PrinterStatus;

/// Completion percentages at which each progress square lights up
pub const PROGRESS_THRESHOLDS: [u8; PROGRESS_SEGMENTS] =
    [7, 16, 24, 31, 39, 45, 52, 60, 69, 78, 85, 92, 100];

/// Squares lit for a completion percentage
pub fn lit_segments(percent: u8) -> usize {
    PROGRESS_THRESHOLDS.iter().filter(|t| percent >= **t).count()
}

/// Temperatures as shown: targets blank out to 0 unless both are set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TempReadout {
    pub actual_f: i32,
    pub actual_c: i32,
    pub target_f: i32,
    pub target_c: i32,
}

/// Everything the dashboard draws, already formatted
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub status: String,
    pub name: String,
    pub size: String,
    pub eta: String,
    pub tool: TempReadout,
    pub bed: TempReadout,
    pub interfaces: Vec<String>,
    pub version: Option<String>,
    pub progress: u8,
    pub pause_label: &'static str,
    pub date: ArrayString<16>,
    pub time: ArrayString<16>,
}

impl DashboardView {
    pub fn from_status(status: &PrinterStatus, now: DateTime<Local>) -> Self {
        let online = status.is_online();

        let status_line = match (online, status.completion) {
            (true, Some(pct)) => format!("Status: {} ({}%)", status.connection_state, pct),
            _ => format!("Status: {}", status.connection_state),
        };
        let name = if online {
            format!("Name:   {}", pretty_file_name(&status.file_name))
        } else {
            "Name: ".to_string()
        };
        let size = if online {
            format!("Size:   {} Bytes", thousands(status.file_size))
        } else {
            "Size:".to_string()
        };
        let eta = format!("ETA:    {}", format_eta(status.print_time_left));

        let both_targets = status.tool.target != 0 && status.bed.target != 0;
        let readout = |t: &crate::octoinfo::Temps| {
            if !online {
                return TempReadout::default();
            }
            let (target_f, target_c) = if both_targets { (c_to_f(t.target as f64), t.target) } else { (0, 0) };
            TempReadout { actual_f: c_to_f(t.actual as f64), actual_c: t.actual, target_f, target_c }
        };

        let mut interfaces = Vec::with_capacity(SHOWN_INTERFACES * 2);
        for iface in status.interfaces.iter().take(SHOWN_INTERFACES) {
            interfaces.push(format!("{:<8}{:<15}", format!("{}:", iface.name), iface.ip));
            interfaces.push(format!("{:<8}{:<17}", "", iface.mac));
        }

        let mut date = ArrayString::<16>::new();
        let _ = write!(date, "{}", now.format("%m-%d-%Y"));
        let mut time = ArrayString::<16>::new();
        let _ = write!(time, "{}", now.format("%H:%M:%S"));

        Self {
            status: status_line,
            name,
            size,
            eta,
            tool: readout(&status.tool),
            bed: readout(&status.bed),
            interfaces,
            version: online.then(|| format!("Ver: {}-{}", status.api_version, status.server_version)),
            progress: if online { status.completion.unwrap_or(0) } else { 0 },
            pause_label: if status.is_paused() { "Resume" } else { "Pause" },
            date,
            time,
        }
    }

    pub fn temp_line(label: &str, t: &TempReadout) -> String {
        format!(
            "{:<6}{:>3}\u{b0}F / {:>3}\u{b0}C  Set: {:>3}\u{b0}F / {:>3}\u{b0}C",
            label, t.actual_f, t.actual_c, t.target_f, t.target_c
        )
    }

    pub fn button_label(&self, button: DashButton) -> &'static str {
        match button {
            DashButton::PauseResume => self.pause_label,
            DashButton::Cancel => "Cancel",
            DashButton::Reboot => "Reboot",
            DashButton::PowerOff => "Power Off",
        }
    }

    /// Full redraw; the caller flushes.
    pub fn render<D>(&self, target: &mut D, layout: &DashboardLayout) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        target.clear(BACKGROUND)?;
        let style = MonoTextStyle::new(layout.font, FOREGROUND);

        let upper = [&self.status, &self.name, &self.size, &self.eta];
        for (row, line) in upper.iter().enumerate() {
            Text::with_baseline(line, layout.upper_row(row as i32), style, Baseline::Top).draw(target)?;
        }

        draw_progress(target, layout, self.progress)?;

        let mut lower: Vec<String> = vec![
            Self::temp_line("Tool:", &self.tool),
            Self::temp_line("Bed:", &self.bed),
        ];
        lower.extend(self.interfaces.iter().cloned());
        if let Some(v) = &self.version {
            lower.push(v.clone());
        }
        for (row, line) in lower.iter().enumerate() {
            Text::with_baseline(line, layout.lower_row(row as i32), style, Baseline::Top).draw(target)?;
        }

        for button in DashButton::ALL {
            draw_button(target, layout, layout.button_rect(button), self.button_label(button))?;
        }

        Text::with_baseline(&self.date, Point::new(layout.margin, layout.footer_top), style, Baseline::Top)
            .draw(target)?;
        let right = TextStyleBuilder::new().alignment(Alignment::Right).baseline(Baseline::Top).build();
        Text::with_text_style(
            &self.time,
            Point::new(layout.width as i32 - layout.margin, layout.footer_top),
            style,
            right,
        )
        .draw(target)?;

        Ok(())
    }
}

fn draw_progress<D>(target: &mut D, layout: &DashboardLayout, percent: u8) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    layout.progress.frame.into_styled(PrimitiveStyle::with_stroke(FOREGROUND, 2)).draw(target)?;
    for seg in layout.progress.segments.iter().take(lit_segments(percent)) {
        seg.into_styled(PrimitiveStyle::with_fill(FOREGROUND)).draw(target)?;
    }
    Ok(())
}

/// Outlined box with a centred label, shared with the confirmation screen
pub fn draw_button<D>(target: &mut D, layout: &DashboardLayout, rect: Rectangle, label: &str) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    rect.into_styled(PrimitiveStyle::with_stroke(FOREGROUND, 2)).draw(target)?;
    let centred = TextStyleBuilder::new().alignment(Alignment::Center).baseline(Baseline::Middle).build();
    Text::with_text_style(label, rect.center(), MonoTextStyle::new(layout.font, FOREGROUND), centred)
        .draw(target)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::layout::LOWER_ROWS;
    use crate::netinfo::InterfaceInfo;
    use crate::octoinfo::Temps;
    use crate::vframebuf::VarFrameBuf;
    use chrono::TimeZone;

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap()
    }

    fn printing() -> PrinterStatus {
        PrinterStatus {
            connection_state: "Printing".to_string(),
            job_state: "Printing".to_string(),
            file_name: "3D_Benchy.gcode".to_string(),
            file_size: 1_234_567,
            completion: Some(52),
            print_time_left: Some(5_400),
            api_version: "0.1".to_string(),
            server_version: "1.9.3".to_string(),
            tool: Temps { actual: 210, target: 210 },
            bed: Temps { actual: 60, target: 60 },
            interfaces: vec![InterfaceInfo {
                name: "wlan0".to_string(),
                ip: "192.168.1.23".to_string(),
                mac: "b8:27:eb:01:02:03".to_string(),
            }],
            fetched: None,
        }
    }

    #[test]
    fn test_lit_segments() {
        assert_eq!(lit_segments(0), 0);
        assert_eq!(lit_segments(6), 0);
        assert_eq!(lit_segments(7), 1);
        assert_eq!(lit_segments(52), 7);
        assert_eq!(lit_segments(99), 12);
        assert_eq!(lit_segments(100), 13);
    }

    #[test]
    fn test_offline_view_placeholders() {
        let view = DashboardView::from_status(&PrinterStatus::default(), now());
        assert_eq!(view.status, "Status: Offline");
        assert_eq!(view.name, "Name: ");
        assert_eq!(view.size, "Size:");
        assert_eq!(view.eta, "ETA:    00:00:00");
        assert_eq!(view.tool, TempReadout::default());
        assert_eq!(view.bed, TempReadout::default());
        assert_eq!(view.version, None);
        assert_eq!(view.progress, 0);
        assert_eq!(view.pause_label, "Pause");
    }

    #[test]
    fn test_printing_view() {
        let view = DashboardView::from_status(&printing(), now());
        assert_eq!(view.status, "Status: Printing (52%)");
        assert_eq!(view.name, "Name:   3D Benchy");
        assert_eq!(view.size, "Size:   1,234,567 Bytes");
        assert_eq!(view.eta, "ETA:    00:01:30");
        assert_eq!(view.tool, TempReadout { actual_f: 410, actual_c: 210, target_f: 410, target_c: 210 });
        assert_eq!(view.bed.actual_f, 140);
        assert_eq!(view.version.as_deref(), Some("Ver: 0.1-1.9.3"));
        assert_eq!(view.interfaces[0], "wlan0:  192.168.1.23   ");
        assert_eq!(view.interfaces[1], "        b8:27:eb:01:02:03");
        assert_eq!(view.date.as_str(), "03-09-2024");
        assert_eq!(view.time.as_str(), "14:05:07");
    }

    #[test]
    fn test_extra_interfaces_stay_clear_of_buttons() {
        let mut s = printing();
        for name in ["eth0", "usb0"] {
            s.interfaces.push(InterfaceInfo::unknown(name));
        }
        let view = DashboardView::from_status(&s, now());
        assert_eq!(view.interfaces.len(), 2 * SHOWN_INTERFACES);
        assert!(!view.interfaces.iter().any(|l| l.starts_with("usb0")));

        let layout = DashboardLayout::for_size(320, 480);
        let mut fb = VarFrameBuf::new(320, 480, BACKGROUND);
        view.render(&mut fb, &layout).unwrap();
        let last_text = layout.lower_row(LOWER_ROWS - 1).y + layout.font.character_size.height as i32;
        let first_button = DashButton::ALL.iter().map(|b| layout.button_rect(*b).top_left.y).min().unwrap();
        assert!(last_text <= first_button);
        // nothing drawn between the text and the button outlines
        for y in last_text..first_button - 2 {
            for x in 0..320 {
                assert_eq!(fb.pixel(x, y as u32), Some(BACKGROUND));
            }
        }
    }

    #[test]
    fn test_targets_zero_unless_both_set() {
        let mut s = printing();
        s.bed.target = 0;
        let view = DashboardView::from_status(&s, now());
        assert_eq!(view.tool.target_f, 0);
        assert_eq!(view.tool.target_c, 0);
        assert_eq!(view.tool.actual_f, 410);
        assert_eq!(view.bed.target_f, 0);
    }

    #[test]
    fn test_pause_label_follows_job() {
        let mut s = printing();
        s.job_state = "Paused".to_string();
        let view = DashboardView::from_status(&s, now());
        assert_eq!(view.button_label(DashButton::PauseResume), "Resume");
    }

    #[test]
    fn test_temp_line_fits_portrait() {
        let view = DashboardView::from_status(&printing(), now());
        let line = DashboardView::temp_line("Tool:", &view.tool);
        assert_eq!(line, "Tool: 410\u{b0}F / 210\u{b0}C  Set: 410\u{b0}F / 210\u{b0}C");
        assert!(line.chars().count() <= 40);
    }

    #[test]
    fn test_render_draws_something() {
        let layout = DashboardLayout::for_size(320, 480);
        let mut fb = VarFrameBuf::new(320, 480, Rgb565::BLACK);
        DashboardView::from_status(&printing(), now()).render(&mut fb, &layout).unwrap();
        let seg = layout.progress.segments[0].center();
        assert_eq!(fb.pixel(seg.x as u32, seg.y as u32), Some(FOREGROUND));
        let last = layout.progress.segments[12].center();
        assert_eq!(fb.pixel(last.x as u32, last.y as u32), Some(BACKGROUND));
    }
}
