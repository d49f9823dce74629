/*
 *  display/components/confirm.rs
 *
 *  OctoMon - printer status at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Yes/No confirmation screen for destructive actions
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

use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_text::TextBox;
use embedded_text::alignment::HorizontalAlignment;
use embedded_text::style::TextBoxStyleBuilder;

use super::dashboard::draw_button;
use crate::display::color::{BACKGROUND, FOREGROUND};
use crate::display::layout::DashboardLayout;

pub struct ConfirmView<'a> {
    pub message: &'a str,
}

impl<'a> ConfirmView<'a> {
    pub fn new(message: &'a str) -> Self {
        Self { message }
    }

    pub fn render<D>(&self, target: &mut D, layout: &DashboardLayout) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        target.clear(BACKGROUND)?;
        let style = MonoTextStyle::new(layout.font, FOREGROUND);
        let textbox_style = TextBoxStyleBuilder::new().alignment(HorizontalAlignment::Left).build();
        TextBox::with_textbox_style(self.message, layout.confirm.message, style, textbox_style).draw(target)?;
        draw_button(target, layout, layout.confirm.yes, "Yes")?;
        draw_button(target, layout, layout.confirm.no, "No")?;
        Ok(())
    }
}
