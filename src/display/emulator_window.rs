/*
 *  display/emulator_window.rs
 *
 *  OctoMon - printer status at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Emulator window management, the mouse stands in for the touchscreen
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
use log::{error, info};
use pixels::{Pixels, SurfaceTexture};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tokio::sync::mpsc::UnboundedSender;
use winit::{
    dpi::PhysicalSize,
    event::{Event, VirtualKeyCode, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    window::WindowBuilder,
};
use winit_input_helper::WinitInputHelper;

use crate::display::color::to_rgba;
use crate::display::drivers::emulator::EmulatorState;
use crate::display::input::TouchEvent;

/// Emulator window configuration
#[derive(Debug, Clone)]
pub struct EmulatorWindowConfig {
    /// Pixel scale factor (display pixel → screen pixels)
    pub scale: u32,
    /// Background color [R, G, B, A]
    pub bg_color: [u8; 4],
}

impl Default for EmulatorWindowConfig {
    fn default() -> Self {
        Self {
            scale: 2,
            bg_color: [20, 20, 20, 255],
        }
    }
}

pub struct EmulatorWindow {
    state: Arc<Mutex<EmulatorState>>,
    config: EmulatorWindowConfig,
    touch: UnboundedSender<TouchEvent>,
    fps_counter: FpsCounter,
}

struct FpsCounter {
    last_update: Instant,
    frame_count: u32,
    current_fps: f32,
}

impl FpsCounter {
    fn new() -> Self {
        Self {
            last_update: Instant::now(),
            frame_count: 0,
            current_fps: 0.0,
        }
    }

    fn tick(&mut self) -> f32 {
        self.frame_count += 1;
        let elapsed = self.last_update.elapsed();
        if elapsed.as_secs_f32() >= 1.0 {
            self.current_fps = self.frame_count as f32 / elapsed.as_secs_f32();
            self.frame_count = 0;
            self.last_update = Instant::now();
        }
        self.current_fps
    }
}

impl EmulatorWindow {
    pub fn new(
        state: Arc<Mutex<EmulatorState>>,
        config: EmulatorWindowConfig,
        touch: UnboundedSender<TouchEvent>,
    ) -> Self {
        Self {
            state,
            config,
            touch,
            fps_counter: FpsCounter::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, EmulatorState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Run the window event loop, must be called on the main thread. Never returns.
    pub fn run(mut self) -> Result<(), Box<dyn std::error::Error>> {
        let (width, height, title) = {
            let s = self.lock();
            (s.width, s.height, s.title.clone())
        };

        let event_loop = EventLoop::new();
        let mut input = WinitInputHelper::new();

        // PhysicalSize keeps the scale exact under Wayland DPI scaling
        let window = WindowBuilder::new()
            .with_title(title.clone())
            .with_inner_size(PhysicalSize::new(width * self.config.scale, height * self.config.scale))
            .with_resizable(false)
            .build(&event_loop)?;

        let window_size = window.inner_size();
        let surface_texture = SurfaceTexture::new(window_size.width, window_size.height, &window);
        let mut pixels = Pixels::new(width, height, surface_texture)?;

        info!("Emulator window {}x{} at {}x, mouse = touch, Q/Esc quits", width, height, self.config.scale);

        event_loop.run(move |event, _, control_flow| {
            *control_flow = ControlFlow::Poll;

            if let Event::WindowEvent { event: WindowEvent::CloseRequested, .. } = &event {
                self.quit();
                *control_flow = ControlFlow::Exit;
                return;
            }

            if let Event::RedrawRequested(_) = event {
                self.render(pixels.frame_mut());
                if let Err(err) = pixels.render() {
                    error!("pixels.render() failed: {}", err);
                    self.quit();
                    *control_flow = ControlFlow::Exit;
                    return;
                }
                let fps = self.fps_counter.tick();
                if fps > 0.0 {
                    window.set_title(&format!("{} - {:.1} FPS", title, fps));
                }
            }

            if input.update(&event) {
                if input.key_pressed(VirtualKeyCode::Escape) || input.key_pressed(VirtualKeyCode::Q) {
                    self.quit();
                    *control_flow = ControlFlow::Exit;
                    return;
                }

                if let Some(pos) = input.mouse() {
                    // outside the surface clamps to the nearest edge pixel
                    let (x, y) = pixels
                        .window_pos_to_pixel(pos)
                        .unwrap_or_else(|pos| pixels.clamp_pixel_pos(pos));
                    let p = Point::new(x as i32, y as i32);
                    if input.mouse_pressed(0) {
                        let _ = self.touch.send(TouchEvent::Press(p));
                    }
                    if input.mouse_released(0) {
                        let _ = self.touch.send(TouchEvent::Release(p));
                    }
                }
            }

            window.request_redraw();
        });
    }

    fn quit(&self) {
        let _ = self.touch.send(TouchEvent::Quit);
    }

    fn render(&self, frame: &mut [u8]) {
        let state = self.lock();
        // a dark backlight reads as a black panel
        let factor = if state.brightness == 0 { 0.0 } else { 1.0 };
        for (i, pixel) in frame.chunks_exact_mut(4).enumerate() {
            match state.buffer.get(i) {
                Some(c) => {
                    let mut rgba = to_rgba(*c);
                    for v in rgba.iter_mut().take(3) {
                        *v = (*v as f32 * factor) as u8;
                    }
                    pixel.copy_from_slice(&rgba);
                }
                None => pixel.copy_from_slice(&self.config.bg_color),
            }
        }
    }
}
