/*
 *  display/manager.rs
 *
 *  OctoMon - printer status at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Display manager - orchestrates the dashboard, screensaver and touch input
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

use crate::commands::{Action, ActionSender};
use crate::config::Config;
use crate::display::components::{ConfirmView, DashboardView};
use crate::display::input::{Debouncer, TouchEvent, TouchInput};
use crate::display::layout::{DashButton, DashboardLayout, HitTarget};
use crate::display::mode_controller::{IdleController, TouchOutcome};
use crate::display::{DisplayCapabilities, DisplayDriver, DisplayError, DrawableDisplay, ScreenMode};
use crate::octoclient::{ConnectionCommand, JobCommand};
use crate::octoinfo::{PrinterStatus, StatusFeed};
use crate::pacer::Pacer;
use crate::screensaver::Animator;
use crate::system::PowerAction;

use chrono::Local;
use embedded_graphics::prelude::Point;
use log::{debug, info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::time::{Duration, Instant};

/// Performance metrics for display rendering
#[derive(Debug, Clone)]
pub struct PerformanceMetrics {
    /// Total frame time (render + transfer)
    pub frame_time_us: u64,

    /// Time spent drawing into the shadow buffer
    pub render_time_us: u64,

    /// Time spent pushing pixels to the device
    pub transfer_time_us: u64,

    pub frame_count: u64,

    /// Average frame time over last N frames
    pub avg_frame_time_us: u64,

    pub target_frame_time_us: u64,
}

impl PerformanceMetrics {
    pub fn new(target_fps: u32) -> Self {
        Self {
            frame_time_us: 0,
            render_time_us: 0,
            transfer_time_us: 0,
            frame_count: 0,
            avg_frame_time_us: 0,
            target_frame_time_us: 1_000_000 / target_fps.max(1) as u64,
        }
    }

    pub fn record_frame(&mut self, render_time_us: u64, transfer_time_us: u64) {
        self.render_time_us = render_time_us;
        self.transfer_time_us = transfer_time_us;
        self.frame_time_us = render_time_us + transfer_time_us;
        self.frame_count += 1;

        // Simple moving average (last frame + current) / 2
        if self.avg_frame_time_us == 0 {
            self.avg_frame_time_us = self.frame_time_us;
        } else {
            self.avg_frame_time_us = (self.avg_frame_time_us + self.frame_time_us) / 2;
        }

        // Warn if exceeding target by >20%
        if self.frame_time_us > self.target_frame_time_us * 12 / 10 {
            warn!("Frame time {}μs exceeds target {}μs (render: {}μs, transfer: {}μs)",
                  self.frame_time_us, self.target_frame_time_us,
                  render_time_us, transfer_time_us);
        }
    }

    pub fn fps(&self) -> f32 {
        if self.avg_frame_time_us == 0 {
            0.0
        } else {
            1_000_000.0 / self.avg_frame_time_us as f32
        }
    }
}

/// Owns the panel and everything drawn on it.
///
/// One call to [`render_frame`](Self::render_frame) is one frame: drain
/// touches, then either draw the whole dashboard (or the pending confirmation)
/// from the latest status snapshot, or step the screensaver and flush only
/// the rectangles it touched. Printer and system commands leave through the
/// action channel and are never awaited here.
pub struct DisplayManager<D: DrawableDisplay> {
    driver: D,
    touch: Box<dyn TouchInput>,
    debounce: Debouncer,
    idle: IdleController,
    animator: Animator,
    feed: StatusFeed,
    actions: ActionSender,
    layout: DashboardLayout,

    /// A destructive action waiting for Yes/No
    pending_confirm: Option<Action>,

    pacer: Pacer,
    metrics: PerformanceMetrics,
    rng: StdRng,
    quit: bool,
}

impl<D: DrawableDisplay> DisplayManager<D> {
    /// Takes an uninitialised driver, initialises and blanks it.
    pub fn new(
        mut driver: D,
        touch: Box<dyn TouchInput>,
        feed: StatusFeed,
        actions: ActionSender,
        config: &Config,
    ) -> Result<Self, DisplayError> {
        driver.init()?;
        DisplayDriver::clear(&mut driver)?;

        let caps = driver.capabilities().clone();
        if caps.supports_brightness {
            if let Err(e) = driver.set_brightness(config.display.brightness) {
                warn!("Backlight unavailable: {}", e);
            }
        }
        let layout = DashboardLayout::for_display(&caps);
        info!(
            "Display {}x{} {:?} layout, {} glyph columns",
            caps.width, caps.height, layout.category, layout.glyph_columns()
        );

        let fps = config.display.fps.min(caps.max_fps);
        Ok(Self {
            animator: Animator::new(&config.screensaver, &layout),
            idle: IdleController::new(config.screensaver.timeout_ticks),
            debounce: Debouncer::new(Duration::from_millis(config.touch.debounce_ms)),
            layout,
            driver,
            touch,
            feed,
            actions,
            pending_confirm: None,
            pacer: Pacer::new(fps),
            metrics: PerformanceMetrics::new(fps),
            rng: StdRng::from_os_rng(),
            quit: false,
        })
    }

    /// Replace the animation rng, for reproducible frames
    pub fn seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    pub fn capabilities(&self) -> &DisplayCapabilities {
        self.driver.capabilities()
    }

    pub fn layout(&self) -> &DashboardLayout {
        &self.layout
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn mode(&self) -> ScreenMode {
        self.idle.current_mode()
    }

    pub fn idle(&self) -> &IdleController {
        &self.idle
    }

    pub fn animator(&self) -> &Animator {
        &self.animator
    }

    pub fn pending_confirm(&self) -> Option<Action> {
        self.pending_confirm
    }

    pub fn performance_metrics(&self) -> &PerformanceMetrics {
        &self.metrics
    }

    /// A quit arrived from the input side
    pub fn quit_requested(&self) -> bool {
        self.quit
    }

    /// Frame loop, returns once a quit arrives. Render errors are logged and the loop carries on.
    pub async fn run(&mut self) {
        info!("Display loop started at {:?} per frame", self.pacer.frame());
        while !self.quit {
            self.pacer.tick().await;
            if let Err(e) = self.render_frame() {
                warn!("frame failed: {}", e);
            }
        }
        info!("Display loop finished after {} frames", self.metrics.frame_count);
    }

    /// Blank the panel, used on the way out
    pub fn blank(&mut self) -> Result<(), DisplayError> {
        DisplayDriver::clear(&mut self.driver)
    }

    pub fn render_frame(&mut self) -> Result<(), DisplayError> {
        let events = match self.touch.poll_events() {
            Ok(events) => events,
            Err(e) => {
                debug!("touch read failed: {}", e);
                Vec::new()
            }
        };
        for event in events {
            match event {
                TouchEvent::Release(p) => self.handle_release(p, Instant::now()),
                TouchEvent::Press(_) => {}
                TouchEvent::Quit => {
                    info!("Quit requested");
                    self.quit = true;
                }
            }
        }

        let frame_start = Instant::now();
        match self.idle.current_mode() {
            ScreenMode::Dashboard => self.render_dashboard(frame_start),
            ScreenMode::Screensaver => self.render_screensaver(frame_start),
        }
    }

    fn render_dashboard(&mut self, frame_start: Instant) -> Result<(), DisplayError> {
        self.feed.ask_refresh();
        match self.pending_confirm {
            Some(action) => ConfirmView::new(action.prompt()).render(&mut self.driver, &self.layout)?,
            None => {
                let status = self.feed.latest();
                DashboardView::from_status(&status, Local::now()).render(&mut self.driver, &self.layout)?;
            }
        }
        let render_time = frame_start.elapsed().as_micros() as u64;

        let transfer_start = Instant::now();
        self.driver.flush()?;
        self.metrics.record_frame(render_time, transfer_start.elapsed().as_micros() as u64);

        if self.idle.tick() {
            self.enter_screensaver()?;
        }
        Ok(())
    }

    fn render_screensaver(&mut self, frame_start: Instant) -> Result<(), DisplayError> {
        let changed = self.animator.frame(&mut self.driver, &mut self.rng)?;
        let render_time = frame_start.elapsed().as_micros() as u64;

        let transfer_start = Instant::now();
        for area in &changed {
            self.driver.flush_area(area)?;
        }
        self.metrics.record_frame(render_time, transfer_start.elapsed().as_micros() as u64);
        Ok(())
    }

    fn enter_screensaver(&mut self) -> Result<(), DisplayError> {
        if let Some(action) = self.pending_confirm.take() {
            debug!("{:?} dismissed by the screensaver", action);
        }
        self.animator.reset();
        DisplayDriver::clear(&mut self.driver)
    }

    /// A finger lifted at `p`. Every release counts as activity,
    /// the debounce only keeps it off the buttons.
    pub fn handle_release(&mut self, p: Point, now: Instant) {
        let fresh = self.debounce.accept(now);
        match self.idle.touch() {
            TouchOutcome::Woke => {
                self.animator.reset();
            }
            TouchOutcome::Forward if !fresh => {
                debug!("touch at {:?} debounced", p);
            }
            TouchOutcome::Forward => match self.pending_confirm {
                Some(action) => self.resolve_confirm(action, p),
                None => self.dashboard_touch(p),
            },
        }
    }

    fn resolve_confirm(&mut self, action: Action, p: Point) {
        match self.layout.confirm_hit(p) {
            Some(true) => {
                self.pending_confirm = None;
                self.send(action);
            }
            Some(false) => {
                info!("{:?} not confirmed", action);
                self.pending_confirm = None;
            }
            None => {}
        }
    }

    fn dashboard_touch(&mut self, p: Point) {
        let Some(target) = self.layout.hit(p) else {
            return;
        };
        let status = self.feed.latest();
        let action = action_for(target, &status);
        if action.needs_confirmation() {
            self.pending_confirm = Some(action);
        } else {
            self.send(action);
        }
    }

    fn send(&self, action: Action) {
        if self.actions.send(action).is_err() {
            warn!("command dispatcher gone, {:?} dropped", action);
        }
    }
}

/// What tapping `target` asks for, given the printer's state
pub fn action_for(target: HitTarget, status: &PrinterStatus) -> Action {
    match target {
        HitTarget::Button(DashButton::PauseResume) => {
            if status.is_paused() {
                Action::Job(JobCommand::Resume)
            } else {
                Action::Job(JobCommand::Pause)
            }
        }
        HitTarget::Button(DashButton::Cancel) => Action::Job(JobCommand::Cancel),
        HitTarget::Button(DashButton::Reboot) => Action::Power(PowerAction::Reboot),
        HitTarget::Button(DashButton::PowerOff) => Action::Power(PowerAction::PowerOff),
        HitTarget::StatusLine => {
            if status.is_online() {
                Action::Connection(ConnectionCommand::Disconnect)
            } else {
                Action::Connection(ConnectionCommand::Connect)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::drivers::mock::MockDriver;
    use crate::display::input::ChannelTouch;
    use tokio::sync::mpsc;

    struct Rig {
        manager: DisplayManager<MockDriver>,
        touch: mpsc::UnboundedSender<TouchEvent>,
        actions: mpsc::UnboundedReceiver<Action>,
    }

    fn rig(status: PrinterStatus, timeout_ticks: u32) -> Rig {
        let mut config = Config::default();
        config.screensaver.timeout_ticks = timeout_ticks;
        config.touch.debounce_ms = 0;
        let driver = MockDriver::new_with_size(320, 480).unwrap();
        let (touch, input) = ChannelTouch::new();
        let (tx, actions) = mpsc::unbounded_channel();
        let mut manager =
            DisplayManager::new(driver, Box::new(input), StatusFeed::fixed(status), tx, &config).unwrap();
        manager.seed(7);
        Rig { manager, touch, actions }
    }

    fn printing() -> PrinterStatus {
        PrinterStatus {
            connection_state: "Operational".to_string(),
            job_state: "Printing".to_string(),
            completion: Some(40),
            ..Default::default()
        }
    }

    fn tap(rig: &mut Rig, p: Point) {
        rig.touch.send(TouchEvent::Press(p)).unwrap();
        rig.touch.send(TouchEvent::Release(p)).unwrap();
        rig.manager.render_frame().unwrap();
    }

    fn centre(rig: &Rig, b: DashButton) -> Point {
        rig.manager.layout().button_rect(b).center()
    }

    #[test]
    fn test_new_initialises_driver() {
        let rig = rig(PrinterStatus::default(), 10);
        let state = rig.manager.driver().state();
        let state = state.lock().unwrap();
        assert_eq!(state.init_count, 1);
        assert_eq!(state.clear_count, 1);
        assert_eq!(state.last_brightness, Some(1));
    }

    #[test]
    fn test_offline_dashboard_renders() {
        let mut rig = rig(PrinterStatus::default(), 10);
        rig.manager.render_frame().unwrap();
        assert!(rig.manager.driver().count_lit_pixels() > 0);
        assert_eq!(rig.manager.mode(), ScreenMode::Dashboard);
    }

    #[test]
    fn test_idle_timeout_enters_screensaver() {
        let mut rig = rig(printing(), 3);
        for _ in 0..2 {
            rig.manager.render_frame().unwrap();
            assert_eq!(rig.manager.mode(), ScreenMode::Dashboard);
        }
        rig.manager.render_frame().unwrap();
        assert_eq!(rig.manager.mode(), ScreenMode::Screensaver);
        // blanked on the way in
        assert_eq!(rig.manager.driver().count_lit_pixels(), 0);
    }

    #[test]
    fn test_touch_mid_count_delays_timeout() {
        let mut rig = rig(printing(), 3);
        rig.manager.render_frame().unwrap();
        rig.manager.render_frame().unwrap();
        // a miss still counts as activity
        tap(&mut rig, Point::new(1, 300));
        assert_eq!(rig.manager.idle().idle_ticks(), 1);
        rig.manager.render_frame().unwrap();
        assert_eq!(rig.manager.mode(), ScreenMode::Dashboard);
        rig.manager.render_frame().unwrap();
        assert_eq!(rig.manager.mode(), ScreenMode::Screensaver);
    }

    #[test]
    fn test_screensaver_flushes_dirty_areas_only() {
        let mut rig = rig(printing(), 1);
        rig.manager.render_frame().unwrap();
        assert_eq!(rig.manager.mode(), ScreenMode::Screensaver);
        let full_flushes = rig.manager.driver().state().lock().unwrap().flush_count;
        for _ in 0..20 {
            rig.manager.render_frame().unwrap();
        }
        let state = rig.manager.driver().state();
        let state = state.lock().unwrap();
        assert_eq!(state.flush_count, full_flushes);
        assert!(state.flush_area_count > 0);
        assert!(rig.manager.animator().stream_count() > 0);
    }

    #[test]
    fn test_waking_touch_is_consumed() {
        let mut rig = rig(printing(), 2);
        rig.manager.render_frame().unwrap();
        rig.manager.render_frame().unwrap();
        assert_eq!(rig.manager.mode(), ScreenMode::Screensaver);
        let cancel = centre(&rig, DashButton::Cancel);
        tap(&mut rig, cancel);
        assert_eq!(rig.manager.mode(), ScreenMode::Dashboard);
        assert_eq!(rig.manager.pending_confirm(), None);
        assert!(rig.actions.try_recv().is_err());
        assert!(rig.manager.animator().sprites().is_empty());
    }

    #[test]
    fn test_pause_and_resume_follow_job_state() {
        let mut rig = rig(printing(), 100);
        let pause = centre(&rig, DashButton::PauseResume);
        tap(&mut rig, pause);
        assert_eq!(rig.actions.try_recv().unwrap(), Action::Job(JobCommand::Pause));

        let paused = PrinterStatus { job_state: "Paused".to_string(), ..printing() };
        let mut rig = self::rig(paused, 100);
        tap(&mut rig, pause);
        assert_eq!(rig.actions.try_recv().unwrap(), Action::Job(JobCommand::Resume));
    }

    #[test]
    fn test_cancel_waits_for_yes() {
        let mut rig = rig(printing(), 100);
        let cancel = centre(&rig, DashButton::Cancel);
        tap(&mut rig, cancel);
        assert_eq!(rig.manager.pending_confirm(), Some(Action::Job(JobCommand::Cancel)));
        assert!(rig.actions.try_recv().is_err());

        // touches away from Yes/No leave the question up
        tap(&mut rig, Point::new(1, 1));
        assert!(rig.manager.pending_confirm().is_some());

        let yes = rig.manager.layout().confirm.yes.center();
        tap(&mut rig, yes);
        assert_eq!(rig.manager.pending_confirm(), None);
        assert_eq!(rig.actions.try_recv().unwrap(), Action::Job(JobCommand::Cancel));
    }

    #[test]
    fn test_no_drops_the_action() {
        let mut rig = rig(printing(), 100);
        let reboot = centre(&rig, DashButton::Reboot);
        tap(&mut rig, reboot);
        assert_eq!(rig.manager.pending_confirm(), Some(Action::Power(PowerAction::Reboot)));
        let no = rig.manager.layout().confirm.no.center();
        tap(&mut rig, no);
        assert_eq!(rig.manager.pending_confirm(), None);
        assert!(rig.actions.try_recv().is_err());
    }

    #[test]
    fn test_status_line_toggles_connection() {
        let mut rig = rig(PrinterStatus::default(), 100);
        tap(&mut rig, Point::new(10, 5));
        assert_eq!(rig.actions.try_recv().unwrap(), Action::Connection(ConnectionCommand::Connect));

        let mut rig = self::rig(printing(), 100);
        tap(&mut rig, Point::new(10, 5));
        assert_eq!(
            rig.manager.pending_confirm(),
            Some(Action::Connection(ConnectionCommand::Disconnect))
        );
    }

    #[test]
    fn test_screensaver_dismisses_confirmation() {
        let mut rig = rig(printing(), 3);
        let off = centre(&rig, DashButton::PowerOff);
        tap(&mut rig, off);
        assert!(rig.manager.pending_confirm().is_some());
        rig.manager.render_frame().unwrap();
        rig.manager.render_frame().unwrap();
        assert_eq!(rig.manager.mode(), ScreenMode::Screensaver);
        assert_eq!(rig.manager.pending_confirm(), None);
    }

    #[test]
    fn test_debounce_drops_double_tap() {
        let mut rig = rig(printing(), 100);
        rig.manager.debounce = Debouncer::new(Duration::from_millis(250));
        let pause = centre(&rig, DashButton::PauseResume);
        let t0 = Instant::now();
        rig.manager.handle_release(pause, t0);
        rig.manager.handle_release(pause, t0 + Duration::from_millis(50));
        assert!(rig.actions.try_recv().is_ok());
        assert!(rig.actions.try_recv().is_err());
    }

    #[test]
    fn test_debounced_release_still_counts_as_activity() {
        let mut rig = rig(printing(), 100);
        rig.manager.debounce = Debouncer::new(Duration::from_millis(250));
        let pause = centre(&rig, DashButton::PauseResume);
        let t0 = Instant::now();
        rig.manager.handle_release(pause, t0);
        for _ in 0..3 {
            rig.manager.render_frame().unwrap();
        }
        assert_eq!(rig.manager.idle().idle_ticks(), 3);
        rig.manager.handle_release(pause, t0 + Duration::from_millis(50));
        assert_eq!(rig.manager.idle().idle_ticks(), 0);
        assert!(rig.actions.try_recv().is_ok());
        assert!(rig.actions.try_recv().is_err());
    }

    #[test]
    fn test_debounced_release_wakes_screensaver() {
        let mut rig = rig(printing(), 2);
        rig.manager.debounce = Debouncer::new(Duration::from_millis(250));
        let pause = centre(&rig, DashButton::PauseResume);
        let t0 = Instant::now();
        rig.manager.handle_release(pause, t0);
        assert!(rig.actions.try_recv().is_ok());
        rig.manager.render_frame().unwrap();
        rig.manager.render_frame().unwrap();
        assert_eq!(rig.manager.mode(), ScreenMode::Screensaver);

        rig.manager.handle_release(pause, t0 + Duration::from_millis(50));
        assert_eq!(rig.manager.mode(), ScreenMode::Dashboard);
        assert!(rig.actions.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_ends_on_quit() {
        let mut rig = rig(printing(), 100);
        rig.touch.send(TouchEvent::Quit).unwrap();
        rig.manager.run().await;
        assert!(rig.manager.quit_requested());
        assert_eq!(rig.manager.performance_metrics().frame_count, 1);
    }

    #[test]
    fn test_action_for_targets() {
        let s = printing();
        assert_eq!(action_for(HitTarget::Button(DashButton::PowerOff), &s), Action::Power(PowerAction::PowerOff));
        assert_eq!(action_for(HitTarget::Button(DashButton::Cancel), &s), Action::Job(JobCommand::Cancel));
    }
}
