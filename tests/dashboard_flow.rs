/*
 *  tests/dashboard_flow.rs
 *
 *  Display manager driven end to end on the mock panel
 *
 *  OctoMon - printer status at a glance
 *  (c) 2020-26 Stuart Hunter
 */

use embedded_graphics::prelude::Point;
use octomon::commands::Action;
use octomon::config::Config;
use octomon::display::drivers::MockDriver;
use octomon::display::layout::{DashButton, LayoutCategory};
use octomon::display::{ChannelTouch, DisplayManager, ScreenMode, TouchEvent};
use octomon::octoclient::JobCommand;
use octomon::octoinfo::{PrinterStatus, StatusFeed};
use octomon::system::PowerAction;
use tokio::sync::mpsc;

struct Panel {
    manager: DisplayManager<MockDriver>,
    touch: mpsc::UnboundedSender<TouchEvent>,
    actions: mpsc::UnboundedReceiver<Action>,
}

fn panel(width: u32, height: u32, status: PrinterStatus, timeout_ticks: u32) -> Panel {
    let mut config = Config::default();
    config.screensaver.timeout_ticks = timeout_ticks;
    config.touch.debounce_ms = 0;
    let driver = MockDriver::new_with_size(width, height).unwrap();
    let (touch, input) = ChannelTouch::new();
    let (tx, actions) = mpsc::unbounded_channel();
    let mut manager = DisplayManager::new(driver, Box::new(input), StatusFeed::fixed(status), tx, &config).unwrap();
    manager.seed(42);
    Panel { manager, touch, actions }
}

fn printing(pct: u8) -> PrinterStatus {
    PrinterStatus {
        connection_state: "Printing".to_string(),
        job_state: "Printing".to_string(),
        file_name: "3D_Benchy.gcode".to_string(),
        file_size: 1_234_567,
        completion: Some(pct),
        print_time_left: Some(5400),
        ..Default::default()
    }
}

fn tap(panel: &mut Panel, p: Point) {
    panel.touch.send(TouchEvent::Press(p)).unwrap();
    panel.touch.send(TouchEvent::Release(p)).unwrap();
    panel.manager.render_frame().unwrap();
}

#[test]
fn test_progress_bar_tracks_completion() {
    let mut panel = panel(320, 480, printing(40), 100);
    panel.manager.render_frame().unwrap();
    let segments = panel.manager.layout().progress.segments;
    let driver = panel.manager.driver();
    // 40% is past the fifth threshold (39) but short of the sixth (45)
    for seg in &segments[..5] {
        assert!(driver.count_lit_in(seg) > 0);
    }
    for seg in &segments[5..] {
        assert_eq!(driver.count_lit_in(seg), 0);
    }
}

#[test]
fn test_offline_panel_still_draws() {
    let mut panel = panel(320, 480, PrinterStatus::default(), 100);
    panel.manager.render_frame().unwrap();
    assert!(panel.manager.driver().count_lit_pixels() > 0);
    let segments = panel.manager.layout().progress.segments;
    assert!(segments.iter().all(|s| panel.manager.driver().count_lit_in(s) == 0));
}

#[test]
fn test_landscape_confirmed_power_off() {
    let mut panel = panel(480, 320, printing(10), 100);
    assert_eq!(panel.manager.layout().category, LayoutCategory::Landscape);
    panel.manager.render_frame().unwrap();

    let off = panel.manager.layout().button_rect(DashButton::PowerOff).center();
    tap(&mut panel, off);
    assert_eq!(panel.manager.pending_confirm(), Some(Action::Power(PowerAction::PowerOff)));
    assert!(panel.actions.try_recv().is_err());

    let yes = panel.manager.layout().confirm.yes.center();
    tap(&mut panel, yes);
    assert_eq!(panel.actions.try_recv().unwrap(), Action::Power(PowerAction::PowerOff));
}

#[test]
fn test_idle_sleep_and_wake_cycle() {
    let mut panel = panel(320, 480, printing(60), 5);
    for _ in 0..5 {
        panel.manager.render_frame().unwrap();
    }
    assert_eq!(panel.manager.mode(), ScreenMode::Screensaver);

    for _ in 0..30 {
        panel.manager.render_frame().unwrap();
    }
    assert!(!panel.manager.animator().sprites().is_empty());
    {
        let state = panel.manager.driver().state();
        let state = state.lock().unwrap();
        assert!(state.flush_area_count > 0);
        // every partial flush stays on the panel
        assert!(state.flushed_areas.iter().all(|r| r.size.width <= 320 && r.size.height <= 480));
    }

    // waking on the Pause button does not pause
    let pause = panel.manager.layout().button_rect(DashButton::PauseResume).center();
    tap(&mut panel, pause);
    assert_eq!(panel.manager.mode(), ScreenMode::Dashboard);
    assert!(panel.actions.try_recv().is_err());
    assert!(panel.manager.animator().sprites().is_empty());

    // the next tap does
    tap(&mut panel, pause);
    assert_eq!(panel.actions.try_recv().unwrap(), Action::Job(JobCommand::Pause));
}

#[test]
fn test_quit_event_stops_loop() {
    let mut panel = panel(320, 480, printing(0), 100);
    panel.touch.send(TouchEvent::Quit).unwrap();
    panel.manager.render_frame().unwrap();
    assert!(panel.manager.quit_requested());
    panel.manager.blank().unwrap();
    assert_eq!(panel.manager.driver().count_lit_pixels(), 0);
}
