//! Pan/zoom gestures on the spectrum display
//!
//! Input arrives as [`DisplayEvent`]s in pixel coordinates. The
//! [`GestureHandler`] applies them to a [`DisplayMapping`] and reports a
//! retune when the gesture moved the tuned frequency.

use crate::display::mapping::{DisplayMapping, Readout, FREQUENCY_STEPS};

/// Keys the display reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayKey {
    /// Tune down one scale division
    Left,
    /// Tune up one scale division
    Right,
    /// Zoom in one notch
    Up,
    /// Zoom out one notch
    Down,
    /// Same as the context menu: reset the view
    Escape,
}

/// Input on the spectrum display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DisplayEvent {
    PointerMove { x: f64, y: f64 },
    /// `delta > 0` is away from the user. With `ctrl` the dB scale zooms.
    Wheel { x: f64, y: f64, delta: f64, ctrl: bool },
    Key(DisplayKey),
    DragStart { x: f64, y: f64 },
    DragEnd,
    ContextMenu,
    DoubleClick { x: f64, y: f64 },
    Leave,
}

impl DisplayEvent {
    fn position(&self) -> Option<(f64, f64)> {
        match *self {
            DisplayEvent::PointerMove { x, y }
            | DisplayEvent::Wheel { x, y, .. }
            | DisplayEvent::DragStart { x, y }
            | DisplayEvent::DoubleClick { x, y } => Some((x, y)),
            _ => None,
        }
    }
}

/// What a handled event changed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GestureOutcome {
    /// New tuned frequency, if the gesture moved it
    pub retune: Option<f64>,
    /// Zoom or dB scale changed
    pub view_changed: bool,
}

/// Tracks pointer and drag state between events.
#[derive(Debug, Clone, Default)]
pub struct GestureHandler {
    pointer: Option<(f64, f64)>,
    drag_from: Option<(f64, f64)>,
}

impl GestureHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pointer(&self) -> Option<(f64, f64)> {
        self.pointer
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_from.is_some()
    }

    /// Frequency and level under the pointer, if it is over the display.
    pub fn readout(&self, view: &DisplayMapping) -> Option<Readout> {
        if !view.has_area() {
            return None;
        }
        self.pointer.map(|(x, y)| view.readout(x, y))
    }

    pub fn handle(&mut self, event: DisplayEvent, view: &mut DisplayMapping) -> GestureOutcome {
        let mut outcome = GestureOutcome::default();

        match event {
            DisplayEvent::Leave => {
                self.pointer = None;
                return outcome;
            }
            DisplayEvent::DragEnd => {
                self.drag_from = None;
                return outcome;
            }
            _ => {}
        }
        if !view.has_area() {
            return outcome;
        }
        if let Some(position) = event.position() {
            self.pointer = Some(position);
        }

        match event {
            DisplayEvent::PointerMove { x, y } => {
                if let Some((start_x, start_y)) = self.drag_from {
                    let df = (start_x - x) * view.sample_rate / view.width;
                    let dy = (start_y - y) * (view.db_hi - view.db_lo) / view.height;
                    self.drag_from = Some((x, y));
                    view.shift_db(dy);
                    outcome.view_changed = dy != 0.0;
                    if df != 0.0 {
                        outcome.retune = Some(retune(view, view.center_freq + df));
                    }
                }
            }
            DisplayEvent::Wheel { y, delta, ctrl, .. } => {
                let direction = if delta > 0.0 { 1.0 } else { -1.0 };
                if ctrl {
                    let anchor = view.db_at(y);
                    view.scale_db(direction, anchor);
                } else {
                    view.mapper.wheel(direction);
                }
                outcome.view_changed = true;
            }
            DisplayEvent::Key(key) => match key {
                DisplayKey::Left | DisplayKey::Right => {
                    let (lo, hi) = view.mapper.window();
                    let step = (hi - lo) * view.sample_rate / FREQUENCY_STEPS as f64;
                    let step = if key == DisplayKey::Left { -step } else { step };
                    outcome.retune = Some(retune(view, view.center_freq + step));
                }
                DisplayKey::Up | DisplayKey::Down => {
                    view.mapper
                        .wheel(if key == DisplayKey::Up { 1.0 } else { -1.0 });
                    outcome.view_changed = true;
                }
                DisplayKey::Escape => {
                    view.reset_view();
                    outcome.view_changed = true;
                }
            },
            DisplayEvent::DragStart { x, y } => {
                self.drag_from = Some((x, y));
            }
            DisplayEvent::ContextMenu => {
                view.reset_view();
                outcome.view_changed = true;
            }
            DisplayEvent::DoubleClick { x, .. } => {
                outcome.retune = Some(retune(view, view.frequency_at(x)));
            }
            DisplayEvent::DragEnd | DisplayEvent::Leave => {}
        }
        outcome
    }
}

fn retune(view: &mut DisplayMapping, hz: f64) -> f64 {
    view.center_freq = hz;
    hz
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> DisplayMapping {
        let mut view = DisplayMapping::new(1000.0, 300.0);
        view.center_freq = 100e6;
        view.sample_rate = 2e6;
        view.db_lo = -120.0;
        view.db_hi = 0.0;
        view
    }

    #[test]
    fn test_drag_right_tunes_down() {
        let mut view = view();
        let mut handler = GestureHandler::new();
        handler.handle(DisplayEvent::DragStart { x: 500.0, y: 100.0 }, &mut view);
        let outcome = handler.handle(DisplayEvent::PointerMove { x: 600.0, y: 100.0 }, &mut view);
        // 100 px of a 1000 px, 2 MHz wide display
        assert_eq!(outcome.retune, Some(99.8e6));
        assert_eq!(view.center_freq, 99.8e6);

        handler.handle(DisplayEvent::DragEnd, &mut view);
        let outcome = handler.handle(DisplayEvent::PointerMove { x: 700.0, y: 100.0 }, &mut view);
        assert_eq!(outcome.retune, None);
    }

    #[test]
    fn test_vertical_drag_shifts_db_scale() {
        let mut view = view();
        let mut handler = GestureHandler::new();
        handler.handle(DisplayEvent::DragStart { x: 500.0, y: 100.0 }, &mut view);
        let outcome = handler.handle(DisplayEvent::PointerMove { x: 500.0, y: 130.0 }, &mut view);
        assert!(outcome.view_changed);
        assert_eq!(outcome.retune, None);
        // 30 px of 300 px over a 120 dB span
        assert_eq!((view.db_lo, view.db_hi), (-108.0, 12.0));
    }

    #[test]
    fn test_wheel_zooms_frequency_or_db() {
        let mut view = view();
        let mut handler = GestureHandler::new();
        let wheel = |ctrl| DisplayEvent::Wheel {
            x: 0.0,
            y: 150.0,
            delta: 120.0,
            ctrl,
        };

        handler.handle(wheel(false), &mut view);
        assert!((view.mapper.zoom() - 0.05).abs() < 1e-12);

        handler.handle(wheel(true), &mut view);
        // Anchored at -60 dB, the span shrinks by 5%
        assert!((view.db_hi - view.db_lo - 114.0).abs() < 1e-9);
        assert!((view.db_at(150.0) + 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_context_menu_resets() {
        let mut view = view();
        view.mapper.set_zoom(0.3);
        let mut handler = GestureHandler::new();
        handler.handle(DisplayEvent::ContextMenu, &mut view);
        assert_eq!(view.mapper.zoom(), 0.0);
        assert_eq!((view.db_lo, view.db_hi), (-120.0, 10.0));
    }

    #[test]
    fn test_double_click_retunes_under_cursor() {
        let mut view = view();
        view.mapper.set_zoom(0.25);
        let mut handler = GestureHandler::new();
        let outcome = handler.handle(DisplayEvent::DoubleClick { x: 1000.0, y: 0.0 }, &mut view);
        assert_eq!(outcome.retune, Some(100.5e6));
    }

    #[test]
    fn test_leave_clears_pointer() {
        let mut view = view();
        let mut handler = GestureHandler::new();
        handler.handle(DisplayEvent::PointerMove { x: 250.0, y: 300.0 }, &mut view);
        let readout = handler.readout(&view).unwrap();
        assert_eq!(readout.hz, 99.5e6);
        assert_eq!(readout.level_text(), "-120.0 db");

        handler.handle(DisplayEvent::Leave, &mut view);
        assert!(handler.readout(&view).is_none());
    }

    #[test]
    fn test_keys_step_one_division() {
        let mut view = view();
        let mut handler = GestureHandler::new();
        let outcome = handler.handle(DisplayEvent::Key(DisplayKey::Right), &mut view);
        assert_eq!(outcome.retune, Some(100.2e6));
        handler.handle(DisplayEvent::Key(DisplayKey::Up), &mut view);
        assert!(view.mapper.is_zoomed());
    }

    #[test]
    fn test_zero_size_display_ignores_input() {
        let mut view = view();
        view.resize(0.0, 0.0);
        let mut handler = GestureHandler::new();
        let outcome = handler.handle(DisplayEvent::DoubleClick { x: 10.0, y: 10.0 }, &mut view);
        assert_eq!(outcome, GestureOutcome::default());
    }
}
