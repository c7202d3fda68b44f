use ratatui::Frame;

use crate::{ui::render_progress, App, AppState};

/// A UI Screen boundary: responsible for rendering
pub trait Screen {
    fn render(&self, app: &App, f: &mut Frame);
}

/// Session timer - renders via the App widget
pub struct TimerScreen;

impl Screen for TimerScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        f.render_widget(app, f.area());
    }
}

/// Calendar, streak and trend overview
pub struct ProgressScreen;

impl Screen for ProgressScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        render_progress(app, f);
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(state: &AppState) -> Box<dyn Screen> {
    match state {
        AppState::Timer => Box::new(TimerScreen),
        AppState::Progress => Box::new(ProgressScreen),
    }
}
