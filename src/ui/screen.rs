use ratatui::Frame;

use crate::{
    ui::{render_menu, stats::render_stats},
    App, AppState,
};

/// A UI Screen boundary: responsible for rendering one app state
pub trait Screen {
    fn render(&self, app: &App, f: &mut Frame);
}

/// Difficulty picker shown before a session
pub struct MenuScreen;

impl Screen for MenuScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        render_menu(app, f.area(), f.buffer_mut());
    }
}

/// Article being played - renders the App widget
pub struct PlayingScreen;

impl Screen for PlayingScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        f.render_widget(app, f.area());
    }
}

/// Final score, unlocks and share line - renders the App widget
pub struct GameOverScreen;

impl Screen for GameOverScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        f.render_widget(app, f.area());
    }
}

pub struct StatsScreen;

impl Screen for StatsScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        render_stats(app, f);
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(state: &AppState) -> Box<dyn Screen> {
    match state {
        AppState::Menu => Box::new(MenuScreen),
        AppState::Playing => Box::new(PlayingScreen),
        AppState::GameOver => Box::new(GameOverScreen),
        AppState::Stats => Box::new(StatsScreen),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};
    use skewdle::{
        article::Article, difficulty::DifficultyTable, engine::SessionEngine,
        store::MemoryProgressStore,
    };

    fn app() -> App {
        let article = Article {
            id: 1,
            title: "Markets wrap".to_string(),
            text: "Stocks [soared] as (oil slipped).".to_string(),
            category: "Markets".to_string(),
            link: None,
        };
        let engine = SessionEngine::new(
            vec![article],
            DifficultyTable::default(),
            Box::new(MemoryProgressStore::default()),
        )
        .unwrap();
        App::new(engine, "headlines")
    }

    fn screen_text(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(90, 30)).unwrap();
        terminal.draw(|f| crate::ui::draw(app, f)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn every_state_has_a_screen() {
        let mut app = app();
        for (state, expected) in [
            (AppState::Menu, "SKEWDLE"),
            (AppState::Playing, "Markets wrap"),
            (AppState::Stats, "Achievements"),
        ] {
            app.state = state;
            assert!(
                screen_text(&app).contains(expected),
                "{state:?} should show {expected}"
            );
        }
    }

    #[test]
    fn game_over_screen_uses_the_app_widget() {
        let mut app = app();
        app.engine.start();
        app.engine.end();
        app.state = AppState::GameOver;
        assert!(screen_text(&app).contains("Game over"));
    }
}
