pub mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser, ValueEnum};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::Size,
    Terminal,
};
use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin},
    path::PathBuf,
    time::{Duration, Instant},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use webbrowser::Browser;

use skewdle::{
    achievements::Achievement,
    app_dirs::AppDirs,
    article::{ArticleCollection, ArticleError},
    celebration::Celebration,
    config::{Config, ConfigStore, FileConfigStore},
    difficulty::DifficultyTable,
    engine::SessionEngine,
    history::{HistoryEntry, SessionHistory},
    runtime::{CrosstermEventSource, FixedTicker, GameEvent, Runner, SecondClock},
    session::EngineEvent,
    store::{MemoryProgressStore, ProgressStore, SqliteProgressStore},
};

const TICK_RATE_MS: u64 = 100;
const PULSE_MS: u64 = 1000;
const RECENT_HISTORY: usize = 5;

/// spot the false claims hidden in the news before the clock runs out
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A timed reading game: every article hides highlighted claims, some of them false. Catch all the false ones to advance; picking a true one costs you time."
)]
pub struct Cli {
    /// difficulty to play (remembered for next time)
    #[clap(short = 'd', long, value_enum)]
    difficulty: Option<Difficulty>,

    /// built-in article pack to play (remembered for next time)
    #[clap(short = 'p', long, value_parser = embedded_pack)]
    pack: Option<String>,

    /// play the articles in this JSON file instead of a built-in pack
    #[clap(short = 'a', long, conflicts_with = "pack")]
    articles: Option<PathBuf>,

    /// keep progress in memory only and write no history
    #[clap(long)]
    ephemeral: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, ValueEnum, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

fn embedded_pack(name: &str) -> Result<String, String> {
    let mut names = ArticleCollection::embedded_names();
    if names.iter().any(|n| n == name) {
        return Ok(name.to_string());
    }
    names.sort();
    Err(format!("expected one of: {}", names.join(", ")))
}

impl Cli {
    /// Flags given on the command line win over remembered preferences
    fn merge(&self, mut config: Config) -> Config {
        if let Some(difficulty) = self.difficulty {
            config.difficulty = difficulty.to_string();
        }
        if let Some(pack) = &self.pack {
            config.pack = pack.clone();
        }
        config
    }

    fn load_articles(&self, config: &Config) -> Result<ArticleCollection, ArticleError> {
        if let Some(path) = &self.articles {
            return ArticleCollection::from_path(path);
        }
        ArticleCollection::embedded(&config.pack).or_else(|e| {
            warn!(error = %e, "falling back to the default pack");
            ArticleCollection::embedded(&Config::default().pack)
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppState {
    Menu,
    Playing,
    GameOver,
    Stats,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Red flash after a wrong selection
#[derive(Debug, Clone, Copy)]
pub struct Pulse {
    pub until: Instant,
    pub penalty_secs: u32,
}

pub struct App {
    pub engine: SessionEngine,
    pub state: AppState,
    /// Index into the selectable spans of the current level
    pub cursor: usize,
    pub pulse: Option<Pulse>,
    pub celebration: Celebration,
    pub new_unlocks: Vec<Achievement>,
    pub new_high_score: bool,
    pub pack: String,
    pub recent: Vec<HistoryEntry>,
    pub history: Option<SessionHistory>,
    pub config: Config,
    pub config_store: Option<FileConfigStore>,
    pub viewport: Size,
    stats_return: AppState,
    clock: SecondClock,
    last_tick: Instant,
}

impl App {
    pub fn new(engine: SessionEngine, pack: impl Into<String>) -> Self {
        let config = Config {
            difficulty: engine.profile().name.clone(),
            ..Config::default()
        };
        Self {
            engine,
            state: AppState::Menu,
            cursor: 0,
            pulse: None,
            celebration: Celebration::new(),
            new_unlocks: Vec::new(),
            new_high_score: false,
            pack: pack.into(),
            recent: Vec::new(),
            history: None,
            config,
            config_store: None,
            viewport: Size::new(80, 24),
            stats_return: AppState::Menu,
            clock: SecondClock::default(),
            last_tick: Instant::now(),
        }
    }

    pub fn is_pulsing(&self) -> bool {
        self.pulse.is_some_and(|p| Instant::now() < p.until)
    }

    pub fn on_key(&mut self, key: KeyEvent) -> Flow {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Flow::Quit;
        }

        match self.state {
            AppState::Menu => match key.code {
                KeyCode::Esc | KeyCode::Char('q') => return Flow::Quit,
                KeyCode::Left | KeyCode::Up => self.cycle_difficulty(-1),
                KeyCode::Right | KeyCode::Down => self.cycle_difficulty(1),
                KeyCode::Char(c @ '1'..='9') => self.pick_difficulty(c as usize - '1' as usize),
                KeyCode::Enter | KeyCode::Char(' ') => self.start(),
                KeyCode::Char('s') => self.show_stats(),
                _ => {}
            },
            AppState::Playing => match key.code {
                KeyCode::Esc => self.engine.end(),
                KeyCode::Left | KeyCode::Up | KeyCode::BackTab => self.move_cursor(-1),
                KeyCode::Right | KeyCode::Down | KeyCode::Tab => self.move_cursor(1),
                KeyCode::Enter | KeyCode::Char(' ') => self.select_focused(),
                _ => {}
            },
            AppState::GameOver => match key.code {
                KeyCode::Esc | KeyCode::Char('q') => return Flow::Quit,
                KeyCode::Char('r') => self.start(),
                KeyCode::Char('m') => self.back_to_menu(),
                KeyCode::Char('s') => self.show_stats(),
                KeyCode::Char('o') => self.open_source(),
                _ => {}
            },
            AppState::Stats => match key.code {
                KeyCode::Esc | KeyCode::Char('b') | KeyCode::Backspace => {
                    self.state = self.stats_return;
                }
                _ => {}
            },
        }

        self.drain_events();
        Flow::Continue
    }

    /// Feeds elapsed wall-clock time to the engine and expires the pulse
    pub fn on_tick(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_tick);
        self.last_tick = now;

        if self.state == AppState::Playing {
            for _ in 0..self.clock.advance(elapsed) {
                self.engine.tick();
            }
        }
        if self.pulse.is_some_and(|p| now >= p.until) {
            self.pulse = None;
        }
        self.celebration.update(elapsed.as_secs_f64());

        self.drain_events();
    }

    fn cycle_difficulty(&mut self, delta: isize) {
        let profiles = self.engine.difficulties().profiles();
        let len = profiles.len() as isize;
        let current = profiles
            .iter()
            .position(|p| p.name == self.engine.profile().name)
            .unwrap_or(0) as isize;
        self.pick_difficulty((current + delta).rem_euclid(len) as usize);
    }

    fn pick_difficulty(&mut self, index: usize) {
        let Some(name) = self
            .engine
            .difficulties()
            .profiles()
            .get(index)
            .map(|p| p.name.clone())
        else {
            return;
        };
        if let Err(e) = self.engine.configure(&name) {
            warn!(error = %e, "could not change difficulty");
        }
    }

    fn start(&mut self) {
        self.engine.start();
        self.state = AppState::Playing;
        self.cursor = 0;
        self.pulse = None;
        self.celebration.stop();
        self.new_unlocks.clear();
        self.new_high_score = false;
        self.clock.reset();
        self.last_tick = Instant::now();
        self.remember_difficulty();
    }

    fn remember_difficulty(&mut self) {
        let difficulty = &self.engine.profile().name;
        if self.config.difficulty == *difficulty {
            return;
        }
        self.config.difficulty = difficulty.clone();
        if let Some(store) = &self.config_store {
            if let Err(e) = store.save(&self.config) {
                warn!(error = %e, "failed to save config");
            }
        }
    }

    fn move_cursor(&mut self, delta: isize) {
        let len = self.engine.state().selectable_ids().len() as isize;
        if len == 0 {
            return;
        }
        self.cursor = (self.cursor as isize + delta).rem_euclid(len) as usize;
    }

    fn select_focused(&mut self) {
        if let Some(id) = self.engine.state().selectable_ids().get(self.cursor) {
            self.engine.select_span(*id);
        }
    }

    fn back_to_menu(&mut self) {
        self.engine.reset();
        self.state = AppState::Menu;
        self.celebration.stop();
    }

    fn show_stats(&mut self) {
        self.stats_return = self.state;
        self.state = AppState::Stats;
        self.recent = match &self.history {
            Some(history) => match history.entries() {
                Ok(entries) => entries.into_iter().rev().take(RECENT_HISTORY).collect(),
                Err(e) => {
                    warn!(error = %e, "failed to read session history");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };
    }

    fn open_source(&self) {
        let Some(link) = &self.engine.current_article().link else {
            return;
        };
        if Browser::is_available() {
            if let Err(e) = webbrowser::open(link) {
                warn!(error = %e, link = %link, "failed to open browser");
            }
        }
    }

    fn drain_events(&mut self) {
        for event in self.engine.take_events() {
            match event {
                EngineEvent::Correct { .. } => {}
                EngineEvent::WrongSelection { penalty_secs, .. } => {
                    self.pulse = Some(Pulse {
                        until: Instant::now() + Duration::from_millis(PULSE_MS),
                        penalty_secs,
                    });
                }
                EngineEvent::LevelAdvanced { .. } => self.cursor = 0,
                EngineEvent::AchievementUnlocked(achievement) => self.new_unlocks.push(achievement),
                EngineEvent::SessionEnded { new_high_score, .. } => {
                    self.new_high_score = new_high_score;
                    self.finish_session();
                }
            }
        }
    }

    fn finish_session(&mut self) {
        self.state = AppState::GameOver;
        self.pulse = None;

        if self.new_high_score || !self.new_unlocks.is_empty() {
            self.celebration
                .start(self.viewport.width, self.viewport.height, self.new_high_score);
        }

        let Some(history) = &self.history else {
            return;
        };
        if let Some(entry) =
            HistoryEntry::from_state(self.engine.state(), &self.engine.profile().name, &self.pack)
        {
            if let Err(e) = history.append(&entry) {
                warn!(error = %e, "failed to append session history");
            }
        }
    }
}

/// Logs go to a file; the terminal belongs to the UI
fn init_logging() {
    let Some(path) = AppDirs::log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };

    let filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .with_env_var("SKEWDLE_LOG")
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_ansi(false)
        .with_writer(file)
        .init();
}

fn open_store(ephemeral: bool) -> Box<dyn ProgressStore> {
    if ephemeral {
        return Box::new(MemoryProgressStore::default());
    }
    let Some(path) = AppDirs::progress_db_path() else {
        warn!("no state directory, progress will not be kept");
        return Box::new(MemoryProgressStore::default());
    };
    match SqliteProgressStore::open(&path) {
        Ok(store) => Box::new(store),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to open progress db, progress will not be kept");
            Box::new(MemoryProgressStore::default())
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    init_logging();

    let config_store = FileConfigStore::new();
    let config = cli.merge(config_store.load());
    let collection = cli.load_articles(&config)?;
    info!(pack = %collection.name, articles = collection.articles.len(), "articles loaded");

    let mut engine = SessionEngine::new(
        collection.articles,
        DifficultyTable::default(),
        open_store(cli.ephemeral),
    )?;
    if let Err(e) = engine.configure(&config.difficulty) {
        warn!(error = %e, "ignoring remembered difficulty");
    }
    if let Err(e) = config_store.save(&config) {
        warn!(error = %e, "failed to save config");
    }

    let mut app = App::new(engine, collection.name);
    app.config = config;
    app.config_store = Some(config_store);
    if !cli.ephemeral {
        app.history = AppDirs::history_path().map(SessionHistory::new);
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    loop {
        app.viewport = terminal.size().unwrap_or_default();
        terminal.draw(|f| ui::draw(app, f))?;

        match runner.step() {
            GameEvent::Key(key) => {
                if app.on_key(key) == Flow::Quit {
                    break;
                }
            }
            GameEvent::Resize | GameEvent::Tick => {}
        }
        app.on_tick(Instant::now());
    }

    Ok(())
}
