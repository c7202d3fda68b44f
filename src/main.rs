pub mod ui;

use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    str::FromStr,
    sync::{Arc, Mutex},
};

use chrono::{Datelike, Local, NaiveDate};
use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use serde::Serialize;

use nourish::{
    aggregate::{
        bucket_range, compute_streak, last_days, meal_distribution, windowed_trend, TrendPoint,
    },
    calendar::{shift_month, CalendarMonth, HeatThresholds},
    config::{Config, ConfigStore, FileConfigStore},
    import::load_records,
    record::{ParsedRecords, Record},
    runtime::{AppEvent, AppEventSource, CrosstermEventSource, FixedTicker, Runner, Ticker},
    session::{
        grounding_steps, meal_support_phases, meal_support_prompts, practice_session, Preset,
        MAX_PHASE_MINUTES, MEAL_KEY, POST_MEAL_KEY,
    },
    time_series::TrendOverview,
    timer::{SessionTimer, TimerStatus},
    util::format_clock,
};

use crate::ui::{report, screen::current_screen};

const TREND_WINDOWS: [usize; 3] = [7, 14, 30];

/// gentle self-tracking with calendar heatmaps, trends, streaks and a guided meal-support timer
#[derive(Parser, Debug, Clone)]
#[clap(version, about)]
pub struct Cli {
    /// records file to read (.csv for CSV, anything else is read as JSON)
    #[clap(long, global = true)]
    file: Option<PathBuf>,

    /// config file to use instead of the per-user one
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// month grid of daily check-ins
    Calendar {
        /// month to show, e.g. 2024-02 (defaults to the current month)
        #[clap(long)]
        month: Option<YearMonth>,
    },
    /// mood and urge over the last active days
    Trend {
        /// number of most recent days with data to include
        #[clap(short = 'w', long)]
        window: Option<usize>,

        /// print machine-readable JSON
        #[clap(long)]
        json: bool,
    },
    /// consecutive days with at least one check-in
    Streak {
        /// day to count back from (defaults to today)
        #[clap(long)]
        today: Option<NaiveDate>,
    },
    /// last 7 days, meal distribution and streak
    Summary {
        /// last day of the week shown (defaults to today)
        #[clap(long)]
        today: Option<NaiveDate>,
    },
    /// guided meal-support timer
    Timer {
        /// minutes for the meal phase
        #[clap(long, value_parser = clap::value_parser!(u32).range(1..=MAX_PHASE_MINUTES as i64))]
        meal: Option<u32>,

        /// minutes for the post-meal phase
        #[clap(long, value_parser = clap::value_parser!(u32).range(1..=MAX_PHASE_MINUTES as i64))]
        post: Option<u32>,

        /// meal + post-meal preset
        #[clap(long, value_enum)]
        preset: Option<Preset>,

        /// run the one-minute grounding practice instead
        #[clap(long, conflicts_with_all = ["meal", "post", "preset"])]
        practice: bool,

        /// remember the phase durations for next time
        #[clap(long)]
        save: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl FromStr for YearMonth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("expected YYYY-MM, got {s:?}");
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year = year.parse().map_err(|_| invalid())?;
        let month = month.parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&month) {
            return Err(invalid());
        }
        Ok(Self { year, month })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppState {
    Timer,
    Progress,
}

pub struct App {
    pub title: String,
    pub timer: SessionTimer,
    pub finished: Arc<Mutex<Option<u32>>>,
    pub records: Vec<Record>,
    pub invalid_records: usize,
    pub today: NaiveDate,
    pub view_month: (i32, u32),
    pub trend_window: usize,
    pub thresholds: HeatThresholds,
    pub state: AppState,
}

impl App {
    pub fn new(
        title: impl Into<String>,
        timer: SessionTimer,
        parsed: ParsedRecords,
        cfg: &Config,
        today: NaiveDate,
    ) -> Self {
        let finished = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&finished);
        let timer = timer.on_complete(move |total| {
            if let Ok(mut slot) = sink.lock() {
                *slot = Some(total);
            }
        });

        Self {
            title: title.into(),
            timer,
            finished,
            records: parsed.records,
            invalid_records: parsed.invalid,
            today,
            view_month: (today.year(), today.month()),
            trend_window: cfg.trend_window_days,
            thresholds: cfg.heat_thresholds,
            state: AppState::Timer,
        }
    }

    pub fn finished_secs(&self) -> Option<u32> {
        self.finished.lock().ok().and_then(|slot| *slot)
    }

    fn cycle_trend_window(&mut self) {
        let next = TREND_WINDOWS
            .iter()
            .position(|w| *w == self.trend_window)
            .map_or(0, |i| (i + 1) % TREND_WINDOWS.len());
        self.trend_window = TREND_WINDOWS[next];
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let store = match &cli.config {
        Some(path) => FileConfigStore::with_path(path),
        None => FileConfigStore::new(),
    };
    let mut cfg = store.load();
    let parsed = read_records(&cli, &cfg)?;
    let local_today = Local::now().date_naive();

    match cli.command.clone().unwrap_or(Command::Summary { today: None }) {
        Command::Calendar { month } => {
            let (year, month) = month.map_or((local_today.year(), local_today.month()), |m| {
                (m.year, m.month)
            });
            let cal = CalendarMonth::build(year, month, &parsed.records)?;
            print!(
                "{}",
                report::render_calendar(&cal, &cfg.heat_thresholds, Some(local_today))
            );
        }
        Command::Trend { window, json } => {
            let window = window.unwrap_or(cfg.trend_window_days);
            let points = windowed_trend(&parsed.records, window);
            let overview = TrendOverview::from_points(&points);
            if json {
                let out = TrendReport {
                    window,
                    points: &points,
                    overview,
                };
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                print!("{}", report::render_trend(&points, &overview));
            }
        }
        Command::Streak { today } => {
            let streak = compute_streak(&parsed.records, today.unwrap_or(local_today));
            print!("{}", report::render_streak(streak));
        }
        Command::Summary { today } => {
            let today = today.unwrap_or(local_today);
            let buckets = bucket_range(&parsed.records, last_days(today, 7));
            let meals = meal_distribution(&buckets);
            let streak = compute_streak(&parsed.records, today);
            print!("{}", report::render_summary(&buckets, &meals, streak));
        }
        Command::Timer {
            meal,
            post,
            preset,
            practice,
            save,
        } => {
            if !stdin().is_tty() {
                let mut cmd = Cli::command();
                cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
            }

            let (title, phases, prompts) = if practice {
                let (phases, prompts) = practice_session(grounding_steps());
                ("nourish · grounding practice", phases, prompts)
            } else {
                let preset = preset.map(|p| p.minutes());
                let meal = meal
                    .or(preset.map(|(m, _)| m))
                    .unwrap_or(cfg.meal_minutes);
                let post = post
                    .or(preset.map(|(_, p)| p))
                    .unwrap_or(cfg.post_meal_minutes);
                (
                    "nourish · meal support",
                    meal_support_phases(meal, post),
                    meal_support_prompts(),
                )
            };
            let timer = SessionTimer::new(phases, prompts)?;
            let mut app = App::new(title, timer, parsed, &cfg, local_today);

            run_tui(&mut app)?;

            match (app.timer.status(), app.finished_secs()) {
                (TimerStatus::Completed, Some(total)) => {
                    println!("Session complete. Total time {}", format_clock(total))
                }
                (TimerStatus::Cancelled, _) => println!("Session cancelled."),
                _ => {}
            }

            if save && !practice {
                for phase in app.timer.phases() {
                    match phase.key.as_str() {
                        MEAL_KEY => cfg.meal_minutes = phase.minutes,
                        POST_MEAL_KEY => cfg.post_meal_minutes = phase.minutes,
                        _ => {}
                    }
                }
                store.save(&cfg)?;
                log::info!(
                    "saved durations {}+{} min",
                    cfg.meal_minutes,
                    cfg.post_meal_minutes
                );
            }
        }
    }

    Ok(())
}

#[derive(Serialize)]
struct TrendReport<'a> {
    window: usize,
    points: &'a [TrendPoint],
    overview: TrendOverview,
}

fn read_records(cli: &Cli, cfg: &Config) -> Result<ParsedRecords, Box<dyn Error>> {
    match cli.file.clone().or_else(|| cfg.resolve_records_path()) {
        Some(path) => {
            log::debug!("reading records from {}", path.display());
            Ok(load_records(&path)?)
        }
        None => {
            log::warn!("no records file could be located");
            Ok(ParsedRecords::default())
        }
    }
}

fn run_tui(app: &mut App) -> Result<(), Box<dyn Error>> {
    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn draw(app: &App, f: &mut Frame) {
    current_screen(&app.state).render(app, f);
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let mut runner = Runner::new(CrosstermEventSource::new(), FixedTicker::every_second());

    terminal.draw(|f| draw(app, f))?;

    loop {
        let event = runner.step();
        match apply_event(app, event, &mut runner)? {
            Some(true) => {
                terminal.draw(|f| draw(app, f))?;
            }
            Some(false) => {}
            None => break,
        }
    }

    Ok(())
}

/// Applies one runtime event. `None` means the app should exit, otherwise
/// whether the screen needs redrawing.
fn apply_event<E, T>(
    app: &mut App,
    event: AppEvent,
    runner: &mut Runner<E, T>,
) -> Result<Option<bool>, Box<dyn Error>>
where
    E: AppEventSource,
    T: Ticker,
{
    match event {
        AppEvent::Tick => Ok(Some(app.timer.tick())),
        AppEvent::Resize => Ok(Some(true)),
        AppEvent::Key(key) => Ok(handle_key(app, key, runner)?.then_some(true)),
        AppEvent::Closed => {
            log::warn!("terminal input closed, leaving the timer");
            end_session(app);
            Ok(None)
        }
    }
}

fn end_session(app: &mut App) {
    if !app.timer.status().is_terminal() {
        app.timer.cancel();
    }
}

/// Returns false when the app should exit.
fn handle_key<E, T>(
    app: &mut App,
    key: KeyEvent,
    runner: &mut Runner<E, T>,
) -> Result<bool, Box<dyn Error>>
where
    E: AppEventSource,
    T: Ticker,
{
    let quit = matches!(key.code, KeyCode::Esc | KeyCode::Char('q'))
        || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'));
    if quit {
        end_session(app);
        return Ok(false);
    }

    match app.state {
        AppState::Timer => match key.code {
            KeyCode::Char(' ') => {
                if app.timer.toggle() && app.timer.state().is_running() {
                    runner.rearm();
                }
            }
            KeyCode::Char('s') => {
                app.timer.skip();
            }
            KeyCode::Char('r') => {
                app.timer.reset();
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                app.timer.adjust_active_minutes(1)?;
            }
            KeyCode::Char('-') => {
                app.timer.adjust_active_minutes(-1)?;
            }
            KeyCode::Tab => app.state = AppState::Progress,
            _ => {}
        },
        AppState::Progress => match key.code {
            KeyCode::Left => {
                let (y, m) = app.view_month;
                app.view_month = shift_month(y, m, -1);
            }
            KeyCode::Right => {
                let (y, m) = app.view_month;
                app.view_month = shift_month(y, m, 1);
            }
            KeyCode::Char('w') => app.cycle_trend_window(),
            KeyCode::Tab | KeyCode::Backspace => app.state = AppState::Timer,
            _ => {}
        },
    }

    Ok(true)
}
