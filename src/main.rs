pub mod app_dirs;
pub mod capture;
pub mod email;
pub mod practice;
pub mod report;
pub mod runtime;
pub mod session;
pub mod stats;
pub mod store;
pub mod toggles;
pub mod ui;

use crate::{
    app_dirs::AppDirs,
    capture::source::{NdjsonCommandSink, NdjsonEventSource},
    capture::CaptureMachine,
    email::{EmailError, EmailSettings, Mailer},
    practice::Drill,
    report::RangeFilter,
    runtime::{AppEvent, EventPump},
    session::Session,
    stats::{session_aggregate, PracticeStats, SessionAggregate},
    store::Store,
    toggles::VisibilityToggles,
};
use chrono::{Local, Utc};
use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand, ValueEnum};
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
use std::{
    error::Error,
    fs::File,
    io::{self, stdin, BufReader},
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use webbrowser::Browser;

const TICK_RATE_MS: u64 = 100;
const BANNER_SHORT_SECS: u64 = 3;
const BANNER_LONG_SECS: u64 = 5;

/// terminal typing tracker with captured sessions, drills and emailed reports
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal typing tracker that records practice sessions streamed from a browser shim, keeps drill statistics, and mails out summary reports."
)]
pub struct Cli {
    /// path to the database file (defaults to the user state directory)
    #[clap(long)]
    db: Option<PathBuf>,

    /// screen to open on startup
    #[clap(short = 's', long, value_enum, default_value_t = Screen::Home)]
    start_screen: Screen,

    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// record sessions from a newline-delimited JSON stream of page events
    Capture {
        /// event file to read, or - for stdin
        input: String,
    },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum, strum_macros::Display)]
pub enum Screen {
    Home,
    Practice,
    #[strum(serialize = "Practice Stats")]
    PracticeStats,
    History,
    Report,
    #[strum(serialize = "Email Settings")]
    Email,
}

pub const HOME_ENTRIES: [(Screen, &str); 5] = [
    (Screen::Practice, "Practice typing"),
    (Screen::PracticeStats, "Practice stats"),
    (Screen::History, "Session history"),
    (Screen::Report, "Report"),
    (Screen::Email, "Email settings"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailField {
    From,
    To,
    PublicKey,
    ServiceId,
    TemplateId,
}

impl EmailField {
    pub const ALL: [EmailField; 5] = [
        EmailField::From,
        EmailField::To,
        EmailField::PublicKey,
        EmailField::ServiceId,
        EmailField::TemplateId,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            EmailField::From => "From email",
            EmailField::To => "To email",
            EmailField::PublicKey => "EmailJS public key",
            EmailField::ServiceId => "EmailJS service ID",
            EmailField::TemplateId => "EmailJS template ID",
        }
    }

    fn next(self) -> Self {
        match self {
            EmailField::From => EmailField::To,
            EmailField::To => EmailField::PublicKey,
            EmailField::PublicKey => EmailField::ServiceId,
            EmailField::ServiceId => EmailField::TemplateId,
            EmailField::TemplateId => EmailField::From,
        }
    }

    fn prev(self) -> Self {
        match self {
            EmailField::From => EmailField::TemplateId,
            EmailField::To => EmailField::From,
            EmailField::PublicKey => EmailField::To,
            EmailField::ServiceId => EmailField::PublicKey,
            EmailField::TemplateId => EmailField::ServiceId,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingConfirm {
    ClearSessions,
    ClearPractice,
}

#[derive(Debug, Clone)]
pub struct Banner {
    pub text: String,
    pub until: Instant,
}

#[derive(Debug, PartialEq, Eq)]
pub enum KeyOutcome {
    Continue,
    Quit,
}

pub struct App {
    pub screen: Screen,
    pub store: Store,
    pub prompts: Vec<String>,
    pub drill: Drill,
    pub practice_stats: PracticeStats,
    pub sessions: Vec<Session>,
    pub aggregate: SessionAggregate,
    pub history_scroll: usize,
    pub range: RangeFilter,
    pub report_aggregate: SessionAggregate,
    pub report_counts: Vec<(String, u64)>,
    pub email_settings: EmailSettings,
    pub email_field: EmailField,
    pub banner: Option<Banner>,
    pub confirm: Option<PendingConfirm>,
    pub home_index: usize,
}

impl App {
    pub fn new(store: Store, prompts: Vec<String>, start: Screen) -> Self {
        let practice_stats = practice::load_stats(&store);
        let email_settings = email::load_settings(&store);
        let drill = Drill::random(&prompts);

        let mut app = Self {
            screen: Screen::Home,
            store,
            prompts,
            drill,
            practice_stats,
            sessions: Vec::new(),
            aggregate: SessionAggregate::default(),
            history_scroll: 0,
            range: RangeFilter::default(),
            report_aggregate: SessionAggregate::default(),
            report_counts: Vec::new(),
            email_settings,
            email_field: EmailField::From,
            banner: None,
            confirm: None,
            home_index: 0,
        };
        app.enter(start);
        app
    }

    /// Switch screens, refreshing whatever the target shows.
    pub fn enter(&mut self, screen: Screen) {
        match screen {
            Screen::Practice => {
                if self.drill.has_finished() {
                    self.drill = Drill::random(&self.prompts);
                }
            }
            Screen::PracticeStats => {
                self.practice_stats = practice::load_stats(&self.store);
            }
            Screen::History => {
                self.history_scroll = 0;
                self.refresh_sessions();
            }
            Screen::Report => {
                self.refresh_sessions();
                self.refresh_report();
            }
            Screen::Email => {
                self.email_settings = email::load_settings(&self.store);
                self.email_field = EmailField::From;
            }
            Screen::Home => {}
        }
        self.screen = screen;
    }

    pub fn set_banner(&mut self, text: String, secs: u64) {
        self.banner = Some(Banner {
            text,
            until: Instant::now() + Duration::from_secs(secs),
        });
    }

    pub fn banner_text(&self) -> Option<&str> {
        self.banner.as_ref().map(|banner| banner.text.as_str())
    }

    pub fn confirm_message(&self) -> Option<&'static str> {
        self.confirm.map(|confirm| match confirm {
            PendingConfirm::ClearSessions => {
                "Are you sure you want to delete all typing session history? \
                 This cannot be undone. (y/N)"
            }
            PendingConfirm::ClearPractice => {
                "Are you sure you want to clear all typing statistics? (y/N)"
            }
        })
    }

    pub fn email_field_value(&self, field: EmailField) -> &str {
        match field {
            EmailField::From => &self.email_settings.email_from,
            EmailField::To => &self.email_settings.email_to,
            EmailField::PublicKey => &self.email_settings.emailjs_public_key,
            EmailField::ServiceId => &self.email_settings.emailjs_service_id,
            EmailField::TemplateId => &self.email_settings.emailjs_template_id,
        }
    }

    /// Returns true when the screen needs a redraw.
    pub fn on_tick(&mut self) -> bool {
        let banner_expired = self
            .banner
            .as_ref()
            .map_or(false, |banner| Instant::now() >= banner.until);
        if banner_expired {
            self.banner = None;
        }
        let timer_running = self.screen == Screen::Practice
            && self.drill.has_started()
            && !self.drill.has_finished();
        banner_expired || timer_running
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> KeyOutcome {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return KeyOutcome::Quit;
        }
        if let Some(confirm) = self.confirm {
            self.handle_confirm_key(confirm, key);
            return KeyOutcome::Continue;
        }
        match self.screen {
            Screen::Home => self.handle_home_key(key),
            Screen::Practice => {
                self.handle_practice_key(key);
                KeyOutcome::Continue
            }
            Screen::PracticeStats => {
                self.handle_practice_stats_key(key);
                KeyOutcome::Continue
            }
            Screen::History => {
                self.handle_history_key(key);
                KeyOutcome::Continue
            }
            Screen::Report => {
                self.handle_report_key(key);
                KeyOutcome::Continue
            }
            Screen::Email => {
                self.handle_email_key(key);
                KeyOutcome::Continue
            }
        }
    }

    fn handle_confirm_key(&mut self, confirm: PendingConfirm, key: KeyEvent) {
        self.confirm = None;
        if !matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y')) {
            return;
        }
        match confirm {
            PendingConfirm::ClearSessions => match self.store.clear_sessions() {
                Ok(()) => {
                    self.refresh_sessions();
                    self.set_banner("All sessions cleared".to_string(), BANNER_SHORT_SECS);
                }
                Err(err) => {
                    warn!(%err, "could not clear sessions");
                    self.set_banner(
                        format!("Could not clear sessions: {err}"),
                        BANNER_LONG_SECS,
                    );
                }
            },
            PendingConfirm::ClearPractice => {
                practice::clear_stats(&self.store);
                self.practice_stats = PracticeStats::default();
                self.set_banner("Practice stats cleared".to_string(), BANNER_SHORT_SECS);
            }
        }
    }

    fn handle_home_key(&mut self, key: KeyEvent) -> KeyOutcome {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return KeyOutcome::Quit,
            KeyCode::Up | KeyCode::Char('k') => {
                self.home_index = self.home_index.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.home_index + 1 < HOME_ENTRIES.len() {
                    self.home_index += 1;
                }
            }
            KeyCode::Enter => {
                self.enter(HOME_ENTRIES[self.home_index].0);
            }
            KeyCode::Char(c @ '1'..='5') => {
                let index = (c as usize) - ('1' as usize);
                self.home_index = index;
                self.enter(HOME_ENTRIES[index].0);
            }
            _ => {}
        }
        KeyOutcome::Continue
    }

    fn handle_practice_key(&mut self, key: KeyEvent) {
        if self.drill.has_finished() {
            match key.code {
                KeyCode::Esc | KeyCode::Char('h') => self.enter(Screen::Home),
                KeyCode::Char('r') => self.drill.restart(),
                KeyCode::Char('n') => {
                    self.drill = Drill::different(&self.prompts, &self.drill.prompt);
                }
                KeyCode::Char('s') => self.enter(Screen::PracticeStats),
                _ => {}
            }
            return;
        }
        match key.code {
            KeyCode::Esc => self.enter(Screen::Home),
            KeyCode::Backspace => self.drill.backspace(),
            KeyCode::Char(c) => {
                self.drill.write(c);
                if self.drill.has_finished() {
                    self.finish_drill();
                }
            }
            _ => {}
        }
    }

    fn finish_drill(&mut self) {
        if let Some(result) = self.drill.finish_result() {
            info!(wpm = result.wpm, accuracy = result.accuracy, "drill finished");
            self.practice_stats = practice::save_result(&self.store, result);
        }
    }

    fn handle_practice_stats_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Char('b') => self.enter(Screen::Home),
            KeyCode::Char('p') => self.enter(Screen::Practice),
            KeyCode::Char('c') => self.confirm = Some(PendingConfirm::ClearPractice),
            _ => {}
        }
    }

    fn handle_history_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.enter(Screen::Home),
            KeyCode::Up => self.history_scroll = self.history_scroll.saturating_sub(1),
            KeyCode::Down => {
                if self.history_scroll + 1 < self.sessions.len() {
                    self.history_scroll += 1;
                }
            }
            KeyCode::Char('r') => self.refresh_sessions(),
            KeyCode::Char('e') => self.send_email(),
            KeyCode::Char('c') => self.confirm = Some(PendingConfirm::ClearSessions),
            KeyCode::Char('d') => self.open_dashboard(),
            _ => {}
        }
    }

    fn handle_report_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.enter(Screen::Home),
            KeyCode::Char('f') => {
                self.range = self.range.cycle();
                self.refresh_report();
            }
            KeyCode::Char('e') => self.export_report(),
            KeyCode::Char('r') => {
                self.refresh_sessions();
                self.refresh_report();
            }
            _ => {}
        }
    }

    fn handle_email_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.enter(Screen::Home),
            KeyCode::Up | KeyCode::BackTab => self.email_field = self.email_field.prev(),
            KeyCode::Down | KeyCode::Tab => self.email_field = self.email_field.next(),
            KeyCode::Enter => self.save_email_settings(),
            KeyCode::Backspace => {
                self.email_field_value_mut().pop();
            }
            KeyCode::Char(c) => self.email_field_value_mut().push(c),
            _ => {}
        }
    }

    fn email_field_value_mut(&mut self) -> &mut String {
        match self.email_field {
            EmailField::From => &mut self.email_settings.email_from,
            EmailField::To => &mut self.email_settings.email_to,
            EmailField::PublicKey => &mut self.email_settings.emailjs_public_key,
            EmailField::ServiceId => &mut self.email_settings.emailjs_service_id,
            EmailField::TemplateId => &mut self.email_settings.emailjs_template_id,
        }
    }

    fn save_email_settings(&mut self) {
        match email::save_settings(&self.store, &self.email_settings) {
            Ok(()) => self.set_banner("Email settings saved!".to_string(), BANNER_SHORT_SECS),
            Err(err) => {
                warn!(%err, "could not save email settings");
                self.set_banner(format!("Could not save settings: {err}"), BANNER_LONG_SECS);
            }
        }
    }

    fn refresh_sessions(&mut self) {
        match self.store.sessions() {
            Ok(sessions) => {
                self.aggregate = session_aggregate(&sessions);
                self.sessions = sessions;
            }
            Err(err) => {
                warn!(%err, "could not load sessions");
                self.set_banner(format!("Could not load sessions: {err}"), BANNER_LONG_SECS);
            }
        }
    }

    fn refresh_report(&mut self) {
        let filtered = report::filter_sessions(&self.sessions, self.range, Utc::now());
        self.report_aggregate = session_aggregate(&filtered);
        self.report_counts = report::daily_counts(&filtered);
    }

    fn send_email(&mut self) {
        let mailer = Mailer::new();
        match mailer.send_and_clear(&self.email_settings, &self.store) {
            Ok(count) => {
                info!(count, "email report sent");
                self.set_banner(
                    "Email sent and sessions cleared!".to_string(),
                    BANNER_SHORT_SECS,
                );
                self.refresh_sessions();
            }
            Err(err @ (EmailError::MissingAddresses | EmailError::NoSessions)) => {
                self.set_banner(err.to_string(), BANNER_SHORT_SECS);
            }
            Err(err @ EmailError::MissingCredentials) => {
                self.set_banner(err.to_string(), BANNER_LONG_SECS);
            }
            Err(err) => {
                warn!(%err, "email send failed");
                self.set_banner(format!("Error sending email: {err}"), BANNER_LONG_SECS);
            }
        }
    }

    fn export_report(&mut self) {
        let filtered = report::filter_sessions(&self.sessions, self.range, Utc::now());
        if filtered.is_empty() {
            self.set_banner(
                "No sessions in this range to export".to_string(),
                BANNER_SHORT_SECS,
            );
            return;
        }
        let written = report::default_export_path(Local::now())
            .and_then(|path| report::export_csv(&path, &filtered).map(|()| path));
        match written {
            Ok(path) => {
                info!(path = %path.display(), "report exported");
                self.set_banner(format!("Exported {}", path.display()), BANNER_LONG_SECS);
            }
            Err(err) => {
                warn!(%err, "report export failed");
                self.set_banner(format!("Could not export report: {err}"), BANNER_LONG_SECS);
            }
        }
    }

    fn open_dashboard(&mut self) {
        if Browser::is_available() {
            webbrowser::open(email::DASHBOARD_URL).unwrap_or_default();
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    match &cli.command {
        Some(Command::Capture { input }) => run_capture(&cli, input),
        None => run_tui(&cli),
    }
}

fn run_capture(cli: &Cli, input: &str) -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn,taipu=info".into()),
        )
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();

    let store = open_store(cli)?;
    let mut machine = CaptureMachine::new();
    let mut toggles = VisibilityToggles::load(&store);
    let mut sink = NdjsonCommandSink::new(io::stdout());

    let recorded = if input == "-" {
        let source = NdjsonEventSource::spawn(BufReader::new(io::stdin()));
        capture::run(&mut machine, &mut toggles, &store, source, &mut sink)
    } else {
        let file = File::open(input)?;
        let source = NdjsonEventSource::spawn(BufReader::new(file));
        capture::run(&mut machine, &mut toggles, &store, source, &mut sink)
    };
    info!(recorded, "capture finished");
    Ok(())
}

fn run_tui(cli: &Cli) -> Result<(), Box<dyn Error>> {
    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    init_tui_logging();

    let store = open_store(cli)?;
    let mut app = App::new(store, practice::default_prompts(), cli.start_screen);

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    start_tui(&mut terminal, &mut app)?;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    Ok(())
}

fn open_store(cli: &Cli) -> Result<Store, Box<dyn Error>> {
    let store = match &cli.db {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            Store::open(path)?
        }
        None => Store::open_default()?,
    };
    Ok(store)
}

/// Log to a file in the state directory; the terminal belongs to the UI.
/// Logging is skipped when no writable location exists.
fn init_tui_logging() {
    let path = match AppDirs::log_path() {
        Some(path) => path,
        None => return,
    };
    if let Some(parent) = path.parent() {
        if std::fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let file = match std::fs::OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => file,
        Err(_) => return,
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn,taipu=info".into()),
        )
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .init();
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let events = EventPump::spawn(Duration::from_millis(TICK_RATE_MS));

    terminal.draw(|f| ui(app, f))?;

    loop {
        match events.next() {
            AppEvent::Tick => {
                if app.on_tick() {
                    terminal.draw(|f| ui(app, f))?;
                }
            }
            AppEvent::Resize => {
                terminal.draw(|f| ui(app, f))?;
            }
            AppEvent::Key(key) => {
                if app.handle_key(key) == KeyOutcome::Quit {
                    break;
                }
                terminal.draw(|f| ui(app, f))?;
            }
        }
    }

    Ok(())
}

fn ui(app: &mut App, f: &mut Frame) {
    f.render_widget(&*app, f.area());
}
