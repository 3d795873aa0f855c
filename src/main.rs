use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use morsequiz::{
    audio,
    config::{Config, ConfigStore, FileConfigStore},
    game::Game,
    runtime::{Clock, CrosstermEventSource, FixedTicker, QuizEvent, QuizEventSource, Runner, Ticker},
    sequencer::QuestionSet,
    session::Phase,
    signal::AudioOutput,
    surface::Board,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    fs::File,
    io::{self, stdin},
    path::{Path, PathBuf},
    sync::Mutex,
    time::Duration,
};
use tracing_subscriber::EnvFilter;

const TICK_RATE_MS: u64 = 20;

/// morse code listening quiz for the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Hear a letter or word in morse code, type what it was before the 30 second countdown runs out. Audio-only and revealed questions alternate."
)]
pub struct Cli {
    /// play nothing; the quiz keeps the same pacing
    #[clap(short = 'm', long)]
    mute: bool,

    /// tone pitch in hertz
    #[clap(short = 'f', long)]
    frequency: Option<f32>,

    /// output volume from 0.0 to 1.0
    #[clap(long)]
    volume: Option<f32>,

    /// settings file to read instead of the per-user default
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,

    /// store the effective settings back to the settings file
    #[clap(long)]
    save_config: bool,

    /// write diagnostics to this file (filter with RUST_LOG)
    #[clap(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn config_store(&self) -> FileConfigStore {
        match &self.config {
            Some(path) => FileConfigStore::with_path(path),
            None => FileConfigStore::new(),
        }
    }

    /// Command line flags layered over the stored settings
    fn settings(&self, stored: Config) -> Config {
        Config {
            tone_frequency_hz: self.frequency.unwrap_or(stored.tone_frequency_hz),
            volume: self.volume.unwrap_or(stored.volume),
            mute: self.mute || stored.mute,
        }
        .sanitized()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct App<A: AudioOutput> {
    pub game: Game<Board, A>,
}

impl<A: AudioOutput> App<A> {
    pub fn new(config: &Config, audio: A) -> Self {
        Self {
            game: Game::with_tone(
                QuestionSet::default(),
                Board::new(),
                audio,
                config.tone_frequency_hz,
            ),
        }
    }

    pub fn board(&self) -> &Board {
        self.game.surface()
    }

    pub fn on_tick(&mut self, now: Duration) {
        self.game.tick(now);
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Flow {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => return Flow::Quit,
            KeyCode::Char('c') if ctrl => return Flow::Quit,
            KeyCode::Char('r') if ctrl => self.game.reset(),
            KeyCode::Enter => self.on_enter(),
            KeyCode::Tab => {
                self.game.play();
            }
            KeyCode::Backspace => self.game.surface_mut().backspace(),
            KeyCode::Char(c) if !ctrl => {
                self.game.surface_mut().type_char(c);
            }
            _ => {}
        }
        Flow::Continue
    }

    // enter acts on whatever the current phase offers
    fn on_enter(&mut self) {
        match self.game.phase() {
            Phase::NotStarted | Phase::Finished => {
                self.game.start();
            }
            Phase::QuestionActive => {
                let answer = self.game.surface().trimmed_answer().to_string();
                self.game.submit_answer(&answer);
            }
            Phase::QuestionAnswered => {
                self.game.advance();
            }
        }
    }
}

fn init_logging(path: &Path) -> Result<(), Box<dyn Error>> {
    let file = File::create(path)?;
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("morsequiz=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|err| -> Box<dyn Error> { err })?;
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    if let Some(path) = &cli.log_file {
        init_logging(path)?;
    }

    let store = cli.config_store();
    let config = cli.settings(store.load());
    if cli.save_config {
        store.save(&config)?;
        tracing::info!(path = %store.path().display(), "settings saved");
    }

    let audio = audio::open_output(config.mute, config.volume);
    let mut app = App::new(&config, audio);

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );
    let result = start_tui(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B, A, E, T, C>(
    terminal: &mut Terminal<B>,
    app: &mut App<A>,
    runner: &Runner<E, T, C>,
) -> Result<(), Box<dyn Error>>
where
    B: Backend,
    A: AudioOutput,
    E: QuizEventSource,
    T: Ticker,
    C: Clock,
{
    terminal.draw(|f| ui(app, f))?;

    loop {
        let before = app.board().clone();

        let (now, event) = runner.step();
        match event {
            QuizEvent::Tick => app.on_tick(now),
            QuizEvent::Resize => {
                terminal.draw(|f| ui(app, f))?;
                continue;
            }
            QuizEvent::Key(key) => {
                // keep the game clock current before acting on the key
                app.on_tick(now);
                if app.handle_key(key) == Flow::Quit {
                    break;
                }
            }
        }

        // redraw only when something visible changed
        if *app.board() != before {
            terminal.draw(|f| ui(app, f))?;
        }
    }

    Ok(())
}

fn ui<A: AudioOutput>(app: &App<A>, f: &mut Frame) {
    f.render_widget(app.board(), f.area());
}

#[cfg(test)]
mod tests {
    use super::*;
    use morsequiz::audio::SilentOutput;
    use morsequiz::runtime::{ManualClock, TestEventSource};
    use ratatui::backend::TestBackend;
    use std::sync::mpsc;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn app() -> App<SilentOutput> {
        App::new(&Config::default(), SilentOutput)
    }

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["morsequiz"]);
        assert!(!cli.mute);
        assert_eq!(cli.frequency, None);
        assert_eq!(cli.volume, None);
        assert_eq!(cli.config, None);
        assert!(!cli.save_config);
        assert_eq!(cli.log_file, None);
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::parse_from([
            "morsequiz",
            "--mute",
            "-f",
            "650",
            "--volume",
            "0.2",
            "--config",
            "/tmp/quiz.json",
            "--save-config",
            "--log-file",
            "/tmp/quiz.log",
        ]);
        assert!(cli.mute);
        assert_eq!(cli.frequency, Some(650.0));
        assert_eq!(cli.volume, Some(0.2));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/quiz.json")));
        assert!(cli.save_config);
        assert_eq!(cli.log_file, Some(PathBuf::from("/tmp/quiz.log")));
    }

    #[test]
    fn test_cli_settings_override_stored_values() {
        let stored = Config {
            tone_frequency_hz: 600.0,
            volume: 0.3,
            mute: false,
        };

        let cli = Cli::parse_from(["morsequiz"]);
        assert_eq!(cli.settings(stored.clone()), stored);

        let cli = Cli::parse_from(["morsequiz", "--frequency", "900", "--mute"]);
        let cfg = cli.settings(stored.clone());
        assert_eq!(cfg.tone_frequency_hz, 900.0);
        assert_eq!(cfg.volume, 0.3);
        assert!(cfg.mute);

        let cli = Cli::parse_from(["morsequiz", "--volume", "7"]);
        assert_eq!(cli.settings(stored).volume, 1.0);
    }

    #[test]
    fn test_config_store_honours_path_flag() {
        let cli = Cli::parse_from(["morsequiz", "--config", "/tmp/elsewhere.json"]);
        assert_eq!(cli.config_store().path(), Path::new("/tmp/elsewhere.json"));
    }

    #[test]
    fn test_enter_walks_through_a_question() {
        let mut app = app();
        assert_eq!(app.handle_key(key(KeyCode::Enter)), Flow::Continue);
        assert_eq!(app.game.phase(), Phase::QuestionActive);

        app.handle_key(key(KeyCode::Char('l')));
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.game.phase(), Phase::QuestionAnswered);
        assert_eq!(app.game.session().score.correct, 1);

        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.game.phase(), Phase::QuestionActive);
        assert_eq!(app.game.session().current_index, 1);
        assert_eq!(app.board().answer(), "");
    }

    #[test]
    fn test_typing_is_ignored_outside_active_question() {
        let mut app = app();
        app.handle_key(key(KeyCode::Char('x')));
        assert_eq!(app.board().answer(), "");

        app.handle_key(key(KeyCode::Enter));
        app.handle_key(key(KeyCode::Char('x')));
        app.handle_key(key(KeyCode::Char('y')));
        app.handle_key(key(KeyCode::Backspace));
        assert_eq!(app.board().answer(), "x");
    }

    #[test]
    fn test_tab_replays_only_when_idle() {
        let mut app = app();
        app.handle_key(key(KeyCode::Enter));
        assert!(app.game.is_playing());

        // still sounding from the automatic first play
        app.handle_key(key(KeyCode::Tab));
        app.on_tick(Duration::from_secs(2));
        assert!(!app.game.is_playing());

        app.handle_key(key(KeyCode::Tab));
        assert!(app.game.is_playing());
    }

    #[test]
    fn test_ctrl_r_resets_and_quit_keys() {
        let mut app = app();
        app.handle_key(key(KeyCode::Enter));
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.game.session().score.wrong, 1);

        assert_eq!(app.handle_key(ctrl('r')), Flow::Continue);
        assert_eq!(app.game.phase(), Phase::NotStarted);
        assert_eq!(app.game.session().score.wrong, 0);

        assert_eq!(app.handle_key(ctrl('c')), Flow::Quit);
        assert_eq!(app.handle_key(key(KeyCode::Esc)), Flow::Quit);
    }

    #[test]
    fn test_ctrl_chars_do_not_reach_the_answer() {
        let mut app = app();
        app.handle_key(key(KeyCode::Enter));
        app.handle_key(ctrl('x'));
        assert_eq!(app.board().answer(), "");
    }

    #[test]
    fn test_start_tui_runs_until_escape() {
        let (tx, rx) = mpsc::channel();
        for event in [
            key(KeyCode::Enter),
            key(KeyCode::Char('l')),
            key(KeyCode::Enter),
            key(KeyCode::Esc),
        ] {
            tx.send(QuizEvent::Key(event)).unwrap();
        }

        let runner = Runner::with_clock(
            TestEventSource::new(rx),
            FixedTicker::new(Duration::from_millis(1)),
            ManualClock::frozen(),
        );
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        let mut app = app();

        start_tui(&mut terminal, &mut app, &runner).unwrap();

        assert_eq!(app.game.phase(), Phase::QuestionAnswered);
        let content: String = terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(content.contains("Correct!"));
    }

    #[test]
    fn test_ui_renders_idle_screen() {
        let app = app();
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|f| ui(&app, f)).unwrap();

        let content: String = terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(content.contains("(enter) start"));
    }

    #[test]
    fn test_start_tui_redraws_on_ticks() {
        let (tx, rx) = mpsc::channel();
        tx.send(QuizEvent::Key(key(KeyCode::Enter))).unwrap();
        let quitter = std::thread::spawn(move || {
            // leave the channel empty long enough for ticks to fire
            std::thread::sleep(Duration::from_millis(50));
            tx.send(QuizEvent::Key(key(KeyCode::Esc))).unwrap();
        });

        // one tick jumps past the whole countdown
        let runner = Runner::with_clock(
            TestEventSource::new(rx),
            FixedTicker::new(Duration::from_millis(1)),
            ManualClock::stepping(Duration::from_secs(31)),
        );
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        let mut app = app();

        start_tui(&mut terminal, &mut app, &runner).unwrap();
        quitter.join().unwrap();

        assert_eq!(app.game.phase(), Phase::QuestionAnswered);
        assert_eq!(app.game.session().score.wrong, 1);
        let content: String = terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(content.contains("Time's up"));
        assert!(content.contains("Time Left: 0s"));
    }
}
