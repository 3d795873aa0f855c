//! Host event loop plumbing: terminal events, tick pacing and the game clock.

use std::cell::Cell;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};

#[derive(Clone, Debug)]
pub enum QuizEvent {
    Key(KeyEvent),
    Resize,
    /// Nothing arrived within one tick interval
    Tick,
}

pub trait QuizEventSource: Send + 'static {
    /// Wait up to `timeout` for the next event
    fn recv_timeout(&self, timeout: Duration) -> Result<QuizEvent, RecvTimeoutError>;
}

/// Reads the terminal on a background thread
pub struct CrosstermEventSource {
    rx: Receiver<QuizEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || loop {
            let evt = match event::read() {
                // some terminals report releases too; only presses count
                Ok(CtEvent::Key(key)) if key.kind == KeyEventKind::Press => QuizEvent::Key(key),
                Ok(CtEvent::Resize(_, _)) => QuizEvent::Resize,
                Ok(_) => continue,
                Err(err) => {
                    tracing::warn!(%err, "terminal input closed");
                    break;
                }
            };
            if tx.send(evt).is_err() {
                break;
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl QuizEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<QuizEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Events pushed by a test through a channel
pub struct TestEventSource {
    rx: Receiver<QuizEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<QuizEvent>) -> Self {
        Self { rx }
    }
}

impl QuizEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<QuizEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Time since the game began, as seen by the controller
pub trait Clock {
    fn now(&self) -> Duration;

    /// Called by the runner whenever it produces a tick
    fn ticked(&self) {}
}

#[derive(Clone, Copy, Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock that only moves when told to. Each tick can advance it by a fixed step.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Duration>,
    step: Duration,
}

impl ManualClock {
    /// Stands still unless `advance` is called
    pub fn frozen() -> Self {
        Self::default()
    }

    /// Moves forward by `step` on every `Runner` tick
    pub fn stepping(step: Duration) -> Self {
        Self {
            now: Cell::new(Duration::ZERO),
            step,
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }

    fn ticked(&self) {
        self.advance(self.step);
    }
}

/// Pulls one event or tick at a time and stamps it with the clock
pub struct Runner<E: QuizEventSource, T: Ticker, C: Clock = MonotonicClock> {
    event_source: E,
    ticker: T,
    clock: C,
}

impl<E: QuizEventSource, T: Ticker> Runner<E, T, MonotonicClock> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self::with_clock(event_source, ticker, MonotonicClock::new())
    }
}

impl<E: QuizEventSource, T: Ticker, C: Clock> Runner<E, T, C> {
    pub fn with_clock(event_source: E, ticker: T, clock: C) -> Self {
        Self {
            event_source,
            ticker,
            clock,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    /// Blocks up to one tick interval. A closed source just keeps ticking.
    pub fn step(&self) -> (Duration, QuizEvent) {
        let event = match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                self.clock.ticked();
                QuizEvent::Tick
            }
        };
        (self.clock.now(), event)
    }
}
