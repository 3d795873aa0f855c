//! The game controller: the only place session state changes.
//!
//! An event that does not fit the current phase is dropped and logged at `debug`,
//! never turned into an error.

use std::time::Duration;

use crate::code_table::{self, Symbol};
use crate::scoring::{self, Outcome};
use crate::sequencer::{Next, PresentationMode, Question, QuestionSet};
use crate::session::{Phase, Session};
use crate::signal::{AudioOutput, PlaybackEvent, Sample, SignalRenderer, Timing};
use crate::surface::{Controls, NextLabel, Surface};
use crate::timer::{RoundTimer, SecondPulse, TimerHandle, TimerTick};

/// Seconds allowed per question
pub const ROUND_SECS: u32 = 30;

pub const DEFAULT_TONE_HZ: f32 = 700.0;

/// Whether an event changed anything
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied,
    Ignored,
}

pub struct Game<S: Surface, A: AudioOutput> {
    questions: QuestionSet,
    session: Session,
    question: Option<Question>,
    symbols: Vec<Symbol>,
    timer: RoundTimer,
    timer_handle: Option<TimerHandle>,
    pulse: SecondPulse,
    renderer: SignalRenderer,
    now: Duration,
    surface: S,
    audio: A,
}

impl<S: Surface, A: AudioOutput> Game<S, A> {
    pub fn new(questions: QuestionSet, surface: S, audio: A) -> Self {
        Self::with_tone(questions, surface, audio, DEFAULT_TONE_HZ)
    }

    pub fn with_tone(questions: QuestionSet, surface: S, audio: A, frequency_hz: f32) -> Self {
        let mut game = Self {
            questions,
            session: Session::new(),
            question: None,
            symbols: Vec::new(),
            timer: RoundTimer::new(),
            timer_handle: None,
            pulse: SecondPulse::default(),
            renderer: SignalRenderer::new(Timing::default(), frequency_hz),
            now: Duration::ZERO,
            surface,
            audio,
        };
        game.paint_idle();
        game
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn phase(&self) -> Phase {
        self.session.phase
    }

    pub fn question(&self) -> Option<&Question> {
        self.question.as_ref()
    }

    pub fn questions(&self) -> &QuestionSet {
        &self.questions
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    pub fn is_playing(&self) -> bool {
        self.renderer.is_busy()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn controls(&self) -> Controls {
        let phase = self.session.phase;
        let active = phase == Phase::QuestionActive;
        Controls {
            start: matches!(phase, Phase::NotStarted | Phase::Finished),
            play: active && !self.renderer.is_busy(),
            answer: active,
            submit: active,
            next: phase == Phase::QuestionAnswered,
            next_label: if self.questions.is_last(self.session.current_index) {
                NextLabel::Finish
            } else {
                NextLabel::Next
            },
        }
    }

    /// Begin a new game from the first question
    pub fn start(&mut self) -> Transition {
        if !matches!(self.session.phase, Phase::NotStarted | Phase::Finished) {
            tracing::debug!(phase = %self.session.phase, "start ignored");
            return Transition::Ignored;
        }

        self.session.reset();
        self.surface.show_score(self.session.score);
        tracing::info!(total = self.questions.total(), "game started");
        self.load_question(0);
        Transition::Applied
    }

    pub fn submit_answer(&mut self, text: &str) -> Transition {
        let Some(question) = self.active_question() else {
            tracing::debug!(phase = %self.session.phase, "submit ignored");
            return Transition::Ignored;
        };

        let outcome = if scoring::normalize(text) == question.target {
            Outcome::Correct
        } else {
            Outcome::Wrong
        };
        self.resolve(outcome);
        Transition::Applied
    }

    pub fn on_timer_expire(&mut self) -> Transition {
        if self.active_question().is_none() {
            tracing::debug!(phase = %self.session.phase, "expiry ignored");
            return Transition::Ignored;
        }
        self.resolve(Outcome::Timeout);
        Transition::Applied
    }

    /// Deliver one countdown second to the current question
    pub fn on_timer_tick(&mut self) -> Transition {
        let Some(handle) = self.timer_handle else {
            tracing::debug!("tick without a live countdown");
            return Transition::Ignored;
        };
        if self.session.phase != Phase::QuestionActive
            || handle.question != self.session.current_index
        {
            tracing::debug!(question = handle.question, "stale tick ignored");
            return Transition::Ignored;
        }

        match self.timer.tick(handle) {
            TimerTick::Remaining(secs) => {
                self.session.time_remaining = secs;
                self.surface.show_countdown(&countdown_text(secs));
                Transition::Applied
            }
            TimerTick::Expired => {
                self.session.time_remaining = 0;
                self.surface.show_countdown(&countdown_text(0));
                self.timer_handle = None;
                self.on_timer_expire()
            }
            TimerTick::Ignored => Transition::Ignored,
        }
    }

    /// Move past an answered question, finishing after the last one
    pub fn advance(&mut self) -> Transition {
        if self.session.phase != Phase::QuestionAnswered {
            tracing::debug!(phase = %self.session.phase, "advance ignored");
            return Transition::Ignored;
        }
        self.load_question(self.session.current_index + 1);
        Transition::Applied
    }

    /// Replay the current pattern
    pub fn play(&mut self) -> Transition {
        if self.session.phase != Phase::QuestionActive || self.renderer.is_busy() {
            tracing::debug!(
                phase = %self.session.phase,
                busy = self.renderer.is_busy(),
                "play ignored"
            );
            return Transition::Ignored;
        }
        self.start_playback()
    }

    /// Back to a fresh, unstarted game
    pub fn reset(&mut self) {
        self.timer.cancel();
        self.timer_handle = None;
        self.cancel_playback();
        self.session.reset();
        self.question = None;
        self.symbols.clear();
        self.surface.reset();
        self.paint_idle();
        tracing::info!("game reset");
    }

    /// Advance the host clock: release due playback steps and feed whole
    /// seconds to the countdown.
    pub fn tick(&mut self, now: Duration) {
        self.now = now;
        self.pump_playback();

        if self.session.phase == Phase::QuestionActive {
            for _ in 0..self.pulse.advance(now) {
                if self.on_timer_tick() == Transition::Ignored {
                    break;
                }
            }
        }
    }

    fn active_question(&self) -> Option<&Question> {
        if self.session.phase == Phase::QuestionActive {
            self.question.as_ref()
        } else {
            None
        }
    }

    fn load_question(&mut self, index: usize) {
        self.timer.cancel();
        self.timer_handle = None;
        self.cancel_playback();

        let question = match self.questions.at(index) {
            Next::Question(question) => question,
            Next::Terminal => {
                self.session.current_index = index;
                self.finish();
                return;
            }
        };

        self.session.current_index = index;
        self.session.time_remaining = ROUND_SECS;
        self.session.phase = Phase::QuestionActive;
        self.symbols = code_table::encode(&question.target);

        self.surface.show_phase(Phase::QuestionActive);
        self.surface.show_morse(&morse_text(&question, &self.symbols));
        self.surface.show_prompt(prompt_text(&question));
        self.surface.show_position(&format!(
            "Question {} / {}",
            index + 1,
            self.questions.total()
        ));
        self.surface.show_countdown(&countdown_text(ROUND_SECS));
        self.surface.show_feedback(None);
        self.surface.clear_answer();

        self.timer_handle = Some(self.timer.start(index, ROUND_SECS));
        self.pulse.reset(self.now);
        tracing::debug!(index, target = %question.target, mode = %question.mode, "question loaded");
        self.question = Some(question);

        // each question is heard once as soon as it appears
        self.start_playback();
        self.refresh_controls();
    }

    fn resolve(&mut self, outcome: Outcome) {
        self.timer.cancel();
        self.timer_handle = None;

        let Some(target) = self.question.as_ref().map(|q| q.target.clone()) else {
            return;
        };
        let feedback = scoring::resolve(&mut self.session.score, outcome, &target);
        self.session.phase = Phase::QuestionAnswered;

        self.cancel_playback();
        self.surface.show_phase(Phase::QuestionAnswered);
        self.surface.show_feedback(Some(&feedback));
        self.surface.show_score(self.session.score);
        self.refresh_controls();

        let sample = match outcome {
            Outcome::Correct => Some(Sample::Bingo),
            Outcome::Wrong => Some(Sample::Wrong),
            Outcome::Timeout => None,
        };
        if let Some(sample) = sample {
            if let Err(err) = self.audio.start_sample(sample) {
                tracing::warn!(%err, %sample, "feedback sound failed");
            }
        }
        tracing::debug!(index = self.session.current_index, %outcome, "question resolved");
    }

    fn finish(&mut self) {
        self.timer.cancel();
        self.timer_handle = None;
        self.cancel_playback();
        self.session.phase = Phase::Finished;
        self.session.time_remaining = 0;
        self.question = None;
        self.symbols.clear();

        let score = self.session.score;
        self.surface.show_phase(Phase::Finished);
        self.surface.show_morse("");
        self.surface.show_countdown("");
        self.surface.show_position("");
        self.surface.show_prompt(&format!(
            "Finished! {} correct, {} wrong out of {}",
            score.correct,
            score.wrong,
            self.questions.total()
        ));
        self.surface.show_score(score);
        self.refresh_controls();
        tracing::info!(correct = score.correct, wrong = score.wrong, "game finished");
    }

    fn start_playback(&mut self) -> Transition {
        match self.renderer.play(&self.symbols, self.now) {
            Ok(id) => {
                // nothing queued earlier may sound ahead of the pattern
                self.audio.stop();
                tracing::debug!(?id, "playback started");
                self.pump_playback();
                self.refresh_controls();
                Transition::Applied
            }
            Err(err) => {
                tracing::debug!(%err, "playback not started");
                Transition::Ignored
            }
        }
    }

    /// Cancelled sequences are dropped by the renderer, so any event here
    /// belongs to the pattern of the current question.
    fn pump_playback(&mut self) {
        match self.renderer.poll(self.now, &mut self.audio) {
            Some(PlaybackEvent::Finished(id)) => tracing::debug!(?id, "playback finished"),
            Some(PlaybackEvent::Failed(id, err)) => {
                tracing::debug!(?id, %err, "playback abandoned")
            }
            None => return,
        }
        self.refresh_controls();
    }

    fn cancel_playback(&mut self) {
        if self.renderer.cancel().is_some() {
            self.audio.stop();
        }
    }

    fn refresh_controls(&mut self) {
        let controls = self.controls();
        self.surface.set_controls(controls);
    }

    fn paint_idle(&mut self) {
        self.surface.show_phase(Phase::NotStarted);
        self.surface
            .show_prompt("Listen to the code, then type the letter or word you heard.");
        self.surface.show_score(self.session.score);
        self.refresh_controls();
    }
}

fn countdown_text(secs: u32) -> String {
    format!("Time Left: {secs}s")
}

fn morse_text(question: &Question, symbols: &[Symbol]) -> String {
    match question.mode {
        PresentationMode::AudioOnly => "(listen)".to_string(),
        PresentationMode::Revealed => {
            format!("{}  {}", question.target, code_table::pattern_text(symbols))
        }
    }
}

fn prompt_text(question: &Question) -> &'static str {
    match (question.mode, question.is_word()) {
        (PresentationMode::AudioOnly, false) => "Which letter did you hear?",
        (PresentationMode::AudioOnly, true) => "Which word did you hear?",
        (PresentationMode::Revealed, false) => "Type the letter shown",
        (PresentationMode::Revealed, true) => "Type the word shown",
    }
}
