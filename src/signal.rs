//! Serialized morse playback.
//!
//! The renderer turns a symbol sequence into a queue of tone and silence steps and
//! releases them one at a time as the host clock advances. Only one sequence may be
//! in flight: a second `play` while busy is refused, never overlapped.

use std::collections::VecDeque;
use std::time::Duration;

use crate::code_table::Symbol;
use crate::error::{AudioError, PlaybackError};

/// Unit durations for playback
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timing {
    pub dot: Duration,
    pub dash: Duration,
    /// Extra silence for a space between letters of a word
    pub letter_space: Duration,
    /// Silence after every symbol, whatever its type
    pub gap: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            dot: Duration::from_millis(120),
            dash: Duration::from_millis(360),
            letter_space: Duration::from_millis(200),
            gap: Duration::from_millis(80),
        }
    }
}

impl Timing {
    pub fn tone(&self, kind: ToneKind) -> Duration {
        match kind {
            ToneKind::Dot => self.dot,
            ToneKind::Dash => self.dash,
        }
    }

    /// Time from `play` until the renderer goes idle again
    pub fn sequence_length(&self, symbols: &[Symbol]) -> Duration {
        symbols
            .iter()
            .map(|symbol| match symbol {
                Symbol::Dot => self.dot + self.gap,
                Symbol::Dash => self.dash + self.gap,
                Symbol::LetterSpace => self.letter_space + self.gap,
            })
            .sum()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum ToneKind {
    #[strum(serialize = "dot")]
    Dot,
    #[strum(serialize = "dash")]
    Dash,
}

/// A symbolic tone handed to the audio primitive
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ToneRequest {
    pub kind: ToneKind,
    pub frequency_hz: f32,
    pub duration: Duration,
}

/// Named feedback sounds
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum Sample {
    #[strum(serialize = "bingo")]
    Bingo,
    #[strum(serialize = "wrong")]
    Wrong,
}

/// The audio primitive. Requests start sound and return; a tone is considered
/// complete once its requested duration has elapsed on the host clock.
///
/// Tones and silences arrive in playback order. A queued backend has to keep the
/// silences too, or the gaps between symbols collapse when it falls behind.
pub trait AudioOutput {
    fn start_tone(&mut self, tone: &ToneRequest) -> Result<(), AudioError>;
    fn start_sample(&mut self, sample: Sample) -> Result<(), AudioError>;
    /// Quiet stretch between tones
    fn start_silence(&mut self, _duration: Duration) -> Result<(), AudioError> {
        Ok(())
    }
    /// Drop anything still sounding or queued
    fn stop(&mut self) {}
}

impl<T: AudioOutput + ?Sized> AudioOutput for Box<T> {
    fn start_tone(&mut self, tone: &ToneRequest) -> Result<(), AudioError> {
        (**self).start_tone(tone)
    }

    fn start_sample(&mut self, sample: Sample) -> Result<(), AudioError> {
        (**self).start_sample(sample)
    }

    fn start_silence(&mut self, duration: Duration) -> Result<(), AudioError> {
        (**self).start_silence(duration)
    }

    fn stop(&mut self) {
        (**self).stop()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PlaybackId(u64);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlaybackEvent {
    Finished(PlaybackId),
    Failed(PlaybackId, AudioError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Step {
    Tone(ToneKind),
    Silence(Duration),
}

#[derive(Debug)]
pub struct SignalRenderer {
    timing: Timing,
    frequency_hz: f32,
    steps: VecDeque<Step>,
    current: Option<PlaybackId>,
    /// When the next step is due; set only while busy
    next_at: Option<Duration>,
    next_id: u64,
}

impl SignalRenderer {
    pub fn new(timing: Timing, frequency_hz: f32) -> Self {
        Self {
            timing,
            frequency_hz,
            steps: VecDeque::new(),
            current: None,
            next_at: None,
            next_id: 0,
        }
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    pub fn is_busy(&self) -> bool {
        self.current.is_some()
    }

    pub fn current(&self) -> Option<PlaybackId> {
        self.current
    }

    /// Queue a sequence starting at `now`. Nothing sounds until the next `poll`.
    pub fn play(&mut self, symbols: &[Symbol], now: Duration) -> Result<PlaybackId, PlaybackError> {
        if self.is_busy() {
            return Err(PlaybackError::Busy);
        }
        if symbols.is_empty() {
            return Err(PlaybackError::Empty);
        }

        self.steps.clear();
        for symbol in symbols {
            match symbol {
                Symbol::Dot => {
                    self.steps.push_back(Step::Tone(ToneKind::Dot));
                    self.steps.push_back(Step::Silence(self.timing.gap));
                }
                Symbol::Dash => {
                    self.steps.push_back(Step::Tone(ToneKind::Dash));
                    self.steps.push_back(Step::Silence(self.timing.gap));
                }
                Symbol::LetterSpace => {
                    self.steps
                        .push_back(Step::Silence(self.timing.letter_space + self.timing.gap));
                }
            }
        }

        let id = PlaybackId(self.next_id);
        self.next_id += 1;
        self.current = Some(id);
        self.next_at = Some(now);
        tracing::debug!(symbols = symbols.len(), "playback queued");
        Ok(id)
    }

    /// Release every step that has come due by `now`.
    ///
    /// Returns an event when the sequence ends, either because all steps elapsed or
    /// because the audio primitive refused a step. The busy flag is clear in both cases.
    /// A late poll hands every overdue step over in order, silences included.
    pub fn poll<A: AudioOutput + ?Sized>(
        &mut self,
        now: Duration,
        audio: &mut A,
    ) -> Option<PlaybackEvent> {
        let id = self.current?;

        while let Some(due) = self.next_at {
            if due > now {
                break;
            }

            match self.steps.pop_front() {
                Some(Step::Tone(kind)) => {
                    let tone = ToneRequest {
                        kind,
                        frequency_hz: self.frequency_hz,
                        duration: self.timing.tone(kind),
                    };
                    if let Err(err) = audio.start_tone(&tone) {
                        tracing::warn!(%err, "tone refused, abandoning playback");
                        self.clear();
                        return Some(PlaybackEvent::Failed(id, err));
                    }
                    self.next_at = Some(due + tone.duration);
                }
                Some(Step::Silence(length)) => {
                    if let Err(err) = audio.start_silence(length) {
                        tracing::warn!(%err, "silence refused, abandoning playback");
                        self.clear();
                        return Some(PlaybackEvent::Failed(id, err));
                    }
                    self.next_at = Some(due + length);
                }
                None => {
                    self.clear();
                    return Some(PlaybackEvent::Finished(id));
                }
            }
        }

        None
    }

    /// Abandon the sequence in flight. Idempotent.
    pub fn cancel(&mut self) -> Option<PlaybackId> {
        let abandoned = self.current;
        self.clear();
        abandoned
    }

    fn clear(&mut self) {
        self.steps.clear();
        self.current = None;
        self.next_at = None;
    }
}
