//! Presentation port.
//!
//! The controller never touches a widget tree. It writes slot contents and
//! control states through [`Surface`]; [`Board`] is the in-memory surface the
//! terminal UI renders from, and it also owns the answer field.

use crate::scoring::Feedback;
use crate::session::{Phase, Score};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, strum_macros::Display)]
pub enum NextLabel {
    #[default]
    Next,
    Finish,
}

/// Which triggers are live. Reset is always available and is not listed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Controls {
    pub start: bool,
    pub play: bool,
    pub answer: bool,
    pub submit: bool,
    pub next: bool,
    pub next_label: NextLabel,
}

pub trait Surface {
    fn show_phase(&mut self, phase: Phase);
    fn show_morse(&mut self, text: &str);
    fn show_prompt(&mut self, text: &str);
    fn show_countdown(&mut self, text: &str);
    fn show_position(&mut self, text: &str);
    fn show_feedback(&mut self, feedback: Option<&Feedback>);
    fn show_score(&mut self, score: Score);
    fn set_controls(&mut self, controls: Controls);
    fn clear_answer(&mut self);
    /// Blank every slot
    fn reset(&mut self);
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Board {
    pub phase: Phase,
    pub morse: String,
    pub prompt: String,
    pub countdown: String,
    pub position: String,
    pub feedback: Option<Feedback>,
    pub score: Score,
    pub controls: Controls,
    answer: String,
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }

    /// Answer text as submitted: surrounding whitespace removed
    pub fn trimmed_answer(&self) -> &str {
        self.answer.trim()
    }

    /// Append to the answer field. Returns false when the field is disabled.
    pub fn type_char(&mut self, c: char) -> bool {
        if !self.controls.answer || c.is_control() {
            return false;
        }
        self.answer.push(c);
        true
    }

    pub fn backspace(&mut self) {
        if self.controls.answer {
            self.answer.pop();
        }
    }
}

impl Surface for Board {
    fn show_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    fn show_morse(&mut self, text: &str) {
        self.morse = text.to_string();
    }

    fn show_prompt(&mut self, text: &str) {
        self.prompt = text.to_string();
    }

    fn show_countdown(&mut self, text: &str) {
        self.countdown = text.to_string();
    }

    fn show_position(&mut self, text: &str) {
        self.position = text.to_string();
    }

    fn show_feedback(&mut self, feedback: Option<&Feedback>) {
        self.feedback = feedback.cloned();
    }

    fn show_score(&mut self, score: Score) {
        self.score = score;
    }

    fn set_controls(&mut self, controls: Controls) {
        self.controls = controls;
    }

    fn clear_answer(&mut self) {
        self.answer.clear();
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}
