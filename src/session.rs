/// Where the controller is in the question cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, strum_macros::Display)]
pub enum Phase {
    #[default]
    NotStarted,
    QuestionActive,
    QuestionAnswered,
    Finished,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Score {
    pub correct: u32,
    pub wrong: u32,
}

impl Score {
    pub fn resolved(&self) -> u32 {
        self.correct + self.wrong
    }
}

/// Mutable state of one game, owned and changed only by the controller
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub current_index: usize,
    pub score: Score,
    pub time_remaining: u32,
    pub phase: Phase,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
