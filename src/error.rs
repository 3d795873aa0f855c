use thiserror::Error;

/// Failures reported by an audio primitive.
///
/// None of these are fatal: the caller clears its busy state and carries on.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AudioError {
    #[error("no audio output is available")]
    Unavailable,
    #[error("audio stream failed: {0}")]
    Stream(String),
    #[error("could not build audio stream: {0}")]
    Build(String),
}

/// Reasons a playback request is refused outright.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("a pattern is already playing")]
    Busy,
    #[error("nothing to play")]
    Empty,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QuestionSetError {
    #[error("question set needs at least one letter")]
    NoLetters,
    #[error("pairing factor must be at least 1")]
    ZeroPairing,
    #[error("no morse pattern for {0:?}")]
    UnknownLetter(char),
    #[error("targets must not be empty")]
    EmptyTarget,
}
