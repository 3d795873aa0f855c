use crate::session::Score;

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum Outcome {
    Correct,
    Wrong,
    Timeout,
}

/// Semantic tone of a feedback message; colouring is up to the renderer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeedbackCategory {
    Success,
    Warning,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Feedback {
    pub message: String,
    pub category: FeedbackCategory,
}

/// Record `outcome` against `score` and describe it. A timeout counts as wrong.
pub fn resolve(score: &mut Score, outcome: Outcome, target: &str) -> Feedback {
    match outcome {
        Outcome::Correct => {
            score.correct += 1;
            Feedback {
                message: "✔ Correct!".to_string(),
                category: FeedbackCategory::Success,
            }
        }
        Outcome::Wrong => {
            score.wrong += 1;
            Feedback {
                message: format!("✘ Wrong! Correct answer: {target}"),
                category: FeedbackCategory::Error,
            }
        }
        Outcome::Timeout => {
            score.wrong += 1;
            Feedback {
                message: format!("⏰ Time's up! Correct answer: {target}"),
                category: FeedbackCategory::Warning,
            }
        }
    }
}

/// Trim and upper-case a typed answer before comparing it to a target
pub fn normalize(input: &str) -> String {
    input.trim().to_uppercase()
}
