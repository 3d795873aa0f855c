use crate::code_table;
use crate::error::QuestionSetError;

/// How a question is put to the player
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum PresentationMode {
    /// Guess from the sound alone
    #[strum(serialize = "audio only")]
    AudioOnly,
    /// Answer shown alongside its pattern
    #[strum(serialize = "revealed")]
    Revealed,
}

impl PresentationMode {
    fn for_index(index: usize) -> Self {
        if index % 2 == 0 {
            PresentationMode::AudioOnly
        } else {
            PresentationMode::Revealed
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Question {
    pub index: usize,
    pub target: String,
    pub mode: PresentationMode,
}

impl Question {
    pub fn is_word(&self) -> bool {
        self.target.chars().count() > 1
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Next {
    Question(Question),
    Terminal,
}

/// Fixed, ordered question list.
///
/// Every letter and then every word is asked `pairing` times in a row; with the
/// default pairing of two the player first hears a target blind and then sees it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuestionSet {
    letters: Vec<String>,
    words: Vec<String>,
    pairing: usize,
}

impl Default for QuestionSet {
    fn default() -> Self {
        Self {
            letters: ["L", "O", "I", "D"].map(String::from).to_vec(),
            words: vec!["LOID".to_string()],
            pairing: 2,
        }
    }
}

impl QuestionSet {
    pub fn new<L, W>(letters: L, words: W, pairing: usize) -> Result<Self, QuestionSetError>
    where
        L: IntoIterator,
        L::Item: Into<String>,
        W: IntoIterator,
        W::Item: Into<String>,
    {
        let letters: Vec<String> = letters
            .into_iter()
            .map(|l| l.into().trim().to_uppercase())
            .collect();
        let words: Vec<String> = words
            .into_iter()
            .map(|w| w.into().trim().to_uppercase())
            .collect();

        if letters.is_empty() {
            return Err(QuestionSetError::NoLetters);
        }
        if pairing == 0 {
            return Err(QuestionSetError::ZeroPairing);
        }
        for target in letters.iter().chain(words.iter()) {
            if target.is_empty() {
                return Err(QuestionSetError::EmptyTarget);
            }
            if let Some(c) = target.chars().find(|c| code_table::pattern(*c).is_none()) {
                return Err(QuestionSetError::UnknownLetter(c));
            }
        }

        Ok(Self {
            letters,
            words,
            pairing,
        })
    }

    /// Letters only, each asked twice
    pub fn letters<L>(letters: L) -> Result<Self, QuestionSetError>
    where
        L: IntoIterator,
        L::Item: Into<String>,
    {
        Self::new(letters, Vec::<String>::new(), 2)
    }

    pub fn total(&self) -> usize {
        (self.letters.len() + self.words.len()) * self.pairing
    }

    pub fn is_last(&self, index: usize) -> bool {
        index + 1 == self.total()
    }

    /// The question at `index`, or `Terminal` once the set is exhausted
    pub fn at(&self, index: usize) -> Next {
        let target = index / self.pairing;
        let target = if target < self.letters.len() {
            &self.letters[target]
        } else if let Some(word) = self.words.get(target - self.letters.len()) {
            word
        } else {
            return Next::Terminal;
        };

        Next::Question(Question {
            index,
            target: target.clone(),
            mode: PresentationMode::for_index(index),
        })
    }
}
