use itertools::Itertools;

const LETTER_GAP: &[Symbol] = &[Symbol::LetterSpace];

/// One playable unit of a morse sequence
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Symbol {
    Dot,
    Dash,
    /// Extra silence separating two letters of a word
    LetterSpace,
}

impl Symbol {
    /// Returns true if this symbol produces a tone
    pub fn is_tone(&self) -> bool {
        matches!(self, Symbol::Dot | Symbol::Dash)
    }

    fn as_char(&self) -> char {
        match self {
            Symbol::Dot => '.',
            Symbol::Dash => '-',
            Symbol::LetterSpace => ' ',
        }
    }
}

/// Morse pattern for a single letter, case-insensitive. Only A-Z are known.
pub fn pattern(letter: char) -> Option<&'static [Symbol]> {
    use Symbol::{Dash as H, Dot as I};

    let code: &'static [Symbol] = match letter.to_ascii_uppercase() {
        'A' => &[I, H],
        'B' => &[H, I, I, I],
        'C' => &[H, I, H, I],
        'D' => &[H, I, I],
        'E' => &[I],
        'F' => &[I, I, H, I],
        'G' => &[H, H, I],
        'H' => &[I, I, I, I],
        'I' => &[I, I],
        'J' => &[I, H, H, H],
        'K' => &[H, I, H],
        'L' => &[I, H, I, I],
        'M' => &[H, H],
        'N' => &[H, I],
        'O' => &[H, H, H],
        'P' => &[I, H, H, I],
        'Q' => &[H, H, I, H],
        'R' => &[I, H, I],
        'S' => &[I, I, I],
        'T' => &[H],
        'U' => &[I, I, H],
        'V' => &[I, I, I, H],
        'W' => &[I, H, H],
        'X' => &[H, I, I, H],
        'Y' => &[H, I, H, H],
        'Z' => &[H, H, I, I],
        _ => return None,
    };

    Some(code)
}

/// Encode a letter or a word. Letters of a word are separated by `LetterSpace`;
/// characters without a pattern are skipped.
pub fn encode(target: &str) -> Vec<Symbol> {
    Itertools::intersperse(target.chars().filter_map(pattern), LETTER_GAP)
        .flatten()
        .copied()
        .collect()
}

/// Dots and dashes as text, letters of a word joined with " / "
pub fn pattern_text(symbols: &[Symbol]) -> String {
    symbols
        .split(|s| *s == Symbol::LetterSpace)
        .map(|letter| letter.iter().map(Symbol::as_char).collect::<String>())
        .join(" / ")
}
