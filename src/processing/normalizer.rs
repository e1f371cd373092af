// Maps raw OCR text onto the 37-character MRZ alphabet (A-Z, 0-9, filler)
// and owns the table of characters OCR engines confuse with each other.

use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::models::FILLER;

/// How a field expects its characters to look.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharContext {
    /// Mixed alphanumeric field, no substitution.
    Any,
    /// Dates and check digits.
    Digit,
    /// Names and codes.
    Letter,
}

/// Which way to swap a confusable character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    ToDigit,
    ToLetter,
    Both,
}

/// (letter, digit, reversible). One-way entries are only ever read as the
/// digit; a real `D` or `L` is far more common than a misread `0` or `1`.
const CONFUSION_TABLE: [(char, char, bool); 10] = [
    ('O', '0', true),
    ('I', '1', true),
    ('S', '5', true),
    ('B', '8', true),
    ('Z', '2', true),
    ('G', '6', true),
    ('T', '7', true),
    ('Q', '0', false),
    ('D', '0', false),
    ('L', '1', false),
];

const FILLER_LOOKALIKES: [char; 4] = ['«', '»', '‹', '›'];

/// OCR engines often read a filler as `K`.
const MISREAD_FILLER: char = 'K';
const FILLER_REACH: usize = 4;
const FILLERS_NEEDED: usize = 2;

lazy_static! {
    static ref LETTER_TO_DIGIT: HashMap<char, char> = CONFUSION_TABLE
        .iter()
        .map(|&(letter, digit, _)| (letter, digit))
        .collect();

    static ref SWAP_TO_DIGIT: HashMap<char, char> = CONFUSION_TABLE
        .iter()
        .filter(|(_, _, reversible)| *reversible)
        .map(|&(letter, digit, _)| (letter, digit))
        .collect();

    static ref SWAP_TO_LETTER: HashMap<char, char> = CONFUSION_TABLE
        .iter()
        .filter(|(_, _, reversible)| *reversible)
        .map(|&(letter, digit, _)| (digit, letter))
        .collect();
}

pub fn is_mrz_char(c: char) -> bool {
    c.is_ascii_uppercase() || c.is_ascii_digit() || c == FILLER
}

/// Digit an OCR engine most likely meant when it produced `c`.
pub fn to_digit(c: char) -> Option<char> {
    if c.is_ascii_digit() {
        return Some(c);
    }
    LETTER_TO_DIGIT.get(&c).copied()
}

/// Reversible look-alike of `c` in the given direction.
pub fn swap(c: char, direction: Direction) -> Option<char> {
    match direction {
        Direction::ToDigit => SWAP_TO_DIGIT.get(&c).copied(),
        Direction::ToLetter => SWAP_TO_LETTER.get(&c).copied(),
        Direction::Both => SWAP_TO_DIGIT
            .get(&c)
            .or_else(|| SWAP_TO_LETTER.get(&c))
            .copied(),
    }
}

/// Upper-cases `raw`, drops whitespace and everything outside the MRZ
/// alphabet, and with `numeric` set replaces letters with the digits they
/// are usually misread for.
pub fn normalize(raw: &str, numeric: bool) -> String {
    let context = if numeric { CharContext::Digit } else { CharContext::Any };
    normalize_with(raw, context)
}

pub fn normalize_with(raw: &str, context: CharContext) -> String {
    raw.chars()
        .map(|c| if FILLER_LOOKALIKES.contains(&c) { FILLER } else { c })
        .flat_map(char::to_uppercase)
        .map(|c| match context {
            CharContext::Any => c,
            CharContext::Digit => to_digit(c).unwrap_or(c),
            CharContext::Letter => {
                if c.is_ascii_digit() {
                    swap(c, Direction::ToLetter).unwrap_or(c)
                } else {
                    c
                }
            }
        })
        .filter(|c| is_mrz_char(*c))
        .collect()
}

/// Reads a `K` as a filler when at least two fillers sit within four columns
/// of it. Repairs are made left to right, so a repaired `K` counts for the
/// ones after it.
///
/// With `keep_words` set, a `K` touching another letter is left alone so
/// names such as `MARK` survive. `K` and `<` weigh the same modulo 10, so
/// no check digit changes either way.
pub fn repair_fillers(span: &str, keep_words: bool) -> String {
    let mut chars: Vec<char> = span.chars().collect();
    for i in 0..chars.len() {
        if chars[i] != MISREAD_FILLER {
            continue;
        }
        let is_word_letter = |c: Option<&char>| {
            c.map_or(false, |c| c.is_ascii_uppercase() && *c != MISREAD_FILLER)
        };
        let previous = i.checked_sub(1).and_then(|j| chars.get(j));
        if keep_words && (is_word_letter(previous) || is_word_letter(chars.get(i + 1))) {
            continue;
        }

        let left = i.saturating_sub(FILLER_REACH);
        let right = (i + FILLER_REACH).min(chars.len() - 1);
        let fillers = chars[left..=right]
            .iter()
            .filter(|c| **c == FILLER)
            .count();
        if fillers >= FILLERS_NEEDED {
            chars[i] = FILLER;
        }
    }
    chars.into_iter().collect()
}

/// [`normalize`] followed by [`pad_or_truncate`].
pub fn normalize_to_length(raw: &str, numeric: bool, length: usize) -> String {
    pad_or_truncate(&normalize(raw, numeric), length)
}

/// Cuts `line` to `length` characters or right-pads it with fillers.
pub fn pad_or_truncate(line: &str, length: usize) -> String {
    let mut out: String = line.chars().take(length).collect();
    let missing = length - out.chars().count();
    out.extend(std::iter::repeat(FILLER).take(missing));
    out
}
