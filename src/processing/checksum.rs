// ICAO 9303 check digits: 7-3-1 weighted sum modulo 10.

use log::trace;

use super::normalizer::{self, Direction};
use crate::models::FILLER;

const WEIGHTS: [u32; 3] = [7, 3, 1];

/// Numeric value of an MRZ character. Anything outside the alphabet counts
/// as 0, the same as the filler.
pub fn char_value(c: char) -> u32 {
    match c {
        '0'..='9' => c as u32 - '0' as u32,
        'A'..='Z' => c as u32 - 'A' as u32 + 10,
        _ => 0,
    }
}

pub fn checksum(data: &str) -> u8 {
    let sum: u32 = data
        .chars()
        .enumerate()
        .map(|(i, c)| char_value(c) * WEIGHTS[i % 3])
        .sum();
    (sum % 10) as u8
}

/// Reads a printed check digit. A filler stands for 0 (empty optional
/// fields), and letters that look like a digit are read as that digit.
pub fn check_digit_value(c: char) -> Option<u8> {
    if c == FILLER {
        return Some(0);
    }
    normalizer::to_digit(c)
        .and_then(|d| d.to_digit(10))
        .map(|d| d as u8)
}

/// Validates `data` against `expected`, allowing a single confusable
/// character to be swapped in either direction.
pub fn validate_and_correct(data: &str, expected: u8) -> (bool, String) {
    validate_and_correct_with(data, expected, Direction::Both)
}

/// Like [`validate_and_correct`], restricted to one swap direction.
///
/// With [`Direction::Both`], every letter-to-digit swap is tried before any
/// digit-to-letter swap. At most one character is changed; if no single
/// swap fixes the field the original is returned unchanged.
pub fn validate_and_correct_with(data: &str, expected: u8, direction: Direction) -> (bool, String) {
    if checksum(data) == expected {
        return (true, data.to_string());
    }

    let passes: &[Direction] = match direction {
        Direction::ToDigit => &[Direction::ToDigit],
        Direction::ToLetter => &[Direction::ToLetter],
        Direction::Both => &[Direction::ToDigit, Direction::ToLetter],
    };

    let chars: Vec<char> = data.chars().collect();
    for pass in passes {
        for (i, c) in chars.iter().enumerate() {
            let Some(replacement) = normalizer::swap(*c, *pass) else {
                continue;
            };
            let mut attempt = chars.clone();
            attempt[i] = replacement;
            let attempt: String = attempt.into_iter().collect();
            if checksum(&attempt) == expected {
                trace!("check digit corrected '{}' -> '{}'", data, attempt);
                return (true, attempt);
            }
        }
    }

    (false, data.to_string())
}
