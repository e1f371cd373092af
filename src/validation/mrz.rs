use crate::models::{MrzFormat, MrzResult, FILLER};
use crate::processing::checksum::{self, check_digit_value};
use crate::processing::normalizer::{self, Direction};
use crate::utils::{MrzError, MrzField};

/// Half-open character range on one MRZ line.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Span {
    pub line: usize,
    pub start: usize,
    pub end: usize,
}

const fn span(line: usize, start: usize, end: usize) -> Span {
    Span { line, start, end }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct CheckedSpan {
    pub data: Span,
    pub check: (usize, usize),
    pub numeric: bool,
}

/// Where the check-digit protected fields sit for one format (ICAO 9303
/// Part 4 for TD3, Part 5 for TD1).
#[derive(Debug)]
pub(crate) struct Layout {
    pub document_number: CheckedSpan,
    pub date_of_birth: CheckedSpan,
    pub date_of_expiry: CheckedSpan,
    pub personal_number: Option<CheckedSpan>,
    pub composite: &'static [Span],
    pub composite_check: (usize, usize),
}

const TD3_COMPOSITE: [Span; 3] = [span(1, 0, 10), span(1, 13, 20), span(1, 21, 43)];

static TD3_LAYOUT: Layout = Layout {
    document_number: CheckedSpan { data: span(1, 0, 9), check: (1, 9), numeric: false },
    date_of_birth: CheckedSpan { data: span(1, 13, 19), check: (1, 19), numeric: true },
    date_of_expiry: CheckedSpan { data: span(1, 21, 27), check: (1, 27), numeric: true },
    personal_number: Some(CheckedSpan { data: span(1, 28, 42), check: (1, 42), numeric: false }),
    composite: &TD3_COMPOSITE,
    composite_check: (1, 43),
};

const TD1_COMPOSITE: [Span; 4] = [span(0, 5, 30), span(1, 0, 7), span(1, 8, 15), span(1, 18, 29)];

static TD1_LAYOUT: Layout = Layout {
    document_number: CheckedSpan { data: span(0, 5, 14), check: (0, 14), numeric: false },
    date_of_birth: CheckedSpan { data: span(1, 0, 6), check: (1, 6), numeric: true },
    date_of_expiry: CheckedSpan { data: span(1, 8, 14), check: (1, 14), numeric: true },
    personal_number: None,
    composite: &TD1_COMPOSITE,
    composite_check: (1, 29),
};

pub(crate) fn layout(format: MrzFormat) -> &'static Layout {
    match format {
        MrzFormat::TD1 => &TD1_LAYOUT,
        MrzFormat::TD3 => &TD3_LAYOUT,
    }
}

/// (line, column) pairs that only ever hold digits: dates and check digits.
pub(crate) fn numeric_positions(format: MrzFormat) -> Vec<(usize, usize)> {
    let layout = layout(format);
    let mut positions = Vec::new();
    let mut checked = vec![layout.document_number, layout.date_of_birth, layout.date_of_expiry];
    checked.extend(layout.personal_number);
    for field in checked {
        if field.numeric {
            positions.extend((field.data.start..field.data.end).map(|col| (field.data.line, col)));
        }
        positions.push(field.check);
    }
    positions.push(layout.composite_check);
    positions
}

/// Outcome of checking one field against its check digit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldCheck {
    /// Field value after correction, fillers kept.
    pub value: String,
    pub valid: bool,
    pub corrected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MrzChecks {
    pub document_number: FieldCheck,
    pub date_of_birth: FieldCheck,
    pub date_of_expiry: FieldCheck,
    /// Only checked when the field is not entirely filler.
    pub personal_number: Option<FieldCheck>,
    pub composite: bool,
}

impl MrzChecks {
    /// Number of passing checks among document number, birth date, expiry
    /// date and composite.
    pub fn score(&self) -> u8 {
        [
            self.document_number.valid,
            self.date_of_birth.valid,
            self.date_of_expiry.valid,
            self.composite,
        ]
        .iter()
        .filter(|ok| **ok)
        .count() as u8
    }

    /// First mandatory field that failed, if any.
    pub fn first_failure(&self) -> Option<MrzField> {
        if !self.document_number.valid {
            return Some(MrzField::DocumentNumber);
        }
        if !self.date_of_birth.valid {
            return Some(MrzField::DateOfBirth);
        }
        if !self.date_of_expiry.valid {
            return Some(MrzField::DateOfExpiry);
        }
        match &self.personal_number {
            Some(check) if !check.valid => Some(MrzField::PersonalNumber),
            _ => None,
        }
    }

    pub fn mandatory_valid(&self) -> bool {
        self.first_failure().is_none()
    }

    pub fn is_fully_valid(&self) -> bool {
        self.mandatory_valid() && self.composite
    }
}

pub struct MrzValidator;

impl MrzValidator {
    /// Runs every check digit of the zone, correcting at most one character
    /// per field.
    pub fn validate(result: &MrzResult) -> Result<MrzChecks, MrzError> {
        let mut lines = Self::checked_lines(result)?;
        let layout = layout(result.format);

        let document_number = Self::check_field(&mut lines, &layout.document_number);
        let date_of_birth = Self::check_field(&mut lines, &layout.date_of_birth);
        let date_of_expiry = Self::check_field(&mut lines, &layout.date_of_expiry);

        let personal_number = match layout.personal_number {
            Some(field) if !Self::is_all_filler(&lines, &field.data) => {
                Some(Self::check_field(&mut lines, &field))
            }
            _ => None,
        };

        let composite_data: String = layout
            .composite
            .iter()
            .map(|part| Self::read(&lines, part))
            .collect();
        // Strict: the parts were already corrected field by field, and a
        // further swap here can mask an uncorrectable field.
        let composite = check_digit_value(Self::at(&lines, layout.composite_check))
            .map_or(false, |expected| checksum::checksum(&composite_data) == expected);

        Ok(MrzChecks {
            document_number,
            date_of_birth,
            date_of_expiry,
            personal_number,
            composite,
        })
    }

    /// Line characters of a zone, rejecting zones that are too short for
    /// fixed-offset slicing.
    fn checked_lines(result: &MrzResult) -> Result<Vec<Vec<char>>, MrzError> {
        let required = result.format.line_length();
        (0..result.format.line_count())
            .map(|index| {
                let line = result.line(index).unwrap_or("");
                let chars: Vec<char> = line.chars().collect();
                if chars.len() < required {
                    Err(MrzError::MalformedLength {
                        required,
                        actual: chars.len(),
                    })
                } else {
                    Ok(chars)
                }
            })
            .collect()
    }

    fn check_field(lines: &mut [Vec<char>], field: &CheckedSpan) -> FieldCheck {
        let raw = Self::read(lines, &field.data);
        let value = if field.numeric {
            raw.chars()
                .map(|c| normalizer::to_digit(c).unwrap_or(c))
                .collect()
        } else {
            raw.clone()
        };
        let direction = if field.numeric { Direction::ToDigit } else { Direction::Both };

        let (valid, value) = match check_digit_value(Self::at(lines, field.check)) {
            Some(expected) => checksum::validate_and_correct_with(&value, expected, direction),
            None => (false, value),
        };

        if valid {
            Self::write(lines, &field.data, &value);
        }
        FieldCheck {
            corrected: valid && value != raw,
            value,
            valid,
        }
    }

    fn read(lines: &[Vec<char>], span: &Span) -> String {
        lines[span.line][span.start..span.end].iter().collect()
    }

    fn write(lines: &mut [Vec<char>], span: &Span, value: &str) {
        for (offset, c) in value.chars().enumerate() {
            lines[span.line][span.start + offset] = c;
        }
    }

    fn at(lines: &[Vec<char>], (line, col): (usize, usize)) -> char {
        lines[line][col]
    }

    fn is_all_filler(lines: &[Vec<char>], span: &Span) -> bool {
        lines[span.line][span.start..span.end]
            .iter()
            .all(|c| *c == FILLER)
    }
}
