// Locates TD3 and TD1 shaped zones inside arbitrary OCR text.

use chrono::NaiveDate;
use log::debug;

use super::normalizer;
use crate::models::{MrzCandidate, MrzFormat, MrzResult};
use crate::utils::MrzError;
use crate::validation::mrz::{numeric_positions, MrzValidator};

const TD3_ANCHOR: &str = "P<";

pub struct CandidateScanner;

impl CandidateScanner {
    /// Every zone in `text` with at least one passing check digit, in the
    /// order found: `P<` anchored passports, then sliding TD3 windows, then
    /// sliding TD1 windows. Sliding windows need 88 normalised characters.
    pub fn find_candidates(text: &str) -> Vec<MrzCandidate> {
        Self::try_find_candidates(text).unwrap_or_default()
    }

    /// Same as [`find_candidates`](Self::find_candidates) for text that is
    /// already split into lines.
    pub fn find_candidates_in_lines(lines: &[&str]) -> Vec<MrzCandidate> {
        Self::find_candidates(&lines.join("\n"))
    }

    /// Fails with `MalformedLength` when no anchored zone is found and the
    /// text is too short for a sliding window.
    pub fn try_find_candidates(text: &str) -> Result<Vec<MrzCandidate>, MrzError> {
        let mut candidates = Vec::new();
        for zone in Self::anchored_zones(text) {
            Self::push_scored(&mut candidates, zone);
        }

        let flat = normalizer::normalize(text, false);
        let shortest = MrzFormat::TD3.zone_length();
        if flat.len() >= shortest {
            for format in [MrzFormat::TD3, MrzFormat::TD1] {
                for zone in Self::windowed_zones(&flat, format) {
                    Self::push_scored(&mut candidates, zone);
                }
            }
        }

        debug!(
            "scanner found {} candidate(s) in {} MRZ characters",
            candidates.len(),
            flat.len()
        );
        if !candidates.is_empty() {
            return Ok(candidates);
        }
        if flat.len() < shortest {
            return Err(MrzError::MalformedLength {
                required: shortest,
                actual: flat.len(),
            });
        }
        Err(MrzError::NoCandidateFound)
    }

    /// Highest ranked candidate of `text`.
    pub fn best_candidate(text: &str) -> Option<MrzCandidate> {
        Self::ranked(Self::find_candidates(text)).into_iter().next()
    }

    /// Orders candidates by score, then by whether both dates are calendar
    /// dates. Discovery order is kept among equals.
    pub fn ranked(mut candidates: Vec<MrzCandidate>) -> Vec<MrzCandidate> {
        candidates.sort_by_cached_key(|candidate| {
            std::cmp::Reverse((candidate.score, Self::has_calendar_dates(candidate)))
        });
        candidates
    }

    /// Filler-only dates pass their check digit, so a misaligned window can
    /// score as high as the real zone.
    fn has_calendar_dates(candidate: &MrzCandidate) -> bool {
        let is_date = |yymmdd: &str| NaiveDate::parse_from_str(yymmdd, "%y%m%d").is_ok();
        match MrzValidator::validate(&candidate.to_result()) {
            Ok(checks) => {
                is_date(&checks.date_of_birth.value) && is_date(&checks.date_of_expiry.value)
            }
            Err(_) => false,
        }
    }

    fn anchored_zones(text: &str) -> Vec<MrzResult> {
        let lines: Vec<String> = text
            .lines()
            .map(|line| normalizer::normalize(line, false))
            .filter(|line| !line.is_empty())
            .collect();
        let width = MrzFormat::TD3.line_length();

        lines
            .windows(2)
            .filter(|pair| pair[0].starts_with(TD3_ANCHOR))
            .map(|pair| {
                let zone = MrzResult::td3(
                    normalizer::pad_or_truncate(&pair[0], width),
                    normalizer::pad_or_truncate(&pair[1], width),
                );
                Self::with_numeric_fields(zone)
            })
            .collect()
    }

    fn windowed_zones(flat: &str, format: MrzFormat) -> Vec<MrzResult> {
        let chars: Vec<char> = flat.chars().collect();
        let width = format.line_length();
        let total = format.zone_length();
        if chars.len() < total {
            return Vec::new();
        }

        (0..=chars.len() - total)
            .map(|offset| {
                let line = |index: usize| -> String {
                    let start = offset + index * width;
                    chars[start..start + width].iter().collect()
                };
                let zone = match format {
                    MrzFormat::TD3 => MrzResult::td3(line(0), line(1)),
                    MrzFormat::TD1 => MrzResult::td1(line(0), line(1), line(2)),
                };
                Self::with_numeric_fields(zone)
            })
            .collect()
    }

    /// Reads dates and check digits as digits.
    fn with_numeric_fields(zone: MrzResult) -> MrzResult {
        let mut lines: Vec<Vec<char>> = zone
            .lines()
            .iter()
            .map(|line| line.chars().collect())
            .collect();
        for (line, col) in numeric_positions(zone.format) {
            if let Some(c) = lines.get_mut(line).and_then(|chars| chars.get_mut(col)) {
                *c = normalizer::to_digit(*c).unwrap_or(*c);
            }
        }
        let mut lines = lines
            .into_iter()
            .map(|chars| chars.into_iter().collect::<String>());
        let line1 = lines.next().unwrap_or_default();
        let line2 = lines.next().unwrap_or_default();
        match zone.format {
            MrzFormat::TD3 => MrzResult::td3(line1, line2),
            MrzFormat::TD1 => MrzResult::td1(line1, line2, lines.next().unwrap_or_default()),
        }
    }

    fn push_scored(candidates: &mut Vec<MrzCandidate>, zone: MrzResult) {
        let score = match MrzValidator::validate(&zone) {
            Ok(checks) => checks.score(),
            Err(_) => 0,
        };
        if score == 0 {
            return;
        }
        let candidate = MrzCandidate::new(zone, score);
        if !candidate.is_duplicate_of_any(candidates) {
            candidates.push(candidate);
        }
    }
}
