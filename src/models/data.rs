use std::fmt;

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::utils::MrzError;

/// MRZ filler character.
pub const FILLER: char = '<';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MrzFormat {
    TD1, // ID card, 3 lines of 30
    TD3, // Passport, 2 lines of 44
}

impl MrzFormat {
    pub fn line_length(&self) -> usize {
        match self {
            MrzFormat::TD1 => 30,
            MrzFormat::TD3 => 44,
        }
    }

    pub fn line_count(&self) -> usize {
        match self {
            MrzFormat::TD1 => 3,
            MrzFormat::TD3 => 2,
        }
    }

    /// Number of MRZ characters in a complete zone of this format.
    pub fn zone_length(&self) -> usize {
        self.line_length() * self.line_count()
    }
}

impl fmt::Display for MrzFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MrzFormat::TD1 => f.write_str("TD1"),
            MrzFormat::TD3 => f.write_str("TD3"),
        }
    }
}

/// The lines of a machine readable zone, as accepted for further processing.
///
/// `line3` is present exactly when the format is TD1.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MrzResult {
    pub line1: String,
    pub line2: String,
    pub line3: Option<String>,
    pub format: MrzFormat,
}

impl MrzResult {
    pub fn td3(line1: impl Into<String>, line2: impl Into<String>) -> Self {
        MrzResult {
            line1: line1.into(),
            line2: line2.into(),
            line3: None,
            format: MrzFormat::TD3,
        }
    }

    pub fn td1(
        line1: impl Into<String>,
        line2: impl Into<String>,
        line3: impl Into<String>,
    ) -> Self {
        MrzResult {
            line1: line1.into(),
            line2: line2.into(),
            line3: Some(line3.into()),
            format: MrzFormat::TD1,
        }
    }

    pub fn lines(&self) -> Vec<&str> {
        let mut lines = vec![self.line1.as_str(), self.line2.as_str()];
        if let Some(line3) = &self.line3 {
            lines.push(line3.as_str());
        }
        lines
    }

    /// Line `index` (0-based), if the zone has it.
    pub fn line(&self, index: usize) -> Option<&str> {
        match index {
            0 => Some(&self.line1),
            1 => Some(&self.line2),
            2 => self.line3.as_deref(),
            _ => None,
        }
    }

    /// Canonical newline-joined MRZ text. Feeding it back to the scanner
    /// yields the same zone.
    pub fn to_mrz_text(&self) -> String {
        self.lines().join("\n")
    }
}

impl fmt::Display for MrzResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.to_mrz_text())
    }
}

/// A scanner hit: the zone lines plus the number of check digits (0..=4)
/// that validate for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MrzCandidate {
    pub line1: String,
    pub line2: String,
    pub line3: Option<String>,
    pub format: MrzFormat,
    pub score: u8,
}

impl MrzCandidate {
    pub fn new(result: MrzResult, score: u8) -> Self {
        MrzCandidate {
            line1: result.line1,
            line2: result.line2,
            line3: result.line3,
            format: result.format,
            score,
        }
    }

    pub fn to_result(&self) -> MrzResult {
        MrzResult {
            line1: self.line1.clone(),
            line2: self.line2.clone(),
            line3: self.line3.clone(),
            format: self.format,
        }
    }

    fn same_zone(&self, other: &MrzCandidate) -> bool {
        self.format == other.format
            && self.line1 == other.line1
            && self.line2 == other.line2
            && self.line3 == other.line3
    }

    pub(crate) fn is_duplicate_of_any(&self, others: &[MrzCandidate]) -> bool {
        others.iter().any(|other| self.same_zone(other))
    }
}

impl From<MrzCandidate> for MrzResult {
    fn from(candidate: MrzCandidate) -> Self {
        MrzResult {
            line1: candidate.line1,
            line2: candidate.line2,
            line3: candidate.line3,
            format: candidate.format,
        }
    }
}

/// Fully decoded MRZ record. Dates are ISO `YYYY-MM-DD`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MrzData {
    pub format: MrzFormat,
    pub document_type: String,
    pub country_code: String,
    pub last_name: String,
    pub first_name: String,
    pub document_number: String,
    pub nationality: String,
    pub date_of_birth: String,
    pub expiry_date: String,
    pub sex: String,
    pub personal_number: String,
    pub composite_valid: bool,
    pub mrz_string: String,
}

impl MrzData {
    pub fn access_key(&self) -> AccessKey {
        AccessKey {
            document_number: self.document_number.clone(),
            date_of_birth_yymmdd: iso_to_yymmdd(&self.date_of_birth),
            date_of_expiry_yymmdd: iso_to_yymmdd(&self.expiry_date),
        }
    }
}

fn iso_to_yymmdd(iso: &str) -> String {
    // YYYY-MM-DD
    match (iso.get(2..4), iso.get(5..7), iso.get(8..10)) {
        (Some(yy), Some(mm), Some(dd)) => format!("{}{}{}", yy, mm, dd),
        _ => String::new(),
    }
}

lazy_static! {
    static ref DOCUMENT_NUMBER_PATTERN: Regex = Regex::new(r"^[A-Z0-9]{1,9}$").unwrap();
    static ref MRZ_DATE_PATTERN: Regex = Regex::new(r"^[0-9]{6}$").unwrap();
}

/// The subset of the MRZ that the chip access protocol (BAC) derives its key from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccessKey {
    pub document_number: String,
    pub date_of_birth_yymmdd: String,
    pub date_of_expiry_yymmdd: String,
}

impl AccessKey {
    /// Build a key from manually entered values, bypassing OCR entirely.
    pub fn manual(
        document_number: &str,
        date_of_birth: &str,
        date_of_expiry: &str,
    ) -> Result<Self, MrzError> {
        let document_number: String = document_number
            .chars()
            .filter(|c| !c.is_whitespace() && *c != FILLER)
            .flat_map(|c| c.to_uppercase())
            .collect();
        if !DOCUMENT_NUMBER_PATTERN.is_match(&document_number) {
            return Err(MrzError::InvalidAccessKey(format!(
                "document number '{}' must be 1 to 9 letters or digits",
                document_number
            )));
        }

        Ok(AccessKey {
            document_number,
            date_of_birth_yymmdd: Self::checked_date(date_of_birth)?,
            date_of_expiry_yymmdd: Self::checked_date(date_of_expiry)?,
        })
    }

    fn checked_date(value: &str) -> Result<String, MrzError> {
        let value = value.trim();
        if !MRZ_DATE_PATTERN.is_match(value) {
            return Err(MrzError::InvalidAccessKey(format!("date '{}' must be YYMMDD", value)));
        }
        NaiveDate::parse_from_str(value, "%y%m%d")
            .map_err(|_| MrzError::InvalidDate(format!("'{}' is not a calendar date", value)))?;
        Ok(value.to_string())
    }
}

/// Burst aggregator output: the consensus zone and how many contributing
/// frames were individually valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedMrz {
    pub result: MrzResult,
    pub confidence: usize,
}

impl AggregatedMrz {
    pub fn is_accepted(&self, threshold: usize) -> bool {
        self.confidence >= threshold
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub issue_type: ValidationIssueType,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationIssueType {
    Format,
    Expiry,
}

impl fmt::Display for ValidationIssueType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ValidationIssueType::Format => f.write_str("FORMAT"),
            ValidationIssueType::Expiry => f.write_str("EXPIRY"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatValidationResult {
    pub is_valid: bool,
    pub issues: Vec<ValidationIssue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiryValidationResult {
    pub is_valid: bool,
    pub days_remaining: Option<i64>,
    pub issues: Vec<ValidationIssue>,
}
