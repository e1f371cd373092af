// Decodes the fields of a validated zone at their fixed offsets.

use chrono::{Datelike, Local, NaiveDate};
use log::{debug, warn};

use super::normalizer::{self, CharContext};
use crate::models::{AccessKey, MrzCandidate, MrzData, MrzFormat, MrzResult, FILLER};
use crate::utils::MrzError;
use crate::validation::mrz::{MrzChecks, MrzValidator};

const NAME_SEPARATOR: &str = "<<";

/// Converts a `YYMMDD` MRZ date to ISO `YYYY-MM-DD`.
///
/// Two-digit years above `reference_year % 100` are read as 19xx, the rest
/// as 20xx. Returns `None` unless the input is exactly six digits forming a
/// real calendar date.
pub fn format_mrz_date(yymmdd: &str, reference_year: i32) -> Option<String> {
    if yymmdd.len() != 6 || !yymmdd.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let yy: i32 = yymmdd[0..2].parse().ok()?;
    let month: u32 = yymmdd[2..4].parse().ok()?;
    let day: u32 = yymmdd[4..6].parse().ok()?;

    let century = if yy > reference_year.rem_euclid(100) { 1900 } else { 2000 };
    NaiveDate::from_ymd_opt(century + yy, month, day)
        .map(|date| date.format("%Y-%m-%d").to_string())
}

/// Offsets of the fields that carry no check digit of their own.
struct Slices {
    country: (usize, usize, usize),
    nationality: (usize, usize, usize),
    sex: (usize, usize),
    names: (usize, usize, usize),
    optional_data: Option<(usize, usize, usize)>,
}

fn slices(format: MrzFormat) -> Slices {
    match format {
        MrzFormat::TD3 => Slices {
            country: (0, 2, 5),
            nationality: (1, 10, 13),
            sex: (1, 20),
            names: (0, 5, 44),
            optional_data: None,
        },
        MrzFormat::TD1 => Slices {
            country: (0, 2, 5),
            nationality: (1, 15, 18),
            sex: (1, 7),
            names: (2, 0, 30),
            optional_data: Some((0, 15, 30)),
        },
    }
}

#[derive(Debug, Clone)]
pub struct FieldExtractor {
    reference_year: i32,
}

impl Default for FieldExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor {
    /// Pivots two-digit years on the current local year.
    pub fn new() -> Self {
        FieldExtractor {
            reference_year: Local::now().year(),
        }
    }

    pub fn with_reference_year(reference_year: i32) -> Self {
        FieldExtractor { reference_year }
    }

    pub fn reference_year(&self) -> i32 {
        self.reference_year
    }

    pub fn extract(&self, result: &MrzResult) -> Option<MrzData> {
        match self.try_extract(result) {
            Ok(data) => Some(data),
            Err(err) => {
                debug!("zone rejected: {}", err);
                None
            }
        }
    }

    pub fn extract_candidate(&self, candidate: &MrzCandidate) -> Option<MrzData> {
        self.extract(&candidate.to_result())
    }

    /// Decodes `result`, failing when a mandatory check digit does not hold
    /// after single-character correction, when a line is too short, or when
    /// a date is not a calendar date.
    pub fn try_extract(&self, result: &MrzResult) -> Result<MrzData, MrzError> {
        let checks = MrzValidator::validate(result)?;
        if let Some(field) = checks.first_failure() {
            return Err(MrzError::ChecksumInvalid { field });
        }
        if !checks.composite {
            warn!("composite check digit failed for document {}", checks.document_number.value);
        }

        let date_of_birth = self.date(&checks.date_of_birth.value)?;
        let expiry_date = self.date(&checks.date_of_expiry.value)?;
        let layout = slices(result.format);
        let names = normalizer::repair_fillers(&field(result, layout.names), true);
        let (last_name, first_name) = parse_names(&names);

        let personal_number = match (&checks.personal_number, layout.optional_data) {
            (Some(check), _) => strip_fillers(&normalizer::repair_fillers(&check.value, false)),
            (None, Some(optional)) => {
                strip_fillers(&normalizer::repair_fillers(&field(result, optional), false))
            }
            (None, None) => String::new(),
        };

        let sex = match char_at(result, layout.sex) {
            Some(FILLER) | None => "X".to_string(),
            Some(c) => normalizer::normalize_with(&c.to_string(), CharContext::Letter),
        };

        Ok(MrzData {
            format: result.format,
            document_type: strip_fillers(&field(result, (0, 0, 2))),
            country_code: letters(&field(result, layout.country)),
            last_name,
            first_name,
            document_number: strip_fillers(&checks.document_number.value),
            nationality: letters(&field(result, layout.nationality)),
            date_of_birth,
            expiry_date,
            sex,
            personal_number,
            composite_valid: checks.composite,
            mrz_string: result.to_mrz_text(),
        })
    }

    /// Validated document number and dates of `result`, without decoding
    /// the rest of the zone.
    pub fn access_key(&self, result: &MrzResult) -> Option<AccessKey> {
        AccessKey::from_result(result)
    }

    fn date(&self, yymmdd: &str) -> Result<String, MrzError> {
        format_mrz_date(yymmdd, self.reference_year)
            .ok_or_else(|| MrzError::InvalidDate(format!("'{}' is not a calendar date", yymmdd)))
    }
}

impl AccessKey {
    /// Key material of a zone whose document number and dates validate.
    pub fn from_result(result: &MrzResult) -> Option<AccessKey> {
        let checks = MrzValidator::validate(result).ok()?;
        Self::from_checks(&checks)
    }

    fn from_checks(checks: &MrzChecks) -> Option<AccessKey> {
        let key_fields = [
            &checks.document_number,
            &checks.date_of_birth,
            &checks.date_of_expiry,
        ];
        if !key_fields.iter().all(|check| check.valid) {
            return None;
        }
        Some(AccessKey {
            document_number: strip_fillers(&checks.document_number.value),
            date_of_birth_yymmdd: checks.date_of_birth.value.clone(),
            date_of_expiry_yymmdd: checks.date_of_expiry.value.clone(),
        })
    }
}

/// Primary and secondary identifier, split on the first double filler.
fn parse_names(raw: &str) -> (String, String) {
    let mut parts = raw.splitn(2, NAME_SEPARATOR);
    let primary = parts.next().unwrap_or("");
    let secondary = parts.next().unwrap_or("");
    (name(primary), name(secondary))
}

fn name(raw: &str) -> String {
    normalizer::normalize_with(raw, CharContext::Letter)
        .split(FILLER)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn letters(raw: &str) -> String {
    strip_fillers(&normalizer::normalize_with(raw, CharContext::Letter))
}

fn strip_fillers(raw: &str) -> String {
    raw.chars().filter(|c| *c != FILLER).collect()
}

fn field(result: &MrzResult, (line, start, end): (usize, usize, usize)) -> String {
    result
        .line(line)
        .map(|text| text.chars().skip(start).take(end - start).collect())
        .unwrap_or_default()
}

fn char_at(result: &MrzResult, (line, col): (usize, usize)) -> Option<char> {
    result.line(line).and_then(|text| text.chars().nth(col))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TD3_LINE1: &str = "P<UTOERIKSSON<<ANNA<MARIA<<<<<<<<<<<<<<<<<<<";
    const TD3_LINE2: &str = "L898902C36UTO7408122F1204159ZE184226B<<<<<10";
    const TD1_LINE1: &str = "I<UTOD231458907<<<<<<<<<<<<<<<";
    const TD1_LINE2: &str = "7408122F1204159UTO<<<<<<<<<<<6";
    const TD1_LINE3: &str = "ERIKSSON<<ANNA<MARIA<<<<<<<<<<";

    fn extractor() -> FieldExtractor {
        FieldExtractor::with_reference_year(2026)
    }

    #[test]
    fn test_date_pivot() {
        assert_eq!(format_mrz_date("740812", 2026), Some("1974-08-12".to_string()));
        assert_eq!(format_mrz_date("120415", 2026), Some("2012-04-15".to_string()));
        assert_eq!(format_mrz_date("260101", 2026), Some("2026-01-01".to_string()));
        assert_eq!(format_mrz_date("270101", 2026), Some("1927-01-01".to_string()));
    }

    #[test]
    fn test_date_rejects_malformed_input() {
        assert_eq!(format_mrz_date("74081", 2026), None);
        assert_eq!(format_mrz_date("7408122", 2026), None);
        assert_eq!(format_mrz_date("74O812", 2026), None);
        assert_eq!(format_mrz_date("741312", 2026), None);
        assert_eq!(format_mrz_date("010231", 2026), None);
    }

    #[test]
    fn test_td3_specimen_fields() {
        let data = extractor().extract(&MrzResult::td3(TD3_LINE1, TD3_LINE2)).unwrap();
        assert_eq!(data.format, MrzFormat::TD3);
        assert_eq!(data.document_type, "P");
        assert_eq!(data.country_code, "UTO");
        assert_eq!(data.last_name, "ERIKSSON");
        assert_eq!(data.first_name, "ANNA MARIA");
        assert_eq!(data.document_number, "L898902C3");
        assert_eq!(data.nationality, "UTO");
        assert_eq!(data.date_of_birth, "1974-08-12");
        assert_eq!(data.expiry_date, "2012-04-15");
        assert_eq!(data.sex, "F");
        assert_eq!(data.personal_number, "ZE184226B");
        assert!(data.composite_valid);
        assert_eq!(data.mrz_string, format!("{}\n{}", TD3_LINE1, TD3_LINE2));
    }

    #[test]
    fn test_td1_specimen_fields() {
        let data = extractor()
            .extract(&MrzResult::td1(TD1_LINE1, TD1_LINE2, TD1_LINE3))
            .unwrap();
        assert_eq!(data.format, MrzFormat::TD1);
        assert_eq!(data.document_type, "I");
        assert_eq!(data.document_number, "D23145890");
        assert_eq!(data.nationality, "UTO");
        assert_eq!(data.sex, "F");
        assert_eq!(data.last_name, "ERIKSSON");
        assert_eq!(data.first_name, "ANNA MARIA");
        assert_eq!(data.personal_number, "");
        assert!(data.composite_valid);
    }

    #[test]
    fn test_names_are_read_in_letter_context() {
        let line1 = TD3_LINE1.replacen("ERIKSSON", "ER1KSS0N", 1);
        let data = extractor().extract(&MrzResult::td3(line1, TD3_LINE2)).unwrap();
        assert_eq!(data.last_name, "ERIKSSON");
    }

    #[test]
    fn test_fillers_read_as_k_are_repaired() {
        let line1 = TD3_LINE1.replacen("MARIA<<<", "MARIA<<K", 1);
        let line2 = TD3_LINE2.replacen("ZE184226B<", "ZE184226BK", 1);
        let data = extractor().extract(&MrzResult::td3(line1, line2)).unwrap();
        assert_eq!(data.last_name, "ERIKSSON");
        assert_eq!(data.first_name, "ANNA MARIA");
        assert_eq!(data.personal_number, "ZE184226B");
        assert!(data.composite_valid);
    }

    #[test]
    fn test_k_inside_a_name_is_kept() {
        let line1 = TD3_LINE1.replacen("ANNA<MARIA", "ANNA<MARK<", 1);
        let data = extractor().extract(&MrzResult::td3(line1, TD3_LINE2)).unwrap();
        assert_eq!(data.first_name, "ANNA MARK");
    }

    #[test]
    fn test_td1_optional_data_fillers_are_repaired() {
        let line1 = TD1_LINE1.replacen("907<<<<", "907<K<<", 1);
        let data = extractor()
            .extract(&MrzResult::td1(line1, TD1_LINE2, TD1_LINE3))
            .unwrap();
        assert_eq!(data.personal_number, "");
        assert!(data.composite_valid);
    }

    #[test]
    fn test_corrected_document_number_is_reported() {
        let noisy = TD3_LINE2.replacen("L898902C3", "L8989O2C3", 1);
        let data = extractor().extract(&MrzResult::td3(TD3_LINE1, noisy)).unwrap();
        assert_eq!(data.document_number, "L898902C3");
    }

    #[test]
    fn test_failing_mandatory_check_is_rejected() {
        let noisy = TD3_LINE2.replacen("120415", "120416", 1);
        let result = MrzResult::td3(TD3_LINE1, noisy);
        assert!(extractor().extract(&result).is_none());
        assert!(matches!(
            extractor().try_extract(&result),
            Err(MrzError::ChecksumInvalid {
                field: crate::utils::MrzField::DateOfExpiry
            })
        ));
    }

    #[test]
    fn test_short_lines_are_rejected() {
        let result = MrzResult::td3(TD3_LINE1, &TD3_LINE2[..30]);
        assert!(matches!(
            extractor().try_extract(&result),
            Err(MrzError::MalformedLength { .. })
        ));
    }

    #[test]
    fn test_access_key_from_zone() {
        let key = AccessKey::from_result(&MrzResult::td3(TD3_LINE1, TD3_LINE2)).unwrap();
        assert_eq!(key.document_number, "L898902C3");
        assert_eq!(key.date_of_birth_yymmdd, "740812");
        assert_eq!(key.date_of_expiry_yymmdd, "120415");

        let td1 = extractor()
            .access_key(&MrzResult::td1(TD1_LINE1, TD1_LINE2, TD1_LINE3))
            .unwrap();
        assert_eq!(td1.document_number, "D23145890");
    }
}
