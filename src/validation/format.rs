use log::warn;

use crate::models::{
    FormatValidationResult, MrzData, MrzFormat, ValidationIssue, ValidationIssueType,
};

/// First letters of the document code each format is issued with.
const TD3_DOCUMENT_CODES: [char; 1] = ['P'];
const TD1_DOCUMENT_CODES: [char; 3] = ['I', 'A', 'C'];

pub struct FormatValidator;

impl FormatValidator {
    /// Cross-checks a decoded record against its zone format. Issues found
    /// here never reject the record.
    pub fn validate(data: &MrzData) -> FormatValidationResult {
        let mut issues = Vec::new();

        let expected: &[char] = match data.format {
            MrzFormat::TD3 => &TD3_DOCUMENT_CODES,
            MrzFormat::TD1 => &TD1_DOCUMENT_CODES,
        };
        match data.document_type.chars().next() {
            Some(code) if expected.contains(&code) => {}
            _ => issues.push(ValidationIssue {
                issue_type: ValidationIssueType::Format,
                message: format!(
                    "Document code '{}' is unusual for a {} zone",
                    data.document_type, data.format
                ),
            }),
        }

        if data.document_number.is_empty() {
            issues.push(ValidationIssue {
                issue_type: ValidationIssueType::Format,
                message: "Document number is missing".to_string(),
            });
        }

        if data.last_name.is_empty() {
            issues.push(ValidationIssue {
                issue_type: ValidationIssueType::Format,
                message: "Primary identifier is missing".to_string(),
            });
        }

        if !data.composite_valid {
            issues.push(ValidationIssue {
                issue_type: ValidationIssueType::Format,
                message: "Composite check digit failed".to_string(),
            });
        }

        for issue in &issues {
            warn!("{}", issue.message);
        }

        FormatValidationResult {
            is_valid: issues.is_empty(),
            issues,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MrzResult;
    use crate::processing::FieldExtractor;

    fn specimen() -> MrzData {
        FieldExtractor::with_reference_year(2026)
            .extract(&MrzResult::td3(
                "P<UTOERIKSSON<<ANNA<MARIA<<<<<<<<<<<<<<<<<<<",
                "L898902C36UTO7408122F1204159ZE184226B<<<<<10",
            ))
            .unwrap()
    }

    #[test]
    fn test_passport_specimen_is_consistent() {
        let result = FormatValidator::validate(&specimen());
        assert!(result.is_valid);
        assert!(result.issues.is_empty());
    }

    #[test]
    fn test_id_card_code_in_passport_zone_is_flagged() {
        let mut data = specimen();
        data.document_type = "ID".to_string();
        let result = FormatValidator::validate(&data);
        assert!(!result.is_valid);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].issue_type, ValidationIssueType::Format);
    }

    #[test]
    fn test_missing_fields_are_flagged() {
        let mut data = specimen();
        data.last_name.clear();
        data.composite_valid = false;
        assert_eq!(FormatValidator::validate(&data).issues.len(), 2);
    }
}
