use chrono::{Local, NaiveDate};

use crate::models::{ExpiryValidationResult, MrzData, ValidationIssue, ValidationIssueType};

pub struct ExpiryValidator;

impl ExpiryValidator {
    pub fn validate_today(data: &MrzData) -> ExpiryValidationResult {
        Self::validate(data, Local::now().date_naive())
    }

    /// A document is valid through its expiry day.
    pub fn validate(data: &MrzData, today: NaiveDate) -> ExpiryValidationResult {
        let mut issues = Vec::new();

        let days_remaining = match NaiveDate::parse_from_str(&data.expiry_date, "%Y-%m-%d") {
            Ok(expiry) => {
                let days = (expiry - today).num_days();
                if days < 0 {
                    issues.push(ValidationIssue {
                        issue_type: ValidationIssueType::Expiry,
                        message: format!("Document expired on {}", data.expiry_date),
                    });
                }
                Some(days)
            }
            Err(_) => {
                issues.push(ValidationIssue {
                    issue_type: ValidationIssueType::Expiry,
                    message: format!("Invalid expiry date '{}'", data.expiry_date),
                });
                None
            }
        };

        ExpiryValidationResult {
            is_valid: issues.is_empty(),
            days_remaining,
            issues,
        }
    }
}
