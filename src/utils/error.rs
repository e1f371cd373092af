use std::fmt;
use thiserror::Error;

/// Checked fields of a machine readable zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MrzField {
    DocumentNumber,
    DateOfBirth,
    DateOfExpiry,
    PersonalNumber,
    Composite,
}

impl fmt::Display for MrzField {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            MrzField::DocumentNumber => "document number",
            MrzField::DateOfBirth => "date of birth",
            MrzField::DateOfExpiry => "date of expiry",
            MrzField::PersonalNumber => "personal number",
            MrzField::Composite => "composite",
        };
        f.write_str(name)
    }
}

/// Everything that can go wrong while turning OCR text into an MRZ record.
///
/// None of these are fatal: while a document is being scanned, failure is the
/// normal state until enough good frames have been seen.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MrzError {
    #[error("MRZ extraction error: no candidate with a passing check digit")]
    NoCandidateFound,

    #[error("MRZ parsing error: {field} check digit failed")]
    ChecksumInvalid { field: MrzField },

    #[error("MRZ extraction error: need at least {required} characters, got {actual}")]
    MalformedLength { required: usize, actual: usize },

    #[error("not enough frames yet: {have} of {need}")]
    InsufficientFrames { have: usize, need: usize },

    #[error("consensus confidence {confidence} is below the threshold {threshold}")]
    LowConfidence { confidence: usize, threshold: usize },

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid access key: {0}")]
    InvalidAccessKey(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for MrzError {
    fn from(err: std::io::Error) -> Self {
        MrzError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for MrzError {
    fn from(err: serde_json::Error) -> Self {
        MrzError::Config(err.to_string())
    }
}
