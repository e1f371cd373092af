use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::processing::aggregator::{DEFAULT_MAX_FRAMES, DEFAULT_MIN_FRAMES};
use crate::utils::MrzError;

pub const DEFAULT_ACCEPT_CONFIDENCE: usize = 3;
/// Passing checks a frame's best zone needs before it is voted on.
pub const DEFAULT_MIN_CANDIDATE_SCORE: u8 = 3;
const MAX_CANDIDATE_SCORE: u8 = 4;

fn default_min_frames() -> usize {
    DEFAULT_MIN_FRAMES
}

fn default_max_frames() -> usize {
    DEFAULT_MAX_FRAMES
}

fn default_accept_confidence() -> usize {
    DEFAULT_ACCEPT_CONFIDENCE
}

fn default_min_candidate_score() -> u8 {
    DEFAULT_MIN_CANDIDATE_SCORE
}

/// Tunables of a scanning session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Frames held before a consensus is attempted.
    #[serde(default = "default_min_frames")]
    pub min_frames: usize,
    /// Window size at which the aggregator starts over.
    #[serde(default = "default_max_frames")]
    pub max_frames: usize,
    /// Individually valid frames required to accept a consensus.
    #[serde(default = "default_accept_confidence")]
    pub accept_confidence: usize,
    /// Lowest scanner score of a zone that may join the vote. Text that is
    /// not an MRZ routinely passes one or two check digits.
    #[serde(default = "default_min_candidate_score")]
    pub min_candidate_score: u8,
    /// Year two-digit MRZ years pivot on. The current year when unset.
    #[serde(default)]
    pub reference_year: Option<i32>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            min_frames: DEFAULT_MIN_FRAMES,
            max_frames: DEFAULT_MAX_FRAMES,
            accept_confidence: DEFAULT_ACCEPT_CONFIDENCE,
            min_candidate_score: DEFAULT_MIN_CANDIDATE_SCORE,
            reference_year: None,
        }
    }
}

impl ScanConfig {
    pub fn from_json_str(json: &str) -> Result<Self, MrzError> {
        let config: ScanConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, MrzError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|e| MrzError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), MrzError> {
        if self.min_frames == 0 {
            return Err(MrzError::Config("min_frames must be at least 1".to_string()));
        }
        if self.max_frames < self.min_frames {
            return Err(MrzError::Config(format!(
                "max_frames ({}) must not be below min_frames ({})",
                self.max_frames, self.min_frames
            )));
        }
        if !(1..=MAX_CANDIDATE_SCORE).contains(&self.min_candidate_score) {
            return Err(MrzError::Config(format!(
                "min_candidate_score must be between 1 and {}, got {}",
                MAX_CANDIDATE_SCORE, self.min_candidate_score
            )));
        }
        Ok(())
    }
}
