use log::{debug, info};

use crate::config::ScanConfig;
use crate::models::{AggregatedMrz, MrzData};
use crate::processing::{BurstAggregator, CandidateScanner, FieldExtractor};
use crate::utils::MrzError;

/// What one frame did to a scanning session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// The frame held no zone scoring at least `min_candidate_score`.
    NoCandidate,
    /// Waiting for more frames before voting.
    Pending { frames: usize, needed: usize },
    /// A consensus exists but too few frames were valid on their own.
    LowConfidence { consensus: AggregatedMrz, threshold: usize },
    /// Consensus accepted and decoded. The session has started over.
    Accepted { data: MrzData, consensus: AggregatedMrz },
    /// Consensus accepted but it does not decode.
    Rejected { error: MrzError, consensus: AggregatedMrz },
}

impl ScanOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ScanOutcome::Accepted { .. })
    }

    pub fn data(&self) -> Option<&MrzData> {
        match self {
            ScanOutcome::Accepted { data, .. } => Some(data),
            _ => None,
        }
    }

    /// The failure this outcome stands for, if any.
    pub fn error(&self) -> Option<MrzError> {
        match self {
            ScanOutcome::NoCandidate => Some(MrzError::NoCandidateFound),
            ScanOutcome::Pending { frames, needed } => Some(MrzError::InsufficientFrames {
                have: *frames,
                need: *needed,
            }),
            ScanOutcome::LowConfidence { consensus, threshold } => Some(MrzError::LowConfidence {
                confidence: consensus.confidence,
                threshold: *threshold,
            }),
            ScanOutcome::Accepted { .. } => None,
            ScanOutcome::Rejected { error, .. } => Some(error.clone()),
        }
    }
}

/// Scanner, aggregator and extractor for one document being scanned.
///
/// Each concurrent scan needs its own session; frames for a session must be
/// fed in order.
#[derive(Debug, Clone)]
pub struct ScanSession {
    config: ScanConfig,
    aggregator: BurstAggregator,
    extractor: FieldExtractor,
}

impl ScanSession {
    pub fn new(config: ScanConfig) -> Result<Self, MrzError> {
        config.validate()?;
        let extractor = match config.reference_year {
            Some(year) => FieldExtractor::with_reference_year(year),
            None => FieldExtractor::new(),
        };
        Ok(ScanSession {
            aggregator: BurstAggregator::from_config(&config),
            extractor,
            config,
        })
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn extractor(&self) -> &FieldExtractor {
        &self.extractor
    }

    pub fn frames_held(&self) -> usize {
        self.aggregator.len()
    }

    /// Feeds the OCR text of one frame. `None` means the OCR pass produced
    /// nothing and leaves the session untouched, as does a frame whose best
    /// zone scores below `min_candidate_score`.
    pub fn process_frame(&mut self, text: Option<&str>) -> ScanOutcome {
        let candidate = match text.and_then(CandidateScanner::best_candidate) {
            Some(candidate) => candidate,
            None => return ScanOutcome::NoCandidate,
        };
        if candidate.score < self.config.min_candidate_score {
            debug!(
                "dropping {} candidate with score {} below {}",
                candidate.format, candidate.score, self.config.min_candidate_score
            );
            return ScanOutcome::NoCandidate;
        }
        debug!("frame candidate {} with score {}", candidate.format, candidate.score);

        let consensus = match self.aggregator.aggregate(Some(candidate.into())) {
            Some(consensus) => consensus,
            None => {
                return ScanOutcome::Pending {
                    frames: self.aggregator.len(),
                    needed: self.aggregator.min_frames(),
                }
            }
        };

        let threshold = self.config.accept_confidence;
        if !consensus.is_accepted(threshold) {
            return ScanOutcome::LowConfidence { consensus, threshold };
        }

        match self.extractor.try_extract(&consensus.result) {
            Ok(data) => {
                info!(
                    "accepted {} document {} with confidence {}",
                    data.format, data.document_number, consensus.confidence
                );
                self.reset();
                ScanOutcome::Accepted { data, consensus }
            }
            Err(error) => ScanOutcome::Rejected { error, consensus },
        }
    }

    /// Single-frame path: decodes the best zone of `text` that passes its
    /// mandatory checks.
    pub fn scan_once(&self, text: &str) -> Result<MrzData, MrzError> {
        let candidates = CandidateScanner::ranked(CandidateScanner::try_find_candidates(text)?);

        let mut first_error = None;
        for candidate in &candidates {
            match self.extractor.try_extract(&candidate.to_result()) {
                Ok(data) => return Ok(data),
                Err(err) if first_error.is_none() => first_error = Some(err),
                Err(_) => {}
            }
        }
        Err(first_error.unwrap_or(MrzError::NoCandidateFound))
    }

    /// Drops every held frame, e.g. when the document is re-aligned.
    pub fn reset(&mut self) {
        self.aggregator.reset();
    }
}
