// Per-column majority vote over the zones read from consecutive frames.

use log::{debug, info};

use super::normalizer;
use crate::config::ScanConfig;
use crate::models::{AggregatedMrz, MrzFormat, MrzResult};
use crate::validation::mrz::MrzValidator;

pub const DEFAULT_MIN_FRAMES: usize = 3;
pub const DEFAULT_MAX_FRAMES: usize = 10;

/// Bounded window of recent zones for one scanning session.
///
/// Not shared between sessions: each document being scanned gets its own
/// aggregator, and calls for one session must be made in order.
#[derive(Debug, Clone)]
pub struct BurstAggregator {
    min_frames: usize,
    max_frames: usize,
    window: Vec<MrzResult>,
}

impl Default for BurstAggregator {
    fn default() -> Self {
        Self::with_limits(DEFAULT_MIN_FRAMES, DEFAULT_MAX_FRAMES)
    }
}

impl BurstAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// `min_frames` is raised to 1 and `max_frames` to `min_frames` when
    /// given smaller.
    pub fn with_limits(min_frames: usize, max_frames: usize) -> Self {
        let min_frames = min_frames.max(1);
        BurstAggregator {
            min_frames,
            max_frames: max_frames.max(min_frames),
            window: Vec::with_capacity(max_frames),
        }
    }

    pub fn from_config(config: &ScanConfig) -> Self {
        Self::with_limits(config.min_frames, config.max_frames)
    }

    pub fn min_frames(&self) -> usize {
        self.min_frames
    }

    pub fn max_frames(&self) -> usize {
        self.max_frames
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// Adds `candidate` to the window and, once `min_frames` zones are held,
    /// votes a consensus zone out of the members of the dominant format.
    ///
    /// The window is emptied after the call that fills it to `max_frames`,
    /// whatever that call returns.
    pub fn aggregate(&mut self, candidate: Option<MrzResult>) -> Option<AggregatedMrz> {
        if let Some(candidate) = candidate {
            self.window.push(candidate);
        }

        let aggregated = if self.window.len() < self.min_frames {
            debug!("holding {} of {} frames", self.window.len(), self.min_frames);
            None
        } else {
            self.consensus()
        };

        if self.window.len() >= self.max_frames {
            debug!("window full at {} frames, clearing", self.window.len());
            self.window.clear();
        }
        aggregated
    }

    pub fn reset(&mut self) {
        self.window.clear();
    }

    fn consensus(&self) -> Option<AggregatedMrz> {
        let format = self.dominant_format()?;
        let members: Vec<&MrzResult> = self
            .window
            .iter()
            .filter(|zone| zone.format == format)
            .collect();

        let width = format.line_length();
        let lines: Vec<String> = (0..format.line_count())
            .map(|index| {
                let padded: Vec<Vec<char>> = members
                    .iter()
                    .map(|zone| {
                        normalizer::pad_or_truncate(zone.line(index).unwrap_or(""), width)
                            .chars()
                            .collect()
                    })
                    .collect();
                (0..width)
                    .map(|col| plurality(padded.iter().map(|line| line[col])))
                    .collect()
            })
            .collect();

        let result = match format {
            MrzFormat::TD3 => MrzResult::td3(lines[0].clone(), lines[1].clone()),
            MrzFormat::TD1 => {
                MrzResult::td1(lines[0].clone(), lines[1].clone(), lines[2].clone())
            }
        };

        let confidence = members
            .iter()
            .filter(|zone| {
                MrzValidator::validate(zone)
                    .map(|checks| checks.is_fully_valid())
                    .unwrap_or(false)
            })
            .count();

        info!(
            "{} consensus from {} frame(s), confidence {}",
            format,
            members.len(),
            confidence
        );
        Some(AggregatedMrz { result, confidence })
    }

    /// Format held by most window members; the one seen first wins a tie.
    fn dominant_format(&self) -> Option<MrzFormat> {
        let mut counts: Vec<(MrzFormat, usize)> = Vec::new();
        for zone in &self.window {
            match counts.iter_mut().find(|(format, _)| *format == zone.format) {
                Some((_, count)) => *count += 1,
                None => counts.push((zone.format, 1)),
            }
        }
        first_max(counts)
    }
}

/// Most frequent character of a column; ties go to the one seen first.
fn plurality(column: impl Iterator<Item = char>) -> char {
    let mut tally: Vec<(char, usize)> = Vec::new();
    for c in column {
        match tally.iter_mut().find(|(seen, _)| *seen == c) {
            Some((_, count)) => *count += 1,
            None => tally.push((c, 1)),
        }
    }
    first_max(tally).unwrap_or(crate::models::FILLER)
}

fn first_max<T>(tally: Vec<(T, usize)>) -> Option<T> {
    let mut best: Option<(T, usize)> = None;
    for (value, count) in tally {
        let better = match &best {
            Some((_, top)) => count > *top,
            None => true,
        };
        if better {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value)
}
