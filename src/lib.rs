//! Machine readable zone extraction for ICAO Doc 9303 TD1 and TD3 documents.
//!
//! Raw OCR text goes through the [`processing::CandidateScanner`], single
//! frames are decoded by the [`processing::FieldExtractor`], and bursts of
//! frames are voted into one zone by the [`processing::BurstAggregator`].
//! [`ScanSession`] wires the three together for one document.

pub mod config;
pub mod models;
pub mod processing;
pub mod session;
pub mod utils;
pub mod validation;

pub use config::ScanConfig;
pub use models::{AccessKey, AggregatedMrz, MrzCandidate, MrzData, MrzFormat, MrzResult};
pub use session::{ScanOutcome, ScanSession};
pub use utils::{MrzError, MrzField};
