pub mod aggregator;
pub mod checksum;
pub mod extractor;
pub mod normalizer;
pub mod scanner;

pub use aggregator::BurstAggregator;
pub use checksum::{checksum, validate_and_correct};
pub use extractor::{format_mrz_date, FieldExtractor};
pub use normalizer::{normalize, CharContext, Direction};
pub use scanner::CandidateScanner;
