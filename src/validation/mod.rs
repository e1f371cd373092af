pub mod expiry;
pub mod format;
pub mod mrz;

pub use expiry::ExpiryValidator;
pub use format::FormatValidator;
pub use mrz::{FieldCheck, MrzChecks, MrzValidator};
