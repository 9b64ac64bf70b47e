//! Deterministic field extraction from document text

pub mod dates;
pub mod merge;
pub mod patterns;

pub use dates::parse_date;
pub use merge::merge_fields;
pub use patterns::{canonical_coverage, clean_policy_number, RegexFieldExtractor};
