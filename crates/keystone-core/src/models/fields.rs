use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Facts pulled out of a document's text during one verification attempt.
///
/// Coverage is a sorted set so that two extractions of the same text compare
/// equal and serialize identically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFields {
    pub issuer: Option<String>,
    pub policy_number: Option<String>,
    pub effective_from: Option<NaiveDate>,
    pub effective_to: Option<NaiveDate>,
    pub coverage: BTreeSet<String>,
}

impl ExtractedFields {
    pub fn has_both_dates(&self) -> bool {
        self.effective_from.is_some() && self.effective_to.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.issuer.is_none()
            && self.policy_number.is_none()
            && self.effective_from.is_none()
            && self.effective_to.is_none()
            && self.coverage.is_empty()
    }
}

/// Fields as reported by a language model. Dates stay as the raw strings the
/// model produced; they are parsed when merged with the regex output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelFields {
    pub issuer: Option<String>,
    pub policy_number: Option<String>,
    pub effective_from: Option<String>,
    pub effective_to: Option<String>,
    pub coverage: Vec<String>,
}
