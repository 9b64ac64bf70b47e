//! Regex field extractor
//!
//! Pure pattern matching over document text. Never calls out and never fails:
//! anything that cannot be recognized is left unset.

use keystone_core::models::{DocumentType, ExtractedFields};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

use super::dates::{parse_date, DATE_TOKEN};

/// Coverage keywords (lowercase) and the label they map to.
const COVERAGE_KEYWORDS: &[(&str, &str)] = &[
    ("general liability", "General Liability"),
    ("commercial general", "General Liability"),
    ("workers comp", "Workers Compensation"),
    ("workers' comp", "Workers Compensation"),
    ("worker's comp", "Workers Compensation"),
    ("employers liability", "Employers Liability"),
    ("employer's liability", "Employers Liability"),
    ("employers' liability", "Employers Liability"),
    ("automobile liability", "Auto Liability"),
    ("auto liability", "Auto Liability"),
    ("commercial auto", "Auto Liability"),
    ("umbrella", "Umbrella Liability"),
    ("excess liability", "Excess Liability"),
    ("professional liability", "Professional Liability"),
    ("errors and omissions", "Professional Liability"),
    ("builders risk", "Builders Risk"),
    ("builder's risk", "Builders Risk"),
    ("inland marine", "Inland Marine"),
    ("surety bond", "Surety Bond"),
];

const MAX_ISSUER_CHARS: usize = 120;

static POLICY_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bpolicy\s*(?:number|num\.?|no\.?|#)\s*[:#]?\s*([A-Z0-9][A-Z0-9-]*)")
        .expect("policy number pattern")
});

static LICENSE_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\blicen[cs]e\s*(?:number|num\.?|no\.?|#)\s*[:#]?\s*([A-Z0-9][A-Z0-9-]*)")
        .expect("license number pattern")
});

static ISSUER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)\b(?:insurer|issuer|carrier|company|produced\s+(?:by|for))\b\s*[:#-]?\s*(.+?)\s*(?:\b(?:policy|coverage|effective|expiration|limits)\b|$)",
    )
    .expect("issuer pattern")
});

static EFFECTIVE_FROM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(?:effective\s+(?:date|from)|issue\s+date|date\s+issued)\b\s*[:#-]?\s*({})",
        DATE_TOKEN
    ))
    .expect("effective-from pattern")
});

static EFFECTIVE_TO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(?:expiration|expiry|expires|exp|effective\s+(?:to|through|until))\b(?:\s+(?:date|on))?\s*[:#-]?\s*({})",
        DATE_TOKEN
    ))
    .expect("effective-to pattern")
});

/// Uppercase, keep only `[A-Z0-9-]`, reject anything shorter than `min_len`.
pub fn clean_policy_number(raw: &str, min_len: usize) -> Option<String> {
    let cleaned: String = raw
        .to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || *c == '-')
        .collect();
    (cleaned.len() >= min_len).then_some(cleaned)
}

/// Map free-form coverage text onto a known label when it names one.
pub fn canonical_coverage(raw: &str) -> Option<String> {
    let normalized = collapse_whitespace(raw);
    if normalized.is_empty() {
        return None;
    }
    let lower = normalized.to_lowercase();
    let label = COVERAGE_KEYWORDS
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|(_, label)| label.to_string());
    Some(label.unwrap_or(normalized))
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn clean_issuer(raw: &str) -> Option<String> {
    let collapsed = collapse_whitespace(raw.trim_matches(|c: char| c == ':' || c == '-' || c.is_whitespace()));
    let issuer: String = collapsed.chars().take(MAX_ISSUER_CHARS).collect();
    let issuer = issuer.trim().to_string();
    (issuer.chars().count() > 2).then_some(issuer)
}

/// Deterministic extractor for issuer, policy/license number, effective dates
/// and coverage categories.
#[derive(Debug, Clone)]
pub struct RegexFieldExtractor {
    policy_number_min_len: usize,
}

impl Default for RegexFieldExtractor {
    fn default() -> Self {
        Self::new(4)
    }
}

impl RegexFieldExtractor {
    pub fn new(policy_number_min_len: usize) -> Self {
        Self {
            policy_number_min_len,
        }
    }

    pub fn extract(&self, doc_type: DocumentType, text: &str) -> ExtractedFields {
        let text = collapse_whitespace(text);
        ExtractedFields {
            issuer: self.issuer(&text),
            policy_number: self.policy_number(doc_type, &text),
            effective_from: first_date(&EFFECTIVE_FROM, &text),
            effective_to: first_date(&EFFECTIVE_TO, &text),
            coverage: self.coverage(&text),
        }
    }

    fn policy_number(&self, doc_type: DocumentType, text: &str) -> Option<String> {
        let patterns: &[&Regex] = match doc_type {
            DocumentType::License => &[&LICENSE_NUMBER, &POLICY_NUMBER],
            _ => &[&POLICY_NUMBER],
        };
        patterns.iter().find_map(|re| {
            re.captures_iter(text)
                .find_map(|caps| clean_policy_number(&caps[1], self.policy_number_min_len))
        })
    }

    fn issuer(&self, text: &str) -> Option<String> {
        ISSUER
            .captures_iter(text)
            .find_map(|caps| clean_issuer(&caps[1]))
    }

    fn coverage(&self, text: &str) -> BTreeSet<String> {
        let lower = text.to_lowercase();
        COVERAGE_KEYWORDS
            .iter()
            .filter(|(keyword, _)| lower.contains(keyword))
            .map(|(_, label)| label.to_string())
            .collect()
    }
}

fn first_date(pattern: &Regex, text: &str) -> Option<chrono::NaiveDate> {
    pattern
        .captures_iter(text)
        .find_map(|caps| parse_date(&caps[1]))
}
