use keystone_core::models::{ExtractedFields, ModelFields};

use super::dates::parse_date;
use super::patterns::{canonical_coverage, clean_policy_number};

/// Combine regex output with what a language model reported.
///
/// Every scalar the regex pass found is kept as is; the model only fills gaps.
/// Model dates go through the same lenient parser as document text and the
/// model's policy number is cleaned with the same rule. Coverage is the union
/// of both sources.
pub fn merge_fields(
    regex: &ExtractedFields,
    model: Option<&ModelFields>,
    policy_number_min_len: usize,
) -> ExtractedFields {
    let Some(model) = model else {
        return regex.clone();
    };

    let model_text = |value: &Option<String>| {
        value
            .as_deref()
            .map(|v| v.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|v| !v.is_empty())
    };

    let mut coverage = regex.coverage.clone();
    coverage.extend(model.coverage.iter().filter_map(|c| canonical_coverage(c)));

    ExtractedFields {
        issuer: regex.issuer.clone().or_else(|| model_text(&model.issuer)),
        policy_number: regex.policy_number.clone().or_else(|| {
            model
                .policy_number
                .as_deref()
                .and_then(|p| clean_policy_number(p, policy_number_min_len))
        }),
        effective_from: regex
            .effective_from
            .or_else(|| model.effective_from.as_deref().and_then(parse_date)),
        effective_to: regex
            .effective_to
            .or_else(|| model.effective_to.as_deref().and_then(parse_date)),
        coverage,
    }
}
