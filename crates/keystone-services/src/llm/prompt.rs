use keystone_core::models::ModelFields;
use serde_json::Value;

pub const SYSTEM_PROMPT: &str = "You extract fields from contractor license and insurance documents. \
Reply with a single JSON object and nothing else.";

/// Instruction sent with the (truncated) document text.
pub fn build_prompt(text: &str) -> String {
    format!(
        "Read the document below and return JSON with these keys:\n\
         - issuer: the insurance carrier or licensing authority, or null\n\
         - policyNumber: the policy or license number, or null\n\
         - effectiveFrom: the date coverage starts, as YYYY-MM-DD, or null\n\
         - effectiveTo: the date coverage ends, as YYYY-MM-DD, or null\n\
         - coverage: a list of coverage types such as \"General Liability\"\n\
         \n\
         Document:\n{}",
        text
    )
}

fn string_field(obj: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Pull the JSON object out of a model reply.
///
/// Models often wrap the object in prose or code fences, so everything from
/// the first `{` to the last `}` is parsed. Returns `None` when that is not a
/// JSON object.
pub fn parse_model_reply(reply: &str) -> Option<ModelFields> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    if end < start {
        return None;
    }

    let value: Value = serde_json::from_str(&reply[start..=end]).ok()?;
    let obj = value.as_object()?;

    let coverage = match obj.get("coverage") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Value::String(single)) if !single.trim().is_empty() => vec![single.trim().to_string()],
        _ => Vec::new(),
    };

    Some(ModelFields {
        issuer: string_field(obj, "issuer"),
        policy_number: string_field(obj, "policyNumber"),
        effective_from: string_field(obj, "effectiveFrom"),
        effective_to: string_field(obj, "effectiveTo"),
        coverage,
    })
}
