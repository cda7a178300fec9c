use serde_json::Value;
use shared_types::ReviewDecision;

/// What the review round produced: resolved verdicts plus the provider
/// response id for later reconciliation
#[derive(Debug, Clone)]
pub struct ReviewOutcome {
    pub decisions: Vec<ReviewDecision>,
    pub response_id: Option<String>,
    pub raw_reply: String,
}

/// Parse the agent's reply into decisions. The reply must be a single JSON
/// object `{"transactions": [...]}` but several legacy key spellings for the
/// verdict are accepted: `is_revenue`, `isRevenue`, `revenue`, or
/// `label == "revenue"`. Entries without an id or a verdict are skipped.
pub fn parse_decisions(reply: &str) -> Vec<ReviewDecision> {
    let value: Value = match serde_json::from_str(strip_code_fence(reply)) {
        Ok(v) => v,
        Err(_) => return Vec::new(),
    };

    let entries = match value.get("transactions").and_then(Value::as_array) {
        Some(list) => list.clone(),
        None => match value.as_array() {
            Some(list) => list.clone(),
            None => return Vec::new(),
        },
    };

    entries
        .iter()
        .filter_map(|entry| {
            let id = entry.get("id").and_then(value_as_id)?;
            let is_revenue = extract_verdict(entry)?;
            let reason = entry
                .get("reason")
                .or_else(|| entry.get("comment"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            Some(ReviewDecision {
                id,
                is_revenue,
                reason,
            })
        })
        .collect()
}

fn value_as_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn extract_verdict(entry: &Value) -> Option<bool> {
    for key in ["is_revenue", "isRevenue", "revenue"] {
        if let Some(flag) = entry.get(key).and_then(Value::as_bool) {
            return Some(flag);
        }
    }
    if let Some(label) = entry.get("label").and_then(Value::as_str) {
        return Some(label.eq_ignore_ascii_case("revenue"));
    }
    None
}

/// Models occasionally wrap the object in a markdown fence despite the
/// strict format instruction
fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open.strip_suffix("```").unwrap_or(without_open).trim()
}
