use quorum_common::RoutingDecision;
use serde::Deserialize;
use tracing::debug;

#[derive(Deserialize)]
struct RawDecision {
    #[serde(default)]
    next: String,
    #[serde(default)]
    reason: String,
}

/// Parse a routing decision out of model output.
///
/// Models are asked for a JSON object but frequently wrap it in prose or
/// markdown fences. Try the embedded JSON first; if that fails, fall back
/// to treating the first word of the reply as the routing label.
pub fn parse_decision(raw: &str) -> RoutingDecision {
    if let Some(json) = extract_json_object(raw) {
        if let Ok(parsed) = serde_json::from_str::<RawDecision>(json) {
            return RoutingDecision {
                next: parsed.next,
                reason: parsed.reason,
            };
        }
    }

    debug!(raw = %raw, "No JSON decision in supervisor output, using first token");

    let token = raw
        .split_whitespace()
        .next()
        .unwrap_or("")
        .trim_matches(|c: char| !c.is_ascii_alphanumeric());

    RoutingDecision {
        next: token.to_string(),
        reason: String::new(),
    }
}

/// Find the first balanced `{...}` object in a string.
fn extract_json_object(s: &str) -> Option<&str> {
    let start = s.find('{')?;
    let mut depth = 0;
    let mut end = start;

    for (i, c) in s[start..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    end = start + i + 1;
                    break;
                }
            }
            _ => {}
        }
    }

    if depth == 0 && end > start {
        Some(&s[start..end])
    } else {
        None
    }
}
