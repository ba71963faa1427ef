//! crates/novel_assistant_core/src/extraction.rs
//!
//! Turns the generation service's answer to a character-extraction prompt into
//! validated `ExtractedCharacter`s.

use crate::domain::{ExtractedCharacter, Extraction, RoleType};
use serde_json::Value;
use tracing::{info, warn};

const REQUIRED_FIELDS: [&str; 4] = ["name", "description", "characteristics", "role_type"];

/// Parses an extraction response.
///
/// Entries missing any of the four required string fields, carrying an empty
/// name, or naming an unknown role are dropped and counted. A response that is
/// not a JSON array yields an empty extraction rather than an error.
pub fn parse_extraction(response: &str) -> Extraction {
    let body = strip_code_fence(response);

    let entries = match serde_json::from_str::<Value>(body) {
        Ok(Value::Array(entries)) => entries,
        Ok(_) => {
            warn!("Character extraction response is not a JSON array");
            return Extraction::default();
        }
        Err(e) => {
            warn!(error = %e, "Character extraction response is not valid JSON");
            return Extraction::default();
        }
    };

    let mut extraction = Extraction::default();
    for entry in &entries {
        match to_character(entry) {
            Some(character) => extraction.characters.push(character),
            None => {
                warn!(entry = %entry, "Discarding incomplete character entry");
                extraction.rejected += 1;
            }
        }
    }

    info!(
        accepted = extraction.characters.len(),
        rejected = extraction.rejected,
        "Character extraction parsed"
    );
    extraction
}

fn to_character(entry: &Value) -> Option<ExtractedCharacter> {
    let object = entry.as_object()?;
    let mut fields = REQUIRED_FIELDS
        .iter()
        .map(|key| object.get(*key).and_then(Value::as_str).map(str::trim));

    let name = fields.next()??;
    let description = fields.next()??;
    let characteristics = fields.next()??;
    let role_type: RoleType = fields.next()??.parse().ok()?;

    if name.is_empty() {
        return None;
    }

    Some(ExtractedCharacter {
        name: name.to_string(),
        description: description.to_string(),
        characteristics: characteristics.to_string(),
        role_type,
    })
}

/// Removes a surrounding Markdown code fence (```json ... ```), if any.
fn strip_code_fence(response: &str) -> &str {
    let mut body = response.trim();
    if let Some(rest) = body.strip_prefix("```") {
        body = rest.strip_prefix("json").unwrap_or(rest);
    }
    if let Some(rest) = body.strip_suffix("```") {
        body = rest;
    }
    body.trim()
}
