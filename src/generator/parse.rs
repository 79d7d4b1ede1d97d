//! Parsing of model replies into pipeline types.
//!
//! Replies are requested as JSON objects, but OpenAI-compatible backends
//! differ in how strictly they honour that, so the parsers accept a few
//! common shapes and reject anything else as
//! [`GeneratorError::Malformed`].

use serde_json::Value;

use super::GeneratorError;
use crate::models::{Article, IdeaCandidate, SimilarityVerdict};

/// Keys under which an idea list may be wrapped.
const IDEA_LIST_KEYS: [&str; 3] = ["ideas", "topics", "data"];

/// Drop a surrounding markdown code fence, if any.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip the info string (e.g. `json`) on the opening line.
    let rest = match rest.find('\n') {
        Some(pos) => &rest[pos + 1..],
        None => rest,
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn parse_json(raw: &str) -> Result<Value, GeneratorError> {
    let body = strip_code_fence(raw);
    if body.is_empty() {
        return Err(GeneratorError::EmptyResponse);
    }
    serde_json::from_str(body).map_err(|e| GeneratorError::malformed(format!("invalid JSON: {}", e)))
}

fn str_field<'a>(obj: &'a Value, key: &str) -> Option<&'a str> {
    obj.get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Parse an idea list, keeping at most `count` entries.
///
/// Accepts a bare array or an object wrapping the array under `ideas`,
/// `topics` or `data`. Entries without a `topic` (or `title`) are skipped.
pub fn parse_ideas(raw: &str, count: usize) -> Result<Vec<IdeaCandidate>, GeneratorError> {
    let json = parse_json(raw)?;

    let items = match &json {
        Value::Array(items) => items,
        Value::Object(_) => IDEA_LIST_KEYS
            .iter()
            .find_map(|k| json.get(*k).and_then(|v| v.as_array()))
            .ok_or_else(|| GeneratorError::malformed("no idea list in response object"))?,
        _ => return Err(GeneratorError::malformed("expected an array or object of ideas")),
    };

    let ideas = items
        .iter()
        .filter_map(|item| {
            let title = str_field(item, "topic").or_else(|| str_field(item, "title"))?;
            let description = str_field(item, "description").unwrap_or("");
            Some(IdeaCandidate::new(title, description))
        })
        .take(count)
        .collect();

    Ok(ideas)
}

/// Parse an article reply. Both `title` and `content` must be non-empty.
pub fn parse_article(raw: &str) -> Result<Article, GeneratorError> {
    let json = parse_json(raw)?;

    let title = str_field(&json, "title")
        .ok_or_else(|| GeneratorError::malformed("article is missing 'title'"))?;
    let body = str_field(&json, "content")
        .ok_or_else(|| GeneratorError::malformed("article is missing 'content'"))?;

    Ok(Article {
        title: title.to_string(),
        body: body.to_string(),
    })
}

/// Parse a similarity judgment. `is_similar` is required.
pub fn parse_similarity(raw: &str) -> Result<SimilarityVerdict, GeneratorError> {
    let json = parse_json(raw)?;

    let similar = json
        .get("is_similar")
        .and_then(|v| v.as_bool())
        .ok_or_else(|| GeneratorError::malformed("similarity reply is missing 'is_similar'"))?;

    Ok(SimilarityVerdict {
        similar,
        similar_to: str_field(&json, "similar_to").map(str::to_string),
        reason: str_field(&json, "reason").map(str::to_string),
    })
}

/// Extract `choices[0].message.content` from a chat completions response.
pub fn completion_text(json: &Value) -> Result<String, GeneratorError> {
    let content = json
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .ok_or_else(|| GeneratorError::malformed("missing choices[0].message.content"))?;

    if content.trim().is_empty() {
        return Err(GeneratorError::EmptyResponse);
    }
    Ok(content.to_string())
}
