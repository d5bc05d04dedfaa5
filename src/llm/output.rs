//! JSON output parsing for model completions.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;

use crate::error::LlmError;
use crate::utils::truncate_chars;

static FENCED_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)```").expect("fenced block regex is valid")
});

const PREVIEW_CHARS: usize = 200;

/// Parse a model completion as JSON of type `T`.
///
/// Accepts bare JSON, JSON inside a fenced code block, or JSON embedded in
/// surrounding prose (the first balanced `{...}`/`[...]` span that parses).
pub fn parse_json_output<T: DeserializeOwned>(output: &str) -> Result<T, LlmError> {
    let trimmed = output.trim();
    if trimmed.is_empty() {
        return Err(LlmError::EmptyCompletion);
    }

    let mut last_err = None;
    for candidate in candidates(trimmed) {
        match serde_json::from_str::<T>(candidate) {
            Ok(value) => return Ok(value),
            Err(e) => last_err = Some(e),
        }
    }

    Err(LlmError::OutputParse {
        reason: last_err
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no JSON found".to_string()),
        preview: truncate_chars(trimmed, PREVIEW_CHARS),
    })
}

fn candidates(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    if let Some(inner) = FENCED_BLOCK.captures(text).and_then(|c| c.get(1)) {
        out.push(inner.as_str().trim());
    }
    out.push(text);
    out.extend(balanced_spans(text));
    out
}

/// Every balanced `{...}`/`[...]` span, in order of its opening bracket.
///
/// Brackets inside string literals are ignored. An opener that never
/// closes, or closes with the wrong bracket, yields nothing.
fn balanced_spans(text: &str) -> impl Iterator<Item = &str> {
    text.char_indices()
        .filter(|(_, c)| matches!(c, '{' | '['))
        .filter_map(move |(start, _)| balanced_end(&text[start..]).map(|end| &text[start..start + end]))
}

/// Byte length of the balanced span at the start of `text`.
fn balanced_end(text: &str) -> Option<usize> {
    let mut stack = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => stack.push('}'),
            '[' => stack.push(']'),
            '}' | ']' => {
                if stack.pop() != Some(c) {
                    return None;
                }
                if stack.is_empty() {
                    return Some(i + c.len_utf8());
                }
            }
            _ => {}
        }
    }
    None
}
