//! Decoding boundary for model output.
//!
//! The model's JSON shape is never trusted: every response goes through a
//! typed `serde` decode, and each stage decides its own fallback on failure.

use serde::de::DeserializeOwned;

/// Strip a surrounding markdown code fence (```` ```json ... ``` ````), if any.
pub fn strip_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening fence line.
    let body = match rest.find('\n') {
        Some(nl) => &rest[nl + 1..],
        None => rest,
    };
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

/// Decode a model response into `T`, tolerating code fences.
pub fn decode_json<T: DeserializeOwned>(raw: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(strip_fences(raw))
}

/// Prefix of `raw` of at most `max_chars` characters, for log lines.
pub fn excerpt(raw: &str, max_chars: usize) -> &str {
    match raw.char_indices().nth(max_chars) {
        Some((cut, _)) => &raw[..cut],
        None => raw,
    }
}

/// Clamp a model-provided score into 0–100, rounding to the nearest integer.
///
/// Non-finite values are rejected.
pub fn clamp_score(value: f64) -> Option<u8> {
    value
        .is_finite()
        .then(|| value.round().clamp(0.0, 100.0) as u8)
}
