use crate::extract::ExtractionError;
use regex::Regex;

/// Compiles a pattern, reporting failures as extraction errors
pub(crate) fn compile(pattern: &str) -> Result<Regex, ExtractionError> {
    Regex::new(pattern).map_err(|e| ExtractionError::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

/// Returns every string value of `"field":"..."` in a raw body, in document order
///
/// The body is not parsed as JSON: listing pages embed JSON fragments inside HTML,
/// and the API pages are JSON, so a targeted search covers both. Captured values
/// have their JSON string escapes decoded (`\/`, `\u0026`).
///
/// # Example
///
/// ```
/// use bookdraw::extract::json_string_values;
///
/// let body = r#"{"nextPageToken":"abc","x":{"nextPageToken":""}}"#;
/// let values = json_string_values("nextPageToken", body).unwrap();
/// assert_eq!(values, vec!["abc".to_string(), String::new()]);
/// ```
pub fn json_string_values(field: &str, body: &str) -> Result<Vec<String>, ExtractionError> {
    let pattern = format!(r#""{}"\s*:\s*"((?:[^"\\]|\\.)*)""#, regex::escape(field));
    Ok(all_matches(&pattern, body)?
        .iter()
        .map(|raw| decode_json_string(raw))
        .collect())
}

/// Decodes JSON escapes inside a captured string literal, keeping the raw text
/// when it is not valid JSON
fn decode_json_string(raw: &str) -> String {
    if !raw.contains('\\') {
        return raw.to_string();
    }
    serde_json::from_str::<String>(&format!("\"{}\"", raw)).unwrap_or_else(|_| raw.to_string())
}

/// Returns the first capture group of `pattern` in `text` (or the whole match if the
/// pattern has no groups)
pub fn first_match(pattern: &str, text: &str) -> Result<Option<String>, ExtractionError> {
    let regex = compile(pattern)?;
    Ok(regex.captures(text).and_then(|caps| {
        caps.get(1)
            .or_else(|| caps.get(0))
            .map(|m| m.as_str().to_string())
    }))
}

/// Returns the first capture group of every match of `pattern` in `text`
pub fn all_matches(pattern: &str, text: &str) -> Result<Vec<String>, ExtractionError> {
    let regex = compile(pattern)?;
    Ok(regex
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(0)))
        .map(|m| m.as_str().to_string())
        .collect())
}
