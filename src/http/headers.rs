//! Request header parsing
//!
//! Only two headers matter: `Content-Type` (logged, never acted on) and
//! `Content-Length` (decides how many body bytes are read).

use hyper::header::{HeaderMap, CONTENT_LENGTH, CONTENT_TYPE};

use crate::error::{RelayError, Result};

/// A parsed MIME header value such as `multipart/form-data; boundary=xyz`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    pub value: String,
    pub params: Vec<(String, String)>,
}

impl ContentType {
    #[cfg(test)]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Split a header value into its main value and `key=value` parameters.
    /// Keys are lowercased, quoted values are unquoted.
    pub fn parse(raw: &str) -> Self {
        let mut parts = split_unquoted(raw).into_iter();
        let value = parts.next().unwrap_or_default().trim().to_string();

        let params = parts
            .filter_map(|part| {
                let (key, val) = part.split_once('=')?;
                let val = val.trim();
                let val = val
                    .strip_prefix('"')
                    .and_then(|v| v.strip_suffix('"'))
                    .map_or_else(|| val.to_string(), |v| v.replace("\\\"", "\"").replace("\\\\", "\\"));
                Some((key.trim().to_lowercase(), val))
            })
            .collect();

        Self { value, params }
    }
}

/// Split on `;` outside double quotes
fn split_unquoted(raw: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut escaped = false;

    for (i, c) in raw.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                parts.push(&raw[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&raw[start..]);
    parts
}

/// Content type of the request, if present and readable as text
pub fn content_type(headers: &HeaderMap) -> Option<ContentType> {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(ContentType::parse)
}

/// Declared body length as a base-10 integer
pub fn content_length(headers: &HeaderMap) -> Result<u64> {
    let raw = headers
        .get(CONTENT_LENGTH)
        .ok_or_else(|| RelayError::MalformedLength("header absent".to_string()))?;
    let text = raw
        .to_str()
        .map_err(|_| RelayError::MalformedLength("non-ASCII value".to_string()))?
        .trim();

    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RelayError::MalformedLength(format!("'{text}'")));
    }
    text.parse::<u64>()
        .map_err(|e| RelayError::MalformedLength(format!("'{text}': {e}")))
}
