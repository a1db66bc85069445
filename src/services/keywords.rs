//! Keyword normalization and the single-tag codec.
//!
//! Keywords travel as one object tag: joined with `|`, then percent-encoded.
//! A `|` inside a keyword is not escaped, so such a keyword decodes as two.

use std::string::FromUtf8Error;

/// Name of the object tag holding the encoded keyword list.
pub const KEYWORDS_TAG: &str = "keywords";

pub const KEYWORD_SEPARATOR: char = '|';

/// Split a comma-separated keyword string into trimmed, lowercase entries.
///
/// Empty entries are dropped; duplicates are kept.
pub fn normalize_keywords(csv: &str) -> Vec<String> {
    csv.split(',')
        .map(|entry| entry.trim().to_lowercase())
        .filter(|entry| !entry.is_empty())
        .collect()
}

/// Encode a keyword list as a tag value. An empty list has no tag.
///
/// The value is stored percent-encoded, so every non-unreserved byte costs
/// three characters (up to nine per non-ASCII char) against S3's
/// 256-character tag value limit. Over-long values are rejected by S3 and
/// surface as an upload failure.
pub fn encode_keywords(keywords: &[String]) -> Option<String> {
    if keywords.is_empty() {
        return None;
    }
    let joined = keywords.join(&KEYWORD_SEPARATOR.to_string());
    Some(urlencoding::encode(&joined).into_owned())
}

/// Decode a tag value back into keywords. An empty value decodes to none.
pub fn decode_keywords(value: &str) -> Result<Vec<String>, FromUtf8Error> {
    let decoded = urlencoding::decode(value)?;
    if decoded.is_empty() {
        return Ok(Vec::new());
    }
    Ok(decoded
        .split(KEYWORD_SEPARATOR)
        .map(str::to_string)
        .collect())
}

/// True when `query` is empty or some keyword contains it, ignoring case.
pub fn matches_query(keywords: &[String], query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    let needle = query.to_lowercase();
    keywords
        .iter()
        .any(|keyword| keyword.to_lowercase().contains(&needle))
}
