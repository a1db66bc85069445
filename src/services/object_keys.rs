//! Storage key derivation and public URL composition.

use chrono::{DateTime, SecondsFormat, Utc};

/// Every uploaded image lives under this prefix; search lists only it.
pub const UPLOAD_PREFIX: &str = "uploads/";

/// Replace each run of whitespace with a single `_`.
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_whitespace = false;
    for c in name.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                out.push('_');
            }
            in_whitespace = true;
        } else {
            out.push(c);
            in_whitespace = false;
        }
    }
    out
}

/// Build `uploads/<timestamp>-<filename>`.
///
/// The timestamp is ISO-8601 UTC with milliseconds and `:`/`.` replaced by
/// `-`. Two uploads of the same filename within one millisecond get the same
/// key; the later write wins.
pub fn object_key(now: DateTime<Utc>, original_filename: &str) -> String {
    let stamp = now
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!(
        "{}{}-{}",
        UPLOAD_PREFIX,
        stamp,
        sanitize_filename(original_filename)
    )
}

/// Virtual-hosted-style URL for `key`. Composed locally, never fetched.
pub fn public_url(bucket: &str, region: &str, key: &str) -> String {
    let path = key
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/");
    format!("https://{}.s3.{}.amazonaws.com/{}", bucket, region, path)
}
