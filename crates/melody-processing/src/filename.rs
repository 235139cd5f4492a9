//! Response naming for converted audio

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Everything except RFC 3986 unreserved characters is encoded.
const FILENAME_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

const RESERVED: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

const FALLBACK_NAME: &str = "audio";

/// Replace characters that are not allowed in file names with `-`.
///
/// Reserved device names and trailing dots or spaces are not handled.
pub fn sanitize_filename(title: &str) -> String {
    let sanitized: String = title
        .trim()
        .chars()
        .map(|c| if RESERVED.contains(&c) { '-' } else { c })
        .collect();
    if sanitized.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        sanitized
    }
}

/// `attachment; filename="<encoded title>.<extension>"`
pub fn content_disposition(title: &str, extension: &str) -> String {
    let name = format!("{}.{}", sanitize_filename(title), extension);
    format!(
        "attachment; filename=\"{}\"",
        utf8_percent_encode(&name, FILENAME_ENCODE_SET)
    )
}

/// MIME type for an output format understood by the transcoder.
pub fn content_type_for(format: &str) -> Option<&'static str> {
    match format.to_ascii_lowercase().as_str() {
        "mp3" => Some("audio/mpeg"),
        "ogg" | "opus" => Some("audio/ogg"),
        "flac" => Some("audio/flac"),
        "wav" => Some("audio/wav"),
        _ => None,
    }
}
