//! Byte-level helpers for loading HTML.

use std::borrow::Cow;

/// Decode bytes to a string, handling various encodings.
///
/// 1. UTF-8 first (a BOM is handled by encoding_rs)
/// 2. If malformed, the hint encoding (usually from [`sniff_meta_charset`])
/// 3. Windows-1252 as the last resort, which is what browsers assume for
///    unlabelled legacy pages
///
/// Returns a borrowed `Cow` when the input is already valid UTF-8.
pub fn decode_text<'a>(bytes: &'a [u8], hint_encoding: Option<&str>) -> Cow<'a, str> {
    let (result, _encoding, malformed) = encoding_rs::UTF_8.decode(bytes);

    if !malformed {
        return result;
    }

    if let Some(name) = hint_encoding
        && let Some(encoding) = encoding_rs::Encoding::for_label(name.as_bytes())
    {
        let (result, _, _) = encoding.decode(bytes);
        return result;
    }

    let (result, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    result
}

/// Find the charset declared by a `<meta>` tag near the top of a page.
///
/// Handles both `<meta charset="...">` and the older
/// `<meta http-equiv="Content-Type" content="text/html; charset=...">`.
/// Only the first 1024 bytes are examined, matching the HTML prescan window.
pub fn sniff_meta_charset(bytes: &[u8]) -> Option<&str> {
    let prefix = &bytes[..bytes.len().min(1024)];

    let mut rest = prefix;
    while let Some(pos) = find_ascii_ci(rest, b"charset=") {
        let after = &rest[pos + 8..];
        if let Some(value) = charset_value(after) {
            return Some(value);
        }
        rest = after;
    }
    None
}

fn charset_value(after: &[u8]) -> Option<&str> {
    let (start, quote) = match after.first()? {
        &q @ (b'"' | b'\'') => (1, Some(q)),
        _ => (0, None),
    };
    let body = &after[start..];
    let end = body
        .iter()
        .position(|&b| match quote {
            Some(q) => b == q,
            None => b.is_ascii_whitespace() || matches!(b, b'"' | b'\'' | b';' | b'>' | b'/'),
        })
        .unwrap_or(body.len());

    let value = std::str::from_utf8(&body[..end]).ok()?.trim();
    (!value.is_empty()).then_some(value)
}

fn find_ascii_ci(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|w| w.eq_ignore_ascii_case(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_utf8() {
        let text = "Caf\u{e9} cr\u{e8}me";
        assert_eq!(decode_text(text.as_bytes(), None), text);
    }

    #[test]
    fn test_decode_falls_back_to_windows_1252() {
        // 0xE9 is "é" in Windows-1252 and invalid as a lone UTF-8 byte.
        let bytes = b"Caf\xe9";
        assert_eq!(decode_text(bytes, None), "Caf\u{e9}");
    }

    #[test]
    fn test_decode_uses_hint() {
        // "Привет" in KOI8-R.
        let bytes = [0xf0, 0xd2, 0xc9, 0xd7, 0xc5, 0xd4];
        assert_eq!(decode_text(&bytes, Some("koi8-r")), "Привет");
    }

    #[test]
    fn test_sniff_meta_charset() {
        assert_eq!(
            sniff_meta_charset(br#"<html><head><meta charset="iso-8859-2">"#),
            Some("iso-8859-2")
        );
        assert_eq!(
            sniff_meta_charset(
                br#"<meta http-equiv="Content-Type" content="text/html; charset=Shift_JIS">"#
            ),
            Some("Shift_JIS")
        );
        assert_eq!(sniff_meta_charset(b"<meta charset=utf-8>"), Some("utf-8"));
        assert_eq!(sniff_meta_charset(b"<p>no charset here</p>"), None);
    }
}
