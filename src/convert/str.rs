//! String literal conversion and derived metadata.
//!
//! Optionally strips one layer of surrounding quotes, decodes the body
//! through the codec, and records the handful of flags downstream policy
//! checks care about (NUL presence, POSIX portability, raw/decoded
//! equality).

use once_cell::sync::Lazy;
use regex::bytes::Regex;

use crate::codec;
use crate::error::CheckError;

/// POSIX portable filename character set; hyphen allowed except first.
static POSIX_PORTABLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\A[A-Za-z0-9._][A-Za-z0-9._-]*\z").unwrap());

/// Decoded form of a string literal plus derived flags.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StringFacts {
    /// Decoded bytes. May legitimately contain NUL; never rely on a
    /// terminator.
    pub decoded: Vec<u8>,
    /// Decoded form is byte-identical to the raw (un-decoded) body.
    pub same: bool,
    pub has_nul: bool,
    pub is_empty: bool,
    /// Only POSIX-portable-safe bytes, non-empty, no leading hyphen.
    pub posix_safe: bool,
    pub leading_alnum: bool,
    pub has_upper: bool,
}

fn failure(raw: &[u8], detail: &'static str) -> CheckError {
    CheckError::ConversionFailure {
        literal: String::from_utf8_lossy(raw).into_owned(),
        detail: detail.into(),
    }
}

/// Trim surrounding ASCII whitespace, then one layer of double quotes if
/// `quoted`. A quoted literal without both quotes is a conversion failure.
pub fn strip_quotes(raw: &[u8], quoted: bool) -> Result<&[u8], CheckError> {
    let body = raw.trim_ascii();
    if !quoted {
        return Ok(body);
    }
    match body {
        [b'"', inner @ .., b'"'] => Ok(inner),
        _ => Err(failure(raw, "missing surrounding quotes")),
    }
}

/// Convert one string literal into its decoded form and flags.
pub fn convert(raw: &[u8], quoted: bool) -> Result<StringFacts, CheckError> {
    let body = strip_quotes(raw, quoted)?;
    let decoded = codec::decode(body)?;
    Ok(StringFacts {
        same: decoded == body,
        has_nul: decoded.contains(&0),
        is_empty: decoded.is_empty(),
        posix_safe: POSIX_PORTABLE.is_match(&decoded),
        leading_alnum: decoded.first().is_some_and(|b| b.is_ascii_alphanumeric()),
        has_upper: decoded.iter().any(|b| b.is_ascii_uppercase()),
        decoded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_literal_round_trips_unchanged() {
        let facts = convert(b"\"hello\"", true).unwrap();
        assert_eq!(facts.decoded, b"hello");
        assert!(facts.same);
        assert!(!facts.has_nul);
        assert!(!facts.is_empty);
        assert!(facts.posix_safe);
        assert!(facts.leading_alnum);
        assert!(!facts.has_upper);
    }

    #[test]
    fn escapes_break_raw_equality() {
        let facts = convert(b"\"a\\nb\"", true).unwrap();
        assert_eq!(facts.decoded, b"a\nb");
        assert!(!facts.same);
        assert!(!facts.posix_safe);
    }

    #[test]
    fn unicode_escape_decodes_to_one_byte() {
        let facts = convert(b"\"\\u0041BC\"", true).unwrap();
        assert_eq!(facts.decoded, b"ABC");
        assert!(facts.has_upper);
        assert!(!facts.same);
    }

    #[test]
    fn embedded_nul_is_flagged_and_kept() {
        let facts = convert(b"\"a\\u0000b\"", true).unwrap();
        assert_eq!(facts.decoded, vec![b'a', 0x00, b'b']);
        assert!(facts.has_nul);
        assert_eq!(facts.decoded.len(), 3);
    }

    #[test]
    fn empty_literal_is_empty_not_an_error() {
        let facts = convert(b"\"\"", true).unwrap();
        assert!(facts.is_empty);
        assert!(facts.same);
        assert!(!facts.posix_safe);
        assert!(!facts.leading_alnum);
    }

    #[test]
    fn posix_safety_rejects_leading_hyphen_and_odd_bytes() {
        assert!(convert(b"\"file-name_1.txt\"", true).unwrap().posix_safe);
        assert!(!convert(b"\"-flag\"", true).unwrap().posix_safe);
        assert!(!convert(b"\"has space\"", true).unwrap().posix_safe);
        assert!(!convert(b"\"sl\\/ash\"", true).unwrap().posix_safe);
    }

    #[test]
    fn unquoted_mode_takes_the_body_as_is() {
        let facts = convert(b"bare\\tvalue", false).unwrap();
        assert_eq!(facts.decoded, b"bare\tvalue");
    }

    #[test]
    fn surrounding_whitespace_is_trimmed_before_quotes() {
        let facts = convert(b"  \"x\"\n", true).unwrap();
        assert_eq!(facts.decoded, b"x");
    }

    #[test]
    fn missing_quotes_is_a_conversion_failure() {
        assert!(matches!(
            convert(b"unquoted", true).unwrap_err(),
            CheckError::ConversionFailure { .. }
        ));
        assert!(convert(b"\"half", true).is_err());
    }

    #[test]
    fn malformed_body_propagates_the_codec_error() {
        let err = convert(b"\"bad\\q\"", true).unwrap_err();
        assert!(matches!(err, CheckError::MalformedEncoding { .. }));
    }

    #[test]
    fn leading_digit_counts_as_alnum() {
        assert!(convert(b"\"7z\"", true).unwrap().leading_alnum);
        assert!(!convert(b"\"_x\"", true).unwrap().leading_alnum);
    }
}
