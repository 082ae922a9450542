//! Typed leaf converters over raw literal text.
//!
//! Number classification lives in [`num`], string decoding in [`str`];
//! boolean and null are literal matches and live here. All converters take
//! the original literal substring and return facts the node model stores.

pub mod num;
pub mod str;

pub use num::{FloatFit, IntFits, NumberFacts};
pub use str::StringFacts;

use crate::error::CheckError;

/// Re-exported entry point for numeric classification.
pub fn number(literal: &str) -> Result<NumberFacts, CheckError> {
    num::classify(literal)
}

/// Re-exported entry point for string conversion.
pub fn string(raw: &[u8], quoted: bool) -> Result<StringFacts, CheckError> {
    str::convert(raw, quoted)
}

/// The literal must be exactly `true` or `false` after whitespace trim.
pub fn boolean(literal: &str) -> Result<bool, CheckError> {
    match literal.trim_matches(|c: char| c.is_ascii_whitespace()) {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(CheckError::ConversionFailure {
            literal: literal.to_string(),
            detail: "not a boolean literal".into(),
        }),
    }
}

/// The literal must be exactly `null` after whitespace trim.
pub fn null(literal: &str) -> Result<(), CheckError> {
    match literal.trim_matches(|c: char| c.is_ascii_whitespace()) {
        "null" => Ok(()),
        _ => Err(CheckError::ConversionFailure {
            literal: literal.to_string(),
            detail: "not a null literal".into(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boolean_literals_match_exactly() {
        assert_eq!(boolean("true").unwrap(), true);
        assert_eq!(boolean("false").unwrap(), false);
        assert_eq!(boolean(" true\n").unwrap(), true);
        assert!(boolean("True").is_err());
        assert!(boolean("tru").is_err());
        assert!(boolean("truex").is_err());
        assert!(boolean("").is_err());
    }

    #[test]
    fn null_literal_matches_exactly() {
        assert!(null("null").is_ok());
        assert!(null("\tnull ").is_ok());
        assert!(null("NULL").is_err());
        assert!(null("nul").is_err());
        assert!(null("").is_err());
    }
}
