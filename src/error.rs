//! Shared error taxonomy for the conversion-and-validation engine.
//!
//! Everything data-dependent is recoverable and flows through [`CheckError`];
//! precondition violations (bad node handles, double attachment, empty encode
//! input) are programmer errors and panic instead.

use std::borrow::Cow;

use thiserror::Error;

use crate::node::NodeType;

/// Detail strings are `Cow<'static, str>`: precondition-style diagnostics are
/// borrowed statics, formatted diagnostics are owned.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum CheckError {
    /// Invalid escape, truncated `\u` sequence, or an unescaped byte that
    /// JSON requires to be escaped. `at` is a byte offset into the scanned
    /// text.
    #[error("malformed encoding at byte {at}: {detail}")]
    MalformedEncoding {
        at: usize,
        detail: Cow<'static, str>,
    },

    /// Literal is not a valid number/boolean/null, or does not fit a
    /// requested width.
    #[error("cannot convert {literal:?}: {detail}")]
    ConversionFailure {
        literal: String,
        detail: Cow<'static, str>,
    },

    /// A rule's match count fell outside its range, or a typed accessor hit
    /// a type/shape mismatch.
    #[error("semantic violation: {detail}")]
    SemanticViolation { detail: Cow<'static, str> },

    /// A tree node matched no rule under the deny policy.
    #[error("unknown {kind} node at depth {depth}")]
    UnknownNode { kind: NodeType, depth: u32 },

    /// Grammar-level failure: stray byte, unterminated literal, trailing
    /// data, nesting too deep.
    #[error("syntax error at byte {at}: {detail}")]
    Syntax {
        at: usize,
        detail: Cow<'static, str>,
    },
}

impl CheckError {
    /// Re-base a positioned error reported within a sub-span onto the
    /// enclosing text. No-op for variants without an offset.
    pub fn offset(self, base: usize) -> Self {
        match self {
            CheckError::MalformedEncoding { at, detail } => {
                CheckError::MalformedEncoding { at: at + base, detail }
            }
            CheckError::Syntax { at, detail } => CheckError::Syntax { at: at + base, detail },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_rebases_positioned_variants_only() {
        let e = CheckError::MalformedEncoding { at: 3, detail: "trailing backslash".into() };
        assert_eq!(
            e.offset(10),
            CheckError::MalformedEncoding { at: 13, detail: "trailing backslash".into() }
        );

        let e = CheckError::SemanticViolation { detail: "x".into() };
        assert_eq!(e.clone().offset(10), e);
    }

    #[test]
    fn display_carries_position_and_detail() {
        let e = CheckError::Syntax { at: 7, detail: "trailing data".into() };
        assert_eq!(e.to_string(), "syntax error at byte 7: trailing data");
    }
}
