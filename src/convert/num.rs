//! Numeric literal classifier.
//!
//! Given a JSON number literal, record its shape (sign, fraction, exponent)
//! and independently attempt an exact conversion into every Rust integer
//! width plus f32/f64. Each width succeeds or fails on its own; a value on a
//! shared boundary (e.g. 255) legitimately fits several widths at once and
//! all of them are recorded.

use ordered_float::OrderedFloat;

use crate::error::CheckError;

/// Exact-fit results across the twelve integer widths. `None` means the
/// literal does not fit that width without truncation or sign change.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IntFits {
    pub i8: Option<i8>,
    pub u8: Option<u8>,
    pub i16: Option<i16>,
    pub u16: Option<u16>,
    pub i32: Option<i32>,
    pub u32: Option<u32>,
    pub i64: Option<i64>,
    pub u64: Option<u64>,
    pub i128: Option<i128>,
    pub u128: Option<u128>,
    pub isize: Option<isize>,
    pub usize: Option<usize>,
}

impl IntFits {
    /// How many widths the literal fits exactly.
    pub fn fit_count(&self) -> usize {
        usize::from(self.i8.is_some())
            + usize::from(self.u8.is_some())
            + usize::from(self.i16.is_some())
            + usize::from(self.u16.is_some())
            + usize::from(self.i32.is_some())
            + usize::from(self.u32.is_some())
            + usize::from(self.i64.is_some())
            + usize::from(self.u64.is_some())
            + usize::from(self.i128.is_some())
            + usize::from(self.u128.is_some())
            + usize::from(self.isize.is_some())
            + usize::from(self.usize.is_some())
    }
}

/// One floating-width conversion: the converted value and whether it has a
/// zero fractional part. `whole` is a property of the converted value only:
/// it is true for float conversions of whole-number literals even when the
/// literal itself carried a (lost) fraction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FloatFit<T: ordered_float::FloatCore> {
    pub value: OrderedFloat<T>,
    pub whole: bool,
}

fn fit32(v: f32) -> FloatFit<f32> {
    FloatFit { value: OrderedFloat(v), whole: v.is_finite() && v.fract() == 0.0 }
}

fn fit64(v: f64) -> FloatFit<f64> {
    FloatFit { value: OrderedFloat(v), whole: v.is_finite() && v.fract() == 0.0 }
}

/// Everything the classifier learns about one numeric literal.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NumberFacts {
    pub negative: bool,
    pub floating: bool,
    pub e_notation: bool,
    /// Populated only for integer-shaped literals (no `.`, no exponent).
    pub ints: IntFits,
    pub f32: Option<FloatFit<f32>>,
    pub f64: Option<FloatFit<f64>>,
}

impl NumberFacts {
    /// Integer-shaped literal: neither fraction nor exponent.
    pub fn integer_shaped(&self) -> bool {
        !self.floating && !self.e_notation
    }
}

fn failure(literal: &str, detail: &'static str) -> CheckError {
    CheckError::ConversionFailure { literal: literal.to_string(), detail: detail.into() }
}

/// Strict JSON number shape: `-?(0|[1-9][0-9]*)(\.[0-9]+)?([eE][+-]?[0-9]+)?`.
fn json_number_shape(s: &[u8]) -> bool {
    let mut pos = 0;
    if s.get(pos) == Some(&b'-') {
        pos += 1;
    }
    match s.get(pos) {
        Some(b'0') => pos += 1,
        Some(b'1'..=b'9') => {
            pos += 1;
            while matches!(s.get(pos), Some(b'0'..=b'9')) {
                pos += 1;
            }
        }
        _ => return false,
    }
    if s.get(pos) == Some(&b'.') {
        pos += 1;
        if !matches!(s.get(pos), Some(b'0'..=b'9')) {
            return false;
        }
        while matches!(s.get(pos), Some(b'0'..=b'9')) {
            pos += 1;
        }
    }
    if matches!(s.get(pos), Some(b'e' | b'E')) {
        pos += 1;
        if matches!(s.get(pos), Some(b'+' | b'-')) {
            pos += 1;
        }
        if !matches!(s.get(pos), Some(b'0'..=b'9')) {
            return false;
        }
        while matches!(s.get(pos), Some(b'0'..=b'9')) {
            pos += 1;
        }
    }
    pos == s.len()
}

/// Classify one numeric literal. Surrounding ASCII whitespace is trimmed
/// first (the trimmed form is what the node model stores as normalized).
pub fn classify(literal: &str) -> Result<NumberFacts, CheckError> {
    let lit = literal.trim_matches(|c: char| c.is_ascii_whitespace());
    if lit.is_empty() {
        return Err(failure(literal, "empty numeric literal"));
    }
    if !json_number_shape(lit.as_bytes()) {
        return Err(failure(literal, "not a JSON number"));
    }

    let mut facts = NumberFacts {
        negative: lit.starts_with('-'),
        floating: lit.contains('.'),
        e_notation: lit.contains(['e', 'E']),
        ..NumberFacts::default()
    };

    if facts.integer_shaped() {
        facts.ints = IntFits {
            i8: lit.parse().ok(),
            u8: lit.parse().ok(),
            i16: lit.parse().ok(),
            u16: lit.parse().ok(),
            i32: lit.parse().ok(),
            u32: lit.parse().ok(),
            i64: lit.parse().ok(),
            u64: lit.parse().ok(),
            i128: lit.parse().ok(),
            u128: lit.parse().ok(),
            isize: lit.parse().ok(),
            usize: lit.parse().ok(),
        };
    }

    // Floating conversions run for integer-shaped literals too, for
    // round-trip parity.
    facts.f32 = lit.parse::<f32>().ok().map(fit32);
    facts.f64 = lit.parse::<f64>().ok().map(fit64);

    Ok(facts)
}
