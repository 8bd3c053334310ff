//! Exact decimal arithmetic for numeric keywords.
//!
//! JSON numbers keep their source text (`serde_json` is built with
//! `arbitrary_precision`), so `0.1`, `1e2` and `100.0` are compared as the
//! decimals they spell rather than as binary floats.

use std::cmp::Ordering;

use serde_json::Number;

/// Longest divisor, in digits, for which `multipleOf` runs in `u128`.
const MAX_DIVISOR_DIGITS: usize = 37;

/// Longest run of implied zeros expanded when aligning exponents.
const MAX_ALIGNMENT: i64 = 4096;

/// An exact decimal `(-1)^negative × digits × 10^exponent`.
///
/// `digits` has no leading or trailing zeros; zero has no digits and is never
/// negative, so structural equality is numeric equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Decimal {
    negative: bool,
    digits: Vec<u8>,
    exponent: i64,
}

impl Decimal {
    /// Parses a JSON number literal.
    ///
    /// Returns `None` for anything outside the JSON number grammar.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let bytes = text.as_bytes();
        let mut pos = 0;

        let negative = bytes.first() == Some(&b'-');
        if negative {
            pos += 1;
        }

        let int_start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
        let int_part = &bytes[int_start..pos];
        if int_part.is_empty() {
            return None;
        }

        let mut frac_part: &[u8] = &[];
        if bytes.get(pos) == Some(&b'.') {
            pos += 1;
            let frac_start = pos;
            while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                pos += 1;
            }
            frac_part = &bytes[frac_start..pos];
            if frac_part.is_empty() {
                return None;
            }
        }

        let mut exponent: i64 = 0;
        if matches!(bytes.get(pos), Some(b'e' | b'E')) {
            pos += 1;
            let exp_negative = bytes.get(pos) == Some(&b'-');
            if matches!(bytes.get(pos), Some(b'+' | b'-')) {
                pos += 1;
            }
            let exp_digits = &bytes[pos..];
            if exp_digits.is_empty() || !exp_digits.iter().all(u8::is_ascii_digit) {
                return None;
            }
            exponent = saturating_exponent(exp_digits, exp_negative);
            pos = bytes.len();
        }
        if pos != bytes.len() {
            return None;
        }

        let frac_len = i64::try_from(frac_part.len()).ok()?;
        let digits: Vec<u8> = int_part
            .iter()
            .chain(frac_part)
            .map(|b| b - b'0')
            .collect();
        Some(Self::normalized(negative, digits, exponent.saturating_sub(frac_len)))
    }

    /// Converts a parsed JSON number.
    #[must_use]
    pub fn from_number(number: &Number) -> Option<Self> {
        Self::parse(&number.to_string())
    }

    fn normalized(negative: bool, digits: Vec<u8>, exponent: i64) -> Self {
        let start = digits.iter().position(|&d| d != 0);
        let Some(start) = start else {
            return Self::zero();
        };
        let end = digits.iter().rposition(|&d| d != 0).map_or(start, |e| e + 1);
        let trailing = i64::try_from(digits.len() - end).unwrap_or(i64::MAX);
        Self {
            negative,
            digits: digits[start..end].to_vec(),
            exponent: exponent.saturating_add(trailing),
        }
    }

    /// The decimal zero.
    #[must_use]
    pub fn zero() -> Self {
        Self {
            negative: false,
            digits: Vec::new(),
            exponent: 0,
        }
    }

    /// Returns true for zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.digits.is_empty()
    }

    /// Returns true for values strictly below zero.
    #[must_use]
    pub const fn is_negative(&self) -> bool {
        self.negative
    }

    /// Returns true if the value has no fractional part.
    #[must_use]
    pub fn is_integer(&self) -> bool {
        self.exponent >= 0 || self.is_zero()
    }

    /// Position of the most significant digit, used to compare magnitudes.
    fn magnitude(&self) -> i64 {
        i64::try_from(self.digits.len())
            .unwrap_or(i64::MAX)
            .saturating_add(self.exponent)
    }

    fn cmp_abs(&self, other: &Self) -> Ordering {
        match (self.is_zero(), other.is_zero()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            (false, false) => {}
        }
        self.magnitude()
            .cmp(&other.magnitude())
            .then_with(|| self.digits.cmp(&other.digits))
    }

    /// Returns whether `self` is an integral multiple of `divisor`.
    ///
    /// Returns `None` when the operands are too large to decide exactly;
    /// callers then fall back to floating point.
    #[must_use]
    pub fn is_multiple_of(&self, divisor: &Self) -> Option<bool> {
        if divisor.is_zero() {
            return None;
        }
        if self.is_zero() {
            return Some(true);
        }

        let common = self.exponent.min(divisor.exponent);
        let value_shift = self.exponent.checked_sub(common)?;
        let divisor_shift = divisor.exponent.checked_sub(common)?;
        if value_shift > MAX_ALIGNMENT || divisor_shift > MAX_ALIGNMENT {
            return None;
        }
        let value_shift = usize::try_from(value_shift).ok()?;
        let divisor_shift = usize::try_from(divisor_shift).ok()?;

        if divisor.digits.len() + divisor_shift > MAX_DIVISOR_DIGITS {
            return None;
        }
        let mut modulus: u128 = 0;
        for &d in &divisor.digits {
            modulus = modulus * 10 + u128::from(d);
        }
        for _ in 0..divisor_shift {
            modulus *= 10;
        }

        let mut remainder: u128 = 0;
        let zeros = std::iter::repeat(0u8).take(value_shift);
        for d in self.digits.iter().copied().chain(zeros) {
            remainder = (remainder * 10 + u128::from(d)) % modulus;
        }
        Some(remainder == 0)
    }

    /// Lossy conversion used only when exact arithmetic gives up.
    #[must_use]
    pub fn to_f64(&self) -> f64 {
        let mut text = String::with_capacity(self.digits.len() + 24);
        if self.negative {
            text.push('-');
        }
        if self.digits.is_empty() {
            text.push('0');
        }
        for d in &self.digits {
            text.push(char::from(b'0' + d));
        }
        text.push('e');
        text.push_str(&self.exponent.to_string());
        text.parse().unwrap_or(f64::NAN)
    }
}

/// Reads exponent digits, clamping values beyond `i64` to its range.
/// Such numbers compare as larger (or smaller) than any representable bound.
fn saturating_exponent(digits: &[u8], negative: bool) -> i64 {
    let mut exponent: i64 = 0;
    for &b in digits {
        let digit = i64::from(b - b'0');
        exponent = match exponent.checked_mul(10).and_then(|e| e.checked_add(digit)) {
            Some(e) => e,
            None => return if negative { i64::MIN } else { i64::MAX },
        };
    }
    if negative {
        -exponent
    } else {
        exponent
    }
}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Decimal {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.negative, other.negative) {
            (false, true) => Ordering::Greater,
            (true, false) => Ordering::Less,
            (false, false) => self.cmp_abs(other),
            (true, true) => other.cmp_abs(self),
        }
    }
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        let digits = value
            .unsigned_abs()
            .to_string()
            .bytes()
            .map(|b| b - b'0')
            .collect();
        Self::normalized(value < 0, digits, 0)
    }
}

/// Numeric equality that ignores spelling (`1`, `1.0` and `1e0` are equal).
#[must_use]
pub fn numbers_equal(a: &Number, b: &Number) -> bool {
    match (Decimal::from_number(a), Decimal::from_number(b)) {
        (Some(a), Some(b)) => a == b,
        _ => a.to_string() == b.to_string(),
    }
}
