//! Exact decimal numbers.
//!
//! A number is kept as a sign, a string of significant digits (`nat`) and the
//! count of those digits that lie after the decimal point. Construction strips
//! non-significant zeros so equal values always share one representation, and
//! comparison walks the digits left to right: floating point never enters any
//! validation decision.
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, ErrorCode, Result};
use crate::source::trim;

/// Bound on the exponent magnitude; beyond it the digit padding would be absurd.
const MAX_EXPONENT: i64 = 100_000;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Number {
    negative: bool,
    nat: String,
    frac_len: usize,
}

impl Number {
    pub fn new(text: &str) -> Result<Self> {
        Self::from_bytes(text.as_bytes())
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let text = trim(bytes);
        let invalid = || {
            Error::new(
                ErrorCode::InvalidNumber,
                format!("invalid number {:?}", String::from_utf8_lossy(text)),
            )
        };

        let mut rest = text;
        let negative = match rest.split_first() {
            Some((b'-', tail)) => {
                rest = tail;
                true
            }
            _ => false,
        };

        let int_len = rest.iter().take_while(|c| c.is_ascii_digit()).count();
        if int_len == 0 {
            return Err(invalid());
        }
        let int = &rest[..int_len];
        rest = &rest[int_len..];

        let mut frac: &[u8] = &[];
        if let Some((b'.', tail)) = rest.split_first() {
            let n = tail.iter().take_while(|c| c.is_ascii_digit()).count();
            if n == 0 {
                return Err(invalid());
            }
            frac = &tail[..n];
            rest = &tail[n..];
        }

        let mut exponent: i64 = 0;
        if let Some((b'e' | b'E', tail)) = rest.split_first() {
            let (exp_negative, tail) = match tail.split_first() {
                Some((b'-', t)) => (true, t),
                Some((b'+', t)) => (false, t),
                _ => (false, tail),
            };
            let n = tail.iter().take_while(|c| c.is_ascii_digit()).count();
            if n == 0 {
                return Err(invalid());
            }
            for &c in &tail[..n] {
                exponent = exponent * 10 + i64::from(c - b'0');
                if exponent > MAX_EXPONENT {
                    return Err(Error::new(
                        ErrorCode::InvalidNumber,
                        format!("exponent out of range in {:?}", String::from_utf8_lossy(text)),
                    ));
                }
            }
            if exp_negative {
                exponent = -exponent;
            }
            rest = &tail[n..];
        }

        if !rest.is_empty() {
            return Err(invalid());
        }

        Ok(Self::normalized(negative, int, frac, exponent))
    }

    /// Moves the decimal point by `exponent` places and strips insignificant zeros.
    fn normalized(negative: bool, int: &[u8], frac: &[u8], exponent: i64) -> Self {
        let mut digits: Vec<u8> = Vec::with_capacity(int.len() + frac.len());
        digits.extend_from_slice(int);
        digits.extend_from_slice(frac);

        let mut point = int.len() as i64 + exponent;
        if point < 0 {
            let pad = (-point) as usize;
            let mut padded = vec![b'0'; pad];
            padded.extend_from_slice(&digits);
            digits = padded;
            point = 0;
        }
        let point = point as usize;
        if point > digits.len() {
            digits.resize(point, b'0');
        }

        let (int, frac) = digits.split_at(point);
        let int_start = int.iter().position(|&c| c != b'0').unwrap_or(int.len());
        let frac_end = frac.iter().rposition(|&c| c != b'0').map_or(0, |i| i + 1);
        let int = &int[int_start..];
        let frac = &frac[..frac_end];

        let mut nat = String::with_capacity(int.len() + frac.len());
        nat.extend(int.iter().map(|&c| c as char));
        nat.extend(frac.iter().map(|&c| c as char));

        let negative = negative && !nat.is_empty();
        Self { negative, nat, frac_len: frac.len() }
    }

    pub fn from_usize(n: usize) -> Self {
        let nat = if n == 0 { String::new() } else { n.to_string() };
        Self { negative: false, nat, frac_len: 0 }
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    pub fn is_zero(&self) -> bool {
        self.nat.is_empty()
    }

    pub fn is_integer(&self) -> bool {
        self.frac_len == 0
    }

    /// Count of significant digits after the decimal point.
    pub fn frac_len(&self) -> usize {
        self.frac_len
    }

    fn int_len(&self) -> usize {
        self.nat.len() - self.frac_len
    }

    pub fn int_part(&self) -> &str {
        &self.nat[..self.int_len()]
    }

    pub fn frac_part(&self) -> &str {
        &self.nat[self.int_len()..]
    }

    /// The value as an index or length, when it is a non-negative integer that fits.
    pub fn to_usize(&self) -> Option<usize> {
        if self.negative || !self.is_integer() {
            return None;
        }
        if self.nat.is_empty() {
            return Some(0);
        }
        self.nat.parse().ok()
    }

    /// Lossy conversion, for human-facing output only.
    pub fn to_f64(&self) -> f64 {
        self.to_string().parse().unwrap_or(f64::NAN)
    }

    /// Three-way comparison as `-1`, `0` or `1`.
    pub fn compare(&self, other: &Number) -> i8 {
        match self.cmp(other) {
            Ordering::Less => -1,
            Ordering::Equal => 0,
            Ordering::Greater => 1,
        }
    }

    fn cmp_magnitude(&self, other: &Number) -> Ordering {
        let int_len = self.int_len().max(other.int_len());
        let frac_len = self.frac_len.max(other.frac_len);
        for i in 0..int_len + frac_len {
            let a = self.padded_digit(i, int_len);
            let b = other.padded_digit(i, int_len);
            match a.cmp(&b) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        Ordering::Equal
    }

    /// Digit `i` of the value written with `int_len` integer digits and as many
    /// trailing zeros as needed.
    fn padded_digit(&self, i: usize, int_len: usize) -> u8 {
        let lead = int_len - self.int_len();
        if i < lead {
            return b'0';
        }
        self.nat.as_bytes().get(i - lead).copied().unwrap_or(b'0')
    }
}

impl Ord for Number {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.negative, other.negative) {
            (false, true) => Ordering::Greater,
            (true, false) => Ordering::Less,
            (false, false) => self.cmp_magnitude(other),
            (true, true) => other.cmp_magnitude(self),
        }
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for Number {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Number::new(s)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            f.write_str("-")?;
        }
        let int = self.int_part();
        f.write_str(if int.is_empty() { "0" } else { int })?;
        if self.frac_len > 0 {
            write!(f, ".{}", self.frac_part())?;
        }
        Ok(())
    }
}
