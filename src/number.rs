// ABOUTME: Arbitrary-precision numeric type with IEEE-754-style +-inf/nan semantics

use bigdecimal::num_bigint::BigInt;
use bigdecimal::{BigDecimal, FromPrimitive, ToPrimitive, Zero};
use num_traits::Signed;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering as AtomicOrdering};

/// Process-wide decimal precision, configured once at startup (spec §3).
static PRECISION: AtomicU32 = AtomicU32::new(15);

pub fn set_precision(digits: u32) {
    PRECISION.store(digits.max(1), AtomicOrdering::Relaxed);
}

pub fn precision() -> u32 {
    PRECISION.load(AtomicOrdering::Relaxed)
}

/// A NumFu number: an arbitrary-precision real, or one of the IEEE-754-style
/// non-finite values. Equality and ordering follow spec §3/§4.6: `nan` never
/// compares equal or ordered to anything, including itself.
#[derive(Debug, Clone)]
pub enum Number {
    Finite(BigDecimal),
    PosInf,
    NegInf,
    NaN,
}

impl Number {
    pub fn from_i64(n: i64) -> Self {
        Number::Finite(BigDecimal::from(n))
    }

    pub fn zero() -> Self {
        Number::Finite(BigDecimal::zero())
    }

    pub fn is_nan(&self) -> bool {
        matches!(self, Number::NaN)
    }

    pub fn is_infinite(&self) -> bool {
        matches!(self, Number::PosInf | Number::NegInf)
    }

    pub fn is_finite(&self) -> bool {
        matches!(self, Number::Finite(_))
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Number::Finite(d) if d.is_zero())
    }

    pub fn is_negative(&self) -> bool {
        match self {
            Number::Finite(d) => d.is_negative(),
            Number::NegInf => true,
            Number::PosInf | Number::NaN => false,
        }
    }

    /// Parse a decimal literal from user source (lexer) or from `Number("...")` (builtin).
    pub fn parse(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        match trimmed {
            "inf" | "+inf" => return Some(Number::PosInf),
            "-inf" => return Some(Number::NegInf),
            "nan" => return Some(Number::NaN),
            _ => {}
        }
        BigDecimal::from_str(trimmed).ok().map(Number::Finite)
    }

    pub fn to_f64(&self) -> f64 {
        match self {
            Number::Finite(d) => d.to_f64().unwrap_or(f64::NAN),
            Number::PosInf => f64::INFINITY,
            Number::NegInf => f64::NEG_INFINITY,
            Number::NaN => f64::NAN,
        }
    }

    pub fn from_f64(f: f64) -> Self {
        if f.is_nan() {
            Number::NaN
        } else if f.is_infinite() {
            if f > 0.0 {
                Number::PosInf
            } else {
                Number::NegInf
            }
        } else {
            BigDecimal::from_f64(f).map(Number::Finite).unwrap_or(Number::NaN)
        }
    }

    fn signum_inf(a_pos: bool, b_pos: bool) -> Self {
        if a_pos == b_pos {
            Number::PosInf
        } else {
            Number::NegInf
        }
    }

    pub fn add(&self, other: &Number) -> Number {
        use Number::*;
        match (self, other) {
            (NaN, _) | (_, NaN) => NaN,
            (PosInf, NegInf) | (NegInf, PosInf) => NaN,
            (PosInf, _) | (_, PosInf) => PosInf,
            (NegInf, _) | (_, NegInf) => NegInf,
            (Finite(a), Finite(b)) => Finite(a + b),
        }
    }

    pub fn sub(&self, other: &Number) -> Number {
        self.add(&other.neg())
    }

    pub fn neg(&self) -> Number {
        match self {
            Number::Finite(d) => Number::Finite(-d),
            Number::PosInf => Number::NegInf,
            Number::NegInf => Number::PosInf,
            Number::NaN => Number::NaN,
        }
    }

    pub fn mul(&self, other: &Number) -> Number {
        use Number::*;
        match (self, other) {
            (NaN, _) | (_, NaN) => NaN,
            (PosInf, b) | (b, PosInf) => {
                if b.is_zero() {
                    NaN
                } else {
                    Self::signum_inf(true, !b.is_negative())
                }
            }
            (NegInf, b) | (b, NegInf) => {
                if b.is_zero() {
                    NaN
                } else {
                    Self::signum_inf(false, !b.is_negative())
                }
            }
            (Finite(a), Finite(b)) => Finite(a * b),
        }
    }

    /// Division per spec §4.6: `x/0` -> `+-inf` by sign of `x`, `0/0` -> `nan`.
    pub fn div(&self, other: &Number) -> Number {
        use Number::*;
        match (self, other) {
            (NaN, _) | (_, NaN) => NaN,
            (PosInf, PosInf) | (PosInf, NegInf) | (NegInf, PosInf) | (NegInf, NegInf) => NaN,
            (PosInf, Finite(b)) => {
                if b.is_zero() {
                    PosInf
                } else if b.is_negative() {
                    NegInf
                } else {
                    PosInf
                }
            }
            (NegInf, Finite(b)) => {
                if b.is_zero() {
                    NegInf
                } else if b.is_negative() {
                    PosInf
                } else {
                    NegInf
                }
            }
            (Finite(_), PosInf) | (Finite(_), NegInf) => Finite(BigDecimal::zero()),
            (Finite(a), Finite(b)) => {
                if b.is_zero() {
                    if a.is_zero() {
                        NaN
                    } else if a.is_negative() {
                        NegInf
                    } else {
                        PosInf
                    }
                } else {
                    Finite((a / b).with_prec(precision() as u64))
                }
            }
        }
    }

    pub fn rem(&self, other: &Number) -> Number {
        use Number::*;
        match (self, other) {
            (Finite(a), Finite(b)) if !b.is_zero() => Finite(a % b),
            (Finite(a), Finite(_)) if a.is_zero() => NaN,
            _ => NaN,
        }
    }

    pub fn pow(&self, other: &Number) -> Number {
        use Number::*;
        match (self, other) {
            (NaN, _) | (_, NaN) => NaN,
            (Finite(base), Finite(exp)) => {
                if let Some(exp_i) = exp.to_i64() {
                    if exp_i >= 0 && BigDecimal::from(exp_i) == *exp {
                        return Finite(base.clone().with_prec(precision() as u64).pow(exp_i as u64));
                    }
                }
                // Non-integer or huge exponent: fall back to f64 approximation,
                // then round to the configured precision.
                let result = base.to_f64().unwrap_or(f64::NAN).powf(exp.to_f64().unwrap_or(f64::NAN));
                Number::from_f64(result).round_to_precision()
            }
            _ => Number::from_f64(self.to_f64().powf(other.to_f64())),
        }
    }

    pub fn sqrt(&self) -> Number {
        match self {
            Number::Finite(d) if !d.is_negative() => d
                .sqrt()
                .map(|r| Number::Finite(r.with_prec(precision() as u64)))
                .unwrap_or(Number::NaN),
            Number::PosInf => Number::PosInf,
            _ => Number::NaN,
        }
    }

    pub fn round_to_precision(self) -> Number {
        match self {
            Number::Finite(d) => Number::Finite(d.with_prec(precision() as u64)),
            other => other,
        }
    }

    pub fn floor(&self) -> Number {
        match self {
            Number::Finite(d) => {
                let (digits, exp) = d.as_bigint_and_exponent();
                if exp <= 0 {
                    // Already an integer (exponent <= 0 means no fractional digits).
                    return Number::Finite(BigDecimal::new(digits, exp));
                }
                let divisor = BigInt::from(10).pow(exp as u32);
                let mut quotient = &digits / &divisor;
                let remainder = &digits % &divisor;
                if remainder != BigInt::zero() && digits.is_negative() {
                    quotient -= 1;
                }
                Number::Finite(BigDecimal::new(quotient, 0))
            }
            other => other.clone(),
        }
    }

    pub fn abs(&self) -> Number {
        match self {
            Number::Finite(d) => Number::Finite(d.abs()),
            Number::NegInf => Number::PosInf,
            other => other.clone(),
        }
    }

    /// `<`, per §4.6: always `false` involving `nan`.
    pub fn lt(&self, other: &Number) -> bool {
        matches!(self.partial_cmp_numeric(other), Some(Ordering::Less))
    }

    pub fn le(&self, other: &Number) -> bool {
        matches!(
            self.partial_cmp_numeric(other),
            Some(Ordering::Less) | Some(Ordering::Equal)
        )
    }

    pub fn gt(&self, other: &Number) -> bool {
        matches!(self.partial_cmp_numeric(other), Some(Ordering::Greater))
    }

    pub fn ge(&self, other: &Number) -> bool {
        matches!(
            self.partial_cmp_numeric(other),
            Some(Ordering::Greater) | Some(Ordering::Equal)
        )
    }

    /// Structural `==`: `nan == nan` is `false` (§3, §4.6).
    pub fn num_eq(&self, other: &Number) -> bool {
        matches!(self.partial_cmp_numeric(other), Some(Ordering::Equal))
    }

    fn partial_cmp_numeric(&self, other: &Number) -> Option<Ordering> {
        use Number::*;
        match (self, other) {
            (NaN, _) | (_, NaN) => None,
            (PosInf, PosInf) | (NegInf, NegInf) => Some(Ordering::Equal),
            (PosInf, _) => Some(Ordering::Greater),
            (_, PosInf) => Some(Ordering::Less),
            (NegInf, _) => Some(Ordering::Less),
            (_, NegInf) => Some(Ordering::Greater),
            (Finite(a), Finite(b)) => a.partial_cmp(b),
        }
    }

    /// Render at the configured precision, per §4.7.
    pub fn render(&self) -> String {
        match self {
            Number::NaN => "nan".to_string(),
            Number::PosInf => "inf".to_string(),
            Number::NegInf => "-inf".to_string(),
            Number::Finite(d) => {
                let rounded = d.with_prec(precision() as u64);
                let normalized = rounded.normalized();
                normalized.to_string()
            }
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn division_by_zero_follows_sign() {
        let one = Number::from_i64(1);
        let neg_one = Number::from_i64(-1);
        let zero = Number::zero();
        assert!(one.div(&zero).to_f64().is_infinite());
        assert!(one.div(&zero).to_f64() > 0.0);
        assert!(neg_one.div(&zero).to_f64() < 0.0);
        assert!(zero.div(&zero).is_nan());
    }

    #[test]
    fn nan_comparisons_are_false() {
        let nan = Number::NaN;
        let forty_two = Number::from_i64(42);
        assert!(!nan.gt(&forty_two));
        assert!(!nan.lt(&forty_two));
        assert!(!nan.num_eq(&nan));
    }

    #[test]
    fn sqrt_of_negative_is_nan() {
        let neg = Number::from_i64(-4);
        assert!(neg.sqrt().is_nan());
    }
}
