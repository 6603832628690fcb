//! Exact rational arithmetic helpers.
//!
//! Every cardinality, speed factor and rate in ecocalc is a [`Rational`].
//! Floating point only shows up in [`to_f64`] and [`format_number`], both of
//! which exist purely for rendering results to the user.

use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, ToPrimitive, Zero};

/// Arbitrary-precision rational number used for all quantities.
pub type Rational = BigRational;

/// Builds a rational from an integer.
pub fn int(value: i64) -> Rational {
    Rational::from_integer(BigInt::from(value))
}

/// Builds the rational `numer / denom`.
///
/// # Panics
///
/// Panics if `denom` is zero.
pub fn ratio(numer: i64, denom: i64) -> Rational {
    Rational::new(BigInt::from(numer), BigInt::from(denom))
}

/// Parses a rational literal.
///
/// Accepted forms are integers (`12`), decimals (`1.25`, `.5`), decimals
/// with an exponent (`1e-3`, as produced by JSON serializers) and fractions
/// of two such values (`1800/2`). The conversion is exact: `0.1` becomes
/// `1/10`, not the nearest binary float.
///
/// Returns `None` if the text is not a valid literal, the exponent exceeds
/// [`MAX_EXPONENT`] in magnitude, or the denominator is zero.
///
/// # Example
///
/// ```
/// use ecocalc::numeric::{parse_rational, ratio};
///
/// assert_eq!(parse_rational("1.25"), Some(ratio(5, 4)));
/// assert_eq!(parse_rational("1800/2"), Some(ratio(900, 1)));
/// assert_eq!(parse_rational("abc"), None);
/// ```
pub fn parse_rational(text: &str) -> Option<Rational> {
    let text = text.trim();
    if let Some((numer, denom)) = text.split_once('/') {
        let numer = parse_decimal(numer.trim())?;
        let denom = parse_decimal(denom.trim())?;
        if denom.is_zero() {
            return None;
        }
        return Some(numer / denom);
    }
    parse_decimal(text)
}

/// Largest decimal exponent [`parse_rational`] accepts.
pub const MAX_EXPONENT: u64 = 4096;

fn parse_decimal(text: &str) -> Option<Rational> {
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };

    let (mantissa, exponent) = match body.find(|c: char| c == 'e' || c == 'E') {
        Some(pos) => (&body[..pos], body[pos + 1..].parse::<i64>().ok()?),
        None => (body, 0),
    };
    if exponent.unsigned_abs() > MAX_EXPONENT {
        return None;
    }

    let (whole, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
        return None;
    }

    let digits: BigInt = format!("{}{}", whole, fraction).parse().ok()?;
    let mut value = Rational::from_integer(digits);

    let scale = exponent.checked_sub(fraction.len() as i64)?;
    let power = Rational::from_integer(num_traits::pow(
        BigInt::from(10),
        usize::try_from(scale.unsigned_abs()).ok()?,
    ));
    if scale >= 0 {
        value *= power;
    } else {
        value /= power;
    }

    if negative {
        value = -value;
    }
    Some(value)
}

/// Least common multiple of the denominators of `values`.
///
/// Multiplying every value by the result yields integers. Returns one for an
/// empty input.
pub fn lcm_of_denominators<'a>(values: impl IntoIterator<Item = &'a Rational>) -> Rational {
    let lcm = values
        .into_iter()
        .fold(BigInt::one(), |acc, value| acc.lcm(value.denom()));
    Rational::from_integer(lcm)
}

/// Smallest integer that is greater than or equal to `value`.
pub fn ceil(value: &Rational) -> BigInt {
    value.ceil().to_integer()
}

/// Lossy conversion for display purposes.
pub fn to_f64(value: &Rational) -> f64 {
    value.to_f64().unwrap_or(f64::NAN)
}

/// Formats a value with as few decimals as needed.
///
/// The value is printed as an integer, or with one or two decimals, as soon
/// as the rounded value is within 0.01 of the exact one. Otherwise three
/// decimals are used.
///
/// # Example
///
/// ```
/// use ecocalc::numeric::{format_number, int, ratio};
///
/// assert_eq!(format_number(&int(15)), "15");
/// assert_eq!(format_number(&ratio(3, 2)), "1.5");
/// assert_eq!(format_number(&ratio(180, 13)), "13.85");
/// assert_eq!(format_number(&ratio(1, 1000)), "0");
/// ```
pub fn format_number(value: &Rational) -> String {
    let real = to_f64(value);
    for decimals in 0..=2 {
        let factor = 10f64.powi(decimals);
        let rounded = (real * factor).round() / factor;
        if (rounded - real).abs() < 0.01 {
            // Avoid printing "-0"
            let rounded = if rounded == 0.0 { 0.0 } else { rounded };
            return format!("{:.*}", decimals as usize, rounded);
        }
    }
    format!("{:.3}", real)
}
