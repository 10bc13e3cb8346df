//! Parses SCPI decimal numeric program data.
//!
//! Handles signs, fractions, exponents, SI magnitude prefixes, unit text and
//! the `DEFAULT`/`MAX`/`MIN` keywords, e.g. `0.1mV` => value `1e-4`, unit
//! `V`. Parsing is best-effort: the first byte that is invalid for the
//! current phase silently ends the scan and whatever has been accumulated so
//! far is returned. No error is raised for malformed input; that is the
//! contract, not an omission.

/// Result of [`parse_numeric`]: the scaled value plus the unit text, if any,
/// borrowed from the input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScpiNumeric<'a> {
    /// The numeric value after sign, exponent and SI-prefix scaling.
    pub value: f64,
    /// The unit letters following the number, without the SI prefix.
    pub unit: Option<&'a [u8]>,
}

impl<'a> ScpiNumeric<'a> {
    fn bare(value: f64) -> Self {
        Self { value, unit: None }
    }

    /// Returns the unit as UTF-8 text; unit runs are always ASCII letters.
    pub fn unit_str(&self) -> Option<&'a str> {
        self.unit.and_then(|u| core::str::from_utf8(u).ok())
    }
}

/// Decimal exponents past the f64 decade range all scale to infinity or
/// zero; larger magnitudes are clamped to this before scaling.
const EXPONENT_CLAMP: i32 = 400;

/// Exponent adjustment for a single SI magnitude prefix character.
///
/// Uppercase letters outside this table are not prefixes; they start the
/// unit text instead.
fn si_prefix_exponent(byte: u8) -> Option<i32> {
    match byte {
        b'y' => Some(-24),
        b'z' => Some(-21),
        b'a' => Some(-18),
        b'f' => Some(-15),
        b'p' => Some(-12),
        b'n' => Some(-9),
        b'u' => Some(-6),
        b'm' => Some(-3),
        b'c' => Some(-2),
        b'd' => Some(-1),
        b'D' => Some(1),
        b'C' => Some(2),
        b'k' => Some(3),
        b'M' => Some(6),
        b'G' => Some(9),
        b'T' => Some(12),
        b'P' => Some(15),
        b'E' => Some(18),
        b'Z' => Some(21),
        b'Y' => Some(24),
        _ => None,
    }
}

/// Parses a decimal numeric string as sent by SCPI controllers.
///
/// The keywords `DEFAULT`, `MAX` and `MIN` (optionally preceded by
/// whitespace, matched case-sensitively by prefix) short-circuit the scan
/// and return `default_value`, `max_value` or `min_value` with no unit.
///
/// Otherwise the bytes are consumed left to right: optional sign, integer
/// digits, optional `.` and fraction digits, optional `e` exponent with
/// sign, whitespace, an optional single SI-prefix character and the
/// alphabetic unit run. The final value is
/// `mantissa * 10^(exponent - pointPosition)`, negated for a leading `-`.
///
/// Known ambiguity, kept on purpose: a single-letter unit that collides
/// with a prefix character is consumed as a prefix, so `5m` is 0.005 with
/// no unit rather than 5 metres.
pub fn parse_numeric(
    text: &[u8],
    default_value: f64,
    min_value: f64,
    max_value: f64,
) -> ScpiNumeric<'_> {
    let len = text.len();
    let mut i = 0usize;

    while i < len && text[i].is_ascii_whitespace() {
        i += 1;
    }

    // Keyword short-circuits, checked before any numeric scanning.
    let rest = &text[i..];
    if rest.starts_with(b"DEFAULT") {
        return ScpiNumeric::bare(default_value);
    }
    if rest.starts_with(b"MAX") {
        return ScpiNumeric::bare(max_value);
    }
    if rest.starts_with(b"MIN") {
        return ScpiNumeric::bare(min_value);
    }

    // Anything that is not a sign or a digit here ends the scan before it
    // started: value 0, no unit.
    let mut negative = false;
    match text.get(i) {
        Some(&b) if b == b'+' || b == b'-' => {
            negative = b == b'-';
            i += 1;
        }
        Some(&b) if b.is_ascii_digit() => {}
        _ => return ScpiNumeric::bare(0.0),
    }

    let mut mantissa: f64 = 0.0;
    let mut point_position: i32 = 0;
    let mut exponent: i32 = 0;
    let mut exponent_negative = false;
    let mut stopped = false;

    // Integer digits.
    while i < len && text[i].is_ascii_digit() {
        mantissa = 10.0 * mantissa + f64::from(text[i] - b'0');
        i += 1;
    }

    // Fraction digits; every digit past the point repositions it.
    if i < len && text[i] == b'.' {
        i += 1;
        while i < len && text[i].is_ascii_digit() {
            mantissa = 10.0 * mantissa + f64::from(text[i] - b'0');
            point_position += 1;
            i += 1;
        }
    }

    // Exponent marker, optional sign, exponent digits.
    if i < len && text[i] == b'e' {
        i += 1;
        while i < len && (text[i] == b'+' || text[i] == b'-') {
            if text[i] == b'-' {
                exponent_negative = true;
            }
            i += 1;
        }
        if i < len && !text[i].is_ascii_digit() {
            // Junk after the marker: keep the number, skip the unit scan.
            stopped = true;
        }
        while i < len && text[i].is_ascii_digit() {
            exponent = exponent
                .saturating_mul(10)
                .saturating_add(i32::from(text[i] - b'0'));
            i += 1;
        }
    }

    if exponent_negative {
        exponent = -exponent;
    }

    // Whitespace between the number and its unit.
    while !stopped && i < len && text[i].is_ascii_whitespace() {
        i += 1;
    }

    // The SI magnitude prefix, a single character. An uppercase letter not
    // in the table is the first unit letter; a lowercase letter not in the
    // table ends the scan with no unit.
    if !stopped && i < len {
        let byte = text[i];
        if let Some(adjust) = si_prefix_exponent(byte) {
            exponent = exponent.saturating_add(adjust);
            i += 1;
        } else if !byte.is_ascii_uppercase() {
            stopped = true;
        }
    }

    // The unit proper: a contiguous run of letters.
    let mut unit = None;
    if !stopped && i < len && text[i].is_ascii_alphabetic() {
        let start = i;
        while i < len && text[i].is_ascii_alphabetic() {
            i += 1;
        }
        unit = Some(&text[start..i]);
    }

    exponent = exponent.saturating_sub(point_position);

    // Every f64 saturates to infinity or zero outside roughly 10^±324, so
    // clamping bounds the scaling loop without changing any result.
    let exponent = exponent.clamp(-EXPONENT_CLAMP, EXPONENT_CLAMP);

    // Scale by an explicit power-of-ten multiplier; a negative exponent
    // divides rather than multiplying by a reciprocal.
    let mut multiplier: f64 = 1.0;
    for _ in 0..exponent.unsigned_abs() {
        multiplier *= 10.0;
    }
    let mut value = if exponent >= 0 {
        mantissa * multiplier
    } else {
        mantissa / multiplier
    };

    if negative {
        value = -value;
    }

    ScpiNumeric { value, unit }
}
