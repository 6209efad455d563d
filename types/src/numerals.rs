//! Roman numeral codec.
//!
//! Enchantment levels are persisted on items as roman numerals, so both
//! directions live here and are shared by the persistence codec and any
//! front-end that renders levels. Decoding is strict: only canonical
//! numerals in `1..=3999` are accepted.

use phf::phf_map;
use thiserror::Error;

/// Largest value expressible with the standard numeral tables.
pub const MAX_ROMAN: u32 = 3999;

static NUMERAL_VALUES: phf::Map<char, u32> = phf_map! {
    'I' => 1,
    'V' => 5,
    'X' => 10,
    'L' => 50,
    'C' => 100,
    'D' => 500,
    'M' => 1000,
};

const THOUSANDS: [&str; 4] = ["", "M", "MM", "MMM"];
const HUNDREDS: [&str; 10] = ["", "C", "CC", "CCC", "CD", "D", "DC", "DCC", "DCCC", "CM"];
const TENS: [&str; 10] = ["", "X", "XX", "XXX", "XL", "L", "LX", "LXX", "LXXX", "XC"];
const ONES: [&str; 10] = ["", "I", "II", "III", "IV", "V", "VI", "VII", "VIII", "IX"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NumeralError {
    #[error("empty numeral")]
    Empty,
    #[error("invalid numeral character '{0}'")]
    InvalidCharacter(char),
    #[error("'{0}' is not a canonical roman numeral")]
    NonCanonical(String),
    #[error("{0} cannot be written as a roman numeral (1..={MAX_ROMAN})")]
    OutOfRange(u32),
}

/// Returns true if `c` is one of the seven numeral letters.
pub fn is_numeral_char(c: char) -> bool {
    NUMERAL_VALUES.contains_key(&c)
}

/// Encode `n` by composing the thousands/hundreds/tens/ones tables.
///
/// # Examples
/// ```
/// use enchantry_types::numerals::to_roman;
/// assert_eq!(to_roman(4).unwrap(), "IV");
/// assert_eq!(to_roman(1994).unwrap(), "MCMXCIV");
/// assert!(to_roman(0).is_err());
/// ```
pub fn to_roman(n: u32) -> Result<String, NumeralError> {
    if n == 0 || n > MAX_ROMAN {
        return Err(NumeralError::OutOfRange(n));
    }
    let n = n as usize;
    let mut out = String::with_capacity(15);
    out.push_str(THOUSANDS[n / 1000]);
    out.push_str(HUNDREDS[(n % 1000) / 100]);
    out.push_str(TENS[(n % 100) / 10]);
    out.push_str(ONES[n % 10]);
    Ok(out)
}

/// Decode a numeral, summing right-to-left and subtracting any value that is
/// smaller than the largest value seen so far.
///
/// Unknown characters and non-canonical spellings (`IIII`, `VX`, `IC`) are
/// rejected rather than read as zero.
///
/// # Examples
/// ```
/// use enchantry_types::numerals::from_roman;
/// assert_eq!(from_roman("XIV").unwrap(), 14);
/// assert!(from_roman("IIII").is_err());
/// assert!(from_roman("X1").is_err());
/// ```
pub fn from_roman(s: &str) -> Result<u32, NumeralError> {
    if s.is_empty() {
        return Err(NumeralError::Empty);
    }

    let mut total: i64 = 0;
    let mut max_seen: u32 = 0;
    for c in s.chars().rev() {
        let value = *NUMERAL_VALUES
            .get(&c)
            .ok_or(NumeralError::InvalidCharacter(c))?;
        if value < max_seen {
            total -= i64::from(value);
        } else {
            total += i64::from(value);
            max_seen = value;
        }
    }

    let value = u32::try_from(total)
        .ok()
        .filter(|v| (1..=MAX_ROMAN).contains(v))
        .ok_or_else(|| NumeralError::NonCanonical(s.to_string()))?;

    // Re-encoding catches spellings the additive pass accepts but the
    // tables never produce.
    match to_roman(value) {
        Ok(canonical) if canonical == s => Ok(value),
        _ => Err(NumeralError::NonCanonical(s.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIRST_TWENTY: [&str; 20] = [
        "I", "II", "III", "IV", "V", "VI", "VII", "VIII", "IX", "X", "XI", "XII", "XIII", "XIV",
        "XV", "XVI", "XVII", "XVIII", "XIX", "XX",
    ];

    #[test]
    fn test_first_twenty_match_table() {
        for (i, expected) in FIRST_TWENTY.iter().enumerate() {
            assert_eq!(to_roman(i as u32 + 1).unwrap(), *expected);
        }
    }

    #[test]
    fn test_decode_inverts_encode_over_full_range() {
        for i in 1..=MAX_ROMAN {
            let numeral = to_roman(i).unwrap();
            assert_eq!(from_roman(&numeral), Ok(i), "numeral {numeral}");
        }
    }

    #[test]
    fn test_out_of_range_encode() {
        assert_eq!(to_roman(0), Err(NumeralError::OutOfRange(0)));
        assert_eq!(to_roman(4000), Err(NumeralError::OutOfRange(4000)));
    }

    #[test]
    fn test_malformed_numerals_rejected() {
        assert_eq!(from_roman(""), Err(NumeralError::Empty));
        assert_eq!(from_roman("IZ"), Err(NumeralError::InvalidCharacter('Z')));
        assert_eq!(from_roman("iv"), Err(NumeralError::InvalidCharacter('v')));
        for bad in ["IIII", "VV", "IC", "XM", "VX", "MMMM", "IIIIIIIIIIIX"] {
            assert!(
                matches!(from_roman(bad), Err(NumeralError::NonCanonical(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_numeral_chars() {
        assert!("IVXLCDM".chars().all(is_numeral_char));
        assert!(!is_numeral_char('A'));
        assert!(!is_numeral_char('i'));
    }
}
