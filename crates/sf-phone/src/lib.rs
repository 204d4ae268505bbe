//! E.164 phone number normalization for Sound Factory.
//!
//! Every phone number that enters the system (SMS verification, member
//! records, fan imports) is normalized through [`normalize`] so that the
//! same subscriber always maps to the same key. Numbers without a country
//! code are assumed to be US/Canada (NANP).

use std::fmt;
use std::str::FromStr;

/// Minimum digit count for an E.164 number (country code included).
const MIN_DIGITS: usize = 8;
/// Maximum digit count for an E.164 number per the ITU recommendation.
const MAX_DIGITS: usize = 15;

/// A normalized E.164 phone number. Guaranteed to be `+` followed by
/// 8 to 15 ASCII digits.
///
/// Construct via [`normalize`] or [`Phone::from_str`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Phone(String);

/// Error returned when input cannot be normalized to E.164.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum PhoneError {
    /// Input was empty or contained no digits.
    #[error("phone number is empty")]
    Empty,
    /// Fewer than 8 digits after stripping formatting.
    #[error("phone number too short ({0} digits)")]
    TooShort(usize),
    /// More than 15 digits after stripping formatting.
    #[error("phone number too long ({0} digits)")]
    TooLong(usize),
}

impl Phone {
    /// Return the number as a string slice, e.g. `"+16464664925"`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper and return the owned string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

/// Normalize free-form input to an E.164 phone number.
///
/// Accepts the formats people actually type: `(646) 466-4925`,
/// `646.466.4925`, `+44 20 7946 0958`, `0044 20 7946 0958`. Rules:
///
/// - an international `00` prefix is treated as `+`
/// - formatting characters (spaces, parentheses, dots, dashes) are dropped
/// - with an explicit `+` or `00` prefix the digits are taken as-is
/// - without a prefix, 10 digits get `+1` (NANP default) and 11 digits
///   starting with `1` get `+`; anything else in range is assumed to
///   already carry its country code
///
/// The result always matches `+[0-9]{8,15}` and normalization is idempotent:
/// feeding the output back in returns the same value.
///
/// # Errors
/// Returns [`PhoneError`] when the input is empty or the digit count falls
/// outside 8..=15.
pub fn normalize(raw: &str) -> Result<Phone, PhoneError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PhoneError::Empty);
    }

    // "00" international prefix is equivalent to "+".
    let (explicit_prefix, rest) = if let Some(stripped) = trimmed.strip_prefix("00") {
        (true, stripped)
    } else if let Some(stripped) = trimmed.strip_prefix('+') {
        (true, stripped)
    } else {
        (false, trimmed)
    };

    let digits: String = rest.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Err(PhoneError::Empty);
    }

    if explicit_prefix {
        return match digits.len() {
            n if n < MIN_DIGITS => Err(PhoneError::TooShort(digits.len())),
            n if n > MAX_DIGITS => Err(PhoneError::TooLong(digits.len())),
            _ => Ok(Phone(format!("+{digits}"))),
        };
    }

    // NANP defaults apply only when the caller gave no country prefix.
    if digits.len() == 10 {
        return Ok(Phone(format!("+1{digits}")));
    }
    if digits.len() == 11 && digits.starts_with('1') {
        return Ok(Phone(format!("+{digits}")));
    }
    match digits.len() {
        n if n < MIN_DIGITS => Err(PhoneError::TooShort(digits.len())),
        n if n > MAX_DIGITS => Err(PhoneError::TooLong(digits.len())),
        _ => Ok(Phone(format!("+{digits}"))),
    }
}

impl FromStr for Phone {
    type Err = PhoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        normalize(s)
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Phone {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for Phone {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> serde::Deserialize<'de> for Phone {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn us_number_with_formatting() {
        let phone = normalize("(646) 466-4925").expect("valid");
        assert_eq!(phone.as_str(), "+16464664925");
    }

    #[test]
    fn us_number_with_dots() {
        let phone = normalize("646.466.4925").expect("valid");
        assert_eq!(phone.as_str(), "+16464664925");
    }

    #[test]
    fn eleven_digits_leading_one() {
        let phone = normalize("1 646 466 4925").expect("valid");
        assert_eq!(phone.as_str(), "+16464664925");
    }

    #[test]
    fn already_e164() {
        let phone = normalize("+16464664925").expect("valid");
        assert_eq!(phone.as_str(), "+16464664925");
    }

    #[test]
    fn double_zero_prefix() {
        let phone = normalize("0044 20 7946 0958").expect("valid");
        assert_eq!(phone.as_str(), "+442079460958");
    }

    #[test]
    fn international_without_prefix_keeps_country_code() {
        // 12 digits, no prefix: assume the country code is included.
        let phone = normalize("442079460958").expect("valid");
        assert_eq!(phone.as_str(), "+442079460958");
    }

    #[test]
    fn idempotent_on_own_output() {
        let first = normalize("(646) 466-4925").expect("valid");
        let second = normalize(first.as_str()).expect("still valid");
        assert_eq!(first, second);
    }

    #[test]
    fn empty_input() {
        assert_eq!(normalize(""), Err(PhoneError::Empty));
        assert_eq!(normalize("   "), Err(PhoneError::Empty));
        assert_eq!(normalize("call me"), Err(PhoneError::Empty));
    }

    #[test]
    fn too_short() {
        assert_eq!(normalize("+1234567"), Err(PhoneError::TooShort(7)));
        assert_eq!(normalize("123456"), Err(PhoneError::TooShort(6)));
    }

    #[test]
    fn too_long() {
        assert_eq!(
            normalize("+1234567890123456"),
            Err(PhoneError::TooLong(16))
        );
    }

    #[test]
    fn plus_with_interior_formatting() {
        let phone = normalize("+1 (646) 466-4925").expect("valid");
        assert_eq!(phone.as_str(), "+16464664925");
    }

    #[test]
    fn from_str_matches_normalize() {
        let parsed: Phone = "(646) 466-4925".parse().expect("valid");
        assert_eq!(parsed.as_str(), "+16464664925");
    }

    #[test]
    fn serde_deserialize_normalizes() {
        let phone: Phone = serde_json::from_str("\"(646) 466-4925\"").expect("valid");
        assert_eq!(phone.as_str(), "+16464664925");
    }

    #[test]
    fn serde_serialize_is_plain_string() {
        let phone = normalize("+16464664925").expect("valid");
        let json = serde_json::to_string(&phone).expect("serialize");
        assert_eq!(json, "\"+16464664925\"");
    }

    #[test]
    fn display_matches_as_str() {
        let phone = normalize("+16464664925").expect("valid");
        assert_eq!(format!("{phone}"), phone.as_str());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Successful normalization always yields `+` followed by 8-15 digits.
        #[test]
        fn output_shape_invariant(raw in "[0-9+() .-]{0,24}") {
            if let Ok(phone) = normalize(&raw) {
                let s = phone.as_str();
                prop_assert!(s.starts_with('+'));
                let digits = &s[1..];
                prop_assert!(digits.chars().all(|c| c.is_ascii_digit()));
                prop_assert!((MIN_DIGITS..=MAX_DIGITS).contains(&digits.len()));
            }
        }

        /// Normalization is idempotent: its output re-normalizes to itself.
        #[test]
        fn idempotence(raw in "\\+?[0-9() .-]{1,24}") {
            if let Ok(first) = normalize(&raw) {
                let second = normalize(first.as_str()).expect("output must stay valid");
                prop_assert_eq!(first, second);
            }
        }

        /// Formatting characters never change the result.
        #[test]
        fn formatting_insensitive(digits in "[2-9][0-9]{9}") {
            let bare = normalize(&digits).expect("10 digits valid");
            let formatted = format!("({}) {}-{}", &digits[..3], &digits[3..6], &digits[6..]);
            let fancy = normalize(&formatted).expect("formatted valid");
            prop_assert_eq!(bare, fancy);
        }
    }
}
