//! Request validation shared by every model.
//!
//! Request bodies expose a `validate` method that returns the first
//! `ValidationError` found; handlers convert it into a 400 response.

/// Validation error for request models.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Field is empty when it shouldn't be.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// Field exceeds maximum length.
    #[error("{field} exceeds maximum length of {max} characters")]
    TooLong { field: &'static str, max: usize },

    /// Field doesn't match the required format.
    #[error("{field}: {reason}")]
    InvalidFormat {
        field: &'static str,
        reason: &'static str,
    },

    /// Value outside the accepted vocabulary.
    #[error("invalid {field} value: '{value}'")]
    InvalidVariant { field: &'static str, value: String },
}

/// Reject blank strings and strings longer than `max` characters.
pub fn required(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    if trimmed.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}

/// Like [`required`], but `None` is accepted.
pub fn optional(
    field: &'static str,
    value: Option<&str>,
    max: usize,
) -> Result<(), ValidationError> {
    match value {
        Some(v) => required(field, v, max),
        None => Ok(()),
    }
}

/// Sector ids are positive integers.
pub fn sector(sector_id: i32) -> Result<(), ValidationError> {
    if sector_id <= 0 {
        return Err(ValidationError::InvalidFormat {
            field: "sector_id",
            reason: "must be a positive integer",
        });
    }
    Ok(())
}

/// Minimal shape check: one `@` with a dotted domain after it.
pub fn email(value: &str) -> Result<(), ValidationError> {
    required("email", value, 254)?;

    let invalid = ValidationError::InvalidFormat {
        field: "email",
        reason: "must be a valid e-mail address",
    };
    let (local, domain) = value.trim().split_once('@').ok_or(invalid.clone())?;
    if local.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
    {
        return Err(invalid);
    }
    Ok(())
}

/// Brazilian state code: exactly two ASCII letters.
pub fn uf(value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    if value.len() != 2 || !value.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ValidationError::InvalidFormat {
            field: "uf",
            reason: "must be a two-letter state code",
        });
    }
    Ok(())
}

/// Phone numbers hold 10 or 11 digits once punctuation is stripped.
pub fn phone(field: &'static str, value: &str) -> Result<(), ValidationError> {
    required(field, value, 20)?;

    let digits = digits_only(value);
    if !(10..=11).contains(&digits.len()) {
        return Err(ValidationError::InvalidFormat {
            field,
            reason: "must contain 10 or 11 digits",
        });
    }
    Ok(())
}

/// Validate a CPF and return its 11 bare digits.
///
/// Dots, dashes and spaces (`529.982.247-25`) are accepted; any other
/// character is not. Both check digits are verified and repeated-digit
/// sequences such as `111.111.111-11` rejected.
pub fn cpf(value: &str) -> Result<String, ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty { field: "cpf" });
    }

    let invalid = ValidationError::InvalidFormat {
        field: "cpf",
        reason: "is not a valid CPF",
    };

    if !is_cpf_text(value) {
        return Err(invalid);
    }

    let digits = digits_only(value);

    let numbers: Vec<u32> = digits.chars().filter_map(|c| c.to_digit(10)).collect();
    if numbers.len() != 11 || numbers.iter().all(|&d| d == numbers[0]) {
        return Err(invalid);
    }

    if cpf_check_digit(&numbers[..9]) != numbers[9] || cpf_check_digit(&numbers[..10]) != numbers[10]
    {
        return Err(invalid);
    }

    Ok(digits)
}

/// Mod-11 check digit over the given prefix (weights count down to 2).
fn cpf_check_digit(prefix: &[u32]) -> u32 {
    let weight_start = prefix.len() as u32 + 1;
    let sum: u32 = prefix
        .iter()
        .enumerate()
        .map(|(i, d)| d * (weight_start - i as u32))
        .sum();

    match (sum * 10) % 11 {
        10 => 0,
        d => d,
    }
}

/// Whether `value` holds only digits and CPF punctuation.
fn is_cpf_text(value: &str) -> bool {
    value
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | ' '))
}

/// Digits of a search term written like a (partial) CPF, e.g. `529.982`.
///
/// Returns `None` when the term has no digits or contains anything besides
/// digits and CPF punctuation.
pub fn cpf_search_digits(term: &str) -> Option<String> {
    let digits = digits_only(term);
    (!digits.is_empty() && is_cpf_text(term)).then_some(digits)
}

fn digits_only(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ValidationError::TooLong {
            field: "title",
            max: 120,
        };
        assert_eq!(
            err.to_string(),
            "title exceeds maximum length of 120 characters"
        );
    }

    #[test]
    fn required_rejects_blank_and_long_values() {
        assert_eq!(
            required("name", "   ", 10),
            Err(ValidationError::Empty { field: "name" })
        );
        assert_eq!(
            required("name", "abcdefghijk", 10),
            Err(ValidationError::TooLong {
                field: "name",
                max: 10
            })
        );
        assert!(required("name", "Maria", 10).is_ok());
        assert!(optional("company", None, 10).is_ok());
    }

    #[test]
    fn cpf_accepts_punctuated_and_bare_forms() {
        assert_eq!(cpf("529.982.247-25").unwrap(), "52998224725");
        assert_eq!(cpf("52998224725").unwrap(), "52998224725");
    }

    #[test]
    fn cpf_rejects_wrong_check_digits() {
        assert!(cpf("529.982.247-26").is_err());
        assert!(cpf("529.982.247-15").is_err());
    }

    #[test]
    fn cpf_rejects_repeated_digits_and_wrong_length() {
        assert!(cpf("111.111.111-11").is_err());
        assert!(cpf("000.000.000-00").is_err());
        assert!(cpf("5299822472").is_err());
        assert_eq!(cpf(""), Err(ValidationError::Empty { field: "cpf" }));
    }

    #[test]
    fn cpf_rejects_letters_and_foreign_symbols() {
        assert!(cpf("52998224725abc").is_err());
        assert!(cpf("abc52998224725").is_err());
        assert!(cpf("529/982/247+25").is_err());
        assert!(cpf("---").is_err());
        assert_eq!(cpf(" 529 982 247 25 ").unwrap(), "52998224725");
    }

    #[test]
    fn cpf_search_digits_only_for_cpf_like_terms() {
        assert_eq!(cpf_search_digits("529.982").as_deref(), Some("529982"));
        assert_eq!(cpf_search_digits("247-25").as_deref(), Some("24725"));
        assert_eq!(cpf_search_digits("Maria"), None);
        assert_eq!(cpf_search_digits("Maria 529"), None);
        assert_eq!(cpf_search_digits("..."), None);
    }

    #[test]
    fn email_shape() {
        assert!(email("portaria@empresa.com.br").is_ok());
        assert!(email("portaria.empresa.com").is_err());
        assert!(email("@empresa.com").is_err());
        assert!(email("portaria@empresa").is_err());
        assert!(email("a@b@c.com").is_err());
    }

    #[test]
    fn uf_and_phone() {
        assert!(uf("SP").is_ok());
        assert!(uf("S1").is_err());
        assert!(uf("SPA").is_err());
        assert!(phone("whatsapp", "(11) 98765-4321").is_ok());
        assert!(phone("whatsapp", "12345").is_err());
    }

    #[test]
    fn sector_must_be_positive() {
        assert!(sector(4).is_ok());
        assert!(sector(0).is_err());
    }
}
