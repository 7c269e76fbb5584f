//! Field checks for request bodies. Each check returns the normalised value.

use std::collections::HashSet;

use crate::errors::ApiError;
use crate::services::views::Translation;

pub const MAX_NAME_LEN: usize = 120;
pub const MAX_DESCRIPTION_LEN: usize = 2000;
pub const MAX_NOTE_LEN: usize = 500;
pub const MAX_TABLES: i32 = 500;

pub fn slug(value: &str) -> Result<String, ApiError> {
    let slug = value.trim().to_lowercase();
    let well_formed = (3..=64).contains(&slug.len())
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !slug.starts_with('-')
        && !slug.ends_with('-');

    if well_formed {
        Ok(slug)
    } else {
        Err(ApiError::validation(
            "Slug must be 3-64 characters of lowercase letters, digits and inner dashes",
        ))
    }
}

/// Two-letter ISO 639-1 code, lowercased.
pub fn language(value: &str) -> Result<String, ApiError> {
    let language = value.trim().to_lowercase();
    if language.len() == 2 && language.chars().all(|c| c.is_ascii_lowercase()) {
        Ok(language)
    } else {
        Err(ApiError::validation(format!(
            "Language must be a 2-letter code, got '{value}'"
        )))
    }
}

pub fn currency(value: &str) -> Result<String, ApiError> {
    let currency = value.trim().to_uppercase();
    if currency.len() == 3 && currency.chars().all(|c| c.is_ascii_uppercase()) {
        Ok(currency)
    } else {
        Err(ApiError::validation("Currency must be a 3-letter code"))
    }
}

pub fn email(value: &str) -> Result<String, ApiError> {
    let email = value.trim().to_lowercase();
    let well_formed = email.len() <= 255
        && !email.contains(char::is_whitespace)
        && matches!(email.split_once('@'), Some((user, domain)) if !user.is_empty() && domain.contains('.') && !domain.contains('@'));

    if well_formed {
        Ok(email)
    } else {
        Err(ApiError::validation("Invalid email address"))
    }
}

pub fn password(value: &str) -> Result<(), ApiError> {
    match value.chars().count() {
        0..=7 => Err(ApiError::validation("Password must be at least 8 characters")),
        8..=128 => Ok(()),
        _ => Err(ApiError::validation("Password must be at most 128 characters")),
    }
}

pub fn name(field: &str, value: &str) -> Result<String, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation(format!("{field} must not be empty")));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(ApiError::validation(format!(
            "{field} must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(trimmed.to_owned())
}

pub fn price(value: i32) -> Result<i32, ApiError> {
    if value < 0 {
        Err(ApiError::validation("Price must not be negative"))
    } else {
        Ok(value)
    }
}

pub fn table_count(value: i32) -> Result<i32, ApiError> {
    if (1..=MAX_TABLES).contains(&value) {
        Ok(value)
    } else {
        Err(ApiError::validation(format!(
            "Table count must be between 1 and {MAX_TABLES}"
        )))
    }
}

pub fn allergen_code(value: &str) -> Result<String, ApiError> {
    let code = value.trim().to_uppercase();
    let well_formed = (1..=16).contains(&code.len())
        && code
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_');

    if well_formed {
        Ok(code)
    } else {
        Err(ApiError::validation(
            "Allergen code must be 1-16 characters of letters, digits and underscores",
        ))
    }
}

pub fn image_url(value: Option<&str>) -> Result<Option<String>, ApiError> {
    let Some(url) = value.map(str::trim).filter(|url| !url.is_empty()) else {
        return Ok(None);
    };

    if url.len() <= 512 && (url.starts_with("https://") || url.starts_with("http://")) {
        Ok(Some(url.to_owned()))
    } else {
        Err(ApiError::validation("Image URL must be an http(s) URL of at most 512 characters"))
    }
}

fn optional_text(value: Option<&str>, max: usize, field: &str) -> Result<Option<String>, ApiError> {
    let Some(text) = value.map(str::trim).filter(|text| !text.is_empty()) else {
        return Ok(None);
    };

    if text.chars().count() > max {
        return Err(ApiError::validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(Some(text.to_owned()))
}

pub fn note(value: Option<&str>) -> Result<Option<String>, ApiError> {
    optional_text(value, MAX_NOTE_LEN, "Note")
}

/// At least one translation, unique languages, each with a name.
pub fn translations(values: &[Translation]) -> Result<Vec<Translation>, ApiError> {
    if values.is_empty() {
        return Err(ApiError::validation("At least one translation is required"));
    }

    let mut seen = HashSet::new();
    values
        .iter()
        .map(|t| {
            let language = language(&t.language)?;
            if !seen.insert(language.clone()) {
                return Err(ApiError::validation(format!(
                    "Duplicate translation for language '{language}'"
                )));
            }

            Ok(Translation {
                name: name("Name", &t.name)?,
                description: optional_text(
                    t.description.as_deref(),
                    MAX_DESCRIPTION_LEN,
                    "Description",
                )?,
                language,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tr(language: &str, name: &str) -> Translation {
        Translation { language: language.into(), name: name.into(), description: None }
    }

    #[test]
    fn slugs() {
        assert_eq!(slug(" Trattoria-12 ").unwrap(), "trattoria-12");
        assert!(slug("ab").is_err());
        assert!(slug("-cafe").is_err());
        assert!(slug("café").is_err());
        assert!(slug("the cafe").is_err());
    }

    #[test]
    fn emails_are_lowercased() {
        assert_eq!(email(" Chef@Example.COM ").unwrap(), "chef@example.com");
        assert!(email("chef").is_err());
        assert!(email("@example.com").is_err());
        assert!(email("chef@localhost").is_err());
        assert!(email("ch ef@example.com").is_err());
    }

    #[test]
    fn password_length() {
        assert!(password("short").is_err());
        assert!(password("longenough").is_ok());
        assert!(password(&"x".repeat(129)).is_err());
    }

    #[test]
    fn codes_are_normalised() {
        assert_eq!(currency("eur").unwrap(), "EUR");
        assert!(currency("EURO").is_err());
        assert_eq!(language("EN").unwrap(), "en");
        assert!(language("pt-br").is_err());
        assert!(language("english").is_err());
        assert!(language("e").is_err());
        assert!(language("e1").is_err());
        assert_eq!(allergen_code("gluten").unwrap(), "GLUTEN");
        assert!(allergen_code("tree nuts").is_err());
    }

    #[test]
    fn numeric_bounds() {
        assert!(price(-1).is_err());
        assert_eq!(price(0).unwrap(), 0);
        assert!(table_count(0).is_err());
        assert!(table_count(MAX_TABLES + 1).is_err());
        assert_eq!(table_count(12).unwrap(), 12);
    }

    #[test]
    fn blank_optional_text_becomes_none() {
        assert_eq!(note(Some("   ")).unwrap(), None);
        assert_eq!(note(Some(" no onions ")).unwrap().as_deref(), Some("no onions"));
        assert!(note(Some(&"x".repeat(MAX_NOTE_LEN + 1))).is_err());
        assert_eq!(image_url(Some("")).unwrap(), None);
        assert!(image_url(Some("ftp://img")).is_err());
    }

    #[test]
    fn translations_need_unique_languages() {
        assert!(translations(&[]).is_err());
        assert!(translations(&[tr("en", "Soup"), tr("EN", "Soup again")]).is_err());
        assert!(translations(&[tr("en", "  ")]).is_err());
        assert!(translations(&[tr("eng", "Soup")]).is_err());

        let normalised = translations(&[tr("EN", " Soup "), tr("es", "Sopa")]).unwrap();
        assert_eq!(normalised[0], tr("en", "Soup"));
        assert_eq!(normalised[1].language, "es");
    }
}
