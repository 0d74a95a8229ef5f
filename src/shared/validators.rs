use regex::Regex;
use reqwest::Url;
use std::sync::OnceLock;

use crate::domain::FieldParameters;

/// Largest field the form accepts, in acres
pub const MAX_FIELD_AREA_ACRES: f64 = 100_000.0;

/// Validation error type
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Validation error for field '{}': {}",
            self.field, self.message
        )
    }
}

impl std::error::Error for ValidationError {}

fn crop_name_regex() -> &'static Regex {
    static CROP_NAME_REGEX: OnceLock<Regex> = OnceLock::new();
    CROP_NAME_REGEX.get_or_init(|| Regex::new(r"^\p{L}[\p{L}\p{N} ,.'()/-]{0,63}$").unwrap())
}

/// Validate a crop name: starts with a letter, max 64 chars, no control characters
pub fn validate_crop_name(field: &str, name: &str) -> Result<(), ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::new(field, "Crop name cannot be empty"));
    }

    if !crop_name_regex().is_match(name) {
        return Err(ValidationError::new(
            field,
            "Crop name must start with a letter and contain at most 64 letters, digits, spaces or punctuation",
        ));
    }

    Ok(())
}

/// Validate field area in acres
pub fn validate_field_area(area: f64) -> Result<(), ValidationError> {
    if !area.is_finite() || area <= 0.0 {
        return Err(ValidationError::new(
            "fieldArea",
            "Field area must be a positive number of acres",
        ));
    }

    if area > MAX_FIELD_AREA_ACRES {
        return Err(ValidationError::new(
            "fieldArea",
            format!(
                "Field area {} exceeds maximum of {} acres",
                area, MAX_FIELD_AREA_ACRES
            ),
        ));
    }

    Ok(())
}

/// Validate the whole prediction form
///
/// The previous crop may be left blank (first season on the field).
pub fn validate_field_parameters(fields: &FieldParameters) -> Result<(), ValidationError> {
    validate_crop_name("cropName", &fields.crop_name)?;
    validate_field_area(fields.field_area)?;
    if !fields.previous_crop.trim().is_empty() {
        validate_crop_name("previousCrop", &fields.previous_crop)?;
    }
    Ok(())
}

/// Validate an endpoint URL (http or https, with a host)
pub fn validate_endpoint_url(url: &str) -> Result<(), ValidationError> {
    let parsed = Url::parse(url.trim())
        .map_err(|e| ValidationError::new("url", format!("'{}' is not a valid URL: {}", url, e)))?;

    match parsed.scheme() {
        "http" | "https" if parsed.host().is_some() => Ok(()),
        scheme => Err(ValidationError::new(
            "url",
            format!("'{}' uses unsupported scheme '{}', expected http or https", url, scheme),
        )),
    }
}
