use regex::Regex;
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::sync::OnceLock;

use crate::domain::{PredictionRequest, PredictionResult};
use crate::error::ParseError;

/// Compose the instruction sent to the completion model
pub fn build_prompt(request: &PredictionRequest) -> String {
    let previous_crop = if request.previous_crop.is_empty() {
        "none"
    } else {
        request.previous_crop.as_str()
    };

    format!(
        r#"You are an agricultural expert AI. Based on the following environmental and field parameters, predict the crop yield and provide farming insights:

Temperature: {temperature}°C
Humidity: {humidity}%
CO₂: {co2} ppm
Moisture: {moisture}%
Crop Type: {crop_type}
Crop Name: {crop_name}
Field Area: {field_area} acres
Soil Type: {soil_type}
Fertilizer Used: {fertilizer}
Previous Crop: {previous_crop}

Respond with a JSON object strictly in the following format:
{{
  "yieldEstimate": "number (in tons/acre)",
  "expectedYieldInKg": number,
  "advice": "short string",
  "AlternativeCrops": ["string", "string"],
  "estimatedYield": "string",
  "confidence": number (between 0 and 100),
  "recommendations": ["string", "string", "string"]
}}
Return only the JSON with no extra explanation."#,
        temperature = request.temperature,
        humidity = request.humidity,
        co2 = request.co2,
        moisture = request.moisture,
        crop_type = request.crop_type,
        crop_name = request.crop_name,
        field_area = request.field_area,
        soil_type = request.soil_type,
        fertilizer = request.fertilizer_used,
        previous_crop = previous_crop,
    )
}

/// Remove the first markdown code fence, keeping only its interior
///
/// Handles both ```` ```json ```` and bare ```` ``` ```` openers. Text with no
/// fence is returned untouched.
pub fn strip_code_fence(text: &str) -> Cow<'_, str> {
    static FENCE_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = FENCE_REGEX
        .get_or_init(|| Regex::new(r"```(?i:json)?\s*([\s\S]*?)\s*```").unwrap());
    regex.replace(text, "$1")
}

/// Turn raw model output into a fully populated prediction
pub fn parse_prediction(raw: &str) -> Result<PredictionResult, ParseError> {
    let cleaned = strip_code_fence(raw);
    let value: Value = serde_json::from_str(cleaned.trim())?;
    let object = value
        .as_object()
        .ok_or_else(|| ParseError::invalid("body", "expected a JSON object"))?;

    let confidence = number_field(object, &["confidence"])?;
    if !(0.0..=100.0).contains(&confidence) {
        return Err(ParseError::invalid(
            "confidence",
            format!("{} is outside 0-100", confidence),
        ));
    }

    let expected_yield_in_kg = number_field(object, &["expectedYieldInKg"])?;
    if expected_yield_in_kg < 0.0 {
        return Err(ParseError::invalid(
            "expectedYieldInKg",
            "yield cannot be negative",
        ));
    }

    Ok(PredictionResult {
        yield_estimate: text_field(object, &["yieldEstimate"])?,
        expected_yield_in_kg,
        advice: text_field(object, &["advice"])?,
        alternative_crops: list_field(object, &["AlternativeCrops", "alternativeCrops"])?,
        estimated_yield: text_field(object, &["estimatedYield"])?,
        confidence,
        recommendations: list_field(object, &["recommendations"])?,
    })
}

/// First present key wins; the first name is the one reported when absent
fn lookup<'a>(
    object: &'a Map<String, Value>,
    keys: &[&str],
) -> Result<(&'a Value, String), ParseError> {
    keys.iter()
        .find_map(|key| match object.get(*key) {
            None | Some(Value::Null) => None,
            Some(value) => Some((value, key.to_string())),
        })
        .ok_or_else(|| ParseError::MissingField(keys[0].to_string()))
}

fn text_field(object: &Map<String, Value>, keys: &[&str]) -> Result<String, ParseError> {
    let (value, key) = lookup(object, keys)?;
    match value {
        Value::String(s) => Ok(s.trim().to_string()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(ParseError::invalid(
            key,
            format!("expected text, got {}", other),
        )),
    }
}

/// Numbers may arrive as JSON numbers or numeric strings ("78", "78%")
fn number_field(object: &Map<String, Value>, keys: &[&str]) -> Result<f64, ParseError> {
    let (value, key) = lookup(object, keys)?;
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(n) if n.is_finite() => Ok(n),
        _ => Err(ParseError::invalid(
            key,
            format!("expected a number, got {}", value),
        )),
    }
}

fn list_field(object: &Map<String, Value>, keys: &[&str]) -> Result<Vec<String>, ParseError> {
    let (value, key) = lookup(object, keys)?;
    let items = value
        .as_array()
        .ok_or_else(|| ParseError::invalid(&key, "expected a list of strings"))?;

    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(|s| s.trim().to_string())
                .ok_or_else(|| ParseError::invalid(&key, format!("list item {} is not text", item)))
        })
        .collect()
}
