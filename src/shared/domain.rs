use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::sensor_validation::ReadingStatus;

// ============================================================================
// Sensor Models
// ============================================================================

/// One complete read of all four sensor fields
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SensorSnapshot {
    /// Air temperature in °C
    pub temperature: f64,
    /// Relative humidity in %
    pub humidity: f64,
    /// CO2 concentration in ppm (the store calls it `gas`)
    pub gas: f64,
    /// Soil moisture in %
    pub moisture: f64,
}

/// A snapshot as published by the poller
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LiveReading {
    /// Monotonic per-poller sequence number, starting at 1
    pub seq: u64,
    pub fetched_at_ms: i64,
    pub snapshot: SensorSnapshot,
    pub status: ReadingStatus,
}

// ============================================================================
// Prediction Form Models
// ============================================================================

macro_rules! form_choice {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
        pub enum $name {
            $(#[serde(rename = $wire)] $variant,)+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant,)+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().to_ascii_lowercase();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|choice| choice.as_str() == wanted)
                    .ok_or_else(|| {
                        let options: Vec<_> = Self::ALL.iter().map(|c| c.as_str()).collect();
                        format!("'{}' is not one of {}", s, options.join(", "))
                    })
            }
        }
    };
}

form_choice! {
    /// Crop family offered by the prediction form
    CropType {
        Cereal => "cereal",
        Vegetable => "vegetable",
        Fruit => "fruit",
        Pulse => "pulse",
        Oilseed => "oilseed",
        Fiber => "fiber",
    }
}

form_choice! {
    SoilType {
        Sandy => "sandy",
        Clay => "clay",
        Silt => "silt",
        Loam => "loam",
        SandyLoam => "sandy-loam",
        ClayLoam => "clay-loam",
        SiltyLoam => "silty-loam",
        Peat => "peat",
    }
}

form_choice! {
    FertilizerType {
        Organic => "organic",
        Chemical => "chemical",
        Mixed => "mixed",
    }
}

/// Field parameters entered on the prediction form
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FieldParameters {
    pub crop_type: CropType,
    pub crop_name: String,
    /// Field area in acres
    pub field_area: f64,
    pub soil_type: SoilType,
    pub fertilizer_used: FertilizerType,
    pub previous_crop: String,
}

/// Everything sent to the model, frozen at submit time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRequest {
    pub temperature: f64,
    pub humidity: f64,
    pub co2: f64,
    pub moisture: f64,
    pub crop_type: CropType,
    pub crop_name: String,
    pub field_area: f64,
    pub soil_type: SoilType,
    pub fertilizer_used: FertilizerType,
    pub previous_crop: String,
}

impl PredictionRequest {
    pub fn new(snapshot: &SensorSnapshot, fields: &FieldParameters) -> Self {
        Self {
            temperature: snapshot.temperature,
            humidity: snapshot.humidity,
            co2: snapshot.gas,
            moisture: snapshot.moisture,
            crop_type: fields.crop_type,
            crop_name: fields.crop_name.trim().to_string(),
            field_area: fields.field_area,
            soil_type: fields.soil_type,
            fertilizer_used: fields.fertilizer_used,
            previous_crop: fields.previous_crop.trim().to_string(),
        }
    }
}

// ============================================================================
// Prediction Result Models
// ============================================================================

/// Structured yield prediction returned by the model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    pub yield_estimate: String,
    pub expected_yield_in_kg: f64,
    pub advice: String,
    #[serde(rename = "AlternativeCrops")]
    pub alternative_crops: Vec<String>,
    pub estimated_yield: String,
    /// 0..=100
    pub confidence: f64,
    pub recommendations: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_maps_fields_one_to_one() {
        let snapshot: SensorSnapshot = serde_json::from_str(
            r#"{"temperature": 24, "humidity": 60, "gas": 410, "moisture": 55}"#,
        )
        .unwrap();
        assert_eq!(snapshot.temperature, 24.0);
        assert_eq!(snapshot.humidity, 60.0);
        assert_eq!(snapshot.gas, 410.0);
        assert_eq!(snapshot.moisture, 55.0);
    }

    #[test]
    fn test_form_choice_parsing() {
        assert_eq!("Cereal".parse::<CropType>().unwrap(), CropType::Cereal);
        assert_eq!(" sandy-loam ".parse::<SoilType>().unwrap(), SoilType::SandyLoam);
        assert_eq!("mixed".parse::<FertilizerType>().unwrap(), FertilizerType::Mixed);

        let err = "gravel".parse::<SoilType>().unwrap_err();
        assert!(err.contains("gravel"));
        assert!(err.contains("silty-loam"));
    }

    #[test]
    fn test_request_takes_co2_from_gas() {
        let snapshot = SensorSnapshot {
            temperature: 24.0,
            humidity: 60.0,
            gas: 410.0,
            moisture: 55.0,
        };
        let fields = FieldParameters {
            crop_type: CropType::Cereal,
            crop_name: " Wheat ".to_string(),
            field_area: 2.5,
            soil_type: SoilType::Loam,
            fertilizer_used: FertilizerType::Organic,
            previous_crop: "Rice".to_string(),
        };

        let request = PredictionRequest::new(&snapshot, &fields);
        assert_eq!(request.co2, 410.0);
        assert_eq!(request.crop_name, "Wheat");
        assert_eq!(request.field_area, 2.5);
    }

    #[test]
    fn test_prediction_result_wire_names() {
        let result = PredictionResult {
            yield_estimate: "High".to_string(),
            expected_yield_in_kg: 8500.0,
            advice: "Irrigate early".to_string(),
            alternative_crops: vec!["Barley".to_string()],
            estimated_yield: "3.4 tons/acre".to_string(),
            confidence: 82.0,
            recommendations: vec![],
        };

        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("yieldEstimate").is_some());
        assert!(json.get("expectedYieldInKg").is_some());
        assert!(json.get("AlternativeCrops").is_some());
        assert!(json.get("estimatedYield").is_some());
    }
}
