use serde::{Deserialize, Serialize};

use crate::domain::SensorSnapshot;

pub const TEMP_MIN_C: f64 = -40.0;
pub const TEMP_MAX_C: f64 = 85.0;
pub const HUMIDITY_MIN_PCT: f64 = 0.0;
pub const HUMIDITY_MAX_PCT: f64 = 100.0;
pub const SOIL_MOISTURE_MIN_PCT: f64 = 0.0;
pub const SOIL_MOISTURE_MAX_PCT: f64 = 100.0;
pub const CO2_MIN_PPM: f64 = 0.0;
pub const CO2_MAX_PPM: f64 = 10_000.0;

/// Optimal bands printed on the dashboard cards
pub const TEMP_OPTIMAL_C: OptimalRange = OptimalRange::new(20.0, 25.0);
pub const HUMIDITY_OPTIMAL_PCT: OptimalRange = OptimalRange::new(50.0, 70.0);
pub const SOIL_MOISTURE_OPTIMAL_PCT: OptimalRange = OptimalRange::new(60.0, 80.0);
pub const CO2_OPTIMAL_PPM: OptimalRange = OptimalRange::new(1000.0, 1300.0);

/// Plausibility of a single sensor value
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SensorStatus {
    Ok,
    OutOfRange,
}

/// Plausibility of every field in a snapshot
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReadingStatus {
    pub temperature: SensorStatus,
    pub humidity: SensorStatus,
    pub co2: SensorStatus,
    pub moisture: SensorStatus,
}

impl ReadingStatus {
    pub fn all_ok(&self) -> bool {
        [self.temperature, self.humidity, self.co2, self.moisture]
            .iter()
            .all(|s| *s == SensorStatus::Ok)
    }
}

/// Position of a value relative to its optimal band
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    Low,
    Optimal,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimalRange {
    pub min: f64,
    pub max: f64,
}

impl OptimalRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Bounds are inclusive
    pub fn classify(&self, value: f64) -> Band {
        if value < self.min {
            Band::Low
        } else if value > self.max {
            Band::High
        } else {
            Band::Optimal
        }
    }
}

fn within(value: f64, min: f64, max: f64) -> SensorStatus {
    if value.is_finite() && value >= min && value <= max {
        SensorStatus::Ok
    } else {
        SensorStatus::OutOfRange
    }
}

pub fn validate_temperature(temp_c: f64) -> SensorStatus {
    within(temp_c, TEMP_MIN_C, TEMP_MAX_C)
}

pub fn validate_humidity(humidity_pct: f64) -> SensorStatus {
    within(humidity_pct, HUMIDITY_MIN_PCT, HUMIDITY_MAX_PCT)
}

pub fn validate_soil_moisture(moisture_pct: f64) -> SensorStatus {
    within(moisture_pct, SOIL_MOISTURE_MIN_PCT, SOIL_MOISTURE_MAX_PCT)
}

pub fn validate_co2(co2_ppm: f64) -> SensorStatus {
    within(co2_ppm, CO2_MIN_PPM, CO2_MAX_PPM)
}

pub fn validate_snapshot(snapshot: &SensorSnapshot) -> ReadingStatus {
    ReadingStatus {
        temperature: validate_temperature(snapshot.temperature),
        humidity: validate_humidity(snapshot.humidity),
        co2: validate_co2(snapshot.gas),
        moisture: validate_soil_moisture(snapshot.moisture),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_temperature() {
        assert_eq!(validate_temperature(25.0), SensorStatus::Ok);
        assert_eq!(validate_temperature(-40.0), SensorStatus::Ok);
        assert_eq!(validate_temperature(85.0), SensorStatus::Ok);
        assert_eq!(validate_temperature(-41.0), SensorStatus::OutOfRange);
        assert_eq!(validate_temperature(86.0), SensorStatus::OutOfRange);
        assert_eq!(validate_temperature(f64::NAN), SensorStatus::OutOfRange);
    }

    #[test]
    fn test_validate_co2() {
        assert_eq!(validate_co2(410.0), SensorStatus::Ok);
        assert_eq!(validate_co2(-1.0), SensorStatus::OutOfRange);
        assert_eq!(validate_co2(25_000.0), SensorStatus::OutOfRange);
    }

    #[test]
    fn test_optimal_band_bounds_are_inclusive() {
        assert_eq!(TEMP_OPTIMAL_C.classify(20.0), Band::Optimal);
        assert_eq!(TEMP_OPTIMAL_C.classify(25.0), Band::Optimal);
        assert_eq!(TEMP_OPTIMAL_C.classify(19.9), Band::Low);
        assert_eq!(TEMP_OPTIMAL_C.classify(25.1), Band::High);
        assert_eq!(CO2_OPTIMAL_PPM.classify(410.0), Band::Low);
    }

    #[test]
    fn test_validate_snapshot() {
        let status = validate_snapshot(&SensorSnapshot {
            temperature: 24.0,
            humidity: 60.0,
            gas: 410.0,
            moisture: 55.0,
        });
        assert!(status.all_ok());

        let status = validate_snapshot(&SensorSnapshot {
            temperature: 24.0,
            humidity: 130.0,
            gas: 410.0,
            moisture: 55.0,
        });
        assert_eq!(status.humidity, SensorStatus::OutOfRange);
        assert!(!status.all_ok());
    }
}
