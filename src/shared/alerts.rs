use serde::{Deserialize, Serialize};

use crate::domain::SensorSnapshot;
use crate::sensor_validation::{
    validate_snapshot, Band, SensorStatus, CO2_OPTIMAL_PPM, HUMIDITY_OPTIMAL_PCT,
    SOIL_MOISTURE_OPTIMAL_PCT, TEMP_OPTIMAL_C,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// Notification raised for a reading outside its optimal band
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Alert {
    pub title: String,
    pub detail: String,
    pub severity: Severity,
}

impl Alert {
    fn new(title: &str, detail: String, severity: Severity) -> Self {
        Self {
            title: title.to_string(),
            detail,
            severity,
        }
    }
}

/// Derive notifications from one snapshot, most severe first
///
/// Implausible values raise a single "Sensor Fault" for that sensor instead
/// of a band alert.
pub fn evaluate_alerts(snapshot: &SensorSnapshot) -> Vec<Alert> {
    let status = validate_snapshot(snapshot);
    let mut alerts = Vec::new();

    let checks = [
        ("temperature", status.temperature, snapshot.temperature),
        ("humidity", status.humidity, snapshot.humidity),
        ("co2", status.co2, snapshot.gas),
        ("soil moisture", status.moisture, snapshot.moisture),
    ];
    for (sensor, sensor_status, value) in checks {
        if sensor_status == SensorStatus::OutOfRange {
            alerts.push(Alert::new(
                "Sensor Fault",
                format!("{} reading {} is outside the sensor's range", sensor, value),
                Severity::High,
            ));
        }
    }

    if status.moisture == SensorStatus::Ok {
        match SOIL_MOISTURE_OPTIMAL_PCT.classify(snapshot.moisture) {
            Band::Low => alerts.push(Alert::new(
                "Low Soil Moisture",
                format!(
                    "Soil moisture {:.0}% is below {:.0}%",
                    snapshot.moisture, SOIL_MOISTURE_OPTIMAL_PCT.min
                ),
                Severity::High,
            )),
            Band::High => alerts.push(Alert::new(
                "High Soil Moisture",
                format!(
                    "Soil moisture {:.0}% is above {:.0}%",
                    snapshot.moisture, SOIL_MOISTURE_OPTIMAL_PCT.max
                ),
                Severity::Low,
            )),
            Band::Optimal => {}
        }
    }

    if status.temperature == SensorStatus::Ok
        && TEMP_OPTIMAL_C.classify(snapshot.temperature) != Band::Optimal
    {
        alerts.push(Alert::new(
            "Temperature Alert",
            format!(
                "Temperature {:.1}°C is outside {:.0}-{:.0}°C",
                snapshot.temperature, TEMP_OPTIMAL_C.min, TEMP_OPTIMAL_C.max
            ),
            Severity::Medium,
        ));
    }

    if status.humidity == SensorStatus::Ok
        && HUMIDITY_OPTIMAL_PCT.classify(snapshot.humidity) != Band::Optimal
    {
        alerts.push(Alert::new(
            "Humidity Alert",
            format!(
                "Humidity {:.0}% is outside {:.0}-{:.0}%",
                snapshot.humidity, HUMIDITY_OPTIMAL_PCT.min, HUMIDITY_OPTIMAL_PCT.max
            ),
            Severity::Medium,
        ));
    }

    if status.co2 == SensorStatus::Ok && CO2_OPTIMAL_PPM.classify(snapshot.gas) != Band::Optimal {
        alerts.push(Alert::new(
            "CO2 Level Alert",
            format!(
                "CO2 {:.0} ppm is outside {:.0}-{:.0} ppm",
                snapshot.gas, CO2_OPTIMAL_PPM.min, CO2_OPTIMAL_PPM.max
            ),
            Severity::Medium,
        ));
    }

    // Stable sort keeps the insertion order within a severity
    alerts.sort_by(|a, b| b.severity.cmp(&a.severity));
    alerts
}
