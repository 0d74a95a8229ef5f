// Plain-text rendering of the dashboard cards

use yieldtrack::{
    evaluate_alerts, Band, FieldId, IrrigationState, LiveReading, PanelState, CO2_OPTIMAL_PPM,
    HUMIDITY_OPTIMAL_PCT, SOIL_MOISTURE_OPTIMAL_PCT, TEMP_OPTIMAL_C,
};

fn band_label(band: Band) -> &'static str {
    match band {
        Band::Low => "LOW",
        Band::Optimal => "optimal",
        Band::High => "HIGH",
    }
}

pub fn reading_lines(reading: &LiveReading) -> Vec<String> {
    let s = &reading.snapshot;
    let mut lines = vec![
        format!("-- reading #{} --", reading.seq),
        format!(
            "Temperature   {:>7.1} °C   ({:.0}-{:.0} °C, {})",
            s.temperature,
            TEMP_OPTIMAL_C.min,
            TEMP_OPTIMAL_C.max,
            band_label(TEMP_OPTIMAL_C.classify(s.temperature))
        ),
        format!(
            "Humidity      {:>7.1} %    ({:.0}-{:.0} %, {})",
            s.humidity,
            HUMIDITY_OPTIMAL_PCT.min,
            HUMIDITY_OPTIMAL_PCT.max,
            band_label(HUMIDITY_OPTIMAL_PCT.classify(s.humidity))
        ),
        format!(
            "CO2 Level     {:>7.0} ppm  ({:.0}-{:.0} ppm, {})",
            s.gas,
            CO2_OPTIMAL_PPM.min,
            CO2_OPTIMAL_PPM.max,
            band_label(CO2_OPTIMAL_PPM.classify(s.gas))
        ),
        format!(
            "Soil Moisture {:>7.1} %    ({:.0}-{:.0} %, {})",
            s.moisture,
            SOIL_MOISTURE_OPTIMAL_PCT.min,
            SOIL_MOISTURE_OPTIMAL_PCT.max,
            band_label(SOIL_MOISTURE_OPTIMAL_PCT.classify(s.moisture))
        ),
    ];

    for alert in evaluate_alerts(s) {
        lines.push(format!(
            "! [{:?}] {}: {}",
            alert.severity, alert.title, alert.detail
        ));
    }
    lines
}

pub fn irrigation_lines(state: &IrrigationState, reading: Option<&LiveReading>) -> Vec<String> {
    let mut lines = vec!["-- irrigation --".to_string()];
    for field in FieldId::ALL {
        lines.push(format!(
            "{:<7} {}",
            field.as_str(),
            if state.is_on(field) { "ON" } else { "OFF" }
        ));
    }
    lines.push(state.automation_status());
    if let Some(reading) = reading {
        if state.wants_water(&reading.snapshot) {
            lines.push("Automation would irrigate now (soil is dry)".to_string());
        }
    }
    lines
}

pub fn panel_lines(state: &PanelState) -> Vec<String> {
    let mut lines = vec!["-- prediction --".to_string()];
    if state.loading {
        lines.push("Processing...".to_string());
    }
    if let Some(error) = &state.error {
        lines.push(format!("[{}] {}", error.error, error.message));
    }
    match &state.result {
        None => lines.push("No Prediction Data Yet".to_string()),
        Some(result) => {
            lines.push(format!("Estimated Yield: {}", result.estimated_yield));
            lines.push(format!("Confidence: {}%", result.confidence));
            lines.push(format!("Expected Yield: {} kg", result.expected_yield_in_kg));
            lines.push(format!("Expert Advice: {}", result.advice));
            for (i, rec) in result.recommendations.iter().enumerate() {
                lines.push(format!("  {}. {}", i + 1, rec));
            }
            if !result.alternative_crops.is_empty() {
                lines.push(format!(
                    "Alternative Crops: {}",
                    result.alternative_crops.join(", ")
                ));
            }
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use yieldtrack::{validate_snapshot, PredictionResult, SensorSnapshot};

    fn reading(moisture: f64) -> LiveReading {
        let snapshot = SensorSnapshot {
            temperature: 24.0,
            humidity: 60.0,
            gas: 1100.0,
            moisture,
        };
        LiveReading {
            seq: 3,
            fetched_at_ms: 0,
            status: validate_snapshot(&snapshot),
            snapshot,
        }
    }

    #[test]
    fn test_reading_lines_show_bands_and_alerts() {
        let lines = reading_lines(&reading(42.0));
        assert_eq!(lines[0], "-- reading #3 --");
        assert!(lines[1].contains("optimal"));
        assert!(lines[4].contains("LOW"));
        assert!(lines.iter().any(|l| l.contains("Low Soil Moisture")));
    }

    #[test]
    fn test_irrigation_lines() {
        let lines = irrigation_lines(&IrrigationState::default(), Some(&reading(42.0)));
        assert!(lines.contains(&"field3  ON".to_string()));
        assert!(lines.iter().any(|l| l.contains("would irrigate")));
    }

    #[test]
    fn test_panel_lines_empty_and_filled() {
        let empty = panel_lines(&PanelState::default());
        assert!(empty.contains(&"No Prediction Data Yet".to_string()));

        let state = PanelState {
            result: Some(PredictionResult {
                yield_estimate: "3.2".to_string(),
                expected_yield_in_kg: 8100.0,
                advice: "Keep soil moist".to_string(),
                alternative_crops: vec!["Barley".to_string()],
                estimated_yield: "3.2 tons/acre".to_string(),
                confidence: 78.0,
                recommendations: vec!["Irrigate at dawn".to_string()],
            }),
            ..PanelState::default()
        };
        let lines = panel_lines(&state);
        assert!(lines.contains(&"Confidence: 78%".to_string()));
        assert!(lines.contains(&"  1. Irrigate at dawn".to_string()));
        assert!(lines.contains(&"Alternative Crops: Barley".to_string()));
    }
}
