use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::domain::SensorSnapshot;

/// Automation waters a field once soil moisture drops below this
pub const AUTO_IRRIGATION_THRESHOLD_PCT: f64 = 50.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FieldId {
    Field1,
    Field2,
    Field3,
}

impl FieldId {
    pub const ALL: [FieldId; 3] = [FieldId::Field1, FieldId::Field2, FieldId::Field3];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldId::Field1 => "field1",
            FieldId::Field2 => "field2",
            FieldId::Field3 => "field3",
        }
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldId {
    type Err = IrrigationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "field1" | "1" => Ok(FieldId::Field1),
            "field2" | "2" => Ok(FieldId::Field2),
            "field3" | "3" => Ok(FieldId::Field3),
            _ => Err(IrrigationError::UnknownField(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IrrigationError {
    #[error("Manual control is disabled while automated irrigation is active")]
    AutoIrrigationActive,

    #[error("Unknown field: {0}")]
    UnknownField(String),
}

/// Local irrigation panel state
///
/// Nothing here reaches a device; the toggles are display state only.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct IrrigationState {
    pub field1: bool,
    pub field2: bool,
    pub field3: bool,
    pub auto_irrigation: bool,
}

impl Default for IrrigationState {
    fn default() -> Self {
        Self {
            field1: false,
            field2: false,
            field3: true,
            auto_irrigation: true,
        }
    }
}

impl IrrigationState {
    pub fn is_on(&self, field: FieldId) -> bool {
        match field {
            FieldId::Field1 => self.field1,
            FieldId::Field2 => self.field2,
            FieldId::Field3 => self.field3,
        }
    }

    fn slot(&mut self, field: FieldId) -> &mut bool {
        match field {
            FieldId::Field1 => &mut self.field1,
            FieldId::Field2 => &mut self.field2,
            FieldId::Field3 => &mut self.field3,
        }
    }

    /// Flip a field manually, returning its new value
    ///
    /// Refused while automation is on; the field keeps its value.
    pub fn toggle(&mut self, field: FieldId) -> Result<bool, IrrigationError> {
        if self.auto_irrigation {
            return Err(IrrigationError::AutoIrrigationActive);
        }
        let slot = self.slot(field);
        *slot = !*slot;
        Ok(*slot)
    }

    pub fn set_auto_irrigation(&mut self, enabled: bool) {
        self.auto_irrigation = enabled;
    }

    /// Whether automation would water now (advisory, nothing is sent)
    pub fn wants_water(&self, snapshot: &SensorSnapshot) -> bool {
        self.auto_irrigation && snapshot.moisture < AUTO_IRRIGATION_THRESHOLD_PCT
    }

    pub fn automation_status(&self) -> String {
        if self.auto_irrigation {
            format!(
                "Automated irrigation is active. System will irrigate when soil moisture drops below {:.0}%.",
                AUTO_IRRIGATION_THRESHOLD_PCT
            )
        } else {
            "Automated irrigation is disabled. Manual control is enabled.".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_with_moisture(moisture: f64) -> SensorSnapshot {
        SensorSnapshot {
            temperature: 22.0,
            humidity: 60.0,
            gas: 1100.0,
            moisture,
        }
    }

    #[test]
    fn test_default_matches_dashboard() {
        let state = IrrigationState::default();
        assert!(!state.is_on(FieldId::Field1));
        assert!(!state.is_on(FieldId::Field2));
        assert!(state.is_on(FieldId::Field3));
        assert!(state.auto_irrigation);
    }

    #[test]
    fn test_toggle_refused_while_automated() {
        let mut state = IrrigationState::default();
        assert_eq!(
            state.toggle(FieldId::Field1),
            Err(IrrigationError::AutoIrrigationActive)
        );
        assert!(!state.is_on(FieldId::Field1));
        assert_eq!(state, IrrigationState::default());
    }

    #[test]
    fn test_toggle_flips_in_manual_mode() {
        let mut state = IrrigationState::default();
        state.set_auto_irrigation(false);

        assert_eq!(state.toggle(FieldId::Field1), Ok(true));
        assert_eq!(state.toggle(FieldId::Field3), Ok(false));
        assert_eq!(state.toggle(FieldId::Field1), Ok(false));
        assert!(!state.is_on(FieldId::Field2));
    }

    #[test]
    fn test_field_id_parsing() {
        assert_eq!("field2".parse::<FieldId>(), Ok(FieldId::Field2));
        assert_eq!("3".parse::<FieldId>(), Ok(FieldId::Field3));
        assert!(matches!(
            "field9".parse::<FieldId>(),
            Err(IrrigationError::UnknownField(_))
        ));
    }

    #[test]
    fn test_wants_water_only_when_automated_and_dry() {
        let mut state = IrrigationState::default();
        assert!(state.wants_water(&snapshot_with_moisture(42.0)));
        assert!(!state.wants_water(&snapshot_with_moisture(50.0)));

        state.set_auto_irrigation(false);
        assert!(!state.wants_water(&snapshot_with_moisture(42.0)));
    }
}
