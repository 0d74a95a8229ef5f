//! Test doubles and generators shared by the unit tests
//!
//! Provides scripted implementations of the snapshot source and the
//! completion client, plus proptest strategies for domain values.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::completion::CompletionClient;
use crate::domain::{CropType, FertilizerType, FieldParameters, SensorSnapshot, SoilType};
use crate::error::DashboardError;
use crate::snapshot_client::SnapshotSource;

pub fn sample_snapshot() -> SensorSnapshot {
    SensorSnapshot {
        temperature: 24.0,
        humidity: 60.0,
        gas: 410.0,
        moisture: 55.0,
    }
}

pub fn sample_fields() -> FieldParameters {
    FieldParameters {
        crop_type: CropType::Cereal,
        crop_name: "Wheat".to_string(),
        field_area: 2.5,
        soil_type: SoilType::Loam,
        fertilizer_used: FertilizerType::Organic,
        previous_crop: "Rice".to_string(),
    }
}

pub const SAMPLE_PREDICTION_JSON: &str = r#"{
  "yieldEstimate": "3.2",
  "expectedYieldInKg": 8100,
  "advice": "Keep soil moisture above 60% during grain fill.",
  "AlternativeCrops": ["Barley", "Sorghum"],
  "estimatedYield": "3.2 tons/acre",
  "confidence": 78,
  "recommendations": ["Irrigate at dawn", "Split nitrogen doses", "Scout for rust weekly"]
}"#;

/// Snapshot source that replays queued results, then repeats `sample_snapshot`
pub struct ScriptedSource {
    script: Mutex<VecDeque<Result<SensorSnapshot, DashboardError>>>,
    latency: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_concurrent: AtomicUsize,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::with_latency(Duration::ZERO)
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            latency,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_concurrent: AtomicUsize::new(0),
        }
    }

    pub fn push_ok(&self, snapshot: SensorSnapshot) {
        self.script.lock().unwrap().push_back(Ok(snapshot));
    }

    pub fn push_err(&self, err: DashboardError) {
        self.script.lock().unwrap().push_back(Err(err));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent.load(Ordering::SeqCst)
    }
}

impl SnapshotSource for ScriptedSource {
    async fn fetch_snapshot(&self) -> Result<SensorSnapshot, DashboardError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_concurrent.fetch_max(now_in_flight, Ordering::SeqCst);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(sample_snapshot()))
    }
}

/// Completion client that replays queued replies and records every prompt
pub struct ScriptedCompletion {
    replies: Mutex<VecDeque<Result<String, DashboardError>>>,
    prompts: Mutex<Vec<String>>,
    latency: Duration,
}

impl ScriptedCompletion {
    pub fn new(latency: Duration) -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
            latency,
        }
    }

    pub fn reply(self, text: impl Into<String>) -> Self {
        self.replies.lock().unwrap().push_back(Ok(text.into()));
        self
    }

    pub fn fail(self, err: DashboardError) -> Self {
        self.replies.lock().unwrap().push_back(Err(err));
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl CompletionClient for ScriptedCompletion {
    async fn complete(&self, prompt: &str) -> Result<String, DashboardError> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let next = self.replies.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Err(DashboardError::Network("no scripted reply".to_string())))
    }
}

pub mod generators {
    use super::*;
    use proptest::prelude::*;

    /// Plausible sensor snapshot, integral or fractional
    pub fn sensor_snapshot() -> impl Strategy<Value = SensorSnapshot> {
        (-40.0..85.0f64, 0.0..100.0f64, 0.0..5000.0f64, 0.0..100.0f64).prop_map(
            |(temperature, humidity, gas, moisture)| SensorSnapshot {
                temperature,
                humidity,
                gas,
                moisture,
            },
        )
    }

    pub fn field_parameters() -> impl Strategy<Value = FieldParameters> {
        (
            prop::sample::select(CropType::ALL.to_vec()),
            prop::string::string_regex("[A-Z][a-z]{2,20}").expect("Valid regex for crop_name"),
            0.1..500.0f64,
            prop::sample::select(SoilType::ALL.to_vec()),
            prop::sample::select(FertilizerType::ALL.to_vec()),
            prop::string::string_regex("([A-Z][a-z]{2,20})?").expect("Valid regex for previous_crop"),
        )
            .prop_map(
                |(crop_type, crop_name, field_area, soil_type, fertilizer_used, previous_crop)| {
                    FieldParameters {
                        crop_type,
                        crop_name,
                        field_area,
                        soil_type,
                        fertilizer_used,
                        previous_crop,
                    }
                },
            )
    }
}
