use serde_json::{Map, Value};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

use crate::domain::SensorSnapshot;
use crate::error::{DashboardError, ParseError};
use crate::validators::validate_endpoint_url;

/// Read endpoint of the farm's realtime store
pub const DEFAULT_SNAPSHOT_URL: &str =
    "https://yieldtrack-sensors-default-rtdb.firebaseio.com/sensors.json";

pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Anything that can produce one sensor snapshot per call
pub trait SnapshotSource: Send + Sync {
    fn fetch_snapshot(&self) -> impl Future<Output = Result<SensorSnapshot, DashboardError>> + Send;
}

/// Snapshot source backed by a plain `GET` against a JSON endpoint
#[derive(Debug, Clone)]
pub struct HttpSnapshotClient {
    http: reqwest::Client,
    url: String,
}

impl HttpSnapshotClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, DashboardError> {
        let url = url.into();
        validate_endpoint_url(&url)?;

        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self { http, url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl SnapshotSource for HttpSnapshotClient {
    async fn fetch_snapshot(&self) -> Result<SensorSnapshot, DashboardError> {
        let response = self.http.get(&self.url).send().await?.error_for_status()?;
        let body = response.text().await?;
        debug!(url = %self.url, bytes = body.len(), "Fetched snapshot body");

        Ok(parse_snapshot(&body)?)
    }
}

/// Parse a snapshot body
///
/// Requires a JSON object whose `temperature`, `humidity`, `gas` and
/// `moisture` keys hold numbers. Other keys are ignored.
pub fn parse_snapshot(body: &str) -> Result<SensorSnapshot, ParseError> {
    let value: Value = serde_json::from_str(body)?;
    let object = value
        .as_object()
        .ok_or_else(|| ParseError::invalid("body", "expected a JSON object"))?;

    Ok(SensorSnapshot {
        temperature: number(object, "temperature")?,
        humidity: number(object, "humidity")?,
        gas: number(object, "gas")?,
        moisture: number(object, "moisture")?,
    })
}

fn number(object: &Map<String, Value>, key: &str) -> Result<f64, ParseError> {
    match object.get(key) {
        None | Some(Value::Null) => Err(ParseError::MissingField(key.to_string())),
        Some(value) => value
            .as_f64()
            .ok_or_else(|| ParseError::invalid(key, format!("expected a number, got {}", value))),
    }
}
