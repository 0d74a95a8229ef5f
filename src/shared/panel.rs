use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::completion::CompletionClient;
use crate::domain::{FieldParameters, PredictionRequest, PredictionResult, SensorSnapshot};
use crate::error::{DashboardError, ErrorResponse};
use crate::prediction::{build_prompt, parse_prediction};
use crate::validators::validate_field_parameters;

/// How long the "in progress" indicator stays up after a submit
pub const DEFAULT_INDICATOR_DELAY: Duration = Duration::from_millis(1500);

/// What the results panel renders
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PanelState {
    pub loading: bool,
    /// Last successful prediction; failures never clear it
    pub result: Option<PredictionResult>,
    /// Error from the most recent submit, cleared by the next success
    pub error: Option<ErrorResponse>,
    pub request_id: Option<String>,
}

/// Owns the prediction flow for one results panel
pub struct PredictionPanel<C> {
    client: C,
    state: watch::Sender<PanelState>,
    in_flight: AtomicBool,
    indicator_delay: Duration,
}

/// Releases the single-flight flag, also when the submit future is dropped
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<C: CompletionClient> PredictionPanel<C> {
    pub fn new(client: C, indicator_delay: Duration) -> Self {
        let (state, _) = watch::channel(PanelState::default());
        Self {
            client,
            state,
            in_flight: AtomicBool::new(false),
            indicator_delay,
        }
    }

    /// Attach a view. Updates are only written while at least one view is attached.
    pub fn subscribe(&self) -> watch::Receiver<PanelState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> PanelState {
        self.state.borrow().clone()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Submit one prediction
    ///
    /// Rejected with `Busy` while another submit is running. On failure the
    /// previous result stays in place and the typed error is published.
    pub async fn predict(
        &self,
        snapshot: &SensorSnapshot,
        fields: &FieldParameters,
    ) -> Result<PredictionResult, DashboardError> {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            warn!("Prediction already in flight, rejecting submit");
            return Err(DashboardError::Busy);
        }
        let in_flight = InFlight(&self.in_flight);

        let request_id = Uuid::new_v4().to_string();

        if let Err(e) = validate_field_parameters(fields) {
            let err = DashboardError::from(e);
            warn!(request_id = %request_id, error = %err, "Prediction form rejected");
            self.publish(|state| {
                state.error = Some(err.to_response(&request_id));
                state.request_id = Some(request_id.clone());
            });
            return Err(err);
        }

        let request = PredictionRequest::new(snapshot, fields);
        let prompt = build_prompt(&request);
        info!(
            request_id = %request_id,
            crop = %request.crop_name,
            crop_type = %request.crop_type,
            field_area = request.field_area,
            "Submitting yield prediction"
        );

        self.publish(|state| {
            state.loading = true;
            state.request_id = Some(request_id.clone());
        });

        let indicator = tokio::time::sleep(self.indicator_delay);
        tokio::pin!(indicator);
        let mut indicator_cleared = false;

        let call = self.client.complete(&prompt);
        tokio::pin!(call);

        let raw = loop {
            tokio::select! {
                raw = &mut call => break raw,
                _ = &mut indicator, if !indicator_cleared => {
                    indicator_cleared = true;
                    self.clear_indicator(&request_id);
                }
            }
        };

        let outcome = raw.and_then(|text| Ok(parse_prediction(&text)?));
        match &outcome {
            Ok(result) => {
                info!(
                    request_id = %request_id,
                    confidence = result.confidence,
                    estimated_yield = %result.estimated_yield,
                    "Prediction received"
                );
                self.publish(|state| {
                    state.result = Some(result.clone());
                    state.error = None;
                });
            }
            Err(e) => {
                warn!(request_id = %request_id, error = %e, code = e.code(), "Prediction failed");
                self.publish(|state| state.error = Some(e.to_response(&request_id)));
            }
        }

        // The request is over; only the cosmetic indicator remains
        drop(in_flight);

        if !indicator_cleared {
            indicator.await;
            self.clear_indicator(&request_id);
        }

        outcome
    }

    /// Drop the indicator unless a newer submit has taken it over
    fn clear_indicator(&self, request_id: &str) {
        self.publish(|state| {
            if state.request_id.as_deref() == Some(request_id) {
                state.loading = false;
            }
        });
    }

    /// Apply an update unless every view has gone away
    fn publish(&self, update: impl FnOnce(&mut PanelState)) {
        if self.state.is_closed() {
            debug!("No view attached, dropping panel update");
            return;
        }
        self.state.send_modify(update);
    }
}
