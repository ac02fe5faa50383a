//! View state machine.
//!
//! Owns the phase, the current prediction, the loading flag and the request
//! generation. All mutation happens on one cooperative thread; the generation
//! counter is what keeps a late response from overwriting newer state.

use serde::{Deserialize, Serialize};

use crate::{to_view_model, ChartViewModel, PredictionResult};

/// Phase of the sketchpad view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Blank canvas, nothing predicted.
    Idle,
    /// The user has drawn since the last clear or result.
    Drawing,
    /// A prediction request is outstanding.
    Requesting,
    /// The last request produced a prediction.
    Resolved,
    /// The last request failed.
    Failed,
}

/// Reachability of the inference service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    /// Not probed yet.
    Unknown,
    /// The status route answered.
    Connected,
    /// The status route could not be reached.
    Unreachable,
}

/// Proof that a request was started, carrying its generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PredictTicket {
    generation: u64,
}

impl PredictTicket {
    /// Generation captured when the request started.
    #[must_use]
    pub fn generation(self) -> u64 {
        self.generation
    }
}

/// What happened to a settled response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// The response was current and changed the view.
    Applied,
    /// A clear or newer request superseded it; the view is untouched.
    Discarded,
}

/// Read-only view of the controller for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewSnapshot {
    /// Current phase.
    pub phase: Phase,
    /// Current prediction, if any.
    pub prediction: Option<PredictionResult>,
    /// Whether a request is outstanding (predict disabled).
    pub loading: bool,
    /// Service reachability.
    pub connection: ConnectionStatus,
    /// Chart rows for the current prediction.
    pub chart: ChartViewModel,
    /// Reason for the last failure, cleared on the next request or clear.
    pub last_error: Option<String>,
}

/// The sketchpad view state.
#[derive(Debug, Clone)]
pub struct ViewController {
    phase: Phase,
    prediction: Option<PredictionResult>,
    generation: u64,
    in_flight: Option<u64>,
    connection: ConnectionStatus,
    last_error: Option<String>,
}

impl ViewController {
    /// Create an idle controller.
    #[must_use]
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            prediction: None,
            generation: 0,
            in_flight: None,
            connection: ConnectionStatus::Unknown,
            last_error: None,
        }
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Current prediction.
    #[must_use]
    pub fn prediction(&self) -> Option<&PredictionResult> {
        self.prediction.as_ref()
    }

    /// True exactly while a request is outstanding.
    #[must_use]
    pub fn loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Whether predict is currently enabled.
    #[must_use]
    pub fn can_predict(&self) -> bool {
        !self.loading()
    }

    /// Current request generation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Record a stroke. Requesting is kept; every other phase becomes
    /// Drawing.
    pub fn stroke(&mut self) {
        if self.phase != Phase::Requesting && self.phase != Phase::Drawing {
            tracing::debug!("{:?} -> Drawing", self.phase);
            self.phase = Phase::Drawing;
        }
    }

    /// Start a request. Returns `None` while another one is outstanding.
    pub fn begin_predict(&mut self) -> Option<PredictTicket> {
        if let Some(outstanding) = self.in_flight {
            tracing::debug!("Predict ignored, request {outstanding} still outstanding");
            return None;
        }

        self.generation += 1;
        self.in_flight = Some(self.generation);
        self.last_error = None;
        tracing::debug!("{:?} -> Requesting (generation {})", self.phase, self.generation);
        self.phase = Phase::Requesting;

        Some(PredictTicket {
            generation: self.generation,
        })
    }

    /// Apply a successful response.
    pub fn resolve(&mut self, ticket: PredictTicket, result: PredictionResult) -> Settlement {
        self.settle(ticket);
        if !self.is_current(ticket) {
            tracing::warn!(
                "Discarding prediction {} from stale generation {}",
                result.digit,
                ticket.generation
            );
            return Settlement::Discarded;
        }

        tracing::info!("Predicted digit {}", result.digit);
        self.phase = Phase::Resolved;
        self.prediction = Some(result);
        Settlement::Applied
    }

    /// Apply a failed response. The prediction is reset.
    pub fn fail(&mut self, ticket: PredictTicket, reason: impl Into<String>) -> Settlement {
        let reason = reason.into();
        self.settle(ticket);
        if !self.is_current(ticket) {
            tracing::warn!(
                "Discarding failure from stale generation {}: {reason}",
                ticket.generation
            );
            return Settlement::Discarded;
        }

        tracing::warn!("Prediction failed: {reason}");
        self.phase = Phase::Failed;
        self.prediction = None;
        self.last_error = Some(reason);
        Settlement::Applied
    }

    /// Reset to Idle from any phase. An outstanding request keeps the
    /// loading flag until it settles, but its response will be discarded.
    pub fn clear(&mut self) {
        tracing::debug!("{:?} -> Idle (clear)", self.phase);
        self.phase = Phase::Idle;
        self.prediction = None;
        self.last_error = None;
        self.generation += 1;
    }

    /// Record the result of a service probe.
    pub fn set_connection(&mut self, status: ConnectionStatus) {
        if self.connection != status {
            tracing::info!("Inference service {:?}", status);
        }
        self.connection = status;
    }

    /// Current service reachability.
    #[must_use]
    pub fn connection(&self) -> ConnectionStatus {
        self.connection
    }

    /// Snapshot for rendering.
    #[must_use]
    pub fn snapshot(&self) -> ViewSnapshot {
        ViewSnapshot {
            phase: self.phase,
            prediction: self.prediction.clone(),
            loading: self.loading(),
            connection: self.connection,
            chart: to_view_model(self.prediction.as_ref()),
            last_error: self.last_error.clone(),
        }
    }

    fn settle(&mut self, ticket: PredictTicket) {
        if self.in_flight == Some(ticket.generation) {
            self.in_flight = None;
        }
    }

    fn is_current(&self, ticket: PredictTicket) -> bool {
        ticket.generation == self.generation
    }
}

impl Default for ViewController {
    fn default() -> Self {
        Self::new()
    }
}
