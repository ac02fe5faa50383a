//! Prediction session: wires the surface, the encoder, the client and the
//! view state together.

use std::cell::RefCell;
use std::rc::Rc;

use sketchpad_core::{
    to_payload, ConnectionStatus, DrawingSurface, Settlement, StrokeEvent, StrokePhase,
    ViewController, ViewSnapshot,
};

use crate::{InferenceClient, InferenceError};

/// Alert text for failures that are not the service's fault.
const GENERIC_FAILURE: &str = "Prediction failed. Please try again.";

/// Receives view updates and user-visible alerts.
pub trait SessionObserver {
    /// Called after every state transition.
    fn state_changed(&self, snapshot: &ViewSnapshot);

    /// Called once per failed prediction.
    fn alert(&self, message: &str);
}

/// How a call to [`SketchSession::predict`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictOutcome {
    /// A request was already outstanding; nothing was sent.
    Ignored,
    /// The surface could not export yet; nothing was sent.
    NotReady,
    /// The response was applied to the view.
    Applied,
    /// The response arrived after a clear and was dropped.
    Discarded,
    /// The attempt failed and the view shows the failure.
    Failed,
}

/// One user's sketchpad session.
///
/// All methods take `&self` so that draw and clear can run while a
/// [`SketchSession::predict`] future is suspended on the network.
pub struct SketchSession<S, C> {
    surface: RefCell<S>,
    controller: RefCell<ViewController>,
    client: C,
    observers: RefCell<Vec<Rc<dyn SessionObserver>>>,
}

impl<S, C> SketchSession<S, C>
where
    S: DrawingSurface,
    C: InferenceClient,
{
    /// Create a session over a surface and a client.
    pub fn new(surface: S, client: C) -> Self {
        Self {
            surface: RefCell::new(surface),
            controller: RefCell::new(ViewController::new()),
            client,
            observers: RefCell::new(Vec::new()),
        }
    }

    /// Register an observer.
    pub fn add_observer(&self, observer: Rc<dyn SessionObserver>) {
        self.observers.borrow_mut().push(observer);
    }

    /// The inference client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Run a closure against the surface.
    pub fn with_surface<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.surface.borrow())
    }

    /// Run a closure against the surface mutably (mount, resize).
    pub fn with_surface_mut<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        f(&mut self.surface.borrow_mut())
    }

    /// Current view snapshot.
    pub fn snapshot(&self) -> ViewSnapshot {
        self.controller.borrow().snapshot()
    }

    /// Feed a pointer sample to the surface. Only a stroke the surface
    /// accepts moves the view to Drawing.
    pub fn draw(&self, event: &StrokeEvent) {
        let accepted = self.surface.borrow_mut().draw(event);

        if accepted && event.phase == StrokePhase::Start {
            let changed = {
                let mut controller = self.controller.borrow_mut();
                let before = controller.phase();
                controller.stroke();
                before != controller.phase()
            };
            if changed {
                self.notify();
            }
        }
    }

    /// Clear the surface and reset the view. An outstanding request is not
    /// cancelled; its response will be discarded.
    pub fn clear(&self) {
        self.surface.borrow_mut().clear();
        self.controller.borrow_mut().clear();
        self.notify();
    }

    /// Export, encode and classify the current drawing.
    pub async fn predict(&self) -> PredictOutcome {
        if !self.controller.borrow().can_predict() {
            tracing::debug!("Predict ignored while a request is outstanding");
            return PredictOutcome::Ignored;
        }

        let image = match self.surface.borrow().export_image() {
            Ok(image) => image,
            Err(e) => {
                tracing::warn!("Predict skipped: {e}");
                return PredictOutcome::NotReady;
            }
        };

        let Some(ticket) = self.controller.borrow_mut().begin_predict() else {
            return PredictOutcome::Ignored;
        };
        self.notify();

        let payload = match to_payload(&image) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!("Surface produced an unusable image: {e}");
                self.controller.borrow_mut().fail(ticket, e.to_string());
                self.notify();
                self.alert(GENERIC_FAILURE);
                return PredictOutcome::Failed;
            }
        };

        // No RefCell borrow is held across this await
        let response = self.client.predict(&payload).await;

        match response {
            Ok(result) => {
                let settled = self.controller.borrow_mut().resolve(ticket, result);
                self.notify();
                match settled {
                    Settlement::Applied => PredictOutcome::Applied,
                    Settlement::Discarded => PredictOutcome::Discarded,
                }
            }
            Err(err) => self.apply_failure(ticket, &err),
        }
    }

    /// Probe the service and record its reachability.
    pub async fn check_service(&self) -> ConnectionStatus {
        let status = match self.client.status().await {
            Ok(status) => {
                tracing::info!("Inference service: {}", status.message);
                ConnectionStatus::Connected
            }
            Err(e) => {
                tracing::warn!("Inference service probe failed: {e}");
                ConnectionStatus::Unreachable
            }
        };
        self.controller.borrow_mut().set_connection(status);
        self.notify();
        status
    }

    fn apply_failure(
        &self,
        ticket: sketchpad_core::PredictTicket,
        err: &InferenceError,
    ) -> PredictOutcome {
        let settled = self.controller.borrow_mut().fail(ticket, err.to_string());
        self.notify();
        match settled {
            Settlement::Applied => {
                self.alert(err.user_message());
                PredictOutcome::Failed
            }
            Settlement::Discarded => PredictOutcome::Discarded,
        }
    }

    fn observers(&self) -> Vec<Rc<dyn SessionObserver>> {
        self.observers.borrow().clone()
    }

    fn notify(&self) {
        let snapshot = self.snapshot();
        for observer in self.observers() {
            observer.state_changed(&snapshot);
        }
    }

    fn alert(&self, message: &str) {
        for observer in self.observers() {
            observer.alert(message);
        }
    }
}
