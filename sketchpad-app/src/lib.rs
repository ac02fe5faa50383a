//! # Digit Sketchpad WASM Application
//!
//! Binds the sketchpad pipeline to a page: a drawing canvas, a clear and a
//! predict button, and a ten-row probability chart.
//!
//! ## Usage
//!
//! Build for WASM:
//! ```bash
//! SKETCHPAD_ENDPOINT=https://infer.example/ wasm-pack build --target web sketchpad-app
//! ```
//!
//! Then import in JavaScript:
//! ```javascript
//! import init, { SketchpadApp } from './pkg/sketchpad_app.js';
//!
//! await init();
//! const app = new SketchpadApp(JSON.stringify({ endpoint: 'http://localhost:8000/' }));
//! ```
//!
//! The page must contain `#sketch-canvas`, `#btn-clear`, `#btn-predict` and
//! `#chart`. A `#status` element is optional. Ids can be overridden with an
//! `ids` object in the configuration JSON.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod chart;
pub mod config;
pub mod error;
pub mod surface;

use std::rc::Rc;

use sketchpad_client::{HttpInferenceClient, PredictOutcome, SessionObserver, SketchSession};
use sketchpad_core::{ConnectionStatus, Phase, StrokeEvent, StrokePhase, ViewSnapshot};
use wasm_bindgen::prelude::*;
use web_sys::{
    Document, Event, EventTarget, HtmlButtonElement, HtmlCanvasElement, HtmlElement,
    PointerEvent, Window,
};

pub use chart::ChartView;
pub use config::{resolve_options, AppOptions, ElementIds};
pub use error::{AppError, AppResult};
pub use surface::HtmlCanvasSurface;

/// Session type used by the page.
pub type AppSession = SketchSession<HtmlCanvasSurface, HttpInferenceClient>;

const PREDICT_LABEL: &str = "PREDICT";
const PREDICT_BUSY_LABEL: &str = "...";

/// Initialize the WASM module.
#[wasm_bindgen(start)]
pub fn init_wasm() {
    console_error_panic_hook::set_once();
    tracing::info!("Digit sketchpad WASM initialized");
}

/// Renders session state into the page.
struct DomView {
    window: Window,
    chart: ChartView,
    predict_button: HtmlButtonElement,
    status: Option<HtmlElement>,
}

impl DomView {
    fn status_line(snapshot: &ViewSnapshot) -> String {
        let service = match snapshot.connection {
            ConnectionStatus::Unknown => "checking service",
            ConnectionStatus::Connected => "service online",
            ConnectionStatus::Unreachable => "service unreachable",
        };
        let phase = match (snapshot.phase, &snapshot.prediction) {
            (Phase::Idle, _) => "Draw a digit".to_string(),
            (Phase::Drawing, _) => "Drawing".to_string(),
            (Phase::Requesting, _) => "Predicting".to_string(),
            (Phase::Resolved, Some(prediction)) => {
                format!("Prediction: {}", prediction.digit.value())
            }
            (Phase::Resolved, None) => "Resolved".to_string(),
            (Phase::Failed, _) => "Prediction failed".to_string(),
        };
        format!("{phase} ({service})")
    }
}

impl SessionObserver for DomView {
    fn state_changed(&self, snapshot: &ViewSnapshot) {
        self.chart.render(&snapshot.chart);
        self.predict_button.set_disabled(snapshot.loading);
        self.predict_button.set_text_content(Some(if snapshot.loading {
            PREDICT_BUSY_LABEL
        } else {
            PREDICT_LABEL
        }));
        if let Some(status) = &self.status {
            status.set_text_content(Some(&Self::status_line(snapshot)));
        }
    }

    fn alert(&self, message: &str) {
        if self.window.alert_with_message(message).is_err() {
            tracing::error!("{message}");
        }
    }
}

/// An event listener that is removed when dropped.
struct Listener {
    target: EventTarget,
    event: &'static str,
    closure: Closure<dyn FnMut(Event)>,
}

impl Listener {
    fn attach(
        target: &EventTarget,
        event: &'static str,
        handler: impl FnMut(Event) + 'static,
    ) -> AppResult<Self> {
        let closure = Closure::<dyn FnMut(Event)>::new(handler);
        target
            .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
            .map_err(|e| AppError::dom(&e))?;
        Ok(Self {
            target: target.clone(),
            event,
            closure,
        })
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.event, self.closure.as_ref().unchecked_ref());
    }
}

/// The sketchpad bound to a page.
#[wasm_bindgen]
pub struct SketchpadApp {
    session: Rc<AppSession>,
    _listeners: Vec<Listener>,
}

#[wasm_bindgen]
impl SketchpadApp {
    /// Bind to the page.
    ///
    /// `config_json` may override the endpoint, canvas size, stroke,
    /// background and element ids.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or a required
    /// element is missing.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<SketchpadApp, JsValue> {
        let options = resolve_options(config_json.as_deref())?;
        Ok(Self::mount(&options)?)
    }

    /// Clear the canvas and the chart.
    pub fn clear(&self) {
        self.session.clear();
    }

    /// Classify the current drawing. Resolves to the outcome name.
    pub fn predict(&self) -> js_sys::Promise {
        let session = Rc::clone(&self.session);
        wasm_bindgen_futures::future_to_promise(async move {
            let outcome = session.predict().await;
            Ok(JsValue::from_str(outcome_name(outcome)))
        })
    }

    /// Probe the inference service. Resolves to the connection status.
    #[wasm_bindgen(js_name = checkService)]
    pub fn check_service(&self) -> js_sys::Promise {
        let session = Rc::clone(&self.session);
        wasm_bindgen_futures::future_to_promise(async move {
            let status = session.check_service().await;
            Ok(JsValue::from_str(match status {
                ConnectionStatus::Unknown => "unknown",
                ConnectionStatus::Connected => "connected",
                ConnectionStatus::Unreachable => "unreachable",
            }))
        })
    }

    /// Whether a prediction request is outstanding.
    #[wasm_bindgen(js_name = isLoading)]
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.session.snapshot().loading
    }

    /// Current view state as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    #[wasm_bindgen(js_name = stateJson)]
    pub fn state_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.session.snapshot())
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Current view state as a JavaScript object.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn state(&self) -> Result<JsValue, JsValue> {
        js_sys::JSON::parse(&self.state_json()?)
    }

    /// The canvas as a PNG data URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the canvas cannot be exported.
    #[wasm_bindgen(js_name = exportImage)]
    pub fn export_image(&self) -> Result<String, JsValue> {
        use sketchpad_core::DrawingSurface;

        self.session
            .with_surface(DrawingSurface::export_image)
            .map(|image| image.as_str().to_string())
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// The inference endpoint in use.
    #[must_use]
    pub fn endpoint(&self) -> String {
        self.session.client().endpoint().to_string()
    }
}

impl SketchpadApp {
    /// Bind to the page with resolved options.
    ///
    /// # Errors
    ///
    /// Returns an error if a required element is missing or the client
    /// cannot be built.
    pub fn mount(options: &AppOptions) -> AppResult<Self> {
        let window = web_sys::window().ok_or_else(|| AppError::Dom("No window object".into()))?;
        let document = window
            .document()
            .ok_or_else(|| AppError::Dom("No document object".into()))?;
        let ids = &options.ids;

        let canvas: HtmlCanvasElement = element(&document, &ids.canvas, "canvas")?;
        let clear_button: HtmlButtonElement = element(&document, &ids.clear, "button")?;
        let predict_button: HtmlButtonElement = element(&document, &ids.predict, "button")?;
        let chart_container = document
            .get_element_by_id(&ids.chart)
            .ok_or_else(|| AppError::MissingElement(ids.chart.clone()))?;
        let status = document
            .get_element_by_id(&ids.status)
            .and_then(|e| e.dyn_into::<HtmlElement>().ok());

        let surface = HtmlCanvasSurface::new(canvas.clone(), &options.config)?;
        let client = HttpInferenceClient::new(&options.config.endpoint()?)?;
        let session = Rc::new(SketchSession::new(surface, client));

        let view = DomView {
            window,
            chart: ChartView::mount(&document, &chart_container)?,
            predict_button: predict_button.clone(),
            status,
        };
        view.state_changed(&session.snapshot());
        session.add_observer(Rc::new(view));

        let listeners = bind_listeners(&session, &canvas, &clear_button, &predict_button)?;

        tracing::info!(
            "Sketchpad mounted on '{}' using {}",
            ids.canvas,
            session.client().endpoint()
        );

        let probe = Rc::clone(&session);
        wasm_bindgen_futures::spawn_local(async move {
            probe.check_service().await;
        });

        Ok(Self {
            session,
            _listeners: listeners,
        })
    }
}

fn element<T: JsCast>(document: &Document, id: &str, kind: &'static str) -> AppResult<T> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| AppError::MissingElement(id.to_string()))?
        .dyn_into::<T>()
        .map_err(|_| AppError::WrongElement(id.to_string(), kind))
}

fn bind_listeners(
    session: &Rc<AppSession>,
    canvas: &HtmlCanvasElement,
    clear_button: &HtmlButtonElement,
    predict_button: &HtmlButtonElement,
) -> AppResult<Vec<Listener>> {
    let mut listeners = Vec::new();

    for name in [
        "pointerdown",
        "pointermove",
        "pointerup",
        "pointercancel",
        "pointerleave",
    ] {
        let session = Rc::clone(session);
        listeners.push(Listener::attach(canvas.as_ref(), name, {
            let canvas = canvas.clone();
            move |event: Event| {
                let Some(pointer) = event.dyn_ref::<PointerEvent>() else {
                    return;
                };
                let phase = StrokePhase::from_name(&event.type_());
                if phase == StrokePhase::Start {
                    if pointer.button() != 0 {
                        return;
                    }
                    let _ = canvas.set_pointer_capture(pointer.pointer_id());
                }
                event.prevent_default();
                let (x, y) = session.with_surface(|surface| surface.event_to_point(pointer));
                session.draw(&StrokeEvent::new(phase, x, y));
            }
        })?);
    }

    let on_clear = Rc::clone(session);
    listeners.push(Listener::attach(clear_button.as_ref(), "click", move |_| {
        on_clear.clear();
    })?);

    let on_predict = Rc::clone(session);
    listeners.push(Listener::attach(predict_button.as_ref(), "click", move |_| {
        let session = Rc::clone(&on_predict);
        wasm_bindgen_futures::spawn_local(async move {
            let outcome = session.predict().await;
            tracing::debug!("Predict finished: {}", outcome_name(outcome));
        });
    })?);

    Ok(listeners)
}

fn outcome_name(outcome: PredictOutcome) -> &'static str {
    match outcome {
        PredictOutcome::Ignored => "ignored",
        PredictOutcome::NotReady => "not_ready",
        PredictOutcome::Applied => "applied",
        PredictOutcome::Discarded => "discarded",
        PredictOutcome::Failed => "failed",
    }
}

#[cfg(test)]
mod tests {
    use sketchpad_core::{to_view_model, PredictionResult};

    use super::*;

    fn snapshot(phase: Phase, prediction: Option<PredictionResult>) -> ViewSnapshot {
        ViewSnapshot {
            phase,
            prediction,
            loading: phase == Phase::Requesting,
            connection: ConnectionStatus::Connected,
            chart: to_view_model(None),
            last_error: None,
        }
    }

    #[test]
    fn status_line_names_the_winner() {
        let result = PredictionResult::new(7, None).expect("valid digit");
        let line = DomView::status_line(&snapshot(Phase::Resolved, Some(result)));
        assert_eq!(line, "Prediction: 7 (service online)");
    }

    #[test]
    fn status_line_while_requesting() {
        let line = DomView::status_line(&snapshot(Phase::Requesting, None));
        assert_eq!(line, "Predicting (service online)");
    }

    #[test]
    fn outcome_names_are_stable() {
        assert_eq!(outcome_name(PredictOutcome::Applied), "applied");
        assert_eq!(outcome_name(PredictOutcome::NotReady), "not_ready");
    }
}
