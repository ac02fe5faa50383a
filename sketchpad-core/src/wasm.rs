//! WebAssembly bindings for sketchpad-core.
//!
//! Exposes the pure pipeline pieces to JavaScript hosts that bring their own
//! canvas and HTTP layer.

use wasm_bindgen::prelude::*;

use crate::{to_payload_str, to_view_model, PredictionResult, SketchConfig, ViewController};

/// Install the panic hook for readable panics in the browser console.
#[wasm_bindgen(js_name = installPanicHook)]
pub fn install_panic_hook() {
    console_error_panic_hook::set_once();
}

/// Strip the data URL preamble from an exported canvas image.
///
/// # Errors
///
/// Returns an error string if the input has no `data:` preamble.
#[wasm_bindgen(js_name = toPayload)]
pub fn to_payload_js(data_url: &str) -> Result<String, String> {
    to_payload_str(data_url)
        .map(crate::EncodedPayload::into_inner)
        .map_err(|e| e.to_string())
}

/// Build the chart view model for a digit and optional probabilities.
///
/// Pass `digit < 0` for "no prediction". Returns the chart as JSON.
///
/// # Errors
///
/// Returns an error string if the digit or probabilities are invalid.
#[wasm_bindgen(js_name = chartJson)]
pub fn chart_json(digit: i32, probabilities: Option<Vec<f64>>) -> Result<String, String> {
    let result = if digit < 0 {
        None
    } else {
        Some(
            PredictionResult::new(i64::from(digit), probabilities.as_deref())
                .map_err(|e| e.to_string())?,
        )
    };
    serde_json::to_string(&to_view_model(result.as_ref())).map_err(|e| e.to_string())
}

/// Validate configuration JSON, returning the normalized config as JSON.
///
/// # Errors
///
/// Returns an error string if parsing or validation fails.
#[wasm_bindgen(js_name = validateConfig)]
pub fn validate_config(json: &str) -> Result<String, String> {
    let config = SketchConfig::from_json(json).map_err(|e| e.to_string())?;
    serde_json::to_string(&config).map_err(|e| e.to_string())
}

/// View state for hosts that drive requests themselves.
#[wasm_bindgen]
pub struct WasmViewState {
    controller: ViewController,
    ticket: Option<crate::PredictTicket>,
}

#[wasm_bindgen]
impl WasmViewState {
    /// Create an idle view state.
    #[wasm_bindgen(constructor)]
    #[must_use]
    pub fn new() -> Self {
        Self {
            controller: ViewController::new(),
            ticket: None,
        }
    }

    /// Record a stroke.
    pub fn stroke(&mut self) {
        self.controller.stroke();
    }

    /// Start a request; returns `false` if one is already outstanding.
    #[wasm_bindgen(js_name = beginPredict)]
    pub fn begin_predict(&mut self) -> bool {
        match self.controller.begin_predict() {
            Some(ticket) => {
                self.ticket = Some(ticket);
                true
            }
            None => false,
        }
    }

    /// Apply a response body (`{"digit": .., "probabilities": ..}`) for the
    /// last started request. Returns `true` if it changed the view.
    ///
    /// # Errors
    ///
    /// Returns an error string if no request is outstanding.
    #[wasm_bindgen(js_name = applyResponse)]
    pub fn apply_response(
        &mut self,
        digit: i32,
        probabilities: Option<Vec<f64>>,
    ) -> Result<bool, String> {
        let ticket = self
            .ticket
            .take()
            .ok_or_else(|| "no outstanding request".to_string())?;
        let settled = match PredictionResult::new(i64::from(digit), probabilities.as_deref()) {
            Ok(result) => self.controller.resolve(ticket, result),
            Err(e) => self.controller.fail(ticket, e.to_string()),
        };
        Ok(settled == crate::Settlement::Applied)
    }

    /// Record a failure for the last started request.
    ///
    /// # Errors
    ///
    /// Returns an error string if no request is outstanding.
    #[wasm_bindgen(js_name = applyFailure)]
    pub fn apply_failure(&mut self, reason: &str) -> Result<bool, String> {
        let ticket = self
            .ticket
            .take()
            .ok_or_else(|| "no outstanding request".to_string())?;
        Ok(self.controller.fail(ticket, reason) == crate::Settlement::Applied)
    }

    /// Reset to idle.
    pub fn clear(&mut self) {
        self.controller.clear();
    }

    /// Whether a request is outstanding.
    #[must_use]
    pub fn loading(&self) -> bool {
        self.controller.loading()
    }

    /// Current snapshot as JSON.
    #[wasm_bindgen(js_name = snapshotJson)]
    #[must_use]
    pub fn snapshot_json(&self) -> String {
        serde_json::to_string(&self.controller.snapshot()).unwrap_or_default()
    }
}

impl Default for WasmViewState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_payload_js_strips_preamble() {
        assert_eq!(to_payload_js("data:image/png;base64,AAAA"), Ok("AAAA".to_string()));
        assert!(to_payload_js("AAAA").is_err());
    }

    #[test]
    fn chart_json_without_prediction() {
        let json = chart_json(-1, None).expect("chart");
        let value: serde_json::Value = serde_json::from_str(&json).expect("json");
        assert_eq!(value["rows"].as_array().map(Vec::len), Some(10));
    }

    #[test]
    fn view_state_discards_after_clear() {
        let mut state = WasmViewState::new();
        assert!(state.begin_predict());
        assert!(!state.begin_predict());
        state.clear();
        assert_eq!(state.apply_response(4, None), Ok(false));
        assert!(!state.loading());
    }
}
