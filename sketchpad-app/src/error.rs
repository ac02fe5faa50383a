//! Application errors and their conversion to JavaScript.

use sketchpad_client::InferenceError;
use sketchpad_core::SketchError;
use thiserror::Error;
use wasm_bindgen::JsValue;

/// Errors raised while binding the page.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required element is missing from the page.
    #[error("Element '{0}' not found")]
    MissingElement(String),

    /// An element exists but has the wrong type.
    #[error("Element '{0}' is not a {1}")]
    WrongElement(String, &'static str),

    /// A DOM call threw.
    #[error("DOM call failed: {0}")]
    Dom(String),

    /// Sketchpad configuration or surface error.
    #[error(transparent)]
    Sketch(#[from] SketchError),

    /// Inference client construction failed.
    #[error(transparent)]
    Inference(#[from] InferenceError),

    /// Host-supplied JSON could not be parsed.
    #[error("Invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// Wrap a thrown JavaScript value.
    #[must_use]
    pub fn dom(value: &JsValue) -> Self {
        Self::Dom(value.as_string().unwrap_or_else(|| format!("{value:?}")))
    }
}

impl From<AppError> for JsValue {
    fn from(err: AppError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

/// Result type for page binding.
pub type AppResult<T> = Result<T, AppError>;
