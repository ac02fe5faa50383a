//! Configuration resolution for the browser build.
//!
//! Endpoint precedence: host page JSON, then the `SKETCHPAD_ENDPOINT`
//! environment variable captured at build time, then the local default.

use serde::Deserialize;
use sketchpad_core::config::DEFAULT_ENDPOINT;
use sketchpad_core::SketchConfig;

use crate::error::AppResult;

/// Endpoint baked in at build time, if any.
#[must_use]
pub fn build_endpoint() -> &'static str {
    option_env!("SKETCHPAD_ENDPOINT").unwrap_or(DEFAULT_ENDPOINT)
}

/// Ids of the page elements the app binds to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ElementIds {
    /// Drawing canvas.
    pub canvas: String,
    /// Clear button.
    pub clear: String,
    /// Predict button.
    pub predict: String,
    /// Chart container.
    pub chart: String,
    /// Optional status line.
    pub status: String,
}

impl Default for ElementIds {
    fn default() -> Self {
        Self {
            canvas: "sketch-canvas".to_string(),
            clear: "btn-clear".to_string(),
            predict: "btn-predict".to_string(),
            chart: "chart".to_string(),
            status: "status".to_string(),
        }
    }
}

/// Host options: sketchpad settings plus element ids.
#[derive(Debug, Clone, PartialEq)]
pub struct AppOptions {
    /// Validated sketchpad configuration.
    pub config: SketchConfig,
    /// Element ids.
    pub ids: ElementIds,
}

#[derive(Deserialize)]
struct RawOptions {
    #[serde(default)]
    ids: ElementIds,
    #[serde(flatten)]
    config: serde_json::Map<String, serde_json::Value>,
}

/// Resolve options from optional host JSON.
///
/// # Errors
///
/// Returns an error if the JSON is malformed or the configuration is invalid.
pub fn resolve_options(json: Option<&str>) -> AppResult<AppOptions> {
    let (ids, mut fields) = match json {
        Some(json) => {
            let raw: RawOptions = serde_json::from_str(json)?;
            (raw.ids, raw.config)
        }
        None => (ElementIds::default(), serde_json::Map::new()),
    };

    fields
        .entry("endpoint")
        .or_insert_with(|| build_endpoint().into());

    let config: SketchConfig = serde_json::from_value(serde_json::Value::Object(fields))?;
    config.validate()?;

    Ok(AppOptions { config, ids })
}
