//! # Digit Sketchpad Core
//!
//! Core logic for the digit sketchpad: stroke capture, image export,
//! payload encoding, prediction results and the view state machine.
//! Compiles to WASM; no async and no I/O live here.
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────────────┐  export   ┌─────────────┐  strip   ┌────────────────┐
//! │ DrawingSurface│ ───────▶ │ RasterImage │ ───────▶ │ EncodedPayload │
//! └──────────────┘           └─────────────┘          └────────────────┘
//!                                                             │ predict
//!                                                             ▼
//! ┌──────────────┐  render   ┌────────────────┐  apply  ┌──────────────────┐
//! │ ChartViewModel│ ◀─────── │ ViewController │ ◀────── │ PredictionResult │
//! └──────────────┘           └────────────────┘         └──────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod controller;
pub mod encoder;
pub mod error;
pub mod event;
pub mod prediction;
pub mod presenter;
pub mod surface;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use config::{Endpoint, Rgba, SketchConfig, StrokeStyle};
pub use controller::{
    ConnectionStatus, Phase, PredictTicket, Settlement, ViewController, ViewSnapshot,
};
pub use encoder::{to_payload, to_payload_str, EncodedPayload};
pub use error::{SketchError, SketchResult};
pub use event::{StrokeEvent, StrokePhase};
pub use prediction::{Digit, PredictionResult, Probabilities, NUM_CLASSES};
pub use presenter::{to_view_model, BarRow, ChartViewModel};
pub use surface::{DrawingSurface, RasterImage, RasterSurface};

/// Sketchpad core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
