//! # Digit Sketchpad Client
//!
//! The inference boundary and the session that drives one prediction:
//!
//! ```text
//! draw ──▶ DrawingSurface ──export──▶ to_payload ──▶ InferenceClient::predict
//!                                                          │
//!        SessionObserver ◀── snapshot ◀── ViewController ◀─┘
//! ```
//!
//! Everything runs on a single cooperative thread (the browser event loop, or
//! a current-thread runtime natively). The session never holds a state borrow
//! across the network await, so drawing and clearing stay responsive while a
//! request is outstanding.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod error;
pub mod session;

pub use client::{
    HttpInferenceClient, InferenceClient, PredictRequest, PredictResponse, ServiceStatus,
};
pub use error::InferenceError;
pub use session::{PredictOutcome, SessionObserver, SketchSession};
