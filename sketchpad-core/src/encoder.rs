//! Raster-to-payload encoding.
//!
//! Strips the `data:<media-type>;base64,` preamble from an exported data URL,
//! leaving only the base64 body the inference service expects.

use std::fmt;

use serde::Serialize;

use crate::{RasterImage, SketchError, SketchResult};

/// Transport-ready image body with the preamble removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EncodedPayload(String);

impl EncodedPayload {
    /// The encoded body.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the encoded body.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Length of the encoded body in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the body is empty (never true for a payload built here).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for EncodedPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Strip the preamble from an exported raster.
///
/// # Errors
///
/// Returns [`SketchError::MalformedImage`] if the raster lacks a
/// comma-delimited `data:` preamble or has an empty body.
pub fn to_payload(image: &RasterImage) -> SketchResult<EncodedPayload> {
    to_payload_str(image.as_str())
}

/// Strip the preamble from a data URL string.
///
/// # Errors
///
/// See [`to_payload`].
pub fn to_payload_str(data_url: &str) -> SketchResult<EncodedPayload> {
    let (preamble, body) = data_url
        .split_once(',')
        .ok_or_else(|| SketchError::MalformedImage("missing comma-delimited preamble".into()))?;

    if !preamble.starts_with("data:") {
        return Err(SketchError::MalformedImage(format!(
            "preamble '{}' is not a data URL header",
            truncate(preamble, 32)
        )));
    }

    if body.is_empty() {
        return Err(SketchError::MalformedImage("empty image body".into()));
    }

    Ok(EncodedPayload(body.to_string()))
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn strips_png_preamble() {
        let payload = to_payload_str("data:image/png;base64,AAAA").expect("valid");
        assert_eq!(payload.as_str(), "AAAA");
    }

    #[test]
    fn missing_comma_is_malformed() {
        let err = to_payload_str("AAAA").expect_err("no preamble");
        assert!(matches!(err, SketchError::MalformedImage(_)));
    }

    #[test]
    fn non_data_preamble_is_malformed() {
        let err = to_payload_str("image/png;base64,AAAA").expect_err("no data: scheme");
        assert!(matches!(err, SketchError::MalformedImage(_)));
    }

    #[test]
    fn empty_body_is_malformed() {
        let err = to_payload_str("data:image/png;base64,").expect_err("empty");
        assert!(matches!(err, SketchError::MalformedImage(_)));
    }

    #[test]
    fn splits_at_first_comma_only() {
        let payload = to_payload_str("data:text/plain,a,b").expect("valid");
        assert_eq!(payload.as_str(), "a,b");
    }

    proptest! {
        #[test]
        fn recovers_any_base64_body(body in "[A-Za-z0-9+/]{1,64}={0,2}") {
            let url = format!("data:image/png;base64,{body}");
            let payload = to_payload_str(&url).expect("valid");
            prop_assert_eq!(payload.as_str(), body.as_str());
        }
    }
}
