//! Sketchpad configuration.
//!
//! The inference endpoint is injected (build-time environment or host page),
//! never hardcoded in the pipeline. Stroke and background colors are checked
//! for contrast because the exported raster is the only model input.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{SketchError, SketchResult};

/// Endpoint used when nothing is injected (local development service).
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000/";

/// Minimum relative-luminance difference between stroke and background.
pub const MIN_CONTRAST: f64 = 0.5;

/// Base URL of the inference service, always `/`-terminated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint(Url);

impl Endpoint {
    /// Parse and normalize an endpoint base URL.
    ///
    /// A missing trailing slash is appended so that relative routes resolve
    /// beneath the base path.
    ///
    /// # Errors
    ///
    /// Returns [`SketchError::Config`] if the URL is malformed or not http(s).
    pub fn parse(raw: &str) -> SketchResult<Self> {
        let mut url = Url::parse(raw.trim())
            .map_err(|e| SketchError::Config(format!("endpoint '{raw}': {e}")))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(SketchError::Config(format!(
                "endpoint '{raw}' must use http or https"
            )));
        }

        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            tracing::debug!("Appending trailing slash to endpoint path {}", url.path());
            url.set_path(&path);
        }

        Ok(Self(url))
    }

    /// The base URL.
    #[must_use]
    pub fn base(&self) -> &Url {
        &self.0
    }

    /// URL of the prediction route (`<base>predict`).
    ///
    /// # Errors
    ///
    /// Returns [`SketchError::Config`] if the route cannot be joined.
    pub fn predict_url(&self) -> SketchResult<Url> {
        self.0
            .join("predict")
            .map_err(|e| SketchError::Config(format!("predict route: {e}")))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

/// An RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba(pub [u8; 4]);

impl Rgba {
    /// Opaque black.
    pub const BLACK: Self = Self([0, 0, 0, 255]);
    /// Opaque white.
    pub const WHITE: Self = Self([255, 255, 255, 255]);

    /// Relative luminance in `[0, 1]` (sRGB, alpha ignored).
    #[must_use]
    pub fn luminance(self) -> f64 {
        fn linear(channel: u8) -> f64 {
            let c = f64::from(channel) / 255.0;
            if c <= 0.039_28 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        }
        let [r, g, b, _] = self.0;
        0.2126 * linear(r) + 0.7152 * linear(g) + 0.0722 * linear(b)
    }

    /// CSS representation (`#rrggbb` or `rgba(..)` when translucent).
    #[must_use]
    pub fn to_css(self) -> String {
        let [r, g, b, a] = self.0;
        if a == 255 {
            format!("#{r:02x}{g:02x}{b:02x}")
        } else {
            format!("rgba({r}, {g}, {b}, {})", f64::from(a) / 255.0)
        }
    }
}

impl FromStr for Rgba {
    type Err = SketchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().to_lowercase();
        match value.as_str() {
            "black" => return Ok(Self::BLACK),
            "white" => return Ok(Self::WHITE),
            _ => {}
        }

        let hex = value
            .strip_prefix('#')
            .ok_or_else(|| SketchError::Config(format!("Unknown color: {s}")))?;
        let byte = |i: usize| {
            hex.get(i..i + 2)
                .and_then(|h| u8::from_str_radix(h, 16).ok())
                .ok_or_else(|| SketchError::Config(format!("Invalid hex color: {s}")))
        };

        match hex.len() {
            6 => Ok(Self([byte(0)?, byte(2)?, byte(4)?, 255])),
            8 => Ok(Self([byte(0)?, byte(2)?, byte(4)?, byte(6)?])),
            _ => Err(SketchError::Config(format!("Invalid hex color: {s}"))),
        }
    }
}

impl TryFrom<String> for Rgba {
    type Error = SketchError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgba> for String {
    fn from(value: Rgba) -> Self {
        value.to_css()
    }
}

/// Pen used for every stroke.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokeStyle {
    /// Stroke width in pixels.
    pub width: f32,
    /// Stroke color.
    pub color: Rgba,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            width: 40.0,
            color: Rgba::BLACK,
        }
    }
}

/// Complete sketchpad configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SketchConfig {
    /// Inference service base URL.
    pub endpoint: String,
    /// Surface width in pixels.
    pub width: u32,
    /// Surface height in pixels.
    pub height: u32,
    /// Pen settings.
    pub stroke: StrokeStyle,
    /// Surface background fill.
    pub background: Rgba,
}

impl Default for SketchConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            width: 280,
            height: 280,
            stroke: StrokeStyle::default(),
            background: Rgba::WHITE,
        }
    }
}

impl SketchConfig {
    /// Parse configuration from host-supplied JSON. Missing fields keep
    /// their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is invalid or fails [`Self::validate`].
    pub fn from_json(json: &str) -> SketchResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Use a different endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// The parsed endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`SketchError::Config`] if the endpoint is malformed.
    pub fn endpoint(&self) -> SketchResult<Endpoint> {
        Endpoint::parse(&self.endpoint)
    }

    /// Check endpoint, surface size, stroke width and color contrast.
    ///
    /// # Errors
    ///
    /// Returns [`SketchError::Config`] describing the first violation.
    pub fn validate(&self) -> SketchResult<()> {
        self.endpoint()?;

        if self.width == 0 || self.height == 0 {
            return Err(SketchError::Config(format!(
                "surface size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }

        if !(self.stroke.width.is_finite() && self.stroke.width > 0.0) {
            return Err(SketchError::Config(format!(
                "stroke width must be positive, got {}",
                self.stroke.width
            )));
        }

        let contrast = (self.stroke.color.luminance() - self.background.luminance()).abs();
        if contrast < MIN_CONTRAST {
            return Err(SketchError::Config(format!(
                "stroke {} on background {} has contrast {contrast:.2}, need {MIN_CONTRAST}",
                self.stroke.color.to_css(),
                self.background.to_css()
            )));
        }

        Ok(())
    }
}
