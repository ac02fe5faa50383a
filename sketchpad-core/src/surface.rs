//! Drawing surfaces.
//!
//! A surface exclusively owns its raster buffer; callers only draw, export
//! and clear. [`RasterSurface`] is the pure-Rust implementation used off the
//! browser and in tests. The WASM app provides a DOM-backed one.

use std::fmt;

use base64::Engine;
use image::{ImageEncoder, RgbaImage};

use crate::{Rgba, SketchConfig, SketchError, SketchResult, StrokeEvent, StrokePhase, StrokeStyle};

const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// An exported raster as a data URL (`data:image/png;base64,...`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    data_url: String,
}

impl RasterImage {
    /// Wrap a data URL produced by a surface.
    #[must_use]
    pub fn from_data_url(data_url: impl Into<String>) -> Self {
        Self {
            data_url: data_url.into(),
        }
    }

    /// Build a PNG data URL from encoded bytes.
    #[must_use]
    pub fn from_png_bytes(png: &[u8]) -> Self {
        let body = base64::engine::general_purpose::STANDARD.encode(png);
        Self::from_data_url(format!("{PNG_DATA_URL_PREFIX}{body}"))
    }

    /// The data URL.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.data_url
    }

    /// Decode the PNG bytes back out of the data URL.
    ///
    /// # Errors
    ///
    /// Returns [`SketchError::MalformedImage`] if this is not a base64 PNG
    /// data URL.
    pub fn png_bytes(&self) -> SketchResult<Vec<u8>> {
        let body = self.data_url.strip_prefix(PNG_DATA_URL_PREFIX).ok_or_else(|| {
            SketchError::MalformedImage("not a base64 PNG data URL".to_string())
        })?;
        base64::engine::general_purpose::STANDARD
            .decode(body)
            .map_err(|e| SketchError::MalformedImage(format!("Failed to decode base64: {e}")))
    }
}

impl fmt::Display for RasterImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.data_url)
    }
}

/// A surface that turns pointer strokes into a raster.
pub trait DrawingSurface {
    /// Paint a stroke sample. Samples outside the surface are clipped or
    /// ignored; this never fails.
    ///
    /// Returns `true` if the sample was accepted as part of a stroke.
    fn draw(&mut self, event: &StrokeEvent) -> bool;

    /// Serialize the current raster, including the latest stroke.
    ///
    /// # Errors
    ///
    /// Returns [`SketchError::Export`] if the surface is not ready yet.
    fn export_image(&self) -> SketchResult<RasterImage>;

    /// Reset to the background fill. Idempotent.
    fn clear(&mut self);

    /// Whether the surface has finished initializing.
    fn is_ready(&self) -> bool;
}

/// In-memory raster surface.
///
/// Starts unmounted; [`RasterSurface::mount`] allocates the buffer.
pub struct RasterSurface {
    style: StrokeStyle,
    background: Rgba,
    buffer: Option<RgbaImage>,
    /// Last point of the stroke in progress.
    pen: Option<(f32, f32)>,
}

impl RasterSurface {
    /// Create an unmounted surface.
    #[must_use]
    pub fn new(style: StrokeStyle, background: Rgba) -> Self {
        Self {
            style,
            background,
            buffer: None,
            pen: None,
        }
    }

    /// Create and mount a surface from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured size is zero.
    pub fn from_config(config: &SketchConfig) -> SketchResult<Self> {
        let mut surface = Self::new(config.stroke, config.background);
        surface.mount(config.width, config.height)?;
        Ok(surface)
    }

    /// Allocate a `width` x `height` buffer filled with the background.
    ///
    /// # Errors
    ///
    /// Returns [`SketchError::Config`] if either dimension is zero.
    pub fn mount(&mut self, width: u32, height: u32) -> SketchResult<()> {
        if width == 0 || height == 0 {
            return Err(SketchError::Config(format!(
                "cannot mount a {width}x{height} surface"
            )));
        }
        self.buffer = Some(RgbaImage::from_pixel(
            width,
            height,
            image::Rgba(self.background.0),
        ));
        self.pen = None;
        tracing::debug!("Raster surface mounted at {}x{}", width, height);
        Ok(())
    }

    /// Surface dimensions, if mounted.
    #[must_use]
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.buffer.as_ref().map(RgbaImage::dimensions)
    }

    /// Color at a pixel, if mounted and in bounds.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        self.buffer
            .as_ref()
            .and_then(|b| b.get_pixel_checked(x, y))
            .map(|p| Rgba(p.0))
    }

    /// Number of pixels that differ from the background.
    #[must_use]
    pub fn inked_pixels(&self) -> usize {
        let background = self.background.0;
        self.buffer
            .as_ref()
            .map_or(0, |b| b.pixels().filter(|p| p.0 != background).count())
    }

    fn stamp_segment(&mut self, from: (f32, f32), to: (f32, f32)) {
        let Some((width, height)) = self.dimensions() else {
            return;
        };
        let radius = self.style.width / 2.0;

        // Only the part of the segment that can touch the buffer is stamped
        #[allow(clippy::cast_precision_loss)]
        let bounds = (
            (-radius, -radius),
            (width as f32 + radius, height as f32 + radius),
        );
        let Some((from, to)) = clip_segment(from, to, bounds) else {
            return;
        };

        let (dx, dy) = (to.0 - from.0, to.1 - from.1);
        let distance = dx.hypot(dy);
        let step = (radius * 0.5).max(0.5);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let steps = (distance / step).ceil().max(1.0) as u32;

        for i in 0..=steps {
            #[allow(clippy::cast_precision_loss)]
            let t = i as f32 / steps as f32;
            self.stamp_disc(from.0 + dx * t, from.1 + dy * t, radius);
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    fn stamp_disc(&mut self, cx: f32, cy: f32, radius: f32) {
        let color = image::Rgba(self.style.color.0);
        let Some(buffer) = self.buffer.as_mut() else {
            return;
        };
        let (width, height) = buffer.dimensions();

        let x0 = (cx - radius).floor().max(0.0) as u32;
        let y0 = (cy - radius).floor().max(0.0) as u32;
        let x1 = ((cx + radius).ceil().max(0.0) as u32).min(width);
        let y1 = ((cy + radius).ceil().max(0.0) as u32).min(height);
        let r2 = radius * radius;

        for y in y0..y1 {
            for x in x0..x1 {
                let px = x as f32 + 0.5 - cx;
                let py = y as f32 + 0.5 - cy;
                if px * px + py * py <= r2 {
                    buffer.put_pixel(x, y, color);
                }
            }
        }
    }
}

/// Clip a segment to an axis-aligned box (Liang-Barsky). Returns `None` when
/// the segment misses the box or has non-finite coordinates.
fn clip_segment(
    from: (f32, f32),
    to: (f32, f32),
    (lo, hi): ((f32, f32), (f32, f32)),
) -> Option<((f32, f32), (f32, f32))> {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    if !(from.0.is_finite() && from.1.is_finite() && dx.is_finite() && dy.is_finite()) {
        return None;
    }

    let mut t0 = 0.0_f32;
    let mut t1 = 1.0_f32;
    for (p, q) in [
        (-dx, from.0 - lo.0),
        (dx, hi.0 - from.0),
        (-dy, from.1 - lo.1),
        (dy, hi.1 - from.1),
    ] {
        if p.abs() < f32::EPSILON {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    Some((
        (from.0 + dx * t0, from.1 + dy * t0),
        (from.0 + dx * t1, from.1 + dy * t1),
    ))
}

impl DrawingSurface for RasterSurface {
    fn draw(&mut self, event: &StrokeEvent) -> bool {
        let Some((width, height)) = self.dimensions() else {
            tracing::trace!("Ignoring stroke on unmounted surface");
            return false;
        };
        let point = (event.x, event.y);
        let finite = point.0.is_finite() && point.1.is_finite();

        let accepted = match event.phase {
            StrokePhase::Start => {
                if event.within(width, height) {
                    self.stamp_segment(point, point);
                    self.pen = Some(point);
                    true
                } else {
                    self.pen = None;
                    false
                }
            }
            StrokePhase::Move | StrokePhase::End => match self.pen {
                Some(last) if finite => {
                    self.stamp_segment(last, point);
                    self.pen = Some(point);
                    true
                }
                _ => false,
            },
            StrokePhase::Cancel => false,
        };

        if event.phase.ends_stroke() {
            self.pen = None;
        }
        accepted
    }

    fn export_image(&self) -> SketchResult<RasterImage> {
        let buffer = self
            .buffer
            .as_ref()
            .ok_or_else(|| SketchError::Export("surface has not been mounted".to_string()))?;
        let (width, height) = buffer.dimensions();

        let mut png = Vec::new();
        image::codecs::png::PngEncoder::new(&mut png)
            .write_image(buffer.as_raw(), width, height, image::ExtendedColorType::Rgba8)
            .map_err(|e| SketchError::Encoding(format!("PNG encoding failed: {e}")))?;

        Ok(RasterImage::from_png_bytes(&png))
    }

    fn clear(&mut self) {
        if let Some(buffer) = self.buffer.as_mut() {
            let fill = image::Rgba(self.background.0);
            buffer.pixels_mut().for_each(|p| *p = fill);
        }
        self.pen = None;
    }

    fn is_ready(&self) -> bool {
        self.buffer.is_some()
    }
}
