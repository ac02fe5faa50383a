//! Drawing surface backed by an HTML canvas.

use sketchpad_core::{
    DrawingSurface, RasterImage, Rgba, SketchConfig, SketchError, SketchResult, StrokeEvent,
    StrokePhase, StrokeStyle,
};
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent};

use crate::error::{AppError, AppResult};

/// A [`DrawingSurface`] that paints with the 2D context of a canvas element.
pub struct HtmlCanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    style: StrokeStyle,
    background: Rgba,
    pen: Option<(f64, f64)>,
}

impl HtmlCanvasSurface {
    /// Bind to a canvas, size it from the configuration and paint the
    /// background.
    ///
    /// # Errors
    ///
    /// Returns an error if the 2D context is unavailable.
    pub fn new(canvas: HtmlCanvasElement, config: &SketchConfig) -> AppResult<Self> {
        let ctx = canvas
            .get_context("2d")
            .map_err(|e| AppError::dom(&e))?
            .ok_or_else(|| AppError::Dom("2D context not available".to_string()))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| AppError::Dom("Failed to cast to 2D context".to_string()))?;

        canvas.set_width(config.width);
        canvas.set_height(config.height);

        let mut surface = Self {
            canvas,
            ctx,
            style: config.stroke,
            background: config.background,
            pen: None,
        };
        surface.clear();
        tracing::debug!("Canvas surface mounted at {}x{}", config.width, config.height);
        Ok(surface)
    }

    /// The underlying canvas element.
    #[must_use]
    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    /// Map a pointer event to canvas pixel coordinates, accounting for CSS
    /// scaling of the element.
    #[must_use]
    pub fn event_to_point(&self, event: &MouseEvent) -> (f32, f32) {
        let rect = self.canvas.get_bounding_client_rect();
        let scale_x = if rect.width() > 0.0 {
            f64::from(self.canvas.width()) / rect.width()
        } else {
            1.0
        };
        let scale_y = if rect.height() > 0.0 {
            f64::from(self.canvas.height()) / rect.height()
        } else {
            1.0
        };
        let x = (f64::from(event.client_x()) - rect.left()) * scale_x;
        let y = (f64::from(event.client_y()) - rect.top()) * scale_y;
        #[allow(clippy::cast_possible_truncation)]
        (x as f32, y as f32)
    }

    fn apply_pen(&self) {
        self.ctx.set_stroke_style_str(&self.style.color.to_css());
        self.ctx.set_fill_style_str(&self.style.color.to_css());
        self.ctx.set_line_width(f64::from(self.style.width));
        self.ctx.set_line_cap("round");
        self.ctx.set_line_join("round");
    }

    fn dot(&self, x: f64, y: f64) {
        self.apply_pen();
        self.ctx.begin_path();
        let radius = f64::from(self.style.width) / 2.0;
        if let Err(e) = self.ctx.arc(x, y, radius, 0.0, std::f64::consts::TAU) {
            tracing::warn!("Failed to draw stroke dot at ({x}, {y}): {e:?}");
            return;
        }
        self.ctx.fill();
    }

    fn segment(&self, from: (f64, f64), to: (f64, f64)) {
        self.apply_pen();
        self.ctx.begin_path();
        self.ctx.move_to(from.0, from.1);
        self.ctx.line_to(to.0, to.1);
        self.ctx.stroke();
    }
}

impl DrawingSurface for HtmlCanvasSurface {
    fn draw(&mut self, event: &StrokeEvent) -> bool {
        let point = (f64::from(event.x), f64::from(event.y));
        let finite = point.0.is_finite() && point.1.is_finite();

        let accepted = match event.phase {
            StrokePhase::Start => {
                if event.within(self.canvas.width(), self.canvas.height()) {
                    self.dot(point.0, point.1);
                    self.pen = Some(point);
                    true
                } else {
                    self.pen = None;
                    false
                }
            }
            StrokePhase::Move | StrokePhase::End => match self.pen {
                Some(from) if finite => {
                    self.segment(from, point);
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
        if !self.is_ready() {
            return Err(SketchError::Export("Canvas has no area".to_string()));
        }
        self.canvas
            .to_data_url_with_type("image/png")
            .map(RasterImage::from_data_url)
            .map_err(|e| SketchError::Export(format!("toDataURL failed: {e:?}")))
    }

    fn clear(&mut self) {
        self.pen = None;
        self.ctx.set_fill_style_str(&self.background.to_css());
        self.ctx.fill_rect(
            0.0,
            0.0,
            f64::from(self.canvas.width()),
            f64::from(self.canvas.height()),
        );
    }

    fn is_ready(&self) -> bool {
        self.canvas.width() > 0 && self.canvas.height() > 0
    }
}
