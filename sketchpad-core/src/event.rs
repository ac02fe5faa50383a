//! Pointer input for stroke capture.

use serde::{Deserialize, Serialize};

/// Phase of a stroke event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrokePhase {
    /// Pointer pressed (pen down).
    Start,
    /// Pointer dragged while pressed.
    Move,
    /// Pointer released (pen up).
    End,
    /// Pointer capture lost (left the surface, palm rejection, ...).
    Cancel,
}

impl StrokePhase {
    /// Parse a DOM-style phase name. Unknown names map to `Start`.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "move" | "moved" | "pointermove" => Self::Move,
            "end" | "ended" | "up" | "pointerup" => Self::End,
            "cancel" | "cancelled" | "leave" | "pointercancel" | "pointerleave" => Self::Cancel,
            _ => Self::Start,
        }
    }

    /// Whether this phase terminates the active stroke.
    #[must_use]
    pub fn ends_stroke(self) -> bool {
        matches!(self, Self::End | Self::Cancel)
    }
}

/// A single pointer sample in surface pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokeEvent {
    /// Phase of this sample.
    pub phase: StrokePhase,
    /// X position (pixels from left).
    pub x: f32,
    /// Y position (pixels from top).
    pub y: f32,
}

impl StrokeEvent {
    /// Create a new stroke event.
    #[must_use]
    pub fn new(phase: StrokePhase, x: f32, y: f32) -> Self {
        Self { phase, x, y }
    }

    /// Pen down at a point.
    #[must_use]
    pub fn start(x: f32, y: f32) -> Self {
        Self::new(StrokePhase::Start, x, y)
    }

    /// Drag to a point.
    #[must_use]
    pub fn moved(x: f32, y: f32) -> Self {
        Self::new(StrokePhase::Move, x, y)
    }

    /// Pen up at a point.
    #[must_use]
    pub fn end(x: f32, y: f32) -> Self {
        Self::new(StrokePhase::End, x, y)
    }

    /// Check whether the sample lies within a `width` x `height` surface.
    #[must_use]
    pub fn within(&self, width: u32, height: u32) -> bool {
        #[allow(clippy::cast_precision_loss)]
        let (w, h) = (width as f32, height as f32);
        self.x >= 0.0 && self.y >= 0.0 && self.x < w && self.y < h
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_names_follow_dom_events() {
        assert_eq!(StrokePhase::from_name("pointermove"), StrokePhase::Move);
        assert_eq!(StrokePhase::from_name("up"), StrokePhase::End);
        assert_eq!(StrokePhase::from_name("pointerleave"), StrokePhase::Cancel);
        assert_eq!(StrokePhase::from_name("pointerdown"), StrokePhase::Start);
        assert_eq!(StrokePhase::from_name("bogus"), StrokePhase::Start);
    }

    #[test]
    fn within_checks_half_open_bounds() {
        assert!(StrokeEvent::start(0.0, 0.0).within(10, 10));
        assert!(StrokeEvent::start(9.5, 9.5).within(10, 10));
        assert!(!StrokeEvent::start(10.0, 5.0).within(10, 10));
        assert!(!StrokeEvent::start(-0.1, 5.0).within(10, 10));
    }

    #[test]
    fn stroke_event_serializes_lowercase_phase() {
        let json = serde_json::to_string(&StrokeEvent::moved(1.0, 2.0)).expect("serialize");
        assert!(json.contains("\"move\""));
    }
}
