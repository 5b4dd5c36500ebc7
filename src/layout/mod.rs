pub mod binary;
pub mod relax;
pub mod squarify;
pub mod voronoi;

pub use binary::compute_binary_layout;
pub use relax::{Cell, CellEngine, PowerDiagram, RelaxOutcome, RelaxParams};
pub use squarify::compute_squarify_layout;
pub use voronoi::{compute_voronoi_layout, VoronoiCell, VoronoiConfig, VoronoiLayout};

use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;

use crate::tree::arena::NodeId;

/// Errors a subdivision step can reject its input with. Non-convergence is
/// deliberately absent: it is reported as a diagnostic flag on the layout,
/// not an error.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// Degenerate or under-specified clipping region.
    #[error("invalid clipping polygon: {0}")]
    InvalidPolygon(String),
    /// Non-positive total weight at a subdivision step.
    #[error("invalid weight: {0}")]
    InvalidWeight(String),
}

/// An axis-aligned rectangle in corner-point form.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Rect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Rect {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    pub fn area(&self) -> f64 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    /// Shrink by padding insets, clamping so the rect never inverts.
    pub fn inset(&self, pad: &Insets) -> Rect {
        let x0 = self.x0 + pad.left;
        let y0 = self.y0 + pad.top;
        Rect {
            x0,
            y0,
            x1: (self.x1 - pad.right).max(x0),
            y1: (self.y1 - pad.bottom).max(y0),
        }
    }
}

/// Per-side padding subtracted from a rect before laying out its children.
/// The top band is wider to leave room for a name label.
#[derive(Debug, Clone, Copy)]
pub struct Insets {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for Insets {
    fn default() -> Self {
        Self {
            top: 25.0,
            right: 6.0,
            bottom: 6.0,
            left: 6.0,
        }
    }
}

impl Insets {
    pub const ZERO: Insets = Insets {
        top: 0.0,
        right: 0.0,
        bottom: 0.0,
        left: 0.0,
    };
}

/// Configuration for the axis-aligned treemap layouts.
#[derive(Debug, Clone)]
pub struct RectConfig {
    /// Label-band padding applied per node before recursing into children
    pub padding: Insets,
    /// Minimum area to emit a node (LOD culling)
    pub min_area: f64,
    /// Maximum recursion depth (safety + performance)
    pub max_depth: u16,
}

impl Default for RectConfig {
    fn default() -> Self {
        Self {
            padding: Insets::default(),
            min_area: 1.0,
            max_depth: 64,
        }
    }
}

/// A positioned rectangle in a treemap layout.
#[derive(Debug, Clone, Copy)]
pub struct LayoutRect {
    pub node: NodeId,
    pub rect: Rect,
    pub depth: u16,
}

/// The full rect-layout result (rects + fast lookup).
#[derive(Debug)]
pub struct RectLayout {
    /// All emitted rectangles, root first
    pub rects: Vec<LayoutRect>,
    /// node → index into `rects`
    pub node_to_rect: HashMap<NodeId, usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inset_never_inverts() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        let shrunk = r.inset(&Insets::default());
        assert!(shrunk.width() >= 0.0);
        assert!(shrunk.height() >= 0.0);

        let tiny = Rect::new(0.0, 0.0, 4.0, 4.0);
        let gone = tiny.inset(&Insets::default());
        assert_eq!(gone.area(), 0.0);
    }

    #[test]
    fn default_insets_match_label_band() {
        let pad = Insets::default();
        assert_eq!(pad.top, 25.0);
        assert_eq!(pad.right, 6.0);
        assert_eq!(pad.bottom, 6.0);
        assert_eq!(pad.left, 6.0);
    }
}
