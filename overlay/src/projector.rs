//! Geometry projection
//!
//! Computes and applies the rectangle the overlay container must occupy.
//! Mode selection belongs to the caller; the projector only knows how to
//! realize each mode, and when a measurement is too degenerate to trust.

use calque_core::{CalqueConfig, CssPosition, NodeId, Page, Placement, Rect};

/// Caller-selected projection for one positioning pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// Track the anchor's viewport rect, fixed positioning.
    Anchored(Rect),
    /// Fill the given container edge to edge, absolute positioning.
    FillContainer(NodeId),
    /// Fill the viewport regardless of anchor or fullscreen state.
    FullPage,
}

pub struct GeometryProjector {
    min_anchor_dimension: f64,
    last_applied: Option<Placement>,
}

impl GeometryProjector {
    pub fn new(config: &CalqueConfig) -> Self {
        Self {
            min_anchor_dimension: config.min_anchor_dimension,
            last_applied: None,
        }
    }

    /// Apply the projection to the overlay node.
    ///
    /// Returns the placement applied, or `None` when the update was skipped
    /// because the anchor measured under the minimum in either dimension —
    /// a momentarily collapsed anchor mid-reflow is noise, and the last
    /// applied rectangle stays in effect.
    pub fn apply<P: Page>(
        &mut self,
        page: &mut P,
        overlay: NodeId,
        projection: Projection,
    ) -> Option<Placement> {
        let placement = match projection {
            Projection::Anchored(rect) => {
                if rect.smaller_than(self.min_anchor_dimension) {
                    return None;
                }
                Placement::Fixed(rect.rounded())
            }
            Projection::FillContainer(container) => {
                // An absolute child needs a positioned container.
                if page.computed_position(container) == CssPosition::Static {
                    page.set_relative_position(container);
                }
                Placement::Fill
            }
            Projection::FullPage => Placement::FullPage,
        };

        page.apply_placement(overlay, placement);
        self.last_applied = Some(placement);
        Some(placement)
    }

    pub fn last_applied(&self) -> Option<Placement> {
        self.last_applied
    }
}
