//! Anchor location
//!
//! Finds the element whose on-screen rectangle the overlay must match: a
//! prioritized selector list first, then the first `<video>` — or its
//! parent, for skins that wrap a small intrinsic video in a styled
//! container.

use calque_core::{CalqueConfig, NodeId, Page};

pub struct AnchorLocator {
    candidates: Vec<String>,
    min_video_width: f64,
    min_video_height: f64,
}

impl AnchorLocator {
    pub fn new(config: &CalqueConfig) -> Self {
        Self {
            candidates: config.anchor_candidates.clone(),
            min_video_width: config.min_video_width,
            min_video_height: config.min_video_height,
        }
    }

    /// Resolve the current best anchor. Safe to call on a page without any
    /// player — that is a diagnostic no-op, not an error.
    pub fn locate<P: Page>(&self, page: &P) -> Option<NodeId> {
        for selector in &self.candidates {
            if let Some(node) = page.query(selector) {
                return Some(node);
            }
        }

        let video = page.first_video()?;
        match page.rect_of(video) {
            Some(rect) if rect.exceeds(self.min_video_width, self.min_video_height) => Some(video),
            _ => page.parent_of(video),
        }
    }
}
