//! Overlay engine state
//!
//! One explicit state object owned by the lifecycle controller and passed
//! by reference to the tracking loop and suppression policy — never read
//! from ambient scope.

use calque_core::NodeId;

/// Handles to the overlay's own subtree: the positioned root and the node
/// the playback widget renders into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayNodes {
    pub root: NodeId,
    pub mount_host: NodeId,
}

/// Per-page overlay state. Exactly one exists per controller.
///
/// `suspended_by_modal` implies the root is hidden in the page, while the
/// logical open intent survives — suspension reverses without the caller
/// re-issuing `open()`.
#[derive(Debug, Default)]
pub struct OverlayState {
    /// Overlay subtree, created lazily on first open and kept (hidden) for
    /// reuse across sessions.
    pub nodes: Option<OverlayNodes>,
    pub suspended_by_modal: bool,
    pub force_full_page: bool,
    /// Where the root currently lives: body, or the fullscreen element.
    /// `None` until a move succeeds, so a refused move is retried.
    pub current_container: Option<NodeId>,
}

impl OverlayState {
    /// Clear everything a session accumulated. The cached subtree stays.
    pub fn reset(&mut self) {
        self.suspended_by_modal = false;
        self.force_full_page = false;
        self.current_container = None;
    }
}
