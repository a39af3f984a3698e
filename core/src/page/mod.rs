//! Host-page abstraction
//!
//! This module defines the trait that host-surface backends must implement,
//! allowing the overlay engine to stay agnostic of how the page is actually
//! reached (webview bridge, test double, ...).
//!
//! The engine never holds an owning reference into the page's node tree:
//! nodes are addressed by [`NodeId`] and revalidated through the trait on
//! every use, because unrelated page logic may remove or replace them at any
//! time.

pub mod sim;

use tokio::sync::oneshot;

use crate::error::PageError;
use crate::geometry::{PixelRect, Rect};
use crate::locator::MountRequest;

pub use sim::SimPage;

/// Opaque handle to a node in the host page's tree.
///
/// Never dereferenced by the engine; validity is checked via
/// [`Page::contains`] before each use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u64);

/// Computed positioning scheme of a node, as the host reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CssPosition {
    #[default]
    Static,
    Relative,
    Absolute,
    Fixed,
}

/// The rectangle an overlay node is told to occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Fixed in viewport coordinates at the given pixel rect.
    Fixed(PixelRect),
    /// Absolute at 0,0 filling 100% of the parent container.
    Fill,
    /// Fixed, filling the entire viewport.
    FullPage,
}

/// A discrete perturbation reported by the host page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageEvent {
    Scroll,
    Resize,
    FullscreenChange,
    ViewportResize,
    ViewportScroll,
    /// The size-observed node changed dimensions.
    SizeChanged(NodeId),
    /// Attribute/subtree mutation somewhere in the document.
    Mutation,
}

/// Event stream a tracking session can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventInterest {
    Scroll,
    Resize,
    FullscreenChange,
    ViewportResize,
    ViewportScroll,
}

/// Completion signal for an in-flight script injection.
pub type ScriptLoad = oneshot::Receiver<Result<(), PageError>>;

/// Trait that all host-surface backends must implement.
///
/// Mutating calls are best-effort: the page may refuse (node gone, move
/// rejected) and the engine is expected to retry on a later pass rather
/// than treat it as fatal.
pub trait Page {
    // ─────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────

    /// Resolve a selector (`#id`, `.class`, `tag`, or a comma list) to the
    /// first matching node.
    fn query(&self, selector: &str) -> Option<NodeId>;

    /// First `<video>` element in document order, if any.
    fn first_video(&self) -> Option<NodeId>;

    /// Whether the node is still attached to the document tree.
    fn contains(&self, node: NodeId) -> bool;

    fn parent_of(&self, node: NodeId) -> Option<NodeId>;

    /// Current bounding rect in viewport coordinates. `None` once the node
    /// has left the tree.
    fn rect_of(&self, node: NodeId) -> Option<Rect>;

    /// Computed display is not `none` and computed visibility is not
    /// `hidden`.
    fn is_rendered(&self, node: NodeId) -> bool;

    fn computed_position(&self, node: NodeId) -> CssPosition;

    /// The node currently presented fullscreen, if any.
    fn fullscreen_node(&self) -> Option<NodeId>;

    fn body(&self) -> NodeId;

    /// Viewport size in CSS pixels.
    fn viewport(&self) -> (f64, f64);

    // ─────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────

    fn create_element(&mut self, tag: &str) -> NodeId;

    /// Append `child` to `parent`, detaching it from its previous parent.
    /// This is also the reparenting primitive; the host may refuse.
    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), PageError>;

    fn set_hidden(&mut self, node: NodeId, hidden: bool);

    fn is_hidden(&self, node: NodeId) -> bool;

    /// Remove every child of the node.
    fn clear_children(&mut self, node: NodeId);

    /// Force the node's position to `relative` (used on fullscreen
    /// containers whose computed position is `static`).
    fn set_relative_position(&mut self, node: NodeId);

    fn apply_placement(&mut self, node: NodeId, placement: Placement);

    /// Last placement applied to the node, if any.
    fn applied_placement(&self, node: NodeId) -> Option<Placement>;

    /// Request a full page reload. Best-effort.
    fn reload(&mut self) -> Result<(), PageError>;

    // ─────────────────────────────────────────────────────────────────────
    // Widget collaborator
    // ─────────────────────────────────────────────────────────────────────

    /// Whether a script tag whose source contains `src_fragment` is already
    /// present (possibly injected by another code path).
    fn script_present(&self, src_fragment: &str) -> bool;

    /// Start loading the given script. Completion (or failure) arrives on
    /// the returned channel.
    fn inject_script(&mut self, src: &str) -> ScriptLoad;

    /// Push a mount request onto the page's widget registration queue.
    fn enqueue_widget(&mut self, request: MountRequest);

    // ─────────────────────────────────────────────────────────────────────
    // Events
    // ─────────────────────────────────────────────────────────────────────

    fn subscribe(&mut self, interest: EventInterest);

    fn unsubscribe(&mut self, interest: EventInterest);

    /// Whether the host exposes a visual-viewport concept at all.
    fn has_visual_viewport(&self) -> bool;

    /// Whether the host can observe individual node resizes.
    fn supports_size_observer(&self) -> bool;

    fn observe_size(&mut self, node: NodeId);

    fn unobserve_size(&mut self, node: NodeId);

    /// Begin reporting document-wide attribute/subtree mutations.
    fn observe_mutations(&mut self);

    fn unobserve_mutations(&mut self);

    /// Drain pending events (non-blocking). Only subscribed streams and
    /// active observers produce entries.
    fn poll_events(&mut self) -> Vec<PageEvent>;
}
