//! Tracking loop and trigger multiplexer
//!
//! Owns the lifecycle of every listener registration, the per-frame
//! re-evaluation, and the container reparenting that follows the
//! document's fullscreen element.
//!
//! The frame loop is driven externally: the embedder calls [`TrackingLoop::
//! on_frame`] once per tick, and the positioning pass re-runs
//! unconditionally each frame as a correctness backstop for perturbations
//! no discrete event reports (continuous CSS transitions, for one).
//! Discrete events and frame ticks are deliberately unordered relative to
//! each other — the projector is idempotent, so interleaving is safe.

use calque_core::{EventInterest, NodeId, Page, PageEvent};

use crate::anchor::AnchorLocator;
use crate::projector::{GeometryProjector, Projection};
use crate::state::OverlayState;
use crate::suppress::SuppressionPolicy;

const BASE_INTERESTS: [EventInterest; 3] = [
    EventInterest::Scroll,
    EventInterest::Resize,
    EventInterest::FullscreenChange,
];

const VIEWPORT_INTERESTS: [EventInterest; 2] =
    [EventInterest::ViewportResize, EventInterest::ViewportScroll];

/// Everything `start()` registered, so `stop()` can release exactly that.
#[derive(Debug, Default)]
struct TrackingSession {
    interests: Vec<EventInterest>,
    observed_anchor: Option<NodeId>,
}

pub struct TrackingLoop {
    tracking: bool,
    session: Option<TrackingSession>,
    anchor: Option<NodeId>,
}

impl Default for TrackingLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackingLoop {
    pub fn new() -> Self {
        Self {
            tracking: false,
            session: None,
            anchor: None,
        }
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    pub fn anchor(&self) -> Option<NodeId> {
        self.anchor
    }

    /// Seed (or re-seed) the anchor reference. It is revalidated on every
    /// pass anyway; this just spares the first relocation.
    pub fn set_anchor(&mut self, anchor: Option<NodeId>) {
        self.anchor = anchor;
    }

    /// Register every trigger source. Starting twice is a no-op.
    pub fn start<P: Page>(&mut self, page: &mut P) {
        if self.tracking {
            return;
        }
        self.tracking = true;

        let mut session = TrackingSession::default();

        // Change-driven signal for the suppression policy.
        page.observe_mutations();

        for interest in BASE_INTERESTS {
            page.subscribe(interest);
            session.interests.push(interest);
        }
        if page.has_visual_viewport() {
            for interest in VIEWPORT_INTERESTS {
                page.subscribe(interest);
                session.interests.push(interest);
            }
        }
        if page.supports_size_observer()
            && let Some(anchor) = self.anchor
        {
            page.observe_size(anchor);
            session.observed_anchor = Some(anchor);
        }

        self.session = Some(session);
        tracing::debug!("overlay tracking started");
    }

    /// Release everything `start()` registered. Stopping twice, or without
    /// a prior start, is a no-op.
    pub fn stop<P: Page>(&mut self, page: &mut P, state: &mut OverlayState) {
        self.tracking = false;

        let Some(session) = self.session.take() else {
            return;
        };
        for interest in session.interests {
            page.unsubscribe(interest);
        }
        if let Some(anchor) = session.observed_anchor {
            page.unobserve_size(anchor);
        }
        page.unobserve_mutations();

        state.current_container = None;
        tracing::debug!("overlay tracking stopped");
    }

    /// One frame tick: drain page events, then run the positioning pass.
    ///
    /// Safe to call after `stop()` — a callback scheduled before the stop
    /// sees the cleared flag and becomes a no-op.
    pub fn on_frame<P: Page>(
        &mut self,
        page: &mut P,
        state: &mut OverlayState,
        policy: &mut SuppressionPolicy,
        projector: &mut GeometryProjector,
        locator: &AnchorLocator,
    ) {
        if !self.tracking {
            return;
        }

        for event in page.poll_events() {
            match event {
                PageEvent::Mutation => policy.note_mutation(),
                // Discrete geometry events would each trigger a pass of
                // their own; one coalesced pass per frame is equivalent
                // since passes are idempotent.
                PageEvent::Scroll
                | PageEvent::Resize
                | PageEvent::FullscreenChange
                | PageEvent::ViewportResize
                | PageEvent::ViewportScroll
                | PageEvent::SizeChanged(_) => {}
            }
        }

        self.run_pass(page, state, policy, projector, locator);
    }

    /// The full positioning pass: suppression, anchor revalidation,
    /// container reconciliation, projection.
    pub fn run_pass<P: Page>(
        &mut self,
        page: &mut P,
        state: &mut OverlayState,
        policy: &mut SuppressionPolicy,
        projector: &mut GeometryProjector,
        locator: &AnchorLocator,
    ) {
        let Some(nodes) = state.nodes else {
            return;
        };

        // (a) suppression may hide or unhide the root
        policy.apply(page, state);
        if state.suspended_by_modal || page.is_hidden(nodes.root) {
            return;
        }

        // (b) the anchor may have been replaced by unrelated page logic
        if self.anchor.is_none_or(|a| !page.contains(a)) {
            self.anchor = locator.locate(page);
        }
        if self.anchor.is_none() && !state.force_full_page {
            return;
        }

        // (c) follow the fullscreen element; a refused move is retried on
        // the next pass
        let desired = page.fullscreen_node().unwrap_or_else(|| page.body());
        if state.current_container != Some(desired) {
            match page.append_child(desired, nodes.root) {
                Ok(()) => state.current_container = Some(desired),
                Err(e) => tracing::debug!(error = %e, "overlay move deferred"),
            }
        }

        // (d) project in the mode the state selects
        let projection = if state.force_full_page {
            Projection::FullPage
        } else if let Some(fs) = page
            .fullscreen_node()
            .filter(|fs| state.current_container == Some(*fs))
        {
            Projection::FillContainer(fs)
        } else {
            let Some(rect) = self.anchor.and_then(|a| page.rect_of(a)) else {
                return;
            };
            Projection::Anchored(rect)
        };
        projector.apply(page, nodes.root, projection);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::OverlayNodes;
    use calque_core::{CalqueConfig, Placement, Rect, SimPage};

    struct Rig {
        page: SimPage,
        state: OverlayState,
        policy: SuppressionPolicy,
        projector: GeometryProjector,
        locator: AnchorLocator,
        tracking: TrackingLoop,
        anchor: NodeId,
    }

    fn rig() -> Rig {
        let mut config = CalqueConfig::default();
        config.suppression_interval_ms = 0;

        let mut page = SimPage::new();
        let body = page.body();
        let anchor = page.insert("div", body);
        page.set_dom_id(anchor, "playerWrap");
        page.set_rect(anchor, Rect::new(100.0, 50.0, 640.0, 360.0));

        let root = page.insert("div", body);
        let host = page.insert("div", root);

        let mut state = OverlayState::default();
        state.nodes = Some(OverlayNodes {
            root,
            mount_host: host,
        });
        state.current_container = Some(body);

        let mut tracking = TrackingLoop::new();
        tracking.set_anchor(Some(anchor));

        Rig {
            page,
            state,
            policy: SuppressionPolicy::new(&config),
            projector: GeometryProjector::new(&config),
            locator: AnchorLocator::new(&config),
            tracking,
            anchor,
        }
    }

    impl Rig {
        fn frame(&mut self) {
            self.tracking.on_frame(
                &mut self.page,
                &mut self.state,
                &mut self.policy,
                &mut self.projector,
                &self.locator,
            );
        }

        fn root(&self) -> NodeId {
            self.state.nodes.unwrap().root
        }
    }

    #[test]
    fn test_start_twice_registers_once() {
        let mut r = rig();
        r.tracking.start(&mut r.page);
        r.tracking.start(&mut r.page);

        assert_eq!(r.page.subscription_count(EventInterest::Scroll), 1);
        assert_eq!(r.page.subscription_count(EventInterest::Resize), 1);
        assert_eq!(r.page.subscription_count(EventInterest::FullscreenChange), 1);
        assert_eq!(r.page.subscription_count(EventInterest::ViewportResize), 1);
        assert_eq!(r.page.mutation_observer_count(), 1);
        assert_eq!(r.page.size_observer_count(r.anchor), 1);
    }

    #[test]
    fn test_stop_releases_everything_and_is_idempotent() {
        let mut r = rig();
        r.tracking.start(&mut r.page);
        r.tracking.stop(&mut r.page, &mut r.state);

        assert_eq!(r.page.subscription_count(EventInterest::Scroll), 0);
        assert_eq!(r.page.mutation_observer_count(), 0);
        assert_eq!(r.page.size_observer_count(r.anchor), 0);
        assert_eq!(r.state.current_container, None);

        // Stop again without a start in between.
        r.tracking.stop(&mut r.page, &mut r.state);
        assert!(!r.tracking.is_tracking());
    }

    #[test]
    fn test_no_viewport_interests_without_visual_viewport() {
        let mut r = rig();
        r.page.set_visual_viewport(false);
        r.tracking.start(&mut r.page);
        assert_eq!(r.page.subscription_count(EventInterest::ViewportResize), 0);
        assert_eq!(r.page.subscription_count(EventInterest::ViewportScroll), 0);
        assert_eq!(r.page.subscription_count(EventInterest::Scroll), 1);
    }

    #[test]
    fn test_frame_after_stop_is_inert() {
        let mut r = rig();
        r.tracking.start(&mut r.page);
        r.frame();
        assert!(r.page.applied_placement(r.root()).is_some());

        r.tracking.stop(&mut r.page, &mut r.state);
        let before = r.page.applied_placement(r.root());
        r.page
            .set_rect(r.anchor, Rect::new(0.0, 0.0, 300.0, 200.0));
        r.frame();
        assert_eq!(r.page.applied_placement(r.root()), before);
    }

    #[test]
    fn test_pass_tracks_anchor_movement() {
        let mut r = rig();
        r.tracking.start(&mut r.page);
        r.frame();
        assert_eq!(
            r.page.rect_of(r.root()).unwrap(),
            Rect::new(100.0, 50.0, 640.0, 360.0)
        );

        // Scroll shifts the anchor; the next frame follows it.
        r.page
            .set_rect(r.anchor, Rect::new(100.0, -120.0, 640.0, 360.0));
        r.frame();
        assert_eq!(
            r.page.rect_of(r.root()).unwrap(),
            Rect::new(100.0, -120.0, 640.0, 360.0)
        );
    }

    #[test]
    fn test_anchor_relocated_when_replaced() {
        let mut r = rig();
        r.tracking.start(&mut r.page);
        r.frame();

        // The page swaps the player wrapper out from under us.
        r.page.remove_node(r.anchor);
        let body = r.page.body();
        let replacement = r.page.insert("div", body);
        r.page.set_dom_id(replacement, "playerContainer");
        r.page
            .set_rect(replacement, Rect::new(8.0, 8.0, 512.0, 288.0));

        r.frame();
        assert_eq!(r.tracking.anchor(), Some(replacement));
        assert_eq!(
            r.page.rect_of(r.root()).unwrap(),
            Rect::new(8.0, 8.0, 512.0, 288.0)
        );
    }

    #[test]
    fn test_fullscreen_reparents_and_fills() {
        let mut r = rig();
        r.tracking.start(&mut r.page);
        r.frame();

        let fs = r.anchor;
        r.page.enter_fullscreen(fs);
        r.frame();

        assert_eq!(r.page.parent_of(r.root()), Some(fs));
        assert_eq!(r.state.current_container, Some(fs));
        assert_eq!(r.page.applied_placement(r.root()), Some(Placement::Fill));
        // Static fullscreen container was forced relative.
        assert_eq!(
            r.page.computed_position(fs),
            calque_core::CssPosition::Relative
        );

        let body = r.page.body();
        r.page.exit_fullscreen();
        r.frame();
        assert_eq!(r.page.parent_of(r.root()), Some(body));
        assert!(matches!(
            r.page.applied_placement(r.root()),
            Some(Placement::Fixed(_))
        ));
    }

    #[test]
    fn test_refused_move_retries_next_pass() {
        let mut r = rig();
        r.tracking.start(&mut r.page);
        r.frame();

        let fs = r.anchor;
        r.page.set_refuse_moves(true);
        r.page.enter_fullscreen(fs);
        r.frame();

        // Move failed: container unchanged, still anchored.
        let body = r.page.body();
        assert_eq!(r.page.parent_of(r.root()), Some(body));
        assert_eq!(r.state.current_container, Some(body));
        assert!(matches!(
            r.page.applied_placement(r.root()),
            Some(Placement::Fixed(_))
        ));

        r.page.set_refuse_moves(false);
        r.frame();
        assert_eq!(r.page.parent_of(r.root()), Some(fs));
        assert_eq!(r.page.applied_placement(r.root()), Some(Placement::Fill));
    }

    #[test]
    fn test_suspended_pass_aborts_before_geometry() {
        let mut r = rig();
        r.tracking.start(&mut r.page);
        r.frame();
        let before = r.page.applied_placement(r.root());

        let body = r.page.body();
        let panel = r.page.insert("div", body);
        r.page.add_class(panel, "streamurl-overlay");
        r.page
            .set_rect(r.anchor, Rect::new(0.0, 0.0, 320.0, 180.0));
        r.frame();

        assert!(r.state.suspended_by_modal);
        assert!(r.page.is_hidden(r.root()));
        // Geometry untouched while suspended.
        assert_eq!(r.page.applied_placement(r.root()), before);

        // Blocker goes away: resumed and re-projected to the current rect.
        r.page.set_display_none(panel, true);
        r.frame();
        assert!(!r.state.suspended_by_modal);
        assert_eq!(
            r.page.rect_of(r.root()).unwrap(),
            Rect::new(0.0, 0.0, 320.0, 180.0)
        );
    }
}
