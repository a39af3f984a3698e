//! Overlay lifecycle controller
//!
//! The public open/close/query/full-page surface. Owns the page handle,
//! the single [`OverlayState`], and the engine components; everything else
//! is delegated. All failure paths favor silent degradation — a misplaced
//! or empty overlay beats crashing host-page script.

use calque_core::{CalqueConfig, NodeId, Page, WidgetError};

use crate::anchor::AnchorLocator;
use crate::projector::GeometryProjector;
use crate::state::{OverlayNodes, OverlayState};
use crate::suppress::SuppressionPolicy;
use crate::tracking::TrackingLoop;
use crate::widget::{self, WidgetLoader};

/// Options for [`OverlayController::close`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CloseOptions {
    /// Trigger a full page reload after teardown. Best-effort.
    pub reload: bool,
}

pub struct OverlayController<P: Page> {
    page: P,
    state: OverlayState,
    locator: AnchorLocator,
    policy: SuppressionPolicy,
    projector: GeometryProjector,
    tracking: TrackingLoop,
    widget: WidgetLoader,
}

impl<P: Page> OverlayController<P> {
    pub fn new(page: P, config: &CalqueConfig) -> Self {
        Self {
            page,
            state: OverlayState::default(),
            locator: AnchorLocator::new(config),
            policy: SuppressionPolicy::new(config),
            projector: GeometryProjector::new(config),
            tracking: TrackingLoop::new(),
            widget: WidgetLoader::new(&config.widget_script_src),
        }
    }

    /// Open the overlay over the player rectangle and mount the widget for
    /// the given locator.
    ///
    /// Without an anchor this is a logged no-op, not an error. A script
    /// load failure is the only `Err`; the overlay is already visible and
    /// tracking by then, and a later `open()` retries the load.
    pub async fn open(&mut self, locator: &str) -> Result<(), WidgetError> {
        let Some(anchor) = self.locator.locate(&self.page) else {
            tracing::warn!("player anchor not found, overlay not opened");
            return Ok(());
        };
        self.tracking.set_anchor(Some(anchor));

        let nodes = self.ensure_overlay_nodes();
        self.page.set_hidden(nodes.root, false);

        // An already-open blocker must suppress before first paint.
        self.policy.detect_now(&self.page);
        self.policy.apply(&mut self.page, &mut self.state);

        // The root starts as a direct child of body, wherever a previous
        // session left it.
        self.rehome_to_body(nodes.root);

        // One synchronous positioning pass before any frame arrives.
        self.run_pass();
        self.tracking.start(&mut self.page);

        self.widget.ensure_loaded(&mut self.page).await?;
        widget::mount(&mut self.page, nodes.mount_host, locator);
        Ok(())
    }

    /// Tear the session down. Reachable from every state; closing an
    /// already-closed overlay is safe.
    pub fn close(&mut self, options: CloseOptions) {
        if let Some(nodes) = self.state.nodes {
            self.page.clear_children(nodes.mount_host);
            self.page.set_hidden(nodes.root, true);
        }

        self.tracking.stop(&mut self.page, &mut self.state);

        if let Some(nodes) = self.state.nodes {
            self.rehome_to_body(nodes.root);
        }
        self.state.reset();

        if options.reload
            && let Err(e) = self.page.reload()
        {
            tracing::debug!(error = %e, "page reload rejected");
        }
    }

    /// True iff the overlay subtree exists and the root is not hidden.
    /// A suspended overlay reports closed, matching what is on screen.
    pub fn is_open(&self) -> bool {
        self.state
            .nodes
            .is_some_and(|nodes| !self.page.is_hidden(nodes.root))
    }

    /// Toggle the forced full-page mode. While shown, the root is moved to
    /// the end of body (so it paints above every sibling) and re-projected
    /// immediately in the new mode.
    pub fn set_full_page(&mut self, enabled: bool) {
        self.state.force_full_page = enabled;

        let Some(nodes) = self.state.nodes else {
            return;
        };
        if self.page.is_hidden(nodes.root) {
            return;
        }

        self.rehome_to_body(nodes.root);
        self.run_pass();
    }

    /// Diagnostic: what would the overlay anchor to right now?
    pub fn find_anchor(&self) -> Option<NodeId> {
        self.locator.locate(&self.page)
    }

    /// One frame tick; drives the tracking loop.
    pub fn on_frame(&mut self) {
        self.tracking.on_frame(
            &mut self.page,
            &mut self.state,
            &mut self.policy,
            &mut self.projector,
            &self.locator,
        );
    }

    pub fn is_suspended(&self) -> bool {
        self.state.suspended_by_modal
    }

    pub fn overlay_root(&self) -> Option<NodeId> {
        self.state.nodes.map(|nodes| nodes.root)
    }

    pub fn mount_host(&self) -> Option<NodeId> {
        self.state.nodes.map(|nodes| nodes.mount_host)
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut P {
        &mut self.page
    }

    fn run_pass(&mut self) {
        self.tracking.run_pass(
            &mut self.page,
            &mut self.state,
            &mut self.policy,
            &mut self.projector,
            &self.locator,
        );
    }

    /// Lazily create the overlay root + mount host, reusing a cached
    /// subtree as long as it is still in the document.
    fn ensure_overlay_nodes(&mut self) -> OverlayNodes {
        if let Some(nodes) = self.state.nodes
            && self.page.contains(nodes.root)
        {
            return nodes;
        }

        let root = self.page.create_element("div");
        let mount_host = self.page.create_element("div");
        self.page.set_hidden(root, true);
        if let Err(e) = self.page.append_child(root, mount_host) {
            tracing::debug!(error = %e, "could not assemble overlay subtree");
        }

        let nodes = OverlayNodes { root, mount_host };
        self.state.nodes = Some(nodes);
        nodes
    }

    /// Make the root a direct child of body (appending also moves it to
    /// the end, above earlier siblings). A refused move is left for the
    /// next pass to retry.
    fn rehome_to_body(&mut self, root: NodeId) {
        let body = self.page.body();
        if self.page.parent_of(root) == Some(body) {
            // Still re-append when ordering matters; a same-parent append
            // just moves the node to the end.
            match self.page.append_child(body, root) {
                Ok(()) => self.state.current_container = Some(body),
                Err(e) => tracing::debug!(error = %e, "could not reorder overlay in body"),
            }
            return;
        }
        match self.page.append_child(body, root) {
            Ok(()) => self.state.current_container = Some(body),
            Err(e) => {
                self.state.current_container = None;
                tracing::debug!(error = %e, "could not re-home overlay to body");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calque_core::{PageEvent, PixelRect, Placement, Rect, SimPage};

    const MAGNET: &str = "magnet:?xt=urn:btih:abc";

    fn config() -> CalqueConfig {
        let mut config = CalqueConfig::default();
        config.suppression_interval_ms = 0;
        config
    }

    /// Page with a `#playerWrap` anchor at a known rect.
    fn page_with_player() -> (SimPage, NodeId) {
        let mut page = SimPage::new();
        let body = page.body();
        let wrap = page.insert("div", body);
        page.set_dom_id(wrap, "playerWrap");
        page.set_rect(wrap, Rect::new(120.0, 64.0, 640.0, 360.0));
        let video = page.insert("video", wrap);
        page.set_rect(video, Rect::new(120.0, 64.0, 640.0, 360.0));
        (page, wrap)
    }

    #[tokio::test]
    async fn test_end_to_end_open_then_close() {
        let (page, _) = page_with_player();
        let mut controller = OverlayController::new(page, &config());

        controller.open(MAGNET).await.unwrap();

        assert!(controller.is_open());
        let root = controller.overlay_root().unwrap();
        assert!(!controller.page().is_hidden(root));
        assert_eq!(
            controller.page().applied_placement(root),
            Some(Placement::Fixed(PixelRect {
                left: 120,
                top: 64,
                width: 640,
                height: 360,
            }))
        );
        let queue = controller.page().widget_queue();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].magnet.as_deref(), Some(MAGNET));
        assert!(queue[0].torrent_url.is_none());

        let host = controller.mount_host().unwrap();
        assert!(!controller.page().children_of(host).is_empty());

        controller.close(CloseOptions { reload: false });
        assert!(!controller.is_open());
        assert!(controller.page().children_of(host).is_empty());
        assert!(controller.page().is_hidden(root));
        assert_eq!(controller.page().reload_count(), 0);

        // Closing again is safe.
        controller.close(CloseOptions::default());
        assert!(!controller.is_open());
    }

    #[tokio::test]
    async fn test_open_without_anchor_is_a_noop() {
        let page = SimPage::new();
        let mut controller = OverlayController::new(page, &config());

        controller.open(MAGNET).await.unwrap();
        assert!(!controller.is_open());
        assert!(controller.overlay_root().is_none());
        assert!(controller.page().widget_queue().is_empty());
        assert_eq!(controller.find_anchor(), None);
    }

    #[tokio::test]
    async fn test_unsupported_locator_still_tracks_geometry() {
        let (page, _) = page_with_player();
        let mut controller = OverlayController::new(page, &config());

        controller.open("https://example.com/file.mp4").await.unwrap();
        assert!(controller.is_open());
        assert!(controller.page().widget_queue().is_empty());
        // Script still loads; only the mount is skipped.
        assert_eq!(controller.page().injected_scripts().len(), 1);
    }

    #[tokio::test]
    async fn test_torrent_url_mount() {
        let (page, _) = page_with_player();
        let mut controller = OverlayController::new(page, &config());

        controller
            .open("https://example.com/a/file.torrent?x=1")
            .await
            .unwrap();
        let queue = controller.page().widget_queue();
        assert_eq!(queue.len(), 1);
        assert!(queue[0].magnet.is_none());
        assert_eq!(
            queue[0].torrent_url.as_deref(),
            Some("https://example.com/a/file.torrent?x=1")
        );
    }

    #[tokio::test]
    async fn test_script_failure_keeps_overlay_open_and_retries() {
        let (mut page, _) = page_with_player();
        page.set_script_load_fails(true);
        let mut controller = OverlayController::new(page, &config());

        assert!(controller.open(MAGNET).await.is_err());
        // Geometry is independent of widget readiness.
        assert!(controller.is_open());
        assert!(controller.page().widget_queue().is_empty());

        controller.page_mut().set_script_load_fails(false);
        controller.open(MAGNET).await.unwrap();
        assert_eq!(controller.page().injected_scripts().len(), 1);
        assert_eq!(controller.page().widget_queue().len(), 1);
    }

    #[tokio::test]
    async fn test_blocker_open_before_open_suppresses_first_paint() {
        let (mut page, _) = page_with_player();
        let body = page.body();
        let panel = page.insert("div", body);
        page.add_class(panel, "streamurl-overlay");

        let mut controller = OverlayController::new(page, &config());
        controller.open(MAGNET).await.unwrap();

        assert!(controller.is_suspended());
        assert!(!controller.is_open());

        // Blocker closes: next frame resumes and positions the overlay.
        controller.page_mut().set_display_none(panel, true);
        controller.on_frame();
        assert!(!controller.is_suspended());
        assert!(controller.is_open());
        let root = controller.overlay_root().unwrap();
        assert_eq!(
            controller.page().rect_of(root).unwrap(),
            Rect::new(120.0, 64.0, 640.0, 360.0)
        );
    }

    #[tokio::test]
    async fn test_suspension_does_not_survive_close() {
        let (mut page, _) = page_with_player();
        let body = page.body();
        let panel = page.insert("div", body);
        page.add_class(panel, "streamurl-overlay");
        page.set_display_none(panel, true);

        let mut controller = OverlayController::new(page, &config());
        controller.open(MAGNET).await.unwrap();

        // Blocker appears, overlay suspends.
        controller.page_mut().set_display_none(panel, false);
        controller.on_frame();
        assert!(controller.is_suspended());

        // User closes while suspended, then the blocker goes away: the
        // overlay must stay closed.
        controller.close(CloseOptions::default());
        assert!(!controller.is_suspended());
        controller.page_mut().set_display_none(panel, true);
        controller.on_frame();
        assert!(!controller.is_open());
    }

    #[tokio::test]
    async fn test_full_page_override_round_trip() {
        let (page, wrap) = page_with_player();
        let mut controller = OverlayController::new(page, &config());
        controller.open(MAGNET).await.unwrap();
        let root = controller.overlay_root().unwrap();

        controller.set_full_page(true);
        assert_eq!(
            controller.page().applied_placement(root),
            Some(Placement::FullPage)
        );
        let rect = controller.page().rect_of(root).unwrap();
        assert_eq!((rect.width, rect.height), (1280.0, 720.0));
        // The override holds across frames even as the anchor moves.
        controller
            .page_mut()
            .set_rect(wrap, Rect::new(0.0, 0.0, 320.0, 180.0));
        controller.on_frame();
        assert_eq!(
            controller.page().applied_placement(root),
            Some(Placement::FullPage)
        );

        controller.set_full_page(false);
        assert_eq!(
            controller.page().applied_placement(root),
            Some(Placement::Fixed(PixelRect {
                left: 0,
                top: 0,
                width: 320,
                height: 180,
            }))
        );
    }

    #[tokio::test]
    async fn test_small_anchor_rect_is_ignored() {
        let (page, wrap) = page_with_player();
        let mut controller = OverlayController::new(page, &config());
        controller.open(MAGNET).await.unwrap();
        let root = controller.overlay_root().unwrap();
        let good = controller.page().applied_placement(root);

        controller
            .page_mut()
            .set_rect(wrap, Rect::new(120.0, 64.0, 640.0, 12.0));
        controller.page_mut().push_event(PageEvent::Resize);
        controller.on_frame();
        assert_eq!(controller.page().applied_placement(root), good);

        controller
            .page_mut()
            .set_rect(wrap, Rect::new(120.0, 64.0, 640.0, 300.0));
        controller.on_frame();
        assert_eq!(
            controller.page().applied_placement(root),
            Some(Placement::Fixed(PixelRect {
                left: 120,
                top: 64,
                width: 640,
                height: 300,
            }))
        );
    }

    #[tokio::test]
    async fn test_close_with_reload() {
        let (page, _) = page_with_player();
        let mut controller = OverlayController::new(page, &config());
        controller.open(MAGNET).await.unwrap();

        controller.close(CloseOptions { reload: true });
        assert_eq!(controller.page().reload_count(), 1);

        // A refused reload is swallowed.
        controller.open(MAGNET).await.unwrap();
        controller.page_mut().set_reload_fails(true);
        controller.close(CloseOptions { reload: true });
        assert_eq!(controller.page().reload_count(), 1);
    }

    #[tokio::test]
    async fn test_close_rehomes_from_fullscreen_container() {
        let (page, wrap) = page_with_player();
        let mut controller = OverlayController::new(page, &config());
        controller.open(MAGNET).await.unwrap();
        let root = controller.overlay_root().unwrap();

        controller.page_mut().enter_fullscreen(wrap);
        controller.on_frame();
        assert_eq!(controller.page().parent_of(root), Some(wrap));

        controller.close(CloseOptions::default());
        let body = controller.page().body();
        assert_eq!(controller.page().parent_of(root), Some(body));
    }

    #[tokio::test]
    async fn test_reopen_reuses_overlay_subtree() {
        let (page, _) = page_with_player();
        let mut controller = OverlayController::new(page, &config());
        controller.open(MAGNET).await.unwrap();
        let first_root = controller.overlay_root().unwrap();

        controller.close(CloseOptions::default());
        controller.open(MAGNET).await.unwrap();
        assert_eq!(controller.overlay_root(), Some(first_root));
        assert!(controller.is_open());
        // The script was only ever injected once.
        assert_eq!(controller.page().injected_scripts().len(), 1);
    }
}
