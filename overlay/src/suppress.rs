//! Modal suppression policy
//!
//! A higher-priority blocking panel forces the overlay hidden without
//! discarding the caller's open intent. Detection is dual-triggered: a
//! change-driven mutation signal, plus a fixed safety-net interval covering
//! mutations the observer misses (style changes outside observed
//! attributes, timing races). Both triggers feed the same idempotent
//! re-evaluation.

use std::time::{Duration, Instant};

use calque_core::{CalqueConfig, Page};

use crate::state::OverlayState;

pub struct SuppressionPolicy {
    selectors: Vec<String>,
    interval: Duration,
    dirty: bool,
    last_detection: Option<Instant>,
    blocker_visible: bool,
}

impl SuppressionPolicy {
    pub fn new(config: &CalqueConfig) -> Self {
        Self {
            selectors: config.blocker_selectors.clone(),
            interval: Duration::from_millis(config.suppression_interval_ms),
            dirty: true,
            last_detection: None,
            blocker_visible: false,
        }
    }

    /// Change-driven trigger: a document mutation was observed.
    pub fn note_mutation(&mut self) {
        self.dirty = true;
    }

    /// Whether a blocking panel is present and visually rendered.
    ///
    /// Runs the selector queries when the mutation signal fired or the
    /// safety interval elapsed; otherwise the cached verdict stands.
    pub fn blocker_open<P: Page>(&mut self, page: &P) -> bool {
        let due = self
            .last_detection
            .is_none_or(|at| at.elapsed() >= self.interval);
        if self.dirty || due {
            self.blocker_visible = self.detect(page);
            self.dirty = false;
            self.last_detection = Some(Instant::now());
        }
        self.blocker_visible
    }

    /// Unconditional fresh detection, used at open time so an already-open
    /// blocker suppresses before first paint.
    pub fn detect_now<P: Page>(&mut self, page: &P) -> bool {
        self.dirty = true;
        self.blocker_open(page)
    }

    fn detect<P: Page>(&self, page: &P) -> bool {
        self.selectors
            .iter()
            .any(|sel| page.query(sel).is_some_and(|node| page.is_rendered(node)))
    }

    /// Apply the suspend/resume transitions for the current blocker state.
    ///
    /// Never touches an overlay hidden for unrelated reasons: suspension
    /// only hides a shown overlay, and only un-hides what it hid itself.
    pub fn apply<P: Page>(&mut self, page: &mut P, state: &mut OverlayState) {
        let Some(nodes) = state.nodes else { return };

        let shown = !page.is_hidden(nodes.root);
        let blocker = self.blocker_open(page);

        if shown && blocker && !state.suspended_by_modal {
            state.suspended_by_modal = true;
            page.set_hidden(nodes.root, true);
            tracing::debug!("overlay suspended behind blocking panel");
        } else if state.suspended_by_modal && !blocker {
            state.suspended_by_modal = false;
            page.set_hidden(nodes.root, false);
            tracing::debug!("overlay resumed");
        }
    }
}
