//! Playback-widget collaborator
//!
//! The widget script-loads itself once per process; calque only guarantees
//! that the load happens exactly once, then hands mount requests to the
//! page's registration queue. Geometry tracking never depends on the
//! widget being ready.

use tokio::sync::OnceCell;

use calque_core::{MountRequest, NodeId, Page, SourceLocator, WidgetError};

/// Mount-point id the widget is told to render into.
pub const MOUNT_ID: &str = "calqueMount";

/// One-shot memoized script loader.
///
/// The first caller performs the load; every caller (including the first)
/// observes the same completion. A script tag already present from another
/// code path counts as loaded. A failed load is not memoized, so a later
/// `open()` retries.
pub struct WidgetLoader {
    src: String,
    loaded: OnceCell<()>,
}

impl WidgetLoader {
    pub fn new(src: &str) -> Self {
        Self {
            src: src.to_string(),
            loaded: OnceCell::new(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.initialized()
    }

    pub async fn ensure_loaded<P: Page>(&self, page: &mut P) -> Result<(), WidgetError> {
        let load = async {
            if page.script_present(&self.src) {
                tracing::debug!("widget script already present, skipping injection");
                return Ok(());
            }
            match page.inject_script(&self.src).await {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(WidgetError::ScriptLoad(e)),
                Err(_) => Err(WidgetError::LoaderGone),
            }
        };
        self.loaded.get_or_try_init(|| load).await.map(|_| ())
    }
}

/// Clear the host and enqueue a mount for a recognized locator.
///
/// Unrecognized locators skip the mount entirely — the overlay still opens
/// and tracks geometry, which is useful for reserving the rectangle.
/// Returns whether a mount was enqueued.
pub fn mount<P: Page>(page: &mut P, host: NodeId, locator: &str) -> bool {
    let Some(source) = SourceLocator::classify(locator) else {
        tracing::debug!(locator, "unsupported locator, mount skipped");
        return false;
    };

    page.clear_children(host);
    let mount = page.create_element("div");
    if let Err(e) = page.append_child(host, mount) {
        tracing::debug!(error = %e, "could not attach mount node");
    }
    page.enqueue_widget(MountRequest::new(MOUNT_ID, &source));
    true
}
