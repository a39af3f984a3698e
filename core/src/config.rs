//! Engine configuration
//!
//! Selector sets and thresholds are host-page specifics, not part of the
//! portable engine contract, so they live here and are injected into the
//! components that consume them. Defaults carry the values of the host page
//! calque was originally built against.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const APP_NAME: &str = "calque";
const CONFIG_NAME: &str = "config";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalqueConfig {
    /// Selectors that denote a player container, tried in order.
    pub anchor_candidates: Vec<String>,

    /// Selectors whose visible presence must suspend the overlay.
    pub blocker_selectors: Vec<String>,

    /// Source of the playback widget's embed script.
    pub widget_script_src: String,

    /// Safety-net interval for blocker re-detection, in milliseconds.
    pub suppression_interval_ms: u64,

    /// Anchor rects under this size (either dimension) are treated as
    /// mid-reflow noise and skipped.
    pub min_anchor_dimension: f64,

    /// Minimum rendered size for the bare `<video>` fallback; a smaller
    /// video anchors to its parent container instead.
    pub min_video_width: f64,
    pub min_video_height: f64,
}

impl Default for CalqueConfig {
    fn default() -> Self {
        Self {
            anchor_candidates: [
                "#playerHost",
                "#playerWrap",
                "#playerContainer",
                "#videoWrap",
                "#videoContainer",
                ".playerHost",
                ".playerWrap",
                ".playerContainer",
            ]
            .map(String::from)
            .to_vec(),
            blocker_selectors: [
                ".streamurl-overlay",
                "#radioOverlayLayer",
                "#iframeOverlay, .iframe-overlay, .iframeOverlay",
            ]
            .map(String::from)
            .to_vec(),
            widget_script_src:
                "https://cdn.jsdelivr.net/npm/@webtor/embed-sdk-js@0.2.19/dist/index.min.js"
                    .to_string(),
            suppression_interval_ms: 400,
            min_anchor_dimension: 50.0,
            min_video_width: 200.0,
            min_video_height: 120.0,
        }
    }
}

impl CalqueConfig {
    /// Load the persisted configuration, falling back to defaults.
    pub fn load() -> Self {
        confy::load(APP_NAME, CONFIG_NAME).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not load configuration, using defaults");
            Self::default()
        })
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        confy::store(APP_NAME, CONFIG_NAME, self).map_err(ConfigError::Save)
    }
}
