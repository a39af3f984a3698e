//! Calque core
//!
//! Shared foundation for the overlay engine: the host-page abstraction,
//! geometry primitives, source-locator classification, configuration, and
//! playlist persistence.

pub mod config;
pub mod error;
pub mod geometry;
pub mod locator;
pub mod page;
pub mod playlist;

// Re-exports for convenience
pub use config::CalqueConfig;
pub use error::{ConfigError, PageError, WidgetError};
pub use geometry::{PixelRect, Rect};
pub use locator::{MountRequest, SourceLocator};
pub use page::{
    CssPosition, EventInterest, NodeId, Page, PageEvent, Placement, ScriptLoad, SimPage,
};
pub use playlist::{Playlist, PlaylistEntry};
