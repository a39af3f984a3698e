//! Calque Overlay Engine
//!
//! Keeps a playback-widget overlay geometrically synchronized with a host
//! page's player rectangle across scrolling, resizing, fullscreen
//! transitions, and competing modal overlays.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                   controller                        │
//! │              OverlayController                      │
//! │      (open / close / is_open / set_full_page)       │
//! ├──────────────┬──────────────┬───────────────────────┤
//! │   tracking   │   suppress   │        widget         │
//! │ TrackingLoop │ Suppression  │ WidgetLoader + mount  │
//! │ (triggers +  │   Policy     │ (one-shot script load)│
//! │  per-frame   │ (modal yield │                       │
//! │  passes)     │  + resume)   │                       │
//! ├──────────────┴──────┬───────┴───────────────────────┤
//! │       anchor        │          projector            │
//! │    AnchorLocator    │      GeometryProjector        │
//! │ (selector list +    │ (anchored / fill / full-page  │
//! │  video fallback)    │  placement)                   │
//! ├─────────────────────┴───────────────────────────────┤
//! │              calque-core::page::Page                │
//! │     (host-surface seam; SimPage for tests/demo)     │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod anchor;
pub mod controller;
pub mod projector;
pub mod state;
pub mod suppress;
pub mod tracking;
pub mod widget;

// Re-export commonly used types
pub use anchor::AnchorLocator;
pub use controller::{CloseOptions, OverlayController};
pub use projector::{GeometryProjector, Projection};
pub use state::{OverlayNodes, OverlayState};
pub use suppress::SuppressionPolicy;
pub use tracking::TrackingLoop;
pub use widget::{MOUNT_ID, WidgetLoader};

// Re-export the core seam for embedders
pub use calque_core::{CalqueConfig, NodeId, Page, Placement, SimPage};
