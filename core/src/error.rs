//! Error types for page and collaborator operations

use thiserror::Error;

/// Errors reported by a host-page backend.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("node is no longer attached to the document")]
    NodeGone,

    #[error("the host refused to move the node")]
    MoveRejected,

    #[error("script failed to load: {src}")]
    ScriptLoad { src: String },

    #[error("the host refused to reload the page")]
    ReloadRejected,
}

/// Errors during configuration and playlist persistence.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration")]
    Load(#[from] confy::ConfyError),

    #[error("failed to save configuration")]
    Save(#[source] confy::ConfyError),
}

/// Errors surfaced by the playback-widget collaborator.
#[derive(Debug, Error)]
pub enum WidgetError {
    #[error("widget script failed to load")]
    ScriptLoad(#[source] PageError),

    #[error("script loader dropped before completing")]
    LoaderGone,
}
