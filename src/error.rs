// Error taxonomy for graph construction and playback
//
// Everything in here is fatal: construction errors abort before any media
// flows, engine errors end the run loop. Runtime link failures inside the
// pad resolver are absorbed locally and live in `pipeline::resolver`.

use std::path::PathBuf;

use gstreamer as gst;

/// Error type for pipeline construction and supervision
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("GStreamer initialization failed: {0}")]
    Init(#[from] gst::glib::Error),

    #[error("pipeline element '{role}' was not created: {reason}")]
    ElementCreation { role: String, reason: String },

    #[error("failed to add element '{0}' to pipeline")]
    ElementInsertion(String),

    #[error("input file '{}' does not exist", .0.display())]
    MissingSource(PathBuf),

    #[error("failed to link {from} -> {to}: {reason}")]
    Link {
        from: String,
        to: String,
        reason: String,
    },

    #[error("layout error: {0}")]
    Layout(String),

    #[error("error received from element {element}: {message}")]
    Engine {
        element: String,
        message: String,
        debug: Option<String>,
    },

    #[error("GStreamer state error: {0}")]
    StateChange(#[from] gst::StateChangeError),

    #[error("unexpected {0} message on the filtered bus")]
    UnexpectedMessage(String),

    #[error("pipeline has no bus")]
    NoBus,

    #[error("bus is flushing, the pipeline was stopped before end-of-stream")]
    BusFlushing,
}

impl PipelineError {
    /// Build a link error for the edge `from -> to`
    pub fn link(from: impl Into<String>, to: impl Into<String>, reason: impl ToString) -> Self {
        PipelineError::Link {
            from: from.into(),
            to: to.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
