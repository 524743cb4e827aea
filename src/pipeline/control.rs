// Control loop
//
// Requests PLAYING, then blocks on the bus for state changes, errors and
// end-of-stream. Only the pipeline's own state changes are reported. An
// error from any element ends the run as a failure, EOS ends it normally.

use std::ops::ControlFlow;

use gstreamer as gst;
use gstreamer::prelude::*;

use crate::error::{PipelineError, Result};

/// Message classes the loop consumes, everything else stays on the bus
pub const WATCHED: [gst::MessageType; 3] = [
    gst::MessageType::StateChanged,
    gst::MessageType::Error,
    gst::MessageType::Eos,
];

/// How a run ended without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    EndOfStream,
}

/// Bus message reduced to what the loop acts on
#[derive(Debug, Clone, PartialEq)]
pub enum BusEvent {
    PipelineStateChanged {
        old: gst::State,
        current: gst::State,
        pending: gst::State,
    },
    ChildStateChanged,
    Error {
        element: String,
        message: String,
        debug: Option<String>,
    },
    EndOfStream,
    Other(gst::MessageType),
}

impl BusEvent {
    pub fn from_message(msg: &gst::Message, pipeline: &gst::Pipeline) -> Self {
        match msg.view() {
            gst::MessageView::StateChanged(sc) => {
                if msg.src() == Some(pipeline.upcast_ref::<gst::Object>()) {
                    BusEvent::PipelineStateChanged {
                        old: sc.old(),
                        current: sc.current(),
                        pending: sc.pending(),
                    }
                } else {
                    BusEvent::ChildStateChanged
                }
            }
            gst::MessageView::Error(err) => BusEvent::Error {
                element: msg
                    .src()
                    .map(|s| s.name().to_string())
                    .unwrap_or_else(|| "<unknown>".to_string()),
                message: err.error().to_string(),
                debug: err.debug().map(|d| d.to_string()),
            },
            gst::MessageView::Eos(..) => BusEvent::EndOfStream,
            _ => BusEvent::Other(msg.type_()),
        }
    }
}

/// Advance the loop by one event
pub fn step(event: BusEvent) -> Result<ControlFlow<RunOutcome>> {
    match event {
        BusEvent::PipelineStateChanged { old, current, .. } => {
            log::info!("Pipeline state changed from {:?} to {:?}", old, current);
            Ok(ControlFlow::Continue(()))
        }
        BusEvent::ChildStateChanged => Ok(ControlFlow::Continue(())),
        BusEvent::Error {
            element,
            message,
            debug,
        } => {
            log::error!("Error received from element {}: {}", element, message);
            log::error!("Debugging information: {}", debug.as_deref().unwrap_or("none"));
            Err(PipelineError::Engine {
                element,
                message,
                debug,
            })
        }
        BusEvent::EndOfStream => {
            log::info!("End-Of-Stream reached");
            Ok(ControlFlow::Break(RunOutcome::EndOfStream))
        }
        BusEvent::Other(kind) => Err(PipelineError::UnexpectedMessage(format!("{:?}", kind))),
    }
}

/// Request PLAYING. If the engine refuses, surface the element error that
/// explains why when there is one.
pub fn start(pipeline: &gst::Pipeline) -> Result<()> {
    if let Err(e) = pipeline.set_state(gst::State::Playing) {
        log::error!("Unable to set the pipeline to the playing state");
        let pending = pipeline
            .bus()
            .and_then(|bus| bus.pop_filtered(&[gst::MessageType::Error]));
        if let Some(msg) = pending {
            if let Err(engine) = step(BusEvent::from_message(&msg, pipeline)) {
                return Err(engine);
            }
        }
        return Err(e.into());
    }
    Ok(())
}

/// Block on the bus until EOS or an error.
///
/// An unbounded pop only comes back empty once the bus is flushing, which
/// means the pipeline was shut down underneath the loop.
pub fn watch(pipeline: &gst::Pipeline) -> Result<RunOutcome> {
    let bus = pipeline.bus().ok_or(PipelineError::NoBus)?;

    loop {
        let Some(msg) = bus.timed_pop_filtered(gst::ClockTime::NONE, &WATCHED) else {
            log::error!("Bus is flushing, pipeline was stopped externally");
            return Err(PipelineError::BusFlushing);
        };
        if let ControlFlow::Break(outcome) = step(BusEvent::from_message(&msg, pipeline))? {
            return Ok(outcome);
        }
    }
}

/// Start the pipeline and supervise it until a terminal condition
pub fn run(pipeline: &gst::Pipeline) -> Result<RunOutcome> {
    start(pipeline)?;
    watch(pipeline)
}
