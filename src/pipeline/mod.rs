// Mixing pipeline
//
// Build order: plan the layout, assemble elements, reserve compositor
// inputs, link everything static, then hand the decoders to the pad
// resolver. After `build` returns the topology only changes through the
// resolver linking pre-built consumers.

pub mod assembler;
pub mod control;
pub mod elements;
pub mod layout;
pub mod links;
pub mod resolver;

pub use assembler::{Assembly, GraphSpec, PIPELINE_NAME};
pub use control::RunOutcome;
pub use layout::{Canvas, LayoutKind, LayoutPlanner, Placement};
pub use resolver::{PadResolver, ResolveError, Route};

use std::sync::Arc;

use gstreamer as gst;
use gstreamer::prelude::*;

use crate::error::Result;

/// A fully linked graph. Dropping it forces the pipeline to NULL.
pub struct MixGraph {
    assembly: Assembly,
    resolver: Arc<PadResolver>,
    placements: Vec<Placement>,
}

impl MixGraph {
    pub fn build(spec: &GraphSpec) -> Result<Self> {
        let config = &spec.config;
        let canvas = Canvas {
            width: config.output_width,
            height: config.output_height,
        };
        let placements = config.layout.planner().plan(spec.sources.len(), canvas)?;

        let assembly = assembler::assemble(spec)?;
        let compositor_pads =
            layout::apply_layout(&assembly.video.compositor, &placements, &config.background)?;
        links::link_static(&assembly, &compositor_pads, &placements)?;

        let resolver = Arc::new(PadResolver::from_assembly(
            &assembly,
            config.audio_source_index,
        ));
        resolver.attach(&assembly);

        Ok(Self {
            assembly,
            resolver,
            placements,
        })
    }

    pub fn pipeline(&self) -> &gst::Pipeline {
        &self.assembly.pipeline
    }

    pub fn assembly(&self) -> &Assembly {
        &self.assembly
    }

    pub fn resolver(&self) -> &PadResolver {
        &self.resolver
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    /// Play until end-of-stream or the first element error
    pub fn run(&self) -> Result<RunOutcome> {
        let result = control::run(self.pipeline());
        log::info!("Stream summary:");
        self.resolver.log_summary();
        result
    }
}

impl Drop for MixGraph {
    fn drop(&mut self) {
        let _ = self.assembly.pipeline.set_state(gst::State::Null);
    }
}
