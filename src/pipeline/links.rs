// Static links
//
// Everything that can be linked before any source has parsed its container.
// The decoder outputs are linked later by the pad resolver. Each failure is
// reported with the edge that failed and aborts construction.

use gstreamer as gst;
use gstreamer::prelude::*;
use gstreamer_video as gst_video;

use crate::error::{PipelineError, Result};

use super::assembler::{Assembly, NetworkBranch};
use super::layout::Placement;

/// `element:pad` label for diagnostics
fn pad_label(pad: &gst::Pad) -> String {
    let parent = pad
        .parent_element()
        .map(|e| e.name().to_string())
        .unwrap_or_else(|| "?".to_string());
    format!("{}:{}", parent, pad.name())
}

fn static_pad(element: &gst::Element, name: &str) -> Result<gst::Pad> {
    element.static_pad(name).ok_or_else(|| {
        PipelineError::link(
            element.name().to_string(),
            element.name().to_string(),
            format!("element has no '{}' pad", name),
        )
    })
}

fn request_pad(element: &gst::Element, template: &str) -> Result<gst::Pad> {
    let pad = element.request_pad_simple(template).ok_or_else(|| {
        PipelineError::link(
            element.name().to_string(),
            element.name().to_string(),
            format!("could not request a '{}' pad", template),
        )
    })?;
    log::debug!("Requested pad {}", pad_label(&pad));
    Ok(pad)
}

/// Link two pads, refusing sink pads that are already in use
pub fn link_pads(src: &gst::Pad, sink: &gst::Pad) -> Result<()> {
    if sink.is_linked() {
        return Err(PipelineError::link(
            pad_label(src),
            pad_label(sink),
            "sink pad is already linked",
        ));
    }
    src.link(sink)
        .map(|_| ())
        .map_err(|e| PipelineError::link(pad_label(src), pad_label(sink), format!("{:?}", e)))
}

/// Link a linear chain of elements, naming the first failing edge
pub fn link_chain(chain: &[&gst::Element]) -> Result<()> {
    for pair in chain.windows(2) {
        pair[0].link(pair[1]).map_err(|e| {
            PipelineError::link(pair[0].name().to_string(), pair[1].name().to_string(), e)
        })?;
    }
    Ok(())
}

/// One fan-out output into a consumer queue
fn link_fan_out(tee: &gst::Element, queue: &gst::Element) -> Result<()> {
    let src = request_pad(tee, "src_%u")?;
    let sink = static_pad(queue, "sink")?;
    link_pads(&src, &sink)
}

/// Encoder output into the muxer's input for `template` ("audio"/"video").
/// Muxers without such a template fall back to automatic pad selection.
fn link_into_muxer(encoder: &gst::Element, muxer: &gst::Element, template: &str) -> Result<()> {
    match muxer.request_pad_simple(template) {
        Some(sink) => link_pads(&static_pad(encoder, "src")?, &sink),
        None => link_chain(&[encoder, muxer]),
    }
}

/// Fixed raw video caps used between a scaler and its compositor input
pub fn scale_caps(placement: &Placement) -> gst::Caps {
    gst_video::VideoCapsBuilder::new()
        .width(placement.width as i32)
        .height(placement.height as i32)
        .build()
}

/// Establish every link that does not depend on negotiated stream types.
///
/// `compositor_pads[i]` and `placements[i]` belong to source `i`.
pub fn link_static(
    assembly: &Assembly,
    compositor_pads: &[gst::Pad],
    placements: &[Placement],
) -> Result<()> {
    let audio = &assembly.audio;
    let video = &assembly.video;

    link_chain(&[&audio.convert, &audio.resample, &audio.tee])?;

    for source in &assembly.sources {
        let (Some(pad), Some(placement)) = (
            compositor_pads.get(source.index),
            placements.get(source.index),
        ) else {
            return Err(PipelineError::Layout(format!(
                "no compositor input reserved for source {}",
                source.index
            )));
        };

        source.scale_caps.set_property("caps", scale_caps(placement));
        link_chain(&[&source.scaler, &source.scale_caps])?;
        link_pads(&static_pad(&source.scale_caps, "src")?, pad)?;
    }

    link_chain(&[&video.compositor, &video.tee])?;

    link_fan_out(&audio.tee, &audio.preview_queue)?;
    link_fan_out(&video.tee, &video.preview_queue)?;
    link_chain(&[&audio.preview_queue, &audio.preview_sink])?;
    link_chain(&[&video.preview_queue, &video.preview_sink])?;

    if let Some(network) = &assembly.network {
        link_network(assembly, network)?;
    }

    log::info!("Static links established");
    Ok(())
}

fn link_network(assembly: &Assembly, network: &NetworkBranch) -> Result<()> {
    link_fan_out(&assembly.audio.tee, &network.audio_queue)?;
    link_fan_out(&assembly.video.tee, &network.video_queue)?;

    link_chain(&[&network.audio_queue, &network.audio_encoder])?;
    link_into_muxer(&network.audio_encoder, &network.muxer, "audio")?;

    link_chain(&[
        &network.video_queue,
        &network.video_convert,
        &network.video_encoder,
    ])?;
    link_into_muxer(&network.video_encoder, &network.muxer, "video")?;

    link_chain(&[&network.muxer, &network.sink])
}
