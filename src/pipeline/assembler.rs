// Graph assembly
//
// Creates every element for the configured sources, the shared audio and
// video chains and, when streaming, the network branch, then inserts them
// all into one pipeline. Any failure aborts the whole assembly; nothing is
// linked here.
//
//   source_i ─┬─ audio (authoritative) → audio_convert → audio_resample → audio_tee
//             ├─ audio (others)        → fake_audio_sink_i
//             └─ video                 → video_scale_i → video_caps_i → video_mixer
//
//   audio_tee ─┬─ device_audio_queue → audio_device_sink
//              └─ stream_audio_queue → aac_encoder ──────────────────┐
//   video_mixer → video_tee ─┬─ device_video_queue → video_device_sink │
//                            └─ stream_video_queue → stream_video_convert → x264_enc → flv_mux → rtmp_sink

use std::path::{Path, PathBuf};

use gstreamer as gst;
use gstreamer::prelude::*;

use crate::config::Config;
use crate::encoding;
use crate::error::{PipelineError, Result};

use super::elements::{ElementMaker, Role};

/// Name of the top-level pipeline
pub const PIPELINE_NAME: &str = "streammix-pipeline";

/// What to build
#[derive(Debug, Clone)]
pub struct GraphSpec {
    /// Absolute input paths, in source index order
    pub sources: Vec<PathBuf>,
    /// Full RTMP location, `None` disables the network branch
    pub stream_location: Option<String>,
    pub config: Config,
}

/// Per-source elements
#[derive(Debug)]
pub struct SourceUnits {
    pub index: usize,
    pub decoder: gst::Element,
    pub scaler: gst::Element,
    pub scale_caps: gst::Element,
    /// Null consumer for the audio of non-authoritative sources
    pub discard: Option<gst::Element>,
}

/// Audio conditioning and preview
#[derive(Debug)]
pub struct AudioChain {
    pub convert: gst::Element,
    pub resample: gst::Element,
    pub tee: gst::Element,
    pub preview_queue: gst::Element,
    pub preview_sink: gst::Element,
}

/// Compositing and preview
#[derive(Debug)]
pub struct VideoChain {
    pub compositor: gst::Element,
    pub tee: gst::Element,
    pub preview_queue: gst::Element,
    pub preview_sink: gst::Element,
}

/// Encode, mux and publish. Only exists in streaming mode.
#[derive(Debug)]
pub struct NetworkBranch {
    pub audio_queue: gst::Element,
    pub audio_encoder: gst::Element,
    pub video_queue: gst::Element,
    pub video_convert: gst::Element,
    pub video_encoder: gst::Element,
    pub muxer: gst::Element,
    pub sink: gst::Element,
}

/// All elements of an assembled, not yet linked graph
#[derive(Debug)]
pub struct Assembly {
    pub pipeline: gst::Pipeline,
    pub sources: Vec<SourceUnits>,
    pub audio: AudioChain,
    pub video: VideoChain,
    pub network: Option<NetworkBranch>,
}

/// Create and insert every element described by `spec`
pub fn assemble(spec: &GraphSpec) -> Result<Assembly> {
    let config = &spec.config;
    let maker = ElementMaker::new(&config.elements);

    let mut sources = Vec::with_capacity(spec.sources.len());
    for (index, path) in spec.sources.iter().enumerate() {
        let decoder = maker.make(Role::Source, Some(index))?;
        decoder.set_property("uri", file_uri(path, &decoder)?);

        let discard = if index == config.audio_source_index {
            None
        } else {
            Some(maker.make(Role::DiscardAudioSink, Some(index))?)
        };

        sources.push(SourceUnits {
            index,
            decoder,
            scaler: maker.make(Role::VideoScale, Some(index))?,
            scale_caps: maker.make(Role::VideoCaps, Some(index))?,
            discard,
        });
    }

    let audio = AudioChain {
        convert: maker.make(Role::AudioConvert, None)?,
        resample: maker.make(Role::AudioResample, None)?,
        tee: maker.make(Role::AudioTee, None)?,
        preview_queue: maker.make(Role::DeviceAudioQueue, None)?,
        preview_sink: maker.make(Role::AudioDeviceSink, None)?,
    };

    let video = VideoChain {
        compositor: maker.make(Role::Compositor, None)?,
        tee: maker.make(Role::VideoTee, None)?,
        preview_queue: maker.make(Role::DeviceVideoQueue, None)?,
        preview_sink: maker.make(Role::VideoDeviceSink, None)?,
    };

    let network = match &spec.stream_location {
        Some(location) => {
            let branch = NetworkBranch {
                audio_queue: maker.make(Role::StreamAudioQueue, None)?,
                audio_encoder: maker.make(Role::AudioEncoder, None)?,
                video_queue: maker.make(Role::StreamVideoQueue, None)?,
                video_convert: maker.make(Role::StreamVideoConvert, None)?,
                video_encoder: maker.make(Role::VideoEncoder, None)?,
                muxer: maker.make(Role::Muxer, None)?,
                sink: maker.make(Role::NetworkSink, None)?,
            };
            configure_network_branch(&branch, config, location)?;
            Some(branch)
        }
        None => None,
    };

    let pipeline = gst::Pipeline::with_name(PIPELINE_NAME);
    let assembly = Assembly {
        pipeline,
        sources,
        audio,
        video,
        network,
    };

    for element in assembly.elements() {
        assembly
            .pipeline
            .add(element)
            .map_err(|_| PipelineError::ElementInsertion(element.name().to_string()))?;
    }

    log::info!(
        "Assembled {} elements for {} sources (streaming {})",
        assembly.elements().len(),
        assembly.sources.len(),
        if assembly.network.is_some() { "enabled" } else { "disabled" }
    );

    Ok(assembly)
}

impl Assembly {
    /// Every element owned by the graph, sources first
    pub fn elements(&self) -> Vec<&gst::Element> {
        let mut elements = Vec::new();
        for source in &self.sources {
            elements.push(&source.decoder);
            if let Some(discard) = &source.discard {
                elements.push(discard);
            }
            elements.push(&source.scaler);
            elements.push(&source.scale_caps);
        }

        elements.extend([
            &self.audio.convert,
            &self.audio.resample,
            &self.audio.tee,
            &self.audio.preview_queue,
            &self.audio.preview_sink,
            &self.video.compositor,
            &self.video.tee,
            &self.video.preview_queue,
            &self.video.preview_sink,
        ]);

        if let Some(network) = &self.network {
            elements.extend([
                &network.audio_queue,
                &network.audio_encoder,
                &network.video_queue,
                &network.video_convert,
                &network.video_encoder,
                &network.muxer,
                &network.sink,
            ]);
        }

        elements
    }
}

/// Leaky queues, encoder tuning and the publish location
fn configure_network_branch(branch: &NetworkBranch, config: &Config, location: &str) -> Result<()> {
    let window = queue_window(config.stream_queue_window_secs).ok_or_else(|| {
        PipelineError::ElementCreation {
            role: branch.audio_queue.name().to_string(),
            reason: format!(
                "queue window of {}s is out of range",
                config.stream_queue_window_secs
            ),
        }
    })?;
    configure_leaky_queue(&branch.audio_queue, window);
    configure_leaky_queue(&branch.video_queue, window);

    encoding::apply_video_encoder(&branch.video_encoder, &config.encoder);
    encoding::apply_muxer(&branch.muxer);

    let accepts_location = branch
        .sink
        .find_property("location")
        .is_some_and(|pspec| pspec.value_type() == String::static_type());
    if !accepts_location {
        return Err(PipelineError::ElementCreation {
            role: branch.sink.name().to_string(),
            reason: "network sink has no string 'location' property".to_string(),
        });
    }
    branch.sink.set_property("location", location);
    log::info!("Streaming to {}", redact_location(location));
    Ok(())
}

fn queue_window(secs: u64) -> Option<gst::ClockTime> {
    secs.checked_mul(gst::ClockTime::SECOND.nseconds())
        .filter(|ns| *ns < u64::MAX)
        .map(gst::ClockTime::from_nseconds)
}

/// Drop the oldest data once `window` worth of buffers is queued, so a
/// stalled consumer never blocks the fan-out upstream
pub fn configure_leaky_queue(queue: &gst::Element, window: gst::ClockTime) {
    queue.set_property_from_str("leaky", "downstream");
    queue.set_property("max-size-time", window.nseconds());
}

/// The stream key is a credential, keep it out of the logs
fn redact_location(location: &str) -> String {
    match location.rsplit_once('/') {
        Some((base, key)) if !key.is_empty() => format!("{}/<{} chars>", base, key.len()),
        _ => location.to_string(),
    }
}

fn file_uri(path: &Path, decoder: &gst::Element) -> Result<String> {
    gst::glib::filename_to_uri(path, None)
        .map(|uri| uri.to_string())
        .map_err(|e| PipelineError::ElementCreation {
            role: decoder.name().to_string(),
            reason: format!("cannot build URI for '{}': {}", path.display(), e),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_window_rejects_overflow() {
        assert_eq!(queue_window(5), Some(gst::ClockTime::from_seconds(5)));
        assert_eq!(queue_window(u64::MAX / 2), None);
    }

    #[test]
    fn location_is_redacted() {
        assert_eq!(
            redact_location("rtmp://live.justin.tv/app/live_123"),
            "rtmp://live.justin.tv/app/<8 chars>"
        );
        assert_eq!(redact_location("rtmp://host/app/"), "rtmp://host/app/");
    }
}
