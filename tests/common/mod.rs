// Shared helpers for the GStreamer-backed tests.
//
// These tests need a GStreamer installation with the relevant plugins. When
// something is missing they print why and return early instead of failing.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use gstreamer as gst;
use gstreamer::prelude::*;

use streammix_lib::config::{Config, ElementNames};
use streammix_lib::gstreamer_init;
use streammix_lib::pipeline::GraphSpec;

/// Factories every graph needs, whatever the mode
pub const BASE_FACTORIES: &[&str] = &[
    "uridecodebin",
    "audioconvert",
    "audioresample",
    "tee",
    "queue",
    "fakesink",
    "videoscale",
    "capsfilter",
    "compositor",
];

/// Extra factories for the network branch
pub const NETWORK_FACTORIES: &[&str] = &["voaacenc", "videoconvert", "x264enc", "flvmux", "rtmpsink"];

/// True when GStreamer and every factory in each list is available
pub fn engine_ready(lists: &[&[&str]]) -> bool {
    if gstreamer_init::init_gstreamer().is_err() {
        eprintln!("GStreamer not available, skipping");
        return false;
    }
    let missing = gstreamer_init::missing_factories(lists.iter().flat_map(|l| l.iter().copied()));
    if !missing.is_empty() {
        eprintln!("Missing GStreamer elements {:?}, skipping", missing);
        return false;
    }
    true
}

/// Config that renders into fakesinks instead of real devices
pub fn headless_config() -> Config {
    Config {
        elements: ElementNames {
            audio_device_sink: "fakesink".to_string(),
            video_device_sink: "fakesink".to_string(),
            ..ElementNames::default()
        },
        ..Config::default()
    }
}

/// Three empty files; enough for building a graph, never played
pub fn placeholder_sources(dir: &Path) -> Vec<PathBuf> {
    (0..3)
        .map(|i| {
            let path = dir.join(format!("input_{}.mp4", i));
            std::fs::write(&path, b"").unwrap();
            path
        })
        .collect()
}

pub fn spec(sources: Vec<PathBuf>, credential: Option<&str>, config: Config) -> GraphSpec {
    GraphSpec {
        sources,
        stream_location: credential.map(|key| config.stream_location(key)),
        config,
    }
}

/// Name of the element on the other side of `pad`
pub fn peer_element_name(pad: &gst::Pad) -> Option<String> {
    pad.peer()
        .and_then(|peer| peer.parent_element())
        .map(|e| e.name().to_string())
}

/// Numeric value of an enum property such as a queue's `leaky`
pub fn enum_property(element: &gst::Element, name: &str) -> i32 {
    element
        .property_value(name)
        .transform::<i32>()
        .unwrap()
        .get::<i32>()
        .unwrap()
}

/// Encode a short Ogg file with one audio and one video stream.
/// Returns `None` when the encoders are not installed.
pub fn encode_test_clip(path: &Path) -> Option<()> {
    let needed = [
        "videotestsrc",
        "audiotestsrc",
        "theoraenc",
        "vorbisenc",
        "oggmux",
        "filesink",
        "oggdemux",
        "theoradec",
        "vorbisdec",
    ];
    if !engine_ready(&[&needed]) {
        return None;
    }

    let description = format!(
        "videotestsrc num-buffers=15 ! video/x-raw,width=320,height=240,framerate=15/1 \
         ! theoraenc ! oggmux name=mux ! filesink location=\"{}\" \
         audiotestsrc num-buffers=10 ! audioconvert ! vorbisenc ! mux.",
        path.display()
    );
    let pipeline = gst::parse::launch(&description).ok()?;
    pipeline.set_state(gst::State::Playing).ok()?;

    let bus = pipeline.bus()?;
    let msg = bus.timed_pop_filtered(
        gst::ClockTime::from_seconds(30),
        &[gst::MessageType::Eos, gst::MessageType::Error],
    );
    pipeline.set_state(gst::State::Null).ok()?;

    match msg.map(|m| m.type_()) {
        Some(gst::MessageType::Eos) => Some(()),
        other => {
            eprintln!("Could not encode test clip ({:?}), skipping", other);
            None
        }
    }
}
