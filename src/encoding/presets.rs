//! Live-streaming encoder tuning
//!
//! The network branch encodes the composited canvas for RTMP ingest. The
//! defaults favour latency over quality.
//!
//! Values are applied through [`set_if_present`], so a config that swaps
//! `x264enc` for another encoder only loses the properties that encoder
//! does not have.

use gstreamer as gst;

use crate::config::EncoderSettings;
use crate::pipeline::elements::set_if_present;

/// H.264 via x264 (x264enc)
///
/// Properties used:
/// - `bitrate`: target bitrate in kbit/s
/// - `speed-preset`: encoder speed/quality trade-off
/// - `qp-min`: lowest quantizer allowed, caps peak bitrate on easy scenes
/// - `tune`: `zerolatency` disables lookahead and B-frame reordering
pub fn apply_video_encoder(encoder: &gst::Element, settings: &EncoderSettings) {
    set_if_present(encoder, "bitrate", &settings.bitrate.to_string());
    set_if_present(encoder, "speed-preset", &settings.speed_preset);
    set_if_present(encoder, "qp-min", &settings.qp_min.to_string());
    set_if_present(encoder, "tune", &settings.tune);
}

/// FLV muxer (flvmux)
///
/// Properties used:
/// - `streamable`: no seekable index, headers written up front
pub fn apply_muxer(muxer: &gst::Element) {
    set_if_present(muxer, "streamable", "true");
}
