// Element creation
//
// Every processing unit in the graph has a logical role. A role maps to a
// GStreamer factory (some overridable from config) and to a stable instance
// name, so diagnostics and tests can find elements with `by_name`.

use gstreamer as gst;
use gstreamer::prelude::*;

use crate::config::ElementNames;
use crate::error::{PipelineError, Result};

/// Logical role of a processing unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Source,
    AudioConvert,
    AudioResample,
    AudioTee,
    DiscardAudioSink,
    DeviceAudioQueue,
    AudioDeviceSink,
    VideoScale,
    VideoCaps,
    Compositor,
    VideoTee,
    DeviceVideoQueue,
    VideoDeviceSink,
    StreamAudioQueue,
    AudioEncoder,
    StreamVideoQueue,
    StreamVideoConvert,
    VideoEncoder,
    Muxer,
    NetworkSink,
}

impl Role {
    /// Instance name, `index` is only used by per-source roles
    pub fn instance_name(&self, index: Option<usize>) -> String {
        let base = match self {
            Role::Source => "source",
            Role::AudioConvert => "audio_convert",
            Role::AudioResample => "audio_resample",
            Role::AudioTee => "audio_tee",
            Role::DiscardAudioSink => "fake_audio_sink",
            Role::DeviceAudioQueue => "device_audio_queue",
            Role::AudioDeviceSink => "audio_device_sink",
            Role::VideoScale => "video_scale",
            Role::VideoCaps => "video_caps",
            Role::Compositor => "video_mixer",
            Role::VideoTee => "video_tee",
            Role::DeviceVideoQueue => "device_video_queue",
            Role::VideoDeviceSink => "video_device_sink",
            Role::StreamAudioQueue => "stream_audio_queue",
            Role::AudioEncoder => "aac_encoder",
            Role::StreamVideoQueue => "stream_video_queue",
            Role::StreamVideoConvert => "stream_video_convert",
            Role::VideoEncoder => "x264_enc",
            Role::Muxer => "flv_mux",
            Role::NetworkSink => "rtmp_sink",
        };
        match index {
            Some(i) => format!("{}_{}", base, i),
            None => base.to_string(),
        }
    }

    /// GStreamer factory to instantiate for this role
    pub fn factory<'a>(&self, names: &'a ElementNames) -> &'a str {
        match self {
            Role::Source => "uridecodebin",
            Role::AudioConvert => "audioconvert",
            Role::AudioResample => "audioresample",
            Role::AudioTee | Role::VideoTee => "tee",
            Role::DiscardAudioSink => "fakesink",
            Role::DeviceAudioQueue
            | Role::DeviceVideoQueue
            | Role::StreamAudioQueue
            | Role::StreamVideoQueue => "queue",
            Role::AudioDeviceSink => &names.audio_device_sink,
            Role::VideoScale => "videoscale",
            Role::VideoCaps => "capsfilter",
            Role::Compositor => &names.compositor,
            Role::VideoDeviceSink => &names.video_device_sink,
            Role::AudioEncoder => &names.audio_encoder,
            Role::StreamVideoConvert => "videoconvert",
            Role::VideoEncoder => &names.video_encoder,
            Role::Muxer => &names.muxer,
            Role::NetworkSink => &names.network_sink,
        }
    }
}

/// Creates elements for roles, failing fast with the role's instance name
pub struct ElementMaker<'a> {
    names: &'a ElementNames,
}

impl<'a> ElementMaker<'a> {
    pub fn new(names: &'a ElementNames) -> Self {
        Self { names }
    }

    pub fn make(&self, role: Role, index: Option<usize>) -> Result<gst::Element> {
        let name = role.instance_name(index);
        let factory = role.factory(self.names);

        gst::ElementFactory::make(factory)
            .name(name.as_str())
            .build()
            .map_err(|e| PipelineError::ElementCreation {
                role: name.clone(),
                reason: format!("factory '{}': {}", factory, e),
            })
    }
}

/// Set a property from its string form if the element has it.
///
/// The string is deserialized to the property's own type, so the same call
/// works for integers, booleans, enums and flags. Returns whether the
/// property was applied.
pub fn set_if_present(element: &gst::Element, property: &str, value: &str) -> bool {
    if element.find_property(property).is_none() {
        log::warn!(
            "{} has no '{}' property, skipping value '{}'",
            element.name(),
            property,
            value
        );
        return false;
    }

    match property_value(element, property, value) {
        Ok(parsed) => {
            element.set_property_from_value(property, &parsed);
            true
        }
        Err(reason) => {
            log::warn!("{}", reason);
            false
        }
    }
}

/// Deserialize `value` into the type of `property` without touching the
/// element. Unknown properties and unparsable values are errors.
pub fn property_value(
    element: &gst::Element,
    property: &str,
    value: &str,
) -> std::result::Result<gst::glib::Value, String> {
    let pspec = element
        .find_property(property)
        .ok_or_else(|| format!("{} has no '{}' property", element.name(), property))?;

    gst::glib::Value::deserialize(value, pspec.value_type()).map_err(|e| {
        format!(
            "{}: cannot use '{}' for '{}': {}",
            element.name(),
            value,
            property,
            e
        )
    })
}
