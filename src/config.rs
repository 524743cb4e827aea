// Configuration management for Streammix

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::pipeline::layout::LayoutKind;

/// Default RTMP ingest prefix, the stream key is appended as a path segment
pub const DEFAULT_STREAM_BASE_URL: &str = "rtmp://live.justin.tv/app";

/// Upper bound for the network queue window
pub const MAX_STREAM_QUEUE_WINDOW_SECS: u64 = 3600;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Output canvas width in pixels
    pub output_width: u32,

    /// Output canvas height in pixels
    pub output_height: u32,

    /// Compositor background fill (enum nick, e.g. "black", "white")
    pub background: String,

    /// Index of the source whose audio track is played and streamed.
    /// Audio from every other source is discarded.
    pub audio_source_index: usize,

    /// How decoded video streams are placed on the canvas
    pub layout: LayoutKind,

    /// RTMP prefix the stream key is appended to
    pub stream_base_url: String,

    /// Maximum amount of data held by each network queue before the
    /// oldest buffers are dropped
    pub stream_queue_window_secs: u64,

    /// Video encoder tuning for the network branch
    pub encoder: EncoderSettings,

    /// Element factory overrides
    pub elements: ElementNames,
}

/// Video encoder tuning, property names follow x264enc
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EncoderSettings {
    /// Target bitrate in kbit/s
    pub bitrate: u32,
    pub speed_preset: String,
    pub qp_min: u32,
    pub tune: String,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            bitrate: 768,
            speed_preset: "faster".to_string(),
            qp_min: 30,
            tune: "zerolatency".to_string(),
        }
    }
}

/// GStreamer factory names for the elements that commonly need swapping
/// (headless machines, other encoders, etc.)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ElementNames {
    pub compositor: String,
    pub audio_device_sink: String,
    pub video_device_sink: String,
    pub audio_encoder: String,
    pub video_encoder: String,
    pub muxer: String,
    pub network_sink: String,
}

impl Default for ElementNames {
    fn default() -> Self {
        Self {
            compositor: "compositor".to_string(),
            audio_device_sink: "autoaudiosink".to_string(),
            video_device_sink: "autovideosink".to_string(),
            audio_encoder: "voaacenc".to_string(),
            video_encoder: "x264enc".to_string(),
            muxer: "flvmux".to_string(),
            network_sink: "rtmpsink".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_width: 1280,
            output_height: 720,
            background: "black".to_string(),
            audio_source_index: 0,
            layout: LayoutKind::Triptych,
            stream_base_url: DEFAULT_STREAM_BASE_URL.to_string(),
            stream_queue_window_secs: 5,
            encoder: EncoderSettings::default(),
            elements: ElementNames::default(),
        }
    }
}

impl Config {
    /// Load config from an explicit path, or from the user config directory,
    /// or fall back to defaults.
    ///
    /// An explicitly requested file must exist and parse. The per-user file
    /// is optional and only logged about when it is broken.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        if let Some(path) = default_config_path() {
            if path.exists() {
                match Self::from_file(&path) {
                    Ok(config) => return Ok(config),
                    Err(e) => log::warn!("Ignoring config {}: {:#}", path.display(), e),
                }
            }
        }

        Ok(Self::default())
    }

    /// Read and validate a TOML config file
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Check the values that would otherwise surface as obscure engine errors
    pub fn validate(&self, source_count: usize) -> anyhow::Result<()> {
        if self.output_width == 0 || self.output_height == 0 {
            bail!(
                "output canvas must be non-empty, got {}x{}",
                self.output_width,
                self.output_height
            );
        }
        if !(1..=MAX_STREAM_QUEUE_WINDOW_SECS).contains(&self.stream_queue_window_secs) {
            bail!(
                "stream_queue_window_secs must be between 1 and {}, got {}",
                MAX_STREAM_QUEUE_WINDOW_SECS,
                self.stream_queue_window_secs
            );
        }
        if self.audio_source_index >= source_count {
            bail!(
                "audio_source_index {} is out of range for {} sources",
                self.audio_source_index,
                source_count
            );
        }
        Ok(())
    }

    /// Full RTMP location for the given stream key
    pub fn stream_location(&self, credential: &str) -> String {
        format!("{}/{}", self.stream_base_url.trim_end_matches('/'), credential)
    }
}

/// Get the per-user config file path
fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("streammix").join("config.toml"))
}
