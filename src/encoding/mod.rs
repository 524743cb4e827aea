// Encoding for the network branch
//
// Only the streaming path encodes. Local preview renders the raw composited
// canvas and mixed-down audio directly.

pub mod presets;

pub use presets::{apply_muxer, apply_video_encoder};
