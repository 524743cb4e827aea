//! GStreamer initialization and diagnostics
//!
//! The engine has to be initialized once before any element is created.
//! Initialization is only attempted after the command line and the input
//! files have been validated.

use std::sync::Once;

use gstreamer as gst;

use crate::error::Result;

static VERSION_LOGGED: Once = Once::new();

/// Initialize GStreamer, logging its version on first success
pub fn init_gstreamer() -> Result<()> {
    gst::init()?;
    VERSION_LOGGED.call_once(log_gstreamer_version);
    Ok(())
}

fn log_gstreamer_version() {
    let (major, minor, micro, nano) = gst::version();
    let nano_str = match nano {
        0 => String::new(),
        1 => " (git)".to_string(),
        2 => " (prerelease)".to_string(),
        _ => format!(" (nano: {})", nano),
    };
    log::info!("GStreamer version: {}.{}.{}{}", major, minor, micro, nano_str);
}

/// Factories from `names` that are not installed
pub fn missing_factories<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    names
        .into_iter()
        .filter(|name| gst::ElementFactory::find(name).is_none())
        .map(str::to_string)
        .collect()
}
