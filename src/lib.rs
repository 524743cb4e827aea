// Streammix - composite several media files into one live preview and,
// optionally, an RTMP stream
// Main library entry point

pub mod cli;
pub mod config;
pub mod encoding;
pub mod error;
pub mod gstreamer_init;
pub mod pipeline;

use std::process::ExitCode;

use anyhow::Context;

use crate::cli::{ArgumentError, Invocation};
use crate::config::Config;
use crate::pipeline::{GraphSpec, MixGraph, RunOutcome};

/// Initialize logging, parse the command line and run one session
pub fn run() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let invocation = match cli::parse_from(std::env::args_os()) {
        Ok(invocation) => invocation,
        Err(e) if e.is_informational() => {
            if let ArgumentError::Clap(e) = e {
                let _ = e.print();
            }
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("{}", cli::usage());
            return ExitCode::FAILURE;
        }
    };

    match session(&invocation) {
        Ok(RunOutcome::EndOfStream) => {
            log::info!("Done");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{:#}", e);
            eprintln!("streammix: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Everything after argument parsing. The graph is dropped, and the
/// pipeline forced to NULL, on every return path.
pub fn session(invocation: &Invocation) -> anyhow::Result<RunOutcome> {
    let config = Config::load(invocation.config.as_deref())?;
    config
        .validate(invocation.sources.len())
        .context("invalid configuration")?;

    let cwd = std::env::current_dir().context("cannot determine working directory")?;
    log::debug!("Current working dir: {}", cwd.display());
    let sources = invocation.resolve_sources(&cwd)?;

    match &invocation.credential {
        Some(_) => log::info!("Streaming is enabled"),
        None => log::info!("Streaming is NOT enabled, because no stream key was given"),
    }

    gstreamer_init::init_gstreamer().context("unable to initialize GStreamer")?;

    let spec = GraphSpec {
        sources,
        stream_location: invocation
            .credential
            .as_deref()
            .map(|key| config.stream_location(key)),
        config,
    };

    log::info!("Creating pipeline...");
    let graph = MixGraph::build(&spec).context("unable to setup pipeline")?;

    log::info!("Running pipeline...");
    let outcome = graph.run().context("unable to run pipeline")?;
    Ok(outcome)
}
