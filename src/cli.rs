// Command line surface
//
//   streammix [--config FILE] [api_key] path_1 path_2 path_3
//
// Streaming is enabled if and only if the stream key is given.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser};

use crate::error::PipelineError;

/// Number of input files the command line accepts
pub const SOURCE_COUNT: usize = 3;

const EXAMPLES: &str = "\
Examples:
  streammix live_111111111_aaaabbbcccddddeeeeffffggghhhhh ../data/sintel_trailer-480p.webm \
../data/big_buck_bunny_trailer-360p.mp4 ../data/the_daily_dweebs-720p.mp4
  streammix ../data/sintel_trailer-480p.webm ../data/big_buck_bunny_trailer-360p.mp4 \
../data/the_daily_dweebs-720p.mp4";

#[derive(Debug, Parser)]
#[command(
    name = "streammix",
    version,
    about = "Mix three video files into one live preview and optionally stream it over RTMP",
    override_usage = "streammix [--config FILE] [api_key] path_1 path_2 path_3",
    after_help = EXAMPLES
)]
struct Cli {
    /// TOML configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Optional stream key followed by the input files
    #[arg(value_name = "ARGS", required = true, value_parser = clap::value_parser!(OsString))]
    args: Vec<OsString>,
}

/// Error type for malformed invocations
#[derive(Debug, thiserror::Error)]
pub enum ArgumentError {
    #[error(transparent)]
    Clap(#[from] clap::Error),

    #[error("expected {SOURCE_COUNT} input files with an optional stream key first, got {0} arguments")]
    Arity(usize),

    #[error("stream key must not be empty")]
    EmptyCredential,

    #[error("stream key must be valid UTF-8")]
    CredentialEncoding,
}

impl ArgumentError {
    /// `--help` and `--version` travel through the error path but are not failures
    pub fn is_informational(&self) -> bool {
        matches!(
            self,
            ArgumentError::Clap(e) if matches!(
                e.kind(),
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion
            )
        )
    }
}

/// A validated command line
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    /// Stream key, present only when streaming is enabled
    pub credential: Option<String>,
    /// Input files in source index order, as typed
    pub sources: Vec<PathBuf>,
    pub config: Option<PathBuf>,
}

impl Invocation {
    pub fn streaming_enabled(&self) -> bool {
        self.credential.is_some()
    }

    /// Interpret the positional arguments
    ///
    /// Paths are taken as raw OS strings, only the stream key must be UTF-8.
    pub fn from_positionals(args: Vec<OsString>, config: Option<PathBuf>) -> Result<Self, ArgumentError> {
        let (credential, paths) = match args.len() {
            n if n == SOURCE_COUNT => (None, args),
            n if n == SOURCE_COUNT + 1 => {
                let mut args = args;
                let key = args
                    .remove(0)
                    .into_string()
                    .map_err(|_| ArgumentError::CredentialEncoding)?;
                if key.is_empty() {
                    return Err(ArgumentError::EmptyCredential);
                }
                (Some(key), args)
            }
            n => return Err(ArgumentError::Arity(n)),
        };

        Ok(Self {
            credential,
            sources: paths.into_iter().map(PathBuf::from).collect(),
            config,
        })
    }

    /// Make every input path absolute against `cwd` and check that it exists
    pub fn resolve_sources(&self, cwd: &Path) -> Result<Vec<PathBuf>, PipelineError> {
        self.sources
            .iter()
            .map(|path| {
                let absolute = if path.is_absolute() {
                    path.clone()
                } else {
                    cwd.join(path)
                };
                if absolute.exists() {
                    log::info!("Loading file: '{}'", absolute.display());
                    Ok(absolute)
                } else {
                    Err(PipelineError::MissingSource(absolute))
                }
            })
            .collect()
    }
}

/// Parse an argument list (including the program name)
pub fn parse_from<I, T>(args: I) -> Result<Invocation, ArgumentError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::try_parse_from(args)?;
    Invocation::from_positionals(cli.args, cli.config)
}

/// Full help text, printed alongside argument errors
pub fn usage() -> String {
    Cli::command().render_help().to_string()
}
