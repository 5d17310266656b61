//! CLI argument parsing for bridges.

use std::path::PathBuf;

use clap::Parser;

/// Common CLI arguments for all bridges.
#[derive(Parser, Debug, Clone)]
#[command(about = "SensorGate device bridge")]
pub struct BridgeArgs {
    /// Path to configuration file (JSON5 format).
    #[arg(short, long)]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,
}

impl BridgeArgs {
    /// Parse CLI arguments with a default config path.
    ///
    /// If no `--config` argument is provided, uses the default. Exits the
    /// process with a usage message on invalid arguments.
    pub fn parse_with_default(default_config: &'static str) -> Self {
        Self::try_parse_from_with_default(std::env::args_os(), default_config)
            .unwrap_or_else(|e| e.exit())
    }

    /// Parse the given arguments with a default config path.
    pub fn try_parse_from_with_default<I, T>(
        args: I,
        default_config: &'static str,
    ) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let matches = <Self as clap::CommandFactory>::command()
            .mut_arg("config", |arg| arg.default_value(default_config))
            .try_get_matches_from(args)?;

        <Self as clap::FromArgMatches>::from_arg_matches(&matches)
    }
}
