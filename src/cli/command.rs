use std::path::PathBuf;

use clap::{Args, Parser as ClapParser, Subcommand, ValueEnum};

#[derive(Debug, ClapParser)]
#[command(
    name         = env!("CARGO_PKG_NAME"),
    version      = env!("CARGO_PKG_VERSION"),
    long_version = concat!(
        env!("CARGO_PKG_VERSION"),
        " (mpa ", env!("MPA_VERSION"),
        ", built ", env!("BUILD_TIMESTAMP"), ")"
    ),
    about        = "Tools for inspecting and editing MPEG audio streams",
    long_about   = None,
)]
pub struct Cli {
    /// Set the log level
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    pub loglevel: LogLevel,

    /// Fail when frames had to be resynchronized inside the stream.
    #[arg(long, global = true)]
    pub strict: bool,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Show progress bars during operations.
    #[arg(long, global = true)]
    pub progress: bool,

    /// Choose an operation to perform.
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print stream information
    Info(InfoArgs),

    /// Remove leading and trailing tags, keeping only audio frames.
    Strip(StripArgs),

    /// Keep a time window of the stream.
    Trim(TrimArgs),

    /// Remove a run of frames.
    Cut(CutArgs),

    /// Join the audio frames of several streams.
    Concat(ConcatArgs),

    /// Extract the raw leading and trailing tag bytes.
    Tags(TagsArgs),
}

#[derive(Debug, Args)]
pub struct InfoArgs {
    /// Input MPEG audio stream (use "-" for stdin).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// List every frame.
    #[arg(long)]
    pub frames: bool,

    /// Report format.
    #[arg(long, value_enum, default_value_t = ReportFormat::Plain)]
    pub format: ReportFormat,
}

#[derive(Debug, Args)]
pub struct StripArgs {
    /// Input MPEG audio stream (use "-" for stdin).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output file (use "-" for stdout).
    #[arg(short, long, value_name = "PATH")]
    pub output: PathBuf,
}

#[derive(Debug, Args)]
pub struct TrimArgs {
    /// Input MPEG audio stream (use "-" for stdin).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output file (use "-" for stdout).
    #[arg(short, long, value_name = "PATH")]
    pub output: PathBuf,

    /// Start time in seconds, negative values count back from the end.
    #[arg(long, value_name = "SECONDS", allow_negative_numbers = true)]
    pub start: f64,

    /// Duration in seconds, zero or less keeps everything up to the end.
    #[arg(long, value_name = "SECONDS", default_value_t = 0.0, allow_negative_numbers = true)]
    pub duration: f64,
}

#[derive(Debug, Args)]
pub struct CutArgs {
    /// Input MPEG audio stream (use "-" for stdin).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output file (use "-" for stdout).
    #[arg(short, long, value_name = "PATH")]
    pub output: PathBuf,

    /// Index of the first frame to remove.
    #[arg(long, value_name = "FRAME")]
    pub index: isize,

    /// Number of frames to remove, negative values remove frames before INDEX.
    #[arg(long, value_name = "FRAMES", default_value_t = 1, allow_negative_numbers = true)]
    pub count: isize,
}

#[derive(Debug, Args)]
pub struct ConcatArgs {
    /// Input MPEG audio streams, in playback order. The first one keeps its tags.
    #[arg(value_name = "INPUT", required = true, num_args = 1..)]
    pub inputs: Vec<PathBuf>,

    /// Output file (use "-" for stdout).
    #[arg(short, long, value_name = "PATH")]
    pub output: PathBuf,
}

#[derive(Debug, Args)]
pub struct TagsArgs {
    /// Input MPEG audio stream (use "-" for stdin).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Write the bytes before the first frame to this file.
    #[arg(long, value_name = "PATH")]
    pub leading: Option<PathBuf>,

    /// Write the bytes after the last frame to this file.
    #[arg(long, value_name = "PATH")]
    pub trailing: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    /// Disable logging output.
    Off,
    /// No output except errors.
    Error,
    /// Show warnings and errors.
    Warn,
    /// Show info, warnings and errors (default).
    Info,
    /// Show debug, info, warnings and errors.
    Debug,
    /// Show all log messages including trace.
    Trace,
}

impl LogLevel {
    /// Convert LogLevel to log::LevelFilter
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Colorized human-readable text.
    Plain,
    /// Structured JSON per log record.
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum ReportFormat {
    /// Aligned human-readable text.
    Plain,
    /// YAML document.
    Yaml,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_negative_arguments() {
        let cli = Cli::try_parse_from([
            "mpaedit", "trim", "in.mp3", "-o", "out.mp3", "--start", "-10",
        ])
        .unwrap();
        match cli.command {
            Commands::Trim(args) => {
                assert_eq!(args.start, -10.0);
                assert_eq!(args.duration, 0.0);
            }
            other => panic!("unexpected command {other:?}"),
        }

        let cli = Cli::try_parse_from([
            "mpaedit", "cut", "in.mp3", "-o", "-", "--index", "5", "--count", "-3",
        ])
        .unwrap();
        match cli.command {
            Commands::Cut(args) => {
                assert_eq!(args.index, 5);
                assert_eq!(args.count, -3);
                assert_eq!(args.output, PathBuf::from("-"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn concat_requires_inputs() {
        assert!(Cli::try_parse_from(["mpaedit", "concat", "-o", "out.mp3"]).is_err());

        let cli =
            Cli::try_parse_from(["mpaedit", "--strict", "concat", "a.mp3", "b.mp3", "-o", "c.mp3"])
                .unwrap();
        assert!(cli.strict);
        match cli.command {
            Commands::Concat(args) => assert_eq!(args.inputs.len(), 2),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
