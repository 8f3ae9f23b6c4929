// CLI configuration
use clap::{Parser, Subcommand, ValueEnum};

/// opusmux - Ogg Opus muxing tool
#[derive(Parser, Debug)]
#[command(name = "opusmux")]
#[command(about = "Stream raw PCM into Ogg Opus files and inspect their page structure", long_about = None)]
#[command(version)]
pub struct Config {
    /// Output format
    #[arg(short, long, value_enum, default_value = "pretty", global = true)]
    pub format: OutputFormat,

    /// Quiet mode (suppress progress messages)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for reports
#[derive(Debug, Clone, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    #[default]
    Pretty,
    /// Compact JSON
    Json,
    /// Key-value summary
    KeyValue,
    /// One row per page
    Table,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the page structure and Opus headers of .opus file(s)
    Inspect {
        /// Ogg Opus file path(s)
        #[arg(value_name = "FILE")]
        files: Vec<String>,

        /// Directory to search (used with --pattern)
        #[arg(short, long)]
        directory: Option<String>,

        /// File pattern (e.g., "*.opus")
        #[arg(short, long)]
        pattern: Option<String>,
    },

    /// Encode a raw s16le PCM file into an Ogg Opus file
    Encode {
        /// Raw interleaved signed 16-bit little-endian PCM
        #[arg(value_name = "INPUT")]
        input: String,

        /// Output .opus path
        #[arg(value_name = "OUTPUT")]
        output: String,

        /// Encoder settings as JSON (overrides the flags below)
        #[arg(long)]
        config: Option<String>,

        /// Input sample rate in Hz
        #[arg(long, default_value_t = 48_000)]
        rate: u32,

        /// Channel count (1 or 2)
        #[arg(long, default_value_t = 2)]
        channels: u8,

        /// Frame duration in milliseconds (2.5, 5, 10, 20, 40, 60)
        #[arg(long, default_value = "20")]
        frame_ms: String,

        /// Encoder application (voip, audio, lowdelay)
        #[arg(long, default_value = "audio")]
        application: String,

        /// Target bitrate in bits per second
        #[arg(long)]
        bitrate: Option<i32>,

        /// Pre-skip to advertise instead of the encoder lookahead
        #[arg(long)]
        pre_skip: Option<u16>,

        /// Bitstream serial number (random by default)
        #[arg(long)]
        serial: Option<u32>,

        /// Comment tag as KEY=value (repeatable)
        #[arg(short, long = "tag", value_name = "KEY=VALUE")]
        tags: Vec<String>,

        /// Bytes read from the input per write call
        #[arg(long, default_value_t = 4096)]
        chunk_size: usize,
    },
}
