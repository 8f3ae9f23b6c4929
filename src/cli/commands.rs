// CLI command implementations
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use std::str::FromStr;

use serde::Serialize;
use tracing::{debug, warn};

use opusmux::config::GRANULE_RATE;
use opusmux::ogg::{OggPageHeader, OGG_SIGNATURE};
use opusmux::utils::io::check_signature;
use opusmux::{
    Application, EncoderConfig, FrameDuration, FrameEncoder, IdHeader, OggOpusWriter, OggPage,
    OpusTags, WriterOptions,
};

use crate::cli::{CliError, CliResult, OutputFormatter};

/// One page as reported by `inspect`
#[derive(Debug, Serialize)]
pub struct PageReport {
    pub sequence: u32,
    /// `None` when no packet finishes on the page
    pub granule: Option<u64>,
    pub flags: String,
    pub segments: usize,
    pub bytes: usize,
    pub checksum_ok: bool,
}

/// Structure of one Ogg Opus file
#[derive(Debug, Serialize)]
pub struct StreamReport {
    pub file: String,
    pub serial: Option<u32>,
    pub page_count: usize,
    pub id_header: Option<IdHeader>,
    pub vendor: Option<String>,
    pub comments: Vec<String>,
    pub final_granule: Option<u64>,
    /// Samples a decoder outputs: final granule minus pre-skip, at 48 kHz
    pub decoded_samples: Option<u64>,
    pub duration_seconds: Option<f64>,
    pub bad_checksums: usize,
    pub pages: Vec<PageReport>,
}

fn page_flags(header: &OggPageHeader) -> String {
    let mut flags = Vec::new();
    if header.is_continuation() {
        flags.push("cont");
    }
    if header.is_bos() {
        flags.push("bos");
    }
    if header.is_eos() {
        flags.push("eos");
    }
    if flags.is_empty() {
        "-".to_string()
    } else {
        flags.join(",")
    }
}

/// Read every page of `path` and decode the two header packets
pub fn inspect_file(path: &str) -> CliResult<StreamReport> {
    let file = File::open(path).map_err(|_| CliError::FileNotFound(path.to_string()))?;
    let mut reader = BufReader::new(file);
    if !check_signature(&mut reader, OGG_SIGNATURE)? {
        return Err(CliError::InvalidFormat(format!("{}: not an Ogg stream", path)));
    }
    let pages = OggPage::read_all(&mut reader)?;
    Ok(build_report(path, &pages))
}

fn build_report(path: &str, pages: &[OggPage]) -> StreamReport {
    // Header packets are small enough to sit whole on the first two pages
    let id_header = pages
        .first()
        .and_then(|p| p.packets().first().copied())
        .and_then(|packet| IdHeader::parse(packet).ok());
    let tags = pages
        .get(1)
        .and_then(|p| p.packets().first().copied())
        .and_then(|packet| OpusTags::parse(packet).ok());

    let final_granule = pages.iter().rev().find_map(|p| p.granule());
    let decoded_samples = match (final_granule, &id_header) {
        (Some(granule), Some(head)) => Some(granule.saturating_sub(u64::from(head.pre_skip))),
        _ => None,
    };

    let reports: Vec<PageReport> = pages
        .iter()
        .map(|page| PageReport {
            sequence: page.header.page_sequence,
            granule: page.granule(),
            flags: page_flags(&page.header),
            segments: page.header.segment_table.len(),
            bytes: page.len(),
            checksum_ok: page.verify_checksum(),
        })
        .collect();

    StreamReport {
        file: path.to_string(),
        serial: pages.first().map(|p| p.header.bitstream_serial),
        page_count: pages.len(),
        id_header,
        vendor: tags.as_ref().map(|t| t.vendor_string.clone()),
        comments: tags
            .map(|t| t.comments.iter().map(|(k, v)| format!("{k}={v}")).collect())
            .unwrap_or_default(),
        final_granule,
        decoded_samples,
        duration_seconds: decoded_samples.map(|s| s as f64 / f64::from(GRANULE_RATE)),
        bad_checksums: reports.iter().filter(|p| !p.checksum_ok).count(),
        pages: reports,
    }
}

/// Expand `--directory`/`--pattern` into file paths
fn find_files(directory: &str, pattern: &str, formatter: &OutputFormatter) -> CliResult<Vec<String>> {
    use glob::glob;

    // Build glob pattern
    let glob_pattern = if pattern.contains('*') || pattern.contains('?') {
        format!("{}/{}", directory, pattern)
    } else {
        format!("{}/**/{}", directory, pattern)
    };

    let mut files = Vec::new();
    for entry in glob(&glob_pattern).map_err(|e| CliError::Other(format!("Invalid glob pattern: {}", e)))? {
        match entry {
            Ok(path) => {
                if path.is_file() {
                    if let Some(path_str) = path.to_str() {
                        files.push(path_str.to_string());
                    }
                }
            }
            Err(e) => {
                formatter.print_error(&format!("Error reading path: {}", e));
            }
        }
    }
    Ok(files)
}

/// Print the page structure of each file
pub fn command_inspect(
    mut files: Vec<String>,
    directory: Option<String>,
    pattern: Option<String>,
    formatter: &OutputFormatter,
) -> CliResult<()> {
    if let Some(directory) = directory {
        let pattern = pattern.unwrap_or_else(|| "*.opus".to_string());
        files.extend(find_files(&directory, &pattern, formatter)?);
    } else if pattern.is_some() {
        return Err(CliError::Other("--pattern requires --directory".to_string()));
    }

    if files.is_empty() {
        return Err(CliError::Other("No files specified".to_string()));
    }

    let mut stdout = io::stdout().lock();
    let mut error_count = 0;
    for file_path in &files {
        match inspect_file(file_path) {
            Ok(report) => {
                if report.bad_checksums > 0 {
                    warn!(file = %file_path, pages = report.bad_checksums, "pages with bad checksums");
                }
                formatter.output_report(&serde_json::to_value(&report)?, &mut stdout)?;
            }
            Err(e) => {
                formatter.print_error(&format!("{}: {}", file_path, e));
                error_count += 1;
            }
        }
    }

    if error_count > 0 {
        return Err(CliError::Other(format!("{} of {} files could not be read", error_count, files.len())));
    }
    Ok(())
}

/// Arguments of the `encode` subcommand
#[derive(Debug, Clone)]
pub struct EncodeArgs {
    pub input: String,
    pub output: String,
    pub config: Option<String>,
    pub rate: u32,
    pub channels: u8,
    pub frame_ms: String,
    pub application: String,
    pub bitrate: Option<i32>,
    pub pre_skip: Option<u16>,
    pub serial: Option<u32>,
    pub tags: Vec<String>,
    pub chunk_size: usize,
}

impl EncodeArgs {
    /// Encoder settings from `--config`, or else from the individual flags
    pub fn encoder_config(&self) -> CliResult<EncoderConfig> {
        let config = match &self.config {
            Some(path) => {
                let json = std::fs::read_to_string(path).map_err(|_| CliError::FileNotFound(path.clone()))?;
                EncoderConfig::from_json(&json)?
            }
            None => {
                let frame_duration = FrameDuration::from_str(&self.frame_ms).map_err(CliError::InvalidFormat)?;
                let application = Application::from_str(&self.application).map_err(CliError::InvalidFormat)?;
                let mut config =
                    EncoderConfig::new(self.rate, self.channels, frame_duration).with_application(application);
                if let Some(bitrate) = self.bitrate {
                    config = config.with_bitrate(bitrate);
                }
                config
            }
        };
        config.validate()?;
        Ok(config)
    }

    pub fn writer_options(&self) -> CliResult<WriterOptions> {
        let mut options = WriterOptions::new();
        if let Some(pre_skip) = self.pre_skip {
            options = options.with_pre_skip(pre_skip);
        }
        if let Some(serial) = self.serial {
            options = options.with_serial(serial);
        }
        for tag in &self.tags {
            let (key, value) = tag
                .split_once('=')
                .filter(|(key, _)| !key.is_empty())
                .ok_or_else(|| CliError::InvalidFormat(format!("tag must be KEY=value: {}", tag)))?;
            options = options.with_comment(key, value);
        }
        Ok(options)
    }
}

/// Encode a raw PCM file into an Ogg Opus file
pub fn command_encode(args: EncodeArgs, formatter: &OutputFormatter) -> CliResult<()> {
    let config = args.encoder_config()?;
    let options = args.writer_options()?;
    if !Path::new(&args.input).is_file() {
        return Err(CliError::FileNotFound(args.input.clone()));
    }
    run_encode(&args, config, options, formatter)
}

#[cfg(feature = "libopus")]
fn run_encode(
    args: &EncodeArgs,
    config: EncoderConfig,
    options: WriterOptions,
    formatter: &OutputFormatter,
) -> CliResult<()> {
    let encoder = opusmux::LibopusEncoder::new(config)?;
    encode_stream(args, encoder, options, formatter)
}

#[cfg(not(feature = "libopus"))]
fn run_encode(
    _args: &EncodeArgs,
    _config: EncoderConfig,
    _options: WriterOptions,
    _formatter: &OutputFormatter,
) -> CliResult<()> {
    Err(CliError::Other(
        "this build has no Opus encoder; rebuild with `--features libopus`".to_string(),
    ))
}

/// Stream the input through the writer in fixed-size chunks
#[cfg_attr(not(feature = "libopus"), allow(dead_code))]
pub fn encode_stream<E: FrameEncoder>(
    args: &EncodeArgs,
    encoder: E,
    options: WriterOptions,
    formatter: &OutputFormatter,
) -> CliResult<()> {
    let mut input = File::open(&args.input).map_err(|_| CliError::FileNotFound(args.input.clone()))?;
    let mut writer = OggOpusWriter::create_with_options(&args.output, encoder, options)?;

    let align = writer.stream_config().encoder().sample_align();
    let chunk = (args.chunk_size / align).max(1) * align;
    let mut buf = vec![0u8; chunk];
    let mut total_bytes = 0u64;

    loop {
        let filled = fill_buffer(&mut input, &mut buf)?;
        if filled == 0 {
            break;
        }
        let usable = filled - filled % align;
        if usable < filled {
            warn!(trailing_bytes = filled - usable, "input ends inside a sample, ignoring trailing bytes");
        }
        writer.write(&buf[..usable])?;
        total_bytes += usable as u64;
        if filled < buf.len() {
            break;
        }
    }

    let samples = writer.samples_encoded();
    let rate = writer.stream_config().sample_rate();
    let pre_skip = writer.pre_skip();
    let serial = writer.serial();
    writer.close()?;
    debug!(input_bytes = total_bytes, samples, "encode finished");

    formatter.print_success(&format!("{} -> {}", args.input, args.output));
    formatter.print_info(&format!(
        "{} samples/channel ({:.3} s), pre-skip {}, serial {:#010x}, {} pages",
        samples,
        samples as f64 / f64::from(rate),
        pre_skip,
        serial,
        writer.next_page_sequence(),
    ));
    Ok(())
}

/// Read until `buf` is full or the reader is exhausted
fn fill_buffer<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
