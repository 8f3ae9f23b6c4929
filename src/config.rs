// Stream and writer configuration
//
// EncoderConfig describes the PCM the encoder accepts and how it is cut into
// frames. StreamConfig freezes that together with the values resolved when the
// writer is built (pre-skip, serial number, output gain).

use crate::error::{OggOpusError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Input PCM is signed 16-bit little-endian, interleaved
pub const BYTES_PER_SAMPLE: usize = 2;

/// Sample rates an Opus encoder accepts
pub const SUPPORTED_SAMPLE_RATES: [u32; 5] = [8_000, 12_000, 16_000, 24_000, 48_000];

/// Granule positions are always counted at 48 kHz
pub const GRANULE_RATE: u32 = 48_000;

/// Frame durations Opus can encode in a single packet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub enum FrameDuration {
    Ms2_5,
    Ms5,
    Ms10,
    #[default]
    Ms20,
    Ms40,
    Ms60,
}

impl FrameDuration {
    pub fn from_millis(ms: f64) -> Option<Self> {
        // Compare in tenths of a millisecond so 2.5 is exact
        match (ms * 10.0).round() as i64 {
            25 => Some(FrameDuration::Ms2_5),
            50 => Some(FrameDuration::Ms5),
            100 => Some(FrameDuration::Ms10),
            200 => Some(FrameDuration::Ms20),
            400 => Some(FrameDuration::Ms40),
            600 => Some(FrameDuration::Ms60),
            _ => None,
        }
    }

    fn tenths_of_ms(self) -> usize {
        match self {
            FrameDuration::Ms2_5 => 25,
            FrameDuration::Ms5 => 50,
            FrameDuration::Ms10 => 100,
            FrameDuration::Ms20 => 200,
            FrameDuration::Ms40 => 400,
            FrameDuration::Ms60 => 600,
        }
    }

    pub fn as_millis(self) -> f64 {
        self.tenths_of_ms() as f64 / 10.0
    }

    /// Samples per channel in one frame at `sample_rate`
    pub fn frame_samples(self, sample_rate: u32) -> usize {
        sample_rate as usize * self.tenths_of_ms() / 10_000
    }
}

impl TryFrom<f64> for FrameDuration {
    type Error = String;

    fn try_from(ms: f64) -> std::result::Result<Self, Self::Error> {
        FrameDuration::from_millis(ms).ok_or_else(|| {
            format!("unsupported frame duration {ms} ms (expected 2.5, 5, 10, 20, 40 or 60)")
        })
    }
}

impl From<FrameDuration> for f64 {
    fn from(d: FrameDuration) -> f64 {
        d.as_millis()
    }
}

impl FromStr for FrameDuration {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let ms: f64 = s
            .trim()
            .trim_end_matches("ms")
            .parse()
            .map_err(|_| format!("invalid frame duration: {s}"))?;
        FrameDuration::try_from(ms)
    }
}

/// Encoder tuning hint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Application {
    Voip,
    #[default]
    Audio,
    LowDelay,
}

impl FromStr for Application {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "voip" => Ok(Application::Voip),
            "audio" => Ok(Application::Audio),
            "lowdelay" | "low_delay" | "restricted_lowdelay" => Ok(Application::LowDelay),
            _ => Err(format!("unknown application: {s}")),
        }
    }
}

/// What the encoder consumes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderConfig {
    pub sample_rate: u32,
    pub channels: u8,
    #[serde(default)]
    pub frame_duration: FrameDuration,
    #[serde(default)]
    pub application: Application,
    /// Target bitrate in bits per second, encoder default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<i32>,
}

impl EncoderConfig {
    pub fn new(sample_rate: u32, channels: u8, frame_duration: FrameDuration) -> Self {
        EncoderConfig {
            sample_rate,
            channels,
            frame_duration,
            application: Application::default(),
            bitrate: None,
        }
    }

    pub fn with_application(mut self, application: Application) -> Self {
        self.application = application;
        self
    }

    pub fn with_bitrate(mut self, bitrate: i32) -> Self {
        self.bitrate = Some(bitrate);
        self
    }

    /// Parse a JSON configuration document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: EncoderConfig = serde_json::from_str(json)
            .map_err(|e| OggOpusError::InvalidConfig(format!("invalid JSON config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !SUPPORTED_SAMPLE_RATES.contains(&self.sample_rate) {
            return Err(OggOpusError::InvalidConfig(format!(
                "unsupported sample rate {} Hz (expected one of {:?})",
                self.sample_rate, SUPPORTED_SAMPLE_RATES
            )));
        }
        // Mapping family 0 only covers mono and stereo
        if !(1..=2).contains(&self.channels) {
            return Err(OggOpusError::InvalidConfig(format!(
                "unsupported channel count {} (expected 1 or 2)",
                self.channels
            )));
        }
        if let Some(bitrate) = self.bitrate {
            if !(500..=512_000).contains(&bitrate) {
                return Err(OggOpusError::InvalidConfig(format!(
                    "bitrate {bitrate} out of range (500..=512000)"
                )));
            }
        }
        Ok(())
    }

    /// Samples per channel in one encoder frame
    pub fn frame_samples(&self) -> usize {
        self.frame_duration.frame_samples(self.sample_rate)
    }

    /// Bytes in one interleaved sample across all channels
    pub fn sample_align(&self) -> usize {
        BYTES_PER_SAMPLE * self.channels as usize
    }

    /// Bytes in one complete encoder frame
    pub fn frame_bytes(&self) -> usize {
        self.frame_samples() * self.sample_align()
    }
}

/// Optional knobs for building a writer
#[derive(Debug, Clone, Default)]
pub struct WriterOptions {
    /// Overrides the pre-skip advertised in the ID header
    pub custom_pre_skip: Option<u16>,
    /// Bitstream serial number, random when absent
    pub serial: Option<u32>,
    /// Output gain in Q7.8 dB
    pub output_gain: i16,
    /// Vendor string for the comment header, taken from the encoder when absent
    pub vendor: Option<String>,
    /// User comments as `(KEY, value)` pairs
    pub comments: Vec<(String, String)>,
}

impl WriterOptions {
    pub fn new() -> Self {
        WriterOptions::default()
    }

    pub fn with_pre_skip(mut self, pre_skip: u16) -> Self {
        self.custom_pre_skip = Some(pre_skip);
        self
    }

    pub fn with_serial(mut self, serial: u32) -> Self {
        self.serial = Some(serial);
        self
    }

    pub fn with_output_gain(mut self, gain: i16) -> Self {
        self.output_gain = gain;
        self
    }

    pub fn with_vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor = Some(vendor.into());
        self
    }

    pub fn with_comment(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.comments.push((key.into(), value.into()));
        self
    }
}

/// Everything about the stream that is fixed once the writer exists
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    encoder: EncoderConfig,
    pre_skip: u16,
    serial: u32,
    output_gain: i16,
}

impl StreamConfig {
    pub(crate) fn new(encoder: EncoderConfig, pre_skip: u16, serial: u32, output_gain: i16) -> Self {
        StreamConfig {
            encoder,
            pre_skip,
            serial,
            output_gain,
        }
    }

    pub fn encoder(&self) -> &EncoderConfig {
        &self.encoder
    }

    pub fn sample_rate(&self) -> u32 {
        self.encoder.sample_rate
    }

    pub fn channels(&self) -> u8 {
        self.encoder.channels
    }

    pub fn frame_samples(&self) -> usize {
        self.encoder.frame_samples()
    }

    pub fn pre_skip(&self) -> u16 {
        self.pre_skip
    }

    pub fn serial(&self) -> u32 {
        self.serial
    }

    pub fn output_gain(&self) -> i16 {
        self.output_gain
    }
}
