// libopus-backed frame encoder (feature = "libopus")

use super::{EncodeError, FrameEncoder};
use crate::config::{Application, EncoderConfig};
use crate::error::{OggOpusError, Result};

/// Largest packet libopus recommends reserving room for
const MAX_PACKET_BYTES: usize = 4000;

pub struct LibopusEncoder {
    config: EncoderConfig,
    encoder: opus::Encoder,
}

impl LibopusEncoder {
    pub fn new(config: EncoderConfig) -> Result<Self> {
        config.validate()?;

        let channels = match config.channels {
            1 => opus::Channels::Mono,
            _ => opus::Channels::Stereo,
        };
        let application = match config.application {
            Application::Voip => opus::Application::Voip,
            Application::Audio => opus::Application::Audio,
            Application::LowDelay => opus::Application::LowDelay,
        };

        let mut encoder = opus::Encoder::new(config.sample_rate, channels, application)
            .map_err(|e| OggOpusError::EncodingFailed(EncodeError::new(e.to_string())))?;
        if let Some(bitrate) = config.bitrate {
            encoder
                .set_bitrate(opus::Bitrate::Bits(bitrate))
                .map_err(|e| OggOpusError::EncodingFailed(EncodeError::new(e.to_string())))?;
        }

        Ok(LibopusEncoder { config, encoder })
    }
}

impl FrameEncoder for LibopusEncoder {
    fn config(&self) -> &EncoderConfig {
        &self.config
    }

    fn lookahead(&mut self) -> std::result::Result<u16, EncodeError> {
        let samples = self
            .encoder
            .get_lookahead()
            .map_err(|e| EncodeError::new(e.to_string()))?;
        u16::try_from(samples).map_err(|_| EncodeError::new(format!("lookahead {samples} out of range")))
    }

    fn encode_frame(&mut self, pcm: &[i16]) -> std::result::Result<Vec<u8>, EncodeError> {
        let mut out = vec![0u8; MAX_PACKET_BYTES];
        let len = self
            .encoder
            .encode(pcm, &mut out)
            .map_err(|e| EncodeError::new(e.to_string()))?;
        out.truncate(len);
        Ok(out)
    }

    fn vendor(&self) -> String {
        opus::version().to_string()
    }
}
