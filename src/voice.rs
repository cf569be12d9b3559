use std::path::Path;

use anyhow::{anyhow, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Wav,
    Mp3,
}

/// A finalized voice recording, base64-encoded for the assist service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceClip {
    pub data: String,
    pub format: AudioFormat,
}

impl VoiceClip {
    pub fn new(bytes: &[u8], format: AudioFormat) -> Self {
        VoiceClip {
            data: STANDARD.encode(bytes),
            format,
        }
    }

    /// Load and encode a recording; the format is taken from the extension.
    pub fn from_file(path: &Path) -> Result<Self> {
        let format = match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("wav") => AudioFormat::Wav,
            Some("mp3") => AudioFormat::Mp3,
            other => {
                return Err(anyhow!(
                    "unsupported audio format {:?}; expected .wav or .mp3",
                    other.unwrap_or("none")
                ))
            }
        };
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Ok(VoiceClip::new(&bytes, format))
    }
}
