use std::path::Path;
use std::process::{Command, Stdio};
use tempfile::TempPath;

use crate::error::AnalysisError;

/// A WAV file extracted from a video, deleted when dropped.
pub struct ExtractedAudio {
    path: TempPath,
}

impl ExtractedAudio {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file now, reporting failures instead of ignoring them.
    pub fn release(self) {
        let display = self.path.display().to_string();
        if let Err(err) = self.path.close() {
            log::warn!("Failed to delete {}. Reason: {}", display, err);
        } else {
            log::debug!("Removed temporary audio {}", display);
        }
    }
}

/// Write the video's audio track to a temporary 16-bit PCM WAV.
pub fn extract_audio(video: &Path, sample_rate: u32) -> Result<ExtractedAudio, AnalysisError> {
    let path = tempfile::Builder::new()
        .prefix("speech-analysis-")
        .suffix(".wav")
        .tempfile()
        .map_err(|e| AnalysisError::unavailable("temporary audio file", e))?
        .into_temp_path();

    let output = Command::new("ffmpeg")
        .args(["-y", "-v", "error", "-i"])
        .arg(video)
        .args(["-vn", "-acodec", "pcm_s16le", "-ar"])
        .arg(sample_rate.to_string())
        .args(["-f", "wav"])
        .arg(&*path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .output()
        .map_err(|e| {
            AnalysisError::unavailable("ffmpeg", format!("failed to spawn ffmpeg ({}). Is ffmpeg installed?", e))
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AnalysisError::unavailable("audio track", stderr.trim()));
    }

    log::info!("Extracted audio to {} ({}Hz)", path.display(), sample_rate);
    Ok(ExtractedAudio { path })
}
