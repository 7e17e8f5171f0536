use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::AnalysisError;

/// Frame count and rate of a video's first video stream.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameTiming {
    pub frame_count: i64,
    pub fps: f64,
}

/// Count decoded frames with ffprobe. Only stream metadata crosses the pipe;
/// no pixel data is read into this process.
pub fn probe_frame_timing(video: &Path) -> Result<FrameTiming, AnalysisError> {
    let output = Command::new("ffprobe")
        .args([
            "-v", "error",
            "-select_streams", "v:0",
            "-count_frames",
            "-show_entries", "stream=nb_read_frames,r_frame_rate,avg_frame_rate",
            "-of", "default=noprint_wrappers=1",
        ])
        .arg(video)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| {
            AnalysisError::unavailable("ffprobe", format!("failed to spawn ffprobe ({}). Is ffmpeg installed?", e))
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AnalysisError::unavailable("ffprobe", stderr.trim()));
    }

    let timing = parse_probe_output(&String::from_utf8_lossy(&output.stdout))?;
    log::info!(
        "Video: {} frames @ {:.3}fps ({:.2}s)",
        timing.frame_count,
        timing.fps,
        timing.frame_count as f64 / timing.fps
    );
    Ok(timing)
}

/// Parse `key=value` lines as printed by ffprobe's default writer.
pub fn parse_probe_output(text: &str) -> Result<FrameTiming, AnalysisError> {
    let mut frames: Option<&str> = None;
    let mut r_rate: Option<&str> = None;
    let mut avg_rate: Option<&str> = None;

    for line in text.lines() {
        let Some((key, value)) = line.trim().split_once('=') else {
            continue;
        };
        match key {
            "nb_read_frames" => frames = Some(value),
            "r_frame_rate" => r_rate = Some(value),
            "avg_frame_rate" => avg_rate = Some(value),
            _ => {}
        }
    }

    let frames = frames.ok_or_else(|| AnalysisError::unavailable("ffprobe", "no video stream found"))?;
    let frame_count: i64 = frames.parse().map_err(|_| {
        AnalysisError::unavailable("ffprobe", format!("unreadable frame count '{}'", frames))
    })?;

    let fps = r_rate
        .and_then(parse_rate)
        .or_else(|| avg_rate.and_then(parse_rate))
        .ok_or_else(|| AnalysisError::unavailable("ffprobe", "video stream has no frame rate"))?;

    Ok(FrameTiming { frame_count, fps })
}

/// `"30000/1001"` or `"25"`; zero or malformed rates give `None`.
fn parse_rate(text: &str) -> Option<f64> {
    let rate = match text.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => text.trim().parse().ok()?,
    };
    (rate.is_finite() && rate > 0.0).then_some(rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ntsc_stream() {
        let timing = parse_probe_output(
            "r_frame_rate=30000/1001\navg_frame_rate=30000/1001\nnb_read_frames=300\n",
        )
        .unwrap();
        assert_eq!(timing.frame_count, 300);
        assert!((timing.fps - 29.97003).abs() < 1e-4);
    }

    #[test]
    fn falls_back_to_average_rate() {
        let timing =
            parse_probe_output("r_frame_rate=0/0\navg_frame_rate=25/1\nnb_read_frames=10").unwrap();
        assert_eq!(timing.fps, 25.0);
    }

    #[test]
    fn missing_stream_is_unavailable() {
        assert!(matches!(
            parse_probe_output(""),
            Err(AnalysisError::SourceUnavailable { .. })
        ));
        assert!(parse_probe_output("nb_read_frames=N/A\nr_frame_rate=25/1").is_err());
        assert!(parse_probe_output("nb_read_frames=10\nr_frame_rate=0/0").is_err());
    }

    #[test]
    fn rate_forms() {
        assert_eq!(parse_rate("25"), Some(25.0));
        assert_eq!(parse_rate("50/2"), Some(25.0));
        assert_eq!(parse_rate("1/0"), None);
        assert_eq!(parse_rate("abc"), None);
    }
}
