use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};

use crate::acoustics::{self, AcousticSource, Metric, Sound};
use crate::align::window::FrameWindow;
use crate::align::{self, AlignedTable, Alignment};
use crate::audio::decode::decode_audio;
use crate::config::AnalysisSettings;
use crate::error::{AnalysisError, LengthMismatch};
use crate::media::extract::extract_audio;
use crate::media::probe::probe_frame_timing;
use crate::output::delimited::write_table;

pub struct RunOptions {
    pub video: PathBuf,
    pub csv: PathBuf,
    pub settings: AnalysisSettings,
    pub sample_rate: u32,
    pub delimiter: char,
    pub alignment: Alignment,
    pub show_progress: bool,
}

#[derive(Debug)]
pub struct RunSummary {
    pub frames: usize,
    pub pitch_frames: usize,
    pub rows: usize,
    pub mismatch: Option<LengthMismatch>,
    pub dropped: usize,
}

pub fn run(opts: &RunOptions) -> Result<RunSummary> {
    if !opts.video.exists() {
        anyhow::bail!("Input file not found: {}", opts.video.display());
    }
    opts.settings.validate()?;
    check_sample_rate(opts.sample_rate, &opts.settings)?;

    // 1. Frame windows from video timing
    log::info!("Probing video frames...");
    let timing = probe_frame_timing(&opts.video)?;
    let windows = align::window::build_windows(timing.frame_count, timing.fps)?;

    // 2. Audio track
    let sound = load_sound(&opts.video, opts.sample_rate)?;

    // 3. Acoustic streams
    log::info!("Analyzing audio...");
    let pb = progress_bar(opts.show_progress);
    let streams = acoustics::analyze(&sound, &opts.settings, &pb)?;
    pb.finish_with_message("analysis complete");
    drop(sound);

    // 4. Align to frames and persist
    log::info!("Aligning {} streams to {} frames...", Metric::ALL.len(), windows.len());
    let aligned = tabulate(&windows, &streams, opts.alignment, &opts.csv, opts.delimiter)?;

    Ok(RunSummary {
        frames: windows.len(),
        pitch_frames: aligned.canonical.len(),
        rows: aligned.table.row_count(),
        mismatch: aligned.mismatch,
        dropped: aligned.dropped.iter().map(|(_, n)| n).sum(),
    })
}

/// The extraction rate must resolve the pitch ceiling.
fn check_sample_rate(sample_rate: u32, settings: &AnalysisSettings) -> Result<(), AnalysisError> {
    let min_rate = 2.0 * settings.pitch.ceiling;
    if (sample_rate as f64) < min_rate {
        return Err(AnalysisError::invalid(format!(
            "sample rate {} Hz is below {} Hz (twice the pitch ceiling)",
            sample_rate, min_rate
        )));
    }
    Ok(())
}

/// Build the table for already computed streams and write it out.
pub fn tabulate<S: AcousticSource + Sync>(
    windows: &[FrameWindow],
    source: &S,
    alignment: Alignment,
    csv: &Path,
    delimiter: char,
) -> Result<AlignedTable> {
    let aligned = align::build_table(windows, source, alignment)?;
    write_table(&aligned.table, csv, delimiter)
        .with_context(|| format!("Failed to write {}", csv.display()))?;
    Ok(aligned)
}

/// Extract, decode and release the temporary audio in one scope.
fn load_sound(video: &Path, sample_rate: u32) -> Result<Sound> {
    log::info!("Extracting audio...");
    let extracted = extract_audio(video, sample_rate)?;
    let decoded = decode_audio(extracted.path())
        .map_err(|e| AnalysisError::unavailable("audio decoder", format!("{:#}", e)));
    extracted.release();
    let audio = decoded.context("Failed to decode extracted audio")?;
    Ok(Sound::from(&audio))
}

fn progress_bar(visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(4);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} analyses ({msg})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
    );
    pb
}
