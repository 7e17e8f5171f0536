use clap::Parser;
use std::path::PathBuf;

use crate::align::Alignment;

#[derive(Parser, Debug)]
#[command(
    name = "speech_analysis",
    about = "Extract per-frame speech metrics (pitch, intensity, harmonicity, formants) from a video and save them to a CSV file"
)]
pub struct Cli {
    /// Path to the input video file
    #[arg(short, long)]
    pub video: PathBuf,

    /// Path to the output CSV file
    #[arg(short, long)]
    pub csv: PathBuf,

    /// Config file (defaults to ./speech-analysis.toml or the user config dir)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Lowest pitch considered, in Hz
    #[arg(long, default_value_t = 75.0)]
    pub pitch_floor: f64,

    /// Highest pitch considered, in Hz
    #[arg(long, default_value_t = 600.0)]
    pub pitch_ceiling: f64,

    /// Sample rate of the extracted audio, in Hz
    #[arg(long, default_value_t = 44100)]
    pub sample_rate: u32,

    /// Field delimiter of the output table
    #[arg(long, default_value_t = ',')]
    pub delimiter: char,

    /// How metric columns are bound into rows
    #[arg(long, value_enum, default_value_t = Alignment::Positional)]
    pub alignment: Alignment,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,
}
