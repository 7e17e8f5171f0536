mod acoustics;
mod align;
mod audio;
mod cli;
mod config;
mod error;
mod media;
mod output;
mod pipeline;

use anyhow::Result;
use clap::Parser;

use cli::Cli;
use pipeline::RunOptions;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let mut cli = Cli::parse();

    // Config values apply only where the CLI is still at its default
    let mut config = config::Config::default();
    if let Some(path) = config::find_config(cli.config.as_deref()) {
        if let Some(cfg) = config::load_config(&path) {
            log::info!("Loaded config from {}", path.display());
            if cli.pitch_floor == 75.0 { cli.pitch_floor = cfg.pitch.floor; }
            if cli.pitch_ceiling == 600.0 { cli.pitch_ceiling = cfg.pitch.ceiling; }
            if cli.sample_rate == 44100 { cli.sample_rate = cfg.audio.sample_rate; }
            if cli.delimiter == ',' { cli.delimiter = cfg.output.delimiter; }
            if cli.alignment == align::Alignment::Positional {
                cli.alignment = cfg.output.alignment;
            }
            config = cfg;
        } else {
            log::warn!("Failed to load config from {}", path.display());
        }
    }

    let mut settings = config.analysis();
    settings.pitch.floor = cli.pitch_floor;
    settings.pitch.ceiling = cli.pitch_ceiling;

    log::info!("speech_analysis - per-frame speech metrics");
    log::info!("Input: {}", cli.video.display());
    log::info!("Output: {}", cli.csv.display());
    if cli.alignment == align::Alignment::ByFrame {
        log::info!("Alignment: by frame index");
    }

    let opts = RunOptions {
        video: cli.video,
        csv: cli.csv,
        settings,
        sample_rate: cli.sample_rate,
        delimiter: cli.delimiter,
        alignment: cli.alignment,
        show_progress: !cli.no_progress,
    };

    let summary = pipeline::run(&opts)?;
    log::info!(
        "Frames: {}, with pitch: {}, rows written: {}",
        summary.frames,
        summary.pitch_frames,
        summary.rows
    );
    if let Some(ref mismatch) = summary.mismatch {
        let padded: usize = mismatch.padded().map(|(_, n)| n).sum();
        log::warn!("{} cell(s) padded with NA; rows may mix frames", padded);
    }
    if summary.dropped > 0 {
        log::warn!("{} cell(s) outside pitch frames were not written", summary.dropped);
    }

    println!("Analysis completed. Results saved to {}", opts.csv.display());
    Ok(())
}
