use rayon::prelude::*;

use super::frames::{self, FrameGrid};
use super::{Sample, Sound};
use crate::config::IntensitySettings;

/// Auditory threshold pressure squared, in Pa².
const REFERENCE_POWER: f64 = 4.0e-10;
const FLOOR_DB: f64 = -300.0;

/// Kaiser-windowed energy contour in dB. Every analysis frame is emitted.
pub fn to_intensity(sound: &Sound, settings: &IntensitySettings) -> Vec<Sample> {
    let sr = sound.sample_rate;
    let window = 6.4 / settings.min_pitch;
    let step = 0.8 / settings.min_pitch;

    let Some(grid) = FrameGrid::new(sound.duration(), window, step) else {
        return Vec::new();
    };

    let window_len = ((window * sr).round() as usize).max(1);
    let kaiser = frames::kaiser_window(window_len, 2.0 * std::f64::consts::PI.powi(2) + 0.5);
    let weight: f64 = kaiser.iter().sum();

    (0..grid.count)
        .into_par_iter()
        .map(|frame| {
            let time = grid.time(frame);
            let mut segment = frames::centered_segment(&sound.samples, sr, time, window_len);
            frames::subtract_mean(&mut segment);
            let power = segment
                .iter()
                .zip(&kaiser)
                .map(|(s, w)| s * s * w)
                .sum::<f64>()
                / weight;
            let db = if power > 0.0 {
                (10.0 * (power / REFERENCE_POWER).log10()).max(FLOOR_DB)
            } else {
                FLOOR_DB
            };
            Sample::new(time, db)
        })
        .collect()
}
