use rayon::prelude::*;

use super::frames::{self, FrameGrid};
use super::{Sample, Sound};
use crate::config::HarmonicitySettings;

/// Value reported for silent or aperiodic frames.
pub const UNVOICED_DB: f64 = -200.0;
const MAX_CORRELATION: f64 = 1.0 - 1e-6;

/// Cross-correlation harmonics-to-noise ratio in dB. Every frame is emitted.
pub fn to_harmonicity_cc(
    sound: &Sound,
    min_pitch: f64,
    settings: &HarmonicitySettings,
) -> Vec<Sample> {
    let sr = sound.sample_rate;
    let period_len = ((sr / min_pitch).floor() as usize).max(2);
    let window_len = ((settings.periods_per_window / min_pitch * sr).round() as usize).max(2);
    let span = window_len + period_len;

    let Some(grid) = FrameGrid::new(sound.duration(), span as f64 / sr, settings.time_step) else {
        return Vec::new();
    };

    let global_peak = sound.peak();

    (0..grid.count)
        .into_par_iter()
        .map(|frame| {
            let time = grid.time(frame);
            let mut segment = frames::centered_segment(&sound.samples, sr, time, span);
            let hnr = if global_peak <= 0.0
                || frames::local_peak(&segment) < settings.silence_threshold * global_peak
            {
                UNVOICED_DB
            } else {
                frames::subtract_mean(&mut segment);
                peak_correlation(&segment, window_len, period_len).map_or(UNVOICED_DB, to_db)
            };
            Sample::new(time, hnr)
        })
        .collect()
}

/// Highest local maximum of the normalised cross-correlation between the
/// first `window_len` samples and the same span shifted by `2..=max_lag`.
fn peak_correlation(segment: &[f64], window_len: usize, max_lag: usize) -> Option<f64> {
    let correlation = |lag: usize| -> f64 {
        let a = &segment[..window_len];
        let b = &segment[lag..lag + window_len];
        let (mut ab, mut aa, mut bb) = (0.0, 0.0, 0.0);
        for (x, y) in a.iter().zip(b) {
            ab += x * y;
            aa += x * x;
            bb += y * y;
        }
        if aa > 0.0 && bb > 0.0 {
            ab / (aa * bb).sqrt()
        } else {
            0.0
        }
    };

    let max_lag = max_lag.min(segment.len() - window_len);
    let r: Vec<f64> = (0..=max_lag).map(|lag| if lag == 0 { 1.0 } else { correlation(lag) }).collect();

    let mut best: Option<f64> = None;
    for lag in 2..max_lag {
        if r[lag] > r[lag - 1] && r[lag] >= r[lag + 1] && r[lag] > 0.0 {
            best = Some(best.map_or(r[lag], |b| b.max(r[lag])));
        }
    }
    best
}

fn to_db(r: f64) -> f64 {
    let r = r.min(MAX_CORRELATION);
    10.0 * (r / (1.0 - r)).log10()
}
