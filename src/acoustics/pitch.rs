use rayon::prelude::*;
use rustfft::{num_complex::Complex, FftPlanner};

use super::frames::{self, FrameGrid};
use super::{Sample, Sound};
use crate::config::PitchSettings;

const PERIODS_PER_WINDOW: f64 = 3.0;
const VOICING_THRESHOLD: f64 = 0.45;
const SILENCE_THRESHOLD: f64 = 0.03;
const OCTAVE_COST: f64 = 0.01;

/// Pitch contour; unvoiced frames carry frequency 0.
#[derive(Clone, Debug, Default)]
pub struct PitchTrack {
    pub times: Vec<f64>,
    pub frequencies: Vec<f64>,
}

impl PitchTrack {
    pub fn voiced_samples(&self) -> Vec<Sample> {
        self.times
            .iter()
            .zip(&self.frequencies)
            .filter(|(_, &f)| f > 0.0)
            .map(|(&t, &f)| Sample::new(t, f))
            .collect()
    }

    /// Lowest voiced frequency, if any frame is voiced.
    pub fn minimum(&self) -> Option<f64> {
        self.frequencies
            .iter()
            .copied()
            .filter(|&f| f > 0.0)
            .fold(None, |acc: Option<f64>, f| Some(acc.map_or(f, |m| m.min(f))))
    }
}

/// Autocorrelation pitch analysis.
pub fn to_pitch(sound: &Sound, settings: &PitchSettings) -> PitchTrack {
    let sr = sound.sample_rate;
    let window = PERIODS_PER_WINDOW / settings.floor;
    let step = 0.75 / settings.floor;

    let Some(grid) = FrameGrid::new(sound.duration(), window, step) else {
        log::debug!("Sound too short for pitch analysis ({:.3}s)", sound.duration());
        return PitchTrack::default();
    };

    let window_len = ((window * sr).round() as usize).max(2);
    let fft_len = (2 * window_len).next_power_of_two();
    let hann = frames::hann_window(window_len);

    let mut planner = FftPlanner::<f64>::new();
    let forward = planner.plan_fft_forward(fft_len);
    let inverse = planner.plan_fft_inverse(fft_len);

    let window_ac = {
        let mut buf: Vec<Complex<f64>> = hann.iter().map(|&w| Complex::new(w, 0.0)).collect();
        buf.resize(fft_len, Complex::new(0.0, 0.0));
        autocorrelate(&mut buf, &*forward, &*inverse)
    };

    let min_lag = (sr / settings.ceiling).ceil().max(2.0) as usize;
    let max_lag = ((sr / settings.floor).floor() as usize).min(window_len - 1);
    let global_peak = sound.peak();

    let frequencies: Vec<f64> = (0..grid.count)
        .into_par_iter()
        .map(|frame| {
            let mut segment =
                frames::centered_segment(&sound.samples, sr, grid.time(frame), window_len);
            if global_peak <= 0.0 || frames::local_peak(&segment) < SILENCE_THRESHOLD * global_peak {
                return 0.0;
            }
            frames::subtract_mean(&mut segment);

            let mut buf: Vec<Complex<f64>> = segment
                .iter()
                .zip(&hann)
                .map(|(&s, &w)| Complex::new(s * w, 0.0))
                .collect();
            buf.resize(fft_len, Complex::new(0.0, 0.0));
            let ac = autocorrelate(&mut buf, &*forward, &*inverse);
            if ac[0] <= 0.0 {
                return 0.0;
            }

            let r: Vec<f64> = (0..=max_lag + 1)
                .map(|lag| {
                    if window_ac[lag] > 0.0 {
                        (ac[lag] / ac[0]) / (window_ac[lag] / window_ac[0])
                    } else {
                        0.0
                    }
                })
                .collect();

            best_candidate(&r, min_lag, max_lag, sr, settings.floor)
                .map_or(0.0, |(frequency, _)| frequency)
        })
        .collect();

    let times = (0..grid.count).map(|i| grid.time(i)).collect();
    PitchTrack { times, frequencies }
}

/// Pick the strongest autocorrelation peak in `[min_lag, max_lag]`.
/// Returns `(frequency, strength)` when the peak clears the voicing threshold.
fn best_candidate(
    r: &[f64],
    min_lag: usize,
    max_lag: usize,
    sample_rate: f64,
    floor: f64,
) -> Option<(f64, f64)> {
    let mut best: Option<(f64, f64, f64)> = None;
    for lag in min_lag.max(1)..=max_lag {
        if lag + 1 >= r.len() {
            break;
        }
        let (y0, y1, y2) = (r[lag - 1], r[lag], r[lag + 1]);
        if !(y1 > y0 && y1 >= y2) || y1 <= 0.0 {
            continue;
        }
        let denom = y0 - 2.0 * y1 + y2;
        let shift = if denom != 0.0 { 0.5 * (y0 - y2) / denom } else { 0.0 };
        let strength = (y1 - 0.25 * (y0 - y2) * shift).min(1.0);
        let frequency = sample_rate / (lag as f64 + shift);
        let score = strength - OCTAVE_COST * (floor / frequency).log2();
        if best.map_or(true, |(_, _, s)| score > s) {
            best = Some((frequency, strength, score));
        }
    }
    best.filter(|&(_, strength, _)| strength >= VOICING_THRESHOLD)
        .map(|(frequency, strength, _)| (frequency, strength))
}

/// Real autocorrelation through the power spectrum; `buf` must be zero padded.
fn autocorrelate(
    buf: &mut [Complex<f64>],
    forward: &dyn rustfft::Fft<f64>,
    inverse: &dyn rustfft::Fft<f64>,
) -> Vec<f64> {
    forward.process(buf);
    for c in buf.iter_mut() {
        *c = Complex::new(c.norm_sqr(), 0.0);
    }
    inverse.process(buf);
    let scale = 1.0 / buf.len() as f64;
    buf.iter().map(|c| c.re * scale).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn sine(freq: f64, sr: f64, seconds: f64, amp: f64) -> Sound {
        let n = (sr * seconds) as usize;
        Sound::new(
            (0..n).map(|i| amp * (2.0 * PI * freq * i as f64 / sr).sin()).collect(),
            sr,
        )
    }

    fn median(mut xs: Vec<f64>) -> f64 {
        xs.sort_by(|a, b| a.total_cmp(b));
        xs[xs.len() / 2]
    }

    #[test]
    fn tracks_a_steady_tone() {
        let sound = sine(200.0, 16000.0, 1.0, 0.5);
        let track = to_pitch(&sound, &PitchSettings::default());
        let voiced = track.voiced_samples();
        assert!(voiced.len() > track.times.len() / 2);
        let f0 = median(voiced.iter().map(|s| s.value).collect());
        assert!((f0 - 200.0).abs() < 10.0, "median pitch {}", f0);
    }

    #[test]
    fn silence_is_unvoiced() {
        let sound = Sound::new(vec![0.0; 16000], 16000.0);
        let track = to_pitch(&sound, &PitchSettings::default());
        assert!(!track.times.is_empty());
        assert!(track.voiced_samples().is_empty());
        assert_eq!(track.minimum(), None);
    }

    #[test]
    fn short_sound_has_no_frames() {
        let sound = Sound::new(vec![0.1; 100], 16000.0);
        let track = to_pitch(&sound, &PitchSettings::default());
        assert!(track.times.is_empty());
    }

    #[test]
    fn window_shorter_than_two_samples() {
        // 3 periods of 75 Hz at 10 Hz rounds to zero samples
        let sound = Sound::new(vec![0.1; 100], 10.0);
        let track = to_pitch(&sound, &PitchSettings::default());
        assert!(!track.times.is_empty());
        assert!(track.voiced_samples().is_empty());
    }

    #[test]
    fn minimum_ignores_unvoiced() {
        let track = PitchTrack {
            times: vec![0.01, 0.02, 0.03],
            frequencies: vec![0.0, 180.0, 120.0],
        };
        assert_eq!(track.minimum(), Some(120.0));
        assert_eq!(track.voiced_samples().len(), 2);
    }
}
