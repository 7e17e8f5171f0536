use rayon::prelude::*;
use rustfft::num_complex::Complex;
use std::f64::consts::PI;

use super::frames::{self, FrameGrid};
use super::{Sample, Sound};
use crate::config::FormantSettings;
use crate::error::AnalysisError;

/// Formants closer than this to 0 Hz or to the ceiling are discarded.
const EDGE_MARGIN_HZ: f64 = 50.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FormantCandidate {
    pub frequency: f64,
    pub bandwidth: f64,
}

#[derive(Clone, Debug, Default)]
pub struct FormantTrack {
    pub times: Vec<f64>,
    /// Candidates per frame, ascending by frequency
    pub frames: Vec<Vec<FormantCandidate>>,
}

impl FormantTrack {
    /// F1..F4 as separate streams; `NaN` where a frame has fewer formants.
    pub fn into_streams(self) -> [Vec<Sample>; 4] {
        let mut streams: [Vec<Sample>; 4] = Default::default();
        for (time, candidates) in self.times.iter().zip(&self.frames) {
            for (n, stream) in streams.iter_mut().enumerate() {
                let value = candidates.get(n).map_or(f64::NAN, |c| c.frequency);
                stream.push(Sample::new(*time, value));
            }
        }
        streams
    }
}

/// Burg LPC formant analysis.
pub fn to_formant_burg(sound: &Sound, settings: &FormantSettings) -> Result<FormantTrack, AnalysisError> {
    let target_rate = 2.0 * settings.max_formant_hz;
    let mut samples = if sound.sample_rate > target_rate {
        resample(&sound.samples, sound.sample_rate, target_rate)?
    } else {
        sound.samples.clone()
    };
    let sr = sound.sample_rate.min(target_rate);
    pre_emphasize(&mut samples, sr, settings.pre_emphasis_from);

    let physical_window = 2.0 * settings.window_length;
    let step = if settings.time_step > 0.0 {
        settings.time_step
    } else {
        settings.window_length / 4.0
    };
    let duration = samples.len() as f64 / sr;
    let Some(grid) = FrameGrid::new(duration, physical_window, step) else {
        return Ok(FormantTrack::default());
    };

    let window_len = ((physical_window * sr).round() as usize).max(2);
    let gauss = frames::gaussian_window(window_len);
    let order = 2 * settings.max_formants as usize;
    let ceiling = settings.max_formant_hz;

    let frames: Vec<Vec<FormantCandidate>> = (0..grid.count)
        .into_par_iter()
        .map(|frame| {
            let segment = frames::centered_segment(&samples, sr, grid.time(frame), window_len);
            let windowed: Vec<f64> = segment.iter().zip(&gauss).map(|(s, w)| s * w).collect();
            match burg(&windowed, order) {
                Some(lpc) => candidates_from_lpc(&lpc, sr, ceiling),
                None => Vec::new(),
            }
        })
        .collect();

    let times = (0..grid.count).map(|i| grid.time(i)).collect();
    Ok(FormantTrack { times, frames })
}

fn resample(samples: &[f64], from_rate: f64, to_rate: f64) -> Result<Vec<f64>, AnalysisError> {
    use rubato::{Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction};

    if samples.is_empty() {
        return Ok(Vec::new());
    }

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let ratio = to_rate / from_rate;
    // Zero tail so the filter delay does not cut off the end of the signal.
    let mut padded = samples.to_vec();
    padded.resize(samples.len() + params.sinc_len, 0.0);

    let mut resampler = SincFixedIn::<f64>::new(ratio, 2.0, params, padded.len(), 1)
        .map_err(|e| AnalysisError::unavailable("resampler", e))?;
    let delay = resampler.output_delay();

    let input = vec![padded];
    let output = resampler
        .process(&input, None)
        .map_err(|e| AnalysisError::unavailable("resampler", e))?;

    let expected = (samples.len() as f64 * ratio).round() as usize;
    Ok(output
        .into_iter()
        .next()
        .unwrap_or_default()
        .into_iter()
        .skip(delay)
        .take(expected)
        .collect())
}

/// First-order high-pass boosting frequencies above `from_hz`, applied in place.
fn pre_emphasize(samples: &mut [f64], sample_rate: f64, from_hz: f64) {
    let alpha = (-2.0 * PI * from_hz / sample_rate).exp();
    for i in (1..samples.len()).rev() {
        samples[i] -= alpha * samples[i - 1];
    }
}

/// Burg's method. Returns `a[0..=order]` with `a[0] = 1` for the inverse
/// filter `A(z) = 1 + a1 z^-1 + ... + ap z^-p`, or `None` for a silent frame.
fn burg(x: &[f64], order: usize) -> Option<Vec<f64>> {
    if x.len() <= order || x.iter().all(|&s| s == 0.0) {
        return None;
    }

    let mut a = vec![0.0; order + 1];
    a[0] = 1.0;
    // forward error f_m[n] paired with backward error b_m[n - 1]
    let mut f: Vec<f64> = x[1..].to_vec();
    let mut b: Vec<f64> = x[..x.len() - 1].to_vec();

    for m in 0..order {
        let (num, den) = f
            .iter()
            .zip(&b)
            .fold((0.0, 0.0), |(n, d), (fi, bi)| (n + fi * bi, d + fi * fi + bi * bi));
        if den <= 0.0 {
            break;
        }
        let k = -2.0 * num / den;

        let prev = a.clone();
        for j in 1..=m + 1 {
            a[j] = prev[j] + k * prev[m + 1 - j];
        }

        let next_f: Vec<f64> = f.iter().zip(&b).map(|(fi, bi)| fi + k * bi).collect();
        let next_b: Vec<f64> = f.iter().zip(&b).map(|(fi, bi)| bi + k * fi).collect();
        if next_f.len() < 2 {
            break;
        }
        f = next_f[1..].to_vec();
        b = next_b[..next_b.len() - 1].to_vec();
    }

    Some(a)
}

fn candidates_from_lpc(lpc: &[f64], sample_rate: f64, ceiling: f64) -> Vec<FormantCandidate> {
    let nyquist = sample_rate / 2.0;
    let mut candidates: Vec<FormantCandidate> = polynomial_roots(lpc)
        .into_iter()
        .filter(|z| z.im > 0.0)
        .map(|z| {
            // reflect unstable roots into the unit circle
            let z = if z.norm() > 1.0 { 1.0 / z.conj() } else { z };
            FormantCandidate {
                frequency: z.arg() * nyquist / PI,
                bandwidth: -z.norm().ln() * sample_rate / PI,
            }
        })
        .filter(|c| c.frequency > EDGE_MARGIN_HZ && c.frequency < ceiling - EDGE_MARGIN_HZ)
        .collect();
    candidates.sort_by(|a, b| a.frequency.total_cmp(&b.frequency));
    candidates
}

/// Roots of the monic polynomial `c[0] z^n + c[1] z^(n-1) + ... + c[n]`
/// by Durand-Kerner iteration.
fn polynomial_roots(coeffs: &[f64]) -> Vec<Complex<f64>> {
    let degree = coeffs.len().saturating_sub(1);
    if degree == 0 || coeffs[0] == 0.0 {
        return Vec::new();
    }
    let lead = coeffs[0];
    let eval = |z: Complex<f64>| {
        coeffs
            .iter()
            .fold(Complex::new(0.0, 0.0), |acc, &c| acc * z + c / lead)
    };

    let seed = Complex::new(0.4, 0.9);
    let mut roots: Vec<Complex<f64>> = (0..degree).map(|k| seed.powu(k as u32)).collect();

    for _ in 0..500 {
        let mut max_step = 0.0f64;
        for i in 0..degree {
            let zi = roots[i];
            let denom = roots
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .fold(Complex::new(1.0, 0.0), |acc, (_, &zj)| acc * (zi - zj));
            if denom.norm() == 0.0 {
                continue;
            }
            let step = eval(zi) / denom;
            roots[i] = zi - step;
            max_step = max_step.max(step.norm());
        }
        if max_step < 1e-12 {
            break;
        }
    }
    roots
}
