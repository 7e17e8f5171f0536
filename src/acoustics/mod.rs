pub mod formant;
pub mod frames;
pub mod harmonicity;
pub mod intensity;
pub mod pitch;

use indicatif::ProgressBar;

use crate::audio::decode::AudioData;
use crate::config::AnalysisSettings;
use crate::error::AnalysisError;

/// One measurement of a metric at an analysis frame of the acoustic source.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    pub timestamp: f64,
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp: f64, value: f64) -> Self {
        Self { timestamp, value }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Metric {
    Pitch,
    Intensity,
    Harmonicity,
    Formant1,
    Formant2,
    Formant3,
    Formant4,
}

impl Metric {
    /// Output column order.
    pub const ALL: [Metric; 7] = [
        Metric::Pitch,
        Metric::Intensity,
        Metric::Harmonicity,
        Metric::Formant1,
        Metric::Formant2,
        Metric::Formant3,
        Metric::Formant4,
    ];

    pub fn column(self) -> &'static str {
        match self {
            Metric::Pitch => "Pitches",
            Metric::Intensity => "Intensities",
            Metric::Harmonicity => "Harmonicities",
            Metric::Formant1 => "Formant 1",
            Metric::Formant2 => "Formant 2",
            Metric::Formant3 => "Formant 3",
            Metric::Formant4 => "Formant 4",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

/// Supplies the independently sampled (timestamp, value) stream of each metric.
pub trait AcousticSource {
    fn samples(&self, metric: Metric) -> Result<&[Sample], AnalysisError>;
}

/// Owned streams for every metric.
#[derive(Clone, Debug, Default)]
pub struct MetricStreams {
    streams: [Vec<Sample>; 7],
}

impl MetricStreams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, metric: Metric, samples: Vec<Sample>) -> Self {
        self.set(metric, samples);
        self
    }

    pub fn set(&mut self, metric: Metric, samples: Vec<Sample>) {
        self.streams[metric.slot()] = samples;
    }

    pub fn get(&self, metric: Metric) -> &[Sample] {
        &self.streams[metric.slot()]
    }
}

impl AcousticSource for MetricStreams {
    fn samples(&self, metric: Metric) -> Result<&[Sample], AnalysisError> {
        Ok(self.get(metric))
    }
}

/// Mono signal in f64 used by every analysis.
#[derive(Clone, Debug)]
pub struct Sound {
    pub samples: Vec<f64>,
    pub sample_rate: f64,
}

impl Sound {
    pub fn new(samples: Vec<f64>, sample_rate: f64) -> Self {
        Self { samples, sample_rate }
    }

    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate
    }

    pub fn peak(&self) -> f64 {
        self.samples.iter().fold(0.0f64, |m, s| m.max(s.abs()))
    }
}

impl From<&AudioData> for Sound {
    fn from(audio: &AudioData) -> Self {
        Sound {
            samples: audio.samples.iter().map(|&s| s as f64).collect(),
            sample_rate: audio.sample_rate as f64,
        }
    }
}

/// Run the four analyses and collect one stream per metric.
pub fn analyze(
    sound: &Sound,
    settings: &AnalysisSettings,
    progress: &ProgressBar,
) -> Result<MetricStreams, AnalysisError> {
    settings.validate()?;
    if sound.sample_rate <= 0.0 {
        return Err(AnalysisError::unavailable("audio", "sample rate is zero"));
    }

    let mut streams = MetricStreams::new();

    progress.set_message("pitch");
    let pitch = pitch::to_pitch(sound, &settings.pitch);
    streams.set(Metric::Pitch, pitch.voiced_samples());
    progress.inc(1);

    progress.set_message("intensity");
    let intensity = intensity::to_intensity(sound, &settings.intensity);
    streams.set(Metric::Intensity, intensity);
    progress.inc(1);

    progress.set_message("harmonicity");
    let min_pitch = pitch.minimum().unwrap_or(settings.pitch.floor);
    log::debug!("Harmonicity minimum pitch: {:.2} Hz", min_pitch);
    let harmonicity = harmonicity::to_harmonicity_cc(sound, min_pitch, &settings.harmonicity);
    streams.set(Metric::Harmonicity, harmonicity);
    progress.inc(1);

    progress.set_message("formants");
    let formants = formant::to_formant_burg(sound, &settings.formant)?;
    let [f1, f2, f3, f4] = formants.into_streams();
    streams.set(Metric::Formant1, f1);
    streams.set(Metric::Formant2, f2);
    streams.set(Metric::Formant3, f3);
    streams.set(Metric::Formant4, f4);
    progress.inc(1);

    for metric in Metric::ALL {
        log::debug!("{}: {} samples", metric.column(), streams.get(metric).len());
    }

    Ok(streams)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn streams_are_kept_per_metric() {
        let streams = MetricStreams::new()
            .with(Metric::Pitch, vec![Sample::new(0.05, 100.0)])
            .with(Metric::Formant3, vec![Sample::new(0.1, 2500.0), Sample::new(0.2, 2600.0)]);
        assert_eq!(streams.samples(Metric::Pitch).unwrap().len(), 1);
        assert_eq!(streams.samples(Metric::Formant3).unwrap().len(), 2);
        assert!(streams.samples(Metric::Intensity).unwrap().is_empty());
    }

    #[test]
    fn column_names_in_table_order() {
        let names: Vec<_> = Metric::ALL.iter().map(|m| m.column()).collect();
        assert_eq!(
            names,
            vec![
                "Pitches",
                "Intensities",
                "Harmonicities",
                "Formant 1",
                "Formant 2",
                "Formant 3",
                "Formant 4"
            ]
        );
    }

    #[test]
    fn analyze_synthetic_vowel() {
        let sr = 16000.0;
        let samples: Vec<f64> = (0..16000)
            .map(|i| {
                let t = i as f64 / sr;
                0.5 * (2.0 * std::f64::consts::PI * 150.0 * t).sin()
                    + 0.2 * (2.0 * std::f64::consts::PI * 300.0 * t).sin()
            })
            .collect();
        let sound = Sound::new(samples, sr);
        let settings = AnalysisSettings::default();
        let streams = analyze(&sound, &settings, &ProgressBar::hidden()).unwrap();

        assert!(!streams.get(Metric::Pitch).is_empty());
        assert!(!streams.get(Metric::Intensity).is_empty());
        assert!(!streams.get(Metric::Harmonicity).is_empty());
        let f1 = streams.get(Metric::Formant1).len();
        assert!(f1 > 0);
        assert_eq!(streams.get(Metric::Formant4).len(), f1);
        for s in streams.get(Metric::Pitch) {
            assert!(s.value > 0.0);
            assert!(s.timestamp >= 0.0 && s.timestamp <= sound.duration());
        }
    }
}
