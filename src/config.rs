use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::align::Alignment;
use crate::error::AnalysisError;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pitch: PitchSettings,
    #[serde(default)]
    pub intensity: IntensitySettings,
    #[serde(default)]
    pub harmonicity: HarmonicitySettings,
    #[serde(default)]
    pub formant: FormantSettings,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    pub fn analysis(&self) -> AnalysisSettings {
        AnalysisSettings {
            pitch: self.pitch.clone(),
            intensity: self.intensity.clone(),
            harmonicity: self.harmonicity.clone(),
            formant: self.formant.clone(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct AnalysisSettings {
    pub pitch: PitchSettings,
    pub intensity: IntensitySettings,
    pub harmonicity: HarmonicitySettings,
    pub formant: FormantSettings,
}

impl AnalysisSettings {
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let positive = |name: &str, v: f64| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(AnalysisError::invalid(format!("{} must be positive, got {}", name, v)))
            }
        };
        positive("pitch floor", self.pitch.floor)?;
        positive("pitch ceiling", self.pitch.ceiling)?;
        if self.pitch.ceiling <= self.pitch.floor {
            return Err(AnalysisError::invalid(format!(
                "pitch ceiling ({}) must be above pitch floor ({})",
                self.pitch.ceiling, self.pitch.floor
            )));
        }
        positive("intensity minimum pitch", self.intensity.min_pitch)?;
        positive("harmonicity time step", self.harmonicity.time_step)?;
        positive("harmonicity periods per window", self.harmonicity.periods_per_window)?;
        positive("formant ceiling", self.formant.max_formant_hz)?;
        positive("formant window length", self.formant.window_length)?;
        if self.formant.max_formants == 0 {
            return Err(AnalysisError::invalid("at least one formant must be tracked"));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct PitchSettings {
    #[serde(default = "default_pitch_floor")]
    pub floor: f64,
    #[serde(default = "default_pitch_ceiling")]
    pub ceiling: f64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct IntensitySettings {
    #[serde(default = "default_intensity_min_pitch")]
    pub min_pitch: f64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct HarmonicitySettings {
    #[serde(default = "default_harmonicity_time_step")]
    pub time_step: f64,
    #[serde(default = "default_silence_threshold")]
    pub silence_threshold: f64,
    #[serde(default = "default_periods_per_window")]
    pub periods_per_window: f64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct FormantSettings {
    /// 0 picks a quarter of the window length
    #[serde(default)]
    pub time_step: f64,
    #[serde(default = "default_max_formants")]
    pub max_formants: u32,
    #[serde(default = "default_max_formant_hz")]
    pub max_formant_hz: f64,
    #[serde(default = "default_window_length")]
    pub window_length: f64,
    #[serde(default = "default_pre_emphasis_from")]
    pub pre_emphasis_from: f64,
}

#[derive(Debug, Deserialize)]
pub struct AudioConfig {
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    #[serde(default)]
    pub alignment: Alignment,
}

impl Default for PitchSettings {
    fn default() -> Self {
        Self {
            floor: default_pitch_floor(),
            ceiling: default_pitch_ceiling(),
        }
    }
}

impl Default for IntensitySettings {
    fn default() -> Self {
        Self {
            min_pitch: default_intensity_min_pitch(),
        }
    }
}

impl Default for HarmonicitySettings {
    fn default() -> Self {
        Self {
            time_step: default_harmonicity_time_step(),
            silence_threshold: default_silence_threshold(),
            periods_per_window: default_periods_per_window(),
        }
    }
}

impl Default for FormantSettings {
    fn default() -> Self {
        Self {
            time_step: 0.0,
            max_formants: default_max_formants(),
            max_formant_hz: default_max_formant_hz(),
            window_length: default_window_length(),
            pre_emphasis_from: default_pre_emphasis_from(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            alignment: Alignment::default(),
        }
    }
}

fn default_pitch_floor() -> f64 { 75.0 }
fn default_pitch_ceiling() -> f64 { 600.0 }
fn default_intensity_min_pitch() -> f64 { 100.0 }
fn default_harmonicity_time_step() -> f64 { 0.01 }
fn default_silence_threshold() -> f64 { 0.1 }
fn default_periods_per_window() -> f64 { 1.0 }
fn default_max_formants() -> u32 { 5 }
fn default_max_formant_hz() -> f64 { 5500.0 }
fn default_window_length() -> f64 { 0.025 }
fn default_pre_emphasis_from() -> f64 { 50.0 }
fn default_sample_rate() -> u32 { 44100 }
fn default_delimiter() -> char { ',' }

/// Explicit path first, then `./speech-analysis.toml`, then the user config dirs.
pub fn find_config(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let local = PathBuf::from("speech-analysis.toml");
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join("speech-analysis").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("speech-analysis").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}

pub fn load_config(path: &Path) -> Option<Config> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(err) => {
            log::debug!("Config parse error in {}: {}", path.display(), err);
            None
        }
    }
}
