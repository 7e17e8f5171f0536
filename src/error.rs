use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{source_name} unavailable: {reason}")]
    SourceUnavailable {
        source_name: &'static str,
        reason: String,
    },
}

impl AnalysisError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        AnalysisError::InvalidInput(msg.into())
    }

    pub fn unavailable(source_name: &'static str, reason: impl fmt::Display) -> Self {
        AnalysisError::SourceUnavailable {
            source_name,
            reason: reason.to_string(),
        }
    }
}

/// Columns had different lengths before "NA" padding.
///
/// Not fatal: padding still produces a rectangular table, but rows past the
/// shortest column may pair values from different frame windows.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("column lengths differ before padding (max {max_len}): {}", describe(.lengths))]
pub struct LengthMismatch {
    pub lengths: Vec<(&'static str, usize)>,
    pub max_len: usize,
}

impl LengthMismatch {
    /// Columns that were padded, with the number of "NA" cells appended.
    pub fn padded(&self) -> impl Iterator<Item = (&'static str, usize)> + '_ {
        self.lengths
            .iter()
            .filter(|(_, len)| *len < self.max_len)
            .map(|&(name, len)| (name, self.max_len - len))
    }
}

fn describe(lengths: &[(&'static str, usize)]) -> String {
    lengths
        .iter()
        .map(|(name, len)| format!("{}={}", name, len))
        .collect::<Vec<_>>()
        .join(", ")
}
