//! Frame-window alignment: bucket each acoustic stream into video frame
//! windows and bind the results into one rectangular table.

pub mod aggregate;
pub mod reconcile;
pub mod table;
pub mod window;

use rayon::prelude::*;
use serde::Deserialize;

use crate::acoustics::{AcousticSource, Metric};
use crate::error::{AnalysisError, LengthMismatch};
use aggregate::MetricSeries;
use table::Table;
use window::FrameWindow;

/// How metric series are bound into rows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Alignment {
    /// Bind series by position and pad short ones with "NA" at the end.
    /// Rows past a column's first gap can pair values from different frames.
    #[default]
    Positional,
    /// One row per pitch frame; other metrics are looked up by frame index.
    ByFrame,
}

#[derive(Debug)]
pub struct AlignedTable {
    pub table: Table,
    /// Frames with at least one pitch sample
    pub canonical: Vec<FrameWindow>,
    pub mismatch: Option<LengthMismatch>,
    /// By-frame only: values per metric that fell in frames without pitch
    pub dropped: Vec<(&'static str, usize)>,
}

/// Aggregate every metric against the frame windows and assemble the table.
pub fn build_table<S>(
    windows: &[FrameWindow],
    source: &S,
    alignment: Alignment,
) -> Result<AlignedTable, AnalysisError>
where
    S: AcousticSource + Sync,
{
    let (pitch, others) = rayon::join(
        || -> Result<_, AnalysisError> {
            Ok(aggregate::aggregate_pitch(windows, source.samples(Metric::Pitch)?))
        },
        || {
            Metric::ALL[1..]
                .par_iter()
                .map(|&metric| {
                    let samples = source.samples(metric)?;
                    Ok((metric, aggregate::aggregate(windows, samples)))
                })
                .collect::<Result<Vec<_>, AnalysisError>>()
        },
    );
    let (pitch, canonical) = pitch?;
    let mut series: Vec<(Metric, MetricSeries)> = vec![(Metric::Pitch, pitch)];
    series.extend(others?);

    for (metric, s) in &series {
        log::debug!("{}: {} of {} windows non-empty", metric.column(), s.len(), windows.len());
    }

    let (table, mismatch, dropped) = match alignment {
        Alignment::Positional => {
            let (table, mismatch) = table::assemble_positional(&canonical, &series);
            (table, mismatch, Vec::new())
        }
        Alignment::ByFrame => {
            let dropped = table::unmatched(&canonical, &series);
            for (name, count) in &dropped {
                log::warn!("{}: {} value cell(s) in frames without pitch were dropped", name, count);
            }
            (table::assemble_by_frame(&canonical, &series), None, dropped)
        }
    };

    if let Some(ref mismatch) = mismatch {
        log::warn!("{}", mismatch);
        for (name, padded) in mismatch.padded() {
            log::warn!("  {}: padded with {} NA cell(s)", name, padded);
        }
    }

    Ok(AlignedTable {
        table,
        canonical,
        mismatch,
        dropped,
    })
}
