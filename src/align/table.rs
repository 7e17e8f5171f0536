use super::aggregate::MetricSeries;
use super::reconcile::{reconcile, Column, NA};
use super::window::FrameWindow;
use crate::acoustics::Metric;
use crate::error::LengthMismatch;

/// Column-major table of formatted cells; every column has the same length.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<Column>,
}

impl Table {
    pub fn headers(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|c| c.name)
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    pub fn rows(&self) -> impl Iterator<Item = Vec<&str>> + '_ {
        (0..self.row_count()).map(move |r| {
            self.columns.iter().map(|c| c.values[r].as_str()).collect()
        })
    }

    pub fn column(&self, name: &str) -> Option<&[String]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }
}

fn identity_columns(canonical: &[FrameWindow]) -> [Column; 3] {
    [
        Column::new("Frame", canonical.iter().map(|w| w.index.to_string()).collect()),
        Column::new("Start", canonical.iter().map(|w| format!("{:.4}", w.start)).collect()),
        Column::new("End", canonical.iter().map(|w| format!("{:.4}", w.end)).collect()),
    ]
}

/// Bind the identity triples and metric series by position, padding short
/// columns with "NA" at the end.
pub fn assemble_positional(
    canonical: &[FrameWindow],
    series: &[(Metric, MetricSeries)],
) -> (Table, Option<LengthMismatch>) {
    let mut columns: Vec<Column> = identity_columns(canonical).into();
    columns.extend(
        series
            .iter()
            .map(|(metric, s)| Column::new(metric.column(), s.texts().map(String::from).collect())),
    );
    let (columns, mismatch) = reconcile(columns);
    (Table { columns }, mismatch)
}

/// One row per canonical frame; every metric is looked up by window index,
/// so a cell is "NA" exactly when that metric had no sample in that window.
pub fn assemble_by_frame(canonical: &[FrameWindow], series: &[(Metric, MetricSeries)]) -> Table {
    let mut columns: Vec<Column> = identity_columns(canonical).into();
    columns.extend(series.iter().map(|(metric, s)| {
        Column::new(
            metric.column(),
            canonical
                .iter()
                .map(|w| s.get(w.index).unwrap_or(NA).to_string())
                .collect(),
        )
    }));
    Table { columns }
}

/// Per metric, how many non-empty windows fall outside the canonical frames.
/// Those values have no row under by-frame assembly. Metrics with none are
/// left out.
pub fn unmatched(canonical: &[FrameWindow], series: &[(Metric, MetricSeries)]) -> Vec<(&'static str, usize)> {
    series
        .iter()
        .filter_map(|(metric, s)| {
            let matched = canonical.iter().filter(|w| s.get(w.index).is_some()).count();
            let dropped = s.len() - matched;
            (dropped > 0).then_some((metric.column(), dropped))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::aggregate::aggregate_pitch;
    use crate::align::aggregate::SeriesEntry;
    use crate::align::window::build_windows;
    use crate::acoustics::Sample;

    fn series(entries: &[(usize, &str)]) -> MetricSeries {
        MetricSeries {
            entries: entries
                .iter()
                .map(|&(frame, text)| SeriesEntry { frame, text: text.to_string() })
                .collect(),
        }
    }

    #[test]
    fn positional_binding() {
        let windows = build_windows(3, 10.0).unwrap();
        let (pitch, canonical) =
            aggregate_pitch(&windows, &[Sample::new(0.05, 100.0), Sample::new(0.15, 150.0)]);
        let (table, mismatch) = assemble_positional(
            &canonical,
            &[(Metric::Pitch, pitch), (Metric::Intensity, series(&[(3, "50.0000")]))],
        );
        assert_eq!(
            table.headers().collect::<Vec<_>>(),
            vec!["Frame", "Start", "End", "Pitches", "Intensities"]
        );
        assert_eq!(table.row_count(), 2);
        let rows: Vec<Vec<&str>> = table.rows().collect();
        assert_eq!(rows[0], vec!["1", "0.0000", "0.1000", "100.0000", "50.0000"]);
        assert_eq!(rows[1], vec!["2", "0.1000", "0.2000", "150.0000", "NA"]);
        assert!(mismatch.is_some());
    }

    #[test]
    fn by_frame_binding_looks_up_index() {
        let windows = build_windows(3, 10.0).unwrap();
        let canonical = vec![windows[0], windows[1]];
        let table = assemble_by_frame(
            &canonical,
            &[
                (Metric::Pitch, series(&[(1, "100.0000"), (2, "150.0000")])),
                (Metric::Intensity, series(&[(3, "50.0000")])),
                (Metric::Harmonicity, series(&[(2, "12.5000")])),
            ],
        );
        assert_eq!(table.column("Intensities").unwrap(), &["NA", "NA"]);
        assert_eq!(table.column("Harmonicities").unwrap(), &["NA", "12.5000"]);
        assert_eq!(table.column("Frame").unwrap(), &["1", "2"]);
    }

    #[test]
    fn unmatched_counts_values_without_a_row() {
        let windows = build_windows(3, 10.0).unwrap();
        let canonical = vec![windows[1]];
        let dropped = unmatched(
            &canonical,
            &[
                (Metric::Pitch, series(&[(2, "100.0000")])),
                (Metric::Intensity, series(&[(1, "a"), (2, "b"), (3, "c")])),
                (Metric::Harmonicity, series(&[(2, "h")])),
            ],
        );
        assert_eq!(dropped, vec![("Intensities", 2)]);
    }

    #[test]
    fn identity_is_padded_when_a_metric_is_longer() {
        let windows = build_windows(3, 10.0).unwrap();
        let canonical = vec![windows[1]];
        let (table, _) = assemble_positional(
            &canonical,
            &[
                (Metric::Pitch, series(&[(2, "100.0000")])),
                (Metric::Intensity, series(&[(1, "a"), (2, "b"), (3, "c")])),
            ],
        );
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.column("Frame").unwrap(), &["2", "NA", "NA"]);
        assert_eq!(table.column("Pitches").unwrap(), &["100.0000", "NA", "NA"]);
    }

    #[test]
    fn empty_table() {
        let table = Table::default();
        assert_eq!(table.row_count(), 0);
        assert_eq!(table.rows().count(), 0);
    }
}
