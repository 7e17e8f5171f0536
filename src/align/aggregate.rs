use std::ops::Range;

use super::window::FrameWindow;
use crate::acoustics::Sample;

/// Formatted values of one frame window.
#[derive(Clone, Debug, PartialEq)]
pub struct SeriesEntry {
    /// Index of the frame window the values were bucketed into
    pub frame: usize,
    pub text: String,
}

/// Per-window formatted values of one metric. Windows without samples have
/// no entry, so the series can be shorter than the window list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MetricSeries {
    pub entries: Vec<SeriesEntry>,
}

impl MetricSeries {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.text.as_str())
    }

    pub fn get(&self, frame: usize) -> Option<&str> {
        self.entries
            .binary_search_by_key(&frame, |e| e.frame)
            .ok()
            .map(|i| self.entries[i].text.as_str())
    }
}

/// Timestamp lookup over samples in arbitrary order.
struct SampleIndex<'a> {
    samples: &'a [Sample],
    /// Positions into `samples`, ascending by timestamp
    by_time: Vec<usize>,
}

impl<'a> SampleIndex<'a> {
    fn new(samples: &'a [Sample]) -> Self {
        let mut by_time: Vec<usize> = (0..samples.len())
            .filter(|&i| !samples[i].timestamp.is_nan())
            .collect();
        by_time.sort_by(|&a, &b| samples[a].timestamp.total_cmp(&samples[b].timestamp));
        Self { samples, by_time }
    }

    /// Slice of `by_time` whose timestamps lie in `[start, end]`.
    fn span(&self, window: &FrameWindow) -> Range<usize> {
        let ts = |i: usize| self.samples[i].timestamp;
        let lo = self.by_time.partition_point(|&i| ts(i) < window.start);
        let hi = self.by_time.partition_point(|&i| ts(i) <= window.end);
        lo..hi.max(lo)
    }

    /// Values inside the window, in the order the source supplied them.
    fn bucket(&self, window: &FrameWindow) -> Vec<f64> {
        let mut positions = self.by_time[self.span(window)].to_vec();
        positions.sort_unstable();
        positions.into_iter().map(|i| self.samples[i].value).collect()
    }
}

/// Bucket one metric's samples into the frame windows and format each
/// non-empty bucket. Windows with no samples are left out.
pub fn aggregate(windows: &[FrameWindow], samples: &[Sample]) -> MetricSeries {
    let index = SampleIndex::new(samples);
    let entries = windows
        .iter()
        .filter_map(|window| {
            let values = index.bucket(window);
            if values.is_empty() {
                None
            } else {
                Some(SeriesEntry {
                    frame: window.index,
                    text: format_values(&values),
                })
            }
        })
        .collect();
    MetricSeries { entries }
}

/// Pitch pass: the series plus the windows it covers, which serve as the
/// row identity for the whole table.
pub fn aggregate_pitch(
    windows: &[FrameWindow],
    samples: &[Sample],
) -> (MetricSeries, Vec<FrameWindow>) {
    let series = aggregate(windows, samples);
    let mut covered = series.entries.iter().map(|e| e.frame).peekable();
    let canonical = windows
        .iter()
        .filter(|w| covered.next_if_eq(&w.index).is_some())
        .copied()
        .collect();
    (series, canonical)
}

/// Comma-joined values rounded to 4 decimal places.
pub fn format_values(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| format!("{:.4}", v))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::window::build_windows;

    fn samples(pairs: &[(f64, f64)]) -> Vec<Sample> {
        pairs.iter().map(|&(t, v)| Sample::new(t, v)).collect()
    }

    #[test]
    fn omits_empty_windows() {
        let windows = build_windows(3, 10.0).unwrap();
        let series = aggregate(&windows, &samples(&[(0.05, 100.0), (0.15, 150.0)]));
        assert_eq!(series.texts().collect::<Vec<_>>(), vec!["100.0000", "150.0000"]);
        assert_eq!(series.entries[0].frame, 1);
        assert_eq!(series.entries[1].frame, 2);
        assert_eq!(series.get(3), None);
    }

    #[test]
    fn boundary_sample_lands_in_both_windows() {
        let windows = build_windows(3, 10.0).unwrap();
        let boundary = windows[0].end;
        let series = aggregate(&windows, &samples(&[(boundary, 42.0)]));
        assert_eq!(series.len(), 2);
        assert_eq!(series.get(1), Some("42.0000"));
        assert_eq!(series.get(2), Some("42.0000"));
    }

    #[test]
    fn keeps_encounter_order() {
        let windows = build_windows(1, 10.0).unwrap();
        let series = aggregate(
            &windows,
            &samples(&[(0.09, 3.0), (0.01, 1.123456), (0.05, -2.5), (0.02, 1000.0)]),
        );
        assert_eq!(series.get(1), Some("3.0000,1.1235,-2.5000,1000.0000"));
    }

    #[test]
    fn unsorted_input_buckets_correctly() {
        let windows = build_windows(3, 10.0).unwrap();
        let series = aggregate(
            &windows,
            &samples(&[(0.25, 3.0), (0.05, 1.0), (0.15, 2.0), (0.06, 1.5)]),
        );
        assert_eq!(
            series.texts().collect::<Vec<_>>(),
            vec!["1.0000,1.5000", "2.0000", "3.0000"]
        );
    }

    #[test]
    fn no_samples_gives_empty_series() {
        let windows = build_windows(5, 25.0).unwrap();
        assert!(aggregate(&windows, &[]).is_empty());
        let outside = samples(&[(10.0, 1.0), (-1.0, 2.0), (f64::NAN, 3.0)]);
        assert!(aggregate(&windows, &outside).is_empty());
    }

    #[test]
    fn nan_values_are_formatted() {
        let windows = build_windows(1, 10.0).unwrap();
        let series = aggregate(&windows, &samples(&[(0.05, f64::NAN), (0.06, 512.0)]));
        assert_eq!(series.get(1), Some("NaN,512.0000"));
    }

    #[test]
    fn aggregation_is_idempotent() {
        let windows = build_windows(30, 29.97).unwrap();
        let input: Vec<Sample> = (0..250)
            .map(|i| Sample::new(((i * 37) % 250) as f64 * 0.004, i as f64 * 1.5))
            .collect();
        assert_eq!(aggregate(&windows, &input), aggregate(&windows, &input));
    }

    #[test]
    fn pitch_pass_yields_canonical_frames() {
        let windows = build_windows(4, 10.0).unwrap();
        let (series, canonical) =
            aggregate_pitch(&windows, &samples(&[(0.05, 100.0), (0.35, 120.0)]));
        assert_eq!(series.len(), 2);
        assert_eq!(canonical, vec![windows[0], windows[3]]);
    }

    #[test]
    fn pitch_pass_over_no_windows() {
        let (series, canonical) = aggregate_pitch(&[], &samples(&[(0.05, 100.0)]));
        assert!(series.is_empty());
        assert!(canonical.is_empty());
    }
}
