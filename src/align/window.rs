use crate::error::AnalysisError;

/// Time interval attributed to one video frame, closed on both ends.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameWindow {
    /// 1-based frame number
    pub index: usize,
    pub start: f64,
    pub end: f64,
}

impl FrameWindow {
    /// Inclusive on both ends: a timestamp equal to a shared boundary
    /// belongs to both neighbouring windows.
    #[inline]
    pub fn contains(&self, t: f64) -> bool {
        self.start <= t && t <= self.end
    }
}

/// Build one window per video frame. Window `i` ends at `i / fps` and starts
/// where window `i - 1` ended (0 for the first frame).
pub fn build_windows(frame_count: i64, fps: f64) -> Result<Vec<FrameWindow>, AnalysisError> {
    if !fps.is_finite() || fps <= 0.0 {
        return Err(AnalysisError::invalid(format!(
            "frame rate must be a positive number, got {}",
            fps
        )));
    }
    if frame_count < 0 {
        return Err(AnalysisError::invalid(format!(
            "frame count must not be negative, got {}",
            frame_count
        )));
    }

    let too_many = || AnalysisError::invalid(format!("frame count too large: {}", frame_count));
    let n = usize::try_from(frame_count).map_err(|_| too_many())?;
    let mut windows = Vec::new();
    windows.try_reserve_exact(n).map_err(|_| too_many())?;
    let mut start = 0.0;
    for index in 1..=n {
        let end = index as f64 / fps;
        windows.push(FrameWindow { index, start, end });
        start = end;
    }
    Ok(windows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_fps_three_frames() {
        let windows = build_windows(3, 10.0).unwrap();
        assert_eq!(windows.len(), 3);
        assert_eq!(windows[0], FrameWindow { index: 1, start: 0.0, end: 0.1 });
        assert_eq!(windows[1], FrameWindow { index: 2, start: 0.1, end: 0.2 });
        assert_eq!(windows[2].start, 0.2);
        assert_eq!(windows[2].end, 3.0 / 10.0);
    }

    #[test]
    fn contiguous_and_ordered() {
        for &(n, fps) in &[(1i64, 1.0), (10, 29.97), (250, 25.0), (97, 59.94), (1000, 23.976)] {
            let windows = build_windows(n, fps).unwrap();
            assert_eq!(windows.len(), n as usize);
            assert_eq!(windows[0].start, 0.0);
            assert_eq!(windows.last().unwrap().end, n as f64 / fps);
            for pair in windows.windows(2) {
                assert_eq!(pair[1].index, pair[0].index + 1);
                assert_eq!(pair[1].start, pair[0].end);
                assert!(pair[1].end > pair[1].start);
            }
        }
    }

    #[test]
    fn ntsc_timestamps() {
        let windows = build_windows(10, 29.97).unwrap();
        assert_eq!(windows[0].end, 1.0 / 29.97);
        assert_eq!(windows[9].start, 9.0 / 29.97);
        assert_eq!(windows[9].end, 10.0 / 29.97);
    }

    #[test]
    fn zero_frames_is_empty() {
        assert!(build_windows(0, 30.0).unwrap().is_empty());
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(build_windows(3, 0.0), Err(AnalysisError::InvalidInput(_))));
        assert!(matches!(build_windows(3, -25.0), Err(AnalysisError::InvalidInput(_))));
        assert!(matches!(build_windows(3, f64::NAN), Err(AnalysisError::InvalidInput(_))));
        assert!(matches!(build_windows(-1, 30.0), Err(AnalysisError::InvalidInput(_))));
    }

    #[test]
    fn absurd_frame_count_is_an_error() {
        assert!(matches!(build_windows(i64::MAX, 30.0), Err(AnalysisError::InvalidInput(_))));
    }

    #[test]
    fn boundary_belongs_to_both_neighbours() {
        let windows = build_windows(2, 10.0).unwrap();
        let boundary = windows[0].end;
        assert!(windows[0].contains(boundary));
        assert!(windows[1].contains(boundary));
    }
}
