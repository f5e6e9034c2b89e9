use opencv::core::Point2f;

/// Exponential smoothing of a landmark sequence.
///
/// Keeps a single previous sequence; each new sample is blended toward it with
/// `smoothed = previous * alpha + new * (1 - alpha)` per coordinate.
#[derive(Debug, Clone)]
pub struct LandmarkSmoother {
    alpha: f32,
    previous: Option<Vec<Point2f>>,
}

impl LandmarkSmoother {
    /// # Panics
    ///
    /// Panics if alpha is not in [0, 1)
    #[must_use]
    pub fn new(alpha: f32) -> Self {
        assert!((0.0..1.0).contains(&alpha), "Smoothing factor must be in [0, 1)");
        Self { alpha, previous: None }
    }

    /// Weight kept from the previous sample
    #[must_use]
    pub const fn alpha(&self) -> f32 {
        self.alpha
    }

    /// The retained sequence, if any sample has been seen
    #[must_use]
    pub fn previous(&self) -> Option<&[Point2f]> {
        self.previous.as_deref()
    }

    /// Smooth a new sample against the retained one.
    ///
    /// The first sample (or one whose length differs from the retained sequence)
    /// seeds the state and is returned unchanged.
    pub fn smooth(&mut self, landmarks: &[Point2f]) -> Vec<Point2f> {
        let smoothed: Vec<Point2f> = match &self.previous {
            Some(prev) if prev.len() == landmarks.len() => prev
                .iter()
                .zip(landmarks)
                .map(|(p, n)| {
                    Point2f::new(
                        p.x * self.alpha + n.x * (1.0 - self.alpha),
                        p.y * self.alpha + n.y * (1.0 - self.alpha),
                    )
                })
                .collect(),
            _ => landmarks.to_vec(),
        };

        self.previous = Some(smoothed.clone());
        smoothed
    }

    /// Forget the retained sequence; the next sample seeds again
    pub fn reset(&mut self) {
        self.previous = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cold_start_passes_through() {
        let mut smoother = LandmarkSmoother::new(0.7);
        let sample = vec![Point2f::new(100.0, 50.0), Point2f::new(3.0, 4.0)];
        assert_eq!(smoother.smooth(&sample), sample);
        assert_eq!(smoother.previous(), Some(sample.as_slice()));
    }

    #[test]
    fn test_warm_sample_is_blended() {
        let mut smoother = LandmarkSmoother::new(0.7);
        smoother.smooth(&[Point2f::new(100.0, 10.0)]);
        let out = smoother.smooth(&[Point2f::new(200.0, 20.0)]);
        assert!((out[0].x - 130.0).abs() < 1e-4); // 0.7 * 100 + 0.3 * 200
        assert!((out[0].y - 13.0).abs() < 1e-4);

        // Third sample blends against the smoothed value, not the raw one
        let out = smoother.smooth(&[Point2f::new(130.0, 13.0)]);
        assert!((out[0].x - 130.0).abs() < 1e-4);
    }

    #[test]
    fn test_length_change_reseeds() {
        let mut smoother = LandmarkSmoother::new(0.7);
        smoother.smooth(&[Point2f::new(0.0, 0.0)]);
        let sample = vec![Point2f::new(5.0, 5.0), Point2f::new(6.0, 6.0)];
        assert_eq!(smoother.smooth(&sample), sample);
    }

    #[test]
    fn test_reset_clears_state() {
        let mut smoother = LandmarkSmoother::new(0.5);
        smoother.smooth(&[Point2f::new(10.0, 10.0)]);
        smoother.reset();
        assert!(smoother.previous().is_none());
        assert_eq!(smoother.smooth(&[Point2f::new(20.0, 20.0)]), vec![Point2f::new(20.0, 20.0)]);
    }

    #[test]
    fn test_zero_alpha_tracks_input() {
        let mut smoother = LandmarkSmoother::new(0.0);
        smoother.smooth(&[Point2f::new(1.0, 1.0)]);
        assert_eq!(smoother.smooth(&[Point2f::new(9.0, 9.0)]), vec![Point2f::new(9.0, 9.0)]);
    }
}
