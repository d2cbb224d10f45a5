/// Runtime settings handed to every detector constructor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetectorConfig {
    /// Requested confidence threshold. Values outside `(0, 1]` fall back to
    /// the detector's own default.
    pub confidence_threshold: f32,
}

impl DetectorConfig {
    pub fn new(confidence_threshold: f32) -> Self {
        Self {
            confidence_threshold,
        }
    }

    /// Returns the configured threshold, or `default` when it is not in `(0, 1]`.
    pub fn threshold_or(&self, default: f32) -> f32 {
        let requested = self.confidence_threshold;
        if requested > 0.0 && requested <= 1.0 {
            requested
        } else {
            log::warn!(
                "Confidence threshold {requested} is outside (0, 1], using default {default}"
            );
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case::small(0.05)]
    #[case::typical(0.6)]
    #[case::upper_bound(1.0)]
    fn test_valid_threshold_is_kept(#[case] value: f32) {
        assert_relative_eq!(DetectorConfig::new(value).threshold_or(0.3), value);
    }

    #[rstest]
    #[case::zero(0.0)]
    #[case::negative(-0.5)]
    #[case::above_one(1.5)]
    #[case::nan(f32::NAN)]
    fn test_out_of_range_threshold_uses_default(#[case] value: f32) {
        assert_relative_eq!(DetectorConfig::new(value).threshold_or(0.3), 0.3);
    }
}
