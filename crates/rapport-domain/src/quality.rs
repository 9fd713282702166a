//! Composite parse-quality score

/// How well a recovery went, on three axes plus their mean
///
/// Every component is clamped into `[0, 1]`, so `overall` is always in
/// `[0, 1]` as well.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParseQuality {
    /// Fraction of the target type's expected fields that ended up non-empty
    pub completeness: f64,
    /// 1.0 minus a fixed penalty per field that is still effectively empty
    pub accuracy: f64,
    /// Step function of content length / collection size
    pub confidence: f64,
    /// Mean of the three components
    pub overall: f64,
}

impl ParseQuality {
    /// Build a quality score from its components
    ///
    /// Components are clamped into `[0, 1]` before the mean is taken.
    pub fn new(completeness: f64, accuracy: f64, confidence: f64) -> Self {
        let completeness = completeness.clamp(0.0, 1.0);
        let accuracy = accuracy.clamp(0.0, 1.0);
        let confidence = confidence.clamp(0.0, 1.0);
        Self {
            completeness,
            accuracy,
            confidence,
            overall: (completeness + accuracy + confidence) / 3.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_overall_is_mean() {
        let q = ParseQuality::new(1.0, 0.5, 0.0);
        assert!((q.overall - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_components_are_clamped() {
        let q = ParseQuality::new(-0.5, 1.5, 0.5);
        assert_eq!(q.completeness, 0.0);
        assert_eq!(q.accuracy, 1.0);
    }

    proptest! {
        #[test]
        fn prop_overall_in_unit_interval(
            c in -10.0f64..10.0,
            a in -10.0f64..10.0,
            f in -10.0f64..10.0,
        ) {
            let q = ParseQuality::new(c, a, f);
            prop_assert!(q.overall >= 0.0 && q.overall <= 1.0);
        }
    }
}
