//! Indicator trait definitions.

use crate::error::IndicatorError;

/// Trait for fixed-window indicators over a numeric series.
///
/// Output vectors are aligned to the end of the input: the first output
/// corresponds to input index `period() - 1`.
pub trait Indicator: Send + Sync {
    /// The output type of the indicator.
    type Output;

    /// Calculate indicator values for the given data.
    ///
    /// # Arguments
    /// * `data` - Input data (typically prices or amplitudes)
    ///
    /// # Returns
    /// A vector of indicator values, empty if `data` is shorter than the period
    fn calculate(&self, data: &[f64]) -> Vec<Self::Output>;

    /// Get the minimum data points required.
    fn period(&self) -> usize;

    /// Get the name of the indicator.
    fn name(&self) -> &str;

    /// Validate that there's enough data.
    fn validate_data(&self, data: &[f64]) -> Result<(), IndicatorError> {
        if data.len() < self.period() {
            return Err(IndicatorError::InsufficientData {
                required: self.period(),
                available: data.len(),
            });
        }
        Ok(())
    }

    /// Calculate and pad the front with `None` so the result has one
    /// entry per input value.
    fn calculate_aligned(&self, data: &[f64]) -> Vec<Option<Self::Output>> {
        let values = self.calculate(data);
        let pad = data.len() - values.len();
        std::iter::repeat_with(|| None)
            .take(pad)
            .chain(values.into_iter().map(Some))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestIndicator {
        period: usize,
    }

    impl Indicator for TestIndicator {
        type Output = f64;

        fn calculate(&self, data: &[f64]) -> Vec<f64> {
            if data.len() < self.period {
                return vec![];
            }
            // Simple sum indicator for testing
            data.windows(self.period).map(|w| w.iter().sum()).collect()
        }

        fn period(&self) -> usize {
            self.period
        }

        fn name(&self) -> &str {
            "test"
        }
    }

    #[test]
    fn test_indicator_validation() {
        let indicator = TestIndicator { period: 5 };

        assert!(indicator.validate_data(&[1.0, 2.0, 3.0]).is_err());
        assert!(indicator.validate_data(&[1.0, 2.0, 3.0, 4.0, 5.0]).is_ok());
    }

    #[test]
    fn test_calculate_aligned_pads_front() {
        let indicator = TestIndicator { period: 3 };
        let aligned = indicator.calculate_aligned(&[1.0, 2.0, 3.0, 4.0]);

        assert_eq!(aligned.len(), 4);
        assert_eq!(aligned[0], None);
        assert_eq!(aligned[1], None);
        assert_eq!(aligned[2], Some(6.0));
        assert_eq!(aligned[3], Some(9.0));

        let short = indicator.calculate_aligned(&[1.0]);
        assert_eq!(short, vec![None]);
    }
}
