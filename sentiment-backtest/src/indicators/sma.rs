use common::AlignedBar;

/// Arithmetic mean, `None` for an empty input
pub fn simple_mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Trailing Simple Moving Average of closes
///
/// # Arguments
/// * `bars` - Aligned bars in date order
/// * `idx` - Current bar index
/// * `period` - Number of closes to average
///
/// # Returns
/// Mean of the `period` closes strictly before `idx` (bar `idx` itself is
/// excluded). `None` when `period` is zero or fewer than `period` bars precede
/// `idx`.
pub fn trailing_sma(bars: &[AlignedBar], idx: usize, period: usize) -> Option<f64> {
    if period == 0 || idx < period || idx > bars.len() {
        return None;
    }

    let closes: Vec<f64> = bars[idx - period..idx].iter().map(|b| b.close()).collect();
    simple_mean(&closes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::tests::series;
    use crate::signals::SignalAligner;

    fn aligned(closes: &[f64]) -> Vec<AlignedBar> {
        SignalAligner::align(&series(closes), &[]).bars
    }

    #[test]
    fn test_simple_mean() {
        assert_eq!(simple_mean(&[1.0, 2.0, 3.0]), Some(2.0));
        assert_eq!(simple_mean(&[]), None);
    }

    #[test]
    fn test_trailing_sma_excludes_current_bar() {
        let bars = aligned(&[1.0, 2.0, 3.0, 4.0, 100.0]);

        // (2+3+4)/3, the 100.0 at idx 4 is not included
        assert_eq!(trailing_sma(&bars, 4, 3), Some(3.0));
        assert_eq!(trailing_sma(&bars, 3, 3), Some(2.0));
    }

    #[test]
    fn test_trailing_sma_needs_full_window() {
        let bars = aligned(&[1.0, 2.0, 3.0]);

        assert_eq!(trailing_sma(&bars, 2, 3), None);
        assert_eq!(trailing_sma(&bars, 1, 0), None);
        assert_eq!(trailing_sma(&bars, 3, 3), Some(2.0));
    }
}
