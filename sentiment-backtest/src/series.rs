use chrono::NaiveDate;
use common::{BacktestError, PriceBar, RawCandle, Result};

/// Immutable, strictly date-ascending sequence of daily bars
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Validate every bar and the ordering of the whole sequence.
    ///
    /// Dates must be strictly ascending; a duplicate or out-of-order date is a
    /// `DataIntegrity` error, as is any bar failing its own bounds check.
    pub fn new(bars: Vec<PriceBar>) -> Result<Self> {
        for bar in &bars {
            bar.validate()?;
        }

        for pair in bars.windows(2) {
            let (prev, curr) = (&pair[0], &pair[1]);
            if curr.date == prev.date {
                return Err(BacktestError::DataIntegrity(format!(
                    "duplicate bar for {}",
                    curr.date
                )));
            }
            if curr.date < prev.date {
                return Err(BacktestError::DataIntegrity(format!(
                    "bars out of order: {} follows {}",
                    curr.date, prev.date
                )));
            }
        }

        Ok(Self { bars })
    }

    /// Convert raw exchange candles, in the order given.
    pub fn from_candles(candles: Vec<RawCandle>) -> Result<Self> {
        let bars = candles
            .into_iter()
            .map(PriceBar::try_from)
            .collect::<Result<Vec<_>>>()?;
        Self::new(bars)
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Bar at positional index
    pub fn get(&self, idx: usize) -> Option<&PriceBar> {
        self.bars.get(idx)
    }

    /// Bar for a calendar day (binary search)
    pub fn get_by_date(&self, date: NaiveDate) -> Option<&PriceBar> {
        self.position(date).map(|idx| &self.bars[idx])
    }

    /// Positional index of a calendar day
    pub fn position(&self, date: NaiveDate) -> Option<usize> {
        self.bars.binary_search_by_key(&date, |b| b.date).ok()
    }

    pub fn first(&self) -> Option<&PriceBar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    /// Iterate bars in date order. Each call starts from the beginning.
    pub fn iter(&self) -> std::slice::Iter<'_, PriceBar> {
        self.bars.iter()
    }

    pub fn as_slice(&self) -> &[PriceBar] {
        &self.bars
    }

    /// Sub-series covering `start..=end`
    pub fn between(&self, start: NaiveDate, end: NaiveDate) -> PriceSeries {
        let lo = self.bars.partition_point(|b| b.date < start);
        let hi = self.bars.partition_point(|b| b.date <= end);
        PriceSeries {
            bars: self.bars[lo..hi.max(lo)].to_vec(),
        }
    }
}

impl<'a> IntoIterator for &'a PriceSeries {
    type Item = &'a PriceBar;
    type IntoIter = std::slice::Iter<'a, PriceBar>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    /// Daily bar on 2024-01-01 + `day`, with a flat body at `close`
    pub(crate) fn bar(day: i64, close: f64) -> PriceBar {
        let open_time = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(day);
        PriceBar::new(
            open_time,
            open_time + Duration::days(1) - Duration::milliseconds(1),
            close,
            close * 1.01,
            close * 0.99,
            close,
            1_000.0,
            100,
        )
        .unwrap()
    }

    pub(crate) fn series(closes: &[f64]) -> PriceSeries {
        PriceSeries::new(
            closes
                .iter()
                .enumerate()
                .map(|(i, &c)| bar(i as i64, c))
                .collect(),
        )
        .unwrap()
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn test_lookup() {
        let s = series(&[100.0, 101.0, 102.0, 103.0]);

        assert_eq!(s.len(), 4);
        assert_eq!(s.get(2).unwrap().close, 102.0);
        assert_eq!(s.get_by_date(date(4)).unwrap().close, 103.0);
        assert_eq!(s.position(date(2)), Some(1));
        assert!(s.get_by_date(date(20)).is_none());
        assert!(s.get(4).is_none());
    }

    #[test]
    fn test_iteration_is_restartable() {
        let s = series(&[1.0, 2.0, 3.0]);
        let first: Vec<f64> = s.iter().map(|b| b.close).collect();
        let second: Vec<f64> = (&s).into_iter().map(|b| b.close).collect();
        assert_eq!(first, vec![1.0, 2.0, 3.0]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_rejects_duplicate_dates() {
        let result = PriceSeries::new(vec![bar(0, 100.0), bar(0, 101.0)]);
        assert!(matches!(result, Err(BacktestError::DataIntegrity(_))));
    }

    #[test]
    fn test_rejects_out_of_order_dates() {
        let result = PriceSeries::new(vec![bar(1, 100.0), bar(0, 101.0)]);
        assert!(matches!(result, Err(BacktestError::DataIntegrity(_))));
    }

    #[test]
    fn test_rejects_invalid_bar() {
        let mut broken = bar(1, 100.0);
        broken.high = 50.0;
        let result = PriceSeries::new(vec![bar(0, 100.0), broken]);
        assert!(matches!(result, Err(BacktestError::DataIntegrity(_))));
    }

    #[test]
    fn test_empty_series_is_constructible() {
        let s = PriceSeries::new(vec![]).unwrap();
        assert!(s.is_empty());
        assert!(s.last().is_none());
    }

    #[test]
    fn test_from_candles() {
        let candles = vec![
            RawCandle {
                open_time: 1_704_067_200_000,
                close_time: 1_704_153_599_999,
                open: 42_000.0,
                high: 43_000.0,
                low: 41_500.0,
                close: 42_500.0,
                volume: 25_000.5,
                trades_count: 1_000_000,
            },
            RawCandle {
                open_time: 1_704_153_600_000,
                close_time: 1_704_239_999_999,
                open: 42_500.0,
                high: 45_000.0,
                low: 42_000.0,
                close: 44_900.0,
                volume: 30_000.0,
                trades_count: 1_200_000,
            },
        ];
        let s = PriceSeries::from_candles(candles).unwrap();
        assert_eq!(s.first().unwrap().date, date(1));
        assert_eq!(s.last().unwrap().date, date(2));
    }

    #[test]
    fn test_between() {
        let s = series(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let sub = s.between(date(2), date(4));
        assert_eq!(sub.len(), 3);
        assert_eq!(sub.first().unwrap().close, 2.0);
        assert!(s.between(date(4), date(2)).is_empty());
    }
}
