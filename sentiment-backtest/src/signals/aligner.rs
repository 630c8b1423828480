use std::collections::HashMap;

use chrono::NaiveDate;
use common::{AlignedBar, SignalDirection, SignalEvent};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use crate::series::PriceSeries;

/// Per-day OR of all signal directions seen on that day
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignalFlags {
    pub has_bullish: bool,
    pub has_bearish: bool,
}

/// Bookkeeping about how the signal events mapped onto the price index
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AlignmentStats {
    /// Total events received
    pub events: usize,
    /// Events whose date has a price bar
    pub matched_events: usize,
    /// Distinct event dates with no price bar
    pub unmatched_dates: Vec<NaiveDate>,
    /// Events carrying a credibility flag set to true
    pub flagged_events: usize,
}

/// Aligned bars, one per input price bar, in the same order
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedSeries {
    pub bars: Vec<AlignedBar>,
    pub stats: AlignmentStats,
}

/// Maps dated signals onto a price series.
///
/// Multiple sources disagreeing on a day are OR-ed: a day can be both bullish
/// and bearish. Days without any signal get both flags false.
pub struct SignalAligner;

impl SignalAligner {
    /// Group events by date.
    pub fn group_by_date(events: &[SignalEvent]) -> HashMap<NaiveDate, SignalFlags> {
        let mut flags: HashMap<NaiveDate, SignalFlags> = HashMap::new();
        for event in events {
            let entry = flags.entry(event.date).or_default();
            match event.direction {
                SignalDirection::Bullish => entry.has_bullish = true,
                SignalDirection::Bearish => entry.has_bearish = true,
                SignalDirection::Neutral => {}
            }
        }
        flags
    }

    /// Annotate every bar of `series` with the flags for its date.
    pub fn align(series: &PriceSeries, events: &[SignalEvent]) -> AlignedSeries {
        let flags = Self::group_by_date(events);

        // Per-date lookups are independent; collect keeps input order.
        let bars: Vec<AlignedBar> = series
            .as_slice()
            .par_iter()
            .map(|bar| {
                let day = flags.get(&bar.date).copied().unwrap_or_default();
                AlignedBar {
                    bar: bar.clone(),
                    bullish_signal: day.has_bullish,
                    bearish_signal: day.has_bearish,
                }
            })
            .collect();

        let stats = Self::stats(series, events, &flags);
        if !stats.unmatched_dates.is_empty() {
            warn!(
                unmatched = stats.unmatched_dates.len(),
                "signal dates without a price bar"
            );
            for date in &stats.unmatched_dates {
                debug!(%date, "unmatched signal date");
            }
        }

        AlignedSeries { bars, stats }
    }

    fn stats(
        series: &PriceSeries,
        events: &[SignalEvent],
        flags: &HashMap<NaiveDate, SignalFlags>,
    ) -> AlignmentStats {
        let matched_events = events
            .iter()
            .filter(|e| series.position(e.date).is_some())
            .count();

        let mut unmatched_dates: Vec<NaiveDate> = flags
            .keys()
            .filter(|date| series.position(**date).is_none())
            .copied()
            .collect();
        unmatched_dates.sort();

        AlignmentStats {
            events: events.len(),
            matched_events,
            unmatched_dates,
            flagged_events: events
                .iter()
                .filter(|e| e.credibility_flag == Some(true))
                .count(),
        }
    }
}
