use std::collections::BTreeMap;

use serde::Serialize;
use time::{Date, Duration, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

use super::entry::LoggedEntry;
use super::nutrients::{round_to, NutrientSource, Nutrients};

pub const DEFAULT_HISTORY_DAYS: i64 = 14;
pub const MAX_HISTORY_DAYS: i64 = 365;

/// Places used for every aggregated figure.
pub const TOTAL_PLACES: i32 = 2;

/// Closed range of local calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayRange {
    pub first: Date,
    pub last: Date,
}

impl DayRange {
    pub fn single(day: Date) -> Self {
        Self {
            first: day,
            last: day,
        }
    }

    /// `days` days ending with `last`, clamped to [1, 365].
    pub fn ending(last: Date, days: i64) -> Self {
        let days = clamp_days(days);
        Self {
            first: last - Duration::days(days - 1),
            last,
        }
    }

    /// Instants covering the range in the given offset: `[start, end)` where
    /// `end` is local midnight after the last day.
    pub fn bounds(&self, offset: UtcOffset) -> (OffsetDateTime, OffsetDateTime) {
        let start = PrimitiveDateTime::new(self.first, Time::MIDNIGHT).assume_offset(offset);
        let end = PrimitiveDateTime::new(self.last, Time::MIDNIGHT).assume_offset(offset)
            + Duration::days(1);
        (start, end)
    }

    pub fn days(&self) -> impl Iterator<Item = Date> {
        let last = self.last;
        std::iter::successors(Some(self.first), move |d| {
            d.next_day().filter(|next| *next <= last)
        })
    }
}

pub fn clamp_days(days: i64) -> i64 {
    days.clamp(1, MAX_HISTORY_DAYS)
}

pub fn local_today(now: OffsetDateTime, offset: UtcOffset) -> Date {
    now.to_offset(offset).date()
}

pub fn local_day(entry: &LoggedEntry, offset: UtcOffset) -> Date {
    entry.created_at().to_offset(offset).date()
}

/// Sum over all entries, rounded for display.
pub fn totals<'a>(entries: impl IntoIterator<Item = &'a LoggedEntry>) -> Nutrients {
    entries
        .into_iter()
        .map(NutrientSource::nutrients)
        .sum::<Nutrients>()
        .rounded(TOTAL_PLACES)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyEnergy {
    pub date: Date,
    pub kcal: f64,
}

/// One bucket per day of `range`, zero when nothing was logged. Entries outside
/// the range are ignored.
pub fn daily_energy<'a>(
    entries: impl IntoIterator<Item = &'a LoggedEntry>,
    range: DayRange,
    offset: UtcOffset,
) -> Vec<DailyEnergy> {
    let mut buckets: BTreeMap<Date, f64> = range.days().map(|d| (d, 0.0)).collect();
    for entry in entries {
        if let Some(sum) = buckets.get_mut(&local_day(entry, offset)) {
            *sum += entry.nutrients().kcal;
        }
    }
    buckets
        .into_iter()
        .map(|(date, kcal)| DailyEnergy {
            date,
            kcal: round_to(kcal, TOTAL_PLACES),
        })
        .collect()
}
