//! Calendar bucketing, streaks and trend windows over dated records.
//!
//! Everything here is a pure function of its arguments. "Today" is always
//! passed in by the caller.

use std::collections::{BTreeMap, HashSet};

use chrono::{Days, NaiveDate};
use serde::Serialize;
use thiserror::Error;

use crate::record::{parse_date, MealStatus, Record};
use crate::util::mean;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AggregateError {
    #[error("invalid range: {start} is after {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("invalid range bound {0:?} (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("invalid month {year}-{month:02}")]
    InvalidMonth { year: i32, month: u32 },
}

/// Inclusive span of civil dates with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, AggregateError> {
        if start > end {
            return Err(AggregateError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn parse(start: &str, end: &str) -> Result<Self, AggregateError> {
        let start =
            parse_date(start).map_err(|_| AggregateError::InvalidDate(start.to_string()))?;
        let end = parse_date(end).map_err(|_| AggregateError::InvalidDate(end.to_string()))?;
        Self::new(start, end)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn num_days(&self) -> usize {
        (self.end - self.start).num_days() as usize + 1
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}

/// The `n` days ending at `today`, inclusive. `n == 0` is treated as 1.
pub fn last_days(today: NaiveDate, n: u32) -> DateRange {
    let back = u64::from(n.max(1) - 1);
    let start = today.checked_sub_days(Days::new(back)).unwrap_or(NaiveDate::MIN);
    DateRange { start, end: today }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MealCounts {
    pub completed: u32,
    pub partial: u32,
    pub skipped: u32,
}

impl MealCounts {
    pub fn record(&mut self, status: MealStatus) {
        match status {
            MealStatus::Completed => self.completed += 1,
            MealStatus::Partial => self.partial += 1,
            MealStatus::Skipped => self.skipped += 1,
            MealStatus::Planned => {}
        }
    }

    pub fn total(&self) -> u32 {
        self.completed + self.partial + self.skipped
    }
}

impl std::ops::AddAssign for MealCounts {
    fn add_assign(&mut self, rhs: Self) {
        self.completed += rhs.completed;
        self.partial += rhs.partial;
        self.skipped += rhs.skipped;
    }
}

/// Summary of every record sharing one calendar date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub count: u32,
    pub mood_avg: Option<f64>,
    pub urge_avg: Option<f64>,
    pub urge_max: Option<u8>,
    pub meal_counts: MealCounts,
}

impl DayBucket {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            count: 0,
            mood_avg: None,
            urge_avg: None,
            urge_max: None,
            meal_counts: MealCounts::default(),
        }
    }
}

/// One active day of a trend window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub mood_avg: Option<f64>,
    pub urge_avg: Option<f64>,
    pub urge_max: Option<u8>,
    pub meal_counts: MealCounts,
}

impl From<DayBucket> for TrendPoint {
    fn from(b: DayBucket) -> Self {
        Self {
            date: b.date,
            mood_avg: b.mood_avg,
            urge_avg: b.urge_avg,
            urge_max: b.urge_max,
            meal_counts: b.meal_counts,
        }
    }
}

#[derive(Default)]
struct DayAccumulator {
    count: u32,
    moods: Vec<f64>,
    urges: Vec<f64>,
    urge_max: Option<u8>,
    meal_counts: MealCounts,
}

impl DayAccumulator {
    fn add(&mut self, record: &Record) {
        self.count += 1;
        if let Some(mood) = record.mood {
            self.moods.push(f64::from(mood));
        }
        if let Some(urge) = record.urge {
            self.urges.push(f64::from(urge));
            self.urge_max = self.urge_max.max(Some(urge));
        }
        if let Some(status) = record.meal_status {
            self.meal_counts.record(status);
        }
    }

    fn into_bucket(self, date: NaiveDate) -> DayBucket {
        DayBucket {
            date,
            count: self.count,
            mood_avg: mean(&self.moods),
            urge_avg: mean(&self.urges),
            urge_max: self.urge_max,
            meal_counts: self.meal_counts,
        }
    }
}

fn group_by_date<'a, I>(records: I) -> BTreeMap<NaiveDate, DayAccumulator>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut by_day: BTreeMap<NaiveDate, DayAccumulator> = BTreeMap::new();
    for record in records {
        by_day.entry(record.date).or_default().add(record);
    }
    by_day
}

/// One bucket per calendar day of `[start, end]`, ascending. Days without
/// records are present with `count == 0`. Records outside the range are
/// ignored.
pub fn bucket_by_day(
    records: &[Record],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<DayBucket>, AggregateError> {
    Ok(bucket_range(records, DateRange::new(start, end)?))
}

pub fn bucket_range(records: &[Record], range: DateRange) -> Vec<DayBucket> {
    let mut by_day = group_by_date(records.iter().filter(|r| range.contains(r.date)));

    range
        .days()
        .map(|date| match by_day.remove(&date) {
            Some(acc) => acc.into_bucket(date),
            None => DayBucket::empty(date),
        })
        .collect()
}

/// Consecutive logged days ending at `today`. An unlogged `today` yields 0
/// even when yesterday was logged.
pub fn compute_streak(records: &[Record], today: NaiveDate) -> u32 {
    let logged: HashSet<NaiveDate> = records.iter().map(|r| r.date).collect();

    let mut streak = 0;
    let mut cursor = Some(today);
    while let Some(day) = cursor {
        if !logged.contains(&day) {
            break;
        }
        streak += 1;
        cursor = day.pred_opt();
    }
    streak
}

/// The last `window_size_days` dates that have at least one record, in
/// ascending order. Unlogged days are skipped rather than zero-filled.
pub fn windowed_trend(records: &[Record], window_size_days: usize) -> Vec<TrendPoint> {
    let by_day = group_by_date(records);
    let skip = by_day.len().saturating_sub(window_size_days);

    by_day
        .into_iter()
        .skip(skip)
        .map(|(date, acc)| acc.into_bucket(date).into())
        .collect()
}

/// Sum of meal counts across buckets.
pub fn meal_distribution(buckets: &[DayBucket]) -> MealCounts {
    buckets.iter().fold(MealCounts::default(), |mut acc, b| {
        acc += b.meal_counts;
        acc
    })
}
