use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::aggregate::{bucket_range, AggregateError, DateRange, DayBucket};
use crate::record::Record;

/// The full civil month as a date range.
pub fn month_range(year: i32, month: u32) -> Result<DateRange, AggregateError> {
    let invalid = || AggregateError::InvalidMonth { year, month };

    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let (next_year, next_month) = shift_month(year, month, 1);
    let last = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .ok_or_else(invalid)?;

    DateRange::new(first, last)
}

/// Moves `delta` months forward (or back), rolling the year.
pub fn shift_month(year: i32, month: u32, delta: i32) -> (i32, u32) {
    let zero_based = year * 12 + month as i32 - 1 + delta;
    (zero_based.div_euclid(12), zero_based.rem_euclid(12) as u32 + 1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum HeatLevel {
    None,
    Low,
    Medium,
    High,
}

/// Lower bounds (inclusive) of each heat level. Counts below `low` are
/// `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatThresholds {
    pub low: u32,
    pub medium: u32,
    pub high: u32,
}

impl Default for HeatThresholds {
    fn default() -> Self {
        Self {
            low: 1,
            medium: 2,
            high: 3,
        }
    }
}

impl HeatThresholds {
    pub fn level(&self, count: u32) -> HeatLevel {
        if count >= self.high {
            HeatLevel::High
        } else if count >= self.medium {
            HeatLevel::Medium
        } else if count >= self.low {
            HeatLevel::Low
        } else {
            HeatLevel::None
        }
    }
}

/// A month laid out for a Sunday-first week grid.
#[derive(Debug, Clone, Serialize)]
pub struct CalendarMonth {
    pub year: i32,
    pub month: u32,
    /// Empty cells before the 1st (Sunday = 0).
    pub leading_blanks: u32,
    pub days: Vec<DayBucket>,
}

impl CalendarMonth {
    pub fn build(year: i32, month: u32, records: &[Record]) -> Result<Self, AggregateError> {
        let range = month_range(year, month)?;
        Ok(Self {
            year,
            month,
            leading_blanks: range.start().weekday().num_days_from_sunday(),
            days: bucket_range(records, range),
        })
    }

    /// Rows of seven cells; `None` pads before the 1st and after the last day.
    pub fn weeks(&self) -> Vec<Vec<Option<&DayBucket>>> {
        let mut cells: Vec<Option<&DayBucket>> = (0..self.leading_blanks).map(|_| None).collect();
        cells.extend(self.days.iter().map(Some));
        while cells.len() % 7 != 0 {
            cells.push(None);
        }
        cells.chunks(7).map(|w| w.to_vec()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::parse_date;
    use assert_matches::assert_matches;

    #[test]
    fn month_lengths() {
        assert_eq!(month_range(2024, 2).unwrap().num_days(), 29);
        assert_eq!(month_range(2023, 2).unwrap().num_days(), 28);
        assert_eq!(month_range(2024, 4).unwrap().num_days(), 30);
        assert_eq!(month_range(2024, 12).unwrap().num_days(), 31);
        assert_matches!(
            month_range(2024, 13),
            Err(AggregateError::InvalidMonth { month: 13, .. })
        );
        assert_matches!(month_range(2024, 0), Err(AggregateError::InvalidMonth { .. }));
    }

    #[test]
    fn shift_month_rolls_year() {
        assert_eq!(shift_month(2024, 12, 1), (2025, 1));
        assert_eq!(shift_month(2024, 1, -1), (2023, 12));
        assert_eq!(shift_month(2024, 5, 0), (2024, 5));
        assert_eq!(shift_month(2024, 3, -15), (2022, 12));
    }

    #[test]
    fn default_heat_levels() {
        let t = HeatThresholds::default();
        assert_eq!(t.level(0), HeatLevel::None);
        assert_eq!(t.level(1), HeatLevel::Low);
        assert_eq!(t.level(2), HeatLevel::Medium);
        assert_eq!(t.level(3), HeatLevel::High);
        assert_eq!(t.level(42), HeatLevel::High);
    }

    #[test]
    fn custom_heat_levels() {
        let t = HeatThresholds {
            low: 2,
            medium: 4,
            high: 8,
        };
        assert_eq!(t.level(1), HeatLevel::None);
        assert_eq!(t.level(5), HeatLevel::Medium);
    }

    #[test]
    fn calendar_grid_layout() {
        // 2024-09-01 is a Sunday, 2024-02-01 a Thursday
        let sept = CalendarMonth::build(2024, 9, &[]).unwrap();
        assert_eq!(sept.leading_blanks, 0);
        assert_eq!(sept.weeks().len(), 5);

        let records = vec![Record::new(parse_date("2024-02-29").unwrap())];
        let feb = CalendarMonth::build(2024, 2, &records).unwrap();
        assert_eq!(feb.leading_blanks, 4);
        assert_eq!(feb.days.len(), 29);
        let weeks = feb.weeks();
        assert!(weeks.iter().all(|w| w.len() == 7));
        assert!(weeks[0][3].is_none());
        assert_eq!(weeks[0][4].map(|b| b.date.day()), Some(1));
        assert_eq!(feb.days[28].count, 1);
    }
}
