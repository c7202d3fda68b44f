use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub const MOOD_RANGE: std::ops::RangeInclusive<i64> = 1..=5;
pub const URGE_RANGE: std::ops::RangeInclusive<i64> = 0..=5;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    #[error("invalid date {0:?} (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("mood {0} out of range (1..5)")]
    MoodOutOfRange(i64),

    #[error("urge {0} out of range (0..5)")]
    UrgeOutOfRange(i64),

    #[error("unknown meal status {0:?} (skipped|partial|completed)")]
    UnknownMealStatus(String),
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MealStatus {
    Skipped,
    Partial,
    Completed,
    /// Meal entries may be logged ahead of time; they count as entries but
    /// never land in a meal-count bucket.
    Planned,
}

impl MealStatus {
    pub fn parse(s: &str) -> Result<Self, RecordError> {
        match s.trim().to_lowercase().as_str() {
            "skipped" => Ok(MealStatus::Skipped),
            "partial" => Ok(MealStatus::Partial),
            "completed" => Ok(MealStatus::Completed),
            "planned" => Ok(MealStatus::Planned),
            _ => Err(RecordError::UnknownMealStatus(s.to_string())),
        }
    }
}

/// A check-in or meal entry as handed over by the backend, before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub date: String,
    #[serde(default)]
    pub mood: Option<i64>,
    #[serde(default)]
    pub urge: Option<i64>,
    #[serde(default, alias = "status")]
    pub meal_status: Option<String>,
    #[serde(default)]
    pub meal_type: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

impl RawRecord {
    pub fn on(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            ..Self::default()
        }
    }
}

/// A validated record keyed by its civil date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub date: NaiveDate,
    pub mood: Option<u8>,
    pub urge: Option<u8>,
    pub meal_status: Option<MealStatus>,
}

impl Record {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            mood: None,
            urge: None,
            meal_status: None,
        }
    }

    pub fn with_mood(mut self, mood: u8) -> Self {
        self.mood = Some(mood);
        self
    }

    pub fn with_urge(mut self, urge: u8) -> Self {
        self.urge = Some(urge);
        self
    }

    pub fn with_meal_status(mut self, status: MealStatus) -> Self {
        self.meal_status = Some(status);
        self
    }
}

impl TryFrom<&RawRecord> for Record {
    type Error = RecordError;

    fn try_from(raw: &RawRecord) -> Result<Self, Self::Error> {
        let date = parse_date(&raw.date)?;

        let mood = match raw.mood {
            Some(m) if MOOD_RANGE.contains(&m) => Some(m as u8),
            Some(m) => return Err(RecordError::MoodOutOfRange(m)),
            None => None,
        };
        let urge = match raw.urge {
            Some(u) if URGE_RANGE.contains(&u) => Some(u as u8),
            Some(u) => return Err(RecordError::UrgeOutOfRange(u)),
            None => None,
        };
        let meal_status = match raw.meal_status.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(s) => Some(MealStatus::parse(s)?),
        };

        Ok(Record {
            date,
            mood,
            urge,
            meal_status,
        })
    }
}

/// Parses a civil date written exactly as `YYYY-MM-DD`. The string is taken
/// at face value: no trimming, no timezone, and only the canonical spelling is
/// accepted so that equal dates always come from equal strings.
pub fn parse_date(s: &str) -> Result<NaiveDate, RecordError> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .ok()
        .filter(|date| date.format(DATE_FORMAT).to_string() == s)
        .ok_or_else(|| RecordError::InvalidDate(s.to_string()))
}

#[derive(Debug, Clone, Default)]
pub struct ParsedRecords {
    pub records: Vec<Record>,
    pub invalid: usize,
    pub errors: Vec<RecordError>,
}

impl ParsedRecords {
    pub fn has_invalid(&self) -> bool {
        self.invalid > 0
    }
}

/// Validates raw records. Invalid ones are dropped from the result and
/// counted so the caller can warn about them.
pub fn parse_records(raw: &[RawRecord]) -> ParsedRecords {
    let mut parsed = ParsedRecords::default();
    for r in raw {
        match Record::try_from(r) {
            Ok(record) => parsed.records.push(record),
            Err(e) => {
                log::debug!("skipping record dated {:?}: {}", r.date, e);
                parsed.invalid += 1;
                parsed.errors.push(e);
            }
        }
    }
    if parsed.has_invalid() {
        log::warn!(
            "{} of {} records were invalid and excluded from aggregates",
            parsed.invalid,
            raw.len()
        );
    }
    parsed
}
