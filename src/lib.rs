// Aggregation, calendar and session-timer core. Terminal rendering and the
// CLI live in the binary; nothing here reads the wall clock.
pub mod aggregate;
pub mod app_dirs;
pub mod calendar;
pub mod config;
pub mod import;
pub mod record;
pub mod runtime;
pub mod session;
pub mod time_series;
pub mod timer;
pub mod util;

pub use aggregate::{bucket_by_day, compute_streak, windowed_trend, AggregateError, DayBucket};
pub use record::{parse_records, MealStatus, RawRecord, Record};
pub use session::{PromptTable, SessionError, SessionPhase};
pub use timer::{SessionTimer, TimerState, TimerStatus};
