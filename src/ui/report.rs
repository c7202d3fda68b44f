//! Plain-text views for the non-interactive subcommands.

use chrono::{Datelike, NaiveDate};
use itertools::Itertools;

use nourish::aggregate::{DayBucket, MealCounts, TrendPoint};
use nourish::calendar::{CalendarMonth, HeatLevel, HeatThresholds};
use nourish::time_series::TrendOverview;

const WEEK: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

pub fn heat_glyph(level: HeatLevel) -> char {
    match level {
        HeatLevel::None => ' ',
        HeatLevel::Low => '░',
        HeatLevel::Medium => '▒',
        HeatLevel::High => '▓',
    }
}

pub fn format_avg(v: Option<f64>) -> String {
    v.map_or_else(|| "-".to_string(), |v| format!("{v:.1}"))
}

fn format_meals(m: &MealCounts) -> String {
    format!("{}/{}/{}", m.completed, m.partial, m.skipped)
}

pub fn render_calendar(
    month: &CalendarMonth,
    thresholds: &HeatThresholds,
    today: Option<NaiveDate>,
) -> String {
    let mut out = format!("{} / {:02}\n", month.year, month.month);
    out.push_str(&WEEK.iter().map(|w| format!("{w:<4}")).join(""));
    out.push('\n');

    for week in month.weeks() {
        let row = week
            .iter()
            .map(|cell| match cell {
                Some(b) => {
                    let marker = if Some(b.date) == today {
                        '*'
                    } else {
                        heat_glyph(thresholds.level(b.count))
                    };
                    format!("{:>2}{} ", b.date.day(), marker)
                }
                None => "    ".to_string(),
            })
            .join("");
        out.push_str(row.trim_end());
        out.push('\n');
    }

    let logged = month.days.iter().filter(|b| b.count > 0).count();
    let entries: u32 = month.days.iter().map(|b| b.count).sum();
    out.push_str(&format!(
        "{entries} entries on {logged} of {} days   ░ 1  ▒ 2  ▓ 3+  * today\n",
        month.days.len()
    ));
    out
}

pub fn render_trend(points: &[TrendPoint], overview: &TrendOverview) -> String {
    if points.is_empty() {
        return "No data yet. Log a few check-ins to see trends.\n".to_string();
    }
    let mut out = String::from("date        mood  urge  max  meals c/p/s\n");
    for p in points {
        out.push_str(&format!(
            "{}  {:>4}  {:>4}  {:>3}  {}\n",
            p.date,
            format_avg(p.mood_avg),
            format_avg(p.urge_avg),
            p.urge_max.map_or_else(|| "-".to_string(), |u| u.to_string()),
            format_meals(&p.meal_counts)
        ));
    }
    out.push_str(&format!(
        "mood avg ({}d): {}   urge avg ({}d): {}\n",
        overview.days,
        format_avg(overview.mood_avg),
        overview.days,
        format_avg(overview.urge_avg)
    ));
    out
}

pub fn render_streak(streak: u32) -> String {
    format!(
        "Current streak: {} day{}\n",
        streak,
        if streak == 1 { "" } else { "s" }
    )
}

pub fn render_summary(buckets: &[DayBucket], meals: &MealCounts, streak: u32) -> String {
    let mut out = String::new();
    for b in buckets {
        out.push_str(&format!(
            "{}  {:<3} {}\n",
            b.date.format("%m/%d"),
            b.count,
            "#".repeat(b.count as usize)
        ));
    }
    out.push_str(&format!(
        "meals: {} completed, {} partial, {} skipped\n",
        meals.completed, meals.partial, meals.skipped
    ));
    out.push_str(&render_streak(streak));
    out
}
