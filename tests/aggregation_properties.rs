use chrono::{Duration, NaiveDate};

use nourish::aggregate::{bucket_range, last_days, meal_distribution, DateRange};
use nourish::calendar::{month_range, CalendarMonth};
use nourish::record::{parse_date, MealStatus, RawRecord};
use nourish::{bucket_by_day, compute_streak, parse_records, windowed_trend, AggregateError, Record};

fn d(s: &str) -> NaiveDate {
    parse_date(s).unwrap()
}

fn rec(s: &str) -> Record {
    Record::new(d(s))
}

/// A deterministic spread of records: several per day on some days, none on others.
fn scattered(start: NaiveDate, days: i64) -> Vec<Record> {
    let mut out = Vec::new();
    for i in 0..days {
        let date = start + Duration::days(i);
        for j in 0..(i % 4) {
            let mut r = Record::new(date).with_urge(((i + j) % 6) as u8);
            if j % 2 == 0 {
                r = r.with_mood(((i + j) % 5 + 1) as u8);
            }
            out.push(r);
        }
    }
    out
}

#[test]
fn bucket_count_matches_range_and_record_total() {
    let records = scattered(d("2023-12-20"), 90);
    for (start, end) in [
        ("2024-01-01", "2024-01-31"),
        ("2024-02-01", "2024-02-29"),
        ("2023-12-25", "2024-01-05"),
        ("2024-03-10", "2024-03-10"),
    ] {
        let range = DateRange::parse(start, end).unwrap();
        let buckets = bucket_by_day(&records, d(start), d(end)).unwrap();
        assert_eq!(buckets.len(), range.num_days());

        let in_range = records.iter().filter(|r| range.contains(r.date)).count() as u32;
        assert_eq!(buckets.iter().map(|b| b.count).sum::<u32>(), in_range);

        for pair in buckets.windows(2) {
            assert_eq!(pair[0].date.succ_opt(), Some(pair[1].date));
        }
    }
}

#[test]
fn empty_buckets_carry_no_averages() {
    let buckets = bucket_by_day(&[], d("2024-01-01"), d("2024-01-07")).unwrap();
    assert_eq!(buckets.len(), 7);
    assert!(buckets
        .iter()
        .all(|b| b.count == 0 && b.mood_avg.is_none() && b.urge_avg.is_none()));
}

#[test]
fn reversed_range_is_rejected() {
    let err = bucket_by_day(&[], d("2024-02-02"), d("2024-02-01")).unwrap_err();
    assert!(matches!(err, AggregateError::InvalidRange { .. }));
}

#[test]
fn streak_counts_back_from_today() {
    let records = vec![rec("2024-03-01"), rec("2024-02-29"), rec("2024-02-28")];
    assert_eq!(compute_streak(&records, d("2024-03-01")), 3);

    let gap = vec![rec("2024-03-01"), rec("2024-02-28")];
    assert_eq!(compute_streak(&gap, d("2024-03-01")), 1);

    let yesterday_only = vec![rec("2024-02-29")];
    assert_eq!(compute_streak(&yesterday_only, d("2024-03-01")), 0);

    assert_eq!(compute_streak(&[], d("2024-03-01")), 0);
}

#[test]
fn streak_never_exceeds_distinct_days() {
    let records = scattered(d("2024-01-01"), 60);
    let distinct = {
        let mut days: Vec<_> = records.iter().map(|r| r.date).collect();
        days.dedup();
        days.len() as u32
    };
    for offset in 0..60 {
        let today = d("2024-01-01") + Duration::days(offset);
        assert!(compute_streak(&records, today) <= distinct);
    }
}

#[test]
fn trend_window_keeps_only_active_days() {
    let records = vec![
        rec("2024-01-01"),
        rec("2024-01-05"),
        rec("2024-01-09"),
        rec("2024-01-09"),
        rec("2024-01-20"),
        rec("2024-02-02"),
    ];
    let trend = windowed_trend(&records, 14);
    assert_eq!(trend.len(), 5);
    assert!(trend.windows(2).all(|w| w[0].date < w[1].date));

    let last_two = windowed_trend(&records, 2);
    assert_eq!(
        last_two.iter().map(|p| p.date).collect::<Vec<_>>(),
        vec![d("2024-01-20"), d("2024-02-02")]
    );
}

#[test]
fn parsed_export_feeds_the_calendar() {
    let raw = vec![
        RawRecord {
            mood: Some(4),
            urge: Some(1),
            meal_status: Some("completed".into()),
            ..RawRecord::on("2024-02-29")
        },
        RawRecord {
            meal_status: Some("skipped".into()),
            ..RawRecord::on("2024-02-29")
        },
        RawRecord {
            mood: Some(9),
            ..RawRecord::on("2024-02-10")
        },
        RawRecord::on("2024-02-30"),
    ];
    let parsed = parse_records(&raw);
    assert_eq!(parsed.records.len(), 2);
    assert_eq!(parsed.invalid, 2);

    let month = CalendarMonth::build(2024, 2, &parsed.records).unwrap();
    assert_eq!(month.days.len(), month_range(2024, 2).unwrap().num_days());
    assert_eq!(month.leading_blanks, 4);
    let leap = month.days.last().unwrap();
    assert_eq!(leap.count, 2);
    assert_eq!(leap.meal_counts.completed, 1);
    assert_eq!(leap.meal_counts.skipped, 1);
}

#[test]
fn weekly_meal_distribution() {
    let records = vec![
        Record::new(d("2024-03-01")).with_meal_status(MealStatus::Completed),
        Record::new(d("2024-03-02")).with_meal_status(MealStatus::Partial),
        Record::new(d("2024-03-03")).with_meal_status(MealStatus::Completed),
        Record::new(d("2024-02-20")).with_meal_status(MealStatus::Skipped),
    ];
    let buckets = bucket_range(&records, last_days(d("2024-03-03"), 7));
    assert_eq!(buckets.len(), 7);
    let meals = meal_distribution(&buckets);
    assert_eq!((meals.completed, meals.partial, meals.skipped), (2, 1, 0));
}
