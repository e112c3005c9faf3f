use chrono::NaiveDate;

use crate::recurrence::{expand, next_occurrence, Frequency, RecurrenceRule};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn monthly_on(day: u8) -> RecurrenceRule {
    RecurrenceRule {
        frequency: Frequency::Monthly,
        interval: 1,
        day_of_month: Some(day),
        end_date: None,
    }
}

#[test]
fn month_end_clamps_then_recovers() {
    // Day 31 lands on April 30, and the next step recovers May 31.
    let rule = monthly_on(31);
    let april = next_occurrence(&rule, date(2025, 3, 31)).unwrap();
    assert_eq!(april, date(2025, 4, 30));
    let may = next_occurrence(&rule, april).unwrap();
    assert_eq!(may, date(2025, 5, 31));
}

#[test]
fn leap_year_february() {
    let rule = monthly_on(31);
    assert_eq!(
        next_occurrence(&rule, date(2024, 1, 31)).unwrap(),
        date(2024, 2, 29)
    );
    assert_eq!(
        next_occurrence(&rule, date(2025, 1, 31)).unwrap(),
        date(2025, 2, 28)
    );
}

#[test]
fn yearly_from_leap_day_clamps() {
    let rule = RecurrenceRule {
        frequency: Frequency::Yearly,
        interval: 1,
        day_of_month: None,
        end_date: None,
    };
    assert_eq!(
        next_occurrence(&rule, date(2024, 2, 29)).unwrap(),
        date(2025, 2, 28)
    );
}

#[test]
fn daily_and_weekly_intervals() {
    let daily = RecurrenceRule {
        frequency: Frequency::Daily,
        interval: 3,
        day_of_month: None,
        end_date: None,
    };
    assert_eq!(
        next_occurrence(&daily, date(2025, 1, 30)).unwrap(),
        date(2025, 2, 2)
    );

    let weekly = RecurrenceRule {
        frequency: Frequency::Weekly,
        interval: 2,
        day_of_month: None,
        end_date: None,
    };
    assert_eq!(
        next_occurrence(&weekly, date(2025, 1, 6)).unwrap(),
        date(2025, 1, 20)
    );
}

#[test]
fn multi_month_interval() {
    let rule = RecurrenceRule {
        frequency: Frequency::Monthly,
        interval: 3,
        day_of_month: Some(15),
        end_date: None,
    };
    assert_eq!(
        next_occurrence(&rule, date(2025, 11, 15)).unwrap(),
        date(2026, 2, 15)
    );
}

#[test]
fn end_date_exhausts_the_rule() {
    let rule = RecurrenceRule {
        frequency: Frequency::Monthly,
        interval: 1,
        day_of_month: Some(10),
        end_date: Some(date(2025, 3, 31)),
    };
    assert_eq!(
        next_occurrence(&rule, date(2025, 2, 10)).unwrap(),
        date(2025, 3, 10)
    );
    assert_eq!(next_occurrence(&rule, date(2025, 3, 10)), None);
}

#[test]
fn next_occurrence_is_deterministic() {
    let rule = monthly_on(31);
    let from = date(2025, 3, 31);
    assert_eq!(next_occurrence(&rule, from), next_occurrence(&rule, from));
}

#[test]
fn expand_stops_at_horizon() {
    let rule = monthly_on(15);
    let dates: Vec<NaiveDate> = expand(&rule, date(2025, 1, 15), date(2025, 4, 30)).collect();
    assert_eq!(
        dates,
        vec![date(2025, 2, 15), date(2025, 3, 15), date(2025, 4, 15)]
    );
}

#[test]
fn expand_respects_end_date() {
    let rule = RecurrenceRule {
        frequency: Frequency::Monthly,
        interval: 1,
        day_of_month: Some(15),
        end_date: Some(date(2025, 2, 28)),
    };
    let dates: Vec<NaiveDate> = expand(&rule, date(2025, 1, 15), date(2025, 12, 31)).collect();
    assert_eq!(dates, vec![date(2025, 2, 15)]);
}

#[test]
fn validation_rejects_malformed_rules() {
    let zero_interval = RecurrenceRule {
        frequency: Frequency::Monthly,
        interval: 0,
        day_of_month: None,
        end_date: None,
    };
    assert!(zero_interval.validate().is_err());

    let bad_day = monthly_on(32);
    assert!(bad_day.validate().is_err());
    assert!(monthly_on(31).validate().is_ok());
}
