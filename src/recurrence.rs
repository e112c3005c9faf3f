use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Yearly => "yearly",
        };
        write!(f, "{}", s)
    }
}

/// Wire shape: {frequency, interval, day_of_month?, end_date?}.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecurrenceRule {
    pub frequency: Frequency,
    pub interval: u32,
    #[serde(default)]
    pub day_of_month: Option<u8>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

impl RecurrenceRule {
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.interval < 1 {
            return Err(LedgerError::validation(
                "recurrence_rule",
                "interval must be at least 1",
            ));
        }
        if let Some(day) = self.day_of_month {
            if !(1..=31).contains(&day) {
                return Err(LedgerError::validation(
                    "recurrence_rule",
                    "day_of_month must be between 1 and 31",
                ));
            }
        }
        Ok(())
    }
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_y, next_m) = shift_month(year, month, 1);
    NaiveDate::from_ymd_opt(next_y, next_m, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(28)
}

/// Calendar-month arithmetic: (year, month) shifted by `delta` months.
pub fn shift_month(year: i32, month: u32, delta: i32) -> (i32, u32) {
    let zero_based = year * 12 + month as i32 - 1 + delta;
    (zero_based.div_euclid(12), zero_based.rem_euclid(12) as u32 + 1)
}

fn clamped_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day.min(days_in_month(year, month)))
}

fn advance(rule: &RecurrenceRule, from: NaiveDate, steps: u32) -> Option<NaiveDate> {
    match rule.frequency {
        Frequency::Daily => from.checked_add_signed(Duration::days(steps as i64)),
        Frequency::Weekly => from.checked_add_signed(Duration::days(7 * steps as i64)),
        Frequency::Monthly => {
            let (y, m) = shift_month(from.year(), from.month(), steps as i32);
            let day = rule.day_of_month.map(u32::from).unwrap_or_else(|| from.day());
            clamped_date(y, m, day)
        }
        Frequency::Yearly => {
            let y = from.year() + steps as i32;
            let day = rule.day_of_month.map(u32::from).unwrap_or_else(|| from.day());
            clamped_date(y, from.month(), day)
        }
    }
}

/// Next concrete occurrence strictly after `from`, or None once the rule is
/// exhausted. A `day_of_month` past the target month's length clamps to the
/// month's last day; it never spills into the following month.
pub fn next_occurrence(rule: &RecurrenceRule, from: NaiveDate) -> Option<NaiveDate> {
    let mut candidate = advance(rule, from, rule.interval)?;
    if candidate <= from {
        candidate = advance(rule, from, rule.interval * 2)?;
    }
    match rule.end_date {
        Some(end) if candidate > end => None,
        _ => Some(candidate),
    }
}

/// Lazy, finite sequence of occurrences after `from` up to and including
/// `horizon`. Drives "upcoming" views and due materialization without
/// touching any state.
pub fn expand<'a>(
    rule: &'a RecurrenceRule,
    from: NaiveDate,
    horizon: NaiveDate,
) -> impl Iterator<Item = NaiveDate> + 'a {
    Occurrences {
        rule,
        cursor: from,
        horizon,
    }
}

struct Occurrences<'a> {
    rule: &'a RecurrenceRule,
    cursor: NaiveDate,
    horizon: NaiveDate,
}

impl Iterator for Occurrences<'_> {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let next = next_occurrence(self.rule, self.cursor)?;
        if next > self.horizon {
            return None;
        }
        self.cursor = next;
        Some(next)
    }
}
