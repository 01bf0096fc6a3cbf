//! Recurrence rules and the repeat scheduler.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use time::{Date, Duration, Weekday};

use crate::error::{CoreError, Result};

/// Policy by which a completed task's due date advances instead of the task
/// being removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RecurrenceRepr", into = "RecurrenceRepr")]
pub enum Recurrence {
    /// One-off task; completion removes it.
    #[default]
    None,
    /// Due date advances by a fixed number of days.
    IntervalDays(u32),
    /// Due date advances to the next weekday in a user-ordered cycle.
    WeekdayCycle(Vec<Weekday>),
}

impl Recurrence {
    /// Fixed-interval rule. Zero days is rejected.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidRecurrence`] when `days` is zero.
    pub fn every(days: u32) -> Result<Self> {
        if days == 0 {
            return Err(CoreError::InvalidRecurrence(days.to_string()));
        }
        Ok(Self::IntervalDays(days))
    }

    /// Weekday-cycle rule. The cycle must be non-empty and free of duplicates.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidRecurrence`] for empty or repeating cycles.
    pub fn cycle(days: Vec<Weekday>) -> Result<Self> {
        let has_duplicate = days
            .iter()
            .enumerate()
            .any(|(idx, day)| days[..idx].contains(day));
        if days.is_empty() || has_duplicate {
            return Err(CoreError::InvalidRecurrence(format_cycle(&days)));
        }
        Ok(Self::WeekdayCycle(days))
    }

    /// True unless the rule is [`Recurrence::None`].
    #[must_use]
    pub const fn is_recurring(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Compute the due date that follows `current` under this rule.
    ///
    /// Returns `Ok(None)` for non-recurring tasks.
    ///
    /// # Errors
    /// Returns [`CoreError::ScheduleMismatch`] when a weekday cycle does not
    /// contain the weekday of `current`.
    pub fn advance(&self, current: Date) -> Result<Option<Date>> {
        match self {
            Self::None => Ok(None),
            Self::IntervalDays(days) => {
                Ok(Some(current.saturating_add(Duration::days(i64::from(*days)))))
            }
            Self::WeekdayCycle(cycle) => next_due(current, cycle).map(Some),
        }
    }
}

/// Next due date for a weekday cycle.
///
/// The target is the cycle entry after `current`'s weekday (wrapping to the
/// first entry). The result is the first later calendar date falling on that
/// weekday, so `[mon, fri]` moves a Monday forward four days and a Friday
/// forward three.
///
/// # Errors
/// Returns [`CoreError::ScheduleMismatch`] when `current`'s weekday is not in
/// `cycle`.
pub fn next_due(current: Date, cycle: &[Weekday]) -> Result<Date> {
    let mismatch = || CoreError::ScheduleMismatch {
        date: current,
        weekday: current.weekday(),
    };
    let position = cycle
        .iter()
        .position(|day| *day == current.weekday())
        .ok_or_else(mismatch)?;
    let target = cycle[(position + 1) % cycle.len()];

    (1..=7)
        .map(|offset| current.saturating_add(Duration::days(offset)))
        .find(|candidate| candidate.weekday() == target)
        .ok_or_else(mismatch)
}

/// Lowercase three-letter token for a weekday.
#[must_use]
pub const fn weekday_token(day: Weekday) -> &'static str {
    match day {
        Weekday::Monday => "mon",
        Weekday::Tuesday => "tue",
        Weekday::Wednesday => "wed",
        Weekday::Thursday => "thu",
        Weekday::Friday => "fri",
        Weekday::Saturday => "sat",
        Weekday::Sunday => "sun",
    }
}

/// Parse a weekday token (`mon`, `Monday`, `MON`, ...).
#[must_use]
pub fn parse_weekday(token: &str) -> Option<Weekday> {
    let lower = token.trim().to_ascii_lowercase();
    let day = match lower.get(..3)? {
        "mon" => Weekday::Monday,
        "tue" => Weekday::Tuesday,
        "wed" => Weekday::Wednesday,
        "thu" => Weekday::Thursday,
        "fri" => Weekday::Friday,
        "sat" => Weekday::Saturday,
        "sun" => Weekday::Sunday,
        _ => return None,
    };
    let full = day.to_string().to_ascii_lowercase();
    (lower.len() == 3 || lower == full).then_some(day)
}

fn format_cycle(days: &[Weekday]) -> String {
    days.iter()
        .map(|day| weekday_token(*day))
        .collect::<Vec<_>>()
        .join(",")
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("none"),
            Self::IntervalDays(days) => write!(f, "{days}"),
            Self::WeekdayCycle(days) => f.write_str(&format_cycle(days)),
        }
    }
}

impl FromStr for Recurrence {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
            return Ok(Self::None);
        }
        if trimmed.bytes().all(|b| b.is_ascii_digit()) {
            let days = trimmed
                .parse()
                .map_err(|_| CoreError::InvalidRecurrence(trimmed.to_owned()))?;
            return Self::every(days).map_err(|_| CoreError::InvalidRecurrence(trimmed.to_owned()));
        }
        let days = trimmed
            .split(',')
            .map(|token| {
                parse_weekday(token).ok_or_else(|| CoreError::InvalidRecurrence(trimmed.to_owned()))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::cycle(days).map_err(|_| CoreError::InvalidRecurrence(trimmed.to_owned()))
    }
}

/// Wire form: `"none"`, a day count, or a list of weekday tokens.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RecurrenceRepr {
    Days(u32),
    Cycle(Vec<String>),
    Tag(String),
}

impl From<Recurrence> for RecurrenceRepr {
    fn from(rule: Recurrence) -> Self {
        match rule {
            Recurrence::None => Self::Tag("none".to_owned()),
            Recurrence::IntervalDays(days) => Self::Days(days),
            Recurrence::WeekdayCycle(days) => Self::Cycle(
                days.into_iter()
                    .map(|day| weekday_token(day).to_owned())
                    .collect(),
            ),
        }
    }
}

impl TryFrom<RecurrenceRepr> for Recurrence {
    type Error = CoreError;

    fn try_from(repr: RecurrenceRepr) -> Result<Self> {
        match repr {
            RecurrenceRepr::Days(days) => Self::every(days),
            RecurrenceRepr::Cycle(tokens) => {
                let days = tokens
                    .iter()
                    .map(|token| {
                        parse_weekday(token).ok_or_else(|| CoreError::InvalidRecurrence(token.clone()))
                    })
                    .collect::<Result<Vec<_>>>()?;
                Self::cycle(days)
            }
            RecurrenceRepr::Tag(tag) => tag.parse(),
        }
    }
}
