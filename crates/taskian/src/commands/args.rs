use std::str::FromStr;

use time::Date;
use time::macros::format_description;

/// A day given on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayArg {
    Today,
    Tomorrow,
    On(Date),
}

impl DayArg {
    pub fn resolve(self, today: Date) -> Date {
        match self {
            Self::Today => today,
            Self::Tomorrow => today.next_day().unwrap_or(today),
            Self::On(date) => date,
        }
    }
}

impl FromStr for DayArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "t" | "today" => Ok(Self::Today),
            "tm" | "tomorrow" => Ok(Self::Tomorrow),
            other => Date::parse(other, format_description!("[year]-[month]-[day]"))
                .map(Self::On)
                .map_err(|err| format!("expected YYYY-MM-DD, 't' or 'tm' ({err})")),
        }
    }
}

/// One list position, or every entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    All,
    At(usize),
}

impl FromStr for Selector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") || s.eq_ignore_ascii_case("a") {
            return Ok(Self::All);
        }
        s.parse()
            .map(Self::At)
            .map_err(|_| format!("expected a position, 'all' or 'a', got '{s}'"))
    }
}

/// One task position, or everything due today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompleteTarget {
    Today,
    At(usize),
}

impl FromStr for CompleteTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if matches!(s.to_ascii_lowercase().as_str(), "today" | "t") {
            return Ok(Self::Today);
        }
        s.parse()
            .map(Self::At)
            .map_err(|_| format!("expected a position or 'today', got '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn day_arg_shortcuts_resolve_against_today() -> Result<(), String> {
        let today = date!(2024 - 12 - 31);
        assert_eq!("t".parse::<DayArg>()?.resolve(today), today);
        assert_eq!("TM".parse::<DayArg>()?.resolve(today), date!(2025 - 01 - 01));
        assert_eq!(
            "2025-02-03".parse::<DayArg>()?.resolve(today),
            date!(2025 - 02 - 03)
        );
        assert!("2025-02-30".parse::<DayArg>().is_err());
        assert!("soon".parse::<DayArg>().is_err());
        Ok(())
    }

    #[test]
    fn selectors_accept_keywords_and_numbers() -> Result<(), String> {
        assert_eq!("ALL".parse::<Selector>()?, Selector::All);
        assert_eq!("a".parse::<Selector>()?, Selector::All);
        assert_eq!("4".parse::<Selector>()?, Selector::At(4));
        assert!("-1".parse::<Selector>().is_err());

        assert_eq!("today".parse::<CompleteTarget>()?, CompleteTarget::Today);
        assert_eq!("2".parse::<CompleteTarget>()?, CompleteTarget::At(2));
        assert!("all".parse::<CompleteTarget>().is_err());
        Ok(())
    }
}
