//! Month + year periods and the label format used to group records.
//!
//! Records carry their period as a free-text label such as `"January 2025"`.
//! Labels do not sort lexicographically in calendar order, so every ordering
//! goes through [`compare_labels`], which parses them back into [`Period`]s.

use std::cmp::Ordering;
use std::str::FromStr;

use chrono::{Datelike, Local, Month, NaiveDate};

const MONTHS: [Month; 12] = [
    Month::January,
    Month::February,
    Month::March,
    Month::April,
    Month::May,
    Month::June,
    Month::July,
    Month::August,
    Month::September,
    Month::October,
    Month::November,
    Month::December,
];

/// Today's date on the local wall clock.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Period {
    pub month: Month,
    pub year: i32,
}

impl Period {
    pub fn new(month: Month, year: i32) -> Self {
        Self { month, year }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            month: MONTHS[date.month0() as usize],
            year: date.year(),
        }
    }

    pub fn month_name(&self) -> &'static str {
        self.month.name()
    }

    pub fn label(&self) -> String {
        format!("{} {}", self.month.name(), self.year)
    }

    /// Parse `"<Month> <Year>"`. Month names are matched case-insensitively
    /// and may be abbreviated.
    pub fn parse(label: &str) -> Option<Self> {
        let mut parts = label.split_whitespace();
        let month = parts.next()?.parse::<Month>().ok()?;
        let year = parts.next()?.parse::<i32>().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self { month, year })
    }
}

impl Ord for Period {
    fn cmp(&self, other: &Self) -> Ordering {
        self.year
            .cmp(&other.year)
            .then(self.month.number_from_month().cmp(&other.month.number_from_month()))
    }
}

impl PartialOrd for Period {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.month.name(), self.year)
    }
}

/// Chronological comparison of period labels: year first, then month of year.
/// Labels that do not parse sort after all parsable ones.
pub fn compare_labels(a: &str, b: &str) -> Ordering {
    match (Period::parse(a), Period::parse(b)) {
        (Some(pa), Some(pb)) => pa.cmp(&pb),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

pub fn sort_labels(labels: &mut [String]) {
    labels.sort_by(|a, b| compare_labels(a, b));
}

/// Month names offered when entering a budget.
pub fn month_options() -> Vec<&'static str> {
    MONTHS.iter().map(|m| m.name()).collect()
}

/// Years offered when entering a budget: this year and next.
pub fn year_options(today: NaiveDate) -> [i32; 2] {
    [today.year(), today.year() + 1]
}

/// Which records a view is showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeriodSelector {
    /// The month containing today's date, re-evaluated on every query.
    Current,
    All,
    Label(String),
}

impl PeriodSelector {
    /// The label to match against, or `None` when every period matches.
    pub fn resolve(&self, today: NaiveDate) -> Option<String> {
        match self {
            PeriodSelector::Current => Some(Period::from_date(today).label()),
            PeriodSelector::All => None,
            PeriodSelector::Label(label) => Some(label.clone()),
        }
    }

    pub fn display_label(&self, today: NaiveDate) -> String {
        self.resolve(today).unwrap_or_else(|| "All months".to_string())
    }
}

impl FromStr for PeriodSelector {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("current") {
            Ok(PeriodSelector::Current)
        } else if trimmed.eq_ignore_ascii_case("all") {
            Ok(PeriodSelector::All)
        } else {
            // Normalise "jan 2025" to "January 2025" so it matches stored labels
            let label = Period::parse(trimmed)
                .map(|p| p.label())
                .unwrap_or_else(|| trimmed.to_string());
            Ok(PeriodSelector::Label(label))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_from_date_label() {
        assert_eq!(Period::from_date(date(2025, 1, 15)).label(), "January 2025");
        assert_eq!(Period::from_date(date(2024, 12, 31)).label(), "December 2024");
    }

    #[test]
    fn test_parse_label() {
        let p = Period::parse("March 2025").unwrap();
        assert_eq!(p.month, Month::March);
        assert_eq!(p.year, 2025);
        assert_eq!(Period::parse("mar 2025"), Some(p));
        assert_eq!(Period::parse("March"), None);
        assert_eq!(Period::parse("Smarch 2025"), None);
        assert_eq!(Period::parse("March 2025 extra"), None);
    }

    #[test]
    fn test_sort_across_year_boundary() {
        let mut labels = vec![
            "January 2025".to_string(),
            "December 2024".to_string(),
            "March 2025".to_string(),
        ];
        sort_labels(&mut labels);
        assert_eq!(labels, vec!["December 2024", "January 2025", "March 2025"]);
    }

    #[test]
    fn test_sort_is_calendar_not_lexicographic() {
        let mut labels = vec![
            "September 2024".to_string(),
            "April 2024".to_string(),
            "February 2024".to_string(),
        ];
        sort_labels(&mut labels);
        assert_eq!(labels, vec!["February 2024", "April 2024", "September 2024"]);
    }

    #[test]
    fn test_unparsable_labels_sort_last() {
        let mut labels = vec![
            "zzz".to_string(),
            "May 2030".to_string(),
            "aaa".to_string(),
            "May 2020".to_string(),
        ];
        sort_labels(&mut labels);
        assert_eq!(labels, vec!["May 2020", "May 2030", "aaa", "zzz"]);
    }

    #[test]
    fn test_selector_current_follows_clock() {
        let selector = PeriodSelector::Current;
        assert_eq!(selector.resolve(date(2025, 1, 31)).as_deref(), Some("January 2025"));
        assert_eq!(selector.resolve(date(2025, 2, 1)).as_deref(), Some("February 2025"));
    }

    #[test]
    fn test_selector_from_str() {
        assert_eq!("current".parse::<PeriodSelector>().unwrap(), PeriodSelector::Current);
        assert_eq!("ALL".parse::<PeriodSelector>().unwrap(), PeriodSelector::All);
        assert_eq!(
            "jan 2025".parse::<PeriodSelector>().unwrap(),
            PeriodSelector::Label("January 2025".to_string())
        );
    }

    #[test]
    fn test_display_label() {
        let today = date(2025, 6, 1);
        assert_eq!(PeriodSelector::All.display_label(today), "All months");
        assert_eq!(PeriodSelector::Current.display_label(today), "June 2025");
    }

    #[test]
    fn test_form_options() {
        let months = month_options();
        assert_eq!(months.len(), 12);
        assert_eq!(months[0], "January");
        assert_eq!(months[11], "December");
        assert_eq!(year_options(date(2025, 3, 1)), [2025, 2026]);
    }
}
