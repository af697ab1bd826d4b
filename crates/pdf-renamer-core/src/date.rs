//! Date extraction from free text.
//!
//! Patterns are tried strictly in table order. For each pattern the text is
//! scanned left to right and the first match that is also a real calendar
//! date wins. A match that fails validation (month 13, 31 February) is
//! skipped and scanning carries on.

use chrono::NaiveDate;
use regex::{Captures, Regex};
use tracing::trace;

/// Turns the captures of one pattern into a calendar date, or rejects them.
pub type DateValidator = fn(&Captures<'_>) -> Option<NaiveDate>;

/// One row of the pattern table.
pub struct DatePattern {
    pub name: &'static str,
    /// Lower runs first.
    pub priority: u8,
    pub matcher: Regex,
    pub validator: DateValidator,
}

/// A resolved date together with the pattern and text that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateMatch {
    pub date: NaiveDate,
    pub pattern: &'static str,
    pub matched: String,
}

pub struct DateExtractor {
    patterns: Vec<DatePattern>,
}

impl Default for DateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl DateExtractor {
    /// The built-in table, most specific first:
    /// ISO, then long forms with a month name, then numeric day-first forms.
    pub fn new() -> Self {
        Self::with_patterns(default_patterns())
    }

    pub fn with_patterns(mut patterns: Vec<DatePattern>) -> Self {
        patterns.sort_by_key(|p| p.priority);
        Self { patterns }
    }

    pub fn patterns(&self) -> &[DatePattern] {
        &self.patterns
    }

    pub fn extract(&self, text: &str) -> Option<NaiveDate> {
        self.find(text).map(|m| m.date)
    }

    pub fn find(&self, text: &str) -> Option<DateMatch> {
        for pattern in &self.patterns {
            for caps in pattern.matcher.captures_iter(text) {
                let matched = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
                match (pattern.validator)(&caps) {
                    Some(date) => {
                        return Some(DateMatch {
                            date,
                            pattern: pattern.name,
                            matched: matched.to_string(),
                        })
                    }
                    None => trace!("'{}' matched {} but is not a date", matched, pattern.name),
                }
            }
        }
        None
    }

    /// Search pages in order; the first page holding a valid date wins.
    pub fn extract_from_pages<S: AsRef<str>>(&self, pages: &[S]) -> Option<NaiveDate> {
        pages.iter().find_map(|page| self.extract(page.as_ref()))
    }
}

fn default_patterns() -> Vec<DatePattern> {
    // The expressions are literals; a failure here is a programming error.
    let compile = |re: &str| Regex::new(re).expect("built-in date pattern must compile");
    vec![
        DatePattern {
            name: "iso",
            priority: 0,
            matcher: compile(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b"),
            validator: |c| ymd(&c[1], &c[2], &c[3]),
        },
        DatePattern {
            name: "day-month-name-year",
            priority: 10,
            matcher: compile(r"\b(\d{1,2})(?:st|nd|rd|th)?\s+([A-Za-z]{3,})\.?,?\s+(\d{4})\b"),
            validator: |c| month_from_name(&c[2]).and_then(|m| ymd_num(&c[3], m, &c[1])),
        },
        DatePattern {
            name: "month-name-day-year",
            priority: 20,
            matcher: compile(r"\b([A-Za-z]{3,})\.?\s+(\d{1,2})(?:st|nd|rd|th)?,?\s+(\d{4})\b"),
            validator: |c| month_from_name(&c[1]).and_then(|m| ymd_num(&c[3], m, &c[2])),
        },
        // Numeric forms are ambiguous; day-first is the fixed reading.
        DatePattern {
            name: "day-month-year-slash",
            priority: 30,
            matcher: compile(r"\b(\d{1,2})/(\d{1,2})/(\d{4})\b"),
            validator: |c| ymd(&c[3], &c[2], &c[1]),
        },
        DatePattern {
            name: "day-month-year-dash",
            priority: 40,
            matcher: compile(r"\b(\d{1,2})-(\d{1,2})-(\d{4})\b"),
            validator: |c| ymd(&c[3], &c[2], &c[1]),
        },
    ]
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    let month: u32 = month.parse().ok()?;
    ymd_num(year, month, day)
}

fn ymd_num(year: &str, month: u32, day: &str) -> Option<NaiveDate> {
    let year: i32 = year.parse().ok()?;
    let day: u32 = day.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Full English month names, their three-letter abbreviations, and "sept".
fn month_from_name(name: &str) -> Option<u32> {
    let name = name.to_ascii_lowercase();
    if name == "sept" {
        return Some(9);
    }
    MONTHS
        .iter()
        .position(|full| *full == name || (name.len() == 3 && full.starts_with(&name)))
        .map(|idx| idx as u32 + 1)
}
