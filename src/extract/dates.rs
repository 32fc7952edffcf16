//! Date and date-range heuristics for the text shapes seen on event pages.
//!
//! [`resolve_range`] tries a fixed chain of patterns and stops at the first one
//! that yields a real calendar date. [`parse_single`] handles one date value,
//! such as the contents of a `Start:` field or a `datetime` attribute.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::models::EventTime;

const MONTHS: &str = "(January|February|March|April|May|June|July|August|September|October|November|December|Jan|Feb|Mar|Apr|Jun|Jul|Aug|Sept|Sep|Oct|Nov|Dec)";

static DAY_RANGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\b(\d{{1,2}})\s*(?:–|-|to)\s*(\d{{1,2}})\s+{MONTHS}\s+(\d{{4}})\b"
    ))
    .expect("valid day range regex")
});

static DATE_RANGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\b(\d{{1,2}})\s+{MONTHS}\s+(\d{{4}})\s*(?:–|-|to)\s*(\d{{1,2}})(?:\s+{MONTHS})?(?:\s+(\d{{4}}))?\b"
    ))
    .expect("valid date range regex")
});

static DATE_TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\b(\d{{1,2}})\s+{MONTHS}\s+(\d{{4}})\s+(\d{{1,2}}):(\d{{2}})(?:\s*[-–]\s*(\d{{1,2}}):(\d{{2}}))?"
    ))
    .expect("valid date time regex")
});

static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)\b(\d{{1,2}})\s+{MONTHS}\s+(\d{{4}})\b")).expect("valid date regex")
});

static SINGLE_DMY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)^(\d{{1,2}})\s+{MONTHS}\.?,?\s+(\d{{4}})(?:,?\s+(\d{{1,2}}):(\d{{2}}))?$"
    ))
    .expect("valid single date regex")
});

static SINGLE_MDY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)^{MONTHS}\.?\s+(\d{{1,2}}),?\s+(\d{{4}})$"
    ))
    .expect("valid month first regex")
});

static NUMERIC_DMY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2})[./](\d{1,2})[./](\d{4})$").expect("valid numeric date regex")
});

/// Outcome of a range lookup. `start == None` means nothing was recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResolvedRange {
    pub start: Option<EventTime>,
    pub end: Option<EventTime>,
    pub has_time: bool,
}

impl ResolvedRange {
    pub fn unresolved() -> Self {
        Self::default()
    }

    pub fn is_resolved(&self) -> bool {
        self.start.is_some()
    }

    fn dates(start: NaiveDate, end: Option<NaiveDate>) -> Self {
        Self {
            start: Some(EventTime::Date(start)),
            end: end.map(EventTime::Date),
            has_time: false,
        }
    }
}

pub fn month_number(name: &str) -> Option<u32> {
    let prefix: String = name.chars().take(3).collect::<String>().to_lowercase();
    let month = match prefix.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

/// Collapses the text onto one line so patterns can span line breaks.
fn join_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn num<T: std::str::FromStr>(caps: &Captures<'_>, idx: usize) -> Option<T> {
    caps.get(idx)?.as_str().parse().ok()
}

fn date_from(day: &str, month: &str, year: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month_number(month)?, day.parse().ok()?)
}

fn time_from(hour: Option<u32>, minute: Option<u32>) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(hour?, minute?, 0)
}

/// Runs the pattern chain over `text`; the first pattern producing valid dates wins.
///
/// An end before the start (e.g. `25-20 Aug 2025`) is returned as found.
pub fn resolve_range(text: &str) -> ResolvedRange {
    let joined = join_lines(text);

    if let Some(caps) = DAY_RANGE_RE.captures(&joined) {
        let start = date_from(&caps[1], &caps[3], &caps[4]);
        let end = date_from(&caps[2], &caps[3], &caps[4]);
        if let (Some(start), Some(end)) = (start, end) {
            return ResolvedRange::dates(start, Some(end));
        }
    }

    if let Some(caps) = DATE_RANGE_RE.captures(&joined) {
        let start = date_from(&caps[1], &caps[2], &caps[3]);
        let end_month = caps.get(5).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
        let end_year = caps.get(6).or_else(|| caps.get(3)).map_or("", |m| m.as_str());
        let end = date_from(&caps[4], end_month, end_year);
        if let (Some(start), Some(end)) = (start, end) {
            return ResolvedRange::dates(start, Some(end));
        }
    }

    if let Some(caps) = DATE_TIME_RE.captures(&joined) {
        let date = date_from(&caps[1], &caps[2], &caps[3]);
        let first = time_from(num(&caps, 4), num(&caps, 5));
        if let (Some(date), Some(first)) = (date, first) {
            let second = time_from(num(&caps, 6), num(&caps, 7));
            return ResolvedRange {
                start: Some(EventTime::DateTime(date.and_time(first))),
                end: second.map(|time| EventTime::DateTime(date.and_time(time))),
                has_time: true,
            };
        }
    }

    // Unlike the range shapes, a bare date keeps scanning past impossible matches.
    if let Some(date) = DATE_RE
        .captures_iter(&joined)
        .find_map(|caps| date_from(&caps[1], &caps[2], &caps[3]))
    {
        return ResolvedRange::dates(date, None);
    }

    ResolvedRange::unresolved()
}

/// Parses one date value in any of the accepted single-date shapes.
pub fn parse_single(text: &str) -> Option<EventTime> {
    let value = text.trim();
    if value.is_empty() {
        return None;
    }

    if let Some(caps) = SINGLE_DMY_RE.captures(value) {
        let date = date_from(&caps[1], &caps[2], &caps[3])?;
        return match caps.get(4) {
            Some(_) => {
                let time = time_from(num(&caps, 4), num(&caps, 5))?;
                Some(EventTime::DateTime(date.and_time(time)))
            }
            None => Some(EventTime::Date(date)),
        };
    }

    if let Some(caps) = SINGLE_MDY_RE.captures(value) {
        return date_from(&caps[2], &caps[1], &caps[3]).map(EventTime::Date);
    }

    if let Some(caps) = NUMERIC_DMY_RE.captures(value) {
        let date = NaiveDate::from_ymd_opt(num(&caps, 3)?, num(&caps, 2)?, num(&caps, 1)?)?;
        return Some(EventTime::Date(date));
    }

    parse_iso(value)
}

fn parse_iso(value: &str) -> Option<EventTime> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(EventTime::Date(date));
    }
    // Offsets are dropped; the wall-clock time printed on the page is kept.
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(EventTime::DateTime(dt.naive_local()));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(EventTime::DateTime(dt));
        }
    }
    for fmt in ["%Y-%m-%dT%H:%M%:z", "%Y-%m-%dT%H:%M%z"] {
        if let Ok(dt) = DateTime::parse_from_str(value, fmt) {
            return Some(EventTime::DateTime(dt.naive_local()));
        }
    }
    None
}
