use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// A resolved point in time: either a whole calendar day or a floating wall-clock time.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventTime {
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl EventTime {
    pub fn date(&self) -> NaiveDate {
        match self {
            EventTime::Date(date) => *date,
            EventTime::DateTime(dt) => dt.date(),
        }
    }

    /// Date-only values are read as midnight.
    pub fn to_datetime(&self) -> NaiveDateTime {
        match self {
            EventTime::Date(date) => date.and_time(NaiveTime::MIN),
            EventTime::DateTime(dt) => *dt,
        }
    }

    pub fn has_clock_time(&self) -> bool {
        match self {
            EventTime::Date(_) => false,
            EventTime::DateTime(dt) => dt.num_seconds_from_midnight() != 0,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct EventRecord {
    pub title: String,
    pub location: String,
    pub description: String,
    pub start: Option<EventTime>,
    pub end: Option<EventTime>,
    pub has_time: bool,
    pub source_url: String,
}

/// An event object embedded in the page as JSON-LD.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct StructuredEvent {
    pub name: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub location: Option<String>,
}

/// Everything a page source hands over for one URL. Any part may be empty.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct PagePayload {
    pub text: String,
    pub title_candidates: Vec<String>,
    pub time_cues: Vec<String>,
    pub structured_events: Vec<StructuredEvent>,
}
