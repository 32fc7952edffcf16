//! iCalendar output: stable identifiers, per-record scheduling and file writing.

use std::{fs, path::Path};

use chrono::{Duration, NaiveDate, NaiveDateTime};
use chrono_tz::Tz;
use icalendar::{Calendar, Component, EventLike, Property, ValueType};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::models::EventRecord;
use crate::utils;

const UID_SUFFIX: &str = "fid-event-scrape";

#[derive(Debug, Error)]
pub enum CalendarError {
    #[error("unable to create output directory for {path}: {source}")]
    CreateDir {
        path: String,
        source: std::io::Error,
    },
    #[error("unable to write calendar to {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
}

/// Same URL, same UID, on every run.
pub fn event_uid(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    format!("{}@{UID_SUFFIX}", &digest[..32])
}

/// How a record lands on the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSchedule {
    Timed {
        begin: NaiveDateTime,
        end: Option<NaiveDateTime>,
    },
    /// `end` is exclusive: the day after the last included day.
    AllDay { begin: NaiveDate, end: NaiveDate },
    /// Nothing was resolved; the event sits on the processing date.
    Placeholder { day: NaiveDate },
}

impl EventSchedule {
    pub fn for_record(record: &EventRecord, today: NaiveDate) -> Self {
        let Some(start) = record.start else {
            return EventSchedule::Placeholder { day: today };
        };

        if record.has_time || start.has_clock_time() {
            return EventSchedule::Timed {
                begin: start.to_datetime(),
                end: record.end.map(|end| end.to_datetime()),
            };
        }

        let last_day = record.end.unwrap_or(start).date();
        EventSchedule::AllDay {
            begin: start.date(),
            end: last_day + Duration::days(1),
        }
    }
}

fn date_property(name: &str, date: NaiveDate) -> Property {
    let mut prop = Property::new(name, date.format("%Y%m%d").to_string());
    prop.append_parameter(ValueType::Date);
    prop
}

fn datetime_property(name: &str, dt: NaiveDateTime, tz: Option<Tz>) -> Property {
    let mut prop = Property::new(name, dt.format("%Y%m%dT%H%M%S").to_string());
    if let Some(tz) = tz {
        prop.add_parameter("TZID", tz.name());
    }
    prop
}

pub fn to_ics_event(record: &EventRecord, today: NaiveDate, tz: Option<Tz>) -> icalendar::Event {
    let mut event = icalendar::Event::new();
    event.uid(&event_uid(&record.source_url));
    event.summary(&record.title);
    if !record.location.is_empty() {
        event.location(&record.location);
    }
    event.description(&record.description);

    match EventSchedule::for_record(record, today) {
        EventSchedule::Timed { begin, end } => {
            event.append_property(datetime_property("DTSTART", begin, tz));
            if let Some(end) = end {
                event.append_property(datetime_property("DTEND", end, tz));
            }
        }
        EventSchedule::AllDay { begin, end } => {
            event.append_property(date_property("DTSTART", begin));
            event.append_property(date_property("DTEND", end));
        }
        EventSchedule::Placeholder { day } => {
            event.append_property(date_property("DTSTART", day));
        }
    }

    event.done()
}

/// One VEVENT per record, in record order.
pub fn encode_calendar(records: &[EventRecord], today: NaiveDate, tz: Option<Tz>) -> String {
    let mut calendar = Calendar::new();
    for record in records {
        calendar.push(to_ics_event(record, today, tz));
    }
    calendar.done().to_string()
}

pub fn write_calendar(
    path: &Path,
    records: &[EventRecord],
    today: NaiveDate,
    tz: Option<Tz>,
) -> Result<usize, CalendarError> {
    utils::ensure_parent(path).map_err(|source| CalendarError::CreateDir {
        path: path.display().to_string(),
        source,
    })?;
    let document = encode_calendar(records, today, tz);
    fs::write(path, document).map_err(|source| CalendarError::Write {
        path: path.display().to_string(),
        source,
    })?;
    Ok(records.len())
}
