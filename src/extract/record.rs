use once_cell::sync::Lazy;
use regex::Regex;

use super::dates::{self, ResolvedRange};
use super::fields::{self, FieldMap};
use crate::models::{EventRecord, PagePayload};

/// Labels copied into the description, in this order.
const DESCRIPTION_KEYS: [&str; 17] = [
    "date",
    "dates",
    "start",
    "end",
    "venue",
    "location",
    "city",
    "country",
    "organizer",
    "chief arbiter",
    "time control",
    "format",
    "prizes",
    "contact",
    "website",
    "email",
    "phone",
];

const LOCATION_KEYS: [&str; 5] = ["venue", "location", "city", "place", "country"];
const RANGE_KEYS: [&str; 2] = ["date", "dates"];
const START_KEYS: [&str; 3] = ["start", "start date", "from"];
const END_KEYS: [&str; 3] = ["end", "end date", "to"];

const SNIPPET_CHARS: usize = 1500;

static TRAILING_BLANKS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t]+\n").expect("valid trailing blank regex"));
static BLANK_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("valid blank run regex"));

/// Knobs the assembler takes from configuration.
#[derive(Debug, Clone)]
pub struct TitlePolicy<'a> {
    pub brand_name: &'a str,
    pub default_title: &'a str,
}

pub fn clean_text(input: &str) -> String {
    let text = input.replace('\r', "");
    let text = TRAILING_BLANKS_RE.replace_all(&text, "\n");
    let text = BLANK_RUN_RE.replace_all(&text, "\n\n");
    text.trim().to_string()
}

/// Builds the record for one page. Never fails; missing data narrows the output.
pub fn assemble(url: &str, payload: &PagePayload, policy: &TitlePolicy<'_>) -> EventRecord {
    let text = clean_text(&payload.text);
    let fields = fields::extract_fields(&text);

    let title = pick_title(payload, policy);
    let location = pick_location(&fields, payload);
    let range = resolve_dates(&fields, payload, &text);
    let description = build_description(url, &fields, &text);

    tracing::debug!(
        url,
        fields = fields.len(),
        resolved = range.is_resolved(),
        has_time = range.has_time,
        "assembled record"
    );

    EventRecord {
        title,
        location,
        description,
        start: range.start,
        end: range.end,
        has_time: range.has_time,
        source_url: url.to_string(),
    }
}

fn pick_title(payload: &PagePayload, policy: &TitlePolicy<'_>) -> String {
    let metadata_titles = payload
        .structured_events
        .iter()
        .filter_map(|event| event.name.as_deref());

    payload
        .title_candidates
        .iter()
        .map(String::as_str)
        .chain(metadata_titles)
        .map(str::trim)
        .find(|candidate| {
            !candidate.is_empty()
                && (policy.brand_name.is_empty() || !candidate.contains(policy.brand_name))
        })
        .unwrap_or(policy.default_title)
        .to_string()
}

fn pick_location(fields: &FieldMap, payload: &PagePayload) -> String {
    if let Some(value) = fields::first_field(fields, &LOCATION_KEYS) {
        return value.to_string();
    }
    payload
        .structured_events
        .iter()
        .filter_map(|event| event.location.as_deref())
        .map(str::trim)
        .find(|value| !value.is_empty())
        .unwrap_or_default()
        .to_string()
}

/// Labelled fields first, then embedded metadata, then a scan of the whole page.
pub fn resolve_dates(fields: &FieldMap, payload: &PagePayload, text: &str) -> ResolvedRange {
    let mut range = ResolvedRange::unresolved();

    if let Some(value) = fields::first_field(fields, &RANGE_KEYS) {
        range = dates::resolve_range(value);
    }

    if !range.is_resolved() {
        let start_value = fields::first_field(fields, &START_KEYS);
        let end_value = fields::first_field(fields, &END_KEYS);
        if start_value.is_some() || end_value.is_some() {
            range = from_start_end(start_value, end_value);
        }
    }

    if !range.is_resolved() {
        range = from_structured(payload);
    }

    if !range.is_resolved() {
        range = from_time_cues(&payload.time_cues);
    }

    if !range.is_resolved() {
        range = dates::resolve_range(text);
    }

    range
}

fn from_start_end(start_value: Option<&str>, end_value: Option<&str>) -> ResolvedRange {
    let start = start_value.and_then(dates::parse_single);
    let end = end_value.and_then(dates::parse_single);
    match (start, start_value) {
        // A start field holding a whole range such as "20-25 Aug 2025".
        (None, Some(value)) => dates::resolve_range(value),
        _ => ResolvedRange {
            has_time: start.is_some_and(|s| s.has_clock_time()),
            start,
            end,
        },
    }
}

fn from_structured(payload: &PagePayload) -> ResolvedRange {
    payload
        .structured_events
        .iter()
        .find_map(|event| {
            let start = event.start_date.as_deref().and_then(dates::parse_single)?;
            let end = event.end_date.as_deref().and_then(dates::parse_single);
            Some(ResolvedRange {
                start: Some(start),
                end,
                has_time: start.has_clock_time(),
            })
        })
        .unwrap_or_default()
}

fn from_time_cues(cues: &[String]) -> ResolvedRange {
    let mut parsed = cues.iter().filter_map(|cue| dates::parse_single(cue));
    match parsed.next() {
        Some(start) => ResolvedRange {
            start: Some(start),
            end: parsed.next(),
            has_time: start.has_clock_time(),
        },
        None => ResolvedRange::unresolved(),
    }
}

fn title_case(label: &str) -> String {
    label
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn build_description(url: &str, fields: &FieldMap, text: &str) -> String {
    let mut lines = vec![format!("Source: {url}")];
    for key in DESCRIPTION_KEYS {
        if let Some(value) = fields.get(key) {
            lines.push(format!("{}: {}", title_case(key), value));
        }
    }

    if lines.len() == 1 {
        let mut snippet: String = text.chars().take(SNIPPET_CHARS).collect();
        if text.chars().nth(SNIPPET_CHARS).is_some() {
            snippet.push('…');
        }
        lines.push(snippet);
    }

    lines.join("\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EventTime, StructuredEvent};
    use chrono::NaiveDate;

    const URL: &str = "https://calendar.fide.com/calendar.php?id=3079";

    fn policy() -> TitlePolicy<'static> {
        TitlePolicy {
            brand_name: "International Chess Federation",
            default_title: "FIDE Event",
        }
    }

    fn payload(text: &str) -> PagePayload {
        PagePayload {
            text: text.to_string(),
            ..PagePayload::default()
        }
    }

    fn d(y: i32, m: u32, day: u32) -> EventTime {
        EventTime::Date(NaiveDate::from_ymd_opt(y, m, day).unwrap())
    }

    #[test]
    fn assembles_labelled_page() {
        let mut page = payload(
            "European Rapid Championship\r\n\
             Dates: 20-25 Aug 2025   \n\
             Venue: Congress Centre\n\
             City: Prague\n\
             Chief Arbiter: IA Jan Novak\n\n\n\n\
             Organizer: Czech Chess Federation\n",
        );
        page.title_candidates = vec![
            "FIDE - International Chess Federation".to_string(),
            "European Rapid Championship 2025".to_string(),
        ];

        let record = assemble(URL, &page, &policy());
        assert_eq!(record.title, "European Rapid Championship 2025");
        assert_eq!(record.location, "Congress Centre");
        assert_eq!(record.start, Some(d(2025, 8, 20)));
        assert_eq!(record.end, Some(d(2025, 8, 25)));
        assert!(!record.has_time);
        assert_eq!(record.source_url, URL);
        assert_eq!(
            record.description,
            format!(
                "Source: {URL}\nDates: 20-25 Aug 2025\nVenue: Congress Centre\nCity: Prague\nOrganizer: Czech Chess Federation\nChief Arbiter: IA Jan Novak"
            )
        );
    }

    #[test]
    fn empty_page_still_yields_a_record() {
        let record = assemble(URL, &PagePayload::default(), &policy());
        assert_eq!(record.title, "FIDE Event");
        assert_eq!(record.location, "");
        assert_eq!(record.start, None);
        assert_eq!(record.end, None);
        assert!(!record.has_time);
        assert_eq!(record.description, format!("Source: {URL}"));
    }

    #[test]
    fn branded_titles_fall_back_to_default() {
        let mut page = payload("");
        page.title_candidates = vec![
            "  ".to_string(),
            "International Chess Federation".to_string(),
        ];
        assert_eq!(assemble(URL, &page, &policy()).title, "FIDE Event");
    }

    #[test]
    fn metadata_name_is_last_title_source() {
        let mut page = payload("");
        page.title_candidates = vec!["International Chess Federation".to_string()];
        page.structured_events = vec![StructuredEvent {
            name: Some("World Cup 2025".to_string()),
            ..StructuredEvent::default()
        }];
        assert_eq!(assemble(URL, &page, &policy()).title, "World Cup 2025");
    }

    #[test]
    fn description_falls_back_to_truncated_text() {
        let text = "x".repeat(1600);
        let record = assemble(URL, &payload(&text), &policy());
        let body = record
            .description
            .strip_prefix(&format!("Source: {URL}\n"))
            .expect("source header");
        assert_eq!(body.chars().count(), 1501);
        assert!(body.ends_with('…'));

        let short = assemble(URL, &payload("Open tournament in Oslo"), &policy());
        assert_eq!(
            short.description,
            format!("Source: {URL}\nOpen tournament in Oslo")
        );
    }

    #[test]
    fn description_always_starts_with_source() {
        for text in ["", "Venue: Hall", "just text", "Date: 1 May 2025"] {
            let record = assemble(URL, &payload(text), &policy());
            assert_eq!(
                record.description.lines().next(),
                Some(format!("Source: {URL}").as_str())
            );
        }
    }

    #[test]
    fn location_prefers_fields_then_metadata() {
        let record = assemble(URL, &payload("Country: Norway\nCity: Oslo"), &policy());
        assert_eq!(record.location, "Oslo");

        let mut page = payload("");
        page.structured_events = vec![StructuredEvent {
            location: Some("Grand Hotel".to_string()),
            ..StructuredEvent::default()
        }];
        assert_eq!(assemble(URL, &page, &policy()).location, "Grand Hotel");
    }

    #[test]
    fn date_field_outranks_page_text() {
        let record = assemble(
            URL,
            &payload("Published 1 Jan 2025\nDate: 3 May 2025"),
            &policy(),
        );
        assert_eq!(record.start, Some(d(2025, 5, 3)));
        assert_eq!(record.end, None);
    }

    #[test]
    fn start_and_end_fields_parse_independently() {
        let record = assemble(
            URL,
            &payload("Start date: 2025-10-01\nEnd date: 09.10.2025"),
            &policy(),
        );
        assert_eq!(record.start, Some(d(2025, 10, 1)));
        assert_eq!(record.end, Some(d(2025, 10, 9)));
        assert!(!record.has_time);
    }

    #[test]
    fn start_field_holding_a_range() {
        let record = assemble(URL, &payload("From: 20-25 Aug 2025"), &policy());
        assert_eq!(record.start, Some(d(2025, 8, 20)));
        assert_eq!(record.end, Some(d(2025, 8, 25)));
    }

    #[test]
    fn unparsable_date_field_falls_through_to_text() {
        let record = assemble(
            URL,
            &payload("Date: to be confirmed\nRounds start 7 Nov 2025 15:00"),
            &policy(),
        );
        assert!(record.has_time);
        assert_eq!(
            record.start,
            Some(EventTime::DateTime(
                NaiveDate::from_ymd_opt(2025, 11, 7)
                    .unwrap()
                    .and_hms_opt(15, 0, 0)
                    .unwrap()
            ))
        );
    }

    #[test]
    fn structured_metadata_outranks_page_text() {
        let mut page = payload("Posted 2 Feb 2025");
        page.structured_events = vec![
            StructuredEvent {
                start_date: Some("not a date".to_string()),
                ..StructuredEvent::default()
            },
            StructuredEvent {
                start_date: Some("2025-06-10".to_string()),
                end_date: Some("2025-06-18".to_string()),
                ..StructuredEvent::default()
            },
        ];
        let range = resolve_dates(&FieldMap::new(), &page, &page.text);
        assert_eq!(range.start, Some(d(2025, 6, 10)));
        assert_eq!(range.end, Some(d(2025, 6, 18)));
    }

    #[test]
    fn time_cues_used_before_page_text() {
        let mut page = payload("Posted 2 Feb 2025");
        page.time_cues = vec![
            "soon".to_string(),
            "2025-04-01T10:00".to_string(),
            "2025-04-01T12:30".to_string(),
        ];
        let range = resolve_dates(&FieldMap::new(), &page, &page.text);
        assert!(range.has_time);
        assert_eq!(range.start.map(|t| t.date()), NaiveDate::from_ymd_opt(2025, 4, 1));
        assert!(range.end.is_some());
    }

    #[test]
    fn cleans_page_text() {
        assert_eq!(clean_text("a \t\r\nb\n\n\n\nc\n  "), "a\nb\n\nc");
    }

    #[test]
    fn title_cases_multi_word_labels() {
        assert_eq!(title_case("chief arbiter"), "Chief Arbiter");
        assert_eq!(title_case("email"), "Email");
    }
}
