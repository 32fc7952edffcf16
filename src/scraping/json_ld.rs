use serde_json::Value;

use crate::models::StructuredEvent;

/// Collects event objects from one `application/ld+json` block. A block that
/// is not valid JSON yields nothing.
pub fn events_from_script(raw: &str) -> Vec<StructuredEvent> {
    match serde_json::from_str::<Value>(raw.trim()) {
        Ok(value) => {
            let mut events = Vec::new();
            collect(&value, &mut events);
            events
        }
        Err(err) => {
            tracing::debug!("skipping malformed json-ld block: {err}");
            Vec::new()
        }
    }
}

fn collect(value: &Value, out: &mut Vec<StructuredEvent>) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect(item, out);
            }
        }
        Value::Object(map) => {
            if let Some(graph) = map.get("@graph") {
                collect(graph, out);
            }
            if let Some(event) = parse_event(value) {
                out.push(event);
            }
        }
        _ => {}
    }
}

fn is_event_type(value: &Value) -> bool {
    match value {
        Value::String(kind) => kind.ends_with("Event"),
        Value::Array(kinds) => kinds.iter().any(is_event_type),
        _ => false,
    }
}

fn text_of(value: Option<&Value>) -> Option<String> {
    let text = value?.as_str()?.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// `location` may be a plain string, a Place object, or a list of either.
fn location_of(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(_) => text_of(value),
        Value::Object(place) => text_of(place.get("name")).or_else(|| {
            match place.get("address") {
                Some(Value::Object(address)) => text_of(address.get("addressLocality")),
                other => text_of(other),
            }
        }),
        Value::Array(items) => items.iter().find_map(|item| location_of(Some(item))),
        _ => None,
    }
}

/// `None` when the object is not an event or carries nothing usable.
pub fn parse_event(value: &Value) -> Option<StructuredEvent> {
    let map = value.as_object()?;
    if !is_event_type(map.get("@type")?) {
        return None;
    }
    let event = StructuredEvent {
        name: text_of(map.get("name")),
        start_date: text_of(map.get("startDate")),
        end_date: text_of(map.get("endDate")),
        location: location_of(map.get("location")),
    };
    if event == StructuredEvent::default() {
        return None;
    }
    Some(event)
}
