use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

static FIELD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([A-Za-z ]{3,30})\s*:\s*(.+)$").expect("valid field regex")
});

/// Lowercased label to trimmed value. A repeated label keeps its last value.
pub type FieldMap = HashMap<String, String>;

pub fn extract_fields(text: &str) -> FieldMap {
    let mut fields = FieldMap::new();
    for line in text.lines() {
        if let Some(caps) = FIELD_RE.captures(line) {
            let key = caps[1].trim().to_lowercase();
            let value = caps[2].trim().to_string();
            fields.insert(key, value);
        }
    }
    fields
}

/// First present, non-blank value among `keys`.
pub fn first_field<'a>(fields: &'a FieldMap, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| fields.get(*key))
        .map(|value| value.trim())
        .find(|value| !value.is_empty())
}
