use std::{fs, path::Path, path::PathBuf};

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::utils;

pub const DEFAULT_URLS: [&str; 13] = [
    "https://calendar.fide.com/calendar.php?id=3079",
    "https://calendar.fide.com/calendar.php?id=3220",
    "https://calendar.fide.com/calendar.php?id=6573",
    "https://calendar.fide.com/calendar.php?id=3166",
    "https://calendar.fide.com/calendar.php?id=4750",
    "https://calendar.fide.com/calendar.php?id=4268",
    "https://calendar.fide.com/calendar.php?id=3293",
    "https://calendar.fide.com/calendar.php?id=6475",
    "https://calendar.fide.com/calendar.php?id=5767",
    "https://calendar.fide.com/calendar.php?id=4007",
    "https://calendar.fide.com/calendar.php?id=5775",
    "https://calendar.fide.com/calendar.php?id=2790",
    "https://calendar.fide.com/calendar.php?id=3613",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Source pages, in output order.
    pub urls: Vec<String>,
    pub output_path: PathBuf,
    /// Title candidates containing this text are skipped.
    pub brand_name: String,
    pub default_title: String,
    /// IANA zone attached to timed events; floating times when unset.
    pub timezone: Option<String>,
    pub max_concurrent_fetches: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            urls: DEFAULT_URLS.iter().map(|url| url.to_string()).collect(),
            output_path: PathBuf::from("docs").join("fide_events.ics"),
            brand_name: "International Chess Federation".to_string(),
            default_title: "FIDE Event".to_string(),
            timezone: None,
            max_concurrent_fetches: 4,
        }
    }
}

impl AppConfig {
    /// Reads the config file at the default location, falling back to defaults.
    pub fn load() -> Self {
        let path = utils::config_path();
        match read_config(&path) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(path = %path.display(), "ignoring config file: {err}");
                Self::default()
            }
        }
    }

    /// Unknown zone names are logged and treated as unset.
    pub fn tz(&self) -> Option<Tz> {
        let name = self.timezone.as_deref()?.trim();
        if name.is_empty() {
            return None;
        }
        match name.parse::<Tz>() {
            Ok(tz) => Some(tz),
            Err(err) => {
                tracing::warn!("unknown timezone {name:?}: {err}");
                None
            }
        }
    }
}

fn read_config(path: &Path) -> Result<AppConfig, String> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let contents = fs::read_to_string(path).map_err(|err| err.to_string())?;
    serde_json::from_str(&contents).map_err(|err| err.to_string())
}
