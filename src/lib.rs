mod config;
pub mod extract;
pub mod ics;
pub mod models;
pub mod scraping;
mod utils;

use std::sync::Arc;

use anyhow::Context;
use chrono::Local;
use tracing_subscriber::EnvFilter;

pub use config::AppConfig;
use scraping::{html_page::HttpPageSource, PageSource, RunOptions};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // A second init (e.g. an embedding host already installed one) is harmless.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Fetches every configured page and writes the calendar file.
pub fn run() -> anyhow::Result<()> {
    init_tracing();
    let config = AppConfig::load();
    let source: Arc<dyn PageSource> = Arc::new(HttpPageSource);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    runtime.block_on(build_calendar(&config, source))
}

pub async fn build_calendar(config: &AppConfig, source: Arc<dyn PageSource>) -> anyhow::Result<()> {
    tracing::info!(urls = config.urls.len(), "scraping event pages");
    let options = RunOptions {
        brand_name: config.brand_name.clone(),
        default_title: config.default_title.clone(),
        max_concurrent_fetches: config.max_concurrent_fetches,
    };
    let records = scraping::run_all(source, &config.urls, options).await;

    let unresolved = records.iter().filter(|r| r.start.is_none()).count();
    if unresolved > 0 {
        tracing::warn!(unresolved, "some pages had no recognisable date; using placeholders");
    }

    let today = Local::now().date_naive();
    let written = ics::write_calendar(&config.output_path, &records, today, config.tz())?;
    tracing::info!(
        path = %config.output_path.display(),
        "wrote ICS with {written} events"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PagePayload;

    struct StaticPage;

    impl PageSource for StaticPage {
        fn fetch(&self, url: &str) -> anyhow::Result<PagePayload> {
            if url.ends_with("/down") {
                anyhow::bail!("connection refused");
            }
            Ok(PagePayload {
                text: "Dates: 20-25 Aug 2025\nVenue: Chess Palace".to_string(),
                title_candidates: vec!["Summer Open".to_string()],
                ..PagePayload::default()
            })
        }
    }

    #[tokio::test]
    async fn writes_one_event_per_url() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = AppConfig {
            urls: vec![
                "https://example.org/open".to_string(),
                "https://example.org/down".to_string(),
            ],
            output_path: dir.path().join("out").join("events.ics"),
            ..AppConfig::default()
        };

        build_calendar(&config, Arc::new(StaticPage))
            .await
            .expect("calendar written");

        let ics = std::fs::read_to_string(&config.output_path).expect("read output");
        assert_eq!(ics.matches("BEGIN:VEVENT").count(), 2, "ICS:\n{ics}");
        assert!(ics.contains("SUMMARY:Summer Open"));
        assert!(ics.contains("SUMMARY:FIDE Event"));
        assert!(ics.contains("DTSTART;VALUE=DATE:20250820"));
        assert!(ics.contains("DTEND;VALUE=DATE:20250826"));
        let open = ics.find(&ics::event_uid("https://example.org/open")).expect("first uid");
        let down = ics.find(&ics::event_uid("https://example.org/down")).expect("second uid");
        assert!(open < down);
    }
}
