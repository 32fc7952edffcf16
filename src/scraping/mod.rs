pub mod base;
pub mod html_page;
pub mod json_ld;

use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::extract::{self, TitlePolicy};
use crate::models::{EventRecord, PagePayload};

/// Supplies the rendered content of one page.
pub trait PageSource: Send + Sync {
    fn fetch(&self, url: &str) -> anyhow::Result<PagePayload>;
}

/// Settings shared by every per-URL task.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub brand_name: String,
    pub default_title: String,
    pub max_concurrent_fetches: usize,
}

fn fetch_or_empty(source: &dyn PageSource, url: &str) -> PagePayload {
    match source.fetch(url) {
        Ok(payload) => payload,
        Err(err) => {
            tracing::warn!(url, "fetch failed, continuing with empty page: {err:#}");
            PagePayload::default()
        }
    }
}

fn build_record(source: &dyn PageSource, url: &str, options: &RunOptions) -> EventRecord {
    let payload = fetch_or_empty(source, url);
    let policy = TitlePolicy {
        brand_name: &options.brand_name,
        default_title: &options.default_title,
    };
    extract::assemble(url, &payload, &policy)
}

/// Fetches and assembles every URL, at most `max_concurrent_fetches` at a
/// time. The result has one record per URL, in the order of `urls`.
pub async fn run_all(
    source: Arc<dyn PageSource>,
    urls: &[String],
    options: RunOptions,
) -> Vec<EventRecord> {
    let options = Arc::new(options);
    let permits = Arc::new(Semaphore::new(
        options
            .max_concurrent_fetches
            .clamp(1, Semaphore::MAX_PERMITS),
    ));
    let mut handles = Vec::with_capacity(urls.len());

    for (index, url) in urls.iter().enumerate() {
        let source = Arc::clone(&source);
        let options = Arc::clone(&options);
        let permits = Arc::clone(&permits);
        let url = url.clone();
        handles.push(tokio::spawn(async move {
            let _permit = permits.acquire_owned().await.ok();
            let task_url = url.clone();
            let record = tokio::task::spawn_blocking(move || {
                build_record(source.as_ref(), &task_url, &options)
            })
            .await;
            (index, url, record)
        }));
    }

    let mut slots: Vec<Option<EventRecord>> = vec![None; urls.len()];
    for handle in handles {
        match handle.await {
            Ok((index, _, Ok(record))) => slots[index] = Some(record),
            Ok((_, url, Err(err))) => tracing::error!(url = %url, "page task failed: {err}"),
            Err(err) => tracing::error!("page task failed: {err}"),
        }
    }

    slots
        .into_iter()
        .zip(urls)
        .map(|(slot, url)| slot.unwrap_or_else(|| fallback_record(url, &options)))
        .collect()
}

/// The record an empty page produces, for tasks that never finished.
fn fallback_record(url: &str, options: &RunOptions) -> EventRecord {
    let policy = TitlePolicy {
        brand_name: &options.brand_name,
        default_title: &options.default_title,
    };
    extract::assemble(url, &PagePayload::default(), &policy)
}
