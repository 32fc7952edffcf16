use anyhow::Result;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use super::{base, json_ld, PageSource};
use crate::models::PagePayload;

static MAIN_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    ["main", "#main", ".container, .content, .page-content", "body"]
        .iter()
        .map(|css| Selector::parse(css).expect("main block selector"))
        .collect()
});
static H1_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").expect("h1 selector"));
static H2_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("h2").expect("h2 selector"));
static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("title").expect("title selector"));
static TIME_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("time[datetime]").expect("time cue selector"));
static JSON_LD_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"script[type="application/ld+json"]"#).expect("json-ld selector")
});

/// Downloads a page and distills it without running any scripts.
pub struct HttpPageSource;

impl PageSource for HttpPageSource {
    fn fetch(&self, url: &str) -> Result<PagePayload> {
        let html = base::fetch_html(url)?;
        Ok(parse_document(&html))
    }
}

fn outside_chrome(element: ElementRef<'_>) -> bool {
    !base::is_chrome(element)
        && element
            .ancestors()
            .filter_map(ElementRef::wrap)
            .all(|ancestor| !base::is_chrome(ancestor))
}

fn first_heading(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .find(|el| outside_chrome(*el))
        .map(base::inner_text)
        .filter(|text| !text.is_empty())
}

pub fn parse_document(html: &str) -> PagePayload {
    let document = Html::parse_document(html);

    let main = MAIN_SELECTORS
        .iter()
        .find_map(|selector| document.select(selector).find(|el| outside_chrome(*el)));
    let text = main.map(base::visible_text).unwrap_or_default();

    let title_candidates = [&*H1_SELECTOR, &*H2_SELECTOR, &*TITLE_SELECTOR]
        .into_iter()
        .filter_map(|selector| first_heading(&document, selector))
        .collect();

    let time_cues: Vec<String> = main
        .map(|block| {
            block
                .select(&TIME_SELECTOR)
                .filter(|el| outside_chrome(*el))
                .filter_map(|el| el.value().attr("datetime"))
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let structured_events = document
        .select(&JSON_LD_SELECTOR)
        .flat_map(|script| json_ld::events_from_script(&script.text().collect::<String>()))
        .collect();

    PagePayload {
        text,
        title_candidates,
        time_cues,
        structured_events,
    }
}
