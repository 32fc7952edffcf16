use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use reqwest::blocking::Client;
use scraper::{ElementRef, Node};

/// Elements whose text is page chrome rather than event content.
const CHROME_TAGS: [&str; 6] = ["header", "footer", "nav", "script", "style", "noscript"];
const CHROME_CLASSES: [&str; 3] = ["navbar", "site-header", "site-footer"];

const BLOCK_TAGS: [&str; 27] = [
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "form", "h1", "h2", "h3", "h4", "h5", "h6", "hr", "li", "main",
    "ol", "p", "pre", "section", "table", "ul",
];

pub fn clean_text(input: &str) -> String {
    input
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

pub fn inner_text(element: ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<Vec<_>>().join(" "))
}

pub fn fetch_html(url: &str) -> Result<String> {
    static CLIENT: Lazy<Option<Client>> = Lazy::new(|| {
        Client::builder()
            .timeout(Duration::from_secs(20))
            .user_agent("fide-ics/0.1 (calendar builder)")
            .build()
            .map_err(|err| tracing::error!("failed to build http client: {err}"))
            .ok()
    });

    let client = (*CLIENT).as_ref().context("http client unavailable")?;
    let response = client
        .get(url)
        .send()
        .with_context(|| format!("request failed for {url}"))?;
    let response = response
        .error_for_status()
        .with_context(|| format!("non-success status for {url}"))?;
    response
        .text()
        .with_context(|| format!("unable to read response body for {url}"))
}

pub fn is_chrome(element: ElementRef<'_>) -> bool {
    let value = element.value();
    CHROME_TAGS.contains(&value.name())
        || value
            .classes()
            .any(|class| CHROME_CLASSES.contains(&class))
}

/// Renders visible text roughly the way a browser's `innerText` does: block
/// elements, rows and `<br>` start new lines, table cells are space separated,
/// and chrome subtrees are skipped.
pub fn visible_text(root: ElementRef<'_>) -> String {
    let mut out = String::new();
    render(root, &mut out);
    out.lines()
        .map(clean_text)
        .collect::<Vec<_>>()
        .join("\n")
}

fn render(element: ElementRef<'_>, out: &mut String) {
    if is_chrome(element) {
        return;
    }
    let name = element.value().name();
    if name == "br" {
        out.push('\n');
        return;
    }
    let block = BLOCK_TAGS.contains(&name) || name == "tr";
    if block {
        out.push('\n');
    }
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    render(child_element, out);
                }
            }
            _ => {}
        }
    }
    if block {
        out.push('\n');
    } else if name == "td" || name == "th" {
        out.push(' ');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    #[test]
    fn renders_blocks_on_separate_lines() {
        let html = Html::parse_document(
            r#"<body>
                <nav>Home | Calendar</nav>
                <div class="navbar">Login</div>
                <div><h2>Open  Championship</h2><p>Venue: <b>Hotel</b> Astoria</p>Line<br>Break</div>
                <table><tr><td>City:</td><td>Oslo</td></tr></table>
                <script>var x = "Venue: nowhere";</script>
            </body>"#,
        );
        let body = html
            .select(&Selector::parse("body").unwrap())
            .next()
            .unwrap();

        let lines: Vec<String> = visible_text(body)
            .lines()
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        assert_eq!(
            lines,
            vec![
                "Open Championship",
                "Venue: Hotel Astoria",
                "Line",
                "Break",
                "City: Oslo",
            ]
        );
    }
}
