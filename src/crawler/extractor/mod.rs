
use anyhow::{Result, anyhow};
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

/// Elements whose text is never shown to a reader
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Visible text and outgoing links of one HTML page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPage {
    /// Whitespace-collapsed visible text
    pub text: String,
    /// Absolute link targets, in document order, duplicates kept
    pub links: Vec<Url>,
}

/// Parse an HTML page fetched from `page_url`
#[inline]
pub fn extract_page(html: &str, page_url: &Url) -> Result<ExtractedPage> {
    let document = Html::parse_document(html);

    let text = visible_text(&document);
    let links = extract_links(&document, page_url)?;

    debug!(
        "Extracted {} chars and {} links from {}",
        text.len(),
        links.len(),
        page_url
    );

    Ok(ExtractedPage { text, links })
}

fn visible_text(document: &Html) -> String {
    let mut pieces: Vec<&str> = Vec::new();

    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|element| HIDDEN_ELEMENTS.contains(&element.name()))
        });
        if !hidden {
            pieces.push(text);
        }
    }

    clean_text(&pieces.join(" "))
}

/// Collapse every whitespace run into a single space
#[inline]
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn extract_links(document: &Html, page_url: &Url) -> Result<Vec<Url>> {
    let link_selector =
        Selector::parse("a[href]").map_err(|e| anyhow!("Failed to create CSS selector: {:?}", e))?;

    let mut links = Vec::new();
    for element in document.select(&link_selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let href = href.trim();
        if href.is_empty()
            || href.starts_with('#')
            || href.starts_with("mailto:")
            || href.starts_with("javascript:")
            || href.starts_with("tel:")
        {
            continue;
        }

        match page_url.join(href) {
            Ok(absolute) if matches!(absolute.scheme(), "http" | "https") => links.push(absolute),
            Ok(_) => {}
            Err(e) => debug!(
                "Failed to resolve URL '{}' relative to '{}': {}",
                href, page_url, e
            ),
        }
    }

    Ok(links)
}

/// First path segment of a page, or "homepage" for the site root
#[inline]
pub fn section_for(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.find(|s| !s.is_empty()))
        .map_or_else(|| "homepage".to_string(), str::to_string)
}
