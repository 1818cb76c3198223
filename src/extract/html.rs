//! Selector-based extraction from HTML documents

use crate::extract::ExtractionError;
use scraper::{Html, Selector};

/// Link text that marks the shipping-address choice on a print giveaway
const SELECT_ADDRESS_TEXT: &str = "Select This Address";

/// What the entry workflow needs from a giveaway's entry page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPage {
    /// Anti-forgery token from `<meta name="csrf-token">`
    pub csrf_token: Option<String>,

    /// `href` of the first "Select This Address" link
    pub address_link: Option<String>,
}

pub(crate) fn selector(css: &str) -> Result<Selector, ExtractionError> {
    Selector::parse(css).map_err(|e| ExtractionError::InvalidSelector {
        selector: css.to_string(),
        message: format!("{:?}", e),
    })
}

/// Parses an entry page once and pulls out both values
pub fn parse_entry_page(html: &str) -> EntryPage {
    let document = Html::parse_document(html);
    EntryPage {
        csrf_token: meta_content(&document, "csrf-token"),
        address_link: find_link_with_text(&document, SELECT_ADDRESS_TEXT),
    }
}

/// Extracts the CSRF token from a page's metadata
pub fn csrf_token(html: &str) -> Result<String, ExtractionError> {
    let document = Html::parse_document(html);
    meta_content(&document, "csrf-token")
        .ok_or_else(|| ExtractionError::not_found("csrf-token meta tag"))
}

/// Returns the `href` of the first link whose text contains `text`
pub fn link_with_text(html: &str, text: &str) -> Option<String> {
    let document = Html::parse_document(html);
    find_link_with_text(&document, text)
}

fn meta_content(document: &Html, name: &str) -> Option<String> {
    let meta = selector("meta[name][content]").ok()?;
    document
        .select(&meta)
        .find(|element| element.value().attr("name") == Some(name))
        .and_then(|element| element.value().attr("content"))
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
}

fn find_link_with_text(document: &Html, text: &str) -> Option<String> {
    let anchors = selector("a[href]").ok()?;
    document
        .select(&anchors)
        .find(|element| element.text().collect::<String>().contains(text))
        .and_then(|element| element.value().attr("href"))
        .map(|href| href.trim().to_string())
        .filter(|href| !href.is_empty())
}

/// Decodes HTML character references (`&amp;`, `&#x2F;`, ...) in a raw attribute
/// value scraped out of markup
///
/// The value is parsed as an attribute by the HTML tokenizer, so every entity the
/// HTML standard knows is handled.
pub fn unescape_html(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }

    let fragment = Html::parse_fragment(&format!(
        "<a href=\"{}\"></a>",
        raw.replace('"', "&quot;")
    ));
    selector("a[href]")
        .ok()
        .and_then(|anchor| {
            fragment
                .select(&anchor)
                .next()
                .and_then(|element| element.value().attr("href"))
                .map(str::to_string)
        })
        .unwrap_or_else(|| raw.to_string())
}

/// Collapses a document's visible text into single-spaced words
pub(crate) fn document_text(document: &Html) -> String {
    document
        .root_element()
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
