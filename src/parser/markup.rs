//! Markup queries used by the listing and detail parsers.
//!
//! Everything that knows about the HTML library lives here, so a change in
//! the council site's markup means touching the selectors below and nothing
//! else.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use crate::error::ListingError;

static LABELS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span.field-label, h2.side-box-title, dt, th, label").unwrap());
static FIELD_LABEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("span.field-label").unwrap());
static FIELD_VALUE: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".field-value").unwrap());

/// What the parsers need from a page, independent of the HTML library.
pub trait MarkupQuery {
    /// Text of the value belonging to the label captioned `caption`.
    fn labeled_text(&self, caption: &str) -> Option<String>;

    /// Raw `href`s of every anchor matching `selector`, in document order.
    fn hrefs(&self, selector: &str) -> Result<Vec<String>, ListingError>;
}

pub struct HtmlPage {
    document: Html,
}

impl HtmlPage {
    pub fn parse(markup: &str) -> Self {
        Self {
            document: Html::parse_document(markup),
        }
    }

    fn find_label(&self, caption: &str) -> Option<ElementRef<'_>> {
        let labels: Vec<_> = self
            .document
            .select(&LABELS)
            .map(|el| (element_text(el), el))
            .collect();

        labels
            .iter()
            .find(|(text, _)| text == caption)
            .or_else(|| labels.iter().find(|(text, _)| text.contains(caption)))
            .map(|(_, el)| *el)
    }
}

impl MarkupQuery for HtmlPage {
    fn labeled_text(&self, caption: &str) -> Option<String> {
        let label = self.find_label(caption)?;
        let siblings: Vec<ElementRef> = label.next_siblings().filter_map(ElementRef::wrap).collect();

        // `span.field-label ~ span.field-value`; any other label: `label + *`
        let value = if FIELD_LABEL.matches(&label) {
            siblings.iter().find(|el| FIELD_VALUE.matches(el))?
        } else {
            siblings.first()?
        };

        Some(strip_caption(&element_text(*value), caption))
    }

    fn hrefs(&self, selector: &str) -> Result<Vec<String>, ListingError> {
        let selector =
            Selector::parse(selector).map_err(|_| ListingError::Selector(selector.to_string()))?;
        Ok(self
            .document
            .select(&selector)
            .filter_map(|el| el.value().attr("href"))
            .map(|href| href.trim().to_string())
            .collect())
    }
}

/// Text nodes, each trimmed, joined by single spaces.
fn element_text(el: ElementRef) -> String {
    el.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// "Closing Date: 5 June 2020" -> "5 June 2020"
fn strip_caption(value: &str, caption: &str) -> String {
    match value.strip_prefix(caption) {
        Some(rest) => rest.trim_start().trim_start_matches(':').trim().to_string(),
        None => value.trim().to_string(),
    }
}
