//! [`HtmlParser`] backed by the `scraper` crate.

use scraper::{ElementRef, Html};

use super::{ElementQuery, HtmlDocument, HtmlElement, HtmlParser};

/// Parser producing [`ScraperDocument`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScraperParser;

impl HtmlParser for ScraperParser {
    type Document = ScraperDocument;

    fn parse(&self, html: &str) -> Self::Document {
        ScraperDocument(Html::parse_document(html))
    }
}

#[derive(Debug)]
pub struct ScraperDocument(Html);

impl HtmlDocument for ScraperDocument {
    type Element<'a> = ScraperElement<'a>;

    fn root(&self) -> Self::Element<'_> {
        ScraperElement(self.0.root_element())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ScraperElement<'a>(ElementRef<'a>);

impl<'a> HtmlElement<'a> for ScraperElement<'a> {
    fn tag(&self) -> &'a str {
        self.0.value().name()
    }

    fn find_all(&self, query: &ElementQuery) -> Vec<Self> {
        self.0
            .descendants()
            .skip(1)
            .filter_map(ElementRef::wrap)
            .map(ScraperElement)
            .filter(|el| query.matches(el))
            .collect()
    }

    fn text(&self) -> String {
        self.0
            .text()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .concat()
    }

    fn attr(&self, name: &str) -> Option<&'a str> {
        self.0.value().attr(name)
    }

    fn classes(&self) -> Vec<&'a str> {
        self.0.value().classes().collect()
    }

    fn parent(&self) -> Option<Self> {
        self.0.parent().and_then(ElementRef::wrap).map(ScraperElement)
    }
}
