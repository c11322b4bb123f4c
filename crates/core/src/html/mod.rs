//! HTML-structure query capability.
//!
//! Strategies are written against these traits so the parsing library stays
//! an implementation detail. Documents are parsed and queried synchronously;
//! they are not required to be `Send`, so extraction must finish before the
//! next `.await`.

mod scraper_parser;

pub use scraper_parser::{ScraperDocument, ScraperElement, ScraperParser};

/// Parses raw HTML into a queryable document.
pub trait HtmlParser: Send + Sync {
    type Document: HtmlDocument;

    fn parse(&self, html: &str) -> Self::Document;
}

/// A parsed HTML document.
pub trait HtmlDocument {
    type Element<'a>: HtmlElement<'a>
    where
        Self: 'a;

    /// The document's root element.
    fn root(&self) -> Self::Element<'_>;

    /// All text in the document.
    fn text(&self) -> String {
        self.root().text()
    }
}

/// A handle to one element of a parsed document.
pub trait HtmlElement<'a>: Copy + Sized {
    /// Lowercase tag name.
    fn tag(&self) -> &'a str;

    /// Descendants (not including `self`) matching `query`, in document order.
    fn find_all(&self, query: &ElementQuery) -> Vec<Self>;

    /// Text content with each text node trimmed and concatenated.
    fn text(&self) -> String;

    fn attr(&self, name: &str) -> Option<&'a str>;

    fn classes(&self) -> Vec<&'a str>;

    fn parent(&self) -> Option<Self>;

    /// First descendant matching `query`.
    fn find(&self, query: &ElementQuery) -> Option<Self> {
        self.find_all(query).into_iter().next()
    }

    /// First descendant matching the first query in `queries` that matches anything.
    fn find_any(&self, queries: &[ElementQuery]) -> Option<Self> {
        queries.iter().find_map(|q| self.find(q))
    }

    /// All matches of the first query in `queries` that matches anything.
    fn find_all_any(&self, queries: &[ElementQuery]) -> Vec<Self> {
        queries
            .iter()
            .map(|q| self.find_all(q))
            .find(|found| !found.is_empty())
            .unwrap_or_default()
    }
}

/// Element predicate: tag, class and attribute constraints, all optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementQuery {
    tag: Option<String>,
    class: Option<String>,
    class_prefix: Option<String>,
    attr: Option<String>,
    attr_contains: Option<(String, String)>,
}

impl ElementQuery {
    /// Matches elements with the given tag name.
    pub fn tag(name: impl Into<String>) -> Self {
        Self {
            tag: Some(name.into().to_lowercase()),
            ..Self::default()
        }
    }

    /// Require a class token equal to `class`.
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    /// Require a class token starting with `prefix`.
    pub fn with_class_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.class_prefix = Some(prefix.into());
        self
    }

    /// Require the attribute to be present.
    pub fn with_attr(mut self, name: impl Into<String>) -> Self {
        self.attr = Some(name.into());
        self
    }

    /// Require the attribute value to contain `needle`.
    pub fn with_attr_containing(mut self, name: impl Into<String>, needle: impl Into<String>) -> Self {
        self.attr_contains = Some((name.into(), needle.into()));
        self
    }

    /// Whether `element` satisfies every constraint.
    pub fn matches<'a, E: HtmlElement<'a>>(&self, element: &E) -> bool {
        if let Some(tag) = &self.tag {
            if element.tag() != tag {
                return false;
            }
        }
        if self.class.is_some() || self.class_prefix.is_some() {
            let classes = element.classes();
            if let Some(class) = &self.class {
                if !classes.iter().any(|c| *c == class.as_str()) {
                    return false;
                }
            }
            if let Some(prefix) = &self.class_prefix {
                if !classes.iter().any(|c| c.starts_with(prefix.as_str())) {
                    return false;
                }
            }
        }
        if let Some(attr) = &self.attr {
            if element.attr(attr).is_none() {
                return false;
            }
        }
        if let Some((attr, needle)) = &self.attr_contains {
            match element.attr(attr) {
                Some(value) if value.contains(needle.as_str()) => {}
                _ => return false,
            }
        }
        true
    }
}
