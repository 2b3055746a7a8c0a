use scraper::{ElementRef, Html, Selector};
use tracing::warn;

/// The slice of DOM traversal the page parser needs.
///
/// Any HTML backend can implement this; the parser never touches the
/// backend's own types.
pub trait NodeQuery: Sized {
    /// First descendant matching a CSS selector.
    fn query_selector(&self, selector: &str) -> Option<Self>;

    /// All descendants matching a CSS selector, in document order.
    fn query_selector_all(&self, selector: &str) -> Vec<Self>;

    fn get_attribute(&self, name: &str) -> Option<String>;

    /// Concatenated text of all descendant text nodes.
    fn text_content(&self) -> String;

    /// Serialized markup of the node's children.
    fn inner_html(&self) -> String;
}

/// [`NodeQuery`] backed by the `scraper` crate.
#[derive(Clone, Copy)]
pub struct HtmlNode<'a> {
    element: ElementRef<'a>,
}

impl<'a> HtmlNode<'a> {
    pub fn root(document: &'a Html) -> Self {
        Self {
            element: document.root_element(),
        }
    }
}

fn parse_selector(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!("Invalid CSS selector {:?}: {:?}", selector, e);
            None
        }
    }
}

impl NodeQuery for HtmlNode<'_> {
    fn query_selector(&self, selector: &str) -> Option<Self> {
        let selector = parse_selector(selector)?;
        self.element
            .select(&selector)
            .next()
            .map(|element| Self { element })
    }

    fn query_selector_all(&self, selector: &str) -> Vec<Self> {
        let Some(selector) = parse_selector(selector) else {
            return Vec::new();
        };
        self.element
            .select(&selector)
            .map(|element| Self { element })
            .collect()
    }

    fn get_attribute(&self, name: &str) -> Option<String> {
        self.element.value().attr(name).map(String::from)
    }

    fn text_content(&self) -> String {
        self.element.text().collect()
    }

    fn inner_html(&self) -> String {
        self.element.inner_html()
    }
}
