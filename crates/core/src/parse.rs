//! HTML parsing and DOM access.
//!
//! This module provides the [`Document`] and [`Element`] types for parsing
//! HTML and querying it with CSS selectors, plus block-aware text rendering
//! that keeps paragraph boundaries as blank lines.
//!
//! # Example
//!
//! ```rust
//! use echoscape_core::parse::Document;
//!
//! let html = r#"
//!     <html>
//!         <body>
//!             <h1>Title</h1>
//!             <p class="content">Paragraph</p>
//!         </body>
//!     </html>
//! "#;
//!
//! let doc = Document::parse(html).unwrap();
//! let paragraphs = doc.select("p.content").unwrap();
//! assert_eq!(paragraphs[0].text(), "Paragraph");
//! ```

use ego_tree::NodeId;
use ego_tree::iter::Edge;
use scraper::{ElementRef, Html, Node, Selector};

use crate::clean::normalize_whitespace;
use crate::{EchoscapeError, Result};

/// Elements whose boundaries start a new paragraph in rendered text.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "figcaption", "figure", "footer", "h1",
    "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav", "ol", "p", "pre", "section", "table", "td",
    "th", "tr", "ul",
];

/// Elements that never contribute visible text.
const INVISIBLE_TAGS: &[&str] = &["script", "style", "noscript", "template", "head"];

/// A parsed HTML page.
///
/// Documents are immutable once parsed. Sanitizing produces a new document
/// (see [`Document::sanitize`]) rather than editing this one.
///
/// # Example
///
/// ```rust
/// use echoscape_core::parse::Document;
///
/// let html = "<html><head><title>Test</title></head><body><p>Hello</p></body></html>";
/// let doc = Document::parse(html).unwrap();
/// assert_eq!(doc.title(), Some("Test".to_string()));
/// ```
pub struct Document {
    html: Html,
}

impl Document {
    /// Parses HTML from a string.
    ///
    /// html5ever recovers from any malformed input, so this only fails for
    /// API symmetry with the other constructors.
    pub fn parse(html: &str) -> Result<Self> {
        Ok(Self::from_markup(html))
    }

    pub(crate) fn from_markup(html: &str) -> Self {
        Self { html: Html::parse_document(html) }
    }

    /// Gets the underlying `scraper::Html`.
    pub fn html(&self) -> &Html {
        &self.html
    }

    /// Serializes the whole document back to HTML.
    pub fn as_string(&self) -> String {
        self.html.html()
    }

    /// Selects elements using a CSS selector, in document order.
    ///
    /// # Errors
    ///
    /// Returns [`EchoscapeError::HtmlParseError`] if the selector is invalid.
    ///
    /// # Example
    ///
    /// ```rust
    /// use echoscape_core::parse::Document;
    ///
    /// let html = r#"<p class="content">First</p><p class="content">Second</p>"#;
    /// let doc = Document::parse(html).unwrap();
    /// let elements = doc.select("p.content").unwrap();
    /// assert_eq!(elements.len(), 2);
    /// ```
    pub fn select(&'_ self, selector: &str) -> Result<Vec<Element<'_>>> {
        let sel = parse_selector(selector)?;
        Ok(self.html.select(&sel).map(|el| Element { element: el }).collect())
    }

    /// Returns the first element matching `selector`, if any.
    pub fn first(&'_ self, selector: &str) -> Option<Element<'_>> {
        let sel = parse_selector(selector).ok()?;
        self.html.select(&sel).next().map(|el| Element { element: el })
    }

    /// Gets the trimmed `<title>` text, if present and non-empty.
    pub fn title(&self) -> Option<String> {
        let title = self.first("title")?.text();
        let title = normalize_whitespace(&title);
        if title.is_empty() { None } else { Some(title) }
    }

    /// Reads the `content` of a `<meta>` tag matched by `property` or `name`.
    pub fn meta_content(&self, key: &str) -> Option<String> {
        ["property", "name"].iter().find_map(|attr| {
            let element = self.first(&format!("meta[{attr}=\"{key}\"]"))?;
            let content = element.attr("content")?.trim();
            if content.is_empty() { None } else { Some(content.to_string()) }
        })
    }

    /// Renders all visible text with paragraph breaks between block elements.
    pub fn text_content(&self) -> String {
        let root = self.first("body").map(|el| el.element).unwrap_or_else(|| self.html.root_element());
        render_block_text(root)
    }
}

/// A wrapper around scraper's `ElementRef`.
///
/// # Example
///
/// ```rust
/// use echoscape_core::parse::Document;
///
/// let html = r#"<a href="https://example.com">Link text</a>"#;
/// let doc = Document::parse(html).unwrap();
/// let link = &doc.select("a").unwrap()[0];
///
/// assert_eq!(link.text(), "Link text");
/// assert_eq!(link.attr("href"), Some("https://example.com"));
/// ```
#[derive(Clone, Debug)]
pub struct Element<'a> {
    element: ElementRef<'a>,
}

impl<'a> Element<'a> {
    /// Gets the outer HTML of this element.
    pub fn outer_html(&self) -> String {
        self.element.html()
    }

    /// Gets the raw concatenation of all descendant text nodes.
    pub fn text(&self) -> String {
        self.element.text().collect()
    }

    /// Gets the text collapsed onto a single line.
    pub fn inline_text(&self) -> String {
        self.text().split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Gets the visible text with paragraph breaks between block children.
    pub fn block_text(&self) -> String {
        render_block_text(self.element)
    }

    /// Gets the value of an attribute.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.element.value().attr(name)
    }

    /// Gets the lowercase tag name.
    pub fn tag_name(&self) -> String {
        self.element.value().name().to_lowercase()
    }

    /// Selects descendant elements using a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`EchoscapeError::HtmlParseError`] if the selector is invalid.
    pub fn select(&'_ self, selector: &str) -> Result<Vec<Element<'_>>> {
        let sel = parse_selector(selector)?;
        Ok(self.element.select(&sel).map(|el| Element { element: el }).collect())
    }

    /// Counts descendants matching a selector (0 for invalid selectors).
    pub fn count(&self, selector: &str) -> usize {
        parse_selector(selector)
            .map(|sel| self.element.select(&sel).count())
            .unwrap_or(0)
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| EchoscapeError::HtmlParseError(format!("Invalid selector: {}", e)))
}

/// Render an element's visible text, separating block elements by blank lines.
fn render_block_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    collect_text(element, &mut raw);
    normalize_whitespace(&raw)
}

/// Walks the subtree with `traverse` so nesting depth never grows the call stack.
fn collect_text(element: ElementRef<'_>, out: &mut String) {
    let root = element.id();
    let mut hidden: Option<NodeId> = None;

    for edge in element.traverse() {
        match edge {
            Edge::Open(node) if node.id() != root => {
                if hidden.is_some() {
                    continue;
                }
                match node.value() {
                    Node::Text(text) => {
                        // Source formatting newlines are not paragraph breaks.
                        out.extend(text.chars().map(|c| if c.is_whitespace() { ' ' } else { c }));
                    }
                    Node::Element(el) => {
                        let name = el.name();
                        if INVISIBLE_TAGS.contains(&name) {
                            hidden = Some(node.id());
                        } else if name == "br" {
                            out.push('\n');
                        } else if BLOCK_TAGS.contains(&name) {
                            out.push_str("\n\n");
                        }
                    }
                    _ => {}
                }
            }
            Edge::Close(node) if node.id() != root => {
                if hidden == Some(node.id()) {
                    hidden = None;
                    continue;
                }
                if hidden.is_none()
                    && let Node::Element(el) = node.value()
                    && BLOCK_TAGS.contains(&el.name())
                {
                    out.push_str("\n\n");
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_HTML: &str = r#"
        <!DOCTYPE html>
        <html lang="en">
        <head>
            <meta charset="UTF-8">
            <meta property="og:title" content="  OG Title ">
            <meta name="description" content="A page">
            <title>
                Test Page
            </title>
        </head>
        <body>
            <h1>Heading</h1>
            <p class="content">Paragraph
               1</p>
            <p class="content">Paragraph 2<br>continued</p>
            <a href="https://example.com">Link</a>
            <script>var hidden = true;</script>
        </body>
        </html>
    "#;

    #[test]
    fn test_parse_document() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        assert_eq!(doc.title(), Some("Test Page".to_string()));
    }

    #[test]
    fn test_select_elements() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let elements = doc.select("p.content").unwrap();

        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].inline_text(), "Paragraph 1");
    }

    #[test]
    fn test_invalid_selector() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let result = doc.select("[[invalid");

        assert!(matches!(result, Err(EchoscapeError::HtmlParseError(_))));
        assert!(doc.first("[[invalid").is_none());
    }

    #[test]
    fn test_meta_content() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        assert_eq!(doc.meta_content("og:title"), Some("OG Title".to_string()));
        assert_eq!(doc.meta_content("description"), Some("A page".to_string()));
        assert_eq!(doc.meta_content("og:image"), None);
    }

    #[test]
    fn test_text_content_block_breaks() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let text = doc.text_content();

        assert!(text.starts_with("Heading\n\nParagraph 1\n\nParagraph 2\ncontinued"));
        assert!(!text.contains("hidden"));
    }

    #[test]
    fn test_block_text_paragraphs() {
        let doc = Document::parse("<div id='x'><p>A</p><p>B</p></div>").unwrap();
        let div = doc.first("#x").unwrap();
        assert_eq!(div.block_text(), "A\n\nB");
    }

    #[test]
    fn test_deeply_nested_text() {
        // Same stack size as a tokio worker thread.
        let handle = std::thread::Builder::new()
            .stack_size(2 * 1024 * 1024)
            .spawn(|| {
                let depth = 20_000;
                let html = format!("{}<p>deep text</p>{}", "<div>".repeat(depth), "</div>".repeat(depth));
                let doc = Document::parse(&html).unwrap();
                let outer = doc.first("div").unwrap();
                (doc.text_content(), outer.block_text())
            })
            .unwrap();

        let (text, block) = handle.join().unwrap();
        assert_eq!(text, "deep text");
        assert_eq!(block, "deep text");
    }

    #[test]
    fn test_nested_invisible_tags_skipped() {
        let doc =
            Document::parse("<div id='x'><p>A</p><noscript>no</noscript><div><style>b{}</style><p>B</p></div></div>")
                .unwrap();
        assert_eq!(doc.first("#x").unwrap().block_text(), "A\n\nB");
    }

    #[test]
    fn test_count_descendants() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let body = doc.first("body").unwrap();
        assert_eq!(body.count("p"), 2);
        assert_eq!(body.count("a"), 1);
        assert_eq!(body.count("[[bad"), 0);
    }
}
