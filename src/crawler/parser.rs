//! HTML parser for extracting links, titles and visible text
//!
//! This module handles parsing HTML content to extract:
//! - Links to follow (from <a> tags and canonical links)
//! - Page title
//! - Visible text for indexing and snippets

use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

/// Elements whose text is never shown to a reader
const INVISIBLE_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "head"];

/// Elements that separate the words around them
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr",
    "li", "main", "nav", "ol", "p", "pre", "section", "table", "td", "th", "tr", "ul",
];

/// Extracted information from an HTML page
#[derive(Debug, Clone)]
pub struct ParsedPage {
    /// The page title (from <title>, falling back to the first <h1>)
    pub title: Option<String>,

    /// All links found on the page (absolute URLs)
    pub links: Vec<String>,
}

/// Parses HTML content and extracts links and the title
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags
/// - `<link rel="canonical" href="...">`
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs and fragment-only links
///
/// # Example
///
/// ```
/// use lexicrawl::crawler::parse_html;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_html(html, &base_url);
/// assert_eq!(parsed.title, Some("Test".to_string()));
/// assert_eq!(parsed.links, vec!["https://example.com/page".to_string()]);
/// ```
pub fn parse_html(html: &str, base_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        title: extract_title(&document),
        links: extract_links(&document, base_url),
    }
}

/// Returns the first non-empty `<title>` or `<h1>` of a page
pub fn page_title(html: &str) -> Option<String> {
    extract_title(&Html::parse_document(html))
}

/// Returns the visible text of an HTML document
///
/// Text of scripts, styles and the document head is dropped and runs of
/// whitespace collapse to one space.
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let raw = collect_text(document.root_element());

    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Pending step of the document walk
enum Visit<'a> {
    Element(ElementRef<'a>),
    Text(&'a str),
    Gap,
}

/// Concatenates the visible text under `root` in document order
///
/// Walks with an explicit stack so arbitrarily deep markup cannot exhaust
/// the thread's stack.
fn collect_text(root: ElementRef<'_>) -> String {
    let mut out = String::new();
    let mut pending = vec![Visit::Element(root)];

    while let Some(visit) = pending.pop() {
        let element = match visit {
            Visit::Text(text) => {
                out.push_str(text);
                continue;
            }
            Visit::Gap => {
                out.push(' ');
                continue;
            }
            Visit::Element(element) => element,
        };

        let name = element.value().name();
        if INVISIBLE_ELEMENTS.contains(&name) {
            continue;
        }

        let block = BLOCK_ELEMENTS.contains(&name);
        if block {
            out.push(' ');
            pending.push(Visit::Gap);
        }

        let children: Vec<_> = element.children().collect();
        for child in children.into_iter().rev() {
            match child.value() {
                Node::Text(text) => pending.push(Visit::Text(&text.text)),
                Node::Element(_) => {
                    if let Some(child_element) = ElementRef::wrap(child) {
                        pending.push(Visit::Element(child_element));
                    }
                }
                _ => {}
            }
        }
    }

    out
}

fn extract_title(document: &Html) -> Option<String> {
    ["title", "h1"].iter().find_map(|tag| {
        let selector = Selector::parse(tag).ok()?;
        document
            .select(&selector)
            .map(|element| {
                element
                    .text()
                    .collect::<String>()
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .find(|title| !title.is_empty())
    })
}

fn extract_links(document: &Html, base_url: &Url) -> Vec<String> {
    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(href) = element.value().attr("href") {
                if let Some(absolute_url) = resolve_link(href, base_url) {
                    links.push(absolute_url);
                }
            }
        }
    }

    if let Ok(canonical_selector) = Selector::parse("link[rel='canonical'][href]") {
        for element in document.select(&canonical_selector) {
            if let Some(href) = element.value().attr("href") {
                if let Some(absolute_url) = resolve_link(href, base_url) {
                    links.push(absolute_url);
                }
            }
        }
    }

    links
}

/// Resolves a link href to an absolute HTTP(S) URL
///
/// Returns None for special schemes, data URIs, fragment-only links and
/// anything that does not resolve against `base_url`.
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
        Some(absolute_url.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("https://example.com/page").unwrap()
    }

    #[test]
    fn test_extract_title() {
        let html = r#"<html><head><title>  Test Page  </title></head><body></body></html>"#;
        let parsed = parse_html(html, &base_url());
        assert_eq!(parsed.title, Some("Test Page".to_string()));
    }

    #[test]
    fn test_title_falls_back_to_h1() {
        let html = r#"<html><head><title> </title></head><body><h1>Main <em>Heading</em></h1></body></html>"#;
        assert_eq!(page_title(html), Some("Main Heading".to_string()));
    }

    #[test]
    fn test_no_title() {
        let html = r#"<html><head></head><body><p>text</p></body></html>"#;
        assert_eq!(page_title(html), None);
    }

    #[test]
    fn test_extract_relative_links() {
        let html = r#"<html><body><a href="/other">A</a><a href="sibling">B</a></body></html>"#;
        let parsed = parse_html(html, &base_url());
        assert_eq!(
            parsed.links,
            vec![
                "https://example.com/other".to_string(),
                "https://example.com/sibling".to_string()
            ]
        );
    }

    #[test]
    fn test_extract_absolute_link() {
        let html = r#"<html><body><a href="https://other.com/page">Link</a></body></html>"#;
        let parsed = parse_html(html, &base_url());
        assert_eq!(parsed.links, vec!["https://other.com/page".to_string()]);
    }

    #[test]
    fn test_skip_special_links() {
        let html = r##"
            <html><body>
                <a href="javascript:void(0)">js</a>
                <a href="mailto:test@example.com">mail</a>
                <a href="tel:+1234567890">tel</a>
                <a href="data:text/html,x">data</a>
                <a href="#section">jump</a>
                <a href="/file.pdf" download>file</a>
                <a href="">empty</a>
                <a href="/valid">ok</a>
            </body></html>
        "##;
        let parsed = parse_html(html, &base_url());
        assert_eq!(parsed.links, vec!["https://example.com/valid".to_string()]);
    }

    #[test]
    fn test_extract_canonical_link() {
        let html = r#"<html><head><link rel="canonical" href="https://example.com/canonical" /></head><body></body></html>"#;
        let parsed = parse_html(html, &base_url());
        assert!(parsed
            .links
            .contains(&"https://example.com/canonical".to_string()));
    }

    #[test]
    fn test_html_to_text_visible_only() {
        let html = r#"
            <html>
            <head><title>Ignored</title><style>p { color: red; }</style></head>
            <body>
                <h1>Cats</h1>
                <p>The cat   sat
                   on the <b>mat</b>.</p>
                <script>var cat = 1;</script>
                <noscript>enable js</noscript>
            </body>
            </html>
        "#;
        assert_eq!(html_to_text(html), "Cats The cat sat on the mat.");
    }

    #[test]
    fn test_html_to_text_separates_blocks() {
        let html = "<div>one</div><div>two<br>three</div><span>fo</span><span>ur</span>";
        assert_eq!(html_to_text(html), "one two three four");
    }

    #[test]
    fn test_html_to_text_plain_fragment() {
        assert_eq!(html_to_text("just text"), "just text");
        assert_eq!(html_to_text(""), "");
    }

    #[test]
    fn test_html_to_text_deeply_nested() {
        let depth = 100_000;
        let html = format!(
            "<div>{}dog{}</div><p>cat</p>",
            "<span>".repeat(depth),
            "</span>".repeat(depth)
        );
        assert_eq!(html_to_text(&html), "dog cat");
    }
}
