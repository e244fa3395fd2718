use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::field::tag_name;
use crate::form::Form;
use crate::link::Link;
use crate::uri;

/// A parsed HTML page together with the URI it was loaded from.
///
/// ```
/// use cortex_forms::Document;
///
/// let doc = Document::parse(
///     "<form action=\"/s\"><input name=\"q\" value=\"rust\"></form>",
///     Some("http://example.com/"),
/// )?;
/// assert_eq!(doc.form(None, None)?.uri(), "http://example.com/s?q=rust");
/// # Ok::<(), cortex_forms::Error>(())
/// ```
#[derive(Debug)]
pub struct Document {
    html: Html,
    uri: String,
    base_href: String,
}

impl Document {
    /// Parse `markup` loaded from `uri`. The first `<base href>` becomes the
    /// base for links and non-empty form actions; a base that does not resolve
    /// to an absolute http(s) or file URI is ignored.
    pub fn parse(markup: &str, uri: Option<&str>) -> Result<Self> {
        let uri = uri.unwrap_or_default().to_string();
        uri::validate_current_uri(&uri)?;

        let html = Html::parse_document(markup);
        let selector = parse_selector("base[href]")?;
        let base_href = html
            .select(&selector)
            .next()
            .and_then(|base| base.value().attr("href"))
            .map(|href| uri::resolve(href, &uri))
            .filter(|base| match uri::validate_current_uri(base) {
                Ok(()) => true,
                Err(e) => {
                    warn!(error = %e, "ignoring <base href>");
                    false
                }
            })
            .unwrap_or_else(|| uri.clone());

        debug!(uri = %uri, base_href = %base_href, "parsed document");
        Ok(Self { html, uri, base_href })
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn base_href(&self) -> &str {
        &self.base_href
    }

    /// Elements matching a CSS selector, in document order.
    pub fn find(&self, selector: &str) -> Result<Vec<ElementRef<'_>>> {
        let selector = parse_selector(selector)?;
        Ok(self.html.select(&selector).collect())
    }

    /// The first `<a>` matching `selector` (any `<a>` when absent).
    pub fn link(&self, selector: Option<&str>) -> Result<Link> {
        self.links(selector)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::NoMatch(selector.unwrap_or("a").to_string()))
    }

    /// Every `<a>` matching `selector`, resolved against the base href.
    pub fn links(&self, selector: Option<&str>) -> Result<Vec<Link>> {
        self.find(selector.unwrap_or("a"))?
            .into_iter()
            .filter(|element| tag_name(element) == "a")
            .map(|element| Link::new(element, &self.base_href))
            .collect()
    }

    /// The first `<form>` matching `selector` (any form when absent).
    pub fn form(&self, selector: Option<&str>, method: Option<&str>) -> Result<Form> {
        let selector = selector.unwrap_or("form");
        let element = self
            .find(selector)?
            .into_iter()
            .find(|element| tag_name(element) == "form")
            .ok_or_else(|| Error::NoMatch(selector.to_string()))?;

        let base_href = (self.base_href != self.uri).then_some(self.base_href.as_str());
        Form::with_base_href(element, &self.uri, method, base_href)
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| Error::InvalidSelector(format!("{selector}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><head><title>t</title></head><body>
        <a href="/one" id="first">One</a>
        <a href="two">Two</a>
        <div class="nav"><a href="?page=2">Next</a></div>
        <form id="search" action="/search"><input name="q" value="rust"></form>
        <form id="login" method="post" action="login.php"><input name="user"></form>
    </body></html>"#;

    fn doc() -> Document {
        Document::parse(PAGE, Some("http://example.com/docs/index.html")).unwrap()
    }

    #[test]
    fn rejects_relative_uri() {
        assert!(matches!(
            Document::parse(PAGE, Some("example.com")),
            Err(Error::InvalidCurrentUri(_))
        ));
    }

    #[test]
    fn links_resolve_against_the_page() {
        let uris: Vec<_> = doc().links(None).unwrap().iter().map(Link::uri).collect();
        assert_eq!(
            uris,
            vec![
                "http://example.com/one",
                "http://example.com/docs/two",
                "http://example.com/docs/index.html?page=2",
            ]
        );
    }

    #[test]
    fn link_by_selector() {
        let doc = doc();
        assert_eq!(doc.link(Some(".nav a")).unwrap().text(), "Next");
        assert_eq!(doc.link(None).unwrap().text(), "One");
        assert_eq!(
            doc.link(Some("#missing")).unwrap_err(),
            Error::NoMatch("#missing".to_string())
        );
    }

    #[test]
    fn non_anchor_matches_are_skipped() {
        assert!(doc().links(Some("div")).unwrap().is_empty());
    }

    #[test]
    fn invalid_selector() {
        assert!(matches!(doc().find("a[[["), Err(Error::InvalidSelector(_))));
    }

    #[test]
    fn forms_by_selector() {
        let doc = doc();
        let search = doc.form(None, None).unwrap();
        assert_eq!(search.uri(), "http://example.com/search?q=rust");

        let login = doc.form(Some("#login"), None).unwrap();
        assert_eq!(login.method(), "POST");
        assert_eq!(login.uri(), "http://example.com/docs/login.php");

        assert!(matches!(doc.form(Some("a"), None), Err(Error::NoMatch(_))));
    }

    #[test]
    fn base_element_redirects_links_and_actions() {
        let doc = Document::parse(
            r#"<html><head><base href="http://cdn.example.com/assets/"></head><body>
               <a href="img.png">img</a>
               <form action="upload"></form>
               <form id="self"></form>
               </body></html>"#,
            Some("http://example.com/page"),
        )
        .unwrap();

        assert_eq!(doc.base_href(), "http://cdn.example.com/assets/");
        assert_eq!(doc.link(None).unwrap().uri(), "http://cdn.example.com/assets/img.png");
        assert_eq!(doc.form(None, None).unwrap().uri(), "http://cdn.example.com/assets/upload");
        assert_eq!(doc.form(Some("#self"), None).unwrap().uri(), "http://example.com/page");
    }

    #[test]
    fn unusable_base_falls_back_to_the_page() {
        let relative = Document::parse(
            r#"<head><base href="/assets/"></head><a href="x.png">x</a><form action="up"></form>"#,
            None,
        )
        .unwrap();
        assert_eq!(relative.base_href(), "");
        assert_eq!(relative.link(None).unwrap().uri(), "/x.png");
        assert_eq!(relative.form(None, None).unwrap().uri(), "/up");

        let ftp = Document::parse(
            r#"<head><base href="ftp://cdn/"></head><a href="x.png">x</a><form action="up"></form>"#,
            Some("http://example.com/dir/page"),
        )
        .unwrap();
        assert_eq!(ftp.base_href(), "http://example.com/dir/page");
        assert_eq!(ftp.link(None).unwrap().uri(), "http://example.com/dir/x.png");
        assert_eq!(ftp.form(None, None).unwrap().uri(), "http://example.com/dir/up");
    }

    #[test]
    fn document_without_uri() {
        let doc = Document::parse("<a href=\"/x\">x</a>", None).unwrap();
        assert_eq!(doc.uri(), "");
        assert_eq!(doc.link(None).unwrap().raw_uri(), "/x");
    }
}
