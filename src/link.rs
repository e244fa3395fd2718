use scraper::ElementRef;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::field::tag_name;
use crate::uri;

const LINK_TAGS: &[&str] = &["a", "area", "link"];

/// A navigable `<a>`, `<area>` or `<link>` element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    tag: String,
    href: String,
    text: String,
    current_uri: String,
}

impl Link {
    pub fn new(element: ElementRef, current_uri: &str) -> Result<Self> {
        let tag = tag_name(&element);
        if !LINK_TAGS.contains(&tag) {
            return Err(Error::tag_mismatch("an a, area or link element", tag));
        }
        uri::validate_current_uri(current_uri)?;

        Ok(Self {
            tag: tag.to_string(),
            href: element.value().attr("href").unwrap_or_default().to_string(),
            text: element.text().collect::<String>().trim().to_string(),
            current_uri: current_uri.to_string(),
        })
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The `href` attribute as written in the markup.
    pub fn raw_uri(&self) -> &str {
        &self.href
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn current_uri(&self) -> &str {
        &self.current_uri
    }

    /// The absolute URI the link points to.
    pub fn uri(&self) -> String {
        uri::resolve(&self.href, &self.current_uri)
    }
}
