#![forbid(unsafe_code)]

//! Page identifiers and the current-location snapshot.

use core::fmt;

use crate::error::{FlipError, Result};

/// Identifier of one navigable document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PageId {
    /// Position in an ordered page list.
    Index(usize),
    /// Root-relative document path.
    Path(String),
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "#{index}"),
            Self::Path(path) => f.write_str(path),
        }
    }
}

/// Snapshot of the current document location.
///
/// Resolved once by the bootstrap; the controller never reads the live
/// location again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLocation {
    /// Scheme and authority, e.g. `https://example.com`.
    pub origin: String,
    /// Path component, always starting with `/`.
    pub pathname: String,
    /// Query component including the leading `?`, or empty.
    pub search: String,
}

impl PageLocation {
    /// Build a location from its parts.
    #[must_use]
    pub fn new(
        origin: impl Into<String>,
        pathname: impl Into<String>,
        search: impl Into<String>,
    ) -> Self {
        Self {
            origin: origin.into(),
            pathname: pathname.into(),
            search: search.into(),
        }
    }

    /// Split an absolute URL into origin, pathname and search.
    ///
    /// Fragments are dropped.
    pub fn parse(href: &str) -> Result<Self> {
        let Some((scheme, rest)) = href.split_once("://") else {
            return Err(FlipError::InvalidLocation(href.to_owned()));
        };
        if scheme.is_empty() {
            return Err(FlipError::InvalidLocation(href.to_owned()));
        }
        let rest = rest.split('#').next().unwrap_or_default();
        let authority_end = rest.find(['/', '?']).unwrap_or(rest.len());
        let (authority, tail) = rest.split_at(authority_end);
        if authority.is_empty() {
            return Err(FlipError::InvalidLocation(href.to_owned()));
        }
        let (path, search) = match tail.find('?') {
            Some(idx) => tail.split_at(idx),
            None => (tail, ""),
        };
        let pathname = if path.is_empty() { "/" } else { path };
        Ok(Self::new(format!("{scheme}://{authority}"), pathname, search))
    }

    /// Full href of this location.
    #[must_use]
    pub fn href(&self) -> String {
        format!("{}{}{}", self.origin, self.pathname, self.search)
    }

    /// First value of query parameter `name`, if present.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.search
            .strip_prefix('?')
            .unwrap_or(&self.search)
            .split('&')
            .filter_map(|pair| pair.split_once('=').or(Some((pair, ""))))
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value)
    }

    /// Resolve `src` against this location.
    ///
    /// Handles absolute URLs (returned unchanged), root-relative paths and
    /// query-only references. Anything else is treated as relative to the
    /// directory of the current pathname.
    #[must_use]
    pub fn absolutize(&self, src: &str) -> String {
        if src.contains("://") {
            return src.to_owned();
        }
        if src.starts_with('/') {
            return format!("{}{src}", self.origin);
        }
        if src.starts_with('?') {
            return format!("{}{}{src}", self.origin, self.pathname);
        }
        let dir = match self.pathname.rfind('/') {
            Some(idx) => &self.pathname[..=idx],
            None => "/",
        };
        format!("{}{dir}{src}", self.origin)
    }
}

impl fmt::Display for PageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.href())
    }
}

/// One resolved neighbor edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Neighbor {
    pub page: PageId,
    /// Source the embedding handle for this neighbor is created from.
    pub src: String,
}

/// Previous/next edges of a page. `None` marks a boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Neighbors {
    pub prev: Option<Neighbor>,
    pub next: Option<Neighbor>,
}

impl Neighbors {
    #[must_use]
    pub const fn has_prev(&self) -> bool {
        self.prev.is_some()
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.next.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_origin_path_and_query() {
        let loc = PageLocation::parse("https://example.com/view/index.html?page=2#top")
            .expect("valid href");
        assert_eq!(loc.origin, "https://example.com");
        assert_eq!(loc.pathname, "/view/index.html");
        assert_eq!(loc.search, "?page=2");
        assert_eq!(loc.href(), "https://example.com/view/index.html?page=2");
    }

    #[test]
    fn parse_defaults_empty_path_to_root() {
        let loc = PageLocation::parse("http://localhost:8080?page=1").expect("valid href");
        assert_eq!(loc.pathname, "/");
        assert_eq!(loc.search, "?page=1");
    }

    #[test]
    fn parse_rejects_relative_href() {
        assert!(matches!(
            PageLocation::parse("/fuji.html"),
            Err(FlipError::InvalidLocation(_))
        ));
        assert!(PageLocation::parse("https:///nohost").is_err());
    }

    #[test]
    fn query_param_finds_first_match() {
        let loc = PageLocation::new("http://h", "/", "?a=1&page=3&page=4&flag");
        assert_eq!(loc.query_param("page"), Some("3"));
        assert_eq!(loc.query_param("flag"), Some(""));
        assert_eq!(loc.query_param("missing"), None);
    }

    #[test]
    fn absolutize_handles_each_reference_form() {
        let loc = PageLocation::new("https://h", "/view/red.html", "?page=0");
        assert_eq!(loc.absolutize("https://o/x"), "https://o/x");
        assert_eq!(loc.absolutize("/fuji.html"), "https://h/fuji.html");
        assert_eq!(loc.absolutize("?page=1"), "https://h/view/red.html?page=1");
        assert_eq!(loc.absolutize("blue.html"), "https://h/view/blue.html");
    }

    #[test]
    fn page_id_display() {
        assert_eq!(PageId::Index(2).to_string(), "#2");
        assert_eq!(PageId::Path("/fuji.html".into()).to_string(), "/fuji.html");
    }
}
