#![forbid(unsafe_code)]

//! Navigation-order sources.
//!
//! Two variants resolve the current page and its neighbors from a
//! [`PageLocation`]:
//! - [`SequentialPages`]: an ordered list of content paths addressed by a
//!   `?page=<index>` query parameter on a single host document.
//! - [`GraphPages`]: an explicit `path -> { prev?, next? }` map where every
//!   page is its own document.
//!
//! The controller only ever sees the [`ResolvedPage`] produced by
//! [`AdjacencySource::resolve`], so it cannot tell the variants apart.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{FlipError, Result};
use crate::page::{Neighbor, Neighbors, PageId, PageLocation};

/// Query parameter carrying the sequential page index.
pub const PAGE_QUERY_PARAM: &str = "page";

/// Current page plus everything the controller needs to know about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPage {
    pub current: PageId,
    /// Fetchable source of the current page's markup (preview content).
    pub content_src: String,
    pub neighbors: Neighbors,
}

/// Polymorphic adjacency resolution.
pub trait AdjacencySource: core::fmt::Debug {
    /// Short variant label for logs.
    fn variant(&self) -> &'static str;

    /// Identify the current page from the location.
    fn locate(&self, location: &PageLocation) -> Option<PageId>;

    /// Previous/next edges of `page`.
    fn neighbors(&self, page: &PageId, location: &PageLocation) -> Neighbors;

    /// Source of the raw markup shown on the front faces for `page`.
    fn content_src(&self, page: &PageId, location: &PageLocation) -> Option<String>;

    /// Resolve the current page and its edges.
    ///
    /// Edges that point back at the current page are dropped: a back face
    /// must never show the document it is attached to.
    fn resolve(&self, location: &PageLocation) -> Result<ResolvedPage> {
        let unknown = || FlipError::UnknownPage {
            location: location.href(),
        };
        let current = self.locate(location).ok_or_else(unknown)?;
        let content_src = self.content_src(&current, location).ok_or_else(unknown)?;
        let mut neighbors = self.neighbors(&current, location);
        for (edge, slot) in [("prev", &mut neighbors.prev), ("next", &mut neighbors.next)] {
            if slot.as_ref().is_some_and(|n| n.page == current) {
                warn!(
                    target: "pageflip.adjacency",
                    variant = self.variant(),
                    page = %current,
                    edge,
                    "dropping self-referencing edge"
                );
                *slot = None;
            }
        }
        Ok(ResolvedPage {
            current,
            content_src,
            neighbors,
        })
    }
}

/// Ordered page list; prev/next derived from the position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SequentialPages {
    pages: Vec<String>,
}

impl SequentialPages {
    #[must_use]
    pub fn new<I, S>(pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            pages: pages.into_iter().map(Into::into).collect(),
        }
    }

    fn neighbor_at(&self, index: usize, location: &PageLocation) -> Option<Neighbor> {
        (index < self.pages.len()).then(|| Neighbor {
            page: PageId::Index(index),
            src: format!(
                "{}{}?{PAGE_QUERY_PARAM}={index}",
                location.origin, location.pathname
            ),
        })
    }
}

impl AdjacencySource for SequentialPages {
    fn variant(&self) -> &'static str {
        "sequential"
    }

    fn locate(&self, location: &PageLocation) -> Option<PageId> {
        let index = location
            .query_param(PAGE_QUERY_PARAM)
            .and_then(|raw| raw.parse::<usize>().ok())
            .unwrap_or(0);
        (index < self.pages.len()).then_some(PageId::Index(index))
    }

    fn neighbors(&self, page: &PageId, location: &PageLocation) -> Neighbors {
        let PageId::Index(index) = *page else {
            return Neighbors::default();
        };
        Neighbors {
            prev: index
                .checked_sub(1)
                .and_then(|prev| self.neighbor_at(prev, location)),
            next: index
                .checked_add(1)
                .and_then(|next| self.neighbor_at(next, location)),
        }
    }

    fn content_src(&self, page: &PageId, _location: &PageLocation) -> Option<String> {
        match page {
            PageId::Index(index) => self.pages.get(*index).cloned(),
            PageId::Path(_) => None,
        }
    }
}

/// Explicit edges of one page in a [`GraphPages`] map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageEdges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

/// Explicit `path -> { prev?, next? }` graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GraphPages {
    edges: BTreeMap<String, PageEdges>,
}

impl GraphPages {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the edges of `path`.
    #[must_use]
    pub fn with_page(mut self, path: impl Into<String>, edges: PageEdges) -> Self {
        self.edges.insert(path.into(), edges);
        self
    }

    #[must_use]
    pub fn edges(&self, path: &str) -> Option<&PageEdges> {
        self.edges.get(path)
    }
}

impl AdjacencySource for GraphPages {
    fn variant(&self) -> &'static str {
        "graph"
    }

    fn locate(&self, location: &PageLocation) -> Option<PageId> {
        self.edges
            .contains_key(&location.pathname)
            .then(|| PageId::Path(location.pathname.clone()))
    }

    fn neighbors(&self, page: &PageId, _location: &PageLocation) -> Neighbors {
        let PageId::Path(path) = page else {
            return Neighbors::default();
        };
        let Some(edges) = self.edges.get(path) else {
            return Neighbors::default();
        };
        let edge = |target: &Option<String>| {
            target.as_ref().map(|target| Neighbor {
                page: PageId::Path(target.clone()),
                src: target.clone(),
            })
        };
        Neighbors {
            prev: edge(&edges.prev),
            next: edge(&edges.next),
        }
    }

    fn content_src(&self, page: &PageId, location: &PageLocation) -> Option<String> {
        match page {
            PageId::Path(path) if *path == location.pathname => Some(path.clone()),
            _ => None,
        }
    }
}

/// Serialized adjacency: a JSON array is a [`SequentialPages`] list, a JSON
/// object is a [`GraphPages`] map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdjacencySpec {
    Sequential(SequentialPages),
    Graph(GraphPages),
}

impl AdjacencySpec {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    #[must_use]
    pub fn into_source(self) -> Box<dyn AdjacencySource> {
        match self {
            Self::Sequential(pages) => Box::new(pages),
            Self::Graph(pages) => Box::new(pages),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn seq_location(search: &str) -> PageLocation {
        PageLocation::new("https://demo.test", "/index.html", search)
    }

    fn chain() -> GraphPages {
        GraphPages::new()
            .with_page(
                "/a.html",
                PageEdges {
                    prev: None,
                    next: Some("/b.html".into()),
                },
            )
            .with_page(
                "/b.html",
                PageEdges {
                    prev: Some("/a.html".into()),
                    next: Some("/c.html".into()),
                },
            )
            .with_page(
                "/c.html",
                PageEdges {
                    prev: Some("/b.html".into()),
                    next: None,
                },
            )
    }

    #[test]
    fn sequential_defaults_to_first_page() {
        let pages = SequentialPages::new(["/view/red.html", "/view/blue.html"]);
        let resolved = pages.resolve(&seq_location("")).expect("page 0 exists");
        assert_eq!(resolved.current, PageId::Index(0));
        assert_eq!(resolved.content_src, "/view/red.html");
        assert!(!resolved.neighbors.has_prev());
        assert_eq!(
            resolved.neighbors.next,
            Some(Neighbor {
                page: PageId::Index(1),
                src: "https://demo.test/index.html?page=1".into(),
            })
        );
    }

    #[test]
    fn sequential_middle_page_has_both_edges() {
        let pages = SequentialPages::new(["/r.html", "/b.html", "/y.html"]);
        let resolved = pages.resolve(&seq_location("?page=1")).expect("in range");
        assert_eq!(resolved.content_src, "/b.html");
        assert_eq!(
            resolved.neighbors.prev.map(|n| n.src),
            Some("https://demo.test/index.html?page=0".to_owned())
        );
        assert_eq!(
            resolved.neighbors.next.map(|n| n.page),
            Some(PageId::Index(2))
        );
    }

    #[test]
    fn sequential_out_of_range_is_unknown_page() {
        let pages = SequentialPages::new(["/r.html"]);
        assert!(matches!(
            pages.resolve(&seq_location("?page=7")),
            Err(FlipError::UnknownPage { .. })
        ));
    }

    #[test]
    fn sequential_non_numeric_index_falls_back_to_first() {
        let pages = SequentialPages::new(["/r.html", "/b.html"]);
        assert_eq!(
            pages.locate(&seq_location("?page=abc")),
            Some(PageId::Index(0))
        );
    }

    #[test]
    fn graph_resolves_from_pathname() {
        let loc = PageLocation::new("https://demo.test", "/b.html", "");
        let resolved = chain().resolve(&loc).expect("b is mapped");
        assert_eq!(resolved.current, PageId::Path("/b.html".into()));
        assert_eq!(resolved.content_src, "/b.html");
        assert_eq!(resolved.neighbors.prev.map(|n| n.src), Some("/a.html".into()));
        assert_eq!(resolved.neighbors.next.map(|n| n.src), Some("/c.html".into()));
    }

    #[test]
    fn graph_unmapped_path_is_unknown_page() {
        let loc = PageLocation::new("https://demo.test", "/zzz.html", "");
        assert!(matches!(
            chain().resolve(&loc),
            Err(FlipError::UnknownPage { .. })
        ));
    }

    #[test]
    fn self_referencing_edge_is_dropped() {
        let graph = GraphPages::new().with_page(
            "/solo.html",
            PageEdges {
                prev: Some("/solo.html".into()),
                next: Some("/other.html".into()),
            },
        );
        let loc = PageLocation::new("https://demo.test", "/solo.html", "");
        let resolved = graph.resolve(&loc).expect("mapped");
        assert_eq!(resolved.neighbors.prev, None);
        assert!(resolved.neighbors.has_next());
    }

    #[test]
    fn spec_json_selects_variant_by_shape() {
        let seq = AdjacencySpec::from_json(r#"["/r.html", "/b.html"]"#).expect("array");
        assert!(matches!(seq, AdjacencySpec::Sequential(_)));
        assert_eq!(seq.into_source().variant(), "sequential");

        let graph = AdjacencySpec::from_json(
            r#"{"/fuji.html": {"prev": "/tokyotower.html", "next": "/okinawa.html"}}"#,
        )
        .expect("object");
        let AdjacencySpec::Graph(pages) = &graph else {
            panic!("expected graph variant, got {graph:?}");
        };
        assert_eq!(
            pages.edges("/fuji.html").and_then(|e| e.next.clone()),
            Some("/okinawa.html".into())
        );
    }

    #[test]
    fn spec_json_rejects_other_shapes() {
        assert!(matches!(
            AdjacencySpec::from_json("42"),
            Err(FlipError::InvalidAdjacency(_))
        ));
    }
}
