#![forbid(unsafe_code)]

//! Neighbor preloading.
//!
//! For each existing edge one embedding handle is created (or a predecessor
//! handle adopted), duplicated, and placed twice: the original in the
//! off-screen slot, the duplicate on the rotating panel's back face. The
//! slot instance is the one that gets activated.

use tracing::debug;

use crate::config::PredecessorReuse;
use crate::error::Result;
use crate::host::FlipHost;
use crate::layout::FlipLayout;
use crate::page::{Neighbor, Neighbors, PageId, PageLocation};
use crate::transition::{ArmedDirections, FlipDirection};

/// Handles placed for one edge.
#[derive(Debug, Clone)]
pub struct PreloadedEdge<P> {
    pub page: PageId,
    /// Live handle in the off-screen slot; the activation target.
    pub slot: P,
    /// Duplicate shown on the panel's back face during rotation.
    pub back: P,
    /// Whether `slot` is the adopted predecessor rather than a fresh handle.
    pub reused_predecessor: bool,
}

/// Result of preloading both edges.
#[derive(Debug, Clone)]
pub struct PreloadedNeighbors<P> {
    pub next: Option<PreloadedEdge<P>>,
    pub prev: Option<PreloadedEdge<P>>,
}

impl<P> PreloadedNeighbors<P> {
    #[must_use]
    pub const fn edge(&self, direction: FlipDirection) -> Option<&PreloadedEdge<P>> {
        match direction {
            FlipDirection::Next => self.next.as_ref(),
            FlipDirection::Prev => self.prev.as_ref(),
        }
    }

    /// Directions with a populated slot.
    #[must_use]
    pub const fn armed(&self) -> ArmedDirections {
        ArmedDirections {
            next: self.next.is_some(),
            prev: self.prev.is_some(),
        }
    }
}

/// Pick the edge a predecessor handle should stand in for, if any.
fn predecessor_direction<H: FlipHost>(
    host: &H,
    predecessor: &H::Portal,
    neighbors: &Neighbors,
    location: &PageLocation,
    policy: PredecessorReuse,
) -> Option<FlipDirection> {
    match policy {
        PredecessorReuse::Never => None,
        PredecessorReuse::PreviousEdge => neighbors.has_prev().then_some(FlipDirection::Prev),
        PredecessorReuse::MatchingTarget => {
            let src = host.portal_src(predecessor);
            if src.trim().is_empty() {
                return None;
            }
            let target = location.absolutize(&src);
            [
                (FlipDirection::Prev, neighbors.prev.as_ref()),
                (FlipDirection::Next, neighbors.next.as_ref()),
            ]
            .into_iter()
            .find_map(|(direction, neighbor)| {
                neighbor
                    .filter(|n| location.absolutize(&n.src) == target)
                    .map(|_| direction)
            })
        }
    }
}

/// Create, duplicate and place handles for every defined edge.
///
/// Absent edges leave their slot and back face untouched.
pub fn preload<H: FlipHost>(
    host: &mut H,
    layout: &FlipLayout<H::Element>,
    neighbors: &Neighbors,
    location: &PageLocation,
    predecessor: Option<H::Portal>,
    policy: PredecessorReuse,
) -> Result<PreloadedNeighbors<H::Portal>> {
    let mut adopted = predecessor.and_then(|portal| {
        let direction = predecessor_direction(&*host, &portal, neighbors, location, policy);
        debug!(
            target: "pageflip.preload",
            ?policy,
            reuse = ?direction,
            "predecessor handle supplied"
        );
        direction.map(|direction| (direction, portal))
    });

    let mut place = |direction: FlipDirection,
                     neighbor: Option<&Neighbor>|
     -> Result<Option<PreloadedEdge<H::Portal>>> {
        let Some(neighbor) = neighbor else {
            debug!(target: "pageflip.preload", %direction, "no neighbor, edge disabled");
            return Ok(None);
        };
        let reused = adopted
            .take_if(|(reuse, _)| *reuse == direction)
            .map(|(_, portal)| portal);
        let reused_predecessor = reused.is_some();
        let slot = match reused {
            Some(portal) => portal,
            None => host.create_portal(&neighbor.src)?,
        };
        let back = host.duplicate_portal(&slot)?;
        host.append_portal(layout.slot(direction), &slot)?;
        host.append_portal(&layout.panel(direction).back, &back)?;
        debug!(
            target: "pageflip.preload",
            %direction,
            page = %neighbor.page,
            src = %neighbor.src,
            reused_predecessor,
            "neighbor preloaded"
        );
        Ok(Some(PreloadedEdge {
            page: neighbor.page.clone(),
            slot,
            back,
            reused_predecessor,
        }))
    };

    let next = place(FlipDirection::Next, neighbors.next.as_ref())?;
    let prev = place(FlipDirection::Prev, neighbors.prev.as_ref())?;
    Ok(PreloadedNeighbors { next, prev })
}
