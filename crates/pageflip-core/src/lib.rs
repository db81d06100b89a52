#![forbid(unsafe_code)]

//! `pageflip-core` drives a page-flip transition between documents.
//!
//! The current document is shown as a static preview on two hinged panels
//! (upper and lower fold). The previous/next documents are preloaded as
//! embedding handles (portals) on the panels' back faces and in two
//! off-screen slots. A click on a front face rotates that panel; when the
//! rotation completes, the slot handle for that direction is activated and
//! the browsing context moves to the neighbor.
//!
//! Design goals:
//! - **Host-driven**: every DOM capability goes through [`FlipHost`]; the
//!   host forwards events back as [`FlipSignal`] values.
//! - **Single use**: one flip per loaded document, enforced by the
//!   [`transition::FlipMachine`].
//! - **No JS types**: everything here runs and is tested natively. The
//!   browser binding lives in `pageflip-web`.

pub mod adjacency;
pub mod config;
pub mod controller;
pub mod error;
pub mod host;
pub mod layout;
pub mod page;
pub mod preload;
pub mod preview;
pub mod transition;

#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;

pub use adjacency::{AdjacencySource, AdjacencySpec, GraphPages, PageEdges, SequentialPages};
pub use config::{FlipConfig, FlipSelectors, PredecessorReuse, ScaffoldMode, TransitionStyle};
pub use controller::{BootMode, ControllerState, FlipController, PreparedFlip};
pub use error::{FlipError, Result};
pub use host::{ContainerRole, FlipHost, StyleProperty};
pub use page::{Neighbor, Neighbors, PageId, PageLocation};
pub use transition::{FlipDirection, FlipPhase, FlipSignal, FlipStep};
