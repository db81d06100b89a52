#![forbid(unsafe_code)]

//! Flip transition controller.
//!
//! Construction runs the whole setup in a fixed order, split in two phases.
//! [`PreparedFlip::prepare`]:
//! 1. resolve the current page from the adjacency source,
//! 2. bootstrap the fold/slot layout,
//! 3. request the front-face preview (not awaited).
//!
//! [`PreparedFlip::arm`], given the [`BootMode`]:
//! 4. preload neighbor handles,
//! 5. register click listeners for the armed directions and the
//!    document-wide transition-end listener.
//!
//! Afterwards the host feeds DOM events in through [`FlipController::dispatch`].

use std::collections::VecDeque;

use tracing::{debug, trace, warn};

use crate::adjacency::{AdjacencySource, ResolvedPage};
use crate::config::FlipConfig;
use crate::error::Result;
use crate::host::{FlipHost, StyleProperty};
use crate::layout::{FlipLayout, bootstrap};
use crate::page::{PageId, PageLocation};
use crate::preload::{PreloadedNeighbors, preload};
use crate::preview::PreviewRequest;
use crate::transition::{
    ArmedDirections, FlipDirection, FlipEffect, FlipLogEntry, FlipMachine, FlipPhase, FlipSignal,
    FlipStep,
};

/// Bounded in-memory dispatch log size.
pub const MAX_LOG_ENTRIES: usize = 256;

/// How the current document was reached, resolved by the bootstrap before
/// the controller is built.
#[derive(Debug, Clone)]
pub enum BootMode<P> {
    /// Ordinary navigation or first load.
    Initial,
    /// Reached by activating an embedding handle in a predecessor document.
    Activated { predecessor: Option<P> },
}

impl<P> BootMode<P> {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Activated { .. } => "activated",
        }
    }

    fn into_predecessor(self) -> Option<P> {
        match self {
            Self::Initial => None,
            Self::Activated { predecessor } => predecessor,
        }
    }
}

/// Point-in-time view of the controller's lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerState<P> {
    pub current_page: PageId,
    pub is_transitioning: bool,
    /// Direction whose slot handle was designated for activation.
    pub active_direction: Option<FlipDirection>,
    /// Handle designated for activation, set once at click time.
    pub active_portal: Option<P>,
}

/// First construction phase: layout and preview, nothing armed yet.
///
/// A document loaded inside a portal host prepares immediately so the
/// embedding page sees its folds and preview, and arms only once it is
/// activated and the predecessor handle is known.
pub struct PreparedFlip<H: FlipHost> {
    host: H,
    config: FlipConfig,
    page: ResolvedPage,
    layout: FlipLayout<H::Element>,
    location: PageLocation,
}

impl<H: FlipHost> core::fmt::Debug for PreparedFlip<H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PreparedFlip")
            .field("page", &self.page.current)
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

impl<H: FlipHost> PreparedFlip<H> {
    /// Validate, resolve the current page, bootstrap the layout and request
    /// the front-face preview.
    ///
    /// Fails on invalid configuration, an unknown current page or a
    /// container that cannot be resolved.
    pub fn prepare(
        mut host: H,
        config: FlipConfig,
        adjacency: &dyn AdjacencySource,
        location: &PageLocation,
    ) -> Result<Self> {
        let _span = tracing::debug_span!(
            "pageflip.init",
            phase = "prepare",
            variant = adjacency.variant(),
            location = %location,
        )
        .entered();

        config.validate()?;
        let page = adjacency.resolve(location)?;
        let layout = bootstrap(&mut host, &config)?;

        host.fetch_preview(PreviewRequest::new(
            page.content_src.clone(),
            vec![layout.upper.front.clone(), layout.lower.front.clone()],
        ));
        debug!(target: "pageflip.controller", page = %page.current, "layout prepared");

        Ok(Self {
            host,
            config,
            page,
            layout,
            location: location.clone(),
        })
    }

    /// Preload neighbor handles and register listeners.
    ///
    /// No listener is registered when preloading fails.
    pub fn arm(self, boot: BootMode<H::Portal>) -> Result<FlipController<H>> {
        let Self {
            mut host,
            config,
            page,
            layout,
            location,
        } = self;
        let _span = tracing::debug_span!(
            "pageflip.init",
            phase = "arm",
            boot = boot.label(),
            page = %page.current,
        )
        .entered();

        let neighbors = preload(
            &mut host,
            &layout,
            &page.neighbors,
            &location,
            boot.into_predecessor(),
            config.predecessor_reuse,
        )?;

        let armed = neighbors.armed();
        for direction in FlipDirection::BOTH {
            if armed.contains(direction) {
                host.listen_click(direction, &layout.panel(direction).front)?;
            }
        }
        if !armed.is_empty() {
            host.listen_transition_end()?;
        }

        debug!(
            target: "pageflip.controller",
            page = %page.current,
            next = armed.next,
            prev = armed.prev,
            "controller ready"
        );

        Ok(FlipController {
            host,
            config,
            page,
            layout,
            neighbors,
            machine: FlipMachine::new(armed),
            active_portal: None,
            logs: VecDeque::new(),
        })
    }

    #[must_use]
    pub const fn current_page(&self) -> &PageId {
        &self.page.current
    }

    #[must_use]
    pub const fn layout(&self) -> &FlipLayout<H::Element> {
        &self.layout
    }

    #[must_use]
    pub const fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }
}

/// Page-flip controller over a [`FlipHost`].
pub struct FlipController<H: FlipHost> {
    host: H,
    config: FlipConfig,
    page: ResolvedPage,
    layout: FlipLayout<H::Element>,
    neighbors: PreloadedNeighbors<H::Portal>,
    machine: FlipMachine,
    active_portal: Option<H::Portal>,
    logs: VecDeque<FlipLogEntry>,
}

impl<H: FlipHost> core::fmt::Debug for FlipController<H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FlipController")
            .field("page", &self.page.current)
            .field("phase", &self.machine.phase())
            .field("armed", &self.machine.armed())
            .finish_non_exhaustive()
    }
}

impl<H: FlipHost> FlipController<H> {
    /// Prepare and arm in one go.
    ///
    /// See [`PreparedFlip::prepare`] and [`PreparedFlip::arm`] for the
    /// failure cases. No listener is registered when construction fails.
    pub fn new(
        host: H,
        config: FlipConfig,
        adjacency: &dyn AdjacencySource,
        location: &PageLocation,
        boot: BootMode<H::Portal>,
    ) -> Result<Self> {
        PreparedFlip::prepare(host, config, adjacency, location)?.arm(boot)
    }

    /// Feed one host signal through the transition engine.
    pub fn dispatch(&mut self, signal: FlipSignal) -> FlipStep {
        let _span = tracing::trace_span!("pageflip.dispatch", signal = ?signal.kind()).entered();
        let step = self.machine.dispatch(&signal);
        match step.effect {
            Some(FlipEffect::BeginRotation(direction)) => self.begin_rotation(direction),
            Some(FlipEffect::Activate(direction)) => self.hand_off(direction),
            None => trace!(
                target: "pageflip.controller",
                outcome = ?step.log.outcome,
                "signal ignored"
            ),
        }
        if self.logs.len() >= MAX_LOG_ENTRIES {
            self.logs.pop_front();
        }
        self.logs.push_back(step.log);
        step
    }

    fn begin_rotation(&mut self, direction: FlipDirection) {
        self.active_portal = self
            .neighbors
            .edge(direction)
            .map(|edge| edge.slot.clone());
        if self.active_portal.is_none() {
            warn!(target: "pageflip.controller", %direction, "flip started without a slot handle");
        }

        let transition = self.config.transition.transition_value();
        let transform = self.config.transition.transform_value();
        let panel = self.layout.panel(direction).fold.clone();
        let sibling = self.layout.sibling_panel(direction).fold.clone();
        let slot = self.layout.slot(direction).clone();
        let other_slot = self.layout.slot(direction.opposite()).clone();
        let writes = [
            (&panel, StyleProperty::ZIndex, "2"),
            (&sibling, StyleProperty::ZIndex, "1"),
            (&slot, StyleProperty::ZIndex, "0"),
            (&panel, StyleProperty::Transition, transition.as_str()),
            (&panel, StyleProperty::Transform, transform.as_str()),
            (&slot, StyleProperty::Opacity, "1"),
            (&other_slot, StyleProperty::Opacity, "0"),
        ];
        for (element, property, value) in writes {
            if let Err(err) = self.host.set_style(element, property, value) {
                warn!(
                    target: "pageflip.controller",
                    property = property.css_name(),
                    error = %err,
                    "style write failed"
                );
            }
        }
        debug!(target: "pageflip.controller", %direction, "flip started");
    }

    fn hand_off(&mut self, direction: FlipDirection) {
        match &self.active_portal {
            Some(portal) => {
                debug!(target: "pageflip.controller", %direction, "activating slot handle");
                self.host.activate(portal);
            }
            None => warn!(target: "pageflip.controller", %direction, "no handle to activate"),
        }
    }

    #[must_use]
    pub fn state(&self) -> ControllerState<H::Portal> {
        ControllerState {
            current_page: self.page.current.clone(),
            is_transitioning: self.machine.is_transitioning(),
            active_direction: self.active_direction(),
            active_portal: self.active_portal.clone(),
        }
    }

    #[must_use]
    pub const fn phase(&self) -> FlipPhase {
        self.machine.phase()
    }

    #[must_use]
    pub const fn is_transitioning(&self) -> bool {
        self.machine.is_transitioning()
    }

    #[must_use]
    pub const fn current_page(&self) -> &PageId {
        &self.page.current
    }

    /// Direction chosen by the accepted click, if any.
    #[must_use]
    pub const fn active_direction(&self) -> Option<FlipDirection> {
        self.machine.phase().direction()
    }

    /// Handle designated for activation at click time.
    #[must_use]
    pub const fn active_portal(&self) -> Option<&H::Portal> {
        self.active_portal.as_ref()
    }

    #[must_use]
    pub const fn armed(&self) -> ArmedDirections {
        self.machine.armed()
    }

    #[must_use]
    pub const fn config(&self) -> &FlipConfig {
        &self.config
    }

    #[must_use]
    pub const fn layout(&self) -> &FlipLayout<H::Element> {
        &self.layout
    }

    #[must_use]
    pub const fn neighbors(&self) -> &PreloadedNeighbors<H::Portal> {
        &self.neighbors
    }

    #[must_use]
    pub const fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Recent dispatch records, oldest first.
    pub fn logs(&self) -> impl Iterator<Item = &FlipLogEntry> {
        self.logs.iter()
    }

    /// Take all buffered dispatch records.
    pub fn drain_logs(&mut self) -> Vec<FlipLogEntry> {
        self.logs.drain(..).collect()
    }
}
