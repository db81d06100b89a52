#![forbid(unsafe_code)]

//! Host capability seam.
//!
//! The controller never touches a real DOM. Everything it needs from the
//! embedding environment goes through [`FlipHost`]: container lookup,
//! embedding-handle (portal) creation, isolated preview fragments, style
//! writes, listener registration, preview fetch and activation.
//!
//! Hosts forward DOM events back to the controller as
//! [`crate::FlipSignal`] values.

use core::fmt;

use crate::error::Result;
use crate::preview::PreviewRequest;
use crate::transition::FlipDirection;

/// One of the six containers the controller addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContainerRole {
    UpperFront,
    UpperBack,
    LowerFront,
    LowerBack,
    NextSlot,
    PrevSlot,
}

impl ContainerRole {
    pub const ALL: [Self; 6] = [
        Self::UpperFront,
        Self::UpperBack,
        Self::LowerFront,
        Self::LowerBack,
        Self::NextSlot,
        Self::PrevSlot,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::UpperFront => "upper front",
            Self::UpperBack => "upper back",
            Self::LowerFront => "lower front",
            Self::LowerBack => "lower back",
            Self::NextSlot => "next slot",
            Self::PrevSlot => "prev slot",
        }
    }
}

impl fmt::Display for ContainerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Inline style properties the transition engine writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StyleProperty {
    Transition,
    Transform,
    ZIndex,
    Opacity,
}

impl StyleProperty {
    /// CSS property name.
    #[must_use]
    pub const fn css_name(self) -> &'static str {
        match self {
            Self::Transition => "transition",
            Self::Transform => "transform",
            Self::ZIndex => "z-index",
            Self::Opacity => "opacity",
        }
    }
}

/// Capabilities the controller consumes from its embedding environment.
///
/// `Element` and `Portal` are cheap reference handles (JS object refs in the
/// browser, indices in the recording host). Duplicating a portal must yield
/// a distinct instance with the same target, never an alias.
pub trait FlipHost {
    type Element: Clone + fmt::Debug;
    type Portal: Clone + fmt::Debug;

    /// Resolve a container by selector.
    fn query(&self, selector: &str) -> Option<Self::Element>;

    /// Parent of `element` (the fold a face belongs to).
    fn parent(&self, element: &Self::Element) -> Option<Self::Element>;

    /// Append `markup` to the document body.
    fn append_markup(&mut self, markup: &str) -> Result<()>;

    /// Create an embedding handle targeting `src`.
    fn create_portal(&mut self, src: &str) -> Result<Self::Portal>;

    /// Create an independent copy of `portal` with the same target.
    fn duplicate_portal(&mut self, portal: &Self::Portal) -> Result<Self::Portal>;

    /// Target of `portal`, as the host reports it (possibly absolutized).
    fn portal_src(&self, portal: &Self::Portal) -> String;

    /// Place `portal` inside `container`.
    fn append_portal(&mut self, container: &Self::Element, portal: &Self::Portal) -> Result<()>;

    /// Attach a fresh isolated fragment rendering `markup` to `container`.
    fn attach_isolated(&mut self, container: &Self::Element, markup: &str) -> Result<()>;

    /// Write one inline style property.
    fn set_style(
        &mut self,
        element: &Self::Element,
        property: StyleProperty,
        value: &str,
    ) -> Result<()>;

    /// Forward clicks on `element` as `FlipSignal::Click(direction)`.
    fn listen_click(&mut self, direction: FlipDirection, element: &Self::Element) -> Result<()>;

    /// Forward document-wide transition completions as
    /// `FlipSignal::TransitionEnd`.
    fn listen_transition_end(&mut self) -> Result<()>;

    /// Start fetching preview markup; on success the host calls
    /// [`crate::preview::install_preview`]. Fire-and-forget.
    fn fetch_preview(&mut self, request: PreviewRequest<Self::Element>);

    /// Invoke the one-shot activation of `portal`. Fire-and-forget.
    fn activate(&mut self, portal: &Self::Portal);
}
