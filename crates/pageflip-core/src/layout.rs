#![forbid(unsafe_code)]

//! Layout bootstrap: resolve the fold/slot containers once into typed handles.

use tracing::{debug, warn};

use crate::config::{FlipConfig, FlipSelectors, ScaffoldMode};
use crate::error::{FlipError, Result};
use crate::host::{ContainerRole, FlipHost};
use crate::transition::FlipDirection;

/// Markup appended when the host page does not supply the containers.
///
/// Matches the default [`crate::config::FlipSelectors`].
pub const SCAFFOLD_MARKUP: &str = r#"<div id="upperFold"><div class="front"></div><div class="back"></div></div><div id="lowerFold"><div class="front"></div><div class="back"></div></div><div id="nextPortal"></div><div id="prevPortal"></div>"#;

/// One hinged panel: the fold that rotates plus its two faces.
#[derive(Debug, Clone)]
pub struct Panel<E> {
    pub fold: E,
    pub front: E,
    pub back: E,
}

/// Every container the controller drives, resolved once.
#[derive(Debug, Clone)]
pub struct FlipLayout<E> {
    pub upper: Panel<E>,
    pub lower: Panel<E>,
    pub next_slot: E,
    pub prev_slot: E,
}

impl<E> FlipLayout<E> {
    /// Panel that rotates when flipping in `direction`.
    #[must_use]
    pub const fn panel(&self, direction: FlipDirection) -> &Panel<E> {
        match direction {
            FlipDirection::Next => &self.lower,
            FlipDirection::Prev => &self.upper,
        }
    }

    /// Panel that stays put when flipping in `direction`.
    #[must_use]
    pub const fn sibling_panel(&self, direction: FlipDirection) -> &Panel<E> {
        self.panel(direction.opposite())
    }

    /// Off-screen slot holding the live handle for `direction`.
    #[must_use]
    pub const fn slot(&self, direction: FlipDirection) -> &E {
        match direction {
            FlipDirection::Next => &self.next_slot,
            FlipDirection::Prev => &self.prev_slot,
        }
    }
}

/// Resolve all containers, synthesizing the scaffold at most once.
///
/// Idempotent: when the containers already exist nothing is appended. The
/// scaffold is only appended into a page that has none of its containers
/// and only when every configured selector is one it provides; otherwise
/// the missing container is reported without touching the document.
pub fn bootstrap<H: FlipHost>(host: &mut H, config: &FlipConfig) -> Result<FlipLayout<H::Element>> {
    let missing = match resolve(host, config) {
        Ok(layout) => {
            debug!(target: "pageflip.layout", synthesized = false, "containers resolved");
            return Ok(layout);
        }
        Err(err) => err,
    };
    if config.scaffold == ScaffoldMode::Existing {
        return Err(missing);
    }
    if let Some(reason) = scaffold_blocker(host, config) {
        warn!(
            target: "pageflip.layout",
            error = %missing,
            reason,
            "container missing, scaffold not synthesized"
        );
        return Err(missing);
    }
    debug!(
        target: "pageflip.layout",
        error = %missing,
        "container missing, synthesizing scaffold"
    );
    host.append_markup(SCAFFOLD_MARKUP)?;
    resolve(host, config).inspect_err(|err| {
        warn!(target: "pageflip.layout", error = %err, "scaffold did not satisfy selectors");
    })
}

/// Why appending [`SCAFFOLD_MARKUP`] would not help, if it would not.
fn scaffold_blocker<H: FlipHost>(host: &H, config: &FlipConfig) -> Option<&'static str> {
    let defaults = FlipSelectors::default();
    if ContainerRole::ALL
        .into_iter()
        .any(|role| config.selectors.get(role) != defaults.get(role))
    {
        return Some("custom selectors");
    }
    if ContainerRole::ALL
        .into_iter()
        .any(|role| host.query(defaults.get(role)).is_some())
    {
        return Some("partial scaffold present");
    }
    None
}

fn resolve<H: FlipHost>(host: &H, config: &FlipConfig) -> Result<FlipLayout<H::Element>> {
    let lookup = |role: ContainerRole| {
        let selector = config.selectors.get(role);
        host.query(selector).ok_or_else(|| FlipError::MissingContainer {
            role,
            selector: selector.to_owned(),
        })
    };
    let panel = |front_role: ContainerRole, back_role: ContainerRole| -> Result<Panel<H::Element>> {
        let front = lookup(front_role)?;
        let back = lookup(back_role)?;
        let fold = host.parent(&front).ok_or_else(|| FlipError::MissingContainer {
            role: front_role,
            selector: format!("parent of {}", config.selectors.get(front_role)),
        })?;
        Ok(Panel { fold, front, back })
    };
    Ok(FlipLayout {
        upper: panel(ContainerRole::UpperFront, ContainerRole::UpperBack)?,
        lower: panel(ContainerRole::LowerFront, ContainerRole::LowerBack)?,
        next_slot: lookup(ContainerRole::NextSlot)?,
        prev_slot: lookup(ContainerRole::PrevSlot)?,
    })
}
