#![forbid(unsafe_code)]

//! Platform-independent boot planning shared by the wasm exports and the
//! native tests. No JS/WASM types here.

use pageflip_core::transition::FlipLogEntry;
use pageflip_core::{
    AdjacencySource, AdjacencySpec, ControllerState, FlipConfig, FlipDirection, FlipPhase, Result,
};

/// What the bootstrap does with the current document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootDecision {
    /// Portals are unsupported: show the page normally, no controller.
    PlainPage,
    /// First load (no portal host): prepare and arm the controller now.
    BuildNow,
    /// Loaded inside a portal: prepare now, arm once activated.
    AwaitActivation,
}

impl BootDecision {
    /// Decide from the two browser capability probes.
    #[must_use]
    pub const fn decide(portals_supported: bool, inside_portal_host: bool) -> Self {
        match (portals_supported, inside_portal_host) {
            (false, _) => Self::PlainPage,
            (true, false) => Self::BuildNow,
            (true, true) => Self::AwaitActivation,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::PlainPage => "plain_page",
            Self::BuildNow => "build_now",
            Self::AwaitActivation => "await_activation",
        }
    }
}

/// Parsed `start()` arguments.
#[derive(Debug)]
pub struct StartPlan {
    pub adjacency: Box<dyn AdjacencySource>,
    pub config: FlipConfig,
}

impl StartPlan {
    /// Parse the adjacency JSON and the optional configuration JSON.
    ///
    /// An absent or blank configuration uses the defaults.
    pub fn parse(adjacency_json: &str, config_json: Option<&str>) -> Result<Self> {
        let adjacency = AdjacencySpec::from_json(adjacency_json)?.into_source();
        let config = match config_json.map(str::trim) {
            Some(json) if !json.is_empty() => FlipConfig::from_json(json)?,
            _ => FlipConfig::default(),
        };
        Ok(Self { adjacency, config })
    }
}

/// JSON snapshot of the controller for `PageFlip.stateJson()`.
#[must_use]
pub fn state_json<P>(state: &ControllerState<P>, phase: FlipPhase) -> String {
    serde_json::json!({
        "phase": phase.label(),
        "current_page": state.current_page.to_string(),
        "is_transitioning": state.is_transitioning,
        "direction": state.active_direction.map(FlipDirection::label),
        "has_active_portal": state.active_portal.is_some(),
    })
    .to_string()
}

/// Newline-delimited JSON rendering of dispatch records.
#[must_use]
pub fn logs_jsonl(entries: &[FlipLogEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&entry.to_json());
        out.push('\n');
    }
    out
}
