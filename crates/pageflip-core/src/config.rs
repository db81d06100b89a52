#![forbid(unsafe_code)]

//! Immutable controller configuration.
//!
//! Held by the controller as a single field and passed by reference to the
//! bootstrap, preloader and transition engine, so the container selector set
//! has exactly one source of truth.

use serde::{Deserialize, Serialize};

use crate::error::{FlipError, Result};
use crate::host::ContainerRole;

/// Selectors of the six containers the controller drives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlipSelectors {
    pub upper_front: String,
    pub upper_back: String,
    pub lower_front: String,
    pub lower_back: String,
    pub next_slot: String,
    pub prev_slot: String,
}

impl Default for FlipSelectors {
    fn default() -> Self {
        Self {
            upper_front: "#upperFold .front".into(),
            upper_back: "#upperFold .back".into(),
            lower_front: "#lowerFold .front".into(),
            lower_back: "#lowerFold .back".into(),
            next_slot: "#nextPortal".into(),
            prev_slot: "#prevPortal".into(),
        }
    }
}

impl FlipSelectors {
    /// Selector for one container role.
    #[must_use]
    pub fn get(&self, role: ContainerRole) -> &str {
        match role {
            ContainerRole::UpperFront => &self.upper_front,
            ContainerRole::UpperBack => &self.upper_back,
            ContainerRole::LowerFront => &self.lower_front,
            ContainerRole::LowerBack => &self.lower_back,
            ContainerRole::NextSlot => &self.next_slot,
            ContainerRole::PrevSlot => &self.prev_slot,
        }
    }
}

/// CSS parameters of the fold rotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionStyle {
    pub duration_ms: u32,
    pub easing: String,
    /// Rotation around the horizontal axis, in degrees.
    pub rotation_deg: f64,
}

impl Default for TransitionStyle {
    fn default() -> Self {
        Self {
            duration_ms: 500,
            easing: "ease-in-out".into(),
            rotation_deg: 180.0,
        }
    }
}

impl TransitionStyle {
    /// Value for the CSS `transition` property.
    #[must_use]
    pub fn transition_value(&self) -> String {
        format!("all {}ms {}", self.duration_ms, self.easing)
    }

    /// Value for the CSS `transform` property.
    #[must_use]
    pub fn transform_value(&self) -> String {
        format!("rotate3d(1, 0, 0, {}deg)", self.rotation_deg)
    }
}

/// What layout bootstrap does when containers are missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaffoldMode {
    /// Append the default fold/slot markup, then resolve again.
    #[default]
    Synthesize,
    /// The host page must already supply every container.
    Existing,
}

/// Whether a predecessor handle replaces a freshly created one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredecessorReuse {
    /// Always create fresh handles.
    Never,
    /// Reuse the predecessor for the prev edge whenever one exists.
    PreviousEdge,
    /// Reuse the predecessor for whichever edge targets the same document.
    #[default]
    MatchingTarget,
}

/// Controller configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlipConfig {
    pub selectors: FlipSelectors,
    pub transition: TransitionStyle,
    pub scaffold: ScaffoldMode,
    pub predecessor_reuse: PredecessorReuse,
}

impl FlipConfig {
    /// Parse and validate a JSON configuration. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|err| FlipError::InvalidConfig(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for role in ContainerRole::ALL {
            if self.selectors.get(role).trim().is_empty() {
                return Err(FlipError::InvalidConfig(format!(
                    "selector for {role} is empty"
                )));
            }
        }
        if self.transition.duration_ms == 0 {
            return Err(FlipError::InvalidConfig(
                "transition duration must be positive".into(),
            ));
        }
        if !self.transition.rotation_deg.is_finite() || self.transition.rotation_deg == 0.0 {
            return Err(FlipError::InvalidConfig(format!(
                "rotation {} is not a usable angle",
                self.transition.rotation_deg
            )));
        }
        if self.transition.easing.trim().is_empty() {
            return Err(FlipError::InvalidConfig("easing is empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_demo_markup() {
        let config = FlipConfig::default();
        assert_eq!(config.selectors.get(ContainerRole::LowerFront), "#lowerFold .front");
        assert_eq!(config.selectors.get(ContainerRole::PrevSlot), "#prevPortal");
        assert_eq!(config.transition.transition_value(), "all 500ms ease-in-out");
        assert_eq!(
            config.transition.transform_value(),
            "rotate3d(1, 0, 0, 180deg)"
        );
        assert_eq!(config.scaffold, ScaffoldMode::Synthesize);
        assert_eq!(config.predecessor_reuse, PredecessorReuse::MatchingTarget);
        config.validate().expect("defaults are valid");
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = FlipConfig::from_json(
            r#"{"transition": {"duration_ms": 750}, "scaffold": "existing"}"#,
        )
        .expect("valid");
        assert_eq!(config.transition.duration_ms, 750);
        assert_eq!(config.transition.easing, "ease-in-out");
        assert_eq!(config.scaffold, ScaffoldMode::Existing);
        assert_eq!(config.selectors, FlipSelectors::default());
    }

    #[test]
    fn rejects_empty_selector() {
        let err = FlipConfig::from_json(r#"{"selectors": {"next_slot": "  "}}"#)
            .expect_err("blank selector");
        assert!(err.to_string().contains("next slot"), "{err}");
    }

    #[test]
    fn rejects_zero_duration_and_bad_angle() {
        assert!(FlipConfig::from_json(r#"{"transition": {"duration_ms": 0}}"#).is_err());
        let mut config = FlipConfig::default();
        config.transition.rotation_deg = f64::NAN;
        assert!(matches!(config.validate(), Err(FlipError::InvalidConfig(_))));
    }

    #[test]
    fn malformed_json_is_config_error() {
        assert!(matches!(
            FlipConfig::from_json("{"),
            Err(FlipError::InvalidConfig(_))
        ));
    }
}
