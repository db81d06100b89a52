#![forbid(unsafe_code)]

//! Flip transition lifecycle state machine.
//!
//! `Idle -> Transitioning -> HandoffComplete`, one way only. The machine is
//! pure: it decides what should happen and reports it as a [`FlipEffect`];
//! the controller applies effects to the host. Signals that do not advance
//! the machine are reported with a [`FlipIgnoredReason`] rather than an
//! error.

use core::fmt;

/// CSS property whose completion ends the flip.
pub const ROTATION_PROPERTY: &str = "transform";

/// Navigation direction of a flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlipDirection {
    /// Lower panel folds up; the next-slot handle is activated.
    Next,
    /// Upper panel folds down; the prev-slot handle is activated.
    Prev,
}

impl FlipDirection {
    pub const BOTH: [Self; 2] = [Self::Next, Self::Prev];

    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Next => Self::Prev,
            Self::Prev => Self::Next,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Next => "next",
            Self::Prev => "prev",
        }
    }
}

impl fmt::Display for FlipDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which click affordances exist for the current page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArmedDirections {
    pub next: bool,
    pub prev: bool,
}

impl ArmedDirections {
    #[must_use]
    pub const fn contains(self, direction: FlipDirection) -> bool {
        match direction {
            FlipDirection::Next => self.next,
            FlipDirection::Prev => self.prev,
        }
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        !self.next && !self.prev
    }
}

/// Lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipPhase {
    Idle,
    Transitioning { direction: FlipDirection },
    HandoffComplete { direction: FlipDirection },
}

impl FlipPhase {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Transitioning { .. } => "transitioning",
            Self::HandoffComplete { .. } => "handoff_complete",
        }
    }

    #[must_use]
    pub const fn direction(self) -> Option<FlipDirection> {
        match self {
            Self::Idle => None,
            Self::Transitioning { direction } | Self::HandoffComplete { direction } => {
                Some(direction)
            }
        }
    }
}

/// Input signal forwarded by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlipSignal {
    Click(FlipDirection),
    TransitionEnd { property: String },
}

impl FlipSignal {
    /// Transition-end signal for `property`.
    #[must_use]
    pub fn transition_end(property: impl Into<String>) -> Self {
        Self::TransitionEnd {
            property: property.into(),
        }
    }

    /// Signal category recorded in logs.
    #[must_use]
    pub const fn kind(&self) -> FlipSignalKind {
        match self {
            Self::Click(_) => FlipSignalKind::Click,
            Self::TransitionEnd { .. } => FlipSignalKind::TransitionEnd,
        }
    }
}

/// Signal category recorded in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipSignalKind {
    Click,
    TransitionEnd,
}

/// Why a signal did not advance the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipIgnoredReason {
    /// Click in a direction whose neighbor does not exist.
    NoNeighbor,
    /// Click while a flip is already running.
    AlreadyTransitioning,
    /// Any signal after activation was invoked.
    HandoffComplete,
    /// Transition end while idle.
    NotTransitioning,
    /// Transition end for a property other than the rotation.
    PropertyMismatch,
}

impl FlipIgnoredReason {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::NoNeighbor => "no_neighbor",
            Self::AlreadyTransitioning => "already_transitioning",
            Self::HandoffComplete => "handoff_complete",
            Self::NotTransitioning => "not_transitioning",
            Self::PropertyMismatch => "property_mismatch",
        }
    }
}

/// Host-side work requested by an accepted signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipEffect {
    /// Raise and rotate the panel, reveal the destination slot.
    BeginRotation(FlipDirection),
    /// Activate the handle in the slot for this direction.
    Activate(FlipDirection),
}

/// Phase change caused by an accepted signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlipTransition {
    pub from: FlipPhase,
    pub to: FlipPhase,
}

/// Outcome category of one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipLogOutcome {
    Started,
    HandedOff,
    Ignored(FlipIgnoredReason),
}

/// Structured record of one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlipLogEntry {
    pub signal: FlipSignalKind,
    /// Monotonic sequence of accepted signals; `None` when ignored.
    pub sequence: Option<u64>,
    pub direction: Option<FlipDirection>,
    pub outcome: FlipLogOutcome,
}

impl FlipLogEntry {
    /// One-line JSON rendering for host consumption.
    #[must_use]
    pub fn to_json(&self) -> String {
        let signal = match self.signal {
            FlipSignalKind::Click => "click",
            FlipSignalKind::TransitionEnd => "transition_end",
        };
        let (outcome, reason) = match self.outcome {
            FlipLogOutcome::Started => ("started", None),
            FlipLogOutcome::HandedOff => ("handed_off", None),
            FlipLogOutcome::Ignored(reason) => ("ignored", Some(reason.label())),
        };
        serde_json::json!({
            "signal": signal,
            "sequence": self.sequence,
            "direction": self.direction.map(FlipDirection::label),
            "outcome": outcome,
            "reason": reason,
        })
        .to_string()
    }
}

/// Result of one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlipStep {
    pub transition: Option<FlipTransition>,
    pub effect: Option<FlipEffect>,
    pub log: FlipLogEntry,
}

impl FlipStep {
    fn ignored(
        signal: FlipSignalKind,
        direction: Option<FlipDirection>,
        reason: FlipIgnoredReason,
    ) -> Self {
        Self {
            transition: None,
            effect: None,
            log: FlipLogEntry {
                signal,
                sequence: None,
                direction,
                outcome: FlipLogOutcome::Ignored(reason),
            },
        }
    }

    #[must_use]
    pub const fn accepted(&self) -> bool {
        !matches!(self.log.outcome, FlipLogOutcome::Ignored(_))
    }
}

/// Single-use flip lifecycle.
#[derive(Debug, Clone)]
pub struct FlipMachine {
    phase: FlipPhase,
    armed: ArmedDirections,
    next_sequence: u64,
}

impl FlipMachine {
    #[must_use]
    pub const fn new(armed: ArmedDirections) -> Self {
        Self {
            phase: FlipPhase::Idle,
            armed,
            next_sequence: 1,
        }
    }

    #[must_use]
    pub const fn phase(&self) -> FlipPhase {
        self.phase
    }

    #[must_use]
    pub const fn armed(&self) -> ArmedDirections {
        self.armed
    }

    /// True from the first accepted click onwards; never resets.
    #[must_use]
    pub const fn is_transitioning(&self) -> bool {
        !matches!(self.phase, FlipPhase::Idle)
    }

    /// Feed one signal.
    pub fn dispatch(&mut self, signal: &FlipSignal) -> FlipStep {
        match signal {
            FlipSignal::Click(direction) => self.click(*direction),
            FlipSignal::TransitionEnd { property } => self.transition_end(property),
        }
    }

    fn click(&mut self, direction: FlipDirection) -> FlipStep {
        let kind = FlipSignalKind::Click;
        match self.phase {
            FlipPhase::Transitioning { .. } => {
                return FlipStep::ignored(
                    kind,
                    Some(direction),
                    FlipIgnoredReason::AlreadyTransitioning,
                );
            }
            FlipPhase::HandoffComplete { .. } => {
                return FlipStep::ignored(kind, Some(direction), FlipIgnoredReason::HandoffComplete);
            }
            FlipPhase::Idle => {}
        }
        if !self.armed.contains(direction) {
            return FlipStep::ignored(kind, Some(direction), FlipIgnoredReason::NoNeighbor);
        }
        self.advance(
            kind,
            direction,
            FlipPhase::Transitioning { direction },
            FlipEffect::BeginRotation(direction),
            FlipLogOutcome::Started,
        )
    }

    fn transition_end(&mut self, property: &str) -> FlipStep {
        let kind = FlipSignalKind::TransitionEnd;
        let direction = match self.phase {
            FlipPhase::Idle => {
                return FlipStep::ignored(kind, None, FlipIgnoredReason::NotTransitioning);
            }
            FlipPhase::HandoffComplete { direction } => {
                return FlipStep::ignored(kind, Some(direction), FlipIgnoredReason::HandoffComplete);
            }
            FlipPhase::Transitioning { direction } => direction,
        };
        if property != ROTATION_PROPERTY {
            return FlipStep::ignored(kind, Some(direction), FlipIgnoredReason::PropertyMismatch);
        }
        self.advance(
            kind,
            direction,
            FlipPhase::HandoffComplete { direction },
            FlipEffect::Activate(direction),
            FlipLogOutcome::HandedOff,
        )
    }

    fn advance(
        &mut self,
        signal: FlipSignalKind,
        direction: FlipDirection,
        to: FlipPhase,
        effect: FlipEffect,
        outcome: FlipLogOutcome,
    ) -> FlipStep {
        let from = self.phase;
        self.phase = to;
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.saturating_add(1);
        FlipStep {
            transition: Some(FlipTransition { from, to }),
            effect: Some(effect),
            log: FlipLogEntry {
                signal,
                sequence: Some(sequence),
                direction: Some(direction),
                outcome,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const BOTH: ArmedDirections = ArmedDirections {
        next: true,
        prev: true,
    };

    #[test]
    fn click_then_rotation_end_hands_off() {
        let mut machine = FlipMachine::new(BOTH);
        let started = machine.dispatch(&FlipSignal::Click(FlipDirection::Next));
        assert_eq!(
            started.effect,
            Some(FlipEffect::BeginRotation(FlipDirection::Next))
        );
        assert_eq!(started.log.sequence, Some(1));
        assert!(machine.is_transitioning());

        let done = machine.dispatch(&FlipSignal::transition_end(ROTATION_PROPERTY));
        assert_eq!(done.effect, Some(FlipEffect::Activate(FlipDirection::Next)));
        assert_eq!(
            done.transition,
            Some(FlipTransition {
                from: FlipPhase::Transitioning {
                    direction: FlipDirection::Next
                },
                to: FlipPhase::HandoffComplete {
                    direction: FlipDirection::Next
                },
            })
        );
        assert_eq!(done.log.sequence, Some(2));
    }

    #[test]
    fn second_click_is_ignored_in_either_direction() {
        let mut machine = FlipMachine::new(BOTH);
        machine.dispatch(&FlipSignal::Click(FlipDirection::Prev));
        for direction in FlipDirection::BOTH {
            let step = machine.dispatch(&FlipSignal::Click(direction));
            assert_eq!(
                step.log.outcome,
                FlipLogOutcome::Ignored(FlipIgnoredReason::AlreadyTransitioning)
            );
            assert_eq!(step.effect, None);
        }
        assert_eq!(
            machine.phase(),
            FlipPhase::Transitioning {
                direction: FlipDirection::Prev
            }
        );
    }

    #[test]
    fn unarmed_direction_is_ignored() {
        let mut machine = FlipMachine::new(ArmedDirections {
            next: true,
            prev: false,
        });
        let step = machine.dispatch(&FlipSignal::Click(FlipDirection::Prev));
        assert_eq!(
            step.log.outcome,
            FlipLogOutcome::Ignored(FlipIgnoredReason::NoNeighbor)
        );
        assert_eq!(machine.phase(), FlipPhase::Idle);
    }

    #[test]
    fn other_property_does_not_complete() {
        let mut machine = FlipMachine::new(BOTH);
        machine.dispatch(&FlipSignal::Click(FlipDirection::Next));
        let step = machine.dispatch(&FlipSignal::transition_end("opacity"));
        assert_eq!(
            step.log.outcome,
            FlipLogOutcome::Ignored(FlipIgnoredReason::PropertyMismatch)
        );
        assert!(matches!(machine.phase(), FlipPhase::Transitioning { .. }));
    }

    #[test]
    fn transition_end_while_idle_is_ignored() {
        let mut machine = FlipMachine::new(BOTH);
        let step = machine.dispatch(&FlipSignal::transition_end(ROTATION_PROPERTY));
        assert_eq!(
            step.log.outcome,
            FlipLogOutcome::Ignored(FlipIgnoredReason::NotTransitioning)
        );
        assert!(!machine.is_transitioning());
    }

    #[test]
    fn handoff_happens_once() {
        let mut machine = FlipMachine::new(BOTH);
        machine.dispatch(&FlipSignal::Click(FlipDirection::Next));
        machine.dispatch(&FlipSignal::transition_end(ROTATION_PROPERTY));
        let again = machine.dispatch(&FlipSignal::transition_end(ROTATION_PROPERTY));
        assert_eq!(
            again.log.outcome,
            FlipLogOutcome::Ignored(FlipIgnoredReason::HandoffComplete)
        );
        assert_eq!(again.effect, None);
        let click = machine.dispatch(&FlipSignal::Click(FlipDirection::Prev));
        assert!(!click.accepted());
    }

    #[test]
    fn log_entry_json_shape() {
        let entry = FlipLogEntry {
            signal: FlipSignalKind::Click,
            sequence: None,
            direction: Some(FlipDirection::Prev),
            outcome: FlipLogOutcome::Ignored(FlipIgnoredReason::NoNeighbor),
        };
        let value: serde_json::Value =
            serde_json::from_str(&entry.to_json()).expect("valid json");
        assert_eq!(value["signal"], "click");
        assert_eq!(value["direction"], "prev");
        assert_eq!(value["reason"], "no_neighbor");
        assert!(value["sequence"].is_null());
    }
}
