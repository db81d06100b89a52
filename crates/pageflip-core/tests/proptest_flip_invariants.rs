//! Property-based invariant tests for the flip controller.
//!
//! 1. A missing edge never gets a click listener or a handle
//! 2. At most one activation per controller, for any signal sequence
//! 3. The activated handle is always the chosen direction's slot handle
//! 4. The activation target never changes once chosen
//! 5. Back faces never target the current page

use std::collections::BTreeMap;

use pageflip_core::testing::RecordingHost;
use pageflip_core::transition::ROTATION_PROPERTY;
use pageflip_core::{
    BootMode, ContainerRole, FlipConfig, FlipController, FlipDirection, FlipHost, FlipSignal,
    GraphPages, PageEdges, PageLocation,
};
use proptest::prelude::*;

// ── Strategies ──────────────────────────────────────────────────────────

fn path(index: u8) -> String {
    format!("/p{index}.html")
}

/// Edges of the current page `/p0.html`: each side absent, another page,
/// or (rarely) the page itself.
fn edge_strategy() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        3 => Just(None),
        6 => (1u8..6).prop_map(|i| Some(path(i))),
        1 => Just(Some(path(0))),
    ]
}

fn signal_strategy() -> impl Strategy<Value = FlipSignal> {
    prop_oneof![
        Just(FlipSignal::Click(FlipDirection::Next)),
        Just(FlipSignal::Click(FlipDirection::Prev)),
        Just(FlipSignal::transition_end(ROTATION_PROPERTY)),
        Just(FlipSignal::transition_end("opacity")),
        Just(FlipSignal::transition_end("z-index")),
    ]
}

fn build(prev: Option<String>, next: Option<String>) -> FlipController<RecordingHost> {
    let mut graph = GraphPages::new().with_page(path(0), PageEdges { prev, next });
    for i in 1..6 {
        graph = graph.with_page(path(i), PageEdges::default());
    }
    FlipController::new(
        RecordingHost::with_default_scaffold(),
        FlipConfig::default(),
        &graph,
        &PageLocation::new("https://demo.test", path(0), ""),
        BootMode::Initial,
    )
    .expect("controller builds for any edge combination")
}

fn is_real_edge(edge: &Option<String>) -> bool {
    edge.as_deref().is_some_and(|p| p != path(0))
}

// ═══════════════════════════════════════════════════════════════════════
// 1. Missing edges are never armed
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn missing_edge_has_no_listener_or_handle(
        prev in edge_strategy(),
        next in edge_strategy(),
    ) {
        let has_prev = is_real_edge(&prev);
        let has_next = is_real_edge(&next);
        let controller = build(prev, next);
        let host = controller.host();

        prop_assert_eq!(host.has_click_listener(ContainerRole::UpperFront), has_prev);
        prop_assert_eq!(host.has_click_listener(ContainerRole::LowerFront), has_next);
        prop_assert_eq!(host.portals_in(ContainerRole::PrevSlot).len(), usize::from(has_prev));
        prop_assert_eq!(host.portals_in(ContainerRole::UpperBack).len(), usize::from(has_prev));
        prop_assert_eq!(host.portals_in(ContainerRole::NextSlot).len(), usize::from(has_next));
        prop_assert_eq!(host.portals_in(ContainerRole::LowerBack).len(), usize::from(has_next));
        prop_assert_eq!(
            host.created_portals(),
            usize::from(has_prev) + usize::from(has_next)
        );
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 2–4. Single activation of the chosen slot handle
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn at_most_one_activation_of_chosen_slot(
        prev in edge_strategy(),
        next in edge_strategy(),
        signals in prop::collection::vec(signal_strategy(), 0..40),
    ) {
        let mut controller = build(prev, next);
        let mut chosen = None;

        for signal in signals {
            controller.dispatch(signal);
            if let Some(portal) = controller.active_portal().copied() {
                match chosen {
                    None => chosen = Some(portal),
                    Some(first) => {
                        prop_assert_eq!(first, portal);
                    }
                }
            }
        }

        let activations = controller.host().activations();
        prop_assert!(activations.len() <= 1);
        if let Some(activated) = activations.first() {
            let direction = controller
                .active_direction()
                .expect("activation implies a chosen direction");
            let edge = controller
                .neighbors()
                .edge(direction)
                .expect("chosen direction is armed");
            prop_assert_eq!(*activated, edge.slot);
            prop_assert_ne!(*activated, edge.back);
            prop_assert_eq!(Some(*activated), chosen);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 5. Back faces never show the current page
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn back_faces_never_target_current_page(
        prev in edge_strategy(),
        next in edge_strategy(),
    ) {
        let controller = build(prev, next);
        let host = controller.host();
        let mut targets = BTreeMap::new();
        for role in [ContainerRole::UpperBack, ContainerRole::LowerBack] {
            for portal in host.portals_in(role) {
                targets.insert(portal, host.portal_src(&portal));
            }
        }
        prop_assert!(targets.values().all(|src| *src != path(0)));
    }
}
