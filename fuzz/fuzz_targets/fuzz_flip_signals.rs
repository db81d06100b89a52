#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pageflip_core::testing::RecordingHost;
use pageflip_core::transition::ROTATION_PROPERTY;
use pageflip_core::{
    BootMode, FlipConfig, FlipController, FlipDirection, FlipSignal, GraphPages, PageEdges,
    PageLocation,
};

#[derive(Debug, Arbitrary)]
enum FuzzSignal {
    ClickNext,
    ClickPrev,
    RotationEnd,
    OtherEnd(u8),
}

#[derive(Debug, Arbitrary)]
struct Scenario {
    has_prev: bool,
    has_next: bool,
    signals: Vec<FuzzSignal>,
}

fuzz_target!(|scenario: Scenario| {
    let edges = PageEdges {
        prev: scenario.has_prev.then(|| "/prev.html".to_string()),
        next: scenario.has_next.then(|| "/next.html".to_string()),
    };
    let graph = GraphPages::new().with_page("/here.html", edges);
    let Ok(mut controller) = FlipController::new(
        RecordingHost::with_default_scaffold(),
        FlipConfig::default(),
        &graph,
        &PageLocation::new("https://fuzz.test", "/here.html", ""),
        BootMode::Initial,
    ) else {
        return;
    };

    for signal in scenario.signals.into_iter().take(256) {
        let signal = match signal {
            FuzzSignal::ClickNext => FlipSignal::Click(FlipDirection::Next),
            FuzzSignal::ClickPrev => FlipSignal::Click(FlipDirection::Prev),
            FuzzSignal::RotationEnd => FlipSignal::transition_end(ROTATION_PROPERTY),
            FuzzSignal::OtherEnd(n) => FlipSignal::transition_end(format!("prop-{n}")),
        };
        controller.dispatch(signal);
    }

    // Post-conditions that must always hold:
    let activations = controller.host().activations();
    assert!(activations.len() <= 1, "more than one activation");
    if let Some(direction) = controller.active_direction() {
        assert!(controller.armed().contains(direction), "unarmed direction chosen");
    }
    assert!(controller.logs().count() <= 256);
});
