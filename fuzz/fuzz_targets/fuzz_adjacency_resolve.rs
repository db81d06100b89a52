#![no_main]

use libfuzzer_sys::fuzz_target;
use pageflip_core::{AdjacencySource, AdjacencySpec, PageLocation};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    // First line: location href. Rest: adjacency JSON.
    let (href, json) = text.split_once('\n').unwrap_or(("https://fuzz.test/", text));
    let Ok(location) = PageLocation::parse(href) else {
        return;
    };
    let _ = location.absolutize(json);
    let Ok(spec) = AdjacencySpec::from_json(json) else {
        return;
    };
    let source = spec.into_source();
    if let Ok(page) = source.resolve(&location) {
        for neighbor in [&page.neighbors.prev, &page.neighbors.next].into_iter().flatten() {
            assert_ne!(neighbor.page, page.current, "self edge survived resolution");
        }
    }
});
