#![forbid(unsafe_code)]

//! Front-face preview loading.
//!
//! The controller issues one [`PreviewRequest`] and never waits for it.
//! When the host's fetch completes it calls [`install_preview`], which
//! attaches one fresh isolated fragment per target so the two faces never
//! share a node. A failed or stalled fetch leaves the faces blank.

use tracing::{debug, warn};

use crate::error::Result;
use crate::host::FlipHost;

/// Fetch-and-install request for the current page's preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewRequest<E> {
    /// Fetchable source of the raw markup.
    pub src: String,
    /// Faces receiving a copy, upper front first.
    pub targets: Vec<E>,
}

impl<E> PreviewRequest<E> {
    #[must_use]
    pub fn new(src: impl Into<String>, targets: Vec<E>) -> Self {
        Self {
            src: src.into(),
            targets,
        }
    }
}

/// Attach `markup` to every target of `request`, one fresh fragment each.
///
/// Stops at the first host failure. Returns the number of fragments attached.
pub fn install_preview<H: FlipHost>(
    host: &mut H,
    request: &PreviewRequest<H::Element>,
    markup: &str,
) -> Result<usize> {
    for (attached, target) in request.targets.iter().enumerate() {
        if let Err(err) = host.attach_isolated(target, markup) {
            warn!(
                target: "pageflip.preview",
                src = %request.src,
                attached,
                error = %err,
                "preview attach failed"
            );
            return Err(err);
        }
    }
    debug!(
        target: "pageflip.preview",
        src = %request.src,
        bytes = markup.len(),
        targets = request.targets.len(),
        "preview installed"
    );
    Ok(request.targets.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FlipConfig;
    use crate::host::ContainerRole;
    use crate::layout::bootstrap;
    use crate::testing::RecordingHost;

    #[test]
    fn each_target_gets_its_own_fragment() {
        let mut host = RecordingHost::with_default_scaffold();
        let layout = bootstrap(&mut host, &FlipConfig::default()).expect("present");
        let request = PreviewRequest::new(
            "/fuji.html",
            vec![layout.upper.front.clone(), layout.lower.front.clone()],
        );
        let attached = install_preview(&mut host, &request, "<h1>Fuji</h1>").expect("attach");
        assert_eq!(attached, 2);

        let upper = host.fragments_in(ContainerRole::UpperFront);
        let lower = host.fragments_in(ContainerRole::LowerFront);
        assert_eq!(upper.len(), 1);
        assert_eq!(lower.len(), 1);
        assert_ne!(upper[0], lower[0]);
        assert_eq!(host.fragment_markup(upper[0]), Some("<h1>Fuji</h1>"));
        assert_eq!(host.fragment_markup(lower[0]), Some("<h1>Fuji</h1>"));
    }

    #[test]
    fn host_failure_stops_installation() {
        let mut host = RecordingHost::with_default_scaffold();
        let layout = bootstrap(&mut host, &FlipConfig::default()).expect("present");
        host.fail_attach_for(ContainerRole::UpperFront);
        let request = PreviewRequest::new(
            "/fuji.html",
            vec![layout.upper.front.clone(), layout.lower.front.clone()],
        );
        assert!(install_preview(&mut host, &request, "<p>x</p>").is_err());
        assert!(host.fragments_in(ContainerRole::LowerFront).is_empty());
    }
}
