#![forbid(unsafe_code)]

//! Browser binding for `pageflip-core`.
//!
//! [`PageFlip`] is the `wasm-bindgen` entry point: it decides how the
//! document was reached (plain page, first load, portal activation), builds
//! a [`pageflip_core::FlipController`] over the live DOM and forwards click
//! and `transitionend` events into it.
//!
//! Boot planning lives in [`boot`] and is tested natively.

pub mod boot;

#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::{HtmlPortalElement, PageFlip, WebHost, install_console_logging};
