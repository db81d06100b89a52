#![forbid(unsafe_code)]

//! Error type for controller initialization.
//!
//! Only initialization is fallible from a caller's point of view. Failures
//! after the controller is wired (style writes, activation, preview fetch)
//! are logged and swallowed by the controller.

use thiserror::Error;

use crate::host::ContainerRole;

#[derive(Debug, Error)]
pub enum FlipError {
    #[error("required container {role} not found (selector `{selector}`)")]
    MissingContainer {
        role: ContainerRole,
        selector: String,
    },
    #[error("current location `{location}` is not a page in the adjacency source")]
    UnknownPage { location: String },
    #[error("invalid flip configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to parse adjacency JSON: {0}")]
    InvalidAdjacency(#[from] serde_json::Error),
    #[error("invalid location `{0}`")]
    InvalidLocation(String),
    #[error("host operation failed: {0}")]
    Host(String),
}

pub type Result<T> = std::result::Result<T, FlipError>;
