//! # speakeasy2
//!
//! Community detection by label specificity: staged-update partitions,
//! mode-scheduled refinement, and consensus over many independent runs.
//!
//! The engine lives in [`community`]; [`metrics`] holds the partition
//! comparators used to pick the consensus.

pub mod community;
/// Error types used across `speakeasy2`.
pub mod error;
pub mod metrics;

#[cfg(test)]
mod speakeasy_tests;

pub use error::{Error, Result};
pub use metrics::{ari, nmi, Similarity};

pub use community::{CommunityDetection, Network, Options, SpeakEasy2, SpeakEasyOutput};
