//! Engine-side record of which frames the interview has addressed.
//!
//! The oracle remains the judge of coverage; this set only accumulates what
//! its structured replies report, so finalization can optionally be gated on
//! the whole checklist having been seen.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::frame::{FrameId, FRAME_CHECKLIST};

/// How much the engine trusts a completion signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoveragePolicy {
    /// Accept the oracle's completion signal as-is.
    #[default]
    TrustOracle,
    /// Reject completion while reported coverage is incomplete.
    RequireAllFrames,
}

impl CoveragePolicy {
    /// Returns true if a completion signal may be accepted given `coverage`.
    pub fn permits_completion(&self, coverage: &FrameCoverage) -> bool {
        match self {
            CoveragePolicy::TrustOracle => true,
            CoveragePolicy::RequireAllFrames => coverage.is_complete(),
        }
    }
}

/// Set of frames reported as covered so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameCoverage {
    covered: BTreeSet<FrameId>,
}

impl FrameCoverage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds frames; coverage only ever grows.
    pub fn record<I: IntoIterator<Item = FrameId>>(&mut self, frames: I) {
        self.covered.extend(frames);
    }

    pub fn contains(&self, frame: FrameId) -> bool {
        self.covered.contains(&frame)
    }

    pub fn covered(&self) -> Vec<FrameId> {
        self.covered.iter().copied().collect()
    }

    /// Uncovered frames in checklist order.
    pub fn missing(&self) -> Vec<FrameId> {
        FRAME_CHECKLIST
            .iter()
            .map(|f| f.id)
            .filter(|id| !self.covered.contains(id))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.covered.len() == FRAME_CHECKLIST.len()
    }
}
