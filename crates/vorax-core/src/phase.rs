//! Containment lifecycle phases
//!
//! A held object advances monotonically through these phases. The only
//! regressions permitted are the two forced resets: captor death and the
//! object's own death while held, both of which snap the phase back to
//! `None` without the animated sequence.

use std::fmt;

/// Containment lifecycle stage of a containable object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Phase {
    /// Not held by anyone
    #[default]
    None = 0,
    /// Capture accepted, transport into the capturer in progress
    Ingestion = 1,
    /// Fully inside the capturer, digestion eligible
    Ingested = 2,
    /// Release requested, waiting for the presentation layer to begin
    RequestExocytosis = 3,
    /// Expulsion animation in progress
    Exocytosis = 4,
    /// Leaving the capturer's boundary
    Ejection = 5,
    /// Nothing digestible remains; awaiting teardown
    Digested = 6,
}

impl Phase {
    /// Monotonic ordering rank. Forward transitions only go to an
    /// equal-or-higher rank; `Digested` is terminal.
    #[inline]
    pub fn rank(self) -> u8 {
        self as u8
    }

    /// Whether the object is currently inside some capturer.
    #[inline]
    pub fn is_held(self) -> bool {
        !matches!(self, Phase::None)
    }

    /// Whether the object's volume still counts against its captor's
    /// capacity. In-flight objects (arriving or leaving) still occupy
    /// volume so the ledger never under-counts; only a free object does
    /// not.
    #[inline]
    pub fn counts_toward_capacity(self) -> bool {
        !matches!(self, Phase::None)
    }

    /// Whether digestion runs on this phase.
    #[inline]
    pub fn digestion_eligible(self) -> bool {
        matches!(self, Phase::Ingested)
    }

    /// Whether a release request is a no-op for this phase.
    #[inline]
    pub fn release_in_progress(self) -> bool {
        matches!(self, Phase::Exocytosis | Phase::Ejection | Phase::None)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::None => "none",
            Phase::Ingestion => "ingestion",
            Phase::Ingested => "ingested",
            Phase::RequestExocytosis => "request-exocytosis",
            Phase::Exocytosis => "exocytosis",
            Phase::Ejection => "ejection",
            Phase::Digested => "digested",
        };
        f.write_str(name)
    }
}
