//! Error taxonomy for the engulfment core
//!
//! Capture rejections are normal gameplay outcomes returned to the caller,
//! never fatal. Invariant violations are recovered locally with a logged
//! warning; the simulation does not halt on a single corrupted reference.

use thiserror::Error;

use crate::{Enzyme, OrganismId};

/// Why a capture attempt was refused.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureRejection {
    #[error("capturer storage is full")]
    StorageFull,

    #[error("target is too big to engulf")]
    TargetTooBig,

    #[error("target is not a valid capture candidate")]
    InvalidTarget,

    #[error("target is already contained")]
    AlreadyContained,
}

/// Faults raised while digesting a held object.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestionFault {
    #[error("capturer lacks the required enzyme: {0:?}")]
    MissingCapability(Enzyme),

    #[error("object {0} was captured with zero digestible material")]
    ZeroBaselineQuantity(OrganismId),
}

/// Containment bookkeeping corruption, recovered defensively.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ContainmentInvariantViolation {
    #[error("held list references a dead or missing object: {0}")]
    OrphanedObjectInList(OrganismId),

    #[error("capacity ledger would go negative (used {used}, credit {credit})")]
    NegativeCapacity { used: f32, credit: f32 },
}

/// Result type for capture attempts
pub type CaptureResult = Result<(), CaptureRejection>;
