//! VORAX core types and collaborator contracts
//!
//! Identity handles, containment phases, the compound and enzyme model,
//! the error taxonomy, and the event bus shared by every engine crate.

mod compound;
mod enzyme;
mod error;
mod event;
mod id;
mod phase;

pub use compound::{Compound, CompoundBag, CompoundStore};
pub use enzyme::{DigestionTuning, Enzyme, EnzymeLevels, LinearTuning};
pub use error::{
    CaptureRejection, CaptureResult, ContainmentInvariantViolation, DigestionFault,
};
pub use event::{
    EngulfBus, EnvironmentDeposit, Notice, PhysicsIntent, PresentationRequest, StatEvent,
    TransportSignal,
};
pub use id::{OrganismId, SpeciesId};
pub use phase::Phase;
