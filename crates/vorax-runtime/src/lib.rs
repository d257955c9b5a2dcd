//! VORAX Runtime - Simulation orchestration and tick loop
//!
//! This crate implements the 6-stage tick:
//! 1. Route transport signals
//! 2. Sweep deaths (capturers, then held objects)
//! 3. Decay re-capture cooldowns
//! 4. Digestion pass per capturer
//! 5. Post-digestion death sweep (toxin damage)
//! 6. Purge fully digested objects

pub mod simulation;

pub use simulation::*;
