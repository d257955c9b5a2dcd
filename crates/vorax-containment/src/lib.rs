//! VORAX containment state
//!
//! The capacity ledger, the per-capturer containment registry, the
//! organism model, and the world arena the engines operate on.

mod ledger;
mod organism;
mod registry;
mod world;

pub use ledger::{CapacityLedger, CAPACITY_EPSILON};
pub use organism::{Containable, Organism};
pub use registry::Containment;
pub use world::World;
