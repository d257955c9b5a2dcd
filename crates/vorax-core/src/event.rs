//! Collaborator contracts: notices, intents, and the event bus
//!
//! The core never calls presentation or physics directly. It pushes
//! requests and one-shot events onto the [`EngulfBus`] and reacts to
//! [`TransportSignal`]s the presentation collaborator submits back. All
//! waiting is tick-based; nothing here blocks.

use parking_lot::Mutex;

use crate::{Compound, Enzyme, OrganismId, SpeciesId};

/// User-facing events the notification collaborator may surface or ignore.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Notice {
    StorageFull {
        captor: OrganismId,
    },
    MissingDigestiveCapability {
        captor: OrganismId,
        object: OrganismId,
        enzyme: Enzyme,
    },
    ToxinDigestionDamage {
        captor: OrganismId,
        damage: f32,
    },
}

/// Requests to the physics collaborator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PhysicsIntent {
    /// Disable the body on admission into a capturer
    DisableBody { object: OrganismId },
    /// Re-enable the body on release and apply an outward impulse.
    /// Direction is the outward radial at the expulsion point, resolved by
    /// the positioning collaborator; the core supplies the magnitude.
    EnableBody {
        object: OrganismId,
        impulse_magnitude: f32,
    },
}

/// Transport/placement requests to the presentation collaborator.
///
/// These are fire-and-forget: the core requests, then polls for the
/// matching [`TransportSignal`] once per tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PresentationRequest {
    BeginIngestion {
        captor: OrganismId,
        object: OrganismId,
        /// Desired placement relative to the capturer's center
        placement: [f32; 3],
        /// Shrink/grow scale target while held
        scale_target: f32,
    },
    BeginExpulsion {
        captor: OrganismId,
        object: OrganismId,
    },
}

/// Completion signals from the presentation collaborator, polled once per
/// tick. Each advances exactly one phase transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportSignal {
    /// Ingestion transport finished: `Ingestion -> Ingested`
    IngestionComplete(OrganismId),
    /// Expulsion accepted by presentation: `RequestExocytosis -> Exocytosis`
    ExpulsionBegun(OrganismId),
    /// Expulsion animation finished: `Exocytosis -> Ejection`
    ExpulsionAnimated(OrganismId),
    /// Object fully outside: triggers `complete_release`
    ExpulsionComplete(OrganismId),
}

impl TransportSignal {
    pub fn object(self) -> OrganismId {
        match self {
            TransportSignal::IngestionComplete(id)
            | TransportSignal::ExpulsionBegun(id)
            | TransportSignal::ExpulsionAnimated(id)
            | TransportSignal::ExpulsionComplete(id) => id,
        }
    }
}

/// Digestion surplus expelled back into the environment instead of being
/// silently discarded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvironmentDeposit {
    pub source: OrganismId,
    pub compound: Compound,
    pub amount: f32,
}

/// One-shot statistics events, emitted on completion only, never per-tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatEvent {
    ObjectDigested {
        captor: OrganismId,
        object: OrganismId,
    },
    /// Candidate for the long-lived cross-session engulf tally.
    /// Emitted at most once per digested object.
    SpeciesEngulfTally {
        predator: SpeciesId,
        prey: SpeciesId,
    },
}

/// Mutex-guarded outboxes connecting the engines to their collaborators.
///
/// Engines push from anywhere in the tick; the embedding loop drains after
/// the tick. Each queue is independent so a slow consumer of one concern
/// never delays another.
#[derive(Debug, Default)]
pub struct EngulfBus {
    notices: Mutex<Vec<Notice>>,
    physics: Mutex<Vec<PhysicsIntent>>,
    presentation: Mutex<Vec<PresentationRequest>>,
    deposits: Mutex<Vec<EnvironmentDeposit>>,
    stats: Mutex<Vec<StatEvent>>,
}

impl EngulfBus {
    pub fn new() -> Self {
        EngulfBus::default()
    }

    pub fn push_notice(&self, notice: Notice) {
        self.notices.lock().push(notice);
    }

    pub fn push_physics(&self, intent: PhysicsIntent) {
        self.physics.lock().push(intent);
    }

    pub fn push_presentation(&self, request: PresentationRequest) {
        self.presentation.lock().push(request);
    }

    pub fn push_deposit(&self, deposit: EnvironmentDeposit) {
        self.deposits.lock().push(deposit);
    }

    pub fn push_stat(&self, event: StatEvent) {
        self.stats.lock().push(event);
    }

    pub fn drain_notices(&self) -> Vec<Notice> {
        std::mem::take(&mut self.notices.lock())
    }

    pub fn drain_physics(&self) -> Vec<PhysicsIntent> {
        std::mem::take(&mut self.physics.lock())
    }

    pub fn drain_presentation(&self) -> Vec<PresentationRequest> {
        std::mem::take(&mut self.presentation.lock())
    }

    pub fn drain_deposits(&self) -> Vec<EnvironmentDeposit> {
        std::mem::take(&mut self.deposits.lock())
    }

    pub fn drain_stats(&self) -> Vec<StatEvent> {
        std::mem::take(&mut self.stats.lock())
    }
}
