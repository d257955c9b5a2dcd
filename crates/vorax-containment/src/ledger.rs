//! Capacity ledger
//!
//! Tracks how much containment volume a capturer has committed. The value
//! is maintained incrementally by capture/release and recomputed from
//! scratch by the digestion settle pass every tick, so drift never
//! accumulates past one tick.

use vorax_core::ContainmentInvariantViolation;

/// Tolerance for float drift between the incremental ledger and a
/// from-scratch recomputation.
pub const CAPACITY_EPSILON: f32 = 1e-4;

#[derive(Debug, Clone)]
pub struct CapacityLedger {
    capacity: f32,
    used: f32,
}

impl CapacityLedger {
    pub fn new(capacity: f32) -> Self {
        CapacityLedger {
            capacity: capacity.max(0.0),
            used: 0.0,
        }
    }

    #[inline]
    pub fn capacity(&self) -> f32 {
        self.capacity
    }

    #[inline]
    pub fn used(&self) -> f32 {
        self.used
    }

    #[inline]
    pub fn free(&self) -> f32 {
        (self.capacity - self.used).max(0.0)
    }

    /// Whether an object of `size` fits right now.
    #[inline]
    pub fn can_admit(&self, size: f32) -> bool {
        self.used + size <= self.capacity + CAPACITY_EPSILON
    }

    /// Commit `size` volume. Returns false (and commits nothing) when the
    /// admission would overflow capacity.
    pub fn admit(&mut self, size: f32) -> bool {
        if !self.can_admit(size) {
            return false;
        }
        self.used += size.max(0.0);
        true
    }

    /// Credit back `size` volume, clamping at zero. A credit that would
    /// drive the ledger negative is bookkeeping corruption; it is clamped
    /// and reported rather than halting the simulation.
    pub fn release(&mut self, size: f32) -> Result<(), ContainmentInvariantViolation> {
        let credit = size.max(0.0);
        if self.used - credit < -CAPACITY_EPSILON {
            let violation = ContainmentInvariantViolation::NegativeCapacity {
                used: self.used,
                credit,
            };
            tracing::warn!(used = self.used, credit, "capacity ledger clamped at zero");
            self.used = 0.0;
            return Err(violation);
        }
        self.used = (self.used - credit).max(0.0);
        Ok(())
    }

    /// Replace the incremental value with a from-scratch recomputation
    /// (the sum of all held objects' adjusted sizes).
    pub fn settle(&mut self, recomputed: f32) {
        self.used = recomputed.max(0.0);
    }

    /// Shrink or grow maximum capacity. Already-admitted volume is never
    /// evicted; an over-limit condition only surfaces at the next
    /// admission check.
    pub fn set_capacity(&mut self, capacity: f32) {
        self.capacity = capacity.max(0.0);
    }

    /// Drift between the incremental value and a from-scratch sum.
    pub fn drift(&self, recomputed: f32) -> f32 {
        (self.used - recomputed).abs()
    }
}
