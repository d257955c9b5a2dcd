//! Digestive capabilities and tuning curves
//!
//! The mapping from capability level to digestion speed and efficiency is
//! a game-balance function, not a structural contract, so it is injected
//! as a [`DigestionTuning`] implementation rather than hard-coded.

use std::collections::HashMap;

/// Digestive capability kinds. `Lipase` is the default capability that
/// suffices for targets declaring no requisite enzyme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Enzyme {
    Lipase,
    Cellulase,
    Chitinase,
}

impl Enzyme {
    pub const DEFAULT: Enzyme = Enzyme::Lipase;
}

/// Capability level per enzyme kind.
///
/// Level 0 means the capability is absent. The default set carries
/// level-1 lipase, the baseline every capturer has.
#[derive(Debug, Clone)]
pub struct EnzymeLevels {
    levels: HashMap<Enzyme, u32>,
}

impl Default for EnzymeLevels {
    fn default() -> Self {
        let mut levels = HashMap::new();
        levels.insert(Enzyme::DEFAULT, 1);
        EnzymeLevels { levels }
    }
}

impl EnzymeLevels {
    /// An empty capability set (not even the baseline lipase)
    pub fn none() -> Self {
        EnzymeLevels {
            levels: HashMap::new(),
        }
    }

    pub fn with_level(mut self, enzyme: Enzyme, level: u32) -> Self {
        self.set(enzyme, level);
        self
    }

    pub fn set(&mut self, enzyme: Enzyme, level: u32) {
        if level == 0 {
            self.levels.remove(&enzyme);
        } else {
            self.levels.insert(enzyme, level);
        }
    }

    #[inline]
    pub fn level(&self, enzyme: Enzyme) -> u32 {
        self.levels.get(&enzyme).copied().unwrap_or(0)
    }

    /// Whether this set can digest a target requiring `requisite`.
    /// `None` means the default capability suffices.
    #[inline]
    pub fn can_digest(&self, requisite: Option<Enzyme>) -> bool {
        self.level(requisite.unwrap_or(Enzyme::DEFAULT)) > 0
    }
}

/// Pluggable level → speed / level → efficiency curves.
///
/// Speed is in compound units per second of simulated time. Efficiency is
/// a yield multiplier; the digestion processor clamps it into the
/// configured `[min_yield, max_yield]` band regardless of what the curve
/// returns.
pub trait DigestionTuning: Send + Sync {
    fn speed(&self, level: u32) -> f32;
    fn efficiency(&self, level: u32) -> f32;
}

/// Default shipped curve: linear in capability level.
#[derive(Clone, Debug)]
pub struct LinearTuning {
    pub base_speed: f32,
    pub speed_per_level: f32,
    pub base_efficiency: f32,
    pub efficiency_per_level: f32,
}

impl Default for LinearTuning {
    fn default() -> Self {
        LinearTuning {
            base_speed: 1.0,
            speed_per_level: 0.5,
            base_efficiency: 0.6,
            efficiency_per_level: 0.1,
        }
    }
}

impl DigestionTuning for LinearTuning {
    fn speed(&self, level: u32) -> f32 {
        if level == 0 {
            return 0.0;
        }
        self.base_speed + self.speed_per_level * (level - 1) as f32
    }

    fn efficiency(&self, level: u32) -> f32 {
        if level == 0 {
            return 0.0;
        }
        self.base_efficiency + self.efficiency_per_level * (level - 1) as f32
    }
}
