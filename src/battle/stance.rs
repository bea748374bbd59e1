use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::BattleConfig;

/// A unit's posture for the move it is about to make.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Stance {
    #[default]
    Attack,
    /// Spends a rank-1 action charging up, then hits harder.
    Charge,
    /// Halves incoming damage until the unit's next action.
    Guard,
    /// Strikes back at whoever hit the unit while it was guarding.
    Counter,
}

impl Stance {
    /// Ranks of the extra actions this stance puts in front of a technique.
    pub fn prefix_ranks(self) -> &'static [u32] {
        match self {
            Stance::Charge => &[1],
            _ => &[],
        }
    }

    /// Power multiplier applied to the technique's damage and healing.
    pub fn power_bonus(self, config: &BattleConfig) -> f64 {
        match self {
            Stance::Charge => config.charge_bonus,
            Stance::Counter => config.counter_bonus,
            Stance::Attack | Stance::Guard => 1.0,
        }
    }

    /// The item drawer is only offered in Attack stance.
    pub fn allows_items(self) -> bool {
        self == Stance::Attack
    }

    pub fn is_guard(self) -> bool {
        self == Stance::Guard
    }
}

impl fmt::Display for Stance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
