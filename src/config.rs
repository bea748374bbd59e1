//! Tuning values for a battle, loadable from RON.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::errors::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    /// Seed for the battle's random source. `None` draws one from the OS.
    pub seed: Option<u64>,
    /// Weight in the turn formula: ticks = ceil(rank * ctb_base / speed).
    pub ctb_base: u32,
    /// Rank used to set every unit's first countdown.
    pub initial_rank: u32,
    /// Rank assumed for future turns when forecasting.
    pub assumed_rank: u32,
    /// Rank of the action taken when a unit switches to Guard.
    pub stance_change_rank: u32,
    /// Rank shown for the item drawer before an item is highlighted.
    pub default_item_rank: u32,
    /// Power multiplier for techniques used in Charge stance.
    pub charge_bonus: f64,
    /// Power multiplier for techniques used in Counter stance.
    pub counter_bonus: f64,
    /// Percent of the base amount used as the variance band for damage and healing.
    pub variance_percent: u32,
    /// HP percentage restored by a partial revive.
    pub revive_percent: u32,
    /// Number of entries returned by a turn forecast.
    pub forecast_length: usize,
    /// Safety cap on the number of ticks `run` will advance.
    pub max_ticks: u64,
    /// How many times one turn asks the menu before giving up on it.
    pub selection_attempts: u32,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            seed: None,
            ctb_base: 100,
            initial_rank: 2,
            assumed_rank: 2,
            stance_change_rank: 2,
            default_item_rank: 2,
            charge_bonus: 1.5,
            counter_bonus: 1.5,
            variance_percent: 10,
            revive_percent: 50,
            forecast_length: 10,
            max_ticks: 1_000_000,
            selection_attempts: 3,
        }
    }
}

impl BattleConfig {
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(text)?)
    }

    pub fn from_ron_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_ron_str(&text)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
