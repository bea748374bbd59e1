// In: src/lib.rs

//! CTB Battle Engine
//!
//! The battle core of a turn-based RPG built on a conditional turn-based
//! timeline: units count down to their next turn at a rate set by their
//! speed and the rank of what they did last.

// --- MODULE DECLARATIONS ---
pub mod battle;
pub mod catalog;
pub mod config;
pub mod errors;

// --- PUBLIC API RE-EXPORTS ---

// --- From the `schema` crate ---
pub use schema::{
    AiKind, BaseStats, Condition, DamageType, Element, Enemy, EnemyData, Item, ItemStock,
    PartyMemberData, Skill, SkillCategory, Status, TargetType, WeaponData, WeaponType,
};

// --- From this crate's modules (`src/`) ---

// Driving a battle.
pub use battle::menu::{AutoMenu, MoveMenu, MoveSelection, ScriptedMenu};
pub use battle::presentation::{ConsolePresenter, Cue, NullPresenter, Presenter};
pub use battle::runner::{BattleInfo, BattleRunner, Encounter, UnitInfo};

// Battle state and its event log.
pub use battle::stance::Stance;
pub use battle::state::{BattleEvent, BattleOutcome, BattleState, EventBus};
pub use battle::unit::{BattleUnit, Side, UnitId, UnitTemplate};

// Catalog access and configuration.
pub use catalog::{validate_catalogs, enemy_data, item_data, skill_data};
pub use config::BattleConfig;

// Crate-specific error and result types.
pub use errors::{
    BattleEngineError, BattleResult, BattleStateError, CatalogError, CatalogResult, ConfigError,
    SelectionError,
};
