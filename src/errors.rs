use schema::{Enemy, Item, Skill, Status};
use thiserror::Error;

use crate::battle::unit::UnitId;

/// Main error type for the CTB battle engine
#[derive(Debug, Error)]
pub enum BattleEngineError {
    /// Error related to catalog lookup or loading
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
    /// Error related to invalid battle state
    #[error("Battle state error: {0}")]
    BattleState(#[from] BattleStateError),
    /// Error related to an invalid move selection
    #[error("Selection error: {0}")]
    Selection(#[from] SelectionError),
    /// Error related to loading configuration
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors related to catalog operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogError {
    #[error("Skill not found: {0}")]
    SkillNotFound(Skill),
    #[error("Item not found: {0}")]
    ItemNotFound(Item),
    #[error("Status not found: {0}")]
    StatusNotFound(Status),
    #[error("Enemy not found: {0}")]
    EnemyNotFound(Enemy),
    /// An embedded table failed to parse or validate
    #[error("Malformed {table} catalog: {details}")]
    MalformedData { table: &'static str, details: String },
}

/// Errors related to battle state validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BattleStateError {
    #[error("Unknown unit: {0}")]
    UnknownUnit(UnitId),
    #[error("The battle has already ended")]
    BattleOver,
    #[error("A battle needs at least one unit on each side")]
    EmptySide,
    #[error("Inconsistent battle state: {0}")]
    InconsistentState(String),
}

/// Errors for a selection returned by a human input source. AI selections
/// never surface these; they fall back to a default skill instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("{unit} does not know {skill}")]
    SkillNotKnown { unit: UnitId, skill: Skill },
    #[error("{unit} cannot use {skill} right now")]
    SkillUnusable { unit: UnitId, skill: Skill },
    #[error("{unit} has no {item} left")]
    ItemUnavailable { unit: UnitId, item: Item },
    #[error("{target} is not a legal target")]
    IllegalTarget { target: UnitId },
    #[error("no targets were chosen")]
    NoTargets,
    #[error("nothing was selected for the {stance} stance")]
    NothingSelected { stance: crate::battle::stance::Stance },
    #[error("{item} cannot be used in the {stance} stance")]
    ItemsNotAllowed {
        item: Item,
        stance: crate::battle::stance::Stance,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

/// Type alias for Results using BattleEngineError
pub type BattleResult<T> = Result<T, BattleEngineError>;

/// Type alias for Results using CatalogError
pub type CatalogResult<T> = Result<T, CatalogError>;
