use crate::{Condition, Element, HpTag, SkillCategory, Status, StatusTag};
use serde::{Deserialize, Serialize};

/// The unit events a status may subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusEventKind {
    Damaged,
    Healed,
    TurnReady,
}

/// A single hook or modifier a status contributes. A status is the ordered
/// list of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StatusBehavior {
    /// Healing becomes damage of the same magnitude.
    InvertHealing,
    /// Incoming damage is scaled by `percent` / 100.
    ScaleDamage { percent: u32 },
    /// Damage carrying `tag` is cancelled.
    CancelDamageTagged { tag: HpTag },
    /// Damage lacking `tag` is cancelled.
    CancelDamageUntagged { tag: HpTag },
    /// All healing is cancelled.
    CancelHealing,
    /// Loses `percent` of max HP when the unit becomes ready.
    DamagePerTurn { percent: u32, element: Element },
    /// Regains `percent` of max HP when the unit becomes ready.
    HealPerTurn { percent: u32 },
    /// Effective speed is scaled by `percent` / 100.
    ScaleSpeed { percent: u32 },
    /// Skills of `category` cannot be selected.
    SealCategory { category: SkillCategory },
}

impl StatusBehavior {
    /// Which event kind this behavior hooks, if any. Query-only behaviors
    /// (speed, seals) return `None`.
    pub fn handles(&self) -> Option<StatusEventKind> {
        match self {
            StatusBehavior::InvertHealing | StatusBehavior::CancelHealing => {
                Some(StatusEventKind::Healed)
            }
            StatusBehavior::ScaleDamage { .. }
            | StatusBehavior::CancelDamageTagged { .. }
            | StatusBehavior::CancelDamageUntagged { .. } => Some(StatusEventKind::Damaged),
            StatusBehavior::DamagePerTurn { .. } | StatusBehavior::HealPerTurn { .. } => {
                Some(StatusEventKind::TurnReady)
            }
            StatusBehavior::ScaleSpeed { .. } | StatusBehavior::SealCategory { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusData {
    pub id: Status,
    pub name: String,
    #[serde(default)]
    pub tags: Vec<StatusTag>,
    /// Turns the status survives, counted when its unit becomes ready.
    #[serde(default)]
    pub duration: Option<u32>,
    /// Statuses removed when this one is added.
    #[serde(default)]
    pub overrules: Vec<Status>,
    /// Statuses that cannot be added while this one is active.
    #[serde(default)]
    pub blocks: Vec<Status>,
    #[serde(default)]
    pub behaviors: Vec<StatusBehavior>,
}

impl StatusData {
    pub fn has_tag(&self, tag: StatusTag) -> bool {
        self.tags.contains(&tag)
    }

    pub fn handles(&self, kind: StatusEventKind) -> bool {
        self.behaviors
            .iter()
            .any(|behavior| behavior.handles() == Some(kind))
    }
}

/// What a battle condition does to each unit as it becomes ready.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConditionTick {
    Damage { percent: u32, element: Element },
    Heal { percent: u32 },
    AddStatus { status: Status, chance: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionData {
    pub id: Condition,
    pub name: String,
    /// Unit turns the condition lasts.
    pub duration: u32,
    #[serde(default)]
    pub overrules: Vec<Condition>,
    #[serde(default)]
    pub tick: Option<ConditionTick>,
}
