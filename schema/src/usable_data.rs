use crate::{
    AccuracyType, Condition, DamageType, Element, Item, Skill, SkillCategory, Status, StatusTag,
    TargetHint, TargetType, WeaponType,
};
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

fn default_accuracy_rate() -> f64 {
    1.0
}

fn default_hits() -> u32 {
    1
}

/// One catalog technique: target rules, cost and the ranked actions it runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillData {
    pub id: Skill,
    pub name: String,
    pub category: SkillCategory,
    #[serde(default)]
    pub weapon_type: Option<WeaponType>,
    pub target_type: TargetType,
    #[serde(default)]
    pub base_mp_cost: u32,
    #[serde(default = "default_true")]
    pub allow_as_counter: bool,
    #[serde(default = "default_true")]
    pub chargeable: bool,
    #[serde(default)]
    pub allow_dead_target: bool,
    pub actions: Vec<ActionData>,
}

impl SkillData {
    /// Ranks of every action, in execution order.
    pub fn ranks(&self) -> Vec<u32> {
        self.actions.iter().map(|action| action.rank).collect()
    }
}

/// A single ranked step of a technique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionData {
    pub announce: String,
    pub rank: u32,
    #[serde(default)]
    pub accuracy_type: Option<AccuracyType>,
    #[serde(default = "default_accuracy_rate")]
    pub accuracy_rate: f64,
    /// Never misses, regardless of accuracy type.
    #[serde(default)]
    pub sure_hit: bool,
    #[serde(default = "default_hits")]
    pub hits: u32,
    #[serde(default)]
    pub is_melee: bool,
    #[serde(default)]
    pub preserve_guard: bool,
    #[serde(default)]
    pub animation: Option<String>,
    pub effects: Vec<EffectData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectData {
    #[serde(default)]
    pub target_hint: TargetHint,
    pub effect: Effect,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Effect {
    Damage {
        damage_type: DamageType,
        power: f64,
        #[serde(default)]
        element: Option<Element>,
        #[serde(default)]
        add_status: Option<Status>,
        /// Percent chance for `add_status`; absent means certain.
        #[serde(default)]
        status_chance: Option<u32>,
    },
    Heal {
        power: f64,
        #[serde(default)]
        element: Option<Element>,
        #[serde(default)]
        add_status: Option<Status>,
        #[serde(default)]
        status_chance: Option<u32>,
    },
    AddStatus {
        status: Status,
    },
    AddCondition {
        condition: Condition,
    },
    LiftStatus {
        statuses: Vec<Status>,
    },
    LiftStatusTags {
        tags: Vec<StatusTag>,
    },
    InstaKill {
        damage_type: DamageType,
    },
    Devour {
        success_rate: f64,
    },
    Revive {
        heal_to_full: bool,
    },
    /// Heals `strength` percent of the target's base HP cap.
    RecoverHp {
        strength: u32,
    },
    RecoverMp,
    FullRecover,
}

impl Effect {
    /// Effects that may land on a knocked-out unit.
    pub fn reaches_dead_units(&self) -> bool {
        matches!(self, Effect::Revive { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemData {
    pub id: Item,
    pub name: String,
    pub target_type: TargetType,
    #[serde(default)]
    pub allow_dead_target: bool,
    /// Stock handed to a unit that lists the item without a count.
    pub uses: u32,
    pub action: ActionData,
}
