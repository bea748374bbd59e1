use crate::{BaseStats, Enemy, Item, Skill, WeaponType};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponData {
    pub name: String,
    pub weapon_type: WeaponType,
    pub level: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStock {
    pub item: Item,
    pub uses: u32,
}

/// Binds an enemy class to its controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AiKind {
    Robert,
    Lumisquirrel,
    Scoring,
}

/// What a unit gains by devouring this enemy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MunchData {
    pub skill: Skill,
    pub experience: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyData {
    pub id: Enemy,
    pub name: String,
    pub level: u32,
    /// HP multiplier tier; bosses sit higher than field enemies.
    pub tier: u32,
    pub base_stats: BaseStats,
    #[serde(default)]
    pub weapon: Option<WeaponData>,
    pub skills: Vec<Skill>,
    #[serde(default)]
    pub items: Vec<ItemStock>,
    pub ai: AiKind,
    pub default_skill: Skill,
    #[serde(default)]
    pub munch: Option<MunchData>,
}

/// Persistent party data handed to the battle at encounter start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartyMemberData {
    pub key: String,
    pub name: String,
    pub level: u32,
    pub base_stats: BaseStats,
    #[serde(default)]
    pub weapon: Option<WeaponData>,
    pub skills: Vec<Skill>,
    #[serde(default)]
    pub items: Vec<ItemStock>,
}
