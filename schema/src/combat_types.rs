use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{Display, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "camelCase")]
pub enum Element {
    Fire,
    Ice,
    Lightning,
    Earth,
    Cure,
    Omni,
    Fat,
    Zombie,
}

/// Selects the damage formula (and recoil formula, where one exists).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "camelCase")]
pub enum DamageType {
    Sword,
    Bow,
    Gun,
    Shuriken,
    Physical,
    Magic,
    Breath,
}

impl DamageType {
    /// The weapon whose level feeds into this damage type, if any.
    pub fn weapon_type(self) -> Option<WeaponType> {
        match self {
            DamageType::Sword => Some(WeaponType::Sword),
            DamageType::Bow => Some(WeaponType::Bow),
            DamageType::Gun => Some(WeaponType::Gun),
            DamageType::Shuriken => Some(WeaponType::Shuriken),
            DamageType::Physical | DamageType::Magic | DamageType::Breath => None,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "camelCase")]
pub enum AccuracyType {
    Sword,
    Bow,
    Gun,
    Shuriken,
    Physical,
    Magic,
    Breath,
    Devour,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "camelCase")]
pub enum WeaponType {
    Sword,
    Bow,
    Gun,
    Shuriken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkillCategory {
    Attack,
    Magic,
    Heal,
    Strategy,
}

impl fmt::Display for SkillCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Which units a technique may be aimed at when it is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetType {
    /// Any one unit, defaulting to the opposing side.
    Single,
    /// One unit on the user's side.
    Ally,
    AllEnemies,
    AllAllies,
    /// The user only.
    SelfOnly,
}

impl TargetType {
    /// Group techniques select a whole side at once.
    pub fn is_group(self) -> bool {
        matches!(self, TargetType::AllEnemies | TargetType::AllAllies)
    }

    /// True when the default target sits on the user's own side.
    pub fn prefers_allies(self) -> bool {
        matches!(
            self,
            TargetType::Ally | TargetType::AllAllies | TargetType::SelfOnly
        )
    }
}

/// How an effect picks its units out of the already-chosen target list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TargetHint {
    #[default]
    Selected,
    User,
    Random,
}

/// Labels carried by a damage or heal event. Status hooks match on these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HpTag {
    Damage(DamageType),
    Element(Element),
    Deathblow,
    Recoil,
}

impl fmt::Display for HpTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HpTag::Damage(damage_type) => write!(f, "{}", damage_type),
            HpTag::Element(element) => write!(f, "{}", element),
            HpTag::Deathblow => write!(f, "deathblow"),
            HpTag::Recoil => write!(f, "recoil"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stat {
    Vitality,
    Attack,
    Defense,
    Focus,
    Magic,
    Speed,
}

/// Unscaled stat values as written in the catalogs and party data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseStats {
    pub vitality: u32,
    pub attack: u32,
    pub defense: u32,
    pub focus: u32,
    pub magic: u32,
    pub speed: u32,
}

impl BaseStats {
    pub fn get(&self, stat: Stat) -> u32 {
        match stat {
            Stat::Vitality => self.vitality,
            Stat::Attack => self.attack,
            Stat::Defense => self.defense,
            Stat::Focus => self.focus,
            Stat::Magic => self.magic,
            Stat::Speed => self.speed,
        }
    }

    /// Maps every stat through `f`, used for level scaling.
    pub fn map(&self, mut f: impl FnMut(u32) -> u32) -> BaseStats {
        BaseStats {
            vitality: f(self.vitality),
            attack: f(self.attack),
            defense: f(self.defense),
            focus: f(self.focus),
            magic: f(self.magic),
            speed: f(self.speed),
        }
    }
}
