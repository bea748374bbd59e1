//! Pure combat formulas: capacities, damage, healing, accuracy, turn timing and
//! experience. Nothing here touches battle state.

use schema::{AccuracyType, BaseStats, DamageType, Stat};

/// The stat value at which a technique deals exactly its listed power.
pub const REFERENCE_STAT: f64 = 10.0;

/// Level-scales a base stat. Level 50 leaves the base unchanged.
pub fn scaled_stat(base: u32, level: u32) -> u32 {
    ((base * (level + 50) + 50) / 100).max(1)
}

pub fn scaled_stats(base: &BaseStats, level: u32) -> BaseStats {
    base.map(|value| scaled_stat(value, level))
}

pub fn hp_capacity(vitality: u32, tier: u32) -> u32 {
    (vitality * 10 * tier.max(1)).max(1)
}

pub fn mp_capacity(magic: u32, tier: u32) -> u32 {
    magic * 5 * tier.max(1)
}

/// The stat that drives each damage type.
pub fn offense_stat(damage_type: DamageType) -> Stat {
    match damage_type {
        DamageType::Sword | DamageType::Physical => Stat::Attack,
        DamageType::Bow | DamageType::Gun | DamageType::Shuriken => Stat::Focus,
        DamageType::Magic | DamageType::Breath => Stat::Magic,
    }
}

fn accuracy_stat(accuracy_type: AccuracyType) -> Stat {
    match accuracy_type {
        AccuracyType::Sword | AccuracyType::Physical | AccuracyType::Devour => Stat::Attack,
        AccuracyType::Bow | AccuracyType::Gun | AccuracyType::Shuriken => Stat::Focus,
        AccuracyType::Magic | AccuracyType::Breath => Stat::Magic,
    }
}

/// Unrounded damage before variance.
///
/// `weapon_level` only counts for weapon damage types. Defense mitigates as
/// `100 / (100 + defense)`, so a defense of 0 takes the full amount.
pub fn damage(
    damage_type: DamageType,
    attacker: &BaseStats,
    weapon_level: Option<u32>,
    defender: &BaseStats,
    power: f64,
) -> f64 {
    let offense = attacker.get(offense_stat(damage_type)) as f64;
    let weapon_factor = match (damage_type.weapon_type(), weapon_level) {
        (Some(_), Some(level)) => (100 + level) as f64 / 100.0,
        _ => 1.0,
    };
    let mitigation = 100.0 / (100.0 + defender.defense as f64);
    power * offense / REFERENCE_STAT * weapon_factor * mitigation
}

/// Recoil taken by the attacker for damage types that have one.
pub fn recoil(damage_type: DamageType, base_damage: i32) -> Option<i32> {
    match damage_type {
        DamageType::Gun => Some((base_damage / 10).max(1)),
        _ => None,
    }
}

pub fn healing(healer: &BaseStats, power: f64) -> f64 {
    power * healer.magic as f64 / REFERENCE_STAT
}

/// Half-width of the variance band around `base`.
pub fn variance_tolerance(base: i32, variance_percent: u32) -> i32 {
    (base as f64 * variance_percent as f64 / 100.0).round() as i32
}

/// Probability of landing, before the action's own accuracy rate. Equal
/// accuracy and evasion stats give a certain hit.
pub fn hit_chance(accuracy_type: AccuracyType, attacker: &BaseStats, target: &BaseStats) -> f64 {
    let accuracy = attacker.get(accuracy_stat(accuracy_type)) as f64;
    let evasion = target.speed as f64;
    ((accuracy + 50.0) / (evasion + 50.0)).min(1.0)
}

/// Ticks until the next turn after an action of `rank`.
pub fn time_until_next_turn(speed: u32, rank: u32, ctb_base: u32) -> u32 {
    let speed = speed.max(1);
    let ticks = (rank * ctb_base).div_ceil(speed);
    ticks.max(1)
}

/// Experience for devouring an enemy of `target_level`.
pub fn skill_experience(base: u32, user_level: u32, target_level: u32) -> u32 {
    (base * target_level / user_level.max(1)).max(1)
}
