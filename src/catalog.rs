//! Process-wide, read-only catalogs of skills, items, statuses, conditions and
//! enemy classes.
//!
//! Every table is embedded at compile time and parsed the first time it is
//! touched. A malformed embedded table is an unrecoverable configuration error,
//! so the lazy loaders panic with the parse error. Call [`validate_catalogs`]
//! at startup to surface the same problem as a `CatalogError` instead.

use schema::{
    Condition, ConditionData, Enemy, EnemyData, Item, ItemData, Skill, SkillData, Status,
    StatusData,
};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::LazyLock;
use strum::IntoEnumIterator;

use crate::errors::{CatalogError, CatalogResult};

const SKILLS_RON: &str = include_str!("../data/skills.ron");
const ITEMS_RON: &str = include_str!("../data/items.ron");
const STATUSES_RON: &str = include_str!("../data/statuses.ron");
const CONDITIONS_RON: &str = include_str!("../data/conditions.ron");
const ENEMIES_RON: &str = include_str!("../data/enemies.ron");

// Global catalog storage - loaded once on first use
static SKILL_DATA: LazyLock<HashMap<Skill, SkillData>> =
    LazyLock::new(|| fail_fast(parse_skills()));
static ITEM_DATA: LazyLock<HashMap<Item, ItemData>> = LazyLock::new(|| fail_fast(parse_items()));
static STATUS_DATA: LazyLock<HashMap<Status, StatusData>> =
    LazyLock::new(|| fail_fast(parse_statuses()));
static CONDITION_DATA: LazyLock<HashMap<Condition, ConditionData>> =
    LazyLock::new(|| fail_fast(parse_conditions()));
static ENEMY_DATA: LazyLock<HashMap<Enemy, EnemyData>> =
    LazyLock::new(|| fail_fast(parse_enemies()));

fn fail_fast<T>(result: CatalogResult<T>) -> T {
    result.unwrap_or_else(|err| panic!("embedded catalog is unusable: {}", err))
}

/// Parses a RON list into a map keyed by `key`, rejecting duplicates and
/// requiring an entry for every variant of `K`.
fn parse_table<K, V>(
    table: &'static str,
    text: &str,
    key: impl Fn(&V) -> K,
) -> CatalogResult<HashMap<K, V>>
where
    K: Eq + Hash + Debug + IntoEnumIterator,
    V: DeserializeOwned,
{
    let entries: Vec<V> = ron::from_str(text).map_err(|err| CatalogError::MalformedData {
        table,
        details: err.to_string(),
    })?;

    let mut map = HashMap::with_capacity(entries.len());
    for entry in entries {
        let id = key(&entry);
        if map.contains_key(&id) {
            return Err(CatalogError::MalformedData {
                table,
                details: format!("duplicate entry for {:?}", id),
            });
        }
        map.insert(id, entry);
    }

    if let Some(missing) = K::iter().find(|id| !map.contains_key(id)) {
        return Err(CatalogError::MalformedData {
            table,
            details: format!("no entry for {:?}", missing),
        });
    }
    Ok(map)
}

fn parse_skills() -> CatalogResult<HashMap<Skill, SkillData>> {
    let skills = parse_table("skill", SKILLS_RON, |data: &SkillData| data.id)?;
    for data in skills.values() {
        if data.actions.is_empty() {
            return Err(CatalogError::MalformedData {
                table: "skill",
                details: format!("{} has no actions", data.id),
            });
        }
        if data.actions.iter().any(|action| action.rank == 0 || action.hits == 0) {
            return Err(CatalogError::MalformedData {
                table: "skill",
                details: format!("{} has an action with zero rank or hits", data.id),
            });
        }
    }
    Ok(skills)
}

fn parse_items() -> CatalogResult<HashMap<Item, ItemData>> {
    let items = parse_table("item", ITEMS_RON, |data: &ItemData| data.id)?;
    if let Some(data) = items.values().find(|data| data.action.rank == 0) {
        return Err(CatalogError::MalformedData {
            table: "item",
            details: format!("{} has a zero-rank action", data.id),
        });
    }
    Ok(items)
}

fn parse_statuses() -> CatalogResult<HashMap<Status, StatusData>> {
    parse_table("status", STATUSES_RON, |data: &StatusData| data.id)
}

fn parse_conditions() -> CatalogResult<HashMap<Condition, ConditionData>> {
    parse_table("condition", CONDITIONS_RON, |data: &ConditionData| data.id)
}

fn parse_enemies() -> CatalogResult<HashMap<Enemy, EnemyData>> {
    let enemies = parse_table("enemy", ENEMIES_RON, |data: &EnemyData| data.id)?;
    for data in enemies.values() {
        if !data.skills.contains(&data.default_skill) {
            return Err(CatalogError::MalformedData {
                table: "enemy",
                details: format!("{} does not know its default skill", data.id),
            });
        }
    }
    Ok(enemies)
}

/// Parses every embedded catalog, reporting the first problem found.
pub fn validate_catalogs() -> CatalogResult<()> {
    parse_skills()?;
    parse_items()?;
    parse_statuses()?;
    parse_conditions()?;
    parse_enemies()?;
    Ok(())
}

// Every table holds an entry for every variant once loaded, so these lookups
// cannot miss.

pub fn skill_data(skill: Skill) -> &'static SkillData {
    &SKILL_DATA[&skill]
}

pub fn item_data(item: Item) -> &'static ItemData {
    &ITEM_DATA[&item]
}

pub fn status_data(status: Status) -> &'static StatusData {
    &STATUS_DATA[&status]
}

pub fn condition_data(condition: Condition) -> &'static ConditionData {
    &CONDITION_DATA[&condition]
}

pub fn enemy_data(enemy: Enemy) -> &'static EnemyData {
    &ENEMY_DATA[&enemy]
}
