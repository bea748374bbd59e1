//! The human-facing side of move selection.
//!
//! `MoveMenuModel` and `TargetMenuModel` describe what a menu would show for a
//! ready party member; a `MoveMenu` implementation turns that into a
//! `MoveSelection`, which the engine handles the same way as an AI's choice.

use schema::{Item, Skill, SkillCategory, TargetType};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::warn;

use crate::battle::action_stack::Usable;
use crate::battle::ai::scoring;
use crate::battle::scheduler::{predict_turns, TurnForecast};
use crate::battle::stance::Stance;
use crate::battle::state::BattleState;
use crate::battle::targeting::{legal_targets, TargetRules};
use crate::battle::unit::UnitId;
use crate::catalog::{item_data, skill_data};
use crate::errors::BattleResult;

/// Curatives the auto menu reaches for, weakest first.
const CURATIVES: [Item; 3] = [Item::Tonic, Item::PowerTonic, Item::FullTonic];

/// Health percentage under which the auto menu heals instead of attacking.
const AUTO_HEAL_THRESHOLD: u32 = 35;

/// What an input source hands back: `usable` is `None` only for Guard.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MoveSelection {
    pub usable: Option<Usable>,
    pub stance: Stance,
    pub targets: Vec<UnitId>,
}

impl MoveSelection {
    pub fn skill(skill: Skill, stance: Stance, targets: Vec<UnitId>) -> Self {
        Self {
            usable: Some(Usable::Skill(skill)),
            stance,
            targets,
        }
    }

    pub fn item(item: Item, targets: Vec<UnitId>) -> Self {
        Self {
            usable: Some(Usable::Item(item)),
            stance: Stance::Attack,
            targets,
        }
    }

    pub fn guard(unit: UnitId) -> Self {
        Self {
            usable: None,
            stance: Stance::Guard,
            targets: vec![unit],
        }
    }
}

/// Handed to the menu when a party member needs a new move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuRequest {
    pub unit: UnitId,
    /// `Counter` when the unit was struck while guarding; `Attack` otherwise.
    pub stance: Stance,
    pub counter_target: Option<UnitId>,
}

/// The input boundary for party members. `choose` blocks until a selection is
/// made.
pub trait MoveMenu {
    fn choose(&mut self, state: &BattleState, request: &MenuRequest) -> MoveSelection;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DrawerKind {
    Skills(SkillCategory),
    Items,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MenuEntry {
    pub usable: Usable,
    pub name: &'static str,
    pub enabled: bool,
    pub mp_cost: u32,
    pub uses_left: Option<u32>,
    /// Rank of the first action.
    pub rank: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Drawer {
    pub kind: DrawerKind,
    pub entries: Vec<MenuEntry>,
}

impl Drawer {
    pub fn title(&self) -> String {
        match self.kind {
            DrawerKind::Skills(category) => category.to_string(),
            DrawerKind::Items => "Item".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MoveMenuModel {
    pub unit: UnitId,
    pub stance: Stance,
    pub drawers: Vec<Drawer>,
}

impl MoveMenuModel {
    /// One drawer per skill category, in the order the categories first show
    /// up in the unit's skill list, then the item drawer if the stance allows
    /// items.
    pub fn build(state: &BattleState, unit: UnitId, stance: Stance) -> BattleResult<Self> {
        let battler = state.try_unit(unit)?;
        let mut drawers: Vec<Drawer> = Vec::new();

        for slot in battler.skills() {
            let data = skill_data(slot.skill);
            let entry = MenuEntry {
                usable: Usable::Skill(slot.skill),
                name: data.name.as_str(),
                enabled: battler.is_skill_usable(slot.skill, stance),
                mp_cost: battler.mp_cost(slot.skill),
                uses_left: None,
                rank: data.actions.first().map_or(0, |action| action.rank),
            };
            let kind = DrawerKind::Skills(data.category);
            match drawers.iter_mut().find(|drawer| drawer.kind == kind) {
                Some(drawer) => drawer.entries.push(entry),
                None => drawers.push(Drawer {
                    kind,
                    entries: vec![entry],
                }),
            }
        }

        if stance.allows_items() {
            let entries = battler
                .items()
                .iter()
                .map(|slot| {
                    let data = item_data(slot.item);
                    MenuEntry {
                        usable: Usable::Item(slot.item),
                        name: data.name.as_str(),
                        enabled: battler.is_item_usable(slot.item),
                        mp_cost: 0,
                        uses_left: Some(slot.uses_left),
                        rank: data.action.rank,
                    }
                })
                .collect();
            drawers.push(Drawer {
                kind: DrawerKind::Items,
                entries,
            });
        }

        Ok(Self {
            unit,
            stance,
            drawers,
        })
    }

    pub fn drawer(&self, kind: DrawerKind) -> Option<&Drawer> {
        self.drawers.iter().find(|drawer| drawer.kind == kind)
    }

    pub fn entry(&self, usable: Usable) -> Option<&MenuEntry> {
        self.drawers
            .iter()
            .flat_map(|drawer| drawer.entries.iter())
            .find(|entry| entry.usable == usable)
    }

    pub fn enabled_entries(&self) -> impl Iterator<Item = &MenuEntry> {
        self.drawers
            .iter()
            .flat_map(|drawer| drawer.entries.iter())
            .filter(|entry| entry.enabled)
    }
}

/// The stance the menu's stance key moves to. Counter is left by picking a
/// move, not by cycling.
pub fn cycle_stance(stance: Stance) -> Stance {
    match stance {
        Stance::Attack => Stance::Charge,
        Stance::Charge => Stance::Guard,
        Stance::Guard => Stance::Attack,
        Stance::Counter => Stance::Counter,
    }
}

/// Forecast shown next to the highlighted entry. Guard previews the
/// stance-change action; an empty drawer previews a default-rank item.
pub fn turn_preview(
    state: &BattleState,
    unit: UnitId,
    stance: Stance,
    highlighted: Option<Usable>,
) -> Vec<TurnForecast> {
    let ranks = match (stance, highlighted) {
        (Stance::Guard, _) => vec![state.config.stance_change_rank],
        (_, Some(usable)) => usable.ranks(stance),
        (_, None) => vec![state.config.default_item_rank],
    };
    predict_turns(state, unit, &ranks)
}

#[derive(Debug, Clone, PartialEq)]
pub struct TargetMenuModel {
    pub usable: Usable,
    pub candidates: Vec<UnitId>,
    /// Group moves select every candidate at once.
    pub is_group: bool,
    /// The cursor cannot move; Counter fixes the target.
    pub locked: bool,
}

impl TargetMenuModel {
    pub fn build(
        state: &BattleState,
        user: UnitId,
        usable: Usable,
        stance: Stance,
        counter_target: Option<UnitId>,
    ) -> Self {
        let rules = TargetRules::of(usable);
        if let (Stance::Counter, Some(target)) = (stance, counter_target) {
            return Self {
                usable,
                candidates: vec![target],
                is_group: false,
                locked: true,
            };
        }
        Self {
            usable,
            candidates: legal_targets(state, user, rules),
            is_group: rules.target_type.is_group(),
            locked: rules.target_type == TargetType::SelfOnly,
        }
    }

    /// Where the cursor starts: the whole group, the user for ally moves, or
    /// the first candidate.
    pub fn default_selection(&self, user: UnitId) -> Vec<UnitId> {
        if self.is_group {
            return self.candidates.clone();
        }
        let prefers_user = match self.usable {
            Usable::Skill(skill) => skill_data(skill).target_type.prefers_allies(),
            Usable::Item(item) => item_data(item).target_type.prefers_allies(),
        };
        if prefers_user && self.candidates.contains(&user) {
            return vec![user];
        }
        self.candidates.first().copied().into_iter().collect()
    }
}

/// Replays a fixed list of selections, then guards.
#[derive(Debug, Clone, Default)]
pub struct ScriptedMenu {
    selections: VecDeque<MoveSelection>,
}

impl ScriptedMenu {
    pub fn new(selections: impl IntoIterator<Item = MoveSelection>) -> Self {
        Self {
            selections: selections.into_iter().collect(),
        }
    }

    pub fn push(&mut self, selection: MoveSelection) {
        self.selections.push_back(selection);
    }

    pub fn remaining(&self) -> usize {
        self.selections.len()
    }
}

impl MoveMenu for ScriptedMenu {
    fn choose(&mut self, _state: &BattleState, request: &MenuRequest) -> MoveSelection {
        self.selections.pop_front().unwrap_or_else(|| {
            warn!(unit = %request.unit, "scripted menu ran out of selections; guarding");
            MoveSelection::guard(request.unit)
        })
    }
}

/// Plays party members without input: counters when it can, patches up the
/// weakest ally when someone is low, and otherwise takes the best-rated
/// attack.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoMenu;

impl AutoMenu {
    fn counter(state: &BattleState, request: &MenuRequest) -> Option<MoveSelection> {
        let target = request
            .counter_target
            .filter(|&id| state.unit(id).is_some_and(|unit| unit.is_alive()))?;
        let model = MoveMenuModel::build(state, request.unit, Stance::Counter).ok()?;
        let best = model
            .enabled_entries()
            .filter_map(|entry| match entry.usable {
                Usable::Skill(skill) => Some(skill),
                Usable::Item(_) => None,
            })
            .max_by_key(|&skill| {
                ordered_float::OrderedFloat(scoring::rate_skill(
                    state,
                    request.unit,
                    skill,
                    target,
                    Stance::Counter,
                ))
            })?;
        Some(MoveSelection::skill(best, Stance::Counter, vec![target]))
    }

    fn patch_up(state: &BattleState, request: &MenuRequest) -> Option<MoveSelection> {
        let wounded = state
            .allies_of(request.unit)
            .into_iter()
            .filter_map(|id| state.unit(id))
            .filter(|ally| ally.health() < AUTO_HEAL_THRESHOLD)
            .min_by_key(|ally| ally.health())?;
        let user = state.unit(request.unit)?;

        let heal_skill = user.skills().iter().map(|slot| slot.skill).find(|&skill| {
            let data = skill_data(skill);
            data.category == SkillCategory::Heal
                && !data.allow_dead_target
                && user.is_skill_usable(skill, Stance::Attack)
        });
        if let Some(skill) = heal_skill {
            let rules = TargetRules::of(Usable::Skill(skill));
            let targets = if rules.target_type.is_group() {
                legal_targets(state, request.unit, rules)
            } else if rules.target_type == TargetType::SelfOnly {
                vec![request.unit]
            } else {
                vec![wounded.id]
            };
            return Some(MoveSelection::skill(skill, Stance::Attack, targets));
        }

        CURATIVES
            .iter()
            .copied()
            .find(|&item| user.is_item_usable(item))
            .map(|item| MoveSelection::item(item, vec![wounded.id]))
    }

    fn attack(state: &BattleState, request: &MenuRequest) -> Option<MoveSelection> {
        let (skill, target) = scoring::best_attack(state, request.unit, Stance::Attack)?;
        let rules = TargetRules::of(Usable::Skill(skill));
        let targets = if rules.target_type.is_group() {
            legal_targets(state, request.unit, rules)
        } else {
            vec![target]
        };
        Some(MoveSelection::skill(skill, Stance::Attack, targets))
    }
}

impl MoveMenu for AutoMenu {
    fn choose(&mut self, state: &BattleState, request: &MenuRequest) -> MoveSelection {
        Self::counter(state, request)
            .or_else(|| Self::patch_up(state, request))
            .or_else(|| Self::attack(state, request))
            .unwrap_or_else(|| MoveSelection::guard(request.unit))
    }
}
