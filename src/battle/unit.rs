//! Per-combatant runtime state.
//!
//! A unit owns its HP, MP, statuses, countdown and pending actions. Other code
//! changes them only through the mutators here, and every HP change passes
//! through the unit's statuses first.

use schema::{
    BaseStats, Enemy, EnemyData, HpTag, Item, ItemStock, PartyMemberData, Skill, SkillCategory,
    Status, StatusBehavior, StatusTag, WeaponData,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::battle::action_stack::{ActionQueue, QueuedAction};
use crate::battle::stance::Stance;
use crate::battle::stats;
use crate::battle::status::{dispatch, DamagedEvent, HealedEvent, StatusEffect, TurnReadyEvent};
use crate::catalog::{skill_data, status_data};
use crate::config::BattleConfig;
use crate::errors::SelectionError;

/// A unit's position in the battle's enumeration order. Lower ids win ties.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct UnitId(pub usize);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit #{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Party,
    Enemy,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::Party => Side::Enemy,
            Side::Enemy => Side::Party,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MpPool {
    capacity: u32,
    available: u32,
}

impl MpPool {
    pub fn new(capacity: u32) -> Self {
        Self {
            capacity,
            available: capacity,
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn available(&self) -> u32 {
        self.available
    }

    /// Spends `amount` if it is all there.
    pub fn use_mp(&mut self, amount: u32) -> bool {
        if amount > self.available {
            return false;
        }
        self.available -= amount;
        true
    }

    /// Restores up to `amount`, returning what was actually restored.
    pub fn restore(&mut self, amount: u32) -> u32 {
        let restored = amount.min(self.capacity - self.available);
        self.available += restored;
        restored
    }

    #[cfg(test)]
    pub fn set_available(&mut self, amount: u32) {
        self.available = amount.min(self.capacity);
    }
}

/// What an HP mutator actually did, after statuses and redirection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HpChange {
    Damaged {
        amount: u32,
        fatal: bool,
        /// Pending actions dropped because the unit went down.
        dropped_actions: usize,
    },
    Healed {
        amount: u32,
    },
    Cancelled {
        status: Status,
    },
    NoEffect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusChange {
    Added { overruled: Vec<Status> },
    /// Already active; its duration starts over.
    Refreshed,
    Blocked { by: Status },
    /// The unit is down.
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillSlot {
    pub skill: Skill,
    pub experience: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSlot {
    pub item: Item,
    pub uses_left: u32,
}

/// Everything needed to build a unit. Stats are already level-scaled.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitTemplate {
    pub key: String,
    pub name: String,
    pub side: Side,
    pub enemy: Option<Enemy>,
    pub level: u32,
    pub tier: u32,
    pub stats: BaseStats,
    pub weapon: Option<WeaponData>,
    pub skills: Vec<Skill>,
    pub items: Vec<ItemStock>,
}

impl UnitTemplate {
    pub fn from_party_member(data: &PartyMemberData) -> Self {
        Self {
            key: data.key.clone(),
            name: data.name.clone(),
            side: Side::Party,
            enemy: None,
            level: data.level,
            tier: 1,
            stats: stats::scaled_stats(&data.base_stats, data.level),
            weapon: data.weapon.clone(),
            skills: data.skills.clone(),
            items: data.items.clone(),
        }
    }

    pub fn from_enemy(data: &EnemyData) -> Self {
        Self {
            key: data.id.to_string(),
            name: data.name.clone(),
            side: Side::Enemy,
            enemy: Some(data.id),
            level: data.level,
            tier: data.tier,
            stats: stats::scaled_stats(&data.base_stats, data.level),
            weapon: data.weapon.clone(),
            skills: data.skills.clone(),
            items: data.items.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BattleUnit {
    pub id: UnitId,
    /// Stable key from the party or enemy data, e.g. `scott` or `robert2`.
    pub key: String,
    pub name: String,
    pub side: Side,
    pub enemy: Option<Enemy>,
    pub level: u32,
    pub tier: u32,
    stats: BaseStats,
    pub weapon: Option<WeaponData>,
    hp: u32,
    max_hp: u32,
    pub mp: MpPool,
    statuses: Vec<StatusEffect>,
    counter: u32,
    action_queue: ActionQueue,
    stance: Stance,
    is_defending: bool,
    counter_target: Option<UnitId>,
    /// Set once turn-start effects have run and cleared when the turn ends.
    turn_open: bool,
    skills: Vec<SkillSlot>,
    items: Vec<ItemSlot>,
}

impl BattleUnit {
    pub fn new(id: UnitId, template: UnitTemplate) -> Self {
        let max_hp = stats::hp_capacity(template.stats.vitality, template.tier);
        let mp_capacity = stats::mp_capacity(template.stats.magic, template.tier);
        Self {
            id,
            key: template.key,
            name: template.name,
            side: template.side,
            enemy: template.enemy,
            level: template.level,
            tier: template.tier,
            stats: template.stats,
            weapon: template.weapon,
            hp: max_hp,
            max_hp,
            mp: MpPool::new(mp_capacity),
            statuses: Vec::new(),
            counter: 0,
            action_queue: ActionQueue::new(),
            stance: Stance::Attack,
            is_defending: false,
            counter_target: None,
            turn_open: false,
            skills: template
                .skills
                .into_iter()
                .map(|skill| SkillSlot {
                    skill,
                    experience: 0,
                })
                .collect(),
            items: template
                .items
                .into_iter()
                .map(|stock| ItemSlot {
                    item: stock.item,
                    uses_left: stock.uses,
                })
                .collect(),
        }
    }

    // --- HP ---

    pub fn hp(&self) -> u32 {
        self.hp
    }

    pub fn max_hp(&self) -> u32 {
        self.max_hp
    }

    /// Remaining HP as a whole percentage of max HP.
    pub fn health(&self) -> u32 {
        self.hp * 100 / self.max_hp
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// Applies `amount` damage. Guarding halves it (rounding up) unless
    /// `ignore_defend` is set; statuses then see a cancelable `Damaged` event.
    /// A negative result after the hooks is healed instead.
    pub fn take_damage(&mut self, amount: i32, tags: &[HpTag], ignore_defend: bool) -> HpChange {
        self.take_damage_inner(amount, tags, ignore_defend, true)
    }

    /// Mirror of [`take_damage`](Self::take_damage); a negative result after
    /// the hooks becomes damage that ignores guard.
    pub fn heal(&mut self, amount: i32, tags: &[HpTag]) -> HpChange {
        self.heal_inner(amount, tags, true)
    }

    /// Deals max HP as damage. Guarding still halves it.
    pub fn die(&mut self) -> HpChange {
        let max_hp = self.max_hp as i32;
        self.take_damage(max_hp, &[], false)
    }

    fn take_damage_inner(
        &mut self,
        amount: i32,
        tags: &[HpTag],
        ignore_defend: bool,
        may_redirect: bool,
    ) -> HpChange {
        if !self.is_alive() {
            return HpChange::NoEffect;
        }
        // A negative request is a heal in its own right; only a hook-made
        // flip uses up the redirect.
        if amount < 0 {
            return self.heal_inner(-amount, tags, may_redirect);
        }

        let mut amount = amount;
        if self.is_defending && !ignore_defend {
            amount = (amount + 1) / 2;
        }

        let mut event = DamagedEvent {
            amount,
            tags: tags.to_vec(),
            cancel: false,
        };
        if let Some(status) = dispatch(&self.statuses, &mut event) {
            debug!(unit = %self.name, %status, "damage cancelled");
            return HpChange::Cancelled { status };
        }

        if event.amount < 0 {
            return if may_redirect {
                self.heal_inner(-event.amount, tags, false)
            } else {
                HpChange::NoEffect
            };
        }

        let dealt = (event.amount as u32).min(self.hp);
        self.hp -= dealt;
        debug!(unit = %self.name, dealt, hp = self.hp, "took damage");

        let fatal = self.hp == 0;
        let dropped_actions = if fatal { self.on_defeated() } else { 0 };
        HpChange::Damaged {
            amount: dealt,
            fatal,
            dropped_actions,
        }
    }

    fn heal_inner(&mut self, amount: i32, tags: &[HpTag], may_redirect: bool) -> HpChange {
        if !self.is_alive() {
            return HpChange::NoEffect;
        }
        if amount < 0 {
            return self.take_damage_inner(-amount, tags, true, may_redirect);
        }

        let mut event = HealedEvent {
            amount,
            tags: tags.to_vec(),
            cancel: false,
        };
        if let Some(status) = dispatch(&self.statuses, &mut event) {
            debug!(unit = %self.name, %status, "healing cancelled");
            return HpChange::Cancelled { status };
        }

        if event.amount < 0 {
            return if may_redirect {
                self.take_damage_inner(-event.amount, tags, true, false)
            } else {
                HpChange::NoEffect
            };
        }

        let gained = (event.amount as u32).min(self.max_hp - self.hp);
        self.hp += gained;
        debug!(unit = %self.name, gained, hp = self.hp, "healed");
        HpChange::Healed { amount: gained }
    }

    /// A downed unit keeps nothing pending: queued actions, statuses, guard
    /// and counter target all go.
    fn on_defeated(&mut self) -> usize {
        let dropped = self.action_queue.clear();
        self.statuses.clear();
        self.is_defending = false;
        self.counter_target = None;
        self.stance = Stance::Attack;
        self.turn_open = false;
        debug!(unit = %self.name, dropped, "defeated");
        dropped
    }

    /// Brings a downed unit back with `percent` of max HP (at least 1).
    /// Returns the new HP, or `None` if the unit was not down.
    pub fn revive(&mut self, percent: u32) -> Option<u32> {
        if self.is_alive() {
            return None;
        }
        self.hp = (self.max_hp * percent.min(100) / 100).max(1);
        debug!(unit = %self.name, hp = self.hp, "revived");
        Some(self.hp)
    }

    // --- Statuses ---

    pub fn statuses(&self) -> &[StatusEffect] {
        &self.statuses
    }

    pub fn has_status(&self, status: Status) -> bool {
        self.statuses.iter().any(|effect| effect.status == status)
    }

    pub fn has_status_tag(&self, tag: StatusTag) -> bool {
        self.statuses
            .iter()
            .any(|effect| status_data(effect.status).has_tag(tag))
    }

    pub fn add_status(&mut self, status: Status) -> StatusChange {
        if !self.is_alive() {
            return StatusChange::Ignored;
        }
        if let Some(blocker) = self
            .statuses
            .iter()
            .find(|effect| status_data(effect.status).blocks.contains(&status))
        {
            return StatusChange::Blocked {
                by: blocker.status,
            };
        }
        if let Some(existing) = self.statuses.iter_mut().find(|e| e.status == status) {
            existing.turns_left = status_data(status).duration;
            return StatusChange::Refreshed;
        }

        let data = status_data(status);
        let overruled: Vec<Status> = self
            .statuses
            .iter()
            .map(|effect| effect.status)
            .filter(|active| data.overrules.contains(active))
            .collect();
        self.statuses
            .retain(|effect| !data.overrules.contains(&effect.status));
        self.statuses.push(StatusEffect::new(status));
        debug!(unit = %self.name, %status, "status added");
        StatusChange::Added { overruled }
    }

    /// Removes `status`; true if it was active.
    pub fn lift_status(&mut self, status: Status) -> bool {
        let before = self.statuses.len();
        self.statuses.retain(|effect| effect.status != status);
        before != self.statuses.len()
    }

    /// Removes every status sharing any of `tags`, returning what was removed.
    pub fn lift_status_tags(&mut self, tags: &[StatusTag]) -> Vec<Status> {
        let (lifted, kept): (Vec<StatusEffect>, Vec<StatusEffect>) =
            self.statuses.drain(..).partition(|effect| {
                let data = status_data(effect.status);
                tags.iter().any(|tag| data.has_tag(*tag))
            });
        self.statuses = kept;
        lifted.into_iter().map(|effect| effect.status).collect()
    }

    /// Runs the `TurnReady` hooks. The caller applies the periodic damage and
    /// healing collected in the returned event.
    /// True between a turn's start effects and its end, including while
    /// the unit's input source is being asked again.
    pub fn is_turn_open(&self) -> bool {
        self.turn_open
    }

    pub fn set_turn_open(&mut self, open: bool) {
        self.turn_open = open;
    }

    pub fn begin_turn(&self) -> TurnReadyEvent {
        let mut event = TurnReadyEvent::new(self.max_hp);
        dispatch(&self.statuses, &mut event);
        event
    }

    /// Counts down status durations, returning the statuses that ran out.
    pub fn tick_status_durations(&mut self) -> Vec<Status> {
        let mut expired = Vec::new();
        for effect in &mut self.statuses {
            if let Some(turns) = effect.turns_left.as_mut() {
                *turns = turns.saturating_sub(1);
                if *turns == 0 {
                    expired.push(effect.status);
                }
            }
        }
        self.statuses
            .retain(|effect| effect.turns_left != Some(0));
        expired
    }

    fn status_behaviors(&self) -> impl Iterator<Item = &'static StatusBehavior> + '_ {
        self.statuses
            .iter()
            .flat_map(|effect| status_data(effect.status).behaviors.iter())
    }

    pub fn is_category_sealed(&self, category: SkillCategory) -> bool {
        self.status_behaviors().any(|behavior| {
            matches!(behavior, StatusBehavior::SealCategory { category: sealed } if *sealed == category)
        })
    }

    // --- Stats and timing ---

    pub fn stats(&self) -> &BaseStats {
        &self.stats
    }

    pub fn weapon_level(&self) -> Option<u32> {
        self.weapon.as_ref().map(|weapon| weapon.level)
    }

    /// Speed after status modifiers.
    pub fn effective_speed(&self) -> u32 {
        let speed = self.status_behaviors().fold(self.stats.speed, |speed, behavior| {
            match behavior {
                StatusBehavior::ScaleSpeed { percent } => speed * percent / 100,
                _ => speed,
            }
        });
        speed.max(1)
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// Advances this unit's countdown by one tick. True once it is ready.
    pub fn tick(&mut self) -> bool {
        self.counter = self.counter.saturating_sub(1);
        self.counter == 0
    }

    pub fn time_until_next_turn(&self, rank: u32, ctb_base: u32) -> u32 {
        stats::time_until_next_turn(self.effective_speed(), rank, ctb_base)
    }

    /// Restarts the countdown for an action of `rank`, returning the new value.
    pub fn reset_counter(&mut self, rank: u32, ctb_base: u32) -> u32 {
        self.counter = self.time_until_next_turn(rank, ctb_base);
        self.counter
    }

    /// Ticks until this unit's `turn_index`-th turn from now (0 is the turn
    /// the current countdown leads to). The i-th turn after that uses
    /// `next_ranks[i]`, or the pending queue's ranks when none are given, and
    /// the configured assumed rank past the end of either.
    pub fn time_until_turn(
        &self,
        turn_index: usize,
        next_ranks: Option<&[u32]>,
        config: &BattleConfig,
    ) -> u32 {
        let ranks = match next_ranks {
            Some(ranks) => ranks.to_vec(),
            None => self.action_queue.ranks(config),
        };
        (0..turn_index).fold(self.counter, |time, i| {
            let rank = ranks.get(i).copied().unwrap_or(config.assumed_rank);
            time + self.time_until_next_turn(rank, config.ctb_base)
        })
    }

    // --- Pending actions ---

    pub fn queue_actions(&mut self, actions: ActionQueue) {
        self.action_queue.append(actions);
    }

    pub fn next_queued_action(&mut self) -> Option<QueuedAction> {
        self.action_queue.pop_front()
    }

    pub fn has_queued_actions(&self) -> bool {
        !self.action_queue.is_empty()
    }

    pub fn queued_actions(&self) -> &ActionQueue {
        &self.action_queue
    }

    // --- Stance ---

    pub fn stance(&self) -> Stance {
        self.stance
    }

    pub fn set_stance(&mut self, stance: Stance) {
        self.stance = stance;
    }

    pub fn is_defending(&self) -> bool {
        self.is_defending
    }

    pub fn set_defending(&mut self, defending: bool) {
        self.is_defending = defending;
    }

    pub fn counter_target(&self) -> Option<UnitId> {
        self.counter_target
    }

    pub fn set_counter_target(&mut self, target: Option<UnitId>) {
        self.counter_target = target;
    }

    // --- Skills and items ---

    pub fn skills(&self) -> &[SkillSlot] {
        &self.skills
    }

    pub fn knows_skill(&self, skill: Skill) -> bool {
        self.skills.iter().any(|slot| slot.skill == skill)
    }

    pub fn skill_experience(&self, skill: Skill) -> Option<u32> {
        self.skills
            .iter()
            .find(|slot| slot.skill == skill)
            .map(|slot| slot.experience)
    }

    /// Adds experience to `skill`, learning it first if needed. True when the
    /// skill is new.
    pub fn grow_skill(&mut self, skill: Skill, experience: u32) -> bool {
        if let Some(slot) = self.skills.iter_mut().find(|slot| slot.skill == skill) {
            slot.experience += experience;
            return false;
        }
        self.skills.push(SkillSlot { skill, experience });
        true
    }

    pub fn mp_cost(&self, skill: Skill) -> u32 {
        skill_data(skill).base_mp_cost
    }

    /// Checks every rule that can keep a known skill from being selected.
    pub fn skill_usability(&self, skill: Skill, stance: Stance) -> Result<(), SelectionError> {
        if !self.knows_skill(skill) {
            return Err(SelectionError::SkillNotKnown {
                unit: self.id,
                skill,
            });
        }
        let data = skill_data(skill);
        let weapon_ok = data.weapon_type.map_or(true, |required| {
            self.weapon
                .as_ref()
                .is_some_and(|weapon| weapon.weapon_type == required)
        });
        let stance_ok = match stance {
            Stance::Counter => data.allow_as_counter,
            Stance::Charge => data.chargeable,
            Stance::Attack | Stance::Guard => true,
        };
        let usable = self.is_alive()
            && self.mp.available() >= self.mp_cost(skill)
            && weapon_ok
            && stance_ok
            && !self.is_category_sealed(data.category);
        if usable {
            Ok(())
        } else {
            Err(SelectionError::SkillUnusable {
                unit: self.id,
                skill,
            })
        }
    }

    pub fn is_skill_usable(&self, skill: Skill, stance: Stance) -> bool {
        self.skill_usability(skill, stance).is_ok()
    }

    pub fn items(&self) -> &[ItemSlot] {
        &self.items
    }

    pub fn item_uses(&self, item: Item) -> u32 {
        self.items
            .iter()
            .find(|slot| slot.item == item)
            .map_or(0, |slot| slot.uses_left)
    }

    pub fn is_item_usable(&self, item: Item) -> bool {
        self.is_alive() && self.item_uses(item) > 0
    }

    /// Uses up one of `item`; false if none are left.
    pub fn consume_item(&mut self, item: Item) -> bool {
        match self.items.iter_mut().find(|slot| slot.item == item) {
            Some(slot) if slot.uses_left > 0 => {
                slot.uses_left -= 1;
                true
            }
            _ => false,
        }
    }
}
