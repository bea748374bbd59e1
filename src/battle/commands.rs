//! Atomic state changes. Effect code decides what should happen and returns
//! commands; only `execute_command` touches the units, and it logs every
//! outcome to the event bus.

use crate::battle::conditions::ConditionChange;
use crate::battle::state::{BattleEvent, BattleState, EventBus};
use crate::battle::unit::{HpChange, StatusChange, UnitId};
use crate::errors::BattleResult;
use schema::{Condition, HpTag, Skill, Status, StatusTag};
use tracing::debug;

/// Atomic commands representing final state changes
#[derive(Debug, Clone, PartialEq)]
pub enum BattleCommand {
    // HP
    DealDamage {
        target: UnitId,
        amount: i32,
        tags: Vec<HpTag>,
        ignore_defend: bool,
        /// Set for hits that can provoke a counter from a guarding target.
        source: Option<UnitId>,
    },
    Heal {
        target: UnitId,
        amount: i32,
        tags: Vec<HpTag>,
    },
    /// Heals whatever HP the target is missing when the command runs.
    FullyHeal {
        target: UnitId,
        tags: Vec<HpTag>,
    },
    Kill {
        target: UnitId,
    },
    Revive {
        target: UnitId,
        percent: u32,
    },

    // MP
    /// `None` refills the pool.
    RestoreMp {
        target: UnitId,
        amount: Option<u32>,
    },

    // Statuses and conditions
    AddStatus {
        target: UnitId,
        status: Status,
    },
    LiftStatuses {
        target: UnitId,
        statuses: Vec<Status>,
    },
    LiftStatusTags {
        target: UnitId,
        tags: Vec<StatusTag>,
    },
    AddCondition {
        condition: Condition,
    },

    // Progression
    GrowSkill {
        unit: UnitId,
        skill: Skill,
        experience: u32,
    },

    // Battle flow
    EmitEvent(BattleEvent),
}

pub fn execute_command_batch(
    commands: Vec<BattleCommand>,
    state: &mut BattleState,
    bus: &mut EventBus,
) -> BattleResult<()> {
    for command in commands {
        execute_command(command, state, bus)?;
    }
    Ok(())
}

pub fn execute_command(
    command: BattleCommand,
    state: &mut BattleState,
    bus: &mut EventBus,
) -> BattleResult<()> {
    match command {
        BattleCommand::DealDamage {
            target,
            amount,
            tags,
            ignore_defend,
            source,
        } => execute_deal_damage_command(target, amount, &tags, ignore_defend, source, state, bus),
        BattleCommand::Heal {
            target,
            amount,
            tags,
        } => {
            let change = state.try_unit_mut(target)?.heal(amount, &tags);
            emit_hp_change(target, change, state, bus);
            Ok(())
        }
        BattleCommand::FullyHeal { target, tags } => {
            let unit = state.try_unit_mut(target)?;
            let missing = (unit.max_hp() - unit.hp()) as i32;
            let change = unit.heal(missing, &tags);
            emit_hp_change(target, change, state, bus);
            Ok(())
        }
        BattleCommand::Kill { target } => {
            let change = state.try_unit_mut(target)?.die();
            emit_hp_change(target, change, state, bus);
            Ok(())
        }
        BattleCommand::Revive { target, percent } => {
            let ctb_base = state.config.ctb_base;
            let initial_rank = state.config.initial_rank;
            let unit = state.try_unit_mut(target)?;
            if let Some(hp) = unit.revive(percent) {
                // A revived unit rejoins the timeline as if the battle just began.
                unit.reset_counter(initial_rank, ctb_base);
                bus.push(BattleEvent::UnitRevived { unit: target, hp });
            }
            Ok(())
        }
        BattleCommand::RestoreMp { target, amount } => {
            let unit = state.try_unit_mut(target)?;
            if !unit.is_alive() {
                return Ok(());
            }
            let amount = amount.unwrap_or_else(|| unit.mp.capacity());
            let restored = unit.mp.restore(amount);
            debug!(unit = %unit.name, restored, "mp restored");
            if restored > 0 {
                bus.push(BattleEvent::MpRestored {
                    target,
                    amount: restored,
                });
            }
            Ok(())
        }
        BattleCommand::AddStatus { target, status } => {
            match state.try_unit_mut(target)?.add_status(status) {
                StatusChange::Added { overruled } => {
                    for removed in overruled {
                        bus.push(BattleEvent::StatusRemoved {
                            target,
                            status: removed,
                        });
                    }
                    bus.push(BattleEvent::StatusApplied { target, status });
                }
                StatusChange::Refreshed => {
                    bus.push(BattleEvent::StatusRefreshed { target, status });
                }
                StatusChange::Blocked { by } => {
                    bus.push(BattleEvent::StatusBlocked { target, status, by });
                }
                StatusChange::Ignored => {}
            }
            Ok(())
        }
        BattleCommand::LiftStatuses { target, statuses } => {
            let unit = state.try_unit_mut(target)?;
            for status in statuses {
                if unit.lift_status(status) {
                    bus.push(BattleEvent::StatusRemoved { target, status });
                }
            }
            Ok(())
        }
        BattleCommand::LiftStatusTags { target, tags } => {
            let lifted = state.try_unit_mut(target)?.lift_status_tags(&tags);
            for status in lifted {
                bus.push(BattleEvent::StatusRemoved { target, status });
            }
            Ok(())
        }
        BattleCommand::AddCondition { condition } => {
            if let ConditionChange::Added { overruled } = state.conditions.add(condition) {
                for removed in overruled {
                    bus.push(BattleEvent::ConditionRemoved { condition: removed });
                }
            }
            bus.push(BattleEvent::ConditionApplied { condition });
            Ok(())
        }
        BattleCommand::GrowSkill {
            unit,
            skill,
            experience,
        } => {
            let learned = state.try_unit_mut(unit)?.grow_skill(skill, experience);
            bus.push(BattleEvent::SkillGrown {
                unit,
                skill,
                experience,
                learned,
            });
            Ok(())
        }
        BattleCommand::EmitEvent(event) => {
            bus.push(event);
            Ok(())
        }
    }
}

/// Damage also arms a counter: a guarding target hit by an opponent records
/// who to strike back at.
fn execute_deal_damage_command(
    target: UnitId,
    amount: i32,
    tags: &[HpTag],
    ignore_defend: bool,
    source: Option<UnitId>,
    state: &mut BattleState,
    bus: &mut EventBus,
) -> BattleResult<()> {
    let provoker = source.filter(|source| state.are_opponents(*source, target));
    let unit = state.try_unit_mut(target)?;
    let was_guarding = unit.is_defending() && unit.stance().is_guard();
    let change = unit.take_damage(amount, tags, ignore_defend);

    let countered = match (change, was_guarding, provoker) {
        (HpChange::Damaged { fatal: false, .. }, true, Some(provoker)) => {
            unit.set_counter_target(Some(provoker));
            Some(provoker)
        }
        _ => None,
    };
    emit_hp_change(target, change, state, bus);
    if let Some(provoker) = countered {
        bus.push(BattleEvent::CounterReady {
            unit: target,
            target: provoker,
        });
    }
    Ok(())
}

/// Logs what an HP mutator did, including the knock-on effects of a defeat.
fn emit_hp_change(target: UnitId, change: HpChange, state: &BattleState, bus: &mut EventBus) {
    let hp = state.unit(target).map_or(0, |unit| unit.hp());
    match change {
        HpChange::Damaged {
            amount,
            fatal,
            dropped_actions,
        } => {
            bus.push(BattleEvent::DamageDealt {
                target,
                amount,
                remaining_hp: hp,
            });
            if fatal {
                bus.push(BattleEvent::UnitDefeated { unit: target });
                if dropped_actions > 0 {
                    bus.push(BattleEvent::ActionsDropped {
                        unit: target,
                        count: dropped_actions,
                    });
                }
            }
        }
        HpChange::Healed { amount } => {
            bus.push(BattleEvent::Healed {
                target,
                amount,
                new_hp: hp,
            });
        }
        HpChange::Cancelled { status } => {
            bus.push(BattleEvent::HpChangeCancelled { target, status });
        }
        HpChange::NoEffect => {}
    }
}
