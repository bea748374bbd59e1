// In: src/battle/move_effects/special_effects.rs

use super::EffectContext;
use crate::battle::commands::BattleCommand;
use crate::battle::rng::BattleRng;
use crate::battle::state::{BattleEvent, BattleState};
use crate::battle::stats;
use crate::battle::unit::{Side, UnitId};
use crate::catalog::enemy_data;
use schema::{Element, HpTag, Status};

/// Eats each enemy target: teaches the actor the target's munch skill, kills
/// the target and fully heals the actor. Party members cannot be eaten.
pub(super) fn apply_devour_effect(
    success_rate: f64,
    targets: &[UnitId],
    context: &EffectContext,
    state: &BattleState,
    rng: &mut BattleRng,
) -> Vec<BattleCommand> {
    let mut commands = Vec::new();
    let Some(actor) = context.actor_unit(state) else {
        return commands;
    };

    let mut ate_something = false;
    for &target_id in targets {
        let Some(target) = state.unit(target_id) else {
            continue;
        };
        if target.side == Side::Party {
            continue;
        }
        if !rng.chance(success_rate, "Devour Success") {
            commands.push(BattleCommand::EmitEvent(BattleEvent::DevourFailed {
                actor: context.actor,
                target: target_id,
            }));
            continue;
        }

        let munch = target.enemy.and_then(|enemy| enemy_data(enemy).munch.as_ref());
        if let Some(munch) = munch {
            commands.push(BattleCommand::GrowSkill {
                unit: context.actor,
                skill: munch.skill,
                experience: stats::skill_experience(munch.experience, actor.level, target.level),
            });
        }
        commands.push(BattleCommand::EmitEvent(BattleEvent::Devoured {
            actor: context.actor,
            target: target_id,
        }));
        commands.push(BattleCommand::Kill { target: target_id });
        ate_something = true;
    }

    if ate_something {
        commands.push(BattleCommand::FullyHeal {
            target: context.actor,
            tags: Vec::new(),
        });
    }
    commands
}

pub(super) fn apply_revive_effect(
    heal_to_full: bool,
    targets: &[UnitId],
    state: &BattleState,
) -> Vec<BattleCommand> {
    let percent = if heal_to_full {
        100
    } else {
        state.config.revive_percent
    };
    targets
        .iter()
        .map(|&target| BattleCommand::Revive { target, percent })
        .collect()
}

/// Heals `strength` percent of the HP a tier-1 unit with the target's
/// vitality would have.
pub(super) fn apply_recover_hp_effect(
    strength: u32,
    targets: &[UnitId],
    state: &BattleState,
) -> Vec<BattleCommand> {
    targets
        .iter()
        .filter_map(|&target_id| {
            let target = state.unit(target_id)?;
            let cap = stats::hp_capacity(target.stats().vitality, 1);
            Some(BattleCommand::Heal {
                target: target_id,
                amount: (cap * strength / 100) as i32,
                tags: vec![HpTag::Element(Element::Cure)],
            })
        })
        .collect()
}

pub(super) fn apply_recover_mp_effect(targets: &[UnitId]) -> Vec<BattleCommand> {
    targets
        .iter()
        .map(|&target| BattleCommand::RestoreMp {
            target,
            amount: None,
        })
        .collect()
}

/// Zombies are skipped outright rather than hurt by the inverted healing.
pub(super) fn apply_full_recover_effect(
    targets: &[UnitId],
    state: &BattleState,
) -> Vec<BattleCommand> {
    targets
        .iter()
        .copied()
        .filter(|&id| state.unit(id).is_some_and(|unit| !unit.has_status(Status::Zombie)))
        .map(|target| BattleCommand::FullyHeal {
            target,
            tags: vec![HpTag::Element(Element::Cure)],
        })
        .collect()
}
