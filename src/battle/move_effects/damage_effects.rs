// In: src/battle/move_effects/damage_effects.rs

use super::{vary, EffectContext};
use crate::battle::commands::BattleCommand;
use crate::battle::rng::BattleRng;
use crate::battle::state::BattleState;
use crate::battle::stats;
use crate::battle::unit::UnitId;
use schema::{DamageType, Element, HpTag, Status};

/// Parameters of a damage effect after target resolution.
pub(super) struct DamageSpec {
    pub damage_type: DamageType,
    pub power: f64,
    pub element: Option<Element>,
    pub add_status: Option<Status>,
    pub status_chance: Option<u32>,
    pub provokes: bool,
}

/// Per target: varied damage, then recoil for the attacker, then the status
/// roll.
pub(super) fn apply_damage_effect(
    spec: &DamageSpec,
    targets: &[UnitId],
    context: &EffectContext,
    state: &BattleState,
    rng: &mut BattleRng,
) -> Vec<BattleCommand> {
    let mut commands = Vec::new();
    let Some(actor) = context.actor_unit(state) else {
        return commands;
    };

    let mut tags = vec![HpTag::Damage(spec.damage_type)];
    if let Some(element) = spec.element {
        tags.push(HpTag::Element(element));
    }

    for &target_id in targets {
        let Some(target) = state.unit(target_id) else {
            continue;
        };
        let raw = stats::damage(
            spec.damage_type,
            actor.stats(),
            actor.weapon_level(),
            target.stats(),
            spec.power * context.power_scale,
        );
        let base = (raw.round() as i32).max(1);
        commands.push(BattleCommand::DealDamage {
            target: target_id,
            amount: vary(base, state, rng, "Damage Variance"),
            tags: tags.clone(),
            ignore_defend: false,
            source: spec.provokes.then_some(context.actor),
        });

        if let Some(recoil) = stats::recoil(spec.damage_type, base) {
            commands.push(BattleCommand::DealDamage {
                target: context.actor,
                amount: vary(recoil, state, rng, "Recoil Variance"),
                tags: vec![HpTag::Recoil],
                ignore_defend: true,
                source: None,
            });
        }

        commands.extend(roll_added_status(
            spec.add_status,
            spec.status_chance,
            target_id,
            rng,
        ));
    }
    commands
}

#[allow(clippy::too_many_arguments)]
pub(super) fn apply_heal_effect(
    power: f64,
    element: Option<Element>,
    add_status: Option<Status>,
    status_chance: Option<u32>,
    targets: &[UnitId],
    context: &EffectContext,
    state: &BattleState,
    rng: &mut BattleRng,
) -> Vec<BattleCommand> {
    let mut commands = Vec::new();
    let Some(actor) = context.actor_unit(state) else {
        return commands;
    };
    let tags = vec![HpTag::Element(element.unwrap_or(Element::Cure))];

    for &target_id in targets {
        let raw = stats::healing(actor.stats(), power * context.power_scale);
        let base = (raw.round() as i32).max(1);
        commands.push(BattleCommand::Heal {
            target: target_id,
            amount: vary(base, state, rng, "Healing Variance"),
            tags: tags.clone(),
        });
        commands.extend(roll_added_status(add_status, status_chance, target_id, rng));
    }
    commands
}

/// Damage equal to the target's HP, tagged as a deathblow. It still goes
/// through guard and status hooks like any other hit.
pub(super) fn apply_insta_kill_effect(
    damage_type: DamageType,
    provokes: bool,
    targets: &[UnitId],
    context: &EffectContext,
    state: &BattleState,
) -> Vec<BattleCommand> {
    targets
        .iter()
        .filter_map(|&target_id| {
            state.unit(target_id).map(|target| BattleCommand::DealDamage {
                target: target_id,
                amount: target.hp().max(1) as i32,
                tags: vec![HpTag::Damage(damage_type), HpTag::Deathblow],
                ignore_defend: false,
                source: provokes.then_some(context.actor),
            })
        })
        .collect()
}

fn roll_added_status(
    status: Option<Status>,
    chance: Option<u32>,
    target: UnitId,
    rng: &mut BattleRng,
) -> Option<BattleCommand> {
    let status = status?;
    let probability = chance.unwrap_or(100) as f64 / 100.0;
    rng.chance(probability, "Added Status Chance")
        .then_some(BattleCommand::AddStatus { target, status })
}
