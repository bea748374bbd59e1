// In: src/battle/move_effects/mod.rs

// --- 1. DECLARE HELPER MODULES ---
mod damage_effects;
mod special_effects;
mod status_effects;

// --- 2. IMPORTS ---
use crate::battle::action_stack::Usable;
use crate::battle::commands::BattleCommand;
use crate::battle::rng::BattleRng;
use crate::battle::state::BattleState;
use crate::battle::stats;
use crate::battle::unit::{BattleUnit, UnitId};
use schema::{ActionData, Effect, EffectData, TargetHint};
use self::{damage_effects::*, special_effects::*, status_effects::*};

// --- 3. BATTLE-SPECIFIC DATA STRUCTURES ---
/// Who is acting and on whom, for one action. `targets` holds only the
/// selected units the action actually landed on.
#[derive(Debug, Clone)]
pub struct EffectContext {
    pub actor: UnitId,
    pub targets: Vec<UnitId>,
    pub usable: Option<Usable>,
    /// Stance multiplier on damage and healing power.
    pub power_scale: f64,
}

impl EffectContext {
    pub fn new(actor: UnitId, targets: Vec<UnitId>, usable: Option<Usable>, power_scale: f64) -> Self {
        Self {
            actor,
            targets,
            usable,
            power_scale,
        }
    }

    /// Turns a target hint into concrete units. Revival looks at downed
    /// units, everything else at living ones; an empty result makes the
    /// effect a no-op.
    pub fn resolve_targets(
        &self,
        hint: TargetHint,
        effect: &Effect,
        state: &BattleState,
        rng: &mut BattleRng,
    ) -> Vec<UnitId> {
        let wants_dead = effect.reaches_dead_units();
        let eligible = |id: &UnitId| {
            state
                .unit(*id)
                .is_some_and(|unit| unit.is_alive() != wants_dead)
        };
        match hint {
            TargetHint::User => vec![self.actor].into_iter().filter(eligible).collect(),
            TargetHint::Selected => self.targets.iter().copied().filter(eligible).collect(),
            TargetHint::Random => {
                let pool: Vec<UnitId> = self.targets.iter().copied().filter(eligible).collect();
                rng.sample(&pool, "Random Effect Target")
                    .copied()
                    .into_iter()
                    .collect()
            }
        }
    }

    pub(crate) fn actor_unit<'a>(&self, state: &'a BattleState) -> Option<&'a BattleUnit> {
        state.unit(self.actor)
    }
}

// --- 4. THE PUBLIC EXTENSION TRAIT ---
pub trait BattleEffectExt {
    fn apply(&self, context: &EffectContext, state: &BattleState, rng: &mut BattleRng)
        -> Vec<BattleCommand>;
}

// --- 5. THE LEAN IMPLEMENTATION ---
impl BattleEffectExt for EffectData {
    fn apply(
        &self,
        context: &EffectContext,
        state: &BattleState,
        rng: &mut BattleRng,
    ) -> Vec<BattleCommand> {
        let targets = context.resolve_targets(self.target_hint, &self.effect, state, rng);
        if targets.is_empty() {
            return Vec::new();
        }
        // Only hits aimed at the selected targets can provoke a counter.
        let provokes = self.target_hint == TargetHint::Selected;

        match &self.effect {
            Effect::Damage {
                damage_type,
                power,
                element,
                add_status,
                status_chance,
            } => apply_damage_effect(
                &DamageSpec {
                    damage_type: *damage_type,
                    power: *power,
                    element: *element,
                    add_status: *add_status,
                    status_chance: *status_chance,
                    provokes,
                },
                &targets,
                context,
                state,
                rng,
            ),
            Effect::Heal {
                power,
                element,
                add_status,
                status_chance,
            } => apply_heal_effect(
                *power,
                *element,
                *add_status,
                *status_chance,
                &targets,
                context,
                state,
                rng,
            ),
            Effect::InstaKill { damage_type } => {
                apply_insta_kill_effect(*damage_type, provokes, &targets, context, state)
            }
            Effect::AddStatus { status } => apply_add_status_effect(*status, &targets),
            Effect::LiftStatus { statuses } => apply_lift_status_effect(statuses, &targets),
            Effect::LiftStatusTags { tags } => apply_lift_status_tags_effect(tags, &targets),
            Effect::AddCondition { condition } => apply_add_condition_effect(*condition),
            Effect::Devour { success_rate } => {
                apply_devour_effect(*success_rate, &targets, context, state, rng)
            }
            Effect::Revive { heal_to_full } => {
                apply_revive_effect(*heal_to_full, &targets, state)
            }
            Effect::RecoverHp { strength } => apply_recover_hp_effect(*strength, &targets, state),
            Effect::RecoverMp => apply_recover_mp_effect(&targets),
            Effect::FullRecover => apply_full_recover_effect(&targets, state),
        }
    }
}

/// Rolls accuracy for `action` against each target, splitting them into
/// those it lands on and those it misses. Sure-hit actions and actions
/// without an accuracy type never miss.
pub fn roll_accuracy(
    action: &ActionData,
    actor: &BattleUnit,
    targets: &[UnitId],
    state: &BattleState,
    rng: &mut BattleRng,
) -> (Vec<UnitId>, Vec<UnitId>) {
    let accuracy_type = match action.accuracy_type {
        Some(accuracy_type) if !action.sure_hit => accuracy_type,
        _ => return (targets.to_vec(), Vec::new()),
    };
    targets.iter().copied().partition(|id| match state.unit(*id) {
        // Missing or downed units are left for the hint filter to drop.
        Some(target) if target.is_alive() => {
            let chance = stats::hit_chance(accuracy_type, actor.stats(), target.stats())
                * action.accuracy_rate;
            rng.chance(chance, "Accuracy Check")
        }
        _ => true,
    })
}

/// Rolls `base` plus or minus the configured variance, never below 1.
pub(crate) fn vary(base: i32, state: &BattleState, rng: &mut BattleRng, reason: &str) -> i32 {
    let tolerance = stats::variance_tolerance(base, state.config.variance_percent);
    rng.range_inclusive(base - tolerance, base + tolerance, reason)
        .max(1)
}
