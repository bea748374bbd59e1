//! A general-purpose enemy: rate every usable attack against every living
//! opponent and take the best, unless it is hurt badly enough to heal first.

use ordered_float::OrderedFloat;
use schema::{Effect, Item, Skill, SkillCategory, TargetHint};

use super::{AiContext, BattleAi};
use crate::battle::stance::Stance;
use crate::battle::state::BattleState;
use crate::battle::stats;
use crate::battle::unit::UnitId;
use crate::catalog::skill_data;

/// Health percentage under which the AI looks after itself.
const HEAL_THRESHOLD: u32 = 30;
const CURATIVES: [Item; 3] = [Item::FullTonic, Item::PowerTonic, Item::Tonic];
/// Extra weight for a move expected to finish its target.
const KNOCKOUT_BONUS: f64 = 50.0;

#[derive(Debug, Clone, Default)]
pub struct ScoringAi;

impl ScoringAi {
    pub fn new() -> Self {
        Self
    }

    /// Queues a self-heal when health is low. True if something was queued.
    fn heal_if_low(cx: &mut AiContext<'_>) -> bool {
        let Some(me) = cx.me() else {
            return false;
        };
        if me.health() >= HEAL_THRESHOLD {
            return false;
        }
        let heal = me.skills().iter().map(|slot| slot.skill).find(|&skill| {
            let data = skill_data(skill);
            data.category == SkillCategory::Heal
                && !data.allow_dead_target
                && me.is_skill_usable(skill, Stance::Attack)
        });
        let me_id = me.id;
        if let Some(skill) = heal {
            cx.queue_skill_with(skill, Stance::Attack, Some(me_id));
            return true;
        }
        if let Some(item) = CURATIVES.iter().copied().find(|&item| me.is_item_usable(item)) {
            cx.queue_item_on(item, Some(me_id));
            return true;
        }
        false
    }
}

/// Expected value of `skill` from `user` against `target`: damage weighted by
/// hit chance, plus utility for statuses the target does not have yet.
pub fn rate_skill(
    state: &BattleState,
    user: UnitId,
    skill: Skill,
    target: UnitId,
    stance: Stance,
) -> f64 {
    let (Some(attacker), Some(defender)) = (state.unit(user), state.unit(target)) else {
        return 0.0;
    };
    let power_scale = stance.power_bonus(&state.config);

    let mut damage_score = 0.0;
    let mut utility_score = 0.0;
    for action in &skill_data(skill).actions {
        let accuracy = match action.accuracy_type {
            Some(accuracy_type) if !action.sure_hit => {
                stats::hit_chance(accuracy_type, attacker.stats(), defender.stats())
                    * action.accuracy_rate
            }
            _ => 1.0,
        };
        for effect in &action.effects {
            if effect.target_hint == TargetHint::User {
                continue;
            }
            match &effect.effect {
                Effect::Damage {
                    damage_type,
                    power,
                    add_status,
                    status_chance,
                    ..
                } => {
                    damage_score += stats::damage(
                        *damage_type,
                        attacker.stats(),
                        attacker.weapon_level(),
                        defender.stats(),
                        power * power_scale,
                    ) * action.hits as f64
                        * accuracy;
                    if let Some(status) = add_status {
                        if !defender.has_status(*status) {
                            let chance = status_chance.unwrap_or(100) as f64 / 100.0;
                            utility_score += 20.0 * chance * accuracy;
                        }
                    }
                }
                Effect::InstaKill { .. } => {
                    damage_score += defender.hp() as f64 * accuracy;
                }
                Effect::AddStatus { status } if !defender.has_status(*status) => {
                    utility_score += 25.0 * accuracy;
                }
                Effect::AddCondition { condition } if !state.conditions.contains(*condition) => {
                    utility_score += 15.0;
                }
                _ => {}
            }
        }
    }

    let hp = defender.hp() as f64;
    if damage_score >= hp {
        damage_score = hp + KNOCKOUT_BONUS;
    }
    damage_score + utility_score
}

/// Offensive skills `user` can use in `stance`, paired with living
/// opponents, in skill then enumeration order.
fn attack_candidates(state: &BattleState, user: UnitId, stance: Stance) -> Vec<(Skill, UnitId)> {
    let Some(unit) = state.unit(user) else {
        return Vec::new();
    };
    let opponents = state.opponents_of(user);
    unit.skills()
        .iter()
        .map(|slot| slot.skill)
        .filter(|&skill| {
            let data = skill_data(skill);
            data.category != SkillCategory::Heal
                && !data.target_type.prefers_allies()
                && unit.is_skill_usable(skill, stance)
        })
        .flat_map(|skill| opponents.iter().map(move |&target| (skill, target)))
        .collect()
}

/// The highest-rated attack; the first candidate wins ties.
pub fn best_attack(state: &BattleState, user: UnitId, stance: Stance) -> Option<(Skill, UnitId)> {
    attack_candidates(state, user, stance)
        .into_iter()
        .map(|(skill, target)| {
            let score = rate_skill(state, user, skill, target, stance);
            ((skill, target), OrderedFloat(score))
        })
        .fold(None, |best: Option<((Skill, UnitId), OrderedFloat<f64>)>, candidate| match best {
            Some(current) if current.1 >= candidate.1 => Some(current),
            _ => Some(candidate),
        })
        .map(|(choice, _)| choice)
}

impl BattleAi for ScoringAi {
    fn strategize(&mut self, cx: &mut AiContext<'_>) {
        if Self::heal_if_low(cx) {
            return;
        }

        let me = cx.unit_id();
        let candidates = attack_candidates(cx.state, me, Stance::Attack);
        let mut best: Option<((Skill, UnitId), OrderedFloat<f64>)> = None;
        for (skill, target) in candidates {
            // A small random factor keeps the AI from repeating itself.
            let jitter = 1.0 + (cx.rng.next_roll("Scoring Jitter") * 0.1 - 0.05);
            let score = OrderedFloat(rate_skill(cx.state, me, skill, target, Stance::Attack) * jitter);
            if best.as_ref().map_or(true, |(_, top)| *top < score) {
                best = Some(((skill, target), score));
            }
        }
        if let Some(((skill, target), _)) = best {
            cx.queue_skill_with(skill, Stance::Attack, Some(target));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::action_stack::Usable;
    use crate::battle::ai::{AiMove, CpuBattler, PhaseTracker};
    use crate::battle::rng::BattleRng;
    use crate::battle::tests::common::TestUnitBuilder;
    use crate::config::BattleConfig;
    use pretty_assertions::assert_eq;
    use schema::ItemStock;

    fn state() -> BattleState {
        BattleState::new(
            vec![
                TestUnitBuilder::new("scott").build_as(UnitId(0)),
                TestUnitBuilder::new("bruce").with_max_hp(200).build_as(UnitId(1)),
                TestUnitBuilder::new("horse")
                    .enemy()
                    .with_skills(&[Skill::SwordSlash, Skill::Flare])
                    .with_items(&[ItemStock {
                        item: Item::Tonic,
                        uses: 1,
                    }])
                    .build_as(UnitId(2)),
            ],
            BattleConfig::default(),
        )
    }

    #[test]
    fn test_stronger_skill_rates_higher() {
        let state = state();

        let slash = rate_skill(&state, UnitId(2), Skill::SwordSlash, UnitId(0), Stance::Attack);
        let flare = rate_skill(&state, UnitId(2), Skill::Flare, UnitId(0), Stance::Attack);

        assert!(flare > slash, "flare {flare} should beat slash {slash}");
    }

    #[test]
    fn test_best_attack_goes_for_the_knockout() {
        let mut state = state();
        state.units[1].take_damage(195, &[], true);

        assert_eq!(
            best_attack(&state, UnitId(2), Stance::Attack),
            Some((Skill::SwordSlash, UnitId(1)))
        );
    }

    #[test]
    fn test_strategize_queues_the_top_scoring_attack() {
        let state = state();
        let mut cpu = CpuBattler::new(UnitId(2), PhaseTracker::new(Vec::new()), Skill::SwordSlash);
        // Neutral jitter for all four candidates.
        let mut rng = BattleRng::new_for_test(vec![0.5; 4]);
        let mut commands = Vec::new();

        let mut cx = AiContext::new(&state, &mut cpu, &mut rng, &mut commands);
        ScoringAi::new().strategize(&mut cx);

        assert_eq!(
            cpu.planned_moves().copied().collect::<Vec<_>>(),
            vec![AiMove {
                usable: Usable::Skill(Skill::Flare),
                stance: Stance::Attack,
                target: Some(UnitId(0)),
            }]
        );
    }

    #[test]
    fn test_low_health_reaches_for_a_tonic() {
        let mut state = state();
        state.units[2].take_damage(80, &[], true);
        let mut cpu = CpuBattler::new(UnitId(2), PhaseTracker::new(Vec::new()), Skill::SwordSlash);
        let mut rng = BattleRng::new_for_test(Vec::new());
        let mut commands = Vec::new();

        let mut cx = AiContext::new(&state, &mut cpu, &mut rng, &mut commands);
        ScoringAi::new().strategize(&mut cx);

        assert_eq!(
            cpu.planned_moves().next().map(|planned| planned.usable),
            Some(Usable::Item(Item::Tonic))
        );
    }
}
