//! Turn resolution: everything that happens between a unit becoming ready and
//! its countdown being reset. `BattleRunner` decides who acts and where the
//! move comes from; the functions here carry it out against the state.

use schema::{ConditionTick, HpTag};
use tracing::{debug, info};

use crate::battle::action_stack::{ActionQueue, ActionStep, QueuedAction, Usable};
use crate::battle::commands::{execute_command, execute_command_batch, BattleCommand};
use crate::battle::menu::MoveSelection;
use crate::battle::move_effects::{roll_accuracy, BattleEffectExt, EffectContext};
use crate::battle::presentation::{Cue, Presenter};
use crate::battle::rng::BattleRng;
use crate::battle::stance::Stance;
use crate::battle::state::{BattleEvent, BattleState, EventBus};
use crate::battle::targeting::{validate_targets, TargetRules};
use crate::battle::unit::{Side, UnitId};
use crate::errors::{BattleResult, BattleStateError, SelectionError};

/// Text shown when a charged technique spends its first turn winding up.
const CHARGE_UP_TEXT: &str = "Charging Up";

/// Puts every unit on the timeline and announces the battle.
pub fn initialize_battle(state: &mut BattleState, bus: &mut EventBus) -> BattleResult<()> {
    if state.side_members(Side::Party).is_empty() || state.side_members(Side::Enemy).is_empty() {
        return Err(BattleStateError::EmptySide.into());
    }
    let (rank, ctb_base) = (state.config.initial_rank, state.config.ctb_base);
    for unit in &mut state.units {
        unit.reset_counter(rank, ctb_base);
    }
    info!(units = state.units.len(), "battle started");
    bus.push(BattleEvent::BattleStarted {
        units: state.units.len(),
    });
    Ok(())
}

/// Suspends the battle for `id` and runs its turn-start effects: status
/// damage and healing, the field conditions' ticks, then duration countdowns.
/// A turn that is already open (its input source is being asked again) only
/// re-suspends. Returns whether the unit is still standing afterwards.
pub fn start_turn(
    state: &mut BattleState,
    bus: &mut EventBus,
    rng: &mut BattleRng,
    id: UnitId,
) -> BattleResult<bool> {
    if state.is_over() {
        return Err(BattleStateError::BattleOver.into());
    }
    if let Some(current) = state.current_actor {
        return Err(BattleStateError::InconsistentState(format!(
            "{} cannot start a turn while {} is acting",
            id, current
        ))
        .into());
    }
    state.current_actor = Some(id);
    if state.try_unit(id)?.is_turn_open() {
        debug!(unit = %state.unit_name(id), "resuming an open turn");
        return Ok(state.try_unit(id)?.is_alive());
    }
    state.try_unit_mut(id)?.set_turn_open(true);
    state.turn_number += 1;
    info!(unit = %state.unit_name(id), turn = state.turn_number, "unit ready");
    bus.push(BattleEvent::UnitReady {
        unit: id,
        turn_number: state.turn_number,
    });

    let ready = state.try_unit(id)?.begin_turn();
    let mut commands = Vec::new();
    for (amount, element) in ready.damage {
        commands.push(BattleCommand::DealDamage {
            target: id,
            amount,
            tags: vec![HpTag::Element(element)],
            ignore_defend: true,
            source: None,
        });
    }
    for amount in ready.healing {
        commands.push(BattleCommand::Heal {
            target: id,
            amount,
            tags: Vec::new(),
        });
    }
    commands.extend(condition_commands(state, rng, id));
    execute_command_batch(commands, state, bus)?;

    for status in state.try_unit_mut(id)?.tick_status_durations() {
        bus.push(BattleEvent::StatusExpired { target: id, status });
    }
    for condition in state.conditions.count_down() {
        bus.push(BattleEvent::ConditionExpired { condition });
    }

    Ok(state.try_unit(id)?.is_alive())
}

/// What the active field conditions do to `id` this turn.
fn condition_commands(state: &BattleState, rng: &mut BattleRng, id: UnitId) -> Vec<BattleCommand> {
    let Some(unit) = state.unit(id) else {
        return Vec::new();
    };
    let share = |percent: u32| ((unit.max_hp() * percent) / 100).max(1) as i32;

    state
        .conditions
        .ticks()
        .into_iter()
        .filter_map(|(condition, tick)| match tick {
            ConditionTick::Damage { percent, element } => Some(BattleCommand::DealDamage {
                target: id,
                amount: share(*percent),
                tags: vec![HpTag::Element(*element)],
                ignore_defend: true,
                source: None,
            }),
            ConditionTick::Heal { percent } => Some(BattleCommand::Heal {
                target: id,
                amount: share(*percent),
                tags: Vec::new(),
            }),
            ConditionTick::AddStatus { status, chance } => {
                let reason = format!("{} Status Chance", condition);
                rng.chance(*chance as f64 / 100.0, &reason)
                    .then_some(BattleCommand::AddStatus {
                        target: id,
                        status: *status,
                    })
            }
        })
        .collect()
}

/// Checks a selection from a human input source. Guard needs nothing else;
/// any other stance needs a usable the unit can use in it and legal targets.
/// Group targets expand to the whole group.
pub fn validate_selection(
    state: &BattleState,
    id: UnitId,
    selection: &MoveSelection,
) -> Result<MoveSelection, SelectionError> {
    let Some(unit) = state.unit(id) else {
        return Err(SelectionError::IllegalTarget { target: id });
    };
    let stance = selection.stance;
    if stance == Stance::Guard {
        return Ok(MoveSelection::guard(id));
    }
    let usable = selection
        .usable
        .ok_or(SelectionError::NothingSelected { stance })?;

    match usable {
        Usable::Skill(skill) => unit.skill_usability(skill, stance)?,
        Usable::Item(item) => {
            if !stance.allows_items() {
                return Err(SelectionError::ItemsNotAllowed { item, stance });
            }
            if !unit.is_item_usable(item) {
                return Err(SelectionError::ItemUnavailable { unit: id, item });
            }
        }
    }

    let targets = validate_targets(state, id, TargetRules::of(usable), &selection.targets)?;
    if stance == Stance::Counter {
        if let Some(locked) = unit.counter_target() {
            if let Some(&other) = targets.iter().find(|&&target| target != locked) {
                return Err(SelectionError::IllegalTarget { target: other });
            }
        }
    }

    Ok(MoveSelection {
        usable: Some(usable),
        stance,
        targets,
    })
}

/// Locks in a selection: stance, cost, and the steps it expands to.
pub fn commit_selection(
    state: &mut BattleState,
    bus: &mut EventBus,
    id: UnitId,
    selection: &MoveSelection,
) -> BattleResult<()> {
    let config = state.config.clone();
    let unit = state.try_unit_mut(id)?;

    if unit.stance() != selection.stance {
        unit.set_stance(selection.stance);
        bus.push(BattleEvent::StanceChanged {
            unit: id,
            stance: selection.stance,
        });
    }
    bus.push(BattleEvent::MoveSelected {
        unit: id,
        usable: selection.usable,
        stance: selection.stance,
        targets: selection.targets.clone(),
    });

    match selection.usable {
        Some(Usable::Skill(skill)) if selection.stance != Stance::Guard => {
            let cost = unit.mp_cost(skill);
            if cost > 0 && unit.mp.use_mp(cost) {
                bus.push(BattleEvent::MpSpent {
                    unit: id,
                    amount: cost,
                    remaining: unit.mp.available(),
                });
            }
        }
        Some(Usable::Item(item)) if selection.stance != Stance::Guard => {
            if unit.consume_item(item) {
                bus.push(BattleEvent::ItemConsumed {
                    unit: id,
                    item,
                    uses_left: unit.item_uses(item),
                });
            }
        }
        _ => {}
    }

    let queue = ActionQueue::build(
        selection.usable,
        selection.stance,
        selection.targets.clone(),
        &config,
    );
    debug!(unit = %unit.name, steps = queue.len(), "move committed");
    unit.queue_actions(queue);
    unit.set_counter_target(None);
    Ok(())
}

/// Runs one queued step for `id`. A `Perform` step lands each hit in turn and
/// stops early if the actor goes down partway.
pub fn execute_step(
    state: &mut BattleState,
    bus: &mut EventBus,
    rng: &mut BattleRng,
    presenter: &mut dyn Presenter,
    id: UnitId,
    action: &QueuedAction,
) -> BattleResult<()> {
    if !state.try_unit(id)?.is_alive() {
        debug!(unit = %id, "actor is down; step discarded");
        return Ok(());
    }

    match &action.step {
        ActionStep::Guard => {
            state.try_unit_mut(id)?.set_defending(true);
            bus.push(BattleEvent::Guarding { unit: id });
        }
        ActionStep::ChargeUp => {
            state.try_unit_mut(id)?.set_defending(false);
            bus.push(BattleEvent::ChargingUp { unit: id });
            presenter.play(&Cue::Announce {
                unit: id,
                text: CHARGE_UP_TEXT.to_string(),
            });
        }
        ActionStep::Perform(data) => {
            if !data.preserve_guard {
                state.try_unit_mut(id)?.set_defending(false);
            }
            bus.push(BattleEvent::ActionAnnounced {
                unit: id,
                text: data.announce.clone(),
            });
            presenter.play(&Cue::Announce {
                unit: id,
                text: data.announce.clone(),
            });
            if let Some(animation) = &data.animation {
                presenter.play(&Cue::Animation {
                    unit: id,
                    name: animation.clone(),
                });
            }

            for hit in 0..data.hits {
                let actor = state.try_unit(id)?;
                if !actor.is_alive() {
                    debug!(unit = %id, hit, "actor fell mid-action");
                    break;
                }
                let (landed, missed) = roll_accuracy(data, actor, &action.targets, state, rng);
                for target in missed {
                    bus.push(BattleEvent::ActionMissed { actor: id, target });
                }
                let context = EffectContext::new(id, landed, action.usable, action.power_scale);
                for effect in &data.effects {
                    let commands = effect.apply(&context, state, rng);
                    execute_command_batch(commands, state, bus)?;
                }
            }
        }
    }
    Ok(())
}

/// Restarts the countdown of a unit that survived its turn, using the rank of
/// the step it just took.
pub fn reschedule(state: &mut BattleState, bus: &mut EventBus, id: UnitId, rank: u32) -> BattleResult<()> {
    let ctb_base = state.config.ctb_base;
    let unit = state.try_unit_mut(id)?;
    if !unit.is_alive() {
        return Ok(());
    }
    let counter = unit.reset_counter(rank, ctb_base);
    debug!(unit = %unit.name, rank, counter, "rescheduled");
    bus.push(BattleEvent::TurnEnded {
        unit: id,
        rank,
        counter,
    });
    Ok(())
}

/// Resumes the battle and records the outcome if one side has fallen.
pub fn finish_turn(state: &mut BattleState, bus: &mut EventBus) {
    state.current_actor = None;
    if state.outcome.is_none() {
        if let Some(outcome) = state.check_outcome() {
            info!(?outcome, "battle ended");
            state.outcome = Some(outcome);
            bus.push(BattleEvent::BattleEnded { outcome });
        }
    }
}

/// Applies a status an AI asked for on its own unit.
pub fn apply_ai_status(
    state: &mut BattleState,
    bus: &mut EventBus,
    unit: UnitId,
    status: schema::Status,
) -> BattleResult<()> {
    execute_command(BattleCommand::AddStatus { target: unit, status }, state, bus)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::presentation::NullPresenter;
    use crate::battle::tests::common::{predictable_rng, TestUnitBuilder};
    use crate::config::BattleConfig;
    use pretty_assertions::assert_eq;
    use schema::{Condition, Item, ItemStock, Skill, Status};

    fn duel() -> BattleState {
        BattleState::new(
            vec![
                TestUnitBuilder::new("scott")
                    .with_skills(&[Skill::SwordSlash, Skill::Flare])
                    .with_items(&[ItemStock {
                        item: Item::Tonic,
                        uses: 1,
                    }])
                    .build_as(UnitId(0)),
                TestUnitBuilder::new("robert").enemy().build_as(UnitId(1)),
            ],
            BattleConfig::default(),
        )
    }

    #[test]
    fn test_empty_side_is_rejected() {
        let mut state = BattleState::new(
            vec![TestUnitBuilder::new("scott").build_as(UnitId(0))],
            BattleConfig::default(),
        );
        let result = initialize_battle(&mut state, &mut EventBus::new());

        assert!(matches!(
            result,
            Err(crate::errors::BattleEngineError::BattleState(BattleStateError::EmptySide))
        ));
    }

    #[test]
    fn test_initialize_sets_first_countdowns() {
        let mut state = duel();
        let mut bus = EventBus::new();

        initialize_battle(&mut state, &mut bus).unwrap();

        // Speed 10 at rank 2: ceil(200 / 10).
        assert_eq!(state.units[0].counter(), 20);
        assert_eq!(state.units[1].counter(), 20);
        assert_eq!(bus.events(), &[BattleEvent::BattleStarted { units: 2 }]);
    }

    #[test]
    fn test_status_damage_at_turn_start_ignores_guard() {
        let mut state = duel();
        state.units[0].add_status(Status::Ignite);
        state.units[0].set_defending(true);
        let hp_before = state.units[0].hp();
        let mut bus = EventBus::new();

        let alive = start_turn(&mut state, &mut bus, &mut predictable_rng(), UnitId(0)).unwrap();

        assert!(alive);
        assert!(state.units[0].hp() < hp_before);
        assert_eq!(state.current_actor, Some(UnitId(0)));
        assert_eq!(state.turn_number, 1);
    }

    #[test]
    fn test_condition_expires_after_its_unit_turns() {
        let mut state = duel();
        state.conditions.add(Condition::HealingAura);
        let duration = crate::catalog::condition_data(Condition::HealingAura).duration;
        let mut bus = EventBus::new();

        for _ in 0..duration {
            start_turn(&mut state, &mut bus, &mut predictable_rng(), UnitId(0)).unwrap();
            finish_turn(&mut state, &mut bus);
        }

        assert!(!state.conditions.contains(Condition::HealingAura));
        assert!(bus.events().contains(&BattleEvent::ConditionExpired {
            condition: Condition::HealingAura
        }));
    }

    #[test]
    fn test_validate_rejects_items_outside_attack_stance() {
        let state = duel();
        let selection = MoveSelection {
            usable: Some(Usable::Item(Item::Tonic)),
            stance: Stance::Charge,
            targets: vec![UnitId(0)],
        };

        assert_eq!(
            validate_selection(&state, UnitId(0), &selection),
            Err(SelectionError::ItemsNotAllowed {
                item: Item::Tonic,
                stance: Stance::Charge
            })
        );
    }

    #[test]
    fn test_validate_rejects_unknown_skill_and_bad_target() {
        let state = duel();

        assert_eq!(
            validate_selection(
                &state,
                UnitId(0),
                &MoveSelection::skill(Skill::Omni, Stance::Attack, vec![UnitId(1)])
            ),
            Err(SelectionError::SkillNotKnown {
                unit: UnitId(0),
                skill: Skill::Omni
            })
        );
        assert_eq!(
            validate_selection(
                &state,
                UnitId(0),
                &MoveSelection::skill(Skill::SwordSlash, Stance::Attack, vec![UnitId(0)])
            ),
            Err(SelectionError::IllegalTarget { target: UnitId(0) })
        );
    }

    #[test]
    fn test_validate_locks_counter_target() {
        let mut state = duel();
        state.units.push(TestUnitBuilder::new("horse").enemy().build_as(UnitId(2)));
        state.units[0].set_counter_target(Some(UnitId(1)));

        let selection = MoveSelection::skill(Skill::SwordSlash, Stance::Counter, vec![UnitId(2)]);

        assert_eq!(
            validate_selection(&state, UnitId(0), &selection),
            Err(SelectionError::IllegalTarget { target: UnitId(2) })
        );
    }

    #[test]
    fn test_commit_spends_mp_and_queues_steps() {
        let mut state = duel();
        let mut bus = EventBus::new();
        let selection = MoveSelection::skill(Skill::Flare, Stance::Charge, vec![UnitId(1)]);

        commit_selection(&mut state, &mut bus, UnitId(0), &selection).unwrap();

        let unit = &state.units[0];
        assert_eq!(unit.stance(), Stance::Charge);
        assert_eq!(unit.mp.available(), unit.mp.capacity() - 5);
        let steps: Vec<&ActionStep> = unit.queued_actions().iter().map(|queued| &queued.step).collect();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0], &ActionStep::ChargeUp);
    }

    #[test]
    fn test_commit_item_uses_one_up() {
        let mut state = duel();
        let mut bus = EventBus::new();

        commit_selection(&mut state, &mut bus, UnitId(0), &MoveSelection::item(Item::Tonic, vec![UnitId(0)]))
            .unwrap();

        assert_eq!(state.units[0].item_uses(Item::Tonic), 0);
        assert!(bus.events().contains(&BattleEvent::ItemConsumed {
            unit: UnitId(0),
            item: Item::Tonic,
            uses_left: 0
        }));
    }

    #[test]
    fn test_guard_step_raises_defense() {
        let mut state = duel();
        let mut bus = EventBus::new();
        commit_selection(&mut state, &mut bus, UnitId(0), &MoveSelection::guard(UnitId(0))).unwrap();
        let action = state.units[0].next_queued_action().unwrap();

        execute_step(
            &mut state,
            &mut bus,
            &mut predictable_rng(),
            &mut NullPresenter,
            UnitId(0),
            &action,
        )
        .unwrap();

        assert!(state.units[0].is_defending());
        assert_eq!(action.step.rank(&state.config), state.config.stance_change_rank);
    }

    #[test]
    fn test_dead_actor_step_is_discarded() {
        let mut state = duel();
        let mut bus = EventBus::new();
        commit_selection(
            &mut state,
            &mut bus,
            UnitId(0),
            &MoveSelection::skill(Skill::SwordSlash, Stance::Attack, vec![UnitId(1)]),
        )
        .unwrap();
        let action = state.units[0].next_queued_action().unwrap();
        state.units[0].take_damage(1_000, &[], true);
        let hp = state.units[1].hp();

        execute_step(
            &mut state,
            &mut bus,
            &mut predictable_rng(),
            &mut NullPresenter,
            UnitId(0),
            &action,
        )
        .unwrap();

        assert_eq!(state.units[1].hp(), hp);
    }

    #[test]
    fn test_finish_turn_records_victory() {
        let mut state = duel();
        let mut bus = EventBus::new();
        state.current_actor = Some(UnitId(0));
        state.units[1].take_damage(1_000, &[], true);

        finish_turn(&mut state, &mut bus);

        assert_eq!(state.current_actor, None);
        assert_eq!(state.outcome, Some(crate::battle::state::BattleOutcome::Victory));
    }
}
