#[cfg(test)]
mod tests {
    use crate::battle::action_stack::ActionStep;
    use crate::battle::commands::{BattleCommand, execute_command};
    use crate::battle::engine::{commit_selection, execute_step};
    use crate::battle::menu::MoveSelection;
    use crate::battle::presentation::{Cue, NullPresenter};
    use crate::battle::stance::Stance;
    use crate::battle::state::{BattleEvent, BattleState, EventBus};
    use crate::battle::tests::common::{
        TestUnitBuilder, assert_ok, create_test_battle, predictable_rng,
    };
    use crate::battle::unit::UnitId;
    use crate::config::BattleConfig;
    use pretty_assertions::assert_eq;
    use schema::Skill;

    const SCOTT: UnitId = UnitId(0);
    const DUMMY: UnitId = UnitId(1);

    fn announcements(events: &[BattleEvent], unit: UnitId) -> Vec<String> {
        events
            .iter()
            .filter_map(|event| match event {
                BattleEvent::ActionAnnounced { unit: who, text } if *who == unit => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_multi_step_skill_runs_over_consecutive_turns() {
        // Arrange
        let units = vec![
            TestUnitBuilder::new("scott")
                .with_speed(20)
                .with_skills(&[Skill::ChargeSlash])
                .template(),
            TestUnitBuilder::new("dummy").enemy().template(),
        ];
        let selections = vec![MoveSelection::skill(Skill::ChargeSlash, Stance::Attack, vec![DUMMY])];
        let (mut runner, presenter) = assert_ok(create_test_battle(units, selections, predictable_rng()));

        // Act
        let first = assert_ok(runner.advance());
        let after_first = runner.state().units[SCOTT.0].counter();
        let second = assert_ok(runner.advance());

        // Assert
        runner.bus().print_debug_with_message("Events for test_multi_step_skill_runs_over_consecutive_turns:");
        assert_eq!(first, vec![SCOTT]);
        assert_eq!(second, vec![SCOTT]);
        // The wind-up is rank 1: ceil(100 / 20).
        assert_eq!(after_first, 5);
        assert_eq!(runner.state().ticks_elapsed, 15);
        assert_eq!(
            announcements(runner.events(), SCOTT),
            vec!["Charge".to_string(), "Sword Slash".to_string()]
        );
        // The menu was asked once; the second turn came from the queue.
        let selections = runner
            .events()
            .iter()
            .filter(|event| matches!(event, BattleEvent::MoveSelected { unit, .. } if *unit == SCOTT))
            .count();
        assert_eq!(selections, 1);
        assert!(runner.state().units[DUMMY.0].hp() < runner.state().units[DUMMY.0].max_hp());
        assert!(presenter.cues().contains(&Cue::Announce {
            unit: SCOTT,
            text: "Sword Slash".to_string()
        }));
    }

    #[test]
    fn test_charge_stance_adds_a_wind_up_step() {
        // Arrange
        let mut state = BattleState::new(
            vec![
                TestUnitBuilder::new("scott")
                    .with_skills(&[Skill::SwordSlash])
                    .build_as(SCOTT),
                TestUnitBuilder::new("dummy").enemy().build_as(DUMMY),
            ],
            BattleConfig::default(),
        );
        let mut bus = EventBus::new();

        // Act
        assert_ok(commit_selection(
            &mut state,
            &mut bus,
            SCOTT,
            &MoveSelection::skill(Skill::SwordSlash, Stance::Charge, vec![DUMMY]),
        ));

        // Assert
        let queued: Vec<_> = state.units[SCOTT.0].queued_actions().iter().collect();
        assert_eq!(queued.len(), 2);
        assert_eq!(queued[0].step, ActionStep::ChargeUp);
        assert_eq!(queued[0].step.rank(&state.config), 1);
        assert!(matches!(queued[1].step, ActionStep::Perform(data) if data.rank == 2));
        assert_eq!(queued[1].power_scale, state.config.charge_bonus);
    }

    #[test]
    fn test_defeat_drops_pending_steps() {
        // Arrange
        let mut state = BattleState::new(
            vec![
                TestUnitBuilder::new("scott")
                    .with_skills(&[Skill::SwordSlash])
                    .build_as(SCOTT),
                TestUnitBuilder::new("dummy").enemy().build_as(DUMMY),
            ],
            BattleConfig::default(),
        );
        let mut bus = EventBus::new();
        let mut rng = predictable_rng();
        assert_ok(commit_selection(
            &mut state,
            &mut bus,
            SCOTT,
            &MoveSelection::skill(Skill::SwordSlash, Stance::Charge, vec![DUMMY]),
        ));
        let wind_up = state.units[SCOTT.0].next_queued_action().unwrap();
        assert_ok(execute_step(&mut state, &mut bus, &mut rng, &mut NullPresenter, SCOTT, &wind_up));

        // Act
        assert_ok(execute_command(BattleCommand::Kill { target: SCOTT }, &mut state, &mut bus));

        // Assert
        bus.print_debug_with_message("Events for test_defeat_drops_pending_steps:");
        assert!(!state.units[SCOTT.0].has_queued_actions());
        assert!(bus.events().contains(&BattleEvent::ChargingUp { unit: SCOTT }));
        assert!(bus.events().contains(&BattleEvent::ActionsDropped {
            unit: SCOTT,
            count: 1
        }));
        assert_eq!(state.units[DUMMY.0].hp(), state.units[DUMMY.0].max_hp());
    }

    #[test]
    fn test_a_downed_unit_is_skipped_by_the_timeline() {
        // Arrange
        let units = vec![
            TestUnitBuilder::new("scott")
                .with_speed(20)
                .with_skills(&[Skill::SwordSlash])
                .template(),
            TestUnitBuilder::new("bruce").template(),
            TestUnitBuilder::new("dummy").enemy().with_max_hp(10).template(),
            TestUnitBuilder::new("brute").enemy().with_speed(5).template(),
        ];
        let selections = vec![MoveSelection::skill(Skill::SwordSlash, Stance::Attack, vec![UnitId(2)])];
        let (mut runner, _) = assert_ok(create_test_battle(units, selections, predictable_rng()));

        // Act: scott fells the dummy, then he and bruce come up together.
        assert_eq!(assert_ok(runner.advance()), vec![SCOTT]);
        let frozen = runner.state().units[2].counter();
        let next = assert_ok(runner.advance());

        // Assert
        assert!(!runner.state().units[2].is_alive());
        assert_eq!(next, vec![SCOTT, UnitId(1)]);
        assert_eq!(runner.state().units[2].counter(), frozen);
        assert_eq!(runner.outcome(), None);
    }
}
