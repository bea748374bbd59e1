#[cfg(test)]
mod tests {
    use crate::battle::action_stack::Usable;
    use crate::battle::menu::{MoveSelection, ScriptedMenu};
    use crate::battle::presentation::NullPresenter;
    use crate::battle::runner::BattleRunner;
    use crate::battle::stance::Stance;
    use crate::battle::state::BattleEvent;
    use crate::battle::stats::time_until_next_turn;
    use crate::battle::tests::common::{
        TestUnitBuilder, assert_ok, create_test_battle, predictable_rng,
    };
    use crate::battle::unit::UnitId;
    use crate::config::BattleConfig;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use schema::{Skill, Status};

    const SCOTT: UnitId = UnitId(0);
    const DUMMY: UnitId = UnitId(1);

    #[rstest]
    #[case::reference_speed(10, 20)]
    #[case::fast(20, 10)]
    fn test_quickstrike_end_to_end(#[case] speed: u32, #[case] ready_at: u64) {
        // Arrange
        let units = vec![
            TestUnitBuilder::new("scott")
                .with_speed(speed)
                .with_skills(&[Skill::Quickstrike])
                .template(),
            TestUnitBuilder::new("dummy").enemy().with_defense(0).template(),
        ];
        let selections = vec![MoveSelection::skill(Skill::Quickstrike, Stance::Attack, vec![DUMMY])];
        let (mut runner, presenter) = assert_ok(create_test_battle(units, selections, predictable_rng()));
        let hp_before = runner.state().units[DUMMY.0].hp();

        // Act: the first countdown is ceil(200 / speed); at equal speed scott
        // still goes first by enumeration order.
        let acted = assert_ok(runner.advance());

        // Assert
        runner.bus().print_debug_with_message("Events for test_quickstrike_end_to_end:");
        assert_eq!(acted[0], SCOTT);
        assert_eq!(runner.state().ticks_elapsed, ready_at);

        let dealt = hp_before - runner.state().units[DUMMY.0].hp();
        assert!((9..=11).contains(&dealt), "Quickstrike dealt {dealt}");

        let expected_counter = time_until_next_turn(speed, 1, 100);
        assert_eq!(runner.state().units[SCOTT.0].counter(), expected_counter);
        assert!(runner.events().contains(&BattleEvent::TurnEnded {
            unit: SCOTT,
            rank: 1,
            counter: expected_counter,
        }));
        assert_eq!(presenter.dialogue(), Vec::<String>::new());
        assert!(runner.state().current_actor.is_none());
    }

    #[test]
    fn test_equal_speeds_stay_in_lockstep() {
        // Arrange: nobody has anything scripted, so everyone guards.
        let units = vec![
            TestUnitBuilder::new("scott").template(),
            TestUnitBuilder::new("bruce").template(),
            TestUnitBuilder::new("dummy").enemy().template(),
        ];
        let (mut runner, _) = assert_ok(create_test_battle(units, Vec::new(), predictable_rng()));

        // Act
        let first = assert_ok(runner.advance());
        let second = assert_ok(runner.advance());

        // Assert: all three become ready on the same tick, in enumeration order.
        let everyone = vec![UnitId(0), UnitId(1), UnitId(2)];
        assert_eq!(first, everyone);
        assert_eq!(second, everyone);
        assert_eq!(runner.state().ticks_elapsed, 40);
        assert_eq!(runner.state().turn_number, 6);
        assert!(runner.state().units.iter().all(|unit| unit.is_defending()));
    }

    #[test]
    fn test_guard_then_counter_the_attacker() {
        // Arrange
        let units = vec![
            TestUnitBuilder::new("scott")
                .with_speed(15)
                .with_skills(&[Skill::SwordSlash])
                .template(),
            TestUnitBuilder::new("foe")
                .enemy()
                .with_skills(&[Skill::SwordSlash])
                .template(),
        ];
        let selections = vec![
            MoveSelection::guard(SCOTT),
            MoveSelection::skill(Skill::SwordSlash, Stance::Counter, vec![DUMMY]),
        ];
        let (mut runner, _) = assert_ok(create_test_battle(units, selections, predictable_rng()));

        // Act 1: scott raises his guard.
        assert_eq!(assert_ok(runner.advance()), vec![SCOTT]);
        assert!(runner.state().units[SCOTT.0].is_defending());

        // Act 2: the foe swings into the guard.
        assert_eq!(assert_ok(runner.advance()), vec![DUMMY]);

        // Assert 2: halved damage, and the counter is armed.
        runner.bus().print_debug_with_message("Events after the foe's attack:");
        assert_eq!(runner.state().units[SCOTT.0].hp(), 93);
        assert_eq!(runner.state().units[SCOTT.0].counter_target(), Some(DUMMY));
        assert!(runner.events().contains(&BattleEvent::CounterReady {
            unit: SCOTT,
            target: DUMMY
        }));

        // Act 3: scott strikes back from Counter stance.
        assert_eq!(assert_ok(runner.advance()), vec![SCOTT]);

        // Assert 3
        let scott = &runner.state().units[SCOTT.0];
        assert_eq!(scott.stance(), Stance::Counter);
        assert_eq!(scott.counter_target(), None);
        assert!(!scott.is_defending());
        assert!(runner.events().contains(&BattleEvent::MoveSelected {
            unit: SCOTT,
            usable: Some(Usable::Skill(Skill::SwordSlash)),
            stance: Stance::Counter,
            targets: vec![DUMMY],
        }));
        // 15 power at the counter bonus against defense 10.
        assert_eq!(runner.state().units[DUMMY.0].hp(), 80);
    }

    #[test]
    fn test_run_stops_at_the_outcome() {
        // Arrange
        let units = vec![
            TestUnitBuilder::new("scott")
                .with_speed(20)
                .with_skills(&[Skill::SwordSlash])
                .template(),
            TestUnitBuilder::new("dummy").enemy().with_max_hp(10).template(),
        ];
        let selections = vec![MoveSelection::skill(Skill::SwordSlash, Stance::Attack, vec![DUMMY])];
        let (mut runner, _) = assert_ok(create_test_battle(units, selections, predictable_rng()));

        // Act
        let outcome = assert_ok(runner.run());

        // Assert
        assert_eq!(outcome, crate::battle::state::BattleOutcome::Victory);
        assert!(runner.events().contains(&BattleEvent::UnitDefeated { unit: DUMMY }));
        assert!(matches!(
            runner.events().last(),
            Some(BattleEvent::BattleEnded { .. })
        ));
        assert!(runner.tick().is_err());
    }

    fn ignited_scott(selections: Vec<MoveSelection>, config: BattleConfig) -> BattleRunner {
        let units = vec![
            TestUnitBuilder::new("scott")
                .with_skills(&[Skill::SwordSlash])
                .template(),
            TestUnitBuilder::new("dummy").enemy().template(),
        ];
        let mut runner = assert_ok(BattleRunner::with_rng(
            units,
            config,
            predictable_rng(),
            Box::new(ScriptedMenu::new(selections)),
            Box::new(NullPresenter),
        ));
        runner.state_mut().units[SCOTT.0].add_status(Status::Ignite);
        runner
    }

    fn unknown_then_slash() -> Vec<MoveSelection> {
        vec![
            MoveSelection::skill(Skill::Omni, Stance::Attack, vec![DUMMY]),
            MoveSelection::skill(Skill::SwordSlash, Stance::Attack, vec![DUMMY]),
        ]
    }

    #[test]
    fn test_reasked_selection_burns_once() {
        // Arrange
        let mut runner = ignited_scott(unknown_then_slash(), BattleConfig::default());

        // Act
        assert_ok(runner.take_turn(SCOTT));

        // Assert: 2% of 100 HP, once, and the slash still lands.
        runner.bus().print_debug_with_message("Events for test_reasked_selection_burns_once:");
        assert_eq!(runner.state().units[SCOTT.0].hp(), 98);
        assert_eq!(runner.state().turn_number, 1);
        assert!(runner.state().units[DUMMY.0].hp() < runner.state().units[DUMMY.0].max_hp());
    }

    #[test]
    fn test_resumed_turn_skips_turn_start_effects() {
        // Arrange: one attempt per try, so the unknown skill fails the turn.
        let config = BattleConfig {
            selection_attempts: 1,
            ..BattleConfig::default()
        };
        let mut runner = ignited_scott(unknown_then_slash(), config);

        // Act
        let first = runner.take_turn(SCOTT);
        let hp_after_first = runner.state().units[SCOTT.0].hp();
        let second = runner.take_turn(SCOTT);

        // Assert
        runner.bus().print_debug_with_message("Events for test_resumed_turn_skips_turn_start_effects:");
        assert!(first.is_err());
        assert_ok(second);
        assert_eq!(hp_after_first, 98);
        assert_eq!(runner.state().units[SCOTT.0].hp(), 98);
        assert_eq!(runner.state().turn_number, 1);
        let ready = runner
            .events()
            .iter()
            .filter(|event| matches!(event, BattleEvent::UnitReady { .. }))
            .count();
        assert_eq!(ready, 1);
    }
}
