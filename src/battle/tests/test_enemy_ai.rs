#[cfg(test)]
mod tests {
    use crate::battle::action_stack::Usable;
    use crate::battle::ai::lumisquirrel::SquirrelStrategy;
    use crate::battle::ai::{AiBrain, AiController};
    use crate::battle::runner::BattleRunner;
    use crate::battle::stance::Stance;
    use crate::battle::state::{BattleEvent, BattleOutcome};
    use crate::battle::tests::common::{
        TestUnitBuilder, assert_ok, create_test_battle, predictable_rng,
    };
    use crate::battle::unit::UnitId;
    use pretty_assertions::assert_eq;
    use schema::{Enemy, Skill, Status};

    const SCOTT: UnitId = UnitId(0);
    const ENEMY: UnitId = UnitId(1);

    fn battle_against(enemy: Enemy) -> BattleRunner {
        let units = vec![
            TestUnitBuilder::new("scott")
                .with_skills(&[Skill::SwordSlash])
                .template(),
            TestUnitBuilder::from_enemy(enemy).template(),
        ];
        let (runner, _) = assert_ok(create_test_battle(units, Vec::new(), predictable_rng()));
        runner
    }

    fn controller(runner: &BattleRunner) -> &AiController {
        runner
            .controller(ENEMY)
            .unwrap_or_else(|| panic!("{} should have a controller", ENEMY))
    }

    fn selections_by(runner: &BattleRunner, unit: UnitId) -> Vec<(Option<Usable>, Vec<UnitId>)> {
        runner
            .events()
            .iter()
            .filter_map(|event| match event {
                BattleEvent::MoveSelected {
                    unit: who,
                    usable,
                    targets,
                    ..
                } if *who == unit => Some((*usable, targets.clone())),
                _ => None,
            })
            .collect()
    }

    // --- Robert ---

    #[test]
    fn test_robert_enters_phase_one_at_battle_start() {
        // Arrange & Act
        let runner = battle_against(Enemy::Robert2);

        // Assert
        runner.bus().print_debug_with_message("Events for test_robert_enters_phase_one_at_battle_start:");
        assert!(runner.events().contains(&BattleEvent::PhaseChanged {
            unit: ENEMY,
            phase: 1,
            last_phase: 0
        }));
        let controller = controller(&runner);
        assert_eq!(controller.phase(), 1);
        let AiBrain::Robert(robert) = &controller.brain else {
            panic!("expected Robert's brain, got {:?}", controller.brain);
        };
        assert!(!robert.is_combo_started());
        assert!(robert.is_necromancy_pending());
        assert_eq!(
            controller
                .cpu
                .planned_moves()
                .map(|planned| planned.usable)
                .collect::<Vec<_>>(),
            vec![Usable::Skill(Skill::Omni)]
        );
    }

    #[test]
    fn test_robert_opens_with_omni() {
        // Arrange
        let mut runner = battle_against(Enemy::Robert2);

        // Act: speed 60 readies Robert long before scott.
        let acted = assert_ok(runner.advance());

        // Assert
        runner.bus().print_debug_with_message("Events for test_robert_opens_with_omni:");
        assert_eq!(acted, vec![ENEMY]);
        assert_eq!(
            selections_by(&runner, ENEMY),
            vec![(Some(Usable::Skill(Skill::Omni)), vec![SCOTT])]
        );
        assert!(runner.state().units[ENEMY.0].has_status(Status::Winded));
        assert_eq!(runner.outcome(), Some(BattleOutcome::Defeat));
        assert!(
            !runner
                .events()
                .iter()
                .any(|event| matches!(event, BattleEvent::AiFallback { .. }))
        );
    }

    // --- Lumisquirrel ---

    #[test]
    fn test_lumisquirrel_deludes_its_only_target() {
        // Arrange: a roll of one half picks the second strategy.
        let mut runner = battle_against(Enemy::Lumisquirrel);
        let AiBrain::Lumisquirrel(squirrel) = &controller(&runner).brain else {
            panic!("expected the squirrel's brain");
        };
        assert_eq!(squirrel.strategy(), SquirrelStrategy::Delude);

        // Act
        let acted = assert_ok(runner.advance());

        // Assert
        assert_eq!(acted, vec![ENEMY]);
        assert_eq!(
            selections_by(&runner, ENEMY),
            vec![(Some(Usable::Skill(Skill::Delusion)), vec![SCOTT])]
        );
        assert!(runner.state().units[SCOTT.0].has_status(Status::Delusion));
        let AiBrain::Lumisquirrel(squirrel) = &controller(&runner).brain else {
            panic!("expected the squirrel's brain");
        };
        assert_eq!(squirrel.target(), Some(SCOTT));
    }

    // --- Scoring ---

    #[test]
    fn test_headless_horse_attacks_the_party() {
        // Arrange
        let mut runner = battle_against(Enemy::HeadlessHorse);
        assert!(matches!(controller(&runner).brain, AiBrain::Scoring(_)));

        // Act
        let acted = assert_ok(runner.advance());

        // Assert
        runner.bus().print_debug_with_message("Events for test_headless_horse_attacks_the_party:");
        assert_eq!(acted, vec![ENEMY]);
        let chosen = selections_by(&runner, ENEMY);
        assert_eq!(chosen.len(), 1);
        let (usable, targets) = &chosen[0];
        assert!(matches!(usable, Some(Usable::Skill(_))));
        assert_eq!(targets, &vec![SCOTT]);
    }

    #[test]
    fn test_enemy_without_skills_guards() {
        // Arrange
        let units = vec![
            TestUnitBuilder::new("scott").template(),
            TestUnitBuilder::new("dummy").enemy().with_speed(20).template(),
        ];
        let (mut runner, _) = assert_ok(create_test_battle(units, Vec::new(), predictable_rng()));

        // Act
        assert_eq!(assert_ok(runner.advance()), vec![ENEMY]);

        // Assert
        assert!(runner.controller(ENEMY).is_none());
        let dummy = &runner.state().units[ENEMY.0];
        assert_eq!(dummy.stance(), Stance::Guard);
        assert!(dummy.is_defending());
    }
}
