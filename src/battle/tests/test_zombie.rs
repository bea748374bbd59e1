#[cfg(test)]
mod tests {
    use crate::battle::menu::MoveSelection;
    use crate::battle::stance::Stance;
    use crate::battle::state::{BattleEvent, BattleState};
    use crate::battle::tests::common::{TestUnitBuilder, assert_ok, perform_move, predictable_rng};
    use crate::battle::unit::UnitId;
    use crate::config::BattleConfig;
    use pretty_assertions::assert_eq;
    use schema::{Item, ItemStock, Skill, Status};

    const KIM: UnitId = UnitId(0);
    const SCOTT: UnitId = UnitId(1);
    const SQUIRREL: UnitId = UnitId(2);

    fn party_with_zombie() -> BattleState {
        let mut scott = TestUnitBuilder::new("scott").with_hp(50).build_as(SCOTT);
        scott.add_status(Status::Zombie);
        BattleState::new(
            vec![
                TestUnitBuilder::new("kim")
                    .with_skills(&[Skill::Heal])
                    .with_items(&[
                        ItemStock {
                            item: Item::HolyWater,
                            uses: 1,
                        },
                        ItemStock {
                            item: Item::Tonic,
                            uses: 1,
                        },
                        ItemStock {
                            item: Item::FullTonic,
                            uses: 1,
                        },
                    ])
                    .build_as(KIM),
                scott,
                TestUnitBuilder::new("squirrel")
                    .enemy()
                    .with_skills(&[Skill::DeathBite])
                    .build_as(SQUIRREL),
            ],
            BattleConfig::default(),
        )
    }

    #[test]
    fn test_healing_spell_hurts_a_zombie() {
        // Arrange
        let mut state = party_with_zombie();
        let mut rng = predictable_rng();

        // Act
        let bus = assert_ok(perform_move(
            &mut state,
            KIM,
            &MoveSelection::skill(Skill::Heal, Stance::Attack, vec![SCOTT]),
            &mut rng,
        ));

        // Assert: 25 power at magic 10 is 25 HP, taken instead of given.
        bus.print_debug_with_message("Events for test_healing_spell_hurts_a_zombie:");
        assert_eq!(state.units[SCOTT.0].hp(), 25);
        assert!(bus.events().contains(&BattleEvent::DamageDealt {
            target: SCOTT,
            amount: 25,
            remaining_hp: 25,
        }));
        assert!(
            !bus.events()
                .iter()
                .any(|event| matches!(event, BattleEvent::Healed { .. }))
        );
    }

    #[test]
    fn test_tonic_hurts_a_zombie_even_through_guard() {
        // Arrange
        let mut state = party_with_zombie();
        state.units[SCOTT.0].set_defending(true);
        let mut rng = predictable_rng();

        // Act
        assert_ok(perform_move(
            &mut state,
            KIM,
            &MoveSelection::item(Item::Tonic, vec![SCOTT]),
            &mut rng,
        ));

        // Assert: half of 100 max HP, inverted and never halved.
        assert_eq!(state.units[SCOTT.0].hp(), 0);
        assert!(!state.units[SCOTT.0].is_alive());
    }

    #[test]
    fn test_full_tonic_leaves_a_zombie_alone() {
        // Arrange
        let mut state = party_with_zombie();
        let mut rng = predictable_rng();

        // Act
        assert_ok(perform_move(
            &mut state,
            KIM,
            &MoveSelection::item(Item::FullTonic, vec![SCOTT]),
            &mut rng,
        ));

        // Assert
        assert_eq!(state.units[SCOTT.0].hp(), 50);
        assert_eq!(state.units[KIM.0].item_uses(Item::FullTonic), 0);
    }

    #[test]
    fn test_holy_water_then_tonic_heals_normally() {
        // Arrange
        let mut state = party_with_zombie();
        let mut rng = predictable_rng();

        // Act
        let cure_bus = assert_ok(perform_move(
            &mut state,
            KIM,
            &MoveSelection::item(Item::HolyWater, vec![SCOTT]),
            &mut rng,
        ));
        assert_ok(perform_move(
            &mut state,
            KIM,
            &MoveSelection::item(Item::Tonic, vec![SCOTT]),
            &mut rng,
        ));

        // Assert
        assert!(cure_bus.events().contains(&BattleEvent::StatusRemoved {
            target: SCOTT,
            status: Status::Zombie
        }));
        assert!(!state.units[SCOTT.0].has_status(Status::Zombie));
        assert_eq!(state.units[SCOTT.0].hp(), 100);
    }

    #[test]
    fn test_death_bite_turns_its_target() {
        // Arrange
        let mut state = party_with_zombie();
        let mut rng = predictable_rng();

        // Act
        let bus = assert_ok(perform_move(
            &mut state,
            SQUIRREL,
            &MoveSelection::skill(Skill::DeathBite, Stance::Attack, vec![KIM]),
            &mut rng,
        ));

        // Assert
        assert!(state.units[KIM.0].has_status(Status::Zombie));
        assert!(bus.events().contains(&BattleEvent::StatusApplied {
            target: KIM,
            status: Status::Zombie
        }));
        assert!(state.units[KIM.0].hp() < state.units[KIM.0].max_hp());
    }
}
