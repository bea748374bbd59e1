use schema::{BaseStats, Enemy, ItemStock, Skill, WeaponData, WeaponType};
use std::cell::RefCell;
use std::rc::Rc;

use crate::battle::engine::{commit_selection, execute_step, validate_selection};
use crate::battle::menu::{MoveSelection, ScriptedMenu};
use crate::battle::presentation::{Cue, NullPresenter, Presenter};
use crate::battle::rng::BattleRng;
use crate::battle::runner::BattleRunner;
use crate::battle::state::{BattleState, EventBus};
use crate::battle::unit::{BattleUnit, Side, UnitId, UnitTemplate};
use crate::catalog::enemy_data;
use crate::config::BattleConfig;
use crate::errors::BattleResult;

/// A builder for test units with round numbers.
///
/// Defaults: every stat 10, level 50, tier 1 (100 HP, 50 MP), a level-0
/// sword, no skills and no items.
///
/// # Example
/// ```ignore
/// let unit = TestUnitBuilder::new("scott")
///     .with_skills(&[Skill::Quickstrike])
///     .with_hp(40)
///     .build_as(UnitId(0));
/// ```
pub struct TestUnitBuilder {
    template: UnitTemplate,
    current_hp: Option<u32>,
}

impl TestUnitBuilder {
    /// A party member keyed (and named) `key`.
    pub fn new(key: &str) -> Self {
        Self {
            template: UnitTemplate {
                key: key.to_string(),
                name: key.to_string(),
                side: Side::Party,
                enemy: None,
                level: 50,
                tier: 1,
                stats: BaseStats {
                    vitality: 10,
                    attack: 10,
                    defense: 10,
                    focus: 10,
                    magic: 10,
                    speed: 10,
                },
                weapon: Some(sword(0)),
                skills: Vec::new(),
                items: Vec::new(),
            },
            current_hp: None,
        }
    }

    /// A unit built from the enemy catalog, stats and all.
    pub fn from_enemy(enemy: Enemy) -> Self {
        Self {
            template: UnitTemplate::from_enemy(enemy_data(enemy)),
            current_hp: None,
        }
    }

    /// Moves the unit to the enemy side.
    pub fn enemy(mut self) -> Self {
        self.template.side = Side::Enemy;
        self
    }

    /// Sets vitality so a tier-1 unit ends up with `hp` max HP.
    pub fn with_max_hp(mut self, hp: u32) -> Self {
        self.template.stats.vitality = hp / (10 * self.template.tier);
        self
    }

    /// Starts the unit below full health.
    pub fn with_hp(mut self, hp: u32) -> Self {
        self.current_hp = Some(hp);
        self
    }

    pub fn with_speed(mut self, speed: u32) -> Self {
        self.template.stats.speed = speed;
        self
    }

    pub fn with_defense(mut self, defense: u32) -> Self {
        self.template.stats.defense = defense;
        self
    }

    /// Changes the level without rescaling stats.
    pub fn with_level(mut self, level: u32) -> Self {
        self.template.level = level;
        self
    }

    pub fn with_weapon(mut self, weapon: WeaponData) -> Self {
        self.template.weapon = Some(weapon);
        self
    }

    pub fn with_skills(mut self, skills: &[Skill]) -> Self {
        self.template.skills = skills.to_vec();
        self
    }

    pub fn with_items(mut self, items: &[ItemStock]) -> Self {
        self.template.items = items.to_vec();
        self
    }

    /// The template alone, for battles that number their own units.
    pub fn template(self) -> UnitTemplate {
        self.template
    }

    pub fn build(self) -> BattleUnit {
        self.build_as(UnitId(0))
    }

    pub fn build_as(self, id: UnitId) -> BattleUnit {
        let mut unit = BattleUnit::new(id, self.template);
        if let Some(hp) = self.current_hp {
            let missing = unit.max_hp().saturating_sub(hp) as i32;
            unit.take_damage(missing, &[], true);
        }
        unit
    }
}

pub fn sword(level: u32) -> WeaponData {
    WeaponData {
        name: "Test Sword".to_string(),
        weapon_type: WeaponType::Sword,
        level,
    }
}

pub fn gun(level: u32) -> WeaponData {
    WeaponData {
        name: "Test Gun".to_string(),
        weapon_type: WeaponType::Gun,
        level,
    }
}

/// A `BattleRng` with a long run of 0.5 rolls. Damage lands on its base
/// value and any chance of one half or less fails.
pub fn predictable_rng() -> BattleRng {
    BattleRng::new_for_test(vec![0.5; 200])
}

/// Records every cue it is asked to play. Clones share one log, so a test can
/// keep a handle after giving the presenter to a battle.
#[derive(Debug, Clone, Default)]
pub struct RecordingPresenter {
    cues: Rc<RefCell<Vec<Cue>>>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cues(&self) -> Vec<Cue> {
        self.cues.borrow().clone()
    }

    pub fn dialogue(&self) -> Vec<String> {
        self.cues
            .borrow()
            .iter()
            .filter_map(|cue| match cue {
                Cue::Dialogue { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }
}

impl Presenter for RecordingPresenter {
    fn play(&mut self, cue: &Cue) {
        self.cues.borrow_mut().push(cue.clone());
    }
}

/// Creates a battle driven by a scripted menu and scripted rolls. Returns the
/// presenter handle alongside it.
pub fn create_test_battle(
    units: Vec<UnitTemplate>,
    selections: Vec<MoveSelection>,
    rng: BattleRng,
) -> BattleResult<(BattleRunner, RecordingPresenter)> {
    let presenter = RecordingPresenter::new();
    let runner = BattleRunner::with_rng(
        units,
        BattleConfig::default(),
        rng,
        Box::new(ScriptedMenu::new(selections)),
        Box::new(presenter.clone()),
    )?;
    Ok((runner, presenter))
}

/// Validates and commits `selection` for `id`, then runs every step it
/// expands to back to back without consulting the timeline.
pub fn perform_move(
    state: &mut BattleState,
    id: UnitId,
    selection: &MoveSelection,
    rng: &mut BattleRng,
) -> BattleResult<EventBus> {
    let mut bus = EventBus::new();
    let selection = validate_selection(state, id, selection)?;
    commit_selection(state, &mut bus, id, &selection)?;
    while let Some(action) = state.try_unit_mut(id)?.next_queued_action() {
        execute_step(state, &mut bus, rng, &mut NullPresenter, id, &action)?;
    }
    Ok(bus)
}

/// Helper function to assert that a Result is Ok and return the value.
/// Provides clear error messages in tests when functions unexpectedly fail.
pub fn assert_ok<T>(result: BattleResult<T>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => panic!("Expected Ok but got error: {}", err),
    }
}
