use schema::{AiKind, Enemy, PartyMemberData, Status};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::battle::action_stack::Usable;
use crate::battle::ai::{AiCommand, AiController, AiEvent};
use crate::battle::engine;
use crate::battle::menu::{MenuRequest, MoveMenu, MoveSelection};
use crate::battle::presentation::Presenter;
use crate::battle::rng::BattleRng;
use crate::battle::stance::Stance;
use crate::battle::state::{BattleEvent, BattleOutcome, BattleState, EventBus};
use crate::battle::unit::{BattleUnit, Side, UnitId, UnitTemplate};
use crate::catalog::enemy_data;
use crate::config::BattleConfig;
use crate::errors::{BattleResult, BattleStateError, ConfigError};

/// The participants of one fight: party members from persistent party data,
/// enemies by catalog id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Encounter {
    pub party: Vec<PartyMemberData>,
    pub enemies: Vec<Enemy>,
}

impl Encounter {
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(text)?)
    }

    pub fn from_ron_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_ron_str(&text)
    }

    /// Unit templates in enumeration order: the party first, then enemies.
    pub fn templates(&self) -> Vec<UnitTemplate> {
        self.party
            .iter()
            .map(UnitTemplate::from_party_member)
            .chain(
                self.enemies
                    .iter()
                    .map(|&enemy| UnitTemplate::from_enemy(enemy_data(enemy))),
            )
            .collect()
    }
}

/// High-level battle management: owns the state, the event log, the random
/// source and every input source, and drives the CTB loop.
pub struct BattleRunner {
    state: BattleState,
    bus: EventBus,
    rng: BattleRng,
    /// Indexed by unit id; `None` for units without an AI.
    controllers: Vec<Option<AiController>>,
    menu: Box<dyn MoveMenu>,
    presenter: Box<dyn Presenter>,
}

/// Information about the current battle state for API queries
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BattleInfo {
    pub turn_number: u32,
    pub ticks_elapsed: u64,
    pub outcome: Option<BattleOutcome>,
    pub units: Vec<UnitInfo>,
}

/// Information about a unit for API queries
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UnitInfo {
    pub id: UnitId,
    pub name: String,
    pub side: Side,
    pub hp: u32,
    pub max_hp: u32,
    pub mp: u32,
    pub mp_capacity: u32,
    pub stance: Stance,
    pub counter: u32,
    pub statuses: Vec<Status>,
}

impl UnitInfo {
    fn of(unit: &BattleUnit) -> Self {
        Self {
            id: unit.id,
            name: unit.name.clone(),
            side: unit.side,
            hp: unit.hp(),
            max_hp: unit.max_hp(),
            mp: unit.mp.available(),
            mp_capacity: unit.mp.capacity(),
            stance: unit.stance(),
            counter: unit.counter(),
            statuses: unit.statuses().iter().map(|effect| effect.status).collect(),
        }
    }
}

impl fmt::Display for UnitInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} HP {}/{} MP {}/{}",
            self.name, self.hp, self.max_hp, self.mp, self.mp_capacity
        )?;
        if !self.statuses.is_empty() {
            let names: Vec<String> = self.statuses.iter().map(|status| status.to_string()).collect();
            write!(f, " [{}]", names.join(", "))?;
        }
        Ok(())
    }
}

impl BattleRunner {
    /// Starts a battle, seeding the random source from the config (or the OS
    /// when no seed is set).
    pub fn new(
        templates: Vec<UnitTemplate>,
        config: BattleConfig,
        menu: Box<dyn MoveMenu>,
        presenter: Box<dyn Presenter>,
    ) -> BattleResult<Self> {
        let rng = match config.seed {
            Some(seed) => BattleRng::from_seed(seed),
            None => BattleRng::new_random(),
        };
        Self::with_rng(templates, config, rng, menu, presenter)
    }

    pub fn with_rng(
        templates: Vec<UnitTemplate>,
        config: BattleConfig,
        mut rng: BattleRng,
        menu: Box<dyn MoveMenu>,
        presenter: Box<dyn Presenter>,
    ) -> BattleResult<Self> {
        let units = templates
            .into_iter()
            .enumerate()
            .map(|(index, template)| BattleUnit::new(UnitId(index), template))
            .collect();
        let mut state = BattleState::new(units, config);
        let mut bus = EventBus::new();
        engine::initialize_battle(&mut state, &mut bus)?;

        let controllers = state
            .units
            .iter()
            .map(|unit| Self::controller_for(unit, &mut rng))
            .collect();

        let mut runner = Self {
            state,
            bus,
            rng,
            controllers,
            menu,
            presenter,
        };
        runner.refresh_phases()?;
        Ok(runner)
    }

    /// Enemies from the catalog get the AI their class is bound to; ad-hoc
    /// enemies get the scoring AI with their first skill as the default.
    fn controller_for(unit: &BattleUnit, rng: &mut BattleRng) -> Option<AiController> {
        if unit.side != Side::Enemy {
            return None;
        }
        match unit.enemy {
            Some(enemy) => {
                let data = enemy_data(enemy);
                Some(AiController::for_kind(data.ai, unit, data.default_skill, rng))
            }
            None => unit
                .skills()
                .first()
                .map(|slot| AiController::for_kind(AiKind::Scoring, unit, slot.skill, rng)),
        }
    }

    // --- Queries ---

    pub fn state(&self) -> &BattleState {
        &self.state
    }

    #[cfg(test)]
    pub(crate) fn state_mut(&mut self) -> &mut BattleState {
        &mut self.state
    }

    pub fn events(&self) -> &[BattleEvent] {
        self.bus.events()
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn controller(&self, unit: UnitId) -> Option<&AiController> {
        self.controllers.get(unit.0).and_then(Option::as_ref)
    }

    pub fn outcome(&self) -> Option<BattleOutcome> {
        self.state.outcome
    }

    /// Get current battle information for API queries
    pub fn info(&self) -> BattleInfo {
        BattleInfo {
            turn_number: self.state.turn_number,
            ticks_elapsed: self.state.ticks_elapsed,
            outcome: self.state.outcome,
            units: self.state.units.iter().map(UnitInfo::of).collect(),
        }
    }

    // --- The CTB loop ---

    /// Advances time by one tick. Living units count down in enumeration
    /// order; a unit that reaches zero takes its turn right away, with the
    /// rest of the timeline frozen until it is done. Returns who acted.
    pub fn tick(&mut self) -> BattleResult<Vec<UnitId>> {
        if self.state.is_over() {
            return Err(BattleStateError::BattleOver.into());
        }
        self.state.ticks_elapsed += 1;

        let mut acted = Vec::new();
        for index in 0..self.state.units.len() {
            if self.state.is_over() {
                break;
            }
            let unit = &mut self.state.units[index];
            if !unit.is_alive() || !unit.tick() {
                continue;
            }
            let id = unit.id;
            self.take_turn(id)?;
            acted.push(id);
        }
        Ok(acted)
    }

    /// Ticks until at least one unit has acted or the battle is over.
    pub fn advance(&mut self) -> BattleResult<Vec<UnitId>> {
        let limit = self.state.config.max_ticks;
        loop {
            if self.state.ticks_elapsed >= limit {
                return Err(BattleStateError::InconsistentState(format!(
                    "no outcome after {} ticks",
                    limit
                ))
                .into());
            }
            let acted = self.tick()?;
            if !acted.is_empty() || self.state.is_over() {
                return Ok(acted);
            }
        }
    }

    /// Runs the battle to its end.
    pub fn run(&mut self) -> BattleResult<BattleOutcome> {
        while self.state.outcome.is_none() {
            self.advance()?;
        }
        self.state
            .outcome
            .ok_or_else(|| BattleStateError::InconsistentState("battle ended without an outcome".into()).into())
    }

    /// Resolves one turn for `id`. The menu is re-asked after an illegal
    /// selection; if it never offers a legal one the error is returned with
    /// the turn left open, and the next attempt resumes it without repeating
    /// the turn-start effects.
    pub fn take_turn(&mut self, id: UnitId) -> BattleResult<()> {
        let resumed = self.state.try_unit(id)?.is_turn_open();
        let alive = engine::start_turn(&mut self.state, &mut self.bus, &mut self.rng, id)?;
        let result = if alive { self.act(id, resumed) } else { Ok(()) };
        if result.is_ok() {
            self.state.try_unit_mut(id)?.set_turn_open(false);
        }
        let refreshed = result.as_ref().map_or(Ok(()), |_| self.refresh_phases());
        engine::finish_turn(&mut self.state, &mut self.bus);
        result.and(refreshed)
    }

    fn act(&mut self, id: UnitId, resumed: bool) -> BattleResult<()> {
        if !resumed {
            self.broadcast(&AiEvent::UnitReady { unit: id })?;
        }

        let pending = self.state.try_unit_mut(id)?.next_queued_action();
        let action = match pending {
            Some(action) => action,
            None => {
                let previous_stance = self.state.try_unit(id)?.stance();
                let selection = self.select_move(id)?;
                engine::commit_selection(&mut self.state, &mut self.bus, id, &selection)?;
                self.announce_selection(id, &selection, previous_stance)?;
                self.state
                    .try_unit_mut(id)?
                    .next_queued_action()
                    .ok_or_else(|| {
                        BattleStateError::InconsistentState(format!("{} committed a move with no steps", id))
                    })?
            }
        };

        let rank = action.step.rank(&self.state.config);
        engine::execute_step(
            &mut self.state,
            &mut self.bus,
            &mut self.rng,
            self.presenter.as_mut(),
            id,
            &action,
        )?;
        engine::reschedule(&mut self.state, &mut self.bus, id, rank)
    }

    /// Asks the unit's input source for a move: its AI controller if it has
    /// one, the menu for party members. Enemies without an AI guard. Counter
    /// stance is only offered while the provoker is still standing.
    fn select_move(&mut self, id: UnitId) -> BattleResult<MoveSelection> {
        let unit = self.state.try_unit(id)?;
        let side = unit.side;
        let counter_target = unit
            .counter_target()
            .filter(|&target| self.state.unit(target).is_some_and(|foe| foe.is_alive()));

        if let Some(mut controller) = self.controllers.get_mut(id.0).and_then(Option::take) {
            let mut commands = Vec::new();
            let decision = controller.next_selection(&self.state, &mut self.rng, &mut commands);
            self.controllers[id.0] = Some(controller);
            self.apply_ai_commands(commands)?;
            if let Some(skill) = decision.fallback {
                self.bus.push(BattleEvent::AiFallback { unit: id, skill });
            }
            return Ok(decision.selection);
        }
        if side == Side::Enemy {
            return Ok(MoveSelection::guard(id));
        }

        let request = MenuRequest {
            unit: id,
            stance: if counter_target.is_some() {
                Stance::Counter
            } else {
                Stance::Attack
            },
            counter_target,
        };
        let attempts = self.state.config.selection_attempts.max(1);
        let mut attempt = 1;
        loop {
            let selection = self.menu.choose(&self.state, &request);
            match engine::validate_selection(&self.state, id, &selection) {
                Ok(selection) => return Ok(selection),
                Err(err) => {
                    warn!(unit = %id, %err, attempt, "illegal selection");
                    self.bus.push(BattleEvent::SelectionRejected {
                        unit: id,
                        reason: err.to_string(),
                    });
                    if attempt >= attempts {
                        return Err(err.into());
                    }
                    attempt += 1;
                }
            }
        }
    }

    /// Tells every controller what was just chosen.
    fn announce_selection(
        &mut self,
        id: UnitId,
        selection: &MoveSelection,
        previous_stance: Stance,
    ) -> BattleResult<()> {
        if selection.stance != previous_stance {
            self.broadcast(&AiEvent::StanceChanged {
                unit: id,
                stance: selection.stance,
            })?;
        }
        match selection.usable {
            Some(Usable::Skill(skill)) if selection.stance != Stance::Guard => {
                self.broadcast(&AiEvent::SkillUsed {
                    user: id,
                    skill,
                    stance: selection.stance,
                    targets: selection.targets.clone(),
                })
            }
            Some(Usable::Item(item)) if selection.stance != Stance::Guard => {
                self.broadcast(&AiEvent::ItemUsed {
                    user: id,
                    item,
                    targets: selection.targets.clone(),
                })
            }
            _ => Ok(()),
        }
    }

    // --- AI plumbing ---

    fn broadcast(&mut self, event: &AiEvent) -> BattleResult<()> {
        let mut commands = Vec::new();
        for controller in self.controllers.iter_mut().flatten() {
            let listening = self
                .state
                .unit(controller.unit())
                .is_some_and(|unit| unit.is_alive());
            if listening {
                controller.notify(event, &self.state, &mut self.rng, &mut commands);
            }
        }
        self.apply_ai_commands(commands)
    }

    fn refresh_phases(&mut self) -> BattleResult<()> {
        let mut commands = Vec::new();
        for controller in self.controllers.iter_mut().flatten() {
            let alive = self
                .state
                .unit(controller.unit())
                .is_some_and(|unit| unit.is_alive());
            if !alive {
                continue;
            }
            if let Some((phase, last_phase)) =
                controller.refresh_phase(&self.state, &mut self.rng, &mut commands)
            {
                self.bus.push(BattleEvent::PhaseChanged {
                    unit: controller.unit(),
                    phase,
                    last_phase,
                });
            }
        }
        self.apply_ai_commands(commands)
    }

    fn apply_ai_commands(&mut self, commands: Vec<AiCommand>) -> BattleResult<()> {
        for command in commands {
            debug!(?command, "applying ai command");
            match command {
                AiCommand::AddStatus { unit, status } => {
                    engine::apply_ai_status(&mut self.state, &mut self.bus, unit, status)?
                }
                AiCommand::Play(cue) => self.presenter.play(&cue),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::menu::ScriptedMenu;
    use crate::battle::presentation::NullPresenter;
    use crate::battle::tests::common::{predictable_rng, TestUnitBuilder};
    use pretty_assertions::assert_eq;
    use schema::Skill;

    const ENCOUNTER: &str = r#"(
        party: [
            (
                key: "scott",
                name: "Scott",
                level: 50,
                base_stats: (vitality: 50, attack: 50, defense: 40, focus: 40, magic: 30, speed: 50),
                weapon: Some((name: "Bronze Sword", weapon_type: Sword, level: 0)),
                skills: [SwordSlash, Quickstrike],
            ),
        ],
        enemies: [Lumisquirrel, HeadlessHorse],
    )"#;

    #[test]
    fn test_encounter_lists_party_before_enemies() {
        let encounter = Encounter::from_ron_str(ENCOUNTER).unwrap();

        let templates = encounter.templates();

        let keys: Vec<&str> = templates.iter().map(|template| template.key.as_str()).collect();
        assert_eq!(keys, vec!["scott", "lumisquirrel", "headlessHorse"]);
        assert_eq!(templates[1].side, Side::Enemy);
    }

    #[test]
    fn test_catalog_enemies_get_their_bound_ai() {
        let encounter = Encounter::from_ron_str(ENCOUNTER).unwrap();
        let runner = BattleRunner::with_rng(
            encounter.templates(),
            BattleConfig::default(),
            BattleRng::new_for_test(vec![0.0; 8]),
            Box::new(ScriptedMenu::default()),
            Box::new(NullPresenter),
        )
        .unwrap();

        assert!(runner.controller(UnitId(0)).is_none());
        assert!(matches!(
            runner.controller(UnitId(1)).map(|controller| &controller.brain),
            Some(crate::battle::ai::AiBrain::Lumisquirrel(_))
        ));
        assert!(matches!(
            runner.controller(UnitId(2)).map(|controller| &controller.brain),
            Some(crate::battle::ai::AiBrain::Scoring(_))
        ));
    }

    fn runner_with_menu(selections: Vec<MoveSelection>, config: BattleConfig) -> BattleRunner {
        let units = vec![
            TestUnitBuilder::new("scott").with_skills(&[Skill::SwordSlash]).template(),
            TestUnitBuilder::new("dummy").enemy().template(),
        ];
        BattleRunner::with_rng(
            units,
            config,
            predictable_rng(),
            Box::new(ScriptedMenu::new(selections)),
            Box::new(NullPresenter),
        )
        .unwrap()
    }

    #[test]
    fn test_illegal_menu_choice_is_asked_again() {
        let mut runner = runner_with_menu(
            vec![
                MoveSelection::skill(Skill::Omni, Stance::Attack, vec![UnitId(1)]),
                MoveSelection::skill(Skill::SwordSlash, Stance::Attack, vec![UnitId(1)]),
            ],
            BattleConfig::default(),
        );

        runner.take_turn(UnitId(0)).unwrap();

        assert!(runner
            .events()
            .iter()
            .any(|event| matches!(event, BattleEvent::SelectionRejected { unit, .. } if *unit == UnitId(0))));
        assert!(runner.events().contains(&BattleEvent::MoveSelected {
            unit: UnitId(0),
            usable: Some(Usable::Skill(Skill::SwordSlash)),
            stance: Stance::Attack,
            targets: vec![UnitId(1)],
        }));
        assert_eq!(runner.state().turn_number, 1);
        assert_eq!(runner.state().current_actor, None);
        assert!(!runner.state().units[0].is_turn_open());
    }

    #[test]
    fn test_exhausted_menu_leaves_the_turn_open() {
        let config = BattleConfig {
            selection_attempts: 1,
            ..BattleConfig::default()
        };
        let mut runner = runner_with_menu(
            vec![MoveSelection::skill(Skill::Omni, Stance::Attack, vec![UnitId(1)])],
            config,
        );

        let result = runner.take_turn(UnitId(0));

        assert!(matches!(result, Err(crate::errors::BattleEngineError::Selection(_))));
        assert_eq!(runner.state().current_actor, None);
        assert!(runner.state().units[0].is_turn_open());

        // The script is spent, so the resumed turn guards.
        runner.take_turn(UnitId(0)).unwrap();

        assert_eq!(runner.state().turn_number, 1);
        assert!(!runner.state().units[0].is_turn_open());
        assert!(runner.state().units[0].is_defending());
        let ready = runner
            .events()
            .iter()
            .filter(|event| matches!(event, BattleEvent::UnitReady { .. }))
            .count();
        assert_eq!(ready, 1);
    }
}
