//! Enemy controllers.
//!
//! Every enemy unit owns an `AiController`: a `CpuBattler` holding the shared
//! bookkeeping (HP phases, planned moves, default skill) and an `AiBrain`
//! with the per-archetype behavior. Brains only plan; they read the battle
//! through `AiContext` and never mutate units directly. Anything that has to
//! touch the battle (a status on their own unit, a line of dialogue) goes out
//! as an `AiCommand` for the engine to apply.

pub mod lumisquirrel;
pub mod robert;
pub mod scoring;

use schema::{AiKind, Item, Skill, Status};
use std::collections::VecDeque;
use tracing::{debug, warn};

use crate::battle::action_stack::Usable;
use crate::battle::menu::MoveSelection;
use crate::battle::presentation::Cue;
use crate::battle::rng::BattleRng;
use crate::battle::scheduler::{next_up, predict_turns, TurnForecast};
use crate::battle::stance::Stance;
use crate::battle::state::BattleState;
use crate::battle::targeting::{default_targets, legal_targets, TargetRules};
use crate::battle::unit::{BattleUnit, UnitId};

use self::lumisquirrel::LumisquirrelAi;
use self::robert::RobertAi;
use self::scoring::ScoringAi;

/// A move an AI has planned but not yet submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AiMove {
    pub usable: Usable,
    pub stance: Stance,
    /// `None` lets the engine pick the default target for the usable.
    pub target: Option<UnitId>,
}

/// Side effects an AI asks the engine to carry out once its hook returns.
#[derive(Debug, Clone, PartialEq)]
pub enum AiCommand {
    AddStatus { unit: UnitId, status: Status },
    Play(Cue),
}

/// Something an AI can react to. Every controller hears about every unit,
/// not just its own.
#[derive(Debug, Clone, PartialEq)]
pub enum AiEvent {
    UnitReady {
        unit: UnitId,
    },
    SkillUsed {
        user: UnitId,
        skill: Skill,
        stance: Stance,
        targets: Vec<UnitId>,
    },
    ItemUsed {
        user: UnitId,
        item: Item,
        targets: Vec<UnitId>,
    },
    StanceChanged {
        unit: UnitId,
        stance: Stance,
    },
}

// --- Phase tracking ---

/// HP-driven phases. Thresholds are absolute HP values in descending order;
/// phase `n + 1` begins once HP is at or below the `n`th threshold. Phases
/// only ever move forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseTracker {
    thresholds: Vec<u32>,
    phase: u32,
}

impl PhaseTracker {
    pub fn new(thresholds: Vec<u32>) -> Self {
        Self {
            thresholds,
            phase: 0,
        }
    }

    /// Thresholds at `percentages` of `max_hp`, each nudged by up to
    /// `jitter_permille` of `max_hp` either way so fights don't turn on the
    /// exact same HP every time.
    pub fn jittered(
        percentages: &[u32],
        max_hp: u32,
        jitter_permille: u32,
        rng: &mut BattleRng,
    ) -> Self {
        let jitter = (max_hp * jitter_permille / 1000) as i32;
        let thresholds = percentages
            .iter()
            .map(|&percent| {
                let base = (max_hp * percent / 100) as i32;
                let offset = rng.range_inclusive(-jitter, jitter, "Phase Threshold Jitter");
                (base + offset).max(0) as u32
            })
            .collect();
        Self::new(thresholds)
    }

    /// 0 until the first update.
    pub fn phase(&self) -> u32 {
        self.phase
    }

    pub fn thresholds(&self) -> &[u32] {
        &self.thresholds
    }

    pub fn phase_for(&self, hp: u32) -> u32 {
        1 + self.thresholds.iter().filter(|&&threshold| hp <= threshold).count() as u32
    }

    /// Moves to the phase for `hp` if it is later than the current one and
    /// returns `(new, last)`.
    pub fn update(&mut self, hp: u32) -> Option<(u32, u32)> {
        let candidate = self.phase_for(hp);
        if candidate <= self.phase {
            return None;
        }
        let last = self.phase;
        self.phase = candidate;
        Some((candidate, last))
    }
}

// --- Shared battler state ---

#[derive(Debug, Clone)]
pub struct CpuBattler {
    pub unit: UnitId,
    pub phases: PhaseTracker,
    pub default_skill: Skill,
    moves: VecDeque<AiMove>,
}

impl CpuBattler {
    pub fn new(unit: UnitId, phases: PhaseTracker, default_skill: Skill) -> Self {
        Self {
            unit,
            phases,
            default_skill,
            moves: VecDeque::new(),
        }
    }

    pub fn planned_moves(&self) -> impl Iterator<Item = &AiMove> {
        self.moves.iter()
    }

    fn next_move(&mut self) -> Option<AiMove> {
        self.moves.pop_front()
    }
}

/// A brain's window onto the battle while one of its hooks runs.
pub struct AiContext<'a> {
    pub state: &'a BattleState,
    pub cpu: &'a mut CpuBattler,
    pub rng: &'a mut BattleRng,
    commands: &'a mut Vec<AiCommand>,
}

impl<'a> AiContext<'a> {
    pub fn new(
        state: &'a BattleState,
        cpu: &'a mut CpuBattler,
        rng: &'a mut BattleRng,
        commands: &'a mut Vec<AiCommand>,
    ) -> Self {
        Self {
            state,
            cpu,
            rng,
            commands,
        }
    }

    pub fn unit_id(&self) -> UnitId {
        self.cpu.unit
    }

    pub fn me(&self) -> Option<&'a BattleUnit> {
        self.state.unit(self.cpu.unit)
    }

    pub fn phase(&self) -> u32 {
        self.cpu.phases.phase()
    }

    pub fn has_status(&self, status: Status) -> bool {
        self.me().is_some_and(|unit| unit.has_status(status))
    }

    pub fn mp_available(&self) -> u32 {
        self.me().map_or(0, |unit| unit.mp.available())
    }

    pub fn mp_capacity(&self) -> u32 {
        self.me().map_or(0, |unit| unit.mp.capacity())
    }

    pub fn find_unit(&self, key: &str) -> Option<UnitId> {
        self.state.find_by_key(key)
    }

    // Planning

    pub fn queue_skill(&mut self, skill: Skill) {
        self.queue_skill_with(skill, Stance::Attack, None);
    }

    pub fn queue_skill_with(&mut self, skill: Skill, stance: Stance, target: Option<UnitId>) {
        debug!(unit = %self.cpu.unit, %skill, ?stance, "ai queued skill");
        self.cpu.moves.push_back(AiMove {
            usable: Usable::Skill(skill),
            stance,
            target,
        });
    }

    pub fn queue_item(&mut self, item: Item) {
        self.queue_item_on(item, None);
    }

    pub fn queue_item_on(&mut self, item: Item, target: Option<UnitId>) {
        debug!(unit = %self.cpu.unit, %item, "ai queued item");
        self.cpu.moves.push_back(AiMove {
            usable: Usable::Item(item),
            stance: Stance::Attack,
            target,
        });
    }

    pub fn is_skill_queued(&self, skill: Skill) -> bool {
        self.cpu
            .moves
            .iter()
            .any(|planned| planned.usable == Usable::Skill(skill))
    }

    pub fn has_moves_queued(&self) -> bool {
        !self.cpu.moves.is_empty()
    }

    pub fn is_skill_usable(&self, skill: Skill) -> bool {
        self.me()
            .is_some_and(|unit| unit.is_skill_usable(skill, Stance::Attack))
    }

    pub fn is_item_usable(&self, item: Item) -> bool {
        self.me().is_some_and(|unit| unit.is_item_usable(item))
    }

    // Forecasting

    pub fn predict_skill_turns(&self, skill: Skill, stance: Stance) -> Vec<TurnForecast> {
        predict_turns(
            self.state,
            self.cpu.unit,
            &Usable::Skill(skill).ranks(stance),
        )
    }

    pub fn predict_item_turns(&self, item: Item) -> Vec<TurnForecast> {
        predict_turns(self.state, self.cpu.unit, &Usable::Item(item).ranks(Stance::Attack))
    }

    /// True when this unit's next turn would come before anyone else's if it
    /// used `skill` now.
    pub fn acts_next_after_skill(&self, skill: Skill) -> bool {
        next_up(&self.predict_skill_turns(skill, Stance::Attack)) == Some(self.cpu.unit)
    }

    pub fn acts_next_after_item(&self, item: Item) -> bool {
        next_up(&self.predict_item_turns(item)) == Some(self.cpu.unit)
    }

    // Randomness

    pub fn chance(&mut self, probability: f64, reason: &str) -> bool {
        self.rng.chance(probability, reason)
    }

    pub fn sample<T: Copy>(&mut self, items: &[T], reason: &str) -> Option<T> {
        self.rng.sample(items, reason).copied()
    }

    // Requests for the engine

    pub fn add_status_to_self(&mut self, status: Status) {
        self.commands.push(AiCommand::AddStatus {
            unit: self.cpu.unit,
            status,
        });
    }

    pub fn talk(&mut self, speaker: &str, text: &str) {
        self.commands.push(AiCommand::Play(Cue::Dialogue {
            speaker: speaker.to_string(),
            text: text.to_string(),
        }));
    }
}

// --- Brains ---

/// Per-archetype enemy behavior. `strategize` runs when the unit is ready
/// with nothing planned; the hooks default to doing nothing.
pub trait BattleAi {
    fn strategize(&mut self, cx: &mut AiContext<'_>);

    fn on_phase_changed(&mut self, _cx: &mut AiContext<'_>, _new_phase: u32, _last_phase: u32) {}

    fn on_unit_ready(&mut self, _cx: &mut AiContext<'_>, _unit: UnitId) {}

    fn on_skill_used(
        &mut self,
        _cx: &mut AiContext<'_>,
        _user: UnitId,
        _skill: Skill,
        _stance: Stance,
        _targets: &[UnitId],
    ) {
    }

    fn on_item_used(&mut self, _cx: &mut AiContext<'_>, _user: UnitId, _item: Item, _targets: &[UnitId]) {}

    fn on_stance_changed(&mut self, _cx: &mut AiContext<'_>, _unit: UnitId, _stance: Stance) {}
}

#[derive(Debug, Clone)]
pub enum AiBrain {
    Robert(RobertAi),
    Lumisquirrel(LumisquirrelAi),
    Scoring(ScoringAi),
}

impl AiBrain {
    fn as_ai(&mut self) -> &mut dyn BattleAi {
        match self {
            AiBrain::Robert(ai) => ai,
            AiBrain::Lumisquirrel(ai) => ai,
            AiBrain::Scoring(ai) => ai,
        }
    }
}

/// Robert's phase boundaries, as percentages of max HP.
const ROBERT_PHASES: [u32; 4] = [90, 60, 30, 10];
const ROBERT_PHASE_JITTER_PERMILLE: u32 = 5;

/// The engine's result of asking a controller for a move.
#[derive(Debug, Clone, PartialEq)]
pub struct AiDecision {
    pub selection: MoveSelection,
    /// Set when the planned move was unusable and the default skill stood in.
    pub fallback: Option<Skill>,
}

#[derive(Debug, Clone)]
pub struct AiController {
    pub cpu: CpuBattler,
    pub brain: AiBrain,
}

impl AiController {
    pub fn new(cpu: CpuBattler, brain: AiBrain) -> Self {
        Self { cpu, brain }
    }

    /// Builds the controller an enemy class is bound to.
    pub fn for_kind(
        kind: AiKind,
        unit: &BattleUnit,
        default_skill: Skill,
        rng: &mut BattleRng,
    ) -> Self {
        match kind {
            AiKind::Robert => {
                let phases = PhaseTracker::jittered(
                    &ROBERT_PHASES,
                    unit.max_hp(),
                    ROBERT_PHASE_JITTER_PERMILLE,
                    rng,
                );
                Self::new(
                    CpuBattler::new(unit.id, phases, default_skill),
                    AiBrain::Robert(RobertAi::new()),
                )
            }
            AiKind::Lumisquirrel => Self::new(
                CpuBattler::new(unit.id, PhaseTracker::new(Vec::new()), default_skill),
                AiBrain::Lumisquirrel(LumisquirrelAi::new(rng)),
            ),
            AiKind::Scoring => Self::new(
                CpuBattler::new(unit.id, PhaseTracker::new(Vec::new()), default_skill),
                AiBrain::Scoring(ScoringAi::new()),
            ),
        }
    }

    pub fn unit(&self) -> UnitId {
        self.cpu.unit
    }

    pub fn phase(&self) -> u32 {
        self.cpu.phases.phase()
    }

    /// Re-reads the unit's HP and runs the phase-entry hook if a later phase
    /// was reached.
    pub fn refresh_phase(
        &mut self,
        state: &BattleState,
        rng: &mut BattleRng,
        commands: &mut Vec<AiCommand>,
    ) -> Option<(u32, u32)> {
        let hp = state.unit(self.cpu.unit)?.hp();
        let (new_phase, last_phase) = self.cpu.phases.update(hp)?;
        debug!(unit = %self.cpu.unit, new_phase, last_phase, "ai phase changed");
        let mut cx = AiContext::new(state, &mut self.cpu, rng, commands);
        self.brain
            .as_ai()
            .on_phase_changed(&mut cx, new_phase, last_phase);
        Some((new_phase, last_phase))
    }

    pub fn notify(
        &mut self,
        event: &AiEvent,
        state: &BattleState,
        rng: &mut BattleRng,
        commands: &mut Vec<AiCommand>,
    ) {
        let mut cx = AiContext::new(state, &mut self.cpu, rng, commands);
        let ai = self.brain.as_ai();
        match event {
            AiEvent::UnitReady { unit } => ai.on_unit_ready(&mut cx, *unit),
            AiEvent::SkillUsed {
                user,
                skill,
                stance,
                targets,
            } => ai.on_skill_used(&mut cx, *user, *skill, *stance, targets),
            AiEvent::ItemUsed {
                user,
                item,
                targets,
            } => ai.on_item_used(&mut cx, *user, *item, targets),
            AiEvent::StanceChanged { unit, stance } => ai.on_stance_changed(&mut cx, *unit, *stance),
        }
    }

    /// The next move for the controller's unit: strategize if nothing is
    /// planned, take the first planned move, and fall back to the default
    /// skill when that move cannot be used.
    pub fn next_selection(
        &mut self,
        state: &BattleState,
        rng: &mut BattleRng,
        commands: &mut Vec<AiCommand>,
    ) -> AiDecision {
        if self.cpu.moves.is_empty() {
            let mut cx = AiContext::new(state, &mut self.cpu, rng, commands);
            self.brain.as_ai().strategize(&mut cx);
        }

        let unit_id = self.cpu.unit;
        let Some(unit) = state.unit(unit_id) else {
            return AiDecision {
                selection: MoveSelection::guard(unit_id),
                fallback: None,
            };
        };

        if let Some(planned) = self.cpu.next_move() {
            if is_usable(unit, planned.usable, planned.stance) {
                let targets = resolve_targets(state, unit_id, planned.usable, planned.target, rng);
                if !targets.is_empty() {
                    return AiDecision {
                        selection: MoveSelection {
                            usable: Some(planned.usable),
                            stance: planned.stance,
                            targets,
                        },
                        fallback: None,
                    };
                }
            }
            warn!(unit = %unit_id, usable = %planned.usable, "planned move unusable; using default skill");
        } else {
            warn!(unit = %unit_id, "ai planned nothing; using default skill");
        }

        let skill = self.cpu.default_skill;
        let usable = Usable::Skill(skill);
        let targets = if unit.is_skill_usable(skill, Stance::Attack) {
            resolve_targets(state, unit_id, usable, None, rng)
        } else {
            Vec::new()
        };
        if targets.is_empty() {
            return AiDecision {
                selection: MoveSelection::guard(unit_id),
                fallback: None,
            };
        }
        AiDecision {
            selection: MoveSelection::skill(skill, Stance::Attack, targets),
            fallback: Some(skill),
        }
    }
}

fn is_usable(unit: &BattleUnit, usable: Usable, stance: Stance) -> bool {
    match usable {
        Usable::Skill(skill) => unit.is_skill_usable(skill, stance),
        Usable::Item(item) => stance.allows_items() && unit.is_item_usable(item),
    }
}

/// AI picks are trusted: a named target only has to be alive (or a legal
/// corpse for revives). Group moves always take their whole group.
fn resolve_targets(
    state: &BattleState,
    user: UnitId,
    usable: Usable,
    target: Option<UnitId>,
    rng: &mut BattleRng,
) -> Vec<UnitId> {
    let rules = TargetRules::of(usable);
    if rules.target_type.is_group() {
        return legal_targets(state, user, rules);
    }
    match target.and_then(|id| state.unit(id)) {
        Some(unit) if unit.is_alive() || rules.allow_dead_target => vec![unit.id],
        _ => default_targets(state, user, rules, rng),
    }
}
