use crate::battle::action_stack::Usable;
use crate::battle::conditions::BattleConditions;
use crate::battle::stance::Stance;
use crate::battle::unit::{BattleUnit, Side, UnitId};
use crate::config::BattleConfig;
use crate::errors::{BattleResult, BattleStateError};
use schema::{Condition, Item, Skill, Status};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattleOutcome {
    /// Every enemy is down.
    Victory,
    /// Every party member is down.
    Defeat,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum BattleEvent {
    // Battle flow
    BattleStarted {
        units: usize,
    },
    UnitReady {
        unit: UnitId,
        turn_number: u32,
    },
    TurnEnded {
        unit: UnitId,
        rank: u32,
        counter: u32,
    },
    BattleEnded {
        outcome: BattleOutcome,
    },

    // Selection
    MoveSelected {
        unit: UnitId,
        usable: Option<Usable>,
        stance: Stance,
        targets: Vec<UnitId>,
    },
    StanceChanged {
        unit: UnitId,
        stance: Stance,
    },
    MpSpent {
        unit: UnitId,
        amount: u32,
        remaining: u32,
    },
    ItemConsumed {
        unit: UnitId,
        item: Item,
        uses_left: u32,
    },
    AiFallback {
        unit: UnitId,
        skill: Skill,
    },
    SelectionRejected {
        unit: UnitId,
        reason: String,
    },
    PhaseChanged {
        unit: UnitId,
        phase: u32,
        last_phase: u32,
    },

    // Action resolution
    ActionAnnounced {
        unit: UnitId,
        text: String,
    },
    ChargingUp {
        unit: UnitId,
    },
    Guarding {
        unit: UnitId,
    },
    ActionMissed {
        actor: UnitId,
        target: UnitId,
    },
    ActionsDropped {
        unit: UnitId,
        count: usize,
    },
    CounterReady {
        unit: UnitId,
        target: UnitId,
    },

    // HP and MP
    DamageDealt {
        target: UnitId,
        amount: u32,
        remaining_hp: u32,
    },
    Healed {
        target: UnitId,
        amount: u32,
        new_hp: u32,
    },
    HpChangeCancelled {
        target: UnitId,
        status: Status,
    },
    UnitDefeated {
        unit: UnitId,
    },
    UnitRevived {
        unit: UnitId,
        hp: u32,
    },
    MpRestored {
        target: UnitId,
        amount: u32,
    },

    // Statuses and conditions
    StatusApplied {
        target: UnitId,
        status: Status,
    },
    StatusRefreshed {
        target: UnitId,
        status: Status,
    },
    StatusBlocked {
        target: UnitId,
        status: Status,
        by: Status,
    },
    StatusRemoved {
        target: UnitId,
        status: Status,
    },
    StatusExpired {
        target: UnitId,
        status: Status,
    },
    ConditionApplied {
        condition: Condition,
    },
    ConditionRemoved {
        condition: Condition,
    },
    ConditionExpired {
        condition: Condition,
    },

    // Devour
    Devoured {
        actor: UnitId,
        target: UnitId,
    },
    DevourFailed {
        actor: UnitId,
        target: UnitId,
    },
    SkillGrown {
        unit: UnitId,
        skill: Skill,
        experience: u32,
        learned: bool,
    },
}

impl BattleEvent {
    /// Formats the event into a human-readable string using battle context.
    /// Returns None for silent events that should not produce user-visible text.
    pub fn format(&self, battle_state: &BattleState) -> Option<String> {
        let name = |id: &UnitId| battle_state.unit_name(*id);
        match self {
            // === Battle Flow ===
            BattleEvent::BattleStarted { units } => {
                Some(format!("=== Battle start ({} combatants) ===", units))
            }
            BattleEvent::UnitReady { unit, turn_number } => {
                Some(format!("--- Turn {}: {} ---", turn_number, name(unit)))
            }
            BattleEvent::TurnEnded { .. } => None,
            BattleEvent::BattleEnded { outcome } => match outcome {
                BattleOutcome::Victory => Some("The party is victorious!".to_string()),
                BattleOutcome::Defeat => Some("The party has fallen...".to_string()),
            },

            // === Selection ===
            BattleEvent::MoveSelected { .. } => None,
            BattleEvent::StanceChanged { unit, stance } => {
                Some(format!("{} takes the {} stance.", name(unit), stance))
            }
            BattleEvent::MpSpent { .. } => None,
            BattleEvent::ItemConsumed { unit, item, uses_left } => Some(format!(
                "{} used a {} ({} left).",
                name(unit),
                Usable::Item(*item).name(),
                uses_left
            )),
            BattleEvent::AiFallback { .. } => None,
            BattleEvent::SelectionRejected { .. } => None,
            BattleEvent::PhaseChanged { .. } => None,

            // === Action Resolution ===
            BattleEvent::ActionAnnounced { unit, text } => {
                Some(format!("{}: {}", name(unit), text))
            }
            BattleEvent::ChargingUp { unit } => Some(format!("{} is charging up!", name(unit))),
            BattleEvent::Guarding { unit } => Some(format!("{} raises its guard.", name(unit))),
            BattleEvent::ActionMissed { actor, target } => Some(format!(
                "{}'s attack missed {}!",
                name(actor),
                name(target)
            )),
            BattleEvent::ActionsDropped { .. } => None,
            BattleEvent::CounterReady { unit, target } => Some(format!(
                "{} is ready to counter {}!",
                name(unit),
                name(target)
            )),

            // === HP and MP ===
            BattleEvent::DamageDealt { target, amount, .. } => {
                Some(format!("{} took {} damage!", name(target), amount))
            }
            BattleEvent::Healed { target, amount, .. } => {
                Some(format!("{} recovered {} HP!", name(target), amount))
            }
            BattleEvent::HpChangeCancelled { target, status } => {
                Some(format!("{}'s {} took the hit!", name(target), status))
            }
            BattleEvent::UnitDefeated { unit } => Some(format!("{} is down!", name(unit))),
            BattleEvent::UnitRevived { unit, .. } => {
                Some(format!("{} got back up!", name(unit)))
            }
            BattleEvent::MpRestored { target, amount } => {
                Some(format!("{} recovered {} MP!", name(target), amount))
            }

            // === Statuses and Conditions ===
            BattleEvent::StatusApplied { target, status } => {
                Some(format!("{} is afflicted with {}!", name(target), status))
            }
            BattleEvent::StatusRefreshed { .. } => None,
            BattleEvent::StatusBlocked { target, status, by } => Some(format!(
                "{}'s {} kept {} away!",
                name(target),
                by,
                status
            )),
            BattleEvent::StatusRemoved { target, status } => {
                Some(format!("{} is no longer affected by {}.", name(target), status))
            }
            BattleEvent::StatusExpired { target, status } => {
                Some(format!("{}'s {} wore off.", name(target), status))
            }
            BattleEvent::ConditionApplied { condition } => {
                Some(format!("The field is engulfed in {}!", condition))
            }
            BattleEvent::ConditionRemoved { condition } | BattleEvent::ConditionExpired { condition } => {
                Some(format!("The {} subsided.", condition))
            }

            // === Devour ===
            BattleEvent::Devoured { actor, target } => {
                Some(format!("{} got eaten by {}!", name(target), name(actor)))
            }
            BattleEvent::DevourFailed { actor, target } => Some(format!(
                "{} tried to eat {} but failed!",
                name(actor),
                name(target)
            )),
            BattleEvent::SkillGrown {
                unit,
                skill,
                learned,
                ..
            } => {
                let skill_name = Usable::Skill(*skill).name();
                if *learned {
                    Some(format!("{} learned {}!", name(unit), skill_name))
                } else {
                    Some(format!("{}'s {} grew stronger!", name(unit), skill_name))
                }
            }
        }
    }
}

/// Event bus for collecting and managing battle events.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    events: Vec<BattleEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn push(&mut self, event: BattleEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[BattleEvent] {
        &self.events
    }

    /// Events pushed at or after `start`, for callers that only care about
    /// what one turn produced.
    pub fn since(&self, start: usize) -> &[BattleEvent] {
        &self.events[start.min(self.events.len())..]
    }

    /// Print all events in debug format with indentation.
    pub fn print_debug(&self) {
        for event in &self.events {
            println!("  {:?}", event);
        }
    }

    /// Print all events under a header, for eyeballing a failing test.
    pub fn print_debug_with_message(&self, message: &str) {
        println!("{}", message);
        self.print_debug();
    }

    /// Print all events using their formatted text (when available) along with battle context.
    /// Falls back to debug format for silent events.
    pub fn print_formatted(&self, battle_state: &BattleState) {
        for event in &self.events {
            match event.format(battle_state) {
                Some(formatted) => println!("  {}", formatted),
                None => println!("  {:?} (silent)", event),
            }
        }
    }

    /// Return true if the event bus contains no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Return the number of events in the bus.
    pub fn len(&self) -> usize {
        self.events.len()
    }
}

impl std::fmt::Display for EventBus {
    /// Format the EventBus for printing. Shows debug format of all events.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for event in &self.events {
            writeln!(f, "  {:?}", event)?;
        }
        Ok(())
    }
}

/// Everything the scheduler and executor read and write during a fight.
#[derive(Debug, Clone)]
pub struct BattleState {
    pub units: Vec<BattleUnit>,
    pub conditions: BattleConditions,
    pub config: BattleConfig,
    /// The unit whose action is resolving. Timers do not advance while set.
    pub current_actor: Option<UnitId>,
    pub turn_number: u32,
    pub ticks_elapsed: u64,
    pub outcome: Option<BattleOutcome>,
}

impl BattleState {
    pub fn new(units: Vec<BattleUnit>, config: BattleConfig) -> Self {
        Self {
            units,
            conditions: BattleConditions::new(),
            config,
            current_actor: None,
            turn_number: 0,
            ticks_elapsed: 0,
            outcome: None,
        }
    }

    pub fn unit(&self, id: UnitId) -> Option<&BattleUnit> {
        self.units.get(id.0)
    }

    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut BattleUnit> {
        self.units.get_mut(id.0)
    }

    pub fn try_unit(&self, id: UnitId) -> BattleResult<&BattleUnit> {
        self.unit(id)
            .ok_or_else(|| BattleStateError::UnknownUnit(id).into())
    }

    pub fn try_unit_mut(&mut self, id: UnitId) -> BattleResult<&mut BattleUnit> {
        self.units
            .get_mut(id.0)
            .ok_or_else(|| BattleStateError::UnknownUnit(id).into())
    }

    pub fn unit_name(&self, id: UnitId) -> String {
        self.unit(id)
            .map_or_else(|| id.to_string(), |unit| unit.name.clone())
    }

    pub fn unit_ids(&self) -> impl Iterator<Item = UnitId> + '_ {
        self.units.iter().map(|unit| unit.id)
    }

    pub fn side_of(&self, id: UnitId) -> Option<Side> {
        self.unit(id).map(|unit| unit.side)
    }

    /// Every unit on `side`, living or not, in enumeration order.
    pub fn side_members(&self, side: Side) -> Vec<UnitId> {
        self.units
            .iter()
            .filter(|unit| unit.side == side)
            .map(|unit| unit.id)
            .collect()
    }

    pub fn living_on_side(&self, side: Side) -> Vec<UnitId> {
        self.units
            .iter()
            .filter(|unit| unit.side == side && unit.is_alive())
            .map(|unit| unit.id)
            .collect()
    }

    /// Living units opposing `id`.
    pub fn opponents_of(&self, id: UnitId) -> Vec<UnitId> {
        match self.side_of(id) {
            Some(side) => self.living_on_side(side.opponent()),
            None => Vec::new(),
        }
    }

    /// Living units on the same side as `id`, itself included.
    pub fn allies_of(&self, id: UnitId) -> Vec<UnitId> {
        match self.side_of(id) {
            Some(side) => self.living_on_side(side),
            None => Vec::new(),
        }
    }

    pub fn are_opponents(&self, a: UnitId, b: UnitId) -> bool {
        matches!((self.side_of(a), self.side_of(b)), (Some(x), Some(y)) if x != y)
    }

    pub fn find_by_key(&self, key: &str) -> Option<UnitId> {
        self.units
            .iter()
            .find(|unit| unit.key == key)
            .map(|unit| unit.id)
    }

    /// Victory once every enemy is down, defeat once every party member is.
    pub fn check_outcome(&self) -> Option<BattleOutcome> {
        if self.living_on_side(Side::Party).is_empty() {
            Some(BattleOutcome::Defeat)
        } else if self.living_on_side(Side::Enemy).is_empty() {
            Some(BattleOutcome::Victory)
        } else {
            None
        }
    }

    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::tests::common::TestUnitBuilder;
    use pretty_assertions::assert_eq;

    fn two_on_one() -> BattleState {
        let units = vec![
            TestUnitBuilder::new("scott").build_as(UnitId(0)),
            TestUnitBuilder::new("bruce").build_as(UnitId(1)),
            TestUnitBuilder::new("robert")
                .enemy()
                .build_as(UnitId(2)),
        ];
        BattleState::new(units, BattleConfig::default())
    }

    #[test]
    fn test_sides_and_opponents() {
        let state = two_on_one();

        assert_eq!(state.opponents_of(UnitId(0)), vec![UnitId(2)]);
        assert_eq!(state.allies_of(UnitId(0)), vec![UnitId(0), UnitId(1)]);
        assert!(state.are_opponents(UnitId(1), UnitId(2)));
        assert!(!state.are_opponents(UnitId(0), UnitId(1)));
        assert_eq!(state.find_by_key("robert"), Some(UnitId(2)));
    }

    #[test]
    fn test_outcome_follows_living_units() {
        let mut state = two_on_one();
        assert_eq!(state.check_outcome(), None);

        state.units[2].take_damage(i32::MAX, &[], true);
        assert_eq!(state.check_outcome(), Some(BattleOutcome::Victory));
    }

    #[test]
    fn test_event_bus_formats_with_names() {
        let state = two_on_one();
        let mut bus = EventBus::new();
        bus.push(BattleEvent::DamageDealt {
            target: UnitId(2),
            amount: 12,
            remaining_hp: 88,
        });
        bus.push(BattleEvent::MoveSelected {
            unit: UnitId(0),
            usable: None,
            stance: Stance::Guard,
            targets: Vec::new(),
        });

        assert_eq!(bus.len(), 2);
        assert_eq!(
            bus.events()[0].format(&state),
            Some("robert took 12 damage!".to_string())
        );
        assert_eq!(bus.events()[1].format(&state), None);
        assert!(format!("{}", bus).contains("MoveSelected"));
    }
}
