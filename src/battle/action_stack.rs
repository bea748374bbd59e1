use schema::{ActionData, Item, Skill};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

use crate::battle::stance::Stance;
use crate::battle::unit::UnitId;
use crate::catalog::{item_data, skill_data};
use crate::config::BattleConfig;

/// Anything a unit can pick from its move menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Usable {
    Skill(Skill),
    Item(Item),
}

impl Usable {
    pub fn name(self) -> &'static str {
        match self {
            Usable::Skill(skill) => skill_data(skill).name.as_str(),
            Usable::Item(item) => item_data(item).name.as_str(),
        }
    }

    /// The catalog actions this usable runs, in order.
    pub fn actions(self) -> Vec<&'static ActionData> {
        match self {
            Usable::Skill(skill) => skill_data(skill).actions.iter().collect(),
            Usable::Item(item) => vec![&item_data(item).action],
        }
    }

    /// Ranks of every action this usable queues in `stance`, charge prefix
    /// included.
    pub fn ranks(self, stance: Stance) -> Vec<u32> {
        let mut ranks = match self {
            Usable::Skill(_) => stance.prefix_ranks().to_vec(),
            Usable::Item(_) => Vec::new(),
        };
        ranks.extend(self.actions().iter().map(|action| action.rank));
        ranks
    }
}

impl fmt::Display for Usable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Usable::Skill(skill) => write!(f, "{}", skill),
            Usable::Item(item) => write!(f, "{}", item),
        }
    }
}

/// One step a unit will take on one of its turns.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionStep {
    /// A catalog action.
    Perform(&'static ActionData),
    /// The extra rank-1 step in front of a charged technique.
    ChargeUp,
    /// Raises the unit's guard.
    Guard,
}

impl ActionStep {
    pub fn rank(&self, config: &BattleConfig) -> u32 {
        match self {
            ActionStep::Perform(action) => action.rank,
            ActionStep::ChargeUp => 1,
            ActionStep::Guard => config.stance_change_rank,
        }
    }
}

/// A step waiting in a unit's FIFO, with the targets chosen when the move was
/// selected.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedAction {
    pub usable: Option<Usable>,
    pub step: ActionStep,
    pub targets: Vec<UnitId>,
    pub power_scale: f64,
}

#[derive(Debug, Clone, Default)]
pub struct ActionQueue {
    actions: VecDeque<QueuedAction>,
}

impl ActionQueue {
    /// Creates a new, empty ActionQueue.
    pub fn new() -> Self {
        Self {
            actions: VecDeque::new(),
        }
    }

    /// Expands a selected move into the steps it takes, in execution order.
    pub fn build(
        usable: Option<Usable>,
        stance: Stance,
        targets: Vec<UnitId>,
        config: &BattleConfig,
    ) -> Self {
        let mut queue = Self::new();

        // Guard replaces the technique entirely.
        let usable = match (stance, usable) {
            (Stance::Guard, _) | (_, None) => {
                queue.push_back(QueuedAction {
                    usable: None,
                    step: ActionStep::Guard,
                    targets: Vec::new(),
                    power_scale: 1.0,
                });
                return queue;
            }
            (_, Some(usable)) => usable,
        };

        let power_scale = stance.power_bonus(config);
        if stance == Stance::Charge && matches!(usable, Usable::Skill(_)) {
            queue.push_back(QueuedAction {
                usable: Some(usable),
                step: ActionStep::ChargeUp,
                targets: targets.clone(),
                power_scale: 1.0,
            });
        }
        for action in usable.actions() {
            queue.push_back(QueuedAction {
                usable: Some(usable),
                step: ActionStep::Perform(action),
                targets: targets.clone(),
                power_scale,
            });
        }
        queue
    }

    pub fn push_back(&mut self, action: QueuedAction) {
        self.actions.push_back(action);
    }

    pub fn push_front(&mut self, action: QueuedAction) {
        self.actions.push_front(action);
    }

    pub fn pop_front(&mut self) -> Option<QueuedAction> {
        self.actions.pop_front()
    }

    pub fn append(&mut self, mut other: ActionQueue) {
        self.actions.append(&mut other.actions);
    }

    /// Drops every pending step, returning how many were dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.actions.len();
        self.actions.clear();
        dropped
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn ranks(&self, config: &BattleConfig) -> Vec<u32> {
        self.actions
            .iter()
            .map(|queued| queued.step.rank(config))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueuedAction> {
        self.actions.iter()
    }
}
