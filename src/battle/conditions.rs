//! Field-wide conditions. Unlike statuses these belong to the battle, not to
//! a unit, and they tick on whichever unit becomes ready.

use schema::{Condition, ConditionTick};
use serde::{Deserialize, Serialize};

use crate::catalog::condition_data;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ActiveCondition {
    pub condition: Condition,
    /// Unit turns left before the condition lifts.
    pub turns_left: u32,
}

/// Result of adding a condition to the field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionChange {
    Added { overruled: Vec<Condition> },
    Refreshed,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct BattleConditions {
    active: Vec<ActiveCondition>,
}

impl BattleConditions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> &[ActiveCondition] {
        &self.active
    }

    pub fn contains(&self, condition: Condition) -> bool {
        self.active.iter().any(|c| c.condition == condition)
    }

    /// Puts `condition` on the field. An active condition starts its duration
    /// over; otherwise anything it overrules is lifted first.
    pub fn add(&mut self, condition: Condition) -> ConditionChange {
        let data = condition_data(condition);
        if let Some(existing) = self.active.iter_mut().find(|c| c.condition == condition) {
            existing.turns_left = data.duration;
            return ConditionChange::Refreshed;
        }

        let overruled: Vec<Condition> = self
            .active
            .iter()
            .map(|c| c.condition)
            .filter(|c| data.overrules.contains(c))
            .collect();
        self.active.retain(|c| !data.overrules.contains(&c.condition));
        self.active.push(ActiveCondition {
            condition,
            turns_left: data.duration,
        });
        ConditionChange::Added { overruled }
    }

    /// The per-turn effect of every active condition, in the order they were
    /// added.
    pub fn ticks(&self) -> Vec<(Condition, &'static ConditionTick)> {
        self.active
            .iter()
            .filter_map(|c| {
                condition_data(c.condition)
                    .tick
                    .as_ref()
                    .map(|tick| (c.condition, tick))
            })
            .collect()
    }

    /// Spends one unit turn of every condition and returns those that lifted.
    pub fn count_down(&mut self) -> Vec<Condition> {
        let mut expired = Vec::new();
        for c in &mut self.active {
            c.turns_left = c.turns_left.saturating_sub(1);
            if c.turns_left == 0 {
                expired.push(c.condition);
            }
        }
        self.active.retain(|c| c.turns_left > 0);
        expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_inferno_and_subzero_overrule_each_other() {
        let mut conditions = BattleConditions::new();
        conditions.add(Condition::Inferno);

        let change = conditions.add(Condition::Subzero);

        assert_eq!(
            change,
            ConditionChange::Added {
                overruled: vec![Condition::Inferno]
            }
        );
        assert!(!conditions.contains(Condition::Inferno));
        assert!(conditions.contains(Condition::Subzero));
    }

    #[test]
    fn test_conditions_lift_after_their_duration() {
        let mut conditions = BattleConditions::new();
        conditions.add(Condition::HealingAura);
        let duration = condition_data(Condition::HealingAura).duration;

        for _ in 1..duration {
            assert!(conditions.count_down().is_empty());
        }

        assert_eq!(conditions.count_down(), vec![Condition::HealingAura]);
        assert!(conditions.active().is_empty());
    }

    #[test]
    fn test_readding_refreshes_duration() {
        let mut conditions = BattleConditions::new();
        conditions.add(Condition::Thunderstorm);
        conditions.count_down();

        assert_eq!(conditions.add(Condition::Thunderstorm), ConditionChange::Refreshed);
        assert_eq!(
            conditions.active()[0].turns_left,
            condition_data(Condition::Thunderstorm).duration
        );
    }
}
