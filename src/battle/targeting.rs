//! Which units a usable may be aimed at.

use schema::TargetType;

use crate::battle::action_stack::Usable;
use crate::battle::rng::BattleRng;
use crate::battle::state::BattleState;
use crate::battle::unit::{Side, UnitId};
use crate::catalog::{item_data, skill_data};
use crate::errors::SelectionError;

/// Targeting rules shared by skills and items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetRules {
    pub target_type: TargetType,
    pub allow_dead_target: bool,
}

impl TargetRules {
    pub fn of(usable: Usable) -> Self {
        match usable {
            Usable::Skill(skill) => {
                let data = skill_data(skill);
                Self {
                    target_type: data.target_type,
                    allow_dead_target: data.allow_dead_target,
                }
            }
            Usable::Item(item) => {
                let data = item_data(item);
                Self {
                    target_type: data.target_type,
                    allow_dead_target: data.allow_dead_target,
                }
            }
        }
    }
}

fn target_side(state: &BattleState, user: UnitId, target_type: TargetType) -> Option<Side> {
    let side = state.side_of(user)?;
    Some(if target_type.prefers_allies() {
        side
    } else {
        side.opponent()
    })
}

/// Every unit `user` may pick, in enumeration order. Downed units only count
/// when the usable allows dead targets.
pub fn legal_targets(state: &BattleState, user: UnitId, rules: TargetRules) -> Vec<UnitId> {
    if rules.target_type == TargetType::SelfOnly {
        return vec![user];
    }
    let Some(side) = target_side(state, user, rules.target_type) else {
        return Vec::new();
    };
    state
        .units
        .iter()
        .filter(|unit| unit.side == side && (unit.is_alive() || rules.allow_dead_target))
        .map(|unit| unit.id)
        .collect()
}

/// Targets an AI uses when it does not name one: a random living opponent
/// for single-target moves, itself for ally or self moves, everyone for group
/// moves.
pub fn default_targets(
    state: &BattleState,
    user: UnitId,
    rules: TargetRules,
    rng: &mut BattleRng,
) -> Vec<UnitId> {
    match rules.target_type {
        TargetType::Single => {
            let opponents = state.opponents_of(user);
            rng.sample(&opponents, "Default Target")
                .copied()
                .into_iter()
                .collect()
        }
        TargetType::Ally | TargetType::SelfOnly => vec![user],
        TargetType::AllEnemies | TargetType::AllAllies => legal_targets(state, user, rules),
    }
}

/// Checks a chosen target list. Group moves always hit their whole group, so
/// any legal pick expands to it.
pub fn validate_targets(
    state: &BattleState,
    user: UnitId,
    rules: TargetRules,
    targets: &[UnitId],
) -> Result<Vec<UnitId>, SelectionError> {
    let legal = legal_targets(state, user, rules);
    if targets.is_empty() {
        return Err(SelectionError::NoTargets);
    }
    if let Some(&illegal) = targets.iter().find(|target| !legal.contains(target)) {
        return Err(SelectionError::IllegalTarget { target: illegal });
    }
    if rules.target_type.is_group() {
        return Ok(legal);
    }
    if targets.len() > 1 {
        return Err(SelectionError::IllegalTarget { target: targets[1] });
    }
    Ok(targets.to_vec())
}
