// In: src/battle/move_effects/status_effects.rs

use crate::battle::commands::BattleCommand;
use crate::battle::unit::UnitId;
use schema::{Condition, Status, StatusTag};

pub(super) fn apply_add_status_effect(status: Status, targets: &[UnitId]) -> Vec<BattleCommand> {
    targets
        .iter()
        .map(|&target| BattleCommand::AddStatus { target, status })
        .collect()
}

pub(super) fn apply_lift_status_effect(statuses: &[Status], targets: &[UnitId]) -> Vec<BattleCommand> {
    targets
        .iter()
        .map(|&target| BattleCommand::LiftStatuses {
            target,
            statuses: statuses.to_vec(),
        })
        .collect()
}

pub(super) fn apply_lift_status_tags_effect(
    tags: &[StatusTag],
    targets: &[UnitId],
) -> Vec<BattleCommand> {
    targets
        .iter()
        .map(|&target| BattleCommand::LiftStatusTags {
            target,
            tags: tags.to_vec(),
        })
        .collect()
}

/// Field-wide: applied once no matter how many targets the action had.
pub(super) fn apply_add_condition_effect(condition: Condition) -> Vec<BattleCommand> {
    vec![BattleCommand::AddCondition { condition }]
}
