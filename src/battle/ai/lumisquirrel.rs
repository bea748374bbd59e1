//! Lumisquirrel: picks one opponent and one plan for the whole fight.

use schema::{Item, Skill};

use super::{AiContext, BattleAi};
use crate::battle::rng::BattleRng;
use crate::battle::stance::Stance;
use crate::battle::unit::UnitId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SquirrelStrategy {
    /// Death bite to zombify the target, lightning to punish it, and a plain
    /// bite to start over once the target has been cured.
    Zombify,
    Delude,
}

#[derive(Debug, Clone)]
pub struct LumisquirrelAi {
    strategy: SquirrelStrategy,
    target: Option<UnitId>,
    death_bite_used: bool,
    was_zombie_cured: bool,
}

impl LumisquirrelAi {
    pub fn new(rng: &mut BattleRng) -> Self {
        let strategy = rng
            .sample(
                &[SquirrelStrategy::Zombify, SquirrelStrategy::Delude],
                "Lumisquirrel Strategy",
            )
            .copied()
            .unwrap_or(SquirrelStrategy::Zombify);
        Self::with_strategy(strategy)
    }

    pub fn with_strategy(strategy: SquirrelStrategy) -> Self {
        Self {
            strategy,
            target: None,
            death_bite_used: false,
            was_zombie_cured: false,
        }
    }

    pub fn strategy(&self) -> SquirrelStrategy {
        self.strategy
    }

    pub fn target(&self) -> Option<UnitId> {
        self.target
    }

    /// Keeps the same target while it lives; picks a new one at random
    /// otherwise.
    fn pick_target(&mut self, cx: &mut AiContext<'_>) -> Option<UnitId> {
        let alive = self
            .target
            .and_then(|id| cx.state.unit(id))
            .is_some_and(|unit| unit.is_alive());
        if !alive {
            let opponents = cx.state.opponents_of(cx.unit_id());
            self.target = cx.sample(&opponents, "Lumisquirrel Target");
        }
        self.target
    }
}

impl BattleAi for LumisquirrelAi {
    fn strategize(&mut self, cx: &mut AiContext<'_>) {
        let target = self.pick_target(cx);
        let skill = match self.strategy {
            SquirrelStrategy::Zombify if !self.death_bite_used => {
                self.death_bite_used = true;
                Skill::DeathBite
            }
            SquirrelStrategy::Zombify if self.was_zombie_cured => {
                self.death_bite_used = false;
                self.was_zombie_cured = false;
                Skill::Bite
            }
            SquirrelStrategy::Zombify => Skill::Lightning,
            SquirrelStrategy::Delude => Skill::Delusion,
        };
        cx.queue_skill_with(skill, Stance::Attack, target);
    }

    fn on_item_used(&mut self, _cx: &mut AiContext<'_>, _user: UnitId, item: Item, targets: &[UnitId]) {
        let cures_target = matches!(item, Item::HolyWater | Item::Vaccine)
            && self.target.is_some_and(|target| targets.contains(&target));
        if cures_target && self.death_bite_used {
            self.was_zombie_cured = true;
        }
    }
}
