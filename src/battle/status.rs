//! Runtime side of the status registry: the active-status record a unit
//! carries, the event payloads statuses hook, and the ordered dispatch that
//! runs them.

use schema::{Element, HpTag, Status, StatusBehavior, StatusEventKind};
use serde::{Deserialize, Serialize};

use crate::catalog::status_data;

/// A status attached to a unit, with the turns it has left (if it expires).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEffect {
    pub status: Status,
    pub turns_left: Option<u32>,
}

impl StatusEffect {
    pub fn new(status: Status) -> Self {
        Self {
            status,
            turns_left: status_data(status).duration,
        }
    }
}

/// A payload that statuses can rewrite or cancel.
pub trait StatusEvent {
    const KIND: StatusEventKind;

    fn apply(&mut self, behavior: &StatusBehavior);

    fn is_cancelled(&self) -> bool;
}

/// Incoming damage. A negative `amount` after the hooks means the damage
/// turned into healing.
#[derive(Debug, Clone, PartialEq)]
pub struct DamagedEvent {
    pub amount: i32,
    pub tags: Vec<HpTag>,
    pub cancel: bool,
}

impl StatusEvent for DamagedEvent {
    const KIND: StatusEventKind = StatusEventKind::Damaged;

    fn apply(&mut self, behavior: &StatusBehavior) {
        match behavior {
            StatusBehavior::ScaleDamage { percent } if self.amount > 0 => {
                let scaled = (self.amount as f64 * *percent as f64 / 100.0).round() as i32;
                self.amount = scaled.max(1);
            }
            StatusBehavior::CancelDamageTagged { tag } => {
                self.cancel = self.tags.contains(tag);
            }
            StatusBehavior::CancelDamageUntagged { tag } => {
                self.cancel = !self.tags.contains(tag);
            }
            _ => {}
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
    }
}

/// Incoming healing. A negative `amount` after the hooks means the healing
/// turned into damage.
#[derive(Debug, Clone, PartialEq)]
pub struct HealedEvent {
    pub amount: i32,
    pub tags: Vec<HpTag>,
    pub cancel: bool,
}

impl StatusEvent for HealedEvent {
    const KIND: StatusEventKind = StatusEventKind::Healed;

    fn apply(&mut self, behavior: &StatusBehavior) {
        match behavior {
            StatusBehavior::InvertHealing => self.amount = -self.amount,
            StatusBehavior::CancelHealing => self.cancel = true,
            _ => {}
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
    }
}

/// What the unit's statuses want done as it becomes ready. The battle applies
/// the collected damage and healing through the unit's own mutators.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnReadyEvent {
    pub max_hp: u32,
    pub damage: Vec<(i32, Element)>,
    pub healing: Vec<i32>,
    pub cancel: bool,
}

impl TurnReadyEvent {
    pub fn new(max_hp: u32) -> Self {
        Self {
            max_hp,
            damage: Vec::new(),
            healing: Vec::new(),
            cancel: false,
        }
    }

    fn share(&self, percent: u32) -> i32 {
        ((self.max_hp * percent) / 100).max(1) as i32
    }
}

impl StatusEvent for TurnReadyEvent {
    const KIND: StatusEventKind = StatusEventKind::TurnReady;

    fn apply(&mut self, behavior: &StatusBehavior) {
        match behavior {
            StatusBehavior::DamagePerTurn { percent, element } => {
                let amount = self.share(*percent);
                self.damage.push((amount, *element));
            }
            StatusBehavior::HealPerTurn { percent } => {
                let amount = self.share(*percent);
                self.healing.push(amount);
            }
            _ => {}
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
    }
}

/// Runs `event` through `statuses` in registration order. The first status to
/// cancel wins: later statuses never see the event. Returns the cancelling
/// status, if any.
pub fn dispatch<E: StatusEvent>(statuses: &[StatusEffect], event: &mut E) -> Option<Status> {
    for effect in statuses {
        let data = status_data(effect.status);
        if !data.handles(E::KIND) {
            continue;
        }
        for behavior in data
            .behaviors
            .iter()
            .filter(|behavior| behavior.handles() == Some(E::KIND))
        {
            event.apply(behavior);
            if event.is_cancelled() {
                return Some(effect.status);
            }
        }
    }
    None
}
