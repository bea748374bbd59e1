//! Robert, the five-phase duel boss.
//!
//! Robert watches Scott closely: the stance Scott fights in, every item Scott
//! uses on either of them, and whether Scott is still a zombie. Phase entry
//! queues an opening move; `strategize` then works through a behavior table
//! for the current phase. Healing Robert with a curative while he is a zombie
//! sets off an escalating punish sequence (cure, retaliate, then raise the
//! alert level for next time).

use schema::{Item, Skill, Status};

use super::{AiContext, BattleAi};
use crate::battle::stance::Stance;
use crate::battle::unit::{Side, UnitId};

const CURATIVES: [Item; 3] = [Item::Tonic, Item::PowerTonic, Item::FullTonic];
const MAGICKS: [Skill; 4] = [
    Skill::Hellfire,
    Skill::Windchill,
    Skill::Electrocute,
    Skill::Upheaval,
];
const RIVAL_KEY: &str = "scott";

const FINAL_STAND_SCENE: [(&str, &str); 5] = [
    (
        "Scott",
        "Robert! Tell me what we're accomplishing fighting like this! You HAVE to realize by now \
         that no matter what any of us do, Amanda is the Primus!",
    ),
    ("Robert", "..."),
    (
        "Scott",
        "None of us chose our lots, Robert, not one. All of us, in the end, left with no choice \
         but to try to play with the absurd hand we were dealt.",
    ),
    (
        "Scott",
        "Let the cards fall how they may. I'm not backing down now. I owe myself far too much.",
    ),
    ("Robert", "If that's what you want, then so be it."),
];

/// Where Robert is in answering a zombie heal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ZombieHealFix {
    FixStatus,
    Retaliate,
    Finish,
}

#[derive(Debug, Clone)]
pub struct RobertAi {
    do_charge_slash_next: bool,
    has_zombie_healed_self: bool,
    is_alcohol_pending: bool,
    is_combo_started: bool,
    is_necro_tonic_item_pending: bool,
    is_necromancy_pending: bool,
    is_scott_zombie: bool,
    necro_tonic_item: Option<Item>,
    necromancy_chance: f64,
    next_elemental_move: Option<Skill>,
    scott_stance: Stance,
    scott_immune_turns_left: u32,
    zombie_heal_alert_level: f64,
    zombie_heal_fix: Option<ZombieHealFix>,
    is_status_heal_pending: bool,
    was_holy_water_used: bool,
    was_tonic_used: bool,
    elementals_till_revenge: u32,
    is_charge_slash_pending: bool,
}

impl Default for RobertAi {
    fn default() -> Self {
        Self::new()
    }
}

impl RobertAi {
    pub fn new() -> Self {
        Self {
            do_charge_slash_next: false,
            has_zombie_healed_self: false,
            is_alcohol_pending: false,
            is_combo_started: false,
            is_necro_tonic_item_pending: false,
            is_necromancy_pending: false,
            is_scott_zombie: false,
            necro_tonic_item: None,
            necromancy_chance: 0.0,
            next_elemental_move: None,
            scott_stance: Stance::Attack,
            scott_immune_turns_left: 0,
            zombie_heal_alert_level: 0.0,
            zombie_heal_fix: None,
            is_status_heal_pending: false,
            was_holy_water_used: false,
            was_tonic_used: false,
            elementals_till_revenge: 0,
            is_charge_slash_pending: false,
        }
    }

    pub fn is_combo_started(&self) -> bool {
        self.is_combo_started
    }

    pub fn is_necromancy_pending(&self) -> bool {
        self.is_necromancy_pending
    }

    pub fn do_charge_slash_next(&self) -> bool {
        self.do_charge_slash_next
    }

    pub fn is_scott_zombie(&self) -> bool {
        self.is_scott_zombie
    }

    pub fn next_elemental_move(&self) -> Option<Skill> {
        self.next_elemental_move
    }

    pub fn zombie_heal_alert_level(&self) -> f64 {
        self.zombie_heal_alert_level
    }

    /// Scott by key, or the first party member in a battle without him.
    fn scott(cx: &AiContext<'_>) -> Option<UnitId> {
        cx.find_unit(RIVAL_KEY)
            .or_else(|| cx.state.side_members(Side::Party).first().copied())
    }

    fn is_drunk(cx: &AiContext<'_>) -> bool {
        cx.has_status(Status::Drunk)
    }

    /// Upheaval always gets its tremor follow-up.
    fn queue_magick(cx: &mut AiContext<'_>, skill: Skill) {
        cx.queue_skill(skill);
        if skill == Skill::Upheaval {
            cx.queue_skill(Skill::Tremor);
        }
    }

    fn sample_magick(cx: &mut AiContext<'_>) -> Skill {
        cx.sample(&MAGICKS, "Robert Magick").unwrap_or(Skill::SwordSlash)
    }

    fn magick_or_slash(cx: &mut AiContext<'_>) {
        let skill = Self::sample_magick(cx);
        if cx.is_skill_usable(skill) {
            cx.queue_skill(skill);
        } else {
            cx.queue_skill(Skill::SwordSlash);
        }
    }

    // --- Phase behavior tables ---

    fn phase_one(&mut self, cx: &mut AiContext<'_>) {
        if self.do_charge_slash_next {
            cx.queue_skill(Skill::ChargeSlash);
            self.do_charge_slash_next = false;
        } else if self.scott_stance == Stance::Attack || self.is_combo_started {
            if cx.acts_next_after_skill(Skill::Quickstrike) {
                cx.queue_skill(Skill::Quickstrike);
                self.is_combo_started = true;
            } else if self.is_combo_started {
                cx.queue_skill(Skill::SwordSlash);
                self.do_charge_slash_next = true;
                self.is_combo_started = false;
            } else {
                Self::magick_or_slash(cx);
            }
        } else {
            Self::magick_or_slash(cx);
        }
    }

    fn phase_two(&mut self, cx: &mut AiContext<'_>) {
        let me = cx.unit_id();
        let is_elemental = cx.has_status(Status::Frostbite) || cx.has_status(Status::Ignite);
        self.is_status_heal_pending = is_elemental && self.is_status_heal_pending;
        let quickstrike_first = cx.acts_next_after_skill(Skill::Quickstrike);

        if self.is_status_heal_pending
            && self.has_zombie_healed_self
            && !self.was_holy_water_used
            && cx.has_status(Status::Zombie)
            && cx.is_item_usable(Item::HolyWater)
        {
            cx.queue_item(Item::HolyWater);
            if cx.acts_next_after_item(Item::HolyWater) && cx.is_item_usable(Item::Tonic) {
                cx.queue_item(Item::Tonic);
                self.was_tonic_used = true;
            } else {
                self.was_tonic_used = false;
            }
            self.was_holy_water_used = true;
        } else if self.is_status_heal_pending && is_elemental {
            let skill = if cx.has_status(Status::Frostbite) {
                Skill::Ignite
            } else {
                Skill::Frostbite
            };
            let spell_first = cx.acts_next_after_skill(skill);
            let is_tonic_usable = (!cx.has_status(Status::Zombie)
                || self.was_holy_water_used
                || !self.has_zombie_healed_self)
                && cx.is_item_usable(Item::Tonic);
            let follow_up = self.next_elemental_move.unwrap_or(Skill::Frostbite);

            if (spell_first && is_tonic_usable) || self.was_tonic_used {
                cx.queue_skill_with(skill, Stance::Attack, Some(me));
                if !self.was_tonic_used && is_tonic_usable {
                    cx.queue_item(Item::Tonic);
                } else {
                    cx.queue_skill(follow_up);
                }
            } else if !self.was_tonic_used && is_tonic_usable {
                cx.queue_item(Item::Tonic);
            } else {
                cx.queue_skill(follow_up);
            }
            self.is_status_heal_pending = false;
            self.was_holy_water_used = false;
        } else if (cx.chance(0.5, "Robert Quickstrike") || self.is_combo_started) && quickstrike_first {
            cx.queue_skill(Skill::Quickstrike);
            self.is_combo_started = true;
            self.was_holy_water_used = false;
        } else if self.is_combo_started {
            let skill = if cx.chance(0.5, "Robert Combo Finisher") {
                Self::sample_magick(cx)
            } else {
                Skill::ChargeSlash
            };
            Self::queue_magick(cx, skill);
            self.is_combo_started = false;
            self.is_status_heal_pending = skill == Skill::Upheaval;
            self.was_holy_water_used = false;
        } else {
            let skill = Self::sample_magick(cx);
            Self::queue_magick(cx, skill);
            self.is_status_heal_pending = skill == Skill::Upheaval;
            self.was_holy_water_used = false;
        }
    }

    fn phase_three(&mut self, cx: &mut AiContext<'_>) {
        let me = cx.unit_id();
        let holy_water_first = cx.acts_next_after_item(Item::HolyWater);

        if self.is_charge_slash_pending && !cx.has_status(Status::Protect) {
            cx.queue_skill(Skill::ChargeSlash);
            self.is_charge_slash_pending = false;
        } else if cx.has_status(Status::Zombie)
            && self.has_zombie_healed_self
            && cx.is_item_usable(Item::HolyWater)
            && cx.is_item_usable(Item::Tonic)
            && holy_water_first
        {
            cx.queue_item(Item::HolyWater);
            cx.queue_item(Item::Tonic);
        } else if (cx.has_status(Status::Ignite) || cx.has_status(Status::Frostbite))
            && self.elementals_till_revenge > 0
        {
            self.elementals_till_revenge -= 1;
            if self.elementals_till_revenge == 0 {
                cx.queue_skill_with(Skill::Bolt, Stance::Attack, Self::scott(cx));
                self.necro_tonic_item = Some(Item::PowerTonic);
            } else if cx.has_status(Status::Ignite) {
                cx.queue_skill_with(Skill::Frostbite, Stance::Attack, Some(me));
            } else {
                cx.queue_skill_with(Skill::Ignite, Stance::Attack, Some(me));
            }
        } else if cx.chance(0.5, "Robert Combo") || self.is_combo_started {
            let charge_slash_first = cx.acts_next_after_skill(Skill::ChargeSlash);
            if (charge_slash_first && !self.is_combo_started) || self.do_charge_slash_next {
                self.is_combo_started = false;
                if charge_slash_first {
                    cx.queue_skill(Skill::ChargeSlash);
                } else {
                    let skill = match self.next_elemental_move {
                        Some(skill) => skill,
                        None => cx
                            .sample(&[Skill::Ignite, Skill::Frostbite], "Robert Elemental")
                            .unwrap_or(Skill::Ignite),
                    };
                    cx.queue_skill(skill);
                }
            } else {
                self.is_combo_started = true;
                if cx.acts_next_after_skill(Skill::Quickstrike) {
                    cx.queue_skill(Skill::Quickstrike);
                } else {
                    let skill = if cx.chance(0.5, "Robert Combo Finisher") {
                        Skill::Upheaval
                    } else {
                        Skill::SwordSlash
                    };
                    if cx.is_skill_usable(skill) {
                        Self::queue_magick(cx, skill);
                        self.do_charge_slash_next = skill == Skill::SwordSlash;
                    } else {
                        cx.queue_skill(Skill::SwordSlash);
                        self.do_charge_slash_next = true;
                    }
                    self.is_combo_started = false;
                }
            }
        } else {
            let skill = Self::sample_magick(cx);
            Self::queue_magick(cx, skill);
        }
    }

    fn phase_four(&mut self, cx: &mut AiContext<'_>) {
        let skill = Self::sample_magick(cx);
        let finisher = if cx.is_skill_usable(skill) {
            skill
        } else {
            Skill::SwordSlash
        };
        if cx.acts_next_after_skill(Skill::Quickstrike) {
            cx.queue_skill(Skill::Quickstrike);
        } else {
            cx.queue_skill(finisher);
        }
        if cx.is_skill_queued(finisher) && self.scott_stance == Stance::Guard {
            cx.queue_skill(Skill::ChargeSlash);
        }
    }

    fn phase_five(&mut self, cx: &mut AiContext<'_>) {
        if self.is_alcohol_pending {
            self.is_alcohol_pending = false;
            if !cx.has_status(Status::Zombie) {
                cx.queue_item(Item::Alcohol);
                for skill in [
                    Skill::ChargeSlash,
                    Skill::Hellfire,
                    Skill::Upheaval,
                    Skill::Windchill,
                    Skill::Electrocute,
                ] {
                    cx.queue_skill(skill);
                }
                cx.queue_skill_with(Skill::Omni, Stance::Charge, None);
            } else {
                if cx.is_skill_usable(Skill::Omni) {
                    cx.queue_skill_with(Skill::Omni, Stance::Charge, None);
                }
                cx.queue_skill(Skill::ChargeSlash);
            }
            return;
        }

        let quickstrike_first = cx.acts_next_after_skill(Skill::Quickstrike);
        let moves: &[Skill] = if cx.mp_available() >= 200 {
            &[
                Skill::Flare,
                Skill::Chill,
                Skill::Lightning,
                Skill::Quake,
                Skill::Quickstrike,
                Skill::ChargeSlash,
            ]
        } else {
            &[Skill::Quickstrike, Skill::ChargeSlash]
        };
        let mut skill = cx
            .sample(moves, "Robert Desperation Move")
            .unwrap_or(Skill::ChargeSlash);
        if skill == Skill::Quickstrike || self.is_combo_started {
            skill = if quickstrike_first {
                Skill::Quickstrike
            } else {
                Skill::SwordSlash
            };
            self.is_combo_started = skill == Skill::Quickstrike;
        }
        cx.queue_skill(skill);
    }

    // --- Zombie-heal punish ---

    fn advance_zombie_heal_fix(&mut self, cx: &mut AiContext<'_>, fix: ZombieHealFix) {
        match fix {
            ZombieHealFix::FixStatus => {
                let prefers_vaccine =
                    self.zombie_heal_alert_level > 0.0 || !cx.is_item_usable(Item::HolyWater);
                let item = if prefers_vaccine && cx.is_item_usable(Item::Vaccine) {
                    Item::Vaccine
                } else {
                    Item::HolyWater
                };
                cx.queue_item(item);
                self.zombie_heal_fix = Some(ZombieHealFix::Retaliate);
            }
            ZombieHealFix::Retaliate => {
                match self.zombie_heal_alert_level.ceil() as u32 {
                    0 => {
                        if cx.is_skill_usable(Skill::Bolt) {
                            cx.queue_skill_with(Skill::Bolt, Stance::Attack, Self::scott(cx));
                            self.necro_tonic_item = Some(Item::Tonic);
                        }
                    }
                    1 => match self.next_elemental_move {
                        None => {
                            cx.queue_skill(Skill::Ignite);
                            cx.queue_skill_with(Skill::Windchill, Stance::Charge, None);
                        }
                        Some(next) => {
                            let first = if next != Skill::Hellfire {
                                Skill::Hellfire
                            } else {
                                Skill::Windchill
                            };
                            cx.queue_skill(first);
                            cx.queue_skill(next);
                        }
                    },
                    _ => {
                        if cx.is_item_usable(Item::RedBull) {
                            cx.queue_item(Item::RedBull);
                        }
                        cx.queue_skill_with(Skill::Omni, Stance::Charge, None);
                    }
                }
                self.zombie_heal_fix = Some(ZombieHealFix::Finish);
            }
            ZombieHealFix::Finish => {
                self.zombie_heal_alert_level += 1.0;
                self.zombie_heal_fix = None;
            }
        }
    }
}

impl BattleAi for RobertAi {
    fn strategize(&mut self, cx: &mut AiContext<'_>) {
        match cx.phase() {
            1 => self.phase_one(cx),
            2 => self.phase_two(cx),
            3 => self.phase_three(cx),
            4 => self.phase_four(cx),
            5 => self.phase_five(cx),
            _ => {}
        }
    }

    fn on_phase_changed(&mut self, cx: &mut AiContext<'_>, new_phase: u32, _last_phase: u32) {
        match new_phase {
            1 => {
                cx.queue_skill(Skill::Omni);
                self.do_charge_slash_next = true;
                self.is_combo_started = false;
                self.is_necromancy_pending = true;
            }
            2 => {
                cx.queue_skill_with(Skill::Upheaval, Stance::Charge, None);
                self.is_combo_started = false;
                self.is_status_heal_pending = true;
                self.was_holy_water_used = false;
                self.was_tonic_used = false;
            }
            3 => {
                cx.queue_skill(Skill::ProtectiveAura);
                let opener = self.next_elemental_move.unwrap_or(Skill::Bolt);
                let target = if opener == Skill::Bolt {
                    Self::scott(cx)
                } else {
                    None
                };
                cx.queue_skill_with(opener, Stance::Charge, target);
                self.necro_tonic_item = match self.next_elemental_move {
                    None => Some(Item::Tonic),
                    Some(_) => None,
                };
                self.do_charge_slash_next = false;
                self.elementals_till_revenge = 2;
                self.is_charge_slash_pending = true;
                self.is_combo_started = false;
            }
            4 => cx.queue_skill(Skill::Crackdown),
            5 => {
                cx.queue_skill(Skill::DesperationSlash);
                if cx.has_status(Status::Zombie) && cx.is_item_usable(Item::Vaccine) {
                    cx.queue_item(Item::Vaccine);
                }
                self.is_alcohol_pending = true;
                self.is_combo_started = false;
            }
            _ => {}
        }
    }

    fn on_item_used(&mut self, cx: &mut AiContext<'_>, user: UnitId, item: Item, targets: &[UnitId]) {
        if Self::is_drunk(cx) || cx.has_status(Status::OffGuard) {
            return;
        }
        let me = cx.unit_id();
        let scott = Self::scott(cx);
        let is_curative = CURATIVES.contains(&item);
        let on_me = targets.contains(&me);

        if user == me && is_curative && cx.has_status(Status::Zombie) && on_me && cx.phase() <= 4 {
            if self.zombie_heal_fix.is_none() && cx.is_item_usable(Item::HolyWater) {
                cx.queue_item(Item::HolyWater);
                self.has_zombie_healed_self = true;
            }
        } else if user == me && item == Item::Alcohol && on_me {
            cx.add_status_to_self(Status::FinalStand);
            for (speaker, line) in FINAL_STAND_SCENE {
                cx.talk(speaker, line);
            }
        } else if Some(user) == scott && on_me {
            if is_curative && cx.has_status(Status::Zombie) && !cx.is_skill_queued(Skill::Electrocute) {
                if cx.phase() <= 4 && self.zombie_heal_fix.is_none() {
                    self.zombie_heal_fix = Some(ZombieHealFix::FixStatus);
                    if item == Item::FullTonic {
                        self.zombie_heal_alert_level = 2.0;
                    }
                    let cannot_cure =
                        !cx.is_item_usable(Item::Vaccine) && !cx.is_item_usable(Item::HolyWater);
                    if self.zombie_heal_alert_level > 1.0 || cannot_cure {
                        self.zombie_heal_fix = Some(ZombieHealFix::Retaliate);
                    }
                } else if cx.phase() == 5
                    && !cx.has_moves_queued()
                    && (cx.is_item_usable(Item::PowerTonic) || cx.is_item_usable(Item::Tonic))
                    && cx.mp_available() >= 300
                {
                    cx.queue_skill(Skill::Electrocute);
                    let tonic = if cx.is_item_usable(Item::PowerTonic) {
                        Item::PowerTonic
                    } else {
                        Item::Tonic
                    };
                    cx.queue_item_on(tonic, scott);
                }
            }
        } else if Some(user) == scott && scott.is_some_and(|id| targets.contains(&id)) {
            if item == Item::Vaccine && self.scott_immune_turns_left == 0 {
                self.is_scott_zombie = false;
                self.scott_immune_turns_left = 6;
            } else if item == Item::HolyWater && self.is_scott_zombie {
                self.is_scott_zombie = false;
            } else if cx.phase() <= 3
                && is_curative
                && !self.is_necromancy_pending
                && !self.is_scott_zombie
                && !cx.is_skill_queued(Skill::Necromancy)
                && !cx.is_skill_queued(Skill::Electrocute)
                && self.zombie_heal_fix.is_none()
            {
                self.necromancy_chance += 0.25;
                if cx.chance(self.necromancy_chance, "Robert Necromancy")
                    && !self.is_necro_tonic_item_pending
                {
                    let skill = if cx.phase() <= 2 {
                        Skill::Necromancy
                    } else {
                        Skill::Bolt
                    };
                    cx.queue_skill_with(skill, Stance::Attack, scott);
                    self.necromancy_chance = 0.0;
                }
            }
        }
    }

    fn on_skill_used(
        &mut self,
        cx: &mut AiContext<'_>,
        user: UnitId,
        skill: Skill,
        _stance: Stance,
        targets: &[UnitId],
    ) {
        if Self::is_drunk(cx) || cx.has_status(Status::OffGuard) {
            return;
        }
        let scott = Self::scott(cx);

        if user == cx.unit_id() {
            if Some(skill) == self.next_elemental_move {
                self.next_elemental_move = None;
            } else if skill == Skill::Ignite {
                self.next_elemental_move = Some(Skill::Windchill);
            } else if skill == Skill::Frostbite {
                self.next_elemental_move = Some(Skill::Hellfire);
            } else if matches!(skill, Skill::Necromancy | Skill::Bolt) {
                self.is_scott_zombie = (skill == Skill::Necromancy
                    || self.scott_stance != Stance::Guard)
                    && self.scott_immune_turns_left == 0;
                self.is_necro_tonic_item_pending = self.is_scott_zombie
                    && self
                        .necro_tonic_item
                        .is_some_and(|item| cx.is_item_usable(item));
            }
        } else if Some(user) == scott && scott.is_some_and(|id| targets.contains(&id)) {
            let fire_cancels = matches!(skill, Skill::Ignite | Skill::Hellfire)
                && self.next_elemental_move == Some(Skill::Hellfire);
            let ice_cancels = matches!(skill, Skill::Frostbite | Skill::Windchill)
                && self.next_elemental_move == Some(Skill::Windchill);
            if fire_cancels || ice_cancels {
                self.next_elemental_move = None;
            }
        }
    }

    fn on_stance_changed(&mut self, cx: &mut AiContext<'_>, unit: UnitId, stance: Stance) {
        if Self::is_drunk(cx) {
            return;
        }
        if Some(unit) == Self::scott(cx) {
            self.scott_stance = stance;
        }
    }

    fn on_unit_ready(&mut self, cx: &mut AiContext<'_>, unit: UnitId) {
        if Self::is_drunk(cx) {
            return;
        }
        if self.zombie_heal_fix.is_none() {
            self.zombie_heal_alert_level = (self.zombie_heal_alert_level - 0.1).max(0.0);
        }

        let me = cx.unit_id();
        let scott = Self::scott(cx);
        if unit == me && !cx.has_moves_queued() {
            if self.is_necromancy_pending && self.scott_immune_turns_left == 0 {
                if !self.is_scott_zombie {
                    cx.queue_skill_with(Skill::Necromancy, Stance::Attack, scott);
                }
                self.is_necromancy_pending = false;
            } else if cx.mp_available() * 4 < cx.mp_capacity()
                && cx.is_item_usable(Item::RedBull)
                && cx.phase() <= 4
            {
                cx.queue_item(Item::RedBull);
            } else if self.is_necro_tonic_item_pending {
                if let Some(item) = self.necro_tonic_item.filter(|&item| cx.is_item_usable(item)) {
                    let target = if self.is_scott_zombie { scott } else { Some(me) };
                    cx.queue_item_on(item, target);
                }
                self.is_necro_tonic_item_pending = false;
                self.necro_tonic_item = None;
            } else if let Some(fix) = self.zombie_heal_fix {
                self.advance_zombie_heal_fix(cx, fix);
            }
        } else if Some(unit) == scott {
            self.scott_immune_turns_left = self.scott_immune_turns_left.saturating_sub(1);
            self.necromancy_chance = (self.necromancy_chance - 0.05).max(0.0);
        }
    }
}
