use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Every technique in the skill catalog. The string form (`quickstrike`,
/// `chargeSlash`, ...) is the catalog key used by configuration files.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[strum(serialize_all = "camelCase")]
pub enum Skill {
    // Sword
    BerserkCharge,
    ChargeSlash,
    DesperationSlash,
    Quickstrike,
    SwordSlash,
    // Bow
    Archery,
    ChillShot,
    FlareShot,
    JoltShot,
    SeismicShot,
    TripleShot,
    // Gun
    Potshot,
    Sharpshooter,
    Shootout,
    // Shuriken
    StarToss,
    StarVolley,
    // Magic
    Chill,
    Flare,
    Lightning,
    Quake,
    Frostbite,
    Ignite,
    Bolt,
    Tremor,
    Electrocute,
    Hellfire,
    Upheaval,
    Windchill,
    Inferno,
    Subzero,
    TenPointFive,
    Discharge,
    Omni,
    // Healing
    Convalesce,
    Dispel,
    Heal,
    Lazarus,
    Purify,
    Rejuvenate,
    Renewal,
    // Strategy
    Crackdown,
    Curse,
    Necromancy,
    ProtectiveAura,
    // Enemy techniques
    FatSlam,
    Fatseat,
    Munch,
    Bite,
    DeathBite,
    Delusion,
    FlameBreath,
    FlareUp,
    RearingKick,
    SpectralReversion,
    SpectralKick,
    Tackle,
    Trample,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[strum(serialize_all = "camelCase")]
pub enum Item {
    Tonic,
    PowerTonic,
    FullTonic,
    HolyWater,
    Vaccine,
    Alcohol,
    RedBull,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[strum(serialize_all = "camelCase")]
pub enum Status {
    Zombie,
    Frostbite,
    Ignite,
    Crackdown,
    Curse,
    Protect,
    ReGen,
    OffGuard,
    Winded,
    Sniper,
    Rearing,
    Ghost,
    Delusion,
    Disarray,
    Drunk,
    FinalStand,
    Immune,
}

/// Tags group statuses for bulk removal (`liftStatusTags`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "camelCase")]
pub enum StatusTag {
    Buff,
    Debuff,
    Undead,
    Ailment,
}

/// Battle-wide field effects.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[strum(serialize_all = "camelCase")]
pub enum Condition {
    Inferno,
    Subzero,
    GeneralDisarray,
    Thunderstorm,
    HealingAura,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[strum(serialize_all = "camelCase")]
pub enum Enemy {
    Robert2,
    Lumisquirrel,
    HeadlessHorse,
}
