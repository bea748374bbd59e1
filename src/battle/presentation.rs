//! The boundary to whatever shows the battle: announcements, animations and
//! dialogue. `play` blocks until the cue has finished, and nothing it does
//! feeds back into battle logic.

use serde::{Deserialize, Serialize};

use crate::battle::unit::UnitId;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum Cue {
    Announce { unit: UnitId, text: String },
    Animation { unit: UnitId, name: String },
    Dialogue { speaker: String, text: String },
}

pub trait Presenter {
    fn play(&mut self, cue: &Cue);
}

/// Plays nothing; for headless battles.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPresenter;

impl Presenter for NullPresenter {
    fn play(&mut self, _cue: &Cue) {}
}

/// Writes dialogue and announcements to stdout, for the demo binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsolePresenter;

impl Presenter for ConsolePresenter {
    fn play(&mut self, cue: &Cue) {
        match cue {
            Cue::Dialogue { speaker, text } => println!("  {}: \"{}\"", speaker, text),
            Cue::Announce { text, .. } => println!("  >> {}", text),
            Cue::Animation { .. } => {}
        }
    }
}
