pub mod action_stack;
pub mod ai;
pub mod commands;
pub mod conditions;
pub mod engine;
pub mod menu;
pub mod move_effects;
pub mod presentation;
pub mod rng;
pub mod runner;
pub mod scheduler;
pub mod stance;
pub mod state;
pub mod stats;
pub mod status;
pub mod targeting;
pub mod unit;

#[cfg(test)]
pub(crate) mod tests;
