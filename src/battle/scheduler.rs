//! Turn-order forecasting for the CTB timeline.
//!
//! The live countdown lives on each unit (`BattleUnit::tick`); this module
//! answers "who acts next if this move were queued now" for AI plans and the
//! menu's turn preview.

use serde::{Deserialize, Serialize};

use crate::battle::state::BattleState;
use crate::battle::unit::UnitId;

/// Turns looked ahead per unit before the list is cut to the forecast length.
const LOOKAHEAD_TURNS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnForecast {
    pub unit: UnitId,
    /// Which of the unit's upcoming turns this is; 0 is the next one.
    pub turn_index: usize,
    /// Ticks from now until the turn comes up.
    pub remaining_time: u32,
}

/// Upcoming turns of every living unit, soonest first, assuming `actor` is
/// about to act with actions of `next_ranks`. Ties go to the lower unit id.
///
/// The actor's own list starts at index 1: its current turn is the one being
/// planned.
pub fn predict_turns(state: &BattleState, actor: UnitId, next_ranks: &[u32]) -> Vec<TurnForecast> {
    let config = &state.config;
    let mut forecast: Vec<TurnForecast> = state
        .units
        .iter()
        .filter(|unit| unit.is_alive())
        .flat_map(|unit| {
            let is_actor = unit.id == actor;
            let first = usize::from(is_actor);
            (first..first + LOOKAHEAD_TURNS).map(move |turn_index| {
                let ranks = if is_actor { Some(next_ranks) } else { None };
                TurnForecast {
                    unit: unit.id,
                    turn_index,
                    remaining_time: unit.time_until_turn(turn_index, ranks, config),
                }
            })
        })
        .collect();

    forecast.sort_by_key(|turn| (turn.remaining_time, turn.unit));
    forecast.truncate(config.forecast_length);
    forecast
}

/// The unit whose turn comes up first in `forecast`.
pub fn next_up(forecast: &[TurnForecast]) -> Option<UnitId> {
    forecast.first().map(|turn| turn.unit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::tests::common::TestUnitBuilder;
    use crate::config::BattleConfig;
    use pretty_assertions::assert_eq;

    fn state(speeds: &[u32]) -> BattleState {
        let config = BattleConfig::default();
        let units = speeds
            .iter()
            .enumerate()
            .map(|(index, speed)| {
                let mut unit = TestUnitBuilder::new(&format!("unit{}", index))
                    .with_speed(*speed)
                    .build_as(UnitId(index));
                unit.reset_counter(config.initial_rank, config.ctb_base);
                unit
            })
            .collect();
        BattleState::new(units, config)
    }

    #[test]
    fn test_ties_break_by_enumeration_order() {
        let state = state(&[10, 10, 10]);

        let forecast = predict_turns(&state, UnitId(2), &[2]);

        let order: Vec<UnitId> = forecast.iter().take(5).map(|turn| turn.unit).collect();
        assert_eq!(
            order,
            vec![UnitId(0), UnitId(1), UnitId(0), UnitId(1), UnitId(2)]
        );
    }

    #[test]
    fn test_quick_action_lets_the_actor_go_first() {
        let mut state = state(&[10, 10]);
        // The actor is mid-turn: its countdown has run out.
        state.units[0].reset_counter(1, 1);
        state.units[0].tick();
        state.units[1].reset_counter(2, state.config.ctb_base);
        state.units[1].tick();

        let quick = predict_turns(&state, UnitId(0), &[1]);
        let slow = predict_turns(&state, UnitId(0), &[3]);

        assert_eq!(next_up(&quick), Some(UnitId(0)));
        assert_eq!(quick[0].remaining_time, 10);
        assert_eq!(next_up(&slow), Some(UnitId(1)));
    }

    #[test]
    fn test_forecast_is_cut_to_configured_length() {
        let state = state(&[10, 20, 30]);

        let forecast = predict_turns(&state, UnitId(0), &[]);

        assert_eq!(forecast.len(), state.config.forecast_length);
        assert!(forecast.windows(2).all(|w| w[0].remaining_time <= w[1].remaining_time));
        assert!(forecast.iter().all(|turn| turn.unit != UnitId(0) || turn.turn_index >= 1));
    }
}
