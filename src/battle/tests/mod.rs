pub mod common;

#[cfg(test)]
mod test_turn_flow;

#[cfg(test)]
mod test_action_sequencing;

#[cfg(test)]
mod test_zombie;

#[cfg(test)]
mod test_enemy_ai;
