pub mod camera;
pub mod config;
pub mod events;
pub mod grid;
pub mod io;
pub mod rle;
pub mod rule_set;
pub mod simulation;

mod parse_util;

pub use grid::Grid;
pub use rule_set::RuleSet;
pub use simulation::Simulation;
