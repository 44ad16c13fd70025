pub mod behavior;
pub mod core;
pub mod reports;
pub mod roster;
