//! Port traits: what the domain needs from the outside world.

pub mod config_port;
pub mod data_port;
pub mod journal_port;
pub mod report_port;
