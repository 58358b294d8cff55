//! Shared types for the CorteSec organizational structure: the position
//! (cargo) aggregate and the hierarchy builder used to render org charts.

pub mod domain;
pub mod shared;
