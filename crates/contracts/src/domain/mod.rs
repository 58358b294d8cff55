pub mod a001_cargo;
pub mod common;
