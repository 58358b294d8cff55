pub mod aggregate;

pub use aggregate::{Cargo, CargoDto, CargoId};
