pub mod a001_cargo;
