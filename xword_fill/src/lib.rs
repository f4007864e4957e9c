pub mod domains;
pub mod solver;
pub mod structure;
