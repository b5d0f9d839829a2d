pub mod snapshot;
pub mod tables;
