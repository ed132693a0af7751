pub mod errors;
pub mod usage;
