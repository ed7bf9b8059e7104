pub mod mount;
pub mod usage;
