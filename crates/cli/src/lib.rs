//! Support code for the `pollwatch` binary

pub mod output;
pub mod system_config;
