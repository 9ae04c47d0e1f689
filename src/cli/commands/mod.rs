//! Command implementations for Sharpfix
//!
//! Each command is implemented in its own module.

pub mod analyze;
pub mod config;
pub mod fix;
pub mod generate;
pub mod init;
pub mod rename;
