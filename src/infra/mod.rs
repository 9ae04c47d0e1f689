//! Infrastructure layer for Sharpfix
//!
//! Contains low-level implementations and external integrations.

pub mod ast;
pub mod file_filter;
