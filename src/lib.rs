//! Sharpfix - C# naming diagnostics, renames and CSV serializer generation
//!
//! Parses C# sources into immutable program snapshots, runs naming rules
//! over them, applies whole-program renames as code fixes and generates
//! CSV serialization extensions for annotated types.

pub mod app;
pub mod cli;
pub mod error;
pub mod infra;
pub mod models;
pub mod services;

pub use error::{SharpfixError, SharpfixResult};
