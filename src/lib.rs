//! `growth-curves` library crate.
//!
//! The binary (`growth`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes or touching files
//! - the curve store and trajectory analyzer can feed any chart renderer

pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod io;
pub mod math;
pub mod reference;
pub mod report;
pub mod trajectory;
