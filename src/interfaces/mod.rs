//! Outer surfaces: command replay, CSV in/out and JSON fixtures.

pub mod command;
pub mod csv;
pub mod fixture;
