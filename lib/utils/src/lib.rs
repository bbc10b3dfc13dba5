//! Small helpers shared by the workspace crates.
#![no_std]

pub mod macros;
