//! Background Tasks Module
//!
//! # Tasks
//! - Cache sweep: drops expired responses at the configured interval

mod cleanup;

pub use cleanup::spawn_sweep_task;
