//! Background tasks module
//! 
//! This module contains the periodic tick source that drives a countdown.

pub mod tick_source;

// Re-export main functions
pub(crate) use tick_source::tick_task;
