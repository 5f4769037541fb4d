//! Background Tasks Module
//!
//! Housekeeping that runs next to the cache rather than inside it.
//!
//! # Tasks
//! - Expired-entry sweep: bulk-deletes entries past their absolute bound or sliding window

mod sweeper;

pub use sweeper::{spawn_sweep_task, ExpiredEntriesSweeper};
