//! Greedy exam scheduling and schedule reporting.
//!
//! # Algorithm
//!
//! `GreedyScheduler` places courses one at a time, hardest first, into a
//! randomly permuted slot space, committing the first slot that keeps
//! every student's calendar and the day capacity valid. It is not optimal;
//! courses it cannot place are reported, never dropped.
//!
//! # Report
//!
//! `ScheduleReport` aggregates counts, spread, the busiest day, and a
//! per-department breakdown from a committed schedule and its verified
//! conflicts.

mod greedy;
mod report;

pub use greedy::{GreedyScheduler, SlotRejection, NO_SLOT_REASON};
pub use report::{BusiestDay, DepartmentMap, DepartmentStats, ScheduleReport};
