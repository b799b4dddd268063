//! # TaskHive Worker Library
//!
//! Background processing for TaskHive. The worker's single job is the
//! recurrence sweep: finding completed recurring tasks whose next occurrence
//! has arrived and rolling them forward to a fresh cycle.
//!
//! ## Modules
//!
//! - `recurrence`: Pure next-occurrence date arithmetic
//! - `sweeper`: The sweep over completed recurring tasks
//! - `notify`: Update notifications for reset tasks

pub mod notify;
pub mod recurrence;
pub mod sweeper;
