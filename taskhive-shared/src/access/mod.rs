//! Access control
//!
//! Three layers, leaf to root:
//!
//! - `permissions`: the static role table mapping each project role to its
//!   permitted action set. Pure data.
//! - `resolver`: resolves a user's effective role in a project from the
//!   membership table, with a repair path for a missing owner row.
//! - `evaluator`: combines the resolved role with task ownership/assignment
//!   facts into allow/deny decisions. Pure over its inputs and fail-closed.
//!
//! Handlers consult the evaluator exactly once per mutating request before
//! any write. Denials are returned as `false`/`None`, never as errors; the
//! caller turns them into Forbidden responses.

pub mod evaluator;
pub mod permissions;
pub mod resolver;

pub use evaluator::TaskFacts;
pub use permissions::Permission;
