//! Diff engine - Decision table and plan generation

mod compare;
mod engine;
mod plan;

pub use compare::compare_records;
pub use engine::{DiffPlan, PlanStats, PlannedFile};
pub use plan::{generate_sync_plan, TargetTree};
