//! Sub-request planning: per-piece role selection for both use cases (§4.4).

pub mod planner;

pub use planner::{PlannedRequest, WorkInstructionsState, plan_checksheet, plan_work_instructions};
