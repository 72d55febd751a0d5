//! Regeneration domain — the Regeneration Planner (C7).

mod plan;

pub use plan::{plan_regeneration, RegenerationPlan, RegenerationRequest, RegenerationScope, RegenerationStrategy};
