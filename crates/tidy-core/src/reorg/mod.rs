//! Reorganization pipeline: assign links to sections, plan the moves, then
//! execute and propagate them.

pub mod assign;
pub mod cleanup;
pub mod executor;
pub mod model;
pub mod planner;
pub mod propagate;

pub use assign::assign_links_to_sections;
pub use executor::{ExecutionReport, Executor};
pub use model::{Diagnostic, DiagnosticSeverity, LinkUpdates, MoveOperation, ReorgPlan, RunSummary};
pub use planner::{MovePlan, MovePlanner, NameRegistry, SourceCandidate, RESOLUTION_ORDER};
