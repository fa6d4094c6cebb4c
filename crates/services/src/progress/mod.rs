mod dashboard;
mod tracker;

pub use dashboard::{Dashboard, DashboardService};
pub use tracker::{SubskillTracker, ToggleOutcome};
