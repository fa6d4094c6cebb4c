#![forbid(unsafe_code)]

pub mod aggregator;
pub mod error;
pub mod filter;
pub mod model;
pub mod time;

pub use aggregator::{AggregatedSkillView, ProgressOverview, SkillStatus};
pub use error::Error;
pub use filter::ResourceQualityFilter;
pub use time::Clock;
