pub mod types;
pub mod rule;
pub mod matcher;
pub mod planner;
pub mod cache;
